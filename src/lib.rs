// src/lib.rs

pub mod build;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod http;
pub mod logging;
pub mod resolve;
pub mod service;
pub mod types;

use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::build::BundleBuilder;
use crate::cli::{BuildArgs, CliArgs, Command, ServeArgs};
use crate::config::{ConfigFile, load_and_validate, resolve_root};
use crate::service::BundleService;
use crate::types::MinificationMode;

pub use crate::build::{Bundle, Digest};
pub use crate::errors::{BundleError, Result as BundleResult};
pub use crate::service::BundleHandler;

/// High-level entry point used by `main.rs`.
pub fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Build(build) => run_build(&build, &mut std::io::stdout().lock()),
        Command::Serve(serve) => run_serve(&serve),
    }
}

/// Build one bundle from the command line and write it to `out`.
pub fn run_build(args: &BuildArgs, out: &mut impl Write) -> Result<()> {
    let mode = build_mode(args);
    let bundle = BundleBuilder::default()
        .build_patterns(&args.files, mode, &args.prefix)
        .with_context(|| format!("building bundle under {}", args.prefix.display()))?;

    out.write_all(bundle.bytes())?;
    out.flush()?;
    debug!(digest = %bundle.digest(), bytes = bundle.len(), "bundle written to stdout");
    Ok(())
}

fn build_mode(args: &BuildArgs) -> MinificationMode {
    match (args.js, args.css) {
        (true, _) => MinificationMode::JavaScript,
        (_, true) => MinificationMode::StyleSheet,
        _ => MinificationMode::None,
    }
}

fn run_serve(args: &ServeArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let root = resolve_root(&cfg, &args.config);

    if args.dry_run {
        print_dry_run(&cfg, &root)?;
        return Ok(());
    }

    let addr: SocketAddr = match &args.listen {
        Some(listen) => listen
            .parse()
            .with_context(|| format!("--listen is not a socket address: {listen}"))?,
        None => cfg
            .config
            .listen_addr()
            .context("[config].listen is not a socket address")?,
    };

    let service = Arc::new(BundleService::from_config(&cfg)?);
    let server = http::server::bind(addr, cfg.config.workers)?;

    // Ctrl-C → stop accepting, then drop all watches.
    {
        let handle = server.shutdown_handle();
        let service = Arc::clone(&service);
        ctrlc::set_handler(move || {
            handle.shutdown();
            service.shutdown();
        })
        .context("installing Ctrl-C handler")?;
    }

    info!(bundles = cfg.bundles.len(), "bundle host starting");
    server.run(service, root)
}

/// Print each configured bundle and the files it currently resolves to.
fn print_dry_run(cfg: &ConfigFile, root: &Path) -> Result<()> {
    let builder = BundleBuilder::default();

    println!("bundlekit dry-run");
    println!("  config.root = {}", root.display());
    println!("  config.listen = {}", cfg.config.listen);
    println!("  config.missing_files = {:?}", cfg.config.missing_files);
    println!();

    println!("bundles ({}):", cfg.bundles.len());
    for (name, bundle) in cfg.bundles.iter() {
        println!("  - {name}");
        println!("      path: {}", bundle.path);
        println!("      content_type: {}", bundle.effective_content_type());
        println!("      minify: {:?}", bundle.minification());
        let files = builder.resolve(&bundle.files, root)?;
        println!("      files ({}):", files.len());
        for file in files.iter() {
            println!("        {}", file.display());
        }
    }

    debug!("dry-run complete (nothing served)");
    Ok(())
}
