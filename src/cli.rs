// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Two subcommands: `build` (the default) writes one bundle to stdout, and
//! `serve` hosts the bundles declared in `Bundlekit.toml`. The historical
//! single-dash spellings `-js`, `-css` and `-prefix:<path>` are rewritten to
//! their long forms before clap sees them.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "bundlekit",
    version,
    about = "Bundle, minify and serve stylesheets and scripts.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUNDLEKIT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Build one bundle from the given files and print it.
    Build(BuildArgs),
    /// Serve the bundles declared in a config file over HTTP.
    Serve(ServeArgs),
}

#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
    /// Minify as JavaScript (also `-js`).
    #[arg(long, conflicts_with = "css")]
    pub js: bool,

    /// Minify as CSS (also `-css`).
    #[arg(long)]
    pub css: bool,

    /// Application root the file patterns are relative to (also
    /// `-prefix:<path>`).
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub prefix: PathBuf,

    /// Include patterns, `!`-prefixed exclude patterns.
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Bundlekit.toml")]
    pub config: PathBuf,

    /// Override `[config].listen`.
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Parse + validate, print the bundles and their files, but don't serve.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Rewrite legacy flags and insert the default `build` subcommand.
///
/// The first element is the program name and is passed through untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut iter = args.into_iter().map(Into::into);
    let mut out: Vec<OsString> = iter.next().into_iter().collect();

    for arg in iter {
        match arg.to_str() {
            Some("-js") => out.push("--js".into()),
            Some("-css") => out.push("--css".into()),
            Some(s) if s.starts_with("-prefix:") => {
                out.push("--prefix".into());
                out.push(s["-prefix:".len()..].into());
            }
            _ => out.push(arg),
        }
    }

    if let Some(pos) = first_command_position(&out) {
        let explicit = matches!(
            out[pos].to_str(),
            Some("build" | "serve" | "help" | "-h" | "--help" | "-V" | "--version")
        );
        if !explicit {
            out.insert(pos, "build".into());
        }
    }
    out
}

/// Index of the first argument that is not the program name or a global
/// `--log-level`.
fn first_command_position(args: &[OsString]) -> Option<usize> {
    let mut i = 1;
    while i < args.len() {
        match args[i].to_str() {
            Some("--log-level") => i += 2,
            Some(s) if s.starts_with("--log-level=") => i += 1,
            _ => return Some(i),
        }
    }
    None
}

/// Parse the process arguments.
pub fn parse() -> CliArgs {
    CliArgs::parse_from(normalize_args(std::env::args_os()))
}

/// Parse an explicit argument list (program name first).
pub fn try_parse_from<I, T>(args: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    CliArgs::try_parse_from(normalize_args(args))
}
