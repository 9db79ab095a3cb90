mod common;
use crate::common::{TestResult, init_tracing, sample_site};

use std::path::PathBuf;

use bundlekit::cli::{Command, try_parse_from};
use bundlekit::run_build;

#[test]
fn legacy_flags_parse_as_build() -> TestResult {
    let args = try_parse_from(["bundlekit", "-css", "-prefix:/srv/www", "css/*.css", "!css/print.css"])?;
    let Command::Build(build) = args.command else {
        panic!("expected build subcommand");
    };
    assert!(build.css);
    assert!(!build.js);
    assert_eq!(build.prefix, PathBuf::from("/srv/www"));
    assert_eq!(build.files, vec!["css/*.css", "!css/print.css"]);
    Ok(())
}

#[test]
fn js_and_css_together_is_a_usage_error() {
    assert!(try_parse_from(["bundlekit", "-js", "-css", "a.js"]).is_err());
}

#[test]
fn unknown_flag_is_a_usage_error() {
    assert!(try_parse_from(["bundlekit", "-minify", "a.js"]).is_err());
}

#[test]
fn serve_takes_a_config_path() -> TestResult {
    let args = try_parse_from(["bundlekit", "serve", "--config", "site/Bundlekit.toml", "--dry-run"])?;
    let Command::Serve(serve) = args.command else {
        panic!("expected serve subcommand");
    };
    assert_eq!(serve.config, PathBuf::from("site/Bundlekit.toml"));
    assert!(serve.dry_run);
    Ok(())
}

#[test]
fn build_writes_bundle_to_output() -> TestResult {
    init_tracing();
    let site = sample_site();
    let prefix = format!("-prefix:{}", site.root().display());
    let args = try_parse_from(["bundlekit", "-css", prefix.as_str(), "css/site.css"])?;
    let Command::Build(build) = args.command else {
        panic!("expected build subcommand");
    };

    let mut out = Vec::new();
    run_build(&build, &mut out)?;
    assert_eq!(String::from_utf8(out)?, "body{color:red}");
    Ok(())
}
