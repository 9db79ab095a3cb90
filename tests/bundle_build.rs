mod common;
use crate::common::{FailingCompiler, FakeCompiler, SiteBuilder, TestResult, init_tracing, sample_site};

use std::sync::Arc;

use bundlekit::build::{BuildOptions, BundleBuilder, Lenient, TransformTable};
use bundlekit::errors::BundleError;
use bundlekit::fs::RealFileSystem;
use bundlekit::types::{MinificationMode, SourceKind};

fn plain_builder() -> BundleBuilder {
    BundleBuilder::new(Arc::new(RealFileSystem)).with_transforms(TransformTable::empty())
}

#[test]
fn scripts_then_template_registry() -> TestResult {
    init_tracing();
    let site = sample_site();

    let bundle = plain_builder().build_patterns(
        &["js/*.js", "js/*.html"],
        MinificationMode::None,
        site.root(),
    )?;

    let expected = concat!(
        "\n\n/* /js/app.js */\nvar app = {};\n",
        "\n\n/* /js/lib/util.js */\nfunction util(a) { return a + 1; }\n",
        "\n\nangular.module('bundlekit.templates', []).run(['$templateCache',function ($templateCache){\n",
        "\t$templateCache.put('/js/app/templates/list.html','<ul class=\\'items\\'>\\n</ul>\\n');\n",
        "}]);",
    );
    assert_eq!(bundle.text(), expected);
    Ok(())
}

#[test]
fn template_module_name_is_configurable() -> TestResult {
    init_tracing();
    let site = sample_site();

    let builder = plain_builder().with_options(BuildOptions {
        template_module: "app.views".to_string(),
        ..BuildOptions::default()
    });
    let bundle = builder.build_patterns(&["js/*.html"], MinificationMode::None, site.root())?;
    assert!(bundle.text().starts_with("\n\nangular.module('app.views', [])"));
    Ok(())
}

#[test]
fn rebuilding_unchanged_sources_is_idempotent() -> TestResult {
    init_tracing();
    let site = sample_site();

    let first = plain_builder().build_patterns(&["css/*.css"], MinificationMode::None, site.root())?;
    let second = plain_builder().build_patterns(&["css/*.css"], MinificationMode::None, site.root())?;
    assert_eq!(first.digest(), second.digest());
    assert_eq!(first.bytes(), second.bytes());
    Ok(())
}

#[test]
fn any_byte_change_changes_the_digest() -> TestResult {
    init_tracing();
    let site = sample_site();

    let before = plain_builder().build_patterns(&["css/*.css"], MinificationMode::None, site.root())?;
    site.write("css/site.css", "body { color: blue; }\n");
    let after = plain_builder().build_patterns(&["css/*.css"], MinificationMode::None, site.root())?;
    assert_ne!(before.etag(), after.etag());
    Ok(())
}

#[test]
fn compilers_run_per_extension() -> TestResult {
    init_tracing();
    let site = SiteBuilder::new()
        .file("css/base.css", "a{}")
        .file("css/theme.less", "@c: red;")
        .build();

    let fake = FakeCompiler::new();
    let builder = BundleBuilder::new(Arc::new(RealFileSystem))
        .with_transforms(TransformTable::empty().with(SourceKind::Less, fake.clone()));

    let bundle = builder.build_patterns(
        &["css/*.css", "css/*.less"],
        MinificationMode::None,
        site.root(),
    )?;

    assert_eq!(fake.seen(), vec!["@c: red;".to_string()]);
    assert!(bundle.text().ends_with("\n\n/* /css/theme.less */\n/* compiled */@c: red;"));
    Ok(())
}

#[test]
fn compile_failure_names_the_file() {
    init_tracing();
    let site = SiteBuilder::new().file("css/bad.scss", "a {").build();

    let builder = BundleBuilder::new(Arc::new(RealFileSystem)).with_transforms(
        TransformTable::empty().with(SourceKind::Scss, FailingCompiler::new("expected }")),
    );
    let err = builder
        .build_patterns(&["css/*.scss"], MinificationMode::None, site.root())
        .unwrap_err();

    match err {
        BundleError::Compile { path, kind, message } => {
            assert_eq!(path, site.path("css/bad.scss"));
            assert_eq!(kind, SourceKind::Scss);
            assert!(message.contains("expected }"));
        }
        other => panic!("expected compile error, got {other:?}"),
    }
}

#[test]
fn lenient_compiler_passes_source_through() -> TestResult {
    init_tracing();
    let site = SiteBuilder::new().file("ts/app.ts", "let x: number = 1;").build();

    let builder = BundleBuilder::new(Arc::new(RealFileSystem)).with_transforms(
        TransformTable::empty().with(SourceKind::TypeScript, Lenient(FailingCompiler::new("tsc missing"))),
    );
    let bundle = builder.build_patterns(&["ts/*.ts"], MinificationMode::None, site.root())?;
    assert!(bundle.text().ends_with("let x: number = 1;"));
    Ok(())
}

#[test]
fn javascript_minification_keeps_behaviour() -> TestResult {
    init_tracing();
    let site = SiteBuilder::new()
        .file("js/answer.js", "// sets the answer\nwindow.answer = 6 * 7;\n")
        .build();

    let plain = plain_builder().build_patterns(&["js/*.js"], MinificationMode::None, site.root())?;
    let minified =
        plain_builder().build_patterns(&["js/*.js"], MinificationMode::JavaScript, site.root())?;

    assert!(minified.len() < plain.len());
    assert!(minified.text().contains("window.answer"));
    assert!(!minified.text().contains("sets the answer"));
    assert!(!minified.text().contains("/* /js/answer.js */"));
    Ok(())
}

#[test]
fn minified_script_keeps_top_level_globals() -> TestResult {
    init_tracing();
    let site = SiteBuilder::new()
        .file("js/globals.js", "var answer = 6 * 7;\nfunction util(a) { return a + 1; }\n")
        .build();

    let bundle =
        plain_builder().build_patterns(&["js/*.js"], MinificationMode::JavaScript, site.root())?;
    let text = bundle.text();
    assert!(!text.is_empty());
    assert!(text.contains("answer"), "{text}");
    assert!(text.contains("function util"), "{text}");
    Ok(())
}

#[test]
fn stylesheet_minification() -> TestResult {
    init_tracing();
    let site = SiteBuilder::new()
        .file("css/site.css", "body {\n  color: red;\n}\n.dark { background: #000000; }\n")
        .build();

    let bundle =
        plain_builder().build_patterns(&["css/*.css"], MinificationMode::StyleSheet, site.root())?;
    assert_eq!(bundle.text(), "body{color:red}.dark{background:#000}");
    Ok(())
}

#[test]
fn unparsable_script_fails_minification() {
    init_tracing();
    let site = SiteBuilder::new().file("js/broken.js", "var = ;").build();

    let err = plain_builder()
        .build_patterns(&["js/*.js"], MinificationMode::JavaScript, site.root())
        .unwrap_err();
    assert!(matches!(
        err,
        BundleError::Minify {
            mode: MinificationMode::JavaScript,
            ..
        }
    ));
}
