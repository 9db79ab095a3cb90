// src/build/minify.rs

//! Minification of the aggregated bundle text.
//!
//! oxc handles JavaScript and lightningcss handles CSS.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::errors::{BundleError, Result};
use crate::types::MinificationMode;

/// Minify `text` according to `mode`.
pub fn minify(mode: MinificationMode, text: String) -> Result<String> {
    match mode {
        MinificationMode::None => Ok(text),
        MinificationMode::StyleSheet => minify_css(&text),
        MinificationMode::JavaScript => minify_js(&text),
    }
}

/// Minify a classic (non-module) script.
///
/// Bundles are loaded through plain `<script>` tags, so top-level bindings
/// are globals and must survive; only local names are mangled.
pub fn minify_js(source: &str) -> Result<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::script();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        let message = ret
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(BundleError::Minify {
            mode: MinificationMode::JavaScript,
            message,
        });
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

pub fn minify_css(source: &str) -> Result<String> {
    let css_error = |message: String| BundleError::Minify {
        mode: MinificationMode::StyleSheet,
        message,
    };
    let stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| css_error(e.to_string()))?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| css_error(e.to_string()))?;
    Ok(result.code)
}
