use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

/// How the aggregated text of a bundle is minified before it is digested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MinificationMode {
    /// Serve the concatenation as-is.
    #[default]
    None,
    /// CSS-aware minification.
    StyleSheet,
    /// JavaScript-aware minification.
    JavaScript,
}

impl FromStr for MinificationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(MinificationMode::None),
            "stylesheet" | "css" => Ok(MinificationMode::StyleSheet),
            "javascript" | "js" => Ok(MinificationMode::JavaScript),
            other => Err(format!(
                "invalid minification mode: {other} (expected \"none\", \"stylesheet\" or \"javascript\")"
            )),
        }
    }
}

/// Source language of a single input file, derived from its extension.
///
/// This is the closed set the transform table dispatches on; anything not
/// listed lands in `Other` and passes through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Css,
    JavaScript,
    Html,
    Less,
    Sass,
    Scss,
    CoffeeScript,
    TypeScript,
    Other,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("css") => SourceKind::Css,
            Some("js") => SourceKind::JavaScript,
            Some("html") => SourceKind::Html,
            Some("less") => SourceKind::Less,
            Some("sass") => SourceKind::Sass,
            Some("scss") => SourceKind::Scss,
            Some("coffee") => SourceKind::CoffeeScript,
            Some("ts") => SourceKind::TypeScript,
            _ => SourceKind::Other,
        }
    }

    /// HTML fragments are packaged into the template registry instead of
    /// being concatenated.
    pub fn is_template(self) -> bool {
        self == SourceKind::Html
    }
}

/// What to do when a resolved source file cannot be read at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingFilePolicy {
    /// Abort the build with a filesystem error.
    #[default]
    Fail,
    /// Log a warning and leave the file out of the bundle.
    Skip,
}

/// Flavour of a registered bundle; decides content type and minifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleKind {
    Style,
    Script,
}

pub const STYLE_CONTENT_TYPE: &str = "text/css;charset=utf-8";
pub const SCRIPT_CONTENT_TYPE: &str = "application/x-javascript;charset=utf-8";

impl BundleKind {
    pub fn content_type(self) -> &'static str {
        match self {
            BundleKind::Style => STYLE_CONTENT_TYPE,
            BundleKind::Script => SCRIPT_CONTENT_TYPE,
        }
    }

    pub fn minification(self, minify: bool) -> MinificationMode {
        match (self, minify) {
            (_, false) => MinificationMode::None,
            (BundleKind::Style, true) => MinificationMode::StyleSheet,
            (BundleKind::Script, true) => MinificationMode::JavaScript,
        }
    }
}
