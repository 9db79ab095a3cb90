// src/build/templates.rs

//! Client-side template registry generated from HTML fragments.
//!
//! Every `.html` file in a bundle is registered under its root-relative path
//! in an Angular `$templateCache` module, so views can be looked up without
//! an extra request:
//!
//! ```text
//! angular.module('bundlekit.templates', []).run(['$templateCache',function ($templateCache){
//! 	$templateCache.put('/js/app/templates/list.html','<ul>\n</ul>');
//! }]);
//! ```

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_TEMPLATE_MODULE: &str = "bundlekit.templates";

static NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n").expect("valid regex"));

/// One HTML fragment: its registry key and raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub key: String,
    pub text: String,
}

/// Escape raw text for use inside a single-quoted JS string literal.
pub fn escape_template(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\");
    let escaped = NEWLINE.replace_all(&escaped, "\\n");
    escaped.replace('\'', "\\'")
}

/// Render the registry module, or an empty string when there is nothing to
/// register.
pub fn render_registry(module: &str, templates: &[Template]) -> String {
    if templates.is_empty() {
        return String::new();
    }

    let mut puts = String::new();
    for t in templates {
        // Writing into a String cannot fail.
        let _ = writeln!(
            puts,
            "\t$templateCache.put('{}','{}');",
            escape_template(&t.key),
            escape_template(&t.text)
        );
    }

    format!(
        "\n\nangular.module('{module}', []).run(['$templateCache',function ($templateCache){{\n{puts}}}]);"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_newlines_quotes_and_backslashes() {
        assert_eq!(escape_template("a\r\nb\nc"), "a\\nb\\nc");
        assert_eq!(escape_template("it's"), "it\\'s");
        assert_eq!(escape_template("C:\\x"), "C:\\\\x");
    }

    #[test]
    fn empty_registry_renders_nothing() {
        assert_eq!(render_registry(DEFAULT_TEMPLATE_MODULE, &[]), "");
    }

    #[test]
    fn registry_lists_every_template() {
        let out = render_registry(
            "m",
            &[
                Template {
                    key: "/a.html".into(),
                    text: "<p>'x'</p>\n".into(),
                },
                Template {
                    key: "/b/c.html".into(),
                    text: "<i></i>".into(),
                },
            ],
        );
        assert!(out.starts_with("\n\nangular.module('m', [])"));
        assert!(out.contains("\t$templateCache.put('/a.html','<p>\\'x\\'</p>\\n');\n"));
        assert!(out.contains("\t$templateCache.put('/b/c.html','<i></i>');\n"));
        assert!(out.ends_with("}]);"));
    }
}
