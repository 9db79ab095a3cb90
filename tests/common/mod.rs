#![allow(dead_code, unused_imports)]

pub use bundlekit_test_utils::builders::{BundleConfigBuilder, ConfigFileBuilder, Site, SiteBuilder};
pub use bundlekit_test_utils::fake_compiler::{FailingCompiler, FakeCompiler};
pub use bundlekit_test_utils::{init_tracing, wait_until};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Small site used by most tests:
///
/// ```text
/// css/pure.css  css/site.css  css/print.css  css/theme/dark.css
/// js/app.js     js/lib/util.js
/// js/app/templates/list.html
/// ```
pub fn sample_site() -> Site {
    SiteBuilder::new()
        .file("css/pure.css", "html { margin: 0; }\n")
        .file("css/site.css", "body { color: red; }\n")
        .file("css/print.css", "@media print { body { color: black; } }\n")
        .file("css/theme/dark.css", ".dark { background: #000000; }\n")
        .file("js/app.js", "var app = {};\n")
        .file("js/lib/util.js", "function util(a) { return a + 1; }\n")
        .file("js/app/templates/list.html", "<ul class='items'>\r\n</ul>\n")
        .build()
}
