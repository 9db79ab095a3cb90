use std::sync::{Arc, Mutex};

use bundlekit::build::Compiler;

/// A compiler that:
/// - records every source it was given
/// - wraps the source in a marker comment so tests can see it ran.
#[derive(Debug, Clone, Default)]
pub struct FakeCompiler {
    seen: Arc<Mutex<Vec<String>>>,
}

impl FakeCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources compiled so far, in call order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl Compiler for FakeCompiler {
    fn name(&self) -> &str {
        "fake"
    }

    fn compile(&self, source: &str) -> anyhow::Result<String> {
        self.seen.lock().unwrap().push(source.to_string());
        Ok(format!("/* compiled */{source}"))
    }
}

/// A compiler that always fails with `message`.
#[derive(Debug, Clone)]
pub struct FailingCompiler {
    pub message: String,
}

impl FailingCompiler {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Compiler for FailingCompiler {
    fn name(&self) -> &str {
        "failing"
    }

    fn compile(&self, _source: &str) -> anyhow::Result<String> {
        anyhow::bail!("{}", self.message)
    }
}
