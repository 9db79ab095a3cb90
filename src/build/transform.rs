// src/build/transform.rs

//! Per-extension compile step.
//!
//! Compilers are plain text-to-text transforms. The table is keyed by the
//! closed [`SourceKind`] set; kinds with no entry pass through unchanged.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use crate::types::SourceKind;

/// A source-to-source compiler for one input language.
pub trait Compiler: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    fn compile(&self, source: &str) -> Result<String>;
}

/// Compiler backed by an external tool that reads source on stdin and
/// writes the compiled output to stdout.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
}

impl CommandCompiler {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `lessc -`
    pub fn less() -> Self {
        Self::new("lessc", ["-"])
    }

    /// Dart Sass, SCSS syntax.
    pub fn scss() -> Self {
        Self::new("sass", ["--stdin", "--no-source-map"])
    }

    /// Dart Sass, indented syntax.
    pub fn sass() -> Self {
        Self::new("sass", ["--stdin", "--indented", "--no-source-map"])
    }

    /// `coffee --compile --print --stdio`
    pub fn coffee() -> Self {
        Self::new("coffee", ["--compile", "--print", "--stdio"])
    }
}

impl Compiler for CommandCompiler {
    fn name(&self) -> &str {
        &self.program
    }

    fn compile(&self, source: &str) -> Result<String> {
        debug!(program = %self.program, args = ?self.args, "running external compiler");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawning compiler '{}'", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .context("compiler stdin was not captured")?;

        // Feed stdin from a helper thread so a chatty compiler cannot fill
        // its stdout pipe while we are still writing.
        let output = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(source.as_bytes()));
            let output = child.wait_with_output();
            let written = writer
                .join()
                .map_err(|_| anyhow::anyhow!("compiler stdin writer panicked"))?;
            // A compiler that exits early closes its stdin; the exit status
            // below is the more useful error in that case.
            if let Err(e) = written {
                debug!(program = %self.program, error = %e, "writing compiler stdin failed");
            }
            output.with_context(|| format!("waiting for compiler '{}'", self.program))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }

        String::from_utf8(output.stdout)
            .with_context(|| format!("compiler '{}' produced non UTF-8 output", self.program))
    }
}

/// Wraps an unreliable compiler: on failure the input is kept unchanged and
/// a warning is logged instead of failing the build.
pub struct Lenient<C>(pub C);

impl<C: Compiler> Compiler for Lenient<C> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn compile(&self, source: &str) -> Result<String> {
        match self.0.compile(source) {
            Ok(out) => Ok(out),
            Err(e) => {
                warn!(compiler = %self.0.name(), error = %format!("{e:#}"), "lenient compiler failed; passing source through");
                Ok(source.to_string())
            }
        }
    }
}

/// Dispatch table from [`SourceKind`] to compiler.
#[derive(Clone)]
pub struct TransformTable {
    compilers: HashMap<SourceKind, Arc<dyn Compiler>>,
}

impl fmt::Debug for TransformTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self
            .compilers
            .iter()
            .map(|(k, c)| format!("{k:?}={}", c.name()))
            .collect();
        kinds.sort();
        f.debug_struct("TransformTable")
            .field("compilers", &kinds)
            .finish()
    }
}

impl Default for TransformTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TransformTable {
    /// No compilers at all; every file passes through.
    pub fn empty() -> Self {
        Self {
            compilers: HashMap::new(),
        }
    }

    /// LESS, SASS/SCSS and CoffeeScript through their usual command-line
    /// tools. TypeScript is left unregistered.
    pub fn standard() -> Self {
        Self::empty()
            .with(SourceKind::Less, CommandCompiler::less())
            .with(SourceKind::Scss, CommandCompiler::scss())
            .with(SourceKind::Sass, CommandCompiler::sass())
            .with(SourceKind::CoffeeScript, CommandCompiler::coffee())
    }

    pub fn with(mut self, kind: SourceKind, compiler: impl Compiler + 'static) -> Self {
        self.register(kind, compiler);
        self
    }

    pub fn register(&mut self, kind: SourceKind, compiler: impl Compiler + 'static) {
        self.compilers.insert(kind, Arc::new(compiler));
    }

    pub fn unregister(&mut self, kind: SourceKind) {
        self.compilers.remove(&kind);
    }

    pub fn get(&self, kind: SourceKind) -> Option<&Arc<dyn Compiler>> {
        self.compilers.get(&kind)
    }

    /// Compile `source` if a compiler is registered for `kind`, otherwise
    /// return it unchanged.
    pub fn transform(&self, kind: SourceKind, source: String) -> Result<String> {
        match self.compilers.get(&kind) {
            Some(compiler) => compiler.compile(&source),
            None => Ok(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Compiler for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn compile(&self, source: &str) -> Result<String> {
            Ok(source.to_uppercase())
        }
    }

    struct Broken;

    impl Compiler for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn compile(&self, _source: &str) -> Result<String> {
            bail!("syntax error")
        }
    }

    #[test]
    fn unregistered_kind_passes_through() {
        let table = TransformTable::empty().with(SourceKind::Less, Upper);
        assert_eq!(
            table.transform(SourceKind::Css, "a{}".into()).unwrap(),
            "a{}"
        );
        assert_eq!(
            table.transform(SourceKind::Less, "a{}".into()).unwrap(),
            "A{}"
        );
    }

    #[test]
    fn lenient_keeps_source_on_failure() {
        let table = TransformTable::empty().with(SourceKind::TypeScript, Lenient(Broken));
        assert_eq!(
            table.transform(SourceKind::TypeScript, "let x: number = 1;".into()).unwrap(),
            "let x: number = 1;"
        );
    }

    #[test]
    fn standard_table_covers_stylesheet_and_script_languages() {
        let table = TransformTable::standard();
        for kind in [
            SourceKind::Less,
            SourceKind::Sass,
            SourceKind::Scss,
            SourceKind::CoffeeScript,
        ] {
            assert!(table.get(kind).is_some(), "{kind:?} should be registered");
        }
        assert!(table.get(SourceKind::TypeScript).is_none());
    }

    #[test]
    fn missing_tool_is_an_error() {
        let c = CommandCompiler::new("bundlekit-no-such-compiler", Vec::<String>::new());
        assert!(c.compile("x").is_err());
    }
}
