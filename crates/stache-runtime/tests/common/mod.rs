/*
 * common/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Shared helpers for the integration tests.
 */

#![allow(dead_code)]

use stache_runtime::{
    CompileOptions, Compiler, Program, ProgramBuilder, Template, TemplateError, TemplateResult,
    Value,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type TemplateFactory = Box<dyn Fn() -> Template + Send + Sync>;

/// A compiler that knows a fixed set of sources.
///
/// Each known source maps to a template factory; the compiled template gets
/// the source text and options attached. Unknown sources fail with a parse
/// error. Every call is counted and its options recorded.
#[derive(Default)]
pub struct MapCompiler {
    templates: HashMap<String, TemplateFactory>,
    compiles: AtomicUsize,
    seen_options: Mutex<Vec<CompileOptions>>,
}

impl MapCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `source` to `program`.
    pub fn with(self, source: &str, program: ProgramBuilder) -> Self {
        let program = program.build();
        self.with_template(source, move || Template::new(program.clone()))
    }

    /// Compile `source` to whatever `factory` builds, for sources that need
    /// a partials table or blocks.
    pub fn with_template<F>(mut self, source: &str, factory: F) -> Self
    where
        F: Fn() -> Template + Send + Sync + 'static,
    {
        self.templates.insert(source.to_string(), Box::new(factory));
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn compiles(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }

    pub fn seen_options(&self) -> Vec<CompileOptions> {
        self.seen_options.lock().unwrap().clone()
    }
}

impl Compiler for MapCompiler {
    fn compile(&self, source: &str, options: &CompileOptions) -> TemplateResult<Template> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        self.seen_options.lock().unwrap().push(options.clone());

        let factory = self
            .templates
            .get(source)
            .ok_or_else(|| TemplateError::ParseError {
                message: format!("unknown source: {source:?}"),
            })?;
        Ok(factory()
            .with_source(source)
            .with_options(options.clone()))
    }
}

/// Erase the concrete compiler type.
pub fn as_compiler(compiler: &Arc<MapCompiler>) -> Arc<dyn Compiler> {
    Arc::clone(compiler) as Arc<dyn Compiler>
}

/// Build a context map from key/value pairs.
pub fn map(entries: &[(&str, Value)]) -> Value {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn text(s: &str) -> ProgramBuilder {
    Program::builder().text(s)
}

/// Path to a file under `test-fixtures/`.
pub fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join("test-fixtures").join(name)
}

/// Load a program serialized as JSON from the fixtures directory.
pub fn load_program(name: &str) -> Program {
    let path = fixture_path(name);
    let json = std::fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("Failed to read fixture: {}", name));
    serde_json::from_str(&json).unwrap_or_else(|e| panic!("Invalid program in {}: {}", name, e))
}
