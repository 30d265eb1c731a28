/*
 * template.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Compiled template instances.
//!
//! A [`Template`] bundles a render [`Program`] with the tables the program
//! refers to: the partials table (local symbol → [`PartialRef`]) and the
//! default bodies of its blocks. Templates are immutable once built apart
//! from the lazily populated partial cache, and are meant to be shared as
//! `Arc<Template>` between render calls and threads.

use crate::compiler::Compiler;
use crate::options::CompileOptions;
use crate::partial::PartialCache;
use crate::program::Program;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Block name → block body.
pub type BlockMap = IndexMap<String, Arc<Program>>;

/// Local partial symbol → partial reference.
pub type PartialTable = HashMap<String, Arc<PartialRef>>;

/// An entry of a template's partials table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRef {
    /// Name of the partial in the caller's [`PartialPool`](crate::PartialPool).
    pub name: String,

    /// Block overrides supplied at the call site. `Some` (even when empty)
    /// marks a parent inclusion, `{{<name}}...{{/name}}`, whose target is
    /// specialized with these overrides.
    pub subs: Option<BlockMap>,

    /// Partials referenced from inside the override bodies.
    pub partials: PartialTable,
}

impl PartialRef {
    /// A plain inclusion, `{{>name}}`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A parent inclusion, `{{<name}}...{{/name}}`.
    pub fn parent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subs: Some(BlockMap::new()),
            partials: PartialTable::new(),
        }
    }

    /// Override block `name` with `body`. Turns a plain inclusion into a
    /// parent inclusion.
    pub fn with_sub(mut self, name: impl Into<String>, body: impl Into<Program>) -> Self {
        self.subs
            .get_or_insert_with(BlockMap::new)
            .insert(name.into(), Arc::new(body.into()));
        self
    }

    /// Register a partial used inside the override bodies.
    pub fn with_partial(mut self, symbol: impl Into<String>, partial: PartialRef) -> Self {
        self.partials.insert(symbol.into(), Arc::new(partial));
        self
    }
}

/// A compiled template ready for rendering.
pub struct Template {
    pub(crate) program: Program,

    /// Source text, sliced for section lambdas.
    pub(crate) source: Arc<str>,

    pub(crate) partials: PartialTable,

    /// Default block bodies.
    pub(crate) subs: BlockMap,

    pub(crate) options: CompileOptions,

    /// Compiler used for lambda output and source partials.
    pub(crate) compiler: Option<Arc<dyn Compiler>>,

    pub(crate) cache: PartialCache,
}

impl Template {
    /// Create a template from a compiled program.
    pub fn new(program: impl Into<Program>) -> Self {
        Self {
            program: program.into(),
            source: Arc::from(""),
            partials: PartialTable::new(),
            subs: BlockMap::new(),
            options: CompileOptions::default(),
            compiler: None,
            cache: PartialCache::default(),
        }
    }

    /// Set the source text the program was compiled from.
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = source.into();
        self
    }

    /// Add an entry to the partials table.
    pub fn with_partial(mut self, symbol: impl Into<String>, partial: PartialRef) -> Self {
        self.partials.insert(symbol.into(), Arc::new(partial));
        self
    }

    /// Set the default body of block `name`.
    pub fn with_block(mut self, name: impl Into<String>, body: impl Into<Program>) -> Self {
        self.subs.insert(name.into(), Arc::new(body.into()));
        self
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_compiler(mut self, compiler: Arc<dyn Compiler>) -> Self {
        self.compiler = Some(compiler);
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn partials(&self) -> &PartialTable {
        &self.partials
    }

    pub fn blocks(&self) -> &BlockMap {
        &self.subs
    }

    pub fn compiler(&self) -> Option<&Arc<dyn Compiler>> {
        self.compiler.as_ref()
    }

    /// Number of specialized partials this template has built so far.
    ///
    /// Resolving the same symbol against an unchanged pool entry reuses the
    /// cached instance and does not increase the count.
    pub fn specialization_count(&self) -> usize {
        self.cache.specializations()
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("program", &self.program)
            .field("source", &self.source)
            .field("partials", &self.partials)
            .field("subs", &self.subs)
            .field("options", &self.options)
            .field("has_compiler", &self.compiler.is_some())
            .finish_non_exhaustive()
    }
}
