/*
 * partial.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Partial resolution and specialization.
//!
//! A template refers to partials through local symbols. At render time each
//! symbol is resolved against the caller's [`PartialPool`]:
//!
//! 1. Plain inclusions (`{{>name}}`) render the pool entry as it is.
//! 2. Parent inclusions (`{{<name}}...{{/name}}`) render a
//!    specialized template: the pool entry with the call site's block
//!    overrides layered on top of its own blocks.
//!
//! Overrides stack up the inheritance chain. When a specialized template
//! includes its own parent, the overrides it inherited are kept and the new
//! call site only contributes blocks that nobody below it overrode, so the
//! most-derived template always wins.
//!
//! Specialized instances are cached per symbol on the template that resolved
//! them, keyed by the identity of the pool entry they were built from.

use crate::compiler::{Compiler, compile_with};
use crate::error::{TemplateError, TemplateResult};
use crate::options::CompileOptions;
use crate::program::Program;
use crate::template::{BlockMap, PartialRef, PartialTable, Template};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Partials supplied by the caller of a render.
///
/// Entries are either compiled templates or source text. Source entries are
/// compiled on first use and the result is kept in the entry, so it stays the
/// same base template for as long as the pool lives.
#[derive(Default)]
pub struct PartialPool {
    entries: HashMap<String, PoolEntry>,
    compiler: Option<Arc<dyn Compiler>>,
}

enum PoolEntry {
    Template(Arc<Template>),
    Source {
        text: String,
        compiled: OnceLock<Arc<Template>>,
    },
}

impl PartialPool {
    /// Create a new empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a compiled partial.
    pub fn add_template(&mut self, name: impl Into<String>, template: Arc<Template>) -> &mut Self {
        self.entries
            .insert(name.into(), PoolEntry::Template(template));
        self
    }

    /// Add a partial as source text, compiled on first use.
    pub fn add_source(&mut self, name: impl Into<String>, source: impl Into<String>) -> &mut Self {
        self.entries.insert(
            name.into(),
            PoolEntry::Source {
                text: source.into(),
                compiled: OnceLock::new(),
            },
        );
        self
    }

    /// Create a pool with the given compiled partials.
    pub fn with_templates(
        partials: impl IntoIterator<Item = (impl Into<String>, Arc<Template>)>,
    ) -> Self {
        let mut pool = Self::new();
        for (name, template) in partials {
            pool.add_template(name, template);
        }
        pool
    }

    /// Create a pool with the given partial sources.
    pub fn with_sources(
        partials: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut pool = Self::new();
        for (name, source) in partials {
            pool.add_source(name, source);
        }
        pool
    }

    /// Compiler for source entries, used when the including template has
    /// none of its own.
    pub fn with_compiler(mut self, compiler: Arc<dyn Compiler>) -> Self {
        self.compiler = Some(compiler);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub(crate) fn compiler(&self) -> Option<&Arc<dyn Compiler>> {
        self.compiler.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The base template for `name`, compiling a source entry if needed.
    pub(crate) fn base(
        &self,
        name: &str,
        compiler: Option<&Arc<dyn Compiler>>,
        options: &CompileOptions,
    ) -> TemplateResult<Option<Arc<Template>>> {
        match self.entries.get(name) {
            None => Ok(None),
            Some(PoolEntry::Template(template)) => Ok(Some(Arc::clone(template))),
            Some(PoolEntry::Source { text, compiled }) => {
                if let Some(template) = compiled.get() {
                    return Ok(Some(Arc::clone(template)));
                }
                let compiler = compiler.or(self.compiler.as_ref()).ok_or_else(|| {
                    TemplateError::MissingCompiler {
                        context: format!("partial '{name}'"),
                    }
                })?;
                tracing::debug!(partial = name, "Compiling partial source");
                let template = compile_with(compiler, text, options)?;
                // First writer wins if two renders compile concurrently.
                let _ = compiled.set(template);
                Ok(compiled.get().cloned())
            }
        }
    }
}

/// A block override together with the source it was written in.
#[derive(Debug, Clone)]
pub(crate) struct SubOverride {
    pub(crate) body: Arc<Program>,
    pub(crate) source: Arc<str>,
}

/// A partial whose blocks are overridden by the templates including it.
#[derive(Debug)]
pub(crate) struct SpecializedTemplate {
    base: Arc<Template>,
    /// Overrides inherited from every including template, most-derived first.
    subs: IndexMap<String, SubOverride>,
    /// Partials referenced from the override bodies.
    partials: PartialTable,
    cache: PartialCache,
}

/// The template whose program is executing: a plain template or a
/// specialized one.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Instance<'t> {
    Base(&'t Template),
    Specialized(&'t SpecializedTemplate),
}

/// A block body ready to render.
pub(crate) struct BlockBody {
    pub(crate) body: Arc<Program>,
    pub(crate) source: Arc<str>,
}

impl<'t> Instance<'t> {
    /// The template providing the program, options and compiler.
    pub(crate) fn template(self) -> &'t Template {
        match self {
            Instance::Base(template) => template,
            Instance::Specialized(specialized) => &specialized.base,
        }
    }

    pub(crate) fn program(self) -> &'t Program {
        &self.template().program
    }

    pub(crate) fn source(self) -> &'t Arc<str> {
        &self.template().source
    }

    /// Body of block `name`: an inherited override if any, the default body
    /// otherwise.
    pub(crate) fn block(self, name: &str) -> Option<BlockBody> {
        if let Instance::Specialized(specialized) = self {
            if let Some(sub) = specialized.subs.get(name) {
                return Some(BlockBody {
                    body: Arc::clone(&sub.body),
                    source: Arc::clone(&sub.source),
                });
            }
        }
        let template = self.template();
        template.subs.get(name).map(|body| BlockBody {
            body: Arc::clone(body),
            source: Arc::clone(&template.source),
        })
    }

    fn partial_ref(self, symbol: &str) -> Option<&'t Arc<PartialRef>> {
        match self {
            Instance::Base(template) => template.partials.get(symbol),
            Instance::Specialized(specialized) => specialized
                .partials
                .get(symbol)
                .or_else(|| specialized.base.partials.get(symbol)),
        }
    }

    fn cache(self) -> &'t PartialCache {
        match self {
            Instance::Base(template) => &template.cache,
            Instance::Specialized(specialized) => &specialized.cache,
        }
    }

    fn inherited_subs(self) -> Option<&'t IndexMap<String, SubOverride>> {
        match self {
            Instance::Base(_) => None,
            Instance::Specialized(specialized) => Some(&specialized.subs),
        }
    }

    fn inherited_partials(self) -> Option<&'t PartialTable> {
        match self {
            Instance::Base(_) => None,
            Instance::Specialized(specialized) => Some(&specialized.partials),
        }
    }
}

/// A resolved partial, owned so it can outlive the cache lookup.
#[derive(Debug, Clone)]
pub(crate) enum Resolved {
    Base(Arc<Template>),
    Specialized(Arc<SpecializedTemplate>),
}

impl Resolved {
    pub(crate) fn instance(&self) -> Instance<'_> {
        match self {
            Resolved::Base(template) => Instance::Base(template),
            Resolved::Specialized(specialized) => Instance::Specialized(specialized),
        }
    }
}

/// Per-instance memo of specialized partials.
#[derive(Debug, Default)]
pub(crate) struct PartialCache {
    entries: RwLock<HashMap<String, Arc<SpecializedTemplate>>>,
    specializations: AtomicUsize,
}

impl PartialCache {
    /// The cached instance for `symbol`, if it was built from `base`.
    fn get(&self, symbol: &str, base: &Arc<Template>) -> Option<Arc<SpecializedTemplate>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(symbol)
            .filter(|cached| Arc::ptr_eq(&cached.base, base))
            .cloned()
    }

    /// Store `specialized` unless an instance for the same base was stored
    /// first, and return whichever is cached.
    fn insert(
        &self,
        symbol: &str,
        specialized: SpecializedTemplate,
    ) -> Arc<SpecializedTemplate> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = entries.get(symbol) {
            if Arc::ptr_eq(&cached.base, &specialized.base) {
                return Arc::clone(cached);
            }
        }
        let specialized = Arc::new(specialized);
        entries.insert(symbol.to_string(), Arc::clone(&specialized));
        specialized
    }

    pub(crate) fn specializations(&self) -> usize {
        self.specializations.load(Ordering::Relaxed)
    }
}

/// Resolve `symbol` from the partials table of `instance`.
///
/// Returns the partial's pool name alongside the resolved instance. A
/// missing symbol or pool entry resolves to `None`, or to
/// [`TemplateError::PartialNotFound`] when `strict` is set. `sub_source` is
/// the source text the call site was written in (the active block
/// override's, when the call sits inside one).
pub(crate) fn resolve_partial(
    instance: Instance<'_>,
    symbol: &str,
    pool: &PartialPool,
    sub_source: &Arc<str>,
    strict: bool,
) -> TemplateResult<Option<(String, Resolved)>> {
    let Some(partial) = instance.partial_ref(symbol) else {
        return missing_partial(symbol, strict);
    };

    let template = instance.template();
    let Some(base) = pool.base(&partial.name, template.compiler.as_ref(), &template.options)?
    else {
        return missing_partial(&partial.name, strict);
    };

    let Some(call_subs) = &partial.subs else {
        return Ok(Some((partial.name.clone(), Resolved::Base(base))));
    };

    let cache = instance.cache();
    if let Some(cached) = cache.get(symbol, &base) {
        tracing::debug!(symbol, partial = %partial.name, "Reusing specialized partial");
        return Ok(Some((partial.name.clone(), Resolved::Specialized(cached))));
    }

    let specialized = specialize(base, call_subs, &partial.partials, instance, sub_source);
    cache.specializations.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(
        symbol,
        partial = %partial.name,
        overrides = specialized.subs.len(),
        "Specialized partial"
    );
    let specialized = cache.insert(symbol, specialized);
    Ok(Some((partial.name.clone(), Resolved::Specialized(specialized))))
}

fn missing_partial<T>(name: &str, strict: bool) -> TemplateResult<Option<T>> {
    if strict {
        return Err(TemplateError::PartialNotFound {
            name: name.to_string(),
        });
    }
    tracing::debug!(partial = name, "Partial not found, rendering nothing");
    Ok(None)
}

/// Layer the call site's overrides below those inherited by `caller`.
fn specialize(
    base: Arc<Template>,
    call_subs: &BlockMap,
    call_partials: &PartialTable,
    caller: Instance<'_>,
    sub_source: &Arc<str>,
) -> SpecializedTemplate {
    let mut subs = caller.inherited_subs().cloned().unwrap_or_default();
    for (name, body) in call_subs {
        subs.entry(name.clone()).or_insert_with(|| SubOverride {
            body: Arc::clone(body),
            source: Arc::clone(sub_source),
        });
    }

    let mut partials = caller.inherited_partials().cloned().unwrap_or_default();
    for (symbol, partial) in call_partials {
        partials
            .entry(symbol.clone())
            .or_insert_with(|| Arc::clone(partial));
    }

    SpecializedTemplate {
        base,
        subs,
        partials,
        cache: PartialCache::default(),
    }
}
