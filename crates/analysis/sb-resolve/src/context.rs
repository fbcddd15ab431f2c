//! Per-request binding context and the caches shared between requests

use crate::cancel::CancellationToken;
use crate::constants::EvaluatedConstant;
use crate::imports::ImportTable;
use crate::scope::PrimaryConstructorMap;
use crate::viability::{DefaultViability, ViabilityChecker};
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use sb_intern::{Interner, Name};
use sb_symbols::{SymbolGraph, SymbolId};
use sb_syntax::SyntaxId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use thiserror::Error;
use toml::de::Error as TomlError;
use tracing::trace;

/// Caller-controlled binding policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinderPolicy {
    /// A plain using may name a static class and import its static members
    #[serde(default = "default_true", rename = "allow-static-class-usings")]
    pub allow_static_class_usings: bool,

    /// Importing the same target twice is reported as a warning
    #[serde(default = "default_true", rename = "report-duplicate-usings")]
    pub report_duplicate_usings: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for BinderPolicy {
    fn default() -> Self {
        Self {
            allow_static_class_usings: true,
            report_duplicate_usings: true,
        }
    }
}

/// A policy fragment failed to parse
#[derive(Debug, Error)]
#[error("invalid binder policy: {0}")]
pub struct PolicyError(#[from] TomlError);

impl BinderPolicy {
    /// Parses a policy from a TOML fragment; missing keys take their defaults
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if the text is not valid TOML or a key has the
    /// wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, PolicyError> {
        Ok(toml::from_str(text)?)
    }
}

/// Derived declaration data shared by every analysis request
///
/// Each entry is computed outside the map and then offered with
/// `entry().or_insert`; a thread that loses the race drops its value and
/// uses the published one.
#[derive(Debug, Default)]
pub struct DeclarationCache {
    imports: DashMap<SyntaxId, Arc<ImportTable>>,
    primary_constructors: DashMap<SyntaxId, Arc<PrimaryConstructorMap>>,
    constants: DashMap<SymbolId, Arc<EvaluatedConstant>>,
}

impl DeclarationCache {
    /// Creates an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The import table of a compilation unit or namespace declaration
    pub fn import_table(
        &self,
        syntax: SyntaxId,
        build: impl FnOnce() -> ImportTable,
    ) -> Arc<ImportTable> {
        publish(&self.imports, syntax, build)
    }

    /// The primary-constructor map of a type declaration
    pub fn primary_constructor(
        &self,
        syntax: SyntaxId,
        build: impl FnOnce() -> PrimaryConstructorMap,
    ) -> Arc<PrimaryConstructorMap> {
        publish(&self.primary_constructors, syntax, build)
    }

    /// A published constant value
    #[must_use]
    pub fn constant(&self, field: SymbolId) -> Option<Arc<EvaluatedConstant>> {
        self.constants.get(&field).map(|entry| Arc::clone(entry.value()))
    }

    /// Offers a constant value; returns the published one and whether it was ours
    pub fn publish_constant(
        &self,
        field: SymbolId,
        value: EvaluatedConstant,
    ) -> (Arc<EvaluatedConstant>, bool) {
        let candidate = Arc::new(value);
        let published = Arc::clone(
            self.constants
                .entry(field)
                .or_insert_with(|| Arc::clone(&candidate))
                .value(),
        );
        let won = Arc::ptr_eq(&published, &candidate);
        (published, won)
    }
}

fn publish<K, V>(map: &DashMap<K, Arc<V>>, key: K, build: impl FnOnce() -> V) -> Arc<V>
where
    K: Eq + Hash,
{
    if let Some(existing) = map.get(&key) {
        return Arc::clone(existing.value());
    }

    let candidate = Arc::new(build());
    let published = Arc::clone(
        map.entry(key)
            .or_insert_with(|| Arc::clone(&candidate))
            .value(),
    );
    if !Arc::ptr_eq(&published, &candidate) {
        trace!("lost declaration cache race, discarding computed entry");
    }
    published
}

static DEFAULT_VIABILITY: DefaultViability = DefaultViability;

/// Everything a binding request needs besides the scope chain
///
/// Cheap to clone; clones share the graph, cache and cancellation flag.
#[derive(Clone)]
pub struct BindContext<'graph> {
    graph: &'graph SymbolGraph,
    cache: &'graph DeclarationCache,
    policy: BinderPolicy,
    viability: &'graph (dyn ViabilityChecker + Sync),
    cancellation: CancellationToken,
    extern_roots: Arc<FxHashMap<Name, SymbolId>>,
}

impl<'graph> BindContext<'graph> {
    /// A context with the default policy and viability rules
    #[must_use]
    pub fn new(graph: &'graph SymbolGraph, cache: &'graph DeclarationCache) -> Self {
        Self {
            graph,
            cache,
            policy: BinderPolicy::default(),
            viability: &DEFAULT_VIABILITY,
            cancellation: CancellationToken::new(),
            extern_roots: Arc::new(FxHashMap::default()),
        }
    }

    /// Replaces the policy
    #[must_use]
    pub const fn with_policy(mut self, policy: BinderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the viability rules
    #[must_use]
    pub fn with_viability(mut self, viability: &'graph (dyn ViabilityChecker + Sync)) -> Self {
        self.viability = viability;
        self
    }

    /// Observes `token` for cancellation
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Binds extern alias `alias` to the root namespace of an external reference
    #[must_use]
    pub fn with_extern_root(mut self, alias: &str, root: SymbolId) -> Self {
        let name = self.graph.interner().intern(alias);
        Arc::make_mut(&mut self.extern_roots).insert(name, root);
        self
    }

    /// The symbol graph
    #[must_use]
    pub const fn graph(&self) -> &'graph SymbolGraph {
        self.graph
    }

    /// The shared declaration cache
    #[must_use]
    pub const fn cache(&self) -> &'graph DeclarationCache {
        self.cache
    }

    /// The active policy
    #[must_use]
    pub const fn policy(&self) -> BinderPolicy {
        self.policy
    }

    /// The viability rules
    #[must_use]
    pub fn viability(&self) -> &'graph (dyn ViabilityChecker + Sync) {
        self.viability
    }

    /// The cancellation token
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// The interner of the symbol graph
    #[must_use]
    pub const fn interner(&self) -> &'graph Interner {
        self.graph.interner()
    }

    /// The root namespace an extern alias refers to
    #[must_use]
    pub fn extern_root(&self, alias: Name) -> Option<SymbolId> {
        self.extern_roots.get(&alias).copied()
    }
}

impl fmt::Debug for BindContext<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BindContext")
            .field("policy", &self.policy)
            .field("cancelled", &self.cancellation.is_cancelled())
            .field("extern_roots", &self.extern_roots.len())
            .finish_non_exhaustive()
    }
}
