//! The lookup algorithm
//!
//! Lookup walks the chain from the innermost scope outwards. Each scope's
//! candidates are classified by the viability checker and merged into one
//! tier; tiers are merged into the running result with the equal-merge rule.
//! The walk stops at the first scope that yields a found result, so a
//! viable inner declaration hides every outer one.

use super::{Scope, ScopeKind, type_parameter_context};
use crate::context::BindContext;
use crate::error::Diagnostic;
use crate::lookup_result::{LookupResult, SingleLookupResult};
use crate::options::LookupOptions;
use crate::symbol::{ErrorSymbol, Symbol};
use rustc_hash::FxHashSet;
use sb_intern::Name;
use sb_symbols::SymbolId;
use std::sync::Arc;
use tracing::{debug, trace};

/// One lookup question
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LookupRequest {
    /// Name being looked up
    pub name: Name,
    /// Number of type arguments supplied
    pub arity: usize,
    /// Restrictions on acceptable entities
    pub options: LookupOptions,
    /// Type the referencing code sits in, for accessibility
    pub within: Option<SymbolId>,
}

impl LookupRequest {
    /// A request from namespace-level code
    #[must_use]
    pub const fn new(name: Name, arity: usize, options: LookupOptions) -> Self {
        Self {
            name,
            arity,
            options,
            within: None,
        }
    }

    /// Classifies one candidate with the context's viability rules
    #[must_use]
    pub fn check(&self, ctx: &BindContext<'_>, symbol: Symbol) -> SingleLookupResult {
        ctx.viability()
            .check(ctx, &symbol, self.arity, self.options, self.within)
    }
}

#[allow(clippy::multiple_inherent_impl, reason = "Lookup is kept apart from scope construction")]
impl<'tree> Scope<'tree> {
    /// Looks `name` up with `arity` type arguments, starting at this scope
    ///
    /// Never fails; problems are encoded in the result's kind and turned
    /// into diagnostics by the caller if it needs one.
    pub fn lookup(
        &self,
        ctx: &BindContext<'_>,
        name: Name,
        arity: usize,
        options: LookupOptions,
    ) -> LookupResult {
        let request = LookupRequest {
            name,
            arity,
            options,
            within: self.containing_type(ctx),
        };

        let mut result = LookupResult::empty();
        for (depth, scope) in self.chain().enumerate() {
            let mut tier = LookupResult::empty();
            scope.lookup_in_single_scope(ctx, &mut tier, &request);
            if !tier.is_clear() {
                trace!(depth, kind = ?tier.kind(), candidates = tier.symbols().len(), "scope contributed candidates");
            }
            result.merge_equal_result(tier);

            if result.is_found() {
                break;
            }
            let leaves_body = matches!(scope.kind, ScopeKind::Method(_) | ScopeKind::Lambda(_));
            if options.contains(LookupOptions::LABELS_ONLY) && leaves_body {
                break;
            }
        }

        debug!(
            name = ctx.interner().resolve(name),
            arity,
            kind = ?result.kind(),
            "lookup finished"
        );
        result
    }

    fn lookup_in_single_scope(
        &self,
        ctx: &BindContext<'_>,
        result: &mut LookupResult,
        request: &LookupRequest,
    ) {
        if let ScopeKind::Container { container, .. } = &self.kind {
            self.lookup_in_container(ctx, result, *container, request);
            return;
        }
        if request.options.contains(LookupOptions::NAMESPACE_ALIASES_ONLY) {
            return;
        }

        let mut scoped = *request;
        if let ScopeKind::TypeParameters { owner, .. } = &self.kind {
            scoped.within = type_parameter_context(ctx, *owner);
        }

        let table = self.local_table(ctx);
        let candidates = if request.options.contains(LookupOptions::LABELS_ONLY) {
            table.labels(request.name)
        } else {
            table.locals(request.name)
        };
        for candidate in candidates {
            result.merge_equal(scoped.check(ctx, candidate.clone()));
        }
    }

    fn lookup_in_container(
        &self,
        ctx: &BindContext<'_>,
        result: &mut LookupResult,
        container: SymbolId,
        request: &LookupRequest,
    ) {
        if request.options.contains(LookupOptions::LABELS_ONLY) {
            return;
        }

        let graph = ctx.graph();
        if !request.options.contains(LookupOptions::NAMESPACE_ALIASES_ONLY) {
            if graph.get(container).is_type() {
                lookup_in_type(ctx, result, container, request);
            } else {
                for member in graph.members(container, request.name) {
                    result.merge_equal(request.check(ctx, Symbol::Global(*member)));
                }
            }
        }

        let Some(imports) = self.import_table(ctx) else {
            return;
        };

        if result.is_multi_viable() {
            if let Some(alias) = imports.using_alias(request.name)
                && member_conflicts_with_alias(ctx, result, request.arity)
            {
                debug!(
                    name = ctx.interner().resolve(request.name),
                    "using alias conflicts with a member of the same name"
                );
                let diagnostic = Diagnostic::AliasConflictsWithMember {
                    name: request.name,
                    span: alias.location().span,
                };
                result.set_from(SingleLookupResult::good(Symbol::Error(Arc::new(
                    ErrorSymbol {
                        name: request.name,
                        diagnostic,
                    },
                ))));
            }
            return;
        }

        imports.lookup_symbol(ctx, self.next, container, result, request);
    }

    /// Extension methods called `name` visible from this scope, nearest scope first
    ///
    /// Collected from static classes of enclosing namespaces and from the
    /// targets of using directives.
    #[must_use]
    pub fn lookup_extension_methods(&self, ctx: &BindContext<'_>, name: Name) -> Vec<SymbolId> {
        let graph = ctx.graph();
        let mut seen = FxHashSet::default();
        let mut found = Vec::new();

        for scope in self.chain() {
            let ScopeKind::Container { container, .. } = &scope.kind else {
                continue;
            };
            if graph.get(*container).is_namespace() {
                for member in graph.all_members(*container) {
                    found.extend(
                        graph
                            .extension_methods(member, name)
                            .filter(|method| seen.insert(*method)),
                    );
                }
            }
            if let Some(imports) = scope.import_table(ctx) {
                found.extend(
                    imports
                        .extension_methods(ctx, name)
                        .into_iter()
                        .filter(|method| seen.insert(*method)),
                );
            }
        }

        trace!(candidates = found.len(), "collected extension methods");
        found
    }
}

/// Whether the members found conflict with a same-named using alias
///
/// A generic type referenced with type arguments cannot be an alias, so it
/// does not conflict.
fn member_conflicts_with_alias(ctx: &BindContext<'_>, result: &LookupResult, arity: usize) -> bool {
    let first_is_type = result
        .symbols()
        .first()
        .and_then(Symbol::as_global)
        .is_some_and(|id| ctx.graph().get(id).is_type());
    !first_is_type || arity == 0
}

fn lookup_in_type(
    ctx: &BindContext<'_>,
    result: &mut LookupResult,
    ty: SymbolId,
    request: &LookupRequest,
) {
    let graph = ctx.graph();
    let hierarchy = std::iter::once(ty)
        .chain(graph.base_types(ty))
        .chain(graph.all_interfaces(ty));

    for current in hierarchy {
        let mut tier = LookupResult::empty();
        for member in graph.members(current, request.name) {
            tier.merge_equal(request.check(ctx, Symbol::Global(*member)));
        }

        if tier.is_found() {
            if result.is_found() {
                if result.is_method_group() && tier.is_method_group() {
                    result.merge_equal_result(tier);
                }
                continue;
            }
            let hides_bases = !tier.is_method_group();
            result.merge_equal_result(tier);
            if hides_bases {
                break;
            }
        } else if !result.is_found() {
            result.merge_equal_result(tier);
        }
    }
}

/// Looks `name` up among the members of `ty` and its base types
///
/// A found non-method member of a more derived type hides base members;
/// methods accumulate across the hierarchy into one group.
pub fn lookup_members_in_type(
    ctx: &BindContext<'_>,
    ty: SymbolId,
    name: Name,
    arity: usize,
    options: LookupOptions,
    within: Option<SymbolId>,
) -> LookupResult {
    let request = LookupRequest {
        name,
        arity,
        options,
        within,
    };
    let mut result = LookupResult::empty();
    lookup_in_type(ctx, &mut result, ty, &request);
    result
}
