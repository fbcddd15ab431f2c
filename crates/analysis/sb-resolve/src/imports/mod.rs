//! Import tables: using aliases, using directives and extern aliases
//!
//! One table exists per compilation unit or namespace declaration. It is
//! built from the directive syntax on first use, cached in the
//! [`DeclarationCache`](crate::DeclarationCache), consulted by container
//! scopes when their own members are not multi-viable, and validated once.

mod builder;
mod validate;

pub use validate::{CompletionPhase, CompletionState};

use crate::context::BindContext;
use crate::error::{Diagnostic, Diagnostics};
use crate::lazy::PublishCell;
use crate::lookup_result::{LookupResult, LookupResultKind};
use crate::names::{NameError, bind_type, resolve_name};
use crate::options::LookupOptions;
use crate::scope::{LookupRequest, Scope};
use crate::symbol::Symbol;
use dashmap::DashSet;
use indexmap::IndexMap;
use sb_intern::Name;
use sb_span::FileSpan;
use sb_symbols::{SymbolId, Ty};
use sb_syntax::{Location, NameSyntax, SyntaxId};
use std::sync::Arc;
use tracing::trace;

/// What an alias is declared as
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasKind {
    /// `using Name = Target;`
    Using(NameSyntax),
    /// `extern alias Name;`
    Extern,
}

/// Outcome of resolving an alias target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTarget {
    /// The namespace or type the alias denotes
    pub symbol: Option<SymbolId>,
    /// Bound type arguments of an aliased generic type, with their locations
    pub type_arguments: Vec<(Ty, FileSpan)>,
    /// Problems found while resolving
    pub diagnostics: Vec<Diagnostic>,
}

/// A using alias or extern alias
///
/// The target of a using alias is resolved on first use and published once.
#[derive(Debug)]
pub struct AliasSymbol {
    name: Name,
    location: Location,
    kind: AliasKind,
    target: PublishCell<AliasTarget>,
}

impl AliasSymbol {
    pub(crate) const fn using(name: Name, location: Location, target: NameSyntax) -> Self {
        Self {
            name,
            location,
            kind: AliasKind::Using(target),
            target: PublishCell::new(),
        }
    }

    pub(crate) fn extern_alias(name: Name, location: Location, target: AliasTarget) -> Self {
        Self {
            name,
            location,
            kind: AliasKind::Extern,
            target: PublishCell::with_value(target),
        }
    }

    /// Alias name
    #[must_use]
    pub const fn name(&self) -> Name {
        self.name
    }

    /// The declaring directive
    #[must_use]
    pub const fn location(&self) -> Location {
        self.location
    }

    /// Using alias or extern alias
    #[must_use]
    pub const fn kind(&self) -> &AliasKind {
        &self.kind
    }

    /// The target, if it has been resolved successfully
    #[must_use]
    pub fn resolved_target(&self) -> Option<SymbolId> {
        self.target.get().and_then(|target| target.symbol)
    }

    /// Resolves the target through `resolution` if no thread has yet
    ///
    /// `resolution` sees the extern aliases of the declaring table but none
    /// of its usings.
    pub fn force_target(&self, ctx: &BindContext<'_>, resolution: &Scope<'_>) -> &AliasTarget {
        self.target.get_or_publish(|| match &self.kind {
            AliasKind::Using(syntax) => resolve_alias_target(ctx, resolution, syntax),
            AliasKind::Extern => AliasTarget::default(),
        })
    }
}

fn resolve_alias_target(ctx: &BindContext<'_>, scope: &Scope<'_>, syntax: &NameSyntax) -> AliasTarget {
    match resolve_name(ctx, scope, syntax) {
        Ok(symbol) => {
            let mut diagnostics = Diagnostics::new();
            let type_arguments = syntax
                .last()
                .map(|segment| {
                    segment
                        .type_arguments
                        .iter()
                        .map(|argument| {
                            let ty = bind_type(ctx, scope, argument, &mut diagnostics);
                            (ty, argument.location().span)
                        })
                        .collect()
                })
                .unwrap_or_default();
            AliasTarget {
                symbol: Some(symbol),
                type_arguments,
                diagnostics: diagnostics.into_vec(),
            }
        }
        Err(error) => {
            let diagnostic = match error {
                NameError::NotFound { name, span } => Diagnostic::AliasTargetNotFound { name, span },
                NameError::WrongArity {
                    name,
                    expected,
                    found,
                    span,
                } => Diagnostic::AliasTargetWrongArity {
                    name,
                    expected,
                    found,
                    span,
                },
                NameError::Lookup(diagnostic) => diagnostic,
            };
            AliasTarget {
                symbol: None,
                type_arguments: Vec::new(),
                diagnostics: vec![diagnostic],
            }
        }
    }
}

/// A namespace or static type imported by a plain using, with its directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsingTarget {
    /// The imported namespace or type
    pub target: SymbolId,
    /// The declaring directive
    pub directive: Location,
}

/// Resolved directives of one compilation unit or namespace declaration
#[derive(Debug, Default)]
pub struct ImportTable {
    aliases: IndexMap<Name, Arc<AliasSymbol>>,
    externs: Vec<Arc<AliasSymbol>>,
    usings: Vec<UsingTarget>,
    externs_only: Option<Arc<ImportTable>>,
    directives: Vec<Location>,
    diagnostics: Vec<Diagnostic>,
    state: CompletionState,
    validation: PublishCell<Vec<Diagnostic>>,
    used: DashSet<SyntaxId>,
}

impl ImportTable {
    /// A table without directives
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Using aliases in declaration order
    pub fn aliases(&self) -> impl Iterator<Item = &Arc<AliasSymbol>> {
        self.aliases.values()
    }

    /// Extern aliases in declaration order
    #[must_use]
    pub fn externs(&self) -> &[Arc<AliasSymbol>] {
        &self.externs
    }

    /// Namespaces and types imported by plain usings, in declaration order
    #[must_use]
    pub fn usings(&self) -> &[UsingTarget] {
        &self.usings
    }

    /// The using alias called `name`
    #[must_use]
    pub fn using_alias(&self, name: Name) -> Option<&Arc<AliasSymbol>> {
        self.aliases.get(&name)
    }

    /// Whether a using alias called `name` is declared
    #[must_use]
    pub fn is_using_alias(&self, name: Name) -> bool {
        self.aliases.contains_key(&name)
    }

    /// Problems found while building the table (duplicates, bad usings)
    #[must_use]
    pub fn build_diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The scope alias targets are resolved in: the container's members and
    /// the extern aliases of this table, in front of `next`
    #[must_use]
    pub fn resolution_scope<'scope>(
        &self,
        next: Option<&'scope Scope<'scope>>,
        container: SymbolId,
    ) -> Scope<'scope> {
        let externs = self
            .externs_only
            .clone()
            .unwrap_or_else(|| Arc::new(Self::empty()));
        Scope::with_import_table(next, container, externs)
    }

    /// Looks a name up among aliases, then (unless only aliases are wanted
    /// or an alias matched) among imported namespaces and types
    pub fn lookup_symbol(
        &self,
        ctx: &BindContext<'_>,
        next: Option<&Scope<'_>>,
        container: SymbolId,
        result: &mut LookupResult,
        request: &LookupRequest,
    ) {
        self.lookup_in_aliases(ctx, next, container, result, request);
        if !result.is_multi_viable()
            && !request.options.contains(LookupOptions::NAMESPACE_ALIASES_ONLY)
        {
            self.lookup_in_usings(ctx, result, request);
        }
    }

    /// Looks a name up among using aliases and extern aliases
    pub fn lookup_in_aliases(
        &self,
        ctx: &BindContext<'_>,
        next: Option<&Scope<'_>>,
        container: SymbolId,
        result: &mut LookupResult,
        request: &LookupRequest,
    ) {
        if let Some(alias) = self.aliases.get(&request.name) {
            let resolution = self.resolution_scope(next, container);
            alias.force_target(ctx, &resolution);
            self.merge_candidate(ctx, result, request, Symbol::Alias(Arc::clone(alias)), alias.location);
        }

        for alias in self.externs.iter().filter(|alias| alias.name == request.name) {
            self.merge_candidate(ctx, result, request, Symbol::Alias(Arc::clone(alias)), alias.location);
        }
    }

    /// Looks a name up among the types of imported namespaces and the
    /// static members and nested types of imported static classes
    pub fn lookup_in_usings(
        &self,
        ctx: &BindContext<'_>,
        result: &mut LookupResult,
        request: &LookupRequest,
    ) {
        if request.options.contains(LookupOptions::NAMESPACE_ALIASES_ONLY) {
            return;
        }
        let graph = ctx.graph();

        for using in &self.usings {
            let imports_namespace = graph.get(using.target).is_namespace();
            for member in graph.members(using.target, request.name) {
                let data = graph.get(*member);
                let imported = if imports_namespace {
                    data.is_type()
                } else {
                    data.is_static() && !data.as_method().is_some_and(|method| method.is_extension)
                };
                if imported {
                    self.merge_candidate(ctx, result, request, Symbol::Global(*member), using.directive);
                }
            }
        }
    }

    fn merge_candidate(
        &self,
        ctx: &BindContext<'_>,
        result: &mut LookupResult,
        request: &LookupRequest,
        symbol: Symbol,
        directive: Location,
    ) {
        let single = request.check(ctx, symbol);
        if single.kind == LookupResultKind::Viable {
            self.used.insert(directive.syntax);
        }
        result.merge_equal(single);
    }

    /// Extension methods called `name` from imported namespaces and static classes
    #[must_use]
    pub fn extension_methods(&self, ctx: &BindContext<'_>, name: Name) -> Vec<SymbolId> {
        let graph = ctx.graph();
        let mut found = Vec::new();
        for using in &self.usings {
            let before = found.len();
            if graph.get(using.target).is_namespace() {
                for class in graph.all_members(using.target) {
                    found.extend(graph.extension_methods(class, name));
                }
            } else {
                found.extend(graph.extension_methods(using.target, name));
            }
            if found.len() > before {
                self.used.insert(using.directive.syntax);
            }
        }
        found
    }

    /// Records that a directive contributed to a successful lookup
    pub fn mark_used(&self, directive: SyntaxId) {
        self.used.insert(directive);
    }

    /// Directives that never contributed to a successful lookup, in declaration order
    #[must_use]
    pub fn unused_directives(&self) -> Vec<Location> {
        self.directives
            .iter()
            .copied()
            .filter(|directive| !self.used.contains(&directive.syntax))
            .collect()
    }

    pub(crate) fn trace_summary(&self) {
        trace!(
            aliases = self.aliases.len(),
            externs = self.externs.len(),
            usings = self.usings.len(),
            diagnostics = self.diagnostics.len(),
            "built import table"
        );
    }
}
