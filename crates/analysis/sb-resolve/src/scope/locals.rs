//! Declarations contributed by a single scope

use super::walker::TableBuilder;
use super::{LoopHeader, Scope, ScopeKind, TypeParameterLevel};
use crate::context::BindContext;
use crate::error::Diagnostic;
use crate::symbol::{LocalDeclarationKind, LocalKind, LocalSymbol, Symbol};
use rustc_hash::FxHashMap;
use sb_intern::Name;
use sb_symbols::{NameMap, SymbolKind};
use sb_syntax::{ForInitializer, Location, TypeDecl};
use std::sync::Arc;
use tracing::trace;

/// Name-indexed declarations of one scope
///
/// Locals and labels live in separate maps; only label lookups see labels.
#[derive(Debug, Default)]
pub struct LocalTable {
    pub(super) locals: NameMap<Symbol>,
    pub(super) labels: NameMap<Symbol>,
    pub(super) diagnostics: Vec<Diagnostic>,
}

impl LocalTable {
    /// Computes the declarations of a scope kind
    ///
    /// Pure function of the syntax and the symbol graph, so concurrent
    /// computations agree.
    pub(super) fn build(ctx: &BindContext<'_>, kind: &ScopeKind<'_>) -> Self {
        let graph = ctx.graph();
        let mut builder = TableBuilder::default();

        match kind {
            ScopeKind::Container { .. } | ScopeKind::Region => {}
            ScopeKind::TypeParameters { owner, level } => {
                let parameters = match (level, &graph.get(*owner).kind) {
                    (TypeParameterLevel::DeclaringType, SymbolKind::Type(data)) => {
                        data.type_parameters.as_slice()
                    }
                    (TypeParameterLevel::Method, SymbolKind::Method(data)) => {
                        data.type_parameters.as_slice()
                    }
                    _ => &[],
                };
                for parameter in parameters {
                    builder.add_global(graph.name(*parameter), *parameter);
                }
            }
            ScopeKind::PrimaryConstructor { ty, .. } => {
                let parameters = graph
                    .get(*ty)
                    .as_type()
                    .and_then(|data| data.primary_constructor.as_deref())
                    .unwrap_or_default();
                for parameter in parameters {
                    builder.add_global(graph.name(*parameter), *parameter);
                }
            }
            ScopeKind::Method(method) => {
                let parameters = graph
                    .get(*method)
                    .as_method()
                    .map(|data| data.parameters.as_slice())
                    .unwrap_or_default();
                for parameter in parameters {
                    builder.add_global(graph.name(*parameter), *parameter);
                }
            }
            ScopeKind::Lambda(info) => {
                for (ordinal, (identifier, ty)) in info.parameters.iter().enumerate() {
                    builder.add_local(
                        *identifier,
                        LocalKind::LambdaParameter {
                            ordinal,
                            ty: ty.clone(),
                        },
                    );
                }
            }
            ScopeKind::RangeVariables(variables) => {
                for variable in variables {
                    builder.add_local(*variable, LocalKind::RangeVariable);
                }
            }
            ScopeKind::Block(block) => builder.declare_statements(&block.statements),
            ScopeKind::EmbeddedStatement(statement) => builder.declare_statement(statement),
            ScopeKind::Expression(expr) => builder.find_expression_variables(expr),
            ScopeKind::LoopHeader(LoopHeader::While(statement)) => {
                builder.find_expression_variables(&statement.condition);
            }
            ScopeKind::LoopHeader(LoopHeader::For(statement)) => {
                if let Some(condition) = &statement.condition {
                    builder.find_expression_variables(condition);
                }
                for incrementor in &statement.incrementors {
                    builder.find_expression_variables(incrementor);
                }
            }
            ScopeKind::ForInitializer(statement) => match &statement.initializer {
                ForInitializer::Empty => {}
                ForInitializer::Declaration(declaration) => builder.declare_variables(
                    declaration,
                    LocalDeclarationKind::ForInitializer,
                ),
                ForInitializer::Expressions(expressions) => {
                    for expr in expressions {
                        builder.find_expression_variables(expr);
                    }
                }
            },
            ScopeKind::Catch(clause) => {
                if let Some(identifier) = clause
                    .declaration
                    .as_ref()
                    .and_then(|declaration| declaration.identifier)
                {
                    builder.add_local(identifier, LocalKind::Variable(LocalDeclarationKind::Catch));
                }
            }
            ScopeKind::Fixed(statement) => {
                builder.declare_variables(&statement.declaration, LocalDeclarationKind::Fixed);
            }
        }

        let table = builder.finish();
        trace!(
            locals = table.locals.len(),
            labels = table.labels.len(),
            "computed scope declarations"
        );
        table
    }

    /// Locals declared under `name`
    #[must_use]
    pub fn locals(&self, name: Name) -> &[Symbol] {
        self.locals.get(name)
    }

    /// Labels declared under `name`
    #[must_use]
    pub fn labels(&self, name: Name) -> &[Symbol] {
        self.labels.get(name)
    }

    /// Every local in declaration order
    pub fn all_locals(&self) -> impl Iterator<Item = &Symbol> {
        self.locals.iter().map(|(_, symbol)| symbol)
    }

    /// Local variables as declared entities, in declaration order
    pub fn local_symbols(&self) -> impl Iterator<Item = &Arc<LocalSymbol>> {
        self.all_locals().filter_map(|symbol| match symbol {
            Symbol::Local(local) => Some(local),
            _ => None,
        })
    }

    /// Number of locals (labels excluded)
    #[must_use]
    pub fn len(&self) -> usize {
        self.locals.len()
    }

    /// Whether the scope declares no locals
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    /// Duplicate-declaration diagnostics found while building
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// First declaration of each primary-constructor parameter name, with member conflicts
#[derive(Debug, Default)]
pub struct PrimaryConstructorMap {
    first_occurrence: FxHashMap<Name, Location>,
    conflicts: Vec<Diagnostic>,
}

impl PrimaryConstructorMap {
    /// Scans a type declaration for members named like a primary-constructor parameter
    #[must_use]
    pub fn build(syntax: &TypeDecl) -> Self {
        let mut first_occurrence = FxHashMap::default();
        for parameter in syntax.primary_constructor.iter().flatten() {
            first_occurrence
                .entry(parameter.name.name)
                .or_insert(parameter.location);
        }

        let conflicts = syntax
            .members
            .iter()
            .filter(|member| first_occurrence.contains_key(&member.name.name))
            .map(|member| Diagnostic::PrimaryConstructorParameterConflict {
                name: member.name.name,
                span: member.name.location.span,
            })
            .collect();

        Self {
            first_occurrence,
            conflicts,
        }
    }

    /// Where the parameter called `name` is first declared
    #[must_use]
    pub fn first_occurrence(&self, name: Name) -> Option<Location> {
        self.first_occurrence.get(&name).copied()
    }

    /// Member declarations colliding with a parameter
    #[must_use]
    pub fn conflicts(&self) -> &[Diagnostic] {
        &self.conflicts
    }
}

/// Locals a bound `for` statement exposes
///
/// Initializer locals belong to the whole loop; header locals are scoped to
/// the condition and incrementors.
#[derive(Debug, Clone, Default)]
pub struct ForLoopLocals {
    /// Locals of the initializer scope
    pub outer: Vec<Arc<LocalSymbol>>,
    /// Locals of the condition and incrementor scope
    pub inner: Vec<Arc<LocalSymbol>>,
}

impl ForLoopLocals {
    /// Collects the locals of a `for` loop from its two scopes
    ///
    /// `header` is the scope pushed in front of `initializer`.
    #[must_use]
    pub fn collect(ctx: &BindContext<'_>, initializer: &Scope<'_>, header: &Scope<'_>) -> Self {
        debug_assert!(
            header.next().is_some_and(|next| std::ptr::eq(next, initializer)),
            "for header must be nested directly in its initializer scope"
        );
        let locals = |scope: &Scope<'_>| scope.local_table(ctx).local_symbols().cloned().collect();
        Self {
            outer: locals(initializer),
            inner: locals(header),
        }
    }
}
