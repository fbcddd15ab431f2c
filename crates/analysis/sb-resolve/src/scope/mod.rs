//! Scope chain
//!
//! A [`Scope`] is one link of the chain the analyzer pushes while walking a
//! declaration: each link borrows the link it was pushed in front of and
//! contributes the entities its construct declares. Scopes are cheap,
//! short-lived and owned by one analysis request; the declarations a scope
//! contributes are computed on first use and published once, so a scope can
//! still be shared by reference between threads.

mod locals;
mod lookup;
mod walker;

pub use locals::{ForLoopLocals, LocalTable, PrimaryConstructorMap};
pub use lookup::{LookupRequest, lookup_members_in_type};

use crate::context::BindContext;
use crate::error::{Cancelled, Diagnostic};
use crate::imports::ImportTable;
use crate::lazy::PublishCell;
use crate::options::ScopeFlags;
use sb_symbols::{SymbolId, SymbolKind, Ty};
use sb_syntax::{
    Block, CatchClause, CompilationUnit, Expr, ExternAliasDirective, FixedStatement,
    ForStatement, Identifier, LambdaExpr, Location, NamespaceDecl, Stmt, SyntaxId, TypeDecl,
    UsingDirective, WhileStatement,
};
use std::sync::Arc;

/// Whose type parameters a type-parameter scope declares
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeParameterLevel {
    /// A class, struct, interface or delegate
    DeclaringType,
    /// A generic method
    Method,
}

/// Loop statements whose header declares variables
#[derive(Copy, Clone, Debug)]
pub enum LoopHeader<'tree> {
    /// `while (condition)`
    While(&'tree WhileStatement),
    /// `for (...; condition; incrementors)`
    For(&'tree ForStatement),
}

/// An anonymous function scope
#[derive(Debug, Clone)]
pub struct LambdaInfo {
    /// Lambda syntax location
    pub location: Location,
    /// Declared `async`
    pub is_async: bool,
    /// Synthesized for a query clause rather than written by the user
    pub is_query: bool,
    /// Parameters with the types the caller inferred for them
    pub parameters: Vec<(Identifier, Ty)>,
}

/// Where a container scope gets its import table from
#[derive(Debug, Clone)]
pub enum ImportsSource<'tree> {
    /// No directives
    None,
    /// Directives of a compilation unit or namespace declaration
    Directives {
        /// Identity of the declaring syntax, the cache key of the table
        syntax: SyntaxId,
        /// `extern alias` directives
        externs: &'tree [ExternAliasDirective],
        /// `using` directives
        usings: &'tree [UsingDirective],
    },
    /// An already built table
    Table(Arc<ImportTable>),
}

/// What a scope is and what it declares
#[derive(Debug)]
pub enum ScopeKind<'tree> {
    /// A namespace or type whose members are in scope, with its imports
    Container {
        /// The namespace or type
        container: SymbolId,
        /// Its directives
        imports: ImportsSource<'tree>,
    },
    /// Type parameters of a generic type or method
    TypeParameters {
        /// The declaring type or method
        owner: SymbolId,
        /// Which kind of declaration owns them
        level: TypeParameterLevel,
    },
    /// Primary-constructor parameters, visible in the whole type body
    PrimaryConstructor {
        /// The declaring type
        ty: SymbolId,
        /// The type declaration
        syntax: &'tree TypeDecl,
    },
    /// Parameters of a method; the executable unit of its body
    Method(SymbolId),
    /// Parameters of a lambda; the executable unit of its body
    Lambda(LambdaInfo),
    /// Locals, expression variables and labels of a block
    Block(&'tree Block),
    /// Expression variables of a statement in embedded position
    EmbeddedStatement(&'tree Stmt),
    /// Expression variables of a standalone expression
    Expression(&'tree Expr),
    /// Variables declared in a loop condition or incrementor
    LoopHeader(LoopHeader<'tree>),
    /// Variables declared in a `for` initializer
    ForInitializer(&'tree ForStatement),
    /// The exception variable of a `catch` clause
    Catch(&'tree CatchClause),
    /// The pinned variables of a `fixed` statement
    Fixed(&'tree FixedStatement),
    /// Query range variables in scope for a clause
    RangeVariables(Vec<Identifier>),
    /// Declares nothing; only changes flags
    Region,
}

/// One link of the scope chain
#[derive(Debug)]
pub struct Scope<'tree> {
    next: Option<&'tree Scope<'tree>>,
    flags: ScopeFlags,
    kind: ScopeKind<'tree>,
    locals: PublishCell<LocalTable>,
}

impl<'tree> Scope<'tree> {
    fn new(next: Option<&'tree Scope<'tree>>, flags: ScopeFlags, kind: ScopeKind<'tree>) -> Self {
        Self {
            next,
            flags,
            kind,
            locals: PublishCell::new(),
        }
    }

    fn child(&'tree self, kind: ScopeKind<'tree>) -> Self {
        Self::new(Some(self), self.flags, kind)
    }

    /// A root scope for the members of the global namespace
    #[must_use]
    pub fn global(ctx: &BindContext<'_>) -> Self {
        Self::new(
            None,
            ScopeFlags::empty(),
            ScopeKind::Container {
                container: ctx.graph().global_namespace(),
                imports: ImportsSource::None,
            },
        )
    }

    /// A root scope for a compilation unit: global namespace members plus the unit's directives
    #[must_use]
    pub fn compilation_unit(ctx: &BindContext<'_>, unit: &'tree CompilationUnit) -> Self {
        Self::new(
            None,
            ScopeFlags::empty(),
            ScopeKind::Container {
                container: ctx.graph().global_namespace(),
                imports: ImportsSource::Directives {
                    syntax: unit.location.syntax,
                    externs: &unit.externs,
                    usings: &unit.usings,
                },
            },
        )
    }

    /// A container scope over a prebuilt import table
    #[must_use]
    pub fn with_import_table(
        next: Option<&'tree Scope<'tree>>,
        container: SymbolId,
        table: Arc<ImportTable>,
    ) -> Self {
        let flags = next.map_or_else(ScopeFlags::empty, |next| next.flags);
        Self::new(
            next,
            flags,
            ScopeKind::Container {
                container,
                imports: ImportsSource::Table(table),
            },
        )
    }

    /// Enters a namespace declaration with its directives
    #[must_use]
    pub fn enter_namespace(&'tree self, namespace: SymbolId, decl: &'tree NamespaceDecl) -> Self {
        self.child(ScopeKind::Container {
            container: namespace,
            imports: ImportsSource::Directives {
                syntax: decl.location.syntax,
                externs: &decl.externs,
                usings: &decl.usings,
            },
        })
    }

    /// Enters the member scope of a type (or a namespace without directives)
    #[must_use]
    pub fn enter_container(&'tree self, container: SymbolId) -> Self {
        self.child(ScopeKind::Container {
            container,
            imports: ImportsSource::None,
        })
    }

    /// Enters the type-parameter scope of a generic type or method
    #[must_use]
    pub fn enter_type_parameters(&'tree self, owner: SymbolId, level: TypeParameterLevel) -> Self {
        self.child(ScopeKind::TypeParameters { owner, level })
    }

    /// Enters the primary-constructor parameter scope of a type
    #[must_use]
    pub fn enter_primary_constructor(&'tree self, ty: SymbolId, syntax: &'tree TypeDecl) -> Self {
        self.child(ScopeKind::PrimaryConstructor { ty, syntax })
    }

    /// Enters a method body
    #[must_use]
    pub fn enter_method(&'tree self, method: SymbolId) -> Self {
        Self::new(
            Some(self),
            self.flags.difference(ScopeFlags::STATEMENT_LOCAL),
            ScopeKind::Method(method),
        )
    }

    /// Enters a user-written lambda; `parameter_types` are matched to parameters by position
    #[must_use]
    pub fn enter_lambda(&'tree self, lambda: &'tree LambdaExpr, parameter_types: &[Ty]) -> Self {
        let parameters = lambda
            .parameters
            .iter()
            .enumerate()
            .map(|(index, parameter)| {
                let ty = parameter_types.get(index).cloned().unwrap_or(Ty::Error);
                (parameter.name, ty)
            })
            .collect();
        self.enter_lambda_info(LambdaInfo {
            location: lambda.location,
            is_async: lambda.is_async,
            is_query: false,
            parameters,
        })
    }

    /// Enters a lambda synthesized for a query clause
    #[must_use]
    pub fn enter_query_lambda(&'tree self, location: Location, parameters: Vec<(Identifier, Ty)>) -> Self {
        self.enter_lambda_info(LambdaInfo {
            location,
            is_async: false,
            is_query: true,
            parameters,
        })
    }

    fn enter_lambda_info(&'tree self, info: LambdaInfo) -> Self {
        Self::new(
            Some(self),
            self.flags.difference(ScopeFlags::STATEMENT_LOCAL),
            ScopeKind::Lambda(info),
        )
    }

    /// Enters a block
    #[must_use]
    pub fn enter_block(&'tree self, block: &'tree Block) -> Self {
        self.child(ScopeKind::Block(block))
    }

    /// Enters a statement in embedded position (an `if` branch, a loop body)
    #[must_use]
    pub fn enter_embedded_statement(&'tree self, statement: &'tree Stmt) -> Self {
        self.child(ScopeKind::EmbeddedStatement(statement))
    }

    /// Enters a standalone expression (an initializer or expression-bodied lambda)
    #[must_use]
    pub fn enter_expression(&'tree self, expr: &'tree Expr) -> Self {
        self.child(ScopeKind::Expression(expr))
    }

    /// Enters the condition of a `while` loop
    #[must_use]
    pub fn enter_while_header(&'tree self, statement: &'tree WhileStatement) -> Self {
        self.child(ScopeKind::LoopHeader(LoopHeader::While(statement)))
    }

    /// Enters the initializer of a `for` loop
    #[must_use]
    pub fn enter_for_initializer(&'tree self, statement: &'tree ForStatement) -> Self {
        self.child(ScopeKind::ForInitializer(statement))
    }

    /// Enters the condition and incrementors of a `for` loop
    ///
    /// Pushed in front of the scope returned by
    /// [`enter_for_initializer`](Self::enter_for_initializer).
    #[must_use]
    pub fn enter_for_header(&'tree self, statement: &'tree ForStatement) -> Self {
        self.child(ScopeKind::LoopHeader(LoopHeader::For(statement)))
    }

    /// Enters a `catch` clause
    #[must_use]
    pub fn enter_catch(&'tree self, clause: &'tree CatchClause) -> Self {
        self.child(ScopeKind::Catch(clause))
    }

    /// Enters the filter expression of a `catch` clause
    #[must_use]
    pub fn enter_catch_filter(&'tree self, filter: &'tree Expr) -> Self {
        Self::new(
            Some(self),
            self.flags | ScopeFlags::IN_CATCH_FILTER,
            ScopeKind::Expression(filter),
        )
    }

    /// Enters a `fixed` statement
    #[must_use]
    pub fn enter_fixed(&'tree self, statement: &'tree FixedStatement) -> Self {
        self.child(ScopeKind::Fixed(statement))
    }

    /// Enters the body of a `lock` statement
    #[must_use]
    pub fn enter_lock_body(&'tree self) -> Self {
        Self::new(Some(self), self.flags | ScopeFlags::IN_LOCK_BODY, ScopeKind::Region)
    }

    /// Enters an unsafe region
    #[must_use]
    pub fn enter_unsafe(&'tree self) -> Self {
        Self::new(Some(self), self.flags | ScopeFlags::UNSAFE_CONTEXT, ScopeKind::Region)
    }

    /// Enters a query clause with the given range variables in scope
    #[must_use]
    pub fn enter_range_variables(&'tree self, variables: Vec<Identifier>) -> Self {
        self.child(ScopeKind::RangeVariables(variables))
    }

    /// The enclosing scope
    #[must_use]
    pub const fn next(&self) -> Option<&'tree Scope<'tree>> {
        self.next
    }

    /// Lexical context flags
    #[must_use]
    pub const fn flags(&self) -> ScopeFlags {
        self.flags
    }

    /// What this scope is
    #[must_use]
    pub const fn kind(&self) -> &ScopeKind<'tree> {
        &self.kind
    }

    /// This scope followed by every enclosing scope
    pub fn chain(&self) -> impl Iterator<Item = &Scope<'tree>> {
        std::iter::successors(Some(self), |scope| scope.next)
    }

    /// The nearest method or lambda scope
    #[must_use]
    pub fn executable_unit(&self) -> Option<&Scope<'tree>> {
        self.chain()
            .find(|scope| matches!(scope.kind, ScopeKind::Method(_) | ScopeKind::Lambda(_)))
    }

    /// The type (or, at namespace level, nothing) code in this scope is part of
    ///
    /// Accessibility of every candidate found through this scope is checked
    /// from here.
    #[must_use]
    pub fn containing_type(&self, ctx: &BindContext<'_>) -> Option<SymbolId> {
        let graph = ctx.graph();
        self.chain().find_map(|scope| match &scope.kind {
            ScopeKind::Container { container, .. } => {
                Some(graph.get(*container).is_type().then_some(*container))
            }
            ScopeKind::Method(method) => Some(graph.containing_type(*method)),
            ScopeKind::PrimaryConstructor { ty, .. } => Some(Some(*ty)),
            ScopeKind::TypeParameters { owner, .. } => Some(type_parameter_context(ctx, *owner)),
            _ => None,
        })?
    }

    /// Declarations of this scope, computed and published on first use
    pub fn local_table(&self, ctx: &BindContext<'_>) -> &LocalTable {
        self.locals
            .get_or_publish(|| LocalTable::build(ctx, &self.kind))
    }

    /// Declaration diagnostics of this scope (duplicate locals, primary-constructor conflicts)
    ///
    /// The diagnostics are computed once; callers report them once per scope.
    #[must_use]
    pub fn declaration_diagnostics(&self, ctx: &BindContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = self.local_table(ctx).diagnostics().to_vec();
        if let ScopeKind::PrimaryConstructor { syntax, .. } = &self.kind {
            let map = ctx.cache().primary_constructor(syntax.location.syntax, || {
                PrimaryConstructorMap::build(syntax)
            });
            diagnostics.extend(map.conflicts().iter().cloned());
        }
        diagnostics
    }

    /// The import table of a container scope, built and cached on first use
    #[must_use]
    pub fn import_table(&self, ctx: &BindContext<'_>) -> Option<Arc<ImportTable>> {
        let ScopeKind::Container { container, imports } = &self.kind else {
            return None;
        };
        match imports {
            ImportsSource::None => None,
            ImportsSource::Table(table) => Some(Arc::clone(table)),
            ImportsSource::Directives {
                syntax,
                externs,
                usings,
            } => Some(ctx.cache().import_table(*syntax, || {
                ImportTable::build(ctx, self.next, *container, externs, usings)
            })),
        }
    }

    /// Validates the import table of a container scope
    ///
    /// Returns the validation diagnostics, identical for every caller.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if the context's cancellation token fires before
    /// validation completes; the table stays unvalidated.
    pub fn validate_imports(&self, ctx: &BindContext<'_>) -> Result<Vec<Diagnostic>, Cancelled> {
        let ScopeKind::Container { container, .. } = &self.kind else {
            return Ok(Vec::new());
        };
        let Some(table) = self.import_table(ctx) else {
            return Ok(Vec::new());
        };
        table.validate(ctx, self.next, *container).map(<[Diagnostic]>::to_vec)
    }
}

fn type_parameter_context(ctx: &BindContext<'_>, owner: SymbolId) -> Option<SymbolId> {
    let graph = ctx.graph();
    match graph.get(owner).kind {
        SymbolKind::Type(_) => Some(owner),
        _ => graph.containing_type(owner),
    }
}
