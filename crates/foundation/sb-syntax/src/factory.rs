//! Programmatic construction of syntax trees
//!
//! The factory hands out fresh [`SyntaxId`]s from an atomic counter, so trees
//! built from several threads with one factory still get unique identities.

#![allow(
    clippy::must_use_candidate,
    reason = "Factory methods build nodes; callers always bind the result"
)]

use crate::decl::{
    CompilationUnit, ExternAliasDirective, MemberDecl, MemberDeclKind, NameSegment, NameSyntax,
    NamespaceDecl, NamespaceMember, ParameterSyntax, PredefinedType, TypeDecl, TypeSyntax,
    UsingDirective,
};
use crate::expr::{
    Argument, ArgumentKind, BinaryOp, Designation, Expr, LambdaBody, LambdaExpr, Literal, Pattern,
    QueryClause, QueryExpr,
};
use crate::stmt::{
    Block, CatchClause, CatchDeclaration, FixedStatement, ForInitializer, ForStatement, Stmt,
    TryStatement, VariableDeclaration, VariableDeclarator, WhileStatement,
};
use crate::{Identifier, Location, SyntaxId};
use sb_intern::Interner;
use sb_span::{FileId, FileSpan, Span};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Builds syntax nodes with unique identities
#[derive(Debug)]
pub struct SyntaxFactory {
    interner: Interner,
    file: FileId,
    next_id: AtomicU32,
}

impl SyntaxFactory {
    /// Creates a factory producing nodes for `file`
    #[must_use]
    pub fn new(interner: Interner, file: FileId) -> Self {
        Self {
            interner,
            file,
            next_id: AtomicU32::new(0),
        }
    }

    /// The interner names are stored in
    #[must_use]
    pub const fn interner(&self) -> &Interner {
        &self.interner
    }

    /// A fresh location; spans are synthetic and ordered by creation
    pub fn location(&self) -> Location {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Location::new(
            SyntaxId(id),
            FileSpan::new(self.file, Span::new(id, id.saturating_add(1))),
        )
    }

    /// `name`
    pub fn ident(&self, name: &str) -> Identifier {
        Identifier {
            name: self.interner.intern(name),
            location: self.location(),
        }
    }

    // ---------------------------------------------------------------------
    // Names and types
    // ---------------------------------------------------------------------

    /// Dotted name such as `System.Collections`
    pub fn name(&self, dotted: &str) -> NameSyntax {
        NameSyntax {
            location: self.location(),
            alias_qualifier: None,
            segments: dotted
                .split('.')
                .map(|segment| NameSegment {
                    identifier: self.ident(segment),
                    type_arguments: Vec::new(),
                })
                .collect(),
        }
    }

    /// `alias::dotted`
    pub fn alias_qualified_name(&self, alias: &str, dotted: &str) -> NameSyntax {
        let mut name = self.name(dotted);
        name.alias_qualifier = Some(self.ident(alias));
        name
    }

    /// Dotted name whose last segment carries type arguments, e.g. `System.List<int>`
    pub fn generic_name(&self, dotted: &str, type_arguments: Vec<TypeSyntax>) -> NameSyntax {
        let mut name = self.name(dotted);
        if let Some(last) = name.segments.last_mut() {
            last.type_arguments = type_arguments;
        }
        name
    }

    /// A named type reference
    pub fn named_type(&self, dotted: &str) -> TypeSyntax {
        TypeSyntax::Name(self.name(dotted))
    }

    /// A keyword type
    pub fn predefined(&self, keyword: PredefinedType) -> TypeSyntax {
        TypeSyntax::Predefined {
            location: self.location(),
            keyword,
        }
    }

    /// `var`
    pub fn implicit_type(&self) -> TypeSyntax {
        TypeSyntax::Implicit(self.location())
    }

    // ---------------------------------------------------------------------
    // Directives and declarations
    // ---------------------------------------------------------------------

    /// `extern alias name;`
    pub fn extern_alias(&self, name: &str) -> ExternAliasDirective {
        ExternAliasDirective {
            location: self.location(),
            alias: self.ident(name),
        }
    }

    /// `using target;`
    pub fn using_namespace(&self, target: &str) -> UsingDirective {
        UsingDirective {
            location: self.location(),
            alias: None,
            target: self.name(target),
        }
    }

    /// `using alias = target;`
    pub fn using_alias(&self, alias: &str, target: NameSyntax) -> UsingDirective {
        UsingDirective {
            location: self.location(),
            alias: Some(self.ident(alias)),
            target,
        }
    }

    /// A compilation unit
    pub fn compilation_unit(
        &self,
        externs: Vec<ExternAliasDirective>,
        usings: Vec<UsingDirective>,
        members: Vec<NamespaceMember>,
    ) -> CompilationUnit {
        CompilationUnit {
            location: self.location(),
            externs,
            usings,
            members,
        }
    }

    /// `namespace name { ... }`
    pub fn namespace_decl(
        &self,
        name: &str,
        externs: Vec<ExternAliasDirective>,
        usings: Vec<UsingDirective>,
        members: Vec<NamespaceMember>,
    ) -> NamespaceDecl {
        NamespaceDecl {
            location: self.location(),
            name: self.name(name),
            externs,
            usings,
            members,
        }
    }

    /// A parameter with an optional declared type
    pub fn parameter(&self, name: &str, ty: Option<TypeSyntax>) -> ParameterSyntax {
        ParameterSyntax {
            location: self.location(),
            name: self.ident(name),
            ty,
        }
    }

    /// A type declaration
    pub fn type_decl(
        &self,
        name: &str,
        type_parameters: &[&str],
        primary_constructor: Option<Vec<ParameterSyntax>>,
        members: Vec<MemberDecl>,
    ) -> TypeDecl {
        TypeDecl {
            location: self.location(),
            name: self.ident(name),
            type_parameters: type_parameters.iter().map(|name| self.ident(name)).collect(),
            primary_constructor,
            members,
        }
    }

    /// A member declaration
    pub fn member(&self, name: &str, kind: MemberDeclKind) -> MemberDecl {
        MemberDecl {
            location: self.location(),
            name: self.ident(name),
            kind,
        }
    }

    /// `const name = initializer;`
    pub fn constant(&self, name: &str, initializer: Expr) -> MemberDecl {
        self.member(name, MemberDeclKind::Constant(Arc::new(initializer)))
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    /// A simple name expression
    pub fn identifier(&self, name: &str) -> Expr {
        Expr::Identifier(self.ident(name))
    }

    /// Integer literal
    pub fn int(&self, value: i64) -> Expr {
        Expr::Literal {
            location: self.location(),
            value: Literal::Int(value),
        }
    }

    /// Boolean literal
    pub fn bool_literal(&self, value: bool) -> Expr {
        Expr::Literal {
            location: self.location(),
            value: Literal::Bool(value),
        }
    }

    /// String literal
    pub fn string_literal(&self, value: &str) -> Expr {
        Expr::Literal {
            location: self.location(),
            value: Literal::String(value.to_owned()),
        }
    }

    /// `left op right`
    pub fn binary(&self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            location: self.location(),
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `receiver.name`
    pub fn member_access(&self, receiver: Expr, name: &str) -> Expr {
        Expr::MemberAccess {
            location: self.location(),
            receiver: Box::new(receiver),
            name: self.ident(name),
        }
    }

    /// `callee(arguments)`
    pub fn invocation(&self, callee: Expr, arguments: Vec<Argument>) -> Expr {
        Expr::Invocation {
            location: self.location(),
            callee: Box::new(callee),
            arguments,
        }
    }

    /// A by-value argument
    #[allow(clippy::unused_self, reason = "Keeps argument construction on the factory like the other nodes")]
    pub fn argument(&self, expr: Expr) -> Argument {
        Argument {
            kind: ArgumentKind::Value,
            expr,
        }
    }

    /// `out var name`
    pub fn out_var(&self, name: &str) -> Argument {
        Argument {
            kind: ArgumentKind::Out,
            expr: Expr::Declaration {
                location: self.location(),
                ty: self.implicit_type(),
                designation: Designation::Single(self.ident(name)),
            },
        }
    }

    /// `operand is T name`
    pub fn is_type_pattern(&self, operand: Expr, ty: TypeSyntax, name: &str) -> Expr {
        Expr::IsPattern {
            location: self.location(),
            operand: Box::new(operand),
            pattern: Pattern::Declaration {
                location: self.location(),
                ty,
                designation: Designation::Single(self.ident(name)),
            },
        }
    }

    /// `operand is var name`
    pub fn is_var_pattern(&self, operand: Expr, name: &str) -> Expr {
        Expr::IsPattern {
            location: self.location(),
            operand: Box::new(operand),
            pattern: Pattern::Var {
                location: self.location(),
                designation: Designation::Single(self.ident(name)),
            },
        }
    }

    /// `var (a, b) = value`
    pub fn deconstruction(&self, names: &[&str], value: Expr) -> Expr {
        let location = self.location();
        Expr::Assignment {
            location,
            target: Box::new(Expr::Declaration {
                location: self.location(),
                ty: self.implicit_type(),
                designation: Designation::Parenthesized {
                    location: self.location(),
                    variables: names
                        .iter()
                        .map(|name| {
                            if *name == "_" {
                                Designation::Discard(self.location())
                            } else {
                                Designation::Single(self.ident(name))
                            }
                        })
                        .collect(),
                },
            }),
            value: Box::new(value),
        }
    }

    /// `target = value`
    pub fn assignment(&self, target: Expr, value: Expr) -> Expr {
        Expr::Assignment {
            location: self.location(),
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    /// An expression-bodied lambda
    pub fn lambda(&self, is_async: bool, parameters: &[&str], body: Expr) -> LambdaExpr {
        LambdaExpr {
            location: self.location(),
            is_async,
            parameters: parameters
                .iter()
                .map(|name| self.parameter(name, None))
                .collect(),
            body: LambdaBody::Expr(Box::new(body)),
        }
    }

    /// `await operand`
    pub fn await_expr(&self, operand: Expr) -> Expr {
        Expr::Await {
            location: self.location(),
            operand: Box::new(operand),
        }
    }

    /// `from variable in source`
    pub fn from_clause(&self, variable: &str, source: Expr) -> QueryClause {
        QueryClause::From {
            variable: self.ident(variable),
            source,
        }
    }

    /// `let variable = value`
    pub fn let_clause(&self, variable: &str, value: Expr) -> QueryClause {
        QueryClause::Let {
            variable: self.ident(variable),
            value,
        }
    }

    /// A query expression
    pub fn query(&self, clauses: Vec<QueryClause>, select: Expr) -> QueryExpr {
        QueryExpr {
            location: self.location(),
            clauses,
            select: Box::new(select),
        }
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    /// `{ statements }`
    pub fn block(&self, statements: Vec<Stmt>) -> Block {
        Block {
            location: self.location(),
            statements,
        }
    }

    /// `ty a = init, b;`
    pub fn variable_declaration(
        &self,
        ty: TypeSyntax,
        declarators: Vec<(&str, Option<Expr>)>,
    ) -> VariableDeclaration {
        VariableDeclaration {
            location: self.location(),
            ty,
            declarators: declarators
                .into_iter()
                .map(|(name, initializer)| VariableDeclarator {
                    location: self.location(),
                    name: self.ident(name),
                    initializer,
                })
                .collect(),
        }
    }

    /// Local declaration statement
    pub fn local_declaration(&self, ty: TypeSyntax, declarators: Vec<(&str, Option<Expr>)>) -> Stmt {
        Stmt::LocalDeclaration(self.variable_declaration(ty, declarators))
    }

    /// `expr;`
    pub fn expression_statement(&self, expr: Expr) -> Stmt {
        Stmt::Expression {
            location: self.location(),
            expr,
        }
    }

    /// `label: statement`
    pub fn labeled(&self, label: &str, statement: Stmt) -> Stmt {
        Stmt::Labeled {
            location: self.location(),
            label: self.ident(label),
            statement: Box::new(statement),
        }
    }

    /// `while (condition) body`
    pub fn while_statement(&self, condition: Expr, body: Stmt) -> WhileStatement {
        WhileStatement {
            location: self.location(),
            condition,
            body: Box::new(body),
        }
    }

    /// `for (initializer; condition; incrementors) body`
    pub fn for_statement(
        &self,
        initializer: ForInitializer,
        condition: Option<Expr>,
        incrementors: Vec<Expr>,
        body: Stmt,
    ) -> ForStatement {
        ForStatement {
            location: self.location(),
            initializer,
            condition,
            incrementors,
            body: Box::new(body),
        }
    }

    /// `fixed (ty a = init, ...) body`
    pub fn fixed_statement(
        &self,
        ty: TypeSyntax,
        declarators: Vec<(&str, Option<Expr>)>,
        body: Stmt,
    ) -> FixedStatement {
        FixedStatement {
            location: self.location(),
            declaration: self.variable_declaration(ty, declarators),
            body: Box::new(body),
        }
    }

    /// `catch (ty name) when (filter) block`
    pub fn catch_clause(
        &self,
        declaration: Option<(TypeSyntax, Option<&str>)>,
        filter: Option<Expr>,
        block: Block,
    ) -> CatchClause {
        CatchClause {
            location: self.location(),
            declaration: declaration.map(|(ty, identifier)| CatchDeclaration {
                location: self.location(),
                ty,
                identifier: identifier.map(|name| self.ident(name)),
            }),
            filter,
            block,
        }
    }

    /// `try block catches finally`
    pub fn try_statement(
        &self,
        block: Block,
        catches: Vec<CatchClause>,
        finally: Option<Block>,
    ) -> TryStatement {
        TryStatement {
            location: self.location(),
            block,
            catches,
            finally,
        }
    }

    /// `lock (expr) body`
    pub fn lock_statement(&self, expr: Expr, body: Stmt) -> Stmt {
        Stmt::Lock {
            location: self.location(),
            expr,
            body: Box::new(body),
        }
    }
}

/// Wraps declarations into namespace members
impl From<TypeDecl> for NamespaceMember {
    fn from(decl: TypeDecl) -> Self {
        Self::Type(decl)
    }
}

impl From<NamespaceDecl> for NamespaceMember {
    fn from(decl: NamespaceDecl) -> Self {
        Self::Namespace(decl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> SyntaxFactory {
        SyntaxFactory::new(Interner::new(), FileId::new(0))
    }

    #[test]
    fn test_locations_are_unique() {
        let factory = factory();
        let first = factory.location();
        let second = factory.location();
        assert_ne!(first.syntax, second.syntax);
        assert!(first.span.span.start < second.span.span.start);
    }

    #[test]
    fn test_dotted_name_segments() {
        let factory = factory();
        let name = factory.name("System.Collections.Generic");
        let texts: Vec<&str> = name
            .segments
            .iter()
            .map(|segment| factory.interner().resolve(segment.identifier.name))
            .collect();
        assert_eq!(texts, ["System", "Collections", "Generic"]);
        assert!(name.alias_qualifier.is_none());
    }

    #[test]
    fn test_generic_name_arity() {
        let factory = factory();
        let int = factory.predefined(PredefinedType::Int);
        let name = factory.generic_name("System.List", vec![int]);
        assert_eq!(name.segments[0].arity(), 0);
        assert_eq!(name.last().map(NameSegment::arity), Some(1));
    }

    #[test]
    fn test_deconstruction_designations() {
        let factory = factory();
        let value = factory.identifier("pair");
        let expr = factory.deconstruction(&["a", "_", "b"], value);
        let Expr::Assignment { target, .. } = expr else {
            panic!("expected an assignment");
        };
        let Expr::Declaration { designation, .. } = *target else {
            panic!("expected a declaration target");
        };
        let names: Vec<&str> = designation
            .identifiers()
            .iter()
            .map(|identifier| factory.interner().resolve(identifier.name))
            .collect();
        assert_eq!(names, ["a", "b"]);
    }
}
