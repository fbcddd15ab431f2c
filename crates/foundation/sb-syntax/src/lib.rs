//! Immutable syntax tree consumed by the binder
//!
//! Parsing is not part of this workspace: trees are produced by a parser
//! front-end (or by [`SyntaxFactory`] in tests) and are never mutated
//! afterwards. Every node that the binder caches derived data for carries a
//! [`SyntaxId`], a stable identity usable as a cache key across threads.

pub mod decl;
pub mod expr;
pub mod factory;
pub mod stmt;

pub use decl::{
    CompilationUnit, ExternAliasDirective, MemberDecl, MemberDeclKind, NameSegment, NameSyntax,
    NamespaceDecl, NamespaceMember, ParameterSyntax, PredefinedType, TypeDecl, TypeSyntax,
    UsingDirective,
};
pub use expr::{
    Argument, ArgumentKind, BinaryOp, Designation, Expr, LambdaBody, LambdaExpr, Literal, Pattern,
    QueryClause, QueryExpr,
};
pub use factory::SyntaxFactory;
pub use stmt::{
    Block, CatchClause, CatchDeclaration, FixedStatement, ForInitializer, ForStatement, Stmt,
    TryStatement, VariableDeclaration, VariableDeclarator, WhileStatement,
};

use sb_intern::Name;
use sb_span::FileSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a syntax node
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SyntaxId(pub u32);

impl fmt::Display for SyntaxId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// Identity plus source span of a node
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// The node this location belongs to
    pub syntax: SyntaxId,
    /// Where the node sits in its file
    pub span: FileSpan,
}

impl Location {
    /// Creates a location
    #[must_use]
    pub const fn new(syntax: SyntaxId, span: FileSpan) -> Self {
        Self { syntax, span }
    }
}

/// A simple identifier token
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identifier {
    /// Interned text
    pub name: Name,
    /// Location of the token
    pub location: Location,
}
