//! Statement syntax

use crate::decl::TypeSyntax;
use crate::expr::Expr;
use crate::{Identifier, Location};

/// `{ statements }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Location
    pub location: Location,
    /// Statements in order
    pub statements: Vec<Stmt>,
}

/// A statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// Nested block
    Block(Block),
    /// `T a = 1, b;`
    LocalDeclaration(VariableDeclaration),
    /// `expr;`
    Expression {
        /// Location
        location: Location,
        /// Expression
        expr: Expr,
    },
    /// `label: statement`
    Labeled {
        /// Location
        location: Location,
        /// Label name
        label: Identifier,
        /// Labeled statement
        statement: Box<Stmt>,
    },
    /// `if (condition) then else otherwise`
    If {
        /// Location
        location: Location,
        /// Condition
        condition: Expr,
        /// Then branch
        then_branch: Box<Stmt>,
        /// Else branch
        else_branch: Option<Box<Stmt>>,
    },
    /// `while (condition) body`
    While(WhileStatement),
    /// `for (init; condition; increment) body`
    For(ForStatement),
    /// `fixed (T* p = ..., q = ...) body`
    Fixed(FixedStatement),
    /// `lock (expr) body`
    Lock {
        /// Location
        location: Location,
        /// Locked expression
        expr: Expr,
        /// Body
        body: Box<Stmt>,
    },
    /// `try { } catch { } finally { }`
    Try(TryStatement),
    /// `unsafe { }`
    Unsafe {
        /// Location
        location: Location,
        /// Body
        block: Block,
    },
    /// `return expr;`
    Return {
        /// Location
        location: Location,
        /// Returned value
        expr: Option<Expr>,
    },
}

impl Stmt {
    /// Location of the statement
    #[must_use]
    pub const fn location(&self) -> Location {
        match self {
            Self::Block(block) => block.location,
            Self::LocalDeclaration(declaration) => declaration.location,
            Self::Expression { location, .. }
            | Self::Labeled { location, .. }
            | Self::If { location, .. }
            | Self::Lock { location, .. }
            | Self::Unsafe { location, .. }
            | Self::Return { location, .. } => *location,
            Self::While(statement) => statement.location,
            Self::For(statement) => statement.location,
            Self::Fixed(statement) => statement.location,
            Self::Try(statement) => statement.location,
        }
    }
}

/// `T a = 1, b = 2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclaration {
    /// Location
    pub location: Location,
    /// Declared type
    pub ty: TypeSyntax,
    /// Declarators in order
    pub declarators: Vec<VariableDeclarator>,
}

/// `a = 1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclarator {
    /// Location
    pub location: Location,
    /// Declared name
    pub name: Identifier,
    /// Initializer
    pub initializer: Option<Expr>,
}

/// `while (condition) body`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhileStatement {
    /// Location
    pub location: Location,
    /// Condition
    pub condition: Expr,
    /// Body
    pub body: Box<Stmt>,
}

/// `for (initializer; condition; incrementors) body`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForStatement {
    /// Location
    pub location: Location,
    /// Initializer part
    pub initializer: ForInitializer,
    /// Condition
    pub condition: Option<Expr>,
    /// Incrementor expressions
    pub incrementors: Vec<Expr>,
    /// Body
    pub body: Box<Stmt>,
}

/// The first part of a `for` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForInitializer {
    /// Nothing
    Empty,
    /// `var i = 0, j = 1`
    Declaration(VariableDeclaration),
    /// `i = 0, Init(out var k)`
    Expressions(Vec<Expr>),
}

/// `fixed (T* p = ..., q = ...) body`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedStatement {
    /// Location
    pub location: Location,
    /// Pointer declarations
    pub declaration: VariableDeclaration,
    /// Body
    pub body: Box<Stmt>,
}

/// `try { } catch ... finally { }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryStatement {
    /// Location
    pub location: Location,
    /// Protected block
    pub block: Block,
    /// Catch clauses in order
    pub catches: Vec<CatchClause>,
    /// Finally block
    pub finally: Option<Block>,
}

/// `catch (T e) when (filter) { }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchClause {
    /// Location
    pub location: Location,
    /// `(T e)` or `(T)`; absent for a bare `catch`
    pub declaration: Option<CatchDeclaration>,
    /// `when (filter)`
    pub filter: Option<Expr>,
    /// Handler block
    pub block: Block,
}

/// `(T e)` part of a catch clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchDeclaration {
    /// Location
    pub location: Location,
    /// Caught type
    pub ty: TypeSyntax,
    /// Optional variable name
    pub identifier: Option<Identifier>,
}
