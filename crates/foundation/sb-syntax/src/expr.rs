//! Expression syntax

use crate::decl::{ParameterSyntax, TypeSyntax};
use crate::stmt::Block;
use crate::{Identifier, Location};

/// Literal values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Integer literal
    Int(i64),
    /// `true` / `false`
    Bool(bool),
    /// String literal
    String(String),
    /// `null`
    Null,
}

/// Binary operators
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `<`
    Less,
    /// `==`
    Equal,
    /// `&&`
    And,
    /// `||`
    Or,
}

/// An expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A simple name
    Identifier(Identifier),
    /// A literal
    Literal {
        /// Location
        location: Location,
        /// Value
        value: Literal,
    },
    /// `left op right`
    Binary {
        /// Location
        location: Location,
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// `receiver.name`
    MemberAccess {
        /// Location
        location: Location,
        /// Expression before the dot
        receiver: Box<Expr>,
        /// Member name
        name: Identifier,
    },
    /// `callee(arguments)`
    Invocation {
        /// Location
        location: Location,
        /// Invoked expression
        callee: Box<Expr>,
        /// Arguments in order
        arguments: Vec<Argument>,
    },
    /// `operand is pattern`
    IsPattern {
        /// Location
        location: Location,
        /// Tested expression
        operand: Box<Expr>,
        /// Pattern, which may declare variables
        pattern: Pattern,
    },
    /// `T x` in `out T x` or `var (a, b)` on the left of a deconstruction
    Declaration {
        /// Location
        location: Location,
        /// Declared type (`var` is [`TypeSyntax::Implicit`])
        ty: TypeSyntax,
        /// Declared variables
        designation: Designation,
    },
    /// `target = value`
    Assignment {
        /// Location
        location: Location,
        /// Assigned expression; a [`Expr::Declaration`] makes this a deconstruction
        target: Box<Expr>,
        /// Value
        value: Box<Expr>,
    },
    /// A lambda
    Lambda(LambdaExpr),
    /// `await operand`
    Await {
        /// Location
        location: Location,
        /// Awaited expression
        operand: Box<Expr>,
    },
    /// A query expression
    Query(QueryExpr),
}

impl Expr {
    /// Location of the expression
    #[must_use]
    pub const fn location(&self) -> Location {
        match self {
            Self::Identifier(identifier) => identifier.location,
            Self::Literal { location, .. }
            | Self::Binary { location, .. }
            | Self::MemberAccess { location, .. }
            | Self::Invocation { location, .. }
            | Self::IsPattern { location, .. }
            | Self::Declaration { location, .. }
            | Self::Assignment { location, .. }
            | Self::Await { location, .. } => *location,
            Self::Lambda(lambda) => lambda.location,
            Self::Query(query) => query.location,
        }
    }
}

/// How an argument is passed
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    /// By value
    Value,
    /// `ref`
    Ref,
    /// `out`
    Out,
}

/// An invocation argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// Passing mode
    pub kind: ArgumentKind,
    /// Argument expression
    pub expr: Expr,
}

/// Patterns on the right of `is`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// `T x`
    Declaration {
        /// Location
        location: Location,
        /// Tested type
        ty: TypeSyntax,
        /// Declared variable
        designation: Designation,
    },
    /// `var x`
    Var {
        /// Location
        location: Location,
        /// Declared variable(s)
        designation: Designation,
    },
    /// A constant pattern
    Constant(Box<Expr>),
    /// `T(p1, p2) x`
    Recursive {
        /// Location
        location: Location,
        /// Tested type
        ty: Option<TypeSyntax>,
        /// Positional sub-patterns
        subpatterns: Vec<Pattern>,
        /// Optional designation of the whole match
        designation: Option<Designation>,
    },
    /// `_`
    Discard(Location),
}

/// Variables declared by a pattern or declaration expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Designation {
    /// One named variable
    Single(Identifier),
    /// `_`
    Discard(Location),
    /// `(a, b, ...)`
    Parenthesized {
        /// Location
        location: Location,
        /// Nested designations
        variables: Vec<Designation>,
    },
}

impl Designation {
    /// All identifiers this designation declares, in source order
    #[must_use]
    pub fn identifiers(&self) -> Vec<Identifier> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers(&self, out: &mut Vec<Identifier>) {
        match self {
            Self::Single(identifier) => out.push(*identifier),
            Self::Discard(_) => {}
            Self::Parenthesized { variables, .. } => {
                for variable in variables {
                    variable.collect_identifiers(out);
                }
            }
        }
    }
}

/// `async (x, y) => body`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaExpr {
    /// Location
    pub location: Location,
    /// Whether the lambda is `async`
    pub is_async: bool,
    /// Parameters
    pub parameters: Vec<ParameterSyntax>,
    /// Body
    pub body: LambdaBody,
}

/// Lambda bodies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LambdaBody {
    /// Expression-bodied
    Expr(Box<Expr>),
    /// Block-bodied
    Block(Block),
}

/// `from x in xs ... select e`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExpr {
    /// Location
    pub location: Location,
    /// Clauses in source order; the first is always a `from`
    pub clauses: Vec<QueryClause>,
    /// The final `select` expression
    pub select: Box<Expr>,
}

/// Query body clauses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryClause {
    /// `from x in source`
    From {
        /// Range variable
        variable: Identifier,
        /// Source expression
        source: Expr,
    },
    /// `let x = value`
    Let {
        /// Range variable
        variable: Identifier,
        /// Value expression
        value: Expr,
    },
    /// `where condition`
    Where(Expr),
}

impl QueryClause {
    /// The range variable this clause introduces, if any
    #[must_use]
    pub const fn range_variable(&self) -> Option<Identifier> {
        match self {
            Self::From { variable, .. } | Self::Let { variable, .. } => Some(*variable),
            Self::Where(_) => None,
        }
    }
}
