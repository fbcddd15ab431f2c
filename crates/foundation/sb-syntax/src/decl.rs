//! Declaration-level syntax: compilation units, namespaces, directives and types

use crate::expr::Expr;
use crate::{Identifier, Location};
use std::sync::Arc;

/// Root of one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    /// Location of the whole file
    pub location: Location,
    /// `extern alias` directives, in source order
    pub externs: Vec<ExternAliasDirective>,
    /// `using` directives, in source order
    pub usings: Vec<UsingDirective>,
    /// Top-level namespace and type declarations
    pub members: Vec<NamespaceMember>,
}

/// A namespace body member
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceMember {
    /// Nested namespace declaration
    Namespace(NamespaceDecl),
    /// Type declaration
    Type(TypeDecl),
}

/// `namespace A.B { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Location of the declaration
    pub location: Location,
    /// Declared (possibly dotted) name
    pub name: NameSyntax,
    /// `extern alias` directives inside the body
    pub externs: Vec<ExternAliasDirective>,
    /// `using` directives inside the body
    pub usings: Vec<UsingDirective>,
    /// Members of the body
    pub members: Vec<NamespaceMember>,
}

/// `extern alias X;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternAliasDirective {
    /// Location of the directive
    pub location: Location,
    /// The alias being declared
    pub alias: Identifier,
}

/// `using N;` or `using A = N;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingDirective {
    /// Location of the directive
    pub location: Location,
    /// Alias name for `using A = ...;`
    pub alias: Option<Identifier>,
    /// The namespace or type being imported
    pub target: NameSyntax,
}

impl UsingDirective {
    /// Whether this directive declares an alias
    #[must_use]
    pub const fn is_alias(&self) -> bool {
        self.alias.is_some()
    }
}

/// Keyword types
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PredefinedType {
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `string`
    String,
    /// `object`
    Object,
    /// `void`
    Void,
    /// `dynamic`
    Dynamic,
}

/// A type reference as written in source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSyntax {
    /// A keyword type
    Predefined {
        /// Location of the keyword
        location: Location,
        /// Which keyword
        keyword: PredefinedType,
    },
    /// `var`: the type comes from the initializer
    Implicit(Location),
    /// A (possibly qualified, possibly generic) name
    Name(NameSyntax),
}

impl TypeSyntax {
    /// Location of the whole type reference
    #[must_use]
    pub const fn location(&self) -> Location {
        match self {
            Self::Predefined { location, .. } | Self::Implicit(location) => *location,
            Self::Name(name) => name.location,
        }
    }
}

/// `X::A.B<T>.C`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSyntax {
    /// Location of the whole name
    pub location: Location,
    /// Extern alias qualifier before `::`
    pub alias_qualifier: Option<Identifier>,
    /// Dotted segments, leftmost first; never empty
    pub segments: Vec<NameSegment>,
}

impl NameSyntax {
    /// The last segment
    #[must_use]
    pub fn last(&self) -> Option<&NameSegment> {
        self.segments.last()
    }
}

/// One dotted segment of a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSegment {
    /// The identifier
    pub identifier: Identifier,
    /// Generic type arguments; the segment's arity is their count
    pub type_arguments: Vec<TypeSyntax>,
}

impl NameSegment {
    /// Generic arity written for this segment
    #[must_use]
    pub fn arity(&self) -> usize {
        self.type_arguments.len()
    }
}

/// A parameter in a lambda, method or primary-constructor parameter list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSyntax {
    /// Location of the parameter
    pub location: Location,
    /// Parameter name
    pub name: Identifier,
    /// Declared type, absent for implicitly typed lambda parameters
    pub ty: Option<TypeSyntax>,
}

/// `class C(int x) { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    /// Location of the declaration
    pub location: Location,
    /// Declared name
    pub name: Identifier,
    /// Type parameter names
    pub type_parameters: Vec<Identifier>,
    /// Primary-constructor parameter list, if the declaration has one
    pub primary_constructor: Option<Vec<ParameterSyntax>>,
    /// Member declarations in source order
    pub members: Vec<MemberDecl>,
}

/// A member declared inside a type body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDecl {
    /// Location of the declaration
    pub location: Location,
    /// Declared name
    pub name: Identifier,
    /// What kind of member this is
    pub kind: MemberDeclKind,
}

/// Kinds of type members
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberDeclKind {
    /// A field
    Field,
    /// A `const` field with its initializer
    Constant(Arc<Expr>),
    /// A method
    Method,
    /// A property
    Property,
    /// A nested type
    NestedType,
}
