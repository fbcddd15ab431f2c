//! Entity records stored in the symbol graph

use crate::name_map::NameMap;
use crate::ty::Ty;
use la_arena::Idx;
use sb_intern::Name;
use sb_syntax::{Expr, Location};
use std::sync::Arc;

/// Identifier of an entity in the [`SymbolGraph`](crate::SymbolGraph)
pub type SymbolId = Idx<SymbolData>;

/// The compilation (assembly) an entity was declared in
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Default)]
pub struct AssemblyId(pub u32);

impl AssemblyId {
    /// The assembly being compiled
    pub const SOURCE: Self = Self(0);
    /// The core library
    pub const CORE: Self = Self(u32::MAX);
}

/// Declared accessibility
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Default)]
pub enum Accessibility {
    /// Visible everywhere
    #[default]
    Public,
    /// Visible inside the declaring assembly
    Internal,
    /// Visible inside the declaring type and types derived from it
    Protected,
    /// Visible inside the declaring type
    Private,
}

/// A declared entity
#[derive(Debug, Clone)]
pub struct SymbolData {
    /// Declared name
    pub name: Name,
    /// Kind and kind-specific payload
    pub kind: SymbolKind,
    /// Declared accessibility
    pub accessibility: Accessibility,
    /// The namespace, type or method this entity is declared in
    pub container: Option<SymbolId>,
    /// Declaring assembly
    pub assembly: AssemblyId,
    /// Declaring construct, when declared in source
    pub declaration: Option<Location>,
}

impl SymbolData {
    /// Generic arity: the number of type parameters a type or method declares
    #[must_use]
    pub fn arity(&self) -> usize {
        match &self.kind {
            SymbolKind::Type(data) => data.type_parameters.len(),
            SymbolKind::Method(data) => data.type_parameters.len(),
            _ => 0,
        }
    }

    /// Whether the entity is static (namespaces and types count as static)
    #[must_use]
    pub const fn is_static(&self) -> bool {
        match &self.kind {
            SymbolKind::Namespace(_) | SymbolKind::Type(_) | SymbolKind::TypeParameter(_) => true,
            SymbolKind::Method(data) => data.is_static,
            SymbolKind::Property(data) => data.is_static,
            SymbolKind::Field(data) => data.is_static || data.constant.is_some(),
            SymbolKind::Parameter(_) => false,
        }
    }

    /// Namespace members or type members
    #[must_use]
    pub const fn members(&self) -> Option<&NameMap<SymbolId>> {
        match &self.kind {
            SymbolKind::Namespace(data) => Some(&data.members),
            SymbolKind::Type(data) => Some(&data.members),
            _ => None,
        }
    }

    /// Whether this is a namespace
    #[must_use]
    pub const fn is_namespace(&self) -> bool {
        matches!(self.kind, SymbolKind::Namespace(_))
    }

    /// Whether this is a type (not a type parameter)
    #[must_use]
    pub const fn is_type(&self) -> bool {
        matches!(self.kind, SymbolKind::Type(_))
    }

    /// Whether this is a namespace, type or type parameter
    #[must_use]
    pub const fn is_namespace_or_type(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Namespace(_) | SymbolKind::Type(_) | SymbolKind::TypeParameter(_)
        )
    }

    /// Type payload, if this is a type
    #[must_use]
    pub const fn as_type(&self) -> Option<&TypeData> {
        match &self.kind {
            SymbolKind::Type(data) => Some(data),
            _ => None,
        }
    }

    /// Method payload, if this is a method
    #[must_use]
    pub const fn as_method(&self) -> Option<&MethodData> {
        match &self.kind {
            SymbolKind::Method(data) => Some(data),
            _ => None,
        }
    }

    /// Property payload, if this is a property
    #[must_use]
    pub const fn as_property(&self) -> Option<&PropertyData> {
        match &self.kind {
            SymbolKind::Property(data) => Some(data),
            _ => None,
        }
    }

    /// Field payload, if this is a field
    #[must_use]
    pub const fn as_field(&self) -> Option<&FieldData> {
        match &self.kind {
            SymbolKind::Field(data) => Some(data),
            _ => None,
        }
    }
}

/// Entity kinds
#[derive(Debug, Clone)]
pub enum SymbolKind {
    /// A namespace
    Namespace(NamespaceData),
    /// A class, struct, interface, delegate or enum
    Type(TypeData),
    /// A method
    Method(MethodData),
    /// A property
    Property(PropertyData),
    /// A field or constant
    Field(FieldData),
    /// A method or primary-constructor parameter
    Parameter(ParameterData),
    /// A type parameter of a type or method
    TypeParameter(TypeParameterData),
}

/// Namespace payload
#[derive(Debug, Clone, Default)]
pub struct NamespaceData {
    /// Nested namespaces and types
    pub members: NameMap<SymbolId>,
}

/// Kinds of types
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum TypeKind {
    /// `class`
    Class,
    /// `struct`
    Struct,
    /// `interface`
    Interface,
    /// `delegate`
    Delegate,
    /// `enum`
    Enum,
}

impl TypeKind {
    /// Whether the kind is class-like (can declare static members usable through a using)
    #[must_use]
    pub const fn is_class_like(self) -> bool {
        matches!(self, Self::Class | Self::Struct | Self::Interface)
    }

    /// Whether values of this kind are references
    #[must_use]
    pub const fn is_reference_type(self) -> bool {
        matches!(self, Self::Class | Self::Interface | Self::Delegate)
    }
}

/// Type payload
#[derive(Debug, Clone)]
pub struct TypeData {
    /// Class, struct, ...
    pub type_kind: TypeKind,
    /// `static class`
    pub is_static: bool,
    /// Base class
    pub base: Option<SymbolId>,
    /// Directly implemented interfaces
    pub interfaces: Vec<SymbolId>,
    /// Type parameters in declaration order
    pub type_parameters: Vec<SymbolId>,
    /// Primary-constructor parameters, if the type declares a primary constructor
    pub primary_constructor: Option<Vec<SymbolId>>,
    /// Members
    pub members: NameMap<SymbolId>,
}

/// Method payload
#[derive(Debug, Clone, Default)]
pub struct MethodData {
    /// Parameters in order; for an extension method the first is the receiver
    pub parameters: Vec<SymbolId>,
    /// Type parameters in declaration order
    pub type_parameters: Vec<SymbolId>,
    /// Return type
    pub return_type: Option<Ty>,
    /// `static`
    pub is_static: bool,
    /// Declared as an extension method
    pub is_extension: bool,
    /// Calls may be removed at compile time
    pub is_conditional: bool,
    /// `async`
    pub is_async: bool,
}

impl MethodData {
    /// Return type, `void` when not declared
    #[must_use]
    pub fn returns(&self) -> Ty {
        self.return_type.clone().unwrap_or(Ty::Void)
    }
}

/// Property payload
#[derive(Debug, Clone)]
pub struct PropertyData {
    /// Property type
    pub ty: Ty,
    /// Has a `get` accessor
    pub has_getter: bool,
    /// Has a `set` accessor
    pub has_setter: bool,
    /// `static`
    pub is_static: bool,
}

/// Field payload
#[derive(Debug, Clone)]
pub struct FieldData {
    /// Field type
    pub ty: Ty,
    /// `static`
    pub is_static: bool,
    /// Initializer of a `const` field
    pub constant: Option<Arc<Expr>>,
}

/// Parameter payload
#[derive(Debug, Clone)]
pub struct ParameterData {
    /// Position in the parameter list
    pub ordinal: usize,
    /// Parameter type
    pub ty: Ty,
}

/// Constraints a type argument must satisfy
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum TypeParameterConstraint {
    /// `where T : class`
    ReferenceType,
    /// `where T : struct`
    ValueType,
}

/// Type parameter payload
#[derive(Debug, Clone)]
pub struct TypeParameterData {
    /// Position in the type parameter list
    pub ordinal: usize,
    /// Declared constraint
    pub constraint: Option<TypeParameterConstraint>,
}
