//! Types as far as name binding needs them

use crate::SymbolId;
use sb_intern::Name;
use std::sync::Arc;

/// A type reference
///
/// Generic instantiation is not modelled; a named type refers to its
/// definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    /// No value (`void`)
    Void,
    /// The untyped escape type; member access on it is bound at run time
    Dynamic,
    /// Type of an erroneous expression
    Error,
    /// A named type or type parameter
    Named(SymbolId),
    /// A compiler-synthesized anonymous record
    Anonymous(Arc<AnonymousType>),
}

impl Ty {
    /// The named symbol, if this is a named type
    #[must_use]
    pub const fn symbol(&self) -> Option<SymbolId> {
        match self {
            Self::Named(symbol) => Some(*symbol),
            _ => None,
        }
    }

    /// Whether this is the error type
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

/// Shape of an anonymous record: named fields in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnonymousType {
    /// Fields in order
    pub fields: Vec<AnonymousField>,
}

impl AnonymousType {
    /// Creates an anonymous record type
    #[must_use]
    pub const fn new(fields: Vec<AnonymousField>) -> Self {
        Self { fields }
    }

    /// The field called `name`
    #[must_use]
    pub fn field(&self, name: Name) -> Option<&AnonymousField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// One field of an anonymous record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnonymousField {
    /// Field name
    pub name: Name,
    /// Field type
    pub ty: Ty,
}
