//! Symbol graph: the declared entities name lookup resolves to
//!
//! Entities live in an arena and are addressed by [`SymbolId`]. Namespaces
//! and types own a [`NameMap`] of their members so lookups preserve
//! declaration order. The graph is immutable once built and is shared by
//! every analysis thread.

pub mod builder;
pub mod graph;
pub mod name_map;
pub mod special;
pub mod symbol;
pub mod ty;

pub use builder::{CoreLibrary, FieldSpec, MethodSpec, PropertySpec, SymbolGraphBuilder, TypeSpec};
pub use graph::SymbolGraph;
pub use name_map::NameMap;
pub use special::SpecialType;
pub use symbol::{
    Accessibility, AssemblyId, FieldData, MethodData, NamespaceData, ParameterData, PropertyData,
    SymbolData, SymbolId, SymbolKind, TypeData, TypeKind, TypeParameterConstraint,
    TypeParameterData,
};
pub use ty::{AnonymousField, AnonymousType, Ty};
