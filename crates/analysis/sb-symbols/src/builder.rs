//! Construction of the symbol graph
//!
//! The builder is the stand-in for declaration processing: front-ends and
//! tests describe entities with the `*Spec` records and the builder wires
//! up containers, member maps and well-known types.

use crate::graph::SymbolGraph;
use crate::name_map::NameMap;
use crate::special::SpecialType;
use crate::symbol::{
    Accessibility, AssemblyId, FieldData, MethodData, NamespaceData, ParameterData, PropertyData,
    SymbolData, SymbolId, SymbolKind, TypeData, TypeKind, TypeParameterConstraint,
    TypeParameterData,
};
use crate::ty::Ty;
use la_arena::Arena;
use rustc_hash::FxHashMap;
use sb_intern::{Interner, Name};
use sb_syntax::{Expr, Location};
use std::sync::Arc;

/// Description of a type to add
#[derive(Debug, Clone)]
pub struct TypeSpec {
    name: String,
    kind: TypeKind,
    is_static: bool,
    accessibility: Accessibility,
    assembly: AssemblyId,
    base: Option<SymbolId>,
    interfaces: Vec<SymbolId>,
    type_parameters: Vec<(String, Option<TypeParameterConstraint>)>,
    declaration: Option<Location>,
}

impl TypeSpec {
    /// A public, non-generic type of the given kind
    #[must_use]
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_static: false,
            accessibility: Accessibility::Public,
            assembly: AssemblyId::SOURCE,
            base: None,
            interfaces: Vec::new(),
            type_parameters: Vec::new(),
            declaration: None,
        }
    }

    /// A class
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    /// A struct
    #[must_use]
    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Struct)
    }

    /// An interface
    #[must_use]
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    /// Marks the type `static`
    #[must_use]
    pub const fn static_type(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Sets the base class
    #[must_use]
    pub const fn with_base(mut self, base: SymbolId) -> Self {
        self.base = Some(base);
        self
    }

    /// Adds an implemented interface
    #[must_use]
    pub fn implements(mut self, interface: SymbolId) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Adds unconstrained type parameters
    #[must_use]
    pub fn generic(mut self, names: &[&str]) -> Self {
        self.type_parameters
            .extend(names.iter().map(|name| ((*name).to_owned(), None)));
        self
    }

    /// Adds one constrained type parameter
    #[must_use]
    pub fn constrained(mut self, name: &str, constraint: TypeParameterConstraint) -> Self {
        self.type_parameters.push((name.to_owned(), Some(constraint)));
        self
    }

    /// Sets declared accessibility
    #[must_use]
    pub const fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    /// Declares the type in another assembly
    #[must_use]
    pub const fn in_assembly(mut self, assembly: AssemblyId) -> Self {
        self.assembly = assembly;
        self
    }

    /// Records the declaring syntax
    #[must_use]
    pub const fn declared_at(mut self, location: Location) -> Self {
        self.declaration = Some(location);
        self
    }
}

/// Description of a method to add
#[derive(Debug, Clone)]
pub struct MethodSpec {
    name: String,
    parameters: Vec<(String, Ty)>,
    type_parameters: Vec<String>,
    return_type: Option<Ty>,
    is_static: bool,
    is_extension: bool,
    is_conditional: bool,
    is_async: bool,
    accessibility: Accessibility,
    declaration: Option<Location>,
}

impl MethodSpec {
    /// A public instance method returning `void`
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            type_parameters: Vec::new(),
            return_type: None,
            is_static: false,
            is_extension: false,
            is_conditional: false,
            is_async: false,
            accessibility: Accessibility::Public,
            declaration: None,
        }
    }

    /// Sets the return type
    #[must_use]
    pub fn returns(mut self, ty: Ty) -> Self {
        self.return_type = Some(ty);
        self
    }

    /// Appends a parameter
    #[must_use]
    pub fn param(mut self, name: &str, ty: Ty) -> Self {
        self.parameters.push((name.to_owned(), ty));
        self
    }

    /// Adds method type parameters
    #[must_use]
    pub fn generic(mut self, names: &[&str]) -> Self {
        self.type_parameters
            .extend(names.iter().map(|name| (*name).to_owned()));
        self
    }

    /// Marks the method `static`
    #[must_use]
    pub const fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Marks the method as a static extension method; the first parameter is the receiver
    #[must_use]
    pub const fn extension(mut self) -> Self {
        self.is_static = true;
        self.is_extension = true;
        self
    }

    /// Marks calls to the method as removable
    #[must_use]
    pub const fn conditional(mut self) -> Self {
        self.is_conditional = true;
        self
    }

    /// Marks the method `async`
    #[must_use]
    pub const fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    /// Sets declared accessibility
    #[must_use]
    pub const fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    /// Records the declaring syntax
    #[must_use]
    pub const fn declared_at(mut self, location: Location) -> Self {
        self.declaration = Some(location);
        self
    }
}

/// Description of a property to add
#[derive(Debug, Clone)]
pub struct PropertySpec {
    name: String,
    ty: Ty,
    has_getter: bool,
    has_setter: bool,
    is_static: bool,
}

impl PropertySpec {
    /// A public, read-only instance property
    #[must_use]
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            has_getter: true,
            has_setter: false,
            is_static: false,
        }
    }

    /// Marks the property `static`
    #[must_use]
    pub const fn static_property(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Replaces the getter with a setter
    #[must_use]
    pub const fn write_only(mut self) -> Self {
        self.has_getter = false;
        self.has_setter = true;
        self
    }
}

/// Description of a field or constant to add
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    ty: Ty,
    is_static: bool,
    constant: Option<Arc<Expr>>,
    accessibility: Accessibility,
    declaration: Option<Location>,
}

impl FieldSpec {
    /// A public instance field
    #[must_use]
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
            constant: None,
            accessibility: Accessibility::Public,
            declaration: None,
        }
    }

    /// Marks the field `static`
    #[must_use]
    pub const fn static_field(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Makes the field a `const` with the given initializer
    #[must_use]
    pub fn constant(mut self, initializer: Arc<Expr>) -> Self {
        self.constant = Some(initializer);
        self
    }

    /// Sets declared accessibility
    #[must_use]
    pub const fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    /// Records the declaring syntax
    #[must_use]
    pub const fn declared_at(mut self, location: Location) -> Self {
        self.declaration = Some(location);
        self
    }
}

/// The types [`SymbolGraphBuilder::add_core_library`] declares
#[derive(Copy, Clone, Debug)]
pub struct CoreLibrary {
    /// `System.Object`
    pub object: SymbolId,
    /// `System.Boolean`
    pub boolean: SymbolId,
    /// `System.Int32`
    pub int32: SymbolId,
    /// `System.String`
    pub string: SymbolId,
    /// The completion-notification interface
    pub notify_completion: SymbolId,
}

/// Mutable builder for a [`SymbolGraph`]
#[derive(Debug)]
pub struct SymbolGraphBuilder {
    symbols: Arena<SymbolData>,
    global_namespace: SymbolId,
    interner: Interner,
}

impl SymbolGraphBuilder {
    /// Creates a builder holding only the global namespace
    #[must_use]
    pub fn new(interner: Interner) -> Self {
        let mut symbols = Arena::new();
        let global_namespace = symbols.alloc(SymbolData {
            name: interner.intern(""),
            kind: SymbolKind::Namespace(NamespaceData::default()),
            accessibility: Accessibility::Public,
            container: None,
            assembly: AssemblyId::SOURCE,
            declaration: None,
        });
        Self {
            symbols,
            global_namespace,
            interner,
        }
    }

    /// The interner names are interned with
    #[must_use]
    pub const fn interner(&self) -> &Interner {
        &self.interner
    }

    /// The global namespace
    #[must_use]
    pub const fn global_namespace(&self) -> SymbolId {
        self.global_namespace
    }

    /// Entity data added so far
    #[must_use]
    pub fn get(&self, id: SymbolId) -> &SymbolData {
        &self.symbols[id]
    }

    /// Returns the namespace `dotted` under `parent`, creating missing parts
    pub fn namespace(&mut self, parent: SymbolId, dotted: &str) -> SymbolId {
        let mut container = parent;
        for part in dotted.split('.') {
            let name = self.interner.intern(part);
            let existing = self.symbols[container].members().and_then(|members| {
                members
                    .get(name)
                    .iter()
                    .copied()
                    .find(|id| self.symbols[*id].is_namespace())
            });
            container = match existing {
                Some(namespace) => namespace,
                None => self.add_member(
                    container,
                    name,
                    SymbolKind::Namespace(NamespaceData::default()),
                    Accessibility::Public,
                    None,
                ),
            };
        }
        container
    }

    /// Adds a type to a namespace or (as a nested type) to a type
    pub fn add_type(&mut self, container: SymbolId, spec: TypeSpec) -> SymbolId {
        let name = self.interner.intern(&spec.name);
        let id = self.add_member(
            container,
            name,
            SymbolKind::Type(TypeData {
                type_kind: spec.kind,
                is_static: spec.is_static,
                base: spec.base,
                interfaces: spec.interfaces,
                type_parameters: Vec::new(),
                primary_constructor: None,
                members: NameMap::new(),
            }),
            spec.accessibility,
            spec.declaration,
        );
        self.symbols[id].assembly = spec.assembly;

        let type_parameters: Vec<SymbolId> = spec
            .type_parameters
            .iter()
            .enumerate()
            .map(|(ordinal, (name, constraint))| {
                self.add_type_parameter(id, name, ordinal, *constraint)
            })
            .collect();
        if let SymbolKind::Type(data) = &mut self.symbols[id].kind {
            data.type_parameters = type_parameters;
        }
        id
    }

    /// Adds a method to a type
    pub fn add_method(&mut self, owner: SymbolId, spec: MethodSpec) -> SymbolId {
        let name = self.interner.intern(&spec.name);
        let id = self.add_member(
            owner,
            name,
            SymbolKind::Method(MethodData {
                return_type: spec.return_type,
                is_static: spec.is_static,
                is_extension: spec.is_extension,
                is_conditional: spec.is_conditional,
                is_async: spec.is_async,
                ..MethodData::default()
            }),
            spec.accessibility,
            spec.declaration,
        );

        let type_parameters: Vec<SymbolId> = spec
            .type_parameters
            .iter()
            .enumerate()
            .map(|(ordinal, name)| self.add_type_parameter(id, name, ordinal, None))
            .collect();
        let parameters: Vec<SymbolId> = spec
            .parameters
            .into_iter()
            .enumerate()
            .map(|(ordinal, (name, ty))| self.add_parameter(id, &name, ordinal, ty))
            .collect();
        if let SymbolKind::Method(data) = &mut self.symbols[id].kind {
            data.type_parameters = type_parameters;
            data.parameters = parameters;
        }
        id
    }

    /// Adds a property to a type
    pub fn add_property(&mut self, owner: SymbolId, spec: PropertySpec) -> SymbolId {
        let name = self.interner.intern(&spec.name);
        self.add_member(
            owner,
            name,
            SymbolKind::Property(PropertyData {
                ty: spec.ty,
                has_getter: spec.has_getter,
                has_setter: spec.has_setter,
                is_static: spec.is_static,
            }),
            Accessibility::Public,
            None,
        )
    }

    /// Adds a field or constant to a type
    pub fn add_field(&mut self, owner: SymbolId, spec: FieldSpec) -> SymbolId {
        let name = self.interner.intern(&spec.name);
        self.add_member(
            owner,
            name,
            SymbolKind::Field(FieldData {
                ty: spec.ty,
                is_static: spec.is_static,
                constant: spec.constant,
            }),
            spec.accessibility,
            spec.declaration,
        )
    }

    /// Declares a primary constructor on `ty`; its parameters are not members
    pub fn set_primary_constructor(&mut self, ty: SymbolId, parameters: &[(&str, Ty)]) -> Vec<SymbolId> {
        let ids: Vec<SymbolId> = parameters
            .iter()
            .enumerate()
            .map(|(ordinal, (name, param_ty))| self.add_parameter(ty, name, ordinal, param_ty.clone()))
            .collect();
        if let SymbolKind::Type(data) = &mut self.symbols[ty].kind {
            data.primary_constructor = Some(ids.clone());
        }
        ids
    }

    /// Declares the well-known types of the core library
    pub fn add_core_library(&mut self) -> CoreLibrary {
        let global = self.global_namespace;
        let system = self.namespace(global, "System");
        let object = self.add_type(system, TypeSpec::class("Object").in_assembly(AssemblyId::CORE));
        let boolean = self.add_type(
            system,
            TypeSpec::structure("Boolean").in_assembly(AssemblyId::CORE),
        );
        let int32 = self.add_type(
            system,
            TypeSpec::structure("Int32").in_assembly(AssemblyId::CORE),
        );
        let string = self.add_type(
            system,
            TypeSpec::class("String")
                .with_base(object)
                .in_assembly(AssemblyId::CORE),
        );
        let compiler_services = self.namespace(system, "Runtime.CompilerServices");
        let notify_completion = self.add_type(
            compiler_services,
            TypeSpec::interface("INotifyCompletion").in_assembly(AssemblyId::CORE),
        );
        self.add_method(
            notify_completion,
            MethodSpec::new("OnCompleted").param("continuation", Ty::Named(object)),
        );

        CoreLibrary {
            object,
            boolean,
            int32,
            string,
            notify_completion,
        }
    }

    /// Resolves a dotted namespace or type name among the entities added so far
    #[must_use]
    pub fn resolve_qualified(&self, dotted: &str) -> Option<SymbolId> {
        dotted.split('.').try_fold(self.global_namespace, |container, part| {
            let name = self.interner.get(part)?;
            self.symbols[container].members().and_then(|members| {
                members
                    .get(name)
                    .iter()
                    .copied()
                    .find(|id| self.symbols[*id].is_namespace_or_type() && self.symbols[*id].arity() == 0)
            })
        })
    }

    /// Freezes the graph and locates the well-known types
    #[must_use]
    pub fn finish(self) -> SymbolGraph {
        let mut special_types = FxHashMap::default();
        for special in SpecialType::ALL {
            if let Some(id) = self.resolve_qualified(special.metadata_name()) {
                special_types.insert(special, id);
            }
        }

        SymbolGraph {
            symbols: self.symbols,
            global_namespace: self.global_namespace,
            special_types,
            interner: self.interner,
        }
    }

    fn add_member(
        &mut self,
        container: SymbolId,
        name: Name,
        kind: SymbolKind,
        accessibility: Accessibility,
        declaration: Option<Location>,
    ) -> SymbolId {
        let assembly = self.symbols[container].assembly;
        let id = self.symbols.alloc(SymbolData {
            name,
            kind,
            accessibility,
            container: Some(container),
            assembly,
            declaration,
        });
        match &mut self.symbols[container].kind {
            SymbolKind::Namespace(data) => data.members.insert(name, id),
            SymbolKind::Type(data) => data.members.insert(name, id),
            _ => {}
        }
        id
    }

    fn add_type_parameter(
        &mut self,
        owner: SymbolId,
        name: &str,
        ordinal: usize,
        constraint: Option<TypeParameterConstraint>,
    ) -> SymbolId {
        let assembly = self.symbols[owner].assembly;
        self.symbols.alloc(SymbolData {
            name: self.interner.intern(name),
            kind: SymbolKind::TypeParameter(TypeParameterData {
                ordinal,
                constraint,
            }),
            accessibility: Accessibility::Public,
            container: Some(owner),
            assembly,
            declaration: None,
        })
    }

    fn add_parameter(&mut self, owner: SymbolId, name: &str, ordinal: usize, ty: Ty) -> SymbolId {
        let assembly = self.symbols[owner].assembly;
        self.symbols.alloc(SymbolData {
            name: self.interner.intern(name),
            kind: SymbolKind::Parameter(ParameterData { ordinal, ty }),
            accessibility: Accessibility::Public,
            container: Some(owner),
            assembly,
            declaration: None,
        })
    }
}
