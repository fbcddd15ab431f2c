//! The immutable entity graph shared by every analysis thread

use crate::special::SpecialType;
use crate::symbol::{Accessibility, AssemblyId, SymbolData, SymbolId, SymbolKind};
use crate::ty::Ty;
use la_arena::Arena;
use rustc_hash::{FxHashMap, FxHashSet};
use sb_intern::{Interner, Name};
use sb_syntax::PredefinedType;

/// Declared entities of a compilation and the assemblies it references
///
/// Built once by [`SymbolGraphBuilder`](crate::SymbolGraphBuilder) and never
/// mutated afterwards, so it can be shared by reference across threads.
#[derive(Debug)]
pub struct SymbolGraph {
    pub(crate) symbols: Arena<SymbolData>,
    pub(crate) global_namespace: SymbolId,
    pub(crate) special_types: FxHashMap<SpecialType, SymbolId>,
    pub(crate) interner: Interner,
}

impl SymbolGraph {
    /// Entity data
    #[must_use]
    pub fn get(&self, id: SymbolId) -> &SymbolData {
        &self.symbols[id]
    }

    /// Interner the entity names were interned with
    #[must_use]
    pub const fn interner(&self) -> &Interner {
        &self.interner
    }

    /// The unnamed root namespace
    #[must_use]
    pub const fn global_namespace(&self) -> SymbolId {
        self.global_namespace
    }

    /// Declared name of an entity
    #[must_use]
    pub fn name(&self, id: SymbolId) -> Name {
        self.symbols[id].name
    }

    /// Members of a namespace or type called `name`, in declaration order
    #[must_use]
    pub fn members(&self, container: SymbolId, name: Name) -> &[SymbolId] {
        self.symbols[container]
            .members()
            .map_or(&[], |members| members.get(name))
    }

    /// Every member of a namespace or type
    pub fn all_members(&self, container: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols[container]
            .members()
            .into_iter()
            .flat_map(|members| members.iter().map(|(_, id)| *id))
    }

    /// A well-known type, if the core library defines it
    #[must_use]
    pub fn special_type(&self, special: SpecialType) -> Option<SymbolId> {
        self.special_types.get(&special).copied()
    }

    /// The type a predefined keyword denotes
    ///
    /// A keyword whose backing type is missing from the core library binds to
    /// [`Ty::Error`].
    #[must_use]
    pub fn predefined_type(&self, keyword: PredefinedType) -> Ty {
        let special = match keyword {
            PredefinedType::Void => return Ty::Void,
            PredefinedType::Dynamic => return Ty::Dynamic,
            PredefinedType::Bool => SpecialType::Boolean,
            PredefinedType::Int => SpecialType::Int32,
            PredefinedType::String => SpecialType::String,
            PredefinedType::Object => SpecialType::Object,
        };
        self.special_type(special).map_or(Ty::Error, Ty::Named)
    }

    /// Whether `ty` is the special type `special`
    #[must_use]
    pub fn is_special(&self, ty: &Ty, special: SpecialType) -> bool {
        ty.symbol().is_some() && ty.symbol() == self.special_type(special)
    }

    /// The type an entity is declared in, if any
    #[must_use]
    pub fn containing_type(&self, id: SymbolId) -> Option<SymbolId> {
        let container = self.symbols[id].container?;
        match self.symbols[container].kind {
            SymbolKind::Type(_) => Some(container),
            SymbolKind::Method(_) => self.containing_type(container),
            _ => None,
        }
    }

    /// Base classes of a type, nearest first
    pub fn base_types(&self, id: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
        let limit = self.symbols.len();
        std::iter::successors(self.base_of(id), move |current| self.base_of(*current)).take(limit)
    }

    fn base_of(&self, id: SymbolId) -> Option<SymbolId> {
        self.symbols[id].as_type().and_then(|data| data.base)
    }

    /// Interfaces a type implements, directly or through its bases and other interfaces
    #[must_use]
    pub fn all_interfaces(&self, id: SymbolId) -> Vec<SymbolId> {
        let mut seen = FxHashSet::default();
        let mut ordered = Vec::new();
        let mut pending: Vec<SymbolId> = std::iter::once(id).chain(self.base_types(id)).collect();
        pending.reverse();

        while let Some(current) = pending.pop() {
            let Some(data) = self.symbols[current].as_type() else {
                continue;
            };
            for &interface in data.interfaces.iter().rev() {
                if seen.insert(interface) {
                    ordered.push(interface);
                    pending.push(interface);
                }
            }
        }

        ordered
    }

    /// Whether `derived` is `base` or inherits from it
    #[must_use]
    pub fn is_derived_from(&self, derived: SymbolId, base: SymbolId) -> bool {
        derived == base || self.base_types(derived).any(|candidate| candidate == base)
    }

    /// Whether a value of type `from` converts implicitly to the named type `to`
    ///
    /// Identity, base class, implemented interface and conversion to the root
    /// object type are recognised; `dynamic` converts to everything.
    #[must_use]
    pub fn has_implicit_reference_conversion(&self, from: &Ty, to: SymbolId) -> bool {
        match from {
            Ty::Dynamic => true,
            Ty::Named(from) => {
                self.is_derived_from(*from, to)
                    || self.all_interfaces(*from).contains(&to)
                    || self.special_type(SpecialType::Object) == Some(to)
            }
            Ty::Anonymous(_) => self.special_type(SpecialType::Object) == Some(to),
            Ty::Void | Ty::Error => false,
        }
    }

    /// Whether `inner` is `outer` or is nested (at any depth) inside it
    #[must_use]
    pub fn is_enclosed_by(&self, inner: SymbolId, outer: SymbolId) -> bool {
        let mut current = Some(inner);
        while let Some(id) = current {
            if id == outer {
                return true;
            }
            current = self.symbols[id].container;
        }
        false
    }

    /// Whether `target` can be referenced from code inside `within`
    ///
    /// `within` is the innermost type (or namespace) of the referencing code;
    /// `None` means namespace-level code of the source assembly.
    #[must_use]
    pub fn is_accessible(&self, target: SymbolId, within: Option<SymbolId>) -> bool {
        let data = &self.symbols[target];
        let from_assembly = within.map_or(AssemblyId::SOURCE, |id| self.symbols[id].assembly);

        match data.accessibility {
            Accessibility::Public => true,
            Accessibility::Internal => data.assembly == from_assembly,
            Accessibility::Private => {
                let Some(declaring) = self.declaring_type(target) else {
                    return data.assembly == from_assembly;
                };
                within.is_some_and(|within| self.is_enclosed_by(within, declaring))
            }
            Accessibility::Protected => {
                let Some(declaring) = self.declaring_type(target) else {
                    return data.assembly == from_assembly;
                };
                within.is_some_and(|within| {
                    let mut current = Some(within);
                    while let Some(id) = current {
                        if self.symbols[id].is_type() && self.is_derived_from(id, declaring) {
                            return true;
                        }
                        current = self.symbols[id].container;
                    }
                    false
                })
            }
        }
    }

    fn declaring_type(&self, id: SymbolId) -> Option<SymbolId> {
        let container = self.symbols[id].container?;
        self.symbols[container].is_type().then_some(container)
    }

    /// Dotted name from the global namespace, e.g. `System.Collections.List`
    #[must_use]
    pub fn qualified_name(&self, id: SymbolId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(symbol) = current {
            if symbol == self.global_namespace {
                break;
            }
            parts.push(self.interner.resolve(self.symbols[symbol].name));
            current = self.symbols[symbol].container;
        }
        parts.reverse();
        parts.join(".")
    }

    /// Resolves a dotted namespace or type name from the global namespace
    ///
    /// Only non-generic entities are considered at each step.
    #[must_use]
    pub fn resolve_qualified(&self, dotted: &str) -> Option<SymbolId> {
        dotted.split('.').try_fold(self.global_namespace, |container, part| {
            let name = self.interner.get(part)?;
            self.members(container, name)
                .iter()
                .copied()
                .find(|id| self.symbols[*id].is_namespace_or_type() && self.symbols[*id].arity() == 0)
        })
    }

    /// Extension methods called `name` declared directly in the static class `class`
    pub fn extension_methods(
        &self,
        class: SymbolId,
        name: Name,
    ) -> impl Iterator<Item = SymbolId> + '_ {
        let is_static_class = self.symbols[class]
            .as_type()
            .is_some_and(|data| data.is_static);
        self.members(class, name)
            .iter()
            .copied()
            .filter(move |id| {
                is_static_class
                    && self.symbols[*id]
                        .as_method()
                        .is_some_and(|method| method.is_extension && method.is_static)
            })
    }

    /// The type of a parameter, field or property; [`Ty::Error`] otherwise
    #[must_use]
    pub fn value_type(&self, id: SymbolId) -> Ty {
        match &self.symbols[id].kind {
            SymbolKind::Parameter(data) => data.ty.clone(),
            SymbolKind::Field(data) => data.ty.clone(),
            SymbolKind::Property(data) => data.ty.clone(),
            _ => Ty::Error,
        }
    }

    /// Number of entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the graph holds nothing but the global namespace
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.len() <= 1
    }
}
