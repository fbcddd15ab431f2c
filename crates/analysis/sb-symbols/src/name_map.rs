//! Multi-valued name to entity map

use indexmap::IndexMap;
use sb_intern::Name;
use smallvec::SmallVec;

/// Name to entities map preserving declaration order
///
/// A name may map to several entities (overloads, or erroneous duplicate
/// declarations). Names iterate in order of their first declaration and the
/// entities of one name iterate in declaration order.
#[derive(Debug, Clone)]
pub struct NameMap<T> {
    entries: IndexMap<Name, SmallVec<[T; 1]>>,
    len: usize,
}

impl<T> NameMap<T> {
    /// Creates an empty map
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            len: 0,
        }
    }

    /// Adds `value` under `name` after any existing values
    pub fn insert(&mut self, name: Name, value: T) {
        self.entries.entry(name).or_default().push(value);
        self.len += 1;
    }

    /// All values declared under `name`, in declaration order
    #[must_use]
    pub fn get(&self, name: Name) -> &[T] {
        self.entries.get(&name).map_or(&[], |values| values.as_slice())
    }

    /// Whether anything is declared under `name`
    #[must_use]
    pub fn contains(&self, name: Name) -> bool {
        self.entries.contains_key(&name)
    }

    /// Declared names in first-declaration order
    pub fn names(&self) -> impl Iterator<Item = Name> + '_ {
        self.entries.keys().copied()
    }

    /// Every `(name, value)` pair
    pub fn iter(&self) -> impl Iterator<Item = (Name, &T)> + '_ {
        self.entries
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |value| (*name, value)))
    }

    /// Total number of values
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the map holds no values
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T> Default for NameMap<T> {
    fn default() -> Self {
        Self::new()
    }
}
