//! String interning for identifiers
//!
//! Every identifier the binder compares is interned once, so name matching
//! during lookup is a cheap, case-sensitive key comparison.

pub use lasso::Spur as Name;
use lasso::ThreadedRodeo;
use std::sync::Arc;

/// Thread-safe identifier interner
///
/// Cloning is cheap and every clone shares the same table, so one interner
/// can be handed to each analysis thread.
#[derive(Clone, Debug)]
pub struct Interner {
    inner: Arc<ThreadedRodeo>,
}

impl Interner {
    /// Creates an empty interner
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ThreadedRodeo::new()),
        }
    }

    /// Interns `text`, returning the existing name if it was seen before
    pub fn intern(&self, text: &str) -> Name {
        self.inner.get_or_intern(text)
    }

    /// Returns the name for `text` without interning it
    #[must_use]
    pub fn get(&self, text: &str) -> Option<Name> {
        self.inner.get(text)
    }

    /// Resolves a name back to its text
    #[must_use]
    pub fn resolve(&self, name: Name) -> &str {
        self.inner.resolve(&name)
    }

    /// Resolves a name that may come from another interner
    #[must_use]
    pub fn try_resolve(&self, name: Name) -> Option<&str> {
        self.inner.try_resolve(&name)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
