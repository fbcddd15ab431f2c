//! Borrowed immutable linked list for "currently being computed" sets
//!
//! Each frame of a recursive computation prepends one node that lives on
//! its own stack frame, so the list never outlives the call tree that built
//! it and needs no allocation or synchronization.

/// An immutable singly linked list borrowing its tail
#[derive(Debug, Clone, Copy, Default)]
pub enum ConsList<'list, T> {
    /// The empty list
    #[default]
    Empty,
    /// A head element in front of a borrowed tail
    Cons(T, &'list ConsList<'list, T>),
}

impl<'list, T> ConsList<'list, T> {
    /// Returns a list with `head` in front of `self`
    #[must_use]
    pub const fn prepend(&'list self, head: T) -> Self {
        Self::Cons(head, self)
    }

    /// The first element
    #[must_use]
    pub const fn head(&self) -> Option<&T> {
        match self {
            Self::Empty => None,
            Self::Cons(head, _) => Some(head),
        }
    }

    /// Whether the list has no elements
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Elements from the most recently prepended to the oldest
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { current: self }
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

impl<T: PartialEq> ConsList<'_, T> {
    /// Whether `item` is in the list
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.iter().any(|candidate| candidate == item)
    }
}

/// Iterator over a [`ConsList`]
#[derive(Debug)]
pub struct Iter<'iter, T> {
    current: &'iter ConsList<'iter, T>,
}

impl<'iter, T> Iterator for Iter<'iter, T> {
    type Item = &'iter T;

    fn next(&mut self) -> Option<Self::Item> {
        match self.current {
            ConsList::Empty => None,
            ConsList::Cons(head, tail) => {
                self.current = tail;
                Some(head)
            }
        }
    }
}
