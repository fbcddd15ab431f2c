//! Publish-once cells for lazily computed, shared data

use once_cell::race::OnceBox;
use std::fmt;
use tracing::trace;

/// A cell filled at most once by whichever thread publishes first
///
/// Several threads may compute a value concurrently; exactly one value is
/// published and every other computed value is dropped. The computation must
/// be a pure function of its inputs, so all readers observe the same result
/// no matter which thread won.
pub struct PublishCell<T> {
    cell: OnceBox<T>,
}

impl<T> PublishCell<T> {
    /// Creates an empty cell
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: OnceBox::new(),
        }
    }

    /// Creates a cell that is already published
    #[must_use]
    pub fn with_value(value: T) -> Self {
        Self {
            cell: OnceBox::with_value(Box::new(value)),
        }
    }

    /// The published value, if any
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Whether a value has been published
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Returns the published value, computing and publishing one if needed
    pub fn get_or_publish(&self, compute: impl FnOnce() -> T) -> &T {
        if let Some(value) = self.cell.get() {
            return value;
        }

        let candidate = Box::new(compute());
        let candidate_ptr: *const T = &*candidate;
        let published = self.cell.get_or_init(move || candidate);

        if std::ptr::eq(published, candidate_ptr) {
            trace!("published lazily computed value");
        } else {
            trace!("lost publish race, discarding computed value");
        }
        published
    }
}

impl<T> Default for PublishCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for PublishCell<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PublishCell")
            .field("value", &self.cell.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_computes_once_when_single_threaded() {
        let cell = PublishCell::new();
        let calls = AtomicUsize::new(0);

        let first = *cell.get_or_publish(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            7
        });
        let second = *cell.get_or_publish(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            8
        });

        assert_eq!(first, 7);
        assert_eq!(second, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_prefilled_cell_never_computes() {
        let cell = PublishCell::with_value("ready");
        assert!(cell.is_published());
        assert_eq!(*cell.get_or_publish(|| "late"), "ready");
    }

    #[test]
    fn test_concurrent_publishers_agree() {
        use rayon::prelude::*;

        let cell = PublishCell::new();
        let values: Vec<usize> = (0..64_usize)
            .into_par_iter()
            .map(|candidate| *cell.get_or_publish(|| candidate))
            .collect();
        let winner = values[0];
        assert!(values.iter().all(|value| *value == winner));
        assert_eq!(cell.get(), Some(&winner));
    }
}
