//! Copy-on-write list used for subscribers and forwarding edges.
//!
//! Readers take an `Arc` snapshot and drop the lock before doing any work, so
//! a dispatch in progress never observes edits and handlers can edit the list
//! they are being called from.

use std::sync::{Arc, PoisonError, RwLock};

pub(crate) struct CowList<T> {
    items: RwLock<Arc<Vec<T>>>,
}

impl<T: Clone> CowList<T> {
    pub(crate) fn new() -> Self {
        Self {
            items: RwLock::new(Arc::new(Vec::new())),
        }
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.items.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(crate) fn push(&self, item: T) {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        Arc::make_mut(&mut items).push(item);
    }

    /// Push unless an existing item matches `same`. Returns `true` if pushed.
    pub(crate) fn push_unique(&self, item: T, same: impl Fn(&T) -> bool) -> bool {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if items.iter().any(same) {
            return false;
        }
        Arc::make_mut(&mut items).push(item);
        true
    }

    /// Remove the first item matching `pred`. Returns the removed item.
    pub(crate) fn remove_first(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let index = items.iter().position(pred)?;
        Some(Arc::make_mut(&mut items).remove(index))
    }

    /// Swap in an empty list, returning what was there.
    pub(crate) fn take(&self) -> Arc<Vec<T>> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *items, Arc::new(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_isolated_from_edits() {
        let list = CowList::new();
        list.push(1);
        list.push(2);

        let before = list.snapshot();
        list.push(3);
        assert!(list.remove_first(|n| *n == 1).is_some());

        assert_eq!(*before, vec![1, 2]);
        assert_eq!(*list.snapshot(), vec![2, 3]);
    }

    #[test]
    fn test_push_unique_and_remove_first() {
        let list = CowList::new();
        assert!(list.push_unique(7, |n| *n == 7));
        assert!(!list.push_unique(7, |n| *n == 7));
        list.push(7);
        assert_eq!(list.len(), 2);

        assert_eq!(list.remove_first(|n| *n == 7), Some(7));
        assert_eq!(list.len(), 1);
        assert_eq!(list.remove_first(|n| *n == 8), None);
    }

    #[test]
    fn test_take_empties_list() {
        let list = CowList::new();
        list.push("a");
        let taken = list.take();
        assert_eq!(*taken, vec!["a"]);
        assert_eq!(list.len(), 0);
    }
}
