//! Immutable, cheaply shareable snapshot of a tenant's records.
//!
//! Every mutation returns a new list; readers holding an older snapshot keep
//! seeing the state they started with.

use std::sync::Arc;

use neurocore_core::Entity;

#[derive(Debug)]
pub struct ItemList<T> {
    items: Arc<Vec<T>>,
}

impl<T> Clone for ItemList<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for ItemList<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
        }
    }
}

impl<T> From<Vec<T>> for ItemList<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }
}

impl<T: Entity + Clone> ItemList<T> {
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Returns a new list with `item` at the end.
    pub fn appended(&self, item: T) -> Self {
        let mut next = Vec::with_capacity(self.items.len() + 1);
        next.extend(self.items.iter().cloned());
        next.push(item);
        Self::from(next)
    }

    /// Returns a new list where the entry with the same id is replaced in place.
    ///
    /// An unknown id leaves the list unchanged.
    pub fn replaced(&self, item: T) -> Self {
        let next = self
            .items
            .iter()
            .map(|existing| {
                if existing.id() == item.id() {
                    item.clone()
                } else {
                    existing.clone()
                }
            })
            .collect::<Vec<_>>();
        Self::from(next)
    }

    pub fn removed(&self, id: &T::Id) -> Self {
        let next = self
            .items
            .iter()
            .filter(|existing| existing.id() != id)
            .cloned()
            .collect::<Vec<_>>();
        Self::from(next)
    }
}
