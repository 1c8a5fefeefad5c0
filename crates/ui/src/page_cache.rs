//! Deduplication of in-flight page loads
//!
//! Every page is fetched at most once at a time: callers asking for a page
//! that is already loading receive the same shared task. Entries are tagged
//! with the generation they were issued under, so when the document is
//! replaced the old loads can finish without touching the new state.

use std::collections::HashMap;

/// Pending page loads keyed by page number
#[derive(Debug)]
pub struct PageLoadCache<T> {
    generation: u64,
    pending: HashMap<u32, PendingRequest<T>>,
}

#[derive(Debug)]
struct PendingRequest<T> {
    generation: u64,
    task: T,
}

impl<T: Clone> PageLoadCache<T> {
    pub fn new() -> Self {
        Self {
            generation: 0,
            pending: HashMap::new(),
        }
    }

    /// Current document generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether work issued under `generation` is still relevant
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// In-flight load for `page_number`, if any
    pub fn get(&self, page_number: u32) -> Option<T> {
        self.pending
            .get(&page_number)
            .map(|request| request.task.clone())
    }

    /// Record an in-flight load under the current generation
    ///
    /// Returns the generation the load was tagged with.
    pub fn insert(&mut self, page_number: u32, task: T) -> u64 {
        self.pending.insert(
            page_number,
            PendingRequest {
                generation: self.generation,
                task,
            },
        );
        self.generation
    }

    /// Clear the slot of a finished load
    ///
    /// Returns `false`, leaving the cache untouched, when the load belongs to
    /// an older generation.
    pub fn complete(&mut self, page_number: u32, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }

        match self.pending.get(&page_number) {
            Some(request) if request.generation == generation => {
                self.pending.remove(&page_number);
                true
            }
            _ => false,
        }
    }

    /// Drop every pending entry and start a new generation
    pub fn reset(&mut self) -> u64 {
        self.pending.clear();
        self.generation += 1;
        self.generation
    }

    pub fn is_pending(&self, page_number: u32) -> bool {
        self.pending.contains_key(&page_number)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T: Clone> Default for PageLoadCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut cache = PageLoadCache::new();
        assert!(cache.get(1).is_none());

        let generation = cache.insert(1, "page-1");
        assert_eq!(generation, 0);
        assert_eq!(cache.get(1), Some("page-1"));
        assert!(cache.is_pending(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_complete_clears_slot() {
        let mut cache = PageLoadCache::new();
        let generation = cache.insert(4, "page-4");

        assert!(cache.complete(4, generation));
        assert!(!cache.is_pending(4));
        assert!(cache.is_empty());

        // Completing twice is harmless
        assert!(!cache.complete(4, generation));
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let mut cache = PageLoadCache::new();
        let old_generation = cache.insert(2, "old");

        let new_generation = cache.reset();
        assert_ne!(old_generation, new_generation);
        assert!(!cache.is_current(old_generation));
        assert!(cache.is_empty());

        cache.insert(2, "new");
        assert!(!cache.complete(2, old_generation));
        assert_eq!(cache.get(2), Some("new"));

        assert!(cache.complete(2, new_generation));
        assert!(cache.is_empty());
    }
}
