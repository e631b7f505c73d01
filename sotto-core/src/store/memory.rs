//! In-memory recording store backed by a `parking_lot::RwLock` map.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{Recording, RecordingStore};

/// Map-backed store. Basic thread-safety only: one writer or many readers,
/// no transactional guarantees across calls.
#[derive(Debug, Default)]
pub struct MemoryStore {
    recordings: RwLock<HashMap<String, Recording>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recordings currently held.
    pub fn len(&self) -> usize {
        self.recordings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.read().is_empty()
    }
}

impl RecordingStore for MemoryStore {
    fn store(&self, recording: Recording) {
        self.recordings
            .write()
            .insert(recording.id().to_owned(), recording);
    }

    fn get(&self, id: &str) -> Option<Recording> {
        self.recordings.read().get(id).cloned()
    }

    fn clear(&self, id: &str) -> bool {
        self.recordings.write().remove(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::PcmBuffer;

    fn recording(id: &str) -> Recording {
        Recording::new(id, PcmBuffer::new(vec![0, 0], 16_000, 16, 1))
    }

    #[test]
    fn store_get_clear_round_trip() {
        let store = MemoryStore::new();
        store.store(recording("a"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().id(), "a");
        assert!(store.get("b").is_none());

        assert!(store.clear("a"));
        assert!(!store.clear("a"));
        assert!(store.is_empty());
    }

    #[test]
    fn store_replaces_same_id() {
        let store = MemoryStore::new();
        store.store(recording("a"));

        let mut updated = recording("a");
        updated.set_transcript("words", None);
        store.store(updated);

        assert_eq!(store.len(), 1);
        assert!(store.get("a").unwrap().has_transcript());
    }

    #[test]
    fn get_returns_a_defensive_copy() {
        let store = MemoryStore::new();
        store.store(recording("a"));

        let mut copy = store.get("a").unwrap();
        copy.set_transcript("local only", None);

        assert!(!store.get("a").unwrap().has_transcript());
    }

    #[test]
    fn concurrent_writers_do_not_lose_entries() {
        use std::sync::Arc;

        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        store.store(recording(&format!("rec-{i}-{j}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 400);
    }
}
