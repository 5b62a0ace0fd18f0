use crate::config::{self, FAVORITES_SLOT, KeyValueStore};
use crate::model::{FavoriteKey, FavoriteRecord, MediaItem, MediaKind};
use anyhow::Result;
use std::collections::HashSet;
use std::rc::Rc;
use tracing::{info, warn};

/// Favorites persisted under a single storage slot.
///
/// Every mutation writes the full record list back, so the slot always
/// holds exactly what is in memory after a successful call.
pub struct FavoritesStore {
    storage: Rc<dyn KeyValueStore>,
    records: Vec<FavoriteRecord>,
}

impl FavoritesStore {
    /// Loads whatever was last persisted; absence or corruption yields an empty store.
    pub fn load(storage: Rc<dyn KeyValueStore>) -> Self {
        let stored: Vec<FavoriteRecord> =
            config::load_slot(storage.as_ref(), FAVORITES_SLOT).unwrap_or_default();

        let mut seen = HashSet::with_capacity(stored.len());
        let mut records = Vec::with_capacity(stored.len());
        for record in stored {
            if seen.insert(record.key()) {
                records.push(record);
            } else {
                warn!(id = %record.key(), "dropping duplicate favorite");
            }
        }

        Self { storage, records }
    }

    pub fn records(&self) -> &[FavoriteRecord] {
        &self.records
    }

    pub fn get(&self, position: usize) -> Option<&FavoriteRecord> {
        self.records.get(position)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, kind: MediaKind, index: usize) -> bool {
        let key = FavoriteKey::new(kind, index);
        self.records.iter().any(|record| record.key() == key)
    }

    /// Returns `true` when the item was added, `false` when it was removed.
    /// Memory is left untouched when the write fails.
    pub fn toggle(&mut self, kind: MediaKind, index: usize, item: &MediaItem) -> Result<bool> {
        let key = FavoriteKey::new(kind, index);
        let mut next = self.records.clone();
        let added = match self.position(key) {
            Some(position) => {
                next.remove(position);
                false
            }
            None => {
                next.push(FavoriteRecord::new(key, item));
                true
            }
        };
        self.commit(next)?;
        info!(id = %key, added, "toggled favorite");
        Ok(added)
    }

    /// Returns whether a record was removed.
    pub fn remove(&mut self, key: FavoriteKey) -> Result<bool> {
        let Some(position) = self.position(key) else {
            return Ok(false);
        };
        let mut next = self.records.clone();
        next.remove(position);
        self.commit(next)?;
        info!(id = %key, "removed favorite");
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.commit(Vec::new())?;
        info!("cleared favorites");
        Ok(())
    }

    fn position(&self, key: FavoriteKey) -> Option<usize> {
        self.records.iter().position(|record| record.key() == key)
    }

    /// Persists `next` and only then makes it the in-memory list.
    fn commit(&mut self, next: Vec<FavoriteRecord>) -> Result<()> {
        config::save_slot(self.storage.as_ref(), FAVORITES_SLOT, &next)?;
        self.records = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;
    use proptest::prop_assert_eq;

    fn item(title: &str) -> MediaItem {
        MediaItem::new(&format!("{title}.mp4"), title, "desc").with_duration_label("9:56")
    }

    fn store_over(memory: &MemoryStore) -> FavoritesStore {
        FavoritesStore::load(Rc::new(memory.clone()))
    }

    #[test]
    fn toggle_adds_then_removes() {
        let memory = MemoryStore::new();
        let mut store = store_over(&memory);

        assert!(store.toggle(MediaKind::Video, 2, &item("Sintel")).expect("toggle"));
        assert!(store.contains(MediaKind::Video, 2));
        assert!(!store.contains(MediaKind::Track, 2));

        assert!(!store.toggle(MediaKind::Video, 2, &item("Sintel")).expect("toggle"));
        assert!(!store.contains(MediaKind::Video, 2));
        assert_eq!(memory.raw(FAVORITES_SLOT).as_deref(), Some("[]"));
    }

    #[test]
    fn membership_survives_reload() {
        let memory = MemoryStore::new();
        let mut store = store_over(&memory);
        store.toggle(MediaKind::Track, 0, &item("Tristram")).expect("toggle");
        store.toggle(MediaKind::Video, 1, &item("Sintel")).expect("toggle");
        store
            .remove(FavoriteKey::new(MediaKind::Track, 0))
            .expect("remove");

        let reloaded = store_over(&memory);
        assert!(!reloaded.contains(MediaKind::Track, 0));
        assert!(reloaded.contains(MediaKind::Video, 1));
        assert_eq!(reloaded.records(), store.records());
    }

    #[test]
    fn removing_unknown_id_is_a_no_op() {
        let memory = MemoryStore::new();
        let mut store = store_over(&memory);
        let removed = store
            .remove(FavoriteKey::new(MediaKind::Video, 9))
            .expect("remove");
        assert!(!removed);
        assert!(memory.raw(FAVORITES_SLOT).is_none());
    }

    #[test]
    fn corrupt_slot_starts_empty() {
        let memory = MemoryStore::new();
        memory.put_raw(FAVORITES_SLOT, "[{\"id\": 12}]");
        let store = store_over(&memory);
        assert!(store.is_empty());
    }

    #[test]
    fn duplicate_records_are_collapsed_on_load() {
        let memory = MemoryStore::new();
        let record = FavoriteRecord::new(FavoriteKey::new(MediaKind::Video, 0), &item("Bunny"));
        let json = serde_json::to_string(&vec![record.clone(), record]).expect("json");
        memory.put_raw(FAVORITES_SLOT, &json);

        let store = store_over(&memory);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn failed_write_leaves_memory_as_last_persisted() {
        let memory = MemoryStore::new();
        let mut store = store_over(&memory);
        store.toggle(MediaKind::Track, 0, &item("Tristram")).expect("toggle");

        memory.set_read_only(true);
        assert!(store.toggle(MediaKind::Video, 1, &item("Sintel")).is_err());
        assert!(!store.contains(MediaKind::Video, 1));
        assert!(store.remove(FavoriteKey::new(MediaKind::Track, 0)).is_err());
        assert!(store.clear().is_err());
        assert!(store.contains(MediaKind::Track, 0));

        let reloaded = store_over(&memory);
        assert_eq!(reloaded.records(), store.records());
    }

    #[test]
    fn clear_persists_empty_list() {
        let memory = MemoryStore::new();
        let mut store = store_over(&memory);
        store.toggle(MediaKind::Video, 0, &item("Bunny")).expect("toggle");
        store.clear().expect("clear");
        assert!(store_over(&memory).is_empty());
    }

    proptest::proptest! {
        #[test]
        fn double_toggle_is_identity(
            seeded in proptest::collection::vec((0u8..2, 0usize..6), 0..8),
            kind in 0u8..2,
            index in 0usize..6,
        ) {
            let memory = MemoryStore::new();
            let mut store = store_over(&memory);
            for (kind, index) in seeded {
                let kind = if kind == 0 { MediaKind::Video } else { MediaKind::Track };
                if !store.contains(kind, index) {
                    store.toggle(kind, index, &item("seed")).expect("toggle");
                }
            }
            let before = store.records().to_vec();
            let mut keys_before: Vec<FavoriteKey> = before.iter().map(|r| r.key()).collect();
            keys_before.sort();

            let kind = if kind == 0 { MediaKind::Video } else { MediaKind::Track };
            store.toggle(kind, index, &item("flip")).expect("toggle");
            store.toggle(kind, index, &item("flip")).expect("toggle");

            let mut keys_after: Vec<FavoriteKey> = store.records().iter().map(|r| r.key()).collect();
            keys_after.sort();
            prop_assert_eq!(keys_before, keys_after);
        }
    }
}
