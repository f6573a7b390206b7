//! Thread-safe, optionally file-backed handle to a [`CollectionStore`].

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::{
    error::{StoreError, StoreResult},
    models::{EntryId, GameEntry, GameStatus, Platform},
    persist,
    query::{CollectionSummary, ListQuery},
    store::{CollectionStore, NewEntry},
};

/// Shared collection. Clones refer to the same underlying store.
///
/// Every call holds the store lock for its whole duration, so no caller ever
/// observes a partially applied update. With autosave enabled each successful
/// mutation is written to disk before the lock is released; if that write
/// fails the mutation is rolled back.
#[derive(Clone)]
pub struct Collection {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    store: CollectionStore,
    path: Option<PathBuf>,
    autosave: bool,
}

impl Collection {
    /// Collection that lives only in memory.
    pub fn in_memory() -> Self {
        Self::from_store(CollectionStore::new())
    }

    /// Wrap an existing store without a backing file.
    pub fn from_store(store: CollectionStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                store,
                path: None,
                autosave: false,
            })),
        }
    }

    /// Open the collection stored at `path`, starting empty if the file does
    /// not exist yet.
    pub fn open(path: impl Into<PathBuf>, autosave: bool) -> Result<Self> {
        let path = path.into();
        let store = match persist::load(&path)? {
            Some(store) => store,
            None => {
                info!(path = %path.display(), "starting a new collection");
                CollectionStore::new()
            }
        };
        Ok(Self {
            inner: Arc::new(RwLock::new(Inner {
                store,
                path: Some(path),
                autosave,
            })),
        })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<PathBuf> {
        self.inner.read().path.clone()
    }

    /// Write the collection to its backing file.
    pub fn save(&self) -> Result<()> {
        let inner = self.inner.read();
        match inner.path.as_deref() {
            Some(path) => persist::save(path, &inner.store),
            None => {
                warn!("save requested for an in-memory collection");
                Ok(())
            }
        }
    }

    /// Write the collection to `path` and make it the backing file.
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut inner = self.inner.write();
        let path = path.as_ref();
        persist::save(path, &inner.store)?;
        inner.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Replace in-memory state with the contents of the backing file.
    pub fn reload(&self) -> Result<()> {
        let mut inner = self.inner.write();
        let Some(path) = inner.path.clone() else {
            return Ok(());
        };
        inner.store = persist::load(&path)?.unwrap_or_default();
        Ok(())
    }

    /// Number of tracked games.
    pub fn len(&self) -> usize {
        self.inner.read().store.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().store.is_empty()
    }

    /// See [`CollectionStore::add`].
    pub fn add(&self, title: &str) -> StoreResult<GameEntry> {
        self.mutate(|store| store.add(title).cloned())
    }

    /// See [`CollectionStore::add_entry`].
    pub fn add_entry(&self, new: NewEntry) -> StoreResult<GameEntry> {
        self.mutate(|store| store.add_entry(new).cloned())
    }

    /// See [`CollectionStore::get`].
    pub fn get(&self, id: EntryId) -> StoreResult<GameEntry> {
        self.inner.read().store.get(id).cloned()
    }

    /// See [`CollectionStore::find_by_external_id`].
    pub fn find_by_external_id(&self, external_id: &str) -> Option<GameEntry> {
        self.inner
            .read()
            .store
            .find_by_external_id(external_id)
            .cloned()
    }

    /// See [`CollectionStore::list`].
    pub fn list(&self, query: &ListQuery) -> Vec<GameEntry> {
        self.inner
            .read()
            .store
            .list(query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// See [`CollectionStore::search`].
    pub fn search(&self, query: &str) -> Vec<GameEntry> {
        self.inner
            .read()
            .store
            .search(query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// See [`CollectionStore::summary`].
    pub fn summary(&self) -> CollectionSummary {
        self.inner.read().store.summary()
    }

    /// See [`CollectionStore::set_status`].
    pub fn set_status(&self, id: EntryId, status: GameStatus) -> StoreResult<GameEntry> {
        self.mutate(|store| store.set_status(id, status).cloned())
    }

    /// See [`CollectionStore::set_playtime`].
    pub fn set_playtime(&self, id: EntryId, minutes: i64) -> StoreResult<GameEntry> {
        self.mutate(|store| store.set_playtime(id, minutes).cloned())
    }

    /// See [`CollectionStore::add_playtime`].
    pub fn add_playtime(&self, id: EntryId, minutes: u64) -> StoreResult<GameEntry> {
        self.mutate(|store| store.add_playtime(id, minutes).cloned())
    }

    /// See [`CollectionStore::set_rating`].
    pub fn set_rating(&self, id: EntryId, rating: Option<i64>) -> StoreResult<GameEntry> {
        self.mutate(|store| store.set_rating(id, rating).cloned())
    }

    /// See [`CollectionStore::add_tag`].
    pub fn add_tag(&self, id: EntryId, tag: &str) -> StoreResult<bool> {
        self.mutate(|store| store.add_tag(id, tag))
    }

    /// See [`CollectionStore::remove_tag`].
    pub fn remove_tag(&self, id: EntryId, tag: &str) -> StoreResult<bool> {
        self.mutate(|store| store.remove_tag(id, tag))
    }

    /// See [`CollectionStore::set_notes`].
    pub fn set_notes(&self, id: EntryId, notes: Option<String>) -> StoreResult<GameEntry> {
        self.mutate(|store| store.set_notes(id, notes).cloned())
    }

    /// See [`CollectionStore::set_review`].
    pub fn set_review(&self, id: EntryId, review: Option<String>) -> StoreResult<GameEntry> {
        self.mutate(|store| store.set_review(id, review).cloned())
    }

    /// See [`CollectionStore::set_platform`].
    pub fn set_platform(&self, id: EntryId, platform: Option<Platform>) -> StoreResult<GameEntry> {
        self.mutate(|store| store.set_platform(id, platform).cloned())
    }

    /// See [`CollectionStore::remove`].
    pub fn remove(&self, id: EntryId) -> StoreResult<GameEntry> {
        self.mutate(|store| store.remove(id))
    }

    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut CollectionStore) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut guard = self.inner.write();
        let Inner {
            store,
            path,
            autosave,
        } = &mut *guard;
        let target = path.as_deref().filter(|_| *autosave);

        let backup = target.map(|_| store.clone());
        let value = op(&mut *store)?;
        if let Some(path) = target {
            if let Err(err) = persist::save(path, store) {
                warn!(path = %path.display(), "autosave failed, rolling back: {err:#}");
                if let Some(backup) = backup {
                    *store = backup;
                }
                return Err(StoreError::Storage(err));
            }
        }
        Ok(value)
    }
}
