//! JSON snapshot persistence for the collection.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{models::GameEntry, store::CollectionStore};

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Default file name of the collection inside the data directory.
pub const DEFAULT_COLLECTION_FILE: &str = "collection.json";

/// Serialized representation of a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionFile {
    version: u32,
    next_id: u64,
    saved_at: DateTime<Utc>,
    #[serde(default)]
    entries: Vec<GameEntry>,
}

impl CollectionFile {
    /// Capture the current state of `store`.
    pub fn snapshot(store: &CollectionStore) -> Self {
        Self {
            version: FORMAT_VERSION,
            next_id: store.next_id(),
            saved_at: Utc::now(),
            entries: store.iter().cloned().collect(),
        }
    }

    /// Rebuild a store, rejecting snapshots that break store invariants.
    pub fn into_store(self) -> Result<CollectionStore> {
        if self.version != FORMAT_VERSION {
            bail!(
                "unsupported collection format version {} (expected {FORMAT_VERSION})",
                self.version
            );
        }
        CollectionStore::from_parts(self.next_id, self.entries)
            .map_err(|err| anyhow!("collection snapshot is inconsistent: {err}"))
    }
}

/// Load a store from `path`, returning `None` if the file does not exist.
pub fn load(path: impl AsRef<Path>) -> Result<Option<CollectionStore>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read collection {}", path.display()))?;
    let file: CollectionFile = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse collection {}", path.display()))?;
    let saved_at = file.saved_at;
    let store = file
        .into_store()
        .with_context(|| format!("failed to load collection {}", path.display()))?;
    info!(
        path = %path.display(),
        entries = store.len(),
        saved_at = %saved_at,
        "collection loaded"
    );
    Ok(Some(store))
}

/// Persist `store` to `path`.
///
/// The snapshot is written to a temporary file next to the target and then
/// renamed over it, so readers never observe a half-written collection.
pub fn save(path: impl AsRef<Path>, store: &CollectionStore) -> Result<()> {
    let path = path.as_ref();
    let parent = parent_dir(path);
    fs::create_dir_all(&parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    let serialized = serde_json::to_vec_pretty(&CollectionFile::snapshot(store))
        .context("failed to serialize collection")?;
    let mut temp = tempfile::NamedTempFile::new_in(&parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    temp.write_all(&serialized)
        .with_context(|| format!("failed to write {}", temp.path().display()))?;
    temp.as_file()
        .sync_all()
        .with_context(|| format!("failed to flush {}", temp.path().display()))?;
    temp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to write collection {}", path.display()))?;
    info!(path = %path.display(), entries = store.len(), "collection saved");
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{GameStatus, Platform},
        store::NewEntry,
    };
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_as_none() -> Result<()> {
        let dir = tempdir()?;
        assert!(load(dir.path().join("absent.json"))?.is_none());
        Ok(())
    }

    #[test]
    fn save_and_load_preserve_entries_and_ids() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(DEFAULT_COLLECTION_FILE);

        let mut store = CollectionStore::new();
        let kept = store
            .add_entry(
                NewEntry::new("Chrono Trigger")
                    .with_platform(Platform::Other)
                    .with_tag("JRPG")
                    .with_external_id("igdb-1"),
            )?
            .id;
        let dropped = store.add("Temporary")?.id;
        store.set_status(kept, GameStatus::Completed)?;
        store.set_rating(kept, Some(10))?;
        store.remove(dropped)?;
        save(&path, &store)?;
        assert!(path.exists());

        let mut loaded = load(&path)?.expect("expected a stored collection");
        assert_eq!(loaded.len(), 1);
        let entry = loaded.get(kept)?;
        assert_eq!(entry, store.get(kept)?);

        let next = loaded.add("Fresh")?.id;
        assert!(next > dropped);
        Ok(())
    }

    #[test]
    fn corrupt_files_are_errors() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json")?;
        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse collection"));

        fs::write(
            &path,
            r#"{"version": 1, "next_id": 1, "saved_at": "2024-01-01T00:00:00Z",
                "entries": [{"id": 4, "title": "Ghost", "status": "backlog",
                             "created_at": "2024-01-01T00:00:00Z",
                             "updated_at": "2024-01-01T00:00:00Z"}]}"#,
        )?;
        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("inconsistent"));

        fs::write(
            &path,
            r#"{"version": 1, "next_id": 5, "saved_at": "2024-01-01T00:00:00Z",
                "entries": [{"id": 4, "title": "Ghost", "status": "on_hold",
                             "created_at": "2024-01-01T00:00:00Z",
                             "updated_at": "2024-01-01T00:00:00Z"}]}"#,
        )?;
        assert!(load(&path).is_err());
        Ok(())
    }

    #[test]
    fn exhausted_next_id_fails_add_without_panicking() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("full.json");
        fs::write(
            &path,
            r#"{"version": 1, "next_id": 18446744073709551615,
                "saved_at": "2024-01-01T00:00:00Z", "entries": []}"#,
        )?;

        let mut store = load(&path)?.expect("expected a stored collection");
        assert!(store.add("Boom").unwrap_err().is_validation());
        assert!(store.is_empty());
        Ok(())
    }

    #[test]
    fn unknown_versions_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("future.json");
        fs::write(
            &path,
            r#"{"version": 99, "next_id": 1, "saved_at": "2024-01-01T00:00:00Z", "entries": []}"#,
        )?;
        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("unsupported collection format version 99"));
        Ok(())
    }
}
