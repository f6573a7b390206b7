//! In-memory collection store.
//!
//! [`CollectionStore`] owns every [`GameEntry`] and is the only place entries
//! are created, mutated or removed. All invariants are enforced here; callers
//! only ever see shared references or clones.

use std::collections::{btree_map::Entry, BTreeMap};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    error::{StoreError, StoreResult},
    models::{EntryId, GameEntry, GameStatus, Platform, Rating},
};

/// Input for [`CollectionStore::add_entry`].
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    /// Title of the game.
    pub title: String,
    /// Initial status, `Backlog` when unset.
    pub status: Option<GameStatus>,
    /// External catalog identifier.
    pub external_id: Option<String>,
    /// Platform the game is owned on.
    pub platform: Option<Platform>,
    /// Initial tags.
    pub tags: Vec<String>,
    /// Initial notes.
    pub notes: Option<String>,
}

impl NewEntry {
    /// Start a new entry with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the initial status.
    pub fn with_status(mut self, status: GameStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the external catalog identifier.
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Set the platform.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Append a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Owner of all tracked games, kept in insertion order.
#[derive(Debug, Clone)]
pub struct CollectionStore {
    entries: BTreeMap<EntryId, GameEntry>,
    next_id: u64,
}

impl Default for CollectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionStore {
    /// Create an empty store. The first id handed out is `1`.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild a store from previously persisted parts, checking invariants.
    pub(crate) fn from_parts(next_id: u64, entries: Vec<GameEntry>) -> StoreResult<Self> {
        let mut store = Self {
            entries: BTreeMap::new(),
            next_id,
        };
        for entry in entries {
            if entry.id.get() >= next_id {
                return Err(StoreError::validation(format!(
                    "entry id {} is not below the next id {next_id}",
                    entry.id
                )));
            }
            validate_title(&entry.title)?;
            if let Some(external_id) = entry.external_id.as_deref() {
                if store.find_by_external_id(external_id).is_some() {
                    return Err(StoreError::validation(format!(
                        "duplicate external id '{external_id}'"
                    )));
                }
            }
            let id = entry.id;
            if store.entries.insert(id, entry).is_some() {
                return Err(StoreError::validation(format!("duplicate entry id {id}")));
            }
        }
        Ok(store)
    }

    /// Id the next added entry will receive.
    pub(crate) fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Number of tracked games.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &GameEntry> + '_ {
        self.entries.values()
    }

    /// Add a game by title with default state.
    pub fn add(&mut self, title: &str) -> StoreResult<&GameEntry> {
        self.add_entry(NewEntry::new(title))
    }

    /// Add a game with optional extra fields.
    pub fn add_entry(&mut self, new: NewEntry) -> StoreResult<&GameEntry> {
        let title = validate_title(&new.title)?;
        let external_id = match new.external_id.as_deref() {
            Some(raw) => {
                let external_id = raw.trim();
                if external_id.is_empty() {
                    return Err(StoreError::validation("external id must not be empty"));
                }
                if self.find_by_external_id(external_id).is_some() {
                    return Err(StoreError::validation(format!(
                        "a game with external id '{external_id}' already exists"
                    )));
                }
                Some(external_id.to_string())
            }
            None => None,
        };
        for tag in &new.tags {
            validate_tag(tag)?;
        }

        let id = EntryId::new(self.next_id);
        let next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| StoreError::validation("id space exhausted"))?;

        let now = Utc::now();
        let mut entry = GameEntry::new(id, title, now);
        entry.external_id = external_id;
        entry.platform = new.platform;
        entry.notes = normalize_text(new.notes);
        for tag in &new.tags {
            entry.insert_tag(tag);
        }
        if let Some(status) = new.status {
            apply_status(&mut entry, status, now);
        }

        match self.entries.entry(id) {
            Entry::Vacant(slot) => {
                self.next_id = next_id;
                debug!(id = %id, title = %entry.title, "game added");
                Ok(slot.insert(entry))
            }
            Entry::Occupied(_) => Err(StoreError::validation(format!(
                "id {id} is already in use"
            ))),
        }
    }

    /// Look up a game by id.
    pub fn get(&self, id: EntryId) -> StoreResult<&GameEntry> {
        self.entries.get(&id).ok_or(StoreError::NotFound(id))
    }

    /// Look up a game by its external catalog id.
    pub fn find_by_external_id(&self, external_id: &str) -> Option<&GameEntry> {
        let needle = external_id.trim();
        self.entries
            .values()
            .find(|entry| entry.external_id.as_deref() == Some(needle))
    }

    /// Move a game to another status. Every transition is allowed.
    pub fn set_status(&mut self, id: EntryId, status: GameStatus) -> StoreResult<&GameEntry> {
        let entry = self.entry_mut(id)?;
        let previous = entry.status;
        let now = Utc::now();
        apply_status(entry, status, now);
        entry.updated_at = now;
        debug!(id = %id, from = %previous, to = %status, "status changed");
        Ok(entry)
    }

    /// Overwrite the recorded playtime. Negative values are rejected and
    /// leave the stored value untouched.
    pub fn set_playtime(&mut self, id: EntryId, minutes: i64) -> StoreResult<&GameEntry> {
        let entry = self.entry_mut(id)?;
        let minutes = u64::try_from(minutes).map_err(|_| {
            StoreError::validation(format!("playtime must not be negative, got {minutes}"))
        })?;
        entry.playtime_minutes = minutes;
        entry.updated_at = Utc::now();
        debug!(id = %id, minutes, "playtime set");
        Ok(entry)
    }

    /// Record an additional play session.
    pub fn add_playtime(&mut self, id: EntryId, minutes: u64) -> StoreResult<&GameEntry> {
        let entry = self.entry_mut(id)?;
        let now = Utc::now();
        entry.playtime_minutes = entry.playtime_minutes.saturating_add(minutes);
        entry.last_played = Some(now);
        entry.updated_at = now;
        debug!(id = %id, minutes, total = entry.playtime_minutes, "playtime recorded");
        Ok(entry)
    }

    /// Set or clear (`None`) the user rating.
    pub fn set_rating(&mut self, id: EntryId, rating: Option<i64>) -> StoreResult<&GameEntry> {
        let entry = self.entry_mut(id)?;
        let rating = rating.map(Rating::try_from).transpose()?;
        entry.rating = rating;
        entry.updated_at = Utc::now();
        debug!(id = %id, rating = ?rating.map(Rating::get), "rating set");
        Ok(entry)
    }

    /// Attach a tag. Returns `false` when an equal tag was already present.
    pub fn add_tag(&mut self, id: EntryId, tag: &str) -> StoreResult<bool> {
        let entry = self.entry_mut(id)?;
        validate_tag(tag)?;
        let changed = entry.insert_tag(tag);
        if changed {
            entry.updated_at = Utc::now();
        }
        Ok(changed)
    }

    /// Detach a tag. Returns `false` when the tag was not present.
    pub fn remove_tag(&mut self, id: EntryId, tag: &str) -> StoreResult<bool> {
        let entry = self.entry_mut(id)?;
        validate_tag(tag)?;
        let changed = entry.drop_tag(tag);
        if changed {
            entry.updated_at = Utc::now();
        }
        Ok(changed)
    }

    /// Replace the notes. Blank notes clear the field.
    pub fn set_notes(&mut self, id: EntryId, notes: Option<String>) -> StoreResult<&GameEntry> {
        let entry = self.entry_mut(id)?;
        entry.notes = normalize_text(notes);
        entry.updated_at = Utc::now();
        Ok(entry)
    }

    /// Replace the written review. Blank text clears the field.
    pub fn set_review(
        &mut self,
        id: EntryId,
        review: Option<String>,
    ) -> StoreResult<&GameEntry> {
        let entry = self.entry_mut(id)?;
        entry.review = normalize_text(review);
        entry.updated_at = Utc::now();
        Ok(entry)
    }

    /// Set or clear the platform.
    pub fn set_platform(
        &mut self,
        id: EntryId,
        platform: Option<Platform>,
    ) -> StoreResult<&GameEntry> {
        let entry = self.entry_mut(id)?;
        entry.platform = platform;
        entry.updated_at = Utc::now();
        Ok(entry)
    }

    /// Delete a game permanently. Its id is never handed out again.
    pub fn remove(&mut self, id: EntryId) -> StoreResult<GameEntry> {
        let entry = self.entries.remove(&id).ok_or(StoreError::NotFound(id))?;
        debug!(id = %id, title = %entry.title, "game removed");
        Ok(entry)
    }

    fn entry_mut(&mut self, id: EntryId) -> StoreResult<&mut GameEntry> {
        self.entries.get_mut(&id).ok_or(StoreError::NotFound(id))
    }
}

fn apply_status(entry: &mut GameEntry, status: GameStatus, now: DateTime<Utc>) {
    match status {
        GameStatus::Playing if entry.date_started.is_none() => entry.date_started = Some(now),
        GameStatus::Completed => entry.date_completed = Some(now),
        _ => {}
    }
    entry.status = status;
}

fn validate_title(title: &str) -> StoreResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StoreError::validation("title must not be empty"));
    }
    Ok(title.to_string())
}

fn validate_tag(tag: &str) -> StoreResult<()> {
    if tag.trim().is_empty() {
        return Err(StoreError::validation("tag must not be empty"));
    }
    Ok(())
}

fn normalize_text(notes: Option<String>) -> Option<String> {
    notes
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
