//! Listing, searching and summarising the collection.

use std::{cmp::Ordering, collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::StoreError,
    models::{compact_key, GameEntry, GameStatus, Platform},
    store::CollectionStore,
};

/// Field used to order a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Title, ignoring case.
    Title,
    /// Date added.
    Added,
    /// Last modification.
    Updated,
    /// Recorded playtime.
    Playtime,
    /// User rating; unrated entries sort first.
    Rating,
}

impl SortKey {
    /// Every sort key.
    pub const ALL: [SortKey; 5] = [
        SortKey::Title,
        SortKey::Added,
        SortKey::Updated,
        SortKey::Playtime,
        SortKey::Rating,
    ];

    /// Lower-case label.
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Title => "title",
            SortKey::Added => "added",
            SortKey::Updated => "updated",
            SortKey::Playtime => "playtime",
            SortKey::Rating => "rating",
        }
    }

    fn compare(self, a: &GameEntry, b: &GameEntry) -> Ordering {
        match self {
            SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortKey::Added => a.created_at.cmp(&b.created_at),
            SortKey::Updated => a.updated_at.cmp(&b.updated_at),
            SortKey::Playtime => a.playtime_minutes.cmp(&b.playtime_minutes),
            SortKey::Rating => a.rating.cmp(&b.rating),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = compact_key(s);
        match key.as_str() {
            "title" | "name" => Ok(SortKey::Title),
            "added" | "dateadded" | "created" => Ok(SortKey::Added),
            "updated" => Ok(SortKey::Updated),
            "playtime" => Ok(SortKey::Playtime),
            "rating" => Ok(SortKey::Rating),
            _ => Err(StoreError::validation(format!(
                "unknown sort key '{}', expected one of: title, added, updated, playtime, rating",
                s.trim()
            ))),
        }
    }
}

/// Filter and ordering options for [`CollectionStore::list`].
///
/// The default query returns every entry in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Only entries with this status.
    pub status: Option<GameStatus>,
    /// Only entries carrying this tag (case-insensitive).
    pub tag: Option<String>,
    /// Only entries on this platform.
    pub platform: Option<Platform>,
    /// Ordering; insertion order when unset.
    pub sort: Option<SortKey>,
    /// Reverse the ordering.
    pub descending: bool,
}

impl ListQuery {
    /// Query matching everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a status.
    pub fn status(mut self, status: GameStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Restrict to a platform.
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Order by `key`.
    pub fn sort_by(mut self, key: SortKey) -> Self {
        self.sort = Some(key);
        self
    }

    /// Reverse the ordering.
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    fn matches(&self, entry: &GameEntry) -> bool {
        self.status.map_or(true, |status| entry.status == status)
            && self.platform.map_or(true, |platform| entry.platform == Some(platform))
            && self.tag.as_deref().map_or(true, |tag| entry.has_tag(tag))
    }
}

/// Aggregate numbers over the whole collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    /// Number of tracked games.
    pub total: usize,
    /// Number of games per status; every status is present.
    pub by_status: BTreeMap<GameStatus, usize>,
    /// Sum of recorded playtime.
    pub total_playtime_minutes: u64,
    /// Mean over rated games, `None` when nothing is rated.
    pub average_rating: Option<f64>,
}

impl CollectionStore {
    /// Entries matching `query`, in insertion order unless a sort key is set.
    /// Sorting is stable, so ties keep insertion order.
    pub fn list(&self, query: &ListQuery) -> Vec<&GameEntry> {
        let mut entries: Vec<&GameEntry> = self.iter().filter(|entry| query.matches(entry)).collect();
        match (query.sort, query.descending) {
            (Some(key), false) => entries.sort_by(|a, b| key.compare(a, b)),
            (Some(key), true) => entries.sort_by(|a, b| key.compare(b, a)),
            (None, true) => entries.reverse(),
            (None, false) => {}
        }
        entries
    }

    /// Case-insensitive substring search over title, notes, tags and
    /// external id. A blank query returns everything.
    pub fn search(&self, query: &str) -> Vec<&GameEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.iter().collect();
        }

        self.iter()
            .filter(|entry| {
                entry.title.to_lowercase().contains(&needle)
                    || entry
                        .notes
                        .as_ref()
                        .map(|value| value.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                    || entry
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&needle))
                    || entry
                        .external_id
                        .as_ref()
                        .map(|value| value.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            })
            .collect()
    }

    /// Count and playtime totals.
    pub fn summary(&self) -> CollectionSummary {
        let mut by_status: BTreeMap<GameStatus, usize> =
            GameStatus::ALL.into_iter().map(|status| (status, 0)).collect();
        let mut total_playtime_minutes = 0u64;
        let mut rating_sum = 0u64;
        let mut rated = 0u64;

        for entry in self.iter() {
            *by_status.entry(entry.status).or_default() += 1;
            total_playtime_minutes = total_playtime_minutes.saturating_add(entry.playtime_minutes);
            if let Some(rating) = entry.rating {
                rating_sum += u64::from(rating.get());
                rated += 1;
            }
        }

        CollectionSummary {
            total: self.len(),
            by_status,
            total_playtime_minutes,
            average_rating: (rated > 0).then(|| rating_sum as f64 / rated as f64),
        }
    }
}
