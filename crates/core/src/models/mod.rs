//! Shared domain models.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

mod status;

pub use status::GameStatus;

/// Conventional tag used to mark favourite games.
pub const FAVORITE_TAG: &str = "Favorite";

/// Lowest accepted user rating.
pub const RATING_MIN: u8 = 1;
/// Highest accepted user rating.
pub const RATING_MAX: u8 = 10;

/// Identifier of a tracked game, unique for the lifetime of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    /// Wrap a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| StoreError::validation(format!("'{s}' is not a valid game id")))
    }
}

/// User rating in the `1..=10` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Numeric value of the rating.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = StoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(RATING_MIN)..=i64::from(RATING_MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(StoreError::validation(format!(
                "rating {value} is outside {RATING_MIN}..={RATING_MAX}"
            )))
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, RATING_MAX)
    }
}

/// Platform a game is owned on.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "pc")]
    Pc,
    #[serde(rename = "playstation")]
    Playstation,
    #[serde(rename = "xbox")]
    Xbox,
    #[serde(rename = "nintendo ds")]
    NintendoDs,
    #[serde(rename = "nintendo 3ds")]
    Nintendo3ds,
    #[serde(rename = "nintendo switch")]
    NintendoSwitch,
    #[serde(rename = "nintendo switch 2")]
    NintendoSwitch2,
    #[serde(rename = "mobile")]
    Mobile,
    #[serde(rename = "other")]
    Other,
}

impl Platform {
    /// Every platform, in display order.
    pub const ALL: [Platform; 9] = [
        Platform::Pc,
        Platform::Playstation,
        Platform::Xbox,
        Platform::NintendoDs,
        Platform::Nintendo3ds,
        Platform::NintendoSwitch,
        Platform::NintendoSwitch2,
        Platform::Mobile,
        Platform::Other,
    ];

    /// Canonical lower-case label, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Pc => "pc",
            Platform::Playstation => "playstation",
            Platform::Xbox => "xbox",
            Platform::NintendoDs => "nintendo ds",
            Platform::Nintendo3ds => "nintendo 3ds",
            Platform::NintendoSwitch => "nintendo switch",
            Platform::NintendoSwitch2 => "nintendo switch 2",
            Platform::Mobile => "mobile",
            Platform::Other => "other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = StoreError;

    /// Accepts the canonical label with spaces, dashes or underscores
    /// (`"nintendo switch"`, `"nintendo-switch"`, `"Nintendo_Switch"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = compact_key(s);
        Platform::ALL
            .into_iter()
            .find(|platform| compact_key(platform.as_str()) == key)
            .ok_or_else(|| StoreError::validation(format!("unknown platform '{}'", s.trim())))
    }
}

pub(crate) fn compact_key(input: &str) -> String {
    input
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// One tracked game in the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEntry {
    /// Identifier assigned by the store.
    pub id: EntryId,
    /// Display title, never empty.
    pub title: String,
    /// External catalog identifier, unique when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Current lifecycle status.
    pub status: GameStatus,
    /// Total recorded playtime.
    #[serde(default)]
    pub playtime_minutes: u64,
    /// Optional user rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    /// Platform the game is played on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// Free-form labels, unique ignoring case.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Personal notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Written review, kept apart from the notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    /// When the entry was added.
    pub created_at: DateTime<Utc>,
    /// Last time any field changed.
    pub updated_at: DateTime<Utc>,
    /// First time the game moved to `Playing`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_started: Option<DateTime<Utc>>,
    /// Last time the game moved to `Completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_completed: Option<DateTime<Utc>>,
    /// Last time playtime was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played: Option<DateTime<Utc>>,
}

impl GameEntry {
    pub(crate) fn new(id: EntryId, title: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            external_id: None,
            status: GameStatus::Backlog,
            playtime_minutes: 0,
            rating: None,
            platform: None,
            tags: Vec::new(),
            notes: None,
            review: None,
            created_at: now,
            updated_at: now,
            date_started: None,
            date_completed: None,
            last_played: None,
        }
    }

    /// Playtime expressed in hours, rounded to two decimals.
    pub fn playtime_hours(&self) -> f64 {
        (self.playtime_minutes as f64 / 60.0 * 100.0).round() / 100.0
    }

    /// Case-insensitive tag lookup.
    pub fn has_tag(&self, name: &str) -> bool {
        let needle = name.trim().to_lowercase();
        self.tags.iter().any(|tag| tag.to_lowercase() == needle)
    }

    /// Whether the entry carries the favourite tag.
    pub fn is_favorite(&self) -> bool {
        self.has_tag(FAVORITE_TAG)
    }

    /// Add a tag unless an equal one (ignoring case) is present.
    pub(crate) fn insert_tag(&mut self, name: &str) -> bool {
        if self.has_tag(name) {
            return false;
        }
        self.tags.push(name.trim().to_string());
        true
    }

    /// Remove the first tag equal to `name` ignoring case.
    pub(crate) fn drop_tag(&mut self, name: &str) -> bool {
        let needle = name.trim().to_lowercase();
        match self.tags.iter().position(|tag| tag.to_lowercase() == needle) {
            Some(index) => {
                self.tags.remove(index);
                true
            }
            None => false,
        }
    }

    /// Title followed by the platform, if known.
    pub fn display_name(&self) -> String {
        match self.platform {
            Some(platform) => format!("{} · {}", self.title, platform),
            None => self.title.clone(),
        }
    }
}
