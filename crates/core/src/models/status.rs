use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Lifecycle status of a tracked game. Any status may follow any other.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Owned but not started.
    #[default]
    Backlog,
    /// Currently being played.
    Playing,
    /// Finished.
    Completed,
    /// Abandoned.
    Dropped,
    /// Not owned yet.
    Wishlist,
}

impl GameStatus {
    /// Every status, in display order.
    pub const ALL: [GameStatus; 5] = [
        GameStatus::Backlog,
        GameStatus::Playing,
        GameStatus::Completed,
        GameStatus::Dropped,
        GameStatus::Wishlist,
    ];

    /// Lower-case label, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Backlog => "backlog",
            GameStatus::Playing => "playing",
            GameStatus::Completed => "completed",
            GameStatus::Dropped => "dropped",
            GameStatus::Wishlist => "wishlist",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        GameStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| {
                StoreError::validation(format!(
                    "unknown status '{needle}', expected one of: backlog, playing, completed, dropped, wishlist"
                ))
            })
    }
}
