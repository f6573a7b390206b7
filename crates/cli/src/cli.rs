//! Command-line argument definitions.

use std::{fmt, path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand};
use hostcart_core::{playtime, EntryId, GameStatus, Platform, SortKey};

#[derive(Debug, Parser)]
#[command(name = "hostcart")]
#[command(about = "Track your video-game collection")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Collection file to use instead of the configured one.
    #[arg(long, short = 'f', global = true)]
    pub file: Option<PathBuf>,
    /// Print JSON instead of text.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Show or change the configuration.
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    #[command(flatten)]
    Games(GameCommand),
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum ConfigAction {
    /// Print the active configuration.
    Show,
    /// Change one field and write the config file.
    Set { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum GameCommand {
    /// Add a game to the collection.
    Add {
        #[arg(required = true)]
        title: Vec<String>,
        #[arg(long)]
        platform: Option<Platform>,
        /// Tag to attach, may be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        status: Option<GameStatus>,
        #[arg(long)]
        external_id: Option<String>,
    },
    /// Show one game by id or external id.
    #[command(alias = "get")]
    Show {
        #[arg(required_unless_present = "external_id", conflicts_with = "external_id")]
        id: Option<EntryId>,
        #[arg(long)]
        external_id: Option<String>,
    },
    /// List games, optionally filtered and sorted.
    #[command(alias = "ls")]
    List(ListArgs),
    /// Search titles, notes, tags and external ids.
    Search {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },
    /// Move a game to another status.
    Status { id: EntryId, status: GameStatus },
    /// Overwrite recorded playtime (90, 1h30m, 45m).
    Playtime {
        id: EntryId,
        #[arg(value_parser = playtime::parse_minutes, allow_hyphen_values = true)]
        minutes: i64,
    },
    /// Add a play session.
    Play {
        id: EntryId,
        #[arg(value_parser = session_minutes)]
        minutes: u64,
    },
    /// Rate a game from 1 to 10, or `clear` the rating.
    Rate {
        id: EntryId,
        #[arg(allow_hyphen_values = true)]
        rating: Clearable<i64>,
    },
    /// Attach a tag.
    Tag { id: EntryId, tag: String },
    /// Detach a tag.
    Untag { id: EntryId, tag: String },
    /// Replace the notes; no text clears them.
    Note {
        id: EntryId,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Replace the review; no text clears it.
    Review {
        id: EntryId,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Set a game's platform, or `clear` it.
    Platform {
        id: EntryId,
        platform: Clearable<Platform>,
    },
    /// Delete a game permanently.
    #[command(alias = "rm")]
    Remove { id: EntryId },
    /// Collection totals.
    Stats,
}

#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub status: Option<GameStatus>,
    #[arg(long)]
    pub tag: Option<String>,
    #[arg(long)]
    pub platform: Option<Platform>,
    #[arg(long)]
    pub sort: Option<SortKey>,
    #[arg(long = "desc", default_value_t = false)]
    pub descending: bool,
}

impl GameCommand {
    /// Whether the command changes the collection.
    pub fn mutates(&self) -> bool {
        !matches!(
            self,
            GameCommand::Show { .. }
                | GameCommand::List(_)
                | GameCommand::Search { .. }
                | GameCommand::Stats
        )
    }
}

/// Argument value that may also be `clear` or `none`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clearable<T>(pub Option<T>);

impl<T> FromStr for Clearable<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "clear" | "none" => Ok(Self(None)),
            raw => raw
                .parse::<T>()
                .map(|value| Self(Some(value)))
                .map_err(|err| err.to_string()),
        }
    }
}

fn session_minutes(raw: &str) -> Result<u64, String> {
    let minutes = playtime::parse_minutes(raw).map_err(|err| err.to_string())?;
    u64::try_from(minutes).map_err(|_| format!("a session must not be negative, got '{raw}'"))
}

/// Join free-text words; nothing left means "clear".
pub fn joined(words: Vec<String>) -> Option<String> {
    let text = words.join(" ");
    (!text.trim().is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use clap::CommandFactory;

    fn parse(line: &str) -> Result<Cli> {
        Ok(Cli::try_parse_from(
            std::iter::once("hostcart").chain(line.split_whitespace()),
        )?)
    }

    fn game(line: &str) -> Result<GameCommand> {
        match parse(line)?.command {
            Command::Games(command) => Ok(command),
            other => anyhow::bail!("expected a game command, got {other:?}"),
        }
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn empty_invocation_is_rejected_with_help() {
        assert!(parse("").is_err());
    }

    #[test]
    fn global_flags_after_the_command() -> Result<()> {
        let cli = parse("list --json --file /tmp/games.json --status playing")?;
        assert!(cli.json);
        assert_eq!(cli.file, Some(PathBuf::from("/tmp/games.json")));
        assert_eq!(
            cli.command,
            Command::Games(GameCommand::List(ListArgs {
                status: Some(GameStatus::Playing),
                ..ListArgs::default()
            }))
        );
        Ok(())
    }

    #[test]
    fn free_text_keeps_flag_like_words() -> Result<()> {
        let cli = parse("note 1 finish with -f gloves")?;
        assert_eq!(cli.file, None);
        assert_eq!(
            cli.command,
            Command::Games(GameCommand::Note {
                id: EntryId::new(1),
                text: ["finish", "with", "-f", "gloves"].map(String::from).to_vec(),
            })
        );

        let cli = parse("-f /tmp/c.json review 2 a --json worthy sequel")?;
        assert_eq!(cli.file, Some(PathBuf::from("/tmp/c.json")));
        assert!(!cli.json);
        match cli.command {
            Command::Games(GameCommand::Review { text, .. }) => {
                assert_eq!(joined(text).as_deref(), Some("a --json worthy sequel"));
            }
            other => panic!("unexpected command {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn add_with_options() -> Result<()> {
        let command = game(
            "add Chrono Trigger --platform nintendo-switch --tag JRPG --tag Classic --status wishlist",
        )?;
        assert_eq!(
            command,
            GameCommand::Add {
                title: vec!["Chrono".to_string(), "Trigger".to_string()],
                platform: Some(Platform::NintendoSwitch),
                tags: vec!["JRPG".to_string(), "Classic".to_string()],
                status: Some(GameStatus::Wishlist),
                external_id: None,
            }
        );
        assert!(command.mutates());
        Ok(())
    }

    #[test]
    fn add_requires_title() {
        assert!(parse("add").is_err());
        assert!(parse("add --tag rpg").is_err());
    }

    #[test]
    fn status_values_are_validated() -> Result<()> {
        assert_eq!(
            game("status 3 completed")?,
            GameCommand::Status {
                id: EntryId::new(3),
                status: GameStatus::Completed,
            }
        );
        let err = parse("status 3 finished").unwrap_err();
        assert!(err.to_string().contains("unknown status"));
        Ok(())
    }

    #[test]
    fn durations_and_ratings() -> Result<()> {
        assert_eq!(
            game("playtime 1 1h30m")?,
            GameCommand::Playtime {
                id: EntryId::new(1),
                minutes: 90,
            }
        );
        assert_eq!(
            game("playtime 1 -5")?,
            GameCommand::Playtime {
                id: EntryId::new(1),
                minutes: -5,
            }
        );
        assert!(parse("play 1 -5").is_err());
        assert_eq!(
            game("play 1 45m")?,
            GameCommand::Play {
                id: EntryId::new(1),
                minutes: 45,
            }
        );
        assert_eq!(
            game("rate 2 clear")?,
            GameCommand::Rate {
                id: EntryId::new(2),
                rating: Clearable(None),
            }
        );
        assert_eq!(
            game("rate 2 9")?,
            GameCommand::Rate {
                id: EntryId::new(2),
                rating: Clearable(Some(9)),
            }
        );
        assert!(parse("rate 2 great").is_err());
        Ok(())
    }

    #[test]
    fn list_options() -> Result<()> {
        assert_eq!(
            game("ls --sort rating --desc --tag favorite")?,
            GameCommand::List(ListArgs {
                tag: Some("favorite".to_string()),
                sort: Some(SortKey::Rating),
                descending: true,
                ..ListArgs::default()
            })
        );
        assert!(parse("list --colour red").is_err());
        assert!(parse("list extra").is_err());
        assert!(!game("list")?.mutates());
        Ok(())
    }

    #[test]
    fn show_by_id_or_external_id() -> Result<()> {
        assert_eq!(
            game("show --external-id igdb-1")?,
            GameCommand::Show {
                id: None,
                external_id: Some("igdb-1".to_string()),
            }
        );
        assert!(parse("show").is_err());
        assert!(parse("show 1 --external-id igdb-1").is_err());
        Ok(())
    }

    #[test]
    fn ids_must_be_numeric() {
        assert!(parse("show abc").is_err());
        assert!(parse("remove").is_err());
        assert!(parse("remove 1 2").is_err());
    }

    #[test]
    fn config_actions() -> Result<()> {
        assert_eq!(parse("config")?.command, Command::Config { action: None });
        assert_eq!(
            parse("config set autosave false")?.command,
            Command::Config {
                action: Some(ConfigAction::Set {
                    key: "autosave".to_string(),
                    value: "false".to_string(),
                }),
            }
        );
        assert!(parse("config drop").is_err());
        Ok(())
    }

    #[test]
    fn unknown_command() {
        assert!(parse("launch 1").is_err());
    }

    #[test]
    fn joined_text() {
        assert_eq!(joined(Vec::new()), None);
        assert_eq!(joined(vec!["  ".to_string()]), None);
        assert_eq!(
            joined(vec!["beat".to_string(), "it".to_string()]).as_deref(),
            Some("beat it")
        );
    }
}
