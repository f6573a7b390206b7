use std::{io::Write, path::PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use hostcart_core::{
    playtime::format_minutes, AppConfig, Collection, CollectionSummary, GameEntry, GameStatus,
    ListQuery, NewEntry,
};
use serde::Serialize;
use tracing::info;

use crate::cli::{joined, Cli, Command, ConfigAction, GameCommand, ListArgs};

/// Executes a parsed command against the configured collection.
pub struct HostCartApp {
    config: AppConfig,
    config_path: PathBuf,
}

impl HostCartApp {
    pub fn new(config: AppConfig, config_path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            config_path: config_path.into(),
        }
    }

    pub fn run(&mut self, cli: Cli, out: &mut dyn Write) -> Result<()> {
        match cli.command {
            Command::Config { action } => {
                self.configure(action.unwrap_or(ConfigAction::Show), out)
            }
            Command::Games(command) => {
                let path = cli.file.unwrap_or_else(|| self.config.collection_path());
                let collection = Collection::open(&path, self.config.autosave)?;
                let mutates = command.mutates();
                self.dispatch(&collection, command, cli.json, out)?;
                if mutates && !self.config.autosave {
                    collection
                        .save()
                        .with_context(|| format!("failed to save {}", path.display()))?;
                }
                Ok(())
            }
        }
    }

    fn configure(&mut self, action: ConfigAction, out: &mut dyn Write) -> Result<()> {
        match action {
            ConfigAction::Show => self.show_config(out),
            ConfigAction::Set { key, value } => {
                self.config.set_field(&key, &value)?;
                self.config.save_to(&self.config_path)?;
                info!(key = %key, path = %self.config_path.display(), "configuration updated");
                writeln!(out, "{key} updated")?;
                Ok(())
            }
        }
    }

    fn dispatch(
        &self,
        collection: &Collection,
        command: GameCommand,
        json: bool,
        out: &mut dyn Write,
    ) -> Result<()> {
        match command {
            GameCommand::Add {
                title,
                platform,
                tags,
                status,
                external_id,
            } => {
                let mut new = NewEntry::new(title.join(" "));
                new.platform = platform;
                new.tags = tags;
                new.status = status;
                new.external_id = external_id;
                let entry = collection.add_entry(new)?;
                emit_entry(out, json, &entry, "added")?;
            }
            GameCommand::Show { id, external_id } => {
                let entry = match (id, external_id) {
                    (Some(id), _) => collection.get(id)?,
                    (None, Some(external_id)) => collection
                        .find_by_external_id(&external_id)
                        .ok_or_else(|| anyhow!("no game with external id '{external_id}'"))?,
                    (None, None) => bail!("show expects an id or --external-id"),
                };
                if json {
                    write_json(out, &entry)?;
                } else {
                    write_details(out, &entry)?;
                }
            }
            GameCommand::List(ListArgs {
                status,
                tag,
                platform,
                sort,
                descending,
            }) => {
                let query = ListQuery {
                    status,
                    tag,
                    platform,
                    sort: sort.or(self.config.default_sort),
                    descending,
                };
                emit_entries(out, json, &collection.list(&query))?;
            }
            GameCommand::Search { query } => {
                emit_entries(out, json, &collection.search(&query.join(" ")))?;
            }
            GameCommand::Status { id, status } => {
                let entry = collection.set_status(id, status)?;
                emit_entry(out, json, &entry, "status updated")?;
            }
            GameCommand::Playtime { id, minutes } => {
                let entry = collection.set_playtime(id, minutes)?;
                emit_entry(out, json, &entry, "playtime set")?;
            }
            GameCommand::Play { id, minutes } => {
                let entry = collection.add_playtime(id, minutes)?;
                emit_entry(out, json, &entry, "session recorded")?;
            }
            GameCommand::Rate { id, rating } => {
                let entry = collection.set_rating(id, rating.0)?;
                emit_entry(out, json, &entry, "rating updated")?;
            }
            GameCommand::Tag { id, tag } => {
                let changed = collection.add_tag(id, &tag)?;
                let entry = collection.get(id)?;
                let note = if changed { "tagged" } else { "already tagged" };
                emit_entry(out, json, &entry, note)?;
            }
            GameCommand::Untag { id, tag } => {
                let changed = collection.remove_tag(id, &tag)?;
                let entry = collection.get(id)?;
                let note = if changed { "untagged" } else { "tag not present" };
                emit_entry(out, json, &entry, note)?;
            }
            GameCommand::Note { id, text } => {
                let entry = collection.set_notes(id, joined(text))?;
                emit_entry(out, json, &entry, "notes updated")?;
            }
            GameCommand::Review { id, text } => {
                let entry = collection.set_review(id, joined(text))?;
                emit_entry(out, json, &entry, "review updated")?;
            }
            GameCommand::Platform { id, platform } => {
                let entry = collection.set_platform(id, platform.0)?;
                emit_entry(out, json, &entry, "platform updated")?;
            }
            GameCommand::Remove { id } => {
                let entry = collection.remove(id)?;
                emit_entry(out, json, &entry, "removed")?;
            }
            GameCommand::Stats => {
                let summary = collection.summary();
                if json {
                    write_json(out, &summary)?;
                } else {
                    write_summary(out, &summary)?;
                }
            }
        }
        Ok(())
    }

    fn show_config(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "# {}", self.config_path.display())?;
        write_json(out, &self.config)
    }
}

fn emit_entry(out: &mut dyn Write, json: bool, entry: &GameEntry, action: &str) -> Result<()> {
    if json {
        write_json(out, entry)
    } else {
        writeln!(out, "{action}: {}", entry_line(entry))?;
        Ok(())
    }
}

fn emit_entries(out: &mut dyn Write, json: bool, entries: &[GameEntry]) -> Result<()> {
    if json {
        return write_json(out, &entries);
    }
    if entries.is_empty() {
        writeln!(out, "no games")?;
    }
    for entry in entries {
        writeln!(out, "{}", entry_line(entry))?;
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to encode output")?;
    writeln!(out)?;
    Ok(())
}

fn entry_line(entry: &GameEntry) -> String {
    let rating = entry
        .rating
        .map(|rating| rating.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<5} {:<10} {:>8} {:>5}  {}",
        format!("#{}", entry.id),
        entry.status.as_str(),
        format_minutes(entry.playtime_minutes),
        rating,
        entry.display_name()
    )
}

fn write_details(out: &mut dyn Write, entry: &GameEntry) -> Result<()> {
    writeln!(out, "#{} {}", entry.id, entry.title)?;
    writeln!(out, "  status:    {}", entry.status)?;
    writeln!(
        out,
        "  playtime:  {} ({:.2} h)",
        format_minutes(entry.playtime_minutes),
        entry.playtime_hours()
    )?;
    if let Some(rating) = entry.rating {
        writeln!(out, "  rating:    {rating}")?;
    }
    if let Some(platform) = entry.platform {
        writeln!(out, "  platform:  {platform}")?;
    }
    if !entry.tags.is_empty() {
        writeln!(out, "  tags:      {}", entry.tags.join(", "))?;
    }
    if let Some(external_id) = entry.external_id.as_deref() {
        writeln!(out, "  external:  {external_id}")?;
    }
    writeln!(out, "  added:     {}", format_date(entry.created_at))?;
    writeln!(out, "  updated:   {}", format_date(entry.updated_at))?;
    for (label, date) in [
        ("started", entry.date_started),
        ("completed", entry.date_completed),
        ("played", entry.last_played),
    ] {
        if let Some(date) = date {
            writeln!(out, "  {:<10} {}", format!("{label}:"), format_date(date))?;
        }
    }
    if let Some(notes) = entry.notes.as_deref() {
        writeln!(out, "  notes:     {notes}")?;
    }
    if let Some(review) = entry.review.as_deref() {
        writeln!(out, "  review:    {review}")?;
    }
    Ok(())
}

fn write_summary(out: &mut dyn Write, summary: &CollectionSummary) -> Result<()> {
    writeln!(out, "games:     {}", summary.total)?;
    for status in GameStatus::ALL {
        let count = summary.by_status.get(&status).copied().unwrap_or(0);
        writeln!(out, "  {:<10} {count}", status.as_str())?;
    }
    writeln!(
        out,
        "playtime:  {}",
        format_minutes(summary.total_playtime_minutes)
    )?;
    match summary.average_rating {
        Some(average) => writeln!(out, "rating:    {average:.1} avg")?,
        None => writeln!(out, "rating:    -")?,
    }
    Ok(())
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;
    use tempfile::tempdir;

    fn test_app(dir: &Path, autosave: bool) -> HostCartApp {
        let config = AppConfig {
            data_dir: dir.to_path_buf(),
            collection_file: "collection.json".to_string(),
            autosave,
            default_sort: None,
            log_dir: dir.join("logs"),
        };
        HostCartApp::new(config, dir.join("config.json"))
    }

    fn run(app: &mut HostCartApp, line: &str) -> Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("hostcart").chain(line.split_whitespace()))?;
        let mut out = Vec::new();
        app.run(cli, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn chrono_trigger_session() -> Result<()> {
        let dir = tempdir()?;
        let mut app = test_app(dir.path(), true);

        let added = run(&mut app, "add Chrono Trigger --platform pc")?;
        assert!(added.starts_with("added: #1"));
        assert!(added.contains("backlog"));

        run(&mut app, "status 1 playing")?;
        run(&mut app, "playtime 1 2h")?;
        run(&mut app, "rate 1 9")?;

        let shown: GameEntry = serde_json::from_str(&run(&mut app, "--json show 1")?)?;
        assert_eq!(shown.title, "Chrono Trigger");
        assert_eq!(shown.status, GameStatus::Playing);
        assert_eq!(shown.playtime_minutes, 120);
        assert_eq!(shown.rating.map(|r| r.get()), Some(9));

        run(&mut app, "remove 1")?;
        let err = run(&mut app, "show 1").unwrap_err();
        assert!(err.to_string().contains("no game with id 1"));
        Ok(())
    }

    #[test]
    fn changes_persist_without_autosave() -> Result<()> {
        let dir = tempdir()?;
        let mut app = test_app(dir.path(), false);
        run(&mut app, "add Celeste --tag platformer")?;
        run(&mut app, "play 1 45m")?;

        let listed: Vec<GameEntry> = serde_json::from_str(&run(&mut app, "--json list")?)?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].playtime_minutes, 45);
        assert!(listed[0].last_played.is_some());
        Ok(())
    }

    #[test]
    fn validation_errors_surface() -> Result<()> {
        let dir = tempdir()?;
        let mut app = test_app(dir.path(), true);
        run(&mut app, "add Hades")?;

        let err = run(&mut app, "rate 1 11").unwrap_err();
        assert!(err.to_string().contains("outside 1..=10"));
        let err = run(&mut app, "playtime 1 -30").unwrap_err();
        assert!(err.to_string().contains("must not be negative"));
        let err = run(&mut app, "status 9 dropped").unwrap_err();
        assert!(err.to_string().contains("no game with id 9"));
        Ok(())
    }

    #[test]
    fn list_filters_and_stats() -> Result<()> {
        let dir = tempdir()?;
        let mut app = test_app(dir.path(), true);
        run(&mut app, "add Doom")?;
        run(&mut app, "add Celeste")?;
        run(&mut app, "status 2 completed")?;

        let completed = run(&mut app, "list --status completed")?;
        assert!(completed.contains("Celeste"));
        assert!(!completed.contains("Doom"));
        assert_eq!(run(&mut app, "list --status dropped")?, "no games\n");

        let stats = run(&mut app, "stats")?;
        assert!(stats.starts_with("games:     2"));
        Ok(())
    }

    #[test]
    fn review_and_external_id_lookup() -> Result<()> {
        let dir = tempdir()?;
        let mut app = test_app(dir.path(), true);
        run(&mut app, "add Hades --external-id igdb-113112")?;
        run(&mut app, "note 1 try the -f weapon next")?;
        run(&mut app, "review 1 Tight combat, great writing")?;

        let shown = run(&mut app, "show --external-id igdb-113112")?;
        assert!(shown.starts_with("#1 Hades"));
        assert!(shown.contains("notes:     try the -f weapon next"));
        assert!(shown.contains("review:    Tight combat, great writing"));

        run(&mut app, "review 1")?;
        let shown: GameEntry = serde_json::from_str(&run(&mut app, "show 1 --json")?)?;
        assert_eq!(shown.review, None);
        assert!(run(&mut app, "show --external-id igdb-1").is_err());
        Ok(())
    }

    #[test]
    fn config_set_writes_file() -> Result<()> {
        let dir = tempdir()?;
        let mut app = test_app(dir.path(), true);
        run(&mut app, "config set default_sort title")?;

        let saved = AppConfig::load_from(dir.path().join("config.json"))?;
        assert_eq!(saved.default_sort, Some(hostcart_core::SortKey::Title));
        assert!(run(&mut app, "config set port 80").is_err());
        Ok(())
    }
}
