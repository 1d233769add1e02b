// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::cmp::Ordering;
use std::env::current_dir;
use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use walkdir::WalkDir;

use crate::config::Config;
use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::parser::dedup_cards;
use crate::parser::parse_csv;
use crate::parser::parse_deck_file;
use crate::storage::Storage;
use crate::types::card::Card;

pub const LEVEL_INDEX_FILE: &str = "vocab.csv";

/// Cache key and last-level value for runs not tied to a single level file.
pub const CUSTOM_LEVEL: &str = "custom";

/// A deck file the user can pick.
#[derive(Clone, PartialEq, Debug)]
pub struct Level {
    /// The file stem, used as the cache key.
    pub label: String,
    pub display_name: String,
    pub description: Option<String>,
    pub path: PathBuf,
}

pub struct Collection {
    pub directory: PathBuf,
    pub config: Config,
    pub storage: Storage,
}

impl Collection {
    pub fn new(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        let directory = if directory.exists() {
            directory.canonicalize()?
        } else {
            return fail("directory does not exist.");
        };

        let config = Config::load(&directory)?;

        let db_path: PathBuf = directory.join(&config.storage.database);
        let db_path: &str = db_path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?;
        let db: Database = Database::new(db_path)?;

        Ok(Self {
            directory,
            config,
            storage: Storage::new(db),
        })
    }

    pub fn deck_directory(&self) -> PathBuf {
        self.directory.join(&self.config.decks.directory)
    }

    /// Every level in the deck directory, sorted by display name with
    /// numbers compared by value.
    pub fn levels(&self) -> Fallible<Vec<Level>> {
        let deck_directory = self.deck_directory();
        if !deck_directory.exists() {
            log::warn!("Deck directory {} does not exist.", deck_directory.display());
            return Ok(Vec::new());
        }
        let index_path = deck_directory.join(LEVEL_INDEX_FILE);
        let mut levels = if index_path.exists() {
            read_level_index(&deck_directory)?
        } else {
            walk_levels(&deck_directory)?
        };
        levels.sort_by(|a, b| natural_cmp(&a.display_name, &b.display_name));
        Ok(levels)
    }

    /// Find a level by label or display name, ignoring case.
    pub fn find_level(&self, name: &str) -> Fallible<Option<Level>> {
        Ok(self.levels()?.into_iter().find(|level| {
            level.label.eq_ignore_ascii_case(name) || level.display_name.eq_ignore_ascii_case(name)
        }))
    }

    /// The level to drill when none is given: the last one played, else
    /// the configured default.
    pub fn preferred_level(&self) -> Fallible<String> {
        Ok(self
            .storage
            .load_last_level()?
            .unwrap_or_else(|| self.config.decks.default_level.clone()))
    }

    /// Load a level's cards. A fresh parse is cached; if the file is missing,
    /// unreadable or empty, the cached copy is used instead.
    pub fn load_level(&self, label: &str) -> Fallible<Vec<Card>> {
        let start = Instant::now();
        match self.read_level(label) {
            Ok(cards) if !cards.is_empty() => {
                let duration = start.elapsed().as_millis();
                log::debug!("Level {label} loaded in {duration}ms.");
                if let Err(e) = self.storage.save_deck(&cards, label) {
                    log::error!("Failed to cache level {label}: {e}");
                }
                if let Err(e) = self.storage.save_last_level(label) {
                    log::error!("Failed to record last level: {e}");
                }
                return Ok(cards);
            }
            Ok(_) => log::warn!("Level {label} has no valid cards."),
            Err(e) => log::warn!("Failed to read level {label}: {e}"),
        }
        match self.storage.load_deck(label)? {
            Some(cards) if !cards.is_empty() => {
                log::warn!("Using cached deck for level {label}.");
                Ok(cards)
            }
            _ => fail(format!("no cards available for level {label}")),
        }
    }

    /// Load several levels into one deck. Cards keep the order of the labels
    /// given; a card present in more than one level keeps its first
    /// occurrence.
    pub fn load_levels(&self, labels: &[String]) -> Fallible<Vec<Card>> {
        match labels {
            [] => return fail("no levels given."),
            [label] => return self.load_level(label),
            _ => {}
        }
        let mut cards = Vec::new();
        for label in labels {
            cards.extend(self.load_level(label)?);
        }
        let cards = dedup_cards(cards);
        log::debug!("Combined {} levels into {} cards.", labels.len(), cards.len());
        self.remember_custom(&cards);
        Ok(cards)
    }

    /// Load a CSV file outside the deck directory. A file without valid
    /// cards is an error.
    pub fn load_file(&self, path: &Path) -> Fallible<Vec<Card>> {
        if !path.is_file() {
            return fail(format!("no such file {}", path.display()));
        }
        let cards = parse_deck_file(path)?;
        if cards.is_empty() {
            return fail(format!("no valid cards in {}", path.display()));
        }
        self.remember_custom(&cards);
        Ok(cards)
    }

    /// The label a run over `labels` is shown under: the level's display
    /// name for one level, else the labels joined.
    pub fn run_name(&self, labels: &[String]) -> Fallible<String> {
        let mut names = Vec::new();
        for label in labels {
            let name = match self.find_level(label)? {
                Some(level) => level.display_name,
                None => label.clone(),
            };
            names.push(name);
        }
        Ok(names.join(" + "))
    }

    fn remember_custom(&self, cards: &[Card]) {
        if let Err(e) = self.storage.save_deck(cards, CUSTOM_LEVEL) {
            log::error!("Failed to cache custom deck: {e}");
        }
        if let Err(e) = self.storage.save_last_level(CUSTOM_LEVEL) {
            log::error!("Failed to record last level: {e}");
        }
    }

    fn read_level(&self, label: &str) -> Fallible<Vec<Card>> {
        let Some(level) = self.find_level(label)? else {
            return fail(format!("unknown level {label}"));
        };
        parse_deck_file(&level.path)
    }
}

/// Read `vocab.csv`: `filename, displayName, description` per row, after a
/// header. Rows with fewer than two fields are ignored.
fn read_level_index(deck_directory: &Path) -> Fallible<Vec<Level>> {
    let text = read_to_string(deck_directory.join(LEVEL_INDEX_FILE))?;
    let rows = parse_csv(&text);
    let mut levels = Vec::new();
    for row in rows.iter().skip(1) {
        if row.len() < 2 {
            continue;
        }
        let filename = row[0].trim();
        let display_name = row[1].trim();
        if filename.is_empty() || display_name.is_empty() {
            continue;
        }
        let path = deck_directory.join(filename);
        let label = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename)
            .to_string();
        let description = row
            .get(2)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        levels.push(Level {
            label,
            display_name: display_name.to_string(),
            description,
            path,
        });
    }
    log::debug!("Found {} levels in {LEVEL_INDEX_FILE}.", levels.len());
    Ok(levels)
}

/// Every `*.csv` file under the deck directory is a level named by its stem.
fn walk_levels(deck_directory: &Path) -> Fallible<Vec<Level>> {
    let mut levels = Vec::new();
    for entry in WalkDir::new(deck_directory) {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !path.extension().is_some_and(|ext| ext == "csv") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        levels.push(Level {
            label: stem.to_string(),
            display_name: stem.to_string(),
            description: None,
            path: path.to_path_buf(),
        });
    }
    Ok(levels)
}

/// Compare strings so that runs of digits order by value: `hsk2` sorts
/// before `hsk10`. Other characters compare case-insensitively.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();
    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let x = take_number(&mut a);
                let y = take_number(&mut b);
                let ordering = x.len().cmp(&y.len()).then_with(|| x.cmp(&y));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                let ordering = x.to_lowercase().cmp(y.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                a.next();
                b.next();
            }
        }
    }
}

/// Consume a run of digits, without leading zeros.
fn take_number(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
