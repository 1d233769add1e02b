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

use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::session::DEFAULT_LOCALE;

pub const CONFIG_FILE: &str = "hskflash.toml";

/// Collection-level configuration, read from `hskflash.toml`.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub decks: DecksConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct DecksConfig {
    /// Deck directory, relative to the collection.
    #[serde(default = "default_deck_directory")]
    pub directory: String,
    #[serde(default = "default_level")]
    pub default_level: String,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file, relative to the collection.
    #[serde(default = "default_database")]
    pub database: String,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_deck_directory() -> String {
    "data".to_string()
}

fn default_level() -> String {
    "hsk1".to_string()
}

fn default_database() -> String {
    "hskflash.db".to_string()
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

impl Default for DecksConfig {
    fn default() -> Self {
        Self {
            directory: default_deck_directory(),
            default_level: default_level(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
        }
    }
}

impl Config {
    /// Load the configuration in `directory`. A missing file yields the
    /// defaults; a malformed one is an error.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No {CONFIG_FILE}; using defaults.");
            return Ok(Self::default());
        }
        let text = read_to_string(&path)?;
        toml::from_str(&text)
            .map_err(|e| ErrorReport::new(format!("invalid {}: {e}", path.display())))
    }
}
