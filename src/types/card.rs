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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::hash::Hasher;

/// A card's identity. Cards built from a deck use the FNV-1a hash of their
/// content, but imported sessions may carry arbitrary strings.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    #[cfg(test)]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub hanzi: String,
    pub pinyin: String,
    pub english: String,
}

impl Card {
    /// Build a card whose id is derived from its content. The fields are
    /// expected to be normalized already.
    pub fn new(
        hanzi: impl Into<String>,
        pinyin: impl Into<String>,
        english: impl Into<String>,
    ) -> Self {
        let hanzi = hanzi.into();
        let pinyin = pinyin.into();
        let english = english.into();
        let id = content_id(&hanzi, &pinyin, &english);
        Self {
            id,
            hanzi,
            pinyin,
            english,
        }
    }
}

/// The hash of `hanzi|pinyin|english`.
pub fn content_id(hanzi: &str, pinyin: &str, english: &str) -> CardId {
    let mut hasher = Hasher::new();
    hasher.update(hanzi.as_bytes());
    hasher.update(b"|");
    hasher.update(pinyin.as_bytes());
    hasher.update(b"|");
    hasher.update(english.as_bytes());
    CardId(hasher.finalize_hex())
}
