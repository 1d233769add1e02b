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

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;

use crate::types::card::CardId;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    Reveal,
    Unreveal,
    Mistake,
    Unmistake,
    Next,
    Annotation,
    Remove,
    Finish,
}

/// An entry in a session's event log. `index` is the position in the run's
/// display order at which the event happened.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub at: Timestamp,
    #[serde(default, deserialize_with = "non_negative_index")]
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<CardId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Event {
    pub fn new(kind: EventKind, index: usize) -> Self {
        Self {
            kind,
            at: Timestamp::now(),
            index,
            card_id: None,
            note: None,
        }
    }

    pub fn with_card(mut self, card_id: CardId) -> Self {
        self.card_id = Some(card_id);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Deserialize an event log one entry at a time. Entries that do not parse,
/// such as unknown kinds, are dropped so the rest of the record survives.
pub fn lenient_events<'de, D>(deserializer: D) -> Result<Vec<Event>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    let total = values.len();
    let events: Vec<Event> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    if events.len() < total {
        log::warn!("Dropped {} unreadable events.", total - events.len());
    }
    Ok(events)
}

/// Some stored logs record `-1` for events on an emptied deck.
fn non_negative_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let index = i64::deserialize(deserializer)?;
    Ok(usize::try_from(index).unwrap_or(0))
}
