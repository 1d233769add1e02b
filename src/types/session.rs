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

use crate::types::card::Card;
use crate::types::card::CardId;
use crate::types::event::Event;
use crate::types::event::EventKind;
use crate::types::event::lenient_events;
use crate::types::timestamp::Timestamp;

pub const DEFAULT_LOCALE: &str = "zh-CN";

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Counts {
    pub total: usize,
    pub mistakes: usize,
    #[serde(default)]
    pub removed: usize,
}

/// A note attached to a card during a run. A session holds at most one per
/// card.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub card_id: CardId,
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<Timestamp>,
}

/// The lightweight index entry for a session.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    pub started_at: Timestamp,
    #[serde(default)]
    pub finished_at: Option<Timestamp>,
    #[serde(default)]
    pub mistake_ids: Vec<CardId>,
    #[serde(default)]
    pub counts: Counts,
    #[serde(default)]
    pub in_progress: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl SessionSummary {
    /// The user-facing label: the title if renamed, else the name.
    pub fn display_name(&self) -> Option<&str> {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Everything needed to resume or replay a session.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullSession {
    #[serde(default)]
    pub id: SessionId,
    pub started_at: Timestamp,
    #[serde(default)]
    pub finished_at: Option<Timestamp>,
    #[serde(default)]
    pub mistake_ids: Vec<CardId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<Counts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default)]
    pub replay_of: Option<SessionId>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub order: Vec<usize>,
    #[serde(default, deserialize_with = "lenient_events")]
    pub events: Vec<Event>,
    #[serde(default)]
    pub annotation: Vec<Annotation>,
}

impl FullSession {
    /// The stored counts, or counts derived from the order and mistakes when
    /// the record predates them.
    pub fn effective_counts(&self) -> Counts {
        match self.counts {
            Some(counts) => counts,
            None => Counts {
                total: self.order.len(),
                mistakes: self.mistake_ids.len(),
                removed: self
                    .events
                    .iter()
                    .filter(|e| e.kind == EventKind::Remove)
                    .count(),
            },
        }
    }

    /// Build the summary for this record.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            mistake_ids: self.mistake_ids.clone(),
            counts: self.effective_counts(),
            in_progress: self.finished_at.is_none(),
            title: self.title.clone(),
            name: self.name.clone(),
            last_played_at: Some(self.last_played_at.unwrap_or(self.started_at)),
            locale: Some(
                self.locale
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            ),
        }
    }

    pub fn next_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.kind == EventKind::Next)
            .count()
    }
}
