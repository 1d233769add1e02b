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

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::db::Database;
use crate::drill::state::RunState;
use crate::error::Fallible;
use crate::types::card::Card;
use crate::types::session::FullSession;
use crate::types::session::SessionId;
use crate::types::session::SessionSummary;
use crate::types::settings::Settings;

pub const SESSIONS_KEY: &str = "hsk.flash.sessions";
pub const SESSION_PREFIX: &str = "hsk.flash.session.";
pub const DECK_PREFIX: &str = "hsk.flash.deck.";
pub const LAST_CHECKPOINT_KEY: &str = "hsk.flash.lastCheckpointId";
pub const SETTINGS_KEY: &str = "hsk.flash.settings";
pub const LAST_LEVEL_KEY: &str = "hsk.flash.level";

/// Session, deck and settings persistence on top of the key-value store.
pub struct Storage {
    db: Database,
}

impl Storage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub fn in_memory() -> Fallible<Self> {
        Ok(Self::new(Database::in_memory()?))
    }

    /// Read a JSON value. A value that fails to parse is treated as absent.
    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Fallible<Option<T>> {
        let Some(raw) = self.db.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                log::warn!("Ignoring unreadable value under {key}: {e}");
                Ok(None)
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Fallible<()> {
        let json = serde_json::to_string(value)?;
        self.db.set(key, &json)
    }

    pub fn save_full_session(&self, session: &FullSession) -> Fallible<()> {
        self.write_json(&session_key(&session.id), session)
    }

    pub fn load_full_session(&self, id: &SessionId) -> Fallible<Option<FullSession>> {
        self.read_json(&session_key(id))
    }

    /// All summaries, in insertion order. Entries that no longer parse are
    /// skipped.
    pub fn load_session_summaries(&self) -> Fallible<Vec<SessionSummary>> {
        let values: Vec<Value> = self.read_json(SESSIONS_KEY)?.unwrap_or_default();
        let mut summaries = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_value::<SessionSummary>(value) {
                Ok(summary) => summaries.push(summary),
                Err(e) => log::warn!("Skipping unreadable session summary: {e}"),
            }
        }
        Ok(summaries)
    }

    fn save_session_summaries(&self, summaries: &[SessionSummary]) -> Fallible<()> {
        self.write_json(SESSIONS_KEY, summaries)
    }

    /// Insert or replace the summary with the same id.
    pub fn save_session_summary(&self, summary: SessionSummary) -> Fallible<()> {
        let mut summaries = self.load_session_summaries()?;
        match summaries.iter_mut().find(|s| s.id == summary.id) {
            Some(existing) => *existing = summary,
            None => summaries.push(summary),
        }
        self.save_session_summaries(&summaries)
    }

    /// Set a session's title. Does nothing if no summary has that id.
    pub fn rename_session(&self, id: &SessionId, title: &str) -> Fallible<bool> {
        let mut summaries = self.load_session_summaries()?;
        let Some(summary) = summaries.iter_mut().find(|s| s.id == *id) else {
            return Ok(false);
        };
        summary.title = Some(title.to_string());
        self.save_session_summaries(&summaries)?;
        Ok(true)
    }

    /// Delete a session's summary and full record. The summary list is
    /// rewritten even when the id is unknown.
    pub fn delete_session(&self, id: &SessionId) -> Fallible<()> {
        let mut summaries = self.load_session_summaries()?;
        summaries.retain(|s| s.id != *id);
        self.save_session_summaries(&summaries)?;
        self.db.remove(&session_key(id))
    }

    /// Write a mid-run checkpoint: the full record, an in-progress summary
    /// and the last-checkpoint pointer.
    pub fn save_checkpoint(&self, session: &FullSession) -> Fallible<()> {
        self.save_full_session(session)?;
        self.save_session_summary(self.summary_keeping_title(session)?)?;
        self.save_last_checkpoint_id(&session.id)
    }

    /// Persist a completed session: full record and summary.
    pub fn save_finished_session(&self, session: &FullSession) -> Fallible<()> {
        self.save_full_session(session)?;
        self.save_session_summary(self.summary_keeping_title(session)?)
    }

    /// A summary for `session` that keeps a title set by an earlier rename.
    fn summary_keeping_title(&self, session: &FullSession) -> Fallible<SessionSummary> {
        let mut summary = session.summary();
        if summary.title.is_none() {
            summary.title = self
                .load_session_summaries()?
                .into_iter()
                .find(|s| s.id == session.id)
                .and_then(|s| s.title);
        }
        Ok(summary)
    }

    /// Rebuild a run from a stored record and list it as in progress, so a
    /// session loaded from an import is discoverable afterwards. The summary
    /// is marked in progress even when the record carries `finishedAt`.
    pub fn resume_session(&self, full: FullSession) -> Fallible<RunState> {
        let state = RunState::resume(full);
        let snapshot = state.snapshot();
        self.save_full_session(&snapshot)?;
        let mut summary = self.summary_keeping_title(&snapshot)?;
        summary.in_progress = true;
        self.save_session_summary(summary)?;
        Ok(state)
    }

    pub fn save_deck(&self, cards: &[Card], level: &str) -> Fallible<()> {
        self.write_json(&deck_key(level), cards)
    }

    pub fn load_deck(&self, level: &str) -> Fallible<Option<Vec<Card>>> {
        self.read_json(&deck_key(level))
    }

    pub fn save_last_checkpoint_id(&self, id: &SessionId) -> Fallible<()> {
        self.db.set(LAST_CHECKPOINT_KEY, id.as_str())
    }

    pub fn load_last_checkpoint_id(&self) -> Fallible<Option<SessionId>> {
        Ok(self.db.get(LAST_CHECKPOINT_KEY)?.map(SessionId::new))
    }

    pub fn clear_last_checkpoint_id(&self) -> Fallible<()> {
        self.db.remove(LAST_CHECKPOINT_KEY)
    }

    pub fn load_settings(&self) -> Fallible<Settings> {
        let value: Option<Value> = self.read_json(SETTINGS_KEY)?;
        Ok(value.map(|v| Settings::from_value(&v)).unwrap_or_default())
    }

    pub fn save_settings(&self, settings: &Settings) -> Fallible<()> {
        self.write_json(SETTINGS_KEY, settings)
    }

    pub fn save_last_level(&self, level: &str) -> Fallible<()> {
        self.db.set(LAST_LEVEL_KEY, level)
    }

    pub fn load_last_level(&self) -> Fallible<Option<String>> {
        self.db.get(LAST_LEVEL_KEY)
    }

    /// Bytes held by session data: full records, the summary list and the
    /// checkpoint pointer.
    pub fn sessions_size_bytes(&self) -> Fallible<usize> {
        let mut total = 0;
        for key in self.db.keys()? {
            let is_session_key = key.starts_with(SESSION_PREFIX)
                || key == SESSIONS_KEY
                || key == LAST_CHECKPOINT_KEY;
            if is_session_key {
                if let Some(value) = self.db.get(&key)? {
                    total += value.len();
                }
            }
        }
        Ok(total)
    }
}

fn session_key(id: &SessionId) -> String {
    format!("{SESSION_PREFIX}{id}")
}

fn deck_key(level: &str) -> String {
    format!("{DECK_PREFIX}{}", level.to_lowercase())
}
