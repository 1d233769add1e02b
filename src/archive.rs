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

use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::Fallible;
use crate::storage::SESSION_PREFIX;
use crate::storage::SESSIONS_KEY;
use crate::storage::Storage;
use crate::types::session::DEFAULT_LOCALE;
use crate::types::session::FullSession;
use crate::types::session::SessionId;
use crate::types::session::SessionSummary;
use crate::types::timestamp::Timestamp;

pub const EXPORT_VERSION: u32 = 1;

const SESSIONS_BY_ID: &str = "sessionsById";

/// The export file: every summary and every full record that resolves.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: u32,
    pub exported_at: Timestamp,
    pub summaries: Vec<SessionSummary>,
    pub sessions: Vec<FullSession>,
}

/// Gather everything in storage into a bundle. `current` is an in-memory
/// snapshot that may not be persisted yet; it is included only if no stored
/// summary has its id.
pub fn export_bundle(storage: &Storage, current: Option<&FullSession>) -> Fallible<ExportBundle> {
    let mut summaries = storage.load_session_summaries()?;
    let mut sessions = Vec::new();
    for summary in &summaries {
        match storage.load_full_session(&summary.id)? {
            Some(full) => sessions.push(full),
            None => log::debug!("No full record for session {}.", summary.id),
        }
    }
    if let Some(current) = current {
        if !summaries.iter().any(|s| s.id == current.id) {
            summaries.push(current.summary());
            sessions.push(current.clone());
        }
    }
    Ok(ExportBundle {
        version: EXPORT_VERSION,
        exported_at: Timestamp::now(),
        summaries,
        sessions,
    })
}

/// The default export file name, dated by the local calendar day.
pub fn export_file_name(now: Timestamp) -> String {
    format!("flash_sessions_{}.json", now.local_compact_date())
}

pub fn export_json(storage: &Storage, current: Option<&FullSession>) -> Fallible<String> {
    let bundle = export_bundle(storage, current)?;
    Ok(serde_json::to_string_pretty(&bundle)?)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ImportReport {
    /// Full records written.
    pub added: usize,
    /// Of those, how many had an id already listed before the import.
    pub updated: usize,
}

/// The shapes an import file can take, normalized to raw records.
#[derive(Debug, PartialEq)]
enum ImportPayload {
    /// `{ summaries: [...], sessions: [...] }`, as written by export.
    Bundle {
        summaries: Vec<Value>,
        sessions: Vec<Value>,
    },
    /// A bare array of full records.
    Flat(Vec<Value>),
    /// A dump of the key-value store: full records under session keys, or
    /// nested in a `sessionsById` map. Values may be JSON-encoded strings.
    Keyed {
        summaries: Vec<Value>,
        sessions: Vec<Value>,
    },
    Unrecognized,
}

fn classify(value: Value) -> ImportPayload {
    match value {
        Value::Array(items) => ImportPayload::Flat(items),
        Value::Object(map) => {
            let summaries = array_field(&map, "summaries");
            let sessions = array_field(&map, "sessions");
            if !summaries.is_empty() || !sessions.is_empty() {
                return ImportPayload::Bundle {
                    summaries,
                    sessions,
                };
            }
            classify_keyed(map)
        }
        _ => ImportPayload::Unrecognized,
    }
}

fn classify_keyed(map: Map<String, Value>) -> ImportPayload {
    let mut summaries = Vec::new();
    let mut sessions = Vec::new();
    for (key, value) in map {
        if key == SESSIONS_KEY {
            if let Value::Array(items) = decode_embedded(value) {
                summaries.extend(items);
            }
        } else if key.starts_with(SESSION_PREFIX) {
            sessions.push(decode_embedded(value));
        } else if key == SESSIONS_BY_ID {
            if let Value::Object(nested) = decode_embedded(value) {
                sessions.extend(nested.into_iter().map(|(_, v)| decode_embedded(v)));
            }
        }
    }
    if sessions.is_empty() {
        ImportPayload::Unrecognized
    } else {
        ImportPayload::Keyed {
            summaries,
            sessions,
        }
    }
}

fn array_field(map: &Map<String, Value>, key: &str) -> Vec<Value> {
    match map.get(key) {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// Stored values are often JSON text inside JSON. Decode one level of that.
fn decode_embedded(value: Value) -> Value {
    match &value {
        Value::String(text) => serde_json::from_str(text).unwrap_or(value),
        _ => value,
    }
}

/// Parse full records, skipping any that do not resolve. Returns the parsed
/// records and the ids of those that carried an id but failed to parse.
fn parse_sessions(values: Vec<Value>) -> (Vec<FullSession>, HashSet<SessionId>) {
    let mut sessions = Vec::new();
    let mut rejected = HashSet::new();
    for value in values {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .map(SessionId::new);
        match serde_json::from_value::<FullSession>(value) {
            Ok(full) if !full.id.is_empty() => sessions.push(full),
            Ok(_) => log::warn!("Skipping imported session without an id."),
            Err(e) => {
                log::warn!("Skipping unreadable imported session: {e}");
                rejected.extend(id);
            }
        }
    }
    (sessions, rejected)
}

fn parse_summaries(values: Vec<Value>) -> Vec<SessionSummary> {
    let mut summaries = Vec::new();
    for value in values {
        match serde_json::from_value::<SessionSummary>(value) {
            Ok(mut summary) if !summary.id.is_empty() => {
                if summary.locale.is_none() {
                    summary.locale = Some(DEFAULT_LOCALE.to_string());
                }
                if summary.last_played_at.is_none() {
                    summary.last_played_at = Some(summary.started_at);
                }
                summaries.push(summary);
            }
            Ok(_) => log::warn!("Skipping imported summary without an id."),
            Err(e) => log::warn!("Skipping unreadable imported summary: {e}"),
        }
    }
    summaries
}

/// Merge an import file's text into storage. Text that is not JSON at all is
/// an error; JSON of an unknown shape imports nothing.
pub fn import_str(storage: &Storage, text: &str) -> Fallible<ImportReport> {
    let value: Value = serde_json::from_str(text)?;
    import_value(storage, value)
}

/// Merge records by id: every full record is written, last writer wins.
/// Explicit summaries are written as given, except for records that failed
/// to parse; full records without one get a summary derived from the record.
pub fn import_value(storage: &Storage, value: Value) -> Fallible<ImportReport> {
    let (summaries, (sessions, rejected)) = match classify(value) {
        ImportPayload::Bundle {
            summaries,
            sessions,
        }
        | ImportPayload::Keyed {
            summaries,
            sessions,
        } => (parse_summaries(summaries), parse_sessions(sessions)),
        ImportPayload::Flat(items) => (Vec::new(), parse_sessions(items)),
        ImportPayload::Unrecognized => {
            log::warn!("Import file has no recognizable sessions.");
            return Ok(ImportReport::default());
        }
    };
    // A summary whose record was rejected would list a session that cannot
    // be opened.
    let summaries: Vec<SessionSummary> = summaries
        .into_iter()
        .filter(|s| !rejected.contains(&s.id))
        .collect();

    let prior: HashSet<SessionId> = storage
        .load_session_summaries()?
        .into_iter()
        .map(|s| s.id)
        .collect();
    let mut report = ImportReport::default();
    for full in &sessions {
        storage.save_full_session(full)?;
        report.added += 1;
        if prior.contains(&full.id) {
            report.updated += 1;
        }
    }

    let explicit: HashSet<SessionId> = summaries.iter().map(|s| s.id.clone()).collect();
    for summary in summaries {
        storage.save_session_summary(summary)?;
    }
    for full in &sessions {
        if !explicit.contains(&full.id) {
            storage.save_session_summary(full.summary())?;
        }
    }
    log::info!(
        "Imported {} sessions ({} updated).",
        report.added,
        report.updated
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::drill::state::RunState;
    use crate::helper::sample_cards;

    fn stored_sessions(storage: &Storage) -> Fallible<Vec<FullSession>> {
        let mut sessions = Vec::new();
        for summary in storage.load_session_summaries()? {
            if let Some(full) = storage.load_full_session(&summary.id)? {
                sessions.push(full);
            }
        }
        Ok(sessions)
    }

    fn annotated_run() -> RunState {
        let mut state = RunState::new_run(sample_cards(), None);
        state.mark_mistake();
        state.mark_annotation("watch the tone");
        state.next_card();
        state
    }

    #[test]
    fn test_export_then_import_round_trip() -> Fallible<()> {
        let source = Storage::in_memory()?;
        let first = annotated_run();
        source.save_checkpoint(&first.snapshot())?;
        let mut second = annotated_run();
        for _ in 0..3 {
            second.next_card();
        }
        source.save_finished_session(&second.finalized_snapshot())?;
        source.rename_session(&first.session().id, "first")?;

        let json = export_json(&source, None)?;
        let target = Storage::in_memory()?;
        let report = import_str(&target, &json)?;
        assert_eq!(report, ImportReport { added: 2, updated: 0 });
        assert_eq!(
            target.load_session_summaries()?,
            source.load_session_summaries()?
        );
        assert_eq!(stored_sessions(&target)?, stored_sessions(&source)?);
        Ok(())
    }

    #[test]
    fn test_export_includes_unsaved_current() -> Fallible<()> {
        let storage = Storage::in_memory()?;
        let saved = annotated_run();
        storage.save_checkpoint(&saved.snapshot())?;
        let current = annotated_run().snapshot();

        let bundle = export_bundle(&storage, Some(&current))?;
        assert_eq!(bundle.version, EXPORT_VERSION);
        assert_eq!(bundle.summaries.len(), 2);
        assert_eq!(bundle.sessions.len(), 2);

        // Already listed: not duplicated.
        let bundle = export_bundle(&storage, Some(&saved.snapshot()))?;
        assert_eq!(bundle.summaries.len(), 1);
        assert_eq!(bundle.sessions.len(), 1);
        Ok(())
    }

    #[test]
    fn test_export_file_name() -> Fallible<()> {
        let name = export_file_name(Timestamp::now());
        assert!(name.starts_with("flash_sessions_"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "flash_sessions_20240101.json".len());
        Ok(())
    }

    #[test]
    fn test_import_flat_array_synthesizes_summaries() -> Fallible<()> {
        let storage = Storage::in_memory()?;
        let full = annotated_run().snapshot();
        let value = serde_json::to_value(vec![full.clone()])?;
        let report = import_value(&storage, value)?;
        assert_eq!(report.added, 1);
        let summaries = storage.load_session_summaries()?;
        assert_eq!(summaries, vec![full.summary()]);
        assert_eq!(storage.load_full_session(&full.id)?, Some(full));
        Ok(())
    }

    #[test]
    fn test_import_keyed_map() -> Fallible<()> {
        let storage = Storage::in_memory()?;
        let a = annotated_run().snapshot();
        let b = annotated_run().snapshot();
        let value = json!({
            format!("{SESSION_PREFIX}{}", a.id): serde_json::to_string(&a)?,
            "sessionsById": { b.id.as_str(): serde_json::to_value(&b)? },
            "hsk.flash.settings": "{}",
        });
        let report = import_value(&storage, value)?;
        assert_eq!(report.added, 2);
        assert_eq!(storage.load_full_session(&a.id)?, Some(a));
        assert_eq!(storage.load_full_session(&b.id)?, Some(b));
        assert_eq!(storage.load_session_summaries()?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_import_counts_updates() -> Fallible<()> {
        let storage = Storage::in_memory()?;
        let existing = annotated_run().snapshot();
        storage.save_checkpoint(&existing)?;
        let fresh = annotated_run().snapshot();
        let value = serde_json::to_value(vec![existing, fresh])?;
        let report = import_value(&storage, value)?;
        assert_eq!(report, ImportReport { added: 2, updated: 1 });
        assert_eq!(storage.load_session_summaries()?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_import_fills_summary_defaults() -> Fallible<()> {
        let storage = Storage::in_memory()?;
        let value = json!({
            "summaries": [{"id": "s1", "startedAt": "2024-03-01T10:00:00.000Z"}],
            "sessions": []
        });
        let report = import_value(&storage, value)?;
        assert_eq!(report.added, 0);
        let summaries = storage.load_session_summaries()?;
        assert_eq!(summaries[0].locale.as_deref(), Some(DEFAULT_LOCALE));
        assert_eq!(summaries[0].last_played_at, Some(summaries[0].started_at));
        Ok(())
    }

    #[test]
    fn test_import_skips_records_without_id() -> Fallible<()> {
        let storage = Storage::in_memory()?;
        let value = json!([
            {"startedAt": "2024-03-01T10:00:00.000Z", "cards": []},
            {"id": "ok", "startedAt": "2024-03-01T10:00:00.000Z"},
            {"id": "bad"}
        ]);
        let report = import_value(&storage, value)?;
        assert_eq!(report.added, 1);
        Ok(())
    }

    #[test]
    fn test_import_annotation_event_without_index() -> Fallible<()> {
        let storage = Storage::in_memory()?;
        let value = json!({
            "summaries": [{"id": "s1", "startedAt": "2024-03-01T10:00:00.000Z"}],
            "sessions": [{
                "id": "s1",
                "startedAt": "2024-03-01T10:00:00.000Z",
                "cards": [{"id": "c1", "hanzi": "你", "pinyin": "nǐ", "english": "you"}],
                "order": [0],
                "events": [
                    {"type": "start", "at": "2024-03-01T10:00:00.000Z", "index": 0},
                    {"type": "annotation", "at": "2024-03-01T10:00:05.000Z", "cardId": "c1", "note": "tone"},
                    {"type": "teleport", "at": "2024-03-01T10:00:06.000Z", "index": 0}
                ],
                "annotation": [{"cardId": "c1", "note": "tone"}]
            }]
        });
        let report = import_value(&storage, value)?;
        assert_eq!(report.added, 1);
        let full = storage.load_full_session(&SessionId::new("s1"))?;
        let events = full.map(|f| f.events).unwrap_or_default();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].note.as_deref(), Some("tone"));
        assert_eq!(storage.load_session_summaries()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_import_drops_summary_of_rejected_record() -> Fallible<()> {
        let storage = Storage::in_memory()?;
        let value = json!({
            "summaries": [
                {"id": "broken", "startedAt": "2024-03-01T10:00:00.000Z"},
                {"id": "listed", "startedAt": "2024-03-01T10:00:00.000Z"}
            ],
            "sessions": [{"id": "broken", "order": "not a list"}]
        });
        let report = import_value(&storage, value)?;
        assert_eq!(report.added, 0);
        let ids: Vec<SessionId> = storage
            .load_session_summaries()?
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![SessionId::new("listed")]);
        Ok(())
    }

    #[test]
    fn test_unrecognized_shape_imports_nothing() -> Fallible<()> {
        let storage = Storage::in_memory()?;
        assert_eq!(
            import_value(&storage, json!({"hello": "world"}))?,
            ImportReport::default()
        );
        assert_eq!(import_value(&storage, json!(42))?, ImportReport::default());
        assert_eq!(
            import_value(&storage, json!({"summaries": [], "sessions": []}))?,
            ImportReport::default()
        );
        assert!(storage.load_session_summaries()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_invalid_json_is_an_error() -> Fallible<()> {
        let storage = Storage::in_memory()?;
        assert!(import_str(&storage, "{ not json").is_err());
        Ok(())
    }

    #[test]
    fn test_classify_bundle_first() {
        let payload = classify(json!({"sessions": [{"id": "x"}]}));
        assert_eq!(
            payload,
            ImportPayload::Bundle {
                summaries: Vec::new(),
                sessions: vec![json!({"id": "x"})],
            }
        );
    }
}
