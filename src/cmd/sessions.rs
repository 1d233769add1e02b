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

use crate::collection::Collection;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::session::SessionId;
use crate::types::session::SessionSummary;

/// Print every session, most recently started first.
pub fn list_sessions(directory: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let mut summaries = coll.storage.load_session_summaries()?;
    if summaries.is_empty() {
        println!("No sessions.");
        return Ok(());
    }
    summaries.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    for summary in &summaries {
        println!("{}", format_summary(summary));
    }
    Ok(())
}

fn format_summary(summary: &SessionSummary) -> String {
    let label = summary.display_name().unwrap_or("-");
    let status = if summary.in_progress {
        "in progress"
    } else {
        "finished"
    };
    format!(
        "{}\t{}\t{}\t{} cards, {} mistakes\t{status}",
        summary.id,
        summary.started_at,
        label,
        summary.counts.total,
        summary.counts.mistakes
    )
}

pub fn rename_session(directory: Option<String>, id: String, title: String) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let id = SessionId::new(id);
    if !coll.storage.rename_session(&id, &title)? {
        return fail(format!("no session with id {id}."));
    }
    println!("Renamed {id} to {title}.");
    Ok(())
}

pub fn delete_session(directory: Option<String>, id: String) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let id = SessionId::new(id);
    coll.storage.delete_session(&id)?;
    println!("Deleted {id}.");
    Ok(())
}
