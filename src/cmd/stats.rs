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

use crate::collection::Collection;
use crate::error::Fallible;
use crate::parser::parse_deck_file;

pub fn print_stats(directory: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let stats = get_stats(&coll)?;
    let stats_json = serde_json::to_string_pretty(&stats)?;
    println!("{stats_json}");
    Ok(())
}

fn get_stats(coll: &Collection) -> Fallible<Stats> {
    let levels = coll.levels()?;
    let mut card_count = 0;
    for level in &levels {
        match parse_deck_file(&level.path) {
            Ok(cards) => card_count += cards.len(),
            Err(e) => log::warn!("Skipping level {}: {e}", level.label),
        }
    }
    let summaries = coll.storage.load_session_summaries()?;
    Ok(Stats {
        level_count: levels.len(),
        card_count,
        session_count: summaries.len(),
        in_progress_count: summaries.iter().filter(|s| s.in_progress).count(),
        mistake_count: summaries.iter().map(|s| s.counts.mistakes).sum(),
        sessions_size_bytes: coll.storage.sessions_size_bytes()?,
    })
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    level_count: usize,
    card_count: usize,
    session_count: usize,
    in_progress_count: usize,
    mistake_count: usize,
    sessions_size_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drill::state::RunState;
    use crate::helper::create_test_collection;
    use crate::helper::sample_cards;

    #[test]
    fn test_stats() -> Fallible<()> {
        let dir = create_test_collection()?;
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        let mut state = RunState::new_run(sample_cards(), None);
        state.mark_mistake();
        coll.storage.save_checkpoint(&state.snapshot())?;

        let stats = get_stats(&coll)?;
        assert_eq!(stats.level_count, 2);
        assert_eq!(stats.card_count, 5);
        assert_eq!(stats.session_count, 1);
        assert_eq!(stats.in_progress_count, 1);
        assert_eq!(stats.mistake_count, 1);
        assert!(stats.sessions_size_bytes > 0);
        Ok(())
    }

    #[test]
    fn test_print_stats() -> Fallible<()> {
        let dir = create_test_collection()?;
        print_stats(Some(dir.path().display().to_string()))
    }
}
