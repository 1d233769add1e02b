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

use std::io::BufReader;
use std::io::stdin;
use std::io::stdout;
use std::path::PathBuf;

use crate::collection::CUSTOM_LEVEL;
use crate::collection::Collection;
use crate::drill::state::RunState;
use crate::drill::terminal::Drill;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::session::FullSession;
use crate::types::session::SessionId;
use crate::types::settings::Settings;
use crate::types::settings::clamp_seconds;

/// Start a fresh run over one or more levels, or over a CSV file given by
/// path.
pub fn drill_level(
    directory: Option<String>,
    levels: Vec<String>,
    file: Option<String>,
    timer: Option<u32>,
) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let (cards, name) = match file {
        Some(file) => {
            let path = PathBuf::from(file);
            let cards = coll.load_file(&path)?;
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(CUSTOM_LEVEL)
                .to_string();
            (cards, name)
        }
        None => {
            let levels = if levels.is_empty() {
                vec![coll.preferred_level()?]
            } else {
                levels
            };
            let cards = match coll.load_levels(&levels) {
                Ok(cards) => cards,
                Err(e) => {
                    eprintln!("Drill a CSV file directly with --file <path>.");
                    return Err(e);
                }
            };
            (cards, coll.run_name(&levels)?)
        }
    };
    println!("Drilling {} cards from {name}.", cards.len());
    let settings = drill_settings(&coll, timer)?;
    let mut state = RunState::new_run(cards, None);
    state.set_name(Some(name));
    state.set_locale(coll.config.session.locale.clone());
    play(&coll, state, settings)
}

/// Continue a stored session. Without an id, the last checkpoint is used.
pub fn resume_session(directory: Option<String>, id: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let id = match id {
        Some(id) => SessionId::new(id),
        None => match coll.storage.load_last_checkpoint_id()? {
            Some(id) => id,
            None => return fail("no checkpoint to resume."),
        },
    };
    let full = find_session(&coll, &id)?;
    let state = coll.storage.resume_session(full)?;
    if state.is_finished() {
        println!("Session {id} is already finished.");
        return Ok(());
    }
    println!("Resuming session {id} at card {}.", state.index() + 1);
    let settings = drill_settings(&coll, None)?;
    play(&coll, state, settings)
}

/// Start a new run over the cards a stored session got wrong.
pub fn replay_session(directory: Option<String>, id: String) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let source = find_session(&coll, &SessionId::new(id))?;
    let state = RunState::replay(&source)?;
    println!(
        "Replaying {} mistakes from session {}.",
        state.deck().len(),
        source.id
    );
    let settings = drill_settings(&coll, None)?;
    play(&coll, state, settings)
}

fn find_session(coll: &Collection, id: &SessionId) -> Fallible<FullSession> {
    match coll.storage.load_full_session(id)? {
        Some(full) => Ok(full),
        None => fail(format!("no session with id {id}.")),
    }
}

/// The stored settings, with a timer given on the command line enabling
/// auto-reveal and being remembered.
fn drill_settings(coll: &Collection, timer: Option<u32>) -> Fallible<Settings> {
    let mut settings = coll.storage.load_settings()?;
    if let Some(seconds) = timer {
        settings.timer_enabled = true;
        settings.timer_seconds = clamp_seconds(f64::from(seconds));
        coll.storage.save_settings(&settings)?;
    }
    Ok(settings)
}

fn play(coll: &Collection, state: RunState, settings: Settings) -> Fallible<()> {
    let drill = Drill::new(state, &coll.storage, settings);
    let input = BufReader::new(stdin());
    let outcome = drill.run(input, &mut stdout())?;
    log::debug!("Drill ended: {outcome:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::create_test_collection;
    use crate::helper::sample_cards;

    #[test]
    fn test_drill_missing_directory() {
        assert!(
            drill_level(Some("./no-such-directory".to_string()), Vec::new(), None, None).is_err()
        );
    }

    #[test]
    fn test_drill_empty_file_is_an_error() -> Fallible<()> {
        let dir = create_test_collection()?;
        let directory = Some(dir.path().display().to_string());
        let path = dir.path().join("blank.csv");
        std::fs::write(&path, "hanzi,pinyin,english\n")?;
        let file = Some(path.display().to_string());
        assert!(drill_level(directory, Vec::new(), file, None).is_err());
        Ok(())
    }

    #[test]
    fn test_drill_unknown_levels_is_an_error() -> Fallible<()> {
        let dir = create_test_collection()?;
        let directory = Some(dir.path().display().to_string());
        let levels = vec!["hsk1".to_string(), "hsk9".to_string()];
        assert!(drill_level(directory, levels, None, None).is_err());
        Ok(())
    }

    #[test]
    fn test_resume_unknown_session() -> Fallible<()> {
        let dir = create_test_collection()?;
        let directory = Some(dir.path().display().to_string());
        assert!(resume_session(directory.clone(), Some("absent".to_string())).is_err());
        assert!(resume_session(directory, None).is_err());
        Ok(())
    }

    #[test]
    fn test_replay_without_mistakes() -> Fallible<()> {
        let dir = create_test_collection()?;
        let directory = Some(dir.path().display().to_string());
        let coll = Collection::new(directory.clone())?;
        let state = RunState::new_run(sample_cards(), None);
        coll.storage.save_checkpoint(&state.snapshot())?;
        let id = state.session().id.to_string();
        assert!(replay_session(directory, id).is_err());
        Ok(())
    }

    #[test]
    fn test_timer_is_remembered() -> Fallible<()> {
        let dir = create_test_collection()?;
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        let settings = drill_settings(&coll, Some(90))?;
        assert!(settings.timer_enabled);
        assert_eq!(settings.timer_seconds, 60);
        assert_eq!(coll.storage.load_settings()?, settings);
        Ok(())
    }
}
