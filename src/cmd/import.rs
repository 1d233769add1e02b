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

use crate::archive::import_str;
use crate::collection::Collection;
use crate::error::Fallible;

/// Merge sessions from an export file into the store.
pub fn import_sessions(directory: Option<String>, file: String) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let text = read_to_string(&file)?;
    let report = import_str(&coll.storage, &text)?;
    println!("added: {}", report.added);
    println!("updated: {}", report.updated);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use super::*;
    use crate::archive::export_json;
    use crate::drill::state::RunState;
    use crate::helper::create_test_collection;
    use crate::helper::sample_cards;
    use crate::storage::Storage;

    #[test]
    fn test_import_sessions() -> Fallible<()> {
        let source = Storage::in_memory()?;
        let state = RunState::new_run(sample_cards(), None);
        source.save_checkpoint(&state.snapshot())?;

        let dir = create_test_collection()?;
        let file = dir.path().join("sessions.json");
        write(&file, export_json(&source, None)?)?;
        let directory = Some(dir.path().display().to_string());
        import_sessions(directory.clone(), file.display().to_string())?;

        let coll = Collection::new(directory)?;
        assert_eq!(coll.storage.load_session_summaries()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_import_garbage() -> Fallible<()> {
        let dir = create_test_collection()?;
        let file = dir.path().join("garbage.json");
        write(&file, "not json at all")?;
        let directory = Some(dir.path().display().to_string());
        assert!(import_sessions(directory, file.display().to_string()).is_err());
        Ok(())
    }
}
