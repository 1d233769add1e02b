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

pub fn list_levels(directory: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let levels = coll.levels()?;
    if levels.is_empty() {
        println!("No levels in {}.", coll.deck_directory().display());
        return Ok(());
    }
    for level in levels {
        match level.description {
            Some(description) => {
                println!("{}\t{}\t{description}", level.label, level.display_name)
            }
            None => println!("{}\t{}", level.label, level.display_name),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::create_test_collection;

    #[test]
    fn test_list_levels() -> Fallible<()> {
        let dir = create_test_collection()?;
        list_levels(Some(dir.path().display().to_string()))
    }

    #[test]
    fn test_non_existent_directory() {
        assert!(list_levels(Some("./no-such-directory".to_string())).is_err());
    }
}
