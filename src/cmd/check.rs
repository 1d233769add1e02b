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
use crate::parser::parse_deck_file;

/// Parse every level and report the first one without usable cards.
pub fn check_collection(directory: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let levels = coll.levels()?;
    if levels.is_empty() {
        return fail("no levels found.");
    }
    for level in levels {
        let cards = parse_deck_file(&level.path)?;
        if cards.is_empty() {
            return fail(format!("level {} has no valid cards.", level.label));
        }
        log::debug!("{}: {} cards", level.label, cards.len());
    }
    println!("ok");
    Ok(())
}
