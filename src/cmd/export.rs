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

use std::fs::write;
use std::path::PathBuf;

use crate::archive::export_file_name;
use crate::archive::export_json;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

/// Write every stored session to a JSON file.
pub fn export_sessions(directory: Option<String>, output: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let path: PathBuf = match output {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(export_file_name(Timestamp::now())),
    };
    let json = export_json(&coll.storage, None)?;
    write(&path, json)?;
    println!("Exported sessions to {}.", path.display());
    Ok(())
}
