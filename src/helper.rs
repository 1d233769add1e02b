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

use std::fs::create_dir_all;
use std::fs::write;

use tempfile::TempDir;
use tempfile::tempdir;

use crate::error::Fallible;
use crate::types::card::Card;

pub const HSK1_CSV: &str = "hanzi,pinyin,english\n你好,nǐ hǎo,hello\n谢谢,xiè xie,thank you\n再见,zài jiàn,goodbye\n";

pub const HSK2_CSV: &str = "\"hanzi\",\"pinyin\",\"english\"\r\n\"旅游\",\"lǚ yóu\",\"to travel, tourism\"\r\n\"准备\",\"zhǔn bèi\",\"to prepare\"\r\n";

pub fn sample_cards() -> Vec<Card> {
    vec![
        Card::new("你好", "nǐ hǎo", "hello"),
        Card::new("谢谢", "xiè xie", "thank you"),
        Card::new("再见", "zài jiàn", "goodbye"),
    ]
}

/// Create a throwaway collection directory with two decks under `data/`.
pub fn create_test_collection() -> Fallible<TempDir> {
    let dir = tempdir()?;
    let data = dir.path().join("data");
    create_dir_all(&data)?;
    write(data.join("hsk1.csv"), HSK1_CSV)?;
    write(data.join("hsk2.csv"), HSK2_CSV)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_collection() -> Fallible<()> {
        let dir = create_test_collection()?;
        assert!(dir.path().join("data").join("hsk1.csv").exists());
        assert!(dir.path().join("data").join("hsk2.csv").exists());
        Ok(())
    }
}
