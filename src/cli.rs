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

use clap::Parser;

use crate::cmd::check::check_collection;
use crate::cmd::drill::drill_level;
use crate::cmd::drill::replay_session;
use crate::cmd::drill::resume_session;
use crate::cmd::export::export_sessions;
use crate::cmd::import::import_sessions;
use crate::cmd::levels::list_levels;
use crate::cmd::sessions::delete_session;
use crate::cmd::sessions::list_sessions;
use crate::cmd::sessions::rename_session;
use crate::cmd::stats::print_stats;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Drill a level in the terminal.
    Drill {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
        /// The level to drill. Repeat to combine levels into one run. Defaults to the last level played.
        #[arg(long = "level")]
        levels: Vec<String>,
        /// Drill a CSV file of hanzi, pinyin and english rows instead of a level.
        #[arg(long, conflicts_with = "levels")]
        file: Option<String>,
        /// Reveal each card after this many seconds.
        #[arg(long)]
        timer: Option<u32>,
    },
    /// List the available levels.
    Levels {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// List stored sessions.
    Sessions {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Continue a stored session.
    Resume {
        /// The session id. Defaults to the last checkpoint.
        #[arg(long)]
        id: Option<String>,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Drill the cards a stored session got wrong.
    Replay {
        /// The session id.
        id: String,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Set a session's title.
    Rename {
        id: String,
        title: String,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Delete a session.
    Delete {
        id: String,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Export every session to a JSON file.
    Export {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Output file. Defaults to `flash_sessions_YYYYMMDD.json`.
        #[arg(long)]
        output: Option<String>,
    },
    /// Merge sessions from an export file.
    Import {
        /// The file to import.
        file: String,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Check that every level parses.
    Check {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Print collection statistics as JSON.
    Stats {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Drill {
            directory,
            levels,
            file,
            timer,
        } => drill_level(directory, levels, file, timer),
        Command::Levels { directory } => list_levels(directory),
        Command::Sessions { directory } => list_sessions(directory),
        Command::Resume { id, directory } => resume_session(directory, id),
        Command::Replay { id, directory } => replay_session(directory, id),
        Command::Rename {
            id,
            title,
            directory,
        } => rename_session(directory, id, title),
        Command::Delete { id, directory } => delete_session(directory, id),
        Command::Export { directory, output } => export_sessions(directory, output),
        Command::Import { file, directory } => import_sessions(directory, file),
        Command::Check { directory } => check_collection(directory),
        Command::Stats { directory } => print_stats(directory),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Command::command().debug_assert();
    }

    #[test]
    fn test_parse_drill() {
        let cli = Command::try_parse_from(["hskflash", "drill", "deck", "--level", "hsk2"]);
        assert!(matches!(
            cli,
            Ok(Command::Drill {
                directory: Some(_),
                file: None,
                timer: None,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_drill_repeated_levels() {
        let cli = Command::try_parse_from([
            "hskflash", "drill", "--level", "hsk1", "--level", "hsk2",
        ]);
        let Ok(Command::Drill { levels, .. }) = cli else {
            panic!("drill did not parse");
        };
        assert_eq!(levels, vec!["hsk1", "hsk2"]);
    }

    #[test]
    fn test_parse_drill_file() {
        let cli = Command::try_parse_from(["hskflash", "drill", "--file", "words.csv"]);
        let Ok(Command::Drill { file, levels, .. }) = cli else {
            panic!("drill did not parse");
        };
        assert_eq!(file.as_deref(), Some("words.csv"));
        assert!(levels.is_empty());
        let both = Command::try_parse_from([
            "hskflash", "drill", "--file", "words.csv", "--level", "hsk1",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn test_parse_rename() {
        let cli = Command::try_parse_from(["hskflash", "rename", "abc", "evening"]);
        assert!(matches!(
            cli,
            Ok(Command::Rename {
                directory: None,
                ..
            })
        ));
    }
}
