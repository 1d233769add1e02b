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

use std::io::BufRead;
use std::io::Write;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::mpsc::channel;
use std::thread::spawn;
use std::time::Duration;
use std::time::Instant;

use crate::drill::state::Face;
use crate::drill::state::RunState;
use crate::error::Fallible;
use crate::storage::Storage;
use crate::types::session::FullSession;
use crate::types::settings::Settings;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Action {
    /// Flip the card.
    Toggle,
    Next,
    Prev,
    /// Toggle the mistake mark.
    Mistake,
    Annotate(String),
    ClearAnnotation,
    Remove,
    Quit,
}

impl Action {
    /// Parse one line of input. An empty line flips the card.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Some(Action::Toggle);
        }
        let line = line.trim();
        if let Some(note) = line.strip_prefix("a ") {
            let note = note.trim();
            if note.is_empty() {
                return None;
            }
            return Some(Action::Annotate(note.to_string()));
        }
        match line {
            "n" => Some(Action::Next),
            "p" => Some(Action::Prev),
            "m" => Some(Action::Mistake),
            "x" => Some(Action::ClearAnnotation),
            "r" => Some(Action::Remove),
            "q" => Some(Action::Quit),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Continue,
    Finished,
    Quit,
}

/// A run being played in the terminal, with its persistence.
pub struct Drill<'a> {
    state: RunState,
    storage: &'a Storage,
    settings: Settings,
}

impl<'a> Drill<'a> {
    pub fn new(mut state: RunState, storage: &'a Storage, settings: Settings) -> Self {
        state.set_auto_reveal(settings.timer_enabled, settings.timer_seconds);
        Self {
            state,
            storage,
            settings,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Apply one user action to the run.
    pub fn action_handler(&mut self, action: Action) -> Fallible<Outcome> {
        match action {
            Action::Toggle => {
                if self.state.face() == Face::Front {
                    self.state.reveal();
                } else {
                    self.state.unreveal();
                }
            }
            Action::Next => {
                self.state.next_card();
            }
            Action::Prev => {
                self.state.prev_card();
            }
            Action::Mistake => {
                if let Some(card_id) = self.state.current_card().map(|c| c.id.clone()) {
                    let changed = if self.state.is_mistake(&card_id) {
                        self.state.unmark_mistake()
                    } else {
                        self.state.mark_mistake()
                    };
                    if changed {
                        self.autosave();
                    }
                }
            }
            Action::Annotate(note) => {
                if self.state.mark_annotation(&note) {
                    self.autosave();
                }
            }
            Action::ClearAnnotation => {
                if let Some(card_id) = self.state.current_card().map(|c| c.id.clone()) {
                    if self.state.annotation_for(&card_id).is_some() {
                        self.state.remove_annotation(&card_id);
                        self.autosave();
                    }
                }
            }
            Action::Remove => {
                if self.state.remove_card().is_some() {
                    self.autosave();
                }
            }
            Action::Quit => {
                log::debug!("Run interrupted; saving checkpoint.");
                self.checkpoint();
                return Ok(Outcome::Quit);
            }
        }
        if self.state.is_finished() {
            self.complete();
            return Ok(Outcome::Finished);
        }
        Ok(Outcome::Continue)
    }

    fn autosave(&self) {
        if self.settings.autosave {
            self.checkpoint();
        }
    }

    /// Persist the live run. Failures are logged and the run goes on.
    fn checkpoint(&self) {
        let start = Instant::now();
        let snapshot = self.state.snapshot();
        match self.storage.save_checkpoint(&snapshot) {
            Ok(()) => {
                let duration = start.elapsed().as_millis();
                log::debug!("autosave: {duration}ms, checkpoint {}", snapshot.id);
            }
            Err(e) => log::error!("Failed to save checkpoint {}: {e}", snapshot.id),
        }
    }

    fn complete(&mut self) {
        let snapshot = self.state.finalized_snapshot();
        match self.save_completed(&snapshot) {
            Ok(()) => log::debug!("Session {} completed.", snapshot.id),
            Err(e) => log::error!("Failed to save session {}: {e}", snapshot.id),
        }
    }

    /// Save a finished session. A checkpoint pointer to it is dropped, so a
    /// bare resume does not land on a finished run.
    fn save_completed(&self, snapshot: &FullSession) -> Fallible<()> {
        self.storage.save_finished_session(snapshot)?;
        if self.storage.load_last_checkpoint_id()?.as_ref() == Some(&snapshot.id) {
            self.storage.clear_last_checkpoint_id()?;
        }
        Ok(())
    }

    fn render(&self, out: &mut impl Write) -> Fallible<()> {
        let Some(card) = self.state.current_card() else {
            if self.state.is_emptied() {
                writeln!(out)?;
                writeln!(out, "No cards left in this run. q: quit")?;
                out.flush()?;
            }
            return Ok(());
        };
        writeln!(out)?;
        writeln!(
            out,
            "[{}/{}]",
            self.state.index() + 1,
            self.state.order().len()
        )?;
        match self.state.face() {
            Face::Front => {
                writeln!(out, "  {}", card.english)?;
            }
            Face::Back => {
                writeln!(out, "  {}", card.hanzi)?;
                writeln!(out, "  {}", card.pinyin)?;
                writeln!(out, "  {}", card.english)?;
            }
        }
        if self.state.is_mistake(&card.id) {
            writeln!(out, "  (mistake)")?;
        }
        if let Some(annotation) = self.state.annotation_for(&card.id) {
            writeln!(out, "  note: {}", annotation.note)?;
        }
        if !self.settings.minimal_ui {
            writeln!(
                out,
                "enter: flip  n: next  p: prev  m: mistake  a <note>  x: clear note  r: remove  q: quit"
            )?;
        }
        out.flush()?;
        Ok(())
    }

    fn render_summary(&self, out: &mut impl Write) -> Fallible<()> {
        let session = self.state.session();
        writeln!(out)?;
        writeln!(
            out,
            "Session {} finished: {} cards, {} mistakes.",
            session.id,
            self.state.order().len(),
            self.state.mistakes().len()
        )?;
        Ok(())
    }

    /// Play the run, reading commands line by line from `input`.
    ///
    /// When auto-reveal is on, the front of each card is flipped after the
    /// countdown unless a command arrives first. End of input quits.
    pub fn run<R>(mut self, input: R, out: &mut impl Write) -> Fallible<Outcome>
    where
        R: BufRead + Send + 'static,
    {
        if self.state.is_finished() {
            self.complete();
            self.render_summary(out)?;
            return Ok(Outcome::Finished);
        }
        let lines = spawn_reader(input);
        loop {
            self.render(out)?;
            let line = match self.wait_for_line(&lines) {
                Wait::Line(line) => line,
                Wait::Timeout => {
                    self.state.reveal();
                    continue;
                }
                Wait::Closed => {
                    self.action_handler(Action::Quit)?;
                    return Ok(Outcome::Quit);
                }
            };
            let Some(action) = Action::parse(&line) else {
                writeln!(out, "Unknown command: {}", line.trim())?;
                continue;
            };
            match self.action_handler(action)? {
                Outcome::Continue => {}
                Outcome::Finished => {
                    self.render_summary(out)?;
                    return Ok(Outcome::Finished);
                }
                Outcome::Quit => {
                    writeln!(out, "Saved session {}.", self.state.session().id)?;
                    return Ok(Outcome::Quit);
                }
            }
        }
    }

    fn wait_for_line(&self, lines: &Receiver<String>) -> Wait {
        let countdown = self.state.auto_reveal()
            && self.state.face() == Face::Front
            && self.state.current_card().is_some();
        if countdown {
            let timeout = Duration::from_secs(u64::from(self.state.auto_reveal_seconds()));
            match lines.recv_timeout(timeout) {
                Ok(line) => Wait::Line(line),
                Err(RecvTimeoutError::Timeout) => Wait::Timeout,
                Err(RecvTimeoutError::Disconnected) => Wait::Closed,
            }
        } else {
            match lines.recv() {
                Ok(line) => Wait::Line(line),
                Err(_) => Wait::Closed,
            }
        }
    }
}

enum Wait {
    Line(String),
    Timeout,
    Closed,
}

fn spawn_reader<R>(input: R) -> Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = channel();
    spawn(move || {
        for line in input.lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
