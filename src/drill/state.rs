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

use rand::Rng;

use crate::drill::compact::RunParts;
use crate::drill::compact::remove_at;
use crate::hash::fnv1a32;
use crate::hash::shuffle;
use crate::types::card::Card;
use crate::types::card::CardId;
use crate::types::event::Event;
use crate::types::event::EventKind;
use crate::types::session::Annotation;
use crate::types::session::DEFAULT_LOCALE;
use crate::types::session::SessionId;
use crate::types::settings::MAX_TIMER_SECONDS;
use crate::types::settings::MIN_TIMER_SECONDS;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Face {
    /// Shows the English prompt.
    Front,
    /// Shows hanzi, pinyin and English.
    Back,
}

/// Bookkeeping for the session a run belongs to.
#[derive(Clone, Debug)]
pub struct Session {
    pub id: SessionId,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
    pub events: Vec<Event>,
    pub replay_of: Option<SessionId>,
    pub annotation: Vec<Annotation>,
    pub last_played_at: Timestamp,
    pub name: Option<String>,
    pub title: Option<String>,
    pub locale: String,
}

/// The state of a single run over a shuffled deck.
///
/// `index` ranges over `0..=order.len()`; `index == order.len()` means the
/// run is finished, unless the run was emptied by removing every card, in
/// which case there is no position at all and the run stays unfinished.
/// Every mutation goes through the methods below.
#[derive(Clone, Debug)]
pub struct RunState {
    pub(super) deck: Vec<Card>,
    pub(super) order: Vec<usize>,
    pub(super) index: usize,
    /// Set once every card has been removed.
    pub(super) emptied: bool,
    pub(super) face: Face,
    /// Card ids marked wrong, in the order they were marked.
    pub(super) mistakes: Vec<CardId>,
    pub(super) auto_reveal: bool,
    pub(super) auto_reveal_seconds: u32,
    pub(super) session: Session,
}

impl RunState {
    /// Start a fresh run over `cards` in a random order.
    pub fn new_run(cards: Vec<Card>, replay_of: Option<SessionId>) -> Self {
        Self::new_run_with_rng(cards, replay_of, &mut rand::rng())
    }

    pub fn new_run_with_rng<R: Rng + ?Sized>(
        cards: Vec<Card>,
        replay_of: Option<SessionId>,
        rng: &mut R,
    ) -> Self {
        let mut order: Vec<usize> = (0..cards.len()).collect();
        shuffle(&mut order, rng);
        let started_at = Timestamp::now();
        let salt: u32 = rng.random();
        let id = SessionId::new(fnv1a32(&format!(
            "{}|{}|{:08x}",
            started_at,
            cards.len(),
            salt
        )));
        log::debug!("New run {id} over {} cards.", cards.len());
        Self {
            deck: cards,
            order,
            index: 0,
            emptied: false,
            face: Face::Front,
            mistakes: Vec::new(),
            auto_reveal: false,
            auto_reveal_seconds: 5,
            session: Session {
                id,
                started_at,
                finished_at: None,
                events: vec![Event::new(EventKind::Start, 0)],
                replay_of,
                annotation: Vec::new(),
                last_played_at: started_at,
                name: None,
                title: None,
                locale: DEFAULT_LOCALE.to_string(),
            },
        }
    }

    pub fn deck(&self) -> &[Card] {
        &self.deck
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn face(&self) -> Face {
        self.face
    }

    pub fn mistakes(&self) -> &[CardId] {
        &self.mistakes
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn auto_reveal(&self) -> bool {
        self.auto_reveal
    }

    pub fn auto_reveal_seconds(&self) -> u32 {
        self.auto_reveal_seconds
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.session.name = name;
    }

    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.session.locale = locale.into();
    }

    /// The card at the current position, or `None` once the run is over.
    pub fn current_card(&self) -> Option<&Card> {
        let deck_index = *self.order.get(self.index)?;
        self.deck.get(deck_index)
    }

    pub fn is_mistake(&self, card_id: &CardId) -> bool {
        self.mistakes.contains(card_id)
    }

    pub fn annotation_for(&self, card_id: &CardId) -> Option<&Annotation> {
        self.session
            .annotation
            .iter()
            .find(|a| a.card_id == *card_id)
    }

    pub fn is_finished(&self) -> bool {
        !self.emptied && self.index >= self.order.len()
    }

    /// True once removals have left the run without cards.
    pub fn is_emptied(&self) -> bool {
        self.emptied
    }

    pub fn set_auto_reveal(&mut self, enabled: bool, seconds: u32) {
        self.auto_reveal = enabled;
        self.auto_reveal_seconds = seconds.clamp(MIN_TIMER_SECONDS, MAX_TIMER_SECONDS);
    }

    fn log(&mut self, event: Event) {
        self.session.last_played_at = event.at;
        self.session.events.push(event);
    }

    /// Flip to the back. Returns false if already showing the back.
    pub fn reveal(&mut self) -> bool {
        if self.face == Face::Back {
            return false;
        }
        self.face = Face::Back;
        self.log(Event::new(EventKind::Reveal, self.index));
        true
    }

    /// Flip to the front. Returns false if already showing the front.
    pub fn unreveal(&mut self) -> bool {
        if self.face == Face::Front {
            return false;
        }
        self.face = Face::Front;
        self.log(Event::new(EventKind::Unreveal, self.index));
        true
    }

    /// Mark the current card as a mistake. Returns false if there is no
    /// current card or it is already marked.
    pub fn mark_mistake(&mut self) -> bool {
        let Some(card_id) = self.current_card().map(|c| c.id.clone()) else {
            return false;
        };
        if self.is_mistake(&card_id) {
            return false;
        }
        self.mistakes.push(card_id.clone());
        self.log(Event::new(EventKind::Mistake, self.index).with_card(card_id));
        true
    }

    /// Clear the mistake mark on the current card.
    pub fn unmark_mistake(&mut self) -> bool {
        let Some(card_id) = self.current_card().map(|c| c.id.clone()) else {
            return false;
        };
        if !self.is_mistake(&card_id) {
            return false;
        }
        self.mistakes.retain(|id| *id != card_id);
        self.log(Event::new(EventKind::Unmistake, self.index).with_card(card_id));
        true
    }

    /// Advance one card, stopping at the end. The event is logged even when
    /// already at the end.
    pub fn next_card(&mut self) {
        let from = self.index;
        if self.index < self.order.len() {
            self.index += 1;
        }
        self.face = Face::Front;
        self.log(Event::new(EventKind::Next, from));
    }

    /// Go back one card. Not logged.
    pub fn prev_card(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        self.face = Face::Front;
        true
    }

    /// Attach a note to the current card, replacing any earlier note.
    pub fn mark_annotation(&mut self, note: &str) -> bool {
        let Some(card_id) = self.current_card().map(|c| c.id.clone()) else {
            return false;
        };
        let at = Timestamp::now();
        let annotation = Annotation {
            card_id: card_id.clone(),
            note: note.to_string(),
            at: Some(at),
        };
        match self
            .session
            .annotation
            .iter_mut()
            .find(|a| a.card_id == card_id)
        {
            Some(existing) => *existing = annotation,
            None => self.session.annotation.push(annotation),
        }
        self.log(
            Event::new(EventKind::Annotation, self.index)
                .with_card(card_id)
                .with_note(note),
        );
        true
    }

    /// Drop a card's note along with every annotation event for it.
    pub fn remove_annotation(&mut self, card_id: &CardId) {
        self.session.annotation.retain(|a| a.card_id != *card_id);
        self.session.events.retain(|e| {
            !(e.kind == EventKind::Annotation && e.card_id.as_ref() == Some(card_id))
        });
    }

    /// Remove the current card from the run entirely.
    pub fn remove_card(&mut self) -> Option<Card> {
        self.current_card()?;
        let position = self.index;
        let parts = RunParts {
            deck: std::mem::take(&mut self.deck),
            order: std::mem::take(&mut self.order),
            events: std::mem::take(&mut self.session.events),
            mistakes: std::mem::take(&mut self.mistakes),
            annotation: std::mem::take(&mut self.session.annotation),
        };
        let (parts, removed) = remove_at(parts, position);
        self.deck = parts.deck;
        self.order = parts.order;
        self.session.events = parts.events;
        self.mistakes = parts.mistakes;
        self.session.annotation = parts.annotation;

        let card = removed?;
        if self.order.is_empty() {
            self.index = 0;
            self.emptied = true;
        } else if self.index >= self.order.len() {
            self.index = self.order.len() - 1;
        }
        self.face = Face::Front;
        self.log(Event::new(EventKind::Remove, position).with_card(card.id.clone()));
        log::debug!("Removed card {} at position {position}.", card.id);
        Some(card)
    }

    /// Mark the session finished if the run is over. Only the first call
    /// after the end has any effect.
    pub fn finalize_if_finished(&mut self) -> bool {
        if !self.is_finished() || self.session.finished_at.is_some() {
            return false;
        }
        let event = Event::new(EventKind::Finish, self.index);
        self.session.finished_at = Some(event.at);
        self.log(event);
        log::debug!("Session {} completed.", self.session.id);
        true
    }

    /// Number of cards removed during the run.
    pub fn removed_count(&self) -> usize {
        self.session
            .events
            .iter()
            .filter(|e| e.kind == EventKind::Remove)
            .count()
    }
}
