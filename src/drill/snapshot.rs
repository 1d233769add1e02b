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

use std::collections::HashSet;

use crate::drill::state::Face;
use crate::drill::state::RunState;
use crate::drill::state::Session;
use crate::error::Fallible;
use crate::error::fail;
use crate::hash::fnv1a32;
use crate::types::card::Card;
use crate::types::card::CardId;
use crate::types::event::EventKind;
use crate::types::session::Annotation;
use crate::types::session::Counts;
use crate::types::session::DEFAULT_LOCALE;
use crate::types::session::FullSession;
use crate::types::session::SessionId;

impl RunState {
    /// Project the live state into a persistable record without finalizing
    /// it. Used for mid-run checkpoints.
    pub fn snapshot(&self) -> FullSession {
        let session = &self.session;
        FullSession {
            id: session.id.clone(),
            started_at: session.started_at,
            finished_at: session.finished_at,
            mistake_ids: self.mistakes.clone(),
            counts: Some(Counts {
                total: self.order.len(),
                mistakes: self.mistakes.len(),
                removed: self.removed_count(),
            }),
            title: session.title.clone(),
            name: session.name.clone(),
            last_played_at: Some(session.last_played_at),
            locale: Some(session.locale.clone()),
            replay_of: session.replay_of.clone(),
            cards: self.deck.clone(),
            order: self.order.clone(),
            events: session.events.clone(),
            annotation: session.annotation.clone(),
        }
    }

    /// Finalize the session if the run is over, then snapshot it. Used at
    /// natural completion.
    pub fn finalized_snapshot(&mut self) -> FullSession {
        self.finalize_if_finished();
        self.snapshot()
    }

    /// Rebuild a run from a stored session.
    ///
    /// The position is recomputed from the number of `next` events rather
    /// than trusted from the record. The face is reset to the front.
    pub fn resume(full: FullSession) -> Self {
        let next_count = full.next_count();
        let FullSession {
            id,
            started_at,
            finished_at,
            mistake_ids,
            title,
            name,
            last_played_at,
            locale,
            replay_of,
            cards,
            order,
            events,
            annotation,
            ..
        } = full;

        let order = if is_permutation(&order, cards.len()) {
            order
        } else {
            log::warn!("Session {id} has an inconsistent order; using deck order.");
            (0..cards.len()).collect()
        };
        let index = next_count.min(order.len());
        // A checkpoint taken after every card was removed stays unfinished.
        let emptied = order.is_empty()
            && finished_at.is_none()
            && events.iter().any(|e| e.kind == EventKind::Remove);

        let deck_ids: HashSet<&CardId> = cards.iter().map(|c| &c.id).collect();
        let mut mistakes: Vec<CardId> = Vec::new();
        for card_id in mistake_ids {
            if deck_ids.contains(&card_id) && !mistakes.contains(&card_id) {
                mistakes.push(card_id);
            }
        }
        let annotation = dedup_annotations(annotation);

        let id = if id.is_empty() {
            SessionId::new(fnv1a32(&format!("{}|{}|resume", started_at, cards.len())))
        } else {
            id
        };
        log::debug!("Resuming session {id} at position {index}.");
        Self {
            deck: cards,
            order,
            index,
            emptied,
            face: Face::Front,
            mistakes,
            auto_reveal: false,
            auto_reveal_seconds: 5,
            session: Session {
                id,
                started_at,
                finished_at,
                events,
                replay_of,
                annotation,
                last_played_at: last_played_at.unwrap_or(started_at),
                name,
                title,
                locale: locale.unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            },
        }
    }

    /// Start a new run over the cards a stored session got wrong.
    pub fn replay(source: &FullSession) -> Fallible<Self> {
        let mistakes: HashSet<&CardId> = source.mistake_ids.iter().collect();
        let cards: Vec<Card> = source
            .cards
            .iter()
            .filter(|c| mistakes.contains(&c.id))
            .cloned()
            .collect();
        if cards.is_empty() {
            return fail("this session has no mistakes to replay.");
        }
        let mut state = RunState::new_run(cards, Some(source.id.clone()));
        let label = source
            .title
            .as_deref()
            .or(source.name.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or(source.id.as_str());
        state.set_name(Some(format!("replay from {label}")));
        if let Some(locale) = &source.locale {
            state.set_locale(locale.clone());
        }
        Ok(state)
    }
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &i in order {
        if i >= len || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    true
}

/// Keep one annotation per card; later entries win.
fn dedup_annotations(annotation: Vec<Annotation>) -> Vec<Annotation> {
    let mut result: Vec<Annotation> = Vec::new();
    for a in annotation {
        match result.iter_mut().find(|r| r.card_id == a.card_id) {
            Some(existing) => *existing = a,
            None => result.push(a),
        }
    }
    result
}
