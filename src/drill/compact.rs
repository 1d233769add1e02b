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

use crate::types::card::Card;
use crate::types::card::CardId;
use crate::types::event::Event;
use crate::types::session::Annotation;

/// The parts of a run that must change together when a card is removed.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct RunParts {
    pub deck: Vec<Card>,
    pub order: Vec<usize>,
    pub events: Vec<Event>,
    pub mistakes: Vec<CardId>,
    pub annotation: Vec<Annotation>,
}

/// Remove the card shown at `position` in the display order.
///
/// Returns the compacted parts and the removed card, or the parts unchanged
/// and `None` if `position` is out of range. After removal:
///
/// - the card is gone from the deck, the mistakes and the annotations;
/// - `order` has one entry fewer, and every deck index above the removed
///   one is shifted down, so it is still a permutation of the deck indices;
/// - every event recorded past `position` is shifted down one position.
///
/// The deck indices are compacted before the event positions.
pub fn remove_at(parts: RunParts, position: usize) -> (RunParts, Option<Card>) {
    let RunParts {
        mut deck,
        mut order,
        mut events,
        mut mistakes,
        mut annotation,
    } = parts;
    if position >= order.len() {
        let parts = RunParts {
            deck,
            order,
            events,
            mistakes,
            annotation,
        };
        return (parts, None);
    }
    let deck_index = order[position];
    let card = deck.remove(deck_index);
    mistakes.retain(|id| *id != card.id);
    annotation.retain(|a| a.card_id != card.id);

    order.remove(position);
    for entry in order.iter_mut() {
        if *entry > deck_index {
            *entry -= 1;
        }
    }
    for event in events.iter_mut() {
        if event.index > position {
            event.index -= 1;
        }
    }

    let parts = RunParts {
        deck,
        order,
        events,
        mistakes,
        annotation,
    };
    (parts, Some(card))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::event::EventKind;

    fn cards() -> Vec<Card> {
        vec![
            Card::new("你好", "nǐ hǎo", "hello"),
            Card::new("谢谢", "xiè xie", "thank you"),
            Card::new("再见", "zài jiàn", "goodbye"),
        ]
    }

    fn parts() -> RunParts {
        let deck = cards();
        let mistakes = vec![deck[0].id.clone(), deck[1].id.clone()];
        let annotation = vec![Annotation {
            card_id: deck[0].id.clone(),
            note: "greeting".to_string(),
            at: None,
        }];
        RunParts {
            deck,
            order: vec![2, 0, 1],
            events: vec![
                Event::new(EventKind::Start, 0),
                Event::new(EventKind::Next, 0),
                Event::new(EventKind::Mistake, 1),
                Event::new(EventKind::Mistake, 2),
            ],
            mistakes,
            annotation,
        }
    }

    #[test]
    fn test_remove_middle_position() {
        let original = parts();
        let removed_id = original.deck[0].id.clone();
        let (parts, card) = remove_at(original, 1);
        assert_eq!(card.map(|c| c.id), Some(removed_id.clone()));
        assert_eq!(parts.deck.len(), 2);
        // deck [A, B, C] -> [B, C]; order [2, 0, 1] -> [1, 0].
        assert_eq!(parts.order, vec![1, 0]);
        assert_eq!(parts.deck[parts.order[0]].hanzi, "再见");
        assert_eq!(parts.deck[parts.order[1]].hanzi, "谢谢");
        assert!(!parts.mistakes.contains(&removed_id));
        assert_eq!(parts.mistakes.len(), 1);
        assert!(parts.annotation.is_empty());
        let indices: Vec<usize> = parts.events.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_order_stays_permutation() {
        for position in 0..3 {
            let (parts, card) = remove_at(parts(), position);
            assert!(card.is_some());
            let mut sorted = parts.order.clone();
            sorted.sort();
            assert_eq!(sorted, (0..parts.deck.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let original = parts();
        let (parts, card) = remove_at(original.clone(), 3);
        assert!(card.is_none());
        assert_eq!(parts, original);
    }

    #[test]
    fn test_remove_everything() {
        let mut current = parts();
        for _ in 0..3 {
            let (next, card) = remove_at(current, 0);
            assert!(card.is_some());
            current = next;
        }
        assert!(current.deck.is_empty());
        assert!(current.order.is_empty());
        assert!(current.mistakes.is_empty());
        assert!(current.events.iter().all(|e| e.index == 0));
    }
}
