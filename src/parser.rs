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
use std::fs::read_to_string;
use std::path::Path;

use crate::error::Fallible;
use crate::types::card::Card;
use crate::types::card::CardId;

/// Split CSV text into rows of fields.
///
/// Quoted fields may contain commas, newlines and doubled quotes. Carriage
/// returns are dropped everywhere, quoted or not. Malformed quoting never
/// fails: an unterminated quote simply runs to the end of the input.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else if c != '\r' {
                field.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => row.push(std::mem::take(&mut field)),
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                '\r' => {}
                _ => field.push(c),
            }
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

/// Map `hanzi, pinyin, english` rows to cards.
///
/// A leading header row is skipped. Rows with fewer than three columns or an
/// empty hanzi/english are dropped. Duplicate cards keep their first
/// occurrence.
pub fn rows_to_cards(rows: &[Vec<String>]) -> Vec<Card> {
    let has_header = rows
        .first()
        .is_some_and(|row| row.len() >= 3 && row[0].to_lowercase().contains("hanzi"));
    let data = if has_header { &rows[1..] } else { rows };

    let cards = data.iter().filter_map(|row| {
        if row.len() < 3 {
            return None;
        }
        let hanzi = row[0].trim();
        let pinyin = row[1].split_whitespace().collect::<Vec<_>>().join(" ");
        let english = row[2].trim();
        if hanzi.is_empty() || english.is_empty() {
            return None;
        }
        Some(Card::new(hanzi, pinyin, english))
    });
    dedup_cards(cards)
}

/// Drop cards whose id was already seen, keeping first occurrences in order.
pub fn dedup_cards(cards: impl IntoIterator<Item = Card>) -> Vec<Card> {
    let mut seen: HashSet<CardId> = HashSet::new();
    cards
        .into_iter()
        .filter(|card| seen.insert(card.id.clone()))
        .collect()
}

/// Parse CSV text straight to cards.
pub fn parse_cards(text: &str) -> Vec<Card> {
    rows_to_cards(&parse_csv(text))
}

/// Read and parse a deck file.
pub fn parse_deck_file(path: &Path) -> Fallible<Vec<Card>> {
    let text = read_to_string(path)?;
    let cards = parse_cards(&text);
    log::debug!("Parsed {} cards from {}.", cards.len(), path.display());
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::fnv1a32;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple() {
        let rows = parse_csv("a,b,c\nd,e,f\n");
        assert_eq!(rows, vec![row(&["a", "b", "c"]), row(&["d", "e", "f"])]);
    }

    #[test]
    fn test_parse_quoted_comma_and_newline() {
        let rows = parse_csv("\"a,1\",\"line\nbreak\",c");
        assert_eq!(rows, vec![row(&["a,1", "line\nbreak", "c"])]);
    }

    #[test]
    fn test_parse_escaped_quote() {
        let rows = parse_csv("\"say \"\"hi\"\"\",x,y");
        assert_eq!(rows, vec![row(&["say \"hi\"", "x", "y"])]);
    }

    #[test]
    fn test_carriage_return_dropped_inside_quotes() {
        assert_eq!(parse_csv("\"a\r\nb\",c\r\n"), vec![row(&["a\nb", "c"])]);
    }

    #[test]
    fn test_parse_crlf() {
        let rows = parse_csv("a,b,c\r\nd,e,f\r\n");
        assert_eq!(rows, vec![row(&["a", "b", "c"]), row(&["d", "e", "f"])]);
    }

    #[test]
    fn test_parse_trailing_row_without_newline() {
        let rows = parse_csv("a,b\nc,d");
        assert_eq!(rows, vec![row(&["a", "b"]), row(&["c", "d"])]);
    }

    #[test]
    fn test_parse_trailing_empty_field() {
        let rows = parse_csv("a,");
        assert_eq!(rows, vec![row(&["a", ""])]);
    }

    #[test]
    fn test_parse_unterminated_quote() {
        let rows = parse_csv("\"abc,def\nghi");
        assert_eq!(rows, vec![row(&["abc,def\nghi"])]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_csv("").is_empty());
    }

    #[test]
    fn test_header_skipped() {
        let rows = parse_csv("Hanzi,Pinyin,English\n你好,nǐ hǎo,hello\n");
        let cards = rows_to_cards(&rows);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].hanzi, "你好");
    }

    #[test]
    fn test_header_needs_three_columns() {
        let rows = vec![row(&["hanzi", "pinyin"]), row(&["你", "nǐ", "you"])];
        let cards = rows_to_cards(&rows);
        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn test_normalization() {
        let rows = vec![row(&["  你好 ", " nǐ   hǎo\t", " hello  "])];
        let cards = rows_to_cards(&rows);
        assert_eq!(cards[0].hanzi, "你好");
        assert_eq!(cards[0].pinyin, "nǐ hǎo");
        assert_eq!(cards[0].english, "hello");
        assert_eq!(cards[0].id.as_str(), fnv1a32("你好|nǐ hǎo|hello"));
    }

    #[test]
    fn test_invalid_rows_dropped() {
        let rows = vec![
            row(&["你", "nǐ"]),
            row(&["", "nǐ", "you"]),
            row(&["你", "nǐ", "  "]),
            row(&["我", "", "I"]),
        ];
        let cards = rows_to_cards(&rows);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].hanzi, "我");
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let text = "你,nǐ,you\n好,hǎo,good\n你,nǐ,you\n你, nǐ ,you\n再见,zài jiàn,goodbye\n";
        let cards = parse_cards(text);
        let hanzi: Vec<&str> = cards.iter().map(|c| c.hanzi.as_str()).collect();
        assert_eq!(hanzi, vec!["你", "好", "再见"]);
        let ids: HashSet<&CardId> = cards.iter().map(|c| &c.id).collect();
        assert_eq!(ids.len(), cards.len());
    }

    #[test]
    fn test_extra_columns_ignored() {
        let cards = parse_cards("你,nǐ,you,HSK1,extra\n");
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].english, "you");
    }
}
