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

const FNV_OFFSET_BASIS: u32 = 0x811c9dc5;
const FNV_PRIME: u32 = 0x01000193;

/// Incremental 32-bit FNV-1a hasher. Used for content-addressed card and
/// session identifiers, which only need to be stable, not secure.
pub struct Hasher {
    state: u32,
}

impl Hasher {
    pub fn new() -> Self {
        Self {
            state: FNV_OFFSET_BASIS,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        for byte in data {
            self.state ^= *byte as u32;
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    pub fn finalize(self) -> u32 {
        self.state
    }

    /// The digest as eight lowercase hex digits.
    pub fn finalize_hex(self) -> String {
        format!("{:08x}", self.finalize())
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a string with FNV-1a, returning eight lowercase hex digits.
pub fn fnv1a32(s: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(s.as_bytes());
    hasher.finalize_hex()
}

/// In-place Fisher-Yates shuffle.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(fnv1a32(""), "811c9dc5");
        assert_eq!(fnv1a32("a"), "e40c292c");
        assert_eq!(fnv1a32("foobar"), "bf9cf968");
    }

    #[test]
    fn test_hanzi_vectors() {
        assert_eq!(fnv1a32("你好"), "86938da3");
        assert_eq!(fnv1a32("你好|nǐ hǎo|hello"), "7e13d83c");
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let mut hasher = Hasher::new();
        hasher.update("你好|".as_bytes());
        hasher.update("nǐ hǎo|hello".as_bytes());
        assert_eq!(hasher.finalize_hex(), fnv1a32("你好|nǐ hǎo|hello"));
    }

    #[test]
    fn test_hex_is_padded() {
        for s in ["", "x", "hanzi", "再见"] {
            assert_eq!(fnv1a32(s).len(), 8);
        }
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut items: Vec<usize> = (0..50).collect();
        shuffle(&mut items, &mut rng);
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_deterministic_with_seed() {
        let mut a: Vec<usize> = (0..20).collect();
        let mut b: Vec<usize> = (0..20).collect();
        shuffle(&mut a, &mut StdRng::seed_from_u64(42));
        shuffle(&mut b, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_shuffle_trivial_slices() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: Vec<u8> = vec![];
        shuffle(&mut empty, &mut rng);
        assert!(empty.is_empty());
        let mut one = vec![9];
        shuffle(&mut one, &mut rng);
        assert_eq!(one, vec![9]);
    }
}
