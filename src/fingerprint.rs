//! Content fingerprints used as reading-cache keys.

use std::fmt::{self, Write as _};

use sha2::Digest as _;

use crate::draw::DrawnCard;

/// SHA-256 digest of a question and its drawn cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Lowercase hex form (64 characters).
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for b in self.0 {
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Canonical text that gets hashed: `question||name:orientation||...`.
fn canonical(question: &str, cards: &[DrawnCard]) -> String {
    let mut raw = String::from(question);
    raw.push_str("||");
    let parts: Vec<String> = cards
        .iter()
        .map(|c| format!("{}:{}", c.card.display_name(), c.orientation.as_key()))
        .collect();
    raw.push_str(&parts.join("||"));
    raw
}

/// Fingerprint a request. Card order matters; positions do not.
pub fn fingerprint(question: &str, cards: &[DrawnCard]) -> Fingerprint {
    let mut hasher = sha2::Sha256::new();
    hasher.update(canonical(question, cards).as_bytes());
    Fingerprint(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, Orientation};

    fn sample_cards() -> Vec<DrawnCard> {
        vec![
            DrawnCard::new(Card::Fool, "과거", Orientation::Upright),
            DrawnCard::new(Card::Tower, "현재", Orientation::Reversed),
            DrawnCard::new(Card::Star, "미래", Orientation::Upright),
        ]
    }

    #[test]
    fn test_canonical_form() {
        let raw = canonical("q", &sample_cards()[..2]);
        assert_eq!(
            raw,
            "q||0. 바보 (The Fool):upright||16. 탑 (The Tower):reversed"
        );
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let cards = sample_cards();
        assert_eq!(fingerprint("요즘 불안해요", &cards), fingerprint("요즘 불안해요", &cards));
    }

    #[test]
    fn test_fingerprint_hex_is_64_lowercase_chars() {
        let hex = fingerprint("q", &sample_cards()).to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint_known_values() {
        // sha256("||")
        assert_eq!(
            fingerprint("", &[]).to_hex(),
            "565d240f5343e625ae579a4d45a770f1f02c6368b5ed4d06da4fbe6f47c28866"
        );
        assert_eq!(
            fingerprint("요즘 너무 불안해요", &sample_cards()).to_string(),
            "e28bfc1cb292c933f13c60eceeb5fafc27bff7980c6ec7501610bbddbdd5d33e"
        );
    }

    #[test]
    fn test_fingerprint_changes_when_orientation_flips() {
        let cards = sample_cards();
        let mut flipped = cards.clone();
        flipped[1].orientation = Orientation::Upright;
        assert_ne!(fingerprint("q", &cards), fingerprint("q", &flipped));
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        let cards = sample_cards();
        let mut reordered = cards.clone();
        reordered.swap(0, 2);
        assert_ne!(fingerprint("q", &cards), fingerprint("q", &reordered));
    }

    #[test]
    fn test_fingerprint_changes_with_question() {
        let cards = sample_cards();
        assert_ne!(fingerprint("a", &cards), fingerprint("b", &cards));
    }

    #[test]
    fn test_fingerprint_ignores_positions() {
        let cards = sample_cards();
        let mut moved = cards.clone();
        moved[0].position = "현재";
        assert_eq!(fingerprint("q", &cards), fingerprint("q", &moved));
    }
}
