//! Card drawing: sampling without replacement, positions, orientations.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cards::{Card, Orientation};

/// Layout of a reading.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Spread {
    /// Past, present, future.
    #[default]
    Three,
    /// Situation, obstacle, hidden influence, advice, outcome.
    Five,
}

const THREE_POSITIONS: [&str; 3] = ["과거", "현재", "미래"];
const FIVE_POSITIONS: [&str; 5] = ["현재", "장애물", "숨은 영향", "조언", "흐름의 끝"];

const THREE_GLYPHS: [&str; 3] = ["☾", "☀︎", "⭐︎"];
const FIVE_GLYPHS: [&str; 5] = ["☾", "☀︎", "⭐︎", "✧", "♁"];

impl Spread {
    pub fn card_count(self) -> usize {
        self.positions().len()
    }

    /// Position labels, one per drawn card, in draw order.
    pub fn positions(self) -> &'static [&'static str] {
        match self {
            Spread::Three => &THREE_POSITIONS,
            Spread::Five => &FIVE_POSITIONS,
        }
    }

    /// Decorative glyph per slot, used by the renderers.
    pub fn slot_glyphs(self) -> &'static [&'static str] {
        match self {
            Spread::Three => &THREE_GLYPHS,
            Spread::Five => &FIVE_GLYPHS,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Spread::Three => Spread::Five,
            Spread::Five => Spread::Three,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Spread::Three => "세 장",
            Spread::Five => "다섯 장",
        }
    }
}

/// A card placed in a spread position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawnCard {
    pub card: Card,
    pub position: &'static str,
    pub orientation: Orientation,
}

impl DrawnCard {
    pub fn new(card: Card, position: &'static str, orientation: Orientation) -> Self {
        Self {
            card,
            position,
            orientation,
        }
    }
}

/// Draw distinct cards for `spread`, each with a fair-coin orientation.
pub fn draw<R: Rng + ?Sized>(rng: &mut R, spread: Spread) -> Vec<DrawnCard> {
    let positions = spread.positions();
    debug_assert!(positions.len() <= Card::ALL.len());

    let picks = rand::seq::index::sample(rng, Card::ALL.len(), spread.card_count());
    picks
        .into_iter()
        .zip(positions.iter().copied())
        .map(|(index, position)| {
            let orientation = Orientation::from_reversed(rng.random_bool(0.5));
            DrawnCard::new(Card::ALL[index], position, orientation)
        })
        .collect()
}
