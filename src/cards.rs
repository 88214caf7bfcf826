//! The 22 major arcana and their flavor table.

use serde::{Deserialize, Serialize};

/// A major arcana card. The discriminant is the card's index in the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Card {
    Fool = 0,
    Magician,
    HighPriestess,
    Empress,
    Emperor,
    Hierophant,
    Lovers,
    Chariot,
    Strength,
    Hermit,
    WheelOfFortune,
    Justice,
    HangedMan,
    Death,
    Temperance,
    Devil,
    Tower,
    Star,
    Moon,
    Sun,
    Judgement,
    World,
}

/// Static data attached to each card.
#[derive(Debug, Clone, Copy)]
pub struct CardInfo {
    pub korean: &'static str,
    pub english: &'static str,
    pub glyph: &'static str,
    /// Symbolic tone handed to the model as a writing hint.
    pub flavor: &'static str,
}

impl Card {
    /// Every card, in deck order.
    pub const ALL: [Card; 22] = [
        Card::Fool,
        Card::Magician,
        Card::HighPriestess,
        Card::Empress,
        Card::Emperor,
        Card::Hierophant,
        Card::Lovers,
        Card::Chariot,
        Card::Strength,
        Card::Hermit,
        Card::WheelOfFortune,
        Card::Justice,
        Card::HangedMan,
        Card::Death,
        Card::Temperance,
        Card::Devil,
        Card::Tower,
        Card::Star,
        Card::Moon,
        Card::Sun,
        Card::Judgement,
        Card::World,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Card> {
        Self::ALL.get(index).copied()
    }

    pub fn info(self) -> CardInfo {
        let (korean, english, glyph, flavor) = match self {
            Card::Fool => (
                "바보",
                "The Fool",
                "✧",
                "새 출발의 바람, 가벼운 발걸음, 실수도 축복으로 바꾸는 톤",
            ),
            Card::Magician => (
                "마법사",
                "The Magician",
                "∞",
                "의지와 집중, 손끝의 불꽃, ‘할 수 있다’는 조용한 확신의 톤",
            ),
            Card::HighPriestess => (
                "고위 여사제",
                "The High Priestess",
                "☽",
                "달빛과 직감, 말보다 침묵, 비밀스런 안내자의 톤",
            ),
            Card::Empress => (
                "여황제",
                "The Empress",
                "♀",
                "포근함과 성장, 향기와 풍요, 안아주는 엄마 같은 톤",
            ),
            Card::Emperor => (
                "황제",
                "The Emperor",
                "♂",
                "구조와 경계, 책임과 결단, 단단한 바위 같은 톤(차갑지 않게)",
            ),
            Card::Hierophant => (
                "교황",
                "The Hierophant",
                "✠",
                "의미와 배움, 전통과 약속, ‘너는 혼자가 아니다’ 같은 톤",
            ),
            Card::Lovers => (
                "연인",
                "The Lovers",
                "♡",
                "마음의 선택, 끌림과 약속, 두 사람 사이의 숨결 같은 톤",
            ),
            Card::Chariot => (
                "전차",
                "The Chariot",
                "⚔",
                "전진의 리듬, 의지와 승부, 북소리처럼 끌고 가는 톤",
            ),
            Card::Strength => (
                "힘",
                "Strength",
                "♌",
                "부드러운 용기, 야수의 숨을 달래는 톤, 다정하지만 강한 톤",
            ),
            Card::Hermit => (
                "은둔자",
                "The Hermit",
                "✵",
                "등불 하나, 느린 걸음, 나에게 돌아오는 톤",
            ),
            Card::WheelOfFortune => (
                "운명의 수레바퀴",
                "Wheel of Fortune",
                "☸",
                "순환과 반전, 흐름의 전환, ‘때가 바뀐다’는 톤",
            ),
            Card::Justice => (
                "정의",
                "Justice",
                "⚖",
                "균형과 정직, 가벼운 심판이 아닌 공정한 시선의 톤",
            ),
            Card::HangedMan => (
                "매달린 사람",
                "The Hanged Man",
                "⚓",
                "멈춤과 관점 전환, 내려놓음, 기다림의 톤",
            ),
            Card::Death => (
                "죽음",
                "Death",
                "☠",
                "끝과 시작, 낡은 껍질의 탈피, 무섭지 않게 따뜻한 톤",
            ),
            Card::Temperance => (
                "절제",
                "Temperance",
                "⚗",
                "혼합과 치유, 온도 조절, 숨 고르는 톤",
            ),
            Card::Devil => (
                "악마",
                "The Devil",
                "⛧",
                "집착과 유혹, 사슬의 자각, 비난 없이 다정히 풀어주는 톤",
            ),
            Card::Tower => (
                "탑",
                "The Tower",
                "⚡",
                "갑작스런 깨짐, 진실의 번개, ‘무너져도 너는 남는다’ 톤",
            ),
            Card::Star => (
                "별",
                "The Star",
                "★",
                "희망과 회복, 밤하늘의 약속, 반짝임이 스미는 톤",
            ),
            Card::Moon => (
                "달",
                "The Moon",
                "☾",
                "불안과 환영, 안개와 꿈, ‘두려움도 길의 일부’ 톤",
            ),
            Card::Sun => (
                "태양",
                "The Sun",
                "☀",
                "따뜻한 확신, 밝은 생기, 애정 어린 축복의 톤",
            ),
            Card::Judgement => (
                "심판",
                "Judgement",
                "♆",
                "각성의 부름, 다시 시작, ‘이제 너의 이름을 불러’ 톤",
            ),
            Card::World => (
                "세계",
                "The World",
                "♁",
                "완성과 귀환, 한 바퀴의 끝, ‘너는 해냈다’ 톤",
            ),
        };
        CardInfo {
            korean,
            english,
            glyph,
            flavor,
        }
    }

    /// Name as shown to the user and fed to the fingerprint, e.g. `0. 바보 (The Fool)`.
    pub fn display_name(self) -> String {
        let info = self.info();
        format!("{}. {} ({})", self.index(), info.korean, info.english)
    }
}

/// Whether a drawn card faces up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Upright,
    Reversed,
}

impl Orientation {
    pub fn from_reversed(reversed: bool) -> Self {
        if reversed {
            Self::Reversed
        } else {
            Self::Upright
        }
    }

    /// Stable key used in fingerprints.
    pub fn as_key(self) -> &'static str {
        match self {
            Self::Upright => "upright",
            Self::Reversed => "reversed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Upright => "정방향",
            Self::Reversed => "역방향",
        }
    }
}

/// Card flavor with the orientation's reading direction appended.
pub fn flavor_text(card: Card, orientation: Orientation) -> String {
    let base = card.info().flavor;
    match orientation {
        Orientation::Reversed => {
            format!("{base} + 역방향: 내면의 막힘/지연/오해를 부드럽게 풀어주는 결")
        }
        Orientation::Upright => format!("{base} + 정방향: 흐름이 열리는 쪽으로 자연스럽게 확장"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_deck_has_22_cards_in_index_order() {
        assert_eq!(Card::ALL.len(), 22);
        for (i, card) in Card::ALL.iter().enumerate() {
            assert_eq!(card.index(), i);
        }
    }

    #[test]
    fn test_from_index_bounds() {
        assert_eq!(Card::from_index(0), Some(Card::Fool));
        assert_eq!(Card::from_index(21), Some(Card::World));
        assert_eq!(Card::from_index(22), None);
    }

    #[test]
    fn test_display_name_format() {
        assert_eq!(Card::Fool.display_name(), "0. 바보 (The Fool)");
        assert_eq!(
            Card::WheelOfFortune.display_name(),
            "10. 운명의 수레바퀴 (Wheel of Fortune)"
        );
        assert_eq!(Card::World.display_name(), "21. 세계 (The World)");
    }

    #[test]
    fn test_every_card_has_distinct_name_and_flavor() {
        let names: HashSet<_> = Card::ALL.iter().map(|c| c.info().korean).collect();
        let flavors: HashSet<_> = Card::ALL.iter().map(|c| c.info().flavor).collect();
        assert_eq!(names.len(), 22);
        assert_eq!(flavors.len(), 22);
        assert!(Card::ALL.iter().all(|c| !c.info().glyph.is_empty()));
    }

    #[test]
    fn test_orientation_keys_and_labels() {
        assert_eq!(Orientation::Upright.as_key(), "upright");
        assert_eq!(Orientation::Reversed.as_key(), "reversed");
        assert_eq!(Orientation::Upright.label(), "정방향");
        assert_eq!(Orientation::Reversed.label(), "역방향");
        assert_eq!(Orientation::from_reversed(true), Orientation::Reversed);
    }

    #[test]
    fn test_flavor_text_appends_orientation() {
        let upright = flavor_text(Card::Star, Orientation::Upright);
        assert!(upright.starts_with("희망과 회복"));
        assert!(upright.ends_with("정방향: 흐름이 열리는 쪽으로 자연스럽게 확장"));

        let reversed = flavor_text(Card::Star, Orientation::Reversed);
        assert!(reversed.contains("+ 역방향: "));
    }
}
