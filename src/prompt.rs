//! Prompt templates and composition for the reading request.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::cards::flavor_text;
use crate::classifier::Classification;
use crate::draw::DrawnCard;

/// Persona and formatting rules sent as the system message.
pub const SYSTEM_PROMPT: &str = r#"너는 ‘미스틱 타로 마스터’다.
말투는 다정하고 신비로우며, 상대를 가르치지 않고 곁에 머문다.

규칙:
- 정/역방향을 해석에 반드시 반영한다.
- 미래를 100% 확정하지 않는다. (가능성, 징조, 흐름)
- 공포 조장 금지.
- “~해야 한다” 같은 명령형 조언 금지.
- 번호, 불릿, 목록, 리포트형 소제목 금지.
- 줄바꿈은 허용하되 ‘자연스러운 문단’으로만 구성한다.
- 문단 흐름은: 오프닝 1문단 → 카드 흐름 2~3문단 → 마무리 1문단
- 전체 길이는 1100~1700자 정도로 충분히 길게. (짧게 끝내지 말 것)
- 달빛, 별, 안개, 문, 길, 숨결, 파도, 바람 같은 이미지를 자연스럽게 섞어라.
- 오프닝은 절대 똑같이 반복하지 말 것
- 특히 다음 문구/패턴 금지:
  "달빛이 부드럽게 내리쬐는 이 밤", "이 밤", "달빛 아래" 로 시작하는 고정 오프닝
- 마지막 문단은 ‘힘이 나는 위로와 축복’으로 마무리해라."#;

/// Opening directives; one is picked at random per request so readings don't
/// all start the same way.
pub const OPENING_STYLES: [&str; 12] = [
    "오프닝은 ‘문을 여는’ 느낌으로 시작해라. (예: 문턱, 문장, 열쇠, 문이 열리는 소리)",
    "오프닝은 ‘숨’으로 시작해라. (예: 숨결, 한숨, 고요, 가슴의 파도)",
    "오프닝은 ‘길’로 시작해라. (예: 갈림길, 발자국, 지도 없는 길)",
    "오프닝은 ‘별/하늘’로 시작해라. 단, ‘달빛이 내리쬔다’ 금지.",
    "오프닝은 ‘바람’으로 시작해라. (예: 바람이 스친다, 바람결이 말한다)",
    "오프닝은 ‘물’로 시작해라. (예: 파도, 물결, 잔잔한 수면, 빗방울)",
    "오프닝은 ‘불꽃/촛불’로 시작해라. (예: 작은 불, 심지, 따뜻한 빛)",
    "오프닝은 ‘안개’로 시작해라. 단, 밤/달/별 언급 없이도 성립하게.",
    "오프닝은 ‘거울’로 시작해라. (예: 비추다, 반사, 내 얼굴의 다른 표정)",
    "오프닝은 ‘종소리/울림’으로 시작해라. (예: 울림, 진동, 맥박)",
    "오프닝은 ‘손’으로 시작해라. (예: 손끝, 쥔 것, 놓는 것)",
    "오프닝은 ‘지금-여기’로 시작해라. 단, 시간대(밤) 단정 금지.",
];

/// Flow description for the closing request, keyed by spread size.
fn card_flow(card_count: usize) -> &'static str {
    if card_count == 5 {
        "현재→장애물→숨은 영향→조언→흐름의 끝"
    } else {
        "과거→현재→미래"
    }
}

/// The two messages sent to the generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPayload {
    pub system: &'static str,
    pub user: String,
}

pub fn choose_opening<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    OPENING_STYLES
        .choose(rng)
        .copied()
        .unwrap_or(OPENING_STYLES[0])
}

/// One hint line per card: `과거 카드 힌트: 0. 바보 (The Fool) (정방향) → ...`.
pub fn card_hint_line(card: &DrawnCard) -> String {
    format!(
        "{} 카드 힌트: {} ({}) → {}",
        card.position,
        card.card.display_name(),
        card.orientation.label(),
        flavor_text(card.card, card.orientation)
    )
}

/// Build the request. Deterministic for a given opening directive.
pub fn compose(
    classification: &Classification,
    cards: &[DrawnCard],
    opening: &str,
    question: &str,
) -> PromptPayload {
    let hints = cards
        .iter()
        .map(card_hint_line)
        .collect::<Vec<_>>()
        .join("\n");

    let user = format!(
        r#"[오늘의 질문 테마]
- 테마: {theme}
- 목소리: {voice}
- 주의: {caution}

[오프닝 시작 스타일 지시]
{opening}

[질문]
{question}

[카드 힌트(문체/상징/온도)]
{hints}

요청:
- 오프닝 문단에서 분위기를 잡고(신비롭게), 카드 흐름 문단에서 자연스럽게 {flow}의 결을 이어가고, 마지막 문단에서 따뜻하게 힘이 나도록 끝내라.
- 번호/불릿/리포트 금지. 문단(줄바꿈)만 허용.
- 단정하지 말고 ‘흐름’으로 말해라."#,
        theme = classification.theme.label(),
        voice = classification.voice,
        caution = classification.caution,
        flow = card_flow(cards.len()),
    );

    PromptPayload {
        system: SYSTEM_PROMPT,
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, Orientation};
    use crate::classifier::{Theme, classify};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn three_cards() -> Vec<DrawnCard> {
        vec![
            DrawnCard::new(Card::Moon, "과거", Orientation::Reversed),
            DrawnCard::new(Card::Strength, "현재", Orientation::Upright),
            DrawnCard::new(Card::Sun, "미래", Orientation::Upright),
        ]
    }

    #[test]
    fn test_card_hint_line_format() {
        let line = card_hint_line(&three_cards()[0]);
        assert!(line.starts_with("과거 카드 힌트: 18. 달 (The Moon) (역방향) → "));
        assert!(line.ends_with("내면의 막힘/지연/오해를 부드럽게 풀어주는 결"));
    }

    #[test]
    fn test_compose_contains_all_sections() {
        let question = "요즘 너무 불안해요";
        let payload = compose(&classify(question), &three_cards(), OPENING_STYLES[2], question);

        assert_eq!(payload.system, SYSTEM_PROMPT);
        for section in [
            "[오늘의 질문 테마]",
            "[오프닝 시작 스타일 지시]",
            "[질문]",
            "[카드 힌트(문체/상징/온도)]",
            "요청:",
        ] {
            assert!(payload.user.contains(section), "missing {section}");
        }
        assert!(payload.user.contains("- 테마: 불안/흔들림"));
        assert!(payload.user.contains(Theme::Anxiety.voice()));
        assert!(payload.user.contains(OPENING_STYLES[2]));
        assert!(payload.user.contains("과거→현재→미래"));
    }

    #[test]
    fn test_compose_includes_question_verbatim() {
        let question = "  이직,  해도 될까?  ";
        let payload = compose(&classify(question), &three_cards(), OPENING_STYLES[0], question);
        assert!(payload.user.contains(&format!("[질문]\n{question}\n")));
    }

    #[test]
    fn test_compose_one_hint_line_per_card() {
        let payload = compose(&classify("q"), &three_cards(), OPENING_STYLES[0], "q");
        assert_eq!(payload.user.matches(" 카드 힌트: ").count(), 3);
    }

    #[test]
    fn test_compose_five_card_flow() {
        let cards = vec![
            DrawnCard::new(Card::Fool, "현재", Orientation::Upright),
            DrawnCard::new(Card::Tower, "장애물", Orientation::Upright),
            DrawnCard::new(Card::Devil, "숨은 영향", Orientation::Reversed),
            DrawnCard::new(Card::Temperance, "조언", Orientation::Upright),
            DrawnCard::new(Card::World, "흐름의 끝", Orientation::Upright),
        ];
        let payload = compose(&classify("q"), &cards, OPENING_STYLES[0], "q");
        assert_eq!(payload.user.matches(" 카드 힌트: ").count(), 5);
        assert!(payload.user.contains("현재→장애물→숨은 영향→조언→흐름의 끝"));
    }

    #[test]
    fn test_compose_is_deterministic_for_fixed_opening() {
        let cards = three_cards();
        let c = classify("사랑");
        assert_eq!(
            compose(&c, &cards, OPENING_STYLES[5], "사랑"),
            compose(&c, &cards, OPENING_STYLES[5], "사랑")
        );
    }

    #[test]
    fn test_choose_opening_comes_from_catalog() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            assert!(OPENING_STYLES.contains(&choose_opening(&mut rng)));
        }
    }

    #[test]
    fn test_choose_opening_varies() {
        let mut rng = StdRng::seed_from_u64(11);
        let picks: std::collections::HashSet<_> =
            (0..100).map(|_| choose_opening(&mut rng)).collect();
        assert!(picks.len() > 1);
    }
}
