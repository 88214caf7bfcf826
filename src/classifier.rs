//! Question theme classification by keyword hits.
//!
//! Each theme owns a static keyword list. A question scores one point per
//! keyword it contains (after lowercasing); the highest score wins, ties go to
//! the theme listed first in [`PRIORITY`], and a question with no hits at all
//! falls back to [`Theme::General`].

use serde::Serialize;

/// Emotional theme of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Theme {
    Anxiety,
    Relationship,
    Work,
    SelfWorth,
    General,
}

/// Themes that can be matched by keywords, highest priority first.
pub const PRIORITY: [Theme; 4] = [
    Theme::Anxiety,
    Theme::Relationship,
    Theme::Work,
    Theme::SelfWorth,
];

const ANXIETY_KEYWORDS: &[&str] = &[
    "불안", "무서", "두려", "걱정", "초조", "공황", "우울", "지겹", "힘들", "괴로", "멘탈", "불면",
    "스트레스",
];

const RELATIONSHIP_KEYWORDS: &[&str] = &[
    "연애", "사랑", "썸", "남친", "여친", "짝사랑", "헤어", "이별", "관계", "호감", "마음", "결혼",
];

const WORK_KEYWORDS: &[&str] = &[
    "직장",
    "회사",
    "퇴사",
    "이직",
    "승진",
    "면접",
    "상사",
    "동료",
    "프로젝트",
    "진로",
    "커리어",
    "시험",
    "취업",
];

const SELF_WORTH_KEYWORDS: &[&str] = &[
    "자존감",
    "자신감",
    "내가",
    "나는 왜",
    "무가치",
    "못하겠",
    "열등",
    "비교",
    "자책",
];

impl Theme {
    pub fn label(self) -> &'static str {
        match self {
            Theme::Anxiety => "불안/흔들림",
            Theme::Relationship => "연애/관계",
            Theme::Work => "일/진로",
            Theme::SelfWorth => "자존감/자기이해",
            Theme::General => "일반/삶의 흐름",
        }
    }

    /// Trigger keywords. The fallback theme has none.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Theme::Anxiety => ANXIETY_KEYWORDS,
            Theme::Relationship => RELATIONSHIP_KEYWORDS,
            Theme::Work => WORK_KEYWORDS,
            Theme::SelfWorth => SELF_WORTH_KEYWORDS,
            Theme::General => &[],
        }
    }

    /// How the reading should sound for this theme.
    pub fn voice(self) -> &'static str {
        match self {
            Theme::Anxiety => "더 부드럽게, 더 천천히, 안심시키며 동행하는 목소리",
            Theme::Relationship => {
                "따뜻하지만 달콤하게만 가지 말고, 마음의 선택을 다정히 비춰주는 목소리"
            }
            Theme::Work => "현실감은 품되 리포트처럼 말하지 말고, 용기를 북돋는 목소리",
            Theme::SelfWorth => "다정함을 10% 더 올려서, 자책을 녹이는 목소리",
            Theme::General => "신비 50, 다정 50의 기본 톤",
        }
    }

    /// What the reading must avoid for this theme.
    pub fn caution(self) -> &'static str {
        match self {
            Theme::Anxiety => "불안을 키우지 말고 낮춰라. ‘괜찮아’보다 ‘곁에 있어’ 쪽으로.",
            Theme::Relationship => "상대 단정 금지. 관계의 ‘흐름’과 ‘대화의 숨결’을 말해라.",
            Theme::Work => "지시형 조언 금지. ‘가능성’과 ‘기운’ 중심.",
            Theme::SelfWorth => "비난 금지. ‘너는 이미 충분하다’ 결로 마무리.",
            Theme::General => "짧게 끊지 말고 호흡 길게.",
        }
    }
}

/// Result of classifying a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub theme: Theme,
    pub voice: &'static str,
    pub caution: &'static str,
}

impl From<Theme> for Classification {
    fn from(theme: Theme) -> Self {
        Self {
            theme,
            voice: theme.voice(),
            caution: theme.caution(),
        }
    }
}

/// Number of distinct keywords of `theme` found in an already-lowercased text.
fn keyword_hits(lowered: &str, theme: Theme) -> usize {
    theme
        .keywords()
        .iter()
        .filter(|kw| lowered.contains(*kw))
        .count()
}

/// Classify a question. Total and deterministic: never fails, no randomness.
pub fn classify(question: &str) -> Classification {
    let lowered = question.to_lowercase();

    let mut best: Option<(Theme, usize)> = None;
    for theme in PRIORITY {
        let hits = keyword_hits(&lowered, theme);
        // Strictly greater, so an earlier theme keeps a tie.
        if hits > 0 && best.is_none_or(|(_, top)| hits > top) {
            best = Some((theme, hits));
        }
    }

    best.map(|(theme, _)| theme)
        .unwrap_or(Theme::General)
        .into()
}
