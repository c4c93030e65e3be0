// ============================================================
// Layer 3 — Story Outcomes and Fallbacks
// ============================================================
// The serving layer never intercepts errors to decide what text
// to show. Generation produces a GenerationOutcome, and
// `select_story` maps every variant to the text a user sees.
//
//   Generated(text) → the cleaned model output   (method "gan")
//   ModelAbsent     → one of the FALLBACK_STORIES (method "fallback")
//   TooShort        → SHORT_OUTPUT_FALLBACK      (method "fallback")
//   Failed(reason)  → ERROR_FALLBACK             (method "fallback")

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::vocabulary::RESERVED_TOKENS;

/// Cleaned stories shorter than this (in characters) are not served.
pub const MIN_STORY_CHARS: usize = 10;

pub const DEFAULT_TEMPERATURE: f64 = 0.8;
pub const MIN_TEMPERATURE: f64 = 0.1;
pub const MAX_TEMPERATURE: f64 = 2.0;

/// Shown when no trained model is available.
pub const FALLBACK_STORIES: [&str; 5] = [
    "小明今天去学校。他很喜欢学习中文。老师教他很多新的汉字。今天是美好的一天。",
    "昨天下雨了。小红在家里看书。她喜欢读有趣的故事。妈妈给她做了热茶。",
    "爸爸妈妈去超市买菜。他们买了很多新鲜的水果和蔬菜。晚上全家一起吃饭。",
    "我的朋友来我家玩。我们一起看电影，吃好吃的零食。度过了愉快的时光。",
    "春天来了。花儿开了，树叶绿了。公园里有很多人在散步。空气很清新。",
];

/// Shown when the model produced too little text.
pub const SHORT_OUTPUT_FALLBACK: &str =
    "今天天气很好。小明和朋友们一起去公园玩。他们看到了很多美丽的花朵和绿色的树木。大家都很开心。";

/// Shown when generation failed outright.
pub const ERROR_FALLBACK: &str =
    "从前有一个小村庄，住着一个善良的女孩。她每天都帮助村里的人们。有一天，她发现了一朵神奇的花。";

/// Result of asking the model for a story.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// Cleaned, long enough text from the generator.
    Generated(String),
    /// No checkpoint was loaded.
    ModelAbsent,
    /// The generator ran but its cleaned output was below MIN_STORY_CHARS.
    TooShort,
    /// Generation raised an error.
    Failed(String),
}

impl GenerationOutcome {
    /// Classify raw generator output.
    pub fn from_raw(raw: &str) -> Self {
        let story = clean_story(raw);
        if story.chars().count() < MIN_STORY_CHARS {
            Self::TooShort
        } else {
            Self::Generated(story)
        }
    }

    pub fn model_available(&self) -> bool {
        !matches!(self, Self::ModelAbsent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryMethod {
    Gan,
    Fallback,
}

/// The text actually served, and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryResponse {
    pub story: String,
    pub method: StoryMethod,
    pub temperature: f64,
    pub model_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Map an outcome to the story shown to the user.
///
/// Only the ModelAbsent branch consumes randomness.
pub fn select_story<R: Rng + ?Sized>(
    outcome: GenerationOutcome,
    temperature: f64,
    rng: &mut R,
) -> StoryResponse {
    let model_available = outcome.model_available();
    let (story, method, error) = match outcome {
        GenerationOutcome::Generated(text) => (text, StoryMethod::Gan, None),
        GenerationOutcome::ModelAbsent => {
            let pick = FALLBACK_STORIES[rng.gen_range(0..FALLBACK_STORIES.len())];
            (
                pick.to_string(),
                StoryMethod::Fallback,
                Some("Model not available. Please train the model first.".to_string()),
            )
        }
        GenerationOutcome::TooShort => {
            (SHORT_OUTPUT_FALLBACK.to_string(), StoryMethod::Fallback, None)
        }
        GenerationOutcome::Failed(reason) => {
            (ERROR_FALLBACK.to_string(), StoryMethod::Fallback, Some(reason))
        }
    };

    StoryResponse { story, method, temperature, model_available, error }
}

/// Strip the marker tokens and surrounding whitespace.
pub fn clean_story(raw: &str) -> String {
    RESERVED_TOKENS
        .iter()
        .fold(raw.to_string(), |text, marker| text.replace(marker, ""))
        .trim()
        .to_string()
}

/// Clamp a requested temperature into the served range.
/// NaN falls back to the default.
pub fn clamp_temperature(requested: f64) -> f64 {
    if requested.is_nan() {
        return DEFAULT_TEMPERATURE;
    }
    requested.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_clean_story_removes_markers() {
        assert_eq!(clean_story("<s>小猫<UNK>很可爱</s><PAD><PAD> "), "小猫很可爱");
    }

    #[test]
    fn test_short_output_is_flagged() {
        assert_eq!(GenerationOutcome::from_raw("小猫</s>"), GenerationOutcome::TooShort);
        let long = "春天来了。花儿开了，树叶绿了。</s>";
        assert_eq!(
            GenerationOutcome::from_raw(long),
            GenerationOutcome::Generated("春天来了。花儿开了，树叶绿了。".to_string())
        );
    }

    #[test]
    fn test_select_story_generated() {
        let mut rng = StdRng::seed_from_u64(1);
        let r = select_story(GenerationOutcome::Generated("故事".into()), 0.8, &mut rng);
        assert_eq!(r.story, "故事");
        assert_eq!(r.method, StoryMethod::Gan);
        assert!(r.model_available);
        assert!(r.error.is_none());
    }

    #[test]
    fn test_select_story_absent_uses_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        let r = select_story(GenerationOutcome::ModelAbsent, 0.5, &mut rng);
        assert!(FALLBACK_STORIES.contains(&r.story.as_str()));
        assert_eq!(r.method, StoryMethod::Fallback);
        assert!(!r.model_available);
        assert!(r.error.is_some());
    }

    #[test]
    fn test_select_story_too_short_and_failed() {
        let mut rng = StdRng::seed_from_u64(0);
        let short = select_story(GenerationOutcome::TooShort, 1.0, &mut rng);
        assert_eq!(short.story, SHORT_OUTPUT_FALLBACK);
        assert!(short.model_available);

        let failed = select_story(GenerationOutcome::Failed("boom".into()), 1.0, &mut rng);
        assert_eq!(failed.story, ERROR_FALLBACK);
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_clamp_temperature() {
        assert_eq!(clamp_temperature(0.0), MIN_TEMPERATURE);
        assert_eq!(clamp_temperature(5.0), MAX_TEMPERATURE);
        assert_eq!(clamp_temperature(0.8), 0.8);
        assert_eq!(clamp_temperature(f64::NAN), DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_response_json_shape() {
        let mut rng = StdRng::seed_from_u64(0);
        let r = select_story(GenerationOutcome::Generated("好故事".into()), 0.8, &mut rng);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["method"], "gan");
        assert!(json.get("error").is_none());
    }
}
