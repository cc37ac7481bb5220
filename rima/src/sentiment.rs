// Sentiment scoring is an external collaborator. The built-in Lexicon is a
// crude word-list stand-in; anything implementing the trait can replace it
// without touching the tagger or the scorer.
pub trait Sentiment {
    // Signed polarity in [-1, 1].
    fn polarity(&self, text: &str) -> f32;
}

const POSITIVE_WORDS: &[&str] = &[
    "хорошо", "классно", "супер", "люблю", "рада", "рад", "спасибо", "ура", "отлично",
    "счастлив", "прекрасно",
];

const NEGATIVE_WORDS: &[&str] = &[
    "плохо", "бесит", "ненавижу", "злюсь", "грустно", "ужасно", "достало", "печально",
    "раздражает", "тоска",
];

pub struct Lexicon;

impl Sentiment for Lexicon {
    fn polarity(&self, text: &str) -> f32 {
        let lowered = text.to_lowercase();
        let hits = |words: &[&str]| {
            words.iter().filter(|w| lowered.contains(*w)).count() as f32
        };
        ((hits(POSITIVE_WORDS) - hits(NEGATIVE_WORDS)) * 0.4).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_text_scores_positive() {
        assert!(Lexicon.polarity("спасибо, всё отлично!") > 0.0);
    }

    #[test]
    fn test_negative_text_scores_negative() {
        assert!(Lexicon.polarity("всё плохо, меня это бесит") < 0.0);
    }

    #[test]
    fn test_neutral_text_scores_zero() {
        assert_eq!(Lexicon.polarity("расскажи о себе"), 0.0);
    }

    #[test]
    fn test_polarity_is_bounded() {
        let pile = POSITIVE_WORDS.join(" ");
        assert!(Lexicon.polarity(&pile) <= 1.0);
        let pile = NEGATIVE_WORDS.join(" ");
        assert!(Lexicon.polarity(&pile) >= -1.0);
    }
}
