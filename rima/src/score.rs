use crate::constants::{
    SCORE_BASE, SCORE_LENGTH_DIVISOR, SCORE_MAX, SCORE_MIN, SCORE_MIRROR_BONUS,
    SCORE_MISMATCH_PENALTY,
};
use crate::emotion::{EmotionLabel, tag};
use crate::sentiment::Sentiment;

// Heuristic usefulness of a (user message, bot reply) pair. The length term is
// a completeness proxy, not a quality measure. The penalty is asymmetric on
// purpose: only joy answered with negativity is punished.
pub fn usefulness(user_message: &str, bot_message: &str, sentiment: &impl Sentiment) -> f32 {
    let user_tag = tag(user_message, sentiment);
    let bot_tag = tag(bot_message, sentiment);

    let mut score = SCORE_BASE + bot_message.chars().count() as f32 / SCORE_LENGTH_DIVISOR;
    if user_tag.primary() == bot_tag.primary() {
        score += SCORE_MIRROR_BONUS;
    }
    if user_tag.primary() == EmotionLabel::Joy && bot_tag.polarity < 0.0 {
        score -= SCORE_MISMATCH_PENALTY;
    }
    score.clamp(SCORE_MIN, SCORE_MAX)
}
