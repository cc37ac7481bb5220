use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::sentiment::Sentiment;

// The enumeration order is a policy, not an accident: when a message matches
// several emotions, the primary label is the first matching one in this order.
// Keep it stable so scoring and logged records stay reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Anger,
    Joy,
    Sadness,
    Neutral,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 4] = [
        EmotionLabel::Anger,
        EmotionLabel::Joy,
        EmotionLabel::Sadness,
        EmotionLabel::Neutral,
    ];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            EmotionLabel::Anger => &["бесит", "злюсь", "ненавижу", "достало", "раздражает"],
            EmotionLabel::Joy => &["рада", "рад", "счастлив", "классно", "супер", "ура"],
            EmotionLabel::Sadness => &["грустно", "печально", "плачу", "тоска", "одиноко"],
            EmotionLabel::Neutral => &[],
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmotionLabel::Anger => write!(f, "anger"),
            EmotionLabel::Joy => write!(f, "joy"),
            EmotionLabel::Sadness => write!(f, "sadness"),
            EmotionLabel::Neutral => write!(f, "neutral"),
        }
    }
}

impl ToSql for EmotionLabel {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.to_string().into())
    }
}

impl FromSql for EmotionLabel {
    fn column_result(value: ValueRef) -> FromSqlResult<Self> {
        match value.as_str()? {
            "anger" => Ok(EmotionLabel::Anger),
            "joy" => Ok(EmotionLabel::Joy),
            "sadness" => Ok(EmotionLabel::Sadness),
            "neutral" => Ok(EmotionLabel::Neutral),
            _ => Err(FromSqlError::Other("Invalid EmotionLabel value".into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmotionTag {
    pub polarity: f32,
    // Non-empty; [Neutral] when nothing matched.
    pub labels: Vec<EmotionLabel>,
}

impl EmotionTag {
    pub fn primary(&self) -> EmotionLabel {
        self.labels[0]
    }
}

// Keyword containment over the lower-cased text, one pass per emotion in
// enumeration order. Polarity comes from the sentiment collaborator.
pub fn tag(text: &str, sentiment: &impl Sentiment) -> EmotionTag {
    let lowered = text.to_lowercase();
    let mut labels: Vec<EmotionLabel> = EmotionLabel::ALL
        .into_iter()
        .filter(|label| label.keywords().iter().any(|kw| lowered.contains(kw)))
        .collect();
    if labels.is_empty() {
        labels.push(EmotionLabel::Neutral);
    }
    EmotionTag {
        polarity: sentiment.polarity(text),
        labels,
    }
}
