pub const ENV_FILE_NAME: &str = ".env";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const GENERATOR_API_KEY_VAR: &str = "GENERATOR_API_KEY";
pub const SPEECH_API_KEY_VAR: &str = "SPEECH_API_KEY";

// Number of past messages replayed into the prompt. The interaction log itself
// is append-only and never trimmed.
pub const HISTORY_MAX_MESSAGES: usize = 20;

// Up to this many user messages flagged as important are repeated in the
// system prompt so the persona "remembers" them.
pub const MAX_IMPORTANT_FACTS: usize = 5;

// Sampling temperature is base + sarcasm_level * spread.
pub const TEMPERATURE_BASE: f64 = 0.6;
pub const TEMPERATURE_SPREAD: f64 = 0.6;

// Usefulness scoring. Base plus a completeness proxy (reply length in
// characters divided by LENGTH_DIVISOR), a mirroring bonus when the reply
// matches the user's primary emotion, and a penalty when a joyful user gets a
// negative-polarity reply. Clamped to [SCORE_MIN, SCORE_MAX].
pub const SCORE_BASE: f32 = 0.5;
pub const SCORE_LENGTH_DIVISOR: f32 = 200.0;
pub const SCORE_MIRROR_BONUS: f32 = 0.3;
pub const SCORE_MISMATCH_PENALTY: f32 = 0.4;
pub const SCORE_MIN: f32 = 0.1;
pub const SCORE_MAX: f32 = 1.0;

// Bang-bang behavior adaptation: low scores reduce sarcasm, high scores raise
// empathy, the band in between changes nothing.
pub const ADAPT_LOW_SCORE: f32 = 0.5;
pub const ADAPT_HIGH_SCORE: f32 = 0.8;
pub const ADAPT_DELTA: f32 = 0.1;
pub const SARCASM_FLOOR: f32 = 0.1;

// Pattern keys are the first two tokens of the normalized message that are
// longer than this many characters.
pub const KEY_MIN_TOKEN_CHARS: usize = 3;
pub const KEY_TOKEN_COUNT: usize = 2;

pub const DEFAULT_GENERATOR_TIMEOUT: u64 = 20;
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const SPEECH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

pub const DEFAULT_USER_NAME: &str = "Друг";

// Returned when the generator fails. The user never sees a raw error.
pub const FALLBACK_PHRASES: [&str; 4] = [
    "Ой, я немного зависла... Повтори, пожалуйста? 😅",
    "Что-то связь барахлит, но я тут! Расскажи ещё раз?",
    "Прости, я отвлеклась на секунду. О чём мы говорили?",
    "Хм, мысль убежала... Давай ещё раз, я внимательно слушаю!",
];
