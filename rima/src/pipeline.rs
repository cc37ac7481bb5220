use rand::seq::IndexedRandom;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::behavior::BehaviorState;
use crate::config::Config;
use crate::constants::{DEFAULT_USER_NAME, FALLBACK_PHRASES};
use crate::emotion::{EmotionLabel, tag};
use crate::generator::Generator;
use crate::prompt::{build_prompt, mood_tail};
use crate::score::usefulness;
use crate::sentiment::Sentiment;
use crate::store::{InteractionRecord, Store};

const USER_NAME_KEY: &str = "user_name";
const NAME_PHRASE: &str = "меня зовут";
const REMEMBER_PHRASE: &str = "запомни";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Cached,
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub emotion: EmotionLabel,
    pub polarity: f32,
    pub source: ReplySource,
}

// Messages carrying a name or an explicit "remember" request are flagged
// important and repeated in future prompts.
fn is_important(lowered: &str) -> bool {
    lowered.contains(REMEMBER_PHRASE) || lowered.contains(NAME_PHRASE)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn detect_user_name(lowered: &str) -> Option<String> {
    let rest = &lowered[lowered.find(NAME_PHRASE)? + NAME_PHRASE.len()..];
    let name = rest
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_alphabetic());
    if name.is_empty() {
        None
    } else {
        Some(capitalize(name))
    }
}

// The per-message pipeline: tag → lookup-or-generate → score → learn → adapt
// → persist. Owns every collaborator; no step after the reply is obtained can
// fail the caller, storage problems only cost that turn's learning.
pub struct Pipeline<S: Sentiment> {
    config: Config,
    store: Store,
    generator: Generator,
    sentiment: S,
    behavior: BehaviorState,
}

impl<S: Sentiment> Pipeline<S> {
    pub fn new(config: Config, store: Store, generator: Generator, sentiment: S) -> Self {
        let behavior = match store.load_behavior() {
            Ok(state) => state,
            Err(e) => {
                warn!("failed to load behavior state, using defaults: {}", e);
                BehaviorState::default()
            }
        };
        Pipeline {
            config,
            store,
            generator,
            sentiment,
            behavior,
        }
    }

    pub fn behavior(&self) -> &BehaviorState {
        &self.behavior
    }

    // Slider inputs from the UI boundary.
    pub fn set_sarcasm(&mut self, value: f32) {
        self.behavior.set_sarcasm(value);
    }

    pub fn set_empathy(&mut self, value: f32) {
        self.behavior.set_empathy(value);
    }

    pub fn respond(&mut self, message: &str) -> Reply {
        let lowered = message.to_lowercase();

        if let Some(name) = detect_user_name(&lowered) {
            if let Err(e) = self.store.set_profile_value(USER_NAME_KEY, &name) {
                warn!("failed to save user name: {}", e);
            }
        }

        let emotion_tag = tag(message, &self.sentiment);
        let primary = emotion_tag.primary();

        let (text, source) = match self.store.lookup(message) {
            Some(pattern) => {
                debug!(
                    "pattern cache hit: {} (usefulness {:.2})",
                    pattern.pattern_key, pattern.usefulness
                );
                (pattern.response_text.clone(), ReplySource::Cached)
            }
            None => self.generate_reply(message, primary),
        };

        let score = usefulness(message, &text, &self.sentiment);
        if let Err(e) = self.store.learn(message, &text, score) {
            warn!("learning skipped for this turn: {}", e);
        }
        self.behavior.adapt(score);

        let record = InteractionRecord {
            user_text: message.to_string(),
            bot_text: text.clone(),
            timestamp: OffsetDateTime::now_utc(),
            polarity: emotion_tag.polarity,
            emotion: primary,
            is_important: is_important(&lowered),
        };
        if let Err(e) = self.store.log_interaction(&record) {
            warn!("interaction not persisted: {}", e);
        }
        if let Err(e) = self.store.save_behavior(&self.behavior) {
            warn!("behavior state not persisted: {}", e);
        }

        Reply {
            text,
            emotion: primary,
            polarity: emotion_tag.polarity,
            source,
        }
    }

    // Cache miss: build an emotion-biased prompt and ask the generator. Any
    // GenerationError degrades to a fallback phrase, never to an error.
    fn generate_reply(&self, message: &str, primary: EmotionLabel) -> (String, ReplySource) {
        let trigger = self.config.find_trigger(message);
        let user_name = match self.store.profile_value(USER_NAME_KEY) {
            Ok(name) => name.unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
            Err(e) => {
                warn!("failed to read profile: {}", e);
                DEFAULT_USER_NAME.to_string()
            }
        };
        let facts = self.store.important_facts().unwrap_or_else(|e| {
            warn!("failed to read important facts: {}", e);
            Vec::new()
        });

        let prompt = build_prompt(
            message,
            &self.config.persona,
            &self.behavior,
            &user_name,
            primary,
            trigger.map(|t| t.template.as_str()),
            &facts,
            self.store.recent_history(),
        );

        match self.generator.generate(&prompt, self.behavior.temperature()) {
            Ok(mut text) => {
                if let Some(tail) = mood_tail(primary, &self.behavior) {
                    text.push_str(tail);
                }
                (text, ReplySource::Generated)
            }
            Err(e) => {
                warn!("generation failed, using fallback: {}", e);
                let phrase = FALLBACK_PHRASES
                    .choose(&mut rand::rng())
                    .unwrap_or(&FALLBACK_PHRASES[0]);
                (phrase.to_string(), ReplySource::Fallback)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeneratorConfig, Persona};
    use crate::sentiment::Lexicon;
    use mockito::{Server, ServerGuard};
    use tempfile::tempdir;

    fn test_config(endpoint: String) -> Config {
        Config {
            generator: GeneratorConfig {
                model: "test-model".to_string(),
                endpoint,
                api_key: "test-key".to_string(),
                timeout: 5,
                max_tokens: 300,
            },
            persona: Persona {
                name: "Рима".to_string(),
                style: "цифровая подруга".to_string(),
                likes: "музыку".to_string(),
            },
            speech: None,
            triggers: vec![crate::config::EmotionalTrigger {
                emotion: EmotionLabel::Anger,
                contains: "бесит".to_string(),
                template: "Собеседника что-то бесит, выясни, что случилось.".to_string(),
            }],
        }
    }

    fn setup(server: &ServerGuard) -> (tempfile::TempDir, Pipeline<Lexicon>) {
        let dir = tempdir().unwrap();
        let config = test_config(format!("{}/v1/chat/completions", server.url()));
        let store = Store::open(dir.path()).unwrap();
        let generator = Generator::new(config.generator.clone());
        (dir, Pipeline::new(config, store, generator, Lexicon))
    }

    fn mock_generation(server: &mut ServerGuard, reply: &str) -> mockito::Mock {
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "choices": [{"message": {"content": reply}}]
                })
                .to_string(),
            )
            .create()
    }

    #[test]
    fn test_respond_generates_and_learns() {
        let mut server = Server::new();
        let mock = mock_generation(&mut server, "Держись, день наладится!");
        let (_dir, mut pipeline) = setup(&server);

        let reply = pipeline.respond("меня бесит этот день");
        assert_eq!(reply.source, ReplySource::Generated);
        assert_eq!(reply.emotion, EmotionLabel::Anger);
        assert!(reply.text.starts_with("Держись"));

        let pattern = pipeline.store.pattern("меня бесит").unwrap();
        assert_eq!(pattern.usage_count, 1);
        assert_eq!(pipeline.store.recent_history().len(), 1);
        mock.assert();
    }

    #[test]
    fn test_anger_bias_reaches_the_prompt() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::Regex("злится".to_string()),
                mockito::Matcher::Regex("выясни, что случилось".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({"choices": [{"message": {"content": "ответ"}}]}).to_string(),
            )
            .create();
        let (_dir, mut pipeline) = setup(&server);

        pipeline.respond("меня бесит этот день");
        mock.assert();
    }

    #[test]
    fn test_generator_failure_yields_fallback_and_still_records() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .create();
        let (dir, mut pipeline) = setup(&server);

        let reply = pipeline.respond("меня бесит этот день");
        assert_eq!(reply.source, ReplySource::Fallback);
        assert!(FALLBACK_PHRASES.contains(&reply.text.as_str()));
        assert_eq!(reply.emotion, EmotionLabel::Anger);
        mock.assert();

        // The exchange is still persisted with the anger tag.
        drop(pipeline);
        let store = Store::open(dir.path()).unwrap();
        assert_eq!(store.recent_history().len(), 1);
        assert_eq!(store.recent_history()[0].0, "меня бесит этот день");
    }

    #[test]
    fn test_cached_reply_skips_the_generator() {
        let mut server = Server::new();
        let first = mock_generation(&mut server, "Вот тебе анекдот! 😄");
        let (_dir, mut pipeline) = setup(&server);

        let reply = pipeline.respond("расскажи анекдот");
        assert_eq!(reply.source, ReplySource::Generated);
        first.assert();

        let no_more = server
            .mock("POST", "/v1/chat/completions")
            .expect(0)
            .create();
        let reply = pipeline.respond("расскажи анекдот про котов");
        assert_eq!(reply.source, ReplySource::Cached);
        assert!(reply.text.starts_with("Вот тебе анекдот!"));
        no_more.assert();
    }

    #[test]
    fn test_repeated_key_increments_usage_count() {
        let mut server = Server::new();
        let _mock = mock_generation(&mut server, "ответ");
        let (_dir, mut pipeline) = setup(&server);

        pipeline.respond("расскажи анекдот");
        pipeline.respond("расскажи анекдот ещё раз");
        assert_eq!(
            pipeline.store.pattern("расскажи анекдот").unwrap().usage_count,
            2
        );
    }

    #[test]
    fn test_name_detection_updates_profile() {
        let mut server = Server::new();
        let _mock = mock_generation(&mut server, "Приятно познакомиться!");
        let (_dir, mut pipeline) = setup(&server);

        pipeline.respond("привет, меня зовут аня!");
        assert_eq!(
            pipeline.store.profile_value("user_name").unwrap(),
            Some("Аня".to_string())
        );
    }

    #[test]
    fn test_detect_user_name() {
        assert_eq!(detect_user_name("меня зовут аня"), Some("Аня".to_string()));
        assert_eq!(
            detect_user_name("кстати, меня зовут сергей, привет"),
            Some("Сергей".to_string())
        );
        assert_eq!(detect_user_name("как тебя зовут?"), None);
        assert_eq!(detect_user_name("меня зовут ..."), None);
    }

    #[test]
    fn test_sliders_set_behavior_directly() {
        let server = Server::new();
        let (_dir, mut pipeline) = setup(&server);
        pipeline.set_sarcasm(0.9);
        pipeline.set_empathy(0.2);
        assert_eq!(pipeline.behavior().sarcasm_level(), 0.9);
        assert_eq!(pipeline.behavior().empathy_level(), 0.2);
    }
}
