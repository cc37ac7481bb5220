use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::behavior::BehaviorState;
use crate::constants::{
    HISTORY_MAX_MESSAGES, KEY_MIN_TOKEN_CHARS, KEY_TOKEN_COUNT, MAX_IMPORTANT_FACTS,
};
use crate::emotion::EmotionLabel;
use crate::error::StorageError;

const STORE_DB_NAME: &str = "rima_memory.db";
const INTERACTIONS_TABLE_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS interactions (user_text TEXT NOT NULL, bot_text TEXT NOT NULL, timestamp TEXT NOT NULL, polarity REAL NOT NULL, emotion TEXT NOT NULL, is_important INTEGER NOT NULL)";
const PATTERNS_TABLE_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS patterns (pattern_key TEXT PRIMARY KEY, response_text TEXT NOT NULL, usage_count INTEGER NOT NULL, usefulness REAL NOT NULL, updated_at TEXT NOT NULL)";
const BEHAVIOR_TABLE_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS behavior (id INTEGER PRIMARY KEY CHECK (id = 1), sarcasm REAL NOT NULL, empathy REAL NOT NULL)";
const PROFILE_TABLE_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS profile (key TEXT PRIMARY KEY, value TEXT NOT NULL)";

// One completed exchange. Append-only, never mutated after insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionRecord {
    pub user_text: String,
    pub bot_text: String,
    pub timestamp: OffsetDateTime,
    pub polarity: f32,
    pub emotion: EmotionLabel,
    pub is_important: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LearnedPattern {
    pub pattern_key: String,
    pub response_text: String,
    pub usage_count: i64,
    pub usefulness: f32,
    pub updated_at: OffsetDateTime,
}

pub struct Store {
    patterns: HashMap<String, LearnedPattern>,
    // Chronological (user, bot) tail feeding the prompt.
    history: Vec<(String, String)>,
    sqlite: Connection,
}

fn normalize(message: &str) -> String {
    message.trim().to_lowercase()
}

// First KEY_TOKEN_COUNT tokens longer than KEY_MIN_TOKEN_CHARS characters,
// joined. None means the message is too short to key and learning is skipped.
fn derive_key(message: &str) -> Option<String> {
    let normalized = normalize(message);
    let tokens: Vec<&str> = normalized
        .split_whitespace()
        .filter(|t| t.chars().count() > KEY_MIN_TOKEN_CHARS)
        .take(KEY_TOKEN_COUNT)
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

fn load_patterns(connection: &Connection) -> Result<HashMap<String, LearnedPattern>, StorageError> {
    let mut stmt = connection.prepare(
        "SELECT pattern_key, response_text, usage_count, usefulness, updated_at FROM patterns",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(LearnedPattern {
            pattern_key: row.get("pattern_key")?,
            response_text: row.get("response_text")?,
            usage_count: row.get("usage_count")?,
            usefulness: row.get::<_, f64>("usefulness")? as f32,
            updated_at: row.get("updated_at")?,
        })
    })?;
    let mut patterns = HashMap::new();
    for pattern in rows {
        let pattern = pattern?;
        patterns.insert(pattern.pattern_key.clone(), pattern);
    }
    Ok(patterns)
}

fn load_history(connection: &Connection) -> Result<Vec<(String, String)>, StorageError> {
    let mut stmt = connection.prepare(
        "SELECT user_text, bot_text FROM interactions ORDER BY timestamp DESC, rowid DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map([HISTORY_MAX_MESSAGES as i64], |row| {
        Ok((row.get("user_text")?, row.get("bot_text")?))
    })?;
    let mut history = rows.collect::<Result<Vec<_>, _>>()?;
    history.reverse();
    Ok(history)
}

impl Store {
    pub fn open(config_path: &Path) -> Result<Self, StorageError> {
        let connection = Connection::open(config_path.join(STORE_DB_NAME))?;
        connection.execute(INTERACTIONS_TABLE_SCHEMA, ())?;
        connection.execute(PATTERNS_TABLE_SCHEMA, ())?;
        connection.execute(BEHAVIOR_TABLE_SCHEMA, ())?;
        connection.execute(PROFILE_TABLE_SCHEMA, ())?;
        Ok(Store {
            patterns: load_patterns(&connection)?,
            history: load_history(&connection)?,
            sqlite: connection,
        })
    }

    // All stored patterns whose key is contained in the normalized message,
    // best first by usefulness, then usage count, then most recent update.
    // The containment direction is deliberate: short learned fragments should
    // match longer future messages.
    pub fn lookup(&self, message: &str) -> Option<&LearnedPattern> {
        let normalized = normalize(message);
        self.patterns
            .values()
            .filter(|p| normalized.contains(&p.pattern_key))
            .max_by(|a, b| {
                a.usefulness
                    .partial_cmp(&b.usefulness)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.usage_count.cmp(&b.usage_count))
                    .then_with(|| a.updated_at.cmp(&b.updated_at))
            })
    }

    // Upsert by key: repeats bump the usage count and accumulate usefulness,
    // the cached response text stays what it was first learned as.
    pub fn learn(&mut self, message: &str, response: &str, score: f32) -> Result<(), StorageError> {
        let Some(key) = derive_key(message) else {
            return Ok(());
        };
        let now = OffsetDateTime::now_utc();
        self.sqlite.execute(
            "INSERT INTO patterns (pattern_key, response_text, usage_count, usefulness, updated_at)
             VALUES (?1, ?2, 1, ?3, ?4)
             ON CONFLICT(pattern_key) DO UPDATE SET
                 usage_count = usage_count + 1,
                 usefulness = usefulness + excluded.usefulness,
                 updated_at = excluded.updated_at",
            (&key, response, f64::from(score), now),
        )?;
        self.patterns
            .entry(key.clone())
            .and_modify(|p| {
                p.usage_count += 1;
                p.usefulness += score;
                p.updated_at = now;
            })
            .or_insert_with(|| LearnedPattern {
                pattern_key: key,
                response_text: response.to_string(),
                usage_count: 1,
                usefulness: score,
                updated_at: now,
            });
        Ok(())
    }

    pub fn pattern(&self, key: &str) -> Option<&LearnedPattern> {
        self.patterns.get(key)
    }

    pub fn log_interaction(&mut self, record: &InteractionRecord) -> Result<(), StorageError> {
        self.sqlite.execute(
            "INSERT INTO interactions (user_text, bot_text, timestamp, polarity, emotion, is_important)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                &record.user_text,
                &record.bot_text,
                record.timestamp,
                f64::from(record.polarity),
                record.emotion,
                record.is_important,
            ),
        )?;
        self.history
            .push((record.user_text.clone(), record.bot_text.clone()));
        if self.history.len() > HISTORY_MAX_MESSAGES {
            let excess = self.history.len() - HISTORY_MAX_MESSAGES;
            self.history.drain(0..excess);
        }
        Ok(())
    }

    // Chronological (user, bot) pairs, capped at HISTORY_MAX_MESSAGES.
    pub fn recent_history(&self) -> &[(String, String)] {
        &self.history
    }

    // User messages flagged important, most recent first.
    pub fn important_facts(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.sqlite.prepare(
            "SELECT user_text FROM interactions WHERE is_important = 1
             ORDER BY timestamp DESC, rowid DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([MAX_IMPORTANT_FACTS as i64], |row| row.get("user_text"))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn load_behavior(&self) -> Result<BehaviorState, StorageError> {
        let mut stmt = self
            .sqlite
            .prepare("SELECT sarcasm, empathy FROM behavior WHERE id = 1")?;
        let mut rows = stmt.query_map([], |row| {
            Ok(BehaviorState::new(
                row.get::<_, f64>("sarcasm")? as f32,
                row.get::<_, f64>("empathy")? as f32,
            ))
        })?;
        match rows.next() {
            Some(state) => Ok(state?),
            None => Ok(BehaviorState::default()),
        }
    }

    pub fn save_behavior(&self, state: &BehaviorState) -> Result<(), StorageError> {
        self.sqlite.execute(
            "INSERT OR REPLACE INTO behavior (id, sarcasm, empathy) VALUES (1, ?1, ?2)",
            (
                f64::from(state.sarcasm_level()),
                f64::from(state.empathy_level()),
            ),
        )?;
        Ok(())
    }

    pub fn profile_value(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self
            .sqlite
            .prepare("SELECT value FROM profile WHERE key = ?1")?;
        let mut rows = stmt.query_map([key], |row| row.get("value"))?;
        match rows.next() {
            Some(value) => Ok(Some(value?)),
            None => Ok(None),
        }
    }

    pub fn set_profile_value(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.sqlite.execute(
            "INSERT OR REPLACE INTO profile (key, value) VALUES (?1, ?2)",
            (key, value),
        )?;
        Ok(())
    }
}
