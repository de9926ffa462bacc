//! Domain Types
//!
//! Shared types for the translation and task-lifecycle paths:
//! - `Mode`: which model operation a task input requests
//! - `TaskStatus`: lifecycle state of a task record
//! - `TaskInput` / `ResultPayload`: the two hashed payload shapes
//! - `TaskRecord`: one row of the tasks table
//! - `Translation`: a stamped model output

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// TASK MODE
// ============================================================================

/// Model operation requested by a task input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Translate Chinese text to English (and Japanese).
    TranslateZh,
    /// Correct English grammar (and translate to Japanese).
    CorrectEn,
}

// ============================================================================
// TASK STATUS
// ============================================================================

/// Lifecycle state of a task record.
///
/// `Completed`, `Refunded` and `Failed` are terminal; the engine never moves
/// a record from a terminal state back to `Prepared`/`Created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Prepared,
    Created,
    Completed,
    Refunded,
    Failed,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown task status: {0}")]
pub struct UnknownStatus(pub String);

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Prepared => "prepared",
            TaskStatus::Created => "created",
            TaskStatus::Completed => "completed",
            TaskStatus::Refunded => "refunded",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, UnknownStatus> {
        match s {
            "prepared" => Ok(TaskStatus::Prepared),
            "created" => Ok(TaskStatus::Created),
            "completed" => Ok(TaskStatus::Completed),
            "refunded" => Ok(TaskStatus::Refunded),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Terminal status a caller may force onto a task via the status-update
/// endpoint. Deliberately excludes `completed` (only result submission
/// completes a task).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalStatus {
    Refunded,
    Failed,
}

impl From<FinalStatus> for TaskStatus {
    fn from(status: FinalStatus) -> Self {
        match status {
            FinalStatus::Refunded => TaskStatus::Refunded,
            FinalStatus::Failed => TaskStatus::Failed,
        }
    }
}

// ============================================================================
// HASHED PAYLOADS
// ============================================================================

/// A task input as prepared by a requester.
///
/// This is one of the two canonicalized-and-hashed payload shapes; field
/// values are significant down to the byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInput {
    pub text: String,
    pub mode: Mode,
    #[serde(default)]
    pub include_grammar: bool,
}

/// A task result as submitted by the orchestrator.
///
/// `timestamp` is RFC3339 text; it is re-normalized to whole-second UTC
/// before the payload is canonicalized for hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPayload {
    pub original_text: String,
    pub translated_text: String,
    pub english_grammar: Option<String>,
    pub japanese_text: Option<String>,
    pub hiragana_pronunciation: Option<String>,
    pub japanese_grammar: Option<String>,
    pub timestamp: String,
}

// ============================================================================
// TASK RECORD
// ============================================================================

/// One row of the tasks table.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    /// Storage sequence id; not externally meaningful.
    pub id: i64,
    /// On-chain task id, bound at claim time. Unique and immutable once set.
    pub task_id: Option<i64>,
    /// Content hash of the canonical input payload. Unique.
    pub input_hash: String,
    /// Canonical serialized input payload.
    pub input_payload: String,
    /// Content hash of the canonical result payload, immutable once set.
    pub result_hash: Option<String>,
    /// Canonical serialized result payload.
    pub result_payload: Option<String>,
    pub status: TaskStatus,
    pub requester: Option<String>,
    pub model: Option<String>,
    pub fee: Option<String>,
    pub chain_id: Option<i64>,
    pub tx_hash: Option<String>,
    pub block_number: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Claim parameters delivered by the on-chain orchestrator.
///
/// Provenance fields are opaque pass-through; the lifecycle engine validates
/// only the `(task_id, input_hash)` binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskClaim {
    pub task_id: i64,
    pub input_hash: String,
    pub requester: Option<String>,
    pub model: Option<String>,
    pub fee: Option<String>,
    pub chain_id: Option<i64>,
    pub tx_hash: Option<String>,
    pub block_number: Option<i64>,
}

// ============================================================================
// TRANSLATION OUTPUT
// ============================================================================

/// A model translation, stamped with the gateway's own UTC timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    pub original_text: String,
    pub translated_text: String,
    pub english_grammar: Option<String>,
    pub japanese_text: Option<String>,
    pub hiragana_pronunciation: Option<String>,
    pub japanese_grammar: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Model output before the gateway stamps it.
///
/// Whatever timestamp the model invents is ignored; `Translation` always
/// carries the gateway clock.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationDraft {
    pub original_text: String,
    pub translated_text: String,
    #[serde(default)]
    pub english_grammar: Option<String>,
    #[serde(default)]
    pub japanese_text: Option<String>,
    #[serde(default)]
    pub hiragana_pronunciation: Option<String>,
    #[serde(default)]
    pub japanese_grammar: Option<String>,
}

impl TranslationDraft {
    pub fn stamped(self, timestamp: DateTime<Utc>) -> Translation {
        Translation {
            original_text: self.original_text,
            translated_text: self.translated_text,
            english_grammar: self.english_grammar,
            japanese_text: self.japanese_text,
            hiragana_pronunciation: self.hiragana_pronunciation,
            japanese_grammar: self.japanese_grammar,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serialization() {
        assert_eq!(
            serde_json::to_string(&Mode::TranslateZh).unwrap(),
            "\"translate-zh\""
        );
        assert_eq!(
            serde_json::to_string(&Mode::CorrectEn).unwrap(),
            "\"correct-en\""
        );

        let mode: Mode = serde_json::from_str("\"translate-zh\"").unwrap();
        assert_eq!(mode, Mode::TranslateZh);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            TaskStatus::Prepared,
            TaskStatus::Created,
            TaskStatus::Completed,
            TaskStatus::Refunded,
            TaskStatus::Failed,
        ] {
            assert_eq!(TaskStatus::parse(status.as_str()).unwrap(), status);
        }

        assert!(TaskStatus::parse("pending").is_err());
    }

    #[test]
    fn test_final_status_excludes_completed() {
        assert!(serde_json::from_str::<FinalStatus>("\"refunded\"").is_ok());
        assert!(serde_json::from_str::<FinalStatus>("\"failed\"").is_ok());
        assert!(serde_json::from_str::<FinalStatus>("\"completed\"").is_err());
    }

    #[test]
    fn test_task_input_grammar_defaults_off() {
        let input: TaskInput =
            serde_json::from_str(r#"{"text":"你好","mode":"translate-zh"}"#).unwrap();
        assert!(!input.include_grammar);
    }
}
