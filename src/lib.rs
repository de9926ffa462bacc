//! Lingua Gateway
//!
//! A translation/grammar-correction gateway backed by an OpenAI-compatible
//! LLM API, with results persisted locally and optionally bound to an
//! on-chain task-claim workflow.
//!
//! ## Module Structure
//!
//! - `util/`: canonical hashing and timestamp normalization
//! - `types`: shared domain types (payloads, records, statuses)
//! - `error`: storage and lifecycle error taxonomies
//! - `task_store` / `translation_store`: SQLite persistence
//! - `task_service`: the task lifecycle engine (prepare/claim/result/status)
//! - `llm_client` / `translator`: the model-call path
//! - `auth`: shared-secret check for internal callers
//! - `api` / `server`: REST boundary
//! - `config`: environment-driven settings

/// Shared utility functions
pub mod util;

/// Shared domain types
pub mod types;

/// Error taxonomies
pub mod error;

/// Gateway settings
pub mod config;

/// Internal caller authentication
pub mod auth;

/// Task record persistence
pub mod task_store;

/// Translation log persistence
pub mod translation_store;

/// Task lifecycle engine
pub mod task_service;

/// LLM chat-completions client
pub mod llm_client;

/// Translation service
pub mod translator;

/// REST API
pub mod api;

/// HTTP server
pub mod server;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use api::ApiState;
pub use config::Settings;
pub use error::{StorageError, TaskError};
pub use llm_client::{LlmClient, LlmConfig};
pub use task_service::{
    ClaimedTask, CompletedTask, PreparedInput, PreparedTask, PublicTask, TaskService, UpdatedTask,
};
pub use task_store::TaskStore;
pub use translation_store::TranslationStore;
pub use translator::TranslatorService;
pub use types::{
    FinalStatus, Mode, ResultPayload, TaskClaim, TaskInput, TaskRecord, TaskStatus, Translation,
};
