//! Task Lifecycle Engine
//!
//! Tracks a translation task from prepare → claim → result → terminal
//! status, keyed by the content hash of its canonical input payload.
//!
//! Invariants enforced here (backed by the store's unique indexes, §task_store):
//! - one record per canonical input, ever — repeat prepares are idempotent
//! - an input is claimed under at most one on-chain task id, and a task id
//!   claims at most one input
//! - the first result written for a task wins; an identical re-submission is
//!   a no-op, a different one is rejected
//!
//! All operations return typed errors (`NotFound`, `Conflict`,
//! `HashMismatch`); nothing here retries — every error kind is a caller or
//! input problem, not a transient failure.

use crate::error::{StorageError, TaskError, TaskResult};
use crate::task_store::TaskStore;
use crate::types::{FinalStatus, ResultPayload, TaskClaim, TaskInput, TaskStatus};
use crate::util::hash::hash_payload;
use crate::util::timestamp::{format_utc_timestamp, parse_utc_timestamp, utc_now};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// ============================================================================
// OPERATION RESULTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedTask {
    pub input_hash: String,
    /// Opaque reference to the prepared input; currently the hash itself.
    pub input_ref: String,
    pub prepared_at: String,
    pub deduped: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimedTask {
    pub task_id: i64,
    pub status: TaskStatus,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedInput {
    pub input_hash: String,
    pub input_payload: TaskInput,
    pub prepared_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedTask {
    pub task_id: i64,
    pub result_hash: String,
    pub status: TaskStatus,
    pub completed_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatedTask {
    pub task_id: i64,
    pub status: TaskStatus,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicTask {
    pub task_id: i64,
    pub status: TaskStatus,
    pub input_hash: String,
    pub result_hash: Option<String>,
    pub result: Option<ResultPayload>,
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct TaskService {
    store: Arc<TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    /// Register an input payload, deduplicating on its content hash.
    ///
    /// Fully idempotent: for a given canonical input exactly one record is
    /// ever created, no matter how many callers race. A repeat (or losing)
    /// caller gets the winner's `prepared_at` and `deduped=true`.
    pub fn prepare(&self, input: &TaskInput) -> TaskResult<PreparedTask> {
        let (input_hash, canonical) = hash_payload(input)?;

        if let Some(existing) = self.store.get_by_input_hash(&input_hash)? {
            return Ok(PreparedTask {
                input_ref: input_hash.clone(),
                input_hash,
                prepared_at: existing.created_at,
                deduped: true,
            });
        }

        let prepared_at = format_utc_timestamp(utc_now());
        let inserted = self
            .store
            .insert_prepared(&input_hash, &canonical, &prepared_at)?;

        if !inserted {
            // Lost the insert race; observe the winner's row.
            let existing = self.store.get_by_input_hash(&input_hash)?.ok_or_else(|| {
                StorageError::Database("prepared row missing after insert race".to_string())
            })?;
            return Ok(PreparedTask {
                input_ref: input_hash.clone(),
                input_hash,
                prepared_at: existing.created_at,
                deduped: true,
            });
        }

        info!("Prepared input {}", input_hash);

        Ok(PreparedTask {
            input_ref: input_hash.clone(),
            input_hash,
            prepared_at,
            deduped: false,
        })
    }

    /// Bind an on-chain task id to a prepared input.
    ///
    /// Rejects cross-bindings in both directions: an input already claimed
    /// under a different task id, and a task id already claimed for a
    /// different input. Re-claiming the same `(task_id, input_hash)` pair is
    /// a no-op state-wise (provenance is re-bound verbatim).
    pub fn claim(&self, claim: &TaskClaim) -> TaskResult<ClaimedTask> {
        let record = self
            .store
            .get_by_input_hash(&claim.input_hash)?
            .ok_or_else(|| TaskError::NotFound("input_hash not found".to_string()))?;

        if let Some(bound) = record.task_id {
            if bound != claim.task_id {
                warn!(
                    "Claim conflict: input {} already bound to task {}",
                    claim.input_hash, bound
                );
                return Err(TaskError::Conflict(
                    "input_hash already bound to a different task_id".to_string(),
                ));
            }
        }

        if let Some(existing) = self.store.get_by_task_id(claim.task_id)? {
            if existing.input_hash != claim.input_hash {
                warn!(
                    "Claim conflict: task {} already bound to input {}",
                    claim.task_id, existing.input_hash
                );
                return Err(TaskError::Conflict(
                    "task_id already bound to a different input_hash".to_string(),
                ));
            }
        }

        let updated_at = format_utc_timestamp(utc_now());
        match self.store.update_claim(claim, &updated_at) {
            Ok(true) => {}
            Ok(false) => {
                // The guarded write did not match: either a concurrent claim
                // bound the input first, or the record is already terminal.
                // Re-evaluate against the row that won.
                let record = self
                    .store
                    .get_by_input_hash(&claim.input_hash)?
                    .ok_or_else(|| TaskError::NotFound("input_hash not found".to_string()))?;
                return match record.task_id {
                    // Same pair: the claim is already in place, nothing to
                    // re-bind (terminal records stay terminal).
                    Some(bound) if bound == claim.task_id => Ok(ClaimedTask {
                        task_id: claim.task_id,
                        status: record.status,
                        updated_at: record.updated_at,
                    }),
                    _ => Err(TaskError::Conflict(
                        "input_hash already bound to a different task_id".to_string(),
                    )),
                };
            }
            // A concurrent claim slipped between our reads and the write;
            // the unique index on task_id caught it.
            Err(StorageError::Constraint(_)) => {
                return Err(TaskError::Conflict(
                    "task_id already bound to a different input_hash".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        info!("Claimed task {} for input {}", claim.task_id, claim.input_hash);

        Ok(ClaimedTask {
            task_id: claim.task_id,
            status: TaskStatus::Created,
            updated_at,
        })
    }

    /// Fetch the stored canonical input payload for a hash.
    pub fn get_input(&self, input_hash: &str) -> TaskResult<PreparedInput> {
        let record = self
            .store
            .get_by_input_hash(input_hash)?
            .ok_or_else(|| TaskError::NotFound("input_hash not found".to_string()))?;

        let input_payload: TaskInput = serde_json::from_str(&record.input_payload)?;

        Ok(PreparedInput {
            input_hash: record.input_hash,
            input_payload,
            prepared_at: record.created_at,
        })
    }

    /// Store the result for a claimed task.
    ///
    /// The payload's own timestamp is normalized before hashing, so
    /// submissions differing only in sub-second precision hash identically.
    /// A caller-supplied `expected_result_hash` is checked against the
    /// recomputed hash before any write. Results are immutable: an identical
    /// re-submission returns the original completion time, a different one
    /// is a conflict.
    pub fn submit_result(
        &self,
        task_id: i64,
        payload: &ResultPayload,
        expected_result_hash: Option<&str>,
    ) -> TaskResult<CompletedTask> {
        let record = self
            .store
            .get_by_task_id(task_id)?
            .ok_or_else(|| TaskError::NotFound("task_id not found".to_string()))?;

        let (result_hash, canonical) = hash_result_payload(payload)?;

        if let Some(expected) = expected_result_hash {
            if expected != result_hash {
                warn!(
                    "Result hash mismatch for task {}: caller sent {}, computed {}",
                    task_id, expected, result_hash
                );
                return Err(TaskError::HashMismatch {
                    supplied: expected.to_string(),
                    computed: result_hash,
                });
            }
        }

        if let Some(stored) = &record.result_hash {
            if *stored != result_hash {
                return Err(TaskError::Conflict(
                    "task already has a different result_hash".to_string(),
                ));
            }
            // Identical re-submission: report the original completion time.
            return Ok(CompletedTask {
                task_id,
                result_hash,
                status: TaskStatus::Completed,
                completed_at: record.updated_at,
            });
        }

        let completed_at = format_utc_timestamp(utc_now());
        let wrote = self
            .store
            .update_result(task_id, &result_hash, &canonical, &completed_at)?;

        if !wrote {
            // Raced with another submitter; re-evaluate against the row that won.
            let record = self.store.get_by_task_id(task_id)?.ok_or_else(|| {
                StorageError::Database("task row missing after result race".to_string())
            })?;
            return match record.result_hash.as_deref() {
                Some(stored) if stored == result_hash => Ok(CompletedTask {
                    task_id,
                    result_hash,
                    status: TaskStatus::Completed,
                    completed_at: record.updated_at,
                }),
                Some(_) => Err(TaskError::Conflict(
                    "task already has a different result_hash".to_string(),
                )),
                None => Err(StorageError::Database(
                    "result write raced but no result stored".to_string(),
                )
                .into()),
            };
        }

        info!("Stored result {} for task {}", result_hash, task_id);

        Ok(CompletedTask {
            task_id,
            result_hash,
            status: TaskStatus::Completed,
            completed_at,
        })
    }

    /// Force a task to `refunded` or `failed`.
    ///
    /// Unconditional by design: a refund settled on-chain overwrites even a
    /// completed task, and provenance is replaced wholesale.
    pub fn update_status(
        &self,
        task_id: i64,
        status: FinalStatus,
        tx_hash: Option<&str>,
        block_number: Option<i64>,
    ) -> TaskResult<UpdatedTask> {
        let status: TaskStatus = status.into();
        let updated_at = format_utc_timestamp(utc_now());

        let updated = self
            .store
            .update_status(task_id, status, tx_hash, block_number, &updated_at)?;
        if !updated {
            return Err(TaskError::NotFound("task_id not found".to_string()));
        }

        info!("Task {} marked {}", task_id, status.as_str());

        Ok(UpdatedTask {
            task_id,
            status,
            updated_at,
        })
    }

    /// Public view of a task: hashes and status always, the full result
    /// payload only when requested and present.
    pub fn get_public(&self, task_id: i64, include_result: bool) -> TaskResult<PublicTask> {
        let record = self
            .store
            .get_by_task_id(task_id)?
            .ok_or_else(|| TaskError::NotFound("task_id not found".to_string()))?;

        let result = match (&record.result_payload, include_result) {
            (Some(payload), true) => Some(serde_json::from_str::<ResultPayload>(payload)?),
            _ => None,
        };

        Ok(PublicTask {
            task_id,
            status: record.status,
            input_hash: record.input_hash,
            result_hash: record.result_hash,
            result,
        })
    }
}

/// Canonicalize and hash a result payload, after re-normalizing its
/// timestamp field to whole-second UTC. This is the one place timestamps
/// influence a hash, so the normalization must happen before serialization.
fn hash_result_payload(payload: &ResultPayload) -> TaskResult<(String, String)> {
    let mut normalized = payload.clone();
    normalized.timestamp = format_utc_timestamp(parse_utc_timestamp(&payload.timestamp)?);
    Ok(hash_payload(&normalized)?)
}
