//! Batch Operation Executor
//!
//! Runs one [`FileOperation`] over a resolved [`Selection`] with per-file
//! failure isolation. A failing file is recorded and the batch moves on;
//! nothing a single file does can abort the run.

use std::fmt;

use crate::audit::{AuditEntry, AuditLog, AuditTag};
use crate::guard::{Readiness, SkipReason};
use crate::selection::Selection;
use crate::Result;

pub const DEFAULT_PROGRESS_EVERY: usize = 100;

/// One per-file operation driven by the executor.
pub trait FileOperation {
    fn tag(&self) -> AuditTag;

    /// Idempotency check for `name`.
    fn inspect(&mut self, name: &str) -> Result<Readiness>;

    /// Run the operation on `name`, returning the produced artifact name.
    fn apply(&mut self, name: &str) -> Result<String>;

    /// Post-success cleanup (archive or delete the source). Returns whether
    /// anything was done.
    fn finish(&mut self, name: &str) -> Result<bool>;

    fn audit_entry(&self, name: &str, artifact: &str) -> AuditEntry;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded { artifact: String },
    Skipped(SkipReason),
    Suppressed,
    Failed { error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Succeeded,
    Skipped,
    Suppressed,
    Failed,
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Succeeded { .. } => OutcomeKind::Succeeded,
            Self::Skipped(_) => OutcomeKind::Skipped,
            Self::Suppressed => OutcomeKind::Suppressed,
            Self::Failed { .. } => OutcomeKind::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub file: String,
    pub outcome: Outcome,
}

/// Every outcome of one batch, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub records: Vec<OutcomeRecord>,
    /// Explicit selector entries that matched nothing.
    pub misses: Vec<String>,
}

impl BatchReport {
    /// Names of the produced artifacts, in processing order.
    pub fn artifacts(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(|r| match &r.outcome {
                Outcome::Succeeded { artifact } => Some(artifact.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome.kind() == kind)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &OutcomeRecord> {
        self.records
            .iter()
            .filter(|r| r.outcome.kind() == OutcomeKind::Failed)
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn outcome(&self, file: &str) -> Option<&Outcome> {
        self.records
            .iter()
            .find(|r| r.file == file)
            .map(|r| &r.outcome)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} skipped, {} suppressed, {} failed",
            self.count(OutcomeKind::Succeeded),
            self.count(OutcomeKind::Skipped),
            self.count(OutcomeKind::Suppressed),
            self.count(OutcomeKind::Failed)
        )
    }
}

/// Advisory progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchExecutor<'a> {
    progress_every: usize,
    audit: Option<&'a AuditLog>,
}

impl Default for BatchExecutor<'_> {
    fn default() -> Self {
        Self {
            progress_every: DEFAULT_PROGRESS_EVERY,
            audit: None,
        }
    }
}

impl<'a> BatchExecutor<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit progress every `n` processed files; `0` disables it.
    pub fn with_progress_every(mut self, n: usize) -> Self {
        self.progress_every = n;
        self
    }

    pub fn with_audit(mut self, audit: Option<&'a AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn execute<O: FileOperation>(&self, selection: &Selection, op: &mut O) -> BatchReport {
        self.execute_with_progress(selection, op, |_| {})
    }

    pub fn execute_with_progress<O, F>(
        &self,
        selection: &Selection,
        op: &mut O,
        mut on_progress: F,
    ) -> BatchReport
    where
        O: FileOperation,
        F: FnMut(Progress),
    {
        let total = selection.files.len();
        let mut report = BatchReport {
            records: Vec::with_capacity(total + selection.suppressed.len()),
            misses: selection.misses.clone(),
        };

        for (idx, name) in selection.files.iter().enumerate() {
            let outcome = self.run_one(op, name);
            report.records.push(OutcomeRecord {
                file: name.clone(),
                outcome,
            });

            let processed = idx + 1;
            if self.progress_every > 0 && processed % self.progress_every == 0 {
                tracing::info!(processed, total, tag = %op.tag(), "Batch progress");
                on_progress(Progress { processed, total });
            }
        }

        report
            .records
            .extend(selection.suppressed.iter().map(|name| OutcomeRecord {
                file: name.clone(),
                outcome: Outcome::Suppressed,
            }));

        tracing::debug!(tag = %op.tag(), summary = %report, "Batch finished");
        report
    }

    fn run_one<O: FileOperation>(&self, op: &mut O, name: &str) -> Outcome {
        match op.inspect(name) {
            Ok(Readiness::Ready) => {}
            Ok(Readiness::Done(SkipReason::Unreadable)) => {
                tracing::warn!(file = %name, "Skipping file with unreadable envelope");
                return Outcome::Skipped(SkipReason::Unreadable);
            }
            Ok(Readiness::Done(reason)) => {
                tracing::info!(file = %name, reason = %reason, "Skipping file");
                return Outcome::Skipped(reason);
            }
            Err(e) => {
                tracing::error!(file = %name, error = %e, "Failed to inspect file");
                return Outcome::Failed {
                    error: e.to_string(),
                };
            }
        }

        let artifact = match op.apply(name) {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::error!(file = %name, error = %e, tag = %op.tag(), "Operation failed");
                return Outcome::Failed {
                    error: e.to_string(),
                };
            }
        };
        tracing::info!(file = %name, artifact = %artifact, tag = %op.tag(), "Processed");

        if let Err(e) = op.finish(name) {
            tracing::warn!(file = %name, error = %e, "Cleanup failed");
        }

        if let Some(audit) = self.audit {
            let entry = op.audit_entry(name, &artifact);
            if let Err(e) = audit.record(&entry) {
                tracing::warn!(file = %name, error = %e, "Failed to write audit line");
            }
        }

        Outcome::Succeeded { artifact }
    }
}
