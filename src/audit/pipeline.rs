//! Audited commit
//!
//! Orders the two-phase capture around a store write:
//!
//! 1. scan pending mutations and finalize every record already complete
//! 2. perform the primary write
//! 3. reconcile deferred entries from the post-write state
//! 4. persist all records through the audit-only commit
//!
//! A failed primary write is returned as-is and nothing is audited. A failed
//! audit write does not roll the primary write back: the commit is reported
//! as a degraded success and the records are parked in the outbox, when one
//! is configured, for a later `AuditSink::replay_outbox`.

use super::entry::AuditRecord;
use super::logger::AuditLogger;
use super::reconciler::AuditReconciler;
use super::scanner::ChangeScanner;
use super::sink::AuditSink;
use crate::config::{AuditrailPaths, Settings};
use crate::error::{AuditrailError, AuditrailResult};
use crate::models::ActorContext;
use crate::storage::{AuditCommit, Store};

/// What happened to the audit trail of a commit
#[derive(Debug)]
pub enum AuditStatus {
    /// No actor context was given; the commit was a plain passthrough
    Skipped,
    /// All records were persisted
    Recorded { count: usize },
    /// The primary write succeeded but the audit write did not
    Failed {
        error: AuditrailError,
        records: Vec<AuditRecord>,
        /// Whether the records were saved to the outbox
        outboxed: bool,
    },
}

/// Result of a successful primary write
#[derive(Debug)]
pub struct CommitReport {
    /// Rows inserted, updated or deleted by the primary write
    pub rows_affected: usize,
    pub audit: AuditStatus,
}

impl CommitReport {
    /// Primary write succeeded but the audit trail is incomplete
    pub fn is_degraded(&self) -> bool {
        matches!(self.audit, AuditStatus::Failed { .. })
    }

    /// Number of audit records persisted by this commit
    pub fn recorded(&self) -> usize {
        match self.audit {
            AuditStatus::Recorded { count } => count,
            _ => 0,
        }
    }
}

/// The audited commit entry point
#[derive(Debug, Clone, Default)]
pub struct AuditPipeline {
    scanner: ChangeScanner,
    outbox: Option<AuditLogger>,
}

impl AuditPipeline {
    pub fn new(scanner: ChangeScanner) -> Self {
        Self {
            scanner,
            outbox: None,
        }
    }

    /// Park records from failed audit writes in this outbox
    pub fn with_outbox(mut self, outbox: AuditLogger) -> Self {
        self.outbox = Some(outbox);
        self
    }

    /// Build the pipeline described by the settings
    pub fn from_settings(settings: &Settings, paths: &AuditrailPaths) -> Self {
        let pipeline = Self::new(ChangeScanner::from_settings(settings));
        if settings.outbox_enabled {
            pipeline.with_outbox(AuditLogger::new(paths.audit_outbox()))
        } else {
            pipeline
        }
    }

    pub fn scanner(&self) -> &ChangeScanner {
        &self.scanner
    }

    /// Commit the store's pending mutations, auditing them when an actor
    /// context is given
    ///
    /// # Errors
    ///
    /// Store write failures are returned unchanged. `ReconciliationInvariant`
    /// is returned when the store breaks its contract after a successful
    /// write; the records that were ready at scan time are still persisted
    /// or parked before it is returned. Audit write failures are not errors; see `AuditStatus::Failed`.
    pub fn commit<S>(&self, store: &mut S, actor: Option<&ActorContext>) -> AuditrailResult<CommitReport>
    where
        S: Store + AuditCommit,
    {
        let Some(actor) = actor else {
            let rows_affected = store.commit()?;
            return Ok(CommitReport {
                rows_affected,
                audit: AuditStatus::Skipped,
            });
        };

        let scan = self.scanner.scan(&*store, actor);
        if scan.is_empty() {
            let rows_affected = store.commit()?;
            tracing::debug!(rows_affected, "no audited mutations in commit");
            return Ok(CommitReport {
                rows_affected,
                audit: AuditStatus::Recorded { count: 0 },
            });
        }
        let mut records = scan.ready;

        // Dropping `scan` on failure discards every captured entry
        let rows_affected = store.commit()?;

        match AuditReconciler::reconcile(&*store, scan.deferred) {
            Ok(reconciled) => records.extend(reconciled),
            Err(error) => {
                tracing::error!(
                    %error,
                    ready = records.len(),
                    "reconciliation failed after primary commit"
                );
                // Ready records describe durable writes; keep them
                self.deliver(store, records);
                return Err(error);
            }
        }

        let audit = self.deliver(store, records);

        tracing::info!(rows_affected, recorded = ?audit_count(&audit), method = %actor.method, "audited commit complete");

        Ok(CommitReport {
            rows_affected,
            audit,
        })
    }

    /// Persist records through the audit-only commit, parking them on failure
    fn deliver(&self, store: &mut dyn AuditCommit, records: Vec<AuditRecord>) -> AuditStatus {
        match AuditSink::new(store).persist(&records) {
            Ok(count) => AuditStatus::Recorded { count },
            Err(error) => {
                tracing::error!(
                    %error,
                    records = records.len(),
                    "audit write failed after primary commit"
                );
                let outboxed = self.park(&records);
                AuditStatus::Failed {
                    error,
                    records,
                    outboxed,
                }
            }
        }
    }

    fn park(&self, records: &[AuditRecord]) -> bool {
        let Some(outbox) = &self.outbox else {
            return false;
        };

        match outbox.log_batch(records) {
            Ok(()) => {
                tracing::warn!(
                    records = records.len(),
                    outbox = %outbox.path().display(),
                    "audit records parked in outbox"
                );
                true
            }
            Err(e) => {
                tracing::error!("failed to write audit outbox: {e}");
                false
            }
        }
    }
}

fn audit_count(status: &AuditStatus) -> Option<usize> {
    match status {
        AuditStatus::Recorded { count } => Some(*count),
        _ => None,
    }
}
