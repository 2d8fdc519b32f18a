//! Audit record persistence
//!
//! The sink only holds the audit-only commit capability, so persisting
//! records can never re-enter the capture pipeline.

use super::entry::AuditRecord;
use super::logger::AuditLogger;
use crate::error::AuditrailResult;
use crate::storage::AuditCommit;

/// Persists finalized audit records through an audit-only commit
pub struct AuditSink<'a> {
    target: &'a mut dyn AuditCommit,
}

impl<'a> AuditSink<'a> {
    pub fn new(target: &'a mut dyn AuditCommit) -> Self {
        Self { target }
    }

    /// Append and commit the records, returning how many were written
    ///
    /// An empty batch completes immediately without touching the store.
    pub fn persist(&mut self, records: &[AuditRecord]) -> AuditrailResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        self.target.commit_audit(records)?;
        tracing::debug!(count = records.len(), "persisted audit records");
        Ok(records.len())
    }

    /// Deliver the records held in an outbox, then empty it
    ///
    /// The outbox is left untouched if delivery fails.
    pub fn replay_outbox(&mut self, outbox: &AuditLogger) -> AuditrailResult<usize> {
        let records = outbox.read_all()?;
        let delivered = self.persist(&records)?;
        outbox.clear()?;

        if delivered > 0 {
            tracing::info!(delivered, outbox = %outbox.path().display(), "replayed audit outbox");
        }
        Ok(delivered)
    }
}
