//! Audit capture for unit-of-work commits
//!
//! Records every create, update and delete committed through an audited
//! commit, with key, old and new values, in an append-only audit log.
//!
//! # Architecture
//!
//! - `ValueCodec`: canonical, serialization-based value equality.
//! - `ChangeScanner`: classifies pending mutations into `ChangeEntry` values,
//!   tagged ready or deferred.
//! - `AuditReconciler`: fills deferred entries with store-generated values
//!   after the primary write.
//! - `AuditSink`: persists records through the audit-only commit.
//! - `AuditPipeline`: runs scan, write, reconcile and persist in order.
//! - `AuditLogger`: the JSON-lines file behind the audit log and the outbox.
//!
//! # Example
//!
//! ```rust,ignore
//! use auditrail::audit::AuditPipeline;
//! use auditrail::models::ActorContext;
//!
//! let mut uow = database.begin();
//! let handle = uow.add("Product", row)?;
//! let report = pipeline.commit(&mut uow, Some(&ActorContext::new("u-1", "POST")))?;
//! if report.is_degraded() {
//!     // primary write is durable, audit trail needs out-of-band repair
//! }
//! ```

mod codec;
mod diff;
mod entry;
mod logger;
mod pipeline;
mod reconciler;
mod scanner;
mod sink;

#[cfg(test)]
pub(crate) mod testing;

pub use codec::{CanonicalForm, ValueCodec};
pub use diff::{generate_detailed_diff, generate_diff};
pub use entry::{
    AuditRecord, CapturedChange, ChangeEntry, DeferredEntry, FieldValues, OperationKind,
    PendingField,
};
pub use logger::AuditLogger;
pub use pipeline::{AuditPipeline, AuditStatus, CommitReport};
pub use reconciler::AuditReconciler;
pub use scanner::{ChangeScanner, ScanOutcome};
pub use sink::AuditSink;
