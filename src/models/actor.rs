//! Caller-supplied actor context
//!
//! Opaque metadata copied onto every audit record produced by a commit.

use serde::{Deserialize, Serialize};

/// Method token conventionally used to mark soft deletes
pub const SOFT_DELETE_METHOD: &str = "DELETE";

/// Who is committing, and through which method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    /// Opaque identifier of the actor, if known
    pub actor_id: Option<String>,

    /// Method token such as "POST", "PUT" or "DELETE"
    pub method: String,
}

impl ActorContext {
    /// Create a context for a known actor
    pub fn new(actor_id: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            actor_id: Some(actor_id.into()),
            method: method.into(),
        }
    }

    /// Create a context without an actor identifier
    pub fn anonymous(method: impl Into<String>) -> Self {
        Self {
            actor_id: None,
            method: method.into(),
        }
    }
}
