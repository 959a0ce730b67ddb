//! Who performed a write, and the context handed to every audited write.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The authenticated principal behind a write.
///
/// Only the identifier is recorded; it is stored as text so principals with
/// integer, UUID or opaque string keys all fit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Actor {
    pub id: String,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Execution context handed to every audited write.
///
/// Built at the request/job boundary and passed in explicitly. An absent
/// actor is the normal case for batch and background writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditContext {
    actor: Option<Actor>,
}

impl AuditContext {
    /// Context with no authenticated actor.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { actor: None }
    }

    #[must_use]
    pub const fn with_actor(actor: Actor) -> Self {
        Self { actor: Some(actor) }
    }

    #[must_use]
    pub const fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    /// Identifier to record as `created_by`, if any.
    #[must_use]
    pub fn actor_id(&self) -> Option<&str> {
        self.actor.as_ref().map(|a| a.id.as_str())
    }
}

impl From<Option<Actor>> for AuditContext {
    fn from(actor: Option<Actor>) -> Self {
        Self { actor }
    }
}
