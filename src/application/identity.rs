//! Caller identity as handed in by the identity-provider collaborator.
//!
//! The core never inspects credentials; it receives a verified caller id
//! (plus optional profile fields) or nothing at all.

use serde::{Deserialize, Serialize};

use crate::application::error::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub id: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl CallerIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            avatar_url: None,
        }
    }

    pub fn with_profile(
        id: impl Into<String>,
        name: impl Into<String>,
        avatar_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            avatar_url: Some(avatar_url.into()),
        }
    }
}

/// Per-request authentication state.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    caller: Option<CallerIdentity>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { caller: None }
    }

    pub fn authenticated(caller: CallerIdentity) -> Self {
        Self {
            caller: Some(caller),
        }
    }

    pub fn caller(&self) -> Option<&CallerIdentity> {
        self.caller.as_ref()
    }

    pub fn viewer_id(&self) -> Option<&str> {
        self.caller.as_ref().map(|caller| caller.id.as_str())
    }

    /// The gate every write passes through.
    pub fn require_caller(&self) -> Result<&CallerIdentity, ServiceError> {
        self.caller.as_ref().ok_or(ServiceError::AuthRequired)
    }
}
