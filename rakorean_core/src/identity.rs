use serde::{Deserialize, Serialize};

use rakorean_util::email_local_part;

use crate::error::{Error, Result};

/// The signed-in user of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: String,
}

/// Who the current session acts for. Built once per session and handed to the
/// engine and the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    principal: Option<Principal>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self { principal: None }
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn principal_id(&self) -> Option<&str> {
        self.principal.as_ref().map(|p| p.id.as_str())
    }

    pub fn access_token(&self) -> Option<&str> {
        self.principal.as_ref().map(|p| p.access_token.as_str())
    }

    /// Name known from the session: the display name, else the email's local part.
    pub fn display_name(&self) -> Option<&str> {
        let principal = self.principal.as_ref()?;
        principal
            .display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| principal.email.as_deref().and_then(email_local_part))
    }

    /// The principal, or `AuthRequired` naming the attempted action.
    pub fn require(&self, action: &str) -> Result<&Principal> {
        self.principal
            .as_ref()
            .ok_or_else(|| Error::AuthRequired(action.to_string()))
    }
}
