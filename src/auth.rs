//! Signed-in identity, reduced to what storage paths need.

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::store::DocPath;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl UserIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
        }
    }

    /// First name for greetings, falling back to a generic word.
    pub fn friendly_name(&self) -> &str {
        self.display_name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
            .unwrap_or("there")
    }
}

/// Authentication state as reported by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub current_user: Option<UserIdentity>,
    pub loading: bool,
}

impl AuthState {
    pub fn signed_in(user: UserIdentity) -> Self {
        Self {
            current_user: Some(user),
            loading: false,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn uid(&self) -> Option<&str> {
        self.current_user.as_ref().map(|user| user.uid.as_str())
    }
}

pub fn budget_model_path(uid: &str) -> Result<DocPath> {
    DocPath::parse(&format!("users/{uid}/budget/model"))
}

pub fn savings_model_path(uid: &str) -> Result<DocPath> {
    DocPath::parse(&format!("users/{uid}/savings/model"))
}

pub fn setup_profile_path(uid: &str) -> Result<DocPath> {
    DocPath::parse(&format!("users/{uid}/profile/setup"))
}
