use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoginKind {
    Form,
    Social,
}

impl LoginKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginKind::Form => "FORM",
            LoginKind::Social => "SOCIAL",
        }
    }
}

impl std::str::FromStr for LoginKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "FORM" => Ok(LoginKind::Form),
            "SOCIAL" => Ok(LoginKind::Social),
            other => Err(format!("unknown login kind: {}", other)),
        }
    }
}

/// How a session was established. Travels inside the token as a claim and is
/// snapshotted onto every candidate and application row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginContext {
    pub kind: LoginKind,
    pub session_id: Uuid,
    pub social_id: Option<String>,
    pub email_verified: bool,
}

impl LoginContext {
    pub fn form() -> Self {
        Self {
            kind: LoginKind::Form,
            session_id: Uuid::new_v4(),
            social_id: None,
            email_verified: false,
        }
    }

    /// Social logins are the only path that marks the email verified.
    pub fn social(social_id: &str) -> Self {
        Self {
            kind: LoginKind::Social,
            session_id: Uuid::new_v4(),
            social_id: Some(social_id.to_string()),
            email_verified: true,
        }
    }
}

/// Root identity record, one per normalized email. `id` is the storage key and
/// never leaves the process; `eid` is the identifier clients see.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: Uuid,
    pub eid: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub social_id: Option<String>,
    pub login: LoginContext,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
