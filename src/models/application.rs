use crate::models::candidate::LoginContext;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Applicant-supplied fields frozen at submission time. Later edits to the
/// candidate record never rewrite these.
#[derive(Debug, Clone)]
pub struct UserDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub rodo_consent: bool,
    pub regulations_consent: bool,
    pub remember_me: bool,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub kind: String,
    pub storage_path: String,
    pub original_name: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub body: String,
    pub sender: String,
    pub sent_at: DateTime<Utc>,
}

/// One submission. `id` carries the submission order within a candidate;
/// `eid` is the globally unique handle clients use.
#[derive(Debug, Clone)]
pub struct Application {
    pub id: i64,
    pub eid: Uuid,
    pub candidate_id: Uuid,
    pub offer_id: String,
    pub user_details: UserDetails,
    pub login: LoginContext,
    pub confirmed: bool,
    pub accepted: Option<bool>,
    pub info_send: bool,
    pub documents: Vec<Document>,
    pub messages: Vec<Message>,
    pub submitted_at: DateTime<Utc>,
}

/// What the recorder writes: everything an Application needs except the
/// storage-assigned parts.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub offer_id: String,
    pub user_details: UserDetails,
    pub login: LoginContext,
    pub document: NewDocument,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub kind: String,
    pub storage_path: String,
    pub original_name: String,
}
