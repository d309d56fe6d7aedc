use crate::models::application::Application;
use crate::models::candidate::LoginKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A submission form after multipart extraction. `email` stays optional here
/// because a session submit takes the address from the session, not the form.
#[derive(Debug, Clone, Validate)]
pub struct SubmissionForm {
    #[validate(length(min = 1, message = "first_name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last_name is required"))]
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "offer_id is required"))]
    pub offer_id: String,
    pub rodo_consent: bool,
    pub regulations_consent: bool,
    pub remember_me: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub candidate_id: Uuid,
    pub application_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentView {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub text: String,
}

/// Client-facing projection of one application. Storage paths and internal
/// ids never appear here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationView {
    pub id: Uuid,
    pub offer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub rodo_consent: bool,
    pub regulations_consent: bool,
    pub remember_me: bool,
    pub confirmed: bool,
    pub documents: Vec<DocumentView>,
    pub messages: Vec<MessageView>,
}

impl From<&Application> for ApplicationView {
    fn from(app: &Application) -> Self {
        Self {
            id: app.eid,
            offer_id: app.offer_id.clone(),
            first_name: app.user_details.first_name.clone(),
            last_name: app.user_details.last_name.clone(),
            email: app.user_details.email.clone(),
            phone: app.user_details.phone.clone(),
            rodo_consent: app.user_details.rodo_consent,
            regulations_consent: app.user_details.regulations_consent,
            remember_me: app.user_details.remember_me,
            confirmed: app.confirmed,
            documents: app
                .documents
                .iter()
                .map(|doc| DocumentView {
                    name: doc.original_name.clone(),
                    kind: doc.kind.clone(),
                })
                .collect(),
            messages: app
                .messages
                .iter()
                .map(|msg| MessageView {
                    text: msg.body.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentCandidateView {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub login_kind: LoginKind,
    pub application_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub msg: String,
}

/// Social callback profile, carried as query parameters. Everything optional
/// so that missing pieces surface as taxonomy errors, not extractor noise.
#[derive(Debug, Clone, Deserialize)]
pub struct SocialProfile {
    pub social_id: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}
