use crate::dto::candidate_dto::{
    ApplicationView, CurrentCandidateView, MessageResponse, SocialProfile, SubmissionForm,
    SubmissionResponse,
};
use crate::error::{Error, Result};
use crate::middleware::session::{clear_session_cookie, session_cookie, CurrentSession};
use crate::models::application::NewDocument;
use crate::models::candidate::LoginContext;
use crate::services::auth_service::Credential;
use crate::utils::validation::parse_flag;
use crate::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use bytes::Bytes;
use uuid::Uuid;

/// Walks the multipart body once. Unknown fields are ignored; consent flags
/// must be present but may carry either value.
async fn parse_submission(
    mut multipart: Multipart,
) -> Result<(SubmissionForm, Option<(String, Bytes)>)> {
    let mut first_name = String::new();
    let mut last_name = String::new();
    let mut email = None;
    let mut phone = None;
    let mut offer_id = String::new();
    let mut rodo_consent = None;
    let mut regulations_consent = None;
    let mut remember_me = None;
    let mut cv = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "first_name" => first_name = field.text().await?,
            "last_name" => last_name = field.text().await?,
            "email" => {
                let value = field.text().await?;
                if !value.trim().is_empty() {
                    email = Some(value);
                }
            }
            "phone" => {
                let value = field.text().await?;
                if !value.trim().is_empty() {
                    phone = Some(value);
                }
            }
            "offer_id" => offer_id = field.text().await?,
            "rodo_consent" => {
                rodo_consent = Some(parse_flag("rodo_consent", &field.text().await?)?)
            }
            "regulations_consent" => {
                regulations_consent =
                    Some(parse_flag("regulations_consent", &field.text().await?)?)
            }
            "remember_me" => remember_me = Some(parse_flag("remember_me", &field.text().await?)?),
            "cv" => {
                let filename = field.file_name().unwrap_or("cv.bin").to_string();
                let data = field.bytes().await?;
                if !data.is_empty() {
                    cv = Some((filename, data));
                }
            }
            _ => {}
        }
    }

    let Some(rodo_consent) = rodo_consent else {
        return Err(Error::Validation("rodo_consent is required".into()));
    };
    let Some(regulations_consent) = regulations_consent else {
        return Err(Error::Validation("regulations_consent is required".into()));
    };

    let form = SubmissionForm {
        first_name,
        last_name,
        email,
        phone,
        offer_id,
        rodo_consent,
        regulations_consent,
        remember_me: remember_me.unwrap_or(false),
    };
    Ok((form, cv))
}

async fn stored_document(state: &AppState, cv: Option<(String, Bytes)>) -> Result<NewDocument> {
    let Some((filename, data)) = cv else {
        return Err(Error::Validation("a CV file is required".into()));
    };
    state.document_service.store_cv(&filename, &data).await
}

pub async fn submit_form(State(state): State<AppState>, multipart: Multipart) -> Result<Response> {
    let (form, cv) = parse_submission(multipart).await?;
    let Some(raw_email) = form.email.clone() else {
        return Err(Error::Validation("email is required".into()));
    };
    let document = stored_document(&state, cv).await?;
    let login = LoginContext::form();

    let outcome = state
        .application_service
        .submit_application(&raw_email, &form, document, login.clone())
        .await?;

    let body = Json(SubmissionResponse {
        candidate_id: outcome.candidate_eid,
        application_id: outcome.application_eid,
    });
    if form.remember_me {
        let token = state.token_service.issue(outcome.candidate_eid, &login)?;
        Ok(([(header::SET_COOKIE, session_cookie(&token))], body).into_response())
    } else {
        Ok(body.into_response())
    }
}

/// Same submission under a session. The session's email is the identity key;
/// whatever the form says about email is ignored.
pub async fn submit_session(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    multipart: Multipart,
) -> Result<Json<SubmissionResponse>> {
    let (form, cv) = parse_submission(multipart).await?;
    let document = stored_document(&state, cv).await?;

    let outcome = state
        .application_service
        .submit_application(
            &session.candidate.email,
            &form,
            document,
            session.login.clone(),
        )
        .await?;

    Ok(Json(SubmissionResponse {
        candidate_id: outcome.candidate_eid,
        application_id: outcome.application_eid,
    }))
}

/// One-click login target for email links. The session middleware has already
/// verified the URL token by the time this runs.
pub async fn login_by_token(
    Extension(session): Extension<CurrentSession>,
) -> Json<MessageResponse> {
    tracing::info!(candidate = %session.candidate.eid, "email-link login");
    Json(MessageResponse {
        msg: "OK".to_string(),
    })
}

pub async fn social_callback(
    State(state): State<AppState>,
    Query(profile): Query<SocialProfile>,
) -> Result<Response> {
    let (candidate, login) = state
        .auth_service
        .authenticate(Credential::Social(profile))
        .await?;
    let token = state.token_service.issue(candidate.eid, &login)?;

    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        Redirect::to(&state.config.social_redirect_url),
    )
        .into_response())
}

pub async fn current_candidate(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<CurrentCandidateView>> {
    let applications = state
        .application_service
        .list_applications(&session.candidate)
        .await?;
    let candidate = &session.candidate;
    Ok(Json(CurrentCandidateView {
        id: candidate.eid,
        first_name: candidate.first_name.clone(),
        last_name: candidate.last_name.clone(),
        email: candidate.email.clone(),
        phone: candidate.phone.clone(),
        login_kind: session.login.kind,
        application_ids: applications.iter().map(|app| app.eid).collect(),
    }))
}

pub async fn list_applications(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<Vec<ApplicationView>>> {
    let applications = state
        .application_service
        .list_applications(&session.candidate)
        .await?;
    Ok(Json(applications.iter().map(ApplicationView::from).collect()))
}

pub async fn get_application(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(application_id): Path<Uuid>,
) -> Result<Json<ApplicationView>> {
    let application = state
        .application_service
        .get_application(&session.candidate, application_id)
        .await?;
    Ok(Json(ApplicationView::from(&application)))
}

pub async fn confirm_application(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(application_id): Path<Uuid>,
) -> Result<Json<ApplicationView>> {
    let application = state
        .application_service
        .confirm_application(&session.candidate, application_id)
        .await?;
    Ok(Json(ApplicationView::from(&application)))
}

pub async fn logout(Extension(session): Extension<CurrentSession>) -> impl IntoResponse {
    tracing::info!(candidate = %session.candidate.eid, "logout");
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(MessageResponse {
            msg: "OK".to_string(),
        }),
    )
}
