use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    /// Undifferentiated on purpose: signature, expiry, issuer, audience and
    /// unknown-subject failures must all read the same to the caller.
    #[error("invalid or expired token")]
    Auth,

    /// Social-callback rejection (incomplete profile). Same taxonomy name as
    /// `Auth` but answered with 400, matching the callback contract.
    #[error("{0}")]
    LoginRejected(String),

    #[error("{0}")]
    NotFound(String),

    /// Invariant violation in stored data. Never user error; logged alertable.
    #[error("{0}")]
    Integrity(String),

    #[error("storage unavailable")]
    Storage(#[from] sqlx::Error),

    #[error("document storage failed")]
    DocumentIo(#[from] std::io::Error),

    /// Platform call failed or returned an error payload. `status` is the
    /// already-classified caller status: 404 for the unknown-offer class,
    /// 500 for transport failures and upstream outages.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::LoginRejected(_) => StatusCode::BAD_REQUEST,
            Error::Auth => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Upstream { status, .. } => *status,
            Error::Config(_) | Error::Integrity(_) | Error::Storage(_) | Error::DocumentIo(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Taxonomy name surfaced in the envelope's `exception` field.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::Config(_) => "ConfigError",
            Error::Validation(_) => "ValidationError",
            Error::Auth | Error::LoginRejected(_) => "AuthError",
            Error::NotFound(_) => "NotFoundError",
            Error::Integrity(_) => "IntegrityError",
            Error::Storage(_) | Error::DocumentIo(_) => "StorageError",
            Error::Upstream { .. } => "UpstreamError",
        }
    }
}

/// Coarse label used in the envelope's `error` field and as the log class tag.
pub fn class_label(status: StatusCode) -> &'static str {
    if status == StatusCode::NOT_FOUND {
        "NOT_FOUND"
    } else if status == StatusCode::UNAUTHORIZED {
        "UNAUTHORIZED"
    } else if status.is_client_error() {
        "BAD_REQUEST"
    } else {
        "INTERNAL_SERVER_ERROR"
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Error::Validation(err.to_string())
    }
}

impl From<axum::extract::multipart::MultipartError> for Error {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Error::Validation(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let status = match err.status() {
            Some(s) if s.is_client_error() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Error::Upstream {
            status,
            message: format!("platform request failed: {err}"),
        }
    }
}

/// What the boundary translator needs from a failed handler. Parked in the
/// response extensions by `IntoResponse` and picked up by the outermost
/// middleware, which owns the request path and the incident id.
#[derive(Debug, Clone)]
pub struct ErrorDetails {
    pub status: StatusCode,
    pub exception: &'static str,
    pub message: String,
    pub detail: Option<String>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = std::error::Error::source(&self).map(|src| src.to_string());
        let details = ErrorDetails {
            status,
            exception: self.kind_name(),
            message: self.to_string(),
            detail,
        };
        let mut response = status.into_response();
        response.extensions_mut().insert(details);
        response
    }
}

#[derive(Clone, Debug)]
pub struct ErrorBoundary {
    dev_mode: bool,
}

pub fn new_boundary(dev_mode: bool) -> ErrorBoundary {
    ErrorBoundary { dev_mode }
}

/// Single boundary translator: every error that crosses the HTTP surface gets
/// an incident id, a full-context log event tagged by error class, and the
/// uniform envelope. Internal detail is only echoed in development mode.
pub async fn envelope_middleware(
    State(boundary): State<ErrorBoundary>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    let method = req.method().clone();
    let response = next.run(req).await;

    let Some(details) = response.extensions().get::<ErrorDetails>().cloned() else {
        return response;
    };

    let incident_id = Uuid::new_v4();
    let status = details.status;
    let class = class_label(status);

    if details.exception == "IntegrityError" {
        tracing::error!(
            incident = %incident_id,
            class,
            status = status.as_u16(),
            %method,
            %path,
            exception = details.exception,
            message = %details.message,
            detail = ?details.detail,
            alert = true,
            "invariant violation"
        );
    } else if status.is_server_error() {
        tracing::error!(
            incident = %incident_id,
            class,
            status = status.as_u16(),
            %method,
            %path,
            exception = details.exception,
            message = %details.message,
            detail = ?details.detail,
            "request failed"
        );
    } else {
        tracing::warn!(
            incident = %incident_id,
            class,
            status = status.as_u16(),
            %method,
            %path,
            exception = details.exception,
            message = %details.message,
            "request rejected"
        );
    }

    let mut body = json!({
        "id": incident_id,
        "timestamp": Utc::now(),
        "status": status.as_u16(),
        "error": class,
        "exception": details.exception,
        "message": details.message,
        "path": path,
    });
    if boundary.dev_mode {
        if let Some(detail) = details.detail {
            body["detail"] = json!(detail);
        }
    }

    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            Error::Validation("missing email".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::Auth.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::LoginRejected("no email in profile".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotFound("application".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Integrity("duplicate external id".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_status_is_carried_through() {
        let err = Error::Upstream {
            status: StatusCode::NOT_FOUND,
            message: "offer not returned by the platform".into(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.kind_name(), "UpstreamError");
    }

    #[test]
    fn auth_variants_share_the_taxonomy_name() {
        assert_eq!(Error::Auth.kind_name(), "AuthError");
        assert_eq!(
            Error::LoginRejected("incomplete profile".into()).kind_name(),
            "AuthError"
        );
        assert_eq!(Error::Auth.to_string(), "invalid or expired token");
    }

    #[test]
    fn class_labels_match_the_envelope_contract() {
        assert_eq!(class_label(StatusCode::BAD_REQUEST), "BAD_REQUEST");
        assert_eq!(class_label(StatusCode::UNAUTHORIZED), "UNAUTHORIZED");
        assert_eq!(class_label(StatusCode::NOT_FOUND), "NOT_FOUND");
        assert_eq!(
            class_label(StatusCode::INTERNAL_SERVER_ERROR),
            "INTERNAL_SERVER_ERROR"
        );
        assert_eq!(class_label(StatusCode::CONFLICT), "BAD_REQUEST");
    }
}
