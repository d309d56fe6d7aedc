use crate::dto::candidate_dto::SocialProfile;
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, LoginContext};
use crate::services::token_service::TokenService;
use crate::storage::CandidateStore;
use crate::utils::validation::normalize_email;
use std::sync::Arc;
use uuid::Uuid;

/// The closed set of ways a caller can prove who they are.
#[derive(Debug, Clone)]
pub enum Credential {
    Bearer(String),
    Social(SocialProfile),
}

/// Dispatches each credential kind to its verifier; every arm returns the
/// same (candidate, login context) shape.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CandidateStore>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(store: Arc<dyn CandidateStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    pub async fn authenticate(&self, credential: Credential) -> Result<(Candidate, LoginContext)> {
        match credential {
            Credential::Bearer(token) => self.verify_bearer(&token).await,
            Credential::Social(profile) => self.login_social(profile).await,
        }
    }

    /// The token proves identity but is never trusted as state: the candidate
    /// is re-read, and a subject that no longer resolves fails like any other
    /// bad token.
    async fn verify_bearer(&self, token: &str) -> Result<(Candidate, LoginContext)> {
        let claims = self.tokens.verify(token)?;
        let eid = Uuid::parse_str(&claims.sub).map_err(|_| Error::Auth)?;
        let candidate = self.store.find_by_eid(eid).await?.ok_or(Error::Auth)?;
        Ok((candidate, claims.login))
    }

    async fn login_social(&self, profile: SocialProfile) -> Result<(Candidate, LoginContext)> {
        let social_id = profile
            .social_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Validation("social_id is required".into()))?;
        let raw_email = profile
            .email
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::LoginRejected("social login did not provide an email address".into())
            })?;
        let email = normalize_email(raw_email).map_err(|_| {
            Error::LoginRejected("social login did not provide a usable email address".into())
        })?;

        let login = LoginContext::social(social_id);
        let candidate = self
            .store
            .upsert_social(
                &email,
                profile.first_name.as_deref().unwrap_or_default(),
                profile.last_name.as_deref().unwrap_or_default(),
                &login,
            )
            .await?;
        tracing::info!(candidate = %candidate.eid, "social login resolved");
        Ok((candidate, login))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryCandidateStore;

    fn service(store: Arc<MemoryCandidateStore>) -> AuthService {
        AuthService::new(
            store,
            TokenService::new(
                "test-secret".to_string(),
                "portal".to_string(),
                "candidates".to_string(),
            ),
        )
    }

    fn profile(email: Option<&str>) -> SocialProfile {
        SocialProfile {
            social_id: Some("soc-9".to_string()),
            email: email.map(str::to_string),
            first_name: Some("Ann".to_string()),
            last_name: Some("Lee".to_string()),
        }
    }

    #[tokio::test]
    async fn social_login_resolves_and_marks_verified() {
        let store = Arc::new(MemoryCandidateStore::new());
        let svc = service(store.clone());

        let (candidate, login) = svc
            .authenticate(Credential::Social(profile(Some("Ann@X.com"))))
            .await
            .unwrap();
        assert_eq!(candidate.email, "ann@x.com");
        assert!(login.email_verified);
        assert_eq!(login.social_id.as_deref(), Some("soc-9"));
    }

    #[tokio::test]
    async fn social_login_without_email_is_rejected() {
        let store = Arc::new(MemoryCandidateStore::new());
        let svc = service(store);

        let err = svc
            .authenticate(Credential::Social(profile(None)))
            .await
            .unwrap_err();
        assert_eq!(err.kind_name(), "AuthError");
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bearer_with_unresolvable_subject_fails() {
        let store = Arc::new(MemoryCandidateStore::new());
        let tokens = TokenService::new(
            "test-secret".to_string(),
            "portal".to_string(),
            "candidates".to_string(),
        );
        let svc = AuthService::new(store, tokens.clone());

        // Valid signature, but no candidate behind the subject.
        let token = tokens
            .issue(Uuid::new_v4(), &LoginContext::form())
            .unwrap();
        let err = svc
            .authenticate(Credential::Bearer(token))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid or expired token");
    }

    #[tokio::test]
    async fn bearer_round_trip_returns_current_candidate() {
        let store = Arc::new(MemoryCandidateStore::new());
        let tokens = TokenService::new(
            "test-secret".to_string(),
            "portal".to_string(),
            "candidates".to_string(),
        );
        let svc = AuthService::new(store.clone(), tokens.clone());

        let (candidate, login) = svc
            .authenticate(Credential::Social(profile(Some("ann@x.com"))))
            .await
            .unwrap();
        let token = tokens.issue(candidate.eid, &login).unwrap();

        let (fetched, session_login) = svc
            .authenticate(Credential::Bearer(token))
            .await
            .unwrap();
        assert_eq!(fetched.eid, candidate.eid);
        assert_eq!(session_login.session_id, login.session_id);
    }
}
