use crate::error::{Error, Result};
use crate::models::candidate::LoginContext;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: usize,
    pub login: LoginContext,
}

/// Issues and verifies the signed session credential. The same token format
/// serves both delivery channels (cookie and email-link query parameter).
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
}

impl TokenService {
    pub fn new(secret: String, issuer: String, audience: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
        }
    }

    pub fn issue(&self, candidate_eid: Uuid, login: &LoginContext) -> Result<String> {
        self.issue_with_expiry(
            candidate_eid,
            login,
            Utc::now() + Duration::seconds(TOKEN_TTL_SECS),
        )
    }

    fn issue_with_expiry(
        &self,
        candidate_eid: Uuid,
        login: &LoginContext,
        expires_at: DateTime<Utc>,
    ) -> Result<String> {
        let claims = Claims {
            sub: candidate_eid.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: expires_at.timestamp() as usize,
            login: login.clone(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| Error::Integrity(format!("token issuance failed: {}", err)))
    }

    /// Checks signature, expiry, issuer and audience. Every failure collapses
    /// to the same answer so callers cannot tell which check tripped.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| Error::Auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            "test-secret".to_string(),
            "portal".to_string(),
            "candidates".to_string(),
        )
    }

    #[test]
    fn round_trip_preserves_subject_and_login() {
        let svc = service();
        let eid = Uuid::new_v4();
        let login = LoginContext::social("soc-42");

        let token = svc.issue(eid, &login).unwrap();
        let claims = svc.verify(&token).unwrap();

        assert_eq!(claims.sub, eid.to_string());
        assert_eq!(claims.login.social_id.as_deref(), Some("soc-42"));
        assert!(claims.login.email_verified);
    }

    #[test]
    fn expired_tokens_fail_verification() {
        let svc = service();
        // Two hours in the past clears the default verification leeway.
        let token = svc
            .issue_with_expiry(
                Uuid::new_v4(),
                &LoginContext::form(),
                Utc::now() - Duration::hours(2),
            )
            .unwrap();

        let err = svc.verify(&token).unwrap_err();
        assert_eq!(err.to_string(), "invalid or expired token");
    }

    #[test]
    fn foreign_secret_fails_verification() {
        let svc = service();
        let other = TokenService::new(
            "different-secret".to_string(),
            "portal".to_string(),
            "candidates".to_string(),
        );
        let token = other.issue(Uuid::new_v4(), &LoginContext::form()).unwrap();
        assert!(svc.verify(&token).is_err());
    }

    #[test]
    fn issuer_and_audience_are_enforced() {
        let svc = service();
        let other = TokenService::new(
            "test-secret".to_string(),
            "someone-else".to_string(),
            "candidates".to_string(),
        );
        let token = other.issue(Uuid::new_v4(), &LoginContext::form()).unwrap();
        assert!(svc.verify(&token).is_err());
    }
}
