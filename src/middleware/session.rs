use crate::error::Error;
use crate::models::candidate::{Candidate, LoginContext};
use crate::services::auth_service::Credential;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header::COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};

pub const SESSION_COOKIE: &str = "portal-session";
const SESSION_COOKIE_MAX_AGE_SECS: u32 = 900;

/// What an authenticated request carries: the freshly re-read candidate and
/// the login context baked into the presented token.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub candidate: Candidate,
    pub login: LoginContext,
}

/// Verifies the session credential and attaches `CurrentSession`. The cookie
/// wins over the `token` query parameter; both carry the same token format.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(&req) else {
        return Error::Auth.into_response();
    };
    match state
        .auth_service
        .authenticate(Credential::Bearer(token))
        .await
    {
        Ok((candidate, login)) => {
            req.extensions_mut().insert(CurrentSession { candidate, login });
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

fn extract_token(req: &Request) -> Option<String> {
    cookie_token(req).or_else(|| query_token(req))
}

fn cookie_token(req: &Request) -> Option<String> {
    let header = req.headers().get(COOKIE)?;
    let raw = header.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

fn query_token(req: &Request) -> Option<String> {
    let query = req.uri().query()?;
    query.split('&').find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == "token").then(|| value.to_string())
    })
}

pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly",
        SESSION_COOKIE, token, SESSION_COOKIE_MAX_AGE_SECS
    )
}

pub fn clear_session_cookie() -> String {
    format!("{}=; Max-Age=0; Path=/; HttpOnly", SESSION_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(uri: &str, cookie: Option<&str>) -> Request {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn cookie_is_preferred_over_query() {
        let req = request(
            "/api/candidates/current?token=from-query",
            Some("theme=dark; portal-session=from-cookie"),
        );
        assert_eq!(extract_token(&req).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn query_token_is_the_fallback() {
        let req = request("/api/candidates/current?x=1&token=from-query", None);
        assert_eq!(extract_token(&req).as_deref(), Some("from-query"));
    }

    #[test]
    fn no_credential_yields_none() {
        let req = request("/api/candidates/current", Some("theme=dark"));
        assert_eq!(extract_token(&req), None);
    }

    #[test]
    fn session_cookie_is_http_only_and_short_lived() {
        let cookie = session_cookie("tok");
        assert_eq!(cookie, "portal-session=tok; Max-Age=900; Path=/; HttpOnly");
        assert_eq!(
            clear_session_cookie(),
            "portal-session=; Max-Age=0; Path=/; HttpOnly"
        );
    }
}
