pub mod candidate_routes;
pub mod health;
pub mod offer_routes;

use crate::error::{envelope_middleware, new_boundary};
use crate::middleware::session::require_session;
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let open = Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/candidates/applications/form",
            post(candidate_routes::submit_form),
        )
        .route(
            "/api/candidates/login/social/callback",
            get(candidate_routes::social_callback),
        )
        .route("/api/offers/:offer_id", get(offer_routes::get_offer));

    let authenticated = Router::new()
        .route(
            "/api/candidates/applications/session",
            post(candidate_routes::submit_session),
        )
        .route("/api/candidates/login", get(candidate_routes::login_by_token))
        .route(
            "/api/candidates/current",
            get(candidate_routes::current_candidate),
        )
        .route(
            "/api/candidates/current/applications",
            get(candidate_routes::list_applications),
        )
        .route(
            "/api/candidates/current/applications/:application_id",
            get(candidate_routes::get_application),
        )
        .route(
            "/api/candidates/current/applications/:application_id/confirm",
            get(candidate_routes::confirm_application),
        )
        .route("/api/candidates/current/logout", get(candidate_routes::logout))
        .layer(from_fn_with_state(state.clone(), require_session));

    let boundary = new_boundary(state.config.dev_mode());

    Router::new()
        .merge(open)
        .merge(authenticated)
        .with_state(state)
        .layer(from_fn_with_state(boundary, envelope_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
