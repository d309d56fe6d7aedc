pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
pub mod utils;

use crate::config::Config;
use crate::services::{
    application_service::ApplicationService, auth_service::AuthService,
    document_service::DocumentService, mail_service::Mailer, platform_service::PlatformService,
    token_service::TokenService,
};
use crate::storage::CandidateStore;
use reqwest::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub application_service: ApplicationService,
    pub auth_service: AuthService,
    pub token_service: TokenService,
    pub platform_service: PlatformService,
    pub document_service: DocumentService,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn CandidateStore>,
        mailer: Arc<dyn Mailer>,
        http_client: Client,
    ) -> Self {
        let token_service = TokenService::new(
            config.jwt_secret.clone(),
            config.token_issuer.clone(),
            config.token_audience.clone(),
        );
        let application_service = ApplicationService::new(
            store.clone(),
            mailer,
            token_service.clone(),
            config.portal_base_url.clone(),
        );
        let auth_service = AuthService::new(store, token_service.clone());
        let platform_service = PlatformService::new(
            http_client,
            config.platform_base_url.clone(),
            config.platform_offer_key.clone(),
            config.platform_employer_key.clone(),
        );
        let document_service = DocumentService::new(config.upload_dir.clone());

        Self {
            config: Arc::new(config),
            application_service,
            auth_service,
            token_service,
            platform_service,
            document_service,
        }
    }
}
