use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageMode {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw {
            "postgres" => Ok(StorageMode::Postgres),
            "memory" => Ok(StorageMode::Memory),
            other => Err(format!("unknown storage mode: {}", other)),
        }
    }
}

/// Loaded once in `main` and carried inside `AppState`. Nothing reads the
/// environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub app_env: String,
    pub storage_mode: StorageMode,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_issuer: String,
    pub token_audience: String,
    pub upload_dir: String,
    pub portal_base_url: String,
    pub social_redirect_url: String,
    pub platform_base_url: String,
    pub platform_offer_key: String,
    pub platform_employer_key: String,
    pub mail_relay_url: String,
    pub mail_from: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let storage_mode: StorageMode = get_env_or("STORAGE_MODE", "postgres")?
            .parse()
            .map_err(Error::Config)?;
        // Memory mode needs no database; Postgres mode fails fast without one.
        let database_url = match storage_mode {
            StorageMode::Postgres => Some(get_env("DATABASE_URL")?),
            StorageMode::Memory => env::var("DATABASE_URL").ok(),
        };

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            app_env: get_env_or("APP_ENV", "production")?,
            storage_mode,
            database_url,
            jwt_secret: get_env("JWT_SECRET")?,
            token_issuer: get_env("TOKEN_ISSUER")?,
            token_audience: get_env("TOKEN_AUDIENCE")?,
            upload_dir: get_env("UPLOAD_DIR")?,
            portal_base_url: get_env("PORTAL_BASE_URL")?,
            social_redirect_url: get_env("SOCIAL_REDIRECT_URL")?,
            platform_base_url: get_env("PLATFORM_BASE_URL")?,
            platform_offer_key: get_env("PLATFORM_OFFER_KEY")?,
            platform_employer_key: get_env("PLATFORM_EMPLOYER_KEY")?,
            mail_relay_url: get_env("MAIL_RELAY_URL")?,
            mail_from: get_env("MAIL_FROM")?,
        })
    }

    pub fn dev_mode(&self) -> bool {
        self.app_env == "development"
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) => Ok(value),
        Err(_) => Ok(default.to_string()),
    }
}
