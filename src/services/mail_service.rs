use crate::error::{Error, Result};
use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::Client;
use serde_json::json;

/// Email-dispatch sink. One call per message; retries are the relay's problem.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Production sink: hands the message to an HTTP mail relay as JSON.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    relay_url: String,
    from: String,
}

impl HttpMailer {
    pub fn new(client: Client, relay_url: String, from: String) -> Self {
        Self {
            client,
            relay_url,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let payload = json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "body": body,
        });
        let response = self.client.post(&self.relay_url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(Error::Upstream {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("mail relay answered {}", response.status()),
            });
        }
        Ok(())
    }
}
