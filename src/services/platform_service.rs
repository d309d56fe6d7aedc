use crate::dto::offer_dto::{EmployerView, OfferView};
use crate::error::{Error, Result};
use axum::http::StatusCode;
use reqwest::Client;
use serde::{Deserialize, Deserializer};

fn deserialize_id_flexible<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Str(String),
        Int(i64),
    }

    Ok(Option::<IdRepr>::deserialize(deserializer)?.map(|id| match id {
        IdRepr::Str(s) => s,
        IdRepr::Int(i) => i.to_string(),
    }))
}

/// Offer payload as the platform serves it. A present `error` field means the
/// lookup failed even when the HTTP status says otherwise.
#[derive(Debug, Clone, Deserialize)]
struct PlatformOffer {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    nazwa: Option<String>,
    #[serde(default)]
    zakres_zadan: Option<String>,
    #[serde(default)]
    active: Option<String>,
    #[serde(default, deserialize_with = "deserialize_id_flexible")]
    id_pracodawcy: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlatformEmployer {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    nazwa: Option<String>,
    #[serde(default)]
    logo: Option<String>,
    #[serde(default)]
    www: Option<String>,
}

fn classify_upstream(upstream_status: u16, message: String) -> Error {
    let status = if (400..500).contains(&upstream_status) {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Error::Upstream { status, message }
}

/// Read-only proxy for the external job platform. Composes an offer with its
/// employer in one call; nothing here is cached or persisted.
#[derive(Clone)]
pub struct PlatformService {
    client: Client,
    base_url: String,
    offer_key: String,
    employer_key: String,
}

impl PlatformService {
    pub fn new(client: Client, base_url: String, offer_key: String, employer_key: String) -> Self {
        Self {
            client,
            base_url,
            offer_key,
            employer_key,
        }
    }

    pub async fn fetch_offer(&self, offer_id: &str) -> Result<OfferView> {
        let offer = self.fetch_offer_payload(offer_id).await?;
        let employer_id = offer.id_pracodawcy.as_deref().ok_or_else(|| Error::Upstream {
            status: StatusCode::NOT_FOUND,
            message: format!("offer {} has no employer reference", offer_id),
        })?;
        let employer = self.fetch_employer(employer_id).await?;

        Ok(OfferView {
            id: offer_id.to_string(),
            name: offer.nazwa.unwrap_or_default(),
            description: offer.zakres_zadan.unwrap_or_default(),
            active: offer.active.as_deref() == Some("t"),
            employer,
        })
    }

    async fn fetch_offer_payload(&self, offer_id: &str) -> Result<PlatformOffer> {
        let url = format!(
            "{}/api_v1/recrutation/{}/{}",
            self.base_url, self.offer_key, offer_id
        );
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_upstream(
                status.as_u16(),
                format!("platform answered {} for offer {}", status, offer_id),
            ));
        }
        let offer: PlatformOffer = response.json().await?;
        if let Some(error) = &offer.error {
            tracing::warn!(offer_id, error, "platform rejected offer lookup");
            return Err(Error::Upstream {
                status: StatusCode::NOT_FOUND,
                message: "offer not found".into(),
            });
        }
        Ok(offer)
    }

    async fn fetch_employer(&self, employer_id: &str) -> Result<EmployerView> {
        let url = format!(
            "{}/api_v1/employer/{}/{}",
            self.base_url, self.employer_key, employer_id
        );
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_upstream(
                status.as_u16(),
                format!("platform answered {} for employer {}", status, employer_id),
            ));
        }
        let employer: PlatformEmployer = response.json().await?;
        if let Some(error) = &employer.error {
            tracing::warn!(employer_id, error, "platform rejected employer lookup");
            return Err(Error::Upstream {
                status: StatusCode::NOT_FOUND,
                message: "employer not found".into(),
            });
        }
        Ok(EmployerView {
            name: employer.nazwa.unwrap_or_default(),
            logo: employer.logo,
            site: employer.www,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_4xx_maps_to_not_found() {
        let err = classify_upstream(404, "gone".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        let err = classify_upstream(422, "bad key".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn upstream_5xx_maps_to_internal_error() {
        let err = classify_upstream(503, "down".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn employer_reference_accepts_numbers_and_strings() {
        let offer: PlatformOffer =
            serde_json::from_str(r#"{"nazwa":"Dev","id_pracodawcy":17}"#).unwrap();
        assert_eq!(offer.id_pracodawcy.as_deref(), Some("17"));

        let offer: PlatformOffer =
            serde_json::from_str(r#"{"nazwa":"Dev","id_pracodawcy":"emp-17"}"#).unwrap();
        assert_eq!(offer.id_pracodawcy.as_deref(), Some("emp-17"));
    }

    #[test]
    fn active_flag_reads_platform_notation() {
        let offer: PlatformOffer =
            serde_json::from_str(r#"{"nazwa":"Dev","active":"t"}"#).unwrap();
        assert_eq!(offer.active.as_deref(), Some("t"));
        let offer: PlatformOffer =
            serde_json::from_str(r#"{"nazwa":"Dev","active":"f"}"#).unwrap();
        assert_ne!(offer.active.as_deref(), Some("t"));
    }
}
