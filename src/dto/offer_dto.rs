use serde::{Deserialize, Serialize};

/// Offer as served to the portal frontend: platform offer plus its employer,
/// composed in one response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub employer: EmployerView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployerView {
    pub name: String,
    pub logo: Option<String>,
    pub site: Option<String>,
}
