use crate::dto::offer_dto::OfferView;
use crate::error::Result;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

pub async fn get_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
) -> Result<Json<OfferView>> {
    let offer = state.platform_service.fetch_offer(&offer_id).await?;
    Ok(Json(offer))
}
