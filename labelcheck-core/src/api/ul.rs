//! UL warning endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::models::ProductIngredient;
use crate::ul::{DailyMultiplier, UlWarnings};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UlRequest {
    pub ingredients: Vec<ProductIngredient>,
    #[serde(default)]
    pub daily_multiplier: DailyMultiplier,
}

/// POST /ul/warnings
pub async fn ul_warnings(
    State(state): State<AppState>,
    Json(request): Json<UlRequest>,
) -> ApiResult<Json<UlWarnings>> {
    let ids: Vec<i64> = request
        .ingredients
        .iter()
        .filter_map(|i| i.ingredient_id)
        .collect();
    let reference = state.reference.load_reference(&ids).await?;

    Ok(Json(state.ul.compute(
        &request.ingredients,
        &reference,
        &request.daily_multiplier,
    )))
}

pub fn ul_routes() -> Router<AppState> {
    Router::new().route("/ul/warnings", post(ul_warnings))
}
