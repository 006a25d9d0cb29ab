//! Form canonicalization and matching endpoints

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::forms::{
    canonicalize_form_tokens, collect_explicit_form_tokens, match_form, FormMatchOutcome,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CanonicalizeRequest {
    pub sources: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CanonicalizeResponse {
    pub canonical: Vec<String>,
    pub explicit: Vec<String>,
}

/// POST /forms/canonicalize
pub async fn canonicalize(
    Json(request): Json<CanonicalizeRequest>,
) -> ApiResult<Json<CanonicalizeResponse>> {
    if request.sources.is_empty() {
        return Err(ApiError::BadRequest("sources must not be empty".to_string()));
    }

    Ok(Json(CanonicalizeResponse {
        canonical: canonicalize_form_tokens(&request.sources),
        explicit: collect_explicit_form_tokens(&request.sources),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub ingredient_id: i64,
    pub candidate: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub ingredient_id: i64,
    pub candidate: String,
    pub matched: bool,
    #[serde(flatten)]
    pub outcome: FormMatchOutcome,
}

/// POST /forms/match
pub async fn match_candidate(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> ApiResult<Json<MatchResponse>> {
    let id = request.ingredient_id;
    let reference = state.reference.load_reference(&[id]).await?;
    let outcome = match_form(&request.candidate, id, reference.forms_for(id), reference.aliases());

    tracing::debug!(ingredient_id = id, outcome = ?outcome, "Form match request");

    Ok(Json(MatchResponse {
        ingredient_id: id,
        candidate: request.candidate,
        matched: outcome.is_match(),
        outcome,
    }))
}

pub fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/forms/canonicalize", post(canonicalize))
        .route("/forms/match", post(match_candidate))
}
