//! Label structuring endpoint

use axum::{routing::post, Json, Router};
use serde::Deserialize;

use crate::label::structure_label;
use crate::models::{LabelDraft, Token};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StructureRequest {
    pub tokens: Vec<Token>,
}

/// POST /labels/structure
///
/// Malformed labels never fail the request; they come back as a low
/// confidence draft with issues and `needsConfirmation`.
pub async fn structure(Json(request): Json<StructureRequest>) -> Json<LabelDraft> {
    Json(structure_label(&request.tokens))
}

pub fn label_routes() -> Router<AppState> {
    Router::new().route("/labels/structure", post(structure))
}
