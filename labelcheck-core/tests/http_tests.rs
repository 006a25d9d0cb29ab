//! HTTP surface tests against an in-memory taxonomy

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use helpers::LabelBuilder;
use http_body_util::BodyExt;
use labelcheck_core::models::{AuditStatus, FormAlias, IngredientForm, IngredientMeta};
use labelcheck_core::services::InMemoryReferenceStore;
use labelcheck_core::ul::UlCalculator;
use labelcheck_core::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn form(ingredient_id: i64, key: &str, label: &str, status: AuditStatus) -> IngredientForm {
    IngredientForm {
        ingredient_id,
        form_key: key.to_string(),
        form_label: label.to_string(),
        audit_status: status,
    }
}

fn meta(ingredient_id: i64, name: &str, unit: &str, ul: Option<f64>) -> IngredientMeta {
    IngredientMeta {
        ingredient_id,
        name: name.to_string(),
        unit: Some(unit.to_string()),
        rda_adult: None,
        ul_adult: ul,
    }
}

fn setup_app() -> Router {
    let store = InMemoryReferenceStore {
        forms: vec![
            form(1, "citrate", "Citrate", AuditStatus::Verified),
            form(1, "glycinate", "Glycinate", AuditStatus::Verified),
            form(1, "oxide", "Oxide", AuditStatus::Pending),
        ],
        aliases: vec![FormAlias {
            alias_text: "Magtein".to_string(),
            alias_norm: None,
            form_key: "glycinate".to_string(),
            ingredient_id: Some(1),
        }],
        meta: vec![
            meta(1, "Magnesium", "mg", Some(350.0)),
            meta(2, "Zinc", "mg", Some(40.0)),
            meta(5, "Vitamin C", "mg", None),
        ],
    };
    let calculator = UlCalculator::new(0.8).unwrap();
    build_router(AppState::new(Arc::new(store), calculator))
}

async fn send(app: &Router, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(json_body) => builder
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let app = setup_app();
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "labelcheck");
}

#[tokio::test]
async fn test_structure_label() {
    let app = setup_app();
    let tokens = LabelBuilder::new()
        .line(&[(20.0, "Supplement Facts")])
        .line(&[(20.0, "Serving Size 2 Capsules")])
        .line(&[(520.0, "Amount Per Serving"), (760.0, "% Daily Value")])
        .ingredient("Magnesium (as glycinate)", "200 mg", "48 %")
        .build();

    let (status, body) = send(
        &app,
        "POST",
        "/labels/structure",
        Some(json!({ "tokens": tokens })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["servingSize"], "2 Capsules");
    assert_eq!(body["ingredients"][0]["amount"], 200.0);
    assert_eq!(body["ingredients"][0]["unit"], "mg");
    assert_eq!(body["needsConfirmation"], false);
}

#[tokio::test]
async fn test_structure_empty_tokens() {
    let app = setup_app();
    let (status, body) = send(&app, "POST", "/labels/structure", Some(json!({ "tokens": [] }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ingredients"], json!([]));
    assert_eq!(body["needsConfirmation"], true);
}

#[tokio::test]
async fn test_canonicalize() {
    let app = setup_app();
    let (status, body) = send(
        &app,
        "POST",
        "/forms/canonicalize",
        Some(json!({ "sources": ["CoQ10"] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["canonical"], json!(["ubiquinone"]));
    assert!(body["explicit"].is_array());
}

#[tokio::test]
async fn test_canonicalize_requires_sources() {
    let app = setup_app();
    let (status, body) = send(
        &app,
        "POST",
        "/forms/canonicalize",
        Some(json!({ "sources": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_match_outcomes() {
    let app = setup_app();

    let (status, body) = send(
        &app,
        "POST",
        "/forms/match",
        Some(json!({ "ingredientId": 1, "candidate": "Magtein" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], true);
    assert_eq!(body["form_key"], "glycinate");

    // Pending forms never match
    let (_, body) = send(
        &app,
        "POST",
        "/forms/match",
        Some(json!({ "ingredientId": 1, "candidate": "magnesium oxide" })),
    )
    .await;
    assert_eq!(body["matched"], false);
    assert_eq!(body["outcome"], "no_match");

    let (_, body) = send(
        &app,
        "POST",
        "/forms/match",
        Some(json!({ "ingredientId": 2, "candidate": "zinc picolinate" })),
    )
    .await;
    assert_eq!(body["outcome"], "missing_verified_forms");
}

#[tokio::test]
async fn test_ul_warnings() {
    let app = setup_app();
    let (status, body) = send(
        &app,
        "POST",
        "/ul/warnings",
        Some(json!({
            "ingredients": [
                { "ingredientId": 1, "name": "Magnesium", "amount": 200, "unit": "mg" },
                { "ingredientId": 2, "name": "Zinc", "amount": 35, "unit": "mg" },
                { "ingredientId": 5, "name": "Vitamin C", "amount": 5000, "unit": "mg" }
            ],
            "dailyMultiplier": { "value": 2.0, "source": "label_directions", "reliability": "high" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["high"], json!(["Magnesium", "Zinc"]));
    assert_eq!(body["moderate"], json!([]));
    assert_eq!(body["basis"], "per_day_adult");
    assert_eq!(body["dailyMultiplierUsed"], 2.0);
    assert_eq!(body["dailyMultiplierReliability"], "high");
}

#[tokio::test]
async fn test_ul_warnings_default_multiplier() {
    let app = setup_app();
    let (status, body) = send(
        &app,
        "POST",
        "/ul/warnings",
        Some(json!({
            "ingredients": [
                { "ingredientId": 1, "name": "Magnesium", "amount": 300, "unit": "mg" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["high"], json!([]));
    assert_eq!(body["moderate"], json!(["Magnesium"]));
    assert_eq!(body["dailyMultiplierSource"], "assumed_single_serving");
}
