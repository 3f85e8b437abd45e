//! HTTP surface tests over the in-memory store

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{middleware, Router};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use equifund::api::{self, AppState};
use equifund::engine::{CampaignEngine, InvestmentEngine, MarketplaceEngine};

use common::TestApp;

fn router(app: &TestApp) -> Router {
    // Same wiring as the binary, minus the database.
    let state = AppState {
        campaigns: Arc::new(CampaignEngine::new(app.store.clone(), app.publisher.clone())),
        investments: Arc::new(InvestmentEngine::new(
            app.store.clone(),
            app.store.clone(),
            app.store.clone(),
            app.store.clone(),
            Arc::new(equifund::engine::StandardInvestmentValidator),
            app.publisher.clone(),
            48,
        )),
        marketplace: Arc::new(MarketplaceEngine::new(
            app.store.clone(),
            app.store.clone(),
            app.store.clone(),
            Arc::new(equifund::engine::StandardMarketplacePolicy::new(180, 200)),
            app.publisher.clone(),
            30,
        )),
    };

    api::create_router()
        .layer(middleware::from_fn(api::middleware::context_middleware))
        .with_state(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(path: &str, user: Option<Uuid>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("X-Request-User-Id", user.to_string());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_create_investment_requires_user_header() {
    let app = TestApp::new();
    let campaign = app.seed_live_campaign().await;

    let response = router(&app)
        .oneshot(post_json(
            "/investments",
            None,
            json!({
                "campaign_id": campaign.id,
                "amount": "10000",
                "payment_method": "MPESA"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "missing_header");
}

#[tokio::test]
async fn test_create_investment_created() {
    let app = TestApp::new();
    let investor = app.seed_investor().await;
    let campaign = app.seed_live_campaign().await;

    let response = router(&app)
        .oneshot(post_json(
            "/investments",
            Some(investor.id),
            json!({
                "campaign_id": campaign.id,
                "amount": "10050",
                "payment_method": "MPESA"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["shares"], 100);
    assert_eq!(body["status"], "PENDING");
}

#[tokio::test]
async fn test_business_rule_maps_to_422() {
    let app = TestApp::new();
    let investor = app.seed_investor().await;
    let campaign = app
        .seed_campaign(
            equifund::aggregate::CampaignStatus::Draft,
            dec!(100),
            dec!(10),
        )
        .await;

    let response = router(&app)
        .oneshot(post_json(
            "/investments",
            Some(investor.id),
            json!({
                "campaign_id": campaign.id,
                "amount": "10000",
                "payment_method": "CARD"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "business_rule_violation");
    assert_eq!(body["error"], "Campaign is not accepting investments");
}

#[tokio::test]
async fn test_invalid_amount_maps_to_400() {
    let app = TestApp::new();
    let investor = app.seed_investor().await;
    let campaign = app.seed_live_campaign().await;

    let response = router(&app)
        .oneshot(post_json(
            "/investments",
            Some(investor.id),
            json!({
                "campaign_id": campaign.id,
                "amount": "-100",
                "payment_method": "BANK"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "invalid_request");
}

#[tokio::test]
async fn test_unknown_campaign_maps_to_404() {
    let app = TestApp::new();

    let response = router(&app)
        .oneshot(
            Request::builder()
                .uri(format!("/campaigns/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "not_found");
}

#[tokio::test]
async fn test_campaign_transition_endpoint() {
    let app = TestApp::new();
    let admin = Uuid::new_v4();
    let campaign = app
        .seed_campaign(
            equifund::aggregate::CampaignStatus::Draft,
            dec!(100),
            dec!(10),
        )
        .await;

    let response = router(&app)
        .oneshot(post_json(
            &format!("/campaigns/{}/transition", campaign.id),
            Some(admin),
            json!({"target_status": "REVIEW"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "REVIEW");

    // Same-status transition rejected.
    let response = router(&app)
        .oneshot(post_json(
            &format!("/campaigns/{}/transition", campaign.id),
            Some(admin),
            json!({"target_status": "REVIEW"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Campaign is already in REVIEW status");
}
