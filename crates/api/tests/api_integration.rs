//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use store::InMemoryStorage;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let state = api::create_default_state(InMemoryStorage::new());
    api::create_app(state, get_metrics_handle())
}

fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn admin_actor() -> serde_json::Value {
    serde_json::json!({
        "user_id": uuid::Uuid::new_v4(),
        "user_group": "admin",
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "api");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_bank_transfer_checkout_settles_a_cart() {
    let app = setup();
    let user_id = uuid::Uuid::new_v4();

    let create = app
        .clone()
        .oneshot(post(
            "/carts",
            serde_json::json!({
                "user_id": user_id,
                "currency": "USD",
                "items": [{
                    "product_name": "Linen shirt sample",
                    "quantity": 2,
                    "unit_price": { "amount": 2500, "currency": "USD" }
                }]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::CREATED);
    let cart = body_json(create).await;
    let cart_id = cart["id"].as_str().unwrap().to_string();

    let checkout = app
        .clone()
        .oneshot(post(
            "/checkout",
            serde_json::json!({
                "user_id": user_id,
                "order_ids": [cart_id],
                "payment_type": "bank_transfer",
                "bank_reference": "WIRE-42",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(checkout.status(), StatusCode::OK);
    let outcome = body_json(checkout).await;
    assert_eq!(outcome["status"], "completed");
    assert_eq!(outcome["transaction"]["status"], "waiting_confirm");
    let session = outcome["session_id"].as_str().unwrap().to_string();

    let info = app
        .oneshot(get(&format!("/checkout/{session}")))
        .await
        .unwrap();
    assert_eq!(info.status(), StatusCode::OK);
    let info = body_json(info).await;
    assert_eq!(info["orders"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_checkout_of_missing_cart_is_not_found() {
    let app = setup();

    let response = app
        .oneshot(post(
            "/checkout",
            serde_json::json!({
                "user_id": uuid::Uuid::new_v4(),
                "order_ids": [uuid::Uuid::new_v4()],
                "payment_type": "bank_transfer",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_checkout_is_bad_request() {
    let app = setup();

    let response = app
        .oneshot(post(
            "/checkout",
            serde_json::json!({
                "user_id": uuid::Uuid::new_v4(),
                "order_ids": [],
                "payment_type": "card",
                "method_token": "tok_visa",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quotation_flow_through_the_api() {
    let app = setup();
    let seller_id = uuid::Uuid::new_v4();

    let create = app
        .clone()
        .oneshot(post(
            "/bulk-orders",
            serde_json::json!({
                "buyer_id": uuid::Uuid::new_v4(),
                "currency": "USD",
                "quantity": 100,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::CREATED);
    let bulk = body_json(create).await;
    assert_eq!(bulk["tracking_status"], "waiting_for_quotation");
    let bulk_id = bulk["id"].as_str().unwrap().to_string();

    let slot = app
        .clone()
        .oneshot(post(
            &format!("/bulk-orders/{bulk_id}/quotations"),
            serde_json::json!({ "seller_id": seller_id, "currency": "USD" }),
        ))
        .await
        .unwrap();
    assert_eq!(slot.status(), StatusCode::CREATED);
    let quotation = body_json(slot).await;
    let quotation_id = quotation["id"].as_str().unwrap().to_string();

    let submit = app
        .clone()
        .oneshot(post(
            &format!("/quotations/{quotation_id}/submit"),
            serde_json::json!({
                "actor": { "user_id": seller_id, "user_group": "seller" },
                "costs": {
                    "fabric": { "amount": 400, "currency": "USD" },
                    "making": { "amount": 300, "currency": "USD" },
                    "decoration": { "amount": 200, "currency": "USD" },
                    "other": { "amount": 100, "currency": "USD" }
                },
            }),
        ))
        .await
        .unwrap();
    assert_eq!(submit.status(), StatusCode::OK);
    let submitted = body_json(submit).await;
    assert_eq!(submitted["quoted_price"]["amount"], 1000);

    // A seller cannot approve their own quotation.
    let forbidden = app
        .clone()
        .oneshot(post(
            &format!("/quotations/{quotation_id}/approve"),
            serde_json::json!({
                "actor": { "user_id": seller_id, "user_group": "seller" }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let approve = app
        .clone()
        .oneshot(post(
            &format!("/quotations/{quotation_id}/approve"),
            serde_json::json!({ "actor": admin_actor() }),
        ))
        .await
        .unwrap();
    assert_eq!(approve.status(), StatusCode::OK);
    let approved = body_json(approve).await;
    assert_eq!(approved["tracking_status"], "po");
    assert_eq!(approved["quotation_total"]["amount"], 100_000);

    let history = app
        .oneshot(get(&format!("/bulk-orders/{bulk_id}/history")))
        .await
        .unwrap();
    assert_eq!(history.status(), StatusCode::OK);
    let entries = body_json(history).await;
    assert_eq!(entries.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_out_of_order_action_is_a_conflict() {
    let app = setup();

    let create = app
        .clone()
        .oneshot(post(
            "/bulk-orders",
            serde_json::json!({
                "buyer_id": uuid::Uuid::new_v4(),
                "currency": "USD",
                "quantity": 50,
            }),
        ))
        .await
        .unwrap();
    let bulk = body_json(create).await;
    let bulk_id = bulk["id"].as_str().unwrap().to_string();

    // First payout before any quotation was approved.
    let response = app
        .oneshot(post(
            &format!("/bulk-orders/{bulk_id}/payouts/first"),
            serde_json::json!({
                "actor": admin_actor(),
                "percentage": 30.0,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_bulk_order_is_not_found() {
    let app = setup();
    let fake_id = uuid::Uuid::new_v4();

    let response = app
        .oneshot(get(&format!("/bulk-orders/{fake_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_step_up_checkout_confirms_through_the_api() {
    let store = InMemoryStorage::new();
    let gateway = checkout::InMemoryPaymentGateway::new();
    gateway.set_require_action(true, false);
    let state = std::sync::Arc::new(api::AppState {
        checkout: checkout::CheckoutOrchestrator::new(store.clone(), gateway.clone()),
        tracking: tracking::TrackingService::new(store.clone()),
        store,
    });
    let app = api::create_app(state, get_metrics_handle());
    let user_id = uuid::Uuid::new_v4();

    let create = app
        .clone()
        .oneshot(post(
            "/carts",
            serde_json::json!({
                "user_id": user_id,
                "currency": "USD",
                "items": [{
                    "product_name": "Denim jacket sample",
                    "quantity": 1,
                    "unit_price": { "amount": 8000, "currency": "USD" }
                }]
            }),
        ))
        .await
        .unwrap();
    let cart = body_json(create).await;
    let cart_id = cart["id"].as_str().unwrap().to_string();

    let checkout = app
        .clone()
        .oneshot(post(
            "/checkout",
            serde_json::json!({
                "user_id": user_id,
                "order_ids": [cart_id],
                "payment_type": "card",
                "method_token": "tok_visa",
                "return_url": "https://example.com/return",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(checkout.status(), StatusCode::OK);
    let challenge = body_json(checkout).await;
    assert_eq!(challenge["status"], "action_required");
    let authorization_id = challenge["authorization_id"].as_str().unwrap().to_string();

    // The customer completes the challenge out of band.
    gateway.set_require_action(true, true);

    let confirm = app
        .oneshot(post(
            "/checkout/confirm",
            serde_json::json!({
                "user_id": user_id,
                "order_ids": [cart["id"]],
                "authorization_id": authorization_id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(confirm.status(), StatusCode::OK);
    let settled = body_json(confirm).await;
    assert_eq!(settled["status"], "completed");
    assert_eq!(settled["transaction"]["status"], "paid");
    assert_eq!(gateway.authorization_count(), 1);
}
