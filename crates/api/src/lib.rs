//! HTTP API server for the order-to-cash core.
//!
//! Exposes checkout, cart management, and the bulk purchase order tracking
//! flow, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use checkout::{CheckoutOrchestrator, InMemoryPaymentGateway, PaymentGateway};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Storage;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracking::TrackingService;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Storage, G: PaymentGateway> {
    pub checkout: CheckoutOrchestrator<S, G>,
    pub tracking: TrackingService<S>,
    pub store: S,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Storage, G: PaymentGateway + 'static>(
    state: Arc<AppState<S, G>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/carts", post(routes::checkout::create_cart::<S, G>))
        .route("/carts/{id}/items", put(routes::checkout::update_cart_items::<S, G>))
        .route("/checkout", post(routes::checkout::create::<S, G>))
        .route("/checkout/confirm", post(routes::checkout::confirm::<S, G>))
        .route("/checkout/{session}", get(routes::checkout::info::<S, G>))
        .route("/bulk-orders", post(routes::bulk_orders::create::<S, G>))
        .route("/bulk-orders/{id}", get(routes::bulk_orders::get::<S, G>))
        .route("/bulk-orders/{id}/history", get(routes::bulk_orders::history::<S, G>))
        .route(
            "/bulk-orders/{id}/quotations",
            post(routes::bulk_orders::create_quotation::<S, G>),
        )
        .route(
            "/quotations/{id}/submit",
            post(routes::bulk_orders::submit_quotation::<S, G>),
        )
        .route(
            "/quotations/submit-batch",
            post(routes::bulk_orders::submit_quotation_batch::<S, G>),
        )
        .route(
            "/quotations/{id}/approve",
            post(routes::bulk_orders::approve_quotation::<S, G>),
        )
        .route(
            "/quotations/{id}/reject",
            post(routes::bulk_orders::reject_quotation::<S, G>),
        )
        .route("/bulk-orders/{id}/po/approve", post(routes::bulk_orders::approve_po::<S, G>))
        .route("/bulk-orders/{id}/po/reject", post(routes::bulk_orders::reject_po::<S, G>))
        .route(
            "/bulk-orders/{id}/payouts/first",
            post(routes::bulk_orders::create_first_payout::<S, G>),
        )
        .route(
            "/bulk-orders/{id}/payouts/first/confirm",
            post(routes::bulk_orders::confirm_first_payout::<S, G>),
        )
        .route(
            "/bulk-orders/{id}/production/start",
            post(routes::bulk_orders::start_without_first_payment::<S, G>),
        )
        .route(
            "/bulk-orders/{id}/raw-materials",
            put(routes::bulk_orders::update_raw_material::<S, G>),
        )
        .route("/bulk-orders/{id}/pps", put(routes::bulk_orders::update_pps::<S, G>))
        .route(
            "/bulk-orders/{id}/production",
            put(routes::bulk_orders::update_production::<S, G>),
        )
        .route(
            "/bulk-orders/{id}/inspection",
            put(routes::bulk_orders::mark_inspection::<S, G>),
        )
        .route(
            "/bulk-orders/{id}/qc-reports",
            post(routes::bulk_orders::create_qc_reports::<S, G>),
        )
        .route(
            "/bulk-orders/{id}/delivering",
            post(routes::bulk_orders::mark_delivering::<S, G>),
        )
        .route(
            "/bulk-orders/{id}/delivered",
            post(routes::bulk_orders::confirm_delivered::<S, G>),
        )
        .route(
            "/bulk-orders/{id}/payouts/final",
            post(routes::bulk_orders::create_final_payout::<S, G>),
        )
        .route(
            "/bulk-orders/{id}/payouts/final/confirm",
            post(routes::bulk_orders::confirm_final_payout::<S, G>),
        )
        .route(
            "/bulk-orders/{id}/status/override",
            post(routes::bulk_orders::override_status::<S, G>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the given storage with the in-memory
/// payment gateway.
pub fn create_default_state<S: Storage>(
    store: S,
) -> Arc<AppState<S, InMemoryPaymentGateway>> {
    let gateway = InMemoryPaymentGateway::new();
    Arc::new(AppState {
        checkout: CheckoutOrchestrator::new(store.clone(), gateway),
        tracking: TrackingService::new(store.clone()),
        store,
    })
}
