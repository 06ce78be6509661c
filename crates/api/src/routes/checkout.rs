//! Cart and checkout endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::{CheckoutOutcome, CheckoutRequest, ConfirmCheckoutRequest, PaymentGateway};
use common::{CheckoutSessionId, OrderId, UserId};
use domain::{Attachment, Currency, Money, Order, OrderItem, PaymentTransaction, PaymentType};
use serde::{Deserialize, Serialize};
use store::Storage;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

#[derive(Deserialize)]
pub struct CreateCartRequest {
    pub user_id: Uuid,
    pub currency: Currency,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct UpdateCartItemsRequest {
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct CheckoutApiRequest {
    pub user_id: Uuid,
    pub order_ids: Vec<Uuid>,
    pub payment_type: PaymentType,
    pub method_token: Option<String>,
    pub return_url: Option<String>,
    pub bank_reference: Option<String>,
    pub bank_attachment: Option<Attachment>,
}

#[derive(Deserialize)]
pub struct ConfirmCheckoutApiRequest {
    pub user_id: Uuid,
    pub order_ids: Vec<Uuid>,
    pub authorization_id: String,
    pub return_url: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckoutResponse {
    Completed {
        session_id: String,
        transaction: PaymentTransaction,
        orders: Vec<Order>,
    },
    ActionRequired {
        authorization_id: String,
        next_action: serde_json::Value,
        client_secret: Option<String>,
    },
}

#[derive(Serialize)]
pub struct CheckoutInfoResponse {
    pub transaction: PaymentTransaction,
    pub orders: Vec<Order>,
}

fn to_response(outcome: CheckoutOutcome) -> CheckoutResponse {
    match outcome {
        CheckoutOutcome::Completed {
            session_id,
            transaction,
            orders,
        } => CheckoutResponse::Completed {
            session_id: session_id.as_str().to_string(),
            transaction,
            orders,
        },
        CheckoutOutcome::ActionRequired {
            authorization_id,
            next_action,
            client_secret,
        } => CheckoutResponse::ActionRequired {
            authorization_id,
            next_action,
            client_secret,
        },
    }
}

fn to_items(items: Vec<OrderItemRequest>) -> Vec<OrderItem> {
    items
        .into_iter()
        .map(|i| OrderItem::new(i.product_name, i.quantity, i.unit_price))
        .collect()
}

// -- Handlers --

/// POST /carts — create a new cart for a buyer.
#[tracing::instrument(skip(state, req))]
pub async fn create_cart<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<CreateCartRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = Order::new_cart(
        UserId::from_uuid(req.user_id),
        req.currency,
        to_items(req.items),
    );
    state.store.insert_order(&order).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// PUT /carts/:id/items — replace a cart's items; an empty list deletes it.
#[tracing::instrument(skip(state, req))]
pub async fn update_cart_items<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCartItemsRequest>,
) -> Result<axum::response::Response, ApiError> {
    use axum::response::IntoResponse;

    let order = state
        .checkout
        .update_cart_items(OrderId::from_uuid(id), to_items(req.items))
        .await?;
    Ok(match order {
        Some(order) => Json(order).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// POST /checkout — settle one or more carts with a single payment.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<CheckoutApiRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let outcome = state
        .checkout
        .checkout(CheckoutRequest {
            user_id: UserId::from_uuid(req.user_id),
            order_ids: req.order_ids.into_iter().map(OrderId::from_uuid).collect(),
            payment_type: req.payment_type,
            method_token: req.method_token,
            return_url: req.return_url,
            bank_reference: req.bank_reference,
            bank_attachment: req.bank_attachment,
        })
        .await?;
    Ok(Json(to_response(outcome)))
}

/// POST /checkout/confirm — resume a checkout after a step-up challenge.
#[tracing::instrument(skip(state, req))]
pub async fn confirm<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<ConfirmCheckoutApiRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let outcome = state
        .checkout
        .confirm_checkout(ConfirmCheckoutRequest {
            user_id: UserId::from_uuid(req.user_id),
            order_ids: req.order_ids.into_iter().map(OrderId::from_uuid).collect(),
            authorization_id: req.authorization_id,
            return_url: req.return_url,
        })
        .await?;
    Ok(Json(to_response(outcome)))
}

/// GET /checkout/:session — ledger row and orders recorded under a session.
#[tracing::instrument(skip(state))]
pub async fn info<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(session): Path<String>,
) -> Result<Json<CheckoutInfoResponse>, ApiError> {
    let info = state
        .checkout
        .checkout_info(&CheckoutSessionId::from(session.as_str()))
        .await?;
    Ok(Json(CheckoutInfoResponse {
        transaction: info.transaction,
        orders: info.orders,
    }))
}
