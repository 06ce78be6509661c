//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use store::StoreError;
use tracking::TrackingError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Checkout failure.
    Checkout(CheckoutError),
    /// Tracking state machine failure.
    Tracking(TrackingError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Tracking(err) => tracking_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::EmptyCheckout
        | CheckoutError::InvalidToCheckout(_, _)
        | CheckoutError::NotACart(_)
        | CheckoutError::CurrencyMismatch(_, _) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::CartNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CheckoutError::Declined(_) => (StatusCode::PAYMENT_REQUIRED, err.to_string()),
        CheckoutError::Store(store_err) => store_error_to_response(store_err, &err),
        CheckoutError::Gateway(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn tracking_error_to_response(err: TrackingError) -> (StatusCode, String) {
    match &err {
        TrackingError::InvalidTransition { .. }
        | TrackingError::NotAbleToConfirm { .. }
        | TrackingError::NotAbleToStart { .. }
        | TrackingError::QuotationAlreadyApproved(_)
        | TrackingError::QuotationNotPending { .. }
        | TrackingError::SellerNotAssigned(_)
        | TrackingError::NoApprovedQuotation(_) => (StatusCode::CONFLICT, err.to_string()),
        TrackingError::Forbidden { .. } => (StatusCode::FORBIDDEN, err.to_string()),
        TrackingError::InvalidInput(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        TrackingError::Store(store_err) => store_error_to_response(store_err, &err),
    }
}

fn store_error_to_response(
    store_err: &StoreError,
    err: &dyn std::fmt::Display,
) -> (StatusCode, String) {
    match store_err {
        StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        StoreError::Duplicate { .. } => (StatusCode::CONFLICT, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<TrackingError> for ApiError {
    fn from(err: TrackingError) -> Self {
        ApiError::Tracking(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}
