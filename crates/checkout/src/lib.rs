//! Checkout orchestration: settle one or more carts with a single payment,
//! by bank transfer or by card through the payment gateway seam.

mod error;
mod gateway;
mod orchestrator;

pub use error::CheckoutError;
pub use gateway::{
    Authorization, AuthorizationRequest, AuthorizationStatus, InMemoryPaymentGateway,
    PaymentGateway,
};
pub use orchestrator::{
    CheckoutInfo, CheckoutOrchestrator, CheckoutOutcome, CheckoutRequest, ConfirmCheckoutRequest,
};
