use common::OrderId;
use domain::Currency;
use store::StoreError;
use thiserror::Error;

/// Errors raised while orchestrating a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The checkout referenced no carts at all.
    #[error("checkout references no carts")]
    EmptyCheckout,

    /// A referenced cart does not exist.
    #[error("cart not found: {0}")]
    CartNotFound(OrderId),

    /// The order exists but cannot be checked out.
    #[error("order {0} is not eligible for checkout: {1}")]
    InvalidToCheckout(OrderId, String),

    /// The order is no longer an editable cart.
    #[error("order {0} is no longer a cart")]
    NotACart(OrderId),

    /// The carts do not share one currency.
    #[error("carts mix currencies: {0} and {1}")]
    CurrencyMismatch(Currency, Currency),

    /// The gateway failed before any local state was touched.
    #[error("payment gateway error: {0}")]
    Gateway(String),

    /// The gateway refused the authorization.
    #[error("payment declined: {0}")]
    Declined(String),

    /// Storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
