//! Shared identifier types used across the order-to-cash crates.

mod types;

pub use types::{
    BulkOrderId, CheckoutSessionId, InquiryId, OrderId, QuotationId, TrackingId, TransactionId,
    TransactionRef, UserId,
};
