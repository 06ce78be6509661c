//! Seller tracking for bulk purchase orders: the quotation-to-final-payout
//! state machine and its append-only audit trail.

mod error;
mod service;

pub use error::TrackingError;
pub use service::{Actor, QuotationSubmission, TrackingService};
