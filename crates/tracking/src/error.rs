use common::{BulkOrderId, QuotationId};
use domain::{QuotationStatus, SellerTrackingStatus, TrackingAction};
use store::StoreError;
use thiserror::Error;

/// Errors raised by the tracking state machine.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// A payout confirmation arrived while the order was not waiting for one.
    #[error("payout cannot be confirmed while the order is {status}")]
    NotAbleToConfirm { status: SellerTrackingStatus },

    /// Production cannot start without the first payout being skipped first.
    #[error("production cannot start while the order is {status}")]
    NotAbleToStart { status: SellerTrackingStatus },

    /// The action is not listed in the transition table for this status.
    #[error("action {action} is not allowed while the order is {status}")]
    InvalidTransition {
        action: TrackingAction,
        status: SellerTrackingStatus,
    },

    /// Approved quotations are frozen.
    #[error("quotation {0} is already approved")]
    QuotationAlreadyApproved(QuotationId),

    /// The quotation is not waiting for an approval decision.
    #[error("quotation {id} is {status}, expected waiting_for_approval")]
    QuotationNotPending {
        id: QuotationId,
        status: QuotationStatus,
    },

    /// A payout was requested before a seller was assigned.
    #[error("no seller assigned to bulk purchase order {0}")]
    SellerNotAssigned(BulkOrderId),

    /// A payout was requested before any quotation was approved.
    #[error("no approved quotation for bulk purchase order {0}")]
    NoApprovedQuotation(BulkOrderId),

    /// The actor's user group may not perform this action.
    #[error("{action} requires admin access")]
    Forbidden { action: TrackingAction },

    /// Input failed validation before any state was touched.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
