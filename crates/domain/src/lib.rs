//! Domain model for the order-to-cash flow: carts and checkout, the payment
//! ledger, bulk purchase order tracking, and the audit trail.

mod artifact;
mod bulk;
mod error;
mod money;
mod order;
mod payment;
mod quotation;
mod tracking;
mod transition;

pub use artifact::{
    Attachment, InspectionProcedure, LogisticInfo, PoAttachment, PoAttachmentStatus, PpsReport,
    ProductionInfo, QcReport, QcReportStatus, RawMaterial,
};
pub use bulk::{BulkPurchaseOrder, SellerTrackingStatus, UserGroup};
pub use error::DomainError;
pub use money::{Currency, Money};
pub use order::{Inquiry, InquiryStatus, Order, OrderItem, OrderStatus, PaymentType};
pub use payment::{PaymentMilestone, PaymentStatus, PaymentTransaction};
pub use quotation::{QuantityTier, QuotationCosts, QuotationStatus, SellerQuotation};
pub use tracking::{TrackingEntry, payout_snapshot, quotation_snapshot, status_snapshot};
pub use transition::{TrackingAction, next_status};
