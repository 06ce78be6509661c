//! Bulk purchase orders and their seller tracking status.

use chrono::{DateTime, Utc};
use common::{BulkOrderId, QuotationId, UserId};
use serde::{Deserialize, Serialize};

use crate::artifact::{
    InspectionProcedure, LogisticInfo, PoAttachment, PpsReport, ProductionInfo, QcReport,
    RawMaterial,
};
use crate::money::{Currency, Money};

/// Where a bulk purchase order sits in the seller fulfillment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellerTrackingStatus {
    WaitingForQuotation,
    WaitingForApproval,
    Po,
    PoRejected,
    WaitingFirstPayment,
    FirstPaymentConfirm,
    FirstPaymentConfirmed,
    FirstPaymentSkipped,
    RawMaterial,
    Pps,
    Production,
    Inspection,
    Qc,
    Delivering,
    DeliveryConfirmed,
    FinalPaymentConfirm,
    FinalPaymentConfirmed,
}

impl SellerTrackingStatus {
    /// Returns the status as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SellerTrackingStatus::WaitingForQuotation => "waiting_for_quotation",
            SellerTrackingStatus::WaitingForApproval => "waiting_for_approval",
            SellerTrackingStatus::Po => "po",
            SellerTrackingStatus::PoRejected => "po_rejected",
            SellerTrackingStatus::WaitingFirstPayment => "waiting_first_payment",
            SellerTrackingStatus::FirstPaymentConfirm => "first_payment_confirm",
            SellerTrackingStatus::FirstPaymentConfirmed => "first_payment_confirmed",
            SellerTrackingStatus::FirstPaymentSkipped => "first_payment_skipped",
            SellerTrackingStatus::RawMaterial => "raw_material",
            SellerTrackingStatus::Pps => "pps",
            SellerTrackingStatus::Production => "production",
            SellerTrackingStatus::Inspection => "inspection",
            SellerTrackingStatus::Qc => "qc",
            SellerTrackingStatus::Delivering => "delivering",
            SellerTrackingStatus::DeliveryConfirmed => "delivery_confirmed",
            SellerTrackingStatus::FinalPaymentConfirm => "final_payment_confirm",
            SellerTrackingStatus::FinalPaymentConfirmed => "final_payment_confirmed",
        }
    }

    /// True once production work may start (first payout settled or skipped
    /// and confirmed by the seller).
    pub fn production_unlocked(&self) -> bool {
        matches!(
            self,
            SellerTrackingStatus::FirstPaymentConfirmed
                | SellerTrackingStatus::RawMaterial
                | SellerTrackingStatus::Pps
                | SellerTrackingStatus::Production
                | SellerTrackingStatus::Inspection
                | SellerTrackingStatus::Qc
        )
    }

    /// True for the two terminal payment states of the flow.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SellerTrackingStatus::PoRejected | SellerTrackingStatus::FinalPaymentConfirmed
        )
    }
}

impl std::fmt::Display for SellerTrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which side of the marketplace a user acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserGroup {
    Buyer,
    Seller,
    Admin,
}

impl UserGroup {
    /// Returns the group as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserGroup::Buyer => "buyer",
            UserGroup::Seller => "seller",
            UserGroup::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bulk purchase order moving through sourcing and production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkPurchaseOrder {
    pub id: BulkOrderId,
    pub buyer_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<UserId>,
    pub currency: Currency,
    pub quantity: u32,
    pub tracking_status: SellerTrackingStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_quotation_id: Option<QuotationId>,
    /// Payout base: the approved quotation's total for this order's quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotation_total: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payout_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payout_total: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_payout_total: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payout_transferred_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_payout_transferred_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub po_attachments: Vec<PoAttachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_reject_reason: Option<String>,
    #[serde(default)]
    pub raw_materials: Vec<RawMaterial>,
    #[serde(default)]
    pub pps_reports: Vec<PpsReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_info: Option<ProductionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection: Option<InspectionProcedure>,
    #[serde(default)]
    pub qc_reports: Vec<QcReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logistic_info: Option<LogisticInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_confirmed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BulkPurchaseOrder {
    /// Creates a bulk purchase order waiting for seller quotations.
    pub fn new(buyer_id: UserId, currency: Currency, quantity: u32) -> Self {
        let now = Utc::now();
        Self {
            id: BulkOrderId::new(),
            buyer_id,
            seller_id: None,
            currency,
            quantity,
            tracking_status: SellerTrackingStatus::WaitingForQuotation,
            approved_quotation_id: None,
            quotation_total: None,
            first_payout_percentage: None,
            first_payout_total: None,
            final_payout_total: None,
            first_payout_transferred_at: None,
            final_payout_transferred_at: None,
            po_attachments: vec![],
            po_reject_reason: None,
            raw_materials: vec![],
            pps_reports: vec![],
            production_info: None,
            inspection: None,
            qc_reports: vec![],
            logistic_info: None,
            delivery_started_at: None,
            delivery_confirmed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds or replaces a PPS report, matching by report ID.
    pub fn upsert_pps_report(&mut self, report: PpsReport) {
        match self.pps_reports.iter_mut().find(|r| r.id == report.id) {
            Some(existing) => *existing = report,
            None => self.pps_reports.push(report),
        }
    }
}
