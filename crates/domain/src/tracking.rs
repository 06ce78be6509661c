//! Append-only tracking audit rows for bulk purchase orders.

use chrono::{DateTime, Utc};
use common::{BulkOrderId, TrackingId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::artifact::{Attachment, QcReportStatus};
use crate::bulk::{BulkPurchaseOrder, SellerTrackingStatus, UserGroup};
use crate::quotation::{QuotationStatus, SellerQuotation};
use crate::transition::TrackingAction;

/// One audit row. Rows are inserted, never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEntry {
    pub id: TrackingId,
    pub bulk_order_id: BulkOrderId,
    pub action: TrackingAction,
    pub user_group: UserGroup,
    pub user_id: UserId,
    pub created_by: UserId,
    /// State captured before the mutation, as a JSON object.
    pub before: Value,
    /// State captured after the mutation, as a JSON object.
    pub after: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_status: Option<QcReportStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TrackingEntry {
    /// Creates an audit row for an action by the given actor.
    pub fn new(
        bulk_order_id: BulkOrderId,
        action: TrackingAction,
        user_group: UserGroup,
        user_id: UserId,
        before: Value,
        after: Value,
    ) -> Self {
        Self {
            id: TrackingId::new(),
            bulk_order_id,
            action,
            user_group,
            user_id,
            created_by: user_id,
            before,
            after,
            report_status: None,
            attachments: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    /// Attaches a QC report status to the row.
    pub fn with_report_status(mut self, status: QcReportStatus) -> Self {
        self.report_status = Some(status);
        self
    }

    /// Attaches files to the row.
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = Some(attachments);
        self
    }

    /// Attaches a free-form description to the row.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Before/after snapshot of a tracking status change.
pub fn status_snapshot(
    before: SellerTrackingStatus,
    after: SellerTrackingStatus,
) -> (Value, Value) {
    (
        json!({ "tracking_status": before }),
        json!({ "tracking_status": after }),
    )
}

/// Before/after snapshot of a quotation status change, including the prices
/// the decision was made on.
pub fn quotation_snapshot(
    before_status: QuotationStatus,
    after: &SellerQuotation,
) -> (Value, Value) {
    (
        json!({ "quotation_id": after.id, "status": before_status }),
        json!({
            "quotation_id": after.id,
            "status": after.status,
            "quoted_price": after.quoted_price,
            "tiers": after.tiers,
        }),
    )
}

/// Before/after snapshot of a payout, capturing the split amounts.
pub fn payout_snapshot(before: &BulkPurchaseOrder, after: &BulkPurchaseOrder) -> (Value, Value) {
    (
        json!({
            "tracking_status": before.tracking_status,
            "first_payout_total": before.first_payout_total,
            "final_payout_total": before.final_payout_total,
        }),
        json!({
            "tracking_status": after.tracking_status,
            "first_payout_percentage": after.first_payout_percentage,
            "first_payout_total": after.first_payout_total,
            "final_payout_total": after.final_payout_total,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_snapshot_captures_both_sides() {
        let (before, after) = status_snapshot(
            SellerTrackingStatus::Po,
            SellerTrackingStatus::WaitingFirstPayment,
        );
        assert_eq!(before["tracking_status"], "po");
        assert_eq!(after["tracking_status"], "waiting_first_payment");
    }

    #[test]
    fn test_entry_builder_defaults() {
        let entry = TrackingEntry::new(
            BulkOrderId::new(),
            TrackingAction::ApprovePo,
            UserGroup::Seller,
            UserId::new(),
            json!({}),
            json!({}),
        );
        assert_eq!(entry.user_id, entry.created_by);
        assert!(entry.report_status.is_none());
        assert!(entry.description.is_none());
    }

    #[test]
    fn test_entry_with_report_status() {
        let entry = TrackingEntry::new(
            BulkOrderId::new(),
            TrackingAction::CreateQcReport,
            UserGroup::Seller,
            UserId::new(),
            json!({}),
            json!({}),
        )
        .with_report_status(QcReportStatus::Passed)
        .with_attachments(vec![Attachment::new("qc/1.jpg")]);

        assert_eq!(entry.report_status, Some(QcReportStatus::Passed));
        assert_eq!(entry.attachments.as_ref().map(Vec::len), Some(1));
    }
}
