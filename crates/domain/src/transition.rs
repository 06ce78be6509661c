//! The central tracking transition table.
//!
//! Every status change on a bulk purchase order goes through [`next_status`].
//! An action is either listed for the current status or it is not; there are
//! no per-endpoint side doors.

use serde::{Deserialize, Serialize};

use crate::bulk::SellerTrackingStatus;

/// Actions that can move a bulk purchase order through its tracking flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingAction {
    SubmitQuotation,
    ApproveQuotation,
    RejectQuotation,
    ApprovePo,
    RejectPo,
    FirstPayout,
    FirstPayoutSkipped,
    StartWithoutFirstPayment,
    ConfirmFirstPayment,
    UpdateRawMaterial,
    UpdatePps,
    UpdateProduction,
    MarkInspection,
    CreateQcReport,
    MarkDelivering,
    ConfirmDelivered,
    FinalPayout,
    ConfirmFinalPayment,
    OverrideStatus,
}

impl TrackingAction {
    /// Returns the action as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingAction::SubmitQuotation => "submit_quotation",
            TrackingAction::ApproveQuotation => "approve_quotation",
            TrackingAction::RejectQuotation => "reject_quotation",
            TrackingAction::ApprovePo => "approve_po",
            TrackingAction::RejectPo => "reject_po",
            TrackingAction::FirstPayout => "first_payout",
            TrackingAction::FirstPayoutSkipped => "first_payout_skipped",
            TrackingAction::StartWithoutFirstPayment => "start_without_first_payment",
            TrackingAction::ConfirmFirstPayment => "confirm_first_payment",
            TrackingAction::UpdateRawMaterial => "update_raw_material",
            TrackingAction::UpdatePps => "update_pps",
            TrackingAction::UpdateProduction => "update_production",
            TrackingAction::MarkInspection => "mark_inspection",
            TrackingAction::CreateQcReport => "create_qc_report",
            TrackingAction::MarkDelivering => "mark_delivering",
            TrackingAction::ConfirmDelivered => "confirm_delivered",
            TrackingAction::FinalPayout => "final_payout",
            TrackingAction::ConfirmFinalPayment => "confirm_final_payment",
            TrackingAction::OverrideStatus => "override_status",
        }
    }
}

impl std::fmt::Display for TrackingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns the status an action moves the order to, or None when the action
/// is not allowed from the current status.
///
/// Artifact updates (raw material, PPS, production, inspection, QC) may be
/// repeated while the order sits in the matching stage.
pub fn next_status(
    current: SellerTrackingStatus,
    action: TrackingAction,
) -> Option<SellerTrackingStatus> {
    use SellerTrackingStatus as S;
    use TrackingAction as A;

    match (current, action) {
        (S::WaitingForQuotation, A::SubmitQuotation) => Some(S::WaitingForApproval),
        // Resubmission while under review keeps the order where it is.
        (S::WaitingForApproval, A::SubmitQuotation) => Some(S::WaitingForApproval),
        (S::WaitingForApproval, A::ApproveQuotation) => Some(S::Po),
        (S::WaitingForApproval, A::RejectQuotation) => Some(S::WaitingForApproval),

        (S::Po, A::ApprovePo) => Some(S::WaitingFirstPayment),
        (S::Po, A::RejectPo) => Some(S::PoRejected),

        (S::WaitingFirstPayment, A::FirstPayout) => Some(S::FirstPaymentConfirm),
        (S::WaitingFirstPayment, A::FirstPayoutSkipped) => Some(S::FirstPaymentSkipped),
        (S::FirstPaymentSkipped, A::StartWithoutFirstPayment) => Some(S::FirstPaymentConfirmed),
        (S::FirstPaymentConfirm, A::ConfirmFirstPayment) => Some(S::FirstPaymentConfirmed),

        (S::FirstPaymentConfirmed | S::RawMaterial, A::UpdateRawMaterial) => Some(S::RawMaterial),
        (S::RawMaterial | S::Pps, A::UpdatePps) => Some(S::Pps),
        (S::Pps | S::Production, A::UpdateProduction) => Some(S::Production),
        (S::Production | S::Inspection, A::MarkInspection) => Some(S::Inspection),
        (S::Inspection | S::Qc, A::CreateQcReport) => Some(S::Qc),

        (S::Qc, A::MarkDelivering) => Some(S::Delivering),
        (S::Delivering, A::ConfirmDelivered) => Some(S::DeliveryConfirmed),

        (S::DeliveryConfirmed, A::FinalPayout) => Some(S::FinalPaymentConfirm),
        (S::FinalPaymentConfirm, A::ConfirmFinalPayment) => Some(S::FinalPaymentConfirmed),

        _ => None,
    }
}
