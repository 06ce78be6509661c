//! The immutable payment transaction ledger.

use chrono::{DateTime, Utc};
use common::{BulkOrderId, CheckoutSessionId, OrderId, TransactionId, TransactionRef, UserId};
use serde::{Deserialize, Serialize};

use crate::artifact::Attachment;
use crate::money::{Currency, Money};
use crate::order::PaymentType;

/// Settlement state of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Bank transfer recorded, waiting for manual confirmation.
    WaitingConfirm,
    /// Settled.
    Paid,
}

impl PaymentStatus {
    /// Returns the status as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::WaitingConfirm => "waiting_confirm",
            PaymentStatus::Paid => "paid",
        }
    }
}

/// Which money movement a ledger row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMilestone {
    /// Buyer settles a checkout in full.
    FinalPayment,
    /// Platform pays the seller the agreed share before production.
    FirstPayout,
    /// Platform pays the seller the remainder after delivery.
    FinalPayout,
}

impl PaymentMilestone {
    /// Returns the milestone as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMilestone::FinalPayment => "final_payment",
            PaymentMilestone::FirstPayout => "first_payout",
            PaymentMilestone::FinalPayout => "final_payout",
        }
    }
}

/// One row of the append-only payment ledger.
///
/// Rows are created exactly once per money movement and never mutated;
/// the storage layer exposes no update for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: TransactionId,
    pub reference_id: TransactionRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_session_id: Option<CheckoutSessionId>,
    pub order_ids: Vec<OrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulk_order_id: Option<BulkOrderId>,
    pub user_id: UserId,
    pub currency: Currency,
    pub total_amount: Money,
    pub paid_amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_percentage: Option<f64>,
    pub payment_type: PaymentType,
    pub milestone: PaymentMilestone,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_authorization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl PaymentTransaction {
    /// Ledger row for a bank-transfer checkout awaiting confirmation.
    pub fn bank_checkout(
        reference_id: TransactionRef,
        session_id: CheckoutSessionId,
        order_ids: Vec<OrderId>,
        user_id: UserId,
        total: Money,
        bank_reference: Option<String>,
        attachment: Option<Attachment>,
        now: DateTime<Utc>,
    ) -> Self {
        let metadata = Self::metadata_for(&order_ids, None);
        Self {
            id: TransactionId::new(),
            reference_id,
            checkout_session_id: Some(session_id),
            order_ids,
            bulk_order_id: None,
            user_id,
            currency: total.currency(),
            total_amount: total,
            paid_amount: total,
            payment_percentage: None,
            payment_type: PaymentType::BankTransfer,
            milestone: PaymentMilestone::FinalPayment,
            status: PaymentStatus::WaitingConfirm,
            gateway_authorization_id: None,
            bank_reference,
            attachment,
            metadata,
            created_at: now,
        }
    }

    /// Ledger row for a settled card checkout.
    pub fn card_checkout(
        reference_id: TransactionRef,
        session_id: CheckoutSessionId,
        order_ids: Vec<OrderId>,
        user_id: UserId,
        total: Money,
        gateway_authorization_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        let metadata = Self::metadata_for(&order_ids, None);
        Self {
            id: TransactionId::new(),
            reference_id,
            checkout_session_id: Some(session_id),
            order_ids,
            bulk_order_id: None,
            user_id,
            currency: total.currency(),
            total_amount: total,
            paid_amount: total,
            payment_percentage: None,
            payment_type: PaymentType::Card,
            milestone: PaymentMilestone::FinalPayment,
            status: PaymentStatus::Paid,
            gateway_authorization_id: Some(gateway_authorization_id),
            bank_reference: None,
            attachment: None,
            metadata,
            created_at: now,
        }
    }

    /// Ledger row for a seller payout on a bulk purchase order.
    pub fn payout(
        milestone: PaymentMilestone,
        bulk_order_id: BulkOrderId,
        seller_id: UserId,
        amount: Money,
        percentage: f64,
        bank_reference: Option<String>,
        attachment: Option<Attachment>,
        now: DateTime<Utc>,
    ) -> Self {
        let metadata = Self::metadata_for(&[], Some(bulk_order_id));
        Self {
            id: TransactionId::new(),
            reference_id: TransactionRef::generate(),
            checkout_session_id: None,
            order_ids: vec![],
            bulk_order_id: Some(bulk_order_id),
            user_id: seller_id,
            currency: amount.currency(),
            total_amount: amount,
            paid_amount: amount,
            payment_percentage: Some(percentage),
            payment_type: PaymentType::BankTransfer,
            milestone,
            status: PaymentStatus::Paid,
            gateway_authorization_id: None,
            bank_reference,
            attachment,
            metadata,
            created_at: now,
        }
    }

    fn metadata_for(order_ids: &[OrderId], bulk_order_id: Option<BulkOrderId>) -> serde_json::Value {
        serde_json::json!({
            "order_ids": order_ids,
            "bulk_order_id": bulk_order_id,
        })
    }
}
