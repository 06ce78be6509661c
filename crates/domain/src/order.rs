//! Carts and their lifecycle through checkout.

use chrono::{DateTime, Duration, Utc};
use common::{CheckoutSessionId, InquiryId, OrderId, TransactionRef, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::artifact::Attachment;
use crate::error::DomainError;
use crate::money::{Currency, Money};

/// Lifecycle status of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Still a cart, not yet checked out.
    Pending,
    /// Bank transfer submitted, waiting for manual confirmation.
    WaitingConfirm,
    /// Payment settled.
    Paid,
}

impl OrderStatus {
    /// Returns the status as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::WaitingConfirm => "waiting_confirm",
            OrderStatus::Paid => "paid",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a checkout is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Card,
    BankTransfer,
}

impl PaymentType {
    /// Returns the payment type as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Card => "card",
            PaymentType::BankTransfer => "bank_transfer",
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An item in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(product_name: impl Into<String>, quantity: u32, unit_price: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the line total (quantity * unit price).
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A purchase order. Starts life as a cart and is settled through checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inquiry_id: Option<InquiryId>,
    pub currency: Currency,
    pub is_cart: bool,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,

    pub subtotal: Money,
    pub tax_percentage: f64,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<PaymentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_session_id: Option<CheckoutSessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_ref: Option<TransactionRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_authorization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_attachment: Option<Attachment>,

    /// Production lead time in days, snapshotted from the accepted quotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_lead_time_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transferred_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_as_paid_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new cart for a user.
    pub fn new_cart(user_id: UserId, currency: Currency, items: Vec<OrderItem>) -> Self {
        let now = Utc::now();
        let mut order = Self {
            id: OrderId::new(),
            user_id,
            inquiry_id: None,
            currency,
            is_cart: true,
            status: OrderStatus::Pending,
            items,
            subtotal: Money::zero(currency),
            tax_percentage: 0.0,
            tax: Money::zero(currency),
            discount: Money::zero(currency),
            total: Money::zero(currency),
            payment_type: None,
            checkout_session_id: None,
            transaction_ref: None,
            gateway_authorization_id: None,
            bank_reference: None,
            bank_attachment: None,
            sample_lead_time_days: None,
            start_date: None,
            completion_date: None,
            transferred_at: None,
            mark_as_paid_at: None,
            created_at: now,
            updated_at: now,
        };
        order.update_prices();
        order
    }

    /// Recomputes subtotal, tax, and total from the item list.
    pub fn update_prices(&mut self) {
        let mut subtotal = Money::zero(self.currency);
        for item in &self.items {
            subtotal += item.total_price();
        }
        self.subtotal = subtotal;
        self.tax = subtotal.percentage(self.tax_percentage);
        self.total = self.subtotal.add(self.tax).subtract(self.discount);
        self.updated_at = Utc::now();
    }

    /// Replaces the item list wholesale and recomputes prices.
    ///
    /// Returns false when the new list is empty, in which case the cart
    /// should be deleted instead of persisted.
    pub fn replace_items(&mut self, items: Vec<OrderItem>) -> bool {
        self.items = items;
        if self.items.is_empty() {
            return false;
        }
        self.update_prices();
        true
    }

    /// Validates that this order can enter a checkout.
    pub fn validate_for_checkout(&self) -> Result<(), DomainError> {
        if self.status == OrderStatus::Paid {
            return Err(DomainError::InvalidInput(format!(
                "order {} is already paid",
                self.id
            )));
        }
        if self.items.is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "order {} has no items",
                self.id
            )));
        }
        for item in &self.items {
            if item.quantity == 0 || !item.unit_price.is_positive() {
                return Err(DomainError::InvalidInput(format!(
                    "order {} has an invalid line: quantity {}, unit price {}",
                    self.id, item.quantity, item.unit_price
                )));
            }
        }
        if !self.total.is_positive() {
            return Err(DomainError::InvalidInput(format!(
                "order {} total {} is not positive",
                self.id, self.total
            )));
        }
        Ok(())
    }

    /// Stamps the bank-transfer checkout fields and moves the order to
    /// waiting-confirm.
    pub fn mark_waiting_confirm(
        &mut self,
        session_id: CheckoutSessionId,
        transaction_ref: TransactionRef,
        bank_reference: Option<String>,
        bank_attachment: Option<Attachment>,
        now: DateTime<Utc>,
    ) {
        self.is_cart = false;
        self.status = OrderStatus::WaitingConfirm;
        self.payment_type = Some(PaymentType::BankTransfer);
        self.checkout_session_id = Some(session_id);
        self.transaction_ref = Some(transaction_ref);
        self.bank_reference = bank_reference;
        self.bank_attachment = bank_attachment;
        self.transferred_at = Some(now);
        self.apply_lead_time(now);
        self.updated_at = now;
    }

    /// Stamps the card checkout fields and moves the order to paid.
    pub fn mark_paid(
        &mut self,
        session_id: CheckoutSessionId,
        transaction_ref: TransactionRef,
        gateway_authorization_id: String,
        now: DateTime<Utc>,
    ) {
        self.is_cart = false;
        self.status = OrderStatus::Paid;
        self.payment_type = Some(PaymentType::Card);
        self.checkout_session_id = Some(session_id);
        self.transaction_ref = Some(transaction_ref);
        self.gateway_authorization_id = Some(gateway_authorization_id);
        self.mark_as_paid_at = Some(now);
        self.apply_lead_time(now);
        self.updated_at = now;
    }

    fn apply_lead_time(&mut self, now: DateTime<Utc>) {
        if let Some(days) = self.sample_lead_time_days {
            self.start_date = Some(now);
            self.completion_date = Some(now + Duration::days(days as i64));
        }
    }
}

/// Status of the sample inquiry behind a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    Open,
    Finished,
}

/// A sample inquiry. Card checkout closes the inquiries behind paid carts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: InquiryId,
    pub user_id: UserId,
    pub status: InquiryStatus,
}

impl Inquiry {
    /// Creates an open inquiry.
    pub fn open(user_id: UserId) -> Self {
        Self {
            id: InquiryId::new(),
            user_id,
            status: InquiryStatus::Open,
        }
    }
}
