//! Seller quotations on bulk purchase orders.

use chrono::{DateTime, Utc};
use common::{BulkOrderId, QuotationId, UserId};
use serde::{Deserialize, Serialize};

use crate::money::{Currency, Money};

/// Lifecycle status of a seller quotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    /// Created, nothing quoted yet.
    New,
    /// Submitted, waiting for admin review.
    WaitingForApproval,
    Approved,
    Rejected,
}

impl QuotationStatus {
    /// Returns the status as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::New => "new",
            QuotationStatus::WaitingForApproval => "waiting_for_approval",
            QuotationStatus::Approved => "approved",
            QuotationStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-quantity price break. Up-charges compensate smaller runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityTier {
    /// Largest order quantity this tier applies to.
    pub quantity: u32,
    pub up_charge: Money,
    pub unit_price: Money,
    pub total_price: Money,
}

impl QuantityTier {
    /// Creates a tier with pricing not yet computed.
    pub fn new(quantity: u32, up_charge: Money) -> Self {
        let currency = up_charge.currency();
        Self {
            quantity,
            up_charge,
            unit_price: Money::zero(currency),
            total_price: Money::zero(currency),
        }
    }
}

/// The cost components a seller submits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuotationCosts {
    pub fabric: Money,
    pub making: Money,
    pub decoration: Money,
    pub other: Money,
}

impl QuotationCosts {
    /// Sum of all cost components.
    pub fn total(&self) -> Money {
        self.fabric.add(self.making).add(self.decoration).add(self.other)
    }
}

/// A seller's quotation against a bulk purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerQuotation {
    pub id: QuotationId,
    pub bulk_order_id: BulkOrderId,
    pub seller_id: UserId,
    pub status: QuotationStatus,
    pub currency: Currency,
    pub costs: QuotationCosts,
    pub quoted_price: Money,
    pub tiers: Vec<QuantityTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_at: Option<DateTime<Utc>>,
}

impl SellerQuotation {
    /// Creates an empty quotation slot for a seller on a bulk order.
    pub fn new(bulk_order_id: BulkOrderId, seller_id: UserId, currency: Currency) -> Self {
        Self {
            id: QuotationId::new(),
            bulk_order_id,
            seller_id,
            status: QuotationStatus::New,
            currency,
            costs: QuotationCosts {
                fabric: Money::zero(currency),
                making: Money::zero(currency),
                decoration: Money::zero(currency),
                other: Money::zero(currency),
            },
            quoted_price: Money::zero(currency),
            tiers: vec![],
            remark: None,
            reject_reason: None,
            quoted_at: None,
        }
    }

    /// Applies submitted costs and tiers, computing all derived prices.
    ///
    /// The quoted price is the sum of the cost components. Each tier's unit
    /// price is the quoted price plus that tier's up-charge; the tier total
    /// is the unit price times the tier quantity.
    pub fn submit(&mut self, costs: QuotationCosts, tiers: Vec<QuantityTier>, remark: Option<String>) {
        self.costs = costs;
        self.quoted_price = costs.total();
        self.tiers = tiers;
        for tier in &mut self.tiers {
            tier.unit_price = self.quoted_price.add(tier.up_charge);
            tier.total_price = tier.unit_price.multiply(tier.quantity);
        }
        self.remark = remark;
        self.status = QuotationStatus::WaitingForApproval;
        self.quoted_at = Some(Utc::now());
    }

    /// Unit price for an order of the given quantity.
    ///
    /// Picks the tier with the smallest tier quantity covering the order;
    /// quantities above every tier pay no up-charge.
    pub fn unit_price_for(&self, quantity: u32) -> Money {
        self.tiers
            .iter()
            .filter(|t| t.quantity >= quantity)
            .min_by_key(|t| t.quantity)
            .map(|t| t.unit_price)
            .unwrap_or(self.quoted_price)
    }

    /// Total price for an order of the given quantity.
    pub fn total_for(&self, quantity: u32) -> Money {
        self.unit_price_for(quantity).multiply(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(amount: i64) -> Money {
        Money::from_minor(amount, Currency::Usd)
    }

    fn costs() -> QuotationCosts {
        QuotationCosts {
            fabric: usd(400),
            making: usd(300),
            decoration: usd(200),
            other: usd(100),
        }
    }

    #[test]
    fn test_quoted_price_is_sum_of_costs() {
        let mut q = SellerQuotation::new(BulkOrderId::new(), UserId::new(), Currency::Usd);
        q.submit(costs(), vec![], None);

        assert_eq!(q.quoted_price, usd(1000));
        assert_eq!(q.status, QuotationStatus::WaitingForApproval);
        assert!(q.quoted_at.is_some());
    }

    #[test]
    fn test_tier_pricing_does_not_cascade() {
        let mut q = SellerQuotation::new(BulkOrderId::new(), UserId::new(), Currency::Usd);
        q.submit(
            costs(),
            vec![
                QuantityTier::new(100, usd(50)),
                QuantityTier::new(500, usd(20)),
            ],
            None,
        );

        // Both tiers price off the same quoted base.
        assert_eq!(q.tiers[0].unit_price, usd(1050));
        assert_eq!(q.tiers[0].total_price, usd(105_000));
        assert_eq!(q.tiers[1].unit_price, usd(1020));
        assert_eq!(q.tiers[1].total_price, usd(510_000));
    }

    #[test]
    fn test_unit_price_picks_smallest_covering_tier() {
        let mut q = SellerQuotation::new(BulkOrderId::new(), UserId::new(), Currency::Usd);
        q.submit(
            costs(),
            vec![
                QuantityTier::new(100, usd(50)),
                QuantityTier::new(500, usd(20)),
            ],
            None,
        );

        assert_eq!(q.unit_price_for(80), usd(1050));
        assert_eq!(q.unit_price_for(300), usd(1020));
        // Above every tier: no up-charge.
        assert_eq!(q.unit_price_for(1000), usd(1000));
        assert_eq!(q.total_for(1000), usd(1_000_000));
    }
}
