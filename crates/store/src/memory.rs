//! In-memory storage implementation for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BulkOrderId, CheckoutSessionId, InquiryId, OrderId, QuotationId};
use domain::{
    BulkPurchaseOrder, Inquiry, InquiryStatus, Order, PaymentTransaction, QuotationStatus,
    SellerQuotation, TrackingEntry,
};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::error::{Result, StoreError};
use crate::storage::{Storage, StorageTx};

#[derive(Debug, Default, Clone)]
struct InMemoryState {
    orders: HashMap<OrderId, Order>,
    bulk_orders: HashMap<BulkOrderId, BulkPurchaseOrder>,
    quotations: HashMap<QuotationId, SellerQuotation>,
    transactions: Vec<PaymentTransaction>,
    trackings: Vec<TrackingEntry>,
    inquiries: HashMap<InquiryId, Inquiry>,
}

/// In-memory storage with the same transaction semantics as Postgres.
///
/// A transaction takes the single write lock and stages a copy of the state;
/// commit writes the copy back, drop discards it. Transactions therefore
/// serialize, and uncommitted writes are never observable.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of ledger rows.
    pub async fn transaction_count(&self) -> usize {
        self.state.read().await.transactions.len()
    }

    /// Returns the number of audit rows.
    pub async fn tracking_count(&self) -> usize {
        self.state.read().await.trackings.len()
    }

    /// Clears all stored state.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = InMemoryState::default();
    }
}

/// A staged copy of the store, applied on commit.
pub struct InMemoryTx {
    guard: OwnedRwLockWriteGuard<InMemoryState>,
    staged: InMemoryState,
}

#[async_trait]
impl Storage for InMemoryStorage {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = self.state.clone().write_owned().await;
        let staged = guard.clone();
        Ok(InMemoryTx { guard, staged })
    }

    async fn order(&self, id: OrderId) -> Result<Order> {
        self.state
            .read()
            .await
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("order", id))
    }

    async fn orders(&self, ids: &[OrderId]) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.orders.get(id).cloned())
            .collect())
    }

    async fn orders_by_session(&self, session: &CheckoutSessionId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|o| o.checkout_session_id.as_ref() == Some(session))
            .cloned()
            .collect())
    }

    async fn bulk_order(&self, id: BulkOrderId) -> Result<BulkPurchaseOrder> {
        self.state
            .read()
            .await
            .bulk_orders
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("bulk purchase order", id))
    }

    async fn quotation(&self, id: QuotationId) -> Result<SellerQuotation> {
        self.state
            .read()
            .await
            .quotations
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("quotation", id))
    }

    async fn quotations(&self, ids: &[QuotationId]) -> Result<Vec<SellerQuotation>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.quotations.get(id).cloned())
            .collect())
    }

    async fn quotations_for_bulk_order(&self, id: BulkOrderId) -> Result<Vec<SellerQuotation>> {
        let state = self.state.read().await;
        Ok(state
            .quotations
            .values()
            .filter(|q| q.bulk_order_id == id)
            .cloned()
            .collect())
    }

    async fn transaction_by_session(
        &self,
        session: &CheckoutSessionId,
    ) -> Result<PaymentTransaction> {
        self.state
            .read()
            .await
            .transactions
            .iter()
            .find(|t| t.checkout_session_id.as_ref() == Some(session))
            .cloned()
            .ok_or_else(|| StoreError::not_found("payment transaction", session))
    }

    async fn tracking_history(&self, id: BulkOrderId) -> Result<Vec<TrackingEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<_> = state
            .trackings
            .iter()
            .filter(|t| t.bulk_order_id == id)
            .cloned()
            .collect();
        entries.sort_by_key(|t| t.created_at);
        Ok(entries)
    }

    async fn inquiry(&self, id: InquiryId) -> Result<Inquiry> {
        self.state
            .read()
            .await
            .inquiries
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("inquiry", id))
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        self.state
            .write()
            .await
            .orders
            .insert(order.id, order.clone());
        Ok(())
    }

    async fn update_order(&self, order: &Order) -> Result<u64> {
        let mut state = self.state.write().await;
        match state.orders.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_order(&self, id: OrderId) -> Result<u64> {
        let mut state = self.state.write().await;
        Ok(state.orders.remove(&id).map_or(0, |_| 1))
    }

    async fn insert_bulk_order(&self, order: &BulkPurchaseOrder) -> Result<()> {
        self.state
            .write()
            .await
            .bulk_orders
            .insert(order.id, order.clone());
        Ok(())
    }

    async fn insert_quotation(&self, quotation: &SellerQuotation) -> Result<()> {
        self.state
            .write()
            .await
            .quotations
            .insert(quotation.id, quotation.clone());
        Ok(())
    }

    async fn insert_inquiry(&self, inquiry: &Inquiry) -> Result<()> {
        self.state
            .write()
            .await
            .inquiries
            .insert(inquiry.id, inquiry.clone());
        Ok(())
    }
}

#[async_trait]
impl StorageTx for InMemoryTx {
    async fn order(&mut self, id: OrderId) -> Result<Order> {
        self.staged
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("order", id))
    }

    async fn bulk_order(&mut self, id: BulkOrderId) -> Result<BulkPurchaseOrder> {
        self.staged
            .bulk_orders
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("bulk purchase order", id))
    }

    async fn quotation(&mut self, id: QuotationId) -> Result<SellerQuotation> {
        self.staged
            .quotations
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("quotation", id))
    }

    async fn update_order(&mut self, order: &Order) -> Result<u64> {
        match self.staged.orders.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn update_bulk_order(&mut self, order: &BulkPurchaseOrder) -> Result<u64> {
        match self.staged.bulk_orders.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn update_quotation(&mut self, quotation: &SellerQuotation) -> Result<u64> {
        match self.staged.quotations.get_mut(&quotation.id) {
            Some(existing) => {
                *existing = quotation.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn upsert_quotation(&mut self, quotation: &SellerQuotation) -> Result<()> {
        self.staged
            .quotations
            .insert(quotation.id, quotation.clone());
        Ok(())
    }

    async fn reject_sibling_quotations(
        &mut self,
        bulk_order_id: BulkOrderId,
        approved: QuotationId,
        reason: &str,
    ) -> Result<u64> {
        let mut touched = 0;
        for quotation in self.staged.quotations.values_mut() {
            if quotation.bulk_order_id == bulk_order_id
                && quotation.id != approved
                && quotation.status != QuotationStatus::Rejected
            {
                quotation.status = QuotationStatus::Rejected;
                quotation.reject_reason = Some(reason.to_string());
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn insert_transaction(&mut self, transaction: &PaymentTransaction) -> Result<()> {
        if self
            .staged
            .transactions
            .iter()
            .any(|t| t.reference_id == transaction.reference_id)
        {
            return Err(StoreError::Duplicate {
                entity: "payment transaction",
                id: transaction.reference_id.to_string(),
            });
        }
        self.staged.transactions.push(transaction.clone());
        Ok(())
    }

    async fn insert_tracking(&mut self, entry: &TrackingEntry) -> Result<()> {
        self.staged.trackings.push(entry.clone());
        Ok(())
    }

    async fn insert_tracking_batch(&mut self, entries: &[TrackingEntry]) -> Result<()> {
        self.staged.trackings.extend_from_slice(entries);
        Ok(())
    }

    async fn finish_inquiry(&mut self, id: InquiryId) -> Result<u64> {
        match self.staged.inquiries.get_mut(&id) {
            Some(inquiry) => {
                inquiry.status = InquiryStatus::Finished;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn commit(mut self) -> Result<()> {
        *self.guard = self.staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::UserId;
    use domain::{Currency, Money, OrderItem};

    fn sample_order() -> Order {
        Order::new_cart(
            UserId::new(),
            Currency::Usd,
            vec![OrderItem::new(
                "Sample tee",
                1,
                Money::from_minor(1000, Currency::Usd),
            )],
        )
    }

    #[tokio::test]
    async fn test_commit_applies_staged_writes() {
        let store = InMemoryStorage::new();
        let mut order = sample_order();
        store.insert_order(&order).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        order.discount = Money::from_minor(100, Currency::Usd);
        order.update_prices();
        assert_eq!(tx.update_order(&order).await.unwrap(), 1);
        tx.commit().await.unwrap();

        let loaded = store.order(order.id).await.unwrap();
        assert_eq!(loaded.total, Money::from_minor(900, Currency::Usd));
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = InMemoryStorage::new();
        let mut order = sample_order();
        store.insert_order(&order).await.unwrap();
        let original_total = order.total;

        {
            let mut tx = store.begin().await.unwrap();
            order.discount = Money::from_minor(500, Currency::Usd);
            order.update_prices();
            tx.update_order(&order).await.unwrap();
            // dropped without commit
        }

        let loaded = store.order(order.id).await.unwrap();
        assert_eq!(loaded.total, original_total);
        assert_eq!(store.transaction_count().await, 0);
    }

    #[tokio::test]
    async fn test_update_of_missing_row_touches_zero_rows() {
        let store = InMemoryStorage::new();
        let order = sample_order();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.update_order(&order).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_transaction_reference_is_rejected() {
        let store = InMemoryStorage::new();
        let txn = PaymentTransaction::bank_checkout(
            common::TransactionRef::from_string("txn_same"),
            CheckoutSessionId::generate(),
            vec![OrderId::new()],
            UserId::new(),
            Money::from_minor(100, Currency::Usd),
            None,
            None,
            chrono::Utc::now(),
        );

        let mut tx = store.begin().await.unwrap();
        tx.insert_transaction(&txn).await.unwrap();
        let err = tx.insert_transaction(&txn).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_delete_order_reports_rows() {
        let store = InMemoryStorage::new();
        let order = sample_order();
        store.insert_order(&order).await.unwrap();

        assert_eq!(store.delete_order(order.id).await.unwrap(), 1);
        assert_eq!(store.delete_order(order.id).await.unwrap(), 0);
    }
}
