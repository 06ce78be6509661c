//! Storage traits: reads and seeding on [`Storage`], atomic mutations on
//! [`StorageTx`].

use async_trait::async_trait;
use common::{BulkOrderId, CheckoutSessionId, InquiryId, OrderId, QuotationId};
use domain::{
    BulkPurchaseOrder, Inquiry, Order, PaymentTransaction, SellerQuotation, TrackingEntry,
};

use crate::error::Result;

/// Backend-agnostic storage for the order-to-cash state.
///
/// Mutations that must be atomic go through [`Storage::begin`]; everything
/// staged on the returned [`StorageTx`] becomes visible only at commit.
#[async_trait]
pub trait Storage: Send + Sync + Clone + 'static {
    /// The transaction type for this backend.
    type Tx: StorageTx;

    /// Opens a transaction.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Loads an order by ID.
    async fn order(&self, id: OrderId) -> Result<Order>;

    /// Loads the orders that exist among the given IDs. Callers that need
    /// all of them present must compare lengths.
    async fn orders(&self, ids: &[OrderId]) -> Result<Vec<Order>>;

    /// Loads the orders stamped with a checkout session.
    async fn orders_by_session(&self, session: &CheckoutSessionId) -> Result<Vec<Order>>;

    /// Loads a bulk purchase order by ID.
    async fn bulk_order(&self, id: BulkOrderId) -> Result<BulkPurchaseOrder>;

    /// Loads a quotation by ID.
    async fn quotation(&self, id: QuotationId) -> Result<SellerQuotation>;

    /// Loads the quotations that exist among the given IDs.
    async fn quotations(&self, ids: &[QuotationId]) -> Result<Vec<SellerQuotation>>;

    /// Loads every quotation submitted against a bulk purchase order.
    async fn quotations_for_bulk_order(&self, id: BulkOrderId) -> Result<Vec<SellerQuotation>>;

    /// Loads the ledger row created for a checkout session.
    async fn transaction_by_session(
        &self,
        session: &CheckoutSessionId,
    ) -> Result<PaymentTransaction>;

    /// Loads the audit trail of a bulk purchase order, oldest first.
    async fn tracking_history(&self, id: BulkOrderId) -> Result<Vec<TrackingEntry>>;

    /// Loads an inquiry by ID.
    async fn inquiry(&self, id: InquiryId) -> Result<Inquiry>;

    /// Inserts a new order.
    async fn insert_order(&self, order: &Order) -> Result<()>;

    /// Updates an order outside a checkout (cart edits). Returns the number
    /// of rows touched.
    async fn update_order(&self, order: &Order) -> Result<u64>;

    /// Deletes an order (carts emptied of items). Returns the number of rows
    /// touched.
    async fn delete_order(&self, id: OrderId) -> Result<u64>;

    /// Inserts a new bulk purchase order.
    async fn insert_bulk_order(&self, order: &BulkPurchaseOrder) -> Result<()>;

    /// Inserts a new quotation slot.
    async fn insert_quotation(&self, quotation: &SellerQuotation) -> Result<()>;

    /// Inserts a new inquiry.
    async fn insert_inquiry(&self, inquiry: &Inquiry) -> Result<()>;
}

/// An open storage transaction.
///
/// Staged writes are applied atomically by [`StorageTx::commit`]; dropping
/// the transaction without committing discards them. Update methods return
/// the number of rows touched so callers can turn zero into a not-found.
///
/// There is deliberately no update or delete for ledger and tracking rows.
#[async_trait]
pub trait StorageTx: Send {
    /// Re-reads an order inside the transaction, locking the row.
    async fn order(&mut self, id: OrderId) -> Result<Order>;

    /// Re-reads a bulk purchase order inside the transaction, locking the
    /// row. Preconditions must be checked against this read, not against a
    /// load taken before [`Storage::begin`].
    async fn bulk_order(&mut self, id: BulkOrderId) -> Result<BulkPurchaseOrder>;

    /// Re-reads a quotation inside the transaction, locking the row.
    async fn quotation(&mut self, id: QuotationId) -> Result<SellerQuotation>;

    /// Stages an order update.
    async fn update_order(&mut self, order: &Order) -> Result<u64>;

    /// Stages a bulk purchase order update.
    async fn update_bulk_order(&mut self, order: &BulkPurchaseOrder) -> Result<u64>;

    /// Stages a quotation update.
    async fn update_quotation(&mut self, quotation: &SellerQuotation) -> Result<u64>;

    /// Stages a quotation insert-or-replace.
    async fn upsert_quotation(&mut self, quotation: &SellerQuotation) -> Result<()>;

    /// Rejects every not-yet-rejected quotation on a bulk order except the
    /// approved one. Returns the number of rows touched.
    async fn reject_sibling_quotations(
        &mut self,
        bulk_order_id: BulkOrderId,
        approved: QuotationId,
        reason: &str,
    ) -> Result<u64>;

    /// Appends a ledger row.
    async fn insert_transaction(&mut self, transaction: &PaymentTransaction) -> Result<()>;

    /// Appends an audit row.
    async fn insert_tracking(&mut self, entry: &TrackingEntry) -> Result<()>;

    /// Appends a batch of audit rows.
    async fn insert_tracking_batch(&mut self, entries: &[TrackingEntry]) -> Result<()>;

    /// Marks an inquiry finished. Returns the number of rows touched.
    async fn finish_inquiry(&mut self, id: InquiryId) -> Result<u64>;

    /// Applies all staged writes.
    async fn commit(self) -> Result<()>;
}
