//! PostgreSQL-backed storage implementation.

use async_trait::async_trait;
use common::{BulkOrderId, CheckoutSessionId, InquiryId, OrderId, QuotationId};
use domain::{
    BulkPurchaseOrder, Inquiry, InquiryStatus, Order, PaymentTransaction, SellerQuotation,
    TrackingEntry,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::error::{Result, StoreError};
use crate::storage::{Storage, StorageTx};

/// PostgreSQL storage over a connection pool.
#[derive(Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates storage over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn row_to_data<T: serde::de::DeserializeOwned>(row: &PgRow) -> Result<T> {
    let data: serde_json::Value = row.try_get("data")?;
    Ok(serde_json::from_value(data)?)
}

#[async_trait]
impl Storage for PostgresStorage {
    type Tx = PostgresTx;

    async fn begin(&self) -> Result<Self::Tx> {
        let tx = self.pool.begin().await?;
        Ok(PostgresTx { tx })
    }

    async fn order(&self, id: OrderId) -> Result<Order> {
        let row = sqlx::query("SELECT data FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("order", id))?;
        row_to_data(&row)
    }

    async fn orders(&self, ids: &[OrderId]) -> Result<Vec<Order>> {
        let uuids: Vec<_> = ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query("SELECT data FROM orders WHERE id = ANY($1)")
            .bind(&uuids)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_data).collect()
    }

    async fn orders_by_session(&self, session: &CheckoutSessionId) -> Result<Vec<Order>> {
        let rows = sqlx::query("SELECT data FROM orders WHERE checkout_session_id = $1")
            .bind(session.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_data).collect()
    }

    async fn bulk_order(&self, id: BulkOrderId) -> Result<BulkPurchaseOrder> {
        let row = sqlx::query("SELECT data FROM bulk_purchase_orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("bulk purchase order", id))?;
        row_to_data(&row)
    }

    async fn quotation(&self, id: QuotationId) -> Result<SellerQuotation> {
        let row = sqlx::query("SELECT data FROM seller_quotations WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("quotation", id))?;
        row_to_data(&row)
    }

    async fn quotations(&self, ids: &[QuotationId]) -> Result<Vec<SellerQuotation>> {
        let uuids: Vec<_> = ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query("SELECT data FROM seller_quotations WHERE id = ANY($1)")
            .bind(&uuids)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_data).collect()
    }

    async fn quotations_for_bulk_order(&self, id: BulkOrderId) -> Result<Vec<SellerQuotation>> {
        let rows = sqlx::query("SELECT data FROM seller_quotations WHERE bulk_order_id = $1")
            .bind(id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_data).collect()
    }

    async fn transaction_by_session(
        &self,
        session: &CheckoutSessionId,
    ) -> Result<PaymentTransaction> {
        let row = sqlx::query(
            "SELECT data FROM payment_transactions WHERE checkout_session_id = $1",
        )
        .bind(session.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("payment transaction", session))?;
        row_to_data(&row)
    }

    async fn tracking_history(&self, id: BulkOrderId) -> Result<Vec<TrackingEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT data FROM bulk_purchase_order_trackings
            WHERE bulk_order_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_data).collect()
    }

    async fn inquiry(&self, id: InquiryId) -> Result<Inquiry> {
        let row = sqlx::query("SELECT data FROM inquiries WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("inquiry", id))?;
        row_to_data(&row)
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, checkout_session_id, data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.checkout_session_id.as_ref().map(|s| s.as_str()))
        .bind(serde_json::to_value(order)?)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_order(&self, order: &Order) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, checkout_session_id = $3, data = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.checkout_session_id.as_ref().map(|s| s.as_str()))
        .bind(serde_json::to_value(order)?)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_order(&self, id: OrderId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_bulk_order(&self, order: &BulkPurchaseOrder) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bulk_purchase_orders (id, tracking_status, data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.tracking_status.as_str())
        .bind(serde_json::to_value(order)?)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_quotation(&self, quotation: &SellerQuotation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO seller_quotations (id, bulk_order_id, status, data)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(quotation.id.as_uuid())
        .bind(quotation.bulk_order_id.as_uuid())
        .bind(quotation.status.as_str())
        .bind(serde_json::to_value(quotation)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_inquiry(&self, inquiry: &Inquiry) -> Result<()> {
        sqlx::query("INSERT INTO inquiries (id, status, data) VALUES ($1, $2, $3)")
            .bind(inquiry.id.as_uuid())
            .bind(match inquiry.status {
                InquiryStatus::Open => "open",
                InquiryStatus::Finished => "finished",
            })
            .bind(serde_json::to_value(inquiry)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// An open Postgres transaction. Dropping it without commit rolls back.
pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StorageTx for PostgresTx {
    async fn order(&mut self, id: OrderId) -> Result<Order> {
        let row = sqlx::query("SELECT data FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| StoreError::not_found("order", id))?;
        row_to_data(&row)
    }

    async fn bulk_order(&mut self, id: BulkOrderId) -> Result<BulkPurchaseOrder> {
        let row = sqlx::query("SELECT data FROM bulk_purchase_orders WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| StoreError::not_found("bulk purchase order", id))?;
        row_to_data(&row)
    }

    async fn quotation(&mut self, id: QuotationId) -> Result<SellerQuotation> {
        let row = sqlx::query("SELECT data FROM seller_quotations WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| StoreError::not_found("quotation", id))?;
        row_to_data(&row)
    }

    async fn update_order(&mut self, order: &Order) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, checkout_session_id = $3, data = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.checkout_session_id.as_ref().map(|s| s.as_str()))
        .bind(serde_json::to_value(order)?)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn update_bulk_order(&mut self, order: &BulkPurchaseOrder) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE bulk_purchase_orders
            SET tracking_status = $2, data = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.tracking_status.as_str())
        .bind(serde_json::to_value(order)?)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn update_quotation(&mut self, quotation: &SellerQuotation) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE seller_quotations
            SET status = $2, data = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(quotation.id.as_uuid())
        .bind(quotation.status.as_str())
        .bind(serde_json::to_value(quotation)?)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn upsert_quotation(&mut self, quotation: &SellerQuotation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO seller_quotations (id, bulk_order_id, status, data)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id)
            DO UPDATE SET status = EXCLUDED.status, data = EXCLUDED.data, updated_at = now()
            "#,
        )
        .bind(quotation.id.as_uuid())
        .bind(quotation.bulk_order_id.as_uuid())
        .bind(quotation.status.as_str())
        .bind(serde_json::to_value(quotation)?)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn reject_sibling_quotations(
        &mut self,
        bulk_order_id: BulkOrderId,
        approved: QuotationId,
        reason: &str,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE seller_quotations
            SET status = 'rejected',
                data = jsonb_set(
                    jsonb_set(data, '{status}', '"rejected"'),
                    '{reject_reason}', to_jsonb($3::text)
                ),
                updated_at = now()
            WHERE bulk_order_id = $1 AND id <> $2 AND status <> 'rejected'
            "#,
        )
        .bind(bulk_order_id.as_uuid())
        .bind(approved.as_uuid())
        .bind(reason)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_transaction(&mut self, transaction: &PaymentTransaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_transactions (id, reference_id, checkout_session_id, data, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(transaction.id.as_uuid())
        .bind(transaction.reference_id.as_str())
        .bind(transaction.checkout_session_id.as_ref().map(|s| s.as_str()))
        .bind(serde_json::to_value(transaction)?)
        .bind(transaction.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("payment_transactions_reference_id_unique")
            {
                return StoreError::Duplicate {
                    entity: "payment transaction",
                    id: transaction.reference_id.to_string(),
                };
            }
            StoreError::Database(e)
        })?;
        Ok(())
    }

    async fn insert_tracking(&mut self, entry: &TrackingEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bulk_purchase_order_trackings (id, bulk_order_id, data, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.bulk_order_id.as_uuid())
        .bind(serde_json::to_value(entry)?)
        .bind(entry.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_tracking_batch(&mut self, entries: &[TrackingEntry]) -> Result<()> {
        for entry in entries {
            self.insert_tracking(entry).await?;
        }
        Ok(())
    }

    async fn finish_inquiry(&mut self, id: InquiryId) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE inquiries
            SET status = 'finished', data = jsonb_set(data, '{status}', '"finished"')
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
