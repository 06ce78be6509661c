//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::{CheckoutSessionId, TransactionRef, UserId};
use domain::{
    BulkPurchaseOrder, Currency, Money, Order, OrderItem, PaymentTransaction, QuotationCosts,
    QuotationStatus, SellerQuotation, SellerTrackingStatus, TrackingAction, TrackingEntry,
    UserGroup, status_snapshot,
};
use serial_test::serial;
use sqlx::PgPool;
use store::{PostgresStorage, Storage, StorageTx, StoreError};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_commerce_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStorage {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE orders, bulk_purchase_orders, seller_quotations, \
         payment_transactions, bulk_purchase_order_trackings, inquiries",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresStorage::new(pool)
}

fn usd(amount: i64) -> Money {
    Money::from_minor(amount, Currency::Usd)
}

fn sample_order() -> Order {
    Order::new_cart(
        UserId::new(),
        Currency::Usd,
        vec![OrderItem::new("Sample tee", 2, usd(1500))],
    )
}

#[tokio::test]
#[serial]
async fn insert_and_load_order() {
    let store = get_test_store().await;
    let order = sample_order();

    store.insert_order(&order).await.unwrap();
    let loaded = store.order(order.id).await.unwrap();

    assert_eq!(loaded, order);
}

#[tokio::test]
#[serial]
async fn missing_order_is_not_found() {
    let store = get_test_store().await;
    let err = store.order(common::OrderId::new()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
#[serial]
async fn committed_transaction_is_visible() {
    let store = get_test_store().await;
    let mut order = sample_order();
    store.insert_order(&order).await.unwrap();

    let session = CheckoutSessionId::generate();
    let txn_ref = TransactionRef::generate();
    order.mark_waiting_confirm(
        session.clone(),
        txn_ref.clone(),
        Some("WIRE-42".to_string()),
        None,
        chrono::Utc::now(),
    );

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.update_order(&order).await.unwrap(), 1);
    tx.insert_transaction(&PaymentTransaction::bank_checkout(
        txn_ref,
        session.clone(),
        vec![order.id],
        order.user_id,
        order.total,
        Some("WIRE-42".to_string()),
        None,
        chrono::Utc::now(),
    ))
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let by_session = store.orders_by_session(&session).await.unwrap();
    assert_eq!(by_session.len(), 1);
    let ledger = store.transaction_by_session(&session).await.unwrap();
    assert_eq!(ledger.total_amount, order.total);
}

#[tokio::test]
#[serial]
async fn dropped_transaction_rolls_back() {
    let store = get_test_store().await;
    let mut order = sample_order();
    store.insert_order(&order).await.unwrap();
    let original = order.clone();

    {
        let mut tx = store.begin().await.unwrap();
        order.discount = usd(500);
        order.update_prices();
        tx.update_order(&order).await.unwrap();
        // dropped without commit
    }

    let loaded = store.order(order.id).await.unwrap();
    assert_eq!(loaded.total, original.total);
}

#[tokio::test]
#[serial]
async fn duplicate_transaction_reference_is_rejected() {
    let store = get_test_store().await;
    let make = || {
        PaymentTransaction::bank_checkout(
            TransactionRef::from_string("txn_same"),
            CheckoutSessionId::generate(),
            vec![common::OrderId::new()],
            UserId::new(),
            usd(100),
            None,
            None,
            chrono::Utc::now(),
        )
    };

    let mut tx = store.begin().await.unwrap();
    tx.insert_transaction(&make()).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let err = tx.insert_transaction(&make()).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { .. }));
}

#[tokio::test]
#[serial]
async fn reject_siblings_spares_the_approved_quotation() {
    let store = get_test_store().await;
    let bulk = BulkPurchaseOrder::new(UserId::new(), Currency::Usd, 100);
    store.insert_bulk_order(&bulk).await.unwrap();

    let mut approved = SellerQuotation::new(bulk.id, UserId::new(), Currency::Usd);
    approved.submit(
        QuotationCosts {
            fabric: usd(400),
            making: usd(300),
            decoration: usd(200),
            other: usd(100),
        },
        vec![],
        None,
    );
    let other = SellerQuotation::new(bulk.id, UserId::new(), Currency::Usd);
    store.insert_quotation(&approved).await.unwrap();
    store.insert_quotation(&other).await.unwrap();

    let mut tx = store.begin().await.unwrap();
    approved.status = QuotationStatus::Approved;
    assert_eq!(tx.update_quotation(&approved).await.unwrap(), 1);
    assert_eq!(
        tx.reject_sibling_quotations(bulk.id, approved.id, "another seller was selected")
            .await
            .unwrap(),
        1
    );
    tx.commit().await.unwrap();

    let quotations = store.quotations_for_bulk_order(bulk.id).await.unwrap();
    for q in quotations {
        if q.id == approved.id {
            assert_eq!(q.status, QuotationStatus::Approved);
        } else {
            assert_eq!(q.status, QuotationStatus::Rejected);
            assert_eq!(
                q.reject_reason.as_deref(),
                Some("another seller was selected")
            );
        }
    }
}

#[tokio::test]
#[serial]
async fn tracking_history_is_ordered_by_creation() {
    let store = get_test_store().await;
    let bulk = BulkPurchaseOrder::new(UserId::new(), Currency::Usd, 100);
    store.insert_bulk_order(&bulk).await.unwrap();
    let actor = UserId::new();

    let steps = [
        (SellerTrackingStatus::WaitingForQuotation, SellerTrackingStatus::WaitingForApproval),
        (SellerTrackingStatus::WaitingForApproval, SellerTrackingStatus::Po),
        (SellerTrackingStatus::Po, SellerTrackingStatus::WaitingFirstPayment),
    ];
    for (i, (from, to)) in steps.iter().enumerate() {
        let (before, after) = status_snapshot(*from, *to);
        let mut entry = TrackingEntry::new(
            bulk.id,
            TrackingAction::SubmitQuotation,
            UserGroup::Seller,
            actor,
            before,
            after,
        );
        entry.created_at = chrono::Utc::now() + chrono::Duration::seconds(i as i64);
        let mut tx = store.begin().await.unwrap();
        tx.insert_tracking(&entry).await.unwrap();
        tx.commit().await.unwrap();
    }

    let history = store.tracking_history(bulk.id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].before["tracking_status"], "waiting_for_quotation");
    assert_eq!(history[2].after["tracking_status"], "waiting_first_payment");
}
