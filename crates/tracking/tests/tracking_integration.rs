//! End-to-end tracking flow tests over the in-memory storage.

use common::{QuotationId, UserId};
use domain::{
    Attachment, BulkPurchaseOrder, Currency, InspectionProcedure, LogisticInfo, Money,
    PoAttachment, PoAttachmentStatus, PpsReport, ProductionInfo, QcReport, QcReportStatus,
    QuantityTier, QuotationCosts, QuotationStatus, RawMaterial, SellerQuotation,
    SellerTrackingStatus, TrackingAction,
};
use store::{InMemoryStorage, Storage, StorageTx};
use tracking::{Actor, QuotationSubmission, TrackingError, TrackingService};
use uuid::Uuid;

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

fn admin() -> Actor {
    Actor::new(UserId::new(), domain::UserGroup::Admin)
}

fn seller_actor(seller: UserId) -> Actor {
    Actor::new(seller, domain::UserGroup::Seller)
}

fn buyer_actor(buyer: UserId) -> Actor {
    Actor::new(buyer, domain::UserGroup::Buyer)
}

/// Seeds a bulk order for 100 units with one empty quotation slot.
async fn seed(store: &InMemoryStorage) -> (BulkPurchaseOrder, SellerQuotation, UserId) {
    let seller = UserId::new();
    let bulk = BulkPurchaseOrder::new(UserId::new(), Currency::Usd, 100);
    let quotation = SellerQuotation::new(bulk.id, seller, Currency::Usd);
    store.insert_bulk_order(&bulk).await.unwrap();
    store.insert_quotation(&quotation).await.unwrap();
    (bulk, quotation, seller)
}

/// Seeds and walks the order to the waiting-first-payment stage.
async fn seed_approved(
    store: &InMemoryStorage,
    service: &TrackingService<InMemoryStorage>,
) -> (BulkPurchaseOrder, UserId) {
    let (bulk, quotation, seller) = seed(store).await;
    service
        .submit_quotation(quotation.id, costs(), vec![], None, seller_actor(seller))
        .await
        .unwrap();
    service.approve_quotation(quotation.id, admin()).await.unwrap();
    let bulk = service.approve_po(bulk.id, seller_actor(seller)).await.unwrap();
    (bulk, seller)
}

#[tokio::test]
async fn first_payout_splits_the_quotation_total_exactly() {
    let store = InMemoryStorage::new();
    let service = TrackingService::new(store.clone());
    let (bulk, _) = seed_approved(&store, &service).await;

    // 100 units at 1000 minor each.
    assert_eq!(bulk.quotation_total, Some(usd(100_000)));

    let bulk = service
        .create_first_payout(bulk.id, 30.0, Some("WIRE-7".to_string()), None, admin())
        .await
        .unwrap();

    assert_eq!(bulk.tracking_status, SellerTrackingStatus::FirstPaymentConfirm);
    assert_eq!(bulk.first_payout_total, Some(usd(30_000)));
    assert_eq!(bulk.final_payout_total, Some(usd(70_000)));
    assert!(bulk.first_payout_transferred_at.is_some());
    assert_eq!(store.transaction_count().await, 1);
}

#[tokio::test]
async fn zero_percentage_skips_the_first_payout() {
    let store = InMemoryStorage::new();
    let service = TrackingService::new(store.clone());
    let (bulk, seller) = seed_approved(&store, &service).await;

    let bulk = service
        .create_first_payout(bulk.id, 0.0, None, None, admin())
        .await
        .unwrap();

    assert_eq!(bulk.tracking_status, SellerTrackingStatus::FirstPaymentSkipped);
    assert_eq!(bulk.final_payout_total, Some(usd(100_000)));
    assert!(bulk.first_payout_transferred_at.is_none());
    assert_eq!(store.transaction_count().await, 0);

    // The seller starts production without waiting for money.
    let bulk = service
        .start_without_first_payment(bulk.id, seller_actor(seller))
        .await
        .unwrap();
    assert_eq!(bulk.tracking_status, SellerTrackingStatus::FirstPaymentConfirmed);
}

#[tokio::test]
async fn confirming_an_unsent_payout_is_rejected_without_an_audit_row() {
    let store = InMemoryStorage::new();
    let service = TrackingService::new(store.clone());
    let (bulk, seller) = seed_approved(&store, &service).await;
    let rows_before = store.tracking_count().await;

    let err = service
        .confirm_first_payout(bulk.id, seller_actor(seller))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TrackingError::NotAbleToConfirm {
            status: SellerTrackingStatus::WaitingFirstPayment
        }
    ));
    assert_eq!(store.tracking_count().await, rows_before);
}

#[tokio::test]
async fn approving_a_quotation_rejects_its_siblings() {
    let store = InMemoryStorage::new();
    let service = TrackingService::new(store.clone());
    let (bulk, winner, seller) = seed(&store).await;

    let mut loser = SellerQuotation::new(bulk.id, UserId::new(), Currency::Usd);
    loser.submit(costs(), vec![], None);
    store.insert_quotation(&loser).await.unwrap();

    service
        .submit_quotation(
            winner.id,
            costs(),
            vec![QuantityTier::new(100, usd(50))],
            None,
            seller_actor(seller),
        )
        .await
        .unwrap();
    let bulk = service.approve_quotation(winner.id, admin()).await.unwrap();

    assert_eq!(bulk.tracking_status, SellerTrackingStatus::Po);
    assert_eq!(bulk.seller_id, Some(seller));
    assert_eq!(bulk.approved_quotation_id, Some(winner.id));
    // 100 units fall in the 100-unit tier: (1000 + 50) * 100.
    assert_eq!(bulk.quotation_total, Some(usd(105_000)));

    let stored_winner = store.quotation(winner.id).await.unwrap();
    assert_eq!(stored_winner.status, QuotationStatus::Approved);
    let stored_loser = store.quotation(loser.id).await.unwrap();
    assert_eq!(stored_loser.status, QuotationStatus::Rejected);
    assert!(stored_loser.reject_reason.is_some());
}

#[tokio::test]
async fn approved_quotations_cannot_be_resubmitted() {
    let store = InMemoryStorage::new();
    let service = TrackingService::new(store.clone());
    let (_, quotation, seller) = seed(&store).await;

    service
        .submit_quotation(quotation.id, costs(), vec![], None, seller_actor(seller))
        .await
        .unwrap();
    service.approve_quotation(quotation.id, admin()).await.unwrap();

    let err = service
        .submit_quotation(quotation.id, costs(), vec![], None, seller_actor(seller))
        .await
        .unwrap_err();
    assert!(matches!(err, TrackingError::QuotationAlreadyApproved(_)));
}

#[tokio::test]
async fn batch_submission_validates_everything_before_writing() {
    let store = InMemoryStorage::new();
    let service = TrackingService::new(store.clone());
    let (_, quotation, seller) = seed(&store).await;
    let rows_before = store.tracking_count().await;

    let batch = vec![
        QuotationSubmission {
            quotation_id: quotation.id,
            costs: costs(),
            tiers: vec![],
            remark: None,
        },
        QuotationSubmission {
            quotation_id: QuotationId::new(),
            costs: costs(),
            tiers: vec![],
            remark: None,
        },
    ];

    let err = service
        .submit_multiple_quotations(batch, seller_actor(seller))
        .await
        .unwrap_err();
    assert!(matches!(err, TrackingError::Store(_)));

    // Nothing moved: the valid quotation stays untouched.
    let stored = store.quotation(quotation.id).await.unwrap();
    assert_eq!(stored.status, QuotationStatus::New);
    assert_eq!(store.tracking_count().await, rows_before);
}

#[tokio::test]
async fn batch_submission_advances_the_bulk_order() {
    let store = InMemoryStorage::new();
    let service = TrackingService::new(store.clone());
    let (bulk, quotation, seller) = seed(&store).await;

    let submitted = service
        .submit_multiple_quotations(
            vec![QuotationSubmission {
                quotation_id: quotation.id,
                costs: costs(),
                tiers: vec![],
                remark: Some("MOQ 100".to_string()),
            }],
            seller_actor(seller),
        )
        .await
        .unwrap();

    assert_eq!(submitted[0].quoted_price, usd(1000));
    let stored = store.bulk_order(bulk.id).await.unwrap();
    assert_eq!(stored.tracking_status, SellerTrackingStatus::WaitingForApproval);
}

#[tokio::test]
async fn rejecting_a_po_records_the_reason_on_every_document() {
    let store = InMemoryStorage::new();
    let service = TrackingService::new(store.clone());
    let (_, quotation, seller) = seed(&store).await;

    service
        .submit_quotation(quotation.id, costs(), vec![], None, seller_actor(seller))
        .await
        .unwrap();
    let mut bulk = service.approve_quotation(quotation.id, admin()).await.unwrap();

    bulk.po_attachments.push(PoAttachment {
        attachment: Attachment::new("po/draft.pdf"),
        status: PoAttachmentStatus::Pending,
        reject_reason: None,
    });
    let mut tx = store.begin().await.unwrap();
    tx.update_bulk_order(&bulk).await.unwrap();
    tx.commit().await.unwrap();

    let bulk = service
        .reject_po(bulk.id, "lead time too long".to_string(), seller_actor(seller))
        .await
        .unwrap();

    assert_eq!(bulk.tracking_status, SellerTrackingStatus::PoRejected);
    assert!(bulk.tracking_status.is_terminal());
    assert_eq!(bulk.po_reject_reason.as_deref(), Some("lead time too long"));
    assert_eq!(bulk.po_attachments[0].status, PoAttachmentStatus::Rejected);
    assert_eq!(
        bulk.po_attachments[0].reject_reason.as_deref(),
        Some("lead time too long")
    );
}

#[tokio::test]
async fn qc_reports_write_one_audit_row_each() {
    let store = InMemoryStorage::new();
    let service = TrackingService::new(store.clone());
    let (bulk, seller) = seed_approved(&store, &service).await;

    service
        .create_first_payout(bulk.id, 50.0, None, None, admin())
        .await
        .unwrap();
    service
        .confirm_first_payout(bulk.id, seller_actor(seller))
        .await
        .unwrap();
    service
        .update_raw_material(bulk.id, vec![RawMaterial { name: "cotton twill".to_string(), attachments: vec![] }], seller_actor(seller))
        .await
        .unwrap();
    service
        .update_pps(
            bulk.id,
            PpsReport { id: Uuid::new_v4(), name: "sample A".to_string(), attachments: vec![], note: None },
            seller_actor(seller),
        )
        .await
        .unwrap();
    service
        .update_production(bulk.id, ProductionInfo { note: None, attachments: vec![] }, seller_actor(seller))
        .await
        .unwrap();
    service
        .mark_inspection(bulk.id, InspectionProcedure { note: None, attachments: vec![] }, seller_actor(seller))
        .await
        .unwrap();

    let rows_before = store.tracking_count().await;
    let bulk = service
        .create_qc_reports(
            bulk.id,
            vec![
                QcReport {
                    id: Uuid::new_v4(),
                    status: QcReportStatus::Passed,
                    note: None,
                    attachments: vec![Attachment::new("qc/1.jpg")],
                },
                QcReport {
                    id: Uuid::new_v4(),
                    status: QcReportStatus::Failed,
                    note: Some("loose seams".to_string()),
                    attachments: vec![Attachment::new("qc/2.jpg")],
                },
            ],
            seller_actor(seller),
        )
        .await
        .unwrap();

    assert_eq!(bulk.tracking_status, SellerTrackingStatus::Qc);
    assert_eq!(bulk.qc_reports.len(), 2);
    assert_eq!(store.tracking_count().await, rows_before + 2);

    let history = service.history(bulk.id).await.unwrap();
    let qc_rows: Vec<_> = history
        .iter()
        .filter(|e| e.action == TrackingAction::CreateQcReport)
        .collect();
    assert_eq!(qc_rows.len(), 2);
    assert_eq!(qc_rows[0].report_status, Some(QcReportStatus::Passed));
    assert_eq!(qc_rows[1].report_status, Some(QcReportStatus::Failed));
    assert_eq!(qc_rows[1].description.as_deref(), Some("loose seams"));
}

#[tokio::test]
async fn empty_qc_batch_is_rejected() {
    let store = InMemoryStorage::new();
    let service = TrackingService::new(store.clone());
    let (bulk, _, _) = seed(&store).await;

    let err = service
        .create_qc_reports(bulk.id, vec![], admin())
        .await
        .unwrap_err();
    assert!(matches!(err, TrackingError::InvalidInput(_)));
}

#[tokio::test]
async fn override_is_admin_only_and_leaves_an_audit_row() {
    let store = InMemoryStorage::new();
    let service = TrackingService::new(store.clone());
    let (bulk, _, _) = seed(&store).await;

    let err = service
        .override_tracking_status(
            bulk.id,
            SellerTrackingStatus::Production,
            buyer_actor(bulk.buyer_id),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TrackingError::Forbidden {
            action: TrackingAction::OverrideStatus
        }
    ));

    let bulk = service
        .override_tracking_status(bulk.id, SellerTrackingStatus::Production, admin())
        .await
        .unwrap();
    assert_eq!(bulk.tracking_status, SellerTrackingStatus::Production);

    let history = service.history(bulk.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, TrackingAction::OverrideStatus);
    assert_eq!(history[0].description.as_deref(), Some("manual status override"));
}

#[tokio::test]
async fn full_flow_reaches_final_payment_with_an_ordered_trail() {
    let store = InMemoryStorage::new();
    let service = TrackingService::new(store.clone());
    let (bulk, seller) = seed_approved(&store, &service).await;

    service
        .create_first_payout(bulk.id, 30.0, None, None, admin())
        .await
        .unwrap();
    service
        .confirm_first_payout(bulk.id, seller_actor(seller))
        .await
        .unwrap();
    service
        .update_raw_material(bulk.id, vec![RawMaterial { name: "denim".to_string(), attachments: vec![] }], seller_actor(seller))
        .await
        .unwrap();
    service
        .update_pps(
            bulk.id,
            PpsReport { id: Uuid::new_v4(), name: "pps 1".to_string(), attachments: vec![], note: None },
            seller_actor(seller),
        )
        .await
        .unwrap();
    service
        .update_production(bulk.id, ProductionInfo { note: Some("cutting done".to_string()), attachments: vec![] }, seller_actor(seller))
        .await
        .unwrap();
    service
        .mark_inspection(bulk.id, InspectionProcedure { note: None, attachments: vec![] }, admin())
        .await
        .unwrap();
    service
        .create_qc_reports(
            bulk.id,
            vec![QcReport { id: Uuid::new_v4(), status: QcReportStatus::Passed, note: None, attachments: vec![] }],
            admin(),
        )
        .await
        .unwrap();
    service
        .mark_delivering(
            bulk.id,
            LogisticInfo { carrier: "DHL".to_string(), tracking_number: Some("JD0042".to_string()), shipped_at: None, attachments: vec![] },
            seller_actor(seller),
        )
        .await
        .unwrap();
    let delivered = service
        .confirm_delivered(bulk.id, buyer_actor(bulk.buyer_id))
        .await
        .unwrap();
    assert!(delivered.delivery_confirmed_at.is_some());

    let bulk = service
        .create_final_payout(bulk.id, Some("WIRE-9".to_string()), None, admin())
        .await
        .unwrap();
    assert_eq!(bulk.tracking_status, SellerTrackingStatus::FinalPaymentConfirm);
    assert_eq!(bulk.final_payout_total, Some(usd(70_000)));
    assert!(bulk.final_payout_transferred_at.is_some());

    let bulk = service
        .confirm_final_payout(bulk.id, seller_actor(seller))
        .await
        .unwrap();
    assert_eq!(bulk.tracking_status, SellerTrackingStatus::FinalPaymentConfirmed);
    assert!(bulk.tracking_status.is_terminal());

    // Two ledger rows: first payout and final payout.
    assert_eq!(store.transaction_count().await, 2);

    // The audit trail covers every step, oldest first.
    let history = service.history(bulk.id).await.unwrap();
    assert_eq!(history.len(), 14);
    assert_eq!(history[0].action, TrackingAction::SubmitQuotation);
    assert_eq!(history[13].action, TrackingAction::ConfirmFinalPayment);
    assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_first_payouts_settle_exactly_once() {
    let store = InMemoryStorage::new();
    let service = std::sync::Arc::new(TrackingService::new(store.clone()));
    let (bulk, _) = seed_approved(&store, &service).await;

    let first = tokio::spawn({
        let service = service.clone();
        let id = bulk.id;
        async move { service.create_first_payout(id, 30.0, None, None, admin()).await }
    });
    let second = tokio::spawn({
        let service = service.clone();
        let id = bulk.id;
        async move { service.create_first_payout(id, 30.0, None, None, admin()).await }
    });

    let results = [first.await.unwrap(), second.await.unwrap()];
    assert_eq!(
        results.iter().filter(|r| r.is_ok()).count(),
        1,
        "exactly one of two racing payouts may win"
    );
    let loser = results.into_iter().find_map(Result::err).unwrap();
    assert!(matches!(loser, TrackingError::InvalidTransition { .. }));

    // One ledger row, one status advance.
    assert_eq!(store.transaction_count().await, 1);
    let stored = store.bulk_order(bulk.id).await.unwrap();
    assert_eq!(stored.tracking_status, SellerTrackingStatus::FirstPaymentConfirm);
    assert_eq!(stored.first_payout_total, Some(usd(30_000)));
}
