//! The bulk purchase order tracking service.
//!
//! Every mutation follows the same shape: open a transaction, re-read the
//! aggregate under its row lock, check the transition table against that
//! read, then append the audit row and update the aggregate, turning a
//! zero-row update into a not-found. A concurrent loser re-reads the
//! winner's committed state and fails its precondition instead of
//! committing a stale snapshot.

use chrono::Utc;
use common::{BulkOrderId, QuotationId, UserId};
use domain::{
    Attachment, BulkPurchaseOrder, InspectionProcedure, LogisticInfo, PaymentMilestone,
    PaymentTransaction, PoAttachmentStatus, PpsReport, ProductionInfo, QcReport, QuantityTier,
    QuotationCosts, QuotationStatus, RawMaterial, SellerQuotation, SellerTrackingStatus,
    TrackingAction, TrackingEntry, UserGroup, next_status, payout_snapshot, quotation_snapshot,
    status_snapshot,
};
use store::{Storage, StorageTx, StoreError};

use crate::error::TrackingError;

/// Who is performing a tracking operation.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: UserId,
    pub group: UserGroup,
}

impl Actor {
    /// Creates an actor.
    pub fn new(user_id: UserId, group: UserGroup) -> Self {
        Self { user_id, group }
    }
}

/// One quotation in a batch submission.
#[derive(Debug, Clone)]
pub struct QuotationSubmission {
    pub quotation_id: QuotationId,
    pub costs: QuotationCosts,
    pub tiers: Vec<QuantityTier>,
    pub remark: Option<String>,
}

/// Drives bulk purchase orders through the seller tracking flow.
pub struct TrackingService<S: Storage> {
    store: S,
}

impl<S: Storage> TrackingService<S> {
    /// Creates a new tracking service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the audit trail of a bulk purchase order, oldest first.
    pub async fn history(&self, bulk_order_id: BulkOrderId) -> Result<Vec<TrackingEntry>, TrackingError> {
        Ok(self.store.tracking_history(bulk_order_id).await?)
    }

    /// Submits (or resubmits) a seller quotation. The first submission moves
    /// the bulk order from waiting-for-quotation to waiting-for-approval.
    #[tracing::instrument(skip(self, costs, tiers, remark), fields(actor = %actor.user_id))]
    pub async fn submit_quotation(
        &self,
        quotation_id: QuotationId,
        costs: QuotationCosts,
        tiers: Vec<QuantityTier>,
        remark: Option<String>,
        actor: Actor,
    ) -> Result<SellerQuotation, TrackingError> {
        let mut tx = self.store.begin().await?;
        let (quotation, before_status) =
            prepare_submission(&mut tx, quotation_id, costs, tiers, remark).await?;
        let bulk = tx.bulk_order(quotation.bulk_order_id).await?;
        let next = require_transition(&bulk, TrackingAction::SubmitQuotation)?;

        let (before, after) = quotation_snapshot(before_status, &quotation);
        let entry = TrackingEntry::new(
            bulk.id,
            TrackingAction::SubmitQuotation,
            actor.group,
            actor.user_id,
            before,
            after,
        );

        tx.insert_tracking(&entry).await?;
        tx.upsert_quotation(&quotation).await?;
        if next != bulk.tracking_status {
            let mut bulk = bulk;
            bulk.tracking_status = next;
            bulk.updated_at = Utc::now();
            guard_rows(tx.update_bulk_order(&bulk).await?, bulk.id)?;
        }
        tx.commit().await?;

        record_transition(TrackingAction::SubmitQuotation);
        Ok(quotation)
    }

    /// Submits a batch of quotations atomically. Every quotation is
    /// validated before anything is written; one failure writes nothing.
    #[tracing::instrument(skip(self, submissions), fields(count = submissions.len(), actor = %actor.user_id))]
    pub async fn submit_multiple_quotations(
        &self,
        submissions: Vec<QuotationSubmission>,
        actor: Actor,
    ) -> Result<Vec<SellerQuotation>, TrackingError> {
        if submissions.is_empty() {
            return Err(TrackingError::InvalidInput(
                "no quotations in batch".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;
        let mut prepared = Vec::with_capacity(submissions.len());
        let mut advanced: Vec<BulkPurchaseOrder> = Vec::new();
        for submission in submissions {
            let (quotation, before_status) = prepare_submission(
                &mut tx,
                submission.quotation_id,
                submission.costs,
                submission.tiers,
                submission.remark,
            )
            .await?;
            if !advanced.iter().any(|b| b.id == quotation.bulk_order_id) {
                let mut bulk = tx.bulk_order(quotation.bulk_order_id).await?;
                let next = require_transition(&bulk, TrackingAction::SubmitQuotation)?;
                if next != bulk.tracking_status {
                    bulk.tracking_status = next;
                    bulk.updated_at = Utc::now();
                    advanced.push(bulk);
                }
            }
            prepared.push((quotation, before_status));
        }

        let mut entries = Vec::with_capacity(prepared.len());
        for (quotation, before_status) in &prepared {
            let (before, after) = quotation_snapshot(*before_status, quotation);
            entries.push(TrackingEntry::new(
                quotation.bulk_order_id,
                TrackingAction::SubmitQuotation,
                actor.group,
                actor.user_id,
                before,
                after,
            ));
        }

        tx.insert_tracking_batch(&entries).await?;
        for (quotation, _) in &prepared {
            tx.upsert_quotation(quotation).await?;
        }
        for bulk in &advanced {
            guard_rows(tx.update_bulk_order(bulk).await?, bulk.id)?;
        }
        tx.commit().await?;

        record_transition(TrackingAction::SubmitQuotation);
        Ok(prepared.into_iter().map(|(q, _)| q).collect())
    }

    /// Approves one quotation: rejects all its siblings, assigns the seller,
    /// snapshots the payout base, and moves the bulk order to PO.
    #[tracing::instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn approve_quotation(
        &self,
        quotation_id: QuotationId,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        require_admin(actor, TrackingAction::ApproveQuotation)?;

        let mut tx = self.store.begin().await?;
        let mut quotation = tx.quotation(quotation_id).await?;
        if quotation.status != QuotationStatus::WaitingForApproval {
            return Err(TrackingError::QuotationNotPending {
                id: quotation_id,
                status: quotation.status,
            });
        }

        let mut bulk = tx.bulk_order(quotation.bulk_order_id).await?;
        let next = require_transition(&bulk, TrackingAction::ApproveQuotation)?;

        let before_status = quotation.status;
        quotation.status = QuotationStatus::Approved;
        bulk.seller_id = Some(quotation.seller_id);
        bulk.approved_quotation_id = Some(quotation.id);
        bulk.quotation_total = Some(quotation.total_for(bulk.quantity));
        bulk.tracking_status = next;
        bulk.updated_at = Utc::now();

        let (before, after) = quotation_snapshot(before_status, &quotation);
        let entry = TrackingEntry::new(
            bulk.id,
            TrackingAction::ApproveQuotation,
            actor.group,
            actor.user_id,
            before,
            after,
        );

        tx.insert_tracking(&entry).await?;
        guard_quotation_rows(tx.update_quotation(&quotation).await?, quotation.id)?;
        tx.reject_sibling_quotations(bulk.id, quotation.id, "another quotation was approved")
            .await?;
        guard_rows(tx.update_bulk_order(&bulk).await?, bulk.id)?;
        tx.commit().await?;

        record_transition(TrackingAction::ApproveQuotation);
        Ok(bulk)
    }

    /// Rejects a quotation under review. Siblings and the bulk order are
    /// left untouched.
    #[tracing::instrument(skip(self, reason), fields(actor = %actor.user_id))]
    pub async fn reject_quotation(
        &self,
        quotation_id: QuotationId,
        reason: String,
        actor: Actor,
    ) -> Result<SellerQuotation, TrackingError> {
        require_admin(actor, TrackingAction::RejectQuotation)?;

        let mut tx = self.store.begin().await?;
        let mut quotation = tx.quotation(quotation_id).await?;
        if quotation.status != QuotationStatus::WaitingForApproval {
            return Err(TrackingError::QuotationNotPending {
                id: quotation_id,
                status: quotation.status,
            });
        }

        let before_status = quotation.status;
        quotation.status = QuotationStatus::Rejected;
        quotation.reject_reason = Some(reason);

        let (before, after) = quotation_snapshot(before_status, &quotation);
        let entry = TrackingEntry::new(
            quotation.bulk_order_id,
            TrackingAction::RejectQuotation,
            actor.group,
            actor.user_id,
            before,
            after,
        );

        tx.insert_tracking(&entry).await?;
        guard_quotation_rows(tx.update_quotation(&quotation).await?, quotation.id)?;
        tx.commit().await?;

        record_transition(TrackingAction::RejectQuotation);
        Ok(quotation)
    }

    /// Seller accepts the purchase order; uploaded PO documents flip to
    /// approved and the order starts waiting for the first payout.
    #[tracing::instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn approve_po(
        &self,
        bulk_order_id: BulkOrderId,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        self.transition(bulk_order_id, TrackingAction::ApprovePo, actor, |bulk| {
            for attachment in &mut bulk.po_attachments {
                attachment.status = PoAttachmentStatus::Approved;
            }
            Ok(())
        })
        .await
    }

    /// Seller rejects the purchase order, ending the flow for this order.
    #[tracing::instrument(skip(self, reason), fields(actor = %actor.user_id))]
    pub async fn reject_po(
        &self,
        bulk_order_id: BulkOrderId,
        reason: String,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        self.transition(bulk_order_id, TrackingAction::RejectPo, actor, |bulk| {
            for attachment in &mut bulk.po_attachments {
                attachment.status = PoAttachmentStatus::Rejected;
                attachment.reject_reason = Some(reason.clone());
            }
            bulk.po_reject_reason = Some(reason.clone());
            Ok(())
        })
        .await
    }

    /// Pays the seller the agreed share of the approved quotation total.
    ///
    /// A zero percentage skips the payout: the status moves to
    /// first-payment-skipped and no ledger row is written.
    #[tracing::instrument(skip(self, bank_reference, attachment), fields(actor = %actor.user_id))]
    pub async fn create_first_payout(
        &self,
        bulk_order_id: BulkOrderId,
        percentage: f64,
        bank_reference: Option<String>,
        attachment: Option<Attachment>,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        require_admin(actor, TrackingAction::FirstPayout)?;
        if !(0.0..=100.0).contains(&percentage) {
            return Err(TrackingError::InvalidInput(format!(
                "payout percentage {percentage} out of range"
            )));
        }

        let mut tx = self.store.begin().await?;
        let mut bulk = tx.bulk_order(bulk_order_id).await?;
        let seller_id = bulk
            .seller_id
            .ok_or(TrackingError::SellerNotAssigned(bulk_order_id))?;
        let base = bulk
            .quotation_total
            .ok_or(TrackingError::NoApprovedQuotation(bulk_order_id))?;

        let action = if percentage > 0.0 {
            TrackingAction::FirstPayout
        } else {
            TrackingAction::FirstPayoutSkipped
        };
        let next = require_transition(&bulk, action)?;

        let previous = bulk.clone();
        let now = Utc::now();
        let first = base.percentage(percentage);
        bulk.first_payout_percentage = Some(percentage);
        bulk.first_payout_total = Some(first);
        bulk.final_payout_total = Some(base.subtract(first));
        bulk.tracking_status = next;
        bulk.updated_at = now;
        if percentage > 0.0 {
            bulk.first_payout_transferred_at = Some(now);
        }

        let (before, after) = payout_snapshot(&previous, &bulk);
        let mut entry = TrackingEntry::new(bulk.id, action, actor.group, actor.user_id, before, after);
        if let Some(attachment) = &attachment {
            entry = entry.with_attachments(vec![attachment.clone()]);
        }

        tx.insert_tracking(&entry).await?;
        if percentage > 0.0 {
            tx.insert_transaction(&PaymentTransaction::payout(
                PaymentMilestone::FirstPayout,
                bulk.id,
                seller_id,
                first,
                percentage,
                bank_reference,
                attachment,
                now,
            ))
            .await?;
        }
        guard_rows(tx.update_bulk_order(&bulk).await?, bulk.id)?;
        tx.commit().await?;

        record_transition(action);
        Ok(bulk)
    }

    /// Seller confirms receipt of the first payout.
    #[tracing::instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn confirm_first_payout(
        &self,
        bulk_order_id: BulkOrderId,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        self.transition(bulk_order_id, TrackingAction::ConfirmFirstPayment, actor, |_| Ok(()))
            .await
            .map_err(not_able_to_confirm)
    }

    /// Seller starts production on an order whose first payout was skipped.
    #[tracing::instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn start_without_first_payment(
        &self,
        bulk_order_id: BulkOrderId,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        self.transition(
            bulk_order_id,
            TrackingAction::StartWithoutFirstPayment,
            actor,
            |_| Ok(()),
        )
        .await
        .map_err(|err| match err {
            TrackingError::InvalidTransition { status, .. } => {
                TrackingError::NotAbleToStart { status }
            }
            other => other,
        })
    }

    /// Records the raw material plan and moves the order into that stage.
    #[tracing::instrument(skip(self, materials), fields(actor = %actor.user_id))]
    pub async fn update_raw_material(
        &self,
        bulk_order_id: BulkOrderId,
        materials: Vec<RawMaterial>,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        self.transition(bulk_order_id, TrackingAction::UpdateRawMaterial, actor, |bulk| {
            bulk.raw_materials = materials.clone();
            Ok(())
        })
        .await
    }

    /// Adds or replaces a pre-production sample report.
    #[tracing::instrument(skip(self, report), fields(actor = %actor.user_id))]
    pub async fn update_pps(
        &self,
        bulk_order_id: BulkOrderId,
        report: PpsReport,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        self.transition(bulk_order_id, TrackingAction::UpdatePps, actor, |bulk| {
            bulk.upsert_pps_report(report.clone());
            Ok(())
        })
        .await
    }

    /// Records a production progress update.
    #[tracing::instrument(skip(self, info), fields(actor = %actor.user_id))]
    pub async fn update_production(
        &self,
        bulk_order_id: BulkOrderId,
        info: ProductionInfo,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        self.transition(bulk_order_id, TrackingAction::UpdateProduction, actor, |bulk| {
            bulk.production_info = Some(info.clone());
            Ok(())
        })
        .await
    }

    /// Records the agreed inspection procedure.
    #[tracing::instrument(skip(self, procedure), fields(actor = %actor.user_id))]
    pub async fn mark_inspection(
        &self,
        bulk_order_id: BulkOrderId,
        procedure: InspectionProcedure,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        self.transition(bulk_order_id, TrackingAction::MarkInspection, actor, |bulk| {
            bulk.inspection = Some(procedure.clone());
            Ok(())
        })
        .await
    }

    /// Files QC reports: one audit row per report, carrying the report's
    /// outcome and photos.
    #[tracing::instrument(skip(self, reports), fields(count = reports.len(), actor = %actor.user_id))]
    pub async fn create_qc_reports(
        &self,
        bulk_order_id: BulkOrderId,
        reports: Vec<QcReport>,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        if reports.is_empty() {
            return Err(TrackingError::InvalidInput("no QC reports".to_string()));
        }

        let mut tx = self.store.begin().await?;
        let mut bulk = tx.bulk_order(bulk_order_id).await?;
        let next = require_transition(&bulk, TrackingAction::CreateQcReport)?;

        let previous_status = bulk.tracking_status;
        bulk.qc_reports.extend(reports.iter().cloned());
        bulk.tracking_status = next;
        bulk.updated_at = Utc::now();

        for report in &reports {
            let (before, after) = status_snapshot(previous_status, next);
            let mut entry = TrackingEntry::new(
                bulk.id,
                TrackingAction::CreateQcReport,
                actor.group,
                actor.user_id,
                before,
                after,
            )
            .with_report_status(report.status)
            .with_attachments(report.attachments.clone());
            if let Some(note) = &report.note {
                entry = entry.with_description(note.clone());
            }
            tx.insert_tracking(&entry).await?;
        }
        guard_rows(tx.update_bulk_order(&bulk).await?, bulk.id)?;
        tx.commit().await?;

        record_transition(TrackingAction::CreateQcReport);
        Ok(bulk)
    }

    /// Records shipping details and moves the order to delivering.
    #[tracing::instrument(skip(self, logistic), fields(actor = %actor.user_id))]
    pub async fn mark_delivering(
        &self,
        bulk_order_id: BulkOrderId,
        logistic: LogisticInfo,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        self.transition(bulk_order_id, TrackingAction::MarkDelivering, actor, |bulk| {
            bulk.logistic_info = Some(logistic.clone());
            bulk.delivery_started_at = Some(Utc::now());
            Ok(())
        })
        .await
    }

    /// Buyer confirms the goods arrived.
    #[tracing::instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn confirm_delivered(
        &self,
        bulk_order_id: BulkOrderId,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        self.transition(bulk_order_id, TrackingAction::ConfirmDelivered, actor, |bulk| {
            bulk.delivery_confirmed_at = Some(Utc::now());
            Ok(())
        })
        .await
    }

    /// Pays the seller the remainder after delivery.
    ///
    /// When the first payout covered everything (100%), the status still
    /// advances but no ledger row is written.
    #[tracing::instrument(skip(self, bank_reference, attachment), fields(actor = %actor.user_id))]
    pub async fn create_final_payout(
        &self,
        bulk_order_id: BulkOrderId,
        bank_reference: Option<String>,
        attachment: Option<Attachment>,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        require_admin(actor, TrackingAction::FinalPayout)?;

        let mut tx = self.store.begin().await?;
        let mut bulk = tx.bulk_order(bulk_order_id).await?;
        let seller_id = bulk
            .seller_id
            .ok_or(TrackingError::SellerNotAssigned(bulk_order_id))?;
        let base = bulk
            .quotation_total
            .ok_or(TrackingError::NoApprovedQuotation(bulk_order_id))?;
        let next = require_transition(&bulk, TrackingAction::FinalPayout)?;

        // Without a first payout the full quotation total is due.
        let already_paid = bulk.first_payout_total.unwrap_or_else(|| {
            domain::Money::zero(base.currency())
        });
        let amount = base.subtract(already_paid);
        let percentage = 100.0 - bulk.first_payout_percentage.unwrap_or(0.0);

        let previous = bulk.clone();
        let now = Utc::now();
        bulk.final_payout_total = Some(amount);
        bulk.tracking_status = next;
        bulk.updated_at = now;
        if percentage > 0.0 {
            bulk.final_payout_transferred_at = Some(now);
        }

        let (before, after) = payout_snapshot(&previous, &bulk);
        let mut entry = TrackingEntry::new(
            bulk.id,
            TrackingAction::FinalPayout,
            actor.group,
            actor.user_id,
            before,
            after,
        );
        if let Some(attachment) = &attachment {
            entry = entry.with_attachments(vec![attachment.clone()]);
        }

        tx.insert_tracking(&entry).await?;
        if percentage > 0.0 {
            tx.insert_transaction(&PaymentTransaction::payout(
                PaymentMilestone::FinalPayout,
                bulk.id,
                seller_id,
                amount,
                percentage,
                bank_reference,
                attachment,
                now,
            ))
            .await?;
        }
        guard_rows(tx.update_bulk_order(&bulk).await?, bulk.id)?;
        tx.commit().await?;

        record_transition(TrackingAction::FinalPayout);
        Ok(bulk)
    }

    /// Seller confirms receipt of the final payout, closing the flow.
    #[tracing::instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn confirm_final_payout(
        &self,
        bulk_order_id: BulkOrderId,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        self.transition(bulk_order_id, TrackingAction::ConfirmFinalPayment, actor, |_| Ok(()))
            .await
            .map_err(not_able_to_confirm)
    }

    /// Admin-only escape hatch: forces the order to a target status while
    /// still writing an audit row. Normal flows use the table-checked
    /// operations above.
    #[tracing::instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn override_tracking_status(
        &self,
        bulk_order_id: BulkOrderId,
        target: SellerTrackingStatus,
        actor: Actor,
    ) -> Result<BulkPurchaseOrder, TrackingError> {
        require_admin(actor, TrackingAction::OverrideStatus)?;

        let mut tx = self.store.begin().await?;
        let mut bulk = tx.bulk_order(bulk_order_id).await?;
        let (before, after) = status_snapshot(bulk.tracking_status, target);
        bulk.tracking_status = target;
        bulk.updated_at = Utc::now();

        let entry = TrackingEntry::new(
            bulk.id,
            TrackingAction::OverrideStatus,
            actor.group,
            actor.user_id,
            before,
            after,
        )
        .with_description("manual status override");

        tx.insert_tracking(&entry).await?;
        guard_rows(tx.update_bulk_order(&bulk).await?, bulk.id)?;
        tx.commit().await?;

        record_transition(TrackingAction::OverrideStatus);
        Ok(bulk)
    }

    /// Shared shape of the simple transitions: re-read under the row lock,
    /// check the table, apply the action-specific mutation, write one audit
    /// row plus the update.
    async fn transition<F>(
        &self,
        bulk_order_id: BulkOrderId,
        action: TrackingAction,
        actor: Actor,
        mutate: F,
    ) -> Result<BulkPurchaseOrder, TrackingError>
    where
        F: FnOnce(&mut BulkPurchaseOrder) -> Result<(), TrackingError>,
    {
        let mut tx = self.store.begin().await?;
        let mut bulk = tx.bulk_order(bulk_order_id).await?;
        let next = require_transition(&bulk, action)?;

        let previous_status = bulk.tracking_status;
        mutate(&mut bulk)?;
        bulk.tracking_status = next;
        bulk.updated_at = Utc::now();

        let (before, after) = status_snapshot(previous_status, next);
        let entry = TrackingEntry::new(bulk.id, action, actor.group, actor.user_id, before, after);

        tx.insert_tracking(&entry).await?;
        guard_rows(tx.update_bulk_order(&bulk).await?, bulk.id)?;
        tx.commit().await?;

        record_transition(action);
        Ok(bulk)
    }
}

async fn prepare_submission<T: StorageTx>(
    tx: &mut T,
    quotation_id: QuotationId,
    costs: QuotationCosts,
    tiers: Vec<QuantityTier>,
    remark: Option<String>,
) -> Result<(SellerQuotation, QuotationStatus), TrackingError> {
    let mut quotation = tx.quotation(quotation_id).await?;
    if quotation.status == QuotationStatus::Approved {
        return Err(TrackingError::QuotationAlreadyApproved(quotation_id));
    }
    let before_status = quotation.status;
    quotation.submit(costs, tiers, remark);
    Ok((quotation, before_status))
}

fn require_admin(actor: Actor, action: TrackingAction) -> Result<(), TrackingError> {
    if actor.group != UserGroup::Admin {
        return Err(TrackingError::Forbidden { action });
    }
    Ok(())
}

fn require_transition(
    bulk: &BulkPurchaseOrder,
    action: TrackingAction,
) -> Result<SellerTrackingStatus, TrackingError> {
    next_status(bulk.tracking_status, action).ok_or(TrackingError::InvalidTransition {
        action,
        status: bulk.tracking_status,
    })
}

fn not_able_to_confirm(err: TrackingError) -> TrackingError {
    match err {
        TrackingError::InvalidTransition { status, .. } => {
            TrackingError::NotAbleToConfirm { status }
        }
        other => other,
    }
}

fn guard_rows(rows: u64, id: BulkOrderId) -> Result<(), TrackingError> {
    if rows == 0 {
        return Err(StoreError::not_found("bulk purchase order", id).into());
    }
    Ok(())
}

fn guard_quotation_rows(rows: u64, id: QuotationId) -> Result<(), TrackingError> {
    if rows == 0 {
        return Err(StoreError::not_found("quotation", id).into());
    }
    Ok(())
}

fn record_transition(action: TrackingAction) {
    metrics::counter!("tracking_transitions_total", "action" => action.as_str()).increment(1);
}
