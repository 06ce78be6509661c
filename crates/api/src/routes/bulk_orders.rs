//! Bulk purchase order endpoints: quotations, payouts, production stages,
//! and the tracking history.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::PaymentGateway;
use common::{BulkOrderId, QuotationId, UserId};
use domain::{
    Attachment, BulkPurchaseOrder, Currency, InspectionProcedure, LogisticInfo, PpsReport,
    ProductionInfo, QcReport, QuantityTier, QuotationCosts, RawMaterial, SellerQuotation,
    SellerTrackingStatus, TrackingEntry, UserGroup,
};
use serde::Deserialize;
use store::Storage;
use tracking::{Actor, QuotationSubmission};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct ActorRequest {
    pub user_id: Uuid,
    pub user_group: UserGroup,
}

impl ActorRequest {
    fn actor(&self) -> Actor {
        Actor::new(UserId::from_uuid(self.user_id), self.user_group)
    }
}

#[derive(Deserialize)]
pub struct CreateBulkOrderRequest {
    pub buyer_id: Uuid,
    pub currency: Currency,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct CreateQuotationRequest {
    pub seller_id: Uuid,
    pub currency: Currency,
}

#[derive(Deserialize)]
pub struct SubmitQuotationRequest {
    pub actor: ActorRequest,
    pub costs: QuotationCosts,
    #[serde(default)]
    pub tiers: Vec<QuantityTier>,
    pub remark: Option<String>,
}

#[derive(Deserialize)]
pub struct QuotationBatchEntry {
    pub quotation_id: Uuid,
    pub costs: QuotationCosts,
    #[serde(default)]
    pub tiers: Vec<QuantityTier>,
    pub remark: Option<String>,
}

#[derive(Deserialize)]
pub struct SubmitQuotationBatchRequest {
    pub actor: ActorRequest,
    pub quotations: Vec<QuotationBatchEntry>,
}

#[derive(Deserialize)]
pub struct ActorOnlyRequest {
    pub actor: ActorRequest,
}

#[derive(Deserialize)]
pub struct RejectRequest {
    pub actor: ActorRequest,
    pub reason: String,
}

#[derive(Deserialize)]
pub struct FirstPayoutRequest {
    pub actor: ActorRequest,
    pub percentage: f64,
    pub bank_reference: Option<String>,
    pub attachment: Option<Attachment>,
}

#[derive(Deserialize)]
pub struct FinalPayoutRequest {
    pub actor: ActorRequest,
    pub bank_reference: Option<String>,
    pub attachment: Option<Attachment>,
}

#[derive(Deserialize)]
pub struct RawMaterialRequest {
    pub actor: ActorRequest,
    pub materials: Vec<RawMaterial>,
}

#[derive(Deserialize)]
pub struct PpsRequest {
    pub actor: ActorRequest,
    pub report: PpsReport,
}

#[derive(Deserialize)]
pub struct ProductionRequest {
    pub actor: ActorRequest,
    pub info: ProductionInfo,
}

#[derive(Deserialize)]
pub struct InspectionRequest {
    pub actor: ActorRequest,
    pub procedure: InspectionProcedure,
}

#[derive(Deserialize)]
pub struct QcReportsRequest {
    pub actor: ActorRequest,
    pub reports: Vec<QcReport>,
}

#[derive(Deserialize)]
pub struct DeliveringRequest {
    pub actor: ActorRequest,
    pub logistic: LogisticInfo,
}

#[derive(Deserialize)]
pub struct OverrideStatusRequest {
    pub actor: ActorRequest,
    pub target: SellerTrackingStatus,
}

// -- Handlers --

/// POST /bulk-orders — open a bulk purchase order waiting for quotations.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<CreateBulkOrderRequest>,
) -> Result<(StatusCode, Json<BulkPurchaseOrder>), ApiError> {
    let order = BulkPurchaseOrder::new(UserId::from_uuid(req.buyer_id), req.currency, req.quantity);
    state.store.insert_bulk_order(&order).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /bulk-orders/:id — load a bulk purchase order.
#[tracing::instrument(skip(state))]
pub async fn get<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state.store.bulk_order(BulkOrderId::from_uuid(id)).await?;
    Ok(Json(order))
}

/// GET /bulk-orders/:id/history — the audit trail, oldest first.
#[tracing::instrument(skip(state))]
pub async fn history<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TrackingEntry>>, ApiError> {
    let entries = state.tracking.history(BulkOrderId::from_uuid(id)).await?;
    Ok(Json(entries))
}

/// POST /bulk-orders/:id/quotations — open a quotation slot for a seller.
#[tracing::instrument(skip(state, req))]
pub async fn create_quotation<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateQuotationRequest>,
) -> Result<(StatusCode, Json<SellerQuotation>), ApiError> {
    let quotation = SellerQuotation::new(
        BulkOrderId::from_uuid(id),
        UserId::from_uuid(req.seller_id),
        req.currency,
    );
    state.store.insert_quotation(&quotation).await?;
    Ok((StatusCode::CREATED, Json(quotation)))
}

/// POST /quotations/:id/submit — seller submits costs and quantity tiers.
#[tracing::instrument(skip(state, req))]
pub async fn submit_quotation<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitQuotationRequest>,
) -> Result<Json<SellerQuotation>, ApiError> {
    let quotation = state
        .tracking
        .submit_quotation(
            QuotationId::from_uuid(id),
            req.costs,
            req.tiers,
            req.remark,
            req.actor.actor(),
        )
        .await?;
    Ok(Json(quotation))
}

/// POST /quotations/submit-batch — submit several quotations atomically.
#[tracing::instrument(skip(state, req))]
pub async fn submit_quotation_batch<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<SubmitQuotationBatchRequest>,
) -> Result<Json<Vec<SellerQuotation>>, ApiError> {
    let actor = req.actor.actor();
    let submissions = req
        .quotations
        .into_iter()
        .map(|q| QuotationSubmission {
            quotation_id: QuotationId::from_uuid(q.quotation_id),
            costs: q.costs,
            tiers: q.tiers,
            remark: q.remark,
        })
        .collect();
    let quotations = state
        .tracking
        .submit_multiple_quotations(submissions, actor)
        .await?;
    Ok(Json(quotations))
}

/// POST /quotations/:id/approve — pick the winning quotation.
#[tracing::instrument(skip(state, req))]
pub async fn approve_quotation<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActorOnlyRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .approve_quotation(QuotationId::from_uuid(id), req.actor.actor())
        .await?;
    Ok(Json(order))
}

/// POST /quotations/:id/reject — turn down a submitted quotation.
#[tracing::instrument(skip(state, req))]
pub async fn reject_quotation<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<SellerQuotation>, ApiError> {
    let quotation = state
        .tracking
        .reject_quotation(QuotationId::from_uuid(id), req.reason, req.actor.actor())
        .await?;
    Ok(Json(quotation))
}

/// POST /bulk-orders/:id/po/approve — seller accepts the purchase order.
#[tracing::instrument(skip(state, req))]
pub async fn approve_po<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActorOnlyRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .approve_po(BulkOrderId::from_uuid(id), req.actor.actor())
        .await?;
    Ok(Json(order))
}

/// POST /bulk-orders/:id/po/reject — seller declines the purchase order.
#[tracing::instrument(skip(state, req))]
pub async fn reject_po<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .reject_po(BulkOrderId::from_uuid(id), req.reason, req.actor.actor())
        .await?;
    Ok(Json(order))
}

/// POST /bulk-orders/:id/payouts/first — pay the seller's first share.
#[tracing::instrument(skip(state, req))]
pub async fn create_first_payout<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<FirstPayoutRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .create_first_payout(
            BulkOrderId::from_uuid(id),
            req.percentage,
            req.bank_reference,
            req.attachment,
            req.actor.actor(),
        )
        .await?;
    Ok(Json(order))
}

/// POST /bulk-orders/:id/payouts/first/confirm — seller confirms receipt.
#[tracing::instrument(skip(state, req))]
pub async fn confirm_first_payout<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActorOnlyRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .confirm_first_payout(BulkOrderId::from_uuid(id), req.actor.actor())
        .await?;
    Ok(Json(order))
}

/// POST /bulk-orders/:id/production/start — start after a skipped payout.
#[tracing::instrument(skip(state, req))]
pub async fn start_without_first_payment<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActorOnlyRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .start_without_first_payment(BulkOrderId::from_uuid(id), req.actor.actor())
        .await?;
    Ok(Json(order))
}

/// PUT /bulk-orders/:id/raw-materials — record the raw material plan.
#[tracing::instrument(skip(state, req))]
pub async fn update_raw_material<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<RawMaterialRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .update_raw_material(BulkOrderId::from_uuid(id), req.materials, req.actor.actor())
        .await?;
    Ok(Json(order))
}

/// PUT /bulk-orders/:id/pps — add or replace a pre-production sample report.
#[tracing::instrument(skip(state, req))]
pub async fn update_pps<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<PpsRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .update_pps(BulkOrderId::from_uuid(id), req.report, req.actor.actor())
        .await?;
    Ok(Json(order))
}

/// PUT /bulk-orders/:id/production — record a production progress update.
#[tracing::instrument(skip(state, req))]
pub async fn update_production<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProductionRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .update_production(BulkOrderId::from_uuid(id), req.info, req.actor.actor())
        .await?;
    Ok(Json(order))
}

/// PUT /bulk-orders/:id/inspection — record the inspection procedure.
#[tracing::instrument(skip(state, req))]
pub async fn mark_inspection<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<InspectionRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .mark_inspection(BulkOrderId::from_uuid(id), req.procedure, req.actor.actor())
        .await?;
    Ok(Json(order))
}

/// POST /bulk-orders/:id/qc-reports — file quality control reports.
#[tracing::instrument(skip(state, req))]
pub async fn create_qc_reports<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<QcReportsRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .create_qc_reports(BulkOrderId::from_uuid(id), req.reports, req.actor.actor())
        .await?;
    Ok(Json(order))
}

/// POST /bulk-orders/:id/delivering — record shipping details.
#[tracing::instrument(skip(state, req))]
pub async fn mark_delivering<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<DeliveringRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .mark_delivering(BulkOrderId::from_uuid(id), req.logistic, req.actor.actor())
        .await?;
    Ok(Json(order))
}

/// POST /bulk-orders/:id/delivered — buyer confirms arrival.
#[tracing::instrument(skip(state, req))]
pub async fn confirm_delivered<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActorOnlyRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .confirm_delivered(BulkOrderId::from_uuid(id), req.actor.actor())
        .await?;
    Ok(Json(order))
}

/// POST /bulk-orders/:id/payouts/final — pay the remaining balance.
#[tracing::instrument(skip(state, req))]
pub async fn create_final_payout<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<FinalPayoutRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .create_final_payout(
            BulkOrderId::from_uuid(id),
            req.bank_reference,
            req.attachment,
            req.actor.actor(),
        )
        .await?;
    Ok(Json(order))
}

/// POST /bulk-orders/:id/payouts/final/confirm — seller confirms receipt.
#[tracing::instrument(skip(state, req))]
pub async fn confirm_final_payout<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActorOnlyRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .confirm_final_payout(BulkOrderId::from_uuid(id), req.actor.actor())
        .await?;
    Ok(Json(order))
}

/// POST /bulk-orders/:id/status/override — admin forces a target status.
#[tracing::instrument(skip(state, req))]
pub async fn override_status<S: Storage, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<OverrideStatusRequest>,
) -> Result<Json<BulkPurchaseOrder>, ApiError> {
    let order = state
        .tracking
        .override_tracking_status(BulkOrderId::from_uuid(id), req.target, req.actor.actor())
        .await?;
    Ok(Json(order))
}
