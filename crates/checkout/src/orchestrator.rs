//! The checkout orchestrator: settles a set of carts in one atomic unit.

use std::collections::HashMap;

use chrono::Utc;
use common::{CheckoutSessionId, OrderId, TransactionRef, UserId};
use domain::{Attachment, Money, Order, OrderItem, PaymentTransaction, PaymentType};
use store::{Storage, StorageTx, StoreError};

use crate::error::CheckoutError;
use crate::gateway::{AuthorizationRequest, AuthorizationStatus, PaymentGateway};

/// A checkout request covering one or more carts of the same buyer.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: UserId,
    pub order_ids: Vec<OrderId>,
    pub payment_type: PaymentType,
    /// Card checkouts: gateway token for the chosen payment method.
    pub method_token: Option<String>,
    /// Card checkouts: where the step-up challenge should send the customer.
    pub return_url: Option<String>,
    /// Bank transfers: wire reference quoted by the buyer.
    pub bank_reference: Option<String>,
    /// Bank transfers: uploaded transfer receipt.
    pub bank_attachment: Option<Attachment>,
}

/// Completes a card checkout whose authorization required a step-up
/// challenge. Confirms the existing authorization rather than creating a
/// new one, so the gateway is never charged twice for the same checkout.
#[derive(Debug, Clone)]
pub struct ConfirmCheckoutRequest {
    pub user_id: UserId,
    pub order_ids: Vec<OrderId>,
    pub authorization_id: String,
    pub return_url: Option<String>,
}

/// The settled state returned by [`CheckoutOrchestrator::checkout_info`].
#[derive(Debug, Clone)]
pub struct CheckoutInfo {
    pub transaction: PaymentTransaction,
    pub orders: Vec<Order>,
}

/// Result of a checkout attempt.
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    /// The checkout settled (or, for bank transfers, was recorded and now
    /// waits for manual confirmation).
    Completed {
        session_id: CheckoutSessionId,
        transaction: PaymentTransaction,
        orders: Vec<Order>,
    },
    /// The gateway demands a step-up challenge. Nothing was written locally;
    /// the client completes the challenge and retries the checkout.
    ActionRequired {
        authorization_id: String,
        next_action: serde_json::Value,
        client_secret: Option<String>,
    },
}

/// Orchestrates checkout across storage and the payment gateway.
pub struct CheckoutOrchestrator<S: Storage, G: PaymentGateway> {
    store: S,
    gateway: G,
}

impl<S: Storage, G: PaymentGateway> CheckoutOrchestrator<S, G> {
    /// Creates a new orchestrator.
    pub fn new(store: S, gateway: G) -> Self {
        Self { store, gateway }
    }

    /// Settles a set of carts with one payment.
    ///
    /// All validation happens before any transaction is opened, and for card
    /// checkouts before the gateway is called. A single transaction then
    /// re-reads each order under its row lock, re-validates it, stamps it,
    /// and appends exactly one ledger row.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id, payment_type = %request.payment_type))]
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutOutcome, CheckoutError> {
        let (orders, total) = self.load_validated(&request.order_ids).await?;

        let outcome = match request.payment_type {
            PaymentType::BankTransfer => self.bank_transfer(orders, &request).await,
            PaymentType::Card => self.card(orders, &request, total).await,
        }?;

        if matches!(outcome, CheckoutOutcome::Completed { .. }) {
            metrics::counter!(
                "checkout_completed_total",
                "payment_type" => request.payment_type.as_str()
            )
            .increment(1);
        }
        Ok(outcome)
    }

    /// Resumes a card checkout after the customer completed the step-up
    /// challenge: confirms the pending authorization and, on success, settles
    /// the same orders. No new authorization is created.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id, authorization_id = %request.authorization_id))]
    pub async fn confirm_checkout(
        &self,
        request: ConfirmCheckoutRequest,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let (orders, total) = self.load_validated(&request.order_ids).await?;

        let return_url = request.return_url.as_deref().unwrap_or_default();
        let authorization = self
            .gateway
            .confirm_authorization(&request.authorization_id, return_url)
            .await?;

        match authorization.status {
            AuthorizationStatus::Succeeded => {
                let outcome = self
                    .settle_card(orders, request.user_id, total, authorization.id)
                    .await?;
                metrics::counter!(
                    "checkout_completed_total",
                    "payment_type" => PaymentType::Card.as_str()
                )
                .increment(1);
                Ok(outcome)
            }
            AuthorizationStatus::RequiresAction => Ok(CheckoutOutcome::ActionRequired {
                authorization_id: authorization.id,
                next_action: authorization.next_action.unwrap_or(serde_json::Value::Null),
                client_secret: authorization.client_secret,
            }),
            AuthorizationStatus::Declined => Err(CheckoutError::Declined(format!(
                "authorization {} was not accepted",
                authorization.id
            ))),
        }
    }

    /// Loads the referenced carts and runs every checkout validation before
    /// any transaction or gateway call.
    async fn load_validated(
        &self,
        order_ids: &[OrderId],
    ) -> Result<(Vec<Order>, Money), CheckoutError> {
        if order_ids.is_empty() {
            return Err(CheckoutError::EmptyCheckout);
        }

        let orders = self.store.orders(order_ids).await?;
        for id in order_ids {
            if !orders.iter().any(|o| o.id == *id) {
                return Err(CheckoutError::CartNotFound(*id));
            }
        }
        for order in &orders {
            order
                .validate_for_checkout()
                .map_err(|e| CheckoutError::InvalidToCheckout(order.id, e.to_string()))?;
        }
        let currency = orders[0].currency;
        for order in &orders {
            if order.currency != currency {
                return Err(CheckoutError::CurrencyMismatch(currency, order.currency));
            }
        }
        let total = orders
            .iter()
            .fold(Money::zero(currency), |acc, o| acc.add(o.total));
        Ok((orders, total))
    }

    /// Returns the ledger row and orders recorded under a checkout session.
    #[tracing::instrument(skip(self))]
    pub async fn checkout_info(
        &self,
        session: &CheckoutSessionId,
    ) -> Result<CheckoutInfo, CheckoutError> {
        let transaction = self.store.transaction_by_session(session).await?;
        let orders = self.store.orders_by_session(session).await?;
        Ok(CheckoutInfo {
            transaction,
            orders,
        })
    }

    /// Replaces a cart's items wholesale. An empty item list deletes the
    /// cart; `None` is returned in that case.
    #[tracing::instrument(skip(self, items))]
    pub async fn update_cart_items(
        &self,
        order_id: OrderId,
        items: Vec<OrderItem>,
    ) -> Result<Option<Order>, CheckoutError> {
        let mut order = self.store.order(order_id).await?;
        if !order.is_cart {
            return Err(CheckoutError::NotACart(order_id));
        }

        if !order.replace_items(items) {
            self.store.delete_order(order_id).await?;
            return Ok(None);
        }

        if self.store.update_order(&order).await? == 0 {
            return Err(StoreError::not_found("order", order_id).into());
        }
        Ok(Some(order))
    }

    async fn bank_transfer(
        &self,
        orders: Vec<Order>,
        request: &CheckoutRequest,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let session_id = CheckoutSessionId::generate();
        let transaction_ref = TransactionRef::generate();
        let now = Utc::now();
        let currency = orders[0].currency;

        // Re-read under the row locks so a concurrent checkout of the same
        // carts fails its precondition instead of committing twice.
        let mut tx = self.store.begin().await?;
        let mut total = Money::zero(currency);
        let mut settled = Vec::with_capacity(orders.len());
        for order in &orders {
            let mut order = tx.order(order.id).await?;
            order
                .validate_for_checkout()
                .map_err(|e| CheckoutError::InvalidToCheckout(order.id, e.to_string()))?;
            total = total.add(order.total);
            order.mark_waiting_confirm(
                session_id.clone(),
                transaction_ref.clone(),
                request.bank_reference.clone(),
                request.bank_attachment.clone(),
                now,
            );
            if tx.update_order(&order).await? == 0 {
                return Err(StoreError::not_found("order", order.id).into());
            }
            settled.push(order);
        }
        let orders = settled;

        let transaction = PaymentTransaction::bank_checkout(
            transaction_ref,
            session_id.clone(),
            orders.iter().map(|o| o.id).collect(),
            request.user_id,
            total,
            request.bank_reference.clone(),
            request.bank_attachment.clone(),
            now,
        );
        tx.insert_transaction(&transaction).await?;
        tx.commit().await?;

        tracing::info!(%session_id, total = %total, orders = orders.len(), "bank transfer checkout recorded");
        Ok(CheckoutOutcome::Completed {
            session_id,
            transaction,
            orders,
        })
    }

    async fn card(
        &self,
        orders: Vec<Order>,
        request: &CheckoutRequest,
        total: Money,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let method_token = request.method_token.clone().ok_or_else(|| {
            CheckoutError::InvalidToCheckout(
                request.order_ids[0],
                "card checkout requires a payment method token".to_string(),
            )
        })?;

        let mut metadata = HashMap::new();
        metadata.insert(
            "order_ids".to_string(),
            request
                .order_ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
        );

        let mut authorization = self
            .gateway
            .create_authorization(AuthorizationRequest {
                amount: total.amount(),
                currency: total.currency(),
                method_token,
                customer_id: request.user_id,
                metadata,
            })
            .await?;

        if authorization.status == AuthorizationStatus::RequiresAction {
            let return_url = request.return_url.as_deref().unwrap_or_default();
            authorization = self
                .gateway
                .confirm_authorization(&authorization.id, return_url)
                .await?;

            if authorization.status == AuthorizationStatus::RequiresAction {
                // Challenge still pending: hand it to the client untouched.
                return Ok(CheckoutOutcome::ActionRequired {
                    authorization_id: authorization.id,
                    next_action: authorization
                        .next_action
                        .unwrap_or(serde_json::Value::Null),
                    client_secret: authorization.client_secret,
                });
            }
        }

        if authorization.status != AuthorizationStatus::Succeeded {
            return Err(CheckoutError::Declined(format!(
                "authorization {} was not accepted",
                authorization.id
            )));
        }

        self.settle_card(orders, request.user_id, total, authorization.id)
            .await
    }

    async fn settle_card(
        &self,
        orders: Vec<Order>,
        user_id: UserId,
        total: Money,
        authorization_id: String,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let session_id = CheckoutSessionId::generate();
        let transaction_ref = TransactionRef::generate();
        let now = Utc::now();

        // Re-read under the row locks: an order paid by a concurrent
        // checkout fails validation here, and the whole settle rolls back.
        let mut tx = self.store.begin().await?;
        let mut settled = Vec::with_capacity(orders.len());
        for order in &orders {
            let mut order = tx.order(order.id).await?;
            order
                .validate_for_checkout()
                .map_err(|e| CheckoutError::InvalidToCheckout(order.id, e.to_string()))?;
            order.mark_paid(
                session_id.clone(),
                transaction_ref.clone(),
                authorization_id.clone(),
                now,
            );
            if tx.update_order(&order).await? == 0 {
                return Err(StoreError::not_found("order", order.id).into());
            }
            if let Some(inquiry_id) = order.inquiry_id {
                tx.finish_inquiry(inquiry_id).await?;
            }
            settled.push(order);
        }
        let orders = settled;

        let transaction = PaymentTransaction::card_checkout(
            transaction_ref,
            session_id.clone(),
            orders.iter().map(|o| o.id).collect(),
            user_id,
            total,
            authorization_id,
            now,
        );
        tx.insert_transaction(&transaction).await?;
        tx.commit().await?;

        tracing::info!(%session_id, total = %total, orders = orders.len(), "card checkout settled");
        Ok(CheckoutOutcome::Completed {
            session_id,
            transaction,
            orders,
        })
    }
}
