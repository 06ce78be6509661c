//! Payment gateway seam and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::UserId;
use domain::Currency;

use crate::error::CheckoutError;

/// A charge request handed to the gateway. The amount is already in the
/// currency's smallest unit.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub amount: i64,
    pub currency: Currency,
    pub method_token: String,
    pub customer_id: UserId,
    pub metadata: HashMap<String, String>,
}

/// Gateway-side state of an authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    Succeeded,
    /// The customer must complete a step-up challenge.
    RequiresAction,
    Declined,
}

/// The gateway's view of an authorization attempt.
#[derive(Debug, Clone)]
pub struct Authorization {
    pub id: String,
    pub status: AuthorizationStatus,
    /// Challenge payload to relay to the client, when step-up is required.
    pub next_action: Option<serde_json::Value>,
    /// Client secret the frontend needs to run the challenge.
    pub client_secret: Option<String>,
}

/// Trait for the external payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a card authorization for the given amount.
    async fn create_authorization(
        &self,
        request: AuthorizationRequest,
    ) -> Result<Authorization, CheckoutError>;

    /// Confirms a pending authorization after a step-up challenge.
    async fn confirm_authorization(
        &self,
        authorization_id: &str,
        return_url: &str,
    ) -> Result<Authorization, CheckoutError>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    authorizations: HashMap<String, AuthorizationRequest>,
    next_id: u32,
    decline: bool,
    require_action: bool,
    confirm_succeeds: bool,
    confirm_calls: u32,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway that approves everything.
    pub fn new() -> Self {
        let gateway = Self::default();
        gateway.state.write().unwrap().confirm_succeeds = true;
        gateway
    }

    /// Configures the gateway to decline authorizations.
    pub fn set_decline(&self, decline: bool) {
        self.state.write().unwrap().decline = decline;
    }

    /// Configures the gateway to demand a step-up challenge. When
    /// `confirm_succeeds` is false, confirmation stays pending as well.
    pub fn set_require_action(&self, require_action: bool, confirm_succeeds: bool) {
        let mut state = self.state.write().unwrap();
        state.require_action = require_action;
        state.confirm_succeeds = confirm_succeeds;
    }

    /// Returns the number of authorizations created.
    pub fn authorization_count(&self) -> usize {
        self.state.read().unwrap().authorizations.len()
    }

    /// Returns the number of confirm calls seen.
    pub fn confirm_calls(&self) -> u32 {
        self.state.read().unwrap().confirm_calls
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_authorization(
        &self,
        request: AuthorizationRequest,
    ) -> Result<Authorization, CheckoutError> {
        let mut state = self.state.write().unwrap();

        if state.decline {
            return Ok(Authorization {
                id: String::new(),
                status: AuthorizationStatus::Declined,
                next_action: None,
                client_secret: None,
            });
        }

        state.next_id += 1;
        let id = format!("auth-{:04}", state.next_id);
        let secret = format!("secret-{:04}", state.next_id);
        state.authorizations.insert(id.clone(), request);

        if state.require_action {
            Ok(Authorization {
                id,
                status: AuthorizationStatus::RequiresAction,
                next_action: Some(serde_json::json!({ "type": "redirect_to_url" })),
                client_secret: Some(secret),
            })
        } else {
            Ok(Authorization {
                id,
                status: AuthorizationStatus::Succeeded,
                next_action: None,
                client_secret: Some(secret),
            })
        }
    }

    async fn confirm_authorization(
        &self,
        authorization_id: &str,
        _return_url: &str,
    ) -> Result<Authorization, CheckoutError> {
        let mut state = self.state.write().unwrap();
        state.confirm_calls += 1;

        if !state.authorizations.contains_key(authorization_id) {
            return Err(CheckoutError::Gateway(format!(
                "unknown authorization: {authorization_id}"
            )));
        }

        if state.confirm_succeeds {
            Ok(Authorization {
                id: authorization_id.to_string(),
                status: AuthorizationStatus::Succeeded,
                next_action: None,
                client_secret: None,
            })
        } else {
            Ok(Authorization {
                id: authorization_id.to_string(),
                status: AuthorizationStatus::RequiresAction,
                next_action: Some(serde_json::json!({ "type": "redirect_to_url" })),
                client_secret: Some(format!("{authorization_id}-secret")),
            })
        }
    }
}
