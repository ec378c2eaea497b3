use super::order::{BuyerId, OrderId};
use crate::error::{OrderError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Method-specific data the caller hands to a payment backend at initiation time.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayContext {
    origin: Url,
}

impl GatewayContext {
    /// `origin` is the caller's own base URL; callback URLs are built on top of it.
    pub fn new(origin: &str) -> Result<Self> {
        let origin = Url::parse(origin.trim())
            .map_err(|e| OrderError::ValidationError(format!("Invalid origin '{origin}': {e}")))?;
        if origin.cannot_be_a_base() {
            return Err(OrderError::ValidationError(format!(
                "Origin cannot be used as a base URL: {origin}"
            )));
        }
        Ok(Self { origin })
    }

    pub fn origin(&self) -> &str {
        self.origin.as_str().trim_end_matches('/')
    }

    /// `{origin}/verify?...` with the given query pairs.
    pub fn verify_url(&self, query: &[(&str, &str)]) -> String {
        let mut url = self.origin.clone();
        let path = format!("{}/verify", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url.query_pairs_mut().clear().extend_pairs(query);
        url.to_string()
    }
}

/// What a payment backend produced when asked to start a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Initiation {
    /// Nothing to do online; the order is placed as-is.
    Settled,
    /// The buyer must be sent to `url` to pay.
    Redirect {
        url: String,
        reference: Option<String>,
    },
}

impl Initiation {
    pub fn payment_url(&self) -> Option<&str> {
        match self {
            Self::Settled => None,
            Self::Redirect { url, .. } => Some(url),
        }
    }
}

/// Proof of payment handed to `Verify`; its variant names the payment method being verified.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationEvidence {
    /// The redirect target asserts the outcome directly.
    HostedCheckout { success: bool, buyer_id: BuyerId },
    /// A transaction reference that must be looked up with the backend.
    RedirectLink { transaction_ref: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationOutcome {
    Confirmed,
    Denied,
}

impl VerificationOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// Result of asking a backend to confirm a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentStatus {
    pub outcome: VerificationOutcome,
    /// Buyer whose cart should be cleared, when the evidence identifies one.
    pub buyer_id: Option<BuyerId>,
}

/// Input a backend needs to start a payment for a persisted order.
#[derive(Debug, Clone, Copy)]
pub struct InitiationRequest<'a> {
    pub order: &'a super::order::Order,
    pub context: &'a GatewayContext,
}

impl InitiationRequest<'_> {
    pub fn order_id(&self) -> OrderId {
        self.order.id
    }
}
