//! Payment backends. The set of methods is closed, so dispatch is a plain `match`.

pub mod hosted_checkout;
mod http;
pub mod redirect_link;

use crate::config::AppConfig;
use crate::domain::order::{Order, PaymentMethod};
use crate::domain::payment::{Initiation, InitiationRequest, PaymentStatus, VerificationEvidence};
use crate::error::{OrderError, Result};
pub use hosted_checkout::HostedCheckoutGateway;
pub use redirect_link::RedirectLinkGateway;

#[derive(Debug, Clone)]
pub enum PaymentBackend {
    /// Cash on delivery. Nothing to initiate online, nothing to reconcile.
    Settlement,
    HostedCheckout(HostedCheckoutGateway),
    RedirectLink(RedirectLinkGateway),
}

impl PaymentBackend {
    pub fn method(&self) -> PaymentMethod {
        match self {
            Self::Settlement => PaymentMethod::Settlement,
            Self::HostedCheckout(_) => PaymentMethod::HostedCheckout,
            Self::RedirectLink(_) => PaymentMethod::RedirectLink,
        }
    }

    pub async fn initiate(&self, request: InitiationRequest<'_>) -> Result<Initiation> {
        match self {
            Self::Settlement => Ok(Initiation::Settled),
            Self::HostedCheckout(gateway) => gateway.initiate(request).await,
            Self::RedirectLink(gateway) => gateway.initiate(request).await,
        }
    }

    /// Confirms a payment for `order` from the caller's evidence.
    pub async fn confirm(
        &self,
        evidence: &VerificationEvidence,
        order: &Order,
    ) -> Result<PaymentStatus> {
        match (self, evidence) {
            (Self::HostedCheckout(gateway), VerificationEvidence::HostedCheckout { success, buyer_id }) => {
                Ok(gateway.confirm(*success, buyer_id))
            }
            (Self::RedirectLink(gateway), VerificationEvidence::RedirectLink { transaction_ref }) => {
                gateway.confirm(transaction_ref, order).await
            }
            (Self::Settlement, _) => Err(OrderError::ValidationError(
                "Settlement payments are collected on delivery and cannot be verified".to_string(),
            )),
            (backend, evidence) => Err(OrderError::ValidationError(format!(
                "{} evidence cannot verify a {} payment",
                evidence_method(evidence),
                backend.method()
            ))),
        }
    }
}

pub fn evidence_method(evidence: &VerificationEvidence) -> PaymentMethod {
    match evidence {
        VerificationEvidence::HostedCheckout { .. } => PaymentMethod::HostedCheckout,
        VerificationEvidence::RedirectLink { .. } => PaymentMethod::RedirectLink,
    }
}

/// The backends available to the engine, at most one per payment method.
#[derive(Debug, Clone)]
pub struct PaymentBackends {
    hosted_checkout: Option<PaymentBackend>,
    redirect_link: Option<PaymentBackend>,
    settlement: PaymentBackend,
}

impl Default for PaymentBackends {
    /// Settlement only.
    fn default() -> Self {
        Self {
            hosted_checkout: None,
            redirect_link: None,
            settlement: PaymentBackend::Settlement,
        }
    }
}

impl PaymentBackends {
    /// Registers every backend whose credentials are present in `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut backends = Self::default();
        if let Some(hosted) = &config.hosted_checkout {
            backends = backends.with(PaymentBackend::HostedCheckout(HostedCheckoutGateway::new(
                hosted.clone(),
            )?));
        }
        if let Some(link) = &config.redirect_link {
            backends = backends.with(PaymentBackend::RedirectLink(RedirectLinkGateway::new(
                link.clone(),
            )?));
        }
        Ok(backends)
    }

    /// Registers `backend`, replacing any backend already registered for its method.
    pub fn with(mut self, backend: PaymentBackend) -> Self {
        match backend.method() {
            PaymentMethod::Settlement => self.settlement = backend,
            PaymentMethod::HostedCheckout => self.hosted_checkout = Some(backend),
            PaymentMethod::RedirectLink => self.redirect_link = Some(backend),
        }
        self
    }

    pub fn get(&self, method: PaymentMethod) -> Result<&PaymentBackend> {
        let backend = match method {
            PaymentMethod::Settlement => Some(&self.settlement),
            PaymentMethod::HostedCheckout => self.hosted_checkout.as_ref(),
            PaymentMethod::RedirectLink => self.redirect_link.as_ref(),
        };
        backend.ok_or_else(|| {
            OrderError::ValidationError(format!("Payment method {method} is not available"))
        })
    }

    pub fn is_registered(&self, method: PaymentMethod) -> bool {
        self.get(method).is_ok()
    }
}
