//! Redirect link backend: the provider issues a payment link, and a payment is only
//! trusted after a live status lookup by transaction reference.

use super::http::{bearer, build_client, endpoint, read_json};
use crate::config::RedirectLinkConfig;
use crate::domain::order::{BuyerId, Order, OrderId};
use crate::domain::payment::{Initiation, InitiationRequest, PaymentStatus, VerificationOutcome};
use crate::error::{OrderError, Result};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

/// The only backend status that counts as money received.
pub const SUCCESSFUL_STATUS: &str = "successful";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct PaymentLink {
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionStatus {
    status: Option<String>,
    tx_ref: Option<String>,
    amount: Option<Decimal>,
    currency: Option<String>,
    #[serde(default)]
    meta: Option<TransactionMeta>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionMeta {
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct Customer<'a> {
    email: &'a str,
    name: String,
}

/// Maps the backend's status vocabulary onto a verification outcome.
pub fn map_status(status: &str) -> VerificationOutcome {
    if status == SUCCESSFUL_STATUS {
        VerificationOutcome::Confirmed
    } else {
        VerificationOutcome::Denied
    }
}

#[derive(Debug, Clone)]
pub struct RedirectLinkGateway {
    config: RedirectLinkConfig,
    client: Client,
}

impl RedirectLinkGateway {
    pub fn new(config: RedirectLinkConfig) -> Result<Self> {
        let client = build_client(config.timeout)?;
        Ok(Self { config, client })
    }

    /// Asks the backend for a payment link that redirects to `{origin}/verify?orderId=...`.
    pub async fn initiate(&self, request: InitiationRequest<'_>) -> Result<Initiation> {
        let order = request.order;
        let order_id = order.id.to_string();
        let tx_ref = self.tx_ref(&order.id);
        let body = json!({
            "tx_ref": tx_ref,
            "amount": order.total_amount,
            "currency": self.config.currency,
            "redirect_url": request.context.verify_url(&[("orderId", order_id.as_str())]),
            "payment_options": "card",
            "customer": Customer {
                email: &order.delivery_address.email,
                name: order.delivery_address.full_name(),
            },
            "customizations": {
                "title": self.config.title,
                "description": self.config.description,
            },
            "meta": { "userId": order.buyer_id },
        });

        let url = endpoint(&self.config.api_base, &["v3", "payments"])?;
        debug!(order_id = %order_id, tx_ref = %tx_ref, "Requesting payment link");
        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, bearer(&self.config.secret_key))
            .json(&body)
            .send()
            .await?;
        let envelope: Envelope<PaymentLink> = read_json(response).await?;

        let link = envelope
            .data
            .and_then(|d| d.link)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| OrderError::BackendError("Payment link missing from response".to_string()))?;
        info!(order_id = %order_id, tx_ref = %tx_ref, "Payment link issued");
        Ok(Initiation::Redirect {
            url: link,
            reference: Some(tx_ref),
        })
    }

    /// Our reference for an order's payment, sent at initiation and checked on lookup.
    fn tx_ref(&self, order_id: &OrderId) -> String {
        format!("{}_{}", self.config.tx_ref_prefix, order_id)
    }

    /// Looks up the transaction's live status. Anything but `successful` is a denial.
    ///
    /// The transaction must carry `order`'s reference, and a successful one must also
    /// have been charged the order's total in the configured currency.
    pub async fn confirm(&self, transaction_ref: &str, order: &Order) -> Result<PaymentStatus> {
        let reference = transaction_ref.trim();
        if reference.is_empty() {
            return Err(OrderError::ValidationError(
                "Transaction reference must not be empty".to_string(),
            ));
        }

        let url = endpoint(
            &self.config.api_base,
            &["v3", "transactions", reference, "verify"],
        )?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, bearer(&self.config.secret_key))
            .send()
            .await?;
        let envelope: Envelope<TransactionStatus> = read_json(response).await?;
        let data = envelope.data.ok_or_else(|| {
            OrderError::BackendError("Transaction status missing from response".to_string())
        })?;

        let expected_ref = self.tx_ref(&order.id);
        if data.tx_ref.as_deref() != Some(expected_ref.as_str()) {
            warn!(transaction_ref = %reference, tx_ref = ?data.tx_ref, "Transaction belongs to another order");
            return Err(OrderError::ValidationError(format!(
                "Transaction {reference} does not belong to order {}",
                order.id
            )));
        }

        let status = data.status.unwrap_or_default();
        let outcome = map_status(&status);
        if outcome.is_confirmed() {
            if data.amount != Some(order.total_amount) {
                return Err(OrderError::ValidationError(format!(
                    "Transaction {reference} charged {} instead of {}",
                    data.amount.map(|a| a.to_string()).unwrap_or_else(|| "nothing".to_string()),
                    order.total_amount
                )));
            }
            let currency_matches = data
                .currency
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(&self.config.currency));
            if !currency_matches {
                return Err(OrderError::ValidationError(format!(
                    "Transaction {reference} was not charged in {}",
                    self.config.currency
                )));
            }
        }
        let buyer_id = data
            .meta
            .unwrap_or_default()
            .user_id
            .and_then(|id| BuyerId::new(id).ok());
        if outcome.is_confirmed() && buyer_id.is_none() {
            warn!(transaction_ref = %reference, "Confirmed transaction carries no buyer id");
        }
        debug!(transaction_ref = %reference, status = %status, ?outcome, "Transaction status looked up");
        Ok(PaymentStatus { outcome, buyer_id })
    }
}
