//! Hosted checkout backend: the buyer pays on a page hosted by the provider and is sent
//! back to `{origin}/verify` with the outcome in the query string.

use super::http::{bearer, build_client, endpoint, read_json};
use crate::config::HostedCheckoutConfig;
use crate::domain::order::{Amount, BuyerId};
use crate::domain::payment::{Initiation, InitiationRequest, PaymentStatus, VerificationOutcome};
use crate::error::{OrderError, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

const DELIVERY_LINE_NAME: &str = "Delivery charges";

#[derive(Debug, Deserialize)]
struct CheckoutSession {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HostedCheckoutGateway {
    config: HostedCheckoutConfig,
    client: Client,
}

impl HostedCheckoutGateway {
    pub fn new(config: HostedCheckoutConfig) -> Result<Self> {
        let client = build_client(config.timeout)?;
        Ok(Self { config, client })
    }

    /// Creates a checkout session priced line by line, with the delivery surcharge as its own line.
    pub async fn initiate(&self, request: InitiationRequest<'_>) -> Result<Initiation> {
        let order_id = request.order_id().to_string();
        let form = self.session_form(request, &order_id)?;
        let url = endpoint(&self.config.api_base, &["v1", "checkout", "sessions"])?;

        debug!(order_id = %order_id, lines = request.order.line_items.len(), "Creating checkout session");
        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, bearer(&self.config.secret_key))
            .form(&form)
            .send()
            .await?;
        let session: CheckoutSession = read_json(response).await?;

        let url = session.url.filter(|u| !u.is_empty()).ok_or_else(|| {
            OrderError::BackendError(format!("Checkout session {} has no redirect URL", session.id))
        })?;
        info!(order_id = %order_id, session_id = %session.id, "Checkout session created");
        Ok(Initiation::Redirect {
            url,
            reference: Some(session.id),
        })
    }

    /// The redirect target asserts the outcome itself; there is nothing to look up.
    pub fn confirm(&self, success: bool, buyer_id: &BuyerId) -> PaymentStatus {
        PaymentStatus {
            outcome: if success {
                VerificationOutcome::Confirmed
            } else {
                VerificationOutcome::Denied
            },
            buyer_id: Some(buyer_id.clone()),
        }
    }

    fn session_form(
        &self,
        request: InitiationRequest<'_>,
        order_id: &str,
    ) -> Result<Vec<(String, String)>> {
        let currency = self.config.currency.to_lowercase();
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            (
                "success_url".to_string(),
                request
                    .context
                    .verify_url(&[("success", "true"), ("orderId", order_id)]),
            ),
            (
                "cancel_url".to_string(),
                request
                    .context
                    .verify_url(&[("success", "false"), ("orderId", order_id)]),
            ),
            ("client_reference_id".to_string(), order_id.to_string()),
        ];

        let mut lines: Vec<(&str, i64, u32)> = Vec::with_capacity(request.order.line_items.len() + 1);
        for item in &request.order.line_items {
            lines.push((item.name.as_str(), item.unit_price.minor_units()?, item.quantity));
        }
        if let Ok(fee) = Amount::new(self.config.delivery_fee) {
            lines.push((DELIVERY_LINE_NAME, fee.minor_units()?, 1));
        }

        for (i, (name, unit_amount, quantity)) in lines.into_iter().enumerate() {
            let key = |field: &str| format!("line_items[{i}]{field}");
            form.push((key("[price_data][currency]"), currency.clone()));
            form.push((key("[price_data][product_data][name]"), name.to_string()));
            form.push((key("[price_data][unit_amount]"), unit_amount.to_string()));
            form.push((key("[quantity]"), quantity.to_string()));
        }
        Ok(form)
    }
}
