//! The operations exposed to callers, identified by purpose.
//!
//! Every operation answers with an [`ApiResponse`]: a success flag, a human-readable
//! message on failure, and the payload on success. Errors never escape as `Err`.

use crate::application::engine::{PlaceOrderRequest, ReconciliationEngine};
use crate::domain::order::{BuyerId, DeliveryAddress, LineItem, Order, OrderId, PaymentMethod};
use crate::domain::payment::{GatewayContext, VerificationEvidence, VerificationOutcome};
use crate::error::{OrderError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

/// Who is calling, as established by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Buyer(BuyerId),
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => {
                match &e {
                    OrderError::StoreError(_) | OrderError::IoError(_) => {
                        error!(error = %e, "Request failed")
                    }
                    _ => warn!(error = %e, "Request rejected"),
                }
                Self::failure(e.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderInput {
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub address: DeliveryAddress,
    pub method: PaymentMethod,
    #[serde(default)]
    pub origin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderOutput {
    pub order_id: OrderId,
    pub total_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerifyOutput {
    pub outcome: VerificationOutcome,
}

/// Facade over the engine that applies the caller's identity to each operation.
#[derive(Clone)]
pub struct OrderApi {
    engine: Arc<ReconciliationEngine>,
}

impl OrderApi {
    pub fn new(engine: Arc<ReconciliationEngine>) -> Self {
        Self { engine }
    }

    pub async fn place_order(
        &self,
        identity: &Identity,
        input: PlaceOrderInput,
    ) -> ApiResponse<PlaceOrderOutput> {
        ApiResponse::from_result(self.try_place_order(identity, input).await)
    }

    async fn try_place_order(
        &self,
        identity: &Identity,
        input: PlaceOrderInput,
    ) -> Result<PlaceOrderOutput> {
        let buyer_id = require_buyer(identity)?;
        let context = input.origin.as_deref().map(GatewayContext::new).transpose()?;
        let placed = self
            .engine
            .place_order(PlaceOrderRequest {
                buyer_id: buyer_id.clone(),
                line_items: input.items,
                delivery_address: input.address,
                payment_method: input.method,
                expected_total: input.amount,
                context,
            })
            .await?;
        Ok(PlaceOrderOutput {
            order_id: placed.order.id,
            total_amount: placed.order.total_amount,
            payment_url: placed.initiation.payment_url().map(str::to_string),
        })
    }

    /// Starts payment again for one of the caller's unpaid orders.
    pub async fn retry_payment(
        &self,
        identity: &Identity,
        order_id: &str,
        origin: &str,
    ) -> ApiResponse<RetryOutput> {
        let result = async {
            let buyer_id = require_buyer(identity)?;
            let order_id: OrderId = order_id.parse()?;
            let context = GatewayContext::new(origin)?;
            let initiation = self
                .engine
                .retry_initiation(&order_id, buyer_id, &context)
                .await?;
            Ok::<_, OrderError>(RetryOutput {
                payment_url: initiation.payment_url().map(str::to_string),
            })
        }
        .await;
        ApiResponse::from_result(result)
    }

    /// Verification after a hosted checkout redirect. The flag comes from the redirect target.
    pub async fn verify_hosted(
        &self,
        identity: &Identity,
        order_id: &str,
        success: bool,
    ) -> ApiResponse<VerifyOutput> {
        let result = async {
            let buyer_id = require_buyer(identity)?.clone();
            let order_id: OrderId = order_id.parse()?;
            self.engine
                .verify(
                    &order_id,
                    VerificationEvidence::HostedCheckout { success, buyer_id },
                )
                .await
        }
        .await;
        verify_response(result)
    }

    /// Verification of a redirect link payment by transaction reference.
    pub async fn verify_link(
        &self,
        identity: &Identity,
        transaction_ref: &str,
        order_id: &str,
    ) -> ApiResponse<VerifyOutput> {
        let result = async {
            require_buyer(identity)?;
            let order_id: OrderId = order_id.parse()?;
            self.engine
                .verify(
                    &order_id,
                    VerificationEvidence::RedirectLink {
                        transaction_ref: transaction_ref.to_string(),
                    },
                )
                .await
        }
        .await;
        verify_response(result)
    }

    pub async fn list_all_orders(&self, identity: &Identity) -> ApiResponse<Vec<Order>> {
        if let Err(e) = require_admin(identity) {
            return ApiResponse::failure(e.to_string());
        }
        ApiResponse::from_result(self.engine.all_orders().await)
    }

    pub async fn list_my_orders(&self, identity: &Identity) -> ApiResponse<Vec<Order>> {
        match require_buyer(identity) {
            Ok(buyer_id) => ApiResponse::from_result(self.engine.orders_for_buyer(buyer_id).await),
            Err(e) => ApiResponse::failure(e.to_string()),
        }
    }

    pub async fn update_status(
        &self,
        identity: &Identity,
        order_id: &str,
        status: &str,
    ) -> ApiResponse<Order> {
        let result = async {
            require_admin(identity)?;
            let order_id: OrderId = order_id.parse()?;
            self.engine.update_status(&order_id, status).await
        }
        .await;
        let mut response = ApiResponse::from_result(result);
        if response.success {
            response.message = Some("Status updated".to_string());
        }
        response
    }
}

/// A denial is a well-formed answer, but it is reported as `success: false` with a reason.
fn verify_response(result: Result<VerificationOutcome>) -> ApiResponse<VerifyOutput> {
    match result {
        Ok(VerificationOutcome::Confirmed) => ApiResponse::ok(VerifyOutput {
            outcome: VerificationOutcome::Confirmed,
        }),
        Ok(VerificationOutcome::Denied) => ApiResponse {
            success: false,
            message: Some("Payment not successful".to_string()),
            data: Some(VerifyOutput {
                outcome: VerificationOutcome::Denied,
            }),
        },
        Err(e) => ApiResponse::from_result(Err(e)),
    }
}

fn require_buyer(identity: &Identity) -> Result<&BuyerId> {
    match identity {
        Identity::Buyer(id) => Ok(id),
        Identity::Admin => Err(OrderError::ValidationError(
            "This operation needs a signed-in buyer".to_string(),
        )),
    }
}

fn require_admin(identity: &Identity) -> Result<()> {
    match identity {
        Identity::Admin => Ok(()),
        Identity::Buyer(_) => Err(OrderError::ValidationError("Not authorized".to_string())),
    }
}
