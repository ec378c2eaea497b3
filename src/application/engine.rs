use super::locks::OrderLocks;
use crate::domain::cart::Cart;
use crate::domain::order::{
    BuyerId, DeliveryAddress, LineItem, Order, OrderId, OrderUpdate, PaymentMethod,
};
use crate::domain::payment::{
    GatewayContext, Initiation, InitiationRequest, VerificationEvidence, VerificationOutcome,
};
use crate::domain::ports::{CartStore, CartStoreBox, OrderStoreBox};
use crate::error::{OrderError, Result};
use crate::infrastructure::gateways::{PaymentBackend, PaymentBackends, evidence_method};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

/// Everything needed to place an order.
#[derive(Debug, Clone)]
pub struct PlaceOrderRequest {
    pub buyer_id: BuyerId,
    pub line_items: Vec<LineItem>,
    pub delivery_address: DeliveryAddress,
    pub payment_method: PaymentMethod,
    /// Total the caller computed, if any. Must match the engine's own total.
    pub expected_total: Option<Decimal>,
    /// Required for every method except settlement.
    pub context: Option<GatewayContext>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub order: Order,
    pub initiation: Initiation,
}

/// Owns the order lifecycle and collapses payment outcomes into `payment_confirmed`.
///
/// Orders are written before any payment backend is contacted, so a failed or timed-out
/// initiation leaves the order awaiting payment rather than losing it. Verification of a
/// single order is serialized through a per-order lock; different orders never contend.
pub struct ReconciliationEngine {
    orders: OrderStoreBox,
    carts: CartStoreBox,
    backends: PaymentBackends,
    locks: OrderLocks,
    delivery_fee: Decimal,
}

impl ReconciliationEngine {
    /// Creates a new `ReconciliationEngine`.
    ///
    /// # Arguments
    ///
    /// * `orders` - The store for orders.
    /// * `carts` - The store for buyer carts.
    /// * `backends` - The registered payment backends.
    /// * `delivery_fee` - Flat surcharge added to every order total.
    pub fn new(
        orders: OrderStoreBox,
        carts: CartStoreBox,
        backends: PaymentBackends,
        delivery_fee: Decimal,
    ) -> Self {
        Self {
            orders,
            carts,
            backends,
            locks: OrderLocks::new(),
            delivery_fee,
        }
    }

    pub fn carts(&self) -> &dyn CartStore {
        self.carts.as_ref()
    }

    /// Persists a new unconfirmed order, then starts payment with the chosen backend.
    ///
    /// Settlement orders are accepted as placed and the buyer's cart is cleared right away.
    /// Other methods return a payment URL and leave the cart alone until payment is verified.
    /// If the backend fails, the order stays stored and `InitiationFailed` is returned.
    #[instrument(skip(self, request), fields(buyer_id = %request.buyer_id, method = %request.payment_method))]
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<PlacedOrder> {
        let backend = self.backends.get(request.payment_method)?;
        if request.payment_method != PaymentMethod::Settlement && request.context.is_none() {
            return Err(missing_origin());
        }

        let order = Order::new(
            request.buyer_id,
            request.line_items,
            request.delivery_address,
            request.payment_method,
            self.delivery_fee,
        )?;
        if let Some(expected) = request.expected_total
            && expected != order.total_amount
        {
            return Err(OrderError::ValidationError(format!(
                "Amount {expected} does not match order total {}",
                order.total_amount
            )));
        }

        self.orders.create(order.clone()).await?;
        info!(order_id = %order.id, total = %order.total_amount, "Order created");

        let initiation = match (backend, request.context.as_ref()) {
            (PaymentBackend::Settlement, _) => {
                self.carts.clear(&order.buyer_id).await?;
                info!(order_id = %order.id, "Settlement order placed, cart cleared");
                Initiation::Settled
            }
            (backend, Some(context)) => self.initiate(backend, &order, context).await?,
            (_, None) => return Err(missing_origin()),
        };

        Ok(PlacedOrder { order, initiation })
    }

    /// Starts payment again for an order that is still awaiting it.
    #[instrument(skip(self, context), fields(order_id = %order_id, buyer_id = %buyer_id))]
    pub async fn retry_initiation(
        &self,
        order_id: &OrderId,
        buyer_id: &BuyerId,
        context: &GatewayContext,
    ) -> Result<Initiation> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .filter(|o| &o.buyer_id == buyer_id)
            .ok_or(OrderError::NotFound(*order_id))?;
        if order.payment_confirmed {
            return Err(OrderError::ValidationError(format!(
                "Order {order_id} is already paid"
            )));
        }

        match self.backends.get(order.payment_method)? {
            PaymentBackend::Settlement => Ok(Initiation::Settled),
            backend => self.initiate(backend, &order, context).await,
        }
    }

    /// Applies a verification signal to an order.
    ///
    /// Safe to replay: a confirmed order stays confirmed without touching the cart again,
    /// and an order already removed by an earlier denial reports `Denied`.
    #[instrument(skip(self, evidence), fields(order_id = %order_id, method = %evidence_method(&evidence)))]
    pub async fn verify(
        &self,
        order_id: &OrderId,
        evidence: VerificationEvidence,
    ) -> Result<VerificationOutcome> {
        let method = evidence_method(&evidence);
        let Some(order) = self.orders.get(order_id).await? else {
            info!("Order no longer exists, reporting denial");
            return Ok(VerificationOutcome::Denied);
        };
        // A redirect outcome only speaks for the buyer who placed the order.
        if let VerificationEvidence::HostedCheckout { buyer_id, .. } = &evidence
            && *buyer_id != order.buyer_id
        {
            warn!(caller = %buyer_id, "Verification attempted on another buyer's order");
            return Err(OrderError::NotFound(*order_id));
        }
        if order.payment_method != method {
            return Err(OrderError::ValidationError(format!(
                "Order {order_id} was placed with {}, not {method}",
                order.payment_method
            )));
        }
        if order.payment_confirmed {
            return Ok(VerificationOutcome::Confirmed);
        }

        // The backend lookup may be slow; it runs outside the order's critical section.
        let status = self.backends.get(method)?.confirm(&evidence, &order).await?;

        let _guard = self.locks.acquire(*order_id).await;
        let Some(current) = self.orders.get(order_id).await? else {
            return Ok(VerificationOutcome::Denied);
        };
        if current.payment_confirmed {
            return Ok(VerificationOutcome::Confirmed);
        }

        match status.outcome {
            VerificationOutcome::Confirmed => {
                // Cart first: if confirming fails, a retried verify clears it again instead of never.
                match &status.buyer_id {
                    Some(buyer_id) if *buyer_id == current.buyer_id => {
                        self.carts.clear(buyer_id).await?;
                        info!(buyer_id = %buyer_id, "Cart cleared");
                    }
                    Some(buyer_id) => warn!(
                        evidence_buyer = %buyer_id,
                        order_buyer = %current.buyer_id,
                        "Evidence names a different buyer, cart left as is"
                    ),
                    None => warn!("Buyer unknown from verification evidence, cart left as is"),
                }
                if self
                    .orders
                    .update(order_id, OrderUpdate::PaymentConfirmed)
                    .await?
                    .is_none()
                {
                    return Ok(VerificationOutcome::Denied);
                }
                info!("Payment confirmed");
                Ok(VerificationOutcome::Confirmed)
            }
            VerificationOutcome::Denied => {
                self.orders.delete(order_id).await?;
                info!("Payment denied, order removed");
                Ok(VerificationOutcome::Denied)
            }
        }
    }

    pub async fn all_orders(&self) -> Result<Vec<Order>> {
        self.orders.all_orders().await
    }

    pub async fn orders_for_buyer(&self, buyer_id: &BuyerId) -> Result<Vec<Order>> {
        self.orders.orders_for_buyer(buyer_id).await
    }

    /// Sets the fulfillment status. Payment state is not touched.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn update_status(&self, order_id: &OrderId, status: &str) -> Result<Order> {
        let status = status.trim();
        if status.is_empty() {
            return Err(OrderError::ValidationError(
                "Status must not be empty".to_string(),
            ));
        }
        let order = self
            .orders
            .update(order_id, OrderUpdate::FulfillmentStatus(status.to_string()))
            .await?
            .ok_or(OrderError::NotFound(*order_id))?;
        info!(status = %status, "Fulfillment status updated");
        Ok(order)
    }

    pub async fn cart(&self, buyer_id: &BuyerId) -> Result<Cart> {
        self.carts.get(buyer_id).await
    }

    async fn initiate(
        &self,
        backend: &PaymentBackend,
        order: &Order,
        context: &GatewayContext,
    ) -> Result<Initiation> {
        match backend.initiate(InitiationRequest { order, context }).await {
            Ok(initiation) => Ok(initiation),
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Payment initiation failed, order kept awaiting payment");
                Err(OrderError::InitiationFailed {
                    order_id: order.id,
                    reason: e.to_string(),
                })
            }
        }
    }
}

fn missing_origin() -> OrderError {
    OrderError::ValidationError("An origin URL is required for online payment".to_string())
}
