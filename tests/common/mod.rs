#![allow(dead_code)]

use async_trait::async_trait;
use order_reconciler::application::engine::{PlaceOrderRequest, ReconciliationEngine};
use order_reconciler::config::{HostedCheckoutConfig, RedirectLinkConfig, Secret};
use order_reconciler::domain::cart::Cart;
use order_reconciler::domain::order::{BuyerId, DeliveryAddress, LineItem, PaymentMethod};
use order_reconciler::domain::payment::GatewayContext;
use order_reconciler::domain::ports::CartStore;
use order_reconciler::error::Result;
use order_reconciler::infrastructure::gateways::{
    HostedCheckoutGateway, PaymentBackend, PaymentBackends, RedirectLinkGateway,
};
use order_reconciler::infrastructure::in_memory::{InMemoryCartStore, InMemoryOrderStore};
use rust_decimal_macros::dec;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const ORIGIN: &str = "https://shop.example.com";

/// Cart store that counts how often a cart is cleared.
#[derive(Clone, Default)]
pub struct CountingCartStore {
    inner: InMemoryCartStore,
    clears: Arc<AtomicUsize>,
}

impl CountingCartStore {
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CartStore for CountingCartStore {
    async fn store(&self, cart: Cart) -> Result<()> {
        self.inner.store(cart).await
    }

    async fn get(&self, buyer_id: &BuyerId) -> Result<Cart> {
        self.inner.get(buyer_id).await
    }

    async fn clear(&self, buyer_id: &BuyerId) -> Result<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear(buyer_id).await
    }
}

pub fn buyer() -> BuyerId {
    BuyerId::new("buyer-1").unwrap()
}

pub fn ring() -> Vec<LineItem> {
    vec![LineItem::new("Ring", dec!(42.50), 1).unwrap()]
}

pub fn address() -> DeliveryAddress {
    DeliveryAddress {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: "ada@example.com".into(),
        street: "12 Analytical Way".into(),
        city: "London".into(),
        country: "UK".into(),
        ..Default::default()
    }
}

pub fn request(method: PaymentMethod) -> PlaceOrderRequest {
    PlaceOrderRequest {
        buyer_id: buyer(),
        line_items: ring(),
        delivery_address: address(),
        payment_method: method,
        expected_total: None,
        context: Some(GatewayContext::new(ORIGIN).unwrap()),
    }
}

pub fn hosted_backend(api_base: &str) -> PaymentBackend {
    PaymentBackend::HostedCheckout(
        HostedCheckoutGateway::new(HostedCheckoutConfig {
            secret_key: Secret::new("sk_test"),
            api_base: api_base.to_string(),
            currency: "USD".to_string(),
            delivery_fee: dec!(10),
            timeout: Duration::from_secs(5),
        })
        .unwrap(),
    )
}

pub fn link_backend(api_base: &str) -> PaymentBackend {
    PaymentBackend::RedirectLink(
        RedirectLinkGateway::new(RedirectLinkConfig {
            secret_key: Secret::new("flw_test"),
            api_base: api_base.to_string(),
            currency: "USD".to_string(),
            tx_ref_prefix: "shop_tx".to_string(),
            title: "Shop".to_string(),
            description: "Order payment".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap(),
    )
}

pub fn engine(backends: PaymentBackends) -> (Arc<ReconciliationEngine>, CountingCartStore) {
    let carts = CountingCartStore::default();
    let engine = ReconciliationEngine::new(
        Box::new(InMemoryOrderStore::new()),
        Box::new(carts.clone()),
        backends,
        dec!(10),
    );
    (Arc::new(engine), carts)
}

pub async fn fill_cart(carts: &impl CartStore) {
    let mut cart = Cart::new(buyer());
    cart.add("Ring", 1);
    cart.add("Gift wrap", 2);
    carts.store(cart).await.unwrap();
}

pub fn write_items_csv(path: &Path, rows: &[(&str, &str, &str)]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "name,unit_price,quantity")?;
    for (name, price, quantity) in rows {
        writeln!(file, "{name},{price},{quantity}")?;
    }
    Ok(())
}
