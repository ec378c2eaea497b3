use crate::domain::cart::Cart;
use crate::domain::order::{BuyerId, Order, OrderId, OrderUpdate};
use crate::domain::ports::{CartStore, OrderStore};
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for orders.
///
/// Uses `Arc<RwLock<HashMap<OrderId, Order>>>` to allow shared concurrent access.
/// Each operation takes the lock once, so an update is never observed half-applied.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        match orders.entry(order.id) {
            Entry::Occupied(_) => Err(OrderError::StoreError(format!(
                "Order {} already exists",
                order.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(order);
                Ok(())
            }
        }
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(id).cloned())
    }

    async fn update(&self, id: &OrderId, update: OrderUpdate) -> Result<Option<Order>> {
        let mut orders = self.orders.write().await;
        Ok(orders.get_mut(id).map(|order| {
            order.apply(update);
            order.clone()
        }))
    }

    async fn delete(&self, id: &OrderId) -> Result<bool> {
        let mut orders = self.orders.write().await;
        Ok(orders.remove(id).is_some())
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by_key(|o| o.created_at);
        Ok(all)
    }

    async fn orders_for_buyer(&self, buyer_id: &BuyerId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut mine: Vec<Order> = orders
            .values()
            .filter(|o| &o.buyer_id == buyer_id)
            .cloned()
            .collect();
        mine.sort_by_key(|o| o.created_at);
        Ok(mine)
    }
}

/// A thread-safe in-memory store for carts, keyed by buyer.
#[derive(Default, Clone)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<BuyerId, Cart>>>,
}

impl InMemoryCartStore {
    /// Creates a new, empty in-memory cart store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn store(&self, cart: Cart) -> Result<()> {
        let mut carts = self.carts.write().await;
        carts.insert(cart.buyer_id.clone(), cart);
        Ok(())
    }

    async fn get(&self, buyer_id: &BuyerId) -> Result<Cart> {
        let carts = self.carts.read().await;
        Ok(carts
            .get(buyer_id)
            .cloned()
            .unwrap_or_else(|| Cart::new(buyer_id.clone())))
    }

    async fn clear(&self, buyer_id: &BuyerId) -> Result<()> {
        let mut carts = self.carts.write().await;
        carts
            .entry(buyer_id.clone())
            .or_insert_with(|| Cart::new(buyer_id.clone()))
            .clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{DeliveryAddress, LineItem, PaymentMethod};
    use rust_decimal_macros::dec;

    fn sample_order(buyer: &str) -> Order {
        Order::new(
            BuyerId::new(buyer).unwrap(),
            vec![LineItem::new("Ring", dec!(42.50), 1).unwrap()],
            DeliveryAddress::default(),
            PaymentMethod::HostedCheckout,
            dec!(10),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_order_store() {
        let store = InMemoryOrderStore::new();
        let order = sample_order("b1");

        store.create(order.clone()).await.unwrap();
        let retrieved = store.get(&order.id).await.unwrap().unwrap();
        assert_eq!(retrieved, order);

        assert!(store.get(&OrderId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let store = InMemoryOrderStore::new();
        let order = sample_order("b1");

        store.create(order.clone()).await.unwrap();
        assert!(matches!(
            store.create(order).await,
            Err(OrderError::StoreError(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = InMemoryOrderStore::new();
        let order = sample_order("b1");
        store.create(order.clone()).await.unwrap();

        let updated = store
            .update(&order.id, OrderUpdate::PaymentConfirmed)
            .await
            .unwrap()
            .unwrap();
        assert!(updated.payment_confirmed);

        assert!(store.delete(&order.id).await.unwrap());
        // Deleting an absent order is not an error
        assert!(!store.delete(&order.id).await.unwrap());
        assert!(
            store
                .update(&order.id, OrderUpdate::PaymentConfirmed)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_orders_for_buyer() {
        let store = InMemoryOrderStore::new();
        store.create(sample_order("b1")).await.unwrap();
        store.create(sample_order("b1")).await.unwrap();
        store.create(sample_order("b2")).await.unwrap();

        let b1 = BuyerId::new("b1").unwrap();
        assert_eq!(store.orders_for_buyer(&b1).await.unwrap().len(), 2);
        assert_eq!(store.all_orders().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_in_memory_cart_store() {
        let store = InMemoryCartStore::new();
        let buyer = BuyerId::new("b1").unwrap();

        let mut cart = Cart::new(buyer.clone());
        cart.add("Ring", 2);
        store.store(cart.clone()).await.unwrap();
        assert_eq!(store.get(&buyer).await.unwrap(), cart);

        store.clear(&buyer).await.unwrap();
        assert!(store.get(&buyer).await.unwrap().is_empty());

        // Unknown buyers have an empty cart
        let other = BuyerId::new("b2").unwrap();
        assert!(store.get(&other).await.unwrap().is_empty());
    }
}
