use super::cart::Cart;
use super::order::{BuyerId, Order, OrderId, OrderUpdate};
use crate::error::Result;
use async_trait::async_trait;

/// Persistence for orders. Holds no business rules.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, order: Order) -> Result<()>;
    async fn get(&self, id: &OrderId) -> Result<Option<Order>>;
    /// Applies `update` and returns the updated order, or `None` if the order does not exist.
    async fn update(&self, id: &OrderId, update: OrderUpdate) -> Result<Option<Order>>;
    /// Removes the order. Returns `false` (not an error) when it was already absent.
    async fn delete(&self, id: &OrderId) -> Result<bool>;
    async fn all_orders(&self) -> Result<Vec<Order>>;
    async fn orders_for_buyer(&self, buyer_id: &BuyerId) -> Result<Vec<Order>>;
}

/// Persistence for buyer carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn store(&self, cart: Cart) -> Result<()>;
    /// Returns the buyer's cart, empty if none was stored.
    async fn get(&self, buyer_id: &BuyerId) -> Result<Cart>;
    async fn clear(&self, buyer_id: &BuyerId) -> Result<()>;
}

pub type OrderStoreBox = Box<dyn OrderStore>;
pub type CartStoreBox = Box<dyn CartStore>;
