use crate::domain::cart::Cart;
use crate::domain::order::{BuyerId, Order, OrderId, OrderUpdate};
use crate::domain::ports::{CartStore, OrderStore};
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Column Family for storing orders.
pub const CF_ORDERS: &str = "orders";
/// Column Family for storing buyer carts.
pub const CF_CARTS: &str = "carts";

/// A persistent store implementation using RocksDB.
///
/// Handles storage for both `Order` and `Cart` entities using separate Column Families.
/// Read-modify-write operations go through `write_lock` so two updates to the same
/// record cannot interleave.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("orders" and "carts") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_orders = ColumnFamilyDescriptor::new(CF_ORDERS, Options::default());
        let cf_carts = ColumnFamilyDescriptor::new(CF_CARTS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_orders, cf_carts])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| OrderError::StoreError(format!("{name} column family not found")))
    }

    fn read<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf)?;
        match self.db.get_pinned_cf(cf, key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf)?;
        let bytes = serde_json::to_vec(value)
            .map_err(|e| OrderError::StoreError(format!("Serialization error: {e}")))?;
        self.db.put_cf(cf, key, bytes)?;
        Ok(())
    }

    fn scan_orders(&self, mut keep: impl FnMut(&Order) -> bool) -> Result<Vec<Order>> {
        let cf = self.cf(CF_ORDERS)?;
        let mut orders = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let order: Order = decode(&value)?;
            if keep(&order) {
                orders.push(order);
            }
        }
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| OrderError::StoreError(format!("Deserialization error: {e}")))
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn create(&self, order: Order) -> Result<()> {
        let _guard = self.write_lock.lock();
        if self.read::<Order>(CF_ORDERS, order.id.as_bytes())?.is_some() {
            return Err(OrderError::StoreError(format!(
                "Order {} already exists",
                order.id
            )));
        }
        self.write(CF_ORDERS, order.id.as_bytes(), &order)
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>> {
        self.read(CF_ORDERS, id.as_bytes())
    }

    async fn update(&self, id: &OrderId, update: OrderUpdate) -> Result<Option<Order>> {
        let _guard = self.write_lock.lock();
        let Some(mut order) = self.read::<Order>(CF_ORDERS, id.as_bytes())? else {
            return Ok(None);
        };
        order.apply(update);
        self.write(CF_ORDERS, id.as_bytes(), &order)?;
        Ok(Some(order))
    }

    async fn delete(&self, id: &OrderId) -> Result<bool> {
        let _guard = self.write_lock.lock();
        let cf = self.cf(CF_ORDERS)?;
        let existed = self.db.get_pinned_cf(cf, id.as_bytes())?.is_some();
        if existed {
            self.db.delete_cf(cf, id.as_bytes())?;
        }
        Ok(existed)
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        self.scan_orders(|_| true)
    }

    async fn orders_for_buyer(&self, buyer_id: &BuyerId) -> Result<Vec<Order>> {
        self.scan_orders(|o| &o.buyer_id == buyer_id)
    }
}

#[async_trait]
impl CartStore for RocksDBStore {
    async fn store(&self, cart: Cart) -> Result<()> {
        self.write(CF_CARTS, cart.buyer_id.as_str().as_bytes(), &cart)
    }

    async fn get(&self, buyer_id: &BuyerId) -> Result<Cart> {
        Ok(self
            .read(CF_CARTS, buyer_id.as_str().as_bytes())?
            .unwrap_or_else(|| Cart::new(buyer_id.clone())))
    }

    async fn clear(&self, buyer_id: &BuyerId) -> Result<()> {
        self.write(
            CF_CARTS,
            buyer_id.as_str().as_bytes(),
            &Cart::new(buyer_id.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{DeliveryAddress, LineItem, PaymentMethod};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn sample_order() -> Order {
        Order::new(
            BuyerId::new("b1").unwrap(),
            vec![LineItem::new("Ring", dec!(42.50), 1).unwrap()],
            DeliveryAddress::default(),
            PaymentMethod::RedirectLink,
            dec!(10),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_ORDERS).is_some());
        assert!(store.db.cf_handle(CF_CARTS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_order_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let order = sample_order();

        OrderStore::create(&store, order.clone()).await.unwrap();
        let retrieved = OrderStore::get(&store, &order.id).await.unwrap().unwrap();
        assert_eq!(retrieved, order);

        let updated = store
            .update(&order.id, OrderUpdate::FulfillmentStatus("Shipped".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.fulfillment_status, "Shipped");

        assert_eq!(store.all_orders().await.unwrap().len(), 1);
        assert!(store.delete(&order.id).await.unwrap());
        assert!(!store.delete(&order.id).await.unwrap());
        assert!(OrderStore::get(&store, &order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_cart_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let buyer = BuyerId::new("b1").unwrap();

        let mut cart = Cart::new(buyer.clone());
        cart.add("Ring", 1);
        CartStore::store(&store, cart.clone()).await.unwrap();
        assert_eq!(CartStore::get(&store, &buyer).await.unwrap(), cart);

        store.clear(&buyer).await.unwrap();
        assert!(CartStore::get(&store, &buyer).await.unwrap().is_empty());
    }
}
