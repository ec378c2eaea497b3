//! Adapters: order/cart storage and the external payment backends.

pub mod gateways;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
