//! Order, cart and payment types, plus the storage ports the engine depends on.

pub mod cart;
pub mod order;
pub mod payment;
pub mod ports;
