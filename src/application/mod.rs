//! Application layer containing the order–payment reconciliation logic.
//!
//! This module defines the `ReconciliationEngine`, the single entry point for placing
//! orders and applying payment verification outcomes, and the per-order locks it uses
//! to keep concurrent verifications of the same order from both taking effect.

pub mod engine;
pub mod locks;
