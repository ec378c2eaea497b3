use super::order::BuyerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A buyer's in-progress cart: item name to quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub buyer_id: BuyerId,
    pub items: BTreeMap<String, u32>,
}

impl Cart {
    pub fn new(buyer_id: BuyerId) -> Self {
        Self {
            buyer_id,
            items: BTreeMap::new(),
        }
    }

    /// Adds `quantity` of `item`, merging with any quantity already present.
    pub fn add(&mut self, item: impl Into<String>, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let entry = self.items.entry(item.into()).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_merges_quantities() {
        let mut cart = Cart::new(BuyerId::new("b").unwrap());
        cart.add("Ring", 1);
        cart.add("Ring", 2);
        cart.add("Chain", 0);
        assert_eq!(cart.items.get("Ring"), Some(&3));
        assert!(!cart.items.contains_key("Chain"));

        cart.clear();
        assert!(cart.is_empty());
    }
}
