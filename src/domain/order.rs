use crate::error::{OrderError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Fulfillment status every order starts with until an administrator changes it.
pub const DEFAULT_FULFILLMENT_STATUS: &str = "Order Placed";

/// Prices are whole cents; backends charge in minor units.
const MAX_PRICE_SCALE: u32 = 2;

/// Opaque order identifier, assigned once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| OrderError::ValidationError(format!("Invalid order id: {s}")))
    }
}

/// Reference to a buyer. The buyer record itself lives outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuyerId(String);

impl BuyerId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(OrderError::ValidationError(
                "Buyer id must not be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuyerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BuyerId {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// A strictly positive monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(OrderError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The amount in minor currency units (cents), as hosted checkout backends expect.
    pub fn minor_units(&self) -> Result<i64> {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.round().to_i64())
            .ok_or_else(|| OrderError::ValidationError(format!("Amount out of range: {}", self.0)))
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = OrderError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub unit_price: Amount,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(name: impl Into<String>, unit_price: Decimal, quantity: u32) -> Result<Self> {
        let item = Self {
            name: name.into(),
            unit_price: Amount::new(unit_price)?,
            quantity,
        };
        item.validate()?;
        Ok(item)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(OrderError::ValidationError(
                "Line item name must not be empty".to_string(),
            ));
        }
        if self.quantity == 0 {
            return Err(OrderError::ValidationError(format!(
                "Line item '{}' must have a positive quantity",
                self.name
            )));
        }
        if self.unit_price.value().normalize().scale() > MAX_PRICE_SCALE {
            return Err(OrderError::ValidationError(format!(
                "Line item '{}' is priced below one cent",
                self.name
            )));
        }
        Ok(())
    }

    pub fn subtotal(&self) -> Result<Decimal> {
        self.unit_price
            .value()
            .checked_mul(Decimal::from(self.quantity))
            .ok_or_else(|| out_of_range(&self.name))
    }
}

/// Shipping and contact details captured when the order is placed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliveryAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub phone: String,
}

impl DeliveryAddress {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// Paid outside this system, on delivery.
    Settlement,
    HostedCheckout,
    RedirectLink,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Settlement => "settlement",
            Self::HostedCheckout => "hosted-checkout",
            Self::RedirectLink => "redirect-link",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "settlement" | "cod" => Ok(Self::Settlement),
            "hosted-checkout" | "stripe" => Ok(Self::HostedCheckout),
            "redirect-link" | "flutterwave" => Ok(Self::RedirectLink),
            other => Err(OrderError::ValidationError(format!(
                "Unknown payment method: {other}"
            ))),
        }
    }
}

/// Field-level mutation applied to a stored order.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderUpdate {
    PaymentConfirmed,
    FulfillmentStatus(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: BuyerId,
    pub line_items: Vec<LineItem>,
    pub delivery_address: DeliveryAddress,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_confirmed: bool,
    pub fulfillment_status: String,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Builds a new unconfirmed order, pricing it as the sum of its lines plus `delivery_fee`.
    pub fn new(
        buyer_id: BuyerId,
        line_items: Vec<LineItem>,
        delivery_address: DeliveryAddress,
        payment_method: PaymentMethod,
        delivery_fee: Decimal,
    ) -> Result<Self> {
        let total_amount = order_total(&line_items, delivery_fee)?;
        Ok(Self {
            id: OrderId::new(),
            buyer_id,
            line_items,
            delivery_address,
            total_amount,
            payment_method,
            payment_confirmed: false,
            fulfillment_status: DEFAULT_FULFILLMENT_STATUS.to_string(),
            created_at: Utc::now(),
        })
    }

    /// Applies a field update. Payment confirmation is one-way.
    pub fn apply(&mut self, update: OrderUpdate) {
        match update {
            OrderUpdate::PaymentConfirmed => self.payment_confirmed = true,
            OrderUpdate::FulfillmentStatus(status) => self.fulfillment_status = status,
        }
    }
}

/// Sum of `unit_price * quantity` over all lines, plus the delivery surcharge.
pub fn order_total(line_items: &[LineItem], delivery_fee: Decimal) -> Result<Decimal> {
    if line_items.is_empty() {
        return Err(OrderError::ValidationError(
            "An order needs at least one line item".to_string(),
        ));
    }
    if delivery_fee < Decimal::ZERO {
        return Err(OrderError::ValidationError(
            "Delivery fee must not be negative".to_string(),
        ));
    }
    if delivery_fee.normalize().scale() > MAX_PRICE_SCALE {
        return Err(OrderError::ValidationError(
            "Delivery fee is priced below one cent".to_string(),
        ));
    }
    let mut total = delivery_fee;
    for item in line_items {
        item.validate()?;
        total = total
            .checked_add(item.subtotal()?)
            .ok_or_else(|| out_of_range(&item.name))?;
    }
    Ok(total)
}

fn out_of_range(item: &str) -> OrderError {
    OrderError::ValidationError(format!("Order total out of range at line item '{item}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_total_includes_delivery_fee() {
        let items = vec![
            LineItem::new("Ring", dec!(20.00), 2).unwrap(),
            LineItem::new("Chain", dec!(2.50), 1).unwrap(),
        ];
        assert_eq!(order_total(&items, dec!(10)).unwrap(), dec!(52.50));
    }

    #[test]
    fn test_order_total_rejects_empty_items() {
        assert!(matches!(
            order_total(&[], dec!(10)),
            Err(OrderError::ValidationError(_))
        ));
    }

    #[test]
    fn test_line_item_validation() {
        assert!(LineItem::new("Ring", dec!(1.0), 1).is_ok());
        assert!(LineItem::new("", dec!(1.0), 1).is_err());
        assert!(LineItem::new("Ring", dec!(0.0), 1).is_err());
        assert!(LineItem::new("Ring", dec!(-5.0), 1).is_err());
        assert!(LineItem::new("Ring", dec!(1.0), 0).is_err());
    }

    #[test]
    fn test_amount_minor_units() {
        assert_eq!(Amount::new(dec!(42.50)).unwrap().minor_units().unwrap(), 4250);
        assert!(matches!(
            Amount::new(Decimal::MAX).unwrap().minor_units(),
            Err(OrderError::ValidationError(_))
        ));
    }

    #[test]
    fn test_order_total_overflow_is_rejected() {
        let huge: LineItem = serde_json::from_value(serde_json::json!({
            "name": "Ring",
            "unit_price": "79228162514264337593543950335",
            "quantity": 2
        }))
        .unwrap();
        assert!(matches!(huge.subtotal(), Err(OrderError::ValidationError(_))));

        let items = vec![
            LineItem::new("Ring", Decimal::MAX, 1).unwrap(),
            LineItem::new("Chain", dec!(1), 1).unwrap(),
        ];
        assert!(matches!(
            order_total(&items, dec!(10)),
            Err(OrderError::ValidationError(_))
        ));
        assert!(
            Order::new(
                BuyerId::new("buyer-1").unwrap(),
                vec![huge],
                DeliveryAddress::default(),
                PaymentMethod::Settlement,
                dec!(10),
            )
            .is_err()
        );
    }

    #[test]
    fn test_sub_cent_prices_rejected() {
        assert!(LineItem::new("Pin", dec!(0.015), 1).is_err());
        assert!(LineItem::new("Pin", dec!(0.010), 1).is_ok());
        let items = vec![LineItem::new("Pin", dec!(1), 1).unwrap()];
        assert!(order_total(&items, dec!(2.499)).is_err());
        assert_eq!(order_total(&items, dec!(2.50)).unwrap(), dec!(3.50));
    }

    #[test]
    fn test_amount_deserialization_rejects_non_positive() {
        assert!(serde_json::from_str::<Amount>("\"0\"").is_err());
        assert!(serde_json::from_str::<Amount>("\"3.5\"").is_ok());
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("cod".parse::<PaymentMethod>().unwrap(), PaymentMethod::Settlement);
        assert_eq!(
            "Stripe".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::HostedCheckout
        );
        assert_eq!(
            "redirect-link".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::RedirectLink
        );
        assert!("paypal".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_new_order_starts_unconfirmed() {
        let order = Order::new(
            BuyerId::new("buyer-1").unwrap(),
            vec![LineItem::new("Ring", dec!(42.50), 1).unwrap()],
            DeliveryAddress::default(),
            PaymentMethod::HostedCheckout,
            dec!(10),
        )
        .unwrap();

        assert!(!order.payment_confirmed);
        assert_eq!(order.total_amount, dec!(52.50));
        assert_eq!(order.fulfillment_status, DEFAULT_FULFILLMENT_STATUS);
    }

    #[test]
    fn test_apply_updates() {
        let mut order = Order::new(
            BuyerId::new("buyer-1").unwrap(),
            vec![LineItem::new("Ring", dec!(1.0), 1).unwrap()],
            DeliveryAddress::default(),
            PaymentMethod::Settlement,
            dec!(0),
        )
        .unwrap();

        order.apply(OrderUpdate::FulfillmentStatus("Shipped".into()));
        order.apply(OrderUpdate::PaymentConfirmed);
        assert_eq!(order.fulfillment_status, "Shipped");
        assert!(order.payment_confirmed);
    }

    #[test]
    fn test_blank_buyer_rejected() {
        assert!(BuyerId::new("  ").is_err());
    }
}
