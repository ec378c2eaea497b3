use crate::domain::order::Order;
use crate::error::Result;
use std::io::Write;

/// Writes an order listing as CSV, one row per order.
pub struct OrderWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrderWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_orders<I>(&mut self, orders: I) -> Result<()>
    where
        I: IntoIterator<Item = Order>,
    {
        self.writer.write_record([
            "id",
            "buyer",
            "items",
            "total",
            "method",
            "paid",
            "status",
            "created_at",
        ])?;
        for order in orders {
            self.writer.write_record([
                order.id.to_string(),
                order.buyer_id.to_string(),
                order.line_items.len().to_string(),
                order.total_amount.to_string(),
                order.payment_method.to_string(),
                order.payment_confirmed.to_string(),
                order.fulfillment_status,
                order.created_at.to_rfc3339(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{BuyerId, DeliveryAddress, LineItem, PaymentMethod};
    use rust_decimal_macros::dec;

    #[test]
    fn test_write_orders() {
        let order = Order::new(
            BuyerId::new("b1").unwrap(),
            vec![LineItem::new("Ring", dec!(42.50), 1).unwrap()],
            DeliveryAddress::default(),
            PaymentMethod::Settlement,
            dec!(10),
        )
        .unwrap();
        let id = order.id;

        let mut out = Vec::new();
        OrderWriter::new(&mut out).write_orders(vec![order]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("id,buyer,items,total,method,paid,status,created_at\n"));
        assert!(text.contains(&format!("{id},b1,1,52.50,settlement,false,Order Placed,")));
    }
}
