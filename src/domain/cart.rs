//! Shopping cart types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Upper bound on a single line's quantity
pub const MAX_LINE_QUANTITY: i32 = 99;

/// Cart line joined with the product it refers to
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub name: String,
    pub price: Decimal,
    pub mrp: Option<Decimal>,
    pub stock: i32,
    pub images: Vec<String>,
    pub seller_id: Uuid,
    pub shop_name: Option<String>,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    pub fn in_stock(&self) -> bool {
        self.stock >= self.quantity
    }
}

/// Cart with totals
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub item_count: i32,
    pub subtotal: Decimal,
    /// MRP total minus subtotal, for lines that carry an MRP
    pub savings: Decimal,
}

impl Cart {
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let item_count = items.iter().map(|i| i.quantity).sum();
        let subtotal = items.iter().map(CartItem::line_total).sum();
        let savings = items
            .iter()
            .filter_map(|i| {
                let mrp = i.mrp?;
                (mrp > i.price).then(|| (mrp - i.price) * Decimal::from(i.quantity))
            })
            .sum();

        Self {
            items,
            item_count,
            subtotal,
            savings,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(price: &str, mrp: Option<&str>, quantity: i32) -> CartItem {
        CartItem {
            product_id: Uuid::new_v4(),
            quantity,
            name: "Item".into(),
            price: Decimal::from_str(price).unwrap(),
            mrp: mrp.map(|m| Decimal::from_str(m).unwrap()),
            stock: 5,
            images: Vec::new(),
            seller_id: Uuid::new_v4(),
            shop_name: None,
        }
    }

    #[test]
    fn totals_and_savings() {
        let cart = Cart::from_items(vec![
            item("100.50", Some("120"), 2),
            item("40", None, 1),
            item("60", Some("50"), 1),
        ]);

        assert_eq!(cart.item_count, 4);
        assert_eq!(cart.subtotal, Decimal::from_str("301.00").unwrap());
        assert_eq!(cart.savings, Decimal::from_str("39.00").unwrap());
    }

    #[test]
    fn stock_check() {
        assert!(item("1", None, 5).in_stock());
        assert!(!item("1", None, 6).in_stock());
    }
}
