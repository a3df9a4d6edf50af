//! WhatsApp checkout helpers.
//!
//! The storefront hands the cart off to a human over WhatsApp: the cart is
//! rendered into a plain-text order message and wrapped in a `wa.me` deep
//! link with the message URL-encoded into the `text` parameter.

use std::fmt::Write as _;

use super::Cart;

/// Optional customer details appended to the order message.
#[derive(Debug, Default, Clone)]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CustomerInfo {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.address.is_none()
    }
}

/// Render a cart into the plain-text WhatsApp order message.
#[must_use]
pub fn order_message(cart: &Cart, customer: &CustomerInfo) -> String {
    if cart.is_empty() {
        return "Cart is empty".to_owned();
    }

    let mut msg = String::from("Hello! I would like to place an order:\n\n");
    for line in &cart.items {
        let line_total = line.price * rust_decimal::Decimal::from(line.quantity);
        let _ = writeln!(
            msg,
            "\u{2022} {} - {} x ${} = ${}",
            line.name, line.quantity, line.price, line_total
        );
    }
    let _ = write!(msg, "\nTotal: ${}", cart.total);

    if !customer.is_empty() {
        msg.push_str("\n\nMy details:");
        if let Some(name) = &customer.name {
            let _ = write!(msg, "\nName: {name}");
        }
        if let Some(phone) = &customer.phone {
            let _ = write!(msg, "\nPhone: {phone}");
        }
        if let Some(address) = &customer.address {
            let _ = write!(msg, "\nAddress: {address}");
        }
    }

    msg
}

/// Build the `wa.me` deep link for a cart.
///
/// `phone` is the store's WhatsApp number in international format without
/// the leading `+`.
#[must_use]
pub fn whatsapp_url(phone: &str, cart: &Cart, customer: &CustomerInfo) -> String {
    let message = order_message(cart, customer);
    format!("https://wa.me/{phone}?text={}", urlencoding::encode(&message))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::cart::{CartProduct, CartStore, MemoryStorage};
    use mercadito_core::ProductId;

    use super::*;

    fn sample_cart() -> Cart {
        let store = CartStore::new(MemoryStorage::new());
        let coffee = CartProduct {
            id: ProductId::new(1),
            name: "Coffee Beans".to_owned(),
            price: dec!(12.50),
            images: Vec::new(),
            stock: 10,
        };
        store.add_to_cart(&coffee).expect("add");
        store.add_to_cart(&coffee).expect("add");
        store.get_cart()
    }

    #[test]
    fn test_order_message_lists_lines_and_total() {
        let msg = order_message(&sample_cart(), &CustomerInfo::default());
        assert!(msg.starts_with("Hello! I would like to place an order:"));
        assert!(msg.contains("\u{2022} Coffee Beans - 2 x $12.50 = $25.00"));
        assert!(msg.contains("Total: $25.00"));
        assert!(!msg.contains("My details"));
    }

    #[test]
    fn test_order_message_appends_customer_details() {
        let customer = CustomerInfo {
            name: Some("Ana".to_owned()),
            phone: Some("+1 555 0100".to_owned()),
            address: None,
        };
        let msg = order_message(&sample_cart(), &customer);
        assert!(msg.contains("My details:\nName: Ana\nPhone: +1 555 0100"));
        assert!(!msg.contains("Address:"));
    }

    #[test]
    fn test_order_message_for_empty_cart() {
        let empty = CartStore::new(MemoryStorage::new()).get_cart();
        assert_eq!(order_message(&empty, &CustomerInfo::default()), "Cart is empty");
    }

    #[test]
    fn test_whatsapp_url_encodes_message() {
        let url = whatsapp_url("15550100", &sample_cart(), &CustomerInfo::default());
        assert!(url.starts_with("https://wa.me/15550100?text=Hello%21%20"));
        assert!(!url.contains(' '));
    }
}
