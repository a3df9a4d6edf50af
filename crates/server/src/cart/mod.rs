//! Stock-aware cart store.
//!
//! Lines are keyed by product id and carry a point-in-time snapshot of the
//! product (name, price, images, stock). Quantities are guarded against the
//! snapshot stock: violations are reported as errors, never clamped, and a
//! failed mutation leaves the stored cart untouched.
//!
//! The store persists through an injected [`CartStorage`] backend and
//! exposes an explicit subscription interface: a revision counter bumped
//! after every successful mutation. Subscribers re-read the cart when the
//! revision changes.

pub mod storage;
pub mod whatsapp;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use mercadito_core::ProductId;

pub use storage::{CartStorage, JsonFileStorage, MemoryStorage, StorageError};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product has no stock at all.
    #[error("product is out of stock")]
    OutOfStock,
    /// The requested quantity exceeds the line's recorded stock.
    #[error("cannot add more, only {available} items available")]
    StockExceeded {
        /// Stock recorded on the cart line.
        available: u32,
    },
    /// The product has no line in the cart.
    #[error("item not found in cart")]
    NotInCart,
    /// The backing storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The cart could not be serialized for storage.
    #[error("cart serialization: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The product snapshot captured when a line is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    /// Product ID (the line key).
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price at snapshot time.
    pub price: Decimal,
    /// Image URLs.
    pub images: Vec<String>,
    /// Stock at snapshot time; the ceiling for this line's quantity.
    pub stock: u32,
}

/// One cart line: a product snapshot plus a quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product ID.
    pub id: ProductId,
    /// Cached product name.
    pub name: String,
    /// Cached unit price.
    pub price: Decimal,
    /// Cached image URLs.
    pub images: Vec<String>,
    /// Cached stock ceiling.
    pub stock: u32,
    /// Units in the cart (1..=stock).
    pub quantity: u32,
}

/// The cart with its derived totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Lines in insertion order.
    pub items: Vec<CartLine>,
    /// Σ price × quantity over all lines.
    pub total: Decimal,
    /// Σ quantity over all lines.
    pub item_count: u32,
}

impl Cart {
    fn from_lines(items: Vec<CartLine>) -> Self {
        let total = items
            .iter()
            .map(|line| line.price * Decimal::from(line.quantity))
            .sum();
        let item_count = items.iter().map(|line| line.quantity).sum();
        Self {
            items,
            total,
            item_count,
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Stock-aware cart store over an injected storage backend.
pub struct CartStore<S> {
    storage: S,
    revision: watch::Sender<u64>,
}

impl<S: CartStorage> CartStore<S> {
    /// Create a store over the given backend.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            revision: watch::Sender::new(0),
        }
    }

    /// Subscribe to cart changes.
    ///
    /// The receiver observes a revision counter that increments after every
    /// successful mutation; on a change, re-read via [`Self::get_cart`].
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current cart with derived total and item count.
    ///
    /// A missing, unreadable, or corrupt backing document yields an empty
    /// cart rather than an error.
    #[must_use]
    pub fn get_cart(&self) -> Cart {
        Cart::from_lines(self.load_lines())
    }

    /// Add one unit of a product.
    ///
    /// An existing line is incremented only while strictly below its
    /// recorded stock; a new line requires stock > 0.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::StockExceeded`] or [`CartError::OutOfStock`] on
    /// stock violations (the cart is left unchanged), or a storage error.
    pub fn add_to_cart(&self, product: &CartProduct) -> Result<(), CartError> {
        let mut lines = self.load_lines();

        if let Some(line) = lines.iter_mut().find(|line| line.id == product.id) {
            if line.quantity >= line.stock {
                return Err(CartError::StockExceeded {
                    available: line.stock,
                });
            }
            line.quantity += 1;
        } else {
            if product.stock == 0 {
                return Err(CartError::OutOfStock);
            }
            lines.push(CartLine {
                id: product.id,
                name: product.name.clone(),
                price: product.price,
                images: product.images.clone(),
                stock: product.stock,
                quantity: 1,
            });
        }

        self.save_lines(&lines)?;
        self.notify();
        Ok(())
    }

    /// Set a line's quantity. A quantity below 1 removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if the product has no line and
    /// [`CartError::StockExceeded`] if the quantity exceeds the line's
    /// recorded stock (the line is left unchanged).
    pub fn update_quantity(&self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity < 1 {
            return self.remove_from_cart(product_id);
        }

        let mut lines = self.load_lines();
        let Some(line) = lines.iter_mut().find(|line| line.id == product_id) else {
            return Err(CartError::NotInCart);
        };

        if quantity > line.stock {
            return Err(CartError::StockExceeded {
                available: line.stock,
            });
        }
        line.quantity = quantity;

        self.save_lines(&lines)?;
        self.notify();
        Ok(())
    }

    /// Remove a product's line. Not an error if absent.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the updated cart cannot be persisted.
    pub fn remove_from_cart(&self, product_id: ProductId) -> Result<(), CartError> {
        let mut lines = self.load_lines();
        lines.retain(|line| line.id != product_id);

        self.save_lines(&lines)?;
        self.notify();
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the empty cart cannot be persisted.
    pub fn clear(&self) -> Result<(), CartError> {
        self.save_lines(&[])?;
        self.notify();
        Ok(())
    }

    /// Whether the product has a line in the cart.
    #[must_use]
    pub fn is_in_cart(&self, product_id: ProductId) -> bool {
        self.load_lines().iter().any(|line| line.id == product_id)
    }

    /// Quantity of the product in the cart; 0 without a line.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.load_lines()
            .iter()
            .find(|line| line.id == product_id)
            .map_or(0, |line| line.quantity)
    }

    fn load_lines(&self) -> Vec<CartLine> {
        match self.storage.load() {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Corrupt cart payload, starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Cart storage unreadable, starting empty");
                Vec::new()
            }
        }
    }

    fn save_lines(&self, lines: &[CartLine]) -> Result<(), CartError> {
        let raw = serde_json::to_string(lines)?;
        self.storage.save(&raw)?;
        Ok(())
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn product(id: i64, price: Decimal, stock: u32) -> CartProduct {
        CartProduct {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price,
            images: Vec::new(),
            stock,
        }
    }

    fn store() -> CartStore<MemoryStorage> {
        CartStore::new(MemoryStorage::new())
    }

    #[test]
    fn test_get_cart_empty_by_default() {
        let cart = store().get_cart();
        assert!(cart.is_empty());
        assert_eq!(cart.total, Decimal::ZERO);
        assert_eq!(cart.item_count, 0);
    }

    #[test]
    fn test_get_cart_tolerates_corrupt_payload() {
        let store = CartStore::new(MemoryStorage::with_payload("{not json"));
        let cart = store.get_cart();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_to_cart_and_derived_totals() {
        // Product A (stock 5, 10.00) at quantity 2, product B (stock 1,
        // 25.50) at quantity 1 -> total 45.50, item count 3.
        let store = store();
        let a = product(1, dec!(10.00), 5);
        let b = product(2, dec!(25.50), 1);

        store.add_to_cart(&a).expect("add a");
        store.add_to_cart(&a).expect("add a again");
        store.add_to_cart(&b).expect("add b");

        let cart = store.get_cart();
        assert_eq!(cart.total, dec!(45.50));
        assert_eq!(cart.item_count, 3);
        assert_eq!(cart.items.len(), 2);
    }

    #[test]
    fn test_add_out_of_stock_product_fails_and_leaves_cart_unchanged() {
        let store = store();
        let err = store
            .add_to_cart(&product(1, dec!(5.00), 0))
            .expect_err("out of stock");
        assert!(matches!(err, CartError::OutOfStock));
        assert!(store.get_cart().is_empty());
    }

    #[test]
    fn test_add_beyond_stock_fails_and_leaves_quantity_unchanged() {
        let store = store();
        let scarce = product(1, dec!(5.00), 1);

        store.add_to_cart(&scarce).expect("first add");
        let err = store.add_to_cart(&scarce).expect_err("second add");
        assert!(matches!(err, CartError::StockExceeded { available: 1 }));
        assert_eq!(store.quantity_of(scarce.id), 1);
    }

    #[test]
    fn test_update_quantity_sets_within_stock() {
        let store = store();
        let p = product(1, dec!(2.00), 5);

        store.add_to_cart(&p).expect("add");
        store.update_quantity(p.id, 4).expect("update");
        assert_eq!(store.quantity_of(p.id), 4);
        assert_eq!(store.get_cart().total, dec!(8.00));
    }

    #[test]
    fn test_update_quantity_zero_is_remove() {
        let store = store();
        let p = product(1, dec!(2.00), 5);

        store.add_to_cart(&p).expect("add");
        store.update_quantity(p.id, 0).expect("remove via zero");
        assert!(!store.is_in_cart(p.id));
    }

    #[test]
    fn test_update_quantity_beyond_stock_fails_and_leaves_line_unchanged() {
        let store = store();
        let p = product(1, dec!(2.00), 3);

        store.add_to_cart(&p).expect("add");
        let err = store.update_quantity(p.id, 4).expect_err("beyond stock");
        assert!(matches!(err, CartError::StockExceeded { available: 3 }));
        assert_eq!(store.quantity_of(p.id), 1);
    }

    #[test]
    fn test_update_quantity_unknown_product() {
        let store = store();
        let err = store
            .update_quantity(ProductId::new(7), 2)
            .expect_err("no line");
        assert!(matches!(err, CartError::NotInCart));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = store();
        let p = product(1, dec!(2.00), 5);

        store.add_to_cart(&p).expect("add");
        store.remove_from_cart(p.id).expect("remove");
        store.remove_from_cart(p.id).expect("remove again");
        assert!(store.get_cart().is_empty());
    }

    #[test]
    fn test_clear_empties_everything() {
        let store = store();
        store.add_to_cart(&product(1, dec!(1.00), 5)).expect("add");
        store.add_to_cart(&product(2, dec!(2.00), 5)).expect("add");

        store.clear().expect("clear");
        assert!(store.get_cart().is_empty());
    }

    #[test]
    fn test_failed_mutation_does_not_notify() {
        let store = store();
        let rx = store.subscribe();
        let before = *rx.borrow();

        let _ = store.add_to_cart(&product(1, dec!(1.00), 0));
        assert_eq!(*rx.borrow(), before);
    }

    #[test]
    fn test_successful_mutations_bump_revision() {
        let store = store();
        let rx = store.subscribe();
        let before = *rx.borrow();

        let p = product(1, dec!(1.00), 5);
        store.add_to_cart(&p).expect("add");
        store.update_quantity(p.id, 3).expect("update");
        store.clear().expect("clear");

        assert_eq!(*rx.borrow(), before + 3);
    }

    #[test]
    fn test_cart_persists_across_store_instances() {
        let path = std::env::temp_dir().join(format!(
            "mercadito-cart-persist-{}.json",
            std::process::id()
        ));

        let store = CartStore::new(JsonFileStorage::new(&path));
        store
            .add_to_cart(&product(1, dec!(3.50), 2))
            .expect("add");
        drop(store);

        let reopened = CartStore::new(JsonFileStorage::new(&path));
        let cart = reopened.get_cart();
        assert_eq!(cart.item_count, 1);
        assert_eq!(cart.total, dec!(3.50));

        std::fs::remove_file(&path).expect("cleanup");
    }
}
