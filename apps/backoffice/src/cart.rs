//! # Cart State
//!
//! Manages the billing counter's current cart.
//!
//! ## Thread Safety
//! The cart is wrapped in a `Mutex` inside [`CartState`]: multiple panel
//! callbacks may touch the cart, and only one should modify it at a time.
//!
//! ## Price Freezing
//! Adding a product snapshots its price and standing discount. Editing the
//! product afterwards does not change what the cart charges; the next sale
//! picks up the new price.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kirana_core::checkout::{self, BillingPolicy, CartLine, TransactionTotals};
use kirana_core::{CoreError, Money, Product, RateBps, MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// An item in the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: i64,

    /// Code at time of adding (frozen).
    pub product_code: String,

    /// Name at time of adding (frozen).
    pub name: String,

    /// Price at time of adding (frozen).
    pub unit_price: Money,

    /// Standing discount at time of adding (frozen).
    pub discount_rate_bps: u32,

    pub quantity: i64,

    /// When this item was added.
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Snapshots a product into a cart item.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id,
            product_code: product.product_code.clone(),
            name: product.name.clone(),
            unit_price: product.unit_price,
            discount_rate_bps: product.discount_rate_bps,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// The checkout line this item contributes.
    pub fn as_line(&self) -> CartLine {
        CartLine {
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount_rate: RateBps::from_bps(self.discount_rate_bps),
        }
    }
}

/// The billing counter's cart.
///
/// ## Invariants
/// - Items are unique by product id (adding the same product merges)
/// - Quantities stay within 1..=MAX_ITEM_QUANTITY
/// - At most MAX_CART_ITEMS distinct items
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Some(Utc::now()),
        }
    }

    /// Adds a product, merging quantity when it is already in the cart.
    ///
    /// Stock is checked here so the cashier hears about shortages while the
    /// customer is still at the counter; the persisted flow re-checks.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> Result<(), CoreError> {
        let already = self
            .items
            .iter()
            .find(|i| i.product_id == product.id)
            .map(|i| i.quantity)
            .unwrap_or(0);

        let wanted = already + quantity;
        if !product.can_sell(wanted) {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.quantity_in_stock,
                requested: wanted,
            });
        }

        if wanted > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: wanted,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            item.quantity = wanted;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    /// Sets an item's quantity; zero removes it.
    pub fn update_quantity(&mut self, product_id: i64, quantity: i64) -> Result<(), CoreError> {
        if quantity == 0 {
            self.remove(product_id);
            return Ok(());
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(())
            }
            None => Err(kirana_core::ValidationError::Required {
                field: format!("product {product_id} in cart"),
            }
            .into()),
        }
    }

    /// Removes an item if present.
    pub fn remove(&mut self, product_id: i64) {
        self.items.retain(|i| i.product_id != product_id);
    }

    /// Clears all items.
    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Some(Utc::now());
    }

    /// Number of distinct items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total quantity across items.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Whether the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The checkout lines for the current contents.
    pub fn lines(&self) -> Vec<CartLine> {
        self.items.iter().map(CartItem::as_line).collect()
    }

    /// Live totals preview, using the same math the checkout flow persists.
    pub fn totals(&self, policy: &BillingPolicy) -> TransactionTotals {
        let (_, totals) = checkout::compute(&self.lines(), policy);
        totals
    }
}

/// Shared, mutex-guarded cart state.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    /// Creates a new empty cart state.
    pub fn new() -> Self {
        CartState {
            cart: Arc::new(Mutex::new(Cart::new())),
        }
    }

    /// Executes a closure with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().expect("Cart mutex poisoned");
        f(&cart)
    }

    /// Executes a closure with write access to the cart.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().expect("Cart mutex poisoned");
        f(&mut cart)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
