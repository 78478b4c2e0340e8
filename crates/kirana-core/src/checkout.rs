//! # Checkout Calculations
//!
//! The billing arithmetic, as pure functions. Persisting the result is the
//! job of the database layer; nothing here touches I/O.
//!
//! ## Calculation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Checkout Math                                       │
//! │                                                                         │
//! │  CartLine { product_id, quantity, unit_price, discount_rate }          │
//! │       │                                                                 │
//! │       ▼  compute_line(line, tax_rate)                                  │
//! │  LineAmounts                                                            │
//! │    discount  = unit_price × rate × qty        (one half-up rounding)   │
//! │    taxable   = unit_price × qty − discount                             │
//! │    tax       = taxable × tax_rate             (half-up, 4 decimals)    │
//! │    line_total = taxable + tax                                          │
//! │       │                                                                 │
//! │       ▼  compute_totals(lines, policy)                                 │
//! │  TransactionTotals                                                      │
//! │    subtotal      = Σ original_price × qty     (sellable lines only)    │
//! │    item_discount = Σ line discounts                                    │
//! │    order_discount = (subtotal − item_discount) × rate                  │
//! │                     iff that amount ≥ policy.discount_threshold        │
//! │    total = subtotal − (item + order discount) + Σ tax                  │
//! │                                                                         │
//! │  Lines whose line_total ≤ 0 are "unsellable": they are dropped from    │
//! │  the sale and from the totals, without failing the other lines.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Worked Example (18% tax, no order discount)
//! ```rust
//! use kirana_core::checkout::{compute_line, CartLine};
//! use kirana_core::money::{Money, RateBps};
//!
//! let line = CartLine {
//!     product_id: 4,
//!     quantity: 1,
//!     unit_price: Money::from_major(450),
//!     discount_rate: RateBps::from_percent(10),
//! };
//! let amounts = compute_line(&line, RateBps::from_bps(1800));
//! assert_eq!(amounts.discount_amount, Money::from_major(45));
//! assert_eq!(amounts.tax_amount, Money::from_raw(729_000));   // 72.9000
//! assert_eq!(amounts.line_total, Money::from_raw(4_779_000)); // 477.9000
//! ```

use serde::{Deserialize, Serialize};

use crate::money::{Money, RateBps, MONEY_SCALE};
use crate::{DEFAULT_TAX_RATE_BPS, LOYALTY_SPEND_PER_POINT};

// =============================================================================
// Billing Policy
// =============================================================================

/// Configured constants for the billing path.
///
/// Loaded from system settings / environment by the application; the default
/// matches the seeded settings rows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BillingPolicy {
    /// Tax rate applied to every line (GST).
    pub tax_rate: RateBps,

    /// Minimum effective subtotal (after item discounts) that triggers the
    /// order-level discount.
    pub discount_threshold: Money,

    /// Order-level discount rate applied once the threshold is met.
    pub order_discount_rate: RateBps,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        BillingPolicy {
            tax_rate: RateBps::from_bps(DEFAULT_TAX_RATE_BPS),
            discount_threshold: Money::from_major(1000),
            order_discount_rate: RateBps::from_percent(5),
        }
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One entry in the cart handed to checkout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,

    /// Price per unit before discount.
    pub unit_price: Money,

    /// Line discount rate (usually the product's standing discount).
    pub discount_rate: RateBps,
}

// =============================================================================
// Line Amounts
// =============================================================================

/// Everything computed for one line, ready to persist as a transaction item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LineAmounts {
    pub product_id: i64,
    pub quantity: i64,

    /// Unit price before discount (snapshot of the cart line).
    pub original_price: Money,

    /// Unit price after discount, rounded half-up.
    pub unit_price: Money,

    pub discount_rate: RateBps,
    pub discount_amount: Money,
    pub tax_rate: RateBps,
    pub tax_amount: Money,
    pub line_total: Money,
}

impl LineAmounts {
    /// A line is sellable when it totals to something positive. Unsellable
    /// lines (e.g. 100% discounted) are skipped, not errors.
    #[inline]
    pub fn is_sellable(&self) -> bool {
        self.line_total.is_positive()
    }
}

/// Computes the per-line amounts.
///
/// All monetary results are rounded half-up to four decimal places; the
/// discount is rounded once over `unit_price × rate × quantity`.
pub fn compute_line(line: &CartLine, tax_rate: RateBps) -> LineAmounts {
    let discount_amount = line.unit_price.apply_rate_times(line.discount_rate, line.quantity);
    let discounted_unit = line.unit_price - line.unit_price.apply_rate(line.discount_rate);

    let gross = line.unit_price.times(line.quantity);
    let taxable = gross - discount_amount;
    let tax_amount = taxable.apply_rate(tax_rate);
    let line_total = taxable + tax_amount;

    LineAmounts {
        product_id: line.product_id,
        quantity: line.quantity,
        original_price: line.unit_price,
        unit_price: discounted_unit,
        discount_rate: line.discount_rate,
        discount_amount,
        tax_rate,
        tax_amount,
        line_total,
    }
}

// =============================================================================
// Transaction Totals
// =============================================================================

/// Order-level aggregates for the transaction header.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TransactionTotals {
    /// Σ original_price × quantity over sellable lines.
    pub subtotal: Money,

    /// Σ line discount amounts.
    pub item_discount: Money,

    /// Threshold discount on the whole order (zero below the threshold).
    pub order_discount: Money,

    /// `item_discount + order_discount`; what the header stores.
    pub discount_amount: Money,

    /// Σ line tax amounts.
    pub tax_amount: Money,

    /// `subtotal − discount_amount + tax_amount`.
    pub total_amount: Money,
}

/// Aggregates computed lines into header totals.
///
/// Unsellable lines contribute nothing, keeping the header equal to the sum
/// of the item rows that actually get inserted.
pub fn compute_totals(lines: &[LineAmounts], policy: &BillingPolicy) -> TransactionTotals {
    let mut subtotal = Money::zero();
    let mut item_discount = Money::zero();
    let mut tax_amount = Money::zero();

    for line in lines.iter().filter(|l| l.is_sellable()) {
        subtotal += line.original_price.times(line.quantity);
        item_discount += line.discount_amount;
        tax_amount += line.tax_amount;
    }

    let effective = subtotal - item_discount;
    let order_discount = if effective >= policy.discount_threshold {
        effective.apply_rate(policy.order_discount_rate)
    } else {
        Money::zero()
    };

    let discount_amount = item_discount + order_discount;
    let total_amount = subtotal - discount_amount + tax_amount;

    TransactionTotals {
        subtotal,
        item_discount,
        order_discount,
        discount_amount,
        tax_amount,
        total_amount,
    }
}

/// Computes every line at the policy tax rate, plus the order totals.
pub fn compute(lines: &[CartLine], policy: &BillingPolicy) -> (Vec<LineAmounts>, TransactionTotals) {
    let computed: Vec<LineAmounts> = lines
        .iter()
        .map(|line| compute_line(line, policy.tax_rate))
        .collect();
    let totals = compute_totals(&computed, policy);
    (computed, totals)
}

/// Loyalty points earned for a completed sale: one point per
/// [`LOYALTY_SPEND_PER_POINT`] whole currency units, fractions dropped.
pub fn loyalty_points_earned(total: Money) -> i64 {
    if total.is_negative() {
        return 0;
    }
    total.raw() / (LOYALTY_SPEND_PER_POINT * MONEY_SCALE)
}

// =============================================================================
// Unit Tests
// =============================================================================
