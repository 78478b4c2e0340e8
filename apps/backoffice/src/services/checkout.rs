//! # Checkout Service
//!
//! Orchestrates a sale from the billing panel:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart contents ──► CheckoutRequest ──► TransactionRepository           │
//! │                                              │                          │
//! │                                              ▼                          │
//! │  receipt text ◄── Receipt ◄── persisted transaction details            │
//! │       │                                                                 │
//! │       ├──► SMS receipt to the attached customer (stub)                  │
//! │       └──► cart cleared                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All money math happens in kirana-core and all persistence in kirana-db;
//! this module only sequences the calls and renders the receipt.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use kirana_core::{Customer, Money, PaymentMethod};
use kirana_db::repository::transaction::CheckoutRequest;
use kirana_db::Database;

use crate::cart::CartState;
use crate::error::AppError;
use crate::services::notify::SmsService;
use crate::services::reports::format_amount;
use crate::session::{Panel, Session};

use kirana_core::checkout::BillingPolicy;

/// One line on a rendered receipt.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub original_price: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub line_total: Money,
}

/// Everything needed to print or text a receipt.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub transaction_number: String,
    pub date: DateTime<Utc>,
    pub store_name: String,
    pub customer_name: Option<String>,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub loyalty_points_earned: i64,
    pub footer: String,
}

impl Receipt {
    /// Renders the classic fixed-width receipt text.
    pub fn render(&self) -> String {
        let mut out = Vec::new();
        let rule = "=".repeat(50);
        let thin = "-".repeat(50);

        out.push(rule.clone());
        out.push(format!("{:^50}", self.store_name));
        out.push(rule.clone());
        out.push(format!("Transaction: {}", self.transaction_number));
        out.push(format!("Date: {}", self.date.format("%Y-%m-%d %H:%M:%S")));
        out.push(format!(
            "Customer: {}",
            self.customer_name.as_deref().unwrap_or("Walk-in")
        ));
        out.push(thin.clone());

        for line in &self.lines {
            let name: String = line.name.chars().take(20).collect();
            out.push(format!(
                "{:<20} {:>3} x {:>10}",
                name,
                line.quantity,
                format_amount(line.original_price)
            ));
            if line.discount_amount.is_positive() {
                out.push(format!("{:<20} -{:>9}", "  Discount:", format_amount(line.discount_amount)));
            }
            out.push(format!("{:<20} {:>10}", "  Tax:", format_amount(line.tax_amount)));
            out.push(format!("{:<20} {:>10}", "  Total:", format_amount(line.line_total)));
            out.push(String::new());
        }

        out.push(thin);
        out.push(format!("Subtotal:        {:>12}", format_amount(self.subtotal)));
        if self.discount_amount.is_positive() {
            out.push(format!("Discount:        {:>12}", format_amount(self.discount_amount)));
        }
        out.push(format!("Tax (GST):       {:>12}", format_amount(self.tax_amount)));
        out.push(rule.clone());
        out.push(format!("TOTAL:           {:>12}", format_amount(self.total_amount)));
        out.push(rule.clone());
        out.push(format!("Payment Method: {}", self.payment_method.as_str().to_uppercase()));
        if self.loyalty_points_earned > 0 {
            out.push(format!("Loyalty points earned: {}", self.loyalty_points_earned));
        }
        out.push(String::new());
        out.push(self.footer.clone());
        out.push(rule);

        out.join("\n")
    }
}

/// The billing panel's checkout orchestrator.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
    policy: BillingPolicy,
    sms: SmsService,
    store_name: String,
    receipt_footer: String,
}

impl CheckoutService {
    /// Creates a checkout service.
    pub fn new(
        db: Database,
        policy: BillingPolicy,
        sms: SmsService,
        store_name: impl Into<String>,
    ) -> Self {
        CheckoutService {
            db,
            policy,
            sms,
            store_name: store_name.into(),
            receipt_footer: "Thank you for shopping with us!".to_string(),
        }
    }

    /// The active billing policy.
    pub fn policy(&self) -> &BillingPolicy {
        &self.policy
    }

    /// Runs a sale for the current cart.
    ///
    /// On success the cart is cleared, the customer (when attached) gets an
    /// SMS receipt, and the rendered receipt comes back for display.
    pub async fn checkout(
        &self,
        session: &Session,
        cart: &CartState,
        customer: Option<&Customer>,
        employee_id: i64,
        payment_method: PaymentMethod,
        notes: Option<String>,
    ) -> Result<Receipt, AppError> {
        session.require(Panel::Billing)?;

        let lines = cart.with_cart(|c| c.lines());

        let request = CheckoutRequest {
            customer_id: customer.map(|c| c.id),
            employee_id,
            lines,
            payment_method,
            notes,
        };

        let outcome = self
            .db
            .transactions()
            .create_sale(&request, &self.policy)
            .await?;

        for shortage in &outcome.shortages {
            warn!(
                product = %shortage.product_name,
                available = shortage.available,
                requested = shortage.requested,
                "Sale recorded with stock shortage"
            );
        }

        let details = self
            .db
            .transactions()
            .details(outcome.transaction_id)
            .await?
            .ok_or_else(|| AppError::internal("Persisted transaction disappeared"))?;

        let receipt = Receipt {
            transaction_number: outcome.transaction_number.clone(),
            date: details.transaction.transaction_date,
            store_name: self.store_name.clone(),
            customer_name: details.customer_name,
            lines: details
                .items
                .iter()
                .map(|d| ReceiptLine {
                    name: d
                        .product_name
                        .clone()
                        .unwrap_or_else(|| format!("#{}", d.item.product_id)),
                    quantity: d.item.quantity,
                    original_price: d.item.original_price,
                    discount_amount: d.item.discount_amount,
                    tax_amount: d.item.tax_amount,
                    line_total: d.item.line_total,
                })
                .collect(),
            subtotal: details.transaction.subtotal,
            discount_amount: details.transaction.discount_amount,
            tax_amount: details.transaction.tax_amount,
            total_amount: details.transaction.total_amount,
            payment_method: details.transaction.payment_method,
            loyalty_points_earned: details.transaction.loyalty_points_earned,
            footer: self.receipt_footer.clone(),
        };

        if let Some(customer) = customer {
            self.sms.send_transaction_receipt(
                &customer.phone,
                &receipt.transaction_number,
                receipt.total_amount,
            );
        }

        cart.with_cart_mut(|c| c.clear());

        Ok(receipt)
    }
}

/// Maps loose panel input ("card", "CREDIT", "points") to a payment method.
pub fn parse_payment_method(input: &str) -> PaymentMethod {
    match input.trim().to_lowercase().as_str() {
        "cash" => PaymentMethod::Cash,
        "card" | "credit_card" | "debit" | "debit_card" => PaymentMethod::Card,
        "upi" => PaymentMethod::Upi,
        "credit" | "khata" => PaymentMethod::Credit,
        "loyalty" | "points" | "loyalty_points" => PaymentMethod::LoyaltyPoints,
        "mixed" => PaymentMethod::Mixed,
        _ => PaymentMethod::Cash,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kirana_core::{Money, UserRole};
    use kirana_db::repository::product::NewProduct;
    use kirana_db::DbConfig;

    async fn setup() -> (Database, Session, CheckoutService, CartState, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.users()
            .create("till", "pw", UserRole::Cashier, None, None)
            .await
            .unwrap();
        let session = Session::login(&db, "till", "pw").await.unwrap();

        let employee_id = db
            .employees()
            .create(kirana_db::repository::employee::NewEmployee {
                name: "Asha".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id;

        let service = CheckoutService::new(
            db.clone(),
            BillingPolicy::default(),
            SmsService::default(),
            "Kirana Express",
        );

        (db, session, service, CartState::new(), employee_id)
    }

    async fn add_product(db: &Database, name: &str, price: i64, stock: i64, discount_bps: u32) -> kirana_core::Product {
        db.products()
            .create(NewProduct {
                name: name.to_string(),
                unit_price: Money::from_major(price),
                quantity_in_stock: stock,
                discount_rate_bps: discount_bps,
                max_stock_level: 1000,
                ..NewProduct::default()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn checkout_produces_receipt_and_clears_cart() {
        let (db, session, service, cart, employee_id) = setup().await;

        let rice = add_product(&db, "Basmati Rice 5kg", 65, 10, 0).await;
        let mixer = add_product(&db, "Mixer Grinder", 450, 4, 1000).await;

        cart.with_cart_mut(|c| c.add_product(&rice, 3)).unwrap();
        cart.with_cart_mut(|c| c.add_product(&mixer, 1)).unwrap();

        let receipt = service
            .checkout(&session, &cart, None, employee_id, PaymentMethod::Cash, None)
            .await
            .unwrap();

        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.subtotal, Money::from_major(645));
        assert_eq!(receipt.total_amount, Money::from_major(708));
        assert!(cart.with_cart(|c| c.is_empty()));

        let text = receipt.render();
        assert!(text.contains("Kirana Express"));
        assert!(text.contains("TOTAL:"));
        assert!(text.contains("708.00"));
        assert!(text.contains("Walk-in"));
        assert!(text.contains("CASH"));
    }

    #[tokio::test]
    async fn checkout_with_customer_credits_loyalty() {
        let (db, session, service, cart, employee_id) = setup().await;

        let rice = add_product(&db, "Rice", 65, 100, 0).await;
        let customer = db
            .customers()
            .create(kirana_db::repository::customer::NewCustomer {
                name: "Ravi".to_string(),
                phone: "9876543210".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        cart.with_cart_mut(|c| c.add_product(&rice, 10)).unwrap();

        let receipt = service
            .checkout(&session, &cart, Some(&customer), employee_id, PaymentMethod::Upi, None)
            .await
            .unwrap();

        assert_eq!(receipt.customer_name.as_deref(), Some("Ravi"));
        // 650 + 117 tax = 767.00 -> 76 points
        assert_eq!(receipt.loyalty_points_earned, 76);

        let after = db.customers().get_by_id(customer.id).await.unwrap().unwrap();
        assert_eq!(after.loyalty_points, 76);
    }

    #[tokio::test]
    async fn empty_cart_checkout_rejected() {
        let (_db, session, service, cart, employee_id) = setup().await;

        let err = service
            .checkout(&session, &cart, None, employee_id, PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ValidationError);
    }

    #[test]
    fn payment_method_parsing() {
        assert_eq!(parse_payment_method("cash"), PaymentMethod::Cash);
        assert_eq!(parse_payment_method("CARD"), PaymentMethod::Card);
        assert_eq!(parse_payment_method("upi"), PaymentMethod::Upi);
        assert_eq!(parse_payment_method("points"), PaymentMethod::LoyaltyPoints);
        assert_eq!(parse_payment_method("???"), PaymentMethod::Cash);
    }
}
