//! # Notification Stubs
//!
//! SMS and voice-call senders. These only log the message and report
//! success; wiring a real provider means replacing the bodies of
//! [`SmsService::send`] and [`CallService::make_call`] with API calls.

use tracing::info;

use kirana_core::{Customer, Money};

/// SMS sender stub.
#[derive(Debug, Clone)]
pub struct SmsService {
    sender_id: String,
}

impl Default for SmsService {
    fn default() -> Self {
        SmsService::new("KIRANA")
    }
}

impl SmsService {
    /// Creates an SMS service with the given sender id.
    pub fn new(sender_id: impl Into<String>) -> Self {
        SmsService {
            sender_id: sender_id.into(),
        }
    }

    /// Sends an SMS. Stub: logs and reports success.
    pub fn send(&self, phone: &str, message: &str) -> bool {
        info!(sender = %self.sender_id, phone = %phone, message = %message, "SMS sent");
        true
    }

    /// Texts a receipt summary after checkout.
    pub fn send_transaction_receipt(
        &self,
        phone: &str,
        transaction_number: &str,
        total: Money,
    ) -> bool {
        let message = format!(
            "Receipt: Transaction {} completed. Total: {}. Thank you!",
            transaction_number,
            crate::services::reports::format_amount(total),
        );
        self.send(phone, &message)
    }

    /// Alerts a manager about low stock.
    pub fn send_low_stock_alert(&self, phone: &str, product_name: &str, current_stock: i64) -> bool {
        let message = format!(
            "LOW STOCK ALERT: {} has only {} units remaining. Please reorder.",
            product_name, current_stock
        );
        self.send(phone, &message)
    }

    /// Sends a promotion to every customer with a phone number.
    ///
    /// Returns (sent, failed) counts.
    pub fn send_promotional(&self, customers: &[Customer], message: &str) -> (usize, usize) {
        let mut sent = 0;
        let mut failed = 0;

        for customer in customers {
            if self.send(&customer.phone, message) {
                sent += 1;
            } else {
                failed += 1;
            }
        }

        (sent, failed)
    }
}

/// Voice-call sender stub.
#[derive(Debug, Clone, Default)]
pub struct CallService;

impl CallService {
    /// Places an automated call. Stub: logs and reports success.
    pub fn make_call(&self, phone: &str, message: &str) -> bool {
        info!(phone = %phone, message = %message, "Voice call placed");
        true
    }

    /// Calls a customer about an outstanding amount.
    pub fn payment_reminder(&self, phone: &str, customer_name: &str, amount_due: Money) -> bool {
        let message = format!(
            "Hello {}, this is a reminder that {} is due on your account.",
            customer_name,
            crate::services::reports::format_amount(amount_due),
        );
        self.make_call(phone, &message)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stubs_always_succeed() {
        let sms = SmsService::default();
        assert!(sms.send("9876543210", "hello"));
        assert!(sms.send_transaction_receipt("9876543210", "TXN-1", Money::from_major(708)));
        assert!(sms.send_low_stock_alert("9876543210", "Rice", 3));

        let call = CallService;
        assert!(call.make_call("9876543210", "hello"));
        assert!(call.payment_reminder("9876543210", "Ravi", Money::from_major(250)));
    }

    #[test]
    fn promotional_counts_recipients() {
        let sms = SmsService::default();
        let now = chrono::Utc::now();
        let customer = |phone: &str| Customer {
            id: 1,
            customer_code: None,
            name: "X".to_string(),
            phone: phone.to_string(),
            email: None,
            address: None,
            city: None,
            date_of_birth: None,
            membership_tier: kirana_core::MembershipTier::Regular,
            loyalty_points: 0,
            total_purchases: Money::zero(),
            registration_date: now.date_naive(),
            last_visit: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let customers = vec![customer("9000000001"), customer("9000000002")];
        assert_eq!(sms.send_promotional(&customers, "Diwali sale!"), (2, 0));
    }
}
