//! # Validation Module
//!
//! Input validation utilities for Kirana POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Panel / CLI input parsing                                    │
//! │  ├── Type conversion, immediate feedback                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (business rule validation)                       │
//! │  ├── Cart lines, codes, phone numbers, rates                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / FOREIGN KEY constraints                       │
//! │                                                                         │
//! │  The checkout flow rejects the WHOLE cart if any line fails here;      │
//! │  nothing is written on validation failure.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::checkout::CartLine;
use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Cart Validation
// =============================================================================

/// Validates a cart before checkout.
///
/// ## Rules
/// - The cart must contain at least one line
/// - Every line needs a positive product id, a positive quantity and a
///   positive unit price
///
/// Any failing line rejects the whole cart; indices in the error are
/// 1-based to match the billing panel's row numbering.
pub fn validate_cart_lines(lines: &[CartLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    for (i, line) in lines.iter().enumerate() {
        let index = i + 1;
        if line.product_id <= 0 {
            return Err(ValidationError::CartFieldNotPositive {
                index,
                field: "product_id",
            });
        }
        if line.quantity <= 0 {
            return Err(ValidationError::CartFieldNotPositive {
                index,
                field: "quantity",
            });
        }
        if !line.unit_price.is_positive() {
            return Err(ValidationError::CartFieldNotPositive {
                index,
                field: "unit_price",
            });
        }
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a business code (product/employee/supplier codes).
///
/// ## Rules
/// - Must not be empty
/// - At most 20 characters
/// - Alphanumeric plus hyphens and underscores
pub fn validate_code(field: &str, code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if code.len() > 20 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 20,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (products, customers, employees, suppliers).
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 255 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 255,
        });
    }

    Ok(())
}

/// Validates a phone number.
///
/// ## Rules
/// - 7 to 15 digits after stripping separators
/// - May carry a leading `+` and spaces/hyphens between groups
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || c == '+' || c == '-' || c == ' ');

    if !allowed || digits.len() < 7 || digits.len() > 15 {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be 7 to 15 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// Empty queries are fine (they list everything); overlong ones are not.
/// Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity for stock adjustments and cart entry.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a price (non-negative; zero allowed for record fields like
/// an unknown cost price).
pub fn validate_price(price: crate::money::Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a rate in basis points (0% to 100%).
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Money, RateBps};

    fn ok_line() -> CartLine {
        CartLine {
            product_id: 1,
            quantity: 2,
            unit_price: Money::from_major(65),
            discount_rate: RateBps::zero(),
        }
    }

    #[test]
    fn empty_cart_rejected() {
        assert!(matches!(
            validate_cart_lines(&[]),
            Err(ValidationError::EmptyCart)
        ));
    }

    #[test]
    fn bad_line_rejects_whole_cart() {
        let mut bad = ok_line();
        bad.quantity = 0;
        let err = validate_cart_lines(&[ok_line(), bad]).unwrap_err();
        match err {
            ValidationError::CartFieldNotPositive { index, field } => {
                assert_eq!(index, 2);
                assert_eq!(field, "quantity");
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut bad = ok_line();
        bad.unit_price = Money::zero();
        assert!(validate_cart_lines(&[bad]).is_err());

        let mut bad = ok_line();
        bad.product_id = -3;
        assert!(validate_cart_lines(&[bad]).is_err());
    }

    #[test]
    fn good_cart_passes() {
        assert!(validate_cart_lines(&[ok_line(), ok_line()]).is_ok());
    }

    #[test]
    fn code_rules() {
        assert!(validate_code("product_code", "PRD-20260115-0042").is_ok());
        assert!(validate_code("product_code", "").is_err());
        assert!(validate_code("product_code", "has space").is_err());
        assert!(validate_code("product_code", &"A".repeat(30)).is_err());
    }

    #[test]
    fn phone_rules() {
        assert!(validate_phone("+91-98765 43210").is_ok());
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("phone-number").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn rate_rules() {
        assert!(validate_rate_bps("tax_rate", 1800).is_ok());
        assert!(validate_rate_bps("tax_rate", 10_000).is_ok());
        assert!(validate_rate_bps("tax_rate", 10_001).is_err());
    }

    #[test]
    fn search_query_trimmed() {
        assert_eq!(validate_search_query("  rice ").unwrap(), "rice");
        assert!(validate_search_query(&"q".repeat(101)).is_err());
    }
}
