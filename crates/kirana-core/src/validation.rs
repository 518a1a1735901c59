//! # Validation Module
//!
//! Input validation utilities for Kirana POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (sku, invoice_no per tenant)                   │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::totals::DiscountSpec;
use crate::types::PaymentMethod;
use crate::{MAX_ITEM_QUANTITY, MAX_PERCENT_BPS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 50 characters
/// - Only alphanumeric characters, hyphens, underscores
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (1-150 characters, non-empty).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 150 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 150,
        });
    }

    Ok(())
}

/// Validates a customer name.
///
/// ## Rules
/// - 2 to 100 characters after trimming
/// - Letters, spaces, hyphens, apostrophes, and periods only
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() < 2 {
        return Err(ValidationError::TooShort {
            field: "name".to_string(),
            min: 2,
        });
    }

    if name.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 100,
        });
    }

    if !name
        .chars()
        .all(|c| c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | '.'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "name".to_string(),
            reason: "must contain only letters, spaces, hyphens, and apostrophes".to_string(),
        });
    }

    Ok(())
}

/// Validates a customer phone number and returns the normalized form.
///
/// Non-digits (spaces, dashes, a +91 prefix) are stripped; what remains
/// must be a 10-digit Indian mobile number (first digit 6-9).
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let mut digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    // A country-code prefix is tolerated and dropped
    if digits.len() == 12 && digits.starts_with("91") {
        digits = digits.split_off(2);
    }

    if digits.len() != 10 || !matches!(digits.as_bytes()[0], b'6'..=b'9') {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be a valid 10-digit mobile number".to_string(),
        });
    }

    Ok(digits)
}

/// Validates a held-sale label (1-100 characters, non-empty).
pub fn validate_label(label: &str) -> ValidationResult<()> {
    let label = label.trim();

    if label.is_empty() {
        return Err(ValidationError::Required {
            field: "label".to_string(),
        });
    }

    if label.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "label".to_string(),
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0); a line dropping to zero is removed at the cart
///   layer, it never reaches persistence
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents (non-negative; zero allowed for free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: i64) -> ValidationResult<()> {
    if !(0..=MAX_PERCENT_BPS as i64).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: MAX_PERCENT_BPS as i64,
        });
    }

    Ok(())
}

/// Validates a discount before it reaches the calculator.
///
/// ## Rules
/// - Flat amounts must be non-negative (clamping to the subtotal happens in
///   the calculator)
/// - Percentage discounts cannot exceed 100%
pub fn validate_discount(discount: &DiscountSpec) -> ValidationResult<()> {
    match discount {
        DiscountSpec::Flat { amount } => {
            if amount.is_negative() {
                return Err(ValidationError::OutOfRange {
                    field: "discount".to_string(),
                    min: 0,
                    max: i64::MAX,
                });
            }
        }
        DiscountSpec::Percentage { bps } => {
            if *bps > MAX_PERCENT_BPS {
                return Err(ValidationError::OutOfRange {
                    field: "discount".to_string(),
                    min: 0,
                    max: MAX_PERCENT_BPS as i64,
                });
            }
        }
    }

    Ok(())
}

/// Validates the tendered amount against the sale total.
///
/// ## Rules
/// - Cash: must cover the total (`paid >= total`); underpayment is an
///   error, never a negative change
/// - Card/UPI: the tendered amount is fixed to the total by `settle`, so
///   any non-negative submission passes
pub fn validate_paid_amount(
    method: PaymentMethod,
    paid: Money,
    total: Money,
) -> ValidationResult<()> {
    if paid.is_negative() {
        return Err(ValidationError::MustBePositive {
            field: "paid_amount".to_string(),
        });
    }

    if method == PaymentMethod::Cash && paid < total {
        return Err(ValidationError::OutOfRange {
            field: "paid_amount".to_string(),
            min: total.cents(),
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("COKE-330").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Coca-Cola 330ml").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_customer_name() {
        assert!(validate_customer_name("Priya Sharma").is_ok());
        assert!(validate_customer_name("O'Brien-Kumar Jr.").is_ok());

        assert!(validate_customer_name("").is_err());
        assert!(validate_customer_name("A").is_err());
        assert!(validate_customer_name("Priya123").is_err());
        assert!(validate_customer_name(&"A".repeat(150)).is_err());
    }

    #[test]
    fn test_validate_phone_normalizes() {
        assert_eq!(validate_phone("9820012345").unwrap(), "9820012345");
        assert_eq!(validate_phone("98200 12345").unwrap(), "9820012345");
        assert_eq!(validate_phone("+91 98200-12345").unwrap(), "9820012345");

        // Wrong length, landline-style leading digit, garbage
        assert!(validate_phone("982001234").is_err());
        assert!(validate_phone("1820012345").is_err());
        assert!(validate_phone("not-a-phone").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(&DiscountSpec::Flat {
            amount: Money::from_cents(1500)
        })
        .is_ok());
        assert!(validate_discount(&DiscountSpec::Percentage { bps: 10000 }).is_ok());

        assert!(validate_discount(&DiscountSpec::Flat {
            amount: Money::from_cents(-1)
        })
        .is_err());
        // Over 100%
        assert!(validate_discount(&DiscountSpec::Percentage { bps: 10001 }).is_err());
    }

    #[test]
    fn test_validate_paid_amount() {
        let total = Money::from_cents(18880);

        assert!(validate_paid_amount(PaymentMethod::Cash, Money::from_cents(20000), total).is_ok());
        assert!(validate_paid_amount(PaymentMethod::Cash, total, total).is_ok());
        // Cash underpayment is rejected, not turned into negative change
        assert!(
            validate_paid_amount(PaymentMethod::Cash, Money::from_cents(10000), total).is_err()
        );
        // Card/UPI submissions are fixed to the total later; no cover check
        assert!(validate_paid_amount(PaymentMethod::Upi, Money::zero(), total).is_ok());
        assert!(validate_paid_amount(PaymentMethod::Card, Money::from_cents(-1), total).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(1800).is_ok());
        assert!(validate_tax_rate_bps(10000).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
        assert!(validate_tax_rate_bps(-1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
