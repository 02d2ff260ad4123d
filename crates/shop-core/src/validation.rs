//! # Validation Module
//!
//! Input checks that run before anything is sent to the server.
//!
//! ## Where It Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  user input ──► THIS MODULE ──► outbound request ──► server            │
//! │                     │                                                   │
//! │                     └── Err(ValidationError) → no request is sent      │
//! │                                                                         │
//! │  The server re-checks everything; these checks only keep obviously     │
//! │  invalid requests off the wire and drive disabled submit buttons.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shop_core::validation::{canonicalize_identifier, validate_amount};
//!
//! assert_eq!(canonicalize_identifier(" My Shop! "), "my_shop");
//! assert!(validate_amount(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_DISCOUNT_PERCENT;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifiers
// =============================================================================

/// Canonicalizes a shop identifier.
///
/// Lowercase, whitespace runs become `_`, anything outside `[a-z0-9_]` is
/// dropped, repeated `_` collapse, and leading/trailing `_` are trimmed.
///
/// ## Example
/// ```rust
/// use shop_core::validation::canonicalize_identifier;
///
/// assert_eq!(canonicalize_identifier("___a__b___"), "a_b");
/// assert_eq!(canonicalize_identifier("Büro 24/7"), "bro_247");
/// ```
pub fn canonicalize_identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_whitespace = false;

    for ch in raw.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            out.push(ch);
        }
    }

    let mut collapsed = String::with_capacity(out.len());
    for ch in out.chars() {
        if ch == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(ch);
    }
    collapsed.trim_matches('_').to_string()
}

/// Validates an identifier for a new shop and returns its canonical form.
///
/// ## Rules
/// - Canonical form must not be empty
/// - Must not collide with a known shop identifier
pub fn validate_new_identifier<'a, I>(raw: &str, known: I) -> ValidationResult<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let canonical = canonicalize_identifier(raw);
    if canonical.is_empty() {
        return Err(ValidationError::Required {
            field: "identifier".to_string(),
        });
    }
    if known.into_iter().any(|existing| existing == canonical) {
        return Err(ValidationError::Duplicate {
            field: "identifier".to_string(),
            value: canonical,
        });
    }
    Ok(canonical)
}

/// Validates a citizen id for hiring.
pub fn validate_citizenid(citizenid: &str) -> ValidationResult<String> {
    let citizenid = citizenid.trim();
    if citizenid.is_empty() {
        return Err(ValidationError::Required {
            field: "citizenid".to_string(),
        });
    }
    Ok(citizenid.to_string())
}

/// Validates a free-text label (shop name, delivery label).
pub fn validate_label(field: &str, label: &str) -> ValidationResult<()> {
    if label.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Deposit and withdraw amounts must be positive.
pub fn validate_amount(amount: i64) -> ValidationResult<Money> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    Ok(Money::from_units(amount))
}

/// Prices may be zero (free items) but never negative.
pub fn validate_price(price: i64) -> ValidationResult<Money> {
    if price < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }
    Ok(Money::from_units(price))
}

/// Wages may be zero but never negative.
pub fn validate_wage(wage: i64) -> ValidationResult<Money> {
    if wage < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "wage".to_string(),
        });
    }
    Ok(Money::from_units(wage))
}

/// Discount percent within `0..=max` (max itself capped at 100).
///
/// ## User Workflow
/// ```text
/// Manager enters 60 in the discount field
///      │
///      ▼
/// validate_discount(60, 50)
///      │
///      ├── < 0 or > 50 → Err(OutOfRange), no setDiscount sent
///      └── OK          → setDiscount { discount }
/// ```
pub fn validate_discount(percent: i64, max: i64) -> ValidationResult<i64> {
    let max = max.clamp(0, MAX_DISCOUNT_PERCENT);
    if !(0..=max).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max,
        });
    }
    Ok(percent)
}

/// Quantity for a cart or manifest line.
pub fn validate_quantity(quantity: i64) -> ValidationResult<i64> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(quantity)
}

// =============================================================================
// Unit Tests
// =============================================================================
