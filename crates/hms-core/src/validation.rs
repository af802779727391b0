//! # Validation Module
//!
//! Input validation for catalog entries and quote identities.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Marketplace UI                                               │
//! │  ├── Required fields, email shape                                      │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Catalog load (Catalog::new)                                  │
//! │  └── THIS MODULE: ids, titles, non-negative prices                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Quote build (QuoteParty::validate)                           │
//! │  └── THIS MODULE: names and email of the person being quoted           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use hms_core::validation::{validate_identifier, validate_email};
//!
//! validate_identifier("module id", "patient-records").unwrap();
//! validate_email("billing@stmarys.example").unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_TEXT_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest catalog identifier accepted.
const MAX_IDENTIFIER_LENGTH: usize = 50;

/// Largest catalog price or down payment accepted, in whole dollars.
pub const MAX_AMOUNT_DOLLARS: i64 = 1_000_000_000_000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a catalog identifier (module id, plan id).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only letters, digits, hyphens, underscores (no surrounding whitespace)
///
/// ## Example
/// ```rust
/// use hms_core::validation::validate_identifier;
///
/// assert!(validate_identifier("module id", "lab-results").is_ok());
/// assert!(validate_identifier("module id", "").is_err());
/// assert!(validate_identifier("module id", "has space").is_err());
/// ```
pub fn validate_identifier(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_IDENTIFIER_LENGTH,
        });
    }

    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates free text that must be present (titles, names, companies).
///
/// ## Rules
/// - Must not be blank
/// - At most 200 characters
pub fn validate_text(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LENGTH,
        });
    }

    Ok(())
}

/// Validates an email address shape.
///
/// Deliberately shallow: one `@`, something before it, and a dotted domain
/// after it. Deliverability is the mail system's problem.
///
/// ## Example
/// ```rust
/// use hms_core::validation::validate_email;
///
/// assert!(validate_email("ops@clinic.example").is_ok());
/// assert!(validate_email("ops@clinic").is_err());
/// assert!(validate_email("").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    validate_text("email", email)?;

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(|| invalid("missing '@'"))?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid("must look like name@domain.tld"));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && tld.len() >= 2 => Ok(()),
        _ => Err(invalid("domain must contain a dot")),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a catalog price or down payment.
///
/// ## Rules
/// - Must be non-negative
/// - Zero is allowed (free modules)
/// - At most [`MAX_AMOUNT_DOLLARS`]
///
/// ## Example
/// ```rust
/// use hms_core::money::Money;
/// use hms_core::validation::validate_amount;
///
/// assert!(validate_amount("price", Money::from_cents(1099)).is_ok());
/// assert!(validate_amount("price", Money::ZERO).is_ok());
/// assert!(validate_amount("price", Money::from_cents(-100)).is_err());
/// assert!(validate_amount("price", Money::from_dollars(2_000_000_000_000)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    if amount > Money::from_dollars(MAX_AMOUNT_DOLLARS) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: MAX_AMOUNT_DOLLARS.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
