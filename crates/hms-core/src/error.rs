//! # Error Types
//!
//! Domain-specific error types for hms-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  hms-core errors (this file)                                           │
//! │  ├── CoreError        - Pricing/selection rule violations              │
//! │  ├── CouponError      - Coupon field feedback (shown inline)           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  hms-checkout errors (separate crate)                                  │
//! │  └── CheckoutError    - Quote rendering / payment collaborator failures│
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → UI message        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (module id, coupon code, etc.)
//! 3. Errors are enum variants, never String
//! 4. Every error is recoverable; none ends a selection session

use thiserror::Error;

use crate::types::PricingMode;

// =============================================================================
// Core Error
// =============================================================================

/// Pricing and selection errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A quote or checkout was requested with nothing selected.
    ///
    /// ## When This Occurs
    /// - Customer mode with zero modules
    /// - Distributor mode with no plan
    ///
    /// The UI disables those actions, so seeing this means a caller skipped
    /// the `actions_enabled()` check.
    #[error("Nothing selected for {mode} pricing")]
    NoSelection { mode: PricingMode },

    /// Module id is not in the catalog.
    #[error("Module not found: {0}")]
    UnknownModule(String),

    /// Plan id is not in the catalog.
    #[error("Distributor plan not found: {0}")]
    UnknownPlan(String),

    /// Catalog contains (or would contain) the same id twice.
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// An operation for one mode was used while pricing the other.
    ///
    /// ## When This Occurs
    /// - Selecting a module in a distributor session
    /// - Building a distributor quote for a customer identity
    #[error("Operation requires {expected} mode, session is in {actual} mode")]
    ModeMismatch {
        expected: PricingMode,
        actual: PricingMode,
    },

    /// Coupon could not be applied.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Coupon Error
// =============================================================================

/// Coupon field errors, surfaced inline next to the input.
///
/// A failed apply never clears a coupon that was applied earlier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    /// The coupon field was blank.
    #[error("Please enter a coupon code")]
    EmptyCode,

    /// The code is not in the table (exact match after upper-casing).
    #[error("Invalid coupon: {code}")]
    InvalidCode { code: String },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for catalog entries, coupon tables and quote identities before any
/// pricing runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range (exclusive bounds).
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Amount must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g. malformed email or identifier).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g. the same coupon code twice).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
