//! # Checkout Error Types
//!
//! Error types for session, configuration and collaborator failures.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Checkout Error Categories                          │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │  Precondition   │  │   Collaborators         │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  NoSelection-   │  │  QuoteGenerationFailure │ │
//! │  │  ConfigLoad     │  │  Precondition   │  │  CheckoutFailure        │ │
//! │  │  ConfigSave     │  │                 │  │  (retryable)            │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Core(CoreError): pricing, coupon and validation errors         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No variant ends a session. Collaborator failures leave selection, coupon
//! and free-trial state exactly as they were.

use std::fmt;
use std::time::Duration;

use hms_core::{CoreError, CouponError, PricingMode};
use thiserror::Error;

/// Result type alias for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Collaborator Error
// =============================================================================

/// Failure reported by a renderer or checkout gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// The collaborator answered with a failure.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The collaborator could not be reached or could not write its output.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// No answer within the configured timeout.
    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

impl From<std::io::Error> for CollaboratorError {
    fn from(err: std::io::Error) -> Self {
        CollaboratorError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(err: serde_json::Error) -> Self {
        CollaboratorError::Rejected(err.to_string())
    }
}

// =============================================================================
// Checkout Action
// =============================================================================

/// Which downstream action a checkout takes.
///
/// Chosen by the free-trial flag; the priced figures are the same either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutAction {
    ActivateTrial,
    BeginBilling,
}

impl CheckoutAction {
    pub fn for_trial(free_trial: bool) -> Self {
        if free_trial {
            CheckoutAction::ActivateTrial
        } else {
            CheckoutAction::BeginBilling
        }
    }
}

impl fmt::Display for CheckoutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckoutAction::ActivateTrial => write!(f, "trial activation"),
            CheckoutAction::BeginBilling => write!(f, "billing"),
        }
    }
}

// =============================================================================
// Checkout Error
// =============================================================================

/// Session-level error type.
#[derive(Debug, Error)]
pub enum CheckoutError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid engine configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Precondition
    // =========================================================================
    /// Quote or checkout requested with nothing selected.
    ///
    /// Front ends disable both actions while `actions_enabled()` is false,
    /// so this only surfaces when that check was skipped.
    #[error("Select at least one {} first", selection_noun(.mode))]
    NoSelectionPrecondition { mode: PricingMode },

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    /// The quote renderer failed; the quote was not delivered.
    #[error("Quote {quote_number} could not be generated: {source}")]
    QuoteGenerationFailure {
        quote_number: String,
        #[source]
        source: CollaboratorError,
    },

    /// Trial activation or billing failed; try again.
    #[error("Checkout failed during {action}: {source}")]
    CheckoutFailure {
        action: CheckoutAction,
        #[source]
        source: CollaboratorError,
    },

    // =========================================================================
    // Pricing Errors
    // =========================================================================
    /// Pricing, coupon or validation error from hms-core.
    #[error(transparent)]
    Core(#[from] CoreError),
}

fn selection_noun(mode: &PricingMode) -> &'static str {
    match mode {
        PricingMode::Customer => "module",
        PricingMode::Distributor => "plan",
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<CouponError> for CheckoutError {
    fn from(err: CouponError) -> Self {
        CheckoutError::Core(CoreError::Coupon(err))
    }
}

impl From<std::io::Error> for CheckoutError {
    fn from(err: std::io::Error) -> Self {
        CheckoutError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CheckoutError {
    fn from(err: toml::de::Error) -> Self {
        CheckoutError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for CheckoutError {
    fn from(err: toml::ser::Error) -> Self {
        CheckoutError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl CheckoutError {
    /// Returns true if the user can simply try the same action again.
    ///
    /// ## Retryable Errors
    /// - Quote generation failures
    /// - Checkout failures (including timeouts)
    ///
    /// Nothing retries automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::QuoteGenerationFailure { .. } | CheckoutError::CheckoutFailure { .. }
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CheckoutError::InvalidConfig(_)
                | CheckoutError::ConfigLoadFailed(_)
                | CheckoutError::ConfigSaveFailed(_)
        )
    }

    /// Returns the coupon error if this is an inline coupon-field message.
    pub fn as_coupon_error(&self) -> Option<&CouponError> {
        match self {
            CheckoutError::Core(CoreError::Coupon(err)) => Some(err),
            _ => None,
        }
    }
}
