//! # hms-core: Pure Pricing Logic for the HMS Marketplace
//!
//! This crate prices the subscription marketplace: direct customers buying
//! feature modules and distributors signing up for reseller plans. Every
//! function is pure; no I/O happens here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        HMS Marketplace                                  │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Marketplace UI / hms-quote CLI               │   │
//! │  │    Module picker ──► Plan picker ──► Coupon field ──► Summary   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               hms-checkout (QuoteSession)                       │   │
//! │  │    config, logging, renderer + checkout collaborators           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ hms-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │ discount │ │  coupon  │ │ pricing  │ │  quote   │          │   │
//! │  │   │ tiers    │ │ lookup   │ │ totals   │ │ payload  │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO FLOATS                               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Exact decimal `Money`
//! - [`types`] - Catalog entries, modes, discount rates
//! - [`catalog`] - Immutable catalog snapshot
//! - [`selection`] - Selected modules / plan
//! - [`discount`] - Bundle tiers
//! - [`coupon`] - Coupon codes and tables
//! - [`pricing`] - Totals and initial payment
//! - [`quote`] - Quote payloads and numbers
//! - [`seed`] - Built-in marketplace catalog
//! - [`error`] / [`validation`] - Error types and input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use hms_core::pricing::price_customer;
//! use hms_core::seed::default_catalog;
//! use hms_core::selection::ModuleSelection;
//! use hms_core::Money;
//!
//! let catalog = default_catalog().unwrap();
//! let selection: ModuleSelection = ["patient-records", "billing"].into_iter().collect();
//!
//! let result = price_customer(&catalog, &selection, None).unwrap();
//! assert_eq!(result.subtotal, Money::from_cents(8498));
//! // Two modules: 5% bundle discount
//! assert_eq!(result.bundle_discount.to_string(), "$4.25");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod coupon;
pub mod discount;
pub mod error;
pub mod money;
pub mod pricing;
pub mod quote;
pub mod seed;
pub mod selection;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::Catalog;
pub use coupon::{AppliedCoupon, CouponCode, CouponTable};
pub use discount::{bundle_discount, BundleTier};
pub use error::{CoreError, CoreResult, CouponError, ValidationError};
pub use money::Money;
pub use pricing::{compute_totals, PricingResult};
pub use quote::{QuoteBuilder, QuoteNumberScheme, QuoteParty, QuotePayload};
pub use selection::{ModuleSelection, PlanSelection, Selection};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest free-text field accepted (titles, names, categories).
pub const MAX_TEXT_LENGTH: usize = 200;

/// Days a quote stays valid after it is issued.
pub const QUOTE_VALIDITY_DAYS: u32 = 30;

/// Longest validity window a configuration may ask for (ten years).
pub const MAX_QUOTE_VALIDITY_DAYS: u32 = 3650;

/// Smallest quote number suffix.
pub const QUOTE_SUFFIX_MIN: u16 = 1000;

/// Largest quote number suffix.
pub const QUOTE_SUFFIX_MAX: u16 = 9999;
