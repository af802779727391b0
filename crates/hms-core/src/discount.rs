//! # Bundle Discount
//!
//! Count-tiered discount on the customer module subtotal.
//!
//! ```text
//! modules selected   tier     discount
//! ────────────────   ──────   ─────────────────
//!        0 / 1       None     $0
//!          2         Pair     5%  of subtotal
//!         3+         Suite    10% of subtotal
//! ```
//!
//! The tier is a step function of how many modules are selected, not of
//! what they cost. Distributor pricing never gets a bundle discount.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Module, PricingMode};

/// Bundle tier reached by a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BundleTier {
    /// Zero or one module.
    None,
    /// Exactly two modules.
    Pair,
    /// Three or more modules.
    Suite,
}

impl BundleTier {
    /// Tier for a number of selected modules.
    pub const fn for_count(count: usize) -> Self {
        match count {
            0 | 1 => BundleTier::None,
            2 => BundleTier::Pair,
            _ => BundleTier::Suite,
        }
    }

    /// Fraction of the subtotal taken off.
    pub fn rate(&self) -> Decimal {
        match self {
            BundleTier::None => Decimal::ZERO,
            BundleTier::Pair => Decimal::new(5, 2),
            BundleTier::Suite => Decimal::new(10, 2),
        }
    }

    /// The next better tier and how many more modules reach it.
    ///
    /// Drives the "add one more module to save 10%" hint.
    pub fn next(&self, count: usize) -> Option<(BundleTier, usize)> {
        match self {
            BundleTier::None => Some((BundleTier::Pair, 2usize.saturating_sub(count))),
            BundleTier::Pair => Some((BundleTier::Suite, 1)),
            BundleTier::Suite => None,
        }
    }
}

/// Bundle discount for the selected modules.
///
/// ## Example
/// ```rust
/// use hms_core::discount::bundle_discount;
/// use hms_core::money::Money;
/// use hms_core::types::{BillingCycle, Module, PricingMode};
///
/// let a = Module::new("a", "A", Money::from_dollars(60), "Clinical", BillingCycle::Monthly);
/// let b = Module::new("b", "B", Money::from_dollars(40), "Clinical", BillingCycle::Monthly);
///
/// let discount = bundle_discount(&[&a, &b], PricingMode::Customer);
/// assert_eq!(discount, Money::from_dollars(5));
/// assert_eq!(bundle_discount(&[&a, &b], PricingMode::Distributor), Money::ZERO);
/// ```
pub fn bundle_discount(selected: &[&Module], mode: PricingMode) -> Money {
    if mode == PricingMode::Distributor {
        return Money::ZERO;
    }

    let subtotal: Money = selected.iter().map(|m| m.price).sum();
    subtotal * BundleTier::for_count(selected.len()).rate()
}

// =============================================================================
// Unit Tests
// =============================================================================
