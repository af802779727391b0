//! # Domain Types
//!
//! Catalog entries and small value types used throughout the pricing engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Module      │   │ DistributorPlan │   │  DiscountRate   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  0 < rate < 1   │       │
//! │  │  title          │   │  name           │   │  0.10 = 10%     │       │
//! │  │  price          │   │  price          │   └─────────────────┘       │
//! │  │  category       │   │  down_payment   │                              │
//! │  │  billing_cycle  │   │  features[]     │   ┌─────────────────┐       │
//! │  └─────────────────┘   └─────────────────┘   │  PricingMode    │       │
//! │                                              │  Customer       │       │
//! │  ┌─────────────────┐                         │  Distributor    │       │
//! │  │  BillingCycle   │                         └─────────────────┘       │
//! │  │  Monthly/Yearly │                                                    │
//! │  │  Biennial       │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Catalog entries are immutable once loaded. Adding a module produces a new
//! [`Catalog`](crate::catalog::Catalog) snapshot instead of editing one in place.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Discount Rate
// =============================================================================

/// A fractional discount rate, strictly between 0 and 1.
///
/// ## Why a newtype?
/// Coupon tables are typed `code -> DiscountRate`, so a rate of `10` (meant
/// as percent) or `1.5` can never reach the pricing math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "Decimal", into = "Decimal")]
#[ts(export)]
pub struct DiscountRate(#[ts(type = "string")] Decimal);

impl DiscountRate {
    /// Creates a rate from a fraction (`0.10` = 10%).
    ///
    /// ## Example
    /// ```rust
    /// use hms_core::types::DiscountRate;
    /// use rust_decimal::Decimal;
    ///
    /// assert!(DiscountRate::new(Decimal::new(10, 2)).is_ok());
    /// assert!(DiscountRate::new(Decimal::ONE).is_err());
    /// assert!(DiscountRate::new(Decimal::ZERO).is_err());
    /// ```
    pub fn new(rate: Decimal) -> Result<Self, ValidationError> {
        if rate <= Decimal::ZERO || rate >= Decimal::ONE {
            return Err(ValidationError::OutOfRange {
                field: "discount_rate".to_string(),
                min: "0".to_string(),
                max: "1".to_string(),
            });
        }
        Ok(DiscountRate(rate))
    }

    /// Creates a rate from whole percent (`15` = 15%).
    pub fn from_percent(percent: u32) -> Result<Self, ValidationError> {
        Self::new(Decimal::new(i64::from(percent), 2))
    }

    /// Returns the fraction.
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the rate as percent (for display only).
    pub fn percent(&self) -> Decimal {
        (self.0 * Decimal::ONE_HUNDRED).normalize()
    }
}

impl TryFrom<Decimal> for DiscountRate {
    type Error = ValidationError;

    fn try_from(rate: Decimal) -> Result<Self, Self::Error> {
        DiscountRate::new(rate)
    }
}

impl From<DiscountRate> for Decimal {
    fn from(rate: DiscountRate) -> Self {
        rate.0
    }
}

impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

// =============================================================================
// Pricing Mode
// =============================================================================

/// Who is buying: a direct customer picking modules, or a distributor
/// signing up for a reseller plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// Direct customer buying individual modules.
    #[default]
    Customer,
    /// Reseller buying one distributor plan.
    Distributor,
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingMode::Customer => write!(f, "customer"),
            PricingMode::Distributor => write!(f, "distributor"),
        }
    }
}

impl FromStr for PricingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" | "direct" => Ok(PricingMode::Customer),
            "distributor" | "reseller" => Ok(PricingMode::Distributor),
            _ => Err(ValidationError::NotAllowed {
                field: "mode".to_string(),
                allowed: vec!["customer".to_string(), "distributor".to_string()],
            }),
        }
    }
}

// =============================================================================
// Billing Cycle
// =============================================================================

/// How often a module is billed.
///
/// The cycle is carried through to the quote for display. It does not
/// change any pricing rule: `price` is already the per-cycle amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
    Biennial,
}

impl BillingCycle {
    /// Number of months covered by one billing period.
    pub const fn months(&self) -> u32 {
        match self {
            BillingCycle::Monthly => 1,
            BillingCycle::Yearly => 12,
            BillingCycle::Biennial => 24,
        }
    }

    /// Suffix used next to prices, e.g. `$49.00/mo`.
    pub const fn price_suffix(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "/mo",
            BillingCycle::Yearly => "/yr",
            BillingCycle::Biennial => "/2yr",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillingCycle::Monthly => write!(f, "monthly"),
            BillingCycle::Yearly => write!(f, "yearly"),
            BillingCycle::Biennial => write!(f, "biennial"),
        }
    }
}

// =============================================================================
// Module
// =============================================================================

/// A purchasable feature unit for direct customers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Module {
    /// Unique catalog identifier (e.g. `"patient-records"`).
    pub id: String,

    /// Display title.
    pub title: String,

    /// Price per billing cycle.
    pub price: Money,

    /// Marketplace category (e.g. `"Clinical"`).
    pub category: String,

    #[serde(default)]
    pub billing_cycle: BillingCycle,
}

impl Module {
    /// Convenience constructor used by seed data and tests.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        price: Money,
        category: impl Into<String>,
        billing_cycle: BillingCycle,
    ) -> Self {
        Module {
            id: id.into(),
            title: title.into(),
            price,
            category: category.into(),
            billing_cycle,
        }
    }
}

// =============================================================================
// Distributor Plan
// =============================================================================

/// One line of a plan's feature matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlanFeature {
    pub name: String,
    pub included: bool,
}

impl PlanFeature {
    pub fn included(name: impl Into<String>) -> Self {
        PlanFeature {
            name: name.into(),
            included: true,
        }
    }

    pub fn excluded(name: impl Into<String>) -> Self {
        PlanFeature {
            name: name.into(),
            included: false,
        }
    }
}

/// A tiered reseller subscription with a one-time down payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DistributorPlan {
    /// Unique catalog identifier (e.g. `"professional"`).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Recurring plan price.
    pub price: Money,

    /// One-time amount due on sign-up, on top of the first period.
    pub down_payment: Money,

    #[serde(default)]
    pub features: Vec<PlanFeature>,
}

impl DistributorPlan {
    /// Names of the features this plan includes.
    pub fn included_features(&self) -> impl Iterator<Item = &str> {
        self.features
            .iter()
            .filter(|f| f.included)
            .map(|f| f.name.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
