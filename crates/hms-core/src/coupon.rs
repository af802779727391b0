//! # Coupons
//!
//! Typed coupon lookup: `CouponCode -> DiscountRate`.
//!
//! ## Apply Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  user types " welcome10 "                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CouponCode::parse ── blank? ──────────────► CouponError::EmptyCode     │
//! │       │ "WELCOME10"                                                     │
//! │       ▼                                                                 │
//! │  CouponTable::lookup ── not present? ──────► CouponError::InvalidCode   │
//! │       │ 0.10                                                            │
//! │       ▼                                                                 │
//! │  AppliedCoupon { code, rate, discount = base × rate }                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two disjoint tables exist (customer promo codes, distributor codes). They
//! share this type; the [`Catalog`](crate::catalog::Catalog) picks the table
//! for the active [`PricingMode`](crate::types::PricingMode).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use ts_rs::TS;

use crate::error::{CouponError, ValidationError};
use crate::money::Money;
use crate::types::DiscountRate;

// =============================================================================
// Coupon Code
// =============================================================================

/// A normalized (trimmed, upper-cased) coupon code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "String", into = "String")]
#[ts(export)]
pub struct CouponCode(String);

impl CouponCode {
    /// Normalizes raw user input.
    ///
    /// ## Example
    /// ```rust
    /// use hms_core::coupon::CouponCode;
    ///
    /// assert_eq!(CouponCode::parse(" dist10 ").unwrap().as_str(), "DIST10");
    /// assert!(CouponCode::parse("   ").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, CouponError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CouponError::EmptyCode);
        }
        Ok(CouponCode(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CouponCode {
    type Error = CouponError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        CouponCode::parse(&raw)
    }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> Self {
        code.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Applied Coupon
// =============================================================================

/// A coupon that passed lookup, with the discount it produced.
///
/// `discount` is the amount computed at apply time. Sessions running the
/// frozen policy keep it as-is when the selection changes later; see
/// [`AppliedCoupon::rebase`] for the recomputing alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppliedCoupon {
    pub code: CouponCode,
    pub rate: DiscountRate,
    pub discount: Money,
}

impl AppliedCoupon {
    /// Recomputes the discount from a new base with the same rate.
    pub fn rebase(&self, base: Money) -> AppliedCoupon {
        AppliedCoupon {
            code: self.code.clone(),
            rate: self.rate,
            discount: base.portion(self.rate),
        }
    }
}

// =============================================================================
// Coupon Table
// =============================================================================

/// Static mapping of coupon codes to discount rates.
///
/// ## Config Format
/// Deserializes from a plain map, keys in any case:
/// ```toml
/// [catalog.customer_coupons]
/// welcome10 = "0.10"
/// HEALTH20 = "0.20"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Decimal>",
    into = "BTreeMap<String, Decimal>"
)]
pub struct CouponTable {
    rates: HashMap<CouponCode, DiscountRate>,
}

impl CouponTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a code, builder style.
    ///
    /// ## Example
    /// ```rust
    /// use hms_core::coupon::CouponTable;
    /// use hms_core::types::DiscountRate;
    ///
    /// let table = CouponTable::new()
    ///     .with_code("WELCOME10", DiscountRate::from_percent(10).unwrap())
    ///     .unwrap();
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn with_code(mut self, code: &str, rate: DiscountRate) -> Result<Self, ValidationError> {
        self.insert(code, rate)?;
        Ok(self)
    }

    /// Adds a code. Codes differing only by case count as duplicates.
    pub fn insert(&mut self, code: &str, rate: DiscountRate) -> Result<(), ValidationError> {
        let code = CouponCode::parse(code).map_err(|_| ValidationError::Required {
            field: "coupon code".to_string(),
        })?;
        if self.rates.contains_key(&code) {
            return Err(ValidationError::Duplicate {
                field: "coupon code".to_string(),
                value: code.0,
            });
        }
        self.rates.insert(code, rate);
        Ok(())
    }

    /// Looks up the rate for raw user input.
    ///
    /// ## Errors
    /// - `EmptyCode` for blank input
    /// - `InvalidCode` when the normalized code is not in the table
    pub fn lookup(&self, raw: &str) -> Result<(CouponCode, DiscountRate), CouponError> {
        let code = CouponCode::parse(raw)?;
        match self.rates.get(&code) {
            Some(rate) => Ok((code, *rate)),
            None => Err(CouponError::InvalidCode { code: code.0 }),
        }
    }

    /// Validates a code and computes its discount on `base`.
    ///
    /// `base` is `subtotal - bundle_discount` for customers and the raw plan
    /// price for distributors.
    pub fn apply(&self, raw: &str, base: Money) -> Result<AppliedCoupon, CouponError> {
        let (code, rate) = self.lookup(raw)?;
        Ok(AppliedCoupon {
            code,
            rate,
            discount: base.portion(rate),
        })
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.lookup(raw).is_ok()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Codes in alphabetical order.
    pub fn codes(&self) -> Vec<(&CouponCode, DiscountRate)> {
        let mut codes: Vec<_> = self.rates.iter().map(|(c, r)| (c, *r)).collect();
        codes.sort_by(|a, b| a.0.cmp(b.0));
        codes
    }
}

impl TryFrom<BTreeMap<String, Decimal>> for CouponTable {
    type Error = ValidationError;

    fn try_from(raw: BTreeMap<String, Decimal>) -> Result<Self, Self::Error> {
        let mut table = CouponTable::new();
        for (code, rate) in raw {
            table.insert(&code, DiscountRate::new(rate)?)?;
        }
        Ok(table)
    }
}

impl From<CouponTable> for BTreeMap<String, Decimal> {
    fn from(table: CouponTable) -> Self {
        table
            .rates
            .into_iter()
            .map(|(code, rate)| (code.0, rate.value()))
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
