//! # Pricing
//!
//! Assembles subtotal, discounts and totals into a [`PricingResult`].
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CUSTOMER                              DISTRIBUTOR                      │
//! │                                                                         │
//! │  subtotal = Σ module.price             subtotal = plan.price            │
//! │      │                                     │                            │
//! │      ├─► bundle = subtotal × tier          ├─► bundle = 0               │
//! │      │                                     │                            │
//! │      ├─► coupon base = subtotal - bundle   ├─► coupon base = plan.price │
//! │      │   coupon = base × rate              │   coupon = base × rate     │
//! │      │                                     │                            │
//! │      ▼                                     ▼                            │
//! │  total = subtotal - bundle - coupon    total = subtotal - coupon        │
//! │                                        initial = total + down_payment   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each discount is computed from its own base; they never compound. The
//! total is not clamped: a stale coupon can push it below zero, which
//! [`PricingResult::is_credit`] reports.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::coupon::{AppliedCoupon, CouponCode};
use crate::discount::{bundle_discount, BundleTier};
use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::selection::{ModuleSelection, PlanSelection, Selection};
use crate::types::{Module, PricingMode};

// =============================================================================
// Pricing Result
// =============================================================================

/// Derived pricing figures for one selection state.
///
/// Recomputed on every selection, coupon or mode change. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingResult {
    pub mode: PricingMode,
    pub subtotal: Money,
    pub bundle_discount: Money,
    pub coupon_discount: Money,
    pub total: Money,
    pub applied_coupon: Option<CouponCode>,
    /// Distributor only: `total + down_payment`.
    pub initial_payment: Option<Money>,
}

impl PricingResult {
    /// All-zero result for an empty selection.
    pub fn empty(mode: PricingMode) -> Self {
        PricingResult {
            mode,
            subtotal: Money::ZERO,
            bundle_discount: Money::ZERO,
            coupon_discount: Money::ZERO,
            total: Money::ZERO,
            applied_coupon: None,
            initial_payment: None,
        }
    }

    /// Sum of both discounts.
    pub fn total_discount(&self) -> Money {
        self.bundle_discount + self.coupon_discount
    }

    /// True when discounts exceed the subtotal.
    pub fn is_credit(&self) -> bool {
        self.total.is_negative()
    }

    /// What a payment collaborator should actually charge.
    ///
    /// Initial payment for distributors, total for customers, never below
    /// zero.
    pub fn amount_due(&self) -> Money {
        self.initial_payment.unwrap_or(self.total).non_negative()
    }
}

// =============================================================================
// Assembler
// =============================================================================

/// Assembles a result from already computed figures.
///
/// `down_payment` only produces an initial payment in distributor mode.
pub fn compute_totals(
    mode: PricingMode,
    subtotal: Money,
    bundle_discount: Money,
    coupon: Option<&AppliedCoupon>,
    down_payment: Option<Money>,
) -> PricingResult {
    let coupon_discount = coupon.map_or(Money::ZERO, |c| c.discount);
    let total = subtotal - bundle_discount - coupon_discount;

    let initial_payment = match mode {
        PricingMode::Distributor => down_payment.map(|down| total + down),
        PricingMode::Customer => None,
    };

    PricingResult {
        mode,
        subtotal,
        bundle_discount,
        coupon_discount,
        total,
        applied_coupon: coupon.map(|c| c.code.clone()),
        initial_payment,
    }
}

/// Sum of the selected module prices.
fn modules_subtotal(modules: &[&Module]) -> CoreResult<Money> {
    Money::checked_sum(modules.iter().map(|m| m.price)).ok_or_else(|| {
        ValidationError::OutOfRange {
            field: "subtotal".to_string(),
            min: "0".to_string(),
            max: Decimal::MAX.to_string(),
        }
        .into()
    })
}

/// Base the coupon rate applies to for a customer selection.
pub fn customer_coupon_base(catalog: &Catalog, selection: &ModuleSelection) -> CoreResult<Money> {
    let modules = selection.resolve(catalog)?;
    let subtotal = modules_subtotal(&modules)?;
    Ok(subtotal - bundle_discount(&modules, PricingMode::Customer))
}

/// Base the coupon rate applies to for a distributor selection.
pub fn distributor_coupon_base(catalog: &Catalog, selection: &PlanSelection) -> CoreResult<Money> {
    Ok(selection
        .resolve(catalog)?
        .map_or(Money::ZERO, |plan| plan.price))
}

/// Base for whichever mode the selection is in.
pub fn coupon_base(catalog: &Catalog, selection: &Selection) -> CoreResult<Money> {
    match selection {
        Selection::Customer(modules) => customer_coupon_base(catalog, modules),
        Selection::Distributor(plan) => distributor_coupon_base(catalog, plan),
    }
}

/// Prices a customer module selection.
///
/// `coupon` is taken as-is: its `discount` is whatever was computed when it
/// was applied.
///
/// ## Example
/// ```rust
/// use hms_core::catalog::Catalog;
/// use hms_core::coupon::CouponTable;
/// use hms_core::money::Money;
/// use hms_core::pricing::price_customer;
/// use hms_core::selection::ModuleSelection;
/// use hms_core::types::{BillingCycle, DiscountRate, Module};
///
/// let modules = vec![
///     Module::new("a", "A", Money::from_dollars(10), "Clinical", BillingCycle::Monthly),
///     Module::new("b", "B", Money::from_dollars(40), "Clinical", BillingCycle::Monthly),
///     Module::new("c", "C", Money::from_dollars(50), "Clinical", BillingCycle::Monthly),
/// ];
/// let coupons = CouponTable::new()
///     .with_code("WELCOME10", DiscountRate::from_percent(10).unwrap())
///     .unwrap();
/// let catalog = Catalog::new(modules, vec![], coupons, CouponTable::new()).unwrap();
///
/// let selection: ModuleSelection = ["a", "b", "c"].into_iter().collect();
/// let coupon = catalog.coupons(hms_core::PricingMode::Customer)
///     .apply("welcome10", Money::from_dollars(90))
///     .unwrap();
///
/// let result = price_customer(&catalog, &selection, Some(&coupon)).unwrap();
/// assert_eq!(result.bundle_discount, Money::from_dollars(10));
/// assert_eq!(result.coupon_discount, Money::from_dollars(9));
/// assert_eq!(result.total, Money::from_dollars(81));
/// ```
pub fn price_customer(
    catalog: &Catalog,
    selection: &ModuleSelection,
    coupon: Option<&AppliedCoupon>,
) -> CoreResult<PricingResult> {
    let modules = selection.resolve(catalog)?;
    let subtotal = modules_subtotal(&modules)?;
    let bundle = bundle_discount(&modules, PricingMode::Customer);
    Ok(compute_totals(
        PricingMode::Customer,
        subtotal,
        bundle,
        coupon,
        None,
    ))
}

/// Prices a distributor plan selection.
///
/// With no plan selected the result is all zero and has no initial payment.
pub fn price_distributor(
    catalog: &Catalog,
    selection: &PlanSelection,
    coupon: Option<&AppliedCoupon>,
) -> CoreResult<PricingResult> {
    match selection.resolve(catalog)? {
        Some(plan) => Ok(compute_totals(
            PricingMode::Distributor,
            plan.price,
            Money::ZERO,
            coupon,
            Some(plan.down_payment),
        )),
        None => Ok(compute_totals(
            PricingMode::Distributor,
            Money::ZERO,
            Money::ZERO,
            coupon,
            None,
        )),
    }
}

/// Prices a selection in whichever mode it is in.
pub fn price(
    catalog: &Catalog,
    selection: &Selection,
    coupon: Option<&AppliedCoupon>,
) -> CoreResult<PricingResult> {
    match selection {
        Selection::Customer(modules) => price_customer(catalog, modules, coupon),
        Selection::Distributor(plan) => price_distributor(catalog, plan, coupon),
    }
}

/// Bundle tier a customer selection currently sits in.
pub fn bundle_tier(selection: &ModuleSelection) -> BundleTier {
    BundleTier::for_count(selection.len())
}

// =============================================================================
// Unit Tests
// =============================================================================
