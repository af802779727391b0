//! # Seed Catalog
//!
//! The built-in marketplace catalog used when no `[catalog]` section is
//! configured.
//!
//! ## Contents
//! - Modules across Clinical, Finance, Operations and Insights
//! - Starter / Professional / Enterprise distributor plans
//! - Customer codes: `WELCOME10`, `HEALTH20`, `CLINIC15`
//! - Distributor codes: `DIST10`, `PARTNER15`, `RESELLER20`

use crate::catalog::Catalog;
use crate::coupon::CouponTable;
use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{BillingCycle, DiscountRate, DistributorPlan, Module, PlanFeature};

/// `(id, title, cents, category, cycle)`
const MODULES: &[(&str, &str, i64, &str, BillingCycle)] = &[
    ("patient-records", "Electronic Patient Records", 4999, "Clinical", BillingCycle::Monthly),
    ("appointments", "Appointment Scheduling", 2999, "Clinical", BillingCycle::Monthly),
    ("lab-results", "Laboratory Results", 3999, "Clinical", BillingCycle::Monthly),
    ("pharmacy", "Pharmacy & Prescriptions", 4499, "Clinical", BillingCycle::Monthly),
    ("telemedicine", "Telemedicine Consultations", 5999, "Clinical", BillingCycle::Monthly),
    ("billing", "Billing & Invoicing", 3499, "Finance", BillingCycle::Monthly),
    ("insurance-claims", "Insurance Claims", 54999, "Finance", BillingCycle::Yearly),
    ("inventory", "Medical Inventory", 2499, "Operations", BillingCycle::Monthly),
    ("staff-rostering", "Staff Rostering", 1999, "Operations", BillingCycle::Monthly),
    ("analytics", "Hospital Analytics", 89999, "Insights", BillingCycle::Biennial),
];

const PLAN_FEATURES: &[&str] = &[
    "Marketplace listing",
    "Partner dashboard",
    "Dedicated account manager",
    "White labelling",
    "API access",
];

/// `(id, name, price cents, down payment cents, features included)`
const PLANS: &[(&str, &str, i64, i64, usize)] = &[
    ("starter", "Starter", 19999, 49999, 2),
    ("professional", "Professional", 49999, 149999, 3),
    ("enterprise", "Enterprise", 99999, 299999, 5),
];

const CUSTOMER_COUPONS: &[(&str, u32)] = &[("WELCOME10", 10), ("HEALTH20", 20), ("CLINIC15", 15)];

const DISTRIBUTOR_COUPONS: &[(&str, u32)] = &[("DIST10", 10), ("PARTNER15", 15), ("RESELLER20", 20)];

/// Seed modules in display order.
pub fn default_modules() -> Vec<Module> {
    MODULES
        .iter()
        .map(|&(id, title, cents, category, cycle)| {
            Module::new(id, title, Money::from_cents(cents), category, cycle)
        })
        .collect()
}

/// Seed plans, cheapest first. Each tier includes more of the feature list.
pub fn default_plans() -> Vec<DistributorPlan> {
    PLANS
        .iter()
        .map(|&(id, name, price, down, included)| DistributorPlan {
            id: id.to_string(),
            name: name.to_string(),
            price: Money::from_cents(price),
            down_payment: Money::from_cents(down),
            features: PLAN_FEATURES
                .iter()
                .enumerate()
                .map(|(i, feature)| {
                    if i < included {
                        PlanFeature::included(*feature)
                    } else {
                        PlanFeature::excluded(*feature)
                    }
                })
                .collect(),
        })
        .collect()
}

fn coupon_table(codes: &[(&str, u32)]) -> CoreResult<CouponTable> {
    let mut table = CouponTable::new();
    for &(code, percent) in codes {
        table.insert(code, DiscountRate::from_percent(percent)?)?;
    }
    Ok(table)
}

pub fn default_customer_coupons() -> CoreResult<CouponTable> {
    coupon_table(CUSTOMER_COUPONS)
}

pub fn default_distributor_coupons() -> CoreResult<CouponTable> {
    coupon_table(DISTRIBUTOR_COUPONS)
}

/// The complete seed catalog.
///
/// ## Example
/// ```rust
/// use hms_core::seed::default_catalog;
/// use hms_core::PricingMode;
///
/// let catalog = default_catalog().unwrap();
/// assert!(catalog.coupons(PricingMode::Customer).contains("welcome10"));
/// assert!(!catalog.coupons(PricingMode::Customer).contains("DIST10"));
/// ```
pub fn default_catalog() -> CoreResult<Catalog> {
    Catalog::new(
        default_modules(),
        default_plans(),
        default_customer_coupons()?,
        default_distributor_coupons()?,
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
