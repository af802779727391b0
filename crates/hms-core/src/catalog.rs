//! # Catalog
//!
//! Immutable snapshot of everything the marketplace sells.
//!
//! ## Snapshot Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Catalog v1 ──with_module(telehealth)──► Catalog v2                     │
//! │     │                                       │                           │
//! │     │ (still valid, unchanged)              │ (v1 modules + telehealth) │
//! │     ▼                                       ▼                           │
//! │  sessions priced against v1           new sessions priced against v2    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sessions hold the catalog behind an `Arc`, so a running session never sees
//! entries appear or disappear underneath it.

use std::collections::HashSet;

use crate::coupon::CouponTable;
use crate::error::{CoreError, CoreResult};
use crate::types::{DistributorPlan, Module, PricingMode};
use crate::validation::{validate_amount, validate_identifier, validate_text};

/// Modules, distributor plans and both coupon tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    modules: Vec<Module>,
    plans: Vec<DistributorPlan>,
    customer_coupons: CouponTable,
    distributor_coupons: CouponTable,
}

impl Catalog {
    /// Validates and builds a catalog.
    ///
    /// ## Errors
    /// - `Validation` for blank ids/titles or negative prices
    /// - `DuplicateId` when two modules (or two plans) share an id
    pub fn new(
        modules: Vec<Module>,
        plans: Vec<DistributorPlan>,
        customer_coupons: CouponTable,
        distributor_coupons: CouponTable,
    ) -> CoreResult<Self> {
        let mut seen = HashSet::new();
        for module in &modules {
            validate_module(module)?;
            if !seen.insert(module.id.as_str()) {
                return Err(CoreError::DuplicateId {
                    kind: "module",
                    id: module.id.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for plan in &plans {
            validate_plan(plan)?;
            if !seen.insert(plan.id.as_str()) {
                return Err(CoreError::DuplicateId {
                    kind: "plan",
                    id: plan.id.clone(),
                });
            }
        }

        Ok(Catalog {
            modules,
            plans,
            customer_coupons,
            distributor_coupons,
        })
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn plans(&self) -> &[DistributorPlan] {
        &self.plans
    }

    pub fn module(&self, id: &str) -> CoreResult<&Module> {
        self.modules
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| CoreError::UnknownModule(id.to_string()))
    }

    pub fn plan(&self, id: &str) -> CoreResult<&DistributorPlan> {
        self.plans
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::UnknownPlan(id.to_string()))
    }

    /// Categories in first-seen catalog order.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for module in &self.modules {
            if !categories.contains(&module.category.as_str()) {
                categories.push(&module.category);
            }
        }
        categories
    }

    /// Modules in a category (case-insensitive match).
    pub fn modules_in(&self, category: &str) -> impl Iterator<Item = &Module> {
        let category = category.to_lowercase();
        self.modules
            .iter()
            .filter(move |m| m.category.to_lowercase() == category)
    }

    /// Coupon table for a pricing mode.
    pub fn coupons(&self, mode: PricingMode) -> &CouponTable {
        match mode {
            PricingMode::Customer => &self.customer_coupons,
            PricingMode::Distributor => &self.distributor_coupons,
        }
    }

    // =========================================================================
    // New Snapshots
    // =========================================================================

    /// Returns a new catalog with one more module. `self` is untouched.
    pub fn with_module(&self, module: Module) -> CoreResult<Catalog> {
        let mut modules = self.modules.clone();
        modules.push(module);
        Catalog::new(
            modules,
            self.plans.clone(),
            self.customer_coupons.clone(),
            self.distributor_coupons.clone(),
        )
    }

    /// Returns a new catalog with one more distributor plan.
    pub fn with_plan(&self, plan: DistributorPlan) -> CoreResult<Catalog> {
        let mut plans = self.plans.clone();
        plans.push(plan);
        Catalog::new(
            self.modules.clone(),
            plans,
            self.customer_coupons.clone(),
            self.distributor_coupons.clone(),
        )
    }
}

fn validate_module(module: &Module) -> CoreResult<()> {
    validate_identifier("module id", &module.id)?;
    validate_text("module title", &module.title)?;
    validate_text("module category", &module.category)?;
    validate_amount("module price", module.price)?;
    Ok(())
}

fn validate_plan(plan: &DistributorPlan) -> CoreResult<()> {
    validate_identifier("plan id", &plan.id)?;
    validate_text("plan name", &plan.name)?;
    validate_amount("plan price", plan.price)?;
    validate_amount("plan down payment", plan.down_payment)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::money::Money;
    use crate::types::BillingCycle;

    fn module(id: &str, category: &str) -> Module {
        Module::new(id, id.to_uppercase(), Money::from_dollars(10), category, BillingCycle::Monthly)
    }

    fn plan(id: &str) -> DistributorPlan {
        DistributorPlan {
            id: id.to_string(),
            name: id.to_string(),
            price: Money::from_dollars(100),
            down_payment: Money::from_dollars(300),
            features: vec![],
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(
            vec![module("emr", "Clinical"), module("billing", "Finance"), module("lab", "clinical")],
            vec![plan("starter")],
            CouponTable::new(),
            CouponTable::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_lookup() {
        let catalog = catalog();
        assert_eq!(catalog.module("lab").unwrap().title, "LAB");
        assert_eq!(catalog.plan("starter").unwrap().name, "starter");
        assert_eq!(
            catalog.module("nope").unwrap_err(),
            CoreError::UnknownModule("nope".to_string())
        );
        assert!(matches!(catalog.plan("nope"), Err(CoreError::UnknownPlan(_))));
    }

    #[test]
    fn test_duplicate_module_id_rejected() {
        let err = Catalog::new(
            vec![module("emr", "Clinical"), module("emr", "Finance")],
            vec![],
            CouponTable::new(),
            CouponTable::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CoreError::DuplicateId {
                kind: "module",
                id: "emr".to_string()
            }
        );
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut bad = module("emr", "Clinical");
        bad.price = Money::from_cents(-1);
        let err = Catalog::new(vec![bad], vec![], CouponTable::new(), CouponTable::new())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn test_oversized_amounts_rejected() {
        let mut a = module("a", "Clinical");
        let mut b = module("b", "Clinical");
        a.price = Money::from_decimal(rust_decimal::Decimal::MAX);
        b.price = Money::from_decimal(rust_decimal::Decimal::MAX);
        let err = Catalog::new(vec![a, b], vec![], CouponTable::new(), CouponTable::new())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));

        let mut big = plan("whale");
        big.down_payment = Money::from_dollars(crate::validation::MAX_AMOUNT_DOLLARS + 1);
        assert!(Catalog::new(vec![], vec![big], CouponTable::new(), CouponTable::new()).is_err());
    }

    #[test]
    fn test_ids_with_surrounding_whitespace_rejected() {
        let padded = module(" billing", "Finance");
        assert!(Catalog::new(vec![padded], vec![], CouponTable::new(), CouponTable::new()).is_err());
    }

    #[test]
    fn test_categories_and_filter() {
        let catalog = catalog();
        assert_eq!(catalog.categories(), vec!["Clinical", "Finance", "clinical"]);
        let clinical: Vec<&str> = catalog.modules_in("CLINICAL").map(|m| m.id.as_str()).collect();
        assert_eq!(clinical, vec!["emr", "lab"]);
    }

    #[test]
    fn test_with_module_returns_new_snapshot() {
        let v1 = catalog();
        let v2 = v1.with_module(module("telehealth", "Clinical")).unwrap();

        assert_eq!(v1.modules().len(), 3);
        assert_eq!(v2.modules().len(), 4);
        assert!(v1.module("telehealth").is_err());
        assert!(v2.module("telehealth").is_ok());

        assert!(v2.with_module(module("emr", "Clinical")).is_err());
    }

    #[test]
    fn test_with_plan_returns_new_snapshot() {
        let v1 = catalog();
        let v2 = v1.with_plan(plan("enterprise")).unwrap();
        assert_eq!(v1.plans().len(), 1);
        assert_eq!(v2.plans().len(), 2);
    }
}
