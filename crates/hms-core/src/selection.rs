//! # Selections
//!
//! What the buyer has picked so far.
//!
//! - Customer mode: a set of module ids (`ModuleSelection`)
//! - Distributor mode: at most one plan id (`PlanSelection`)
//!
//! Selections only hold ids. They are resolved against a
//! [`Catalog`](crate::catalog::Catalog) when priced, always in catalog
//! order, so the same set prices and quotes identically no matter in which
//! order it was clicked together.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::catalog::Catalog;
use crate::error::CoreResult;
use crate::types::{DistributorPlan, Module, PricingMode};

// =============================================================================
// Module Selection
// =============================================================================

/// Set of selected module ids (customer mode).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSelection {
    ids: BTreeSet<String>,
}

impl ModuleSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module. Returns `false` if it was already selected.
    pub fn select(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    /// Removes a module. Returns `false` if it was not selected.
    pub fn deselect(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    /// Flips a module. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Resolves ids to catalog modules, in catalog order.
    ///
    /// ## Errors
    /// `UnknownModule` if any id is not in the catalog.
    pub fn resolve<'c>(&self, catalog: &'c Catalog) -> CoreResult<Vec<&'c Module>> {
        for id in &self.ids {
            catalog.module(id)?;
        }
        Ok(catalog
            .modules()
            .iter()
            .filter(|m| self.ids.contains(&m.id))
            .collect())
    }
}

impl<S: Into<String>> FromIterator<S> for ModuleSelection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        ModuleSelection {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// =============================================================================
// Plan Selection
// =============================================================================

/// The single selected plan id, if any (distributor mode).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSelection {
    id: Option<String>,
}

impl PlanSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a plan, replacing any previous one.
    pub fn select(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn clear(&mut self) {
        self.id = None;
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none()
    }

    pub fn resolve<'c>(&self, catalog: &'c Catalog) -> CoreResult<Option<&'c DistributorPlan>> {
        self.id.as_deref().map(|id| catalog.plan(id)).transpose()
    }
}

// =============================================================================
// Selection
// =============================================================================

/// A selection in either mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Selection {
    Customer(ModuleSelection),
    Distributor(PlanSelection),
}

impl Selection {
    /// Empty selection for a mode.
    pub fn empty(mode: PricingMode) -> Self {
        match mode {
            PricingMode::Customer => Selection::Customer(ModuleSelection::new()),
            PricingMode::Distributor => Selection::Distributor(PlanSelection::new()),
        }
    }

    pub fn mode(&self) -> PricingMode {
        match self {
            Selection::Customer(_) => PricingMode::Customer,
            Selection::Distributor(_) => PricingMode::Distributor,
        }
    }

    /// True when nothing is selected.
    ///
    /// Quote download and checkout are disabled while this holds.
    pub fn is_empty(&self) -> bool {
        match self {
            Selection::Customer(modules) => modules.is_empty(),
            Selection::Distributor(plan) => plan.is_empty(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
