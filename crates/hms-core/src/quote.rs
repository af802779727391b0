//! # Quote Payloads
//!
//! Snapshots a priced selection into a [`QuotePayload`] for the external
//! document renderer.
//!
//! ## Build Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Selection + PricingResult + QuoteParty                                 │
//! │       │                                                                 │
//! │       ├── nothing selected? ─────────────► CoreError::NoSelection       │
//! │       ├── party/result in other mode? ───► CoreError::ModeMismatch      │
//! │       ├── party.validate() ──────────────► CoreError::Validation        │
//! │       ▼                                                                 │
//! │  resolve lines (modules or plan, copied verbatim from the catalog)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  quote_number = Q-20250314-4821  /  DQ-20250314-1007                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  QuotePayload ──► renderer (not retained here)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quote Numbers
//! The suffix is four digits in `1000..=9999`. The default random scheme can
//! repeat a number; [`SequentialQuoteNumbers`] cycles through the range and
//! never repeats within 9000 quotes of one process.

use chrono::{DateTime, Days, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::coupon::CouponCode;
use crate::discount::bundle_discount;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{compute_totals, PricingResult};
use crate::selection::Selection;
use crate::types::{DistributorPlan, Module, PricingMode};
use crate::validation::{validate_email, validate_text};
use crate::{QUOTE_SUFFIX_MAX, QUOTE_SUFFIX_MIN, QUOTE_VALIDITY_DAYS};

// =============================================================================
// Quote Numbers
// =============================================================================

/// Source of the four-digit quote number suffix.
pub trait QuoteNumberGenerator: Send + Sync {
    /// Next suffix, always within `1000..=9999`.
    fn next_suffix(&self) -> u16;
}

/// Uniformly random suffixes. Collisions are possible.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomQuoteNumbers;

impl QuoteNumberGenerator for RandomQuoteNumbers {
    fn next_suffix(&self) -> u16 {
        rand::thread_rng().gen_range(QUOTE_SUFFIX_MIN..=QUOTE_SUFFIX_MAX)
    }
}

/// Monotonic suffixes starting at 1000, wrapping after 9999.
#[derive(Debug, Default)]
pub struct SequentialQuoteNumbers {
    issued: AtomicU32,
}

impl SequentialQuoteNumbers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continues after a previously issued suffix.
    pub fn starting_after(suffix: u16) -> Self {
        let offset = u32::from(suffix.clamp(QUOTE_SUFFIX_MIN, QUOTE_SUFFIX_MAX) - QUOTE_SUFFIX_MIN) + 1;
        SequentialQuoteNumbers {
            issued: AtomicU32::new(offset),
        }
    }
}

impl QuoteNumberGenerator for SequentialQuoteNumbers {
    fn next_suffix(&self) -> u16 {
        let span = u32::from(QUOTE_SUFFIX_MAX - QUOTE_SUFFIX_MIN) + 1;
        let n = self.issued.fetch_add(1, Ordering::Relaxed) % span;
        // n < 9000, fits in u16
        QUOTE_SUFFIX_MIN + n as u16
    }
}

/// Which generator a configuration asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum QuoteNumberScheme {
    #[default]
    Random,
    Sequential,
}

impl QuoteNumberScheme {
    pub fn generator(&self) -> Box<dyn QuoteNumberGenerator> {
        match self {
            QuoteNumberScheme::Random => Box::new(RandomQuoteNumbers),
            QuoteNumberScheme::Sequential => Box::new(SequentialQuoteNumbers::new()),
        }
    }
}

impl fmt::Display for QuoteNumberScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteNumberScheme::Random => write!(f, "random"),
            QuoteNumberScheme::Sequential => write!(f, "sequential"),
        }
    }
}

/// Quote number prefix per mode.
pub const fn quote_prefix(mode: PricingMode) -> &'static str {
    match mode {
        PricingMode::Customer => "Q",
        PricingMode::Distributor => "DQ",
    }
}

/// Formats `{prefix}-{YYYYMMDD}-{NNNN}`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use hms_core::quote::format_quote_number;
/// use hms_core::PricingMode;
///
/// let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
/// assert_eq!(format_quote_number(PricingMode::Customer, date, 4821), "Q-20250314-4821");
/// assert_eq!(format_quote_number(PricingMode::Distributor, date, 1007), "DQ-20250314-1007");
/// ```
pub fn format_quote_number(mode: PricingMode, date: NaiveDate, suffix: u16) -> String {
    format!("{}-{}-{:04}", quote_prefix(mode), date.format("%Y%m%d"), suffix)
}

// =============================================================================
// Identity
// =============================================================================

/// Person a customer quote is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerIdentity {
    pub name: String,
    pub email: String,
    /// Hospital or clinic name.
    #[serde(default)]
    pub organization: Option<String>,
}

/// Reseller a distributor quote is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DistributorIdentity {
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    #[serde(default)]
    pub region: Option<String>,
}

/// Who the quote is for. The variant fixes the quote's mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuoteParty {
    Customer(CustomerIdentity),
    Distributor(DistributorIdentity),
}

impl QuoteParty {
    pub fn mode(&self) -> PricingMode {
        match self {
            QuoteParty::Customer(_) => PricingMode::Customer,
            QuoteParty::Distributor(_) => PricingMode::Distributor,
        }
    }

    /// Name to print on the quote.
    pub fn display_name(&self) -> &str {
        match self {
            QuoteParty::Customer(c) => c.organization.as_deref().unwrap_or(&c.name),
            QuoteParty::Distributor(d) => &d.company_name,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            QuoteParty::Customer(c) => &c.email,
            QuoteParty::Distributor(d) => &d.email,
        }
    }

    /// Name and email are required; optional fields are checked when set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            QuoteParty::Customer(c) => {
                validate_text("name", &c.name)?;
                validate_email(&c.email)?;
                if let Some(org) = &c.organization {
                    validate_text("organization", org)?;
                }
            }
            QuoteParty::Distributor(d) => {
                validate_text("company name", &d.company_name)?;
                validate_text("contact name", &d.contact_name)?;
                validate_email(&d.email)?;
                if let Some(region) = &d.region {
                    validate_text("region", region)?;
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Quote Payload
// =============================================================================

/// What was quoted, copied from the catalog at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum QuoteLines {
    Customer { modules: Vec<Module> },
    Distributor { plan: DistributorPlan },
}

/// A complete quote, handed to the renderer and then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuotePayload {
    pub quote_number: String,
    pub mode: PricingMode,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub valid_until: NaiveDate,
    pub party: QuoteParty,
    pub lines: QuoteLines,
    pub coupon_code: Option<CouponCode>,
    pub subtotal: Money,
    pub bundle_discount: Money,
    pub coupon_discount: Money,
    pub total: Money,
    pub initial_payment: Option<Money>,
    /// Trial activation instead of billing. Does not change any figure.
    pub free_trial: bool,
}

impl QuotePayload {
    /// The figures exactly as quoted.
    pub fn pricing(&self) -> PricingResult {
        PricingResult {
            mode: self.mode,
            subtotal: self.subtotal,
            bundle_discount: self.bundle_discount,
            coupon_discount: self.coupon_discount,
            total: self.total,
            applied_coupon: self.coupon_code.clone(),
            initial_payment: self.initial_payment,
        }
    }

    /// The figures re-derived from the quoted lines.
    ///
    /// Subtotal, bundle discount and initial payment come from the lines. The
    /// coupon amount is carried over since its base is not part of the quote.
    pub fn resummed(&self) -> PricingResult {
        let mut result = match &self.lines {
            QuoteLines::Customer { modules } => {
                let refs: Vec<&Module> = modules.iter().collect();
                let subtotal: Money = modules.iter().map(|m| m.price).sum();
                compute_totals(
                    PricingMode::Customer,
                    subtotal,
                    bundle_discount(&refs, PricingMode::Customer),
                    None,
                    None,
                )
            }
            QuoteLines::Distributor { plan } => compute_totals(
                PricingMode::Distributor,
                plan.price,
                Money::ZERO,
                None,
                Some(plan.down_payment),
            ),
        };

        result.coupon_discount = self.coupon_discount;
        result.total -= self.coupon_discount;
        result.initial_payment = result
            .initial_payment
            .map(|initial| initial - self.coupon_discount);
        result.applied_coupon = self.coupon_code.clone();
        result
    }

    /// Number of quoted lines (modules, or 1 for a plan).
    pub fn line_count(&self) -> usize {
        match &self.lines {
            QuoteLines::Customer { modules } => modules.len(),
            QuoteLines::Distributor { .. } => 1,
        }
    }
}

// =============================================================================
// Quote Builder
// =============================================================================

/// Builds quote payloads with a configured number generator.
pub struct QuoteBuilder {
    numbers: Box<dyn QuoteNumberGenerator>,
    validity_days: u32,
}

impl QuoteBuilder {
    pub fn new(numbers: Box<dyn QuoteNumberGenerator>) -> Self {
        QuoteBuilder {
            numbers,
            validity_days: QUOTE_VALIDITY_DAYS,
        }
    }

    pub fn with_scheme(scheme: QuoteNumberScheme) -> Self {
        Self::new(scheme.generator())
    }

    pub fn with_validity_days(mut self, days: u32) -> Self {
        self.validity_days = days;
        self
    }

    /// Snapshots `result` and the selected lines into a payload.
    ///
    /// `now` is passed in so the builder stays deterministic apart from the
    /// quote number.
    ///
    /// ## Errors
    /// - `NoSelection` when the selection is empty
    /// - `ModeMismatch` when party, result and selection disagree on mode
    /// - `Validation` when the party's name or email is invalid
    /// - `UnknownModule` / `UnknownPlan` if the selection does not resolve
    pub fn build(
        &self,
        catalog: &Catalog,
        selection: &Selection,
        result: &PricingResult,
        party: QuoteParty,
        free_trial: bool,
        now: DateTime<Utc>,
    ) -> CoreResult<QuotePayload> {
        let mode = selection.mode();
        if selection.is_empty() {
            return Err(CoreError::NoSelection { mode });
        }
        for actual in [party.mode(), result.mode] {
            if actual != mode {
                return Err(CoreError::ModeMismatch {
                    expected: mode,
                    actual,
                });
            }
        }
        party.validate()?;

        let lines = match selection {
            Selection::Customer(modules) => QuoteLines::Customer {
                modules: modules.resolve(catalog)?.into_iter().cloned().collect(),
            },
            Selection::Distributor(plan) => match plan.resolve(catalog)? {
                Some(plan) => QuoteLines::Distributor { plan: plan.clone() },
                None => return Err(CoreError::NoSelection { mode }),
            },
        };

        let issued_on = now.date_naive();
        let valid_until = issued_on
            .checked_add_days(Days::new(u64::from(self.validity_days)))
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "quote_validity_days".to_string(),
                min: "1".to_string(),
                max: crate::MAX_QUOTE_VALIDITY_DAYS.to_string(),
            })?;
        Ok(QuotePayload {
            quote_number: format_quote_number(mode, issued_on, self.numbers.next_suffix()),
            mode,
            issued_at: now,
            valid_until,
            party,
            lines,
            coupon_code: result.applied_coupon.clone(),
            subtotal: result.subtotal,
            bundle_discount: result.bundle_discount,
            coupon_discount: result.coupon_discount,
            total: result.total,
            initial_payment: result.initial_payment,
            free_trial,
        })
    }
}

impl Default for QuoteBuilder {
    fn default() -> Self {
        Self::with_scheme(QuoteNumberScheme::default())
    }
}

impl fmt::Debug for QuoteBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuoteBuilder")
            .field("validity_days", &self.validity_days)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{price_customer, price_distributor};
    use crate::seed::default_catalog;
    use crate::selection::{ModuleSelection, PlanSelection};
    use chrono::TimeZone;

    struct FixedNumbers(u16);

    impl QuoteNumberGenerator for FixedNumbers {
        fn next_suffix(&self) -> u16 {
            self.0
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
    }

    fn customer() -> QuoteParty {
        QuoteParty::Customer(CustomerIdentity {
            name: "Dr. Amara Okafor".to_string(),
            email: "amara@stmarys.example".to_string(),
            organization: Some("St. Mary's Clinic".to_string()),
        })
    }

    fn distributor() -> QuoteParty {
        QuoteParty::Distributor(DistributorIdentity {
            company_name: "MedSupply Partners".to_string(),
            contact_name: "Jonas Weber".to_string(),
            email: "jonas@medsupply.example".to_string(),
            region: None,
        })
    }

    fn first_module_ids(catalog: &Catalog, n: usize) -> ModuleSelection {
        catalog.modules().iter().take(n).map(|m| m.id.clone()).collect()
    }

    #[test]
    fn test_random_suffix_in_range() {
        let numbers = RandomQuoteNumbers;
        for _ in 0..500 {
            let n = numbers.next_suffix();
            assert!((1000..=9999).contains(&n));
        }
    }

    #[test]
    fn test_sequential_suffix_wraps() {
        let numbers = SequentialQuoteNumbers::new();
        assert_eq!(numbers.next_suffix(), 1000);
        assert_eq!(numbers.next_suffix(), 1001);

        let numbers = SequentialQuoteNumbers::starting_after(9998);
        assert_eq!(numbers.next_suffix(), 9999);
        assert_eq!(numbers.next_suffix(), 1000);
    }

    #[test]
    fn test_customer_quote() {
        let catalog = default_catalog().unwrap();
        let selection = first_module_ids(&catalog, 3);
        let base = crate::pricing::customer_coupon_base(&catalog, &selection).unwrap();
        let coupon = catalog
            .coupons(PricingMode::Customer)
            .apply("welcome10", base)
            .unwrap();
        let result = price_customer(&catalog, &selection, Some(&coupon)).unwrap();

        let builder = QuoteBuilder::new(Box::new(FixedNumbers(4821)));
        let quote = builder
            .build(
                &catalog,
                &Selection::Customer(selection),
                &result,
                customer(),
                false,
                now(),
            )
            .unwrap();

        assert_eq!(quote.quote_number, "Q-20250314-4821");
        assert_eq!(quote.valid_until, NaiveDate::from_ymd_opt(2025, 4, 13).unwrap());
        assert_eq!(quote.line_count(), 3);
        assert_eq!(quote.coupon_code.as_ref().map(|c| c.as_str()), Some("WELCOME10"));
        assert_eq!(quote.pricing(), result);
        assert_eq!(quote.resummed(), result);
        assert_eq!(quote.party.display_name(), "St. Mary's Clinic");
    }

    #[test]
    fn test_distributor_quote() {
        let catalog = default_catalog().unwrap();
        let plan_id = catalog.plans()[0].id.clone();
        let mut selection = PlanSelection::new();
        selection.select(plan_id.clone());

        let result = price_distributor(&catalog, &selection, None).unwrap();
        let builder = QuoteBuilder::new(Box::new(FixedNumbers(1007)));
        let quote = builder
            .build(
                &catalog,
                &Selection::Distributor(selection),
                &result,
                distributor(),
                true,
                now(),
            )
            .unwrap();

        assert_eq!(quote.quote_number, "DQ-20250314-1007");
        assert!(quote.free_trial);
        assert_eq!(quote.total, result.total);
        assert!(quote.initial_payment.is_some());
        match &quote.lines {
            QuoteLines::Distributor { plan } => assert_eq!(plan.id, plan_id),
            other => panic!("unexpected lines: {other:?}"),
        }
        assert_eq!(quote.resummed(), result);
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let catalog = default_catalog().unwrap();
        let selection = Selection::empty(PricingMode::Customer);
        let result = PricingResult::empty(PricingMode::Customer);
        let err = QuoteBuilder::default()
            .build(&catalog, &selection, &result, customer(), false, now())
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::NoSelection {
                mode: PricingMode::Customer
            }
        );
    }

    #[test]
    fn test_party_mode_must_match() {
        let catalog = default_catalog().unwrap();
        let selection = first_module_ids(&catalog, 1);
        let result = price_customer(&catalog, &selection, None).unwrap();
        let err = QuoteBuilder::default()
            .build(
                &catalog,
                &Selection::Customer(selection),
                &result,
                distributor(),
                false,
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::ModeMismatch { .. }));
    }

    #[test]
    fn test_invalid_identity_is_rejected() {
        let catalog = default_catalog().unwrap();
        let selection = first_module_ids(&catalog, 1);
        let result = price_customer(&catalog, &selection, None).unwrap();
        let party = QuoteParty::Customer(CustomerIdentity {
            name: "Dr. Okafor".to_string(),
            email: "not-an-email".to_string(),
            organization: None,
        });
        let err = QuoteBuilder::default()
            .build(&catalog, &Selection::Customer(selection), &result, party, false, now())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_validity_window_past_calendar_end_is_rejected() {
        let catalog = default_catalog().unwrap();
        let selection = first_module_ids(&catalog, 1);
        let result = price_customer(&catalog, &selection, None).unwrap();
        let err = QuoteBuilder::default()
            .with_validity_days(u32::MAX)
            .build(&catalog, &Selection::Customer(selection), &result, customer(), false, now())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. })
                if field == "quote_validity_days"
        ));
    }

    #[test]
    fn test_payload_json_keeps_exact_amounts() {
        let catalog = default_catalog().unwrap();
        let mut selection = PlanSelection::new();
        selection.select(catalog.plans()[1].id.clone());
        let base = crate::pricing::distributor_coupon_base(&catalog, &selection).unwrap();
        let coupon = catalog
            .coupons(PricingMode::Distributor)
            .apply("DIST10", base)
            .unwrap();
        let result = price_distributor(&catalog, &selection, Some(&coupon)).unwrap();
        let quote = QuoteBuilder::default()
            .build(
                &catalog,
                &Selection::Distributor(selection),
                &result,
                distributor(),
                false,
                now(),
            )
            .unwrap();

        let json = serde_json::to_string(&quote).unwrap();
        let back: QuotePayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, quote);
        // decimal string, scale preserved, never a float
        assert!(json.contains("\"coupon_discount\":\"49.999"));
        assert_eq!(back.coupon_discount, "49.999".parse::<Money>().unwrap());
    }
}
