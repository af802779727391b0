//! # Quote Session
//!
//! One buyer's pass through the marketplace wizard: pick modules or a plan,
//! try coupons, toggle the free trial, then download a quote or check out.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         QuoteSession                                    │
//! │                                                                         │
//! │  select_module / toggle_module / select_plan ──┐                        │
//! │  apply_coupon / remove_coupon ─────────────────┼──► pricing()           │
//! │  switch_mode / set_free_trial ─────────────────┘    (pure, recomputed)  │
//! │                                                                         │
//! │  actions_enabled() == false ──► download_quote / checkout refused       │
//! │                                                                         │
//! │  download_quote(party) ──► QuoteBuilder ──► QuoteRenderer (timeout)     │
//! │  checkout()            ──► CheckoutGateway.activate_trial (free trial)  │
//! │                            CheckoutGateway.begin_billing  (otherwise)   │
//! │                                                                         │
//! │  Collaborator failure: retryable error, session state untouched        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! A session is owned by a single caller and mutated through `&mut self`.
//! The catalog is shared read-only behind an `Arc`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hms_core::pricing::{self, bundle_tier};
use hms_core::{
    AppliedCoupon, BundleTier, Catalog, CoreError, ModuleSelection, PlanSelection, PricingMode,
    PricingResult, QuoteBuilder, QuoteParty, QuotePayload, Selection,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::collaborators::{CheckoutGateway, CheckoutRequest, QuoteRenderer};
use crate::config::{CouponPolicy, EngineConfig};
use crate::error::{CheckoutAction, CheckoutError, CheckoutResult, CollaboratorError};

/// State of one pricing session.
pub struct QuoteSession {
    id: Uuid,
    catalog: Arc<Catalog>,
    selection: Selection,
    coupon: Option<AppliedCoupon>,
    free_trial: bool,
    policy: CouponPolicy,
    builder: QuoteBuilder,
    renderer: Arc<dyn QuoteRenderer>,
    gateway: Arc<dyn CheckoutGateway>,
    timeout: Duration,
}

impl QuoteSession {
    /// Creates an empty session with default policy and timeout.
    pub fn new(
        catalog: Arc<Catalog>,
        mode: PricingMode,
        renderer: Arc<dyn QuoteRenderer>,
        gateway: Arc<dyn CheckoutGateway>,
    ) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, %mode, "Quote session created");
        QuoteSession {
            id,
            catalog,
            selection: Selection::empty(mode),
            coupon: None,
            free_trial: false,
            policy: CouponPolicy::default(),
            builder: QuoteBuilder::default(),
            renderer,
            gateway,
            timeout: Duration::from_secs(crate::DEFAULT_CHECKOUT_TIMEOUT_SECS),
        }
    }

    /// Creates a session configured from `config`.
    pub fn from_config(
        config: &EngineConfig,
        catalog: Arc<Catalog>,
        renderer: Arc<dyn QuoteRenderer>,
        gateway: Arc<dyn CheckoutGateway>,
    ) -> Self {
        let builder = QuoteBuilder::with_scheme(config.pricing.quote_numbers)
            .with_validity_days(config.pricing.quote_validity_days);
        Self::new(catalog, config.pricing.default_mode, renderer, gateway)
            .with_policy(config.coupon_policy())
            .with_quote_builder(builder)
            .with_timeout(config.timeout())
    }

    pub fn with_policy(mut self, policy: CouponPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_quote_builder(mut self, builder: QuoteBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> PricingMode {
        self.selection.mode()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn applied_coupon(&self) -> Option<&AppliedCoupon> {
        self.coupon.as_ref()
    }

    pub fn free_trial(&self) -> bool {
        self.free_trial
    }

    pub fn policy(&self) -> CouponPolicy {
        self.policy
    }

    /// Current bundle tier (customer mode), for "add one more" hints.
    pub fn bundle_tier(&self) -> BundleTier {
        match &self.selection {
            Selection::Customer(modules) => bundle_tier(modules),
            Selection::Distributor(_) => BundleTier::None,
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Adds a module. Returns `false` if it was already selected.
    pub fn select_module(&mut self, id: &str) -> CheckoutResult<bool> {
        self.catalog.module(id)?;
        let added = self.modules_mut()?.select(id);
        self.after_selection_change()?;
        Ok(added)
    }

    /// Removes a module. Returns `false` if it was not selected.
    pub fn deselect_module(&mut self, id: &str) -> CheckoutResult<bool> {
        let removed = self.modules_mut()?.deselect(id);
        self.after_selection_change()?;
        Ok(removed)
    }

    /// Flips a module. Returns whether it is selected afterwards.
    pub fn toggle_module(&mut self, id: &str) -> CheckoutResult<bool> {
        self.catalog.module(id)?;
        let selected = self.modules_mut()?.toggle(id);
        self.after_selection_change()?;
        Ok(selected)
    }

    /// Selects a plan, replacing any previous one.
    pub fn select_plan(&mut self, id: &str) -> CheckoutResult<()> {
        self.catalog.plan(id)?;
        self.plan_mut()?.select(id);
        self.after_selection_change()
    }

    pub fn clear_plan(&mut self) -> CheckoutResult<()> {
        self.plan_mut()?.clear();
        self.after_selection_change()
    }

    /// Switches between customer and distributor pricing.
    ///
    /// The selection and coupon are dropped: the two modes share neither
    /// catalog entries nor coupon tables.
    pub fn switch_mode(&mut self, mode: PricingMode) {
        if mode == self.mode() {
            return;
        }
        info!(session = %self.id, from = %self.mode(), to = %mode, "Switching pricing mode");
        self.selection = Selection::empty(mode);
        self.coupon = None;
    }

    fn modules_mut(&mut self) -> CheckoutResult<&mut ModuleSelection> {
        match &mut self.selection {
            Selection::Customer(modules) => Ok(modules),
            Selection::Distributor(_) => Err(mismatch(PricingMode::Customer, PricingMode::Distributor)),
        }
    }

    fn plan_mut(&mut self) -> CheckoutResult<&mut PlanSelection> {
        match &mut self.selection {
            Selection::Distributor(plan) => Ok(plan),
            Selection::Customer(_) => Err(mismatch(PricingMode::Distributor, PricingMode::Customer)),
        }
    }

    /// Keeps the applied coupon in step with the selection.
    ///
    /// An emptied selection drops the coupon under either policy, so an empty
    /// session always prices at zero.
    fn after_selection_change(&mut self) -> CheckoutResult<()> {
        if self.selection.is_empty() {
            if let Some(coupon) = self.coupon.take() {
                debug!(session = %self.id, code = %coupon.code, "Selection emptied, coupon dropped");
            }
            return Ok(());
        }
        if self.policy != CouponPolicy::Recompute {
            return Ok(());
        }
        if let Some(coupon) = &self.coupon {
            let base = pricing::coupon_base(&self.catalog, &self.selection)?;
            let rebased = coupon.rebase(base);
            debug!(
                session = %self.id,
                code = %rebased.code,
                discount = %rebased.discount,
                "Coupon discount recomputed"
            );
            self.coupon = Some(rebased);
        }
        Ok(())
    }

    // =========================================================================
    // Coupons & Trial
    // =========================================================================

    /// Applies a coupon code against the current base.
    ///
    /// A successful apply replaces any earlier coupon. A failed one leaves the
    /// earlier coupon in place and returns the inline error.
    pub fn apply_coupon(&mut self, raw: &str) -> CheckoutResult<&AppliedCoupon> {
        let base = pricing::coupon_base(&self.catalog, &self.selection)?;
        match self.catalog.coupons(self.mode()).apply(raw, base) {
            Ok(applied) => {
                info!(
                    session = %self.id,
                    code = %applied.code,
                    rate = %applied.rate,
                    discount = %applied.discount,
                    "Coupon applied"
                );
                Ok(self.coupon.insert(applied))
            }
            Err(err) => {
                warn!(session = %self.id, error = %err, "Coupon rejected");
                Err(err.into())
            }
        }
    }

    /// Removes the applied coupon, returning it.
    pub fn remove_coupon(&mut self) -> Option<AppliedCoupon> {
        self.coupon.take()
    }

    /// Switches between trial activation and billing. Figures are unchanged.
    pub fn set_free_trial(&mut self, free_trial: bool) {
        self.free_trial = free_trial;
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    /// Current figures.
    pub fn pricing(&self) -> CheckoutResult<PricingResult> {
        Ok(pricing::price(
            &self.catalog,
            &self.selection,
            self.coupon.as_ref(),
        )?)
    }

    /// Whether quote download and checkout are available.
    pub fn actions_enabled(&self) -> bool {
        !self.selection.is_empty()
    }

    fn require_selection(&self) -> CheckoutResult<()> {
        if self.actions_enabled() {
            Ok(())
        } else {
            Err(CheckoutError::NoSelectionPrecondition { mode: self.mode() })
        }
    }

    // =========================================================================
    // Outbound Actions
    // =========================================================================

    /// Builds a quote and hands it to the renderer.
    ///
    /// Returns the delivered payload. On renderer failure or timeout the quote
    /// counts as not delivered and nothing about it is kept.
    pub async fn download_quote(&self, party: QuoteParty) -> CheckoutResult<QuotePayload> {
        self.require_selection()?;
        let result = self.pricing()?;
        let quote = self.builder.build(
            &self.catalog,
            &self.selection,
            &result,
            party,
            self.free_trial,
            Utc::now(),
        )?;

        info!(session = %self.id, quote_number = %quote.quote_number, "Rendering quote");
        match self.call(self.renderer.render(&quote)).await {
            Ok(()) => Ok(quote),
            Err(source) => {
                warn!(
                    session = %self.id,
                    quote_number = %quote.quote_number,
                    error = %source,
                    "Quote generation failed"
                );
                Err(CheckoutError::QuoteGenerationFailure {
                    quote_number: quote.quote_number,
                    source,
                })
            }
        }
    }

    /// Activates a trial or starts billing, depending on the free-trial flag.
    pub async fn checkout(&self) -> CheckoutResult<CheckoutAction> {
        self.require_selection()?;
        let request = self.checkout_request()?;
        let action = CheckoutAction::for_trial(self.free_trial);

        info!(session = %self.id, %action, amount_due = %request.amount_due, "Starting checkout");
        let outcome = match action {
            CheckoutAction::ActivateTrial => self.call(self.gateway.activate_trial(&request)).await,
            CheckoutAction::BeginBilling => self.call(self.gateway.begin_billing(&request)).await,
        };

        match outcome {
            Ok(()) => Ok(action),
            Err(source) => {
                warn!(session = %self.id, %action, error = %source, "Checkout failed");
                Err(CheckoutError::CheckoutFailure { action, source })
            }
        }
    }

    fn checkout_request(&self) -> CheckoutResult<CheckoutRequest> {
        let pricing = self.pricing()?;
        let items = match &self.selection {
            Selection::Customer(modules) => modules.ids().map(str::to_string).collect(),
            Selection::Distributor(plan) => plan.id().map(str::to_string).into_iter().collect(),
        };
        Ok(CheckoutRequest {
            session_id: self.id,
            mode: self.mode(),
            items,
            amount_due: pricing.amount_due(),
            pricing,
            free_trial: self.free_trial,
        })
    }

    async fn call<F>(&self, call: F) -> Result<(), CollaboratorError>
    where
        F: Future<Output = Result<(), CollaboratorError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(CollaboratorError::TimedOut(self.timeout)),
        }
    }
}

fn mismatch(expected: PricingMode, actual: PricingMode) -> CheckoutError {
    CoreError::ModeMismatch { expected, actual }.into()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hms_core::quote::{CustomerIdentity, DistributorIdentity, QuoteLines};
    use hms_core::seed::default_catalog;
    use hms_core::{CouponError, DiscountRate, Money};
    use std::sync::Mutex;

    // =========================================================================
    // Test collaborators
    // =========================================================================

    #[derive(Default)]
    struct RecordingRenderer {
        rendered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl QuoteRenderer for RecordingRenderer {
        async fn render(&self, quote: &QuotePayload) -> Result<(), CollaboratorError> {
            self.rendered.lock().unwrap().push(quote.quote_number.clone());
            Ok(())
        }
    }

    struct FailingRenderer;

    #[async_trait]
    impl QuoteRenderer for FailingRenderer {
        async fn render(&self, _quote: &QuotePayload) -> Result<(), CollaboratorError> {
            Err(CollaboratorError::Rejected("pdf service down".into()))
        }
    }

    struct SlowRenderer;

    #[async_trait]
    impl QuoteRenderer for SlowRenderer {
        async fn render(&self, _quote: &QuotePayload) -> Result<(), CollaboratorError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingGateway {
        calls: Mutex<Vec<(CheckoutAction, Money)>>,
        fail: bool,
    }

    impl RecordingGateway {
        fn failing() -> Self {
            RecordingGateway {
                fail: true,
                ..Default::default()
            }
        }

        fn record(&self, action: CheckoutAction, request: &CheckoutRequest) -> Result<(), CollaboratorError> {
            self.calls.lock().unwrap().push((action, request.amount_due));
            if self.fail {
                Err(CollaboratorError::Unavailable("gateway offline".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl CheckoutGateway for RecordingGateway {
        async fn activate_trial(&self, request: &CheckoutRequest) -> Result<(), CollaboratorError> {
            self.record(CheckoutAction::ActivateTrial, request)
        }

        async fn begin_billing(&self, request: &CheckoutRequest) -> Result<(), CollaboratorError> {
            self.record(CheckoutAction::BeginBilling, request)
        }
    }

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn rate(percent: u32) -> DiscountRate {
        DiscountRate::from_percent(percent).unwrap()
    }

    fn session_with(
        mode: PricingMode,
        renderer: Arc<dyn QuoteRenderer>,
        gateway: Arc<dyn CheckoutGateway>,
    ) -> QuoteSession {
        QuoteSession::new(Arc::new(default_catalog().unwrap()), mode, renderer, gateway)
    }

    fn session(mode: PricingMode) -> QuoteSession {
        session_with(
            mode,
            Arc::new(RecordingRenderer::default()),
            Arc::new(RecordingGateway::default()),
        )
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
            region: Some("DACH".to_string()),
        })
    }

    // =========================================================================
    // Selection & pricing
    // =========================================================================

    #[test]
    fn test_empty_session_prices_zero_and_disables_actions() {
        let session = session(PricingMode::Customer);
        let result = session.pricing().unwrap();
        assert_eq!(result, PricingResult::empty(PricingMode::Customer));
        assert!(!session.actions_enabled());
    }

    #[test]
    fn test_module_selection_drives_bundle_tier() {
        let mut session = session(PricingMode::Customer);
        assert!(session.select_module("patient-records").unwrap());
        assert_eq!(session.bundle_tier(), BundleTier::None);

        session.toggle_module("billing").unwrap();
        assert_eq!(session.bundle_tier(), BundleTier::Pair);
        let pair = session.pricing().unwrap();
        assert_eq!(pair.bundle_discount, pair.subtotal * BundleTier::Pair.rate());

        session.select_module("inventory").unwrap();
        assert_eq!(session.bundle_tier(), BundleTier::Suite);

        session.deselect_module("inventory").unwrap();
        assert_eq!(session.pricing().unwrap(), pair);
        assert!(session.actions_enabled());
    }

    #[test]
    fn test_unknown_module_is_rejected() {
        let mut session = session(PricingMode::Customer);
        let err = session.select_module("x-ray-vision").unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::UnknownModule(_))));
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_wrong_mode_operations_are_rejected() {
        let mut session = session(PricingMode::Distributor);
        assert!(matches!(
            session.select_module("billing"),
            Err(CheckoutError::Core(CoreError::ModeMismatch { .. }))
        ));

        let mut session = self::session(PricingMode::Customer);
        assert!(matches!(
            session.select_plan("starter"),
            Err(CheckoutError::Core(CoreError::ModeMismatch { .. }))
        ));
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    #[test]
    fn test_failed_coupon_keeps_previous_one() {
        let mut session = session(PricingMode::Customer);
        session.select_module("patient-records").unwrap();
        session.apply_coupon("welcome10").unwrap();

        let err = session.apply_coupon("BOGUS").unwrap_err();
        assert_eq!(
            err.as_coupon_error(),
            Some(&CouponError::InvalidCode {
                code: "BOGUS".to_string()
            })
        );
        let err = session.apply_coupon("   ").unwrap_err();
        assert_eq!(err.as_coupon_error(), Some(&CouponError::EmptyCode));

        assert_eq!(session.applied_coupon().unwrap().code.as_str(), "WELCOME10");
    }

    #[test]
    fn test_unknown_coupon_on_fresh_session_leaves_zero_discount() {
        let mut session = session(PricingMode::Customer);
        session.select_module("patient-records").unwrap();
        assert!(session.apply_coupon("BOGUS").is_err());
        assert_eq!(session.pricing().unwrap().coupon_discount, Money::ZERO);
    }

    #[test]
    fn test_reapplying_replaces_coupon() {
        let mut session = session(PricingMode::Customer);
        session.select_module("patient-records").unwrap();
        session.apply_coupon("WELCOME10").unwrap();
        session.apply_coupon("HEALTH20").unwrap();

        let result = session.pricing().unwrap();
        assert_eq!(result.applied_coupon.unwrap().as_str(), "HEALTH20");
        assert_eq!(result.coupon_discount, money("49.99").portion(rate(20)));
    }

    #[test]
    fn test_distributor_codes_only_work_in_distributor_mode() {
        let mut session = session(PricingMode::Customer);
        session.select_module("billing").unwrap();
        assert!(session.apply_coupon("DIST10").is_err());

        session.switch_mode(PricingMode::Distributor);
        session.select_plan("professional").unwrap();
        session.apply_coupon("dist10").unwrap();

        let result = session.pricing().unwrap();
        assert_eq!(result.coupon_discount, money("49.999"));
        assert_eq!(result.total, money("449.991"));
        assert_eq!(result.initial_payment, Some(money("1949.981")));
    }

    #[test]
    fn test_frozen_policy_keeps_apply_time_amount() {
        let mut session = session(PricingMode::Customer);
        session.select_module("patient-records").unwrap();
        session.apply_coupon("WELCOME10").unwrap();
        let frozen = session.applied_coupon().unwrap().discount;

        session.select_module("telemedicine").unwrap();
        assert_eq!(session.pricing().unwrap().coupon_discount, frozen);
    }

    #[test]
    fn test_recompute_policy_follows_base() {
        let mut session = session(PricingMode::Customer).with_policy(CouponPolicy::Recompute);
        session.select_module("patient-records").unwrap();
        session.apply_coupon("WELCOME10").unwrap();

        session.select_module("telemedicine").unwrap();
        let result = session.pricing().unwrap();
        let base = result.subtotal - result.bundle_discount;
        assert_eq!(result.coupon_discount, base.portion(rate(10)));
    }

    #[test]
    fn test_emptied_selection_prices_zero_under_both_policies() {
        for policy in [CouponPolicy::Frozen, CouponPolicy::Recompute] {
            let mut session = session(PricingMode::Customer).with_policy(policy);
            session.select_module("patient-records").unwrap();
            session.apply_coupon("WELCOME10").unwrap();

            session.deselect_module("patient-records").unwrap();
            assert!(session.applied_coupon().is_none());
            assert_eq!(
                session.pricing().unwrap(),
                PricingResult::empty(PricingMode::Customer)
            );
            assert!(!session.actions_enabled());
        }
    }

    #[test]
    fn test_cleared_plan_drops_frozen_coupon() {
        let mut session = session(PricingMode::Distributor);
        session.select_plan("professional").unwrap();
        session.apply_coupon("DIST10").unwrap();

        session.clear_plan().unwrap();
        let result = session.pricing().unwrap();
        assert_eq!(result.coupon_discount, Money::ZERO);
        assert_eq!(result.total, Money::ZERO);
        assert!(!result.is_credit());
    }

    #[test]
    fn test_switch_mode_clears_selection_and_coupon() {
        let mut session = session(PricingMode::Customer);
        session.select_module("billing").unwrap();
        session.apply_coupon("CLINIC15").unwrap();

        session.switch_mode(PricingMode::Distributor);
        assert_eq!(session.mode(), PricingMode::Distributor);
        assert!(session.selection().is_empty());
        assert!(session.applied_coupon().is_none());
    }

    #[test]
    fn test_free_trial_does_not_change_figures() {
        let mut session = session(PricingMode::Customer);
        session.select_module("billing").unwrap();
        let before = session.pricing().unwrap();
        session.set_free_trial(true);
        assert_eq!(session.pricing().unwrap(), before);
    }

    // =========================================================================
    // Outbound actions
    // =========================================================================

    #[tokio::test]
    async fn test_download_quote_renders_payload() {
        let renderer = Arc::new(RecordingRenderer::default());
        let mut session = session_with(
            PricingMode::Customer,
            renderer.clone(),
            Arc::new(RecordingGateway::default()),
        );
        session.select_module("patient-records").unwrap();
        session.select_module("lab-results").unwrap();
        session.apply_coupon("WELCOME10").unwrap();

        let quote = session.download_quote(customer()).await.unwrap();
        assert!(quote.quote_number.starts_with("Q-"));
        assert_eq!(quote.pricing(), session.pricing().unwrap());
        assert!(matches!(quote.lines, QuoteLines::Customer { ref modules } if modules.len() == 2));
        assert_eq!(*renderer.rendered.lock().unwrap(), vec![quote.quote_number.clone()]);
    }

    #[tokio::test]
    async fn test_download_quote_requires_selection() {
        let session = session(PricingMode::Distributor);
        let err = session.download_quote(distributor()).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::NoSelectionPrecondition {
                mode: PricingMode::Distributor
            }
        ));
    }

    #[tokio::test]
    async fn test_renderer_failure_is_retryable_and_preserves_state() {
        let mut session = session_with(
            PricingMode::Distributor,
            Arc::new(FailingRenderer),
            Arc::new(RecordingGateway::default()),
        );
        session.select_plan("enterprise").unwrap();
        session.apply_coupon("PARTNER15").unwrap();
        let before = session.pricing().unwrap();

        let err = session.download_quote(distributor()).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, CheckoutError::QuoteGenerationFailure { .. }));
        assert_eq!(session.pricing().unwrap(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_renderer_timeout_maps_to_failure() {
        let mut session = session_with(
            PricingMode::Customer,
            Arc::new(SlowRenderer),
            Arc::new(RecordingGateway::default()),
        )
        .with_timeout(Duration::from_secs(5));
        session.select_module("billing").unwrap();

        let err = session.download_quote(customer()).await.unwrap_err();
        match err {
            CheckoutError::QuoteGenerationFailure { source, .. } => {
                assert_eq!(source, CollaboratorError::TimedOut(Duration::from_secs(5)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_checkout_picks_action_from_trial_flag() {
        let gateway = Arc::new(RecordingGateway::default());
        let mut session = session_with(
            PricingMode::Customer,
            Arc::new(RecordingRenderer::default()),
            gateway.clone(),
        );
        session.select_module("billing").unwrap();

        assert_eq!(session.checkout().await.unwrap(), CheckoutAction::BeginBilling);
        session.set_free_trial(true);
        assert_eq!(session.checkout().await.unwrap(), CheckoutAction::ActivateTrial);

        let calls = gateway.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], (CheckoutAction::BeginBilling, money("34.99")));
        assert_eq!(calls[1].0, CheckoutAction::ActivateTrial);
    }

    #[tokio::test]
    async fn test_checkout_failure_preserves_state() {
        let mut session = session_with(
            PricingMode::Customer,
            Arc::new(RecordingRenderer::default()),
            Arc::new(RecordingGateway::failing()),
        );
        session.select_module("billing").unwrap();
        session.apply_coupon("HEALTH20").unwrap();
        let before = session.pricing().unwrap();

        let err = session.checkout().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(session.pricing().unwrap(), before);
        assert_eq!(session.applied_coupon().unwrap().code.as_str(), "HEALTH20");
    }

    #[tokio::test]
    async fn test_checkout_requires_selection() {
        let session = session(PricingMode::Customer);
        assert!(matches!(
            session.checkout().await,
            Err(CheckoutError::NoSelectionPrecondition { .. })
        ));
    }
}
