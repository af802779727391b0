//! # Engine Configuration
//!
//! Configuration for pricing sessions, collaborators and the catalog.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     HMS_COUPON_POLICY=recompute                                        │
//! │     HMS_QUOTE_NUMBERS=sequential                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/marketplace/engine.toml (Linux)                          │
//! │     ~/Library/Application Support/com.hms.marketplace/engine.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     Frozen coupons, random quote numbers, seed catalog                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # engine.toml
//! [pricing]
//! coupon_policy = "frozen"    # frozen | recompute
//! quote_numbers = "random"    # random | sequential
//! quote_validity_days = 30
//! default_mode = "customer"   # customer | distributor
//!
//! [checkout]
//! timeout_secs = 30
//! simulated_delay_ms = 1500
//!
//! [output]
//! quote_dir = "quotes"
//!
//! # Optional. Without it the built-in seed catalog is used.
//! [catalog.customer_coupons]
//! SPRING25 = "0.25"
//!
//! [[catalog.modules]]
//! id = "patient-records"
//! title = "Electronic Patient Records"
//! price = "49.99"
//! category = "Clinical"
//! billing_cycle = "monthly"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use hms_core::coupon::CouponTable;
use hms_core::seed;
use hms_core::{Catalog, DistributorPlan, Module, PricingMode, QuoteNumberScheme};

use crate::error::{CheckoutError, CheckoutResult};

// =============================================================================
// Coupon Policy
// =============================================================================

/// What happens to an applied coupon's amount when the selection changes.
///
/// ```text
/// apply WELCOME10 on $90 base ──► discount $9
/// add a $50 module (base now $135)
///
///   FROZEN (default)      discount stays $9 until the code is re-applied
///   RECOMPUTE             discount becomes $13.50
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponPolicy {
    /// Keep the amount computed at apply time.
    #[default]
    Frozen,

    /// Re-derive the amount from the current base after every change.
    Recompute,
}

impl fmt::Display for CouponPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CouponPolicy::Frozen => write!(f, "frozen"),
            CouponPolicy::Recompute => write!(f, "recompute"),
        }
    }
}

impl FromStr for CouponPolicy {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "frozen" | "freeze" => Ok(CouponPolicy::Frozen),
            "recompute" | "live" => Ok(CouponPolicy::Recompute),
            other => Err(CheckoutError::InvalidConfig(format!(
                "Unknown coupon policy: '{}'. Valid options: frozen, recompute",
                other
            ))),
        }
    }
}

fn parse_scheme(s: &str) -> CheckoutResult<QuoteNumberScheme> {
    match s.to_lowercase().as_str() {
        "random" => Ok(QuoteNumberScheme::Random),
        "sequential" | "counter" => Ok(QuoteNumberScheme::Sequential),
        other => Err(CheckoutError::InvalidConfig(format!(
            "Unknown quote number scheme: '{}'. Valid options: random, sequential",
            other
        ))),
    }
}

// =============================================================================
// Pricing Settings
// =============================================================================

/// Pricing behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSettings {
    #[serde(default)]
    pub coupon_policy: CouponPolicy,

    #[serde(default)]
    pub quote_numbers: QuoteNumberScheme,

    /// Days a quote stays valid.
    #[serde(default = "default_validity_days")]
    pub quote_validity_days: u32,

    /// Mode new sessions start in.
    #[serde(default)]
    pub default_mode: PricingMode,
}

fn default_validity_days() -> u32 {
    hms_core::QUOTE_VALIDITY_DAYS
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            coupon_policy: CouponPolicy::default(),
            quote_numbers: QuoteNumberScheme::default(),
            quote_validity_days: default_validity_days(),
            default_mode: PricingMode::default(),
        }
    }
}

// =============================================================================
// Checkout Settings
// =============================================================================

/// Outbound call settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSettings {
    /// Upper bound on a single renderer or gateway call (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Delay used by the simulated gateway (milliseconds).
    #[serde(default = "default_simulated_delay")]
    pub simulated_delay_ms: u64,
}

fn default_timeout() -> u64 {
    crate::DEFAULT_CHECKOUT_TIMEOUT_SECS
}

fn default_simulated_delay() -> u64 {
    1500
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        CheckoutSettings {
            timeout_secs: default_timeout(),
            simulated_delay_ms: default_simulated_delay(),
        }
    }
}

impl CheckoutSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn simulated_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_delay_ms)
    }
}

// =============================================================================
// Output Settings
// =============================================================================

/// Where rendered quotes go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_quote_dir")]
    pub quote_dir: PathBuf,
}

fn default_quote_dir() -> PathBuf {
    PathBuf::from("quotes")
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            quote_dir: default_quote_dir(),
        }
    }
}

// =============================================================================
// Catalog Settings
// =============================================================================

/// A catalog supplied through configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSettings {
    #[serde(default)]
    pub modules: Vec<Module>,

    #[serde(default)]
    pub plans: Vec<DistributorPlan>,

    #[serde(default)]
    pub customer_coupons: CouponTable,

    #[serde(default)]
    pub distributor_coupons: CouponTable,
}

impl CatalogSettings {
    /// Validates entries and builds the snapshot.
    pub fn build(&self) -> CheckoutResult<Catalog> {
        Ok(Catalog::new(
            self.modules.clone(),
            self.plans.clone(),
            self.customer_coupons.clone(),
            self.distributor_coupons.clone(),
        )?)
    }
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub checkout: CheckoutSettings,

    #[serde(default)]
    pub output: OutputSettings,

    /// Replaces the seed catalog when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogSettings>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (engine.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CheckoutResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CheckoutResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CheckoutError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CheckoutResult<()> {
        if self.checkout.timeout_secs == 0 {
            return Err(CheckoutError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.pricing.quote_validity_days == 0
            || self.pricing.quote_validity_days > hms_core::MAX_QUOTE_VALIDITY_DAYS
        {
            return Err(CheckoutError::InvalidConfig(format!(
                "quote_validity_days must be between 1 and {}",
                hms_core::MAX_QUOTE_VALIDITY_DAYS
            )));
        }

        if self.output.quote_dir.as_os_str().is_empty() {
            return Err(CheckoutError::InvalidConfig("quote_dir must not be empty".into()));
        }

        if let Some(catalog) = &self.catalog {
            catalog.build()?;
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `HMS_*` overrides read through `var`.
    ///
    /// Unparseable values are logged and ignored; the file or default value
    /// stays in effect.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(policy) = var("HMS_COUPON_POLICY") {
            match policy.parse() {
                Ok(parsed) => {
                    debug!(policy = %policy, "Overriding coupon policy from environment");
                    self.pricing.coupon_policy = parsed;
                }
                Err(_) => warn!(policy = %policy, "Unknown coupon policy in environment"),
            }
        }

        if let Some(scheme) = var("HMS_QUOTE_NUMBERS") {
            match parse_scheme(&scheme) {
                Ok(parsed) => {
                    debug!(scheme = %scheme, "Overriding quote number scheme from environment");
                    self.pricing.quote_numbers = parsed;
                }
                Err(_) => warn!(scheme = %scheme, "Unknown quote number scheme in environment"),
            }
        }

        if let Some(mode) = var("HMS_DEFAULT_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding default mode from environment");
                    self.pricing.default_mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown pricing mode in environment"),
            }
        }

        if let Some(secs) = var("HMS_CHECKOUT_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => {
                    debug!(timeout_secs = s, "Overriding checkout timeout from environment");
                    self.checkout.timeout_secs = s;
                }
                Err(_) => warn!(timeout_secs = %secs, "Invalid checkout timeout in environment"),
            }
        }

        if let Some(dir) = var("HMS_QUOTE_DIR") {
            debug!(quote_dir = %dir, "Overriding quote directory from environment");
            self.output.quote_dir = PathBuf::from(dir);
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "hms", "marketplace")
            .map(|dirs| dirs.config_dir().join("engine.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Configured catalog, or the seed catalog.
    pub fn catalog(&self) -> CheckoutResult<Catalog> {
        match &self.catalog {
            Some(settings) => settings.build(),
            None => Ok(seed::default_catalog()?),
        }
    }

    pub fn coupon_policy(&self) -> CouponPolicy {
        self.pricing.coupon_policy
    }

    pub fn timeout(&self) -> Duration {
        self.checkout.timeout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hms_core::Money;
    use std::collections::HashMap;

    #[test]
    fn test_coupon_policy_parsing() {
        assert_eq!("frozen".parse::<CouponPolicy>().unwrap(), CouponPolicy::Frozen);
        assert_eq!("Recompute".parse::<CouponPolicy>().unwrap(), CouponPolicy::Recompute);
        assert!("sometimes".parse::<CouponPolicy>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.coupon_policy(), CouponPolicy::Frozen);
        assert_eq!(config.pricing.quote_numbers, QuoteNumberScheme::Random);
        assert_eq!(config.pricing.quote_validity_days, 30);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
        assert_eq!(config.catalog().unwrap().plans().len(), 3);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();
        config.checkout.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.checkout.timeout_secs = 5;
        config.output.quote_dir = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validity_days_are_capped() {
        let config: EngineConfig = toml::from_str("[pricing]\nquote_validity_days = 4000000000").unwrap();
        assert!(matches!(config.validate(), Err(CheckoutError::InvalidConfig(_))));

        let mut config = EngineConfig::default();
        config.pricing.quote_validity_days = hms_core::MAX_QUOTE_VALIDITY_DAYS;
        assert!(config.validate().is_ok());
        config.pricing.quote_validity_days = hms_core::MAX_QUOTE_VALIDITY_DAYS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("HMS_COUPON_POLICY", "recompute"),
            ("HMS_QUOTE_NUMBERS", "sequential"),
            ("HMS_DEFAULT_MODE", "distributor"),
            ("HMS_CHECKOUT_TIMEOUT_SECS", "7"),
            ("HMS_QUOTE_DIR", "/tmp/hms-quotes"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.coupon_policy(), CouponPolicy::Recompute);
        assert_eq!(config.pricing.quote_numbers, QuoteNumberScheme::Sequential);
        assert_eq!(config.pricing.default_mode, PricingMode::Distributor);
        assert_eq!(config.timeout(), Duration::from_secs(7));
        assert_eq!(config.output.quote_dir, PathBuf::from("/tmp/hms-quotes"));
    }

    #[test]
    fn test_invalid_env_overrides_are_ignored() {
        let vars: HashMap<&str, &str> = [
            ("HMS_COUPON_POLICY", "sometimes"),
            ("HMS_QUOTE_NUMBERS", "fibonacci"),
            ("HMS_DEFAULT_MODE", "wholesale"),
            ("HMS_CHECKOUT_TIMEOUT_SECS", "soon"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.coupon_policy(), CouponPolicy::Frozen);
        assert_eq!(config.pricing.quote_numbers, QuoteNumberScheme::Random);
        assert_eq!(config.pricing.default_mode, PricingMode::Customer);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_catalog_from_toml() {
        let toml_str = r#"
            [pricing]
            coupon_policy = "recompute"
            quote_numbers = "sequential"

            [catalog.customer_coupons]
            spring25 = "0.25"

            [[catalog.modules]]
            id = "patient-records"
            title = "Electronic Patient Records"
            price = "49.99"
            category = "Clinical"

            [[catalog.modules]]
            id = "billing"
            title = "Billing"
            price = "34.99"
            category = "Finance"
            billing_cycle = "yearly"
        "#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.coupon_policy(), CouponPolicy::Recompute);
        assert_eq!(config.pricing.quote_numbers, QuoteNumberScheme::Sequential);

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.modules().len(), 2);
        assert_eq!(catalog.module("patient-records").unwrap().price, Money::from_cents(4999));
        assert!(catalog.coupons(PricingMode::Customer).contains("SPRING25"));
        assert!(catalog.plans().is_empty());
    }

    #[test]
    fn test_invalid_catalog_fails_validation() {
        let toml_str = r#"
            [catalog.distributor_coupons]
            FREE = "1.5"
        "#;
        assert!(toml::from_str::<EngineConfig>(toml_str).is_err());

        let toml_str = r#"
            [[catalog.modules]]
            id = "a"
            title = "A"
            price = "-1"
            category = "Clinical"
        "#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");

        let mut config = EngineConfig::default();
        config.checkout.timeout_secs = 12;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[pricing]"));
        assert!(contents.contains("[checkout]"));

        let loaded: EngineConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.checkout.timeout_secs, 12);
    }
}
