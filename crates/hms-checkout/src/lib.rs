//! # hms-checkout: Quote Sessions and Outbound Actions
//!
//! Wraps the pure pricing rules from `hms-core` in a stateful session and
//! connects it to the two outside systems a buyer reaches at the end of the
//! wizard: the quote renderer and the checkout gateway.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           hms-checkout                                  │
//! │                                                                         │
//! │  ┌──────────────┐    ┌──────────────────────────────────────────────┐  │
//! │  │ EngineConfig │───►│               QuoteSession                   │  │
//! │  │ (TOML + env) │    │  selection, coupon, free-trial, policy       │  │
//! │  └──────────────┘    └──────────┬────────────────────┬──────────────┘  │
//! │                                 │                    │                  │
//! │                                 ▼                    ▼                  │
//! │                      ┌───────────────────┐ ┌───────────────────┐       │
//! │                      │  QuoteRenderer    │ │  CheckoutGateway  │       │
//! │                      │  JsonQuoteRenderer│ │  SimulatedGateway │       │
//! │                      └───────────────────┘ └───────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use hms_checkout::{EngineConfig, JsonQuoteRenderer, QuoteSession, SimulatedGateway};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::load_or_default(None);
//! let catalog = Arc::new(config.catalog()?);
//! let mut session = QuoteSession::from_config(
//!     &config,
//!     catalog,
//!     Arc::new(JsonQuoteRenderer::new(&config.output.quote_dir)),
//!     Arc::new(SimulatedGateway::new(config.checkout.simulated_delay())),
//! );
//!
//! session.select_module("patient-records")?;
//! session.apply_coupon("WELCOME10")?;
//! println!("total: {}", session.pricing()?.total);
//! session.checkout().await?;
//! # Ok(())
//! # }
//! ```

pub mod collaborators;
pub mod config;
pub mod error;
pub mod session;

pub use collaborators::{
    CheckoutGateway, CheckoutRequest, JsonQuoteRenderer, QuoteRenderer, SimulatedGateway,
};
pub use config::{CouponPolicy, EngineConfig};
pub use error::{CheckoutAction, CheckoutError, CheckoutResult, CollaboratorError};
pub use session::QuoteSession;

/// Seconds to wait on a renderer or gateway before giving up.
pub const DEFAULT_CHECKOUT_TIMEOUT_SECS: u64 = 30;
