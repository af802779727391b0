//! # Collaborators
//!
//! The two outbound calls a session makes, as async traits.
//!
//! ```text
//! ┌──────────────┐  render(&QuotePayload)        ┌─────────────────────┐
//! │              │ ─────────────────────────────►│  QuoteRenderer      │
//! │ QuoteSession │                               │  (PDF service, JSON)│
//! │              │  activate_trial / begin_billing└─────────────────────┘
//! │              │ ─────────────────────────────►┌─────────────────────┐
//! └──────────────┘                               │  CheckoutGateway    │
//!                                                │  (payments, trials) │
//!                                                └─────────────────────┘
//! ```
//!
//! Each call is awaited once with a binary outcome. There is no retry and no
//! backoff; the session wraps every call in a timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use hms_core::{Money, PricingMode, PricingResult, QuotePayload};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::CollaboratorError;

// =============================================================================
// Traits
// =============================================================================

/// Turns a quote payload into a document.
#[async_trait]
pub trait QuoteRenderer: Send + Sync {
    async fn render(&self, quote: &QuotePayload) -> Result<(), CollaboratorError>;
}

/// Activates trials or starts billing.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn activate_trial(&self, request: &CheckoutRequest) -> Result<(), CollaboratorError>;

    async fn begin_billing(&self, request: &CheckoutRequest) -> Result<(), CollaboratorError>;
}

/// What a gateway gets to see of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub session_id: Uuid,
    pub mode: PricingMode,
    /// Module ids (customer) or the plan id (distributor).
    pub items: Vec<String>,
    pub pricing: PricingResult,
    /// `pricing.amount_due()`, never negative.
    pub amount_due: Money,
    pub free_trial: bool,
}

// =============================================================================
// JSON Quote Renderer
// =============================================================================

/// Writes each quote as `{quote_number}.json` into a directory.
#[derive(Debug, Clone)]
pub struct JsonQuoteRenderer {
    dir: PathBuf,
}

impl JsonQuoteRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonQuoteRenderer { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a quote is written to.
    pub fn path_for(&self, quote: &QuotePayload) -> PathBuf {
        self.dir.join(format!("{}.json", quote.quote_number))
    }
}

#[async_trait]
impl QuoteRenderer for JsonQuoteRenderer {
    async fn render(&self, quote: &QuotePayload) -> Result<(), CollaboratorError> {
        let json = serde_json::to_vec_pretty(quote)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(quote);
        tokio::fs::write(&path, json).await?;

        info!(quote_number = %quote.quote_number, ?path, "Quote written");
        Ok(())
    }
}

// =============================================================================
// Simulated Gateway
// =============================================================================

/// Stand-in payment gateway: waits, then succeeds.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    pub fn new(delay: Duration) -> Self {
        SimulatedGateway { delay }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

#[async_trait]
impl CheckoutGateway for SimulatedGateway {
    async fn activate_trial(&self, request: &CheckoutRequest) -> Result<(), CollaboratorError> {
        debug!(session = %request.session_id, "Simulating trial activation");
        tokio::time::sleep(self.delay).await;
        info!(session = %request.session_id, mode = %request.mode, "Trial activated");
        Ok(())
    }

    async fn begin_billing(&self, request: &CheckoutRequest) -> Result<(), CollaboratorError> {
        debug!(session = %request.session_id, "Simulating billing redirect");
        tokio::time::sleep(self.delay).await;
        info!(
            session = %request.session_id,
            amount_due = %request.amount_due,
            "Billing details capture started"
        );
        Ok(())
    }
}
