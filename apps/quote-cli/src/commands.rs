//! # Subcommands
//!
//! Each subcommand builds one `QuoteSession` from its arguments, runs a
//! single action and prints the result.
//!
//! ## Summary Layout
//! ```text
//! ┌────────────────────────────────────────────┐
//! │  CUSTOMER QUOTE                  2 modules │
//! ├────────────────────────────────────────────┤
//! │  Electronic Patient Records         $49.99 │
//! │  Billing & Invoicing                $34.99 │
//! ├────────────────────────────────────────────┤
//! │  Subtotal                           $84.98 │
//! │  Bundle discount                    -$4.25 │
//! │  Coupon WELCOME10                   -$8.07 │
//! │  TOTAL                              $72.66 │
//! └────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use hms_checkout::{
    CheckoutAction, CheckoutResult, EngineConfig, JsonQuoteRenderer, QuoteSession,
    SimulatedGateway,
};
use hms_core::pricing::bundle_tier;
use hms_core::quote::{CustomerIdentity, DistributorIdentity};
use hms_core::{
    BundleTier, Catalog, DistributorPlan, Module, PricingMode, PricingResult, QuoteParty, Selection,
};
use tracing::{info, warn};

use crate::{PartyArgs, SelectionArgs};

const WIDTH: usize = 44;

// =============================================================================
// Session Setup
// =============================================================================

fn session(config: &EngineConfig, catalog: Arc<Catalog>) -> QuoteSession {
    let renderer = JsonQuoteRenderer::new(&config.output.quote_dir);
    let gateway = SimulatedGateway::new(config.checkout.simulated_delay());
    QuoteSession::from_config(config, catalog, Arc::new(renderer), Arc::new(gateway))
}

/// Builds a session holding the requested selection.
///
/// A rejected coupon is reported and skipped, the same way the wizard shows
/// it inline without blocking the rest of the flow.
fn selected_session(config: &EngineConfig, args: &SelectionArgs) -> CheckoutResult<QuoteSession> {
    let mut session = session(config, Arc::new(config.catalog()?));
    if let Some(mode) = args.mode {
        session.switch_mode(mode);
    }

    for id in &args.modules {
        session.select_module(id)?;
    }
    if let Some(plan) = &args.plan {
        session.select_plan(plan)?;
    }

    if let Some(code) = &args.coupon {
        if let Err(err) = session.apply_coupon(code) {
            match err.as_coupon_error() {
                Some(coupon_err) => eprintln!("warning: {coupon_err}"),
                None => return Err(err),
            }
        }
    }

    Ok(session)
}

fn party(mode: PricingMode, args: &PartyArgs) -> QuoteParty {
    match mode {
        PricingMode::Customer => QuoteParty::Customer(CustomerIdentity {
            name: args.name.clone(),
            email: args.email.clone(),
            organization: args.organization.clone(),
        }),
        PricingMode::Distributor => QuoteParty::Distributor(DistributorIdentity {
            company_name: args.company.clone().unwrap_or_default(),
            contact_name: args.name.clone(),
            email: args.email.clone(),
            region: args.region.clone(),
        }),
    }
}

// =============================================================================
// Commands
// =============================================================================

/// `hms-quote catalog`
pub fn catalog(config: &EngineConfig, mode: Option<PricingMode>, json: bool) -> CheckoutResult<()> {
    let catalog = config.catalog()?;
    let show_customer = mode != Some(PricingMode::Distributor);
    let show_distributor = mode != Some(PricingMode::Customer);

    if json {
        let modules: &[Module] = if show_customer { catalog.modules() } else { &[] };
        let plans: &[DistributorPlan] = if show_distributor { catalog.plans() } else { &[] };
        let value = serde_json::json!({ "modules": modules, "plans": plans });
        print_json(&value);
        return Ok(());
    }

    if show_customer {
        println!("MODULES");
        for category in catalog.categories() {
            println!("  {category}");
            for module in catalog.modules_in(category) {
                println!(
                    "    {:<20} {:<32} {:>10} {}",
                    module.id, module.title, module.price.to_string(), module.billing_cycle
                );
            }
        }
    }

    if show_distributor {
        if show_customer {
            println!();
        }
        println!("DISTRIBUTOR PLANS");
        for plan in catalog.plans() {
            println!(
                "  {:<14} {:<16} {:>10} + {} down payment",
                plan.id, plan.name, plan.price.to_string(), plan.down_payment
            );
            let features: Vec<&str> = plan.included_features().collect();
            println!("    includes: {}", features.join(", "));
        }
    }
    Ok(())
}

/// `hms-quote price`
pub fn price(config: &EngineConfig, args: &SelectionArgs, json: bool) -> CheckoutResult<()> {
    let session = selected_session(config, args)?;
    let result = session.pricing()?;

    if json {
        print_json(&result);
    } else {
        print_summary(&session, &result)?;
        print_bundle_hint(&session);
    }
    Ok(())
}

/// `hms-quote quote`
pub async fn quote(
    config: &EngineConfig,
    args: &SelectionArgs,
    party_args: &PartyArgs,
    free_trial: bool,
    json: bool,
) -> CheckoutResult<()> {
    let mut session = selected_session(config, args)?;
    session.set_free_trial(free_trial);

    let quote = session.download_quote(party(session.mode(), party_args)).await?;
    info!(quote_number = %quote.quote_number, "Quote delivered");

    if json {
        print_json(&quote);
    } else {
        print_summary(&session, &quote.pricing())?;
        println!(
            "Quote {} for {} (valid until {})",
            quote.quote_number,
            quote.party.display_name(),
            quote.valid_until
        );
        println!(
            "Written to {}",
            config.output.quote_dir.join(format!("{}.json", quote.quote_number)).display()
        );
    }
    Ok(())
}

/// `hms-quote checkout`
pub async fn checkout(
    config: &EngineConfig,
    args: &SelectionArgs,
    free_trial: bool,
    json: bool,
) -> CheckoutResult<()> {
    let mut session = selected_session(config, args)?;
    session.set_free_trial(free_trial);
    let result = session.pricing()?;

    let action = match session.checkout().await {
        Ok(action) => action,
        Err(err) => {
            if err.is_retryable() {
                warn!(session = %session.id(), "Checkout failed, nothing was charged");
            }
            return Err(err);
        }
    };

    if json {
        print_json(&serde_json::json!({
            "session_id": session.id(),
            "action": action_name(action),
            "pricing": result,
            "amount_due": result.amount_due(),
        }));
    } else {
        print_summary(&session, &result)?;
        match action {
            CheckoutAction::ActivateTrial => println!("Free trial activated."),
            CheckoutAction::BeginBilling => {
                println!("Billing started: {} due now.", result.amount_due())
            }
        }
    }
    Ok(())
}

// =============================================================================
// Output
// =============================================================================

fn action_name(action: CheckoutAction) -> &'static str {
    match action {
        CheckoutAction::ActivateTrial => "activate_trial",
        CheckoutAction::BeginBilling => "begin_billing",
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("error: could not serialize output: {err}"),
    }
}

fn rule(left: char, right: char) -> String {
    format!("{left}{}{right}", "─".repeat(WIDTH))
}

fn row(label: &str, value: &str) -> String {
    let pad = WIDTH.saturating_sub(4 + label.chars().count() + value.chars().count());
    format!("│  {label}{}{value}  │", " ".repeat(pad))
}

/// Line items in the order pricing and quotes list them (catalog order).
fn summary_lines(session: &QuoteSession) -> CheckoutResult<Vec<(String, String)>> {
    let catalog = session.catalog();
    let lines = match session.selection() {
        Selection::Customer(modules) => modules
            .resolve(catalog)?
            .into_iter()
            .map(|module| (module.title.clone(), module.price.to_string()))
            .collect(),
        Selection::Distributor(plan) => plan
            .resolve(catalog)?
            .map(|plan| (plan.name.clone(), plan.price.to_string()))
            .into_iter()
            .collect(),
    };
    Ok(lines)
}

fn print_summary(session: &QuoteSession, result: &PricingResult) -> CheckoutResult<()> {
    let lines = summary_lines(session)?;

    let heading = format!("{} QUOTE", session.mode().to_string().to_uppercase());
    let count = match session.mode() {
        PricingMode::Customer => format!("{} modules", lines.len()),
        PricingMode::Distributor => format!("{} plan", lines.len()),
    };

    println!("{}", rule('┌', '┐'));
    println!("{}", row(&heading, &count));
    println!("{}", rule('├', '┤'));
    for (title, price) in &lines {
        println!("{}", row(title, price));
    }
    println!("{}", rule('├', '┤'));
    println!("{}", row("Subtotal", &result.subtotal.to_string()));
    if !result.bundle_discount.is_zero() {
        println!("{}", row("Bundle discount", &format!("-{}", result.bundle_discount)));
    }
    if let Some(code) = &result.applied_coupon {
        println!(
            "{}",
            row(&format!("Coupon {code}"), &format!("-{}", result.coupon_discount))
        );
    }
    println!("{}", row("TOTAL", &result.total.to_string()));
    if let Some(initial) = result.initial_payment {
        println!("{}", row("Initial payment", &initial.to_string()));
    }
    if session.free_trial() {
        println!("{}", row("Free trial", "yes"));
    }
    println!("{}", rule('└', '┘'));

    if result.is_credit() {
        println!("Note: discounts exceed the subtotal; nothing is due.");
    }
    Ok(())
}

fn print_bundle_hint(session: &QuoteSession) {
    let Selection::Customer(modules) = session.selection() else {
        return;
    };
    let tier = bundle_tier(modules);
    if let Some((next, more)) = tier.next(modules.len()) {
        let percent = match next {
            BundleTier::Pair => 5,
            _ => 10,
        };
        println!("Add {more} more module(s) to save {percent}% with a bundle.");
    }
}
