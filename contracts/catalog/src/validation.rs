use crate::error::Error;
use crate::storage::{TriggerKind, BASIS_POINTS};

/// Check tranche economic terms at creation or (pre-freeze) update.
pub fn check_tranche_terms(
    premium_rate_bps: u32,
    min_purchase: i128,
    max_purchase: i128,
    cap: i128,
) -> Result<(), Error> {
    if premium_rate_bps > BASIS_POINTS {
        return Err(Error::InvalidPremiumRate);
    }
    if min_purchase <= 0 || min_purchase > max_purchase {
        return Err(Error::InvalidPurchaseBounds);
    }
    if cap <= 0 {
        return Err(Error::InvalidCap);
    }
    Ok(())
}

/// Relative and Custom are declared trigger kinds with no evaluation
/// semantics yet; tranches cannot be created with them.
pub fn check_trigger_supported(trigger: TriggerKind) -> Result<(), Error> {
    match trigger {
        TriggerKind::PriceBelow | TriggerKind::PriceAbove | TriggerKind::Boolean => Ok(()),
        TriggerKind::Relative | TriggerKind::Custom => Err(Error::UnsupportedTrigger),
    }
}

/// A sales window must sit entirely in the future, be well ordered, and
/// close before the tranche matures.
pub fn check_sales_window(
    now: u64,
    sales_start: u64,
    sales_end: u64,
    maturity: u64,
) -> Result<(), Error> {
    if sales_start <= now || sales_start >= sales_end {
        return Err(Error::InvalidWindow);
    }
    if sales_end >= maturity {
        return Err(Error::InvalidMaturity);
    }
    Ok(())
}
