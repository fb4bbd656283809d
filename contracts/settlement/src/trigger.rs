use crate::interfaces::TriggerKind;
use crate::storage::SCALE_DECIMALS;

/// Decide whether an observation fires the trigger.
///
/// `threshold` carries 7 decimals; the observed value carries
/// `value_decimals`, so the threshold is rescaled to the oracle's precision
/// before comparing. Returns None on rescale overflow.
pub fn evaluate(
    kind: TriggerKind,
    threshold: i128,
    value: i128,
    value_decimals: u32,
) -> Option<bool> {
    match kind {
        TriggerKind::PriceBelow => {
            let bound = rescale_threshold(threshold, value_decimals)?;
            Some(value < bound)
        }
        TriggerKind::PriceAbove => {
            let bound = rescale_threshold(threshold, value_decimals)?;
            Some(value > bound)
        }
        TriggerKind::Boolean => Some(value != 0),
        // Not configurable at tranche creation; never fires
        TriggerKind::Relative | TriggerKind::Custom => Some(false),
    }
}

fn rescale_threshold(threshold: i128, decimals: u32) -> Option<i128> {
    if decimals >= SCALE_DECIMALS {
        threshold.checked_mul(10i128.checked_pow(decimals - SCALE_DECIMALS)?)
    } else {
        Some(threshold / 10i128.checked_pow(SCALE_DECIMALS - decimals)?)
    }
}
