use soroban_sdk::{contracttype, Env, Vec};

/// Fill outcome for one order or position, produced by the matching pass
/// and consumed exactly once by the refund pass.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FillOutcome {
    /// Entirely past the matched boundary; full refund
    Unfilled,
    /// Entirely within capacity
    Filled,
    /// Crosses the boundary: (filled portion, unmatched remainder)
    Partial(i128, i128),
}

/// Walk requests in placement order against a fixed capacity.
///
/// First-come-first-served: everything before the boundary fills, the
/// request crossing it splits, everything after stays unfilled. Late
/// placements bear the whole shortfall; that is the documented trade-off,
/// not pro-rata.
pub fn allocate_fcfs(env: &Env, requests: &Vec<i128>, capacity: i128) -> Vec<FillOutcome> {
    let mut outcomes = Vec::new(env);
    let mut remaining = capacity;

    for amount in requests.iter() {
        if remaining <= 0 {
            outcomes.push_back(FillOutcome::Unfilled);
        } else if amount <= remaining {
            outcomes.push_back(FillOutcome::Filled);
            remaining -= amount;
        } else {
            outcomes.push_back(FillOutcome::Partial(remaining, amount - remaining));
            remaining = 0;
        }
    }

    outcomes
}

/// value × part / whole, floor; whole == 0 yields 0.
pub fn proportional(value: i128, part: i128, whole: i128) -> Option<i128> {
    if whole == 0 {
        return Some(0);
    }
    value.checked_mul(part)?.checked_div(whole)
}
