use crate::storage::SCALE;

/// Shares minted for a collateral deposit at the given NAV.
pub fn shares_for_deposit(amount: i128, nav_per_share: i128) -> Option<i128> {
    amount.checked_mul(SCALE)?.checked_div(nav_per_share)
}

/// Asset value of a share balance at the given NAV.
pub fn value_of_shares(shares: i128, nav_per_share: i128) -> Option<i128> {
    shares.checked_mul(nav_per_share)?.checked_div(SCALE)
}

/// total_assets / total_shares in SCALE fixed-point; 1:1 while no shares
/// are outstanding.
pub fn nav_per_share(total_assets: i128, total_shares: i128) -> Option<i128> {
    if total_shares == 0 {
        return Some(SCALE);
    }
    total_assets.checked_mul(SCALE)?.checked_div(total_shares)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_to_one_at_inception() {
        assert_eq!(nav_per_share(0, 0), Some(SCALE));
        assert_eq!(shares_for_deposit(1_500 * SCALE, SCALE), Some(1_500 * SCALE));
    }

    #[test]
    fn nav_rises_with_yield() {
        // 500 assets, 500 shares, then 50 yield arrives
        let nav = nav_per_share(550 * SCALE, 500 * SCALE).unwrap();
        assert_eq!(nav, 11 * SCALE / 10); // 1.1

        // a redemption at the new NAV pays principal + yield
        assert_eq!(value_of_shares(500 * SCALE, nav), Some(550 * SCALE));
    }

    #[test]
    fn deposit_at_elevated_nav_mints_fewer_shares() {
        let nav = 11 * SCALE / 10;
        assert_eq!(shares_for_deposit(110 * SCALE, nav), Some(100 * SCALE));
    }
}
