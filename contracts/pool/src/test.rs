#![cfg(test)]

use super::*;
use soroban_sdk::{
    contract, contracterror, contractimpl,
    testutils::{Address as _, Ledger},
    token::{StellarAssetClient, TokenClient},
    Address, Env, String, Symbol,
};

// ============================================
// MOCK COLLABORATORS
// ============================================

#[contract]
pub struct MockPositionToken;

#[contractimpl]
impl MockPositionToken {
    pub fn mint(env: Env, _round_id: u32, _to: Address, _amount: i128) -> u64 {
        let id: u64 = env
            .storage()
            .instance()
            .get(&Symbol::new(&env, "counter"))
            .unwrap_or(0)
            + 1;
        env.storage().instance().set(&Symbol::new(&env, "counter"), &id);
        id
    }
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum MockTreasuryError {
    Down = 1,
}

#[contract]
pub struct MockFeeTreasury;

#[contractimpl]
impl MockFeeTreasury {
    pub fn set_fail(env: Env, fail: bool) {
        env.storage().instance().set(&Symbol::new(&env, "fail"), &fail);
    }

    pub fn receive_fees(
        env: Env,
        _asset: Address,
        amount: i128,
        _memo: Symbol,
    ) -> Result<(), MockTreasuryError> {
        let fail: bool = env
            .storage()
            .instance()
            .get(&Symbol::new(&env, "fail"))
            .unwrap_or(false);
        if fail {
            return Err(MockTreasuryError::Down);
        }
        let total: i128 = env
            .storage()
            .instance()
            .get(&Symbol::new(&env, "total"))
            .unwrap_or(0);
        env.storage()
            .instance()
            .set(&Symbol::new(&env, "total"), &(total + amount));
        Ok(())
    }

    pub fn total_received(env: Env) -> i128 {
        env.storage()
            .instance()
            .get(&Symbol::new(&env, "total"))
            .unwrap_or(0)
    }
}

// ============================================
// SETUP
// ============================================

struct TestContext {
    env: Env,
    buyer1: Address,
    buyer2: Address,
    seller1: Address,
    seller2: Address,
    asset: Address,
    catalog: catalog::CatalogClient<'static>,
    pool: PoolClient<'static>,
    treasury: MockFeeTreasuryClient<'static>,
    round_id: u32,
}

impl TestContext {
    fn balance(&self, who: &Address) -> i128 {
        TokenClient::new(&self.env, &self.asset).balance(who)
    }

    fn set_time(&self, ts: u64) {
        self.env.ledger().with_mut(|li| li.timestamp = ts);
    }
}

/// Catalog + pool wired for one tranche (3% premium, 10% protocol fee),
/// round announced for [2000, 3000) and opened.
fn setup() -> TestContext {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().with_mut(|li| li.timestamp = 1_000);

    let admin = Address::generate(&env);
    let settlement = Address::generate(&env);
    let yield_facility = Address::generate(&env);
    let buyer1 = Address::generate(&env);
    let buyer2 = Address::generate(&env);
    let seller1 = Address::generate(&env);
    let seller2 = Address::generate(&env);
    let asset_admin = Address::generate(&env);

    let asset_contract = env.register_stellar_asset_contract_v2(asset_admin.clone());
    let asset = asset_contract.address();
    let asset_mint = StellarAssetClient::new(&env, &asset);
    for who in [&buyer1, &buyer2, &seller1, &seller2, &yield_facility] {
        asset_mint.mint(who, &(1_000_000 * SCALE));
    }

    let catalog_id = env.register_contract(None, catalog::Catalog);
    let catalog_client = catalog::CatalogClient::new(&env, &catalog_id);
    catalog_client.initialize(&admin);
    catalog_client.set_settlement(&settlement);

    let product_id = catalog_client.create_product(&String::from_str(&env, "ETH downside cover"));
    let tranche_id = catalog_client.create_tranche(
        &product_id,
        &catalog::TriggerKind::PriceBelow,
        &(1_500 * SCALE),
        &10_000u64,
        &300u32, // 3% premium
        &(100 * SCALE),
        &(50_000 * SCALE),
        &(100_000 * SCALE),
        &Symbol::new(&env, "ETH_USD"),
    );

    let position_token_id = env.register_contract(None, MockPositionToken);
    let treasury_id = env.register_contract(None, MockFeeTreasury);
    let treasury = MockFeeTreasuryClient::new(&env, &treasury_id);

    let pool_id = env.register_contract(None, Pool);
    let pool = PoolClient::new(&env, &pool_id);
    pool.initialize(
        &admin,
        &catalog_id,
        &tranche_id,
        &asset,
        &position_token_id,
        &treasury_id,
        &yield_facility,
        &settlement,
        &1_000u32, // 10% protocol fee
    );
    catalog_client.register_pool(&admin, &tranche_id, &pool_id);

    let round_id = catalog_client.announce_round(&tranche_id, &2_000u64, &3_000u64);
    env.ledger().with_mut(|li| li.timestamp = 2_000);
    catalog_client.open_round(&round_id);

    TestContext {
        env,
        buyer1,
        buyer2,
        seller1,
        seller2,
        asset,
        catalog: catalog_client,
        pool,
        treasury,
        round_id,
    }
}

// ============================================
// ORDER INTAKE
// ============================================

#[test]
fn test_place_order_collects_premium_and_mints_position_token() {
    let ctx = setup();
    let before = ctx.balance(&ctx.buyer1);

    let token_id = ctx.pool.place_order(&ctx.buyer1, &ctx.round_id, &(1_500 * SCALE));
    assert_eq!(token_id, 1);

    // 3% of 1,500 = 45 premium
    assert_eq!(before - ctx.balance(&ctx.buyer1), 45 * SCALE);

    let order = ctx.pool.get_order(&ctx.round_id, &ctx.buyer1);
    assert_eq!(order.amount, 1_500 * SCALE);
    assert_eq!(order.premium_paid, 45 * SCALE);
    assert!(!order.refunded);

    let accounting = ctx.pool.get_accounting();
    assert_eq!(accounting.premium_reserve, 45 * SCALE);
    assert_eq!(accounting.total_assets, 0);
}

#[test]
fn test_order_bounds_and_cap() {
    let ctx = setup();

    // below per-account minimum (100)
    assert_eq!(
        ctx.pool.try_place_order(&ctx.buyer1, &ctx.round_id, &(50 * SCALE)),
        Err(Ok(Error::BelowMinPurchase))
    );
    // above per-account maximum (50,000)
    assert_eq!(
        ctx.pool.try_place_order(&ctx.buyer1, &ctx.round_id, &(60_000 * SCALE)),
        Err(Ok(Error::AboveMaxPurchase))
    );

    // aggregate cap is 100,000
    ctx.pool.place_order(&ctx.buyer1, &ctx.round_id, &(50_000 * SCALE));
    ctx.pool.place_order(&ctx.buyer2, &ctx.round_id, &(50_000 * SCALE));
    let buyer3 = Address::generate(&ctx.env);
    StellarAssetClient::new(&ctx.env, &ctx.asset).mint(&buyer3, &(10_000 * SCALE));
    assert_eq!(
        ctx.pool.try_place_order(&buyer3, &ctx.round_id, &(100 * SCALE)),
        Err(Ok(Error::ExceedsCap))
    );

    // one order per buyer per round
    assert_eq!(
        ctx.pool.try_place_order(&ctx.buyer1, &ctx.round_id, &(100 * SCALE)),
        Err(Ok(Error::OrderExists))
    );
}

#[test]
fn test_intake_rejected_outside_open_window() {
    let ctx = setup();

    // after sales end
    ctx.set_time(3_000);
    assert_eq!(
        ctx.pool.try_place_order(&ctx.buyer1, &ctx.round_id, &(1_500 * SCALE)),
        Err(Ok(Error::SalesEnded))
    );
    assert_eq!(
        ctx.pool
            .try_deposit_collateral(&ctx.seller1, &ctx.round_id, &(1_500 * SCALE)),
        Err(Ok(Error::SalesEnded))
    );
}

#[test]
fn test_deposit_mints_shares_one_to_one_at_inception() {
    let ctx = setup();

    let shares = ctx
        .pool
        .deposit_collateral(&ctx.seller1, &ctx.round_id, &(1_750 * SCALE));
    assert_eq!(shares, 1_750 * SCALE);

    let accounting = ctx.pool.get_accounting();
    assert_eq!(accounting.total_assets, 1_750 * SCALE);
    assert_eq!(accounting.total_shares, 1_750 * SCALE);
    assert_eq!(accounting.nav_per_share, SCALE);

    // one position per seller per round
    assert_eq!(
        ctx.pool
            .try_deposit_collateral(&ctx.seller1, &ctx.round_id, &(100 * SCALE)),
        Err(Ok(Error::PositionExists))
    );
}

// ============================================
// MATCHING
// ============================================

#[test]
fn test_full_match_scenario() {
    let ctx = setup();

    ctx.pool.place_order(&ctx.buyer1, &ctx.round_id, &(1_500 * SCALE));
    ctx.pool
        .deposit_collateral(&ctx.seller1, &ctx.round_id, &(1_500 * SCALE));

    let seller_before = ctx.balance(&ctx.seller1);
    ctx.set_time(3_000);
    let matched = ctx.pool.match_round(&ctx.round_id);
    assert_eq!(matched, 1_500 * SCALE);

    let economics = ctx.pool.get_economics(&ctx.round_id);
    assert_eq!(economics.matched_amount, 1_500 * SCALE);
    assert_eq!(economics.premium_pool, 45 * SCALE);
    // 10% protocol fee on 45 = 4.5
    assert_eq!(economics.protocol_fee, 45 * SCALE / 10);
    assert!(economics.matched);

    // seller received the net premium immediately: 45 - 4.5 = 40.5
    assert_eq!(ctx.balance(&ctx.seller1) - seller_before, 405 * SCALE / 10);
    assert_eq!(ctx.treasury.total_received(), 45 * SCALE / 10);

    // zero refunds
    let order = ctx.pool.get_order(&ctx.round_id, &ctx.buyer1);
    assert_eq!(order.filled_amount, 1_500 * SCALE);
    assert_eq!(order.premium_refunded, 0);
    assert!(!order.refunded);

    let position = ctx.pool.get_position(&ctx.round_id, &ctx.seller1);
    assert_eq!(position.filled_collateral, 1_500 * SCALE);
    assert_eq!(position.shares_locked, 1_500 * SCALE);
    assert_eq!(position.premium_earned, 405 * SCALE / 10);
    assert_eq!(position.collateral_refunded, 0);

    // catalog round advanced to Active with the matched aggregates
    let round = ctx.catalog.get_round(&ctx.round_id);
    assert_eq!(round.state, catalog::RoundState::Active);
    assert_eq!(round.matched_amount, 1_500 * SCALE);

    // all collateral locked, premium reserve drained
    let accounting = ctx.pool.get_accounting();
    assert_eq!(accounting.locked_assets, 1_500 * SCALE);
    assert_eq!(accounting.premium_reserve, 0);
    assert_eq!(accounting.nav_per_share, SCALE);
}

#[test]
fn test_seller_oversupply_refunds_proportionally() {
    let ctx = setup();

    ctx.pool.place_order(&ctx.buyer1, &ctx.round_id, &(1_500 * SCALE));
    ctx.pool
        .deposit_collateral(&ctx.seller1, &ctx.round_id, &(1_750 * SCALE));

    let seller_before = ctx.balance(&ctx.seller1);
    ctx.set_time(3_000);
    ctx.pool.match_round(&ctx.round_id);

    let position = ctx.pool.get_position(&ctx.round_id, &ctx.seller1);
    assert_eq!(position.filled_collateral, 1_500 * SCALE);
    // shares reduced to 1500/1750 of the original mint
    assert_eq!(position.shares_locked, 1_500 * SCALE);
    assert_eq!(position.shares_burned, 250 * SCALE);
    assert_eq!(position.collateral_refunded, 250 * SCALE);
    assert!(position.refunded);

    // 250 principal back plus 40.5 net premium
    assert_eq!(
        ctx.balance(&ctx.seller1) - seller_before,
        250 * SCALE + 405 * SCALE / 10
    );

    // refunds preserve NAV for remaining holders
    let accounting = ctx.pool.get_accounting();
    assert_eq!(accounting.total_assets, 1_500 * SCALE);
    assert_eq!(accounting.total_shares, 1_500 * SCALE);
    assert_eq!(accounting.nav_per_share, SCALE);
}

#[test]
fn test_fcfs_fairness_across_buyers() {
    let ctx = setup();

    // capacity 600 from the seller side
    ctx.pool
        .deposit_collateral(&ctx.seller1, &ctx.round_id, &(600 * SCALE));

    let buyer3 = Address::generate(&ctx.env);
    let buyer4 = Address::generate(&ctx.env);
    let mint = StellarAssetClient::new(&ctx.env, &ctx.asset);
    mint.mint(&buyer3, &(10_000 * SCALE));
    mint.mint(&buyer4, &(10_000 * SCALE));

    ctx.pool.place_order(&ctx.buyer1, &ctx.round_id, &(300 * SCALE));
    ctx.pool.place_order(&ctx.buyer2, &ctx.round_id, &(200 * SCALE));
    ctx.pool.place_order(&buyer3, &ctx.round_id, &(250 * SCALE));
    ctx.pool.place_order(&buyer4, &ctx.round_id, &(100 * SCALE));

    let b3_before = ctx.balance(&buyer3);
    let b4_before = ctx.balance(&buyer4);

    ctx.set_time(3_000);
    let matched = ctx.pool.match_round(&ctx.round_id);
    assert_eq!(matched, 600 * SCALE);

    // first two fill entirely
    assert_eq!(
        ctx.pool.get_order(&ctx.round_id, &ctx.buyer1).filled_amount,
        300 * SCALE
    );
    assert_eq!(
        ctx.pool.get_order(&ctx.round_id, &ctx.buyer2).filled_amount,
        200 * SCALE
    );

    // third crosses the boundary: 100 filled, premium split 3.0 kept / 4.5 back
    let order3 = ctx.pool.get_order(&ctx.round_id, &buyer3);
    assert_eq!(order3.filled_amount, 100 * SCALE);
    assert_eq!(order3.premium_refunded, 45 * SCALE / 10);
    assert!(order3.refunded);
    assert_eq!(ctx.balance(&buyer3) - b3_before, 45 * SCALE / 10);

    // fourth is fully refunded
    let order4 = ctx.pool.get_order(&ctx.round_id, &buyer4);
    assert_eq!(order4.filled_amount, 0);
    assert_eq!(order4.premium_refunded, 3 * SCALE);
    assert_eq!(ctx.balance(&buyer4) - b4_before, 3 * SCALE);

    // premium pool = 9 + 6 + 3 kept; fee 1.8; seller nets 16.2
    let economics = ctx.pool.get_economics(&ctx.round_id);
    assert_eq!(economics.premium_pool, 18 * SCALE);
    assert_eq!(economics.protocol_fee, 18 * SCALE / 10);
    assert_eq!(
        ctx.pool.get_position(&ctx.round_id, &ctx.seller1).premium_earned,
        162 * SCALE / 10
    );
}

#[test]
fn test_unfilled_seller_fully_refunded_with_shares_burned() {
    let ctx = setup();

    ctx.pool.place_order(&ctx.buyer1, &ctx.round_id, &(1_000 * SCALE));
    ctx.pool
        .deposit_collateral(&ctx.seller1, &ctx.round_id, &(1_000 * SCALE));
    ctx.pool
        .deposit_collateral(&ctx.seller2, &ctx.round_id, &(500 * SCALE));

    let s2_before = ctx.balance(&ctx.seller2);
    ctx.set_time(3_000);
    ctx.pool.match_round(&ctx.round_id);

    let position = ctx.pool.get_position(&ctx.round_id, &ctx.seller2);
    assert_eq!(position.filled_collateral, 0);
    assert_eq!(position.shares_locked, 0);
    assert_eq!(position.shares_burned, 500 * SCALE);
    assert_eq!(position.collateral_refunded, 500 * SCALE);
    assert_eq!(position.premium_earned, 0);
    assert_eq!(ctx.balance(&ctx.seller2) - s2_before, 500 * SCALE);

    let accounting = ctx.pool.get_accounting();
    assert_eq!(accounting.total_assets, 1_000 * SCALE);
    assert_eq!(accounting.total_shares, 1_000 * SCALE);
    assert_eq!(accounting.nav_per_share, SCALE);
}

#[test]
fn test_match_round_guards() {
    let ctx = setup();
    ctx.pool.place_order(&ctx.buyer1, &ctx.round_id, &(1_500 * SCALE));
    ctx.pool
        .deposit_collateral(&ctx.seller1, &ctx.round_id, &(1_500 * SCALE));

    // before sales end
    assert_eq!(
        ctx.pool.try_match_round(&ctx.round_id),
        Err(Ok(Error::SalesNotEnded))
    );

    ctx.set_time(3_000);
    ctx.pool.match_round(&ctx.round_id);

    // round is Active now, not Open
    assert_eq!(
        ctx.pool.try_match_round(&ctx.round_id),
        Err(Ok(Error::RoundNotOpen))
    );
}

#[test]
fn test_canceled_round_refunds_all_intake() {
    let ctx = setup();

    let buyer_start = ctx.balance(&ctx.buyer1);
    let seller_start = ctx.balance(&ctx.seller1);
    ctx.pool.place_order(&ctx.buyer1, &ctx.round_id, &(1_500 * SCALE));
    ctx.pool
        .deposit_collateral(&ctx.seller1, &ctx.round_id, &(1_500 * SCALE));

    ctx.catalog.cancel_round(&ctx.round_id);

    // the normal paths are closed off
    ctx.set_time(3_000);
    assert_eq!(
        ctx.pool.try_match_round(&ctx.round_id),
        Err(Ok(Error::RoundNotOpen))
    );
    assert_eq!(
        ctx.pool.try_execute_buyer_payouts(&ctx.round_id),
        Err(Ok(Error::NotMatched))
    );
    assert_eq!(
        ctx.pool.try_release_seller_collateral(&ctx.round_id),
        Err(Ok(Error::NotMatched))
    );

    ctx.pool.refund_canceled_round(&ctx.round_id);

    // everybody is made whole and nothing stays behind
    assert_eq!(ctx.balance(&ctx.buyer1), buyer_start);
    assert_eq!(ctx.balance(&ctx.seller1), seller_start);
    assert_eq!(ctx.balance(&ctx.pool.address), 0);

    let order = ctx.pool.get_order(&ctx.round_id, &ctx.buyer1);
    assert_eq!(order.premium_refunded, 45 * SCALE);
    assert!(order.refunded);

    let position = ctx.pool.get_position(&ctx.round_id, &ctx.seller1);
    assert_eq!(position.collateral_refunded, 1_500 * SCALE);
    assert_eq!(position.shares_burned, position.shares_minted);

    let accounting = ctx.pool.get_accounting();
    assert_eq!(accounting.total_assets, 0);
    assert_eq!(accounting.total_shares, 0);
    assert_eq!(accounting.premium_reserve, 0);
    assert_eq!(accounting.nav_per_share, SCALE);

    // terminal: a second unwind fails with no side effects
    assert_eq!(
        ctx.pool.try_refund_canceled_round(&ctx.round_id),
        Err(Ok(Error::AlreadySettled))
    );
    assert!(ctx.pool.get_economics(&ctx.round_id).settled);
}

#[test]
fn test_refund_requires_canceled_unmatched_round() {
    let ctx = setup();
    ctx.pool.place_order(&ctx.buyer1, &ctx.round_id, &(1_500 * SCALE));
    ctx.pool
        .deposit_collateral(&ctx.seller1, &ctx.round_id, &(1_500 * SCALE));

    // round is still open
    assert_eq!(
        ctx.pool.try_refund_canceled_round(&ctx.round_id),
        Err(Ok(Error::RoundNotCanceled))
    );

    // once matched, cancellation no longer unwinds through this path
    ctx.set_time(3_000);
    ctx.pool.match_round(&ctx.round_id);
    ctx.catalog.cancel_round(&ctx.round_id);
    assert_eq!(
        ctx.pool.try_refund_canceled_round(&ctx.round_id),
        Err(Ok(Error::AlreadyMatched))
    );
}

#[test]
fn test_fee_treasury_outage_does_not_block_matching() {
    let ctx = setup();
    ctx.treasury.set_fail(&true);

    ctx.pool.place_order(&ctx.buyer1, &ctx.round_id, &(1_500 * SCALE));
    ctx.pool
        .deposit_collateral(&ctx.seller1, &ctx.round_id, &(1_500 * SCALE));

    let seller_before = ctx.balance(&ctx.seller1);
    ctx.set_time(3_000);
    ctx.pool.match_round(&ctx.round_id);

    // distribution completed; the fee tokens moved even though the
    // notification failed
    assert_eq!(ctx.balance(&ctx.seller1) - seller_before, 405 * SCALE / 10);
    assert_eq!(ctx.treasury.total_received(), 0);
}

// ============================================
// SETTLEMENT EXECUTION
// ============================================

fn matched_round(ctx: &TestContext) {
    ctx.pool.place_order(&ctx.buyer1, &ctx.round_id, &(1_500 * SCALE));
    ctx.pool
        .deposit_collateral(&ctx.seller1, &ctx.round_id, &(1_500 * SCALE));
    ctx.set_time(3_000);
    ctx.pool.match_round(&ctx.round_id);
}

#[test]
fn test_triggered_payout_pays_buyers_fixed_indemnity() {
    let ctx = setup();
    matched_round(&ctx);

    let buyer_before = ctx.balance(&ctx.buyer1);
    let seller_before = ctx.balance(&ctx.seller1);

    ctx.set_time(10_000);
    let total_paid = ctx.pool.execute_buyer_payouts(&ctx.round_id);
    assert_eq!(total_paid, 1_500 * SCALE);
    assert_eq!(ctx.balance(&ctx.buyer1) - buyer_before, 1_500 * SCALE);
    // no yield accrued, so the seller gets nothing back
    assert_eq!(ctx.balance(&ctx.seller1), seller_before);

    let accounting = ctx.pool.get_accounting();
    assert_eq!(accounting.total_assets, 0);
    assert_eq!(accounting.total_shares, 0);
    assert_eq!(accounting.locked_assets, 0);
    assert_eq!(accounting.nav_per_share, SCALE);

    // terminal: a second settlement attempt fails without side effects
    assert_eq!(
        ctx.pool.try_execute_buyer_payouts(&ctx.round_id),
        Err(Ok(Error::AlreadySettled))
    );
    assert_eq!(
        ctx.pool.try_release_seller_collateral(&ctx.round_id),
        Err(Ok(Error::AlreadySettled))
    );
}

#[test]
fn test_triggered_payout_returns_yield_component_to_sellers() {
    let ctx = setup();
    matched_round(&ctx);

    // 150 yield arrives on the 1,500 locked: NAV 1.1
    ctx.pool.deposit_from_yield(&0i128, &(150 * SCALE));
    assert_eq!(ctx.pool.nav_per_share(), 11 * SCALE / 10);

    let buyer_before = ctx.balance(&ctx.buyer1);
    let seller_before = ctx.balance(&ctx.seller1);

    ctx.set_time(10_000);
    let total_paid = ctx.pool.execute_buyer_payouts(&ctx.round_id);
    assert_eq!(total_paid, 1_500 * SCALE);
    assert_eq!(ctx.balance(&ctx.buyer1) - buyer_before, 1_500 * SCALE);
    // seller keeps the yield component: 1,500 × 1.1 − 1,500 = 150
    assert_eq!(ctx.balance(&ctx.seller1) - seller_before, 150 * SCALE);

    let accounting = ctx.pool.get_accounting();
    assert_eq!(accounting.total_assets, 0);
    assert_eq!(accounting.total_shares, 0);
}

#[test]
fn test_release_returns_collateral_plus_yield() {
    let ctx = setup();
    matched_round(&ctx);

    ctx.pool.deposit_from_yield(&0i128, &(150 * SCALE));

    let seller_before = ctx.balance(&ctx.seller1);
    ctx.set_time(10_000);
    ctx.pool.release_seller_collateral(&ctx.round_id);

    // collateral plus yield at NAV 1.1
    assert_eq!(ctx.balance(&ctx.seller1) - seller_before, 1_650 * SCALE);

    let accounting = ctx.pool.get_accounting();
    assert_eq!(accounting.total_assets, 0);
    assert_eq!(accounting.total_shares, 0);
    assert_eq!(accounting.locked_assets, 0);
    assert!(ctx.pool.get_economics(&ctx.round_id).settled);
}

#[test]
fn test_settlement_requires_matched_round() {
    let ctx = setup();

    // no intake ever happened for this round id
    assert_eq!(
        ctx.pool.try_execute_buyer_payouts(&99u32),
        Err(Ok(Error::EconomicsNotFound))
    );

    ctx.pool.place_order(&ctx.buyer1, &ctx.round_id, &(1_500 * SCALE));
    ctx.pool
        .deposit_collateral(&ctx.seller1, &ctx.round_id, &(1_500 * SCALE));
    // intake recorded economics, but matching has not run
    assert_eq!(
        ctx.pool.try_release_seller_collateral(&ctx.round_id),
        Err(Ok(Error::NotMatched))
    );
}

#[test]
fn test_conservation_over_a_settled_round() {
    let ctx = setup();

    // buyer 1,500 (premium 45), sellers 1,000 + 750 → 250 refunded
    ctx.pool.place_order(&ctx.buyer1, &ctx.round_id, &(1_500 * SCALE));
    ctx.pool
        .deposit_collateral(&ctx.seller1, &ctx.round_id, &(1_000 * SCALE));
    ctx.pool
        .deposit_collateral(&ctx.seller2, &ctx.round_id, &(750 * SCALE));

    let pool_address = ctx.pool.address.clone();
    let inflow = 45 * SCALE + 1_750 * SCALE;
    assert_eq!(ctx.balance(&pool_address), inflow);

    ctx.set_time(3_000);
    ctx.pool.match_round(&ctx.round_id);
    ctx.set_time(10_000);
    ctx.pool.execute_buyer_payouts(&ctx.round_id);

    // every inflow left the pool: refund 250, fee 4.5, premiums 40.5,
    // buyer payout 1,500
    assert_eq!(ctx.balance(&pool_address), 0);
    assert_eq!(ctx.pool.get_accounting().total_assets, 0);
}

// ============================================
// YIELD ROUTING
// ============================================

#[test]
fn test_yield_round_trip_raises_nav() {
    let ctx = setup();

    ctx.pool
        .deposit_collateral(&ctx.seller1, &ctx.round_id, &(500 * SCALE));
    assert_eq!(ctx.pool.nav_per_share(), SCALE);
    assert_eq!(ctx.pool.available_for_yield(), 500 * SCALE);

    ctx.pool.withdraw_for_yield(&(500 * SCALE));
    let accounting = ctx.pool.get_accounting();
    assert_eq!(accounting.deployed_to_yield, 500 * SCALE);
    // deployed principal is still owned; NAV unchanged
    assert_eq!(accounting.total_assets, 500 * SCALE);
    assert_eq!(accounting.nav_per_share, SCALE);
    assert_eq!(ctx.pool.available_for_yield(), 0);

    ctx.pool.deposit_from_yield(&(500 * SCALE), &(50 * SCALE));
    let accounting = ctx.pool.get_accounting();
    assert_eq!(accounting.deployed_to_yield, 0);
    assert_eq!(accounting.total_assets, 550 * SCALE);
    assert_eq!(accounting.total_shares, 500 * SCALE);
    assert_eq!(accounting.nav_per_share, 11 * SCALE / 10);
    assert_eq!(accounting.cumulative_yield, 50 * SCALE);
}

#[test]
fn test_yield_cannot_draw_locked_collateral() {
    let ctx = setup();
    matched_round(&ctx);

    // all 1,500 is locked against coverage
    assert_eq!(ctx.pool.available_for_yield(), 0);
    assert_eq!(
        ctx.pool.try_withdraw_for_yield(&(1 * SCALE)),
        Err(Ok(Error::InsufficientAvailable))
    );
}

#[test]
fn test_yield_principal_over_return_rejected() {
    let ctx = setup();
    ctx.pool
        .deposit_collateral(&ctx.seller1, &ctx.round_id, &(500 * SCALE));
    ctx.pool.withdraw_for_yield(&(200 * SCALE));

    assert_eq!(
        ctx.pool.try_deposit_from_yield(&(300 * SCALE), &0i128),
        Err(Ok(Error::PrincipalMismatch))
    );
    ctx.pool.deposit_from_yield(&(200 * SCALE), &0i128);
    assert_eq!(ctx.pool.get_accounting().deployed_to_yield, 0);
}

// ============================================
// OPERATIONAL
// ============================================

#[test]
fn test_paused_blocks_value_movement() {
    let ctx = setup();
    ctx.pool.pause();

    assert_eq!(
        ctx.pool.try_place_order(&ctx.buyer1, &ctx.round_id, &(1_500 * SCALE)),
        Err(Ok(Error::ContractPaused))
    );
    assert_eq!(
        ctx.pool
            .try_deposit_collateral(&ctx.seller1, &ctx.round_id, &(1_500 * SCALE)),
        Err(Ok(Error::ContractPaused))
    );

    ctx.pool.unpause();
    ctx.pool.place_order(&ctx.buyer1, &ctx.round_id, &(1_500 * SCALE));
}
