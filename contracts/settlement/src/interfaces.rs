//! Typed clients for the catalog, the pools, and the price router.
//!
//! The view structs mirror the catalog's `#[contracttype]` layouts field for
//! field so they decode from the same ledger representation.

use soroban_sdk::{contractclient, contracttype, Address, Env, Symbol};

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TriggerKind {
    PriceBelow = 0,
    PriceAbove = 1,
    Relative = 2,
    Boolean = 3,
    Custom = 4,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoundState {
    Announced = 0,
    Open = 1,
    Active = 2,
    Matured = 3,
    Settled = 4,
    Canceled = 5,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct Tranche {
    pub id: u32,
    pub product_id: u32,
    pub trigger: TriggerKind,
    pub threshold: i128,
    pub maturity: u64,
    pub premium_rate_bps: u32,
    pub min_purchase: i128,
    pub max_purchase: i128,
    pub cap: i128,
    pub price_route: Symbol,
    pub active: bool,
    pub round_count: u32,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct Round {
    pub id: u32,
    pub tranche_id: u32,
    pub sales_start: u64,
    pub sales_end: u64,
    pub state: RoundState,
    pub total_demand: i128,
    pub total_supply: i128,
    pub matched_amount: i128,
    pub created_at: u64,
    pub updated_at: u64,
}

/// One observation from the price router.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriceData {
    pub price: i128,
    pub decimals: u32,
    pub timestamp: u64,
    /// False when the router has no usable value for the requested time
    pub valid: bool,
}

/// The catalog operations this authority consumes.
#[contractclient(name = "CatalogClient")]
pub trait CatalogInterface {
    fn get_round(env: Env, round_id: u32) -> Round;
    fn get_tranche(env: Env, tranche_id: u32) -> Tranche;
    fn get_pool(env: Env, tranche_id: u32) -> Address;
    fn mature_round(env: Env, round_id: u32);
    fn settle_round(env: Env, round_id: u32);
}

/// The pool operations run at finalization.
#[contractclient(name = "PoolClient")]
pub trait PoolInterface {
    fn execute_buyer_payouts(env: Env, round_id: u32) -> i128;
    fn release_seller_collateral(env: Env, round_id: u32);
}

/// Pull-based price source keyed by route symbol.
#[contractclient(name = "PriceRouterClient")]
pub trait PriceRouterInterface {
    fn get_price_at(env: Env, route: Symbol, timestamp: u64) -> PriceData;
}
