use soroban_sdk::{contracttype, Address};

// Constants
pub const SCALE: i128 = 10_000_000; // 7 decimals
pub const BASIS_POINTS: i128 = 10_000; // 100% = 10,000 basis points

#[contracttype]
#[derive(Clone, Debug)]
pub struct BuyerOrder {
    /// Buyer account
    pub buyer: Address,
    /// Requested purchase amount (coverage notional)
    pub amount: i128,
    /// Premium transferred in at placement
    pub premium_paid: i128,
    /// Position token minted for this order
    pub position_token_id: u64,
    /// Portion of `amount` actually matched (set once at matching)
    pub filled_amount: i128,
    /// Premium returned for the unmatched portion
    pub premium_refunded: i128,
    /// Refund processed; never mutated afterwards
    pub refunded: bool,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct SellerPosition {
    /// Seller account
    pub seller: Address,
    /// Collateral deposited
    pub collateral: i128,
    /// Shares minted at deposit, at the then-current NAV
    pub shares_minted: i128,
    /// Collateral portion backing matched coverage (set once at matching)
    pub filled_collateral: i128,
    /// Shares locked against the filled portion
    pub shares_locked: i128,
    /// Premium received at distribution
    pub premium_earned: i128,
    /// Collateral returned for the unmatched portion
    pub collateral_refunded: i128,
    /// Shares burned with the refund
    pub shares_burned: i128,
    /// Refund processed; never mutated afterwards
    pub refunded: bool,
}

/// Per-round aggregates, derived from order/position records.
#[contracttype]
#[derive(Clone, Debug)]
pub struct RoundEconomics {
    /// Aggregate buyer demand
    pub total_demand: i128,
    /// Aggregate seller supply
    pub total_supply: i128,
    /// min(demand, supply), fixed once matching runs
    pub matched_amount: i128,
    /// Collateral locked against matched coverage
    pub locked_collateral: i128,
    /// Premiums attributable to matched coverage
    pub premium_pool: i128,
    /// Protocol fee taken from the premium pool
    pub protocol_fee: i128,
    /// Matching has run
    pub matched: bool,
    /// Payout/release has run; terminal
    pub settled: bool,
}

impl RoundEconomics {
    pub fn empty() -> Self {
        RoundEconomics {
            total_demand: 0,
            total_supply: 0,
            matched_amount: 0,
            locked_collateral: 0,
            premium_pool: 0,
            protocol_fee: 0,
            matched: false,
            settled: false,
        }
    }
}

/// Pool-wide accounting singleton. Mutators read-modify-write the whole
/// record; `nav_per_share == total_assets * SCALE / total_shares` whenever
/// `total_shares > 0`.
#[contracttype]
#[derive(Clone, Debug)]
pub struct PoolAccounting {
    /// Seller collateral plus accrued yield
    pub total_assets: i128,
    /// Outstanding ownership shares
    pub total_shares: i128,
    /// Assets committed to active coverage
    pub locked_assets: i128,
    /// Premiums held between placement and distribution
    pub premium_reserve: i128,
    /// SCALE fixed-point exchange rate, 1:1 at inception
    pub nav_per_share: i128,
    /// Timestamp of the last balance-affecting mutation
    pub last_update: u64,
    /// Principal currently out at the yield facility
    pub deployed_to_yield: i128,
    /// Lifetime yield received back
    pub cumulative_yield: i128,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Catalog,
    TrancheId,
    Asset,
    PositionToken,
    FeeTreasury,
    YieldFacility,
    Settlement,
    FeeBps,
    Order(u32, Address),  // (round_id, buyer)
    BuyerQueue(u32),      // round_id → Vec<Address>, placement order
    Position(u32, Address), // (round_id, seller)
    SellerQueue(u32),     // round_id → Vec<Address>, placement order
    Economics(u32),       // round_id → RoundEconomics
    Accounting,
    Initialized,
    Paused,
    Guard,
}
