use soroban_sdk::{contracttype, String, Symbol, Vec};

// Constants
pub const SCALE: i128 = 10_000_000; // 7 decimals
pub const BASIS_POINTS: u32 = 10_000; // 100% = 10,000 basis points

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TriggerKind {
    /// Triggers when the observed value is strictly below the threshold
    PriceBelow = 0,
    /// Triggers when the observed value is strictly above the threshold
    PriceAbove = 1,
    /// Relative-move trigger (declared, not yet supported)
    Relative = 2,
    /// Observed value is interpreted as 0/1
    Boolean = 3,
    /// Custom trigger (declared, not yet supported)
    Custom = 4,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoundState {
    /// Round announced, sales window not yet open
    Announced = 0,
    /// Sales window open, pool accepts orders and collateral
    Open = 1,
    /// Matched, coverage active until maturity
    Active = 2,
    /// Maturity reached, awaiting settlement outcome
    Matured = 3,
    /// Settlement executed, terminal
    Settled = 4,
    /// Administratively canceled, terminal
    Canceled = 5,
}

impl RoundState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoundState::Settled | RoundState::Canceled)
    }
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct Product {
    /// Unique product identifier
    pub id: u32,
    /// Human-readable coverage category name
    pub name: String,
    /// Tranches issued under this product, in creation order
    pub tranche_ids: Vec<u32>,
    /// Soft-deactivation flag; products are never deleted
    pub active: bool,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct Tranche {
    /// Unique tranche identifier
    pub id: u32,
    /// Owning product
    pub product_id: u32,
    /// Trigger condition kind
    pub trigger: TriggerKind,
    /// Trigger threshold, SCALE fixed-point
    pub threshold: i128,
    /// Unix timestamp of coverage maturity
    pub maturity: u64,
    /// Premium as basis points of purchase amount
    pub premium_rate_bps: u32,
    /// Minimum purchase per account per round
    pub min_purchase: i128,
    /// Maximum purchase per account per round
    pub max_purchase: i128,
    /// Aggregate coverage cap per round
    pub cap: i128,
    /// Identifier of the external price route to observe
    pub price_route: Symbol,
    /// Soft-deactivation flag
    pub active: bool,
    /// Rounds announced so far; economic terms freeze once > 0
    pub round_count: u32,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct Round {
    /// Unique round identifier
    pub id: u32,
    /// Tranche this round sells coverage for
    pub tranche_id: u32,
    /// Sales window start (inclusive)
    pub sales_start: u64,
    /// Sales window end (exclusive for order intake)
    pub sales_end: u64,
    /// Lifecycle state
    pub state: RoundState,
    /// Aggregate buyer demand, recorded at close
    pub total_demand: i128,
    /// Aggregate seller supply, recorded at close
    pub total_supply: i128,
    /// Matched coverage notional, fixed once set
    pub matched_amount: i128,
    /// Creation timestamp
    pub created_at: u64,
    /// Timestamp of the last state change
    pub updated_at: u64,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Settlement,
    Factory,
    Product(u32),
    ProductCounter,
    Tranche(u32),
    TrancheCounter,
    Round(u32),
    RoundCounter,
    /// Pool contract registered for a tranche
    Pool(u32),
    /// Most recent round announced for a tranche
    LastRound(u32),
    Initialized,
    Paused,
}
