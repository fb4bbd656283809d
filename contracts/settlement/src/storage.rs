use soroban_sdk::{contracttype, Address};

/// Fixed-point scale used for tranche thresholds (7 decimals).
pub const SCALE: i128 = 10_000_000;
pub const SCALE_DECIMALS: u32 = 7;

/// Oracle lifecycle for one round's observation.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OracleStatus {
    /// Observation requested but no usable value yet; waiting for a push
    Requested = 0,
    /// A value is on record and the liveness clock is running
    Resolved = 1,
    /// The recorded value is contested; only the admin may resolve
    Disputed = 2,
}

/// Per-round settlement record.
#[contracttype]
#[derive(Clone, Debug)]
pub struct SettlementInfo {
    pub round_id: u32,
    pub status: OracleStatus,
    pub observed_at: u64,
    pub oracle_value: i128,
    pub oracle_decimals: u32,
    pub triggered: bool,
    pub settled: bool,
    pub total_payouts: i128,
    /// Earliest time finalize may run; reset whenever the value changes
    pub liveness_deadline: u64,
    /// Set when a dispute was overturned by the admin
    pub resolver: Option<Address>,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Catalog,
    PriceRouter,
    Oracle,
    LivenessWindow,
    DisputeWindow,
    Settlement(u32),
    Initialized,
    Paused,
}
