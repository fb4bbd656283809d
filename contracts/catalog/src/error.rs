use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // ============================================
    // INITIALIZATION ERRORS (1-9)
    // ============================================
    /// Contract already initialized
    AlreadyInitialized = 1,
    /// Contract not initialized
    NotInitialized = 2,

    // ============================================
    // AUTHORIZATION ERRORS (10-19)
    // ============================================
    /// Caller lacks the required role for this operation
    Unauthorized = 10,
    /// No pool registered for this tranche
    PoolNotRegistered = 11,
    /// A pool is already registered for this tranche
    PoolAlreadyRegistered = 12,

    // ============================================
    // LOOKUP ERRORS (20-29)
    // ============================================
    /// Product not found
    ProductNotFound = 20,
    /// Tranche not found
    TrancheNotFound = 21,
    /// Round not found
    RoundNotFound = 22,

    // ============================================
    // STATE ERRORS (30-39)
    // ============================================
    /// Product is deactivated
    ProductInactive = 30,
    /// Tranche is deactivated
    TrancheInactive = 31,
    /// Round is not in the state this transition requires
    InvalidRoundState = 32,
    /// The tranche's previous round is not yet settled or canceled
    PriorRoundUnresolved = 33,
    /// Tranche economic terms are frozen after the first round
    TrancheFrozen = 34,

    // ============================================
    // PARAMETER ERRORS (40-49)
    // ============================================
    /// Sales window must be entirely in the future with start < end
    InvalidWindow = 40,
    /// Premium rate must be <= 10,000 basis points
    InvalidPremiumRate = 41,
    /// Purchase bounds must satisfy 0 < min <= max
    InvalidPurchaseBounds = 42,
    /// Aggregate cap must be positive
    InvalidCap = 43,
    /// Maturity must be in the future and after the sales window
    InvalidMaturity = 44,
    /// Trigger kind is declared but not supported for new tranches
    UnsupportedTrigger = 45,
    /// Matched amount exceeds min(demand, supply)
    InvalidMatchedAmount = 46,

    // ============================================
    // TIMING ERRORS (50-59)
    // ============================================
    /// Sales window has not opened yet
    SalesNotStarted = 50,
    /// Sales window has not closed yet
    SalesNotEnded = 51,

    // ============================================
    // OPERATIONAL ERRORS (60-69)
    // ============================================
    /// Contract is paused
    ContractPaused = 60,
}
