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

    // ============================================
    // LOOKUP ERRORS (20-29)
    // ============================================
    /// Round not found in the catalog
    RoundNotFound = 20,
    /// Tranche not found in the catalog
    TrancheNotFound = 21,
    /// No order for this (round, buyer)
    OrderNotFound = 22,
    /// No position for this (round, seller)
    PositionNotFound = 23,
    /// No economics recorded for this round
    EconomicsNotFound = 24,
    /// Round belongs to a different tranche than this pool serves
    WrongTranche = 25,

    // ============================================
    // STATE ERRORS (30-39)
    // ============================================
    /// Round is not open for orders
    RoundNotOpen = 30,
    /// Sales window has already closed
    SalesEnded = 31,
    /// Sales window has not closed yet
    SalesNotEnded = 32,
    /// Matching already ran for this round
    AlreadyMatched = 33,
    /// Matching has not run for this round
    NotMatched = 34,
    /// Round already settled
    AlreadySettled = 35,
    /// An order already exists for this buyer in this round
    OrderExists = 36,
    /// A position already exists for this seller in this round
    PositionExists = 37,
    /// Round is not canceled in the catalog
    RoundNotCanceled = 38,

    // ============================================
    // AMOUNT ERRORS (40-49)
    // ============================================
    /// Amount must be positive
    InvalidAmount = 40,
    /// Purchase below the tranche's per-account minimum
    BelowMinPurchase = 41,
    /// Purchase above the tranche's per-account maximum
    AboveMaxPurchase = 42,
    /// Aggregate demand would exceed the tranche cap
    ExceedsCap = 43,
    /// Arithmetic overflow
    Overflow = 44,
    /// Requested amount exceeds assets available for yield deployment
    InsufficientAvailable = 45,
    /// Returned principal exceeds what was deployed
    PrincipalMismatch = 46,

    // ============================================
    // OPERATIONAL ERRORS (50-59)
    // ============================================
    /// Contract is paused
    ContractPaused = 50,
    /// Re-entrant call into a guarded operation
    Reentrancy = 51,
}
