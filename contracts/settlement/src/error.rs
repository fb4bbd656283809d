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
    /// No settlement record for this round
    SettlementNotFound = 22,
    /// No pool registered for the round's tranche
    PoolNotRegistered = 23,

    // ============================================
    // STATE ERRORS (30-39)
    // ============================================
    /// Round has not reached maturity (or is not active)
    NotMatured = 30,
    /// An observation already exists for this round
    AlreadyRequested = 31,
    /// Record is not awaiting a pushed result
    NotRequested = 32,
    /// No resolved value on record (or a dispute is pending)
    NotResolved = 33,
    /// Round already finalized
    AlreadySettled = 34,
    /// No open dispute to rule on
    NotDisputed = 35,

    // ============================================
    // WINDOW ERRORS (40-49)
    // ============================================
    /// The liveness period has not elapsed
    LivenessNotElapsed = 40,
    /// Past the dispute window
    DisputeWindowClosed = 41,

    // ============================================
    // ORACLE ERRORS (50-59)
    // ============================================
    /// The price router call failed
    OracleRequestFailed = 50,
    /// Submitted observation is malformed
    InvalidObservation = 51,

    // ============================================
    // ARITHMETIC ERRORS (60-69)
    // ============================================
    /// Arithmetic overflow
    Overflow = 60,

    // ============================================
    // OPERATIONAL ERRORS (70-79)
    // ============================================
    /// Contract is paused
    ContractPaused = 70,
    /// Window configuration is invalid
    InvalidWindow = 71,
}
