use soroban_sdk::{contracttype, Address};

#[contracttype]
#[derive(Clone, Debug)]
pub struct ObservationRequestedEvent {
    pub round_id: u32,
    pub tranche_id: u32,
    pub maturity: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct ObservationResolvedEvent {
    pub round_id: u32,
    pub oracle_value: i128,
    pub oracle_decimals: u32,
    pub triggered: bool,
    pub liveness_deadline: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct DisputeOpenedEvent {
    pub round_id: u32,
    pub disputer: Address,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct DisputeResolvedEvent {
    pub round_id: u32,
    pub oracle_value: i128,
    pub triggered: bool,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct RoundFinalizedEvent {
    pub round_id: u32,
    pub triggered: bool,
    pub total_payouts: i128,
}
