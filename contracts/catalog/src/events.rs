use soroban_sdk::{contracttype, Address, String};

use crate::storage::{RoundState, TriggerKind};

#[contracttype]
#[derive(Clone, Debug)]
pub struct ProductCreatedEvent {
    pub product_id: u32,
    pub name: String,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct TrancheCreatedEvent {
    pub tranche_id: u32,
    pub product_id: u32,
    pub trigger: TriggerKind,
    pub threshold: i128,
    pub maturity: u64,
    pub premium_rate_bps: u32,
    pub cap: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PoolRegisteredEvent {
    pub tranche_id: u32,
    pub pool: Address,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct RoundAnnouncedEvent {
    pub round_id: u32,
    pub tranche_id: u32,
    pub sales_start: u64,
    pub sales_end: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct RoundStateEvent {
    pub round_id: u32,
    pub old_state: RoundState,
    pub new_state: RoundState,
    pub timestamp: u64,
}
