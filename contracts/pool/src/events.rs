use soroban_sdk::{contracttype, Address};

#[contracttype]
#[derive(Clone, Debug)]
pub struct OrderPlacedEvent {
    pub round_id: u32,
    pub buyer: Address,
    pub amount: i128,
    pub premium: i128,
    pub position_token_id: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct CollateralDepositedEvent {
    pub round_id: u32,
    pub seller: Address,
    pub amount: i128,
    pub shares_minted: i128,
    pub nav_per_share: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct RoundMatchedEvent {
    pub round_id: u32,
    pub total_demand: i128,
    pub total_supply: i128,
    pub matched_amount: i128,
    pub premium_pool: i128,
    pub protocol_fee: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct BuyerPayoutsEvent {
    pub round_id: u32,
    pub total_paid: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct CollateralReleasedEvent {
    pub round_id: u32,
    pub total_released: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct CanceledRoundRefundEvent {
    pub round_id: u32,
    pub premiums_refunded: i128,
    pub collateral_refunded: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct YieldWithdrawnEvent {
    pub amount: i128,
    pub deployed_to_yield: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct YieldDepositedEvent {
    pub principal: i128,
    pub yield_amount: i128,
    pub nav_per_share: i128,
}
