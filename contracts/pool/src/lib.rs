#![no_std]

mod error;
mod events;
mod interfaces;
mod matching;
mod nav;
mod storage;

#[cfg(test)]
mod test;

pub use error::Error;
pub use storage::{BuyerOrder, PoolAccounting, RoundEconomics, SellerPosition, SCALE};

use events::*;
use interfaces::{CatalogClient, FeeTreasuryClient, PositionTokenClient, RoundState};
use matching::{allocate_fcfs, proportional, FillOutcome};
use storage::{DataKey, BASIS_POINTS};

use soroban_sdk::{contract, contractimpl, token, Address, Env, Symbol, Vec};

#[contract]
pub struct Pool;

#[contractimpl]
impl Pool {
    // ============================================
    // INITIALIZATION & ADMIN
    // ============================================

    /// Initialize the pool for one tranche
    ///
    /// Every collaborator is wired explicitly; there is no ambient registry.
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    pub fn initialize(
        env: Env,
        admin: Address,
        catalog: Address,
        tranche_id: u32,
        asset: Address,
        position_token: Address,
        fee_treasury: Address,
        yield_facility: Address,
        settlement: Address,
        protocol_fee_bps: u32,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }
        if i128::from(protocol_fee_bps) > BASIS_POINTS {
            return Err(Error::InvalidAmount);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Catalog, &catalog);
        env.storage().instance().set(&DataKey::TrancheId, &tranche_id);
        env.storage().instance().set(&DataKey::Asset, &asset);
        env.storage()
            .instance()
            .set(&DataKey::PositionToken, &position_token);
        env.storage()
            .instance()
            .set(&DataKey::FeeTreasury, &fee_treasury);
        env.storage()
            .instance()
            .set(&DataKey::YieldFacility, &yield_facility);
        env.storage()
            .instance()
            .set(&DataKey::Settlement, &settlement);
        env.storage().instance().set(&DataKey::FeeBps, &protocol_fee_bps);
        env.storage().instance().set(&DataKey::Paused, &false);

        let accounting = PoolAccounting {
            total_assets: 0,
            total_shares: 0,
            locked_assets: 0,
            premium_reserve: 0,
            nav_per_share: SCALE,
            last_update: env.ledger().timestamp(),
            deployed_to_yield: 0,
            cumulative_yield: 0,
        };
        env.storage().instance().set(&DataKey::Accounting, &accounting);

        Ok(())
    }

    pub fn pause(env: Env) -> Result<(), Error> {
        Self::require_admin(&env)?;
        env.storage().instance().set(&DataKey::Paused, &true);
        Ok(())
    }

    pub fn unpause(env: Env) -> Result<(), Error> {
        Self::require_admin(&env)?;
        env.storage().instance().set(&DataKey::Paused, &false);
        Ok(())
    }

    // ============================================
    // SALES WINDOW: ORDERS & COLLATERAL
    // ============================================

    /// Place a buyer order; one per account per round
    ///
    /// Transfers the premium in and mints a position token. Returns the
    /// position token id.
    ///
    /// # Errors
    /// - `RoundNotOpen` / `SalesEnded`: outside the open window
    /// - `BelowMinPurchase` / `AboveMaxPurchase`: per-account bounds
    /// - `ExceedsCap`: aggregate demand would exceed the tranche cap
    /// - `OrderExists`: this buyer already ordered in this round
    pub fn place_order(
        env: Env,
        buyer: Address,
        round_id: u32,
        amount: i128,
    ) -> Result<u64, Error> {
        Self::check_not_paused(&env)?;
        Self::enter_guard(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        buyer.require_auth();

        let round = Self::load_round(&env, round_id)?;
        if round.state != RoundState::Open {
            return Err(Error::RoundNotOpen);
        }
        if env.ledger().timestamp() >= round.sales_end {
            return Err(Error::SalesEnded);
        }

        let tranche = Self::load_tranche(&env, round.tranche_id)?;
        if amount < tranche.min_purchase {
            return Err(Error::BelowMinPurchase);
        }
        if amount > tranche.max_purchase {
            return Err(Error::AboveMaxPurchase);
        }

        let order_key = DataKey::Order(round_id, buyer.clone());
        if env.storage().instance().has(&order_key) {
            return Err(Error::OrderExists);
        }

        let mut economics = Self::load_economics_or_empty(&env, round_id);
        let new_demand = economics
            .total_demand
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        if new_demand > tranche.cap {
            return Err(Error::ExceedsCap);
        }

        let premium = proportional(amount, i128::from(tranche.premium_rate_bps), BASIS_POINTS)
            .ok_or(Error::Overflow)?;

        let asset = Self::asset_client(&env)?;
        asset.transfer(&buyer, &env.current_contract_address(), &premium);

        let position_token: Address = env
            .storage()
            .instance()
            .get(&DataKey::PositionToken)
            .ok_or(Error::NotInitialized)?;
        let token_id =
            PositionTokenClient::new(&env, &position_token).mint(&round_id, &buyer, &amount);

        let order = BuyerOrder {
            buyer: buyer.clone(),
            amount,
            premium_paid: premium,
            position_token_id: token_id,
            filled_amount: 0,
            premium_refunded: 0,
            refunded: false,
        };
        env.storage().instance().set(&order_key, &order);

        let mut queue: Vec<Address> = env
            .storage()
            .instance()
            .get(&DataKey::BuyerQueue(round_id))
            .unwrap_or(Vec::new(&env));
        queue.push_back(buyer.clone());
        env.storage()
            .instance()
            .set(&DataKey::BuyerQueue(round_id), &queue);

        economics.total_demand = new_demand;
        Self::store_economics(&env, round_id, &economics);

        let mut accounting = Self::load_accounting(&env)?;
        accounting.premium_reserve = accounting
            .premium_reserve
            .checked_add(premium)
            .ok_or(Error::Overflow)?;
        Self::store_accounting(&env, &mut accounting)?;

        env.events().publish(
            (Symbol::new(&env, "order_placed"), round_id, buyer.clone()),
            OrderPlacedEvent {
                round_id,
                buyer,
                amount,
                premium,
                position_token_id: token_id,
            },
        );

        Self::exit_guard(&env);
        Ok(token_id)
    }

    /// Deposit seller collateral; one position per account per round
    ///
    /// Shares are minted at the current NAV. Returns the shares minted.
    pub fn deposit_collateral(
        env: Env,
        seller: Address,
        round_id: u32,
        amount: i128,
    ) -> Result<i128, Error> {
        Self::check_not_paused(&env)?;
        Self::enter_guard(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        seller.require_auth();

        let round = Self::load_round(&env, round_id)?;
        if round.state != RoundState::Open {
            return Err(Error::RoundNotOpen);
        }
        if env.ledger().timestamp() >= round.sales_end {
            return Err(Error::SalesEnded);
        }

        let position_key = DataKey::Position(round_id, seller.clone());
        if env.storage().instance().has(&position_key) {
            return Err(Error::PositionExists);
        }

        let mut accounting = Self::load_accounting(&env)?;
        let shares = nav::shares_for_deposit(amount, accounting.nav_per_share)
            .ok_or(Error::Overflow)?;

        let asset = Self::asset_client(&env)?;
        asset.transfer(&seller, &env.current_contract_address(), &amount);

        accounting.total_assets = accounting
            .total_assets
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        accounting.total_shares = accounting
            .total_shares
            .checked_add(shares)
            .ok_or(Error::Overflow)?;
        Self::store_accounting(&env, &mut accounting)?;

        let position = SellerPosition {
            seller: seller.clone(),
            collateral: amount,
            shares_minted: shares,
            filled_collateral: 0,
            shares_locked: 0,
            premium_earned: 0,
            collateral_refunded: 0,
            shares_burned: 0,
            refunded: false,
        };
        env.storage().instance().set(&position_key, &position);

        let mut queue: Vec<Address> = env
            .storage()
            .instance()
            .get(&DataKey::SellerQueue(round_id))
            .unwrap_or(Vec::new(&env));
        queue.push_back(seller.clone());
        env.storage()
            .instance()
            .set(&DataKey::SellerQueue(round_id), &queue);

        let mut economics = Self::load_economics_or_empty(&env, round_id);
        economics.total_supply = economics
            .total_supply
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        Self::store_economics(&env, round_id, &economics);

        env.events().publish(
            (Symbol::new(&env, "collateral_deposited"), round_id, seller.clone()),
            CollateralDepositedEvent {
                round_id,
                seller,
                amount,
                shares_minted: shares,
                nav_per_share: accounting.nav_per_share,
            },
        );

        Self::exit_guard(&env);
        Ok(shares)
    }

    // ============================================
    // MATCHING & PREMIUM DISTRIBUTION
    // ============================================

    /// Run matching once the sales window has closed (keeper-callable)
    ///
    /// matched = min(demand, supply); buyers and sellers fill FCFS by
    /// placement order, the boundary entry splits proportionally, the rest
    /// refunds in full. The protocol fee is routed to the treasury and the
    /// remaining premium is pushed pro-rata to filled sellers. Finally the
    /// catalog round advances Open → Active.
    pub fn match_round(env: Env, round_id: u32) -> Result<i128, Error> {
        Self::check_not_paused(&env)?;
        Self::enter_guard(&env)?;

        let round = Self::load_round(&env, round_id)?;
        let expected_tranche: u32 = env
            .storage()
            .instance()
            .get(&DataKey::TrancheId)
            .ok_or(Error::NotInitialized)?;
        if round.tranche_id != expected_tranche {
            return Err(Error::WrongTranche);
        }
        if round.state != RoundState::Open {
            return Err(Error::RoundNotOpen);
        }
        if env.ledger().timestamp() < round.sales_end {
            return Err(Error::SalesNotEnded);
        }

        let mut economics = Self::load_economics_or_empty(&env, round_id);
        if economics.matched {
            return Err(Error::AlreadyMatched);
        }

        let matched = economics.total_demand.min(economics.total_supply);
        let asset = Self::asset_client(&env)?;
        let mut accounting = Self::load_accounting(&env)?;

        let buyer_queue: Vec<Address> = env
            .storage()
            .instance()
            .get(&DataKey::BuyerQueue(round_id))
            .unwrap_or(Vec::new(&env));
        let seller_queue: Vec<Address> = env
            .storage()
            .instance()
            .get(&DataKey::SellerQueue(round_id))
            .unwrap_or(Vec::new(&env));

        // Buyer pass: outcomes in placement order, then applied exactly once.
        let mut buyer_amounts: Vec<i128> = Vec::new(&env);
        for buyer in buyer_queue.iter() {
            let order: BuyerOrder = env
                .storage()
                .instance()
                .get(&DataKey::Order(round_id, buyer.clone()))
                .ok_or(Error::OrderNotFound)?;
            buyer_amounts.push_back(order.amount);
        }
        let buyer_outcomes = allocate_fcfs(&env, &buyer_amounts, matched);

        let mut premium_pool: i128 = 0;
        for (buyer, outcome) in buyer_queue.iter().zip(buyer_outcomes.iter()) {
            let key = DataKey::Order(round_id, buyer.clone());
            let mut order: BuyerOrder = env
                .storage()
                .instance()
                .get(&key)
                .ok_or(Error::OrderNotFound)?;

            let (filled, premium_kept, refund) = match outcome {
                FillOutcome::Filled => (order.amount, order.premium_paid, 0),
                FillOutcome::Partial(filled, _) => {
                    let kept = proportional(order.premium_paid, filled, order.amount)
                        .ok_or(Error::Overflow)?;
                    (filled, kept, order.premium_paid - kept)
                }
                FillOutcome::Unfilled => (0, 0, order.premium_paid),
            };

            order.filled_amount = filled;
            order.premium_refunded = refund;
            order.refunded = refund > 0;
            env.storage().instance().set(&key, &order);

            premium_pool = premium_pool
                .checked_add(premium_kept)
                .ok_or(Error::Overflow)?;

            if refund > 0 {
                asset.transfer(&env.current_contract_address(), &buyer, &refund);
                accounting.premium_reserve -= refund;
                Self::store_accounting(&env, &mut accounting)?;
            }
        }

        // Seller pass: same FCFS discipline against the same capacity.
        let mut seller_amounts: Vec<i128> = Vec::new(&env);
        for seller in seller_queue.iter() {
            let position: SellerPosition = env
                .storage()
                .instance()
                .get(&DataKey::Position(round_id, seller.clone()))
                .ok_or(Error::PositionNotFound)?;
            seller_amounts.push_back(position.collateral);
        }
        let seller_outcomes = allocate_fcfs(&env, &seller_amounts, matched);

        for (seller, outcome) in seller_queue.iter().zip(seller_outcomes.iter()) {
            let key = DataKey::Position(round_id, seller.clone());
            let mut position: SellerPosition = env
                .storage()
                .instance()
                .get(&key)
                .ok_or(Error::PositionNotFound)?;

            let (filled, shares_locked, refund, shares_burned) =
                match outcome {
                    FillOutcome::Filled => {
                        (position.collateral, position.shares_minted, 0, 0)
                    }
                    FillOutcome::Partial(filled, refund) => {
                        let locked =
                            proportional(position.shares_minted, filled, position.collateral)
                                .ok_or(Error::Overflow)?;
                        (filled, locked, refund, position.shares_minted - locked)
                    }
                    FillOutcome::Unfilled => {
                        (0, 0, position.collateral, position.shares_minted)
                    }
                };

            position.filled_collateral = filled;
            position.shares_locked = shares_locked;
            position.collateral_refunded = refund;
            position.shares_burned = shares_burned;
            position.refunded = refund > 0;
            env.storage().instance().set(&key, &position);

            if refund > 0 {
                asset.transfer(&env.current_contract_address(), &seller, &refund);
                accounting.total_assets -= refund;
                accounting.total_shares -= shares_burned;
                Self::store_accounting(&env, &mut accounting)?;
            }
        }

        // Protocol fee, then pro-rata premium push to filled sellers.
        let fee_bps: u32 = env
            .storage()
            .instance()
            .get(&DataKey::FeeBps)
            .ok_or(Error::NotInitialized)?;
        let protocol_fee = proportional(premium_pool, i128::from(fee_bps), BASIS_POINTS)
            .ok_or(Error::Overflow)?;

        if protocol_fee > 0 {
            let fee_treasury: Address = env
                .storage()
                .instance()
                .get(&DataKey::FeeTreasury)
                .ok_or(Error::NotInitialized)?;
            asset.transfer(&env.current_contract_address(), &fee_treasury, &protocol_fee);
            accounting.premium_reserve -= protocol_fee;
            Self::store_accounting(&env, &mut accounting)?;

            // Notification only; a treasury outage must not block the round.
            let asset_addr: Address = env
                .storage()
                .instance()
                .get(&DataKey::Asset)
                .ok_or(Error::NotInitialized)?;
            let _ = FeeTreasuryClient::new(&env, &fee_treasury).try_receive_fees(
                &asset_addr,
                &protocol_fee,
                &Symbol::new(&env, "round_premium_fee"),
            );
        }

        let net_premium = premium_pool - protocol_fee;
        if matched > 0 && net_premium > 0 {
            for seller in seller_queue.iter() {
                let key = DataKey::Position(round_id, seller.clone());
                let mut position: SellerPosition = env
                    .storage()
                    .instance()
                    .get(&key)
                    .ok_or(Error::PositionNotFound)?;
                if position.filled_collateral == 0 {
                    continue;
                }

                let share = proportional(net_premium, position.filled_collateral, matched)
                    .ok_or(Error::Overflow)?;
                position.premium_earned = share;
                env.storage().instance().set(&key, &position);

                if share > 0 {
                    asset.transfer(&env.current_contract_address(), &seller, &share);
                    accounting.premium_reserve -= share;
                    Self::store_accounting(&env, &mut accounting)?;
                }
            }
        }

        accounting.locked_assets = accounting
            .locked_assets
            .checked_add(matched)
            .ok_or(Error::Overflow)?;
        Self::store_accounting(&env, &mut accounting)?;

        economics.matched_amount = matched;
        economics.locked_collateral = matched;
        economics.premium_pool = premium_pool;
        economics.protocol_fee = protocol_fee;
        economics.matched = true;
        Self::store_economics(&env, round_id, &economics);

        // Catalog advances Open → Active atomically with the recorded match.
        let catalog = Self::catalog_client(&env)?;
        catalog.close_round(
            &round_id,
            &economics.total_demand,
            &economics.total_supply,
            &matched,
        );

        env.events().publish(
            (Symbol::new(&env, "round_matched"), round_id),
            RoundMatchedEvent {
                round_id,
                total_demand: economics.total_demand,
                total_supply: economics.total_supply,
                matched_amount: matched,
                premium_pool,
                protocol_fee,
            },
        );

        Self::exit_guard(&env);
        Ok(matched)
    }

    // ============================================
    // CANCELED ROUND REFUNDS
    // ============================================

    /// Unwind all intake for an administratively canceled round
    /// (keeper-callable)
    ///
    /// Only unmatched rounds unwind this way; once matching has run the
    /// round settles through the settlement authority. Buyers get their
    /// full premium back, sellers their full collateral with the minted
    /// shares burned. A second call fails with no side effects.
    ///
    /// # Errors
    /// - `RoundNotCanceled`: the catalog round is not `Canceled`
    /// - `AlreadyMatched`: matching already ran for this round
    /// - `AlreadySettled`: refunds already processed
    pub fn refund_canceled_round(env: Env, round_id: u32) -> Result<(), Error> {
        Self::check_not_paused(&env)?;
        Self::enter_guard(&env)?;

        let round = Self::load_round(&env, round_id)?;
        let expected_tranche: u32 = env
            .storage()
            .instance()
            .get(&DataKey::TrancheId)
            .ok_or(Error::NotInitialized)?;
        if round.tranche_id != expected_tranche {
            return Err(Error::WrongTranche);
        }
        if round.state != RoundState::Canceled {
            return Err(Error::RoundNotCanceled);
        }

        let mut economics = Self::load_economics_or_empty(&env, round_id);
        if economics.matched {
            return Err(Error::AlreadyMatched);
        }
        if economics.settled {
            return Err(Error::AlreadySettled);
        }

        let asset = Self::asset_client(&env)?;
        let mut accounting = Self::load_accounting(&env)?;

        let mut premiums_refunded: i128 = 0;
        let buyer_queue: Vec<Address> = env
            .storage()
            .instance()
            .get(&DataKey::BuyerQueue(round_id))
            .unwrap_or(Vec::new(&env));
        for buyer in buyer_queue.iter() {
            let key = DataKey::Order(round_id, buyer.clone());
            let mut order: BuyerOrder = env
                .storage()
                .instance()
                .get(&key)
                .ok_or(Error::OrderNotFound)?;

            if order.premium_paid > 0 {
                asset.transfer(&env.current_contract_address(), &buyer, &order.premium_paid);
            }
            order.premium_refunded = order.premium_paid;
            order.refunded = true;
            env.storage().instance().set(&key, &order);

            accounting.premium_reserve -= order.premium_paid;
            premiums_refunded = premiums_refunded
                .checked_add(order.premium_paid)
                .ok_or(Error::Overflow)?;
        }

        let mut collateral_refunded: i128 = 0;
        let seller_queue: Vec<Address> = env
            .storage()
            .instance()
            .get(&DataKey::SellerQueue(round_id))
            .unwrap_or(Vec::new(&env));
        for seller in seller_queue.iter() {
            let key = DataKey::Position(round_id, seller.clone());
            let mut position: SellerPosition = env
                .storage()
                .instance()
                .get(&key)
                .ok_or(Error::PositionNotFound)?;

            if position.collateral > 0 {
                asset.transfer(&env.current_contract_address(), &seller, &position.collateral);
            }
            position.collateral_refunded = position.collateral;
            position.shares_burned = position.shares_minted;
            position.refunded = true;
            env.storage().instance().set(&key, &position);

            accounting.total_assets -= position.collateral;
            accounting.total_shares -= position.shares_minted;
            collateral_refunded = collateral_refunded
                .checked_add(position.collateral)
                .ok_or(Error::Overflow)?;
        }

        Self::store_accounting(&env, &mut accounting)?;

        economics.settled = true;
        Self::store_economics(&env, round_id, &economics);

        env.events().publish(
            (Symbol::new(&env, "canceled_round_refund"), round_id),
            CanceledRoundRefundEvent {
                round_id,
                premiums_refunded,
                collateral_refunded,
            },
        );

        Self::exit_guard(&env);
        Ok(())
    }

    // ============================================
    // SETTLEMENT EXECUTION (settlement authority only)
    // ============================================

    /// Pay each filled buyer its matched notional; triggered branch
    ///
    /// Filled sellers keep any positive difference between the current
    /// value of their locked shares and their original filled collateral
    /// (the yield component); the locked shares burn either way.
    pub fn execute_buyer_payouts(env: Env, round_id: u32) -> Result<i128, Error> {
        Self::require_settlement(&env)?;
        Self::check_not_paused(&env)?;
        Self::enter_guard(&env)?;

        let mut economics = Self::load_settleable_economics(&env, round_id)?;
        let asset = Self::asset_client(&env)?;

        // Refresh NAV first so yield already returned is captured.
        let mut accounting = Self::load_accounting(&env)?;
        Self::store_accounting(&env, &mut accounting)?;
        let nav_at_settlement = accounting.nav_per_share;

        let mut total_paid: i128 = 0;
        let buyer_queue: Vec<Address> = env
            .storage()
            .instance()
            .get(&DataKey::BuyerQueue(round_id))
            .unwrap_or(Vec::new(&env));
        for buyer in buyer_queue.iter() {
            let order: BuyerOrder = env
                .storage()
                .instance()
                .get(&DataKey::Order(round_id, buyer.clone()))
                .ok_or(Error::OrderNotFound)?;
            if order.filled_amount > 0 {
                asset.transfer(&env.current_contract_address(), &buyer, &order.filled_amount);
                total_paid = total_paid
                    .checked_add(order.filled_amount)
                    .ok_or(Error::Overflow)?;
            }
        }

        let seller_queue: Vec<Address> = env
            .storage()
            .instance()
            .get(&DataKey::SellerQueue(round_id))
            .unwrap_or(Vec::new(&env));
        for seller in seller_queue.iter() {
            let position: SellerPosition = env
                .storage()
                .instance()
                .get(&DataKey::Position(round_id, seller.clone()))
                .ok_or(Error::PositionNotFound)?;
            if position.shares_locked == 0 {
                continue;
            }

            let locked_value = nav::value_of_shares(position.shares_locked, nav_at_settlement)
                .ok_or(Error::Overflow)?;
            let yield_part = locked_value - position.filled_collateral;
            if yield_part > 0 {
                asset.transfer(&env.current_contract_address(), &seller, &yield_part);
            }

            accounting.total_assets -= locked_value;
            accounting.total_shares -= position.shares_locked;
        }

        accounting.locked_assets -= economics.locked_collateral;
        Self::store_accounting(&env, &mut accounting)?;

        economics.settled = true;
        Self::store_economics(&env, round_id, &economics);

        env.events().publish(
            (Symbol::new(&env, "buyer_payouts"), round_id),
            BuyerPayoutsEvent {
                round_id,
                total_paid,
            },
        );

        Self::exit_guard(&env);
        Ok(total_paid)
    }

    /// Redeem each filled seller's locked shares at current NAV; the
    /// not-triggered branch
    pub fn release_seller_collateral(env: Env, round_id: u32) -> Result<(), Error> {
        Self::require_settlement(&env)?;
        Self::check_not_paused(&env)?;
        Self::enter_guard(&env)?;

        let mut economics = Self::load_settleable_economics(&env, round_id)?;
        let asset = Self::asset_client(&env)?;

        let mut accounting = Self::load_accounting(&env)?;
        Self::store_accounting(&env, &mut accounting)?;
        let nav_at_settlement = accounting.nav_per_share;

        let mut total_released: i128 = 0;
        let seller_queue: Vec<Address> = env
            .storage()
            .instance()
            .get(&DataKey::SellerQueue(round_id))
            .unwrap_or(Vec::new(&env));
        for seller in seller_queue.iter() {
            let position: SellerPosition = env
                .storage()
                .instance()
                .get(&DataKey::Position(round_id, seller.clone()))
                .ok_or(Error::PositionNotFound)?;
            if position.shares_locked == 0 {
                continue;
            }

            let payout = nav::value_of_shares(position.shares_locked, nav_at_settlement)
                .ok_or(Error::Overflow)?;
            if payout > 0 {
                asset.transfer(&env.current_contract_address(), &seller, &payout);
            }

            accounting.total_assets -= payout;
            accounting.total_shares -= position.shares_locked;
            total_released = total_released
                .checked_add(payout)
                .ok_or(Error::Overflow)?;
        }

        accounting.locked_assets -= economics.locked_collateral;
        Self::store_accounting(&env, &mut accounting)?;

        economics.settled = true;
        Self::store_economics(&env, round_id, &economics);

        env.events().publish(
            (Symbol::new(&env, "collateral_released"), round_id),
            CollateralReleasedEvent {
                round_id,
                total_released,
            },
        );

        Self::exit_guard(&env);
        Ok(())
    }

    // ============================================
    // YIELD ROUTING (yield facility only)
    // ============================================

    /// Move idle assets out to the yield facility
    ///
    /// Bounded by `total_assets - locked_assets - deployed_to_yield`; locked
    /// collateral never leaves the pool.
    pub fn withdraw_for_yield(env: Env, amount: i128) -> Result<(), Error> {
        Self::require_yield_facility(&env)?;
        Self::check_not_paused(&env)?;
        Self::enter_guard(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let mut accounting = Self::load_accounting(&env)?;
        let available = accounting.total_assets
            - accounting.locked_assets
            - accounting.deployed_to_yield;
        if amount > available {
            return Err(Error::InsufficientAvailable);
        }

        let facility: Address = env
            .storage()
            .instance()
            .get(&DataKey::YieldFacility)
            .ok_or(Error::NotInitialized)?;
        let asset = Self::asset_client(&env)?;
        asset.transfer(&env.current_contract_address(), &facility, &amount);

        // Deployed principal stays on the books; NAV is unchanged.
        accounting.deployed_to_yield += amount;
        Self::store_accounting(&env, &mut accounting)?;

        env.events().publish(
            (Symbol::new(&env, "yield_withdrawn"),),
            YieldWithdrawnEvent {
                amount,
                deployed_to_yield: accounting.deployed_to_yield,
            },
        );

        Self::exit_guard(&env);
        Ok(())
    }

    /// Return principal plus yield from the facility
    ///
    /// Only the yield portion increments `total_assets`; the principal never
    /// left the books.
    ///
    /// # Errors
    /// - `PrincipalMismatch`: returned principal exceeds what was deployed
    pub fn deposit_from_yield(
        env: Env,
        principal: i128,
        yield_amount: i128,
    ) -> Result<(), Error> {
        Self::require_yield_facility(&env)?;
        Self::check_not_paused(&env)?;
        Self::enter_guard(&env)?;

        if principal < 0 || yield_amount < 0 || principal + yield_amount == 0 {
            return Err(Error::InvalidAmount);
        }

        let mut accounting = Self::load_accounting(&env)?;
        if principal > accounting.deployed_to_yield {
            return Err(Error::PrincipalMismatch);
        }

        let facility: Address = env
            .storage()
            .instance()
            .get(&DataKey::YieldFacility)
            .ok_or(Error::NotInitialized)?;
        let asset = Self::asset_client(&env)?;
        let total = principal
            .checked_add(yield_amount)
            .ok_or(Error::Overflow)?;
        asset.transfer(&facility, &env.current_contract_address(), &total);

        accounting.deployed_to_yield -= principal;
        accounting.total_assets = accounting
            .total_assets
            .checked_add(yield_amount)
            .ok_or(Error::Overflow)?;
        accounting.cumulative_yield = accounting
            .cumulative_yield
            .checked_add(yield_amount)
            .ok_or(Error::Overflow)?;
        Self::store_accounting(&env, &mut accounting)?;

        env.events().publish(
            (Symbol::new(&env, "yield_deposited"),),
            YieldDepositedEvent {
                principal,
                yield_amount,
                nav_per_share: accounting.nav_per_share,
            },
        );

        Self::exit_guard(&env);
        Ok(())
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    pub fn get_order(env: Env, round_id: u32, buyer: Address) -> Result<BuyerOrder, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Order(round_id, buyer))
            .ok_or(Error::OrderNotFound)
    }

    pub fn get_position(
        env: Env,
        round_id: u32,
        seller: Address,
    ) -> Result<SellerPosition, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Position(round_id, seller))
            .ok_or(Error::PositionNotFound)
    }

    pub fn get_economics(env: Env, round_id: u32) -> Result<RoundEconomics, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Economics(round_id))
            .ok_or(Error::EconomicsNotFound)
    }

    pub fn get_accounting(env: Env) -> Result<PoolAccounting, Error> {
        Self::load_accounting(&env)
    }

    pub fn nav_per_share(env: Env) -> Result<i128, Error> {
        Ok(Self::load_accounting(&env)?.nav_per_share)
    }

    /// Assets the yield facility may still draw
    pub fn available_for_yield(env: Env) -> Result<i128, Error> {
        let accounting = Self::load_accounting(&env)?;
        Ok(accounting.total_assets - accounting.locked_assets - accounting.deployed_to_yield)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    fn load_round(env: &Env, round_id: u32) -> Result<interfaces::Round, Error> {
        let catalog = Self::catalog_client(env)?;
        catalog
            .try_get_round(&round_id)
            .map_err(|_| Error::RoundNotFound)?
            .map_err(|_| Error::RoundNotFound)
    }

    fn load_tranche(env: &Env, tranche_id: u32) -> Result<interfaces::Tranche, Error> {
        let catalog = Self::catalog_client(env)?;
        catalog
            .try_get_tranche(&tranche_id)
            .map_err(|_| Error::TrancheNotFound)?
            .map_err(|_| Error::TrancheNotFound)
    }

    fn catalog_client(env: &Env) -> Result<CatalogClient, Error> {
        let catalog: Address = env
            .storage()
            .instance()
            .get(&DataKey::Catalog)
            .ok_or(Error::NotInitialized)?;
        Ok(CatalogClient::new(env, &catalog))
    }

    fn asset_client(env: &Env) -> Result<token::Client, Error> {
        let asset: Address = env
            .storage()
            .instance()
            .get(&DataKey::Asset)
            .ok_or(Error::NotInitialized)?;
        Ok(token::Client::new(env, &asset))
    }

    fn load_economics_or_empty(env: &Env, round_id: u32) -> RoundEconomics {
        env.storage()
            .instance()
            .get(&DataKey::Economics(round_id))
            .unwrap_or(RoundEconomics::empty())
    }

    fn load_settleable_economics(env: &Env, round_id: u32) -> Result<RoundEconomics, Error> {
        let economics: RoundEconomics = env
            .storage()
            .instance()
            .get(&DataKey::Economics(round_id))
            .ok_or(Error::EconomicsNotFound)?;
        if !economics.matched {
            return Err(Error::NotMatched);
        }
        if economics.settled {
            return Err(Error::AlreadySettled);
        }
        Ok(economics)
    }

    fn store_economics(env: &Env, round_id: u32, economics: &RoundEconomics) {
        env.storage()
            .instance()
            .set(&DataKey::Economics(round_id), economics);
    }

    /// Recompute NAV and persist; the whole record is written in one step
    /// to avoid partial-update drift.
    fn store_accounting(env: &Env, accounting: &mut PoolAccounting) -> Result<(), Error> {
        accounting.nav_per_share =
            nav::nav_per_share(accounting.total_assets, accounting.total_shares)
                .ok_or(Error::Overflow)?;
        accounting.last_update = env.ledger().timestamp();
        env.storage().instance().set(&DataKey::Accounting, accounting);
        Ok(())
    }

    fn load_accounting(env: &Env) -> Result<PoolAccounting, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Accounting)
            .ok_or(Error::NotInitialized)
    }

    fn require_admin(env: &Env) -> Result<(), Error> {
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        admin.require_auth();
        Ok(())
    }

    fn require_settlement(env: &Env) -> Result<(), Error> {
        let settlement: Address = env
            .storage()
            .instance()
            .get(&DataKey::Settlement)
            .ok_or(Error::NotInitialized)?;
        settlement.require_auth();
        Ok(())
    }

    fn require_yield_facility(env: &Env) -> Result<(), Error> {
        let facility: Address = env
            .storage()
            .instance()
            .get(&DataKey::YieldFacility)
            .ok_or(Error::NotInitialized)?;
        facility.require_auth();
        Ok(())
    }

    fn check_not_paused(env: &Env) -> Result<(), Error> {
        let paused = env
            .storage()
            .instance()
            .get::<DataKey, bool>(&DataKey::Paused)
            .unwrap_or(false);

        if paused {
            return Err(Error::ContractPaused);
        }
        Ok(())
    }

    fn enter_guard(env: &Env) -> Result<(), Error> {
        let entered = env
            .storage()
            .instance()
            .get::<DataKey, bool>(&DataKey::Guard)
            .unwrap_or(false);
        if entered {
            return Err(Error::Reentrancy);
        }
        env.storage().instance().set(&DataKey::Guard, &true);
        Ok(())
    }

    fn exit_guard(env: &Env) {
        env.storage().instance().set(&DataKey::Guard, &false);
    }
}
