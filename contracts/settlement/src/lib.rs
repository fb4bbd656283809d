#![no_std]

mod error;
mod events;
mod interfaces;
mod storage;
mod trigger;


pub use error::Error;
pub use storage::{OracleStatus, SettlementInfo, SCALE};

use events::*;
use interfaces::{CatalogClient, PoolClient, PriceRouterClient, RoundState};
use storage::DataKey;

use soroban_sdk::{contract, contractimpl, Address, Env, Symbol};

#[contract]
pub struct Settlement;

#[contractimpl]
impl Settlement {
    // ============================================
    // INITIALIZATION & ADMIN
    // ============================================

    /// Initialize the settlement authority
    ///
    /// `oracle` is the push-path reporter used when the router has no value
    /// at request time. Windows are in seconds.
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    /// - `InvalidWindow`: zero liveness window
    pub fn initialize(
        env: Env,
        admin: Address,
        catalog: Address,
        price_router: Address,
        oracle: Address,
        liveness_window: u64,
        dispute_window: u64,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }
        if liveness_window == 0 {
            return Err(Error::InvalidWindow);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Catalog, &catalog);
        env.storage()
            .instance()
            .set(&DataKey::PriceRouter, &price_router);
        env.storage().instance().set(&DataKey::Oracle, &oracle);
        env.storage()
            .instance()
            .set(&DataKey::LivenessWindow, &liveness_window);
        env.storage()
            .instance()
            .set(&DataKey::DisputeWindow, &dispute_window);
        env.storage().instance().set(&DataKey::Paused, &false);

        Ok(())
    }

    pub fn set_windows(
        env: Env,
        liveness_window: u64,
        dispute_window: u64,
    ) -> Result<(), Error> {
        Self::require_admin(&env)?;
        if liveness_window == 0 {
            return Err(Error::InvalidWindow);
        }
        env.storage()
            .instance()
            .set(&DataKey::LivenessWindow, &liveness_window);
        env.storage()
            .instance()
            .set(&DataKey::DisputeWindow, &dispute_window);
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
    // OBSERVATION
    // ============================================

    /// Request the maturity observation for a round (keeper-callable)
    ///
    /// Advances the catalog round Active → Matured, then pulls the price at
    /// the tranche's maturity from the router. A successful pull resolves
    /// immediately and starts the liveness clock; a pull that reports no
    /// usable value leaves the record in `Requested` for the push oracle.
    ///
    /// # Errors
    /// - `NotMatured`: called before the tranche's maturity
    /// - `AlreadyRequested`: an observation already exists for this round
    /// - `OracleRequestFailed`: the router call itself failed
    pub fn request_observation(env: Env, round_id: u32) -> Result<(), Error> {
        Self::check_not_paused(&env)?;

        if env
            .storage()
            .instance()
            .has(&DataKey::Settlement(round_id))
        {
            return Err(Error::AlreadyRequested);
        }

        let catalog = Self::catalog_client(&env)?;
        let round = catalog
            .try_get_round(&round_id)
            .map_err(|_| Error::RoundNotFound)?
            .map_err(|_| Error::RoundNotFound)?;
        if round.state != RoundState::Active {
            return Err(Error::NotMatured);
        }

        let tranche = catalog
            .try_get_tranche(&round.tranche_id)
            .map_err(|_| Error::TrancheNotFound)?
            .map_err(|_| Error::TrancheNotFound)?;

        let now = env.ledger().timestamp();
        if now < tranche.maturity {
            return Err(Error::NotMatured);
        }

        catalog.mature_round(&round_id);

        let router = Self::router_client(&env)?;
        let price = router
            .try_get_price_at(&tranche.price_route, &tranche.maturity)
            .map_err(|_| Error::OracleRequestFailed)?
            .map_err(|_| Error::OracleRequestFailed)?;

        let mut info = SettlementInfo {
            round_id,
            status: OracleStatus::Requested,
            observed_at: now,
            oracle_value: 0,
            oracle_decimals: 0,
            triggered: false,
            settled: false,
            total_payouts: 0,
            liveness_deadline: 0,
            resolver: None,
        };

        if price.valid {
            Self::resolve(&env, &mut info, &tranche, price.price, price.decimals)?;
        }

        env.storage()
            .instance()
            .set(&DataKey::Settlement(round_id), &info);

        env.events().publish(
            (Symbol::new(&env, "observation_requested"), round_id),
            ObservationRequestedEvent {
                round_id,
                tranche_id: round.tranche_id,
                maturity: tranche.maturity,
            },
        );

        Ok(())
    }

    /// Push-path result for a round stuck in `Requested`
    ///
    /// `timestamp` is when the reporter observed the value; it may not lie
    /// in the future.
    pub fn submit_result(
        env: Env,
        round_id: u32,
        value: i128,
        decimals: u32,
        timestamp: u64,
    ) -> Result<(), Error> {
        Self::check_not_paused(&env)?;
        Self::require_oracle(&env)?;

        if timestamp > env.ledger().timestamp() {
            return Err(Error::InvalidObservation);
        }

        let mut info = Self::load_settlement(&env, round_id)?;
        if info.status != OracleStatus::Requested {
            return Err(Error::NotRequested);
        }

        let tranche = Self::load_tranche_for(&env, round_id)?;
        Self::resolve(&env, &mut info, &tranche, value, decimals)?;
        info.observed_at = timestamp;
        env.storage()
            .instance()
            .set(&DataKey::Settlement(round_id), &info);

        Ok(())
    }

    // ============================================
    // DISPUTES
    // ============================================

    /// Contest a resolved observation before finalization
    ///
    /// Open to anyone while the dispute window is running; a dispute halts
    /// finalization until the admin rules on it.
    ///
    /// # Errors
    /// - `NotResolved`: nothing on record to dispute
    /// - `AlreadySettled`: the round already finalized
    /// - `DisputeWindowClosed`: past `liveness_deadline + dispute_window`
    pub fn dispute(env: Env, round_id: u32, disputer: Address) -> Result<(), Error> {
        Self::check_not_paused(&env)?;
        disputer.require_auth();

        let mut info = Self::load_settlement(&env, round_id)?;
        if info.status != OracleStatus::Resolved {
            return Err(Error::NotResolved);
        }
        if info.settled {
            return Err(Error::AlreadySettled);
        }

        let dispute_window: u64 = env
            .storage()
            .instance()
            .get(&DataKey::DisputeWindow)
            .ok_or(Error::NotInitialized)?;
        if env.ledger().timestamp() > info.liveness_deadline + dispute_window {
            return Err(Error::DisputeWindowClosed);
        }

        info.status = OracleStatus::Disputed;
        env.storage()
            .instance()
            .set(&DataKey::Settlement(round_id), &info);

        env.events().publish(
            (Symbol::new(&env, "dispute_opened"), round_id),
            DisputeOpenedEvent { round_id, disputer },
        );

        Ok(())
    }

    /// Rule on a dispute with a corrected value (admin only)
    ///
    /// Re-evaluates the trigger and restarts the liveness clock so the
    /// corrected outcome is itself contestable.
    pub fn resolve_dispute(
        env: Env,
        round_id: u32,
        value: i128,
        decimals: u32,
    ) -> Result<(), Error> {
        Self::check_not_paused(&env)?;
        Self::require_admin(&env)?;

        let mut info = Self::load_settlement(&env, round_id)?;
        if info.status != OracleStatus::Disputed {
            return Err(Error::NotDisputed);
        }

        let tranche = Self::load_tranche_for(&env, round_id)?;
        Self::resolve(&env, &mut info, &tranche, value, decimals)?;

        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        info.resolver = Some(admin);
        env.storage()
            .instance()
            .set(&DataKey::Settlement(round_id), &info);

        env.events().publish(
            (Symbol::new(&env, "dispute_resolved"), round_id),
            DisputeResolvedEvent {
                round_id,
                oracle_value: value,
                triggered: info.triggered,
            },
        );

        Ok(())
    }

    // ============================================
    // FINALIZATION
    // ============================================

    /// Execute the settled outcome once liveness has elapsed (keeper-callable)
    ///
    /// Triggered rounds pay buyers their matched notional; not-triggered
    /// rounds release seller collateral at NAV. Either way the catalog round
    /// advances Matured → Settled.
    ///
    /// # Errors
    /// - `NotResolved`: no value on record, or a dispute is pending
    /// - `LivenessNotElapsed`: the challenge period is still running
    /// - `AlreadySettled`: finalize already ran
    pub fn finalize(env: Env, round_id: u32) -> Result<i128, Error> {
        Self::check_not_paused(&env)?;

        let mut info = Self::load_settlement(&env, round_id)?;
        if info.status != OracleStatus::Resolved {
            return Err(Error::NotResolved);
        }
        if info.settled {
            return Err(Error::AlreadySettled);
        }
        if env.ledger().timestamp() < info.liveness_deadline {
            return Err(Error::LivenessNotElapsed);
        }

        let catalog = Self::catalog_client(&env)?;
        let round = catalog
            .try_get_round(&round_id)
            .map_err(|_| Error::RoundNotFound)?
            .map_err(|_| Error::RoundNotFound)?;
        let pool_address = catalog
            .try_get_pool(&round.tranche_id)
            .map_err(|_| Error::PoolNotRegistered)?
            .map_err(|_| Error::PoolNotRegistered)?;
        let pool = PoolClient::new(&env, &pool_address);

        let total_payouts = if info.triggered {
            pool.execute_buyer_payouts(&round_id)
        } else {
            pool.release_seller_collateral(&round_id);
            0
        };

        info.settled = true;
        info.total_payouts = total_payouts;
        env.storage()
            .instance()
            .set(&DataKey::Settlement(round_id), &info);

        catalog.settle_round(&round_id);

        env.events().publish(
            (Symbol::new(&env, "round_finalized"), round_id),
            RoundFinalizedEvent {
                round_id,
                triggered: info.triggered,
                total_payouts,
            },
        );

        Ok(total_payouts)
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    pub fn get_settlement(env: Env, round_id: u32) -> Result<SettlementInfo, Error> {
        Self::load_settlement(&env, round_id)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    /// Record a value, evaluate the trigger, and restart the liveness clock.
    fn resolve(
        env: &Env,
        info: &mut SettlementInfo,
        tranche: &interfaces::Tranche,
        value: i128,
        decimals: u32,
    ) -> Result<(), Error> {
        let triggered = trigger::evaluate(tranche.trigger, tranche.threshold, value, decimals)
            .ok_or(Error::Overflow)?;

        let liveness_window: u64 = env
            .storage()
            .instance()
            .get(&DataKey::LivenessWindow)
            .ok_or(Error::NotInitialized)?;
        let now = env.ledger().timestamp();

        info.status = OracleStatus::Resolved;
        info.observed_at = now;
        info.oracle_value = value;
        info.oracle_decimals = decimals;
        info.triggered = triggered;
        info.liveness_deadline = now + liveness_window;

        env.events().publish(
            (Symbol::new(env, "observation_resolved"), info.round_id),
            ObservationResolvedEvent {
                round_id: info.round_id,
                oracle_value: value,
                oracle_decimals: decimals,
                triggered,
                liveness_deadline: info.liveness_deadline,
            },
        );

        Ok(())
    }

    fn load_settlement(env: &Env, round_id: u32) -> Result<SettlementInfo, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Settlement(round_id))
            .ok_or(Error::SettlementNotFound)
    }

    fn load_tranche_for(env: &Env, round_id: u32) -> Result<interfaces::Tranche, Error> {
        let catalog = Self::catalog_client(env)?;
        let round = catalog
            .try_get_round(&round_id)
            .map_err(|_| Error::RoundNotFound)?
            .map_err(|_| Error::RoundNotFound)?;
        catalog
            .try_get_tranche(&round.tranche_id)
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

    fn router_client(env: &Env) -> Result<PriceRouterClient, Error> {
        let router: Address = env
            .storage()
            .instance()
            .get(&DataKey::PriceRouter)
            .ok_or(Error::NotInitialized)?;
        Ok(PriceRouterClient::new(env, &router))
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

    fn require_oracle(env: &Env) -> Result<(), Error> {
        let oracle: Address = env
            .storage()
            .instance()
            .get(&DataKey::Oracle)
            .ok_or(Error::NotInitialized)?;
        oracle.require_auth();
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
}
