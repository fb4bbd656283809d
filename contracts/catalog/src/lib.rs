#![no_std]

mod error;
mod events;
mod storage;
mod validation;


pub use error::Error;
pub use storage::{Product, Round, RoundState, Tranche, TriggerKind};

use events::*;
use storage::DataKey;
use validation::{check_sales_window, check_tranche_terms, check_trigger_supported};

use soroban_sdk::{contract, contractimpl, Address, Env, String, Symbol, Vec};

#[contract]
pub struct Catalog;

#[contractimpl]
impl Catalog {
    // ============================================
    // INITIALIZATION & ADMIN
    // ============================================

    /// Initialize the catalog
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    pub fn initialize(env: Env, admin: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::ProductCounter, &0u32);
        env.storage().instance().set(&DataKey::TrancheCounter, &0u32);
        env.storage().instance().set(&DataKey::RoundCounter, &0u32);
        env.storage().instance().set(&DataKey::Paused, &false);

        Ok(())
    }

    /// Register the settlement authority; only it may mature/settle rounds
    pub fn set_settlement(env: Env, settlement: Address) -> Result<(), Error> {
        Self::require_admin(&env)?;
        env.storage().instance().set(&DataKey::Settlement, &settlement);
        Ok(())
    }

    /// Register the factory; it may register pools alongside the admin
    pub fn set_factory(env: Env, factory: Address) -> Result<(), Error> {
        Self::require_admin(&env)?;
        env.storage().instance().set(&DataKey::Factory, &factory);
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
    // PRODUCTS
    // ============================================

    /// Create a coverage product (a named category of tranches)
    pub fn create_product(env: Env, name: String) -> Result<u32, Error> {
        Self::check_not_paused(&env)?;
        Self::require_admin(&env)?;

        let counter: u32 = env
            .storage()
            .instance()
            .get(&DataKey::ProductCounter)
            .unwrap_or(0);
        let product_id = counter + 1;

        let product = Product {
            id: product_id,
            name: name.clone(),
            tranche_ids: Vec::new(&env),
            active: true,
        };

        env.storage()
            .instance()
            .set(&DataKey::Product(product_id), &product);
        env.storage()
            .instance()
            .set(&DataKey::ProductCounter, &product_id);

        env.events().publish(
            (Symbol::new(&env, "product_created"), product_id),
            ProductCreatedEvent { product_id, name },
        );

        Ok(product_id)
    }

    /// Toggle a product's active flag; products are never deleted
    pub fn set_product_active(env: Env, product_id: u32, active: bool) -> Result<(), Error> {
        Self::require_admin(&env)?;

        let mut product: Product = env
            .storage()
            .instance()
            .get(&DataKey::Product(product_id))
            .ok_or(Error::ProductNotFound)?;

        product.active = active;
        env.storage()
            .instance()
            .set(&DataKey::Product(product_id), &product);

        Ok(())
    }

    // ============================================
    // TRANCHES
    // ============================================

    /// Create a tranche under a product
    ///
    /// # Errors
    /// - `ProductNotFound` / `ProductInactive`
    /// - `UnsupportedTrigger`: Relative/Custom kinds cannot be configured
    /// - `InvalidPremiumRate` / `InvalidPurchaseBounds` / `InvalidCap`
    /// - `InvalidMaturity`: maturity must be in the future
    pub fn create_tranche(
        env: Env,
        product_id: u32,
        trigger: TriggerKind,
        threshold: i128,
        maturity: u64,
        premium_rate_bps: u32,
        min_purchase: i128,
        max_purchase: i128,
        cap: i128,
        price_route: Symbol,
    ) -> Result<u32, Error> {
        Self::check_not_paused(&env)?;
        Self::require_admin(&env)?;

        let mut product: Product = env
            .storage()
            .instance()
            .get(&DataKey::Product(product_id))
            .ok_or(Error::ProductNotFound)?;
        if !product.active {
            return Err(Error::ProductInactive);
        }

        check_trigger_supported(trigger)?;
        check_tranche_terms(premium_rate_bps, min_purchase, max_purchase, cap)?;

        if maturity <= env.ledger().timestamp() {
            return Err(Error::InvalidMaturity);
        }

        let counter: u32 = env
            .storage()
            .instance()
            .get(&DataKey::TrancheCounter)
            .unwrap_or(0);
        let tranche_id = counter + 1;

        let tranche = Tranche {
            id: tranche_id,
            product_id,
            trigger,
            threshold,
            maturity,
            premium_rate_bps,
            min_purchase,
            max_purchase,
            cap,
            price_route,
            active: true,
            round_count: 0,
        };

        product.tranche_ids.push_back(tranche_id);

        env.storage()
            .instance()
            .set(&DataKey::Tranche(tranche_id), &tranche);
        env.storage()
            .instance()
            .set(&DataKey::Product(product_id), &product);
        env.storage()
            .instance()
            .set(&DataKey::TrancheCounter, &tranche_id);

        env.events().publish(
            (Symbol::new(&env, "tranche_created"), tranche_id),
            TrancheCreatedEvent {
                tranche_id,
                product_id,
                trigger,
                threshold,
                maturity,
                premium_rate_bps,
                cap,
            },
        );

        Ok(tranche_id)
    }

    /// Update tranche economic terms; only allowed before the first round
    ///
    /// # Errors
    /// - `TrancheFrozen`: a round already exists for this tranche
    pub fn update_tranche_terms(
        env: Env,
        tranche_id: u32,
        premium_rate_bps: u32,
        min_purchase: i128,
        max_purchase: i128,
        cap: i128,
    ) -> Result<(), Error> {
        Self::require_admin(&env)?;

        let mut tranche: Tranche = env
            .storage()
            .instance()
            .get(&DataKey::Tranche(tranche_id))
            .ok_or(Error::TrancheNotFound)?;

        if tranche.round_count > 0 {
            return Err(Error::TrancheFrozen);
        }

        check_tranche_terms(premium_rate_bps, min_purchase, max_purchase, cap)?;

        tranche.premium_rate_bps = premium_rate_bps;
        tranche.min_purchase = min_purchase;
        tranche.max_purchase = max_purchase;
        tranche.cap = cap;

        env.storage()
            .instance()
            .set(&DataKey::Tranche(tranche_id), &tranche);

        Ok(())
    }

    /// Toggle a tranche's active flag; allowed even after freezing
    pub fn set_tranche_active(env: Env, tranche_id: u32, active: bool) -> Result<(), Error> {
        Self::require_admin(&env)?;

        let mut tranche: Tranche = env
            .storage()
            .instance()
            .get(&DataKey::Tranche(tranche_id))
            .ok_or(Error::TrancheNotFound)?;

        tranche.active = active;
        env.storage()
            .instance()
            .set(&DataKey::Tranche(tranche_id), &tranche);

        Ok(())
    }

    /// Register the pool contract serving a tranche
    ///
    /// Callable by the admin or the registered factory.
    pub fn register_pool(
        env: Env,
        caller: Address,
        tranche_id: u32,
        pool: Address,
    ) -> Result<(), Error> {
        caller.require_auth();

        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        let factory: Option<Address> = env.storage().instance().get(&DataKey::Factory);

        if caller != admin && Some(caller) != factory {
            return Err(Error::Unauthorized);
        }

        if !env.storage().instance().has(&DataKey::Tranche(tranche_id)) {
            return Err(Error::TrancheNotFound);
        }
        if env.storage().instance().has(&DataKey::Pool(tranche_id)) {
            return Err(Error::PoolAlreadyRegistered);
        }

        env.storage()
            .instance()
            .set(&DataKey::Pool(tranche_id), &pool);

        env.events().publish(
            (Symbol::new(&env, "pool_registered"), tranche_id),
            PoolRegisteredEvent { tranche_id, pool },
        );

        Ok(())
    }

    // ============================================
    // ROUND LIFECYCLE
    // ============================================

    /// Announce a round for a tranche
    ///
    /// # Errors
    /// - `TrancheInactive`: tranche deactivated
    /// - `PoolNotRegistered`: no pool to run matching for this tranche
    /// - `InvalidWindow` / `InvalidMaturity`: bad sales window
    /// - `PriorRoundUnresolved`: last round not Settled/Canceled
    pub fn announce_round(
        env: Env,
        tranche_id: u32,
        sales_start: u64,
        sales_end: u64,
    ) -> Result<u32, Error> {
        Self::check_not_paused(&env)?;
        Self::require_admin(&env)?;

        let mut tranche: Tranche = env
            .storage()
            .instance()
            .get(&DataKey::Tranche(tranche_id))
            .ok_or(Error::TrancheNotFound)?;
        if !tranche.active {
            return Err(Error::TrancheInactive);
        }
        if !env.storage().instance().has(&DataKey::Pool(tranche_id)) {
            return Err(Error::PoolNotRegistered);
        }

        let now = env.ledger().timestamp();
        check_sales_window(now, sales_start, sales_end, tranche.maturity)?;

        if let Some(last_id) = env
            .storage()
            .instance()
            .get::<DataKey, u32>(&DataKey::LastRound(tranche_id))
        {
            let last: Round = env
                .storage()
                .instance()
                .get(&DataKey::Round(last_id))
                .ok_or(Error::RoundNotFound)?;
            if !last.state.is_terminal() {
                return Err(Error::PriorRoundUnresolved);
            }
        }

        let counter: u32 = env
            .storage()
            .instance()
            .get(&DataKey::RoundCounter)
            .unwrap_or(0);
        let round_id = counter + 1;

        let round = Round {
            id: round_id,
            tranche_id,
            sales_start,
            sales_end,
            state: RoundState::Announced,
            total_demand: 0,
            total_supply: 0,
            matched_amount: 0,
            created_at: now,
            updated_at: now,
        };

        tranche.round_count += 1;

        env.storage()
            .instance()
            .set(&DataKey::Round(round_id), &round);
        env.storage()
            .instance()
            .set(&DataKey::RoundCounter, &round_id);
        env.storage()
            .instance()
            .set(&DataKey::LastRound(tranche_id), &round_id);
        env.storage()
            .instance()
            .set(&DataKey::Tranche(tranche_id), &tranche);

        env.events().publish(
            (Symbol::new(&env, "round_announced"), round_id),
            RoundAnnouncedEvent {
                round_id,
                tranche_id,
                sales_start,
                sales_end,
            },
        );

        Ok(round_id)
    }

    /// Open the sales window (keeper-callable once sales_start is reached)
    pub fn open_round(env: Env, round_id: u32) -> Result<(), Error> {
        Self::check_not_paused(&env)?;

        let round = Self::load_round(&env, round_id)?;
        if round.state != RoundState::Announced {
            return Err(Error::InvalidRoundState);
        }
        if env.ledger().timestamp() < round.sales_start {
            return Err(Error::SalesNotStarted);
        }

        Self::transition(&env, round, RoundState::Open);
        Ok(())
    }

    /// Close the sales window and record matched economics
    ///
    /// Called by the tranche's registered pool after it runs matching; the
    /// round advances directly to Active (matching and coverage activation
    /// are inseparable).
    ///
    /// # Errors
    /// - `Unauthorized`: caller is not the tranche's pool
    /// - `SalesNotEnded`: sales window still open
    /// - `InvalidMatchedAmount`: matched > min(demand, supply)
    pub fn close_round(
        env: Env,
        round_id: u32,
        total_demand: i128,
        total_supply: i128,
        matched_amount: i128,
    ) -> Result<(), Error> {
        Self::check_not_paused(&env)?;

        let mut round = Self::load_round(&env, round_id)?;

        let pool: Address = env
            .storage()
            .instance()
            .get(&DataKey::Pool(round.tranche_id))
            .ok_or(Error::PoolNotRegistered)?;
        pool.require_auth();

        if round.state != RoundState::Open {
            return Err(Error::InvalidRoundState);
        }
        if env.ledger().timestamp() < round.sales_end {
            return Err(Error::SalesNotEnded);
        }

        let bound = total_demand.min(total_supply);
        if matched_amount < 0 || matched_amount > bound {
            return Err(Error::InvalidMatchedAmount);
        }

        round.total_demand = total_demand;
        round.total_supply = total_supply;
        round.matched_amount = matched_amount;

        Self::transition(&env, round, RoundState::Active);
        Ok(())
    }

    /// Mark the round matured; restricted to the settlement authority
    pub fn mature_round(env: Env, round_id: u32) -> Result<(), Error> {
        Self::require_settlement(&env)?;

        let round = Self::load_round(&env, round_id)?;
        if round.state != RoundState::Active {
            return Err(Error::InvalidRoundState);
        }

        Self::transition(&env, round, RoundState::Matured);
        Ok(())
    }

    /// Mark the round settled; restricted to the settlement authority
    pub fn settle_round(env: Env, round_id: u32) -> Result<(), Error> {
        Self::require_settlement(&env)?;

        let round = Self::load_round(&env, round_id)?;
        if round.state != RoundState::Matured {
            return Err(Error::InvalidRoundState);
        }

        Self::transition(&env, round, RoundState::Settled);
        Ok(())
    }

    /// Administrative cancel from any non-terminal state
    ///
    /// No economic side effects happen here; refunds are the pool's and
    /// settlement's responsibility.
    pub fn cancel_round(env: Env, round_id: u32) -> Result<(), Error> {
        Self::require_admin(&env)?;

        let round = Self::load_round(&env, round_id)?;
        if round.state.is_terminal() {
            return Err(Error::InvalidRoundState);
        }

        Self::transition(&env, round, RoundState::Canceled);
        Ok(())
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    pub fn get_product(env: Env, product_id: u32) -> Result<Product, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Product(product_id))
            .ok_or(Error::ProductNotFound)
    }

    pub fn get_tranche(env: Env, tranche_id: u32) -> Result<Tranche, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Tranche(tranche_id))
            .ok_or(Error::TrancheNotFound)
    }

    pub fn get_round(env: Env, round_id: u32) -> Result<Round, Error> {
        Self::load_round(&env, round_id)
    }

    pub fn get_pool(env: Env, tranche_id: u32) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Pool(tranche_id))
            .ok_or(Error::PoolNotRegistered)
    }

    pub fn get_last_round(env: Env, tranche_id: u32) -> Result<u32, Error> {
        env.storage()
            .instance()
            .get(&DataKey::LastRound(tranche_id))
            .ok_or(Error::RoundNotFound)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    fn load_round(env: &Env, round_id: u32) -> Result<Round, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Round(round_id))
            .ok_or(Error::RoundNotFound)
    }

    fn transition(env: &Env, mut round: Round, new_state: RoundState) {
        let old_state = round.state;
        let now = env.ledger().timestamp();

        round.state = new_state;
        round.updated_at = now;

        env.storage()
            .instance()
            .set(&DataKey::Round(round.id), &round);

        env.events().publish(
            (Symbol::new(env, "round_state"), round.id),
            RoundStateEvent {
                round_id: round.id,
                old_state,
                new_state,
                timestamp: now,
            },
        );
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
            .ok_or(Error::Unauthorized)?;
        settlement.require_auth();
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
