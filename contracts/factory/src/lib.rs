#![no_std]

mod error;


pub use error::Error;

use soroban_sdk::{
    contract, contractclient, contractimpl, contracttype, Address, BytesN, Env, Symbol,
};

/// Deployed pool bootstrap.
#[contractclient(name = "PoolClient")]
pub trait PoolInterface {
    fn initialize(
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
    );
}

#[contractclient(name = "CatalogClient")]
pub trait CatalogInterface {
    fn register_pool(env: Env, caller: Address, tranche_id: u32, pool: Address);
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PoolDeployedEvent {
    pub tranche_id: u32,
    pub pool: Address,
}

#[contracttype]
#[derive(Clone)]
enum DataKey {
    Admin,
    Catalog,
    Initialized,
}

#[contract]
pub struct Factory;

#[contractimpl]
impl Factory {
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    pub fn initialize(env: Env, admin: Address, catalog: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Catalog, &catalog);

        Ok(())
    }

    /// Deploy, bootstrap, and register a pool for a tranche in one step
    ///
    /// The new pool is initialized with the supplied collaborators and then
    /// registered in the catalog under `tranche_id`. The catalog must list
    /// this factory via `set_factory` for the registration to be accepted.
    pub fn deploy_pool(
        env: Env,
        tranche_id: u32,
        pool_wasm_hash: BytesN<32>,
        salt: BytesN<32>,
        pool_admin: Address,
        asset: Address,
        position_token: Address,
        fee_treasury: Address,
        yield_facility: Address,
        settlement: Address,
        protocol_fee_bps: u32,
    ) -> Result<Address, Error> {
        Self::require_admin(&env)?;

        let catalog: Address = env
            .storage()
            .instance()
            .get(&DataKey::Catalog)
            .ok_or(Error::NotInitialized)?;

        let pool = env
            .deployer()
            .with_current_contract(salt)
            .deploy_v2(pool_wasm_hash, ());

        PoolClient::new(&env, &pool).initialize(
            &pool_admin,
            &catalog,
            &tranche_id,
            &asset,
            &position_token,
            &fee_treasury,
            &yield_facility,
            &settlement,
            &protocol_fee_bps,
        );

        CatalogClient::new(&env, &catalog).register_pool(
            &env.current_contract_address(),
            &tranche_id,
            &pool,
        );

        env.events().publish(
            (Symbol::new(&env, "pool_deployed"), tranche_id),
            PoolDeployedEvent {
                tranche_id,
                pool: pool.clone(),
            },
        );

        Ok(pool)
    }

    pub fn get_catalog(env: Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Catalog)
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
}
