//! Seams to the collaborators around a concentrated pool
//!
//! The token vault, the master deployer and the pool mint entry point live outside
//! this crate in a full deployment. Callers program against these traits.

use crate::engine::PoolHandle;
use crate::libraries::big_num::U256;
use crate::states::pool::{BurnEvent, MintEvent, PoolState};
use anchor_lang::prelude::*;

/// Price oracle and tick registry access used to prepare a mint
pub trait ConcentratedPool {
    fn address(&self) -> Pubkey;

    fn tick_spacing(&self) -> u16;

    /// Current price as a sqrt(token_1/token_0) Q64.96
    fn sqrt_price_x96(&self) -> U256;

    /// Current tick, the greatest tick whose price does not exceed the current price
    fn tick(&self) -> i32;

    /// Initializes `tick` and returns its initialized predecessor
    fn insert_tick(&mut self, tick: i32) -> Result<i32>;
}

/// The pool's mint entry point
pub trait MintEntryPoint {
    fn mint(&self, liquidity: u128, data: &[u8]) -> Result<MintEvent>;

    fn burn(&self, position_id: u64, liquidity: u128, caller: Pubkey) -> Result<BurnEvent>;
}

/// Token custody shared by every pool of the platform
pub trait Vault {
    /// Moves `amount` of `token` between two accounts
    fn transfer(&self, token: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u128) -> Result<()>;
}

/// Deploys a pool from an encoded construction payload
pub trait PoolDeployer {
    fn deploy_pool(&mut self, factory: &Pubkey, deploy_data: &[u8]) -> Result<Pubkey>;
}

impl ConcentratedPool for PoolState {
    fn address(&self) -> Pubkey {
        self.address
    }

    fn tick_spacing(&self) -> u16 {
        self.tick_spacing
    }

    fn sqrt_price_x96(&self) -> U256 {
        self.sqrt_price_x96
    }

    fn tick(&self) -> i32 {
        self.tick
    }

    fn insert_tick(&mut self, tick: i32) -> Result<i32> {
        self.ticks.insert(tick)
    }
}

impl MintEntryPoint for PoolHandle {
    fn mint(&self, liquidity: u128, data: &[u8]) -> Result<MintEvent> {
        let data = data.to_vec();
        self.execute(move |pool| pool.mint(liquidity, &data))
    }

    fn burn(&self, position_id: u64, liquidity: u128, caller: Pubkey) -> Result<BurnEvent> {
        self.execute(move |pool| pool.burn(position_id, liquidity, &caller))
    }
}
