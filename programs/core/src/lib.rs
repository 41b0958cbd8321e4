//! Concentrated liquidity core
//!
//! Tick registry, price and liquidity math, the pool state machine with its single
//! writer engine, and the factory that deploys concentrated pools.
//!
pub mod context;
pub mod engine;
pub mod error;
pub mod interfaces;
pub mod libraries;
pub mod states;

use anchor_lang::prelude::*;

pub use context::MintData;
pub use engine::PoolHandle;
pub use interfaces::{ConcentratedPool, MintEntryPoint, PoolDeployer, Vault};
pub use libraries::big_num::U256;

declare_id!("B4Eff9emTEj33bPpwd8Ea5ruz3oeXeNeYCrA9pHwSXDg");
