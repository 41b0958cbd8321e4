use crate::engine::PoolHandle;
use crate::error::ErrorCode;
use crate::interfaces::PoolDeployer;
use crate::libraries::big_num::U256;
use crate::states::pool::{PoolState, POOL_SEED, TICK_SPACING_LIMIT};
use anchor_lang::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 0.30% fee tier
pub const FEE_30_BPS: u32 = 30;
/// 0.05% fee tier
pub const FEE_5_BPS: u32 = 5;

/// Amplification coefficient used for hybrid pools by default
pub const DEFAULT_AMPLIFICATION: u64 = 7000;

/// Orders two distinct token addresses so that token_0 < token_1
pub fn sort_tokens(token_a: Pubkey, token_b: Pubkey) -> (Pubkey, Pubkey) {
    if token_a < token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}

fn check_tokens(token_0: &Pubkey, token_1: &Pubkey) -> Result<()> {
    require_keys_neq!(*token_0, *token_1, ErrorCode::IdenticalTokens);
    require!(token_0 < token_1, ErrorCode::UnsortedTokens);
    Ok(())
}

/// Construction payload understood by a pool factory
///
/// Tokens must already be sorted. Use [`sort_tokens`] to canonicalize a pair.
///
pub trait DeployParams: AnchorSerialize + AnchorDeserialize {
    fn tokens(&self) -> (Pubkey, Pubkey);

    fn encode(&self) -> Result<Vec<u8>> {
        let (token_0, token_1) = self.tokens();
        check_tokens(&token_0, &token_1)?;
        self.try_to_vec()
            .map_err(|_| error!(ErrorCode::MalformedPayload))
    }

    fn decode(data: &[u8]) -> Result<Self>
    where
        Self: Sized,
    {
        let params = Self::try_from_slice(data).map_err(|_| error!(ErrorCode::MalformedPayload))?;
        let (token_0, token_1) = params.tokens();
        check_tokens(&token_0, &token_1)?;
        Ok(params)
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantProductDeployData {
    pub token_0: Pubkey,
    pub token_1: Pubkey,
    pub fee: u32,
    pub twap_enabled: bool,
}

impl DeployParams for ConstantProductDeployData {
    fn tokens(&self) -> (Pubkey, Pubkey) {
        (self.token_0, self.token_1)
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HybridDeployData {
    pub token_0: Pubkey,
    pub token_1: Pubkey,
    pub fee: u32,
    pub amplification: u64,
}

impl DeployParams for HybridDeployData {
    fn tokens(&self) -> (Pubkey, Pubkey) {
        (self.token_0, self.token_1)
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcentratedDeployData {
    pub token_0: Pubkey,
    pub token_1: Pubkey,
    pub fee: u32,
    /// Initial sqrt price as a big endian Q64.96
    pub sqrt_price_x96: [u8; 32],
    pub tick_spacing: u16,
}

impl ConcentratedDeployData {
    pub fn new(token_0: Pubkey, token_1: Pubkey, fee: u32, sqrt_price_x96: U256, tick_spacing: u16) -> Self {
        let mut price = [0u8; 32];
        sqrt_price_x96.to_big_endian(&mut price);
        ConcentratedDeployData {
            token_0,
            token_1,
            fee,
            sqrt_price_x96: price,
            tick_spacing,
        }
    }

    pub fn sqrt_price_x96(&self) -> U256 {
        U256::from_big_endian(&self.sqrt_price_x96)
    }
}

impl DeployParams for ConcentratedDeployData {
    fn tokens(&self) -> (Pubkey, Pubkey) {
        (self.token_0, self.token_1)
    }
}

/// Emitted when a concentrated pool is deployed
#[event]
pub struct PoolCreated {
    /// Program the pool address is derived from
    pub factory: Pubkey,

    /// The address of the created pool
    pub pool: Pubkey,

    /// The first token of the pool by address sort order
    pub token_0: Pubkey,

    /// The second token of the pool by address sort order
    pub token_1: Pubkey,

    pub fee: u32,

    /// The minimum number of ticks between initialized ticks
    pub tick_spacing: u16,

    /// The initial tick of the pool, i.e. log base 1.0001 of the starting price of the pool
    pub tick: i32,
}

/// Local deployer of concentrated pools
///
/// Each deployed pool runs on its own engine. Pools share no mutable state.
///
#[derive(Default)]
pub struct ConcentratedPoolFactory {
    pools: BTreeMap<Pubkey, Arc<PoolHandle>>,
}

impl ConcentratedPoolFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the pool address of `[POOL_SEED, token_0, token_1, fee, tick_spacing]`
    pub fn pool_address(factory: &Pubkey, data: &ConcentratedDeployData) -> Pubkey {
        Pubkey::find_program_address(
            &[
                POOL_SEED.as_bytes(),
                data.token_0.as_ref(),
                data.token_1.as_ref(),
                &data.fee.to_be_bytes(),
                &data.tick_spacing.to_be_bytes(),
            ],
            factory,
        )
        .0
    }

    pub fn pool(&self, address: &Pubkey) -> Option<Arc<PoolHandle>> {
        self.pools.get(address).cloned()
    }

    pub fn pools(&self) -> impl Iterator<Item = &Pubkey> + '_ {
        self.pools.keys()
    }
}

impl PoolDeployer for ConcentratedPoolFactory {
    /// Deploys a pool from an encoded [`ConcentratedDeployData`]
    ///
    /// # Arguments
    ///
    /// * `factory` - Program the pool address is derived from
    /// * `deploy_data` - Borsh encoded [`ConcentratedDeployData`]
    ///
    fn deploy_pool(&mut self, factory: &Pubkey, deploy_data: &[u8]) -> Result<Pubkey> {
        let data = ConcentratedDeployData::decode(deploy_data)?;
        require!(
            data.tick_spacing > 0 && data.tick_spacing < TICK_SPACING_LIMIT,
            ErrorCode::TickSpacingLimit
        );

        let address = Self::pool_address(factory, &data);
        require!(!self.pools.contains_key(&address), ErrorCode::PoolAlreadyExists);

        let pool = PoolState::new(
            address,
            data.token_0,
            data.token_1,
            data.fee,
            data.tick_spacing,
            data.sqrt_price_x96(),
        )?;
        let tick = pool.tick;
        let handle = PoolHandle::spawn(pool)?;
        self.pools.insert(address, Arc::new(handle));

        emit!(PoolCreated {
            factory: *factory,
            pool: address,
            token_0: data.token_0,
            token_1: data.token_1,
            fee: data.fee,
            tick_spacing: data.tick_spacing,
            tick,
        });
        msg!("pool {} created at tick {}", address, tick);

        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libraries::fixed_point_96::Q96;
    use crate::libraries::tick_math;

    fn tokens() -> (Pubkey, Pubkey) {
        sort_tokens(Pubkey::new_unique(), Pubkey::new_unique())
    }

    #[test]
    fn sort_tokens_orders_pair() {
        let (token_0, token_1) = tokens();
        assert_eq!(sort_tokens(token_1, token_0), (token_0, token_1));
        assert_eq!(sort_tokens(token_0, token_1), (token_0, token_1));
    }

    #[test]
    fn encode_requires_sorted_tokens() {
        let (token_0, token_1) = tokens();
        let unsorted = ConstantProductDeployData {
            token_0: token_1,
            token_1: token_0,
            fee: FEE_30_BPS,
            twap_enabled: true,
        };
        assert_eq!(unsorted.encode().unwrap_err(), ErrorCode::UnsortedTokens.into());

        let identical = HybridDeployData {
            token_0,
            token_1: token_0,
            fee: FEE_30_BPS,
            amplification: DEFAULT_AMPLIFICATION,
        };
        assert_eq!(identical.encode().unwrap_err(), ErrorCode::IdenticalTokens.into());

        let sorted = HybridDeployData { token_1, ..identical };
        assert_eq!(HybridDeployData::decode(&sorted.encode().unwrap()).unwrap(), sorted);
    }

    #[test]
    fn concentrated_payload_keeps_full_price() {
        let (token_0, token_1) = tokens();
        let data = ConcentratedDeployData::new(token_0, token_1, FEE_5_BPS, tick_math::MAX_SQRT_RATIO, 1);
        let decoded = ConcentratedDeployData::decode(&data.encode().unwrap()).unwrap();
        assert_eq!(decoded.sqrt_price_x96(), tick_math::MAX_SQRT_RATIO);
    }

    #[test]
    fn deploys_pool_once() {
        let factory_id = Pubkey::new_unique();
        let mut factory = ConcentratedPoolFactory::new();
        let (token_0, token_1) = tokens();
        let data = ConcentratedDeployData::new(token_0, token_1, FEE_5_BPS, Q96, 1);

        let address = factory.deploy_pool(&factory_id, &data.encode().unwrap()).unwrap();
        assert_eq!(address, ConcentratedPoolFactory::pool_address(&factory_id, &data));

        let pool = factory.pool(&address).unwrap().snapshot();
        assert_eq!(pool.tick, 0);
        assert_eq!(pool.tick_spacing, 1);
        assert_eq!(pool.fee, FEE_5_BPS);

        // Price does not take part in the address
        let again = ConcentratedDeployData::new(token_0, token_1, FEE_5_BPS, Q96 * U256::from(2u8), 1);
        assert_eq!(
            factory.deploy_pool(&factory_id, &again.encode().unwrap()).unwrap_err(),
            ErrorCode::PoolAlreadyExists.into()
        );

        // Another spacing is another pool
        let wider = ConcentratedDeployData::new(token_0, token_1, FEE_5_BPS, Q96, 60);
        let other = factory.deploy_pool(&factory_id, &wider.encode().unwrap()).unwrap();
        assert_ne!(address, other);
        assert_eq!(factory.pools().count(), 2);
    }

    #[test]
    fn rejects_invalid_payloads() {
        let factory_id = Pubkey::new_unique();
        let mut factory = ConcentratedPoolFactory::new();
        let (token_0, token_1) = tokens();

        let spacing = ConcentratedDeployData::new(token_0, token_1, FEE_5_BPS, Q96, TICK_SPACING_LIMIT);
        assert_eq!(
            factory.deploy_pool(&factory_id, &spacing.encode().unwrap()).unwrap_err(),
            ErrorCode::TickSpacingLimit.into()
        );

        let price = ConcentratedDeployData::new(token_0, token_1, FEE_5_BPS, U256::zero(), 10);
        assert_eq!(
            factory.deploy_pool(&factory_id, &price.encode().unwrap()).unwrap_err(),
            ErrorCode::InvalidSqrtPrice.into()
        );

        assert_eq!(
            factory.deploy_pool(&factory_id, &[0u8; 7]).unwrap_err(),
            ErrorCode::MalformedPayload.into()
        );
        assert_eq!(factory.pools().count(), 0);
    }
}
