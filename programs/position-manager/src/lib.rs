pub mod context;
pub mod error;
pub mod libraries;
pub mod states;

use anchor_lang::prelude::*;
use context::*;
use error::ErrorCode;
use libraries::range::{self, RangePolicy};
use states::tokenized_position::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use trident_core::context::MintData;
use trident_core::error::ErrorCode as CoreError;
use trident_core::interfaces::{ConcentratedPool, Vault};
use trident_core::libraries::{liquidity_amounts, tick_math};
use trident_core::states::pool::BurnEvent;
use trident_core::PoolHandle;

declare_id!("oZUQLshdhk7CRpN1Da5tK9qGzkRWWecLBzVHAX79m8K");

/// Builds the mint instruction for a position over `[tick_lower, tick_upper)`
///
/// Liquidity is derived from the desired amounts at the pool's current price. Both
/// ticks are then inserted in the pool's registry, lower first, and their predecessors
/// become the hints of the mint payload. Insertion is idempotent, so a failed or
/// repeated call is safe to retry.
///
/// # Arguments
///
/// * `pool` - Price oracle and tick registry of the pool
/// * `params` - Range, desired amounts and accounts of the position
///
pub fn prepare_mint<P: ConcentratedPool + ?Sized>(
    pool: &mut P,
    params: &MintParams,
) -> Result<MintInstruction> {
    require!(params.tick_lower < params.tick_upper, CoreError::InvalidRange);
    let tick_spacing = pool.tick_spacing() as i32;
    require!(
        params.tick_lower % tick_spacing == 0 && params.tick_upper % tick_spacing == 0,
        CoreError::InvalidRange
    );

    let liquidity = liquidity_amounts::get_liquidity_for_amounts(
        tick_math::get_sqrt_price_at_tick(params.tick_lower)?,
        pool.sqrt_price_x96(),
        tick_math::get_sqrt_price_at_tick(params.tick_upper)?,
        params.amount_1_desired,
        params.amount_0_desired,
    )?;

    let lower_old = pool.insert_tick(params.tick_lower)?;
    let upper_old = pool.insert_tick(params.tick_upper)?;

    Ok(MintInstruction {
        pool: pool.address(),
        liquidity,
        data: MintData {
            lower_old,
            lower: params.tick_lower,
            upper_old,
            upper: params.tick_upper,
            amount_0_desired: params.amount_0_desired,
            amount_1_desired: params.amount_1_desired,
            native_0: params.native_0,
            native_1: params.native_1,
            position_owner: params.position_owner,
            recipient: params.recipient,
        },
    })
}

/// Transfers each non zero `(token, amount)` from `from` to `to`, undoing earlier
/// transfers if a later one fails
fn pay<V: Vault + ?Sized>(vault: &V, payments: &[(Pubkey, u128)], from: &Pubkey, to: &Pubkey) -> Result<()> {
    for (index, (token, amount)) in payments.iter().enumerate() {
        if *amount == 0 {
            continue;
        }
        if let Err(err) = vault.transfer(token, from, to, *amount) {
            refund(vault, &payments[..index], from, to, &err)?;
            return Err(err);
        }
    }
    Ok(())
}

/// Returns payments made from `payer` to `payee` after `cause` aborted the operation
///
/// Every payment is attempted. If any of them cannot be returned the tokens are left
/// at `payee`, and `RefundFailed` replaces `cause` so the caller knows funds are stranded.
///
fn refund<V: Vault + ?Sized>(
    vault: &V,
    payments: &[(Pubkey, u128)],
    payer: &Pubkey,
    payee: &Pubkey,
    cause: &anchor_lang::error::Error,
) -> Result<()> {
    let mut failed = false;
    for (token, amount) in payments.iter().filter(|(_, amount)| *amount > 0) {
        if let Err(err) = vault.transfer(token, payee, payer, *amount) {
            msg!("refund of {} {} from {} to {} failed: {}", amount, token, payee, payer, err);
            failed = true;
        }
    }
    if failed {
        msg!("refund triggered by: {}", cause);
        return err!(ErrorCode::RefundFailed);
    }
    Ok(())
}

/// Provides liquidity on concentrated pools and keeps the positions it minted
///
/// The manager owns every pool position it creates. Recipients act on them through
/// their token id.
///
pub struct RangePositionManager<V: Vault> {
    address: Pubkey,
    policy: RangePolicy,
    vault: Arc<V>,
    positions: BTreeMap<u64, TokenizedPositionState>,
    next_token_id: u64,
}

impl<V: Vault + Send + Sync + 'static> RangePositionManager<V> {
    pub fn new(address: Pubkey, vault: Arc<V>) -> Self {
        RangePositionManager {
            address,
            policy: RangePolicy::default(),
            vault,
            positions: BTreeMap::new(),
            next_token_id: 0,
        }
    }

    pub fn with_policy(mut self, policy: RangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn policy(&self) -> &RangePolicy {
        &self.policy
    }

    pub fn position(&self, token_id: u64) -> Option<&TokenizedPositionState> {
        self.positions.get(&token_id)
    }

    pub fn positions(&self) -> impl Iterator<Item = &TokenizedPositionState> + '_ {
        self.positions.values()
    }

    /// Range around the pool's current tick according to the manager's policy
    pub fn select_range(&self, pool: &PoolHandle) -> Result<(i32, i32)> {
        let state = pool.snapshot();
        range::select_range(state.tick, state.tick_spacing, &self.policy)
    }

    /// Runs [`prepare_mint`] as a single command of the pool engine
    pub fn prepare_mint(&self, pool: &PoolHandle, params: MintParams) -> Result<MintInstruction> {
        pool.execute(move |state| prepare_mint(state, &params))
    }

    /// Adds liquidity to a new managed position
    ///
    /// Preparing the mint, paying the owed amounts through the vault and minting run
    /// as one command of the pool engine. Any failure, including the slippage check,
    /// leaves the pool, the vault and the manager as they were.
    ///
    /// # Arguments
    ///
    /// * `pool` - Engine of the pool to provide liquidity to
    /// * `params` - Range, desired and minimum amounts, payer and recipient
    ///
    pub fn add_liquidity(
        &mut self,
        pool: &PoolHandle,
        params: AddLiquidityParams,
    ) -> Result<TokenizedPositionState> {
        let vault = Arc::clone(&self.vault);
        let mint_params = MintParams {
            tick_lower: params.tick_lower,
            tick_upper: params.tick_upper,
            amount_0_desired: params.amount_0_desired,
            amount_1_desired: params.amount_1_desired,
            native_0: false,
            native_1: false,
            position_owner: self.address,
            recipient: params.recipient,
        };

        let event = pool.execute(move |state| {
            let instruction = prepare_mint(state, &mint_params)?;
            require!(instruction.liquidity > 0, CoreError::ZeroMintAmount);

            let (amount_0, amount_1) = liquidity_amounts::get_amounts_for_liquidity(
                tick_math::get_sqrt_price_at_tick(params.tick_lower)?,
                state.sqrt_price_x96,
                tick_math::get_sqrt_price_at_tick(params.tick_upper)?,
                instruction.liquidity,
                true,
            )?;
            require!(
                amount_0 >= params.amount_0_min && amount_1 >= params.amount_1_min,
                ErrorCode::PriceSlippageCheck
            );

            let payments = [(state.token_0, amount_0), (state.token_1, amount_1)];
            pay(vault.as_ref(), &payments, &params.payer, &state.address)?;

            let data = instruction.data.encode()?;
            match state.mint(instruction.liquidity, &data) {
                Ok(event) => Ok(event),
                Err(err) => {
                    refund(vault.as_ref(), &payments, &params.payer, &state.address, &err)?;
                    Err(err)
                }
            }
        })?;

        let token_id = self.next_token_id;
        self.next_token_id = token_id.checked_add(1).ok_or(CoreError::Overflow)?;
        let position = TokenizedPositionState {
            token_id,
            pool: event.pool,
            pool_position_id: event.position_id,
            recipient: params.recipient,
            tick_lower: event.tick_lower,
            tick_upper: event.tick_upper,
            liquidity: event.liquidity,
        };
        self.positions.insert(token_id, position);

        emit!(IncreaseLiquidityEvent {
            token_id,
            pool: event.pool,
            liquidity: event.liquidity,
            amount_0: event.amount_0,
            amount_1: event.amount_1,
        });
        Ok(position)
    }

    /// Removes liquidity from a managed position and pays the withdrawn tokens to its recipient
    ///
    /// # Arguments
    ///
    /// * `pool` - Engine of the position's pool
    /// * `token_id` - The managed position
    /// * `liquidity` - The amount of liquidity to remove
    /// * `caller` - Must be the position's recipient
    ///
    pub fn decrease_liquidity(
        &mut self,
        pool: &PoolHandle,
        token_id: u64,
        liquidity: u128,
        caller: &Pubkey,
    ) -> Result<BurnEvent> {
        let mut position = *self
            .positions
            .get(&token_id)
            .ok_or(CoreError::UnknownPosition)?;
        require_keys_eq!(position.recipient, *caller, ErrorCode::NotApproved);
        require_keys_eq!(position.pool, pool.address(), CoreError::UnknownPosition);

        let vault = Arc::clone(&self.vault);
        let manager = self.address;
        let recipient = position.recipient;
        let pool_position_id = position.pool_position_id;
        let event = pool.execute(move |state| {
            let event = state.burn(pool_position_id, liquidity, &manager)?;
            let payments = [(state.token_0, event.amount_0), (state.token_1, event.amount_1)];
            pay(vault.as_ref(), &payments, &state.address, &recipient)?;
            Ok(event)
        })?;

        position.liquidity = position
            .liquidity
            .checked_sub(liquidity)
            .ok_or(CoreError::Overflow)?;
        if position.liquidity == 0 {
            self.positions.remove(&token_id);
        } else {
            self.positions.insert(token_id, position);
        }

        emit!(DecreaseLiquidityEvent {
            token_id,
            pool: event.pool,
            liquidity,
            amount_0: event.amount_0,
            amount_1: event.amount_1,
        });
        Ok(event)
    }
}
