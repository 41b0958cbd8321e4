use crate::context::MintData;
use crate::error::ErrorCode;
use crate::libraries::big_num::U256;
use crate::libraries::{liquidity_amounts, liquidity_math, tick_math};
use crate::states::position::PositionState;
use crate::states::tick::TickRegistry;
use anchor_lang::prelude::*;
use std::collections::BTreeMap;

/// Seed to derive pool addresses
pub const POOL_SEED: &str = "p";

/// Largest tick spacing a pool may be created with, exclusive
pub const TICK_SPACING_LIMIT: u16 = 16384;

/// The pool state
///
/// Address is the PDA of `[POOL_SEED, token_0, token_1, fee, tick_spacing]`
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    pub address: Pubkey,

    /// Token pair of the pool, where token_0 address < token_1 address
    pub token_0: Pubkey,
    pub token_1: Pubkey,

    /// Opaque fee tier, e.g. 30 for 0.30%
    pub fee: u32,

    /// The minimum number of ticks between initialized ticks
    pub tick_spacing: u16,

    /// The currently in range liquidity available to the pool.
    /// This value has no relationship to the total liquidity across all ticks.
    pub liquidity: u128,

    /// The current price of the pool as a sqrt(token_1/token_0) Q64.96 value
    pub sqrt_price_x96: U256,

    /// The current tick of the pool, i.e. the greatest tick whose price does not
    /// exceed `sqrt_price_x96`. Not necessarily a multiple of tick_spacing.
    pub tick: i32,

    pub ticks: TickRegistry,

    pub positions: BTreeMap<u64, PositionState>,
    pub next_position_id: u64,
}

impl PoolState {
    pub fn new(
        address: Pubkey,
        token_0: Pubkey,
        token_1: Pubkey,
        fee: u32,
        tick_spacing: u16,
        sqrt_price_x96: U256,
    ) -> Result<Self> {
        require!(token_0 != token_1, ErrorCode::IdenticalTokens);
        require!(token_0 < token_1, ErrorCode::UnsortedTokens);
        require!(
            tick_spacing > 0 && tick_spacing < TICK_SPACING_LIMIT,
            ErrorCode::TickSpacingLimit
        );
        let tick = tick_math::get_tick_at_sqrt_price(sqrt_price_x96)?;

        Ok(PoolState {
            address,
            token_0,
            token_1,
            fee,
            tick_spacing,
            liquidity: 0,
            sqrt_price_x96,
            tick,
            ticks: TickRegistry::new(tick_spacing)?,
            positions: BTreeMap::new(),
            next_position_id: 0,
        })
    }

    pub fn position(&self, position_id: u64) -> Option<&PositionState> {
        self.positions.get(&position_id)
    }

    /// Whether a position over `[tick_lower, tick_upper)` contributes to the active liquidity
    fn in_range(&self, tick_lower: i32, tick_upper: i32) -> bool {
        tick_lower <= self.tick && self.tick < tick_upper
    }

    /// Adds liquidity for the position described by an encoded [`MintData`]
    ///
    /// Both ticks are inserted with the caller's hints, so a payload built against an
    /// outdated view of the registry fails with `StaleOrdering` and must be rebuilt.
    /// A failed mint leaves the pool untouched.
    ///
    /// # Arguments
    ///
    /// * `liquidity` - The amount of liquidity to mint
    /// * `data` - Borsh encoded [`MintData`]
    ///
    pub fn mint(&mut self, liquidity: u128, data: &[u8]) -> Result<MintEvent> {
        require!(liquidity > 0, ErrorCode::ZeroMintAmount);
        let data = MintData::decode(data)?;
        check_tick(data.lower, self.tick_spacing)?;
        check_tick(data.upper, self.tick_spacing)?;
        check_ticks(data.lower, data.upper)?;
        let liquidity_delta = i128::try_from(liquidity).map_err(|_| error!(ErrorCode::Overflow))?;

        // Staged on a copy of the registry, committed below once every check passed
        let mut ticks = self.ticks.clone();
        ticks.insert_with_hint(data.lower_old, data.lower)?;
        ticks.insert_with_hint(data.upper_old, data.upper)?;
        ticks.update(data.lower, liquidity_delta, false)?;
        ticks.update(data.upper, liquidity_delta, true)?;

        let (amount_0, amount_1) = liquidity_amounts::get_amounts_for_liquidity(
            tick_math::get_sqrt_price_at_tick(data.lower)?,
            self.sqrt_price_x96,
            tick_math::get_sqrt_price_at_tick(data.upper)?,
            liquidity,
            true,
        )?;
        require!(
            amount_0 <= data.amount_0_desired && amount_1 <= data.amount_1_desired,
            ErrorCode::AmountExceedsDesired
        );

        let active_liquidity = if self.in_range(data.lower, data.upper) {
            liquidity_math::add_delta(self.liquidity, liquidity_delta)?
        } else {
            self.liquidity
        };
        let position_id = self.next_position_id;
        let next_position_id = position_id.checked_add(1).ok_or(ErrorCode::Overflow)?;

        self.ticks = ticks;
        self.liquidity = active_liquidity;
        self.next_position_id = next_position_id;
        self.positions.insert(
            position_id,
            PositionState {
                owner: data.position_owner,
                recipient: data.recipient,
                tick_lower: data.lower,
                tick_upper: data.upper,
                liquidity,
            },
        );

        let event = MintEvent {
            pool: self.address,
            position_id,
            owner: data.position_owner,
            recipient: data.recipient,
            tick_lower: data.lower,
            tick_upper: data.upper,
            liquidity,
            amount_0,
            amount_1,
        };
        emit!(event.clone());
        Ok(event)
    }

    /// Removes liquidity from a position
    ///
    /// Ticks left without any referencing liquidity are unlinked from the registry,
    /// and the position is destroyed once empty.
    ///
    /// # Arguments
    ///
    /// * `position_id` - Identifier returned in the [`MintEvent`]
    /// * `liquidity` - The amount of liquidity to burn
    /// * `caller` - Must be the position owner
    ///
    pub fn burn(&mut self, position_id: u64, liquidity: u128, caller: &Pubkey) -> Result<BurnEvent> {
        require!(liquidity > 0, ErrorCode::ZeroMintAmount);
        let mut position = *self
            .positions
            .get(&position_id)
            .ok_or(ErrorCode::UnknownPosition)?;
        require_keys_eq!(position.owner, *caller, ErrorCode::NotAnOwner);

        let liquidity_delta = i128::try_from(liquidity)
            .map_err(|_| error!(ErrorCode::Overflow))?
            .checked_neg()
            .ok_or(ErrorCode::Overflow)?;
        position.update(liquidity_delta)?;

        let mut ticks = self.ticks.clone();
        let flipped_lower = ticks.update(position.tick_lower, liquidity_delta, false)?;
        let flipped_upper = ticks.update(position.tick_upper, liquidity_delta, true)?;
        if flipped_lower {
            ticks.remove(position.tick_lower);
        }
        if flipped_upper {
            ticks.remove(position.tick_upper);
        }

        let (amount_0, amount_1) = liquidity_amounts::get_amounts_for_liquidity(
            tick_math::get_sqrt_price_at_tick(position.tick_lower)?,
            self.sqrt_price_x96,
            tick_math::get_sqrt_price_at_tick(position.tick_upper)?,
            liquidity,
            false,
        )?;

        let active_liquidity = if self.in_range(position.tick_lower, position.tick_upper) {
            liquidity_math::add_delta(self.liquidity, liquidity_delta)?
        } else {
            self.liquidity
        };

        self.ticks = ticks;
        self.liquidity = active_liquidity;
        if position.is_empty() {
            self.positions.remove(&position_id);
        } else {
            self.positions.insert(position_id, position);
        }

        let event = BurnEvent {
            pool: self.address,
            position_id,
            owner: position.owner,
            tick_lower: position.tick_lower,
            tick_upper: position.tick_upper,
            liquidity,
            amount_0,
            amount_1,
        };
        emit!(event.clone());
        Ok(event)
    }

    /// Moves the pool to a new price, crossing every initialized tick in between and
    /// applying its net liquidity
    ///
    /// # Arguments
    ///
    /// * `sqrt_price_x96` - The new price as a Q64.96
    ///
    pub fn move_price(&mut self, sqrt_price_x96: U256) -> Result<()> {
        let tick = tick_math::get_tick_at_sqrt_price(sqrt_price_x96)?;
        let mut liquidity = self.liquidity;

        if tick > self.tick {
            // Active liquidity already includes every initialized tick at or below the cursor
            let mut cursor = self.tick;
            loop {
                let next = self.ticks.next_initialized(cursor);
                if next > tick {
                    break;
                }
                liquidity = liquidity_math::add_delta(liquidity, self.ticks.liquidity_net(next))?;
                cursor = next;
            }
        } else if tick < self.tick {
            let mut cursor = self.tick;
            loop {
                let crossed = if self.ticks.is_initialized(cursor) {
                    cursor
                } else {
                    self.ticks.previous_initialized(cursor)
                };
                if crossed <= tick {
                    break;
                }
                let liquidity_net = self
                    .ticks
                    .liquidity_net(crossed)
                    .checked_neg()
                    .ok_or(ErrorCode::Overflow)?;
                liquidity = liquidity_math::add_delta(liquidity, liquidity_net)?;
                cursor = crossed - 1;
            }
        }

        self.sqrt_price_x96 = sqrt_price_x96;
        self.tick = tick;
        self.liquidity = liquidity;
        Ok(())
    }
}

/// Common checks for a valid tick input.
/// A tick should be greater than or equal to the minimum tick, less than or equal
/// to the maximum tick and a multiple of tick spacing.
///
/// # Arguments
///
/// * `tick` - The tick to check
/// * `tick_spacing` - The pool's tick spacing
///
pub fn check_tick(tick: i32, tick_spacing: u16) -> Result<()> {
    require!(tick >= tick_math::MIN_TICK, ErrorCode::InvalidTick);
    require!(tick <= tick_math::MAX_TICK, ErrorCode::InvalidTick);
    require!(tick % tick_spacing as i32 == 0, ErrorCode::InvalidTick);
    Ok(())
}

/// Common checks for valid tick inputs.
///
/// # Arguments
///
/// * `tick_lower` - The lower tick
/// * `tick_upper` - The upper tick
///
pub fn check_ticks(tick_lower: i32, tick_upper: i32) -> Result<()> {
    require!(tick_lower < tick_upper, ErrorCode::InvalidRange);
    Ok(())
}

/// Emitted when liquidity is minted for a given position
#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintEvent {
    /// The pool for which liquidity was minted
    pub pool: Pubkey,

    /// Identifier of the created position
    pub position_id: u64,

    /// The owner of the position and recipient of any minted liquidity
    pub owner: Pubkey,

    /// Account credited with the position
    pub recipient: Pubkey,

    /// The lower tick of the position
    pub tick_lower: i32,

    /// The upper tick of the position
    pub tick_upper: i32,

    /// The amount of liquidity minted to the position range
    pub liquidity: u128,

    /// How much token_0 was required for the minted liquidity
    pub amount_0: u128,

    /// How much token_1 was required for the minted liquidity
    pub amount_1: u128,
}

/// Emitted when a position's liquidity is removed
#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnEvent {
    /// The pool from where liquidity was removed
    pub pool: Pubkey,

    pub position_id: u64,

    /// The owner of the position for which liquidity is removed
    pub owner: Pubkey,

    /// The lower tick of the position
    pub tick_lower: i32,

    /// The upper tick of the position
    pub tick_upper: i32,

    /// The amount of liquidity to remove
    pub liquidity: u128,

    /// The amount of token_0 withdrawn
    pub amount_0: u128,

    /// The amount of token_1 withdrawn
    pub amount_1: u128,
}
