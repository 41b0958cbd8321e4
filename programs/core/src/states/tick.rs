///! Contains the tick registry and per tick liquidity accounting
///!
use crate::error::ErrorCode;
use crate::libraries::{liquidity_math, tick_math};
use anchor_lang::prelude::*;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

/// Info stored for an initialized price tick
///
/// Neighbours are not stored. They are found by ordered navigation of the registry.
///
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickState {
    /// The price tick whose info is stored
    pub tick: i32,

    /// Amount of net liquidity added (subtracted) when tick is crossed from left to right (right to left)
    pub liquidity_net: i128,

    /// The total position liquidity that references this tick
    pub liquidity_gross: u128,
}

impl TickState {
    pub fn new(tick: i32) -> Self {
        TickState {
            tick,
            ..Default::default()
        }
    }

    /// Returns the updated tick and whether it flipped from referenced to unreferenced, or vice versa.
    /// `self` is untouched when the update fails.
    ///
    /// # Arguments
    ///
    /// * `self` - The tick state that will be updated
    /// * `liquidity_delta` - A new amount of liquidity to be added (subtracted) when tick is crossed
    /// from left to right (right to left)
    /// * `upper` - true for updating a position's upper tick, or false for updating a position's lower tick
    /// * `max_liquidity` - The maximum liquidity allocation for a single tick
    ///
    pub fn updated(
        &self,
        liquidity_delta: i128,
        upper: bool,
        max_liquidity: u128,
    ) -> Result<(TickState, bool)> {
        let liquidity_gross_before = self.liquidity_gross;
        let liquidity_gross_after =
            liquidity_math::add_delta(liquidity_gross_before, liquidity_delta)?;

        require!(
            liquidity_gross_after <= max_liquidity,
            ErrorCode::TickLiquidityLimit
        );

        // Either liquidity_gross_after becomes 0 (uninitialized) XOR liquidity_gross_before
        // was zero (initialized)
        let flipped = (liquidity_gross_after == 0) != (liquidity_gross_before == 0);

        // when the lower (upper) tick is crossed left to right (right to left),
        // liquidity must be added (removed)
        let liquidity_net = if upper {
            self.liquidity_net.checked_sub(liquidity_delta)
        } else {
            self.liquidity_net.checked_add(liquidity_delta)
        }
        .ok_or(ErrorCode::Overflow)?;

        Ok((
            TickState {
                tick: self.tick,
                liquidity_net,
                liquidity_gross: liquidity_gross_after,
            },
            flipped,
        ))
    }
}

/// Derives max liquidity per tick from given tick spacing
///
/// # Arguments
///
/// * `tick_spacing` - The amount of required tick separation, realized in multiples of `tick_sacing`
/// e.g., a tickSpacing of 3 requires ticks to be initialized every 3rd tick i.e., ..., -6, -3, 0, 3, 6, ...
///
pub fn tick_spacing_to_max_liquidity_per_tick(tick_spacing: i32) -> Result<u128> {
    require!(tick_spacing > 0, ErrorCode::TickSpacingLimit);

    // Find min and max values permitted by tick spacing
    let min_tick = (tick_math::MIN_TICK / tick_spacing) * tick_spacing;
    let max_tick = (tick_math::MAX_TICK / tick_spacing) * tick_spacing;
    let num_ticks = ((max_tick - min_tick) / tick_spacing) as u128 + 1;

    Ok(u128::MAX / num_ticks)
}

/// Ordered set of initialized ticks for one pool
///
/// `MIN_TICK` and `MAX_TICK` are inserted on creation and never removed, so every
/// tick in between always has an initialized predecessor and successor.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickRegistry {
    ticks: BTreeMap<i32, TickState>,
    max_liquidity_per_tick: u128,
}

impl TickRegistry {
    /// Creates a registry holding only the two sentinels. Fails on a zero spacing.
    pub fn new(tick_spacing: u16) -> Result<Self> {
        let max_liquidity_per_tick = tick_spacing_to_max_liquidity_per_tick(tick_spacing as i32)?;
        let mut ticks = BTreeMap::new();
        ticks.insert(tick_math::MIN_TICK, TickState::new(tick_math::MIN_TICK));
        ticks.insert(tick_math::MAX_TICK, TickState::new(tick_math::MAX_TICK));
        Ok(TickRegistry {
            ticks,
            max_liquidity_per_tick,
        })
    }

    pub fn max_liquidity_per_tick(&self) -> u128 {
        self.max_liquidity_per_tick
    }

    pub fn is_initialized(&self, tick: i32) -> bool {
        self.ticks.contains_key(&tick)
    }

    pub fn get(&self, tick: i32) -> Option<&TickState> {
        self.ticks.get(&tick)
    }

    /// Number of initialized ticks, sentinels included
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Initialized ticks from the lower to the upper sentinel
    pub fn iter(&self) -> impl Iterator<Item = &TickState> + '_ {
        self.ticks.values()
    }

    /// Returns the next initialized tick strictly greater than `tick`, or `MAX_TICK`
    pub fn next_initialized(&self, tick: i32) -> i32 {
        self.ticks
            .range((Excluded(tick), Unbounded))
            .next()
            .map_or(tick_math::MAX_TICK, |(index, _)| *index)
    }

    /// Returns the previous initialized tick strictly smaller than `tick`, or `MIN_TICK`
    pub fn previous_initialized(&self, tick: i32) -> i32 {
        self.ticks
            .range(..tick)
            .next_back()
            .map_or(tick_math::MIN_TICK, |(index, _)| *index)
    }

    /// Initializes `tick` and returns the initialized tick immediately preceding it.
    /// Inserting an initialized tick changes nothing and returns the same predecessor,
    /// so the call is safe to retry.
    ///
    /// # Arguments
    ///
    /// * `tick` - The tick to initialize, within `[MIN_TICK, MAX_TICK]`
    ///
    pub fn insert(&mut self, tick: i32) -> Result<i32> {
        require!(
            tick >= tick_math::MIN_TICK && tick <= tick_math::MAX_TICK,
            ErrorCode::InvalidTick
        );
        // The lower sentinel is its own predecessor
        if tick == tick_math::MIN_TICK {
            return Ok(tick_math::MIN_TICK);
        }

        let preceding_tick = self.previous_initialized(tick);
        if !self.ticks.contains_key(&tick) {
            self.ticks.insert(tick, TickState::new(tick));
            msg!("tick {} initialized after {}", tick, preceding_tick);
        }
        Ok(preceding_tick)
    }

    /// Initializes `tick` given the caller's view of its predecessor
    ///
    /// No-op if `tick` is already initialized. Otherwise `old` must be initialized and
    /// must still immediately precede `tick`.
    ///
    /// # Arguments
    ///
    /// * `old` - The initialized tick the caller expects just below `tick`
    /// * `tick` - The tick to initialize
    ///
    pub fn insert_with_hint(&mut self, old: i32, tick: i32) -> Result<()> {
        require!(
            tick >= tick_math::MIN_TICK && tick <= tick_math::MAX_TICK,
            ErrorCode::InvalidTick
        );
        if self.ticks.contains_key(&tick) {
            return Ok(());
        }
        require!(
            self.ticks.contains_key(&old) && old < tick && self.next_initialized(old) > tick,
            ErrorCode::StaleOrdering
        );

        self.ticks.insert(tick, TickState::new(tick));
        msg!("tick {} initialized after {}", tick, old);
        Ok(())
    }

    /// Applies a liquidity delta to an initialized tick and returns true if the tick
    /// flipped between referenced and unreferenced
    ///
    /// # Arguments
    ///
    /// * `tick` - An initialized tick
    /// * `liquidity_delta` - Liquidity added (positive) or removed (negative) by a position
    /// * `upper` - Whether `tick` is the position's upper bound
    ///
    pub fn update(&mut self, tick: i32, liquidity_delta: i128, upper: bool) -> Result<bool> {
        let state = self.ticks.get_mut(&tick).ok_or(ErrorCode::InvalidTick)?;
        let (updated, flipped) = state.updated(liquidity_delta, upper, self.max_liquidity_per_tick)?;
        *state = updated;
        Ok(flipped)
    }

    /// Unlinks `tick` if it is neither a sentinel nor referenced by any position.
    /// Returns whether the tick was removed.
    pub fn remove(&mut self, tick: i32) -> bool {
        if tick == tick_math::MIN_TICK || tick == tick_math::MAX_TICK {
            return false;
        }
        match self.ticks.get(&tick) {
            Some(state) if state.liquidity_gross == 0 => {
                self.ticks.remove(&tick);
                msg!("tick {} removed", tick);
                true
            }
            _ => false,
        }
    }

    /// Net liquidity applied when the price crosses `tick` from left to right
    pub fn liquidity_net(&self, tick: i32) -> i128 {
        self.ticks.get(&tick).map_or(0, |state| state.liquidity_net)
    }
}
