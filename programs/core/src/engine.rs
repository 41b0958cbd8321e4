//! Single writer engine for one pool
//!
//! Every mutation of a pool is sent as a command to a dedicated owner thread and
//! applied in arrival order. A command runs against a draft copy of the committed
//! state. The draft replaces the committed state only when the command succeeds,
//! so a failed command leaves no trace. Readers load the committed state as an
//! immutable snapshot without going through the owner thread.

use crate::error::ErrorCode;
use crate::states::pool::PoolState;
use anchor_lang::prelude::*;
use arc_swap::ArcSwap;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce(&ArcSwap<PoolState>) + Send>;

enum PoolCommand {
    Execute(Job),
    Shutdown,
}

pub struct PoolHandle {
    address: Pubkey,
    sender: mpsc::Sender<PoolCommand>,
    committed: Arc<ArcSwap<PoolState>>,
    owner: Option<JoinHandle<()>>,
}

impl PoolHandle {
    /// Starts the owner thread of `pool`
    pub fn spawn(pool: PoolState) -> Result<Self> {
        let address = pool.address;
        let committed = Arc::new(ArcSwap::from_pointee(pool));
        let (sender, receiver) = mpsc::channel();

        let state = Arc::clone(&committed);
        let owner = thread::Builder::new()
            .name(format!("pool-{}", address))
            .spawn(move || run(address, receiver, state))
            .map_err(|_| error!(ErrorCode::PoolClosed))?;

        Ok(PoolHandle {
            address,
            sender,
            committed,
            owner: Some(owner),
        })
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    /// Latest committed state
    pub fn snapshot(&self) -> Arc<PoolState> {
        self.committed.load_full()
    }

    /// Runs `f` on the owner thread and waits for its result
    ///
    /// Commands from all callers are serialized. The state `f` mutates is committed
    /// only if `f` returns `Ok`, and it is visible to `snapshot` by the time this
    /// function returns.
    ///
    pub fn execute<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut PoolState) -> Result<R> + Send + 'static,
    {
        let (reply, response) = mpsc::sync_channel(1);
        let job: Job = Box::new(move |committed| {
            let mut draft = PoolState::clone(&committed.load());
            let result = f(&mut draft);
            if result.is_ok() {
                committed.store(Arc::new(draft));
            }
            // The caller may have given up waiting
            let _ = reply.send(result);
        });

        self.sender
            .send(PoolCommand::Execute(job))
            .map_err(|_| error!(ErrorCode::PoolClosed))?;
        response.recv().map_err(|_| error!(ErrorCode::PoolClosed))?
    }
}

impl Drop for PoolHandle {
    fn drop(&mut self) {
        let _ = self.sender.send(PoolCommand::Shutdown);
        if let Some(owner) = self.owner.take() {
            let _ = owner.join();
        }
    }
}

fn run(address: Pubkey, receiver: mpsc::Receiver<PoolCommand>, committed: Arc<ArcSwap<PoolState>>) {
    msg!("pool {} engine started", address);
    while let Ok(command) = receiver.recv() {
        match command {
            PoolCommand::Execute(job) => job(&committed),
            PoolCommand::Shutdown => break,
        }
    }
    msg!("pool {} engine stopped", address);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::{ConcentratedPool, MintEntryPoint};
    use crate::libraries::fixed_point_96::Q96;
    use crate::libraries::tick_math::{MAX_TICK, MIN_TICK};
    use crate::context::MintData;

    fn spawn_pool() -> PoolHandle {
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        let (token_0, token_1) = if a < b { (a, b) } else { (b, a) };
        let pool = PoolState::new(Pubkey::new_unique(), token_0, token_1, 5, 10, Q96).unwrap();
        PoolHandle::spawn(pool).unwrap()
    }

    #[test]
    fn committed_state_is_visible_after_execute() {
        let handle = spawn_pool();
        let before = handle.snapshot();

        let preceding = handle.execute(|pool| pool.insert_tick(100)).unwrap();
        assert_eq!(preceding, MIN_TICK);
        assert!(handle.snapshot().ticks.is_initialized(100));
        // earlier snapshots are immutable
        assert!(!before.ticks.is_initialized(100));
    }

    #[test]
    fn failed_command_rolls_back() {
        let handle = spawn_pool();
        let before = handle.snapshot();

        let err = handle
            .execute(|pool| {
                pool.insert_tick(100)?;
                pool.insert_tick(MAX_TICK + 1)
            })
            .unwrap_err();
        assert_eq!(err, ErrorCode::InvalidTick.into());
        assert_eq!(*handle.snapshot(), *before);
    }

    #[test]
    fn concurrent_insertions_keep_ordering() {
        let handle = Arc::new(spawn_pool());
        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let handle = Arc::clone(&handle);
                thread::spawn(move || {
                    for i in 0..50 {
                        let tick = (i * 8 + worker) * 10 - 2000;
                        handle.execute(move |pool| pool.insert_tick(tick)).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let snapshot = handle.snapshot();
        let ticks: Vec<i32> = snapshot.ticks.iter().map(|state| state.tick).collect();
        assert_eq!(ticks.len(), 8 * 50 + 2);
        assert!(ticks.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn mint_through_the_handle() {
        let handle = spawn_pool();
        let owner = Pubkey::new_unique();
        let data = MintData {
            lower_old: MIN_TICK,
            lower: -100,
            upper_old: -100,
            upper: 100,
            amount_0_desired: u128::MAX,
            amount_1_desired: u128::MAX,
            native_0: false,
            native_1: false,
            position_owner: owner,
            recipient: owner,
        };
        let event = handle.mint(10_000, &data.encode().unwrap()).unwrap();
        assert_eq!(event.pool, handle.address());
        assert_eq!(handle.snapshot().liquidity, 10_000);

        // -100 now lies between the upper hint and the upper tick
        let stale = MintData {
            lower: -200,
            upper: 200,
            upper_old: -200,
            ..data
        };
        assert!(handle.mint(10_000, &stale.encode().unwrap()).is_err());

        handle.burn(event.position_id, 10_000, owner).unwrap();
        assert_eq!(handle.snapshot().ticks.len(), 2);
    }
}
