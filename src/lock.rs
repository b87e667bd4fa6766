//! Hierarchical fair reader/writer locks over the path tree.
//!
//! One cell per path ever locked. A cell keeps a FIFO queue of waiters, the
//! live holder count, and whether the holders are exclusive. A chain
//! acquire takes shared locks on every strict ancestor top-down, then the
//! requested mode on the target; every caller walks the same order and
//! never takes an ancestor while holding a descendant, so no cycle can form
//! among hierarchical waiters.
//!
//! Waiters are granted by whoever unblocks them: the granter pops the
//! queue head, bumps the holder count, records the mode, and fires the
//! waiter's one-shot channel. Consecutive shared heads are granted in one
//! pass; an exclusive head is granted alone.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::naming::{NamingError, NamingResult};
use crate::path::FsPath;

/// Locks a mutex, reclaiming it from a panicked holder if need be.
pub(crate) fn hold<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The per-path lock table. Cell lookup takes a short-lived table mutex;
/// each cell then synchronizes on its own state mutex, never held across an
/// await.
#[derive(Debug, Default)]
pub struct LockManager {
    cells: Mutex<HashMap<FsPath, Arc<LockCell>>>,
}

#[derive(Debug, Default)]
struct LockCell {
    state: Mutex<CellState>,
}

#[derive(Debug, Default)]
struct CellState {
    queue: VecDeque<Waiter>,
    holders: usize,
    exclusive: bool,
}

#[derive(Debug)]
struct Waiter {
    exclusive: bool,
    grant: oneshot::Sender<()>,
}

impl CellState {
    /// Whether a lock of the given mode may be taken right now, queue
    /// aside.
    fn admits(&self, exclusive: bool) -> bool {
        self.holders == 0 || (!self.exclusive && !exclusive)
    }

    /// Grants the queue head for as long as it is runnable. A granted
    /// shared head leaves shared mode in force, so the pass continues;
    /// a granted exclusive head ends it.
    fn grant_runnable(&mut self) {
        while let Some(head) = self.queue.front() {
            if !self.admits(head.exclusive) {
                break;
            }
            let Some(waiter) = self.queue.pop_front() else { break };
            self.holders += 1;
            self.exclusive = waiter.exclusive;
            let _ = waiter.grant.send(());
            if waiter.exclusive {
                break;
            }
        }
    }
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes shared locks on every strict ancestor of `path` top-down, then
    /// a lock of the requested mode on `path` itself. Per cell, waiters are
    /// served strictly in enqueue order.
    pub async fn acquire(&self, path: &FsPath, exclusive: bool) {
        let chain = path.prefixes();
        let target = chain.len() - 1;
        for (depth, level) in chain.iter().enumerate() {
            self.acquire_one(level, exclusive && depth == target).await;
        }
    }

    /// Releases the chain taken by [`LockManager::acquire`], walking from
    /// `path` back up to the root. Fails with `InvalidState` when the path
    /// was never locked, a level has no active holder, or the target's held
    /// mode does not match `exclusive`.
    pub fn release(&self, path: &FsPath, exclusive: bool) -> NamingResult<()> {
        let chain = path.prefixes();
        let cells = {
            let table = hold(&self.cells);
            let mut cells = Vec::with_capacity(chain.len());
            for level in &chain {
                match table.get(level) {
                    Some(cell) => cells.push(cell.clone()),
                    None => return Err(NamingError::InvalidState),
                }
            }
            cells
        };
        let target = cells.len() - 1;
        for (depth, cell) in cells.iter().enumerate().rev() {
            let mut state = hold(&cell.state);
            if state.holders == 0 {
                return Err(NamingError::InvalidState);
            }
            if depth == target && state.exclusive != exclusive {
                return Err(NamingError::InvalidState);
            }
            state.holders -= 1;
            if state.holders == 0 {
                state.exclusive = false;
            }
            state.grant_runnable();
        }
        Ok(())
    }

    async fn acquire_one(&self, path: &FsPath, exclusive: bool) {
        let cell = self.cell(path);
        let pending = {
            let mut state = hold(&cell.state);
            if state.queue.is_empty() && state.admits(exclusive) {
                state.holders += 1;
                state.exclusive = exclusive;
                None
            } else {
                let (grant, granted) = oneshot::channel();
                state.queue.push_back(Waiter { exclusive, grant });
                Some(granted)
            }
        };
        if let Some(granted) = pending {
            // The sender lives in the queue until this waiter is granted.
            let _ = granted.await;
        }
    }

    fn cell(&self, path: &FsPath) -> Arc<LockCell> {
        let mut table = hold(&self.cells);
        table.entry(path.clone()).or_default().clone()
    }

    #[cfg(test)]
    pub(crate) fn holder_count(&self, path: &FsPath) -> usize {
        let table = hold(&self.cells);
        table.get(path).map_or(0, |cell| hold(&cell.state).holders)
    }

    #[cfg(test)]
    pub(crate) fn queue_len(&self, path: &FsPath) -> usize {
        let table = hold(&self.cells);
        table.get(path).map_or(0, |cell| hold(&cell.state).queue.len())
    }
}
