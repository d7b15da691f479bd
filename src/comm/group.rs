//! In-process rank group: every rank is a thread holding its own ThreadComm.
//!
//! Split protocol (collective, same call order on all members):
//! 1) every member publishes (color, key) into its slot, then waits;
//! 2) members of one color are ordered by (key, rank); the child group for
//!    (split epoch, color) is created once in a shared registry;
//! 3) a second wait keeps slots stable until everyone has read them.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier, Mutex};

use super::Communicator;

struct GroupShared {
    size: usize,
    barrier: Barrier,
    slots: Mutex<Vec<(usize, usize)>>,
    children: Mutex<HashMap<(u64, usize), Arc<GroupShared>>>,
}

impl GroupShared {
    fn new(size: usize) -> Self {
        Self {
            size,
            barrier: Barrier::new(size.max(1)),
            slots: Mutex::new(vec![(0, 0); size]),
            children: Mutex::new(HashMap::new()),
        }
    }
}

/// Factory for a group of `n` thread ranks.
pub struct ThreadGroup;

impl ThreadGroup {
    /// Create `n` communicators; hand one to each thread.
    pub fn new(n: usize) -> Vec<ThreadComm> {
        let shared = Arc::new(GroupShared::new(n));
        (0..n)
            .map(|rank| ThreadComm {
                rank,
                shared: shared.clone(),
                splits: AtomicU64::new(0),
            })
            .collect()
    }
}

/// One rank's view of a ThreadGroup.
pub struct ThreadComm {
    rank: usize,
    shared: Arc<GroupShared>,
    splits: AtomicU64,
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn barrier(&self) -> Result<()> {
        self.shared.barrier.wait();
        Ok(())
    }

    fn split(&self, color: usize, key: usize) -> Result<Box<dyn Communicator>> {
        let epoch = self.splits.fetch_add(1, Ordering::Relaxed);
        {
            let mut slots = self
                .shared
                .slots
                .lock()
                .map_err(|_| anyhow!("group slots poisoned"))?;
            slots[self.rank] = (color, key);
        }
        self.shared.barrier.wait();

        let members: Vec<usize> = {
            let slots = self
                .shared
                .slots
                .lock()
                .map_err(|_| anyhow!("group slots poisoned"))?;
            let mut m: Vec<(usize, usize)> = slots
                .iter()
                .enumerate()
                .filter(|(_, (c, _))| *c == color)
                .map(|(r, (_, k))| (*k, r))
                .collect();
            m.sort_unstable();
            m.into_iter().map(|(_, r)| r).collect()
        };
        let new_rank = members
            .iter()
            .position(|&r| r == self.rank)
            .ok_or_else(|| anyhow!("rank {} missing from its own split color {}", self.rank, color))?;

        let child = {
            let mut children = self
                .shared
                .children
                .lock()
                .map_err(|_| anyhow!("group registry poisoned"))?;
            children
                .entry((epoch, color))
                .or_insert_with(|| Arc::new(GroupShared::new(members.len())))
                .clone()
        };
        self.shared.barrier.wait();

        Ok(Box::new(ThreadComm {
            rank: new_rank,
            shared: child,
            splits: AtomicU64::new(0),
        }))
    }
}
