//! comm — process-group interface used by barriers and recursive partitioning.
//!
//! Подмодули:
//! - mod.rs   — трейт Communicator и SoloComm (группа из одного процесса).
//! - group.rs — ThreadGroup/ThreadComm: ранги как потоки одного процесса.

use anyhow::Result;

pub mod group;

pub use group::{ThreadComm, ThreadGroup};

/// A group of cooperating ranks.
///
/// `barrier` and `split` are collective: every member must call them, in the
/// same order, or the whole group blocks.
pub trait Communicator: Send + Sync {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Block until every member has arrived.
    fn barrier(&self) -> Result<()>;

    /// Partition the group by `color`; new ranks are ordered by (`key`, old rank).
    fn split(&self, color: usize, key: usize) -> Result<Box<dyn Communicator>>;
}

/// Single-rank group: barrier is a no-op, split returns another SoloComm.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoloComm;

impl Communicator for SoloComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) -> Result<()> {
        Ok(())
    }

    fn split(&self, _color: usize, _key: usize) -> Result<Box<dyn Communicator>> {
        Ok(Box::new(SoloComm))
    }
}
