use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::thread;

use MegaVec::{
    even_pgas, metrics, AccessFlags, BlobStore, Communicator, DirStore, LocalRange, MegaVec as Vector,
    ThreadComm, ThreadGroup, VecBuilder,
};

use crate::cli::Common;

/// Value stored at index `i` by `fill` for a given seed.
pub fn pattern(i: u64, seed: u64) -> u64 {
    i.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ seed
}

pub fn open_store(c: &Common) -> Result<Arc<dyn BlobStore>> {
    Ok(Arc::new(DirStore::open(&c.dir)?))
}

pub fn open_vec(c: &Common, store: Arc<dyn BlobStore>, flags: AccessFlags) -> Result<Vector<u64>> {
    let mut b = VecBuilder::new().window_bytes(c.window);
    if let Some(pb) = c.page_bytes {
        b = b.page_bytes(pb);
    }
    b.open::<u64>(store, &c.key, c.count, flags)
}

/// This rank's share of `v`, split on page boundaries so no two ranks flush the same page.
pub fn page_aligned_share(v: &Vector<u64>, comm: &dyn Communicator) -> LocalRange {
    let pages = even_pgas(comm.rank(), comm.size(), v.page_count());
    let epp = v.elmts_per_page();
    let off = (pages.off * epp).min(v.len());
    let last = (pages.last() * epp).min(v.len());
    LocalRange { off, size: last - off }
}

/// Run `f` on `n` ranks (one thread each) and collect results in rank order.
pub fn run_ranks<R, F>(n: usize, f: F) -> Result<Vec<R>>
where
    R: Send,
    F: Fn(ThreadComm) -> Result<R> + Sync,
{
    let comms = ThreadGroup::new(n.max(1));
    thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let f = &f;
                s.spawn(move || f(comm))
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, h)| {
                h.join()
                    .map_err(|_| anyhow!("rank {} panicked", rank))?
            })
            .collect()
    })
}

pub fn print_metrics(json: bool) -> Result<()> {
    let m = metrics::snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&m)?);
    } else {
        println!(
            "faults={} reads={} fast_path={:.2} evictions={} hinted={} flushed_pages={} prefetch={}/{} barriers={}",
            m.page_faults,
            m.page_reads,
            m.fast_path_ratio(),
            m.evictions,
            m.hinted_evictions,
            m.flushed_pages,
            m.prefetch_issued,
            m.prefetch_skipped,
            m.barriers
        );
    }
    Ok(())
}
