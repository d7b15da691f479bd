use anyhow::Result;

use MegaVec::{AccessFlags, Communicator};

use crate::cli::Common;
use crate::util::{page_aligned_share, open_store, open_vec, print_metrics, run_ranks};

pub fn exec(c: Common, seed: u64, draws: u64) -> Result<()> {
    let store = open_store(&c)?;
    let sums = run_ranks(c.ranks, |comm| {
        let mut v = open_vec(&c, store.clone(), AccessFlags::READ_ONLY)?;
        let local = page_aligned_share(&v, &comm);
        let mut acc = 0u64;
        {
            let rank_seed = seed.wrapping_add(comm.rank() as u64);
            let mut tx = v.rand_tx(rank_seed, local.off, local.size, draws, AccessFlags::READ_ONLY);
            for _ in 0..draws {
                acc = acc.wrapping_add(tx.next_value()?);
            }
            tx.close()?;
        }
        v.barrier(AccessFlags::empty(), &comm)?;
        Ok(acc)
    })?;
    for (rank, s) in sums.iter().enumerate() {
        println!("rank {}: checksum {:016x}", rank, s);
    }
    print_metrics(c.json)
}
