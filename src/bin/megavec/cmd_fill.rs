use anyhow::Result;

use MegaVec::AccessFlags;

use crate::cli::Common;
use crate::util::{page_aligned_share, open_store, open_vec, pattern, print_metrics, run_ranks};

pub fn exec(c: Common, seed: u64) -> Result<()> {
    let store = open_store(&c)?;
    let written = run_ranks(c.ranks, |comm| {
        let mut v = open_vec(&c, store.clone(), AccessFlags::WRITE_ONLY)?;
        let local = page_aligned_share(&v, &comm);
        {
            let mut tx = v.seq_tx(local.off, local.size, AccessFlags::WRITE_ONLY);
            for i in local.off..local.last() {
                tx.put_next(pattern(i, seed))?;
            }
            tx.close()?;
        }
        v.barrier(AccessFlags::READ_ONLY, &comm)?;
        Ok(local.size)
    })?;
    let total: u64 = written.iter().sum();
    println!("filled {} element(s) of '{}' on {} rank(s)", total, c.key, c.ranks);
    print_metrics(c.json)
}
