use anyhow::{anyhow, Result};

use MegaVec::AccessFlags;

use crate::cli::Common;
use crate::util::{page_aligned_share, open_store, open_vec, pattern, print_metrics, run_ranks};

pub fn exec(c: Common, seed: u64) -> Result<()> {
    let store = open_store(&c)?;
    let bad = run_ranks(c.ranks, |comm| {
        let mut v = open_vec(&c, store.clone(), AccessFlags::READ_ONLY)?;
        let local = page_aligned_share(&v, &comm);
        let mut mismatches = 0u64;
        {
            let mut tx = v.seq_tx(local.off, local.size, AccessFlags::READ_ONLY);
            for i in local.off..local.last() {
                if tx.next_value()? != pattern(i, seed) {
                    mismatches += 1;
                }
            }
            tx.close()?;
        }
        v.barrier(AccessFlags::empty(), &comm)?;
        Ok(mismatches)
    })?;
    print_metrics(c.json)?;
    let total: u64 = bad.iter().sum();
    if total > 0 {
        return Err(anyhow!("{} mismatching element(s) in '{}'", total, c.key));
    }
    println!("verified '{}': OK", c.key);
    Ok(())
}
