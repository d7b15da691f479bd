use anyhow::{anyhow, Result};

use MegaVec::AccessFlags;

use crate::cli::Common;
use crate::util::{page_aligned_share, open_store, open_vec, pattern, print_metrics, run_ranks};

pub fn exec(c: Common, seed: u64) -> Result<()> {
    let store = open_store(&c)?;
    let sorted = run_ranks(c.ranks, |comm| {
        let mut v = open_vec(&c, store.clone(), AccessFlags::READ_WRITE)?;
        let local = page_aligned_share(&v, &comm);
        {
            let mut tx = v.seq_tx(local.off, local.size, AccessFlags::WRITE_ONLY);
            for i in local.off..local.last() {
                tx.put_next(pattern(i, seed))?;
            }
            tx.close()?;
        }
        v.sort(local.off, local.size)?;
        let ok = v.is_sorted(local.off, local.size)?;
        v.barrier(AccessFlags::READ_ONLY, &comm)?;
        Ok(ok)
    })?;
    print_metrics(c.json)?;
    if let Some(rank) = sorted.iter().position(|ok| !ok) {
        return Err(anyhow!("rank {} left its range unsorted", rank));
    }
    println!("sorted '{}' on {} rank(s)", c.key, c.ranks);
    Ok(())
}
