use std::sync::Arc;

use anyhow::Result;

use MegaVec::{AccessFlags, BlobStore, MegaVec as Vector, MemStore, SoloComm, VecBuilder};

/// Вектор u64 с `epp` элементами на странице и окном в `window_pages` страниц.
fn open_u64(
    store: &Arc<dyn BlobStore>,
    key: &str,
    count: u64,
    epp: usize,
    window_pages: usize,
    flags: AccessFlags,
) -> Result<Vector<u64>> {
    VecBuilder::from_default()
        .elements_per_page::<u64>(epp)
        .window_bytes(window_pages * epp * 8)
        .open::<u64>(store.clone(), key, count, flags)
}

fn mem() -> (MemStore, Arc<dyn BlobStore>) {
    let m = MemStore::new();
    let s: Arc<dyn BlobStore> = Arc::new(m.clone());
    (m, s)
}

#[test]
fn write_then_read_back_across_handles() -> Result<()> {
    let (_, store) = mem();
    {
        let mut v = open_u64(&store, "rt", 50, 4, 0, AccessFlags::READ_WRITE)?;
        for i in 0..50 {
            v.set(i, i * 3 + 1)?;
        }
        v.flush()?;
        assert_eq!(v.page_count(), 13);
    }
    let mut r = open_u64(&store, "rt", 50, 4, 0, AccessFlags::READ_ONLY)?;
    for i in 0..50 {
        assert_eq!(r.get(i)?, i * 3 + 1, "element {i}");
    }
    Ok(())
}

#[test]
fn unwritten_pages_read_as_zero() -> Result<()> {
    let (_, store) = mem();
    let mut v = open_u64(&store, "zeros", 16, 4, 0, AccessFlags::READ_ONLY)?;
    assert_eq!(v.get(13)?, 0);
    Ok(())
}

#[test]
fn eviction_keeps_dirty_pages_durable() -> Result<()> {
    let (m, store) = mem();
    let mut v = open_u64(&store, "evict", 40, 4, 4, AccessFlags::READ_WRITE)?;
    for i in 0..40 {
        v.set(i, 1000 + i)?;
        assert!(v.resident_pages() <= 3, "resident={} at {}", v.resident_pages(), i);
        assert!(v.resident_bytes() <= v.window());
    }
    // Pages evicted so far are already in the store.
    assert!(m.key_count("evict") >= 7);

    // Refault through the same handle.
    for i in 0..40 {
        assert_eq!(v.get(i)?, 1000 + i);
    }
    v.flush()?;
    assert_eq!(m.key_count("evict"), 10);
    Ok(())
}

#[test]
fn two_page_window_holds_one_page() -> Result<()> {
    let (_, store) = mem();
    let mut v = open_u64(&store, "tiny", 32, 4, 2, AccessFlags::READ_WRITE)?;
    for i in 0..32 {
        v.set(i, i)?;
        assert_eq!(v.resident_pages(), 1);
        assert!(v.is_resident(i / 4));
    }
    assert_eq!(v.peak_resident_bytes(), v.page_bytes());

    // Every evicted page was written back before it left.
    for i in 0..32 {
        assert_eq!(v.get(i)?, i, "element {i}");
        assert_eq!(v.resident_pages(), 1);
    }
    Ok(())
}

#[test]
fn unbounded_window_never_evicts() -> Result<()> {
    let (_, store) = mem();
    let mut v = open_u64(&store, "unbounded", 64, 4, 0, AccessFlags::READ_WRITE)?;
    for i in (0..64).rev() {
        v.set(i, i)?;
    }
    assert_eq!(v.resident_pages(), 16);
    assert_eq!(v.resident_page_ids(), (0..16).collect::<Vec<u64>>());
    Ok(())
}

#[test]
fn read_only_handle_never_writes_back() -> Result<()> {
    let (m, store) = mem();
    let mut v = open_u64(&store, "ro", 16, 4, 0, AccessFlags::READ_ONLY)?;
    v.set(2, 77)?;
    v.flush()?;
    assert_eq!(m.key_count("ro"), 0);
    Ok(())
}

#[test]
fn subset_handles_keep_independent_caches() -> Result<()> {
    let (_, store) = mem();
    let mut v = open_u64(&store, "subset", 20, 4, 0, AccessFlags::READ_WRITE)?;
    for i in 0..20 {
        v.set(i, i)?;
    }
    v.flush()?;

    let mut s = v.subset(8, 8);
    assert_eq!(s.offset(), 8);
    assert_eq!(s.len(), 8);
    assert_eq!(s.get(0)?, 8);
    assert_eq!(s.get(7)?, 15);

    s.set(0, 999)?;
    s.flush()?;
    // The parent still sees its own resident copy.
    assert_eq!(v.get(8)?, 8);

    let mut fresh = open_u64(&store, "subset", 20, 4, 0, AccessFlags::READ_ONLY)?;
    assert_eq!(fresh.get(8)?, 999);

    let mut shifted = fresh.offset_by(4);
    assert_eq!(shifted.get(4)?, 999);
    shifted.rewind(4);
    assert_eq!(shifted.offset(), 0);
    assert_eq!(shifted.len(), 20);
    shifted.advance(10);
    assert_eq!(shifted.get(0)?, 10);
    Ok(())
}

#[test]
fn append_only_grows_from_zero() -> Result<()> {
    let (_, store) = mem();
    {
        let mut v = open_u64(&store, "append", 100, 4, 2, AccessFlags::APPEND_ONLY)?;
        assert!(v.is_empty());
        for i in 0..10 {
            v.push(i * i)?;
        }
        assert_eq!(v.len(), 10);
        assert_eq!(v.max_size(), 100);
        v.flush()?;
    }
    let mut r = open_u64(&store, "append", 10, 4, 0, AccessFlags::READ_ONLY)?;
    for i in 0..10 {
        assert_eq!(r.get(i)?, i * i);
    }
    Ok(())
}

#[test]
fn push_past_capacity_extends_max_size() -> Result<()> {
    let (_, store) = mem();
    let mut v = open_u64(&store, "grow", 2, 4, 0, AccessFlags::READ_WRITE)?;
    v.push(5)?;
    assert_eq!(v.len(), 3);
    assert_eq!(v.max_size(), 3);
    assert_eq!(v.get(2)?, 5);
    Ok(())
}

#[test]
fn uninitialized_and_destroyed_handles_fail() -> Result<()> {
    let (m, store) = mem();
    let mut blank: Vector<u64> = Vector::with_config(store.clone(), Default::default());
    assert!(!blank.is_initialized());
    assert!(blank.get(0).is_err());

    let mut v = open_u64(&store, "doomed", 8, 4, 0, AccessFlags::READ_WRITE)?;
    v.set(1, 1)?;
    v.flush()?;
    assert!(m.has_bucket("doomed"));
    v.destroy()?;
    assert!(!m.has_bucket("doomed"));
    assert!(!v.is_initialized());
    assert!(v.get(1).is_err());
    // Second destroy is harmless.
    v.destroy()?;
    Ok(())
}

#[test]
fn init_is_idempotent_and_checks_stride() -> Result<()> {
    let (_, store) = mem();
    let mut v: Vector<u32> = Vector::with_config(store.clone(), Default::default());
    assert!(v.init_sized("narrow", 10, 2, AccessFlags::READ_WRITE).is_err());
    v.init_sized("padded", 10, 16, AccessFlags::READ_WRITE)?;
    assert_eq!(v.elem_size(), 16);
    v.init("other", 99, AccessFlags::READ_ONLY)?;
    assert_eq!(v.key(), "padded");
    assert_eq!(v.len(), 10);

    v.set(3, 0xDEAD_BEEF)?;
    v.flush()?;
    let mut r = VecBuilder::from_default()
        .elem_size(16)
        .open::<u32>(store, "padded", 10, AccessFlags::READ_ONLY)?;
    assert_eq!(r.get(3)?, 0xDEAD_BEEF);
    Ok(())
}

#[test]
fn hint_and_barrier_or_flags() -> Result<()> {
    let (m, store) = mem();
    let mut v = open_u64(&store, "flags", 8, 4, 0, AccessFlags::WRITE_ONLY)?;
    v.set(0, 11)?;
    v.hint(AccessFlags::STAGE);
    assert!(v.flags().contains(AccessFlags::WRITE_ONLY | AccessFlags::STAGE));

    v.barrier(AccessFlags::READ_ONLY, &SoloComm)?;
    assert_eq!(v.resident_pages(), 0);
    assert_eq!(m.key_count("flags"), 1);
    assert!(v.flags().contains(AccessFlags::READ_ONLY));
    assert_eq!(v.get(0)?, 11);
    Ok(())
}

#[test]
fn sort_orders_a_range_larger_than_the_window() -> Result<()> {
    let (_, store) = mem();
    let mut v = open_u64(&store, "sort", 200, 8, 4, AccessFlags::READ_WRITE)?;
    let mut rng = oorandom::Rand64::new(0x5EED);
    for i in 0..200 {
        v.set(i, rng.rand_range(0..10_000))?;
    }
    let head = v.get(0)?;

    v.sort(10, 180)?;
    assert!(v.is_sorted(10, 180)?);
    assert_eq!(v.get(0)?, head);
    assert!(v.resident_bytes() <= v.window());

    let (lo, hi) = (v.get(10)?, v.get(189)?);
    v.swap(10, 189)?;
    assert_eq!((v.get(10)?, v.get(189)?), (hi, lo));
    assert!(v.is_sorted(0, 1)?);
    Ok(())
}

#[test]
fn pgas_helpers_record_local_range() -> Result<()> {
    let (_, store) = mem();
    let mut v = open_u64(&store, "pgas", 10, 4, 0, AccessFlags::READ_WRITE)?;
    let r = v.even_pgas(1, 3, 10);
    assert_eq!((r.off, r.size), (4, 3));
    assert_eq!(v.local_off(), 4);
    assert_eq!(v.local_last(), 7);

    let r = v.even_pgas_window(0, 2, 10, 6 * 32);
    assert_eq!(v.local_range(), r);
    assert_eq!(r.size, 5);
    assert_eq!(v.window(), 3 * 32);

    v.even_pgas_window(0, 4, 10, 8);
    assert_eq!(v.window(), v.page_bytes());
    Ok(())
}
