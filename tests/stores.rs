use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use MegaVec::{AccessFlags, BlobStore, Bucket, DirStore, MemStore, SoloComm, TieredStore, VecBuilder};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("megavec-{prefix}-{pid}-{t}-{id}"))
}

#[test]
fn dir_store_get_put_and_destroy() -> Result<()> {
    let root = unique_root("dir");
    let store = DirStore::open(&root)?;
    let b = store.open_bucket("alpha")?;
    assert_eq!(b.name(), "alpha");

    let mut out = [0xFFu8; 8];
    assert!(!b.get("0", &mut out)?);
    assert_eq!(out, [0u8; 8]);

    b.put("0", &[1, 2, 3], false)?;
    assert!(b.get("0", &mut out)?);
    assert_eq!(out, [1, 2, 3, 0, 0, 0, 0, 0]);

    let dir = store.bucket_dir("alpha");
    assert_eq!(fs::read_to_string(dir.join("NAME"))?, "alpha");
    assert!(dir.join("0.page").exists());
    assert_ne!(dir, store.bucket_dir("beta"));

    b.destroy()?;
    assert!(!dir.exists());
    b.destroy()?;
    out = [0xFF; 8];
    assert!(!b.get("0", &mut out)?);
    assert_eq!(out, [0u8; 8]);
    // Reading a destroyed bucket leaves no directory behind.
    assert!(!dir.exists());

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn dir_store_backs_a_vector_across_reopen() -> Result<()> {
    let root = unique_root("dirvec");
    {
        let store: Arc<dyn BlobStore> = Arc::new(DirStore::open(&root)?);
        let mut v = VecBuilder::from_default()
            .elements_per_page::<i32>(16)
            .window_bytes(2 * 16 * 4)
            .open::<i32>(store, "ints", 100, AccessFlags::WRITE_ONLY)?;
        for i in 0..100 {
            v.set(i, -(i as i32))?;
        }
        v.flush()?;
    }
    let store: Arc<dyn BlobStore> = Arc::new(DirStore::open(&root)?);
    let mut v = VecBuilder::from_default()
        .elements_per_page::<i32>(16)
        .open::<i32>(store, "ints", 100, AccessFlags::READ_ONLY)?;
    for i in (0..100).rev() {
        assert_eq!(v.get(i)?, -(i as i32));
    }
    assert_eq!(v.page_count(), 7);

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn tiered_store_stages_only_on_request() -> Result<()> {
    let cold = MemStore::new();
    let tiered = TieredStore::new(Arc::new(cold.clone()));
    let b = tiered.open_bucket("t")?;

    b.put("1", &[9; 4], false)?;
    assert_eq!(tiered.hot_keys("t"), 0);
    assert_eq!(cold.key_count("t"), 1);

    b.put("2", &[7; 4], true)?;
    assert_eq!(tiered.hot_keys("t"), 1);
    assert_eq!(cold.key_count("t"), 2);

    // A cold hit is promoted.
    let mut out = [0u8; 4];
    assert!(b.get("1", &mut out)?);
    assert_eq!(out, [9; 4]);
    assert_eq!(tiered.hot_keys("t"), 2);

    // Unstaged overwrite must not leave a stale hot copy.
    b.put("2", &[1; 4], false)?;
    assert!(b.get("2", &mut out)?);
    assert_eq!(out, [1; 4]);

    b.destroy()?;
    assert_eq!(tiered.hot_keys("t"), 0);
    assert_eq!(cold.key_count("t"), 0);
    Ok(())
}

#[test]
fn vector_flush_stage_hint_follows_config() -> Result<()> {
    let cold = MemStore::new();
    let tiered = TieredStore::new(Arc::new(cold.clone()));
    let store: Arc<dyn BlobStore> = Arc::new(tiered.clone());

    let mut plain = VecBuilder::from_default()
        .elements_per_page::<u64>(4)
        .stage_on_flush(false)
        .open::<u64>(store.clone(), "plain", 16, AccessFlags::READ_WRITE)?;
    for i in 0..16 {
        plain.set(i, i)?;
    }
    plain.flush()?;
    assert_eq!(cold.key_count("plain"), 4);
    assert_eq!(tiered.hot_keys("plain"), 0);

    let mut staged = VecBuilder::from_default()
        .elements_per_page::<u64>(4)
        .stage_on_flush(false)
        .open::<u64>(store, "staged", 16, AccessFlags::WRITE_ONLY | AccessFlags::STAGE)?;
    for i in 0..16 {
        staged.set(i, i)?;
    }
    staged.flush()?;
    assert_eq!(tiered.hot_keys("staged"), 4);
    Ok(())
}

#[test]
fn mem_store_is_shared_between_clones() -> Result<()> {
    let a = MemStore::new();
    let b = a.clone();
    a.open_bucket("x")?.put("k", b"v", false)?;
    let mut out = [0u8; 1];
    assert!(b.open_bucket("x")?.get("k", &mut out)?);
    assert_eq!(&out, b"v");
    assert!(b.has_bucket("x"));
    Ok(())
}

#[test]
fn tiered_sync_drops_hot_copies_left_by_a_peer_commit() -> Result<()> {
    let root = unique_root("tiered-peers");
    let cold: Arc<dyn BlobStore> = Arc::new(DirStore::open(&root)?);
    // Два экземпляра над одним cold: как два процесса.
    let a = TieredStore::new(cold.clone()).open_bucket("p")?;
    let b = TieredStore::new(cold).open_bucket("p")?;

    let mut out = [0u8; 1];
    a.put("0", &[1], true)?;
    assert!(b.get("0", &mut out)?);
    assert_eq!(out, [1]);

    a.put("0", &[2], true)?;
    // b still serves its promoted copy until it syncs.
    b.get("0", &mut out)?;
    assert_eq!(out, [1]);
    b.sync()?;
    assert!(b.get("0", &mut out)?);
    assert_eq!(out, [2]);

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn barrier_sees_peer_writes_through_separate_tiered_stores() -> Result<()> {
    let root = unique_root("tiered-barrier");
    let cold: Arc<dyn BlobStore> = Arc::new(DirStore::open(&root)?);
    let store_a: Arc<dyn BlobStore> = Arc::new(TieredStore::new(cold.clone()));
    let store_b: Arc<dyn BlobStore> = Arc::new(TieredStore::new(cold));
    let open = |store: Arc<dyn BlobStore>, flags| {
        VecBuilder::from_default()
            .elements_per_page::<u64>(4)
            .open::<u64>(store, "shared", 8, flags)
    };
    let mut a = open(store_a, AccessFlags::READ_WRITE)?;
    let mut b = open(store_b, AccessFlags::READ_ONLY)?;

    a.set(0, 1)?;
    a.barrier(AccessFlags::empty(), &SoloComm)?;
    assert_eq!(b.get(0)?, 1);
    b.barrier(AccessFlags::empty(), &SoloComm)?;

    a.set(0, 2)?;
    a.barrier(AccessFlags::empty(), &SoloComm)?;
    b.barrier(AccessFlags::empty(), &SoloComm)?;
    assert_eq!(b.get(0)?, 2);

    let _ = fs::remove_dir_all(&root);
    Ok(())
}
