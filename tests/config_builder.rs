use std::sync::Arc;

use anyhow::Result;

use MegaVec::consts::{ENV_MAX_PREFETCH_PAGES, ENV_PAGE_BYTES, ENV_STAGE_ON_FLUSH, ENV_WINDOW_BYTES};
use MegaVec::{AccessFlags, BlobStore, MegaConfig, MegaVec as Vector, MemStore, VecBuilder};

#[test]
fn env_overrides_defaults_and_builder_overrides_env() -> Result<()> {
    std::env::set_var(ENV_PAGE_BYTES, "4096");
    std::env::set_var(ENV_WINDOW_BYTES, "16384");
    std::env::set_var(ENV_MAX_PREFETCH_PAGES, "3");
    std::env::set_var(ENV_STAGE_ON_FLUSH, "off");

    let cfg = MegaConfig::from_env();
    assert_eq!(cfg.page_bytes, 4096);
    assert_eq!(cfg.window_bytes, 16384);
    assert_eq!(cfg.max_prefetch_pages, 3);
    assert!(!cfg.stage_on_flush);

    // Garbage is ignored.
    std::env::set_var(ENV_PAGE_BYTES, "lots");
    assert_eq!(MegaConfig::from_env().page_bytes, 262_144);

    let store: Arc<dyn BlobStore> = Arc::new(MemStore::new());
    let v: Vector<u64> = Vector::open(store.clone(), "env", 10, AccessFlags::READ_WRITE)?;
    assert_eq!(v.window(), 16384);
    assert_eq!(v.elmts_per_page(), 262_144 / 8);

    let v = VecBuilder::new()
        .page_bytes(64)
        .window_bytes(0)
        .open::<u64>(store, "built", 10, AccessFlags::READ_WRITE)?;
    assert_eq!(v.elmts_per_page(), 8);
    assert_eq!(v.window(), 0);
    assert_eq!(v.config().max_prefetch_pages, 3);

    for k in [ENV_PAGE_BYTES, ENV_WINDOW_BYTES, ENV_MAX_PREFETCH_PAGES, ENV_STAGE_ON_FLUSH] {
        std::env::remove_var(k);
    }
    Ok(())
}

#[test]
fn defaults_and_validation() -> Result<()> {
    let cfg = MegaConfig::default();
    assert_eq!(cfg.page_bytes, 256 * 1024);
    assert_eq!(cfg.window_bytes, 0);
    assert!(cfg.stage_on_flush);
    assert!(cfg.to_string().contains("unbounded"));

    let bad = MegaConfig::default().with_page_bytes(0);
    assert!(bad.validate().is_err());
    let store: Arc<dyn BlobStore> = Arc::new(MemStore::new());
    let r = VecBuilder::from_default()
        .config(bad)
        .open::<u8>(store.clone(), "bad", 1, AccessFlags::READ_WRITE);
    assert!(r.is_err());

    // Page bytes not a multiple of the element size round down.
    let v = VecBuilder::from_default()
        .page_bytes(30)
        .open::<u64>(store.clone(), "odd", 10, AccessFlags::READ_WRITE)?;
    assert_eq!(v.elmts_per_page(), 3);
    assert_eq!(v.page_bytes(), 24);

    // A page smaller than one element still holds one element.
    let v = VecBuilder::from_default()
        .page_bytes(2)
        .open::<u64>(store, "small", 10, AccessFlags::READ_WRITE)?;
    assert_eq!(v.elmts_per_page(), 1);

    let built = MegaConfig::default()
        .with_window_bytes(1 << 20)
        .with_max_prefetch_pages(8)
        .with_stage_on_flush(false)
        .build();
    assert!(built.to_string().contains("window_bytes: 1048576"));
    Ok(())
}
