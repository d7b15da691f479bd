//! Centralized configuration and builder for MegaVec handles.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - MegaConfig::from_env() reads MM_* env vars; MegaConfig::default() ignores env.
//! - VecBuilder collects a config plus a window and opens a MegaVec over a store.
//!
//! Defaults:
//! - page_bytes = 256 KiB (elements per page = max(1, page_bytes / element size))
//! - window_bytes = 0 (unbounded; handles never evict until bound_memory())
//! - max_prefetch_pages = 64
//! - stage_on_flush = true (every flush Put carries the stage hint)

use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::consts::{
    DEFAULT_MAX_PREFETCH_PAGES, DEFAULT_PAGE_BYTES, ENV_MAX_PREFETCH_PAGES, ENV_PAGE_BYTES,
    ENV_STAGE_ON_FLUSH, ENV_WINDOW_BYTES,
};
use crate::element::Element;
use crate::flags::AccessFlags;
use crate::store::BlobStore;
use crate::vector::MegaVec;

/// Tunables shared by every handle opened with this config.
#[derive(Clone, Debug)]
pub struct MegaConfig {
    /// Byte budget of one page.
    /// Env: MM_PAGE_BYTES (default 262144)
    pub page_bytes: usize,

    /// Memory window applied to new handles, in bytes. 0 disables eviction.
    /// Env: MM_WINDOW_BYTES (default 0)
    pub window_bytes: usize,

    /// Clamp on pages a transaction may prefetch in one log pass.
    /// Env: MM_MAX_PREFETCH_PAGES (default 64)
    pub max_prefetch_pages: u64,

    /// Pass the stage hint to the store on every flush.
    /// Env: MM_STAGE_ON_FLUSH = 0|1|true|false (default true)
    pub stage_on_flush: bool,
}

impl Default for MegaConfig {
    fn default() -> Self {
        Self {
            page_bytes: DEFAULT_PAGE_BYTES,
            window_bytes: 0,
            max_prefetch_pages: DEFAULT_MAX_PREFETCH_PAGES,
            stage_on_flush: true,
        }
    }
}

fn env_bool(v: &str) -> bool {
    let s = v.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "on" || s == "yes"
}

impl MegaConfig {
    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var(ENV_PAGE_BYTES) {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.page_bytes = n;
            }
        }

        if let Ok(v) = std::env::var(ENV_WINDOW_BYTES) {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.window_bytes = n;
            }
        }

        if let Ok(v) = std::env::var(ENV_MAX_PREFETCH_PAGES) {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.max_prefetch_pages = n;
            }
        }

        if let Ok(v) = std::env::var(ENV_STAGE_ON_FLUSH) {
            cfg.stage_on_flush = env_bool(&v);
        }

        cfg
    }

    /// Reject configurations the cache cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.page_bytes == 0 {
            return Err(anyhow!("page_bytes must be > 0"));
        }
        Ok(())
    }

    /// Fluent setters (builder-style) to override specific fields.

    pub fn with_page_bytes(mut self, bytes: usize) -> Self {
        self.page_bytes = bytes;
        self
    }

    pub fn with_window_bytes(mut self, bytes: usize) -> Self {
        self.window_bytes = bytes;
        self
    }

    pub fn with_max_prefetch_pages(mut self, pages: u64) -> Self {
        self.max_prefetch_pages = pages;
        self
    }

    pub fn with_stage_on_flush(mut self, on: bool) -> Self {
        self.stage_on_flush = on;
        self
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> Self {
        self
    }
}

impl fmt::Display for MegaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MegaConfig {{ \
             page_bytes: {}, \
             window_bytes: {}, \
             max_prefetch_pages: {}, \
             stage_on_flush: {} \
             }}",
            self.page_bytes,
            if self.window_bytes == 0 {
                "unbounded".to_string()
            } else {
                self.window_bytes.to_string()
            },
            self.max_prefetch_pages,
            self.stage_on_flush,
        )
    }
}

/// Builder that opens a MegaVec over a store.
#[derive(Clone, Debug)]
pub struct VecBuilder {
    cfg: MegaConfig,
    elem_size: Option<usize>,
}

impl Default for VecBuilder {
    fn default() -> Self {
        // Start from env, then allow overrides.
        Self {
            cfg: MegaConfig::from_env(),
            elem_size: None,
        }
    }
}

impl VecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: MegaConfig::default(),
            elem_size: None,
        }
    }

    pub fn config(mut self, cfg: MegaConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn page_bytes(mut self, bytes: usize) -> Self {
        self.cfg.page_bytes = bytes;
        self
    }

    /// Size pages so that each holds exactly `n` elements of `T`.
    pub fn elements_per_page<T: Element>(mut self, n: usize) -> Self {
        let stride = self.elem_size.unwrap_or(T::SIZE);
        self.cfg.page_bytes = n.max(1) * stride;
        self
    }

    /// Element stride in bytes (>= natural width of `T`).
    pub fn elem_size(mut self, bytes: usize) -> Self {
        self.elem_size = Some(bytes);
        self
    }

    pub fn window_bytes(mut self, bytes: usize) -> Self {
        self.cfg.window_bytes = bytes;
        self
    }

    pub fn max_prefetch_pages(mut self, pages: u64) -> Self {
        self.cfg.max_prefetch_pages = pages;
        self
    }

    pub fn stage_on_flush(mut self, on: bool) -> Self {
        self.cfg.stage_on_flush = on;
        self
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> MegaConfig {
        self.cfg
    }

    /// Open (or create) the named vector with this configuration.
    pub fn open<T: Element>(
        self,
        store: Arc<dyn BlobStore>,
        key: &str,
        count: u64,
        flags: AccessFlags,
    ) -> Result<MegaVec<T>> {
        let elem_size = self.elem_size.unwrap_or(T::SIZE);
        let mut v = MegaVec::with_config(store, self.cfg);
        v.init_sized(key, count, elem_size, flags)?;
        Ok(v)
    }
}
