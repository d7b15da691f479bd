//! Общие константы: геометрия страниц, имена ENV, формат ключей.

// -------- Pages --------
/// Byte budget of one page unless overridden (256 KiB).
pub const DEFAULT_PAGE_BYTES: usize = 256 * 1024;
/// Upper bound on pages prefetched by one log pass.
pub const DEFAULT_MAX_PREFETCH_PAGES: u64 = 64;

// -------- Env --------
pub const ENV_PAGE_BYTES: &str = "MM_PAGE_BYTES";
pub const ENV_WINDOW_BYTES: &str = "MM_WINDOW_BYTES";
pub const ENV_MAX_PREFETCH_PAGES: &str = "MM_MAX_PREFETCH_PAGES";
pub const ENV_STAGE_ON_FLUSH: &str = "MM_STAGE_ON_FLUSH";

// -------- Directory store --------
/// Prefix of a bucket directory inside a DirStore root.
pub const BUCKET_DIR_PREFIX: &str = "bkt-";
/// Extension of a page blob file.
pub const PAGE_FILE_EXT: &str = "page";
/// File that records the human-readable bucket name.
pub const BUCKET_NAME_FILE: &str = "NAME";
/// Advisory lock file guarding Get/Put on one bucket.
pub const BUCKET_LOCK_FILE: &str = "LOCK";

/// Key of a page in the backing object: decimal page index.
#[inline]
pub fn page_key(page_idx: u64) -> String {
    page_idx.to_string()
}
