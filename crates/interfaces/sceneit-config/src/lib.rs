//! Central configuration constants for the client and its defaults.

/// Base URL of the REST API when none is configured.
pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:8000";

/// Per-request timeout applied by the view loader, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Storage key of the persisted session blob.
pub const SESSION_STORAGE_KEY: &str = "authUser";

/// Page sizes offered by the movie table.
pub const PAGE_SIZES: [usize; 3] = [5, 10, 20];

pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Reviews are rated on a 0..=100 scale.
pub const MAX_REVIEW_RATING: u8 = 100;

/// Snaps an arbitrary page size to the closest offered one.
pub fn clamp_page_size(v: usize) -> usize {
    PAGE_SIZES
        .iter()
        .copied()
        .min_by_key(|s| s.abs_diff(v))
        .unwrap_or(DEFAULT_PAGE_SIZE)
}
