/// Hard upper bound for any listing `LIMIT`/page size to protect DB and memory usage.
pub const MAX_LISTING_ELEMENTS: i64 = 100;
pub const DEFAULT_PAGE_SIZE: i64 = 12;

/// Where failed downloads and resource views send the browser.
pub const FALLBACK_PATH: &str = "/resources";

pub const LOGIN_ATTEMPTS_PER_MINUTE: u32 = 5;
