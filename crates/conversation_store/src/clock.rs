//! Local wall-clock time for conversation ids.
//!
//! On Unix the local UTC offset can only be read while the process is single-threaded, so it is
//! resolved once (ideally first thing in `main`) and reused for every later save.

use once_cell::sync::OnceCell;
use time::{OffsetDateTime, UtcOffset};

static LOCAL_OFFSET: OnceCell<UtcOffset> = OnceCell::new();

/// Resolves and caches the local UTC offset. Falls back to UTC when it cannot be determined.
///
/// Call before spawning threads; later calls return the cached value.
pub fn capture_local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| {
        UtcOffset::current_local_offset().unwrap_or_else(|_| {
            tracing::debug!("local offset unavailable; using UTC for conversation time");
            UtcOffset::UTC
        })
    })
}

/// Current time in the captured local offset.
pub fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(capture_local_offset())
}
