//! Constants for the download module (timeouts, progress pacing, buffers).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default whole-request timeout (10 seconds).
///
/// A timed-out request fails the current mirror like any other I/O error.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Minimum spacing between intermediate progress events.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Buffer size used when hashing and copying streams.
pub const COPY_BUFFER_SIZE: usize = 16 * 1024;

/// Permission bits given to installed files unless a target asks otherwise.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Suffix appended to private temp files next to their destination.
pub const TEMP_SUFFIX: &str = ".downloading";
