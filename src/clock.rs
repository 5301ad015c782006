//! Wall clock timestamps sent to the microcontroller and the remote service.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn since_epoch() -> Duration {
    // A clock set before 1970 reports zero rather than failing the bridge
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
}

/// Returns the current Unix time in seconds.
pub fn epoch_secs() -> u64 {
    since_epoch().as_secs()
}

/// Returns the current Unix time in milliseconds.
pub fn epoch_millis() -> u128 {
    since_epoch().as_millis()
}
