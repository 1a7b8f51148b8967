//! Process resource limits.
//!
//! Every worker may hold a socket open, so the worker ceiling follows the
//! open-file limit. [`apply_resource_limits`] runs once at startup; the
//! engine only reads the result through [`worker_ceiling`].

use std::sync::OnceLock;
#[cfg(unix)]
use tracing::{debug, warn};

/// Upper bound on concurrent workers and the descriptor limit requested.
pub const WORKER_CEILING: usize = 4095;

static CEILING: OnceLock<usize> = OnceLock::new();

/// Raise the open-file limit towards [`WORKER_CEILING`] and fix the worker
/// ceiling to what was obtained. Later calls return the first result.
pub fn apply_resource_limits() -> usize {
    *CEILING.get_or_init(raise_nofile_limit)
}

/// The current worker ceiling.
pub fn worker_ceiling() -> usize {
    CEILING.get().copied().unwrap_or(WORKER_CEILING)
}

#[cfg(unix)]
fn raise_nofile_limit() -> usize {
    match rlimit::increase_nofile_limit(WORKER_CEILING as u64) {
        Ok(limit) => {
            debug!(limit, "open file limit");
            usize::try_from(limit).map_or(WORKER_CEILING, |limit| limit.clamp(1, WORKER_CEILING))
        }
        Err(e) => {
            warn!(error = %e, "could not raise the open file limit");
            WORKER_CEILING
        }
    }
}

#[cfg(not(unix))]
fn raise_nofile_limit() -> usize {
    WORKER_CEILING
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceiling_is_stable() {
        let first = apply_resource_limits();
        assert!((1..=WORKER_CEILING).contains(&first));
        assert_eq!(apply_resource_limits(), first);
        assert_eq!(worker_ceiling(), first);
    }
}
