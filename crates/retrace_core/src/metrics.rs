//! Session counters and logging setup.

use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Lines written by one recording session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionMetrics {
    pub headers: u64,
    pub keyframes: u64,
    pub inputs: u64,
    pub snapshots: u64,
    pub write_failures: u64,
}

impl SessionMetrics {
    #[must_use]
    pub fn lines_written(&self) -> u64 {
        self.headers + self.keyframes + self.inputs
    }
}

/// Installs the global fmt subscriber. `RUST_LOG` overrides `default_level`.
/// Later calls are ignored.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_written() {
        let m = SessionMetrics {
            headers: 1,
            keyframes: 4,
            inputs: 2,
            snapshots: 40,
            write_failures: 0,
        };
        assert_eq!(m.lines_written(), 7);
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging("info");
        init_logging("debug");
    }
}
