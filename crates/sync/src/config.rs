use coedit_core::sync::{CLIENT_POLL_INTERVAL_MS, SESSION_STALE_TIMEOUT_SECS};

/// Tunables for the polling protocol, loaded from environment variables.
///
/// All fields have defaults matching the protocol constants in
/// `coedit_core::sync`.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Sessions idle longer than this are reported to the external
    /// cleanup job (default: `1800`).
    pub session_stale_timeout_secs: i64,
    /// Cadence UI clients are told to re-fetch sync flags at, in
    /// milliseconds (default: `3500`).
    pub poll_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            session_stale_timeout_secs: SESSION_STALE_TIMEOUT_SECS,
            poll_interval_ms: CLIENT_POLL_INTERVAL_MS,
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `SESSION_STALE_TIMEOUT_SECS` | `1800`  |
    /// | `CLIENT_POLL_INTERVAL_MS`    | `3500`  |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let session_stale_timeout_secs = std::env::var("SESSION_STALE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.session_stale_timeout_secs);

        let poll_interval_ms = std::env::var("CLIENT_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.poll_interval_ms);

        Self {
            session_stale_timeout_secs,
            poll_interval_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_constants() {
        let config = SyncConfig::default();
        assert_eq!(config.session_stale_timeout_secs, 1800);
        assert_eq!(config.poll_interval_ms, 3500);
    }
}
