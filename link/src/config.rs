//! Runtime tunables for the engine link.
//!
//! Every value has a compile-time default and can be overridden through an
//! environment variable. Overrides that fail to parse fall back to the
//! default.

use std::str::FromStr;
use std::time::Duration;

use crate::session::PhasePolicy;

/// Longest line accepted from an engine, terminator excluded.
const DEFAULT_MAX_LINE_LENGTH: usize = 8192;

/// Time allowed between transport connect and `readyok`.
const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 10_000;

/// Live sessions a single link will hold.
const DEFAULT_MAX_SESSIONS: usize = 16;

const DEFAULT_COMMAND_CAPACITY: usize = 32;
const DEFAULT_EVENT_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub max_line_length: usize,
    pub handshake_timeout: Duration,
    pub phase_policy: PhasePolicy,
    pub max_sessions: usize,
    /// Depth of each session's command queue.
    pub command_capacity: usize,
    /// Depth of the broadcast event channel before slow subscribers lag.
    pub event_capacity: usize,
    /// Emit a [`LinkEvent::Traffic`](crate::LinkEvent::Traffic) per line.
    pub traffic_events: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            handshake_timeout: Duration::from_millis(DEFAULT_HANDSHAKE_TIMEOUT_MS),
            phase_policy: PhasePolicy::Strict,
            max_sessions: DEFAULT_MAX_SESSIONS,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            traffic_events: false,
        }
    }
}

impl LinkConfig {
    /// Build a config from the defaults plus environment overrides.
    ///
    /// Variables:
    /// - `ROLLERBALL_MAX_LINE_LENGTH` (bytes)
    /// - `ROLLERBALL_HANDSHAKE_TIMEOUT_MS`
    /// - `ROLLERBALL_PHASE_POLICY` (`strict` or `lenient`)
    /// - `ROLLERBALL_MAX_SESSIONS`
    /// - `ROLLERBALL_TRAFFIC_EVENTS` (`true` or `false`)
    pub fn from_env() -> Self {
        Self {
            max_line_length: env_or("ROLLERBALL_MAX_LINE_LENGTH", DEFAULT_MAX_LINE_LENGTH),
            handshake_timeout: Duration::from_millis(env_or(
                "ROLLERBALL_HANDSHAKE_TIMEOUT_MS",
                DEFAULT_HANDSHAKE_TIMEOUT_MS,
            )),
            phase_policy: env_or("ROLLERBALL_PHASE_POLICY", PhasePolicy::Strict),
            max_sessions: env_or("ROLLERBALL_MAX_SESSIONS", DEFAULT_MAX_SESSIONS),
            traffic_events: env_or("ROLLERBALL_TRAFFIC_EVENTS", false),
            ..Self::default()
        }
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }

    pub fn with_phase_policy(mut self, policy: PhasePolicy) -> Self {
        self.phase_policy = policy;
        self
    }

    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    pub fn with_traffic_events(mut self, enabled: bool) -> Self {
        self.traffic_events = enabled;
        self
    }
}

fn env_or<T: FromStr>(var: &str, default: T) -> T {
    match std::env::var(var) {
        Ok(value) => value.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.max_line_length, DEFAULT_MAX_LINE_LENGTH);
        assert_eq!(config.handshake_timeout, Duration::from_secs(10));
        assert_eq!(config.phase_policy, PhasePolicy::Strict);
        assert_eq!(config.max_sessions, DEFAULT_MAX_SESSIONS);
        assert!(!config.traffic_events);
    }

    #[test]
    fn test_from_env_max_sessions() {
        let config = LinkConfig::from_env();
        match std::env::var("ROLLERBALL_MAX_SESSIONS") {
            Ok(val) => assert_eq!(
                config.max_sessions,
                val.trim().parse().unwrap_or(DEFAULT_MAX_SESSIONS)
            ),
            Err(_) => assert_eq!(config.max_sessions, DEFAULT_MAX_SESSIONS),
        }
    }

    #[test]
    fn test_env_or_unset_uses_default() {
        assert_eq!(env_or("ROLLERBALL_TEST_UNSET_VARIABLE", 7usize), 7);
    }

    #[test]
    fn test_builders() {
        let config = LinkConfig::default()
            .with_handshake_timeout(Duration::from_millis(50))
            .with_max_line_length(16)
            .with_phase_policy(PhasePolicy::Lenient)
            .with_max_sessions(2)
            .with_traffic_events(true);
        assert_eq!(config.handshake_timeout, Duration::from_millis(50));
        assert_eq!(config.max_line_length, 16);
        assert_eq!(config.phase_policy, PhasePolicy::Lenient);
        assert_eq!(config.max_sessions, 2);
        assert!(config.traffic_events);
    }
}
