//! Configuration for the arbiter.
//!
//! Engine endpoints default to the two local rollerball engines (white on
//! port 8181, black on 8182). Each can be overridden through an environment
//! variable and again on the command line, which takes precedence.

use rollerball_link::{Endpoint, Side};

/// Default endpoint of the engine playing white.
const DEFAULT_WHITE_ENDPOINT: &str = "127.0.0.1:8181";

/// Default endpoint of the engine playing black.
const DEFAULT_BLACK_ENDPOINT: &str = "127.0.0.1:8182";

/// Default thinking time per move (in milliseconds).
pub const DEFAULT_MOVETIME_MS: u64 = 1000;

/// Default number of plies after which the match is stopped.
pub const DEFAULT_MAX_PLIES: usize = 200;

/// Extra time (in milliseconds) an engine gets beyond its movetime before it
/// is told to stop.
pub const SEARCH_GRACE_MS: u64 = 5000;

/// Get the endpoint string for one side.
///
/// Priority:
/// 1. `ROLLERBALL_WHITE_ENDPOINT` / `ROLLERBALL_BLACK_ENDPOINT` if set
/// 2. `127.0.0.1:8181` / `127.0.0.1:8182` as fallback
pub fn get_endpoint(side: Side) -> String {
    let (var, default) = match side {
        Side::White => ("ROLLERBALL_WHITE_ENDPOINT", DEFAULT_WHITE_ENDPOINT),
        Side::Black => ("ROLLERBALL_BLACK_ENDPOINT", DEFAULT_BLACK_ENDPOINT),
    };
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

/// Resolve the endpoint for `side`, preferring an explicit command-line value.
pub fn resolve_endpoint(side: Side, explicit: Option<&str>) -> Result<Endpoint, rollerball_link::LinkError> {
    match explicit {
        Some(raw) => raw.parse(),
        None => get_endpoint(side).parse(),
    }
}
