//! Shared constants for end-to-end tests
//!
//! When classifier stand-ins or user ids change, update only this file.

// ============================================================================
// Test Users
// ============================================================================

/// User id applied by the server when a request names none
pub const DEFAULT_USER: &str = "astronaut_1";

/// Explicit crew member used by most session tests
pub const CREW_USER: &str = "crew-7";

/// A user id the server must reject
pub const INVALID_USER: &str = "bad user!";

// ============================================================================
// Classifier Stand-ins
// ============================================================================

/// Default video answer of a spawned test server
pub const DEFAULT_VIDEO: (&str, f64) = ("happy", 0.9);

/// Default audio answer of a spawned test server
pub const DEFAULT_AUDIO: (&str, f64) = ("happy", 0.8);

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Timeout the server uses for remote storage calls (milliseconds)
pub const REMOTE_TIMEOUT_MS: u64 = 500;
