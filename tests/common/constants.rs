//! Shared constants for end-to-end tests
//!
//! When the fake provider's catalog changes, update only this file.

// ============================================================================
// Movie ids
// ============================================================================

/// Placeholder id created locally before the real movie was known
pub const PLACEHOLDER_ID: i64 = -7;

/// Title the placeholder carries (a typo of the real title)
pub const PLACEHOLDER_TITLE: &str = "Fight Clubb";

/// Canonical id the fake provider knows about
pub const CANONICAL_ID: i64 = 550;

/// Title the fake provider reports for CANONICAL_ID
pub const CANONICAL_TITLE: &str = "Fight Club";

/// A plausible id the fake provider has never heard of
pub const UNKNOWN_PROVIDER_ID: i64 = 424242;

// ============================================================================
// Fake provider data
// ============================================================================

pub const DIRECTOR_ID: i64 = 7467;

/// Cast members the fake provider returns for CANONICAL_ID
pub const CAST_SIZE: usize = 12;

/// Poster the ranking must pick: English, lower votes than the French one
pub const ENGLISH_POSTER: &str = "/poster-en.jpg";

pub const TEST_API_KEY: &str = "e2e-test-key";

// ============================================================================
// Timeouts
// ============================================================================

/// Timeout for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Poll interval when waiting for server readiness (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;

/// Default request timeout for HTTP client (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
