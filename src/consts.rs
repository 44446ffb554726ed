//! Shared constants for the editor crate.

use std::time::Duration;

// ── Change emission ─────────────────────────────────────────────

/// Quiet interval after the last tracked-field update before an outbound emission.
pub const DEBOUNCE: Duration = Duration::from_millis(200);

// ── Toolbox placement ───────────────────────────────────────────

/// Smallest coordinate (inclusive) assigned to an element added from the toolbox.
pub const POSITION_MIN: i32 = 20;

/// Largest coordinate (inclusive) assigned to an element added from the toolbox.
pub const POSITION_MAX: i32 = 500;

// ── Notifications ───────────────────────────────────────────────

/// How long a copy/paste acknowledgment stays on screen.
pub const NOTIFY_DURATION: Duration = Duration::from_millis(2000);

/// Label of the dismiss action on copy/paste acknowledgments.
pub const NOTIFY_DISMISS_LABEL: &str = "Dismiss";

// ── Codec ───────────────────────────────────────────────────────

/// Upper bound on the inflated JSON size accepted by the decoder (8 MiB).
pub const MAX_DECODED_BYTES: u64 = 8 * 1024 * 1024;

// ── Panels ──────────────────────────────────────────────────────

/// Default container the property panels are shown in.
pub const PANEL_CONTAINER: &str = "properties";
