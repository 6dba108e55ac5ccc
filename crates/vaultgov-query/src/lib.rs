//! vaultgov-query
//!
//! Read-only views over custody records and proposals. The state
//! transitions live in vaultgov-state's VaultEngine; this crate only reads
//! the `StateDb` and renders human-readable summaries.

pub mod custody;
pub mod proposal;

pub use custody::CustodyQuery;
pub use proposal::ProposalQuery;

use chrono::{DateTime, Utc};
use vaultgov_core::types::Timestamp;

/// Render a Unix timestamp as an ISO-8601 UTC date-time.
pub(crate) fn format_ts(ts: Timestamp) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("unix {ts}"))
}
