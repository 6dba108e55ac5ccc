/// ─── VaultGov Protocol Constants ────────────────────────────────────────────
///
/// Defaults for `VaultParams`. Deployments may override them through the
/// params JSON; the engine never reads these directly.

pub const SECS_PER_DAY: i64 = 24 * 3600;

// ── Custody ──────────────────────────────────────────────────────────────────

/// Minimum lock duration accepted by a deposit (seconds). Default: 180 days.
pub const MIN_LOCK_DURATION_SECS: i64 = 180 * SECS_PER_DAY;

// ── Governance ───────────────────────────────────────────────────────────────

/// Voting window opened by every proposal (seconds). Default: 7 days.
pub const VOTING_WINDOW_SECS: i64 = 7 * SECS_PER_DAY;

/// Fixed-point scale applied to voting weight so that a fraction of the
/// circulating supply survives integer division.
pub const WEIGHT_SCALE: u128 = 1_000_000_000_000_000_000;

// ── Storage meta keys ────────────────────────────────────────────────────────

pub const META_NEXT_PROPOSAL_ID: &str = "next_proposal_id";
pub const META_NEXT_EVENT_SEQ: &str = "next_event_seq";
pub const META_NEXT_HISTORY_SEQ: &str = "next_history_seq";
