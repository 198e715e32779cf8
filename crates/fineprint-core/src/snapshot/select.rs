use crate::snapshot::model::Snapshot;
use chrono::{DateTime, Duration, Utc};

/// Minimum age, in days, of a capture eligible as the prior version
pub const DEFAULT_GRACE_DAYS: i64 = 7;

/// Largest accepted grace period, in days
pub const MAX_GRACE_DAYS: i64 = 36_500;

pub fn default_grace_period() -> Duration {
    Duration::days(DEFAULT_GRACE_DAYS)
}

/// Grace period of `days` days, or `None` outside `0..=MAX_GRACE_DAYS`
pub fn grace_period_days(days: i64) -> Option<Duration> {
    if !(0..=MAX_GRACE_DAYS).contains(&days) {
        return None;
    }
    Duration::try_days(days)
}

/// Outcome of prior-snapshot selection
///
/// Finding nothing is an ordinary outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorSnapshot<'a> {
    Selected(&'a Snapshot),
    NoPriorSnapshot,
}

impl<'a> PriorSnapshot<'a> {
    pub fn selected(self) -> Option<&'a Snapshot> {
        match self {
            PriorSnapshot::Selected(snapshot) => Some(snapshot),
            PriorSnapshot::NoPriorSnapshot => None,
        }
    }
}

/// Select the newest capture strictly older than `reference - grace`
///
/// Captures with a placeholder status are ignored. When several captures
/// share the winning timestamp, the last one in `snapshots` is chosen.
/// A cutoff that falls outside the representable date range selects
/// nothing.
pub fn select_prior_snapshot(
    snapshots: &[Snapshot],
    reference: DateTime<Utc>,
    grace: Duration,
) -> PriorSnapshot<'_> {
    let Some(cutoff) = reference.checked_sub_signed(grace) else {
        return PriorSnapshot::NoPriorSnapshot;
    };

    snapshots
        .iter()
        .filter(|s| s.has_status() && s.timestamp < cutoff)
        .max_by_key(|s| s.timestamp)
        .map_or(PriorSnapshot::NoPriorSnapshot, PriorSnapshot::Selected)
}
