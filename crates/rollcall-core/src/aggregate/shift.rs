//! Shift-window allocation.
//!
//! Boundaries are hour offsets from a day's midnight:
//!
//! ```text
//!  -15    -7     +1     +9     +17    +25    +33
//!   |  0   |  1   |  2   |  3   |  4   |  5   |
//!   09:00  17:00  01:00  09:00  17:00  01:00  09:00
//!   (day - 1)            (day)               (day + 1)
//! ```
//!
//! Sub-windows fold pairwise into the three named shifts: `{0, 3}` is
//! Shift 1 (09–17), `{1, 4}` Shift 2 (17–01), `{2, 5}` Shift 3 (01–09).
//! The 48 hours of windows around the anchor day let a session that begins
//! before midnight, or runs across it, land in the right buckets without any
//! per-day splitting.

use chrono::{Duration, NaiveDateTime, NaiveTime};

use super::{Shift, ShiftTotals};
use crate::model::Session;

/// Sub-window boundaries in hours relative to the anchor day's midnight.
pub const BOUNDARY_HOURS: [i64; 7] = [-15, -7, 1, 9, 17, 25, 33];

/// Number of sub-windows between the boundaries.
pub const SUB_WINDOWS: usize = BOUNDARY_HOURS.len() - 1;

/// Logical shift of each sub-window.
pub const FOLD: [Shift; SUB_WINDOWS] = [
    Shift::First,
    Shift::Second,
    Shift::Third,
    Shift::First,
    Shift::Second,
    Shift::Third,
];

/// Midnight at the start of `t`'s calendar day.
#[must_use]
pub fn midnight(t: NaiveDateTime) -> NaiveDateTime {
    t.date().and_time(NaiveTime::MIN)
}

/// The six `[start, end)` sub-windows anchored at `anchor` (a midnight).
#[must_use]
pub fn sub_windows(anchor: NaiveDateTime) -> [(NaiveDateTime, NaiveDateTime); SUB_WINDOWS] {
    std::array::from_fn(|j| {
        (
            anchor + Duration::hours(BOUNDARY_HOURS[j]),
            anchor + Duration::hours(BOUNDARY_HOURS[j + 1]),
        )
    })
}

/// Hours of `session` inside each sub-window anchored at its login day.
///
/// Each entry is `max(0, min(end, sub_end) - max(start, sub_start))`.
#[must_use]
pub fn session_overlap_hours(session: &Session) -> [f64; SUB_WINDOWS] {
    let windows = sub_windows(midnight(session.start));
    windows.map(|(lb, ub)| {
        let overlap = (session.end.min(ub) - session.start.max(lb)).num_seconds();
        overlap.max(0) as f64 / 3600.0
    })
}

/// Sub-window holding the instant `t`, anchored at `t`'s own day.
///
/// Half-open bounds: an instant exactly on a boundary belongs to the later
/// window.
#[must_use]
pub fn instant_sub_window(t: NaiveDateTime) -> Option<usize> {
    sub_windows(midnight(t))
        .iter()
        .position(|&(lb, ub)| lb <= t && t < ub)
}

/// Fold per-sub-window hours into the three shifts.
#[must_use]
pub fn fold_hours(parts: &[f64; SUB_WINDOWS]) -> ShiftTotals<f64> {
    let mut totals = ShiftTotals::default();
    for (shift, hours) in FOLD.iter().zip(parts) {
        *totals.get_mut(*shift) += hours;
    }
    totals
}
