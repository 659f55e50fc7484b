//! Conflict resolution and position-status bookkeeping.

use crate::domain::Action;

/// Collapse simultaneous group results for one symbol into one action.
///
/// First match wins:
/// 1. LONG and SHORT together cancel.
/// 2. LONG_EXIT and SHORT_EXIT together cancel.
/// 3. LONG_EXIT, then SHORT_EXIT, then LONG, then SHORT.
/// 4. Otherwise NO_ACTION.
pub fn resolve_action(results: &[Action]) -> Action {
    let has = |a: Action| results.contains(&a);
    if has(Action::Long) && has(Action::Short) {
        return Action::NoAction;
    }
    if has(Action::LongExit) && has(Action::ShortExit) {
        return Action::NoAction;
    }
    [Action::LongExit, Action::ShortExit, Action::Long, Action::Short]
        .into_iter()
        .find(|a| has(*a))
        .unwrap_or(Action::NoAction)
}

/// Change in `STATUS_<symbol>` caused by `action`.
///
/// SHORT opens a negative run (-1) and SHORT_EXIT closes it (+1); the other
/// actions contribute their own code (LONG +1, LONG_EXIT -1, NO_ACTION 0).
pub fn status_delta(action: Action) -> f64 {
    match action {
        Action::Short => -1.0,
        Action::ShortExit => 1.0,
        other => f64::from(other.code()),
    }
}

/// Status after `action`, given the previous bar's status (`None` on the
/// first bar).
pub fn next_status(previous: Option<f64>, action: Action) -> f64 {
    let base = previous.filter(|s| !s.is_nan()).unwrap_or(0.0);
    base + status_delta(action)
}
