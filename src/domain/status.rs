use serde::{Deserialize, Serialize};

/// Number of trailing measurements the classifier looks at by default.
pub const DEFAULT_STATUS_WINDOW: usize = 3;

/// Health status derived from the most recent measurements of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Up,
    Unstable,
    Down,
}

/// Classify a history of loss percentages, oldest first.
///
/// Only the last `window` values are examined (all of them when fewer are
/// available). Any full loss in the window means `Down`, any partial loss
/// means `Unstable`, otherwise `Up`. An empty history is `Up`.
pub fn classify<I>(losses: I, window: usize) -> Status
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: DoubleEndedIterator,
{
    let mut status = Status::Up;

    for loss in losses.into_iter().rev().take(window) {
        if loss >= 100.0 {
            return Status::Down;
        }
        if loss > 0.0 {
            status = Status::Unstable;
        }
    }

    status
}
