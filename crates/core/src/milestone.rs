use crate::domain::MILLION;

/// Outcome of comparing a subscriber count against a stored target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advancement {
    /// Milestones crossed since the last check, ascending
    pub crossed: Vec<u64>,
    /// Next unmet milestone
    pub target: u64,
}

impl Advancement {
    pub fn is_empty(&self) -> bool {
        self.crossed.is_empty()
    }
}

/// Largest milestone representable as a `u64`
pub const MAX_MILESTONE: u64 = u64::MAX / MILLION * MILLION;

/// Smallest multiple of one million strictly greater than `value`, if any
pub fn next_milestone(value: u64) -> Option<u64> {
    (value / MILLION + 1).checked_mul(MILLION)
}

/// Walks `current_target` upward one million at a time until it exceeds
/// `current_subs`, collecting every milestone passed on the way.
///
/// Applying this again with the returned target and the same count yields
/// no crossings and leaves the target unchanged.
///
/// A target with no representable successor is never crossed; the walk
/// stops there.
pub fn advance(current_subs: u64, current_target: u64) -> Advancement {
    let mut crossed = Vec::new();
    let mut target = current_target;

    while current_subs >= target {
        let Some(next) = next_milestone(target) else {
            break;
        };
        crossed.push(target);
        target = next;
    }

    Advancement { crossed, target }
}

/// Initial target for a channel first seen with `current_subs` subscribers
pub fn seed_target(current_subs: u64) -> u64 {
    next_milestone(current_subs).unwrap_or(MAX_MILESTONE)
}
