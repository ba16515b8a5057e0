//! Scheduling policy for text-input driven updates.

use std::time::Duration;

pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(500);

/// When a field update should be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Immediate,
    /// Commit once input has been quiet for this long. A newer update for the
    /// same field supersedes the pending one.
    After(Duration),
}

/// Trailing debounce with an explicit immediate branch for cleared input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncePolicy {
    quiescence: Duration,
}

impl DebouncePolicy {
    pub fn trailing(quiescence: Duration) -> Self {
        Self { quiescence }
    }

    pub fn quiescence(&self) -> Duration {
        self.quiescence
    }

    /// Clearing a field is decisive and commits at once; anything else waits
    /// for input to pause.
    pub fn schedule(&self, value: &str) -> Schedule {
        if value.is_empty() || self.quiescence.is_zero() {
            Schedule::Immediate
        } else {
            Schedule::After(self.quiescence)
        }
    }
}

impl Default for DebouncePolicy {
    fn default() -> Self {
        Self::trailing(DEFAULT_QUIESCENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_value_is_immediate() {
        assert_eq!(DebouncePolicy::default().schedule(""), Schedule::Immediate);
    }

    #[test]
    fn typed_value_waits_for_quiescence() {
        assert_eq!(
            DebouncePolicy::default().schedule("wind"),
            Schedule::After(Duration::from_millis(500))
        );
        assert_eq!(
            DebouncePolicy::default().schedule(" "),
            Schedule::After(DEFAULT_QUIESCENCE)
        );
    }

    #[test]
    fn zero_window_disables_debounce() {
        let policy = DebouncePolicy::trailing(Duration::ZERO);
        assert_eq!(policy.schedule("wind"), Schedule::Immediate);
    }
}
