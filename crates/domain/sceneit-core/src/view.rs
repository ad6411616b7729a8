use std::fmt;

use crate::outcome::RequestOutcome;
use crate::spec::SpecKey;

/// Monotonic tag of one load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleResult {
    Applied,
    StaleGeneration,
    UnknownKey,
    AlreadySettled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewEntry {
    pub key: SpecKey,
    pub outcome: RequestOutcome,
}

/// Per-screen snapshot of every outcome in one load cycle, in spec order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewModel {
    generation: Generation,
    entries: Vec<ViewEntry>,
}

impl ViewModel {
    pub fn pending<I, K>(generation: Generation, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<SpecKey>,
    {
        Self {
            generation,
            entries: keys
                .into_iter()
                .map(|k| ViewEntry {
                    key: k.into(),
                    outcome: RequestOutcome::Pending,
                })
                .collect(),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn entries(&self) -> &[ViewEntry] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn outcome(&self, key: &str) -> Option<&RequestOutcome> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.outcome)
    }

    pub fn all_settled(&self) -> bool {
        self.entries.iter().all(|e| e.outcome.is_settled())
    }

    pub fn any_failed(&self) -> bool {
        self.entries.iter().any(|e| e.outcome.is_failure())
    }

    /// Moves one key out of `Pending`. Writes from another generation and
    /// rewrites of a settled key are refused.
    pub fn settle(
        &mut self,
        generation: Generation,
        key: &str,
        outcome: RequestOutcome,
    ) -> SettleResult {
        if generation != self.generation {
            return SettleResult::StaleGeneration;
        }
        let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) else {
            return SettleResult::UnknownKey;
        };
        if entry.outcome.is_settled() || outcome.is_pending() {
            return SettleResult::AlreadySettled;
        }
        entry.outcome = outcome;
        SettleResult::Applied
    }
}
