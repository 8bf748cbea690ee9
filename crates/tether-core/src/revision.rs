#![forbid(unsafe_code)]

//! Monotonic revision stamps and the logical clock that issues them.
//!
//! Every invalidation in tether boils down to "this tag's revision moved past
//! the snapshot you took". [`Revision`] is the stamp; [`RevisionClock`] is the
//! single counter a runtime owns. Keeping one clock per runtime (rather than
//! one per tag) is what makes stamps comparable across unrelated tags.
//!
//! # Invariants
//!
//! 1. `bump()` strictly increases the clock; a stamp is never reused.
//! 2. `Revision::CONSTANT < Revision::INITIAL <= clock.current()`.
//! 3. Any stamp returned by `bump()` is greater than every stamp returned
//!    before it on the same clock.

use std::cell::Cell;
use std::fmt;

/// A point on a runtime's logical timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(u64);

impl Revision {
    /// The minimal stamp: what constant tags report.
    pub const CONSTANT: Revision = Revision(0);

    /// The stamp fresh updatable tags start at.
    pub const INITIAL: Revision = Revision(1);

    /// Raw counter value, for diagnostics.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// The logical clock. One per runtime; every `dirty()` goes through it.
#[derive(Debug)]
pub struct RevisionClock {
    now: Cell<u64>,
}

impl RevisionClock {
    /// A new clock, starting at [`Revision::INITIAL`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Cell::new(Revision::INITIAL.0),
        }
    }

    /// The most recently issued stamp.
    #[must_use]
    pub fn current(&self) -> Revision {
        Revision(self.now.get())
    }

    /// Advance the clock and return the new stamp.
    pub fn bump(&self) -> Revision {
        let next = self.now.get() + 1;
        self.now.set(next);
        Revision(next)
    }
}

impl Default for RevisionClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_is_strictly_monotonic() {
        let clock = RevisionClock::new();
        let a = clock.bump();
        let b = clock.bump();
        let c = clock.bump();
        assert!(a < b && b < c);
    }

    #[test]
    fn current_reflects_last_bump() {
        let clock = RevisionClock::new();
        assert_eq!(clock.current(), Revision::INITIAL);
        let stamp = clock.bump();
        assert_eq!(clock.current(), stamp);
        assert_eq!(clock.current(), stamp);
    }

    #[test]
    fn constant_precedes_everything() {
        let clock = RevisionClock::new();
        assert!(Revision::CONSTANT < Revision::INITIAL);
        assert!(Revision::CONSTANT < clock.bump());
    }

    #[test]
    fn display_format() {
        assert_eq!(Revision::CONSTANT.to_string(), "r0");
        assert_eq!(Revision::INITIAL.to_string(), "r1");
    }
}
