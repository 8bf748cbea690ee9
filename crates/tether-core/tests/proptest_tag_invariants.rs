//! Property-based invariant tests for the tag algebra.
//!
//! These verify structural invariants that must hold for **any** shape of
//! tag tree and any interleaving of dirties:
//!
//! 1. A combined tag validates a snapshot iff every child validates it.
//! 2. A combined tag's value is the pointwise maximum of its children.
//! 3. `validate(value())` holds immediately after any observation.
//! 4. `validate` is monotone in the snapshot argument.
//! 5. `value()` never decreases between observations.
//! 6. A redirected leaf reflects every future invalidation of its target.

use proptest::prelude::*;
use tether_core::{Revision, RevisionClock, Tag};

/// Per-leaf dirty counts: small enough for fast tests, enough to interleave.
fn dirty_counts() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(0u8..4, 1..8)
}

proptest! {
    #[test]
    fn combined_validity_is_conjunction(counts in dirty_counts()) {
        let clock = RevisionClock::new();
        let leaves: Vec<Tag> = counts.iter().map(|_| Tag::updatable()).collect();
        let combined = Tag::combine(leaves.clone());
        let baseline = combined.value();

        for (leaf, &count) in leaves.iter().zip(&counts) {
            for _ in 0..count {
                leaf.dirty(&clock);
            }
        }

        let all_clean = counts.iter().all(|&c| c == 0);
        prop_assert_eq!(combined.validate(baseline), all_clean);
        for (leaf, &count) in leaves.iter().zip(&counts) {
            prop_assert_eq!(leaf.validate(baseline), count == 0);
        }
    }

    #[test]
    fn combined_value_is_pointwise_max(counts in dirty_counts()) {
        let clock = RevisionClock::new();
        let leaves: Vec<Tag> = counts.iter().map(|_| Tag::updatable()).collect();
        for (leaf, &count) in leaves.iter().zip(&counts) {
            for _ in 0..count {
                leaf.dirty(&clock);
            }
        }

        let combined = Tag::combine(leaves.clone());
        let expected = leaves
            .iter()
            .map(Tag::value)
            .max()
            .unwrap_or(Revision::CONSTANT);
        prop_assert_eq!(combined.value(), expected);
    }

    #[test]
    fn freshly_observed_tags_self_validate(counts in dirty_counts()) {
        let clock = RevisionClock::new();
        let leaves: Vec<Tag> = counts.iter().map(|_| Tag::updatable()).collect();
        let combined = Tag::combine(leaves.clone());

        for (leaf, &count) in leaves.iter().zip(&counts) {
            for _ in 0..count {
                leaf.dirty(&clock);
            }
            prop_assert!(combined.validate(combined.value()));
        }
    }

    #[test]
    fn validate_is_monotone_in_snapshot(count in 1u8..6) {
        let clock = RevisionClock::new();
        let leaf = Tag::updatable();
        let early = leaf.value();
        for _ in 0..count {
            leaf.dirty(&clock);
        }
        let late = leaf.value();

        prop_assert!(!leaf.validate(early));
        prop_assert!(leaf.validate(late));
        // any snapshot at or past the tag's value validates
        prop_assert!(leaf.validate(clock.bump()));
    }

    #[test]
    fn value_never_decreases(counts in dirty_counts()) {
        let clock = RevisionClock::new();
        let leaves: Vec<Tag> = counts.iter().map(|_| Tag::updatable()).collect();
        let combined = Tag::combine(leaves.clone());

        let mut previous = combined.value();
        for (leaf, &count) in leaves.iter().zip(&counts) {
            for _ in 0..count {
                leaf.dirty(&clock);
                let now = combined.value();
                prop_assert!(now >= previous);
                previous = now;
            }
        }
    }

    #[test]
    fn redirected_leaf_tracks_target(before in 0u8..3, after in 1u8..4) {
        let clock = RevisionClock::new();
        let placeholder = Tag::updatable();
        let target = Tag::updatable();
        for _ in 0..before {
            target.dirty(&clock);
        }

        placeholder.redirect_to(&target);
        let baseline = placeholder.value();
        prop_assert!(placeholder.validate(baseline));
        prop_assert!(baseline >= target.value());

        for _ in 0..after {
            target.dirty(&clock);
        }
        prop_assert!(!placeholder.validate(baseline));
        prop_assert_eq!(placeholder.value(), target.value());
    }
}
