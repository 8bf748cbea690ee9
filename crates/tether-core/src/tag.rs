#![forbid(unsafe_code)]

//! Composable invalidation tags.
//!
//! A [`Tag`] answers one question cheaply: "has anything underneath me changed
//! since the stamp you last took?" Three shapes cover the whole engine:
//!
//! - **constant** — never invalidates; the terminal of every comparison.
//! - **leaf** — an updatable marker with its own revision. It can be *dirtied*
//!   (revision bumped past every outstanding snapshot) and *redirected* so it
//!   additionally reflects another tag from that point forward. Redirection is
//!   how a lazily-parked placeholder becomes a live dependency once the object
//!   it points through finally exists: holders of the placeholder observe the
//!   target's invalidations without ever re-requesting a tag.
//! - **combined** — the pointwise maximum of a set of children.
//!
//! # Invariants
//!
//! 1. `value()` is monotone: it never decreases between observations.
//! 2. A combined tag validates a snapshot iff every child validates it.
//! 3. `validate(value())` is always true at the instant it is taken.
//! 4. After `redirect_to(t)`, `value() >= t.value()` and any invalidation of
//!    `t` invalidates this tag.
//!
//! Tags are identity-less value objects: cloning shares the interior, and
//! equality of handles carries no meaning.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::revision::{Revision, RevisionClock};

enum TagKind {
    Constant,
    Leaf {
        revision: Revision,
        target: Option<Tag>,
    },
    Combined(Vec<Tag>),
}

/// A composable invalidation marker. Cheap to clone (shared interior).
#[derive(Clone)]
pub struct Tag {
    inner: Rc<RefCell<TagKind>>,
}

impl Tag {
    /// A tag that is valid against every snapshot, forever.
    #[must_use]
    pub fn constant() -> Self {
        Self::from_kind(TagKind::Constant)
    }

    /// A fresh updatable leaf.
    ///
    /// Starts at [`Revision::INITIAL`] with no redirect target, so it
    /// validates any snapshot taken at or after creation.
    #[must_use]
    pub fn updatable() -> Self {
        Self::from_kind(TagKind::Leaf {
            revision: Revision::INITIAL,
            target: None,
        })
    }

    /// Combine child tags into their pointwise maximum.
    ///
    /// An empty set collapses to a constant tag; a singleton collapses to the
    /// child itself rather than allocating a wrapper.
    #[must_use]
    pub fn combine(mut children: Vec<Tag>) -> Self {
        match children.len() {
            0 => Self::constant(),
            1 => children.pop().expect("length checked above"),
            _ => Self::from_kind(TagKind::Combined(children)),
        }
    }

    fn from_kind(kind: TagKind) -> Self {
        Self {
            inner: Rc::new(RefCell::new(kind)),
        }
    }

    /// The current version stamp.
    #[must_use]
    pub fn value(&self) -> Revision {
        match &*self.inner.borrow() {
            TagKind::Constant => Revision::CONSTANT,
            TagKind::Leaf { revision, target } => match target {
                Some(t) => (*revision).max(t.value()),
                None => *revision,
            },
            TagKind::Combined(children) => children
                .iter()
                .map(Tag::value)
                .max()
                .unwrap_or(Revision::CONSTANT),
        }
    }

    /// True if nothing underneath this tag has changed since `snapshot`.
    #[must_use]
    pub fn validate(&self, snapshot: Revision) -> bool {
        match &*self.inner.borrow() {
            TagKind::Constant => true,
            TagKind::Leaf { revision, target } => {
                *revision <= snapshot && target.as_ref().is_none_or(|t| t.validate(snapshot))
            }
            TagKind::Combined(children) => children.iter().all(|t| t.validate(snapshot)),
        }
    }

    /// Bump this leaf past every outstanding snapshot.
    ///
    /// Only updatable leaves can be dirtied; on any other shape this is a
    /// debug assertion failure and a release no-op.
    pub fn dirty(&self, clock: &RevisionClock) {
        match &mut *self.inner.borrow_mut() {
            TagKind::Leaf { revision, .. } => *revision = clock.bump(),
            _ => debug_assert!(false, "dirty() on a non-updatable tag"),
        }
    }

    /// Redirect this leaf so it additionally reflects `target` from now on.
    ///
    /// Replaces any previous redirect. Self-redirection is ignored; cycles of
    /// mutual redirects are a caller contract violation.
    pub fn redirect_to(&self, target: &Tag) {
        if Rc::ptr_eq(&self.inner, &target.inner) {
            return;
        }
        match &mut *self.inner.borrow_mut() {
            TagKind::Leaf { target: slot, .. } => *slot = Some(target.clone()),
            _ => debug_assert!(false, "redirect_to() on a non-updatable tag"),
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.inner.borrow() {
            TagKind::Constant => f.write_str("Tag::Constant"),
            TagKind::Leaf { revision, target } => f
                .debug_struct("Tag::Leaf")
                .field("revision", revision)
                .field("redirected", &target.is_some())
                .finish(),
            TagKind::Combined(children) => f
                .debug_tuple("Tag::Combined")
                .field(&children.len())
                .finish(),
        }
    }
}
