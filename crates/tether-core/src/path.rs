#![forbid(unsafe_code)]

//! Parsed dependency paths.
//!
//! A [`Path`] is a dotted property path, optionally ending in an
//! `@each.<key>` pair that fans out over a collection's elements
//! (`"friends.@each.name"`). Parsing happens once, at the API boundary
//! (observer registration, dependent-key declaration, alias construction);
//! the chain walker only ever sees validated paths.
//!
//! Validation is strict — a malformed path is a configuration error and
//! fails fast rather than silently truncating:
//!
//! - the path and every segment must be non-empty;
//! - `@each` must be followed by exactly one property segment;
//! - nothing may follow the `@each.<key>` pair.

use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;
use thiserror::Error;

/// The collection fan-out marker segment.
pub const EACH: &str = "@each";

/// Why a path failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path string was empty.
    #[error("empty path")]
    Empty,

    /// Two dots in a row, or a leading or trailing dot.
    #[error("empty segment in path '{0}'")]
    EmptySegment(String),

    /// `@each` must be followed by exactly one property segment.
    #[error("'@each' in path '{0}' must be followed by exactly one segment")]
    DanglingEach(String),

    /// Nothing may follow the `@each.<key>` pair.
    #[error("path '{0}' continues past its '@each' segment")]
    TrailingAfterEach(String),
}

/// A validated dependency path: plain stem segments plus an optional
/// trailing `@each.<key>` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    stems: SmallVec<[String; 4]>,
    each_key: Option<String>,
}

impl Path {
    /// Parse and validate a dotted path.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        if input.is_empty() {
            return Err(PathError::Empty);
        }
        let mut stems = SmallVec::new();
        let mut each_key = None;
        let mut segments = input.split('.');
        while let Some(segment) = segments.next() {
            if segment.is_empty() {
                return Err(PathError::EmptySegment(input.to_owned()));
            }
            if segment == EACH {
                let Some(key) = segments.next() else {
                    return Err(PathError::DanglingEach(input.to_owned()));
                };
                if key.is_empty() {
                    return Err(PathError::EmptySegment(input.to_owned()));
                }
                if key == EACH {
                    return Err(PathError::DanglingEach(input.to_owned()));
                }
                if segments.next().is_some() {
                    return Err(PathError::TrailingAfterEach(input.to_owned()));
                }
                each_key = Some(key.to_owned());
                break;
            }
            stems.push(segment.to_owned());
        }
        Ok(Self { stems, each_key })
    }

    /// The plain segments walked in order, before any `@each`.
    #[must_use]
    pub fn stems(&self) -> &[String] {
        &self.stems
    }

    /// The element property named after `@each`, if present.
    #[must_use]
    pub fn each_key(&self) -> Option<&str> {
        self.each_key.as_deref()
    }

    /// True for a bare single-segment path with no fan-out.
    #[must_use]
    pub fn is_single_key(&self) -> bool {
        self.stems.len() == 1 && self.each_key.is_none()
    }

    /// The remaining path after the first `n` stems have been consumed.
    ///
    /// This is what gets parked in a lazy chain entry when a walk stalls.
    #[must_use]
    pub fn suffix(&self, n: usize) -> Path {
        Path {
            stems: self.stems.iter().skip(n).cloned().collect(),
            each_key: self.each_key.clone(),
        }
    }

    /// Split into the leading object sub-path and the final key.
    ///
    /// Returns `None` for the sub-path when there is only one segment. Only
    /// meaningful for paths without `@each` (alias targets).
    #[must_use]
    pub fn split_last(&self) -> (Option<Path>, &str) {
        debug_assert!(
            self.each_key.is_none() && !self.stems.is_empty(),
            "split_last() on a fan-out path"
        );
        let (last, init) = self
            .stems
            .split_last()
            .expect("parse admits no stem-less plain path");
        let head = if init.is_empty() {
            None
        } else {
            Some(Path {
                stems: init.iter().cloned().collect(),
                each_key: None,
            })
        };
        (head, last)
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for stem in &self.stems {
            if !first {
                f.write_str(".")?;
            }
            f.write_str(stem)?;
            first = false;
        }
        if let Some(key) = &self.each_key {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{EACH}.{key}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_key() {
        let path: Path = "name".parse().unwrap();
        assert_eq!(path.stems(), ["name"]);
        assert_eq!(path.each_key(), None);
        assert!(path.is_single_key());
    }

    #[test]
    fn nested_path() {
        let path: Path = "a.b.c".parse().unwrap();
        assert_eq!(path.stems(), ["a", "b", "c"]);
        assert!(!path.is_single_key());
    }

    #[test]
    fn each_tail() {
        let path: Path = "friends.@each.name".parse().unwrap();
        assert_eq!(path.stems(), ["friends"]);
        assert_eq!(path.each_key(), Some("name"));
    }

    #[test]
    fn each_at_root() {
        let path: Path = "@each.name".parse().unwrap();
        assert!(path.stems().is_empty());
        assert_eq!(path.each_key(), Some("name"));
    }

    #[test]
    fn rejects_empty_path() {
        assert_eq!("".parse::<Path>(), Err(PathError::Empty));
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(matches!(
            "a..b".parse::<Path>(),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            ".a".parse::<Path>(),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            "a.".parse::<Path>(),
            Err(PathError::EmptySegment(_))
        ));
    }

    #[test]
    fn rejects_dangling_each() {
        assert!(matches!(
            "friends.@each".parse::<Path>(),
            Err(PathError::DanglingEach(_))
        ));
        assert!(matches!(
            "friends.@each.@each".parse::<Path>(),
            Err(PathError::DanglingEach(_))
        ));
    }

    #[test]
    fn rejects_segments_after_each() {
        assert!(matches!(
            "friends.@each.pet.name".parse::<Path>(),
            Err(PathError::TrailingAfterEach(_))
        ));
    }

    #[test]
    fn suffix_drops_leading_stems() {
        let path: Path = "a.b.c".parse().unwrap();
        assert_eq!(path.suffix(1).to_string(), "b.c");
        assert_eq!(path.suffix(3).stems().len(), 0);

        let fanout: Path = "a.friends.@each.name".parse().unwrap();
        assert_eq!(fanout.suffix(2).to_string(), "@each.name");
    }

    #[test]
    fn split_last_separates_object_path() {
        let path: Path = "a.b.c".parse().unwrap();
        let (head, key) = path.split_last();
        assert_eq!(head.unwrap().to_string(), "a.b");
        assert_eq!(key, "c");

        let single: Path = "a".parse().unwrap();
        let (head, key) = single.split_last();
        assert!(head.is_none());
        assert_eq!(key, "a");
    }

    #[test]
    fn display_round_trips() {
        for input in ["name", "a.b.c", "friends.@each.name", "@each.x"] {
            let path: Path = input.parse().unwrap();
            assert_eq!(path.to_string(), input);
        }
    }
}
