//! Hierarchical object locations inside the container store.

use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Longest name a single path component may have.
pub const MAX_NAME_LEN: usize = 15;

/// A path of upper-cased names from the store root, e.g. `/OBS/RUN1`.
///
/// Names are case-insensitive; they are normalised to upper case on
/// construction so that equal paths compare and hash equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    segments: Vec<String>,
}

impl Location {
    /// The store root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a `/`-separated path. Leading and trailing slashes are ignored.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidName`] if any component is empty, too long,
    /// does not start with a letter, or contains characters other than
    /// ASCII letters, digits and `_`.
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let trimmed = path.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut location = Self::root();
        for name in trimmed.split('/') {
            location = location.child(name)?;
        }
        Ok(location)
    }

    /// The location of a child named `name`.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidName`] as for [`Location::parse`].
    pub fn child(&self, name: &str) -> Result<Self, StoreError> {
        validate_name(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_ascii_uppercase());
        Ok(Self { segments })
    }

    /// The enclosing location, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// The last path component, or `None` at the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Whether this is the store root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `self` is `other` or lies underneath it.
    pub fn starts_with(&self, other: &Location) -> bool {
        self.segments.starts_with(&other.segments)
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let ok = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name.starts_with(|c: char| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidName {
            name: name.to_string(),
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for s in &self.segments {
            write!(f, "/{s}")?;
        }
        Ok(())
    }
}

impl FromStr for Location {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalises_case_and_slashes() {
        let a = Location::parse("/obs/run1/").unwrap();
        let b = Location::parse("OBS/RUN1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "/OBS/RUN1");
        assert_eq!(a.name(), Some("RUN1"));
    }

    #[test]
    fn parent_walks_up_to_root() {
        let a = Location::parse("/a/b").unwrap();
        let p = a.parent().unwrap();
        assert_eq!(p.to_string(), "/A");
        assert!(p.parent().unwrap().is_root());
        assert!(Location::root().parent().is_none());
    }

    #[test]
    fn rejects_bad_names() {
        assert!(Location::parse("/a//b").is_err());
        assert!(Location::parse("/9lives").is_err());
        assert!(Location::parse("/has space").is_err());
        assert!(Location::parse("/abcdefghijklmnop").is_err());
    }

    #[test]
    fn starts_with_checks_ancestry() {
        let a = Location::parse("/a/b/c").unwrap();
        assert!(a.starts_with(&Location::parse("/a").unwrap()));
        assert!(!a.starts_with(&Location::parse("/b").unwrap()));
    }
}
