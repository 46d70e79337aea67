//! # Natural Sort
//!
//! Numeric-aware ordering for record identifiers: `R1 < R1.1 < R2 < R10`.
//!
//! An identifier is split into alternating non-digit / digit runs. Digit runs
//! compare by numeric value (any length, no overflow), text runs compare
//! lexically, and a shorter key that is a prefix of a longer one sorts first.

use std::cmp::Ordering;

/// Anything sorted by an identifier.
pub trait Identified {
    fn id(&self) -> &str;
}

impl<T: Identified + ?Sized> Identified for &T {
    fn id(&self) -> &str {
        (**self).id()
    }
}

/// A run of ASCII digits, compared by value.
///
/// Stored without leading zeros so that value order is length order first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digits(String);

impl Digits {
    fn new(run: &str) -> Self {
        let trimmed = run.trim_start_matches('0');
        if trimmed.is_empty() {
            Self("0".to_string())
        } else {
            Self(trimmed.to_string())
        }
    }
}

impl Ord for Digits {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Digits {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One segment of a natural sort key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Segment {
    Text(String),
    Number(Digits),
}

/// Split an identifier into its sort key.
#[must_use]
pub fn natural_key(id: &str) -> Vec<Segment> {
    let mut key = Vec::new();
    let mut start = 0;
    let mut in_digits = false;

    for (i, c) in id.char_indices() {
        let digit = c.is_ascii_digit();
        if i > start && digit != in_digits {
            key.push(segment(&id[start..i], in_digits));
            start = i;
        }
        in_digits = digit;
    }
    if start < id.len() {
        key.push(segment(&id[start..], in_digits));
    }
    key
}

fn segment(run: &str, digits: bool) -> Segment {
    if digits {
        Segment::Number(Digits::new(run))
    } else {
        Segment::Text(run.to_string())
    }
}

/// Compare two identifiers in natural order.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

/// Stable in-place natural sort by identifier.
pub fn sort_naturally<T: Identified>(items: &mut [T]) {
    items.sort_by_cached_key(|item| natural_key(item.id()));
}

// =============================================================================
// TESTS
// =============================================================================
