//! Glob matching for action and event names.
//!
//! Names are split into segments on `.` and `/`:
//!
//! | Pattern | Matches |
//! |---------|---------|
//! | `*` (whole segment) | exactly one segment |
//! | `**` (whole segment) | zero or more segments |
//! | `get*`, `v?` | `*` = any run of characters, `?` = one character |
//!
//! A pattern matches only if the whole name is consumed, so
//! `service.*.suspended` matches `service.foo.suspended` but not
//! `service.foo.bar.suspended` (use `service.**.suspended` for that).

use serde::{Deserialize, Serialize};
use std::fmt;

/// The wildcard-all marker accepted in allow-list settings.
pub const WILDCARD_ALL: &str = "*";

const SEGMENT_DELIMITERS: [char; 2] = ['.', '/'];

fn split_segments(name: &str) -> Vec<&str> {
    name.split(&SEGMENT_DELIMITERS[..]).collect()
}

/// A compiled glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    raw: String,
    segments: Vec<String>,
}

impl GlobPattern {
    /// Compile a pattern.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = split_segments(&raw)
            .into_iter()
            .map(str::to_string)
            .collect();
        Self { raw, segments }
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check whether `name` matches this pattern.
    pub fn matches(&self, name: &str) -> bool {
        let subject = split_segments(name);
        let pattern: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        match_segments(&pattern, &subject)
    }
}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for GlobPattern {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

fn match_segments(pattern: &[&str], subject: &[&str]) -> bool {
    match pattern.split_first() {
        None => subject.is_empty(),
        Some((&"**", rest)) => (0..=subject.len()).any(|skip| match_segments(rest, &subject[skip..])),
        Some((head, rest)) => match subject.split_first() {
            Some((first, remaining)) => {
                match_segment(head, first) && match_segments(rest, remaining)
            }
            None => false,
        },
    }
}

/// Single-segment glob with `*` and `?`, iterative with one backtrack point.
fn match_segment(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut star_text = 0usize;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            star_text = t;
            p += 1;
        } else if let Some(star_pos) = star {
            p = star_pos + 1;
            star_text += 1;
            t = star_text;
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }

    p == pattern.len()
}

/// Names that stay reachable while a service is suspended.
///
/// Deserializes from `"*"` (everything), a single pattern string, or a list
/// of pattern strings. The default is an empty list, which allows nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAllowList", into = "RawAllowList")]
pub enum AllowList {
    /// The wildcard-all marker.
    All,
    /// Explicit patterns, checked in order.
    Patterns(Vec<GlobPattern>),
}

impl AllowList {
    /// Build a pattern list.
    pub fn patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AllowList::Patterns(patterns.into_iter().map(GlobPattern::new).collect())
    }

    /// Check whether `name` is on the list.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            AllowList::All => true,
            AllowList::Patterns(patterns) => patterns.iter().any(|p| p.matches(name)),
        }
    }

    /// `true` for the wildcard-all marker.
    pub fn is_all(&self) -> bool {
        matches!(self, AllowList::All)
    }
}

impl Default for AllowList {
    fn default() -> Self {
        AllowList::Patterns(Vec::new())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawAllowList {
    One(String),
    Many(Vec<String>),
}

impl From<RawAllowList> for AllowList {
    fn from(raw: RawAllowList) -> Self {
        match raw {
            RawAllowList::One(marker) if marker == WILDCARD_ALL => AllowList::All,
            RawAllowList::One(pattern) => AllowList::patterns([pattern]),
            RawAllowList::Many(patterns) => AllowList::patterns(patterns),
        }
    }
}

impl From<AllowList> for RawAllowList {
    fn from(list: AllowList) -> Self {
        match list {
            AllowList::All => RawAllowList::One(WILDCARD_ALL.to_string()),
            AllowList::Patterns(patterns) => {
                RawAllowList::Many(patterns.into_iter().map(|p| p.raw).collect())
            }
        }
    }
}
