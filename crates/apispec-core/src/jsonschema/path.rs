//! Parsed field paths.
//!
//! Paths use dotted keys with bracket notation: `a.b`, `a[]`, `[]`,
//! `a[].b` and quoted keys like `['a.b']` that may themselves contain dots.

// Internal imports (std, crate)
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    /// `[]`, the elements of an array
    Array,
}

impl Segment {
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array)
    }

    /// Name used for the segment in a properties map
    pub fn property_name(&self) -> &str {
        match self {
            Self::Key(key) => key,
            Self::Array => "[]",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.property_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFieldPath {
    segments: Vec<Segment>,
}

impl JsonFieldPath {
    pub fn compile(path: &str) -> Self {
        Self {
            segments: parse(path),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segments after `traversed`, or the whole path if `traversed` is not a
    /// prefix of it.
    pub fn remaining_segments(&self, traversed: &[Segment]) -> &[Segment] {
        match self.segments.strip_prefix(traversed) {
            Some(rest) => rest,
            None => &self.segments,
        }
    }
}

fn parse(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut key = String::new();
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => flush(&mut key, &mut segments),
            '[' => {
                flush(&mut key, &mut segments);
                match chars.peek() {
                    Some(']') => {
                        chars.next();
                        segments.push(Segment::Array);
                    }
                    Some('\'') => {
                        chars.next();
                        let mut quoted = String::new();
                        while let Some(c) = chars.next() {
                            if c == '\'' && chars.peek() == Some(&']') {
                                chars.next();
                                break;
                            }
                            quoted.push(c);
                        }
                        segments.push(Segment::Key(quoted));
                    }
                    _ => {
                        let mut inner = String::new();
                        for c in chars.by_ref() {
                            if c == ']' {
                                break;
                            }
                            inner.push(c);
                        }
                        segments.push(Segment::Key(inner));
                    }
                }
            }
            _ => key.push(c),
        }
    }
    flush(&mut key, &mut segments);
    segments
}

fn flush(key: &mut String, segments: &mut Vec<Segment>) {
    if !key.is_empty() {
        segments.push(Segment::Key(std::mem::take(key)));
    }
}
