//! Maven version ordering, ranges, and version constraints.
//!
//! Versions are split into segments on `.`, `-` and digit/letter transitions.
//! Numeric segments compare as numbers; word segments follow Maven's
//! qualifier order: `alpha` < `beta` < `milestone` < `rc` < `snapshot` <
//! release (`""`, `ga`, `final`) < `sp` < any other word (compared
//! case-insensitively). Missing trailing segments compare as a release, so
//! `1.0` equals `1.0.0`.

use std::cmp::Ordering;
use std::fmt;

const RELEASE_RANK: u8 = 5;
const UNKNOWN_RANK: u8 = 7;

/// A parsed Maven version with comparable segments.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    pub original: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Number(u64),
    Word { rank: u8, text: String },
}

impl MavenVersion {
    pub fn parse(version: &str) -> Self {
        Self {
            original: version.trim().to_string(),
            segments: tokenize(version.trim()),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        self.original.ends_with("-SNAPSHOT")
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| match (self.segments.get(i), other.segments.get(i)) {
                (Some(a), Some(b)) => compare_segments(a, b),
                (Some(a), None) => compare_to_padding(a),
                (None, Some(b)) => compare_to_padding(b).reverse(),
                (None, None) => Ordering::Equal,
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

fn compare_segments(a: &Segment, b: &Segment) -> Ordering {
    match (a, b) {
        (Segment::Number(x), Segment::Number(y)) => x.cmp(y),
        (Segment::Number(_), Segment::Word { .. }) => Ordering::Greater,
        (Segment::Word { .. }, Segment::Number(_)) => Ordering::Less,
        (Segment::Word { rank: ra, text: ta }, Segment::Word { rank: rb, text: tb }) => {
            ra.cmp(rb).then_with(|| {
                if *ra == UNKNOWN_RANK {
                    ta.cmp(tb)
                } else {
                    Ordering::Equal
                }
            })
        }
    }
}

/// Compare a segment against an absent one, which behaves like a release.
fn compare_to_padding(segment: &Segment) -> Ordering {
    match segment {
        Segment::Number(n) => n.cmp(&0),
        Segment::Word { rank, .. } => rank.cmp(&RELEASE_RANK),
    }
}

fn tokenize(version: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    for ch in version.chars() {
        if ch == '.' || ch == '-' || ch == '_' {
            flush(&mut current, &mut segments);
            continue;
        }
        let is_digit = ch.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            flush(&mut current, &mut segments);
        }
        current_is_digit = is_digit;
        current.push(ch);
    }
    flush(&mut current, &mut segments);
    segments
}

fn flush(token: &mut String, segments: &mut Vec<Segment>) {
    if token.is_empty() {
        return;
    }
    let segment = match token.parse::<u64>() {
        Ok(n) => Segment::Number(n),
        Err(_) => {
            let text = token.to_lowercase();
            let rank = match text.as_str() {
                "alpha" | "a" => 0,
                "beta" | "b" => 1,
                "milestone" | "m" => 2,
                "rc" | "cr" => 3,
                "snapshot" => 4,
                "ga" | "final" | "release" => RELEASE_RANK,
                "sp" => 6,
                _ => UNKNOWN_RANK,
            };
            Segment::Word { rank, text }
        }
    };
    segments.push(segment);
    token.clear();
}

/// One interval of a Maven version range.
///
/// Supports: `[1.0,2.0)`, `[1.0,)`, `(,2.0)`, `[1.0]` (exact).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: MavenVersion,
    pub inclusive: bool,
}

impl VersionRange {
    /// Parse a single bracketed interval. Returns `None` if `input` is not one.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if s.len() < 2 {
            return None;
        }
        let lower_inclusive = match s.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => return None,
        };
        let upper_inclusive = match s.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return None,
        };
        let inner = &s[1..s.len() - 1];

        let bound = |text: &str, inclusive: bool| {
            let text = text.trim();
            (!text.is_empty()).then(|| Bound {
                version: MavenVersion::parse(text),
                inclusive,
            })
        };

        match inner.split_once(',') {
            Some((lower, upper)) => {
                if upper.contains(',') {
                    return None;
                }
                Some(VersionRange {
                    lower: bound(lower, lower_inclusive),
                    upper: bound(upper, upper_inclusive),
                })
            }
            None => {
                // [1.0] means exactly 1.0; (1.0) is meaningless
                if !lower_inclusive || !upper_inclusive || inner.trim().is_empty() {
                    return None;
                }
                let exact = bound(inner, true);
                Some(VersionRange {
                    lower: exact.clone(),
                    upper: exact,
                })
            }
        }
    }

    /// Check if a version satisfies this range.
    pub fn contains(&self, version: &MavenVersion) -> bool {
        let above_lower = self.lower.as_ref().map_or(true, |b| match version.cmp(&b.version) {
            Ordering::Greater => true,
            Ordering::Equal => b.inclusive,
            Ordering::Less => false,
        });
        let below_upper = self.upper.as_ref().map_or(true, |b| match version.cmp(&b.version) {
            Ordering::Less => true,
            Ordering::Equal => b.inclusive,
            Ordering::Greater => false,
        });
        above_lower && below_upper
    }

    fn is_exact(&self) -> bool {
        matches!((&self.lower, &self.upper), (Some(l), Some(u))
            if l.inclusive && u.inclusive && l.version.original == u.version.original)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_exact() {
            if let Some(l) = &self.lower {
                return write!(f, "[{}]", l.version);
            }
        }
        match &self.lower {
            Some(l) => write!(f, "{}{}", if l.inclusive { '[' } else { '(' }, l.version)?,
            None => f.write_str("(")?,
        }
        f.write_str(",")?;
        match &self.upper {
            Some(u) => write!(f, "{}{}", u.version, if u.inclusive { ']' } else { ')' }),
            None => f.write_str(")"),
        }
    }
}

/// A declared version: a single literal or a union of ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    Literal(MavenVersion),
    Ranges(Vec<VersionRange>),
}

impl VersionConstraint {
    /// Parse `1.0`, `[1.0,2.0)` or a union such as `[1.0,2.0),[3.0,)`.
    pub fn parse(input: &str) -> Result<Self, String> {
        let s = input.trim();
        if s.is_empty() {
            return Err("empty version constraint".to_string());
        }
        let is_bracket = |c: char| matches!(c, '[' | ']' | '(' | ')');
        if !s.starts_with(['[', '(']) {
            if s.contains(is_bracket) || s.contains(',') {
                return Err(format!("invalid version constraint '{s}'"));
            }
            return Ok(VersionConstraint::Literal(MavenVersion::parse(s)));
        }

        let mut ranges = Vec::new();
        let mut rest = s;
        while !rest.is_empty() {
            let close = rest
                .find([']', ')'])
                .ok_or_else(|| format!("unterminated range in '{s}'"))?;
            let range = VersionRange::parse(&rest[..=close])
                .ok_or_else(|| format!("invalid range '{}' in '{s}'", &rest[..=close]))?;
            ranges.push(range);
            rest = rest[close + 1..].trim_start();
            if let Some(next) = rest.strip_prefix(',') {
                rest = next.trim_start();
                if rest.is_empty() {
                    return Err(format!("trailing ',' in '{s}'"));
                }
            } else if !rest.is_empty() {
                return Err(format!("expected ',' between ranges in '{s}'"));
            }
        }
        Ok(VersionConstraint::Ranges(ranges))
    }

    pub fn is_range(&self) -> bool {
        matches!(self, VersionConstraint::Ranges(_))
    }

    pub fn contains(&self, version: &MavenVersion) -> bool {
        match self {
            VersionConstraint::Literal(v) => v == version,
            VersionConstraint::Ranges(ranges) => ranges.iter().any(|r| r.contains(version)),
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Literal(v) => write!(f, "{v}"),
            VersionConstraint::Ranges(ranges) => {
                for (i, r) in ranges.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{r}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> MavenVersion {
        MavenVersion::parse(s)
    }

    #[test]
    fn basic_ordering() {
        assert!(v("1.0") < v("2.0"));
        assert!(v("1.0.0") < v("1.0.1"));
        assert!(v("1.0.1") < v("1.1.0"));
        assert!(v("1.9") < v("1.10"));
    }

    #[test]
    fn qualifier_ordering() {
        assert!(v("1.0-alpha") < v("1.0-beta"));
        assert!(v("1.0-beta") < v("1.0-rc"));
        assert!(v("1.0-rc") < v("1.0-SNAPSHOT"));
        assert!(v("1.0-SNAPSHOT") < v("1.0"));
        assert!(v("1.0") < v("1.0-sp"));
        assert!(v("1.0-sp") < v("1.0-jre"));
    }

    #[test]
    fn trailing_zeros_equal() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1"), v("1.0-ga"));
    }

    #[test]
    fn digit_letter_transitions_split() {
        assert!(v("1.0rc1") < v("1.0rc2"));
        assert!(v("1.0rc2") < v("1.0"));
        assert_eq!(v("1.0RC1"), v("1.0-rc-1"));
    }

    #[test]
    fn guava_style_versions() {
        assert!(v("31.0-jre") < v("32.0-jre"));
        assert!(v("32.0-android") < v("32.0-jre"));
    }

    #[test]
    fn snapshot_detection() {
        assert!(v("1.0-SNAPSHOT").is_snapshot());
        assert!(!v("1.0.0").is_snapshot());
    }

    #[test]
    fn range_inclusive() {
        let range = VersionRange::parse("[1.0,2.0]").unwrap();
        assert!(range.contains(&v("1.0")));
        assert!(range.contains(&v("1.5")));
        assert!(range.contains(&v("2.0")));
        assert!(!range.contains(&v("0.9")));
        assert!(!range.contains(&v("2.1")));
    }

    #[test]
    fn range_exclusive_bounds() {
        let range = VersionRange::parse("(1.0,2.0)").unwrap();
        assert!(!range.contains(&v("1.0")));
        assert!(range.contains(&v("1.9.9")));
        assert!(!range.contains(&v("2.0")));
    }

    #[test]
    fn range_open_ends() {
        let below = VersionRange::parse("(,2.0)").unwrap();
        assert!(below.contains(&v("0.1")));
        assert!(!below.contains(&v("2.0")));
        let above = VersionRange::parse("[1.5,)").unwrap();
        assert!(above.contains(&v("99")));
        assert!(!above.contains(&v("1.4")));
    }

    #[test]
    fn range_exact() {
        let range = VersionRange::parse("[1.5]").unwrap();
        assert!(range.contains(&v("1.5")));
        assert!(!range.contains(&v("1.4")));
        assert!(!range.contains(&v("1.6")));
        assert_eq!(range.to_string(), "[1.5]");
    }

    #[test]
    fn malformed_ranges_rejected() {
        assert!(VersionRange::parse("1.0").is_none());
        assert!(VersionRange::parse("[").is_none());
        assert!(VersionRange::parse("(1.0)").is_none());
        assert!(VersionRange::parse("[1,2,3]").is_none());
    }

    #[test]
    fn range_display() {
        assert_eq!(VersionRange::parse("[1.0,2.0)").unwrap().to_string(), "[1.0,2.0)");
        assert_eq!(VersionRange::parse("(,2.0]").unwrap().to_string(), "(,2.0]");
        assert_eq!(VersionRange::parse("[1.0,)").unwrap().to_string(), "[1.0,)");
    }

    #[test]
    fn constraint_literal() {
        let c = VersionConstraint::parse("1.0").unwrap();
        assert!(!c.is_range());
        assert!(c.contains(&v("1.0.0")));
        assert!(!c.contains(&v("1.1")));
    }

    #[test]
    fn constraint_union() {
        let c = VersionConstraint::parse("[1.0,2.0), [3.0,)").unwrap();
        assert!(c.is_range());
        assert!(c.contains(&v("1.5")));
        assert!(!c.contains(&v("2.5")));
        assert!(c.contains(&v("3.1")));
        assert_eq!(c.to_string(), "[1.0,2.0),[3.0,)");
    }

    #[test]
    fn constraint_errors() {
        assert!(VersionConstraint::parse("").is_err());
        assert!(VersionConstraint::parse("[1.0,2.0").is_err());
        assert!(VersionConstraint::parse("[1.0,2.0),").is_err());
        assert!(VersionConstraint::parse("[1.0,2.0)[3.0,)").is_err());
        assert!(VersionConstraint::parse("1.0,2.0").is_err());
    }
}
