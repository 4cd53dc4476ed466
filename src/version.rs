//! Ordered versions for distributions and application releases
//!
//! Versions are compared part by part. Two numeric parts compare numerically;
//! anything else compares as text. A version that is a strict prefix of another
//! orders first, so `9` < `9.0` < `9.2`. Release comparisons used by package
//! specifiers pad with zeros instead, so `6` and `6.0` are the same release.

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Num(u64),
    Text(String),
}

impl Part {
    fn parse(s: &str) -> Self {
        s.parse::<u64>()
            .map_or_else(|_| Part::Text(s.to_string()), Part::Num)
    }

    fn as_text(&self) -> String {
        match self {
            Part::Num(n) => n.to_string(),
            Part::Text(s) => s.clone(),
        }
    }
}

impl Ord for Part {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Part::Num(a), Part::Num(b)) => a.cmp(b),
            _ => self.as_text().cmp(&other.as_text()),
        }
    }
}

impl PartialOrd for Part {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A parsed `.`-delimited version
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    parts: Vec<Part>,
}

impl Version {
    /// Parse a version string. Never fails; an empty string yields an empty version.
    pub fn parse(s: &str) -> Self {
        let raw = s.trim().to_string();
        let parts = raw
            .split('.')
            .filter(|p| !p.is_empty())
            .map(Part::parse)
            .collect();

        Self { raw, parts }
    }

    /// Leading numeric component, if there is one
    pub fn major(&self) -> Option<u64> {
        match self.parts.first() {
            Some(Part::Num(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Purely numeric, so not a pre-release or development version
    pub fn is_release(&self) -> bool {
        !self.parts.is_empty() && self.parts.iter().all(|p| matches!(p, Part::Num(_)))
    }

    /// Compare as package releases, treating missing trailing parts as zero
    pub fn cmp_release(&self, other: &Self) -> Ordering {
        let zero = Part::Num(0);
        (0..self.parts.len().max(other.parts.len()))
            .map(|i| {
                let a = self.parts.get(i).unwrap_or(&zero);
                let b = other.parts.get(i).unwrap_or(&zero);
                a.cmp(b)
            })
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Whether the release starts with every part of `prefix`
    fn has_prefix(&self, prefix: &[Part]) -> bool {
        let zero = Part::Num(0);
        prefix
            .iter()
            .enumerate()
            .all(|(i, p)| self.parts.get(i).unwrap_or(&zero) == p)
    }
}

/// The first release after every release starting with `prefix` (`5.0` -> `5.1`)
fn next_after(prefix: &[Part]) -> Option<Version> {
    let (Part::Num(last), head) = prefix.split_last()? else {
        return None;
    };
    let mut parts = head.to_vec();
    parts.push(Part::Num(last + 1));
    let raw = parts.iter().map(Part::as_text).collect::<Vec<_>>().join(".");
    Some(Version { raw, parts })
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Eq for Version {}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Version::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// A version range, used by platform predicates and feature gates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionMatch {
    Any,
    /// First component equals the given number
    Major(u64),
    AtLeast(Version),
    Below(Version),
}

impl VersionMatch {
    pub fn at_least(v: &str) -> Self {
        VersionMatch::AtLeast(Version::parse(v))
    }

    pub fn below(v: &str) -> Self {
        VersionMatch::Below(Version::parse(v))
    }

    pub fn matches(&self, version: &Version) -> bool {
        match self {
            VersionMatch::Any => true,
            VersionMatch::Major(n) => version.major() == Some(*n),
            VersionMatch::AtLeast(min) => !version.is_empty() && version >= min,
            VersionMatch::Below(max) => !version.is_empty() && version < max,
        }
    }
}

impl fmt::Display for VersionMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionMatch::Any => f.write_str("any"),
            VersionMatch::Major(n) => write!(f, "{n}.x"),
            VersionMatch::AtLeast(v) => write!(f, ">= {v}"),
            VersionMatch::Below(v) => write!(f, "< {v}"),
        }
    }
}

/// Comparison operator of a package version specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `~=`
    Compatible,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    /// `===`, compared as plain text
    Arbitrary,
}

impl Operator {
    /// Longest tokens first, so `===` is not read as `==`
    const TOKENS: [(&'static str, Operator); 8] = [
        ("===", Operator::Arbitrary),
        ("~=", Operator::Compatible),
        ("==", Operator::Equal),
        ("!=", Operator::NotEqual),
        ("<=", Operator::LessEqual),
        (">=", Operator::GreaterEqual),
        ("<", Operator::Less),
        (">", Operator::Greater),
    ];

    fn split(clause: &str) -> Option<(Operator, &str)> {
        Self::TOKENS
            .iter()
            .find_map(|(token, op)| clause.strip_prefix(token).map(|rest| (*op, rest.trim())))
    }
}

/// One `<op><version>` clause, `==` and `!=` may end in `.*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    op: Operator,
    version: Version,
    wildcard: bool,
}

impl Clause {
    fn parse(clause: &str) -> Option<Self> {
        let (op, rest) = Operator::split(clause.trim())?;
        let (rest, wildcard) = match rest.strip_suffix(".*") {
            Some(prefix) if matches!(op, Operator::Equal | Operator::NotEqual) => (prefix, true),
            Some(_) => return None,
            None => (rest, false),
        };
        let version = Version::parse(rest);
        if version.is_empty() {
            return None;
        }
        Some(Self { op, version, wildcard })
    }

    pub fn contains(&self, v: &Version) -> bool {
        let ord = v.cmp_release(&self.version);
        match self.op {
            Operator::Equal if self.wildcard => v.has_prefix(&self.version.parts),
            Operator::NotEqual if self.wildcard => !v.has_prefix(&self.version.parts),
            Operator::Equal => ord.is_eq(),
            Operator::NotEqual => ord.is_ne(),
            Operator::Less => ord.is_lt(),
            Operator::LessEqual => ord.is_le(),
            Operator::Greater => ord.is_gt(),
            Operator::GreaterEqual => ord.is_ge(),
            Operator::Arbitrary => v.raw == self.version.raw,
            Operator::Compatible => {
                let prefix = &self.version.parts[..self.version.parts.len().saturating_sub(1).max(1)];
                ord.is_ge() && v.has_prefix(prefix)
            }
        }
    }

    /// Whether some release allowed by this clause is `min` or newer
    pub fn may_reach(&self, min: &Version) -> bool {
        let parts = &self.version.parts;
        let upper = match self.op {
            Operator::Equal if self.wildcard => next_after(parts),
            Operator::Compatible if parts.len() > 1 => next_after(&parts[..parts.len() - 1]),
            Operator::Less => Some(self.version.clone()),
            Operator::LessEqual | Operator::Equal | Operator::Arbitrary => {
                return self.version.cmp_release(min).is_ge();
            }
            _ => None,
        };
        upper.is_none_or(|upper| upper.cmp_release(min).is_gt())
    }
}

/// A comma-separated list of clauses, all of which must hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifierSet {
    raw: String,
    clauses: Vec<Clause>,
}

impl SpecifierSet {
    /// Parse `>=7.0,<8`; `None` when any clause is malformed
    pub fn parse(s: &str) -> Option<Self> {
        let raw: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let clauses = raw
            .split(',')
            .map(Clause::parse)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { raw, clauses })
    }

    /// Whether `s` starts with a specifier operator
    pub fn looks_like(s: &str) -> bool {
        Operator::split(s.trim()).is_some()
    }

    pub fn contains(&self, v: &Version) -> bool {
        self.clauses.iter().all(|c| c.contains(v))
    }

    pub fn may_reach(&self, min: &Version) -> bool {
        self.clauses.iter().all(|c| c.may_reach(min))
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
