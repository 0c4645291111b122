//! Module versions and version ranges.
//!
//! Versions follow the `major[.minor[.micro[.qualifier]]]` shape. Missing
//! numeric segments default to zero and the qualifier compares as text, so
//! `1`, `1.0` and `1.0.0` are the same version. The empty version `0.0.0`
//! stands for "no version declared".

use crate::error::ModelError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+)(?:\.(\d+)(?:\.(\d+)(?:\.([A-Za-z0-9_-]+))?)?)?$")
            .expect("version regex must compile")
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub micro: u64,
    pub qualifier: String,
}

impl Version {
    pub const fn new(major: u64, minor: u64, micro: u64) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    /// The empty version, `0.0.0` without qualifier.
    pub const fn empty() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.major == 0 && self.minor == 0 && self.micro == 0 && self.qualifier.is_empty()
    }
}

impl FromStr for Version {
    type Err = ModelError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::empty());
        }
        let Some(caps) = version_re().captures(trimmed) else {
            return Err(ModelError::InvalidVersion {
                input: input.to_string(),
                reason: "expected major[.minor[.micro[.qualifier]]]".to_string(),
            });
        };
        let segment = |idx: usize| -> Result<u64, ModelError> {
            match caps.get(idx) {
                None => Ok(0),
                Some(m) => m.as_str().parse().map_err(|_| ModelError::InvalidVersion {
                    input: input.to_string(),
                    reason: format!("segment `{}` is out of range", m.as_str()),
                }),
            }
        };
        Ok(Self {
            major: segment(1)?,
            minor: segment(2)?,
            micro: segment(3)?,
            qualifier: caps
                .get(4)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        })
    }
}

impl TryFrom<String> for Version {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.micro, self.qualifier.as_str()).cmp(&(
            other.major,
            other.minor,
            other.micro,
            other.qualifier.as_str(),
        ))
    }
}

/// A version interval.
///
/// Accepted forms are `[a,b)`, `(a,b]`, `[a,b]`, `(a,b)` and a bare `a`,
/// which means "at least `a`" with no upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    pub floor: Version,
    pub floor_inclusive: bool,
    pub ceiling: Option<Version>,
    pub ceiling_inclusive: bool,
}

impl VersionRange {
    pub fn at_least(floor: Version) -> Self {
        Self {
            floor,
            floor_inclusive: true,
            ceiling: None,
            ceiling_inclusive: false,
        }
    }

    pub fn includes(&self, version: &Version) -> bool {
        let above_floor = if self.floor_inclusive {
            version >= &self.floor
        } else {
            version > &self.floor
        };
        if !above_floor {
            return false;
        }
        match &self.ceiling {
            None => true,
            Some(ceiling) if self.ceiling_inclusive => version <= ceiling,
            Some(ceiling) => version < ceiling,
        }
    }
}

impl FromStr for VersionRange {
    type Err = ModelError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ModelError::InvalidVersionRange {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let trimmed = input.trim();
        let Some(first) = trimmed.chars().next() else {
            return Err(invalid("range is empty"));
        };
        if first != '[' && first != '(' {
            let floor = trimmed
                .parse()
                .map_err(|_| invalid("bare range must be a single version"))?;
            return Ok(Self::at_least(floor));
        }

        let floor_inclusive = first == '[';
        let ceiling_inclusive = match trimmed.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(invalid("interval must end with `]` or `)`")),
        };
        if trimmed.len() < 2 {
            return Err(invalid("interval is unterminated"));
        }
        let body = &trimmed[1..trimmed.len() - 1];
        let Some((low, high)) = body.split_once(',') else {
            return Err(invalid("interval must contain `,`"));
        };
        let floor: Version = low
            .trim()
            .parse()
            .map_err(|_| invalid("interval floor is not a version"))?;
        let ceiling: Version = high
            .trim()
            .parse()
            .map_err(|_| invalid("interval ceiling is not a version"))?;
        if ceiling < floor {
            return Err(invalid("interval ceiling is below its floor"));
        }
        Ok(Self {
            floor,
            floor_inclusive,
            ceiling: Some(ceiling),
            ceiling_inclusive,
        })
    }
}

impl TryFrom<String> for VersionRange {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionRange> for String {
    fn from(value: VersionRange) -> Self {
        value.to_string()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ceiling {
            None => write!(f, "{}", self.floor),
            Some(ceiling) => write!(
                f,
                "{}{},{}{}",
                if self.floor_inclusive { '[' } else { '(' },
                self.floor,
                ceiling,
                if self.ceiling_inclusive { ']' } else { ')' }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().expect("version should parse")
    }

    #[test]
    fn short_forms_normalize() {
        assert_eq!(v("1"), Version::new(1, 0, 0));
        assert_eq!(v("1.2"), Version::new(1, 2, 0));
        assert_eq!(v("1.2.3").to_string(), "1.2.3");
        assert_eq!(v("1.2.3.SNAPSHOT").qualifier, "SNAPSHOT");
    }

    #[test]
    fn blank_is_empty_version() {
        assert!(v("").is_empty());
        assert!(v("0.0.0").is_empty());
        assert!(!v("0.0.0.q").is_empty());
    }

    #[test]
    fn ordering_is_numeric_then_qualifier() {
        assert!(v("1.10") > v("1.9"));
        assert!(v("1.0.0.b") > v("1.0.0.a"));
        assert!(v("1.0.0") < v("1.0.0.a"));
    }

    #[test]
    fn rejects_malformed_versions() {
        assert!("1.x".parse::<Version>().is_err());
        assert!("1..2".parse::<Version>().is_err());
        assert!("1.2.3.bad qualifier".parse::<Version>().is_err());
    }

    #[test]
    fn half_open_interval() {
        let range: VersionRange = "[1.0,2.0)".parse().expect("range should parse");
        assert!(range.includes(&v("1.0")));
        assert!(range.includes(&v("1.9.9")));
        assert!(!range.includes(&v("2.0")));
        assert!(!range.includes(&v("0.9")));
        assert_eq!(range.to_string(), "[1.0.0,2.0.0)");
    }

    #[test]
    fn exclusive_floor_inclusive_ceiling() {
        let range: VersionRange = "(1.0, 2.0]".parse().expect("range should parse");
        assert!(!range.includes(&v("1.0")));
        assert!(range.includes(&v("2.0")));
    }

    #[test]
    fn bare_version_means_at_least() {
        let range: VersionRange = "1.3".parse().expect("range should parse");
        assert!(range.includes(&v("1.3")));
        assert!(range.includes(&v("7.0")));
        assert!(!range.includes(&v("1.2.9")));
        assert_eq!(range.to_string(), "1.3.0");
    }

    #[test]
    fn rejects_malformed_ranges() {
        assert!("[1.0,2.0".parse::<VersionRange>().is_err());
        assert!("[1.0;2.0)".parse::<VersionRange>().is_err());
        assert!("[2.0,1.0)".parse::<VersionRange>().is_err());
        assert!("".parse::<VersionRange>().is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let range: VersionRange =
            serde_json::from_str("\"[1,2)\"").expect("range should deserialize");
        assert_eq!(
            serde_json::to_string(&range).expect("range should serialize"),
            "\"[1.0.0,2.0.0)\""
        );
    }
}
