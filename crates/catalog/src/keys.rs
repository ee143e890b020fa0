//! Human-facing catalog keys.
//!
//! A course is addressed as `ORG+NUMBER`; a course run as
//! `course-v1:ORG+NUMBER+RUN` (or the slash-separated legacy format, which
//! parses but is never marketed).

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use curator_core::{DomainError, ValueObject};

const RUN_KEY_PREFIX: &str = "course-v1:";

fn valid_key_part(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Logical identity of a course: `ORG+NUMBER`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseKey(String);

impl CourseKey {
    pub fn new(org: &str, number: &str) -> Result<Self, DomainError> {
        format!("{org}+{number}").parse()
    }

    pub fn org(&self) -> &str {
        self.0.split('+').next().unwrap_or_default()
    }

    pub fn number(&self) -> &str {
        self.0.split('+').nth(1).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for CourseKey {}

impl core::fmt::Display for CourseKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CourseKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('+').collect();
        if parts.len() == 2 && parts.iter().all(|p| valid_key_part(p)) {
            Ok(Self(s.to_string()))
        } else {
            Err(DomainError::invalid_id(format!(
                "course key '{s}' is not of the form ORG+NUMBER"
            )))
        }
    }
}

/// Logical identity of a course run.
///
/// Two formats are accepted: the current `course-v1:ORG+NUMBER+RUN` and the
/// legacy `ORG/NUMBER/RUN`. Legacy runs still resolve and promote, but they
/// are excluded from marketing (`CourseRun::could_be_marketable`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseRunKey(String);

impl CourseRunKey {
    pub fn is_legacy_format(&self) -> bool {
        !self.0.starts_with(RUN_KEY_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parts(&self) -> Vec<&str> {
        match self.0.strip_prefix(RUN_KEY_PREFIX) {
            Some(rest) => rest.split('+').collect(),
            None => self.0.split('/').collect(),
        }
    }

    pub fn org(&self) -> &str {
        self.parts().first().copied().unwrap_or_default()
    }

    pub fn run(&self) -> &str {
        self.parts().get(2).copied().unwrap_or_default()
    }
}

impl ValueObject for CourseRunKey {}

impl core::fmt::Display for CourseRunKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CourseRunKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (parts, separator_ok): (Vec<&str>, bool) = match s.strip_prefix(RUN_KEY_PREFIX) {
            Some(rest) => (rest.split('+').collect(), !rest.contains('/')),
            None => (s.split('/').collect(), !s.contains('+')),
        };
        if separator_ok && parts.len() == 3 && parts.iter().all(|p| valid_key_part(p)) {
            Ok(Self(s.to_string()))
        } else {
            Err(DomainError::invalid_id(format!(
                "course run key '{s}' is neither course-v1:ORG+NUMBER+RUN nor ORG/NUMBER/RUN"
            )))
        }
    }
}
