//! Restricted course runs: runs limited to specific sales channels.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use curator_core::{DomainError, Entity, RowId};

/// Sales-channel restriction applied to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestrictionType {
    CustomB2c,
    CustomB2bEnterprise,
}

impl FromStr for RestrictionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "custom-b2c" => Ok(RestrictionType::CustomB2c),
            "custom-b2b-enterprise" => Ok(RestrictionType::CustomB2bEnterprise),
            other => Err(DomainError::validation(format!(
                "'{other}' is not a valid restriction type"
            ))),
        }
    }
}

/// A restriction row: at most one per run row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictedCourseRun {
    pub id: RowId,
    /// Parent run row (side-specific).
    pub course_run: RowId,
    pub restriction_type: RestrictionType,
    pub is_draft: bool,
}

impl RestrictedCourseRun {
    pub fn new_draft(course_run: RowId, restriction_type: RestrictionType) -> Self {
        Self {
            id: RowId::new(),
            course_run,
            restriction_type,
            is_draft: true,
        }
    }

    pub fn to_official(&self, official_run: RowId) -> Self {
        Self {
            id: RowId::new(),
            course_run: official_run,
            is_draft: false,
            ..*self
        }
    }

    pub fn copy_from_draft(&mut self, draft: &RestrictedCourseRun) {
        self.restriction_type = draft.restriction_type;
    }
}

impl Entity for RestrictedCourseRun {
    type Id = RowId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_restriction_types() {
        assert_eq!("custom-b2c".parse::<RestrictionType>().unwrap(), RestrictionType::CustomB2c);
        assert_eq!(
            "custom-b2b-enterprise".parse::<RestrictionType>().unwrap(),
            RestrictionType::CustomB2bEnterprise
        );
    }

    #[test]
    fn rejects_unknown_restriction_type_before_any_write() {
        let err = "vip-only".parse::<RestrictionType>().unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
