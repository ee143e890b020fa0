//! Course: the parent entity of the catalog.

use serde::{Deserialize, Serialize};

use curator_core::{Entity, EntityUuid, RowId};

use crate::keys::CourseKey;
use crate::partner::Partner;
use crate::slug::Slug;

/// Product line of a course. Drives slug policy (external product lines get
/// subdirectory slugs by default once the policy switch is on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseType {
    OpenCourse,
    ExecutiveEducation,
    Bootcamp,
}

impl CourseType {
    /// External product types are marketed off-platform and carry their own
    /// slug namespace.
    pub fn is_external(self) -> bool {
        matches!(self, CourseType::ExecutiveEducation | CourseType::Bootcamp)
    }
}

/// A course row. One logical course has at most one draft row and at most
/// one official row; both share `uuid` and `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: RowId,
    pub uuid: EntityUuid,
    pub key: CourseKey,
    pub partner: Partner,
    pub title: String,
    pub short_description: Option<String>,
    /// Primary subject, used when computing subdirectory slugs.
    pub primary_subject: Option<String>,
    pub course_type: CourseType,
    pub is_draft: bool,
    /// The run used as the default representative for pricing/marketing.
    /// Side-specific: the draft row points at the draft run, the official row
    /// at the official run. Set on first promotion only.
    pub canonical_course_run: Option<RowId>,
}

impl Course {
    /// New logical courses always start life as drafts; official rows are
    /// only ever created by promotion.
    pub fn new_draft(key: CourseKey, partner: Partner, title: &str) -> Self {
        Self {
            id: RowId::new(),
            uuid: EntityUuid::new(),
            key,
            partner,
            title: title.to_string(),
            short_description: None,
            primary_subject: None,
            course_type: CourseType::OpenCourse,
            is_draft: true,
            canonical_course_run: None,
        }
    }

    /// Materialize the official counterpart of a draft row. Fresh `RowId`,
    /// same logical identity; `canonical_course_run` is left for the
    /// promoter to fill.
    pub fn to_official(&self) -> Self {
        Self {
            id: RowId::new(),
            is_draft: false,
            canonical_course_run: None,
            ..self.clone()
        }
    }

    /// Overwrite this official row's editable fields from its draft.
    ///
    /// Enumerated on purpose: a new field that should survive promotion must
    /// be added here (and to the test below), rather than silently picked up
    /// by reflection.
    pub fn copy_from_draft(&mut self, draft: &Course) {
        self.title = draft.title.clone();
        self.short_description = draft.short_description.clone();
        self.primary_subject = draft.primary_subject.clone();
        self.course_type = draft.course_type;
        self.partner = draft.partner.clone();
    }

    /// Marketing URL for this course given its resolved active slug.
    pub fn marketing_url(&self, active_slug: Option<&Slug>) -> Option<String> {
        let root = self.partner.marketing_site_root.as_deref()?;
        let slug = active_slug?;
        Some(format!("{}/{}", root.trim_end_matches('/'), slug.url_path()))
    }
}

impl Entity for Course {
    type Id = RowId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
