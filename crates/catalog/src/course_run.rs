//! Course runs and their publication lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use curator_core::{Entity, EntityUuid, RowId, ValueObject};

use crate::keys::{CourseKey, CourseRunKey};
use crate::slug::Slug;

/// Review/publication status of a course run.
///
/// Only draft rows move through review; official rows are written by the
/// promoter and flipped to `Published` by the lifecycle engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseRunStatus {
    Unpublished,
    InternalReview,
    LegalReview,
    Reviewed,
    Published,
}

impl CourseRunStatus {
    pub fn in_review(self) -> bool {
        matches!(self, CourseRunStatus::InternalReview | CourseRunStatus::LegalReview)
    }
}

/// Enrollment-track type of a run (audit track, verified track, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunType {
    pub name: String,
    /// Whether runs of this type would ever be put on a marketing site.
    pub is_marketable: bool,
}

impl RunType {
    pub fn new(name: &str, is_marketable: bool) -> Self {
        Self {
            name: name.to_string(),
            is_marketable,
        }
    }
}

impl ValueObject for RunType {}

/// A course run row. Child of exactly one course (by logical key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRun {
    pub id: RowId,
    pub uuid: EntityUuid,
    pub key: CourseRunKey,
    pub course: CourseKey,
    pub title_override: Option<String>,
    pub status: CourseRunStatus,
    pub run_type: RunType,
    /// Run-level slug; becomes a permanent redirect to the course page on
    /// publish.
    pub slug: Slug,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub enrollment_start: Option<DateTime<Utc>>,
    pub enrollment_end: Option<DateTime<Utc>>,
    /// Scheduled go-live; a run reviewed after this instant fast-forwards
    /// straight to `Published`.
    pub go_live_date: Option<DateTime<Utc>>,
    /// Stamped the first time the run is published.
    pub announcement: Option<DateTime<Utc>>,
    pub is_draft: bool,
}

impl CourseRun {
    pub fn new_draft(key: CourseRunKey, course: CourseKey, run_type: RunType, slug: Slug) -> Self {
        Self {
            id: RowId::new(),
            uuid: EntityUuid::new(),
            key,
            course,
            title_override: None,
            status: CourseRunStatus::Unpublished,
            run_type,
            slug,
            start: None,
            end: None,
            enrollment_start: None,
            enrollment_end: None,
            go_live_date: None,
            announcement: None,
            is_draft: true,
        }
    }

    /// Materialize the official counterpart of a draft row.
    pub fn to_official(&self) -> Self {
        Self {
            id: RowId::new(),
            is_draft: false,
            ..self.clone()
        }
    }

    /// Overwrite this official row's fields from its draft. Enumerated on
    /// purpose — see `Course::copy_from_draft`.
    pub fn copy_from_draft(&mut self, draft: &CourseRun) {
        self.title_override = draft.title_override.clone();
        self.status = draft.status;
        self.run_type = draft.run_type.clone();
        self.slug = draft.slug.clone();
        self.start = draft.start;
        self.end = draft.end;
        self.enrollment_start = draft.enrollment_start;
        self.enrollment_end = draft.enrollment_end;
        self.go_live_date = draft.go_live_date;
        self.announcement = draft.announcement;
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end.is_some_and(|end| end < now)
    }

    /// The instant past which this run can no longer be enrolled in, or
    /// `None` if unrestricted. The earlier of `end` and `enrollment_end`,
    /// over whichever are set.
    pub fn enrollment_deadline(&self) -> Option<DateTime<Utc>> {
        match (self.end, self.enrollment_end) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn has_enrollment_ended(&self, now: DateTime<Utc>) -> bool {
        self.enrollment_deadline().is_some_and(|deadline| deadline < now)
    }

    /// Whether the enrollment window contains `now`. Missing bounds mean no
    /// restriction on that side (archived self-paced runs stay enrollable).
    pub fn is_enrollable(&self, now: DateTime<Utc>) -> bool {
        self.enrollment_end.is_none_or(|end| end >= now)
            && self.enrollment_start.is_none_or(|start| start <= now)
    }

    /// Whether the run would ever be put on a marketing site: marketable
    /// track type, non-legacy key, and the official copy.
    pub fn could_be_marketable(&self) -> bool {
        self.run_type.is_marketable && !self.key.is_legacy_format() && !self.is_draft
    }

    /// Currently marketable: published, with at least one seat, and a
    /// resolvable marketing URL. Seat presence and URL resolution need the
    /// store, so they arrive as arguments.
    pub fn is_marketable(&self, has_seats: bool, marketing_url: Option<&str>) -> bool {
        self.could_be_marketable()
            && self.status == CourseRunStatus::Published
            && has_seats
            && marketing_url.is_some_and(|url| !url.is_empty())
    }

    /// Enrollable, marketable, and not yet ended.
    pub fn is_active(&self, now: DateTime<Utc>, has_seats: bool, marketing_url: Option<&str>) -> bool {
        self.is_enrollable(now) && self.is_marketable(has_seats, marketing_url) && !self.has_ended(now)
    }
}

impl Entity for CourseRun {
    type Id = RowId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn run() -> CourseRun {
        let key: CourseRunKey = "course-v1:MITx+6.002x+2026T1".parse().unwrap();
        let course: CourseKey = "MITx+6.002x".parse().unwrap();
        CourseRun::new_draft(key, course, RunType::new("verified-audit", true), Slug::slugify("circuits-2026"))
    }

    #[test]
    fn enrollment_deadline_is_min_of_present_dates() {
        let now = Utc::now();
        let mut r = run();
        assert_eq!(r.enrollment_deadline(), None);

        r.end = Some(now + Duration::days(30));
        assert_eq!(r.enrollment_deadline(), r.end);

        r.enrollment_end = Some(now + Duration::days(10));
        assert_eq!(r.enrollment_deadline(), r.enrollment_end);

        r.end = Some(now + Duration::days(5));
        assert_eq!(r.enrollment_deadline(), r.end);
    }

    #[test]
    fn enrollability_uses_open_bounds() {
        let now = Utc::now();
        let mut r = run();
        // No bounds at all: enrollable.
        assert!(r.is_enrollable(now));

        r.enrollment_start = Some(now - Duration::days(1));
        r.enrollment_end = Some(now + Duration::days(1));
        assert!(r.is_enrollable(now));

        r.enrollment_start = Some(now + Duration::days(1));
        assert!(!r.is_enrollable(now));

        r.enrollment_start = Some(now - Duration::days(2));
        r.enrollment_end = Some(now - Duration::days(1));
        assert!(!r.is_enrollable(now));
    }

    #[test]
    fn draft_rows_are_never_marketable() {
        let r = run();
        assert!(!r.could_be_marketable());

        let mut official = r.to_official();
        assert!(official.could_be_marketable());

        official.run_type.is_marketable = false;
        assert!(!official.could_be_marketable());
    }

    #[test]
    fn legacy_keys_are_never_marketable() {
        let mut r = run().to_official();
        r.key = "MITx/6.002x/2012_Fall".parse().unwrap();
        assert!(!r.could_be_marketable());
    }

    #[test]
    fn marketability_requires_publish_seats_and_url() {
        let mut r = run().to_official();
        r.status = CourseRunStatus::Published;
        assert!(!r.is_marketable(false, Some("https://x/course/y")));
        assert!(!r.is_marketable(true, None));
        assert!(r.is_marketable(true, Some("https://x/course/y")));

        r.status = CourseRunStatus::Reviewed;
        assert!(!r.is_marketable(true, Some("https://x/course/y")));
    }

    #[test]
    fn active_runs_must_not_have_ended() {
        let now = Utc::now();
        let mut r = run().to_official();
        r.status = CourseRunStatus::Published;
        let url = Some("https://x/course/y");
        assert!(r.is_active(now, true, url));

        r.end = Some(now - Duration::days(1));
        assert!(!r.is_active(now, true, url));
    }

    #[test]
    fn copy_from_draft_carries_every_editable_field() {
        let now = Utc::now();
        let mut draft = run();
        draft.title_override = Some("Special run".to_string());
        draft.status = CourseRunStatus::Reviewed;
        draft.start = Some(now);
        draft.end = Some(now + Duration::days(90));
        draft.enrollment_start = Some(now - Duration::days(7));
        draft.enrollment_end = Some(now + Duration::days(60));
        draft.go_live_date = Some(now + Duration::days(1));
        draft.announcement = Some(now);
        draft.slug = Slug::slugify("circuits-spring");

        let mut official = run().to_official();
        official.copy_from_draft(&draft);

        let mut expected = draft.clone();
        expected.id = official.id;
        expected.uuid = official.uuid;
        expected.key = official.key.clone();
        expected.course = official.course.clone();
        expected.is_draft = false;
        assert_eq!(official, expected);
    }
}
