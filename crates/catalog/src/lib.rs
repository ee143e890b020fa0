//! `curator-catalog` — the versioned catalog entities.
//!
//! Every entity here carries an `is_draft` flag; the draft row is the
//! editor-facing working copy, the official row is what downstream consumers
//! see. Pairing between the two sides lives in the store's logical-identity
//! index, not on the rows themselves.

pub mod course;
pub mod course_run;
pub mod entitlement;
pub mod keys;
pub mod partner;
pub mod restriction;
pub mod seat;
pub mod slug;

pub use course::{Course, CourseType};
pub use course_run::{CourseRun, CourseRunStatus, RunType};
pub use entitlement::CourseEntitlement;
pub use keys::{CourseKey, CourseRunKey};
pub use partner::Partner;
pub use restriction::{RestrictedCourseRun, RestrictionType};
pub use seat::{Seat, SeatMode};
pub use slug::{Slug, SlugRecord};
