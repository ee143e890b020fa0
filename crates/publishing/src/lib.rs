//! `curator-publishing` — the draft-to-official promotion pipeline.
//!
//! Three tightly-coupled components:
//!
//! - [`slugs`] — the slug registry: one canonical public address per course,
//!   historical addresses preserved as permanent redirects.
//! - [`promote`] — the draft/official promoter: copies a draft entity onto
//!   its official counterpart, cascading to seats, entitlements, and
//!   restrictions.
//! - [`lifecycle`] — the course-run state machine that triggers promotion
//!   and fires collaborator side effects post-commit.

pub mod collaborators;
pub mod lifecycle;
pub mod promote;
pub mod slugs;

pub use collaborators::{
    CollaboratorError, MarketingSitePublisher, NotificationEvent, Notifier, NullCollaborator,
    RecordingCollaborator, TrackSync,
};
pub use lifecycle::{PublishingConfig, PublishingEngine, TransitionOutcome};
