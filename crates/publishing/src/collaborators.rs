//! External collaborator seams.
//!
//! The lifecycle engine talks to reviewers, the marketing site, and the
//! commerce/LMS stack through these traits. All of them are best-effort:
//! they are invoked only after the state-changing transaction has
//! committed, and a failure is reported as a warning, never a rollback.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use curator_catalog::{CourseRun, CourseRunKey, Seat};

/// Which lifecycle moment a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    InternalReview,
    LegalReview,
    Reviewed,
    Published,
}

/// Failure of a best-effort collaborator call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("collaborator call failed: {0}")]
pub struct CollaboratorError(pub String);

/// Notifies reviewers/stakeholders of a lifecycle event.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: NotificationEvent, run: &CourseRun) -> Result<(), CollaboratorError>;
}

/// Pushes a run that could affect a public page to the marketing site.
pub trait MarketingSitePublisher: Send + Sync {
    fn publish(
        &self,
        run: &CourseRun,
        previous: Option<&CourseRun>,
    ) -> Result<(), CollaboratorError>;
}

/// Syncs track/seat changes to the commerce system and the LMS.
pub trait TrackSync: Send + Sync {
    fn push_tracks(&self, run: &CourseRun, seats: &[Seat]) -> Result<(), CollaboratorError>;
}

/// Collaborator that accepts and discards everything. Useful when a caller
/// has no marketing site or notification stack wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCollaborator;

impl Notifier for NullCollaborator {
    fn notify(&self, _event: NotificationEvent, _run: &CourseRun) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

impl MarketingSitePublisher for NullCollaborator {
    fn publish(
        &self,
        _run: &CourseRun,
        _previous: Option<&CourseRun>,
    ) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

impl TrackSync for NullCollaborator {
    fn push_tracks(&self, _run: &CourseRun, _seats: &[Seat]) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

/// Recording collaborator. Intended for tests/dev: remembers every call and
/// can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingCollaborator {
    pub notifications: Mutex<Vec<(NotificationEvent, CourseRunKey)>>,
    pub marketing_pushes: Mutex<Vec<CourseRunKey>>,
    pub track_pushes: Mutex<Vec<(CourseRunKey, usize)>>,
    pub fail_notifications: bool,
}

impl RecordingCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_notifications() -> Self {
        Self {
            fail_notifications: true,
            ..Self::default()
        }
    }

    pub fn notified(&self) -> Vec<NotificationEvent> {
        self.notifications
            .lock()
            .map(|log| log.iter().map(|(e, _)| *e).collect())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingCollaborator {
    fn notify(&self, event: NotificationEvent, run: &CourseRun) -> Result<(), CollaboratorError> {
        if self.fail_notifications {
            return Err(CollaboratorError("smtp unreachable".to_string()));
        }
        if let Ok(mut log) = self.notifications.lock() {
            log.push((event, run.key.clone()));
        }
        Ok(())
    }
}

impl MarketingSitePublisher for RecordingCollaborator {
    fn publish(
        &self,
        run: &CourseRun,
        _previous: Option<&CourseRun>,
    ) -> Result<(), CollaboratorError> {
        if let Ok(mut log) = self.marketing_pushes.lock() {
            log.push(run.key.clone());
        }
        Ok(())
    }
}

impl TrackSync for RecordingCollaborator {
    fn push_tracks(&self, run: &CourseRun, seats: &[Seat]) -> Result<(), CollaboratorError> {
        if let Ok(mut log) = self.track_pushes.lock() {
            log.push((run.key.clone(), seats.len()));
        }
        Ok(())
    }
}
