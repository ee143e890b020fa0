//! The course-run publication state machine.
//!
//! Drafts move `Unpublished → InternalReview → LegalReview → Reviewed →
//! Published`. Entering `Reviewed` runs the promoter; if the scheduled
//! go-live has already passed, the run fast-forwards straight into
//! `Published` as a second, chained atomic unit. `Published → Unpublished`
//! happens only through the sweep that retires stale runs.
//!
//! Collaborator calls (notifications, marketing pushes, track sync) fire
//! strictly after the state-changing transaction commits. Their failures
//! surface as warnings on the outcome, never as rollbacks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use curator_catalog::{CourseKey, CourseRun, CourseRunKey, CourseRunStatus, Seat};
use curator_core::{DomainError, DomainResult, RowId};
use curator_store::{InMemoryStore, Txn};

use crate::collaborators::{MarketingSitePublisher, NotificationEvent, Notifier, TrackSync};
use crate::{promote, slugs};

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishingConfig {
    /// Recompute subdirectory-format slugs when a run enters legal review.
    pub subdirectory_slugs: bool,
    /// Master switch for notification side effects.
    pub send_notifications: bool,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            subdirectory_slugs: false,
            send_notifications: true,
        }
    }
}

/// What a transition did, including best-effort side effects.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub from: CourseRunStatus,
    pub to: CourseRunStatus,
    /// True when the run ended up `Published` (directly or by fast-forward).
    pub published: bool,
    /// Notifications actually delivered.
    pub notifications: Vec<NotificationEvent>,
    /// Collaborator failures. The state change itself has committed.
    pub warnings: Vec<String>,
}

impl TransitionOutcome {
    fn new(from: CourseRunStatus, to: CourseRunStatus) -> Self {
        Self {
            from,
            to,
            published: false,
            notifications: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// The lifecycle engine: state machine + promoter trigger + collaborators.
pub struct PublishingEngine {
    store: Arc<InMemoryStore>,
    notifier: Arc<dyn Notifier>,
    marketing: Arc<dyn MarketingSitePublisher>,
    tracks: Arc<dyn TrackSync>,
    config: PublishingConfig,
}

impl PublishingEngine {
    pub fn new(
        store: Arc<InMemoryStore>,
        notifier: Arc<dyn Notifier>,
        marketing: Arc<dyn MarketingSitePublisher>,
        tracks: Arc<dyn TrackSync>,
        config: PublishingConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            marketing,
            tracks,
            config,
        }
    }

    pub fn store(&self) -> &Arc<InMemoryStore> {
        &self.store
    }

    /// Request a status transition on the draft run identified by `key`.
    ///
    /// Requesting the current status is a no-op. Targets without a tabled
    /// successor action (`Unpublished`) change the status value and fire
    /// nothing.
    pub fn transition(
        &self,
        key: &CourseRunKey,
        to: CourseRunStatus,
    ) -> DomainResult<TransitionOutcome> {
        let draft = self.store.find_run(key, true).ok_or(DomainError::NotFound)?;
        let from = draft.status;
        let mut outcome = TransitionOutcome::new(from, to);
        if from == to {
            return Ok(outcome);
        }
        info!(run = %key, ?from, ?to, "course run status transition");

        match to {
            CourseRunStatus::InternalReview => {
                self.set_draft_status(key, to)?;
                self.notify(NotificationEvent::InternalReview, key, &mut outcome);
            }
            CourseRunStatus::LegalReview => {
                let policy_on = self.config.subdirectory_slugs;
                let course_key = draft.course.clone();
                self.store.transact(|txn| {
                    set_status(txn, key, true, to)?;
                    let course = txn
                        .find_course(&course_key, true)
                        .cloned()
                        .ok_or(DomainError::NotFound)?;
                    // External product lines always live under subdirectory
                    // addresses; open courses only once the policy is on.
                    if policy_on || course.course_type.is_external() {
                        let slug = slugs::subdirectory_slug(&course);
                        slugs::activate(txn, &course_key, &slug, true)?;
                    }
                    Ok(())
                })?;
                self.notify(NotificationEvent::LegalReview, key, &mut outcome);
            }
            CourseRunStatus::Reviewed => {
                // Atomic unit one: the status write plus the whole
                // promotion cascade.
                let official_run = self.store.transact(|txn| {
                    set_status(txn, key, true, CourseRunStatus::Reviewed)?;
                    promote::promote_course_run(txn, key)
                })?;
                self.push_tracks(official_run, &mut outcome);

                let now = Utc::now();
                if draft.go_live_date.is_some_and(|d| d <= now) {
                    // Already due to go live: chain the publish as a second
                    // atomic unit. A failure here still leaves the run
                    // correctly Reviewed. One notification for the net
                    // effect.
                    outcome.published = self.publish_with(key, &mut outcome)?;
                } else {
                    self.notify(NotificationEvent::Reviewed, key, &mut outcome);
                }
            }
            CourseRunStatus::Published => {
                return Err(DomainError::invariant(
                    "draft rows are never published directly; call publish() on the official run",
                ));
            }
            CourseRunStatus::Unpublished => {
                self.set_draft_status(key, to)?;
            }
        }

        Ok(outcome)
    }

    /// Mark the official run announced and published, cascade the status to
    /// its draft counterpart, retire stale sibling runs, and guarantee the
    /// run-slug redirect. Returns `false` when no official row exists yet.
    pub fn publish(&self, key: &CourseRunKey) -> DomainResult<bool> {
        let mut outcome = TransitionOutcome::new(CourseRunStatus::Reviewed, CourseRunStatus::Published);
        let published = self.publish_with(key, &mut outcome)?;
        for warning in &outcome.warnings {
            warn!(run = %key, warning = %warning, "publish side effect failed");
        }
        Ok(published)
    }

    fn publish_with(&self, key: &CourseRunKey, outcome: &mut TransitionOutcome) -> DomainResult<bool> {
        let Some(previous) = self.store.find_run(key, false) else {
            return Ok(false);
        };
        let course_key = previous.course.clone();
        let now = Utc::now();

        self.store.transact(|txn| {
            let pair = txn.run_pair(key);
            for id in [pair.official, pair.draft].into_iter().flatten() {
                let run = txn.run_mut(id)?;
                run.announcement = Some(now);
                run.status = CourseRunStatus::Published;
            }
            // Likely we are sunsetting an old run in favor of this one.
            unpublish_inactive_runs(txn, &course_key, now)?;
            slugs::ensure_run_redirect(txn, &course_key, &previous.slug)?;
            Ok(())
        })?;
        info!(run = %key, "course run published");

        self.notify(NotificationEvent::Published, key, outcome);
        if previous.could_be_marketable() {
            if let Some(current) = self.store.find_run(key, false) {
                if let Err(e) = self.marketing.publish(&current, Some(&previous)) {
                    warn!(run = %key, error = %e, "marketing site publish failed");
                    outcome.warnings.push(format!("marketing publish failed: {e}"));
                }
            }
        }
        Ok(true)
    }

    fn set_draft_status(&self, key: &CourseRunKey, to: CourseRunStatus) -> DomainResult<()> {
        self.store.transact(|txn| set_status(txn, key, true, to))
    }

    fn notify(&self, event: NotificationEvent, key: &CourseRunKey, outcome: &mut TransitionOutcome) {
        if !self.config.send_notifications {
            return;
        }
        // Notifications describe the editor-facing run; fall back to the
        // official row for pairs that no longer carry a draft.
        let run = self
            .store
            .find_run(key, true)
            .or_else(|| self.store.find_run(key, false));
        let Some(run) = run else { return };
        match self.notifier.notify(event, &run) {
            Ok(()) => outcome.notifications.push(event),
            Err(e) => {
                warn!(run = %key, ?event, error = %e, "notification delivery failed");
                outcome.warnings.push(format!("notification {event:?} failed: {e}"));
            }
        }
    }

    fn push_tracks(&self, official_run: RowId, outcome: &mut TransitionOutcome) {
        let loaded: DomainResult<(CourseRun, Vec<Seat>)> = self.store.transact(|txn| {
            let run = txn.run(official_run)?.clone();
            let seats = txn
                .seats_of_run(official_run)
                .into_iter()
                .map(|id| txn.seat(id).cloned())
                .collect::<DomainResult<Vec<_>>>()?;
            Ok((run, seats))
        });
        let Ok((run, seats)) = loaded else { return };
        if let Err(e) = self.tracks.push_tracks(&run, &seats) {
            warn!(run = %run.key, error = %e, "track sync failed");
            outcome.warnings.push(format!("track sync failed: {e}"));
        }
    }
}

fn set_status(
    txn: &mut Txn<'_>,
    key: &CourseRunKey,
    draft: bool,
    to: CourseRunStatus,
) -> DomainResult<()> {
    let id = txn
        .find_run(key, draft)
        .map(|r| r.id)
        .ok_or(DomainError::NotFound)?;
    txn.run_mut(id)?.status = to;
    Ok(())
}

/// Retire published runs whose enrollment deadline has passed.
///
/// Refuses to act when there is nothing to retire, or when retiring would
/// leave the course without a single marketable published run — at least
/// one must always remain.
pub fn unpublish_inactive_runs(
    txn: &mut Txn<'_>,
    course: &CourseKey,
    now: DateTime<Utc>,
) -> DomainResult<bool> {
    let Some(course_row) = txn.find_course(course, false) else {
        return Ok(false);
    };
    if !course_row.partner.has_marketing_site() {
        return Ok(false);
    }

    let published: Vec<CourseRun> = txn
        .runs_of_course(course, false)
        .into_iter()
        .filter_map(|id| txn.run(id).ok())
        .filter(|r| r.status == CourseRunStatus::Published)
        .cloned()
        .collect();

    let (inactive, remaining): (Vec<&CourseRun>, Vec<&CourseRun>) = published
        .iter()
        .partition(|r| r.has_enrollment_ended(now));
    let any_marketable_left = remaining.iter().any(|r| r.could_be_marketable());

    if inactive.is_empty() || !any_marketable_left {
        if !inactive.is_empty() {
            warn!(course = %course, "sweep refused: would unpublish every marketable run");
        }
        return Ok(false);
    }

    for run in inactive {
        set_status(txn, &run.key, false, CourseRunStatus::Unpublished)?;
        if txn.find_run(&run.key, true).is_some() {
            set_status(txn, &run.key, true, CourseRunStatus::Unpublished)?;
        }
        info!(run = %run.key, "stale published run swept to unpublished");
    }
    Ok(true)
}
