//! The draft/official promoter.
//!
//! `promote_course_run` copies a draft run onto its official counterpart
//! (creating one if this is the first promotion), cascades to seats and the
//! restriction record, then promotes the parent course with its eligible
//! entitlements and reconciles the official active slug. The whole cascade
//! runs inside the caller's transaction: a failure anywhere aborts every
//! row.

use tracing::info;

use curator_catalog::{CourseKey, CourseRunKey};
use curator_core::{DomainError, DomainResult, RowId};
use curator_store::Txn;

use crate::slugs;

/// Promote the draft run identified by `key`, returning the official run's
/// row id. Idempotent: with no intervening draft mutation, a second call
/// leaves every official field identical.
pub fn promote_course_run(txn: &mut Txn<'_>, key: &CourseRunKey) -> DomainResult<RowId> {
    let draft_run = txn
        .find_run(key, true)
        .cloned()
        .ok_or(DomainError::NotFound)?;

    let official_run_id = match txn.run_pair(key).official {
        Some(id) => {
            txn.run_mut(id)?.copy_from_draft(&draft_run);
            id
        }
        None => txn.insert_run(draft_run.to_official())?,
    };

    // Seats: update-or-create by mode. Official seats whose mode is gone
    // from the draft stay behind, unlinked from this flow.
    for seat_id in txn.seats_of_run(draft_run.id) {
        let draft_seat = txn.seat(seat_id)?.clone();
        match txn.find_seat(official_run_id, draft_seat.mode) {
            Some(official_seat) => txn.seat_mut(official_seat)?.copy_from_draft(&draft_seat),
            None => {
                txn.insert_seat(draft_seat.to_official(official_run_id))?;
            }
        }
    }

    if let Some(restriction_id) = txn.restriction_of_run(draft_run.id) {
        let draft_restriction = txn.restriction(restriction_id)?.clone();
        match txn.restriction_of_run(official_run_id) {
            Some(official_restriction) => txn
                .restriction_mut(official_restriction)?
                .copy_from_draft(&draft_restriction),
            None => {
                txn.insert_restriction(draft_restriction.to_official(official_run_id))?;
            }
        }
    }

    promote_course(txn, &draft_run.course, draft_run.id, official_run_id)?;

    info!(run = %key, "promoted draft run to official");
    Ok(official_run_id)
}

/// Promote the parent course of a run being promoted. Only called from
/// `promote_course_run`: official course rows come into being as a bundle
/// with their first promoted run, never on their own.
fn promote_course(
    txn: &mut Txn<'_>,
    key: &CourseKey,
    draft_run: RowId,
    official_run: RowId,
) -> DomainResult<RowId> {
    let draft_course = txn
        .find_course(key, true)
        .cloned()
        .ok_or(DomainError::NotFound)?;

    // Absence of an official counterpart is the signal that this promotion
    // is a create rather than an update.
    let creating = txn.course_pair(key).official.is_none();
    let official_id = match txn.course_pair(key).official {
        Some(id) => {
            txn.course_mut(id)?.copy_from_draft(&draft_course);
            id
        }
        None => txn.insert_course(draft_course.to_official())?,
    };

    // Entitlements: the draft may hold audit-mode entitlements, but only
    // the entitlement-eligible modes cross to the official side.
    for entitlement_id in txn.entitlements_of_course(draft_course.id) {
        let draft_entitlement = txn.entitlement(entitlement_id)?.clone();
        if !draft_entitlement.mode.is_entitlement_mode() {
            continue;
        }
        match txn.find_entitlement(official_id, draft_entitlement.mode) {
            Some(official_entitlement) => txn
                .entitlement_mut(official_entitlement)?
                .copy_from_draft(&draft_entitlement),
            None => {
                txn.insert_entitlement(draft_entitlement.to_official(official_id))?;
            }
        }
    }

    // The official active slug follows whatever the draft resolves to.
    if let Some(slug) = slugs::resolve_active(txn, key, true) {
        slugs::activate(txn, key, &slug, false)?;
    }

    if creating {
        txn.course_mut(official_id)?.canonical_course_run = Some(official_run);
        txn.course_mut(draft_course.id)?.canonical_course_run = Some(draft_run);
    }

    Ok(official_id)
}
