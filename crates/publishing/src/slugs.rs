//! The slug registry.
//!
//! Owns the mapping from course identity to historical and currently-active
//! public URL slugs. A slug text belongs to exactly one logical course for
//! its whole life; within a course's history a text is never duplicated —
//! re-activating an old address reuses its historical record.

use tracing::{debug, info, warn};

use curator_catalog::{Course, CourseKey, Slug, SlugRecord};
use curator_core::{DomainError, DomainResult};
use curator_store::Txn;

/// Make `slug` the active address of `course` on one side of the pair.
///
/// Fails with `SlugConflict` when the text is already owned by a different
/// logical course. Always invalidates the course's cached resolution inside
/// the calling transaction.
pub fn activate(txn: &mut Txn<'_>, course: &CourseKey, slug: &Slug, for_draft: bool) -> DomainResult<()> {
    // One slug text, one logical course. Slugs are lowercase-normalized at
    // construction, so equality is the case-insensitive comparison.
    let taken = txn
        .slug_records()
        .iter()
        .any(|r| r.slug == *slug && r.course != *course);
    if taken {
        return Err(DomainError::slug_conflict(slug.as_str()));
    }

    txn.invalidate_slug(course);

    if for_draft {
        // Walk the official-side history first: a text the course has
        // already published gets its historical record re-flagged rather
        // than a duplicate.
        let mut found = false;
        for record in txn
            .slug_records_mut()
            .filter(|r| r.course == *course && !r.is_draft)
        {
            if record.is_active_on_draft || record.slug == *slug {
                let matches = record.slug == *slug;
                record.is_active_on_draft = matches;
                found |= matches;
            }
        }
        if found {
            // Resolution now flows through the official history; the
            // draft-side record would shadow it.
            txn.retain_slug_records(|r| !(r.course == *course && r.is_draft && r.is_active));
            info!(course = %course, slug = %slug, "reactivated historical slug for draft");
            return Ok(());
        }

        // New text for this course: overwrite the single draft-side active
        // record, or create it.
        let mut updated = false;
        if let Some(record) = txn
            .slug_records_mut()
            .find(|r| r.course == *course && r.is_draft && r.is_active)
        {
            record.slug = slug.clone();
            updated = true;
        }
        if !updated {
            let mut record = SlugRecord::new(course.clone(), slug.clone(), true);
            record.is_active = true;
            txn.push_slug_record(record);
        }
    } else {
        // The official side is authoritative: retire the draft's own active
        // record and every other official flag.
        txn.retain_slug_records(|r| !(r.course == *course && r.is_draft && r.is_active));

        let mut found = false;
        for record in txn
            .slug_records_mut()
            .filter(|r| r.course == *course && !r.is_draft)
        {
            if record.slug == *slug {
                record.is_active = true;
                record.is_active_on_draft = true;
                found = true;
            } else {
                record.is_active = false;
                record.is_active_on_draft = false;
            }
        }
        if !found {
            let mut record = SlugRecord::new(course.clone(), slug.clone(), false);
            record.is_active = true;
            record.is_active_on_draft = true;
            txn.push_slug_record(record);
        }
    }

    info!(course = %course, slug = %slug, for_draft, "activated url slug");
    Ok(())
}

/// Resolve the currently-active slug for one side of a course.
///
/// Official rows resolve through their own active record. Draft rows
/// prefer their own record and otherwise inherit the official record
/// flagged active-on-draft — a freshly imported draft keeps advertising
/// the last-published address until it defines its own.
pub fn resolve_active(txn: &mut Txn<'_>, course: &CourseKey, draft: bool) -> Option<Slug> {
    if let Some(slug) = txn.cached_slug(course, draft) {
        debug!(course = %course, draft, "slug cache hit");
        return Some(slug.clone());
    }

    let records = txn.slug_records();
    let resolved = if draft {
        records
            .iter()
            .find(|r| r.course == *course && r.is_draft && r.is_active)
            .or_else(|| {
                records
                    .iter()
                    .find(|r| r.course == *course && !r.is_draft && r.is_active_on_draft)
            })
    } else {
        records
            .iter()
            .find(|r| r.course == *course && !r.is_draft && r.is_active)
    }
    .map(|r| r.slug.clone());

    if let Some(slug) = &resolved {
        txn.cache_slug(course, draft, slug.clone());
    }
    resolved
}

/// Guarantee a permanent redirect from `run_slug` to the course page: an
/// inactive history record is enough for the marketing site to 301 from it.
pub fn ensure_run_redirect(txn: &mut Txn<'_>, course: &CourseKey, run_slug: &Slug) -> DomainResult<()> {
    if let Some(existing) = txn.slug_records().iter().find(|r| r.slug == *run_slug) {
        if existing.course != *course {
            warn!(
                course = %course,
                slug = %run_slug,
                owner = %existing.course,
                "run slug already owned by another course; redirect not created"
            );
        }
        return Ok(());
    }
    txn.push_slug_record(SlugRecord::new(course.clone(), run_slug.clone(), false));
    Ok(())
}

/// Subdirectory-format slug for a course: `learn/<subject>/<org>-<title>`.
pub fn subdirectory_slug(course: &Course) -> Slug {
    let subject = course.primary_subject.as_deref().unwrap_or("course");
    Slug::slugify_with_slashes(&format!(
        "learn/{}/{}-{}",
        subject,
        course.key.org(),
        course.title
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_catalog::Partner;
    use curator_store::InMemoryStore;

    fn key(s: &str) -> CourseKey {
        s.parse().unwrap()
    }

    fn slug(s: &str) -> Slug {
        s.parse().unwrap()
    }

    #[test]
    fn activation_rejects_slug_owned_by_another_course() {
        let store = InMemoryStore::new();
        store
            .transact(|txn| activate(txn, &key("EduX+CS101"), &slug("python-basics"), true))
            .unwrap();

        let err = store
            .transact(|txn| activate(txn, &key("EduX+CS201"), &slug("python-basics"), true))
            .unwrap_err();
        match err {
            DomainError::SlugConflict(s) => assert_eq!(s, "python-basics"),
            other => panic!("expected SlugConflict, got {other:?}"),
        }
    }

    #[test]
    fn same_course_may_reactivate_its_own_text() {
        let store = InMemoryStore::new();
        let course = key("EduX+CS101");
        store
            .transact(|txn| {
                activate(txn, &course, &slug("intro101"), false)?;
                activate(txn, &course, &slug("intro-to-x"), false)?;
                // Back to the historical address: reuses the old record.
                activate(txn, &course, &slug("intro101"), false)?;
                let count = txn
                    .slug_records()
                    .iter()
                    .filter(|r| r.course == course)
                    .count();
                assert_eq!(count, 2, "no text duplicated within one course");
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn official_activation_clears_every_other_flag() {
        let store = InMemoryStore::new();
        let course = key("EduX+CS101");
        store
            .transact(|txn| {
                activate(txn, &course, &slug("intro101"), false)?;
                activate(txn, &course, &slug("intro-to-x"), false)?;
                let active: Vec<_> = txn
                    .slug_records()
                    .iter()
                    .filter(|r| r.course == course && (r.is_active || r.is_active_on_draft))
                    .collect();
                assert_eq!(active.len(), 1);
                assert_eq!(active[0].slug.as_str(), "intro-to-x");
                // The old address stays in history for redirects.
                assert!(txn.slug_records().iter().any(|r| r.slug.as_str() == "intro101"));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn draft_with_no_own_record_inherits_official_active_on_draft() {
        let store = InMemoryStore::new();
        let course = key("EduX+CS101");
        store
            .transact(|txn| {
                activate(txn, &course, &slug("intro101"), false)?;
                assert_eq!(
                    resolve_active(txn, &course, true).unwrap().as_str(),
                    "intro101"
                );
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn draft_activation_of_published_text_reuses_history_record() {
        let store = InMemoryStore::new();
        let course = key("EduX+CS101");
        store
            .transact(|txn| {
                activate(txn, &course, &slug("intro101"), false)?;
                activate(txn, &course, &slug("intro-to-x"), true)?;
                assert_eq!(
                    resolve_active(txn, &course, true).unwrap().as_str(),
                    "intro-to-x"
                );
                // Draft goes back to the published text: the official-side
                // record is re-flagged, the draft record removed.
                activate(txn, &course, &slug("intro101"), true)?;
                assert_eq!(
                    resolve_active(txn, &course, true).unwrap().as_str(),
                    "intro101"
                );
                assert!(
                    !txn.slug_records().iter().any(|r| r.course == course && r.is_draft),
                    "draft-side record deleted once resolution flows through history"
                );
                // The official active slug is untouched.
                assert_eq!(
                    resolve_active(txn, &course, false).unwrap().as_str(),
                    "intro101"
                );
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn activation_invalidates_cached_resolution() {
        let store = InMemoryStore::new();
        let course = key("EduX+CS101");
        store
            .transact(|txn| {
                activate(txn, &course, &slug("first"), true)?;
                assert_eq!(resolve_active(txn, &course, true).unwrap().as_str(), "first");
                activate(txn, &course, &slug("second"), true)?;
                // A stale cache would still say "first".
                assert_eq!(resolve_active(txn, &course, true).unwrap().as_str(), "second");
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn redirect_entry_is_created_once() {
        let store = InMemoryStore::new();
        let course = key("EduX+CS101");
        store
            .transact(|txn| {
                ensure_run_redirect(txn, &course, &slug("circuits-2026"))?;
                ensure_run_redirect(txn, &course, &slug("circuits-2026"))?;
                let count = txn
                    .slug_records()
                    .iter()
                    .filter(|r| r.slug.as_str() == "circuits-2026")
                    .count();
                assert_eq!(count, 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn subdirectory_slug_uses_subject_org_and_title() {
        let partner = Partner::new("edu", "Edu", Some("https://www.example.org"));
        let mut course = Course::new_draft(key("MITx+6.002x"), partner, "Circuits and Electronics");
        course.primary_subject = Some("Electrical Engineering".to_string());
        assert_eq!(
            subdirectory_slug(&course).as_str(),
            "learn/electrical-engineering/mitx-circuits-and-electronics"
        );
    }
}
