//! End-to-end lifecycle scenarios, driven through the public engine API.

use std::sync::Arc;
use std::thread;

use chrono::{Duration, Utc};

use curator_catalog::{
    Course, CourseKey, CourseRun, CourseRunKey, CourseRunStatus, Partner, RunType, Seat, SeatMode,
    Slug,
};
use curator_core::DomainError;
use curator_publishing::lifecycle::unpublish_inactive_runs;
use curator_publishing::{
    slugs, NotificationEvent, PublishingConfig, PublishingEngine, RecordingCollaborator,
};
use curator_store::InMemoryStore;

fn partner() -> Partner {
    Partner::new("edu", "Edu", Some("https://www.example.org"))
}

fn course_key(s: &str) -> CourseKey {
    s.parse().unwrap()
}

fn run_key(s: &str) -> CourseRunKey {
    s.parse().unwrap()
}

/// Seed a draft course with one draft run and a verified seat.
fn seed_draft(store: &InMemoryStore, course: &str, run: &str, run_slug: &str) -> CourseRunKey {
    curator_observability::init();
    let ck = course_key(course);
    let rk = run_key(run);
    let course_row = Course::new_draft(ck.clone(), partner(), "Intro to X");
    let run_row = CourseRun::new_draft(
        rk.clone(),
        ck.clone(),
        RunType::new("verified-audit", true),
        Slug::slugify(run_slug),
    );
    let run_id = run_row.id;
    store
        .transact(|txn| {
            txn.insert_course(course_row.clone())?;
            txn.insert_run(run_row.clone())?;
            txn.insert_seat(Seat::new_draft(run_id, SeatMode::Verified, 4900, "USD"))?;
            slugs::activate(txn, &ck, &Slug::slugify("intro-to-x"), true)?;
            Ok(())
        })
        .unwrap();
    rk
}

fn engine(store: Arc<InMemoryStore>, recorder: Arc<RecordingCollaborator>) -> PublishingEngine {
    PublishingEngine::new(
        store,
        recorder.clone(),
        recorder.clone(),
        recorder,
        PublishingConfig::default(),
    )
}

#[test]
fn reviewed_run_past_go_live_fast_forwards_to_published() {
    let store = Arc::new(InMemoryStore::new());
    let recorder = Arc::new(RecordingCollaborator::new());
    let rk = seed_draft(&store, "EduX+CS101", "course-v1:EduX+CS101+2026T1", "intro-2026");
    store
        .transact(|txn| {
            let id = txn.find_run(&rk, true).unwrap().id;
            txn.run_mut(id)?.go_live_date = Some(Utc::now() - Duration::hours(1));
            Ok(())
        })
        .unwrap();
    let engine = engine(store.clone(), recorder.clone());

    let outcome = engine.transition(&rk, CourseRunStatus::Reviewed).unwrap();
    assert!(outcome.published);
    assert!(outcome.warnings.is_empty());

    // Official pair materialized, both sides Published and announced.
    let official = store.find_run(&rk, false).expect("official row created");
    let draft = store.find_run(&rk, true).unwrap();
    assert_eq!(official.status, CourseRunStatus::Published);
    assert_eq!(draft.status, CourseRunStatus::Published);
    assert!(official.announcement.is_some());
    assert!(draft.announcement.is_some());

    // Exactly one Published notification for the net transition.
    assert_eq!(recorder.notified(), vec![NotificationEvent::Published]);
    // A marketable run was pushed to the marketing site.
    assert_eq!(recorder.marketing_pushes.lock().unwrap().len(), 1);

    // The run slug became a permanent redirect to the course page.
    store
        .transact(|txn| {
            assert!(txn
                .slug_records()
                .iter()
                .any(|r| r.slug.as_str() == "intro-2026" && !r.is_active));
            Ok(())
        })
        .unwrap();
}

#[test]
fn promotion_moves_the_official_slug_and_keeps_the_old_one_as_history() {
    let store = Arc::new(InMemoryStore::new());
    let recorder = Arc::new(RecordingCollaborator::new());
    let rk = seed_draft(&store, "EduX+CS101", "course-v1:EduX+CS101+2026T1", "intro-2026");
    let ck = course_key("EduX+CS101");

    // The course was once published under a different address.
    store
        .transact(|txn| slugs::activate(txn, &ck, &Slug::slugify("intro101"), false))
        .unwrap();

    let engine = engine(store.clone(), recorder);
    engine.transition(&rk, CourseRunStatus::Reviewed).unwrap();

    store
        .transact(|txn| {
            let active = slugs::resolve_active(txn, &ck, false).unwrap();
            assert_eq!(active.as_str(), "intro-to-x");
            assert!(
                txn.slug_records().iter().any(|r| r.slug.as_str() == "intro101"),
                "retired slug kept for redirects"
            );
            Ok(())
        })
        .unwrap();
}

#[test]
fn concurrent_slug_claims_produce_exactly_one_owner() {
    let store = Arc::new(InMemoryStore::new());
    let contenders = ["EduX+CS101", "EduX+CS201"];

    let results: Vec<Result<(), DomainError>> = thread::scope(|scope| {
        let handles: Vec<_> = contenders
            .into_iter()
            .map(|course| {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    store.transact(|txn| {
                        slugs::activate(txn, &course_key(course), &Slug::slugify("python-basics"), true)
                    })
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "one course owns the text");
    for loser in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(loser, Err(DomainError::SlugConflict(_))));
    }

    store
        .transact(|txn| {
            let owners: Vec<_> = txn
                .slug_records()
                .iter()
                .filter(|r| r.slug.as_str() == "python-basics")
                .collect();
            assert_eq!(owners.len(), 1);
            Ok(())
        })
        .unwrap();
}

/// Two published runs; the ended one is swept, the live one survives.
#[test]
fn sweep_unpublishes_only_the_ended_run() {
    let store = InMemoryStore::new();
    let ck = course_key("EduX+CS101");
    let ended_key = run_key("course-v1:EduX+CS101+2025T1");
    let live_key = run_key("course-v1:EduX+CS101+2026T1");
    let now = Utc::now();

    store
        .transact(|txn| {
            let course = Course::new_draft(ck.clone(), partner(), "Intro to X");
            txn.insert_course(course.to_official())?;
            txn.insert_course(course)?;

            for (key, enrollment_end) in [
                (&ended_key, now - Duration::days(30)),
                (&live_key, now + Duration::days(30)),
            ] {
                let mut draft = CourseRun::new_draft(
                    key.clone(),
                    ck.clone(),
                    RunType::new("verified-audit", true),
                    Slug::slugify(key.run()),
                );
                draft.enrollment_end = Some(enrollment_end);
                draft.status = CourseRunStatus::Published;
                txn.insert_run(draft.to_official())?;
                txn.insert_run(draft)?;
            }
            Ok(())
        })
        .unwrap();

    let swept = store
        .transact(|txn| unpublish_inactive_runs(txn, &ck, now))
        .unwrap();
    assert!(swept);

    let ended = store.find_run(&ended_key, false).unwrap();
    assert_eq!(ended.status, CourseRunStatus::Unpublished);
    // Cascades to the editor-facing draft as well.
    assert_eq!(
        store.find_run(&ended_key, true).unwrap().status,
        CourseRunStatus::Unpublished
    );
    assert_eq!(
        store.find_run(&live_key, false).unwrap().status,
        CourseRunStatus::Published
    );
}

/// The sole marketable run has ended: sweeping would strand the course, so
/// the sweep refuses and everything stays published.
#[test]
fn sweep_refuses_to_strand_a_course_without_marketable_runs() {
    let store = InMemoryStore::new();
    let ck = course_key("EduX+CS101");
    let only_key = run_key("course-v1:EduX+CS101+2025T1");
    let now = Utc::now();

    store
        .transact(|txn| {
            let course = Course::new_draft(ck.clone(), partner(), "Intro to X");
            txn.insert_course(course.to_official())?;
            txn.insert_course(course)?;

            let mut draft = CourseRun::new_draft(
                only_key.clone(),
                ck.clone(),
                RunType::new("verified-audit", true),
                Slug::slugify("intro-2025"),
            );
            draft.enrollment_end = Some(now - Duration::days(30));
            draft.status = CourseRunStatus::Published;
            txn.insert_run(draft.to_official())?;
            txn.insert_run(draft)?;
            Ok(())
        })
        .unwrap();

    let swept = store
        .transact(|txn| unpublish_inactive_runs(txn, &ck, now))
        .unwrap();
    assert!(!swept);
    assert_eq!(
        store.find_run(&only_key, false).unwrap().status,
        CourseRunStatus::Published
    );
}
