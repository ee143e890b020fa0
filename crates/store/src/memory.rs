//! In-memory store with atomic, serialized transactions.

use std::collections::HashMap;
use std::sync::Mutex;

use curator_catalog::{
    Course, CourseEntitlement, CourseKey, CourseRun, CourseRunKey, RestrictedCourseRun, Seat,
    SeatMode, Slug, SlugRecord,
};
use curator_core::{DomainError, DomainResult, RowId};

use crate::pair::EntityPair;

#[derive(Debug, Clone, Default)]
struct Tables {
    courses: HashMap<RowId, Course>,
    course_pairs: HashMap<CourseKey, EntityPair>,
    runs: HashMap<RowId, CourseRun>,
    run_pairs: HashMap<CourseRunKey, EntityPair>,
    seats: HashMap<RowId, Seat>,
    entitlements: HashMap<RowId, CourseEntitlement>,
    restrictions: HashMap<RowId, RestrictedCourseRun>,
    slug_records: Vec<SlugRecord>,
    /// Resolved active slugs, keyed by (course identity, draft flag).
    /// Lives inside the tables so a rolled-back transaction restores the
    /// cache together with the records it describes.
    slug_cache: HashMap<(CourseKey, bool), Slug>,
}

/// In-memory catalog store.
///
/// The mutex serializes concurrent transactions, so "create official if
/// absent, else update" can never race into duplicate rows, and the loser
/// of a slug race observes the winner's committed state.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` atomically. On `Err` the pre-transaction snapshot is
    /// restored, so no partial state is ever visible.
    pub fn transact<T>(&self, f: impl FnOnce(&mut Txn<'_>) -> DomainResult<T>) -> DomainResult<T> {
        let mut guard = self
            .tables
            .lock()
            .map_err(|_| DomainError::conflict("store lock poisoned"))?;
        let snapshot = guard.clone();
        let mut txn = Txn { tables: &mut guard };
        match f(&mut txn) {
            Ok(value) => Ok(value),
            Err(e) => {
                *guard = snapshot;
                Err(e)
            }
        }
    }

    // Read-only convenience accessors (each is a tiny transaction).

    pub fn get_course(&self, id: RowId) -> Option<Course> {
        self.transact(|txn| Ok(txn.course(id).ok().cloned())).ok().flatten()
    }

    pub fn get_run(&self, id: RowId) -> Option<CourseRun> {
        self.transact(|txn| Ok(txn.run(id).ok().cloned())).ok().flatten()
    }

    pub fn find_run(&self, key: &CourseRunKey, draft: bool) -> Option<CourseRun> {
        self.transact(|txn| Ok(txn.find_run(key, draft).cloned())).ok().flatten()
    }

    pub fn find_course(&self, key: &CourseKey, draft: bool) -> Option<Course> {
        self.transact(|txn| Ok(txn.find_course(key, draft).cloned())).ok().flatten()
    }
}

/// A live transaction over the store's tables.
pub struct Txn<'a> {
    tables: &'a mut Tables,
}

impl Txn<'_> {
    // ---- courses ----

    pub fn insert_course(&mut self, course: Course) -> DomainResult<RowId> {
        let pair = self.tables.course_pairs.entry(course.key.clone()).or_default();
        let slot = pair.side_mut(course.is_draft);
        if slot.is_some() {
            return Err(DomainError::conflict(format!(
                "course {} already has a {} row",
                course.key,
                side_name(course.is_draft)
            )));
        }
        *slot = Some(course.id);
        let id = course.id;
        self.tables.courses.insert(id, course);
        Ok(id)
    }

    pub fn course(&self, id: RowId) -> DomainResult<&Course> {
        self.tables.courses.get(&id).ok_or(DomainError::NotFound)
    }

    pub fn course_mut(&mut self, id: RowId) -> DomainResult<&mut Course> {
        self.tables.courses.get_mut(&id).ok_or(DomainError::NotFound)
    }

    pub fn course_pair(&self, key: &CourseKey) -> EntityPair {
        self.tables.course_pairs.get(key).copied().unwrap_or_default()
    }

    pub fn find_course(&self, key: &CourseKey, draft: bool) -> Option<&Course> {
        let id = self.course_pair(key).side(draft)?;
        self.tables.courses.get(&id)
    }

    // ---- course runs ----

    pub fn insert_run(&mut self, run: CourseRun) -> DomainResult<RowId> {
        let pair = self.tables.run_pairs.entry(run.key.clone()).or_default();
        let slot = pair.side_mut(run.is_draft);
        if slot.is_some() {
            return Err(DomainError::conflict(format!(
                "course run {} already has a {} row",
                run.key,
                side_name(run.is_draft)
            )));
        }
        *slot = Some(run.id);
        let id = run.id;
        self.tables.runs.insert(id, run);
        Ok(id)
    }

    pub fn run(&self, id: RowId) -> DomainResult<&CourseRun> {
        self.tables.runs.get(&id).ok_or(DomainError::NotFound)
    }

    pub fn run_mut(&mut self, id: RowId) -> DomainResult<&mut CourseRun> {
        self.tables.runs.get_mut(&id).ok_or(DomainError::NotFound)
    }

    pub fn run_pair(&self, key: &CourseRunKey) -> EntityPair {
        self.tables.run_pairs.get(key).copied().unwrap_or_default()
    }

    pub fn find_run(&self, key: &CourseRunKey, draft: bool) -> Option<&CourseRun> {
        let id = self.run_pair(key).side(draft)?;
        self.tables.runs.get(&id)
    }

    /// Row ids of all runs of a course on one side, in deterministic order.
    pub fn runs_of_course(&self, course: &CourseKey, draft: bool) -> Vec<RowId> {
        let mut ids: Vec<RowId> = self
            .tables
            .runs
            .values()
            .filter(|r| r.course == *course && r.is_draft == draft)
            .map(|r| r.id)
            .collect();
        ids.sort_by_key(|id| self.tables.runs[id].key.as_str().to_string());
        ids
    }

    // ---- seats ----

    pub fn insert_seat(&mut self, seat: Seat) -> DomainResult<RowId> {
        if self.find_seat(seat.course_run, seat.mode).is_some() {
            return Err(DomainError::conflict(format!(
                "run row already has a {:?} seat",
                seat.mode
            )));
        }
        let id = seat.id;
        self.tables.seats.insert(id, seat);
        Ok(id)
    }

    pub fn seat(&self, id: RowId) -> DomainResult<&Seat> {
        self.tables.seats.get(&id).ok_or(DomainError::NotFound)
    }

    pub fn seat_mut(&mut self, id: RowId) -> DomainResult<&mut Seat> {
        self.tables.seats.get_mut(&id).ok_or(DomainError::NotFound)
    }

    pub fn remove_seat(&mut self, id: RowId) -> DomainResult<Seat> {
        self.tables.seats.remove(&id).ok_or(DomainError::NotFound)
    }

    pub fn find_seat(&self, run: RowId, mode: SeatMode) -> Option<RowId> {
        self.tables
            .seats
            .values()
            .find(|s| s.course_run == run && s.mode == mode)
            .map(|s| s.id)
    }

    pub fn seats_of_run(&self, run: RowId) -> Vec<RowId> {
        let mut ids: Vec<RowId> = self
            .tables
            .seats
            .values()
            .filter(|s| s.course_run == run)
            .map(|s| s.id)
            .collect();
        ids.sort_by_key(|id| format!("{:?}", self.tables.seats[id].mode));
        ids
    }

    // ---- entitlements ----

    pub fn insert_entitlement(&mut self, entitlement: CourseEntitlement) -> DomainResult<RowId> {
        if self.find_entitlement(entitlement.course, entitlement.mode).is_some() {
            return Err(DomainError::conflict(format!(
                "course row already has a {:?} entitlement",
                entitlement.mode
            )));
        }
        let id = entitlement.id;
        self.tables.entitlements.insert(id, entitlement);
        Ok(id)
    }

    pub fn entitlement(&self, id: RowId) -> DomainResult<&CourseEntitlement> {
        self.tables.entitlements.get(&id).ok_or(DomainError::NotFound)
    }

    pub fn entitlement_mut(&mut self, id: RowId) -> DomainResult<&mut CourseEntitlement> {
        self.tables.entitlements.get_mut(&id).ok_or(DomainError::NotFound)
    }

    pub fn remove_entitlement(&mut self, id: RowId) -> DomainResult<CourseEntitlement> {
        self.tables.entitlements.remove(&id).ok_or(DomainError::NotFound)
    }

    pub fn find_entitlement(&self, course: RowId, mode: SeatMode) -> Option<RowId> {
        self.tables
            .entitlements
            .values()
            .find(|e| e.course == course && e.mode == mode)
            .map(|e| e.id)
    }

    pub fn entitlements_of_course(&self, course: RowId) -> Vec<RowId> {
        let mut ids: Vec<RowId> = self
            .tables
            .entitlements
            .values()
            .filter(|e| e.course == course)
            .map(|e| e.id)
            .collect();
        ids.sort_by_key(|id| format!("{:?}", self.tables.entitlements[id].mode));
        ids
    }

    // ---- restrictions ----

    pub fn insert_restriction(&mut self, restriction: RestrictedCourseRun) -> DomainResult<RowId> {
        if self.restriction_of_run(restriction.course_run).is_some() {
            return Err(DomainError::conflict("run row already has a restriction"));
        }
        let id = restriction.id;
        self.tables.restrictions.insert(id, restriction);
        Ok(id)
    }

    pub fn restriction(&self, id: RowId) -> DomainResult<&RestrictedCourseRun> {
        self.tables.restrictions.get(&id).ok_or(DomainError::NotFound)
    }

    pub fn restriction_mut(&mut self, id: RowId) -> DomainResult<&mut RestrictedCourseRun> {
        self.tables.restrictions.get_mut(&id).ok_or(DomainError::NotFound)
    }

    pub fn remove_restriction(&mut self, id: RowId) -> DomainResult<RestrictedCourseRun> {
        self.tables.restrictions.remove(&id).ok_or(DomainError::NotFound)
    }

    pub fn restriction_of_run(&self, run: RowId) -> Option<RowId> {
        self.tables
            .restrictions
            .values()
            .find(|r| r.course_run == run)
            .map(|r| r.id)
    }

    // ---- slug records ----

    pub fn slug_records(&self) -> &[SlugRecord] {
        &self.tables.slug_records
    }

    pub fn slug_records_mut(&mut self) -> impl Iterator<Item = &mut SlugRecord> {
        self.tables.slug_records.iter_mut()
    }

    pub fn push_slug_record(&mut self, record: SlugRecord) {
        self.tables.slug_records.push(record);
    }

    pub fn retain_slug_records(&mut self, keep: impl FnMut(&SlugRecord) -> bool) {
        self.tables.slug_records.retain(keep);
    }

    // ---- slug cache ----

    pub fn cached_slug(&self, course: &CourseKey, draft: bool) -> Option<&Slug> {
        self.tables.slug_cache.get(&(course.clone(), draft))
    }

    pub fn cache_slug(&mut self, course: &CourseKey, draft: bool, slug: Slug) {
        self.tables.slug_cache.insert((course.clone(), draft), slug);
    }

    /// Drop both sides of a course's cached resolution. Called by every
    /// activation that may change the resolved address, inside the same
    /// transaction as the record change.
    pub fn invalidate_slug(&mut self, course: &CourseKey) {
        self.tables.slug_cache.remove(&(course.clone(), true));
        self.tables.slug_cache.remove(&(course.clone(), false));
    }
}

fn side_name(draft: bool) -> &'static str {
    if draft { "draft" } else { "official" }
}
