//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** — two value
/// objects with the same values are the same thing. Entities, by contrast,
/// have identity: two rows with the same field values are still two rows.
///
/// `CourseKey`, `CourseRunKey`, and `Slug` are the value objects of this
/// workspace; `Course` and `CourseRun` are entities.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
