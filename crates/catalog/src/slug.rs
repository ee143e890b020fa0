//! URL slugs and the per-course slug history.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use curator_core::{DomainError, Entity, RowId, ValueObject};

use crate::keys::CourseKey;

/// A public URL fragment for a course.
///
/// Normalized to lowercase at construction so that uniqueness comparisons
/// are plain equality. Subdirectory slugs keep their `/` separators
/// (`learn/physics/mitx-circuits`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for subdirectory-format slugs (`learn/<subject>/<org>-<title>`).
    pub fn is_subdirectory(&self) -> bool {
        self.0.contains('/')
    }

    /// Marketing URL path for this slug. Plain slugs live under `course/`;
    /// subdirectory slugs are already full paths.
    pub fn url_path(&self) -> String {
        if self.is_subdirectory() {
            self.0.clone()
        } else {
            format!("course/{}", self.0)
        }
    }

    /// Convert free text to a slug, mapping disallowed characters to `-`.
    pub fn slugify(text: &str) -> Self {
        Self(slugify_segment(text))
    }

    /// Like [`Slug::slugify`] but preserves `/` path separators.
    pub fn slugify_with_slashes(text: &str) -> Self {
        let joined = text
            .split('/')
            .map(slugify_segment)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }
}

fn slugify_segment(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_dash = true; // suppress leading dashes
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

impl ValueObject for Slug {}

impl core::fmt::Display for Slug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Slug {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        let segments: Vec<&str> = lowered.split('/').collect();
        let well_formed = !lowered.is_empty()
            && segments.iter().all(|seg| {
                !seg.is_empty()
                    && !seg.starts_with('-')
                    && !seg.ends_with('-')
                    && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            });
        if well_formed {
            Ok(Self(lowered))
        } else {
            Err(DomainError::validation(format!("malformed slug '{s}'")))
        }
    }
}

/// One entry in a course's slug history.
///
/// Official-side records (`is_draft == false`) hold the published address
/// book: at most one is `is_active`, at most one is `is_active_on_draft`
/// (the address a fresh draft keeps advertising). The draft side holds at
/// most a single record, the draft's own active slug. Records with both
/// flags clear are retained history and serve as permanent redirects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlugRecord {
    pub id: RowId,
    pub course: CourseKey,
    pub slug: Slug,
    /// Which side of the draft/official pair the record belongs to.
    pub is_draft: bool,
    pub is_active: bool,
    pub is_active_on_draft: bool,
}

impl SlugRecord {
    pub fn new(course: CourseKey, slug: Slug, is_draft: bool) -> Self {
        Self {
            id: RowId::new(),
            course,
            slug,
            is_draft,
            is_active: false,
            is_active_on_draft: false,
        }
    }
}

impl Entity for SlugRecord {
    type Id = RowId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
