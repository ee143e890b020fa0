//! The logical-identity index entry.

use serde::{Deserialize, Serialize};

use curator_core::RowId;

/// The two rows of a logical entity.
///
/// Neither row owns the other; both are owned by this index entry, keyed by
/// the entity's stable key. At most one draft and one official row may
/// exist per identity — the store refuses inserts that would violate that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPair {
    pub draft: Option<RowId>,
    pub official: Option<RowId>,
}

impl EntityPair {
    pub fn side(&self, draft: bool) -> Option<RowId> {
        if draft { self.draft } else { self.official }
    }

    pub(crate) fn side_mut(&mut self, draft: bool) -> &mut Option<RowId> {
        if draft { &mut self.draft } else { &mut self.official }
    }

    pub fn is_empty(&self) -> bool {
        self.draft.is_none() && self.official.is_none()
    }
}
