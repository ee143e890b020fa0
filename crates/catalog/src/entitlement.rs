//! Course entitlements: course-level purchases redeemable for a run seat.

use serde::{Deserialize, Serialize};

use curator_core::{Entity, RowId};

use crate::seat::SeatMode;

/// An entitlement row: one per (course row, mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseEntitlement {
    pub id: RowId,
    /// Parent course row (side-specific).
    pub course: RowId,
    pub mode: SeatMode,
    /// Price in the smallest currency unit.
    pub price: u64,
    pub currency: String,
    pub is_draft: bool,
}

impl CourseEntitlement {
    pub fn new_draft(course: RowId, mode: SeatMode, price: u64, currency: &str) -> Self {
        Self {
            id: RowId::new(),
            course,
            mode,
            price,
            currency: currency.to_string(),
            is_draft: true,
        }
    }

    pub fn to_official(&self, official_course: RowId) -> Self {
        Self {
            id: RowId::new(),
            course: official_course,
            is_draft: false,
            ..self.clone()
        }
    }

    /// `mode` is the matching key and is not copied.
    pub fn copy_from_draft(&mut self, draft: &CourseEntitlement) {
        self.price = draft.price;
        self.currency = draft.currency.clone();
    }
}

impl Entity for CourseEntitlement {
    type Id = RowId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
