//! Seats: the purchasable enrollment tracks of a course run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use curator_core::{Entity, RowId};

/// Enrollment mode of a seat or entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeatMode {
    Audit,
    Honor,
    Verified,
    Professional,
    Credit,
    Masters,
    ExecutiveEducation,
    PaidExecutiveEducation,
    PaidBootcamp,
}

impl SeatMode {
    /// Modes for which course-level entitlements are sold. A draft course
    /// may hold entitlements in other modes (e.g. audit), but promotion only
    /// carries these across.
    pub fn is_entitlement_mode(self) -> bool {
        matches!(
            self,
            SeatMode::Verified
                | SeatMode::Professional
                | SeatMode::ExecutiveEducation
                | SeatMode::PaidExecutiveEducation
                | SeatMode::PaidBootcamp
        )
    }
}

/// A seat row: one per (course run row, mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: RowId,
    /// Parent run row (side-specific: draft seats hang off the draft run).
    pub course_run: RowId,
    pub mode: SeatMode,
    /// Price in the smallest currency unit (e.g. cents).
    pub price: u64,
    /// ISO currency code (e.g. "USD").
    pub currency: String,
    pub upgrade_deadline: Option<DateTime<Utc>>,
    pub is_draft: bool,
}

impl Seat {
    pub fn new_draft(course_run: RowId, mode: SeatMode, price: u64, currency: &str) -> Self {
        Self {
            id: RowId::new(),
            course_run,
            mode,
            price,
            currency: currency.to_string(),
            upgrade_deadline: None,
            is_draft: true,
        }
    }

    /// Materialize the official counterpart, attached to the already-promoted
    /// official run.
    pub fn to_official(&self, official_run: RowId) -> Self {
        Self {
            id: RowId::new(),
            course_run: official_run,
            is_draft: false,
            ..self.clone()
        }
    }

    /// Overwrite this official seat's fields from its draft. `mode` is the
    /// matching key and is not copied.
    pub fn copy_from_draft(&mut self, draft: &Seat) {
        self.price = draft.price;
        self.currency = draft.currency.clone();
        self.upgrade_deadline = draft.upgrade_deadline;
    }
}

impl Entity for Seat {
    type Id = RowId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
