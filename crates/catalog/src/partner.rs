//! Partner: the organization a course is published under.

use serde::{Deserialize, Serialize};

use curator_core::PartnerId;

/// Partner owning a course. Embedded by value on `Course`; both sides of a
/// draft/official pair share the same partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub id: PartnerId,
    pub short_code: String,
    pub name: String,
    /// Root URL of the partner's marketing site, if it has one.
    pub marketing_site_root: Option<String>,
}

impl Partner {
    pub fn new(short_code: &str, name: &str, marketing_site_root: Option<&str>) -> Self {
        Self {
            id: PartnerId::new(),
            short_code: short_code.to_string(),
            name: name.to_string(),
            marketing_site_root: marketing_site_root.map(str::to_string),
        }
    }

    pub fn has_marketing_site(&self) -> bool {
        self.marketing_site_root.is_some()
    }
}
