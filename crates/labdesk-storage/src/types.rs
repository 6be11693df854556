//! Listing filters.

use labdesk_core::OrderStatus;

/// Filter for `GET /api/tests`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabTestFilter {
    pub active_only: bool,
}

impl LabTestFilter {
    pub fn active_only() -> Self {
        Self { active_only: true }
    }
}

/// Filter for `GET /api/orders`. Unset fields do not restrict the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub patient_id: Option<String>,
    /// Case-insensitive substring of the patient's full name.
    pub patient_name: Option<String>,
}

impl OrderFilter {
    #[must_use]
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_patient_id(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    #[must_use]
    pub fn with_patient_name(mut self, name: impl Into<String>) -> Self {
        self.patient_name = Some(name.into());
        self
    }

    /// Lowercased name needle, or `None` when it would match everything.
    pub fn patient_name_needle(&self) -> Option<String> {
        self.patient_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}
