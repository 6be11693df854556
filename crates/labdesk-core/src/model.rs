//! Persisted entities and the inputs that create or modify them.
//!
//! Entities serialize with camelCase keys and RFC 3339 timestamps, which is
//! the JSON shape served by the HTTP API.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::calc::{Quoted, calc_eta, calc_total};
use crate::dates::iso_date;
use crate::status::OrderStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub full_name: String,
    #[serde(with = "iso_date")]
    pub dob: Date,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTest {
    pub id: String,
    pub code: String,
    pub name: String,
    pub price_cents: i64,
    pub turnaround_days: i32,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub patient_id: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub placed_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub estimated_ready_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Line item of an order with the catalog values frozen at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub lab_test_id: String,
    pub unit_price_cents: i64,
    pub turnaround_days_at_order: i32,
}

impl Quoted for OrderItem {
    fn unit_price_cents(&self) -> i64 {
        self.unit_price_cents
    }
    fn turnaround_days(&self) -> i32 {
        self.turnaround_days_at_order
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    pub lab_test: LabTest,
}

/// An order together with its patient and its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub patient: Patient,
    pub items: Vec<OrderItemDetail>,
}

// ---- Inputs ----

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub full_name: String,
    pub dob: Date,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Partial patient update.
///
/// For `email` and `phone`, `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientPatch {
    pub full_name: Option<String>,
    pub dob: Option<Date>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
}

impl PatientPatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.dob.is_none()
            && self.email.is_none()
            && self.phone.is_none()
    }

    pub fn apply(&self, patient: &mut Patient, now: OffsetDateTime) {
        if let Some(full_name) = &self.full_name {
            patient.full_name = full_name.clone();
        }
        if let Some(dob) = self.dob {
            patient.dob = dob;
        }
        if let Some(email) = &self.email {
            patient.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            patient.phone = phone.clone();
        }
        patient.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLabTest {
    pub code: String,
    pub name: String,
    pub price_cents: i64,
    pub turnaround_days: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabTestPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub turnaround_days: Option<i32>,
    pub is_active: Option<bool>,
}

impl LabTestPatch {
    pub fn is_empty(&self) -> bool {
        self.code.is_none()
            && self.name.is_none()
            && self.price_cents.is_none()
            && self.turnaround_days.is_none()
            && self.is_active.is_none()
    }

    pub fn apply(&self, test: &mut LabTest, now: OffsetDateTime) {
        if let Some(code) = &self.code {
            test.code = code.clone();
        }
        if let Some(name) = &self.name {
            test.name = name.clone();
        }
        if let Some(price_cents) = self.price_cents {
            test.price_cents = price_cents;
        }
        if let Some(turnaround_days) = self.turnaround_days {
            test.turnaround_days = turnaround_days;
        }
        if let Some(is_active) = self.is_active {
            test.is_active = is_active;
        }
        test.updated_at = now;
    }
}

/// Validated order request, before the referenced records are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub patient_id: String,
    pub items: Vec<OrderRequestItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequestItem {
    pub lab_test_id: String,
    pub unit_price_cents: Option<i64>,
    pub turnaround_days_at_order: Option<i32>,
}

impl OrderRequestItem {
    /// Freezes price and turnaround, preferring the quoted values when the
    /// client sent them.
    pub fn snapshot(&self, test: &LabTest) -> NewOrderItem {
        NewOrderItem {
            lab_test_id: test.id.clone(),
            unit_price_cents: self.unit_price_cents.unwrap_or(test.price_cents),
            turnaround_days_at_order: self
                .turnaround_days_at_order
                .unwrap_or(test.turnaround_days),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub lab_test_id: String,
    pub unit_price_cents: i64,
    pub turnaround_days_at_order: i32,
}

impl Quoted for NewOrderItem {
    fn unit_price_cents(&self) -> i64 {
        self.unit_price_cents
    }
    fn turnaround_days(&self) -> i32 {
        self.turnaround_days_at_order
    }
}

/// A fully priced order ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub patient_id: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub placed_at: OffsetDateTime,
    pub estimated_ready_at: OffsetDateTime,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    /// Prices a draft order placed at `placed_at`.
    pub fn draft(
        patient_id: impl Into<String>,
        items: Vec<NewOrderItem>,
        placed_at: OffsetDateTime,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            status: OrderStatus::Draft,
            total_cents: calc_total(&items),
            estimated_ready_at: calc_eta(placed_at, &items),
            placed_at,
            items,
        }
    }
}
