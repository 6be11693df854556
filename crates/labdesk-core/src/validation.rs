//! Request body validation.
//!
//! Each validator walks a raw JSON body and either yields a typed input or
//! every field-level problem it found. Field paths are dot-joined, with array
//! indices as segments (`items.0.labTestId`).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dates::parse_date;
use crate::id::validate_id;
use crate::model::{
    LabTestPatch, NewLabTest, NewPatient, OrderRequest, OrderRequestItem, PatientPatch,
};
use crate::phone::is_valid_phone_number;
use crate::status::OrderStatus;

pub const MAX_PATIENT_NAME_LEN: usize = 100;
pub const MAX_TEST_CODE_LEN: usize = 20;
pub const MAX_TEST_NAME_LEN: usize = 200;
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;
pub const MAX_TURNAROUND_DAYS: i64 = 3650;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// A problem with a single field of a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All field errors found in one request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.errors
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed")?;
        for (i, error) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            if error.field.is_empty() {
                write!(f, "{sep}{}", error.message)?;
            } else {
                write!(f, "{sep}{}: {}", error.field, error.message)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Marker for a field whose error has already been recorded.
struct Recorded;

type Read<T> = Result<Option<T>, Recorded>;

/// Typed access to the members of one JSON object.
struct Reader<'a> {
    object: &'a Map<String, Value>,
    prefix: String,
}

impl<'a> Reader<'a> {
    fn root(body: &'a Value, errors: &mut ValidationErrors) -> Option<Self> {
        Self::nested(body, String::new(), errors)
    }

    fn nested(value: &'a Value, prefix: String, errors: &mut ValidationErrors) -> Option<Self> {
        match value.as_object() {
            Some(object) => Some(Self { object, prefix }),
            None => {
                errors.push(prefix, "Expected object");
                None
            }
        }
    }

    fn path(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.prefix)
        }
    }

    /// Resolves the key actually used in the body among accepted spellings.
    fn key<'k>(&self, keys: &[&'k str]) -> &'k str {
        keys.iter()
            .copied()
            .find(|k| self.object.contains_key(*k))
            .unwrap_or(keys[0])
    }

    fn is_null(&self, key: &str) -> bool {
        matches!(self.object.get(key), Some(Value::Null))
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.object.get(key).filter(|v| !v.is_null())
    }

    fn string(&self, key: &str, errors: &mut ValidationErrors) -> Read<&'a str> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => {
                errors.push(self.path(key), "Expected string");
                Err(Recorded)
            }
        }
    }

    fn integer(&self, key: &str, errors: &mut ValidationErrors) -> Read<i64> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => match value.as_i64() {
                Some(n) => Ok(Some(n)),
                None => {
                    errors.push(self.path(key), "Expected integer");
                    Err(Recorded)
                }
            },
        }
    }

    fn boolean(&self, key: &str, errors: &mut ValidationErrors) -> Read<bool> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => {
                errors.push(self.path(key), "Expected boolean");
                Err(Recorded)
            }
        }
    }

    fn array(&self, key: &str, errors: &mut ValidationErrors) -> Read<&'a Vec<Value>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(_) => {
                errors.push(self.path(key), "Expected array");
                Err(Recorded)
            }
        }
    }

    /// Rejects an explicit `null` for a field that cannot be cleared.
    fn reject_null(&self, key: &str, expected: &str, errors: &mut ValidationErrors) -> bool {
        if self.is_null(key) {
            errors.push(self.path(key), format!("Expected {expected}"));
            true
        } else {
            false
        }
    }
}

// ---- Field rules ----

fn bounded_text(
    value: &str,
    max: usize,
    required_msg: &str,
    too_long_msg: &str,
) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(required_msg.to_string())
    } else if trimmed.chars().count() > max {
        Err(too_long_msg.to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

fn patient_name(value: &str) -> Result<String, String> {
    bounded_text(
        value,
        MAX_PATIENT_NAME_LEN,
        "Name is required",
        "Name must be at most 100 characters",
    )
}

fn test_code(value: &str) -> Result<String, String> {
    bounded_text(
        value,
        MAX_TEST_CODE_LEN,
        "Code is required",
        "Code must be at most 20 characters",
    )
}

fn test_name(value: &str) -> Result<String, String> {
    bounded_text(
        value,
        MAX_TEST_NAME_LEN,
        "Name is required",
        "Name must be at most 200 characters",
    )
}

fn price_cents(value: i64) -> Result<i64, String> {
    if value < 0 {
        Err("Price must be positive".to_string())
    } else if value > MAX_PRICE_CENTS {
        Err(format!("Price must be at most {MAX_PRICE_CENTS} cents"))
    } else {
        Ok(value)
    }
}

fn turnaround_days(value: i64) -> Result<i32, String> {
    if value < 1 {
        Err("Turnaround must be at least 1 day".to_string())
    } else if value > MAX_TURNAROUND_DAYS {
        Err(format!("Turnaround must be at most {MAX_TURNAROUND_DAYS} days"))
    } else {
        i32::try_from(value).map_err(|_| "Expected integer".to_string())
    }
}

fn email(value: &str) -> Result<Option<String>, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else if EMAIL_RE.is_match(trimmed) {
        Ok(Some(trimmed.to_string()))
    } else {
        Err("Invalid email".to_string())
    }
}

fn phone(value: &str) -> Result<Option<String>, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else if is_valid_phone_number(trimmed) {
        Ok(Some(trimmed.to_string()))
    } else {
        Err("Phone must be in (XXX) XXX-XXXX format".to_string())
    }
}

/// Runs `rule` on a value that was read successfully, recording its error.
fn check<T, U>(
    reader: &Reader<'_>,
    key: &str,
    read: Read<T>,
    rule: impl FnOnce(T) -> Result<U, String>,
    errors: &mut ValidationErrors,
) -> Read<U> {
    match read {
        Ok(Some(value)) => match rule(value) {
            Ok(v) => Ok(Some(v)),
            Err(message) => {
                errors.push(reader.path(key), message);
                Err(Recorded)
            }
        },
        Ok(None) => Ok(None),
        Err(Recorded) => Err(Recorded),
    }
}

/// Unwraps a required field, reporting `missing_msg` when it is absent.
fn require<T>(
    reader: &Reader<'_>,
    key: &str,
    read: Read<T>,
    missing_msg: &str,
    errors: &mut ValidationErrors,
) -> Option<T> {
    match read {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            errors.push(reader.path(key), missing_msg);
            None
        }
        Err(Recorded) => None,
    }
}

// ---- Patients ----

pub fn validate_new_patient(body: &Value) -> Result<NewPatient, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(r) = Reader::root(body, &mut errors) else {
        return Err(errors);
    };

    let name_key = r.key(&["fullName", "name"]);
    let read = r.string(name_key, &mut errors);
    let full_name = check(&r, name_key, read, patient_name, &mut errors);
    let full_name = require(&r, name_key, full_name, "Name is required", &mut errors);

    let dob_key = r.key(&["dob", "dateOfBirth"]);
    let read = r.string(dob_key, &mut errors);
    let dob = check(
        &r,
        dob_key,
        read,
        |s| parse_date(s).map_err(|_| "Invalid date format".to_string()),
        &mut errors,
    );
    let dob = require(&r, dob_key, dob, "Required", &mut errors);

    let read = r.string("email", &mut errors);
    let email = check(&r, "email", read, email, &mut errors);
    let read = r.string("phone", &mut errors);
    let phone = check(&r, "phone", read, phone, &mut errors);

    match (full_name, dob, email, phone) {
        (Some(full_name), Some(dob), Ok(email), Ok(phone)) if errors.is_empty() => {
            Ok(NewPatient {
                full_name,
                dob,
                email: email.flatten(),
                phone: phone.flatten(),
            })
        }
        _ => Err(errors),
    }
}

/// Validates a partial patient update carrying its `id` in the body.
pub fn validate_patient_patch(body: &Value) -> Result<(String, PatientPatch), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(r) = Reader::root(body, &mut errors) else {
        return Err(errors);
    };

    let read = r.string("id", &mut errors);
    let id = check(
        &r,
        "id",
        read,
        |s| validate_id(s).map(|()| s.to_string()).map_err(|e| e.to_string()),
        &mut errors,
    );
    let id = require(&r, "id", id, "Required", &mut errors);

    let mut patch = PatientPatch::default();

    let name_key = r.key(&["fullName", "name"]);
    if !r.reject_null(name_key, "string", &mut errors) {
        let read = r.string(name_key, &mut errors);
        if let Ok(name) = check(&r, name_key, read, patient_name, &mut errors) {
            patch.full_name = name;
        }
    }

    let dob_key = r.key(&["dob", "dateOfBirth"]);
    if !r.reject_null(dob_key, "string", &mut errors) {
        let read = r.string(dob_key, &mut errors);
        let dob = check(
            &r,
            dob_key,
            read,
            |s| parse_date(s).map_err(|_| "Invalid date format".to_string()),
            &mut errors,
        );
        if let Ok(dob) = dob {
            patch.dob = dob;
        }
    }

    for (key, rule, slot) in [
        ("email", email as fn(&str) -> Result<Option<String>, String>, &mut patch.email),
        ("phone", phone, &mut patch.phone),
    ] {
        if r.is_null(key) {
            *slot = Some(None);
            continue;
        }
        // An empty string counts as not sent; only null clears.
        let read = r.string(key, &mut errors);
        if let Ok(Some(Some(value))) = check(&r, key, read, rule, &mut errors) {
            *slot = Some(Some(value));
        }
    }

    let Some(id) = id else {
        return Err(errors);
    };
    if errors.is_empty() && patch.is_empty() {
        errors.push("", "No fields provided for update");
    }
    errors.finish(|| (id, patch))
}

// ---- Lab tests ----

pub fn validate_new_lab_test(body: &Value) -> Result<NewLabTest, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(r) = Reader::root(body, &mut errors) else {
        return Err(errors);
    };

    let read = r.string("code", &mut errors);
    let code = check(&r, "code", read, test_code, &mut errors);
    let code = require(&r, "code", code, "Code is required", &mut errors);

    let read = r.string("name", &mut errors);
    let name = check(&r, "name", read, test_name, &mut errors);
    let name = require(&r, "name", name, "Name is required", &mut errors);

    let read = r.integer("priceCents", &mut errors);
    let price = check(&r, "priceCents", read, price_cents, &mut errors);
    let price = require(&r, "priceCents", price, "Required", &mut errors);

    let read = r.integer("turnaroundDays", &mut errors);
    let turnaround = check(&r, "turnaroundDays", read, turnaround_days, &mut errors);
    let turnaround = require(&r, "turnaroundDays", turnaround, "Required", &mut errors);

    let is_active = r.boolean("isActive", &mut errors);

    match (code, name, price, turnaround, is_active) {
        (Some(code), Some(name), Some(price_cents), Some(turnaround_days), Ok(is_active))
            if errors.is_empty() =>
        {
            Ok(NewLabTest {
                code,
                name,
                price_cents,
                turnaround_days,
                is_active: is_active.unwrap_or(true),
            })
        }
        _ => Err(errors),
    }
}

pub fn validate_lab_test_patch(body: &Value) -> Result<LabTestPatch, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(r) = Reader::root(body, &mut errors) else {
        return Err(errors);
    };

    let mut patch = LabTestPatch::default();

    if !r.reject_null("code", "string", &mut errors) {
        let read = r.string("code", &mut errors);
        if let Ok(code) = check(&r, "code", read, test_code, &mut errors) {
            patch.code = code;
        }
    }
    if !r.reject_null("name", "string", &mut errors) {
        let read = r.string("name", &mut errors);
        if let Ok(name) = check(&r, "name", read, test_name, &mut errors) {
            patch.name = name;
        }
    }
    if !r.reject_null("priceCents", "integer", &mut errors) {
        let read = r.integer("priceCents", &mut errors);
        if let Ok(price) = check(&r, "priceCents", read, price_cents, &mut errors) {
            patch.price_cents = price;
        }
    }
    if !r.reject_null("turnaroundDays", "integer", &mut errors) {
        let read = r.integer("turnaroundDays", &mut errors);
        if let Ok(days) = check(&r, "turnaroundDays", read, turnaround_days, &mut errors) {
            patch.turnaround_days = days;
        }
    }
    if !r.reject_null("isActive", "boolean", &mut errors)
        && let Ok(active) = r.boolean("isActive", &mut errors)
    {
        patch.is_active = active;
    }

    if errors.is_empty() && patch.is_empty() {
        errors.push("", "No fields provided for update");
    }
    errors.finish(|| patch)
}

// ---- Orders ----

pub fn validate_new_order(body: &Value) -> Result<OrderRequest, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(r) = Reader::root(body, &mut errors) else {
        return Err(errors);
    };

    let read = r.string("patientId", &mut errors);
    let patient_id = check(
        &r,
        "patientId",
        read,
        |s| {
            let s = s.trim();
            if s.is_empty() {
                Err("Patient is required".to_string())
            } else {
                Ok(s.to_string())
            }
        },
        &mut errors,
    );
    let patient_id = require(&r, "patientId", patient_id, "Patient is required", &mut errors);

    let read = r.array("items", &mut errors);
    let raw_items = require(&r, "items", read, "At least one test is required", &mut errors);

    let mut items = Vec::new();
    if let Some(raw_items) = raw_items {
        if raw_items.is_empty() {
            errors.push(r.path("items"), "At least one test is required");
        }
        for (index, raw) in raw_items.iter().enumerate() {
            if let Some(item) = order_item(raw, r.path(&format!("items.{index}")), &mut errors) {
                items.push(item);
            }
        }
    }

    match patient_id {
        Some(patient_id) => errors.finish(|| OrderRequest { patient_id, items }),
        None => Err(errors),
    }
}

fn order_item(
    raw: &Value,
    prefix: String,
    errors: &mut ValidationErrors,
) -> Option<OrderRequestItem> {
    let r = Reader::nested(raw, prefix, errors)?;

    let test_key = r.key(&["labTestId", "testId"]);
    let read = r.string(test_key, errors);
    let lab_test_id = check(
        &r,
        test_key,
        read,
        |s| {
            let s = s.trim();
            if s.is_empty() {
                Err("Lab test is required".to_string())
            } else {
                Ok(s.to_string())
            }
        },
        errors,
    );
    let lab_test_id = require(&r, test_key, lab_test_id, "Required", errors);

    let read = r.integer("unitPriceCents", errors);
    let unit_price_cents = check(&r, "unitPriceCents", read, price_cents, errors);

    let read = r.integer("turnaroundDaysAtOrder", errors);
    let turnaround = check(&r, "turnaroundDaysAtOrder", read, turnaround_days, errors);

    match (lab_test_id, unit_price_cents, turnaround) {
        (Some(lab_test_id), Ok(unit_price_cents), Ok(turnaround_days_at_order)) => {
            Some(OrderRequestItem {
                lab_test_id,
                unit_price_cents,
                turnaround_days_at_order,
            })
        }
        _ => None,
    }
}

pub fn validate_status_update(body: &Value) -> Result<OrderStatus, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(r) = Reader::root(body, &mut errors) else {
        return Err(errors);
    };

    let read = r.string("status", &mut errors);
    let status = check(
        &r,
        "status",
        read,
        |s| {
            s.parse::<OrderStatus>().map_err(|_| {
                "Status must be one of DRAFT, SUBMITTED, IN_PROGRESS, READY, CANCELLED"
                    .to_string()
            })
        },
        &mut errors,
    );
    match require(&r, "status", status, "Required", &mut errors) {
        Some(status) => Ok(status),
        None => Err(errors),
    }
}
