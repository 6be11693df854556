//! Patient search parameters.
//!
//! Search text is matched as a case-insensitive substring against name, email
//! and phone. Text that looks like a date (`MM/DD/YYYY`, `YYYY-MM-DD` or a bare
//! year) additionally matches patients born on that day or in that year.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use time::{Date, Month};

use crate::error::{CoreError, Result};
use crate::model::Patient;

static US_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid date regex")
});
static ISO_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid date regex")
});
static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})$").expect("valid year regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchField {
    #[default]
    All,
    Name,
    Email,
    Phone,
    Birthdate,
}

impl SearchField {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchField::All => "all",
            SearchField::Name => "name",
            SearchField::Email => "email",
            SearchField::Phone => "phone",
            SearchField::Birthdate => "birthdate",
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "all" => Ok(SearchField::All),
            "name" => Ok(SearchField::Name),
            "email" => Ok(SearchField::Email),
            "phone" => Ok(SearchField::Phone),
            "birthdate" | "dob" => Ok(SearchField::Birthdate),
            _ => Err(CoreError::invalid_search_field(s)),
        }
    }
}

/// Half-open range of birth dates, `[start, end_exclusive)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end_exclusive: Date,
}

impl DateRange {
    pub fn contains(&self, date: Date) -> bool {
        date >= self.start && date < self.end_exclusive
    }

    fn day(date: Date) -> Option<Self> {
        Some(Self {
            start: date,
            end_exclusive: date.next_day()?,
        })
    }

    fn year(year: i32) -> Option<Self> {
        Some(Self {
            start: Date::from_calendar_date(year, Month::January, 1).ok()?,
            end_exclusive: Date::from_calendar_date(year + 1, Month::January, 1).ok()?,
        })
    }

    /// Interprets search text as a date, if it looks like one.
    pub fn from_search_text(text: &str) -> Option<Self> {
        if let Some(caps) = US_DATE_RE.captures(text) {
            let month: u8 = caps[1].parse().ok()?;
            let day: u8 = caps[2].parse().ok()?;
            let year: i32 = caps[3].parse().ok()?;
            return Self::day(calendar_date(year, month, day)?);
        }
        if let Some(caps) = ISO_DATE_RE.captures(text) {
            let year: i32 = caps[1].parse().ok()?;
            let month: u8 = caps[2].parse().ok()?;
            let day: u8 = caps[3].parse().ok()?;
            return Self::day(calendar_date(year, month, day)?);
        }
        if let Some(caps) = YEAR_RE.captures(text) {
            return Self::year(caps[1].parse().ok()?);
        }
        None
    }
}

fn calendar_date(year: i32, month: u8, day: u8) -> Option<Date> {
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

/// Parsed `GET /api/patients` query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientQuery {
    /// Trimmed search text; `None` when absent or blank.
    pub text: Option<String>,
    pub field: SearchField,
    pub dob_range: Option<DateRange>,
}

impl PatientQuery {
    pub fn parse(search: Option<&str>, field: Option<&str>) -> Result<Self> {
        let field = match field {
            Some(field) => field.trim().parse()?,
            None => SearchField::All,
        };
        let text = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        let dob_range = text.as_deref().and_then(DateRange::from_search_text);
        Ok(Self {
            text,
            field,
            dob_range,
        })
    }

    pub fn matches_name(&self) -> bool {
        matches!(self.field, SearchField::All | SearchField::Name)
    }

    pub fn matches_email(&self) -> bool {
        matches!(self.field, SearchField::All | SearchField::Email)
    }

    pub fn matches_phone(&self) -> bool {
        matches!(self.field, SearchField::All | SearchField::Phone)
    }

    pub fn matches_birthdate(&self) -> bool {
        matches!(self.field, SearchField::All | SearchField::Birthdate)
    }

    /// Evaluates the query against a patient.
    pub fn matches(&self, patient: &Patient) -> bool {
        let Some(text) = &self.text else {
            return true;
        };
        let needle = text.to_lowercase();
        let contains = |value: Option<&str>| {
            value.is_some_and(|v| v.to_lowercase().contains(&needle))
        };

        (self.matches_name() && contains(Some(patient.full_name.as_str())))
            || (self.matches_email() && contains(patient.email.as_deref()))
            || (self.matches_phone() && contains(patient.phone.as_deref()))
            || (self.matches_birthdate()
                && self.dob_range.is_some_and(|range| range.contains(patient.dob)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn patient(name: &str, dob: Date, email: Option<&str>, phone: Option<&str>) -> Patient {
        Patient {
            id: "p".into(),
            full_name: name.into(),
            dob,
            email: email.map(Into::into),
            phone: phone.map(Into::into),
            created_at: datetime!(2025-01-01 0:00 UTC),
            updated_at: datetime!(2025-01-01 0:00 UTC),
        }
    }

    #[test]
    fn parses_fields() {
        assert_eq!("name".parse::<SearchField>().unwrap(), SearchField::Name);
        assert_eq!("ALL".parse::<SearchField>().unwrap(), SearchField::All);
        assert_eq!(
            "birthdate".parse::<SearchField>().unwrap(),
            SearchField::Birthdate
        );
        assert!("address".parse::<SearchField>().is_err());
    }

    #[test]
    fn recognizes_date_like_text() {
        let day = DateRange::from_search_text("06/15/1985").unwrap();
        assert_eq!(day.start, date!(1985 - 06 - 15));
        assert_eq!(day.end_exclusive, date!(1985 - 06 - 16));

        let iso = DateRange::from_search_text("1992-03-22").unwrap();
        assert_eq!(iso.start, date!(1992 - 03 - 22));

        let year = DateRange::from_search_text("1985").unwrap();
        assert_eq!(year.start, date!(1985 - 01 - 01));
        assert_eq!(year.end_exclusive, date!(1986 - 01 - 01));

        assert!(DateRange::from_search_text("13/40/1985").is_none());
        assert!(DateRange::from_search_text("Sarah").is_none());
    }

    #[test]
    fn empty_search_matches_everyone() {
        let query = PatientQuery::parse(Some("   "), None).unwrap();
        assert_eq!(query.text, None);
        assert!(query.matches(&patient("Anyone", date!(2000 - 01 - 01), None, None)));
    }

    #[test]
    fn all_fields_search_is_case_insensitive() {
        let sarah = patient(
            "Sarah Johnson",
            date!(1985 - 06 - 15),
            Some("sarah.j@example.com"),
            Some("(555) 012-3456"),
        );

        for text in ["sarah", "JOHNSON", "example.com", "012-34", "1985", "06/15/1985"] {
            let query = PatientQuery::parse(Some(text), None).unwrap();
            assert!(query.matches(&sarah), "{text}");
        }

        let query = PatientQuery::parse(Some("michael"), None).unwrap();
        assert!(!query.matches(&sarah));
    }

    #[test]
    fn field_restricts_the_match() {
        let sarah = patient(
            "Sarah Johnson",
            date!(1985 - 06 - 15),
            Some("sarah.j@example.com"),
            None,
        );

        let by_email = PatientQuery::parse(Some("sarah"), Some("email")).unwrap();
        assert!(by_email.matches(&sarah));

        let by_phone = PatientQuery::parse(Some("sarah"), Some("phone")).unwrap();
        assert!(!by_phone.matches(&sarah));

        let by_dob = PatientQuery::parse(Some("1985"), Some("birthdate")).unwrap();
        assert!(by_dob.matches(&sarah));

        let by_dob_text = PatientQuery::parse(Some("Sarah"), Some("birthdate")).unwrap();
        assert!(!by_dob_text.matches(&sarah));
    }

    #[test]
    fn unknown_field_is_an_error() {
        assert!(matches!(
            PatientQuery::parse(Some("x"), Some("address")),
            Err(CoreError::InvalidSearchField(_))
        ));
    }
}
