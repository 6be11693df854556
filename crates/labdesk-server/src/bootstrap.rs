//! Demo data loaded on first startup.
//!
//! Seeding runs only while the lab-test catalog is empty, so restarting a
//! seeded server is a no-op.

use labdesk_core::{NewLabTest, NewPatient};
use labdesk_storage::{LabStorage, LabTestFilter, StorageError};
use time::macros::date;
use tracing::info;

fn demo_patients() -> Vec<NewPatient> {
    vec![
        NewPatient {
            full_name: "Sarah Johnson".into(),
            dob: date!(1985 - 06 - 15),
            email: Some("sarah.j@example.com".into()),
            phone: Some("(555) 555-0123".into()),
        },
        NewPatient {
            full_name: "Michael Chen".into(),
            dob: date!(1992 - 03 - 22),
            email: Some("mchen@example.com".into()),
            phone: Some("(555) 555-0456".into()),
        },
    ]
}

fn demo_lab_tests() -> Vec<NewLabTest> {
    [
        ("CBC", "Complete Blood Count", 4500, 2),
        ("LIPID", "Lipid Panel", 6500, 3),
        ("TSH", "Thyroid Stimulating Hormone", 5500, 4),
    ]
    .into_iter()
    .map(|(code, name, price_cents, turnaround_days)| NewLabTest {
        code: code.into(),
        name: name.into(),
        price_cents,
        turnaround_days,
        is_active: true,
    })
    .collect()
}

/// Returns whether anything was inserted.
pub async fn seed_demo_data(storage: &dyn LabStorage) -> Result<bool, StorageError> {
    let existing = storage.list_lab_tests(&LabTestFilter::default()).await?;
    if !existing.is_empty() {
        info!(lab_tests = existing.len(), "Catalog not empty, skipping demo data");
        return Ok(false);
    }

    for patient in demo_patients() {
        storage.create_patient(&patient).await?;
    }
    for test in demo_lab_tests() {
        storage.create_lab_test(&test).await?;
    }
    info!("Demo data seeded");
    Ok(true)
}
