use anyhow::Result;
use labdesk_core::{Patient, format_phone_number, is_valid_phone_number};
use serde_json::{Map, Value, json};

use crate::cli::{PatientCreateArgs, PatientListArgs, PatientUpdateArgs};
use crate::client::LabDeskClient;
use crate::output::{print_patient, print_patients, print_success};

/// Formats phone input as `(XXX) XXX-XXXX`, rejecting anything that is not
/// exactly ten digits. Empty input means "no phone".
fn normalize_phone(raw: &str) -> Result<Option<String>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let formatted = format_phone_number(raw);
    if !is_valid_phone_number(&formatted) {
        anyhow::bail!("Invalid phone number '{raw}', expected 10 digits such as (555) 555-0123");
    }
    Ok(Some(formatted))
}

fn optional_phone(raw: &Option<String>) -> Result<Option<String>> {
    Ok(raw.as_deref().map(normalize_phone).transpose()?.flatten())
}

fn create_body(args: &PatientCreateArgs) -> Result<Value> {
    let mut body = Map::new();
    body.insert("fullName".into(), json!(args.name));
    body.insert("dob".into(), json!(args.dob));
    if let Some(email) = &args.email {
        body.insert("email".into(), json!(email));
    }
    if let Some(phone) = optional_phone(&args.phone)? {
        body.insert("phone".into(), json!(phone));
    }
    Ok(Value::Object(body))
}

fn update_body(args: &PatientUpdateArgs) -> Result<Value> {
    let mut body = Map::new();
    body.insert("id".into(), json!(args.id));
    if let Some(name) = &args.name {
        body.insert("fullName".into(), json!(name));
    }
    if let Some(dob) = &args.dob {
        body.insert("dob".into(), json!(dob));
    }
    if args.clear_email {
        body.insert("email".into(), Value::Null);
    } else if let Some(email) = &args.email {
        body.insert("email".into(), json!(email));
    }
    if args.clear_phone {
        body.insert("phone".into(), Value::Null);
    } else if let Some(phone) = optional_phone(&args.phone)? {
        body.insert("phone".into(), json!(phone));
    }
    if body.len() == 1 {
        anyhow::bail!("Nothing to update. Pass at least one of --name, --dob, --email, --phone");
    }
    Ok(Value::Object(body))
}

pub async fn list(client: &LabDeskClient, args: &PatientListArgs, table: bool) -> Result<()> {
    let mut query = Vec::new();
    if let Some(search) = &args.search {
        query.push(("search", search.clone()));
    }
    if let Some(field) = args.field {
        query.push(("field", field.as_str().to_string()));
    }
    let patients: Vec<Patient> = client.get("patients", &query).await?;
    print_patients(&patients, table)
}

pub async fn show(client: &LabDeskClient, id: &str, table: bool) -> Result<()> {
    let patient: Patient = client.get(&format!("patients/{id}"), &[]).await?;
    print_patient(&patient, table)
}

pub async fn create(client: &LabDeskClient, args: &PatientCreateArgs, table: bool) -> Result<()> {
    let patient: Patient = client.post("patients", &create_body(args)?).await?;
    print_success(&format!("Registered patient {}", patient.id));
    print_patient(&patient, table)
}

pub async fn update(client: &LabDeskClient, args: &PatientUpdateArgs, table: bool) -> Result<()> {
    let patient: Patient = client.patch("patients", &update_body(args)?).await?;
    print_success(&format!("Updated patient {}", patient.id));
    print_patient(&patient, table)
}
