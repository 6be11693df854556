use anyhow::Result;
use labdesk_core::LabTest;
use serde_json::{Map, Value, json};

use crate::cli::{TestCreateArgs, TestUpdateArgs};
use crate::client::LabDeskClient;
use crate::output::{print_lab_test, print_lab_tests, print_success};

fn create_body(args: &TestCreateArgs) -> Value {
    json!({
        "code": args.code,
        "name": args.name,
        "priceCents": args.price_cents,
        "turnaroundDays": args.turnaround_days,
        "isActive": !args.inactive,
    })
}

fn update_body(args: &TestUpdateArgs) -> Result<Value> {
    let mut body = Map::new();
    if let Some(code) = &args.code {
        body.insert("code".into(), json!(code));
    }
    if let Some(name) = &args.name {
        body.insert("name".into(), json!(name));
    }
    if let Some(price) = args.price_cents {
        body.insert("priceCents".into(), json!(price));
    }
    if let Some(days) = args.turnaround_days {
        body.insert("turnaroundDays".into(), json!(days));
    }
    if body.is_empty() {
        anyhow::bail!(
            "Nothing to update. Pass at least one of --code, --name, --price-cents, \
             --turnaround-days"
        );
    }
    Ok(Value::Object(body))
}

pub async fn list(client: &LabDeskClient, active_only: bool, table: bool) -> Result<()> {
    let query = if active_only {
        vec![("activeOnly", "true".to_string())]
    } else {
        Vec::new()
    };
    let tests: Vec<LabTest> = client.get("tests", &query).await?;
    print_lab_tests(&tests, table)
}

pub async fn create(client: &LabDeskClient, args: &TestCreateArgs, table: bool) -> Result<()> {
    let test: LabTest = client.post("tests", &create_body(args)).await?;
    print_success(&format!("Added {} to the catalog", test.code));
    print_lab_test(&test, table)
}

pub async fn update(client: &LabDeskClient, args: &TestUpdateArgs, table: bool) -> Result<()> {
    let test: LabTest = client
        .patch(&format!("tests/{}", args.id), &update_body(args)?)
        .await?;
    print_success(&format!("Updated {}", test.code));
    print_lab_test(&test, table)
}

pub async fn set_active(client: &LabDeskClient, id: &str, active: bool, table: bool) -> Result<()> {
    let test: LabTest = client
        .patch(&format!("tests/{id}"), &json!({ "isActive": active }))
        .await?;
    let verb = if active { "Activated" } else { "Deactivated" };
    print_success(&format!("{verb} {}", test.code));
    print_lab_test(&test, table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_maps_inactive_flag() {
        let body = create_body(&TestCreateArgs {
            code: "CBC".into(),
            name: "Complete Blood Count".into(),
            price_cents: 4500,
            turnaround_days: 2,
            inactive: true,
        });
        assert_eq!(body["isActive"], json!(false));
        assert_eq!(body["priceCents"], json!(4500));
    }

    #[test]
    fn update_body_needs_a_field() {
        let mut args = TestUpdateArgs {
            id: "t1".into(),
            code: None,
            name: None,
            price_cents: None,
            turnaround_days: None,
        };
        assert!(update_body(&args).is_err());

        args.price_cents = Some(5000);
        assert_eq!(update_body(&args).unwrap(), json!({"priceCents": 5000}));
    }
}
