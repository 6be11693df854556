use anyhow::Result;
use labdesk_core::{OrderDetail, OrderStatus};
use serde_json::{Value, json};

use crate::cli::{OrderCreateArgs, OrderListArgs};
use crate::client::LabDeskClient;
use crate::output::{print_order, print_orders, print_success, status_label};

fn list_query(args: &OrderListArgs) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(status) = args.status {
        query.push(("status", status.as_str().to_string()));
    }
    if let Some(patient) = &args.patient {
        query.push(("patient", patient.clone()));
    }
    if let Some(q) = &args.query {
        query.push(("q", q.clone()));
    }
    query
}

fn create_body(args: &OrderCreateArgs) -> Value {
    let items: Vec<Value> = args
        .tests
        .iter()
        .map(|id| json!({ "labTestId": id }))
        .collect();
    json!({ "patientId": args.patient, "items": items })
}

pub async fn list(client: &LabDeskClient, args: &OrderListArgs, table: bool) -> Result<()> {
    let orders: Vec<OrderDetail> = client.get("orders", &list_query(args)).await?;
    print_orders(&orders, table)
}

pub async fn show(client: &LabDeskClient, id: &str, table: bool) -> Result<()> {
    let order: OrderDetail = client.get(&format!("orders/{id}"), &[]).await?;
    print_order(&order, table)
}

pub async fn create(client: &LabDeskClient, args: &OrderCreateArgs, table: bool) -> Result<()> {
    let order: OrderDetail = client.post("orders", &create_body(args)).await?;
    print_success(&format!(
        "Placed order {} for {}",
        order.order.id, order.patient.full_name
    ));
    print_order(&order, table)
}

pub async fn set_status(
    client: &LabDeskClient,
    id: &str,
    status: OrderStatus,
    table: bool,
) -> Result<()> {
    let order: OrderDetail = client
        .patch(&format!("orders/{id}"), &json!({ "status": status }))
        .await?;
    print_success(&format!("Order {} is now {}", order.order.id, status_label(order.order.status)));
    print_order(&order, table)
}
