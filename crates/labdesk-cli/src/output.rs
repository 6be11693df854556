use anyhow::Result;
use colored::{ColoredString, Colorize};
use labdesk_core::{LabTest, OrderDetail, OrderStatus, Patient, format_date, format_money};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn status_label(status: OrderStatus) -> ColoredString {
    let text = status.as_str();
    match status {
        OrderStatus::Draft => text.dimmed(),
        OrderStatus::Submitted => text.blue(),
        OrderStatus::InProgress => text.yellow(),
        OrderStatus::Ready => text.green(),
        OrderStatus::Cancelled => text.red(),
    }
}

fn render(builder: Builder) -> String {
    builder.build().with(Style::rounded()).to_string()
}

pub fn patients_table(patients: &[Patient]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "DOB", "Email", "Phone"]);
    for p in patients {
        builder.push_record([
            p.id.clone(),
            p.full_name.clone(),
            format_date(p.dob),
            p.email.clone().unwrap_or_else(|| "-".into()),
            p.phone.clone().unwrap_or_else(|| "-".into()),
        ]);
    }
    render(builder)
}

pub fn lab_tests_table(tests: &[LabTest]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["ID", "Code", "Name", "Price", "Turnaround", "Active"]);
    for t in tests {
        builder.push_record([
            t.id.clone(),
            t.code.clone(),
            t.name.clone(),
            format_money(t.price_cents),
            format!("{} d", t.turnaround_days),
            if t.is_active { "yes" } else { "no" }.to_string(),
        ]);
    }
    render(builder)
}

pub fn orders_table(orders: &[OrderDetail]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["ID", "Patient", "Status", "Items", "Total", "Placed", "Ready by"]);
    for o in orders {
        builder.push_record([
            o.order.id.clone(),
            o.patient.full_name.clone(),
            status_label(o.order.status).to_string(),
            o.items.len().to_string(),
            format_money(o.order.total_cents),
            format_date(o.order.placed_at.date()),
            format_date(o.order.estimated_ready_at.date()),
        ]);
    }
    render(builder)
}

pub fn order_items_table(order: &OrderDetail) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Code", "Test", "Price", "Turnaround"]);
    for item in &order.items {
        builder.push_record([
            item.lab_test.code.clone(),
            item.lab_test.name.clone(),
            format_money(item.item.unit_price_cents),
            format!("{} d", item.item.turnaround_days_at_order),
        ]);
    }
    render(builder)
}

pub fn print_patients(patients: &[Patient], table: bool) -> Result<()> {
    if !table {
        return print_json(&patients);
    }
    if patients.is_empty() {
        println!("No patients found.");
    } else {
        println!("{}", patients_table(patients));
    }
    Ok(())
}

pub fn print_patient(patient: &Patient, table: bool) -> Result<()> {
    if !table {
        return print_json(patient);
    }
    println!("{}", patients_table(std::slice::from_ref(patient)));
    Ok(())
}

pub fn print_lab_tests(tests: &[LabTest], table: bool) -> Result<()> {
    if !table {
        return print_json(&tests);
    }
    if tests.is_empty() {
        println!("No lab tests found.");
    } else {
        println!("{}", lab_tests_table(tests));
    }
    Ok(())
}

pub fn print_lab_test(test: &LabTest, table: bool) -> Result<()> {
    if !table {
        return print_json(test);
    }
    println!("{}", lab_tests_table(std::slice::from_ref(test)));
    Ok(())
}

pub fn print_orders(orders: &[OrderDetail], table: bool) -> Result<()> {
    if !table {
        return print_json(&orders);
    }
    if orders.is_empty() {
        println!("No orders found.");
    } else {
        println!("{}", orders_table(orders));
        println!("Total: {}", orders.len());
    }
    Ok(())
}

pub fn print_order(order: &OrderDetail, table: bool) -> Result<()> {
    if !table {
        return print_json(order);
    }
    let o = &order.order;
    println!("{}: {}", "Order".cyan(), o.id);
    println!("{}: {} ({})", "Patient".cyan(), order.patient.full_name, order.patient.id);
    println!("{}: {}", "Status".cyan(), status_label(o.status));
    println!("{}: {}", "Placed".cyan(), format_date(o.placed_at.date()));
    println!("{}: {}", "Ready by".cyan(), format_date(o.estimated_ready_at.date()));
    println!("{}", order_items_table(order));
    println!("{}: {}", "Total".cyan(), format_money(o.total_cents));
    Ok(())
}
