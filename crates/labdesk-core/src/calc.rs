//! Order pricing and turnaround.

use time::{Duration, OffsetDateTime};

/// A line item carrying the price and turnaround quoted at order time.
pub trait Quoted {
    fn unit_price_cents(&self) -> i64;
    fn turnaround_days(&self) -> i32;
}

/// Sum of the items' unit prices. Empty input yields 0.
pub fn calc_total<Q: Quoted>(items: &[Q]) -> i64 {
    items.iter().map(Quoted::unit_price_cents).sum()
}

/// `placed_at` plus the longest turnaround among the items.
///
/// Empty input returns `placed_at` unchanged.
pub fn calc_eta<Q: Quoted>(placed_at: OffsetDateTime, items: &[Q]) -> OffsetDateTime {
    match items.iter().map(Quoted::turnaround_days).max() {
        Some(days) => placed_at + Duration::days(i64::from(days)),
        None => placed_at,
    }
}

/// Renders cents as US dollars, e.g. `999999` -> `$9,999.99`.
pub fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let dollars = (abs / 100).to_string();
    let remainder = abs % 100;

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}${grouped}.{remainder:02}")
}
