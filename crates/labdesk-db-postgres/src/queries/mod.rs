//! SQL query implementations, one module per table family.

pub mod lab_tests;
pub mod orders;
pub mod patients;

/// Builds an `ILIKE ... ESCAPE '\'` pattern matching `text` as a substring.
pub fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
