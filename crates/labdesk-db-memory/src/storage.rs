//! Table layout of the in-memory backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use labdesk_core::{LabTest, Order, OrderDetail, OrderItem, OrderItemDetail, Patient};
use labdesk_storage::StorageError;
use tokio::sync::RwLock;

/// A stored record plus its insertion sequence, used to break timestamp ties
/// when ordering listings.
#[derive(Debug, Clone)]
pub(crate) struct Row<T> {
    pub seq: u64,
    pub value: T,
}

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub patients: HashMap<String, Row<Patient>>,
    pub lab_tests: HashMap<String, Row<LabTest>>,
    pub orders: HashMap<String, Row<Order>>,
    /// Items keyed by order id, in insertion order.
    pub order_items: HashMap<String, Vec<OrderItem>>,
}

impl Tables {
    pub fn code_taken(&self, code: &str, except_id: Option<&str>) -> bool {
        self.lab_tests
            .values()
            .any(|row| row.value.code == code && Some(row.value.id.as_str()) != except_id)
    }

    /// Assembles the detail view of a stored order.
    pub fn order_detail(&self, order: &Order) -> Result<OrderDetail, StorageError> {
        let patient = self
            .patients
            .get(&order.patient_id)
            .map(|row| row.value.clone())
            .ok_or_else(|| {
                StorageError::internal(format!(
                    "order {} references missing patient {}",
                    order.id, order.patient_id
                ))
            })?;

        let items = self
            .order_items
            .get(&order.id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|item| {
                let lab_test = self
                    .lab_tests
                    .get(&item.lab_test_id)
                    .map(|row| row.value.clone())
                    .ok_or_else(|| {
                        StorageError::internal(format!(
                            "order item {} references missing lab test {}",
                            item.id, item.lab_test_id
                        ))
                    })?;
                Ok(OrderItemDetail {
                    item: item.clone(),
                    lab_test,
                })
            })
            .collect::<Result<Vec<_>, StorageError>>()?;

        Ok(OrderDetail {
            order: order.clone(),
            patient,
            items,
        })
    }
}

/// In-memory implementation of [`labdesk_storage::LabStorage`].
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    pub(crate) tables: RwLock<Tables>,
    seq: AtomicU64,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of stored patients, lab tests and orders.
    #[cfg(test)]
    pub(crate) async fn counts(&self) -> (usize, usize, usize) {
        let tables = self.tables.read().await;
        (
            tables.patients.len(),
            tables.lab_tests.len(),
            tables.orders.len(),
        )
    }
}
