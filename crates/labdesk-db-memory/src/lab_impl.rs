//! Implementation of the LabStorage trait for InMemoryStorage.

use std::cmp::Reverse;

use async_trait::async_trait;
use labdesk_core::{
    LabTest, LabTestPatch, NewLabTest, NewOrder, NewPatient, Order, OrderDetail, OrderItem,
    OrderStatus, Patient, PatientPatch, PatientQuery, generate_id, now_utc,
};
use labdesk_storage::{LabStorage, LabTestFilter, OrderFilter, StorageError};
use tracing::debug;

use crate::storage::{InMemoryStorage, Row};

#[async_trait]
impl LabStorage for InMemoryStorage {
    async fn list_patients(&self, query: &PatientQuery) -> Result<Vec<Patient>, StorageError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&Row<Patient>> = tables
            .patients
            .values()
            .filter(|row| query.matches(&row.value))
            .collect();
        rows.sort_by_key(|row| Reverse((row.value.created_at, row.seq)));
        Ok(rows.into_iter().map(|row| row.value.clone()).collect())
    }

    async fn get_patient(&self, id: &str) -> Result<Option<Patient>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.patients.get(id).map(|row| row.value.clone()))
    }

    async fn create_patient(&self, patient: &NewPatient) -> Result<Patient, StorageError> {
        let now = now_utc();
        let created = Patient {
            id: generate_id(),
            full_name: patient.full_name.clone(),
            dob: patient.dob,
            email: patient.email.clone(),
            phone: patient.phone.clone(),
            created_at: now,
            updated_at: now,
        };

        let row = Row {
            seq: self.next_seq(),
            value: created.clone(),
        };
        self.tables
            .write()
            .await
            .patients
            .insert(created.id.clone(), row);

        debug!(patient_id = %created.id, "Patient created");
        Ok(created)
    }

    async fn update_patient(
        &self,
        id: &str,
        patch: &PatientPatch,
    ) -> Result<Patient, StorageError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .patients
            .get_mut(id)
            .ok_or_else(|| StorageError::not_found("Patient", id))?;
        patch.apply(&mut row.value, now_utc());
        Ok(row.value.clone())
    }

    async fn list_lab_tests(&self, filter: &LabTestFilter) -> Result<Vec<LabTest>, StorageError> {
        let tables = self.tables.read().await;
        let mut tests: Vec<LabTest> = tables
            .lab_tests
            .values()
            .filter(|row| !filter.active_only || row.value.is_active)
            .map(|row| row.value.clone())
            .collect();
        tests.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(tests)
    }

    async fn get_lab_test(&self, id: &str) -> Result<Option<LabTest>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.lab_tests.get(id).map(|row| row.value.clone()))
    }

    async fn create_lab_test(&self, test: &NewLabTest) -> Result<LabTest, StorageError> {
        let mut tables = self.tables.write().await;
        if tables.code_taken(&test.code, None) {
            return Err(StorageError::already_exists("LabTest", "code", &test.code));
        }

        let now = now_utc();
        let created = LabTest {
            id: generate_id(),
            code: test.code.clone(),
            name: test.name.clone(),
            price_cents: test.price_cents,
            turnaround_days: test.turnaround_days,
            is_active: test.is_active,
            created_at: now,
            updated_at: now,
        };
        tables.lab_tests.insert(
            created.id.clone(),
            Row {
                seq: self.next_seq(),
                value: created.clone(),
            },
        );

        debug!(lab_test_id = %created.id, code = %created.code, "Lab test created");
        Ok(created)
    }

    async fn update_lab_test(
        &self,
        id: &str,
        patch: &LabTestPatch,
    ) -> Result<LabTest, StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.lab_tests.contains_key(id) {
            return Err(StorageError::not_found("LabTest", id));
        }
        if let Some(code) = &patch.code
            && tables.code_taken(code, Some(id))
        {
            return Err(StorageError::already_exists("LabTest", "code", code));
        }

        let row = tables
            .lab_tests
            .get_mut(id)
            .ok_or_else(|| StorageError::not_found("LabTest", id))?;
        patch.apply(&mut row.value, now_utc());
        Ok(row.value.clone())
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderDetail>, StorageError> {
        let tables = self.tables.read().await;
        let needle = filter.patient_name_needle();

        let mut rows: Vec<&Row<Order>> = tables
            .orders
            .values()
            .filter(|row| filter.status.is_none_or(|s| row.value.status == s))
            .filter(|row| {
                filter
                    .patient_id
                    .as_deref()
                    .is_none_or(|id| row.value.patient_id == id)
            })
            .filter(|row| match &needle {
                None => true,
                Some(needle) => tables
                    .patients
                    .get(&row.value.patient_id)
                    .is_some_and(|p| p.value.full_name.to_lowercase().contains(needle)),
            })
            .collect();
        rows.sort_by_key(|row| Reverse((row.value.placed_at, row.seq)));

        rows.into_iter()
            .map(|row| tables.order_detail(&row.value))
            .collect()
    }

    async fn get_order(&self, id: &str) -> Result<Option<OrderDetail>, StorageError> {
        let tables = self.tables.read().await;
        match tables.orders.get(id) {
            Some(row) => tables.order_detail(&row.value).map(Some),
            None => Ok(None),
        }
    }

    async fn create_order(&self, order: &NewOrder) -> Result<OrderDetail, StorageError> {
        let mut tables = self.tables.write().await;

        if !tables.patients.contains_key(&order.patient_id) {
            return Err(StorageError::invalid_reference(format!(
                "patient {} does not exist",
                order.patient_id
            )));
        }
        if let Some(missing) = order
            .items
            .iter()
            .find(|item| !tables.lab_tests.contains_key(&item.lab_test_id))
        {
            return Err(StorageError::invalid_reference(format!(
                "lab test {} does not exist",
                missing.lab_test_id
            )));
        }

        let now = now_utc();
        let stored = Order {
            id: generate_id(),
            patient_id: order.patient_id.clone(),
            status: order.status,
            total_cents: order.total_cents,
            placed_at: order.placed_at,
            estimated_ready_at: order.estimated_ready_at,
            created_at: now,
            updated_at: now,
        };
        let items: Vec<OrderItem> = order
            .items
            .iter()
            .map(|item| OrderItem {
                id: generate_id(),
                order_id: stored.id.clone(),
                lab_test_id: item.lab_test_id.clone(),
                unit_price_cents: item.unit_price_cents,
                turnaround_days_at_order: item.turnaround_days_at_order,
            })
            .collect();

        tables.order_items.insert(stored.id.clone(), items);
        tables.orders.insert(
            stored.id.clone(),
            Row {
                seq: self.next_seq(),
                value: stored.clone(),
            },
        );

        debug!(order_id = %stored.id, items = order.items.len(), "Order created");
        tables.order_detail(&stored)
    }

    async fn update_order_status(
        &self,
        id: &str,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> Result<OrderDetail, StorageError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .orders
            .get_mut(id)
            .ok_or_else(|| StorageError::not_found("Order", id))?;

        if row.value.status != expected {
            return Err(StorageError::version_conflict(
                expected.as_str(),
                row.value.status.as_str(),
            ));
        }
        row.value.status = target;
        row.value.updated_at = now_utc();
        let order = row.value.clone();

        tables.order_detail(&order)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labdesk_core::NewOrderItem;
    use time::macros::{date, datetime};

    fn as_lab_storage(storage: &InMemoryStorage) -> &dyn LabStorage {
        storage
    }

    fn new_patient(name: &str) -> NewPatient {
        NewPatient {
            full_name: name.into(),
            dob: date!(1985 - 06 - 15),
            email: None,
            phone: None,
        }
    }

    fn new_test(code: &str, price_cents: i64, turnaround_days: i32) -> NewLabTest {
        NewLabTest {
            code: code.into(),
            name: format!("{code} panel"),
            price_cents,
            turnaround_days,
            is_active: true,
        }
    }

    async fn seed_order(storage: &dyn LabStorage, patient: &Patient) -> OrderDetail {
        let cbc = storage.create_lab_test(&new_test("CBC", 4500, 2)).await.unwrap();
        let items = vec![NewOrderItem {
            lab_test_id: cbc.id.clone(),
            unit_price_cents: cbc.price_cents,
            turnaround_days_at_order: cbc.turnaround_days,
        }];
        let order = NewOrder::draft(&patient.id, items, datetime!(2024-01-01 0:00 UTC));
        storage.create_order(&order).await.unwrap()
    }

    #[tokio::test]
    async fn test_patient_create_list_update() {
        let storage = InMemoryStorage::new();
        let store = as_lab_storage(&storage);

        let sarah = store.create_patient(&new_patient("Sarah Johnson")).await.unwrap();
        let michael = store.create_patient(&new_patient("Michael Chen")).await.unwrap();

        let all = store.list_patients(&PatientQuery::default()).await.unwrap();
        let names: Vec<_> = all.iter().map(|p| p.full_name.as_str()).collect();
        assert_eq!(names, vec!["Michael Chen", "Sarah Johnson"]);

        let query = PatientQuery::parse(Some("sarah"), Some("name")).unwrap();
        let found = store.list_patients(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, sarah.id);

        let patch = PatientPatch {
            email: Some(Some("mchen@example.com".into())),
            ..Default::default()
        };
        let updated = store.update_patient(&michael.id, &patch).await.unwrap();
        assert_eq!(updated.email.as_deref(), Some("mchen@example.com"));
        assert!(updated.updated_at >= michael.updated_at);

        let err = store.update_patient("missing", &patch).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_lab_test_codes_are_unique() {
        let storage = InMemoryStorage::new();
        let store = as_lab_storage(&storage);

        let tsh = store.create_lab_test(&new_test("TSH", 5500, 4)).await.unwrap();
        store.create_lab_test(&new_test("CBC", 4500, 2)).await.unwrap();

        let err = store
            .create_lab_test(&new_test("TSH", 100, 1))
            .await
            .unwrap_err();
        assert!(err.is_already_exists());

        let rename = LabTestPatch {
            code: Some("CBC".into()),
            ..Default::default()
        };
        let err = store.update_lab_test(&tsh.id, &rename).await.unwrap_err();
        assert!(err.is_already_exists());

        let codes: Vec<_> = store
            .list_lab_tests(&LabTestFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.code)
            .collect();
        assert_eq!(codes, vec!["CBC", "TSH"]);
    }

    #[tokio::test]
    async fn test_active_only_filter() {
        let storage = InMemoryStorage::new();
        let store = as_lab_storage(&storage);

        let lipid = store.create_lab_test(&new_test("LIPID", 6500, 3)).await.unwrap();
        store.create_lab_test(&new_test("CBC", 4500, 2)).await.unwrap();
        let deactivate = LabTestPatch {
            is_active: Some(false),
            ..Default::default()
        };
        store.update_lab_test(&lipid.id, &deactivate).await.unwrap();

        let active = store
            .list_lab_tests(&LabTestFilter::active_only())
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].code, "CBC");
    }

    #[tokio::test]
    async fn test_order_snapshot_survives_catalog_change() {
        let storage = InMemoryStorage::new();
        let store = as_lab_storage(&storage);

        let patient = store.create_patient(&new_patient("Sarah Johnson")).await.unwrap();
        let created = seed_order(store, &patient).await;
        assert_eq!(created.order.total_cents, 4500);
        assert_eq!(created.order.status, OrderStatus::Draft);
        assert_eq!(created.patient.id, patient.id);

        let test_id = created.items[0].lab_test.id.clone();
        let reprice = LabTestPatch {
            price_cents: Some(9900),
            ..Default::default()
        };
        store.update_lab_test(&test_id, &reprice).await.unwrap();

        let reloaded = store.get_order(&created.order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.items[0].item.unit_price_cents, 4500);
        assert_eq!(reloaded.items[0].lab_test.price_cents, 9900);
        assert_eq!(reloaded.order.total_cents, 4500);
    }

    #[tokio::test]
    async fn test_order_requires_existing_references() {
        let storage = InMemoryStorage::new();
        let store = as_lab_storage(&storage);
        let patient = store.create_patient(&new_patient("Sarah Johnson")).await.unwrap();

        let item = NewOrderItem {
            lab_test_id: "ghost".into(),
            unit_price_cents: 100,
            turnaround_days_at_order: 1,
        };
        let order = NewOrder::draft(&patient.id, vec![item], now_utc());
        let err = store.create_order(&order).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidReference { .. }));
        assert_eq!(storage.counts().await, (1, 0, 0));
    }

    #[tokio::test]
    async fn test_status_compare_and_set() {
        let storage = InMemoryStorage::new();
        let store = as_lab_storage(&storage);
        let patient = store.create_patient(&new_patient("Sarah Johnson")).await.unwrap();
        let order = seed_order(store, &patient).await;
        let id = order.order.id.as_str();

        let submitted = store
            .update_order_status(id, OrderStatus::Draft, OrderStatus::Submitted)
            .await
            .unwrap();
        assert_eq!(submitted.order.status, OrderStatus::Submitted);

        let err = store
            .update_order_status(id, OrderStatus::Draft, OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(err.is_version_conflict());

        let unchanged = store.get_order(id).await.unwrap().unwrap();
        assert_eq!(unchanged.order.status, OrderStatus::Submitted);

        let err = store
            .update_order_status("missing", OrderStatus::Draft, OrderStatus::Submitted)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_order_filters() {
        let storage = InMemoryStorage::new();
        let store = as_lab_storage(&storage);
        let sarah = store.create_patient(&new_patient("Sarah Johnson")).await.unwrap();
        let michael = store.create_patient(&new_patient("Michael Chen")).await.unwrap();

        let cbc = store.create_lab_test(&new_test("CBC", 4500, 2)).await.unwrap();
        let item = || NewOrderItem {
            lab_test_id: cbc.id.clone(),
            unit_price_cents: 4500,
            turnaround_days_at_order: 2,
        };
        let first = store
            .create_order(&NewOrder::draft(
                &sarah.id,
                vec![item()],
                datetime!(2024-01-01 0:00 UTC),
            ))
            .await
            .unwrap();
        let second = store
            .create_order(&NewOrder::draft(
                &michael.id,
                vec![item()],
                datetime!(2024-02-01 0:00 UTC),
            ))
            .await
            .unwrap();
        store
            .update_order_status(
                &first.order.id,
                OrderStatus::Draft,
                OrderStatus::Cancelled,
            )
            .await
            .unwrap();

        let all = store.list_orders(&OrderFilter::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|o| o.order.id.clone()).collect();
        assert_eq!(ids, vec![second.order.id.clone(), first.order.id.clone()]);

        let cancelled = store
            .list_orders(&OrderFilter::default().with_status(OrderStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].order.id, first.order.id);

        let by_name = store
            .list_orders(&OrderFilter::default().with_patient_name("CHEN"))
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].patient.id, michael.id);

        let by_patient = store
            .list_orders(&OrderFilter::default().with_patient_id(&sarah.id))
            .await
            .unwrap();
        assert_eq!(by_patient.len(), 1);
    }
}
