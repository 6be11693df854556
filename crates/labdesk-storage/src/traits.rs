//! The storage trait every LabDesk backend implements.

use async_trait::async_trait;
use labdesk_core::{
    LabTest, LabTestPatch, NewLabTest, NewOrder, NewPatient, OrderDetail, OrderStatus, Patient,
    PatientPatch, PatientQuery,
};

use crate::error::StorageError;
use crate::types::{LabTestFilter, OrderFilter};

/// Persistence for patients, the lab-test catalog and orders.
///
/// Implementations must be thread-safe (`Send + Sync`). Lookups by id return
/// `Ok(None)` for missing records; mutations of missing records return
/// [`StorageError::NotFound`].
#[async_trait]
pub trait LabStorage: Send + Sync {
    // ==================== Patients ====================

    /// Lists patients matching `query`, newest first.
    async fn list_patients(&self, query: &PatientQuery) -> Result<Vec<Patient>, StorageError>;

    async fn get_patient(&self, id: &str) -> Result<Option<Patient>, StorageError>;

    async fn create_patient(&self, patient: &NewPatient) -> Result<Patient, StorageError>;

    async fn update_patient(
        &self,
        id: &str,
        patch: &PatientPatch,
    ) -> Result<Patient, StorageError>;

    // ==================== Lab tests ====================

    /// Lists catalog entries ordered by code.
    async fn list_lab_tests(&self, filter: &LabTestFilter) -> Result<Vec<LabTest>, StorageError>;

    async fn get_lab_test(&self, id: &str) -> Result<Option<LabTest>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the code is taken.
    async fn create_lab_test(&self, test: &NewLabTest) -> Result<LabTest, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown id and
    /// `StorageError::AlreadyExists` if the new code is taken.
    async fn update_lab_test(
        &self,
        id: &str,
        patch: &LabTestPatch,
    ) -> Result<LabTest, StorageError>;

    // ==================== Orders ====================

    /// Lists order details matching `filter`, most recently placed first.
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderDetail>, StorageError>;

    async fn get_order(&self, id: &str) -> Result<Option<OrderDetail>, StorageError>;

    /// Persists the order and its items atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidReference` if the patient or a lab test
    /// does not exist.
    async fn create_order(&self, order: &NewOrder) -> Result<OrderDetail, StorageError>;

    /// Moves an order to `target` if its status is still `expected`.
    ///
    /// The caller validates the transition; this only guards against a
    /// concurrent change between that check and the write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown id and
    /// `StorageError::VersionConflict` if the stored status is not `expected`.
    async fn update_order_status(
        &self,
        id: &str,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> Result<OrderDetail, StorageError>;

    // ==================== Metadata ====================

    /// Short backend name for logs, e.g. `postgres`.
    fn backend_name(&self) -> &'static str;

    /// Checks that the backend can serve requests.
    async fn ping(&self) -> Result<(), StorageError>;
}
