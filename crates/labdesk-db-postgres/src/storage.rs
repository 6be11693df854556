//! PostgreSQL implementation of the LabStorage trait.

use async_trait::async_trait;
use labdesk_core::{
    LabTest, LabTestPatch, NewLabTest, NewOrder, NewPatient, OrderDetail, OrderStatus, Patient,
    PatientPatch, PatientQuery,
};
use labdesk_storage::{LabStorage, LabTestFilter, OrderFilter, StorageError};
use sqlx_postgres::PgPool;

use crate::config::PostgresConfig;
use crate::error::query_error;
use crate::migrations;
use crate::pool;
use crate::queries::{lab_tests, orders, patients};

/// PostgreSQL storage backend.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates the connection pool and, if configured, runs migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection pool cannot be created
    /// or if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, StorageError> {
        let pool = pool::create_pool(&config).await?;

        if config.run_migrations {
            migrations::run(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Wraps an existing pool. Migrations are not run.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LabStorage for PostgresStorage {
    async fn list_patients(&self, query: &PatientQuery) -> Result<Vec<Patient>, StorageError> {
        patients::list(&self.pool, query).await
    }

    async fn get_patient(&self, id: &str) -> Result<Option<Patient>, StorageError> {
        patients::get(&self.pool, id).await
    }

    async fn create_patient(&self, patient: &NewPatient) -> Result<Patient, StorageError> {
        patients::create(&self.pool, patient).await
    }

    async fn update_patient(
        &self,
        id: &str,
        patch: &PatientPatch,
    ) -> Result<Patient, StorageError> {
        patients::update(&self.pool, id, patch).await
    }

    async fn list_lab_tests(&self, filter: &LabTestFilter) -> Result<Vec<LabTest>, StorageError> {
        lab_tests::list(&self.pool, filter).await
    }

    async fn get_lab_test(&self, id: &str) -> Result<Option<LabTest>, StorageError> {
        lab_tests::get(&self.pool, id).await
    }

    async fn create_lab_test(&self, test: &NewLabTest) -> Result<LabTest, StorageError> {
        lab_tests::create(&self.pool, test).await
    }

    async fn update_lab_test(
        &self,
        id: &str,
        patch: &LabTestPatch,
    ) -> Result<LabTest, StorageError> {
        lab_tests::update(&self.pool, id, patch).await
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderDetail>, StorageError> {
        orders::list(&self.pool, filter).await
    }

    async fn get_order(&self, id: &str) -> Result<Option<OrderDetail>, StorageError> {
        orders::get(&self.pool, id).await
    }

    async fn create_order(&self, order: &NewOrder) -> Result<OrderDetail, StorageError> {
        orders::create(&self.pool, order).await
    }

    async fn update_order_status(
        &self,
        id: &str,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> Result<OrderDetail, StorageError> {
        orders::update_status(&self.pool, id, expected, target).await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx_core::query::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("Database ping failed", e))?;
        Ok(())
    }
}
