//! Catalog collaborator interface and provisioning.
//!
//! Mirrors the managed-catalog contract: create database/table, delete
//! table, with already-exists signaled distinctly so idempotent setup can
//! treat it as success.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pipeline_core::{Error, Result};

use crate::runner::QueryRunner;

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
}

impl Column {
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: "string".to_string(),
        }
    }
}

/// External table definition registered with the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    pub database: String,
    pub name: String,
    pub description: String,
    pub columns: Vec<Column>,
    pub partition_keys: Vec<Column>,
    /// Storage location the table reads from
    pub location: String,
    /// Data format, e.g. "json"
    pub format: String,
}

impl TableSpec {
    /// The parking events table: raw event columns plus the calendar
    /// partition keys.
    pub fn parking_events(database: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: "parking_events".to_string(),
            description: "Parking events data".to_string(),
            columns: vec![
                Column::string("spot_id"),
                Column::string("status"),
                Column::string("timestamp"),
            ],
            partition_keys: vec![
                Column::string("year"),
                Column::string("month"),
                Column::string("day"),
                Column::string("hour"),
            ],
            location: location.into(),
            format: "json".to_string(),
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }
}

/// Managed catalog service.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fails with [`Error::CatalogConflict`] if the database exists.
    async fn create_database(&self, name: &str, description: &str) -> Result<()>;

    /// Fails with [`Error::CatalogConflict`] if the table exists.
    async fn create_table(&self, spec: &TableSpec) -> Result<()>;

    /// Fails with [`Error::CatalogNotFound`] if the table is missing.
    async fn delete_table(&self, database: &str, table: &str) -> Result<()>;
}

/// Creates the database, absorbing already-exists as success.
pub async fn ensure_database(catalog: &dyn Catalog, name: &str, description: &str) -> Result<()> {
    match catalog.create_database(name, description).await {
        Ok(()) => {
            info!(database = %name, "Created database");
            Ok(())
        }
        Err(Error::CatalogConflict(_)) => {
            info!(database = %name, "Database already exists");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Creates the table, absorbing already-exists as success.
pub async fn ensure_table(catalog: &dyn Catalog, spec: &TableSpec) -> Result<()> {
    match catalog.create_table(spec).await {
        Ok(()) => {
            info!(table = %spec.qualified_name(), "Created table");
            Ok(())
        }
        Err(Error::CatalogConflict(_)) => {
            info!(table = %spec.qualified_name(), "Table already exists");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Loads newly written storage partitions into the table metadata.
///
/// Runs `MSCK REPAIR TABLE` through the runner's state machine; the result
/// carries no rows, only success or failure.
pub async fn repair_partitions(runner: &QueryRunner, database: &str, table: &str) -> Result<()> {
    let statement = format!("MSCK REPAIR TABLE {database}.{table}");
    let result = runner.submit_and_wait(&statement).await?;
    info!(
        table = %format!("{database}.{table}"),
        job_id = %result.job_id,
        "Partition repair completed"
    );
    Ok(())
}

/// Provisions the catalog from scratch: database, a fresh table, and a
/// partition repair pass.
pub async fn provision(catalog: &dyn Catalog, runner: &QueryRunner, spec: &TableSpec) -> Result<()> {
    ensure_database(
        catalog,
        &spec.database,
        "Database for parking monitoring analytics",
    )
    .await?;

    match catalog.delete_table(&spec.database, &spec.name).await {
        Ok(()) => info!(table = %spec.qualified_name(), "Deleted existing table"),
        Err(Error::CatalogNotFound(_)) => {
            info!(table = %spec.qualified_name(), "Table does not exist yet")
        }
        Err(e) => return Err(e),
    }

    catalog.create_table(spec).await?;
    info!(table = %spec.qualified_name(), "Created table");

    if let Err(e) = repair_partitions(runner, &spec.database, &spec.name).await {
        warn!(error = %e, "Partition repair failed during provisioning");
        return Err(e);
    }

    Ok(())
}
