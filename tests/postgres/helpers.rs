//! Shared test helpers for `PostgreSQL` integration tests.

use accountsync::provisioning::adapters::postgres::PostgresTaskRepository;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use uuid::Uuid;

/// Boxed error type for test setup.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Environment variable naming the test server.
pub const DATABASE_URL_ENV: &str = "ACCOUNTSYNC_TEST_DATABASE_URL";

/// SQL creating the provisioning tables.
pub const CREATE_PROVISIONING_TABLES_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_provisioning_tables/up.sql");

#[derive(Debug)]
struct SearchPath(String);

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for SearchPath {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!("SET search_path TO {}", self.0))
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// A migrated schema that is dropped when the value goes out of scope.
pub struct TestSchema {
    url: String,
    name: String,
    /// Repository bound to the schema.
    pub repo: PostgresTaskRepository,
}

impl TestSchema {
    /// Creates and migrates a fresh schema, or returns `None` when no test
    /// server is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or migration fails.
    pub fn create() -> Result<Option<Self>, BoxError> {
        let Ok(url) = std::env::var(DATABASE_URL_ENV) else {
            return Ok(None);
        };
        let name = format!("accountsync_test_{}", Uuid::new_v4().simple());

        let mut conn = PgConnection::establish(&url)?;
        conn.batch_execute(&format!(
            "CREATE SCHEMA {name}; SET search_path TO {name}; {CREATE_PROVISIONING_TABLES_SQL}"
        ))?;

        let pool = Pool::builder()
            .max_size(2)
            .connection_customizer(Box::new(SearchPath(name.clone())))
            .build(ConnectionManager::<PgConnection>::new(url.as_str()))?;
        Ok(Some(Self {
            url,
            name,
            repo: PostgresTaskRepository::new(pool),
        }))
    }
}

impl Drop for TestSchema {
    fn drop(&mut self) {
        if let Ok(mut conn) = PgConnection::establish(&self.url) {
            conn.batch_execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.name))
                .ok();
        }
    }
}
