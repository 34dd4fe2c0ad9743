//! Database gateway.
//!
//! [`SchemaGateway`] is everything the runner and schema commands need from
//! a database. [`SqlxGateway`] implements it with sqlx for MySQL,
//! PostgreSQL and SQLite.

use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Column, Executor, Row as _, TypeInfo};
use std::collections::HashMap;

use crate::config::{Credentials, Driver};
use crate::error::{RinoError, RinoResult};

/// A result row as column name → JSON value.
pub type Row = HashMap<String, serde_json::Value>;

/// Operations rino performs against a database.
#[allow(async_fn_in_trait)]
pub trait SchemaGateway {
    /// Run arbitrary SQL. Statements that produce rows return them.
    async fn execute(&mut self, sql: &str) -> RinoResult<Vec<Row>>;

    /// Names of all tables, in the order the database reports them.
    async fn list_tables(&mut self) -> RinoResult<Vec<String>>;

    /// Enable or disable foreign-key enforcement for this session.
    async fn set_foreign_key_checks(&mut self, enabled: bool) -> RinoResult<()>;
}

/// sqlx-backed gateway.
#[derive(Clone)]
pub struct SqlxGateway {
    pool: AnyPool,
    driver: Driver,
}

impl SqlxGateway {
    /// Connect using the given credentials.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = RinoConfig::load(None)?;
    /// let mut db = SqlxGateway::connect(config.credentials()?.clone()).await?;
    /// ```
    pub async fn connect(credentials: Credentials) -> RinoResult<Self> {
        sqlx::any::install_default_drivers();

        let url = credentials.connection_url()?;
        tracing::debug!(driver = ?credentials.driver, host = %credentials.host, "connecting");

        // Session settings such as foreign_key_checks must apply to every
        // later statement, so all work goes through one connection.
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .map_err(|e| RinoError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            driver: credentials.driver,
        })
    }
}

impl SchemaGateway for SqlxGateway {
    async fn execute(&mut self, sql: &str) -> RinoResult<Vec<Row>> {
        tracing::debug!(sql, "executing");
        let rows = (&self.pool)
            .fetch_all(sql)
            .await
            .map_err(|e| RinoError::Database(e.to_string()))?;

        Ok(rows.iter().map(row_to_map).collect())
    }

    async fn list_tables(&mut self) -> RinoResult<Vec<String>> {
        let rows = (&self.pool)
            .fetch_all(list_tables_sql(self.driver))
            .await
            .map_err(|e| RinoError::Database(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>(0)
                    .map_err(|e| RinoError::Database(e.to_string()))
            })
            .collect()
    }

    async fn set_foreign_key_checks(&mut self, enabled: bool) -> RinoResult<()> {
        self.execute(foreign_key_checks_sql(self.driver, enabled))
            .await
            .map(|_| ())
    }
}

/// Statement listing the tables of the connected database.
pub fn list_tables_sql(driver: Driver) -> &'static str {
    match driver {
        Driver::Mysql => "show tables",
        Driver::Postgres => {
            "select tablename from pg_catalog.pg_tables where schemaname = current_schema()"
        }
        Driver::Sqlite => {
            "select name from sqlite_master where type = 'table' and name not like 'sqlite_%'"
        }
    }
}

/// Statement toggling foreign-key enforcement for the session.
pub fn foreign_key_checks_sql(driver: Driver, enabled: bool) -> &'static str {
    match (driver, enabled) {
        (Driver::Mysql, true) => "set foreign_key_checks = 1",
        (Driver::Mysql, false) => "set foreign_key_checks = 0",
        (Driver::Postgres, true) => "set session_replication_role = origin",
        (Driver::Postgres, false) => "set session_replication_role = replica",
        (Driver::Sqlite, true) => "pragma foreign_keys = on",
        (Driver::Sqlite, false) => "pragma foreign_keys = off",
    }
}

/// Integer, then float, then text; NULL when nothing decodes.
fn decode_untyped(row: &AnyRow, i: usize) -> serde_json::Value {
    if let Ok(v) = row.try_get::<i64, _>(i) {
        return serde_json::Value::Number(v.into());
    }
    if let Some(n) = row
        .try_get::<f64, _>(i)
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        return serde_json::Value::Number(n);
    }
    row.try_get::<String, _>(i)
        .map(serde_json::Value::String)
        .unwrap_or(serde_json::Value::Null)
}

/// Convert an AnyRow to a HashMap.
fn row_to_map(row: &AnyRow) -> Row {
    let mut map = HashMap::new();

    for (i, column) in row.columns().iter().enumerate() {
        let name = column.name().to_string();
        let type_name = column.type_info().name();

        let value: serde_json::Value = match type_name {
            "BOOL" | "BOOLEAN" => row
                .try_get::<bool, _>(i)
                .map(serde_json::Value::Bool)
                .unwrap_or(serde_json::Value::Null),
            "INT2" | "INT4" | "INT8" | "INTEGER" | "BIGINT" | "SMALLINT" => row
                .try_get::<i64, _>(i)
                .map(|v| serde_json::Value::Number(v.into()))
                .unwrap_or(serde_json::Value::Null),
            "FLOAT4" | "FLOAT8" | "REAL" | "DOUBLE" => row
                .try_get::<f64, _>(i)
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            // SQLite reports declared or NULL type names; take the value as it decodes.
            _ => decode_untyped(row, i),
        };

        map.insert(name, value);
    }

    map
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory gateway that records statements.

    use super::*;

    #[derive(Debug, Default)]
    pub struct RecordingGateway {
        pub tables: Vec<String>,
        pub executed: Vec<String>,
        /// Any statement containing this text fails.
        pub fail_on: Option<String>,
    }

    impl RecordingGateway {
        pub fn failing_on(text: &str) -> Self {
            Self {
                fail_on: Some(text.to_string()),
                ..Default::default()
            }
        }
    }

    impl SchemaGateway for RecordingGateway {
        async fn execute(&mut self, sql: &str) -> RinoResult<Vec<Row>> {
            if let Some(ref needle) = self.fail_on {
                if sql.contains(needle.as_str()) {
                    return Err(RinoError::Database(format!("rejected: {}", sql)));
                }
            }
            self.executed.push(sql.to_string());
            Ok(Vec::new())
        }

        async fn list_tables(&mut self) -> RinoResult<Vec<String>> {
            Ok(self.tables.clone())
        }

        async fn set_foreign_key_checks(&mut self, enabled: bool) -> RinoResult<()> {
            self.execute(foreign_key_checks_sql(Driver::Mysql, enabled))
                .await
                .map(|_| ())
        }
    }
}
