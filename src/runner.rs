//! Migration runner.
//!
//! Applies every migration in name order and stops at the first failure.
//! Nothing records which migrations were applied; each run executes all.

use crate::error::{RinoError, RinoResult};
use crate::gateway::SchemaGateway;
use crate::migration::{Migration, MigrationRegistry};

/// Outcome of a successful run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Names of the applied migrations, in execution order.
    pub applied: Vec<String>,
}

/// Executes migrations against a gateway.
pub struct Runner<'g, G: SchemaGateway> {
    gateway: &'g mut G,
}

impl<'g, G: SchemaGateway> Runner<'g, G> {
    pub fn new(gateway: &'g mut G) -> Self {
        Self { gateway }
    }

    /// Run every migration in `registry`.
    pub async fn run(&mut self, registry: &MigrationRegistry) -> RinoResult<RunReport> {
        self.run_with(registry, |_| {}).await
    }

    /// Run every migration, calling `on_applied` after each success.
    pub async fn run_with<F>(
        &mut self,
        registry: &MigrationRegistry,
        mut on_applied: F,
    ) -> RinoResult<RunReport>
    where
        F: FnMut(&dyn Migration),
    {
        let mut report = RunReport::default();

        for migration in registry.ordered() {
            let sql = migration.up();
            tracing::debug!(migration = migration.name(), "applying");

            if let Err(e) = self.gateway.execute(&sql).await {
                return Err(RinoError::execution(migration.name(), e.detail()));
            }

            on_applied(migration);
            report.applied.push(migration.name().to_string());
        }

        tracing::info!(count = report.applied.len(), "migrations applied");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::RecordingGateway;
    use crate::migration::FileMigration;

    fn registry(files: &[(&str, &str)]) -> MigrationRegistry {
        let mut registry = MigrationRegistry::new();
        for (name, up) in files {
            let content = format!("-- @up\n{}", up);
            registry.register(FileMigration::parse(*name, &content).unwrap());
        }
        registry
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let mut gateway = RecordingGateway::default();
        let report = Runner::new(&mut gateway)
            .run(&MigrationRegistry::new())
            .await
            .unwrap();
        assert!(report.applied.is_empty());
        assert!(gateway.executed.is_empty());
    }

    #[tokio::test]
    async fn test_runs_in_name_order() {
        let mut gateway = RecordingGateway::default();
        let registry = registry(&[
            ("20240102000000_create_posts_table.sql", "create table posts (id int)"),
            ("20240101000000_create_users_table.sql", "create table users (id int)"),
        ]);

        let report = Runner::new(&mut gateway).run(&registry).await.unwrap();

        assert_eq!(
            report.applied,
            vec![
                "20240101000000_create_users_table.sql",
                "20240102000000_create_posts_table.sql",
            ]
        );
        assert_eq!(
            gateway.executed,
            vec!["create table users (id int)", "create table posts (id int)"]
        );
    }

    #[tokio::test]
    async fn test_second_of_three_fails() {
        let mut gateway = RecordingGateway::failing_on("posts");
        let registry = registry(&[
            ("20240101000000_create_users_table.sql", "create table users (id int)"),
            ("20240102000000_create_posts_table.sql", "create table posts (id int)"),
            ("20240103000000_create_tags_table.sql", "create table tags (id int)"),
        ]);

        let mut applied = Vec::new();
        let err = Runner::new(&mut gateway)
            .run_with(&registry, |m| applied.push(m.name().to_string()))
            .await
            .unwrap_err();

        match err {
            RinoError::MigrationExecution { migration, message } => {
                assert_eq!(migration, "20240102000000_create_posts_table.sql");
                assert_eq!(message, "rejected: create table posts (id int)");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(applied, vec!["20240101000000_create_users_table.sql"]);
        assert_eq!(gateway.executed, vec!["create table users (id int)"]);
    }
}
