//! Whole-database schema operations.

use crate::error::{RinoError, RinoResult};
use crate::gateway::SchemaGateway;

/// All table names in the connected database.
pub async fn list_tables<G: SchemaGateway>(gateway: &mut G) -> RinoResult<Vec<String>> {
    gateway.list_tables().await
}

/// One `drop table` per table, last-discovered first.
///
/// Reverse discovery order tends to drop referencing tables before the
/// tables they reference; it is not a dependency sort.
pub fn drop_statements(tables: &[String]) -> Vec<String> {
    tables
        .iter()
        .rev()
        .map(|table| format!("drop table {}", table))
        .collect()
}

/// Drop every table, calling `on_dropped` after each one.
///
/// Foreign-key checks are disabled for the duration and re-enabled
/// afterwards, also when a drop fails.
pub async fn reset<G, F>(gateway: &mut G, mut on_dropped: F) -> RinoResult<Vec<String>>
where
    G: SchemaGateway,
    F: FnMut(&str),
{
    let tables = gateway.list_tables().await?;
    if tables.is_empty() {
        return Ok(Vec::new());
    }

    gateway.set_foreign_key_checks(false).await?;

    let mut dropped = Vec::with_capacity(tables.len());
    for (table, sql) in tables.iter().rev().zip(drop_statements(&tables)) {
        if let Err(e) = gateway.execute(&sql).await {
            if let Err(restore) = gateway.set_foreign_key_checks(true).await {
                tracing::warn!(error = %restore, "failed to re-enable foreign key checks");
            }
            return Err(RinoError::execution(format!("drop table {}", table), e.detail()));
        }
        tracing::debug!(table = %table, "dropped");
        on_dropped(table.as_str());
        dropped.push(table.clone());
    }

    gateway.set_foreign_key_checks(true).await?;
    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::RecordingGateway;
    use pretty_assertions::assert_eq;

    fn tables(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_drop_statements_reversed() {
        assert_eq!(
            drop_statements(&tables(&["users", "posts", "comments"])),
            vec!["drop table comments", "drop table posts", "drop table users"]
        );
    }

    #[tokio::test]
    async fn test_list_tables() {
        let mut gateway = RecordingGateway {
            tables: tables(&["users", "posts"]),
            ..Default::default()
        };
        assert_eq!(list_tables(&mut gateway).await.unwrap(), tables(&["users", "posts"]));
    }

    #[tokio::test]
    async fn test_reset_drops_in_reverse_with_checks_disabled() {
        let mut gateway = RecordingGateway {
            tables: tables(&["users", "posts"]),
            ..Default::default()
        };
        let mut seen = Vec::new();
        let dropped = reset(&mut gateway, |t| seen.push(t.to_string())).await.unwrap();

        assert_eq!(dropped, tables(&["posts", "users"]));
        assert_eq!(seen, dropped);
        assert_eq!(
            gateway.executed,
            vec![
                "set foreign_key_checks = 0",
                "drop table posts",
                "drop table users",
                "set foreign_key_checks = 1",
            ]
        );
    }

    #[tokio::test]
    async fn test_reset_empty_database() {
        let mut gateway = RecordingGateway::default();
        let dropped = reset(&mut gateway, |_| {}).await.unwrap();
        assert!(dropped.is_empty());
        assert!(gateway.executed.is_empty());
    }

    #[tokio::test]
    async fn test_reset_stops_on_failure_and_restores_checks() {
        let mut gateway = RecordingGateway {
            tables: tables(&["users", "posts", "comments"]),
            ..RecordingGateway::failing_on("drop table posts")
        };
        let err = reset(&mut gateway, |_| {}).await.unwrap_err();

        match err {
            RinoError::MigrationExecution { migration, message } => {
                assert_eq!(migration, "drop table posts");
                assert_eq!(message, "rejected: drop table posts");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(
            gateway.executed,
            vec![
                "set foreign_key_checks = 0",
                "drop table comments",
                "set foreign_key_checks = 1",
            ]
        );
    }
}
