//! Generate migrations into a directory, then run them.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rino::gateway::Row;
use rino::prelude::*;

#[derive(Default)]
struct MemoryGateway {
    executed: Vec<String>,
    reject: Option<&'static str>,
}

impl SchemaGateway for MemoryGateway {
    async fn execute(&mut self, sql: &str) -> RinoResult<Vec<Row>> {
        if self.reject.is_some_and(|r| sql.contains(r)) {
            return Err(RinoError::Database("Table 'tags' already exists".to_string()));
        }
        self.executed.push(sql.to_string());
        Ok(Vec::new())
    }

    async fn list_tables(&mut self) -> RinoResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn set_foreign_key_checks(&mut self, _enabled: bool) -> RinoResult<()> {
        Ok(())
    }
}

fn at(second: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, second)
        .unwrap()
}

#[tokio::test]
async fn test_generated_files_run_in_timestamp_order() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new(dir.path());

    // Written out of order on purpose.
    generator
        .generate_at("create_posts_table", &["id:integer~increments", "user_id:integer"], at(2))
        .unwrap();
    generator
        .generate_at("create_users_table", &["id:integer~increments", "email:string{255}"], at(1))
        .unwrap();

    let registry = MigrationRegistry::discover(dir.path()).unwrap();
    let mut gateway = MemoryGateway::default();
    let report = Runner::new(&mut gateway).run(&registry).await.unwrap();

    assert_eq!(
        report.applied,
        vec![
            "20240101120001_create_users_table.sql",
            "20240101120002_create_posts_table.sql",
        ]
    );
    assert_eq!(
        gateway.executed,
        vec![
            "create table users (\n    \
             id integer auto_increment primary key not null,\n    \
             email string(255) not null\n);",
            "create table posts (\n    \
             id integer auto_increment primary key not null,\n    \
             user_id integer not null,\n    \
             foreign key (user_id) references users(id)\n);",
        ]
    );
}

#[tokio::test]
async fn test_failure_halts_remaining_files() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new(dir.path());
    generator.generate_at("create_users_table", &["name:string"], at(1)).unwrap();
    generator.generate_at("create_tags_table", &["label:string"], at(2)).unwrap();
    generator.generate_at("create_posts_table", &["title:string"], at(3)).unwrap();

    let registry = MigrationRegistry::discover(dir.path()).unwrap();
    let mut gateway = MemoryGateway {
        reject: Some("create table tags"),
        ..Default::default()
    };
    let err = Runner::new(&mut gateway).run(&registry).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Migration '20240101120002_create_tags_table.sql' failed: Table 'tags' already exists"
    );
    assert_eq!(gateway.executed.len(), 1);
    assert!(gateway.executed[0].starts_with("create table users"));
}

#[tokio::test]
async fn test_empty_directory_runs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let registry = MigrationRegistry::discover(dir.path()).unwrap();
    let mut gateway = MemoryGateway::default();

    let report = Runner::new(&mut gateway).run(&registry).await.unwrap();

    assert!(report.applied.is_empty());
    assert!(gateway.executed.is_empty());
}

#[test]
fn test_naming_error_before_any_write() {
    let dir = tempfile::tempdir().unwrap();
    let err = Generator::new(dir.path().join("migrations"))
        .generate("create_users", &["name:string"])
        .unwrap_err();

    assert!(matches!(err, RinoError::NamingConvention(_)));
    assert!(!dir.path().join("migrations").exists());
}
