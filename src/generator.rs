//! Migration file generation.
//!
//! ## Generated Files
//! ```text
//! migrations/
//! └── 20251231093400_create_users_table.sql
//! ```

use chrono::{Local, NaiveDateTime};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::compiler::ColumnCompiler;
use crate::error::{RinoError, RinoResult};
use crate::naming::{MigrationName, parse_migration_name};
use crate::template::Template;

/// Extension of generated migration files.
pub const MIGRATION_EXTENSION: &str = "sql";

/// Sortable timestamp prefix: `YYYYMMDDHHMMSS`.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// `<timestamp>_<migration_name>.sql`
pub fn migration_file_name(timestamp: &NaiveDateTime, name: &str) -> String {
    format!(
        "{}_{}.{}",
        timestamp.format(TIMESTAMP_FORMAT),
        name,
        MIGRATION_EXTENSION
    )
}

/// Writes timestamped migration files into a directory.
#[derive(Debug, Clone)]
pub struct Generator {
    migrations_dir: PathBuf,
    template: Template,
}

impl Generator {
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            template: Template::default(),
        }
    }

    /// Replace the built-in template.
    pub fn with_template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    /// Build the file contents without touching the filesystem.
    pub fn render<S: AsRef<str>>(
        &self,
        migration_name: &str,
        columns: &[S],
    ) -> RinoResult<(MigrationName, String)> {
        let name = parse_migration_name(migration_name)?;

        let column_sql = if columns.is_empty() {
            String::new()
        } else {
            ColumnCompiler::new().compile_all(columns)
        };

        let contents = self.template.render(&name, &column_sql);
        Ok((name, contents))
    }

    /// Generate a migration stamped with the current local time.
    pub fn generate<S: AsRef<str>>(
        &self,
        migration_name: &str,
        columns: &[S],
    ) -> RinoResult<PathBuf> {
        self.generate_at(migration_name, columns, Local::now().naive_local())
    }

    /// Generate a migration stamped with `timestamp`.
    pub fn generate_at<S: AsRef<str>>(
        &self,
        migration_name: &str,
        columns: &[S],
        timestamp: NaiveDateTime,
    ) -> RinoResult<PathBuf> {
        let (name, contents) = self.render(migration_name, columns)?;

        if !self.migrations_dir.exists() {
            std::fs::create_dir_all(&self.migrations_dir).map_err(|source| {
                RinoError::FileWrite {
                    path: self.migrations_dir.clone(),
                    source,
                }
            })?;
            tracing::debug!(dir = %self.migrations_dir.display(), "created migrations directory");
        }

        let path = self
            .migrations_dir
            .join(migration_file_name(&timestamp, &name.raw));

        // Never replace an existing migration.
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .and_then(|mut file| file.write_all(contents.as_bytes()))
            .map_err(|source| RinoError::FileWrite {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), class = %name.class_name, "wrote migration");
        Ok(path)
    }
}
