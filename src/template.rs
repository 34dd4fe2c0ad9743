//! Migration file template.

use crate::error::{RinoError, RinoResult};
use crate::migration::{UP_MARKER, has_up_marker};
use crate::naming::MigrationName;

pub const CLASS_NAME_PLACEHOLDER: &str = "{{class_name}}";
pub const TABLE_NAME_PLACEHOLDER: &str = "{{table_name}}";
pub const COLUMNS_PLACEHOLDER: &str = "{{columns}}";

/// Built-in template for generated migrations.
pub const DEFAULT_TEMPLATE: &str = "\
-- migration: {{class_name}}
-- table: {{table_name}}

-- @up
create table {{table_name}} (
    {{columns}}
);
";

/// A migration template with class, table and column placeholders.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            source: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl Template {
    /// A custom template. It must contain a `-- @up` line, otherwise the
    /// files it produces could not be run.
    pub fn new(source: impl Into<String>) -> RinoResult<Self> {
        let source = source.into();
        if !has_up_marker(&source) {
            return Err(RinoError::Template(format!(
                "missing '{}' line",
                UP_MARKER
            )));
        }
        Ok(Self { source })
    }

    /// Fill in the placeholders. `columns` is already compiled SQL.
    pub fn render(&self, name: &MigrationName, columns: &str) -> String {
        self.source
            .replace(CLASS_NAME_PLACEHOLDER, &name.class_name)
            .replace(TABLE_NAME_PLACEHOLDER, &name.table)
            .replace(COLUMNS_PLACEHOLDER, columns)
    }
}
