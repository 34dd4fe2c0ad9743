//! Column shorthand compiler.
//!
//! Rewrites compact column tokens into MySQL column definitions.
//!
//! ## Shorthand
//!
//! | Shorthand                | SQL                                       |
//! |--------------------------|-------------------------------------------|
//! | `name:string{100}`       | `name string(100) not null`               |
//! | `price:decimal{8,2}`     | `price decimal(8,2) not null`             |
//! | `id:increments`          | `id auto_increment primary key not null`  |
//! | `bio:text~nullable`      | `bio text  `                              |
//! | `user_id:integer`        | `user_id integer not null` + foreign key  |
//!
//! Any column whose compiled text contains `<word>_id` also yields
//! `foreign key (<word>_id) references <word>s(id)`.

use regex::Regex;
use std::sync::LazyLock;

/// Separator placed between compiled columns and constraints.
pub const COLUMN_SEPARATOR: &str = ",\n    ";

const NOT_NULL: &str = "not null";
const NULLABLE: &str = "nullable";

static FOREIGN_KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+_id").expect("static pattern is valid"));

/// A foreign-key constraint inferred from a `<word>_id` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: String,
    pub references: String,
}

impl ForeignKey {
    /// Infer the constraint for `column`: strip `_id`, append `s`.
    pub fn infer(column: &str) -> Self {
        let singular = column.strip_suffix("_id").unwrap_or(column);
        Self {
            column: column.to_string(),
            references: format!("{}s", singular),
        }
    }

    pub fn to_sql(&self) -> String {
        format!(
            "foreign key ({}) references {}(id)",
            self.column, self.references
        )
    }
}

/// Compiles column shorthand and collects the foreign keys it implies.
///
/// Use one compiler per generated migration: the foreign-key buffer is
/// appended to by every [`compile`](Self::compile) call.
#[derive(Debug, Default)]
pub struct ColumnCompiler {
    foreign_keys: Vec<ForeignKey>,
}

impl ColumnCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile one shorthand token into a column definition.
    ///
    /// Malformed shorthand is not rejected; it produces malformed SQL.
    pub fn compile(&mut self, shorthand: &str) -> String {
        let mut sql = shorthand
            .replace('{', "(")
            .replace('}', ")")
            .replace(':', " ")
            .replace("increments", "auto_increment primary key")
            .replace('~', " ");

        sql.push(' ');
        sql.push_str(NOT_NULL);

        if sql.contains(NULLABLE) {
            // Only the suffix appended above; the separating space stays.
            sql.truncate(sql.len() - NOT_NULL.len());
        }
        let sql = sql.replace(NULLABLE, "");

        if let Some(found) = FOREIGN_KEY_PATTERN.find(&sql) {
            let fk = ForeignKey::infer(found.as_str());
            tracing::debug!(column = %fk.column, references = %fk.references, "inferred foreign key");
            self.foreign_keys.push(fk);
        }

        tracing::debug!(shorthand, sql = %sql, "compiled column");
        sql
    }

    /// Compile every token in order and append the accumulated foreign keys.
    pub fn compile_all<S: AsRef<str>>(&mut self, columns: &[S]) -> String {
        let compiled: Vec<String> = columns.iter().map(|c| self.compile(c.as_ref())).collect();
        let mut sql = compiled.join(COLUMN_SEPARATOR);

        for fk in &self.foreign_keys {
            sql.push_str(COLUMN_SEPARATOR);
            sql.push_str(&fk.to_sql());
        }

        sql
    }

    /// Foreign keys inferred so far.
    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }
}
