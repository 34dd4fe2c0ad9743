//! Migration name parsing.
//!
//! Migration names follow `<operation>_<table_name>_table`:
//!
//! ```text
//! create_blog_posts_table
//! ──┬─── ────┬───── ──┬──
//!   │        │        └── discarded
//!   │        └── table name (blog_posts)
//!   └── operation
//! ```

use crate::error::{RinoError, RinoResult};

/// Marker every migration name must contain.
const TABLE_MARKER: &str = "_table";

/// A migration name decomposed into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationName {
    /// The name exactly as given (used in the file name).
    pub raw: String,
    /// Leading token, e.g. `create`. Not validated.
    pub operation: String,
    /// Snake-case table name between the operation and the trailing token.
    pub table: String,
    /// PascalCase identifier of the whole name, e.g. `CreateUsersTable`.
    pub class_name: String,
}

/// Parse a migration name.
///
/// # Example
///
/// ```
/// use rino::naming::parse_migration_name;
///
/// let name = parse_migration_name("create_blog_posts_table").unwrap();
/// assert_eq!(name.table, "blog_posts");
/// assert_eq!(name.class_name, "CreateBlogPostsTable");
/// ```
pub fn parse_migration_name(input: &str) -> RinoResult<MigrationName> {
    if !input.contains(TABLE_MARKER) {
        return Err(RinoError::NamingConvention(input.to_string()));
    }

    let tokens: Vec<&str> = input.split('_').collect();
    let operation = tokens[0].to_string();

    // The last token is dropped whatever it says.
    let table = match tokens.len() {
        0..=2 => String::new(),
        n => tokens[1..n - 1].join("_"),
    };

    if table.is_empty() {
        tracing::warn!(migration = input, "migration name has no table segment");
    }

    Ok(MigrationName {
        raw: input.to_string(),
        operation,
        table,
        class_name: to_pascal_case(input),
    })
}

/// Capitalize the first letter of every `_`-delimited word and concatenate.
pub fn to_pascal_case(snake: &str) -> String {
    snake.split('_').map(capitalize).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
