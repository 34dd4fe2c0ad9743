//! # rino — migrations from column shorthand
//!
//! rino generates timestamped migration files from a compact column
//! shorthand and runs them against MySQL, PostgreSQL or SQLite in file
//! name order.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use rino::prelude::*;
//!
//! // Write migrations/20240101120000_create_posts_table.sql
//! let path = Generator::new("migrations")
//!     .generate("create_posts_table", &["id:integer~increments", "user_id:integer"])?;
//!
//! // Apply everything in the directory
//! let mut db = SqlxGateway::connect(credentials).await?;
//! let registry = MigrationRegistry::discover("migrations")?;
//! Runner::new(&mut db).run(&registry).await?;
//! ```
//!
//! ## Shorthand
//!
//! | Symbol | Meaning                   | Example              |
//! |--------|---------------------------|----------------------|
//! | `:`    | Name/type separator       | `name:string`        |
//! | `{}`   | Type arguments            | `price:decimal{8,2}` |
//! | `~`    | Modifier                  | `bio:text~nullable`  |

pub mod compiler;
pub mod config;
pub mod error;
pub mod gateway;
pub mod generator;
pub mod migration;
pub mod naming;
pub mod runner;
pub mod schema;
pub mod template;

pub mod prelude {
    pub use crate::compiler::{ColumnCompiler, ForeignKey};
    pub use crate::config::{Credentials, Driver, RinoConfig};
    pub use crate::error::*;
    pub use crate::gateway::{SchemaGateway, SqlxGateway};
    pub use crate::generator::Generator;
    pub use crate::migration::{FileMigration, Migration, MigrationRegistry};
    pub use crate::naming::{MigrationName, parse_migration_name};
    pub use crate::runner::{RunReport, Runner};
    pub use crate::template::Template;
}

/// Compile a single column shorthand token.
///
/// Foreign keys implied by the column are discarded; use
/// [`compiler::ColumnCompiler`] to collect them.
///
/// # Example
///
/// ```
/// assert_eq!(rino::compile_column("price:decimal{8,2}"), "price decimal(8,2) not null");
/// ```
pub fn compile_column(shorthand: &str) -> String {
    compiler::ColumnCompiler::new().compile(shorthand)
}
