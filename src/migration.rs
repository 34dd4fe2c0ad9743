//! Migrations as executable units.
//!
//! A migration is anything that can produce its "up" SQL. Generated files
//! are loaded by [`FileMigration`]; hand-written migrations implement
//! [`Migration`] directly and are added with [`MigrationRegistry::register`].
//!
//! ## File Format
//! ```sql
//! -- migration: CreateUsersTable
//! -- table: users
//!
//! -- @up
//! create table users (
//!     id integer auto_increment primary key not null
//! );
//! ```
//!
//! Lines before `-- @up` that are not `-- key: value` headers are ignored.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, line_ending, not_line_ending, space0},
    combinator::{eof, map, not, value},
    multi::many0,
    sequence::{preceded, terminated, tuple},
    IResult,
};
use std::path::{Path, PathBuf};

use crate::error::{RinoError, RinoResult};
use crate::generator::MIGRATION_EXTENSION;

/// Line separating the header from the "up" SQL.
pub const UP_MARKER: &str = "-- @up";

/// One unit of schema change.
pub trait Migration {
    /// Name used for ordering and reporting.
    fn name(&self) -> &str;

    /// SQL that applies this migration.
    fn up(&self) -> String;

    /// PascalCase identifier, when the migration declares one.
    fn class_name(&self) -> Option<&str> {
        None
    }

    /// Table the migration targets, when it declares one.
    fn table(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct MigrationMeta {
    class_name: Option<String>,
    table: Option<String>,
}

/// A migration loaded from a generated file.
#[derive(Debug, Clone)]
pub struct FileMigration {
    name: String,
    meta: MigrationMeta,
    up: String,
}

impl FileMigration {
    /// Read and parse a migration file.
    pub fn load(path: impl AsRef<Path>) -> RinoResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(path, &content)
    }

    /// Parse migration file contents; `path` names the migration.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> RinoResult<Self> {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (meta, up) = match parse_migration_file(content) {
            Ok((_, parsed)) => parsed,
            Err(_) => {
                return Err(RinoError::invalid(
                    path,
                    format!("missing '{}' section", UP_MARKER),
                ));
            }
        };

        Ok(Self {
            name,
            meta,
            up: up.trim().to_string(),
        })
    }
}

impl Migration for FileMigration {
    fn name(&self) -> &str {
        &self.name
    }

    fn up(&self) -> String {
        self.up.clone()
    }

    fn class_name(&self) -> Option<&str> {
        self.meta.class_name.as_deref()
    }

    fn table(&self) -> Option<&str> {
        self.meta.table.as_deref()
    }
}

/// Whether `content` has a `-- @up` line.
pub fn has_up_marker(content: &str) -> bool {
    content
        .lines()
        .any(|line| parse_up_marker(line.trim_end()).is_ok())
}

/// Header and free lines, then the `-- @up` marker, then the SQL body.
fn parse_migration_file(input: &str) -> IResult<&str, (MigrationMeta, &str)> {
    let (input, lines) = many0(alt((
        map(parse_header_line, Some),
        value(None, parse_other_line),
    )))(input)?;
    let (body, _) = parse_up_marker(input)?;

    let mut meta = MigrationMeta::default();
    for (key, val) in lines.into_iter().flatten() {
        match key {
            "migration" => meta.class_name = Some(val.to_string()),
            "table" => meta.table = Some(val.to_string()),
            _ => {}
        }
    }

    Ok(("", (meta, body)))
}

/// `-- key: value`
fn parse_header_line(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, _) = tag("--")(input)?;
    let (input, _) = space0(input)?;
    let (input, key) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, _) = char(':')(input)?;
    let (input, val) = not_line_ending(input)?;
    let (input, _) = line_ending(input)?;
    Ok((input, (key, val.trim())))
}

/// Any complete line other than the marker.
fn parse_other_line(input: &str) -> IResult<&str, ()> {
    value(
        (),
        preceded(not(parse_up_marker), terminated(not_line_ending, line_ending)),
    )(input)
}

/// `-- @up` on its own line.
fn parse_up_marker(input: &str) -> IResult<&str, ()> {
    value(
        (),
        tuple((
            tag("--"),
            space0,
            tag("@up"),
            space0,
            alt((line_ending, eof)),
        )),
    )(input)
}

/// Ordered set of migrations to run.
#[derive(Default)]
pub struct MigrationRegistry {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every migration file in `dir`.
    ///
    /// Only `*.sql` files not starting with `.` are considered. A missing
    /// directory yields an empty registry.
    pub fn discover(dir: impl AsRef<Path>) -> RinoResult<Self> {
        let dir = dir.as_ref();
        let mut registry = Self::new();

        if !dir.exists() {
            tracing::debug!(dir = %dir.display(), "migrations directory does not exist");
            return Ok(registry);
        }

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !is_migration_file(&path) {
                continue;
            }
            tracing::debug!(path = %path.display(), "discovered migration");
            registry.register(FileMigration::load(&path)?);
        }

        Ok(registry)
    }

    /// Add a migration.
    pub fn register(&mut self, migration: impl Migration + 'static) -> &mut Self {
        self.migrations.push(Box::new(migration));
        self
    }

    /// Migrations sorted by name; timestamp prefixes make this chronological.
    pub fn ordered(&self) -> Vec<&dyn Migration> {
        let mut ordered: Vec<&dyn Migration> = self.migrations.iter().map(|m| m.as_ref()).collect();
        ordered.sort_by(|a, b| a.name().cmp(b.name()));
        ordered
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

fn is_migration_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    let extension = path.extension().and_then(|e| e.to_str()) == Some(MIGRATION_EXTENSION);

    path.is_file() && extension && !hidden
}
