//! rino configuration.
//!
//! Loaded from `rino.toml`:
//!
//! ```toml
//! migrations_dir = "migrations"
//!
//! [database]
//! driver = "mysql"
//! host = "127.0.0.1"
//! port = 3306
//! database = "app"
//! username = "root"
//! password = "secret"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{RinoError, RinoResult};

pub const CONFIG_FILE_NAME: &str = "rino.toml";
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Database driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    Mysql,
    #[serde(alias = "pgsql", alias = "postgresql")]
    Postgres,
    Sqlite,
}

impl Driver {
    pub fn scheme(&self) -> &'static str {
        match self {
            Driver::Mysql => "mysql",
            Driver::Postgres => "postgres",
            Driver::Sqlite => "sqlite",
        }
    }
}

/// Connection parameters, supplied once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub driver: Driver,
    #[serde(default = "default_host")]
    pub host: String,
    pub port: Option<u16>,
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl Credentials {
    /// Build the sqlx connection URL.
    pub fn connection_url(&self) -> RinoResult<String> {
        if self.driver == Driver::Sqlite {
            // Create the file on first connect.
            return Ok(format!("sqlite://{}?mode=rwc", self.database));
        }

        let port = self.port.unwrap_or(match self.driver {
            Driver::Postgres => 5432,
            _ => 3306,
        });
        let base = format!(
            "{}://{}:{}/{}",
            self.driver.scheme(),
            self.host,
            port,
            self.database
        );

        let mut url = Url::parse(&base).map_err(|e| RinoError::Config(e.to_string()))?;
        if !self.username.is_empty() {
            url.set_username(&self.username)
                .map_err(|_| RinoError::Config("invalid username".to_string()))?;
        }
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|_| RinoError::Config("invalid password".to_string()))?;
        }

        Ok(url.to_string())
    }
}

/// Main rino configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RinoConfig {
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,

    /// Custom migration template file.
    #[serde(default)]
    pub template: Option<PathBuf>,

    /// Needed only for commands that touch the database.
    #[serde(default)]
    pub database: Option<Credentials>,
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MIGRATIONS_DIR)
}

impl Default for RinoConfig {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            template: None,
            database: None,
        }
    }
}

impl RinoConfig {
    pub fn from_toml(content: &str) -> RinoResult<Self> {
        toml::from_str(content).map_err(|e| RinoError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> RinoResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RinoError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Load from `explicit`, else `./rino.toml`, else the user config dir.
    ///
    /// Falls back to defaults when no file exists; an explicit path must exist.
    pub fn load(explicit: Option<&Path>) -> RinoResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Self::from_file(local);
        }

        if let Some(global) = dirs::config_dir().map(|d| d.join("rino").join(CONFIG_FILE_NAME)) {
            if global.exists() {
                return Self::from_file(global);
            }
        }

        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Credentials, or a configuration error when none are set.
    pub fn credentials(&self) -> RinoResult<&Credentials> {
        self.database.as_ref().ok_or_else(|| {
            RinoError::Config(format!("no [database] section in {}", CONFIG_FILE_NAME))
        })
    }
}
