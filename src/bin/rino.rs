//! rino — migration generator and runner
//!
//! # Usage
//!
//! ```bash
//! # Generate a migration file
//! rino generate create_users_table id:integer~increments name:string{100} bio:text~nullable
//!
//! # Apply every migration in the migrations directory
//! rino migrate
//!
//! # Inspect or wipe the database
//! rino list
//! rino reset
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use rino::prelude::*;
use rino::schema;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rino")]
#[command(version)]
#[command(about = "Timestamped migrations from column shorthand", long_about = None)]
#[command(after_help = "EXAMPLES:
    rino generate create_users_table id:integer~increments email:string{255}
    rino generate create_posts_table id:integer~increments user_id:integer body:text~nullable
    rino migrate
    rino reset")]
struct Cli {
    /// Path to rino.toml
    #[arg(short, long, global = true, env = "RINO_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding migration files
    #[arg(long, global = true, env = "RINO_MIGRATIONS_DIR")]
    migrations_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a migration file: <operation>_<table>_table [name:type{args}~modifier ...]
    Generate {
        /// Migration name, e.g. create_users_table
        name: String,

        /// Column shorthand tokens
        columns: Vec<String>,

        /// Print the file instead of writing it
        #[arg(short, long)]
        dry_run: bool,
    },
    /// Show the SQL each shorthand token compiles to
    Explain {
        /// Column shorthand tokens
        #[arg(required = true)]
        columns: Vec<String>,
    },
    /// Run every migration in the migrations directory
    Migrate,
    /// List the tables in the database
    List,
    /// Drop every table in the database
    Reset,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Generate {
            name,
            columns,
            dry_run,
        } => generate(&cli, name, columns, *dry_run),
        Commands::Explain { columns } => {
            explain(columns);
            Ok(())
        }
        Commands::Migrate => migrate(&cli).await,
        Commands::List => list(&cli).await,
        Commands::Reset => reset(&cli).await,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "rino=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<RinoConfig> {
    let mut config = RinoConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.migrations_dir {
        config.migrations_dir = dir.clone();
    }
    Ok(config)
}

async fn connect(config: &RinoConfig, verbose: bool) -> Result<SqlxGateway> {
    let credentials = config.credentials()?.clone();
    if verbose {
        println!(
            "{} {}@{}/{}",
            "Connecting to:".dimmed(),
            credentials.username,
            credentials.host,
            credentials.database
        );
    }
    Ok(SqlxGateway::connect(credentials).await?)
}

fn generate(cli: &Cli, name: &str, columns: &[String], dry_run: bool) -> Result<()> {
    let config = load_config(cli)?;

    let mut generator = Generator::new(&config.migrations_dir);
    if let Some(path) = &config.template {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {}", path.display()))?;
        generator = generator.with_template(Template::new(source)?);
    }

    if dry_run {
        let (migration, contents) = generator.render(name, columns)?;
        println!("{} {}", "Migration:".dimmed(), migration.class_name.cyan());
        println!("{}", contents);
        return Ok(());
    }

    let path = generator.generate(name, columns)?;
    println!("{} {}", "✓ Created:".green(), path.display());
    Ok(())
}

fn explain(columns: &[String]) {
    let mut compiler = ColumnCompiler::new();

    for column in columns {
        let sql = compiler.compile(column);
        println!("  {} {} {}", column.yellow(), "→".dimmed(), sql.white());
    }

    if !compiler.foreign_keys().is_empty() {
        println!();
        println!("{}", "Foreign keys:".green().bold());
        for fk in compiler.foreign_keys() {
            println!("  {}", fk.to_sql().cyan());
        }
    }
}

async fn migrate(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let registry = MigrationRegistry::discover(&config.migrations_dir)?;

    if registry.is_empty() {
        println!("{}", "No migrations to run".dimmed());
        return Ok(());
    }

    let mut db = connect(&config, cli.verbose).await?;
    let report = Runner::new(&mut db)
        .run_with(&registry, |migration| {
            match migration.class_name() {
                Some(class) => println!(
                    "{} {} {}",
                    "✓ Migrated:".green(),
                    migration.name(),
                    format!("({})", class).dimmed()
                ),
                None => println!("{} {}", "✓ Migrated:".green(), migration.name()),
            }
        })
        .await?;

    println!();
    println!(
        "{}",
        format!("✓ {} migration(s) applied", report.applied.len())
            .green()
            .bold()
    );
    Ok(())
}

async fn list(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let mut db = connect(&config, cli.verbose).await?;
    let tables = schema::list_tables(&mut db).await?;

    if tables.is_empty() {
        println!("{}", "(no tables)".dimmed());
        return Ok(());
    }

    for table in &tables {
        println!("  {}", table.white());
    }
    println!();
    println!("{} table(s)", tables.len().to_string().cyan());
    Ok(())
}

async fn reset(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let mut db = connect(&config, cli.verbose).await?;

    let dropped = schema::reset(&mut db, |table| {
        println!("{} {}", "✓ Dropped:".green(), table);
    })
    .await?;

    println!();
    println!(
        "{}",
        format!("✓ {} table(s) dropped", dropped.len()).green().bold()
    );
    Ok(())
}
