use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use sql_records::codegen::{DEFAULT_CRATE_PATH, Generator, GeneratorOptions};
use sql_records::schema::{Introspector, TableDefinition, sync};
use sql_records::{Credentials, Executor, ExecutorConfig, SqlRecordsError};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate record types from a database schema")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write one record module per table; existing files are left alone
    Generate {
        #[command(flatten)]
        conn: ConnectionArgs,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value = DEFAULT_CRATE_PATH)]
        crate_path: String,
        /// Only these tables (repeatable)
        #[arg(long = "table")]
        tables: Vec<String>,
    },
    /// Print the classified definition of a table as JSON
    Describe {
        #[command(flatten)]
        conn: ConnectionArgs,
        #[arg(long)]
        table: String,
    },
    /// Compare a saved definition with the live table and print the ALTER statements
    Sync {
        #[command(flatten)]
        conn: ConnectionArgs,
        #[arg(long)]
        table: String,
        /// Definition JSON as written by `describe`
        #[arg(long)]
        definition: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// SQLite database file, used for reads and writes
    #[arg(long, required_unless_present = "config", conflicts_with = "config")]
    database: Option<PathBuf>,
    /// JSON file with `read` and optional `write` credentials
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ConnectionArgs {
    fn executor(&self) -> Result<Executor, SqlRecordsError> {
        if let Some(path) = &self.config {
            return Ok(Executor::from_config(ExecutorConfig::from_json_file(path)?));
        }
        let Some(path) = &self.database else {
            return Err(SqlRecordsError::ConfigError(
                "either --database or --config is required".into(),
            ));
        };
        let creds = Credentials::sqlite(path.to_string_lossy());
        Ok(Executor::new(creds.clone(), Some(creds)))
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse().command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<ExitCode, SqlRecordsError> {
    match command {
        Command::Generate {
            conn,
            out,
            crate_path,
            tables,
        } => {
            let db = conn.executor()?;
            let options = GeneratorOptions::new(out)
                .crate_path(crate_path)
                .tables(tables);
            let report = Generator::new(options).run(&db)?;
            for path in &report.written {
                println!("written  {}", path.display());
            }
            for path in &report.skipped {
                println!("skipped  {}", path.display());
            }
            for (table, err) in &report.failed {
                println!("failed   {table}: {err}");
            }
            Ok(if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Describe { conn, table } => {
            let db = conn.executor()?;
            let definition = Introspector::new(&db).definition(&table)?;
            println!("{}", serde_json::to_string_pretty(&definition)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Sync {
            conn,
            table,
            definition,
        } => {
            let text = std::fs::read_to_string(&definition)?;
            let definition: TableDefinition = serde_json::from_str(&text)?;
            if definition.table_name != table {
                return Err(SqlRecordsError::ConfigError(format!(
                    "definition is for `{}`, not `{table}`",
                    definition.table_name
                )));
            }
            let db = conn.executor()?;
            let live = Introspector::new(&db).columns(&table)?;
            let report = sync::compare(&definition, &live);
            for statement in report.statements() {
                println!("{statement};");
            }
            for column in &report.untracked {
                eprintln!("warning: `{table}`.`{column}` is not in the definition");
            }
            if report.is_clean() {
                eprintln!("`{table}` is in sync");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
