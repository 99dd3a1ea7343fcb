//! Bookshelf command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from flags and environment.
//! - Bootstrap logging and storage, then dispatch one book command.
//! - Print the response envelope as JSON and exit with its status code.

mod commands;

use bookshelf_core::db::open_db;
use bookshelf_core::{
    flush_logging, init_logging, BookService, BookshelfConfig, SqliteBookRepository,
};
use clap::Parser;
use commands::{Command, Response};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "bookshelf")]
#[command(about = "Search, page through, and edit a collection of books")]
#[command(version)]
struct Cli {
    /// SQLite database file. Overrides BOOKSHELF_DB_PATH.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Absolute directory for rolling log files. Overrides BOOKSHELF_LOG_DIR.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error. Overrides BOOKSHELF_LOG_LEVEL.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let response = run(cli);
    flush_logging();

    match serde_json::to_string_pretty(&response) {
        Ok(text) => println!("{text}"),
        Err(err) => {
            eprintln!("bookshelf: failed to encode response: {err}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::from(response.exit_code())
}

fn run(cli: Cli) -> Response {
    // An unreadable environment is reported after logging is up.
    let (mut config, config_error) = match BookshelfConfig::from_env() {
        Ok(config) => (config, None),
        Err(err) => (BookshelfConfig::default(), Some(err)),
    };
    if let Some(db_path) = cli.db_path {
        config.db_path = db_path;
    }
    if let Some(log_dir) = cli.log_dir {
        config.log_dir = log_dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    if let Err(err) = init_logging(&config.log_level, &config.log_dir.to_string_lossy()) {
        eprintln!("bookshelf: file logging disabled: {err}");
    }
    if let Some(err) = config_error {
        return Response::failure(&err);
    }

    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => return Response::failure(&err),
    };
    let repo = match SqliteBookRepository::try_new(&conn) {
        Ok(repo) => repo,
        Err(err) => return Response::failure(&err),
    };

    commands::execute(&BookService::new(repo), cli.command)
}
