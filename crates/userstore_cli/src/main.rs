//! Console entry point for the user store.
//!
//! # Responsibility
//! - Wire logging, database, gateway, service and console together.
//! - Run the blocking read-eval-print loop over standard input.
//!
//! # Invariants
//! - Failure to open the database at startup exits with a non-zero status.
//! - The `exit` command terminates with status 0; the connection closes
//!   when it drops at end of scope.

mod console;

use console::{Console, Outcome};
use log::{error, info};
use std::io::{BufRead, Write};
use std::process::ExitCode;
use userstore_core::db::open_db;
use userstore_core::{default_log_level, init_logging, SqliteUserRepository, UserService};

const DEFAULT_DB_PATH: &str = "userstore.db";

fn main() -> ExitCode {
    // Logging failures are reported but not fatal; the console protocol
    // on stdout stays usable without a log file.
    match log_dir() {
        Ok(dir) => {
            if let Err(err) = init_logging(default_log_level(), &dir) {
                eprintln!("warning: logging disabled: {err}");
            }
        }
        Err(err) => eprintln!("warning: logging disabled: {err}"),
    }

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

    let conn = match open_db(&db_path) {
        Ok(conn) => conn,
        Err(err) => {
            error!("event=app_start module=cli status=error db_path={db_path} error={err}");
            eprintln!("failed to open database `{db_path}`: {err}");
            return ExitCode::FAILURE;
        }
    };

    info!("event=app_start module=cli status=ok db_path={db_path}");

    let console = Console::new(UserService::new(SqliteUserRepository::new(&conn)));
    run_loop(&console, std::io::stdin().lock(), std::io::stdout());

    info!("event=app_stop module=cli status=ok");
    ExitCode::SUCCESS
}

fn log_dir() -> Result<String, String> {
    let dir = std::env::current_dir()
        .map_err(|err| format!("cannot resolve working directory: {err}"))?
        .join("logs");
    dir.to_str()
        .map(str::to_string)
        .ok_or_else(|| "log directory path is not valid UTF-8".to_string())
}

fn run_loop<R: userstore_core::UserRepository>(
    console: &Console<R>,
    reader: impl BufRead,
    mut writer: impl Write,
) {
    // Write failures mean stdout is gone; nothing sensible is left to do.
    let _ = writeln!(writer, "{}", Console::<R>::help_text());

    let mut lines = reader.lines();
    loop {
        let _ = write!(writer, "-> ");
        let _ = writer.flush();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            // EOF or unreadable input ends the session like `exit`.
            _ => break,
        };

        match console.handle_line(&line) {
            Outcome::Reply(text) => {
                let _ = writeln!(writer, "{text}");
            }
            Outcome::Silent => {}
            Outcome::Exit => break,
        }
    }
}
