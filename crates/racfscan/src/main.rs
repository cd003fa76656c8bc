//! CLI for extracting IBM RACF database images.
//!
//! Reads a RACF dataset image, decodes its profiles, and writes them to
//! a plain-text dump and/or a SQLite database:
//!
//! ```bash
//! # Extract to SQLite
//! racfscan -f racf.db --sql racf.sqlite
//!
//! # Plain-text dump with a debug log file
//! racfscan -f racf.db --dump racf.txt --log racfscan.log
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use miette::{miette, IntoDiagnostic, Result, WrapErr};

use racfscan_db::ClassifierMode;

mod sink;

#[derive(Parser, Debug)]
#[command(name = "racfscan")]
#[command(author, version, about = "RACF database extraction tool", long_about = None)]
struct Args {
    /// Input RACF database file
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    file: PathBuf,

    /// Dump decoded profiles as plain text to FILE
    #[arg(long, value_name = "FILE")]
    dump: Option<PathBuf>,

    /// Convert decoded profiles to a SQLite database at FILE
    #[arg(long, value_name = "FILE")]
    sql: Option<PathBuf>,

    /// Save debug and warning output to a log file (the stem is
    /// suffixed with the start time)
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Type template fields through the built-in field-name catalog
    #[arg(
        long = "use-field-db",
        value_name = "BOOL",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    use_field_db: bool,
}

/// Suffix the log stem with the start time, so repeated runs never
/// clobber each other: `racfscan.log` becomes `racfscan_14-30-59.log`.
fn timestamped_log_path(path: &Path) -> PathBuf {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("log")
        .to_string();
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("racfscan");
    let clock = chrono::Local::now().format("%H-%M-%S");
    path.with_file_name(format!("{stem}_{clock}.{ext}"))
}

fn init_tracing(log: Option<&Path>) -> Result<()> {
    let filter = |fallback: &str| {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback))
    };

    match log {
        Some(path) => {
            // Debug and warning detail goes to the log file; the
            // terminal stays quiet apart from errors surfaced by miette.
            let log_path = timestamped_log_path(path);
            let file = std::fs::File::create(&log_path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to create log file: {}", log_path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter("debug"))
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter("info")).init();
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.dump.is_none() && args.sql.is_none() {
        return Err(miette!(
            "nothing to produce: set at least one of --dump or --sql"
        ));
    }

    init_tracing(args.log.as_deref())?;

    let data = std::fs::read(&args.file)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read RACF database: {}", args.file.display()))?;

    let mode = if args.use_field_db {
        ClassifierMode::Catalog
    } else {
        ClassifierMode::Heuristic
    };

    let db = racfscan_db::extract(&data, mode)
        .into_diagnostic()
        .wrap_err("Failed to decode the RACF database")?;

    if let Some(path) = &args.dump {
        tracing::info!("saving profiles as plain text: {}", path.display());
        sink::text::write_dump(&db.profiles, path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write plain-text dump: {}", path.display()))?;
    }

    if let Some(path) = &args.sql {
        tracing::info!("saving profiles as a SQLite database: {}", path.display());
        let mut sqlite = sink::sqlite::SqliteSink::create(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to create SQLite database: {}", path.display()))?;
        sqlite
            .export(&db.schema, &db.profiles)
            .into_diagnostic()
            .wrap_err("Failed to fill the SQLite database")?;
    }

    tracing::info!("done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamped_log_path_keeps_extension() {
        let path = timestamped_log_path(Path::new("out/racfscan.log"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("racfscan_"));
        assert!(name.ends_with(".log"));
        assert_eq!(path.parent(), Some(Path::new("out")));
    }

    #[test]
    fn test_timestamped_log_path_default_extension() {
        let path = timestamped_log_path(Path::new("trace"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("trace_"));
        assert!(name.ends_with(".log"));
    }
}
