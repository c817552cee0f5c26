//! Runtime configuration for the `presence` CLI.
//!
//! Every value has a compile-time default and can be overridden through an
//! environment variable. Command-line flags take precedence over both.

use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIR: &str = "./data";

/// File name of the database inside the data directory.
pub const DB_FILE_NAME: &str = "data.db";

const DEFAULT_RECLAIM_SEQUENCES: bool = true;

/// Get the directory holding the database file.
///
/// Priority:
/// 1. `PRESENCE_DATA_DIR` env variable if set
/// 2. `./data` as fallback
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PRESENCE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    PathBuf::from(DEFAULT_DATA_DIR)
}

/// Get the database file path.
///
/// Priority:
/// 1. `PRESENCE_DB_PATH` env variable if set
/// 2. `data.db` inside [`get_data_dir`]
pub fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("PRESENCE_DB_PATH") {
        return PathBuf::from(path);
    }

    db_path_in(&get_data_dir())
}

pub fn db_path_in(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE_NAME)
}

/// Whether deletes hand their ids back to the AUTOINCREMENT counters.
///
/// Reads `PRESENCE_RECLAIM_SEQUENCES`; unparsable values fall back to the
/// default of `true`.
pub fn get_reclaim_sequences() -> bool {
    std::env::var("PRESENCE_RECLAIM_SEQUENCES")
        .ok()
        .and_then(|v| parse_flag(&v))
        .unwrap_or(DEFAULT_RECLAIM_SEQUENCES)
}

/// Directory for rolling log files. Logs go to stderr when unset.
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var("PRESENCE_LOG_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
