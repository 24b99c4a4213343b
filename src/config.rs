//! Fixed file names, table name and column names.
//!
//! Inputs and the store live next to the program itself rather than in the
//! caller's working directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const PRIMARY_CSV: &str = "spotify_data_preprocessed_final.csv";
pub const SECONDARY_CSV: &str = "spotify_songs.csv";
pub const STORE_DB: &str = "app_data.db";
pub const TABLE_NAME: &str = "tracks";

pub const KEY_COLUMN: &str = "track_id";
pub const POPULARITY_COLUMN: &str = "track_popularity";
pub const LIKED_COLUMN: &str = "liked";

/// Columns consumed from the secondary file.
pub const SECONDARY_COLUMNS: [&str; 2] = [KEY_COLUMN, POPULARITY_COLUMN];

/// Resolved locations of both inputs and the store.
#[derive(Clone, Debug)]
pub struct DataPaths {
    pub primary: PathBuf,
    pub secondary: PathBuf,
    pub store: PathBuf,
}

impl DataPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            primary: dir.join(PRIMARY_CSV),
            secondary: dir.join(SECONDARY_CSV),
            store: dir.join(STORE_DB),
        }
    }

    /// Resolve against the directory holding the running executable.
    pub fn beside_executable() -> Result<Self> {
        let exe = std::env::current_exe().context("Failed to locate running executable")?;
        let exe = exe.canonicalize().unwrap_or(exe);
        let dir = exe
            .parent()
            .context("Executable path has no parent directory")?;
        Ok(Self::in_dir(dir))
    }
}
