//! Database snapshots.
//!
//! A backup is a plain file copy of the database into a `bkp/` folder next
//! to it, named after the current local time. The store connection is
//! closed around the copy so the SQLite file lock is released, and reopened
//! afterwards.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use tally_store::Store;

use crate::error::CommandError;

/// Name of the backup folder, created next to the database file.
const BACKUP_DIR: &str = "bkp";

/// Copy the database file to `bkp/<YYYY-MM-DD_HH-MM-SS>.db`, creating the
/// folder on first use. Returns the path of the copy.
pub fn create_backup(store: &mut Store) -> Result<PathBuf, CommandError> {
    let copied = store.reopen_around(copy_snapshot)?;
    let dest = copied?;
    info!(dest = %dest.display(), "backup written");
    Ok(dest)
}

fn copy_snapshot(db_path: &Path) -> io::Result<PathBuf> {
    let dir = db_path
        .parent()
        .map_or_else(|| PathBuf::from(BACKUP_DIR), |p| p.join(BACKUP_DIR));

    if dir.exists() && !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists and is not a directory", dir.display()),
        ));
    }
    fs::create_dir_all(&dir)?;

    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let dest = dir.join(format!("{stamp}.db"));
    fs::copy(db_path, &dest)?;
    Ok(dest)
}
