//! # Backup Service
//!
//! Timestamped copies of the SQLite database file. Simple file copies are
//! adequate here: the back office is single-process and backups run while
//! the cashier is idle.

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::AppError;

/// Database file backup/restore.
#[derive(Debug, Clone)]
pub struct BackupService {
    database_path: PathBuf,
    backup_dir: PathBuf,
}

impl BackupService {
    /// Creates a backup service for the given database file.
    pub fn new(database_path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        BackupService {
            database_path: database_path.into(),
            backup_dir: backup_dir.into(),
        }
    }

    /// Copies the database to `backup_dir/backup_{timestamp}.db`.
    pub fn create_backup(&self) -> Result<PathBuf, AppError> {
        if !self.database_path.exists() {
            return Err(AppError::not_found(
                "Database file",
                self.database_path.display(),
            ));
        }

        fs::create_dir_all(&self.backup_dir)
            .map_err(|e| AppError::internal(format!("Cannot create backup directory: {e}")))?;

        let name = format!("backup_{}.db", Utc::now().format("%Y%m%d_%H%M%S"));
        let target = self.backup_dir.join(name);

        fs::copy(&self.database_path, &target)
            .map_err(|e| AppError::internal(format!("Backup failed: {e}")))?;

        info!(target = %target.display(), "Database backup created");
        Ok(target)
    }

    /// Restores the database from a backup file.
    ///
    /// The running pool must be closed first; callers restore before
    /// opening the database, not mid-session.
    pub fn restore(&self, backup_file: &Path) -> Result<(), AppError> {
        if !backup_file.exists() {
            return Err(AppError::not_found("Backup file", backup_file.display()));
        }

        fs::copy(backup_file, &self.database_path)
            .map_err(|e| AppError::internal(format!("Restore failed: {e}")))?;

        info!(source = %backup_file.display(), "Database restored from backup");
        Ok(())
    }

    /// Existing backups, oldest first.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>, AppError> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups: Vec<PathBuf> = fs::read_dir(&self.backup_dir)
            .map_err(|e| AppError::internal(format!("Cannot read backup directory: {e}")))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("backup_") && n.ends_with(".db"))
                    .unwrap_or(false)
            })
            .collect();

        backups.sort();
        Ok(backups)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kirana-backup-test-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn backup_and_restore_round_trip() {
        let dir = temp_dir("roundtrip");
        let db_path = dir.join("kirana.db");
        fs::write(&db_path, b"original-contents").unwrap();

        let service = BackupService::new(&db_path, dir.join("backups"));

        let backup = service.create_backup().unwrap();
        assert!(backup.exists());
        assert_eq!(service.list_backups().unwrap().len(), 1);

        // clobber, then restore
        fs::write(&db_path, b"corrupted").unwrap();
        service.restore(&backup).unwrap();
        assert_eq!(fs::read(&db_path).unwrap(), b"original-contents");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_database_is_an_error() {
        let dir = temp_dir("missing");
        let service = BackupService::new(dir.join("absent.db"), dir.join("backups"));
        assert!(service.create_backup().is_err());
        assert!(service.list_backups().unwrap().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }
}
