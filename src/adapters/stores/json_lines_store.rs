use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::app_config::AuditSection;
use crate::core::errors::{Result, RevtrailError};
use crate::core::models::audit_record::AuditRecord;
use crate::core::models::reference::EntityRef;
use crate::core::traits::store::{AuditFilter, AuditStore, InsertOutcome};

/// Audit store that appends records as JSON lines to a file.
///
/// Each line is one self-contained row in the flat column layout. Writers
/// take an exclusive OS lock on a sibling `.lock` file for the whole
/// check-and-append, so every handle and every process writing the same
/// log is serialized.
pub struct JsonLinesAuditStore {
    log_path: PathBuf,
    lock_path: PathBuf,
}

/// Holds the exclusive lock until dropped.
struct WriteLock(File);

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = self.0.unlock();
    }
}

impl JsonLinesAuditStore {
    /// Create a store that writes to `{dir}/{log_file}`.
    pub fn new(dir: &Path, log_file: &str) -> Self {
        Self {
            log_path: dir.join(log_file),
            lock_path: dir.join(format!("{log_file}.lock")),
        }
    }

    /// Create a store from the `[audit]` section, falling back to
    /// `audit.log` when the section is missing.
    pub fn from_config(dir: &Path, audit_section: Option<&AuditSection>) -> Self {
        let log_file = audit_section
            .map(|a| a.log_file.as_str())
            .unwrap_or("audit.log");
        Self::new(dir, log_file)
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    fn lock(&self) -> Result<WriteLock> {
        if let Some(parent) = self.lock_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| RevtrailError::StorageUnavailable {
                detail: format!("Cannot open lock file {}: {e}", self.lock_path.display()),
            })?;
        file.lock().map_err(|e| RevtrailError::StorageUnavailable {
            detail: format!("Cannot lock {}: {e}", self.lock_path.display()),
        })?;
        Ok(WriteLock(file))
    }

    /// Read every well-formed record in file order.
    ///
    /// Lines that do not parse, including ones that are not valid UTF-8,
    /// are skipped with a warning: a damaged entry must not hide the rest
    /// of the history.
    fn read_all(&self) -> Result<Vec<AuditRecord>> {
        Ok(self
            .read_lines()?
            .into_iter()
            .filter_map(|(line_num, line)| parse_line(&self.log_path, line_num, &line))
            .collect())
    }

    /// Raw non-blank lines with their 1-based line numbers.
    fn read_lines(&self) -> Result<Vec<(usize, Vec<u8>)>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path).map_err(|e| RevtrailError::StorageUnavailable {
            detail: format!("Cannot read audit log {}: {e}", self.log_path.display()),
        })?;

        let mut lines = Vec::new();
        for (idx, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = line.map_err(|e| RevtrailError::StorageUnavailable {
                detail: format!("Error reading audit log line {}: {e}", idx + 1),
            })?;
            if !line.trim_ascii().is_empty() {
                lines.push((idx + 1, line));
            }
        }
        Ok(lines)
    }

    fn append(&self, record: &AuditRecord) -> Result<()> {
        let line = serde_json::to_string(record).map_err(|e| RevtrailError::StorageUnavailable {
            detail: format!("Failed to serialize audit record: {e}"),
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| RevtrailError::StorageUnavailable {
                detail: format!("Cannot open audit log at {}: {e}", self.log_path.display()),
            })?;

        writeln!(file, "{line}").map_err(|e| RevtrailError::StorageUnavailable {
            detail: format!("Failed to write audit record: {e}"),
        })?;

        Ok(())
    }
}

fn parse_line(path: &Path, line_num: usize, line: &[u8]) -> Option<AuditRecord> {
    match serde_json::from_slice(line.trim_ascii()) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(
                log = %path.display(),
                line = line_num,
                error = %e,
                "skipping malformed audit line"
            );
            None
        }
    }
}

impl AuditStore for JsonLinesAuditStore {
    fn max_version(&self, entity: &EntityRef) -> Result<Option<u32>> {
        Ok(self
            .read_all()?
            .iter()
            .filter(|r| r.entity == *entity)
            .map(|r| r.version)
            .max())
    }

    fn insert_next(&self, record: &AuditRecord) -> Result<InsertOutcome> {
        let _lock = self.lock()?;
        let expected = self.max_version(&record.entity)?.unwrap_or(0) + 1;
        if record.version != expected {
            return Ok(InsertOutcome::Conflict);
        }
        self.append(record)?;
        Ok(InsertOutcome::Inserted)
    }

    fn records(&self, entity: &EntityRef, up_to: Option<u32>) -> Result<Vec<AuditRecord>> {
        let mut records: Vec<AuditRecord> = self
            .read_all()?
            .into_iter()
            .filter(|r| r.entity == *entity && up_to.is_none_or(|max| r.version <= max))
            .collect();
        records.sort_by_key(|r| r.version);

        let mut seen = BTreeSet::new();
        for record in &records {
            if !seen.insert(record.version) {
                tracing::warn!(
                    entity = %entity,
                    version = record.version,
                    log = %self.log_path.display(),
                    "duplicate version in audit log"
                );
            }
        }
        Ok(records)
    }

    fn latest_at(&self, entity: &EntityRef, at: DateTime<Utc>) -> Result<Option<AuditRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.entity == *entity && r.created_at <= at)
            .max_by_key(|r| (r.created_at, r.version)))
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect())
    }

    fn remove(&self, entity: &EntityRef, version: u32) -> Result<bool> {
        let _lock = self.lock()?;
        let lines = self.read_lines()?;

        let mut removed = false;
        let mut kept = Vec::new();
        for (line_num, line) in lines {
            let is_target = parse_line(&self.log_path, line_num, &line)
                .is_some_and(|r| r.entity == *entity && r.version == version);
            if is_target {
                removed = true;
            } else {
                kept.extend_from_slice(&line);
                kept.push(b'\n');
            }
        }

        if removed {
            let tmp = self.log_path.with_extension("tmp");
            fs::write(&tmp, kept)?;
            fs::rename(&tmp, &self.log_path)?;
        }
        Ok(removed)
    }
}
