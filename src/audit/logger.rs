//! Append-only audit log file
//!
//! Each record is written as a single JSON line (JSONL). The same format
//! backs both the audit log and the outbox of undelivered records.
//!
//! A batch is appended with one write. If that write fails the file is cut
//! back to its previous length. A line left unterminated by a crash is
//! skipped when reading and removed before the next append.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use crate::error::{AuditrailError, AuditrailResult};

use super::entry::AuditRecord;

/// Reads and appends audit records in a JSON-lines file
#[derive(Debug, Clone)]
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    /// Create a new AuditLogger that writes to the specified path
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append a batch of records and sync once at the end
    ///
    /// An empty batch does not touch the file.
    pub fn log_batch(&self, records: &[AuditRecord]) -> AuditrailResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        // Serialize everything first so a bad record never leaves a partial batch
        let mut buffer = String::new();
        for record in records {
            let json = serde_json::to_string(record).map_err(|e| {
                AuditrailError::Json(format!("Failed to serialize audit record: {}", e))
            })?;
            buffer.push_str(&json);
            buffer.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| AuditrailError::Io(format!("Failed to open audit log: {}", e)))?;

        let start = self.drop_torn_tail(&mut file)?;

        let written = file
            .write_all(buffer.as_bytes())
            .and_then(|()| file.sync_all());

        if let Err(e) = written {
            if let Err(truncate_err) = file.set_len(start) {
                tracing::error!(
                    log = %self.log_path.display(),
                    error = %truncate_err,
                    "failed to roll back partial audit batch"
                );
            }
            return Err(AuditrailError::Io(format!(
                "Failed to write audit records: {}",
                e
            )));
        }

        Ok(())
    }

    /// Cut an unterminated last line, returning the resulting file length
    fn drop_torn_tail(&self, file: &mut File) -> AuditrailResult<u64> {
        let io_err = |e: std::io::Error| {
            AuditrailError::Io(format!("Failed to inspect audit log: {}", e))
        };

        let len = file.metadata().map_err(io_err)?.len();
        if len == 0 {
            return Ok(0);
        }

        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1)).map_err(io_err)?;
        file.read_exact(&mut last).map_err(io_err)?;
        if last[0] == b'\n' {
            return Ok(len);
        }

        let mut contents = Vec::new();
        file.seek(SeekFrom::Start(0)).map_err(io_err)?;
        file.read_to_end(&mut contents).map_err(io_err)?;
        let keep = contents
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |pos| pos as u64 + 1);

        file.set_len(keep).map_err(io_err)?;
        tracing::warn!(
            log = %self.log_path.display(),
            dropped_bytes = len - keep,
            "removed unterminated line from audit log"
        );
        Ok(keep)
    }

    /// Read all records from the log file
    ///
    /// Returns records in the order they were written (oldest first). An
    /// unterminated last line is skipped.
    pub fn read_all(&self) -> AuditrailResult<Vec<AuditRecord>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.log_path)
            .map_err(|e| AuditrailError::Io(format!("Failed to read audit log: {}", e)))?;

        let terminated = contents.ends_with('\n');
        let lines: Vec<&str> = contents.lines().collect();
        let mut records = Vec::with_capacity(lines.len());

        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<AuditRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) if !terminated && index + 1 == lines.len() => {
                    tracing::warn!(
                        log = %self.log_path.display(),
                        line = index + 1,
                        error = %e,
                        "skipping unterminated audit log line"
                    );
                }
                Err(e) => {
                    return Err(AuditrailError::Json(format!(
                        "Failed to parse audit record at line {}: {}",
                        index + 1,
                        e
                    )));
                }
            }
        }

        Ok(records)
    }

    /// Read the most recent N records from the log
    pub fn read_recent(&self, count: usize) -> AuditrailResult<Vec<AuditRecord>> {
        let all = self.read_all()?;
        let start = all.len().saturating_sub(count);
        Ok(all[start..].to_vec())
    }

    /// Get the number of records in the log
    pub fn entry_count(&self) -> AuditrailResult<usize> {
        Ok(self.read_all()?.len())
    }

    /// Remove the log file, if present
    pub fn clear(&self) -> AuditrailResult<()> {
        if self.log_path.exists() {
            fs::remove_file(&self.log_path)
                .map_err(|e| AuditrailError::Io(format!("Failed to clear audit log: {}", e)))?;
        }
        Ok(())
    }

    /// Check if the log file exists
    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    /// Get the path to the log file
    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}
