//! SpoolStore - on-disk queue of undelivered messages
//!
//! The spool is a flat file of records, each with its trailing `\n`. It exists
//! only while something is outstanding: replay removes it once consumed.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use contracts::Message;
use tracing::{debug, info, instrument};

use crate::error::SpoolError;
use crate::record::split_records;

/// Durable spool file
#[derive(Debug, Clone)]
pub struct SpoolStore {
    path: PathBuf,
}

impl SpoolStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read every spooled record in file order
    ///
    /// An absent spool yields no records.
    ///
    /// # Errors
    /// [`SpoolError::Replay`] when the spool exists but cannot be read.
    #[instrument(name = "spool_load", skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Vec<Message>, SpoolError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(SpoolError::Replay {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let records = split_records(Bytes::from(data));
        info!(records = records.len(), "Loaded spooled messages");
        Ok(records)
    }

    /// Delete the spool after its records have been dispatched
    ///
    /// Returns whether a file was removed.
    pub fn remove(&self) -> Result<bool, SpoolError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Spool removed");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SpoolError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Replace the spool with `message` followed by `backlog`
    ///
    /// Used on the all-brokers-down path; whatever the spool held before is
    /// discarded.
    ///
    /// # Errors
    /// [`SpoolError::Flush`] when the spool cannot be written.
    #[instrument(
        name = "spool_flush",
        skip(self, message, backlog),
        fields(path = %self.path.display(), backlog = backlog.len())
    )]
    pub fn flush(&self, message: &Message, backlog: &[Message]) -> Result<(), SpoolError> {
        let to_err = |source| SpoolError::Flush {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(to_err)?;

        write_records(&mut file, std::iter::once(message).chain(backlog)).map_err(to_err)?;
        file.sync_all().map_err(to_err)?;

        info!(records = backlog.len() + 1, "Spool flushed");
        Ok(())
    }

    /// Append `payloads` to the spool
    ///
    /// Nothing is created when `payloads` is empty. Returns the number of
    /// records written.
    ///
    /// # Errors
    /// [`SpoolError::Persist`] when the spool cannot be written.
    #[instrument(name = "spool_persist", skip(self, payloads), fields(path = %self.path.display()))]
    pub fn persist_backlog(&self, payloads: &[Message]) -> Result<usize, SpoolError> {
        if payloads.is_empty() {
            return Ok(0);
        }

        let to_err = |source| SpoolError::Persist {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(to_err)?;

        write_records(&mut file, payloads.iter()).map_err(to_err)?;
        file.sync_all().map_err(to_err)?;

        info!(records = payloads.len(), "Backlog persisted to spool");
        Ok(payloads.len())
    }
}

fn write_records<'a, W: Write>(
    writer: &mut W,
    records: impl Iterator<Item = &'a Message>,
) -> io::Result<()> {
    let mut buf = io::BufWriter::new(writer);
    for record in records {
        buf.write_all(&record.to_record())?;
    }
    buf.flush()
}
