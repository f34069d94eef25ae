//! RotatingLog - size-bounded log file with numbered backups
//!
//! Layout on disk: the active file at `path`, backups at `path-0` (newest)
//! through `path-(max_backups-1)` (oldest).

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

use crate::error::LogError;
use crate::rotation::{self, RotationStep};

/// Size-bounded append-only log
#[derive(Debug, Clone)]
pub struct RotatingLog {
    path: PathBuf,
    max_size: u64,
    max_backups: u32,
}

impl RotatingLog {
    /// Create a rotating log; nothing is touched on disk yet
    pub fn new(path: impl Into<PathBuf>, max_size: u64, max_backups: u32) -> Self {
        Self {
            path: path.into(),
            max_size,
            max_backups,
        }
    }

    /// Active file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of backup `index`
    pub fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!("-{index}"));
        PathBuf::from(name)
    }

    /// Create parent directories and check the active file can be opened
    ///
    /// # Errors
    /// Returns [`LogError::Open`] when the file is not writable.
    pub fn ensure_writable(&self) -> Result<(), LogError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| LogError::Open {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }
        self.open_active().map(drop)
    }

    /// Append one line, rotating first if the active file is full
    ///
    /// A `\n` is added when `line` does not end with one.
    pub fn append_line(&self, line: &str) -> Result<(), LogError> {
        if line.ends_with('\n') {
            self.append(line.as_bytes())
        } else {
            let mut buf = Vec::with_capacity(line.len() + 1);
            buf.extend_from_slice(line.as_bytes());
            buf.push(b'\n');
            self.append(&buf)
        }
    }

    /// Append raw bytes, rotating first if the active file is full
    pub fn append(&self, bytes: &[u8]) -> Result<(), LogError> {
        if self.current_size() >= self.max_size {
            self.rotate()?;
        }

        let mut file = self.open_active()?;
        file.write_all(bytes).map_err(|source| LogError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Size of the active file, 0 when absent
    pub fn current_size(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// Number of contiguous backups starting at `path-0`
    pub fn backup_count(&self) -> u32 {
        (0..self.max_backups)
            .take_while(|i| self.backup_path(*i).exists())
            .count() as u32
    }

    /// Rotate now, regardless of size
    ///
    /// The active file is never held open across a rotation: every append
    /// opens and closes it.
    pub fn rotate(&self) -> Result<(), LogError> {
        let existing = self.backup_count();
        for step in rotation::plan(existing, self.max_backups) {
            self.apply(step)?;
        }
        Ok(())
    }

    fn apply(&self, step: RotationStep) -> Result<(), LogError> {
        let result = match step {
            RotationStep::RemoveBackup(n) => remove_if_exists(&self.backup_path(n)),
            RotationStep::ShiftBackup { from, to } => {
                rename_if_exists(&self.backup_path(from), &self.backup_path(to))
            }
            RotationStep::ActiveToBackup => rename_if_exists(&self.path, &self.backup_path(0)),
            RotationStep::RemoveActive => remove_if_exists(&self.path),
        };
        result.map_err(|source| LogError::Rotate {
            path: self.path.clone(),
            source,
        })
    }

    fn open_active(&self) -> Result<fs::File, LogError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| LogError::Open {
                path: self.path.clone(),
                source,
            })
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn rename_if_exists(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// `tracing_subscriber` writer that routes formatted events into a
/// [`RotatingLog`]
#[derive(Debug, Clone)]
pub struct RotatingWriter {
    log: Arc<Mutex<RotatingLog>>,
}

impl RotatingWriter {
    pub fn new(log: RotatingLog) -> Self {
        Self {
            log: Arc::new(Mutex::new(log)),
        }
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let log = self
            .log
            .lock()
            .map_err(|_| io::Error::other("rotating log lock poisoned"))?;
        log.append(buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for RotatingWriter {
    type Writer = RotatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_backup_path_naming() {
        let log = RotatingLog::new("/var/log/fwd/error.log", 10, 3);
        assert_eq!(log.backup_path(0), PathBuf::from("/var/log/fwd/error.log-0"));
        assert_eq!(log.backup_path(2), PathBuf::from("/var/log/fwd/error.log-2"));
    }

    #[test]
    fn test_single_rotation_keeps_new_lines_in_active() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("monitor.log");
        let log = RotatingLog::new(&path, 20, 3);

        // 3 x 8 bytes: the third write sees 16 < 20, no rotation yet
        log.append_line("line-01").unwrap();
        log.append_line("line-02").unwrap();
        log.append_line("line-03").unwrap();
        assert!(!log.backup_path(0).exists());

        // 24 >= 20: rotate before writing
        log.append_line("line-04").unwrap();

        assert_eq!(log.backup_count(), 1);
        assert_eq!(read(&log.backup_path(0)), "line-01\nline-02\nline-03\n");
        assert_eq!(read(&path), "line-04\n");
        assert!(!log.backup_path(1).exists());
    }

    #[test]
    fn test_eviction_never_exceeds_max_backups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("error.log");
        // every line fills the file, so each append after the first rotates
        let log = RotatingLog::new(&path, 1, 3);

        for i in 0..10 {
            log.append_line(&format!("gen-{i}")).unwrap();
            assert!(log.backup_count() <= 3);
            assert!(!log.backup_path(3).exists());
        }

        assert_eq!(read(&path), "gen-9\n");
        assert_eq!(read(&log.backup_path(0)), "gen-8\n");
        assert_eq!(read(&log.backup_path(1)), "gen-7\n");
        assert_eq!(read(&log.backup_path(2)), "gen-6\n");
    }

    #[test]
    fn test_zero_backups_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("error.log");
        let log = RotatingLog::new(&path, 1, 0);

        log.append_line("old").unwrap();
        log.append_line("new").unwrap();

        assert_eq!(read(&path), "new\n");
        assert!(!log.backup_path(0).exists());
    }

    #[test]
    fn test_ensure_writable_creates_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/error.log");
        let log = RotatingLog::new(&path, 100, 2);
        log.ensure_writable().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_open_failure() {
        let dir = tempdir().unwrap();
        // a directory cannot be opened for append
        let log = RotatingLog::new(dir.path(), u64::MAX, 2);
        let err = log.append_line("x").unwrap_err();
        assert!(matches!(err, LogError::Open { .. }));
    }

    #[test]
    fn test_writer_appends_through_rotation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.log");
        let mut writer = RotatingWriter::new(RotatingLog::new(&path, 1024, 1));

        writer.write_all(b"first event\n").unwrap();
        writer.make_writer().write_all(b"second event\n").unwrap();

        assert_eq!(read(&path), "first event\nsecond event\n");
    }
}
