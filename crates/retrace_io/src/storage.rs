//! Append-only line storage for session logs.
//!
//! Stores never interpret line contents. A store holds at most one open
//! write handle; concurrent writers to the same log are not supported.

use crate::error::{IoError, Result};
use crate::naming::sanitize_name;
use retrace_data::LOG_EXTENSION;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Directory used when no other location is configured.
pub const DEFAULT_RECORDINGS_DIR: &str = "recordings";

/// Durable storage for session logs.
pub trait LogStore {
    /// Creates or truncates the log for `name` and makes it the write target.
    fn open_for_write(&mut self, name: &str) -> Result<()>;
    /// Appends one line; a terminator is added by the store.
    fn append_line(&mut self, line: &str) -> Result<()>;
    /// Forces appended lines to the backing store.
    fn flush(&mut self) -> Result<()>;
    /// Flushes and releases the write handle. Safe to call repeatedly.
    fn close_write(&mut self) -> Result<()>;
    /// Identifiers of every stored log, sorted. Empty when none exist.
    fn list_recordings(&self) -> Result<Vec<String>>;
    /// Every line of the named log in file order. Empty when it does not exist.
    /// Names that are paths rather than plain file names are rejected.
    fn read_all(&self, name: &str) -> Result<Vec<String>>;
}

/// Log file name for a name given to `read_all`, which must name a file
/// inside the store.
fn stored_file_name(name: &str) -> Result<String> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(IoError::validation(format!("not a recording name: {name:?}")));
    }
    Ok(file_name_for(name))
}

fn file_name_for(name: &str) -> String {
    let suffix = format!(".{LOG_EXTENSION}");
    if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

/// Stores each log as `<dir>/<sanitized name>.jsonl`.
pub struct FileLogStore {
    dir: PathBuf,
    writer: Option<BufWriter<File>>,
    current: Option<PathBuf>,
}

impl Default for FileLogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileLogStore {
    pub fn new() -> Self {
        Self::new_at(DEFAULT_RECORDINGS_DIR)
    }

    pub fn new_at<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            writer: None,
            current: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the log currently open for writing.
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_deref()
    }
}

impl LogStore for FileLogStore {
    fn open_for_write(&mut self, name: &str) -> Result<()> {
        let safe = sanitize_name(name);
        if safe.is_empty() {
            return Err(IoError::validation("recording name is empty"));
        }
        self.close_write()?;
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| IoError::from(e).with_context(format!("creating {}", self.dir.display())))?;
        let path = self.dir.join(file_name_for(&safe));
        let file = File::create(&path)
            .map_err(|e| IoError::from(e).with_context(format!("opening {}", path.display())))?;
        tracing::debug!(path = %path.display(), "Opened recording for write");
        self.writer = Some(BufWriter::new(file));
        self.current = Some(path);
        Ok(())
    }

    fn append_line(&mut self, line: &str) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(IoError::WriterNotOpen)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn close_write(&mut self) -> Result<()> {
        let result = match self.writer.take() {
            Some(mut writer) => writer.flush().map_err(IoError::from),
            None => Ok(()),
        };
        self.current = None;
        result
    }

    fn list_recordings(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let suffix = format!(".{LOG_EXTENSION}");
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(&suffix))
            .collect();
        names.sort();
        Ok(names)
    }

    fn read_all(&self, name: &str) -> Result<Vec<String>> {
        let path = self.dir.join(stored_file_name(name)?);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_owned)
            .collect())
    }
}

#[derive(Default)]
struct MemoryState {
    logs: HashMap<String, Vec<String>>,
    current: Option<String>,
    pending: Vec<String>,
    fail_open: bool,
    fail_append: bool,
}

/// In-process store. Clones share the same logs, so a test can keep a handle
/// while a recorder owns another.
///
/// Appended lines only become visible to `read_all` once flushed.
#[derive(Clone, Default)]
pub struct MemoryLogStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Makes every subsequent `open_for_write` fail.
    pub fn set_fail_open(&self, fail: bool) {
        self.lock().fail_open = fail;
    }

    /// Makes every subsequent `append_line` fail.
    pub fn set_fail_append(&self, fail: bool) {
        self.lock().fail_append = fail;
    }

    /// Inserts a complete log, replacing any existing one.
    pub fn insert(&self, name: &str, lines: Vec<String>) {
        self.lock().logs.insert(file_name_for(name), lines);
    }

    /// Whether a write handle is currently open.
    pub fn is_open(&self) -> bool {
        self.lock().current.is_some()
    }

    /// Lines appended since the last flush.
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }
}

impl LogStore for MemoryLogStore {
    fn open_for_write(&mut self, name: &str) -> Result<()> {
        let safe = sanitize_name(name);
        if safe.is_empty() {
            return Err(IoError::validation("recording name is empty"));
        }
        self.close_write()?;
        let mut state = self.lock();
        if state.fail_open {
            return Err(IoError::FileSystem(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "store is read-only",
            )));
        }
        let key = file_name_for(&safe);
        state.logs.insert(key.clone(), Vec::new());
        state.current = Some(key);
        Ok(())
    }

    fn append_line(&mut self, line: &str) -> Result<()> {
        let mut state = self.lock();
        if state.current.is_none() {
            return Err(IoError::WriterNotOpen);
        }
        if state.fail_append {
            return Err(IoError::FileSystem(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        state.pending.push(line.to_string());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let mut state = self.lock();
        let Some(key) = state.current.clone() else {
            return Ok(());
        };
        let pending = std::mem::take(&mut state.pending);
        state.logs.entry(key).or_default().extend(pending);
        Ok(())
    }

    fn close_write(&mut self) -> Result<()> {
        self.flush()?;
        self.lock().current = None;
        Ok(())
    }

    fn list_recordings(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.lock().logs.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn read_all(&self, name: &str) -> Result<Vec<String>> {
        let key = stored_file_name(name)?;
        Ok(self.lock().logs.get(&key).cloned().unwrap_or_default())
    }
}
