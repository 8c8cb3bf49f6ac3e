//! Activity journal: one JSON object per line for every workflow milestone.
//!
//! Lines are assembled in memory and written with a single `write_all`, then
//! flushed, so a reader tailing the file never sees partial lines.
//!
//! Degradation chain:
//! 1. Journal file
//! 2. stderr with `[CS-JOURNAL]` prefix
//! 3. Silent discard (the console must never stop for journal failures)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::errors::{CsError, Result};

/// Rotate once the journal grows past this size.
const MAX_JOURNAL_BYTES: u64 = 4 * 1024 * 1024;
/// Rotated journals kept next to the live one.
const MAX_ROTATED: u32 = 3;

/// Journal event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ConsoleStart,
    ConsoleStop,
    UsbMounted,
    UsbUnmounted,
    TransactionRead,
    TransactionSigned,
    SignDeclined,
    DeviceTrusted,
    DevicesEjected,
    WorkflowFailed,
}

/// A single journal line. Only `ts` and `event` are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// RFC 3339 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl JournalEntry {
    #[must_use]
    pub fn new(event: EventType) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            device: None,
            path: None,
            size_bytes: None,
            outputs: None,
            error_code: None,
            details: None,
        }
    }

    #[must_use]
    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    #[must_use]
    pub fn path(mut self, path: &Path) -> Self {
        self.path = Some(path.display().to_string());
        self
    }

    #[must_use]
    pub const fn size_bytes(mut self, size: u64) -> Self {
        self.size_bytes = Some(size);
        self
    }

    #[must_use]
    pub const fn outputs(mut self, outputs: usize) -> Self {
        self.outputs = Some(outputs);
        self
    }

    #[must_use]
    pub fn error(mut self, err: &CsError) -> Self {
        self.error_code = Some(err.code().to_string());
        self.details = Some(err.to_string());
        self
    }

    #[must_use]
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Stderr,
    Discard,
}

#[derive(Debug)]
struct JournalWriter {
    path: Option<PathBuf>,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl JournalWriter {
    fn open(path: &Path) -> Self {
        let mut w = Self {
            path: Some(path.to_path_buf()),
            writer: None,
            state: WriterState::Stderr,
            bytes_written: 0,
        };
        match open_append(path) {
            Ok((file, size)) => {
                w.writer = Some(BufWriter::new(file));
                w.state = WriterState::Normal;
                w.bytes_written = size;
            }
            Err(err) => {
                let _ = writeln!(io::stderr(), "[CS-JOURNAL] {err}, using stderr");
            }
        }
        w
    }

    const fn discard() -> Self {
        Self {
            path: None,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        }
    }

    fn write_entry(&mut self, entry: &JournalEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[CS-JOURNAL] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
    }

    fn write_line(&mut self, line: &str) {
        if self.state == WriterState::Normal
            && self.bytes_written + line.len() as u64 > MAX_JOURNAL_BYTES
        {
            self.rotate();
        }

        match self.state {
            WriterState::Normal => {
                let written = self.writer.as_mut().is_some_and(|w| {
                    w.write_all(line.as_bytes()).is_ok() && w.flush().is_ok()
                });
                if written {
                    self.bytes_written += line.len() as u64;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[CS-JOURNAL] {line}").is_err() {
                    self.degrade();
                }
            }
            WriterState::Discard => {}
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        self.state = match self.state {
            WriterState::Normal => WriterState::Stderr,
            WriterState::Stderr | WriterState::Discard => WriterState::Discard,
        };
    }

    fn rotate(&mut self) {
        self.writer = None;
        let Some(base) = self.path.clone() else {
            return;
        };
        for i in (1..MAX_ROTATED).rev() {
            let _ = fs::rename(rotated_name(&base, i), rotated_name(&base, i + 1));
        }
        let _ = fs::rename(&base, rotated_name(&base, 1));
        match open_append(&base) {
            Ok((file, _)) => {
                self.writer = Some(BufWriter::new(file));
                self.bytes_written = 0;
            }
            Err(_) => self.degrade(),
        }
    }
}

/// Shared handle to the activity journal.
#[derive(Debug, Clone)]
pub struct ActivityJournal {
    inner: Arc<Mutex<JournalWriter>>,
}

impl ActivityJournal {
    /// Append to `path`, creating parent directories. Falls back to stderr.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        Self {
            inner: Arc::new(Mutex::new(JournalWriter::open(path))),
        }
    }

    /// Journal that drops every entry.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(Mutex::new(JournalWriter::discard())),
        }
    }

    pub fn record(&self, entry: &JournalEntry) {
        self.inner.lock().write_entry(entry);
    }

    #[must_use]
    pub fn state(&self) -> &'static str {
        match self.inner.lock().state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }
}

/// Parse a journal file back into entries, skipping malformed lines.
pub fn read_entries(path: &Path) -> Result<Vec<JournalEntry>> {
    let raw = fs::read_to_string(path).map_err(|source| CsError::io(path, source))?;
    Ok(raw
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}

fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| CsError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| CsError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
