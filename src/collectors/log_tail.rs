use crate::error::CollectorError;
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::PathBuf;

/// Result of asking a line source for its next line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePoll {
    /// A complete line, without its trailing newline
    Line(String),
    /// Nothing available yet; the caller should back off and ask again
    Pending,
}

/// Pull-based source of raw log lines
///
/// Implementations never block waiting for data: when no complete line is
/// available they return [`SourcePoll::Pending`] and leave the idle delay to
/// the caller.
pub trait LineSource {
    /// Fetch the next complete line, if one is available
    ///
    /// # Errors
    ///
    /// Returns `CollectorError` on an unrecoverable read failure.
    fn next_line(&mut self) -> Result<SourcePoll, CollectorError>;
}

/// Follows an append-only log file, like `tail -F`
///
/// The file may not exist yet; until it appears every poll returns
/// `Pending`. Once opened, reading starts at the current end of file so
/// historical content is never replayed.
pub struct FileTail {
    /// Path of the followed file
    path: PathBuf,
    /// Open reader, once the file exists
    reader: Option<BufReader<File>>,
    /// Byte offset of the next unread byte
    position: u64,
    /// Bytes of a line whose newline has not been written yet
    partial: Vec<u8>,
    /// Whether the "waiting for file" message was already logged
    announced_wait: bool,
}

impl FileTail {
    /// Create a tail for the given path without touching the filesystem
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use poolwatch::collectors::{FileTail, LineSource};
    ///
    /// let mut tail = FileTail::new("/var/log/nginx/monitoring.log");
    /// let _ = tail.next_line();
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reader: None,
            position: 0,
            partial: Vec::new(),
            announced_wait: false,
        }
    }

    /// Whether the file has been found and opened
    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Try to open the file and position at its end
    ///
    /// Returns `Ok(false)` while the file does not exist.
    fn try_open(&mut self) -> Result<bool, CollectorError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if !self.announced_wait {
                    info!("Waiting for {}...", self.path.display());
                    self.announced_wait = true;
                }
                return Ok(false);
            }
            Err(e) => return Err(CollectorError::IoError(e)),
        };

        if file.metadata()?.is_dir() {
            return Err(CollectorError::ParseError(format!(
                "log path is a directory: {}",
                self.path.display()
            )));
        }

        self.position = file.seek(SeekFrom::End(0))?;
        self.reader = Some(BufReader::new(file));
        self.partial.clear();
        info!(
            "Found {}, monitoring from offset {}",
            self.path.display(),
            self.position
        );
        Ok(true)
    }

    /// Rewind to the start if the file shrank below our read position
    fn rewind_if_truncated(&mut self) -> Result<(), CollectorError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(());
        };

        let len = reader.get_ref().metadata()?.len();
        if len < self.position {
            warn!(
                "{} was truncated ({} < {}), reading from the start",
                self.path.display(),
                len,
                self.position
            );
            reader.seek(SeekFrom::Start(0))?;
            self.position = 0;
            self.partial.clear();
        }
        Ok(())
    }
}

impl LineSource for FileTail {
    fn next_line(&mut self) -> Result<SourcePoll, CollectorError> {
        if self.reader.is_none() && !self.try_open()? {
            return Ok(SourcePoll::Pending);
        }

        let read = match self.reader.as_mut() {
            Some(reader) => reader.read_until(b'\n', &mut self.partial)?,
            None => return Ok(SourcePoll::Pending),
        };

        if read == 0 {
            self.rewind_if_truncated()?;
            return Ok(SourcePoll::Pending);
        }
        self.position += read as u64;

        if !self.partial.ends_with(b"\n") {
            debug!("Buffered partial line ({} bytes)", self.partial.len());
            return Ok(SourcePoll::Pending);
        }

        let raw = std::mem::take(&mut self.partial);
        let line = String::from_utf8_lossy(&raw);
        Ok(SourcePoll::Line(
            line.trim_end_matches(&['\n', '\r'][..]).to_string(),
        ))
    }
}

/// In-memory line source
///
/// Yields queued lines in order, then reports `Pending`.
#[derive(Debug, Default)]
pub struct MemorySource {
    lines: VecDeque<String>,
}

impl MemorySource {
    /// Create a source pre-loaded with lines
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Queue another line
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
    }

    /// Number of lines not yet consumed
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for MemorySource {
    fn next_line(&mut self) -> Result<SourcePoll, CollectorError> {
        Ok(match self.lines.pop_front() {
            Some(line) => SourcePoll::Line(line),
            None => SourcePoll::Pending,
        })
    }
}
