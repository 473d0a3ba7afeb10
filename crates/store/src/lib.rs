//! JSONL frame record store.
//!
//! Input side: lazy line-by-line reader of raw frame observations.
//! Output side: append-only writer where one `append` is one complete,
//! independently parseable line — a crash after N appends leaves exactly
//! N valid records and no torn write.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use stackscan_core::{CleanedFrame, FrameObservation, StoreError};

/// Lazy reader over the raw observation file.
///
/// Re-opening an unchanged file yields the same sequence, so a run can be
/// restarted deterministically.
pub struct FrameReader {
    path: PathBuf,
}

impl FrameReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        // Fail early on an unreadable input rather than on the first frame.
        File::open(&path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { path })
    }

    /// Iterate over observations in file order.
    ///
    /// Each item is either a decoded observation or a per-line error
    /// (unreadable line or invalid JSON) that the caller may skip.
    pub fn iter(&self) -> Result<FrameIter, StoreError> {
        let file = File::open(&self.path).map_err(|source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(FrameIter {
            lines: BufReader::new(file).lines(),
            path: self.path.display().to_string(),
            line_no: 0,
        })
    }
}

pub struct FrameIter {
    lines: std::io::Lines<BufReader<File>>,
    path: String,
    line_no: usize,
}

impl Iterator for FrameIter {
    type Item = Result<FrameObservation, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(source) => {
                    return Some(Err(StoreError::Io {
                        path: self.path.clone(),
                        source,
                    }))
                }
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(
                serde_json::from_str(&line).map_err(|source| StoreError::Decode {
                    line: self.line_no,
                    source,
                }),
            );
        }
    }
}

/// Append-only writer for cleaned frame records.
pub struct RecordWriter {
    writer: BufWriter<File>,
    path: String,
    written: usize,
}

impl RecordWriter {
    /// Create (truncate) the output file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path_str = path.as_ref().display().to_string();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path.as_ref())
            .map_err(|source| StoreError::Io {
                path: path_str.clone(),
                source,
            })?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path_str,
            written: 0,
        })
    }

    /// Write one record as a single line and flush it to the OS.
    ///
    /// The line is serialized fully before any byte reaches the writer, and
    /// the buffer is flushed per record, so readers never see a partial
    /// record and can consume the file while the run is still in progress.
    pub fn append(&mut self, record: &CleanedFrame) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record).map_err(StoreError::Encode)?;
        line.push('\n');
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.flush())
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;
        self.written += 1;
        debug!(path = %self.path, records = self.written, "Appended record");
        Ok(())
    }

    /// Number of records appended through this writer.
    pub fn written(&self) -> usize {
        self.written
    }
}
