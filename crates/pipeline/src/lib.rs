//! Sequential pipeline driver.
//!
//! Walks the input observations in file order, cleans each frame through
//! the configured backend, and appends the resulting record — success or
//! failure — before moving on. Exactly one completion call is in flight
//! at any time, which keeps output ordering deterministic and respects
//! the upstream rate limit. One frame's failure never aborts the run; a
//! permanent service failure does, since it would recur for every
//! remaining frame, leaving the output a consistent prefix.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use stackscan_core::{CleanedFrame, FrameCleaner, FrameStatus, ServiceError, StoreError};
use stackscan_store::{FrameReader, RecordWriter};

/// End-of-run accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub ok: usize,
    pub parse_failed: usize,
    pub service_failed: usize,
    /// Input lines that did not decode to an observation.
    pub skipped_input: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cleaned {} frames in {}s: {} ok, {} parse_failed, {} service_failed ({} input lines skipped)",
            self.total,
            (self.finished_at - self.started_at).num_seconds(),
            self.ok,
            self.parse_failed,
            self.service_failed,
            self.skipped_input,
        )
    }
}

/// Drives the clean-and-persist loop over every frame.
pub struct PipelineDriver {
    cleaner: Arc<dyn FrameCleaner>,
}

impl PipelineDriver {
    pub fn new(cleaner: Arc<dyn FrameCleaner>) -> Self {
        Self { cleaner }
    }

    /// Process every observation from `reader`, appending one record per
    /// frame to `writer` in input order.
    pub async fn run(
        &self,
        reader: &FrameReader,
        writer: &mut RecordWriter,
    ) -> Result<RunSummary> {
        let started_at = Utc::now();
        let mut summary = RunSummary {
            started_at,
            finished_at: started_at,
            total: 0,
            ok: 0,
            parse_failed: 0,
            service_failed: 0,
            skipped_input: 0,
        };

        info!(backend = self.cleaner.name(), "Starting cleaning run");

        for item in reader.iter().context("Failed to open input dataset")? {
            let frame = match item {
                Ok(frame) => frame,
                Err(err @ StoreError::Decode { .. }) => {
                    warn!(error = %err, "Skipping undecodable input line");
                    summary.skipped_input += 1;
                    continue;
                }
                // An I/O failure mid-stream means the rest of the input is
                // unreachable; nothing useful can be done per frame.
                Err(err) => return Err(err).context("Input dataset became unreadable"),
            };

            summary.total += 1;
            debug!(filepath = %frame.filepath, fragments = frame.raw_text.len(), "Cleaning frame");

            let record = match self.cleaner.clean(&frame).await {
                Ok(record) => record,
                Err(err @ ServiceError::Permanent(_)) => {
                    return Err(err).with_context(|| {
                        format!(
                            "Permanent service failure on {}; aborting run \
                             (output holds {} completed frames)",
                            frame.filepath,
                            writer.written()
                        )
                    });
                }
                Err(err) => {
                    warn!(filepath = %frame.filepath, error = %err, "Service failed for frame");
                    CleanedFrame::failed(&frame.filepath, FrameStatus::ServiceFailed)
                }
            };

            match record.status {
                FrameStatus::Ok => summary.ok += 1,
                FrameStatus::ParseFailed => summary.parse_failed += 1,
                FrameStatus::ServiceFailed => summary.service_failed += 1,
            }

            writer
                .append(&record)
                .context("Failed to append cleaned record")?;

            info!(
                filepath = %frame.filepath,
                status = %record.status,
                players = record.players.len(),
                "Frame done"
            );
        }

        summary.finished_at = Utc::now();
        info!(%summary, "Cleaning run finished");
        Ok(summary)
    }
}
