//! Event datasets and the cursor contract.
//!
//! A dataset is consumed through the [`EventCursor`] trait: one current
//! event at a time, with the run identifier exposed so callers can detect
//! rollovers. [`RunDataset`] is the on-disk implementation over per-run
//! parquet event files; [`MemoryDataset`] is an in-memory implementation
//! for tests and benchmarks.
//!
//! Each run's event file is read fully into Arrow record batches when the
//! cursor enters that run. Per-run files are bounded by the flight's
//! recording cadence; paging run-by-run is what keeps memory flat while
//! walking a multi-terabyte flight.

mod memory;
pub mod tables;

pub use memory::{MemoryDataset, MemoryEvent};
pub use tables::TableChunks;

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{Array, FixedSizeListArray, Int16Array, RecordBatch, UInt32Array, UInt64Array};
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::arrow::ProjectionMask;
use tracing::{debug, info, warn};

use crate::catalog::{self, FileKind, Flight};
use crate::error::{Error, Result};
use crate::event::{CalibratedEvent, NUM_CHANNELS, SAMPLES_PER_CHANNEL};

/// The dataset contract the chunk extractor consumes.
///
/// A cursor is positioned at exactly one current event. Implementations
/// own all file access, run/event bookkeeping and calibration; the
/// extractor only reads identifiers, asks for the calibrated view and
/// advances.
pub trait EventCursor {
    /// Identifier of the current event.
    fn current_event_id(&self) -> u64;

    /// Run the current event belongs to.
    fn current_run(&self) -> u32;

    /// Build the calibrated view of the current event.
    ///
    /// Calibration happens here, fresh per call.
    ///
    /// # Errors
    ///
    /// Implementation-defined; [`RunDataset`] fails with
    /// [`Error::DatasetExhausted`] once the cursor has been advanced past
    /// the final event.
    fn calibrated(&mut self) -> Result<CalibratedEvent>;

    /// Move the cursor to the next event.
    ///
    /// Crossing the last event of a run positions the cursor on the first
    /// event of the next run, changing [`EventCursor::current_run`].
    ///
    /// # Errors
    ///
    /// Implementation-defined; [`RunDataset`] can fail while opening the
    /// next run's file.
    fn advance(&mut self) -> Result<()>;
}

/// Open a parquet file with a by-name column projection.
pub(crate) fn open_projected(
    path: &Path,
    columns: &[&str],
    batch_size: Option<usize>,
) -> Result<ParquetRecordBatchReader> {
    let file = File::open(path).map_err(|source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    if let Some(rows) = batch_size {
        builder = builder.with_batch_size(rows);
    }

    let schema = builder.schema().clone();
    let mut indices = Vec::with_capacity(columns.len());
    for name in columns {
        let Some(index) = schema.fields().iter().position(|f| f.name() == name) else {
            return Err(Error::MalformedFile {
                path: path.to_path_buf(),
                detail: format!("missing column `{name}`"),
            });
        };
        indices.push(index);
    }
    let mask = ProjectionMask::roots(builder.parquet_schema(), indices);
    Ok(builder.with_projection(mask).build()?)
}

/// One record batch of an event file, with its columns already typed.
#[derive(Debug)]
struct RunPage {
    events: UInt64Array,
    adc: FixedSizeListArray,
}

impl RunPage {
    fn from_batch(path: &Path, batch: &RecordBatch) -> Result<Self> {
        let malformed = |detail: String| Error::MalformedFile {
            path: path.to_path_buf(),
            detail,
        };
        let events = batch
            .column_by_name("eventNumber")
            .and_then(|c| c.as_any().downcast_ref::<UInt64Array>())
            .cloned()
            .ok_or_else(|| malformed("`eventNumber` missing or not u64".into()))?;
        let adc = batch
            .column_by_name("adc")
            .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
            .cloned()
            .ok_or_else(|| malformed("`adc` missing or not a fixed-size list".into()))?;

        let expected = NUM_CHANNELS * SAMPLES_PER_CHANNEL;
        if adc.value_length() != i32::try_from(expected).unwrap_or(i32::MAX) {
            return Err(malformed(format!(
                "`adc` entries hold {} samples, expected {expected}",
                adc.value_length()
            )));
        }
        Ok(Self { events, adc })
    }

    fn rows(&self) -> usize {
        self.events.len()
    }
}

/// Parquet-backed event cursor over a sequence of runs.
///
/// Advancing past the last event of a run loads the next run in the
/// sequence; that is the rollover [`crate::chunk::WaveformReader`] polls
/// for. Advancing past the final run parks the cursor in an exhausted
/// state where [`EventCursor::calibrated`] fails.
#[derive(Debug)]
pub struct RunDataset {
    flight: Flight,
    runs: Vec<u32>,
    run_idx: usize,
    file: PathBuf,
    pages: Vec<RunPage>,
    page: usize,
    row: usize,
    current_run: u32,
    current_event: u64,
    exhausted: bool,
}

impl RunDataset {
    /// Open a cursor on `run`'s first event, continuing into every later
    /// run found in the flight's data directory.
    ///
    /// # Errors
    ///
    /// Fails if the flight has no event layout, the data directory is
    /// unset or unreadable, or `run` is not among the available runs.
    pub fn starting_at(flight: Flight, run: u32) -> Result<Self> {
        let available = catalog::available_runs(flight)?;
        let runs: Vec<u32> = available.into_iter().filter(|&r| r >= run).collect();
        if runs.first() != Some(&run) {
            return Err(Error::RunNotFound {
                flight: flight.number(),
                run,
            });
        }
        Self::with_runs(flight, runs)
    }

    /// Open a cursor over an explicit run sequence.
    ///
    /// # Errors
    ///
    /// Fails if the flight has no event layout, `runs` is empty, or the
    /// first run's event file cannot be loaded.
    pub fn with_runs(flight: Flight, runs: Vec<u32>) -> Result<Self> {
        if !flight.supports_events() {
            return Err(Error::UnsupportedFlight(flight.number()));
        }
        if runs.is_empty() {
            return Err(Error::InvalidInput("empty run sequence".into()));
        }
        let mut dataset = Self {
            flight,
            runs,
            run_idx: 0,
            file: PathBuf::new(),
            pages: Vec::new(),
            page: 0,
            row: 0,
            current_run: 0,
            current_event: 0,
            exhausted: false,
        };
        dataset.load_run(0)?;
        Ok(dataset)
    }

    /// The flight this dataset reads.
    #[must_use]
    pub const fn flight(&self) -> Flight {
        self.flight
    }

    /// The run sequence this cursor walks.
    #[must_use]
    pub fn runs(&self) -> &[u32] {
        &self.runs
    }

    /// Whether the cursor has been advanced past the final event.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Count the events recorded in each run of the sequence.
    ///
    /// Uses the head files' parquet metadata; no row data is read.
    ///
    /// # Errors
    ///
    /// Fails if a head file is missing or unreadable.
    pub fn event_counts(&self) -> Result<BTreeMap<u32, u64>> {
        let mut counts = BTreeMap::new();
        for &run in &self.runs {
            let path = catalog::run_file(self.flight, run, FileKind::Head)?;
            let file = File::open(&path).map_err(|source| Error::FileOpen {
                path: path.clone(),
                source,
            })?;
            let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
            let rows = builder.metadata().file_metadata().num_rows();
            counts.insert(run, u64::try_from(rows).unwrap_or_default());
        }
        Ok(counts)
    }

    fn load_run(&mut self, run_idx: usize) -> Result<()> {
        let run = self.runs[run_idx];
        let path = catalog::run_file(self.flight, run, FileKind::Events)?;
        let reader = open_projected(&path, catalog::default_columns(FileKind::Events), None)?;

        let mut pages = Vec::new();
        let mut rows = 0;
        for batch in reader {
            let batch = batch?;
            if batch.num_rows() == 0 {
                continue;
            }
            if let Some(col) = batch
                .column_by_name("run")
                .and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
            {
                if col.value(0) != run {
                    warn!(
                        run,
                        stored = col.value(0),
                        file = %path.display(),
                        "run column disagrees with the run directory"
                    );
                }
            }
            let page = RunPage::from_batch(&path, &batch)?;
            rows += page.rows();
            pages.push(page);
        }
        if rows == 0 {
            return Err(Error::EmptyRun(run));
        }
        info!(run, events = rows, file = %path.display(), "loaded run");

        self.run_idx = run_idx;
        self.file = path;
        self.pages = pages;
        self.page = 0;
        self.row = 0;
        self.current_run = run;
        self.current_event = self.pages[0].events.value(0);
        Ok(())
    }
}

impl EventCursor for RunDataset {
    fn current_event_id(&self) -> u64 {
        self.current_event
    }

    fn current_run(&self) -> u32 {
        self.current_run
    }

    fn calibrated(&mut self) -> Result<CalibratedEvent> {
        if self.exhausted {
            return Err(Error::DatasetExhausted);
        }
        let values = self.pages[self.page].adc.value(self.row);
        let adc = values
            .as_any()
            .downcast_ref::<Int16Array>()
            .cloned()
            .ok_or_else(|| Error::MalformedFile {
                path: self.file.clone(),
                detail: "`adc` values are not 16-bit integers".into(),
            })?;
        CalibratedEvent::new(self.current_run, self.current_event, adc)
    }

    fn advance(&mut self) -> Result<()> {
        if self.exhausted {
            return Ok(());
        }
        self.row += 1;
        if self.row >= self.pages[self.page].rows() {
            self.row = 0;
            self.page += 1;
        }
        if self.page >= self.pages.len() {
            if self.run_idx + 1 >= self.runs.len() {
                self.exhausted = true;
                debug!(run = self.current_run, "dataset exhausted");
                return Ok(());
            }
            return self.load_run(self.run_idx + 1);
        }
        self.current_event = self.pages[self.page].events.value(self.row);
        Ok(())
    }
}
