//! Chunked iteration over a run's header tables.
//!
//! Head, GPS and the other scalar file kinds are event-parallel: row `i`
//! of every kind describes the same trigger. [`TableChunks`] walks them
//! in lockstep, a caller-chosen number of events at a time, and merges
//! each step into one record batch so analysis code sees a single table.
//!
//! Duplicate column names across kinds (the `run`/`eventNumber`/`realTime`
//! keys appear in several files) are taken from the first kind that
//! provides them.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{ArrayRef, RecordBatch};
use arrow::datatypes::{FieldRef, Schema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReader;
use tracing::debug;

use crate::catalog::{self, FileKind, Flight};
use crate::dataset::open_projected;
use crate::error::{Error, Result};

/// Iterator over merged header-table chunks of one run.
pub struct TableChunks {
    readers: Vec<(FileKind, ParquetRecordBatchReader)>,
}

impl std::fmt::Debug for TableChunks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableChunks")
            .field(
                "kinds",
                &self.readers.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl TableChunks {
    /// Open the given kinds of one run, yielding `chunk_events` rows per step.
    ///
    /// Column selection follows [`catalog::default_columns`] per kind.
    ///
    /// # Errors
    ///
    /// Fails if `kinds` is empty, `chunk_events` is zero, or any file is
    /// missing a requested column or cannot be opened.
    pub fn open(
        flight: Flight,
        run: u32,
        kinds: &[FileKind],
        chunk_events: usize,
    ) -> Result<Self> {
        if kinds.is_empty() {
            return Err(Error::InvalidInput("no file kinds requested".into()));
        }
        if chunk_events == 0 {
            return Err(Error::InvalidInput("zero-event chunks requested".into()));
        }
        let mut readers = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            let path = catalog::run_file(flight, run, kind)?;
            let reader =
                open_projected(&path, catalog::default_columns(kind), Some(chunk_events))?;
            readers.push((kind, reader));
        }
        debug!(run, kinds = kinds.len(), chunk_events, "opened header tables");
        Ok(Self { readers })
    }

    /// Open a run with the default kinds (head and GPS).
    ///
    /// # Errors
    ///
    /// Same contract as [`TableChunks::open`].
    pub fn open_default(flight: Flight, run: u32, chunk_events: usize) -> Result<Self> {
        Self::open(flight, run, catalog::default_kinds(), chunk_events)
    }

    fn merge(batches: &[(FileKind, RecordBatch)]) -> Result<RecordBatch> {
        let (_, first) = &batches[0];
        let mut fields: Vec<FieldRef> = first.schema().fields().iter().cloned().collect();
        let mut columns: Vec<ArrayRef> = first.columns().to_vec();
        let mut seen: HashSet<String> = fields.iter().map(|f| f.name().clone()).collect();

        for (kind, batch) in &batches[1..] {
            if batch.num_rows() != first.num_rows() {
                return Err(Error::TableMisaligned {
                    kind: kind.name(),
                    expected: first.num_rows(),
                    actual: batch.num_rows(),
                });
            }
            for (field, column) in batch.schema().fields().iter().zip(batch.columns()) {
                if seen.insert(field.name().clone()) {
                    fields.push(field.clone());
                    columns.push(column.clone());
                }
            }
        }
        Ok(RecordBatch::try_new(
            Arc::new(Schema::new(fields)),
            columns,
        )?)
    }
}

impl Iterator for TableChunks {
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut step = Vec::with_capacity(self.readers.len());
        for (kind, reader) in &mut self.readers {
            match reader.next() {
                Some(Ok(batch)) => step.push((*kind, batch)),
                Some(Err(e)) => return Some(Err(e.into())),
                // any kind running out ends the lockstep walk
                None => return None,
            }
        }
        Some(Self::merge(&step))
    }
}
