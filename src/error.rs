//! Error types for the Borealis reader.

use std::path::PathBuf;

use thiserror::Error;

use crate::event::{Pol, Ring};

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Borealis reader error types
#[derive(Error, Debug)]
pub enum Error {
    /// Flight number outside the flown payloads, or without the requested data
    #[error("flight {0} is not a valid Borealis flight for this operation")]
    UnsupportedFlight(u32),

    /// Data-directory environment variable is not set
    #[error("no data directory for flight {flight}: set {var} to the flight data root")]
    DataDirectoryNotSet {
        /// Flight whose data was requested
        flight: u32,
        /// The environment variable that should point at the data
        var: &'static str,
    },

    /// Requested run is not present in the flight's data directory
    #[error("run {run} not found for flight {flight}")]
    RunNotFound {
        /// Flight that was searched
        flight: u32,
        /// The missing run number
        run: u32,
    },

    /// A run's event file contains no events
    #[error("run {0} contains no events")]
    EmptyRun(u32),

    /// The cursor was advanced past the final event of the final run
    #[error("dataset exhausted: no event at the current cursor position")]
    DatasetExhausted,

    /// Channel lookup outside the instrument's phi-sector range
    #[error("no channel at ({ring:?}, phi {phi}, {pol:?}): phi sectors run 0..16")]
    NoSuchChannel {
        /// Requested ring
        ring: Ring,
        /// Requested phi sector
        phi: usize,
        /// Requested polarization
        pol: Pol,
    },

    /// A data file could not be opened
    #[error("cannot open {}: {source}", .path.display())]
    FileOpen {
        /// The file that failed to open
        path: PathBuf,
        /// The underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// A data file is readable but not laid out as expected
    #[error("malformed data file {}: {detail}", .path.display())]
    MalformedFile {
        /// Offending file
        path: PathBuf,
        /// What was wrong with it
        detail: String,
    },

    /// Event-parallel files of one run disagree on row counts
    #[error("misaligned header tables: {kind} chunk has {actual} rows, expected {expected}")]
    TableMisaligned {
        /// File kind whose chunk was short or long
        kind: &'static str,
        /// Rows in the first kind's chunk
        expected: usize,
        /// Rows in the offending chunk
        actual: usize,
    },

    /// Invalid caller-supplied argument
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}
