//! # Borealis Reader
//!
//! Reader for data recorded by the Borealis balloon-borne radio payload:
//! per-run event files, header tables and flightpaths, with bulk waveform
//! extraction into dense chunk buffers.
//!
//! The payload digitizes 96 channels per trigger (16 azimuthal sectors,
//! each with top/middle/bottom antenna rings in horizontal and vertical
//! polarization) at 260 samples per channel. A flight is
//! terabytes of events split across runs, so the reader is built around
//! paging: the caller owns a `[events, phi, ring, pol, samples]` buffer
//! and [`WaveformReader`] fills it one chunk at a time, stopping early
//! when a run boundary passes under the cursor.
//!
//! ## Example
//!
//! ```rust,no_run
//! use borealis_reader::catalog::Flight;
//! use borealis_reader::WaveformReader;
//!
//! // $BOREALIS4_DATA/run120/... must exist
//! let mut reader = WaveformReader::for_run(Flight::Four, 120)?;
//! let chunk = reader.next_events(500)?;
//! println!(
//!     "{} events ending at {}",
//!     chunk.summary.rows_written, chunk.summary.last_event_id
//! );
//! # Ok::<(), borealis_reader::Error>(())
//! ```
//!
//! Lower-level callers that manage their own buffers use
//! [`WaveformReader::fill_chunk`] (index-checked) or
//! [`WaveformReader::fill_chunk_unchecked`] (the zero-overhead paging
//! path) directly.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod catalog;
pub mod chunk;
pub mod dataset;
pub mod error;
pub mod event;
pub mod flightpath;
pub mod trigger;
pub mod waveform;

pub use chunk::{ChunkSummary, WaveformChunk, WaveformReader};
pub use dataset::{EventCursor, RunDataset};
pub use error::{Error, Result};
pub use event::{CalibratedEvent, Pol, RawGraph, Ring};
pub use flightpath::FlightPath;
pub use trigger::TrigType;
pub use waveform::Waveform;
