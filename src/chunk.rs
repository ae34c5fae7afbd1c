//! Bulk waveform extraction into dense chunk buffers.
//!
//! [`WaveformReader`] walks an event cursor and packs calibrated,
//! evenly-resampled waveforms into a caller-owned 5-D `f32` buffer of
//! shape `[events, phi, ring, pol, samples]`, one chunk per call. This is
//! the hot path of the crate: the fill loop is called from low-level
//! paging code, so the production variant does no bounds checking and the
//! per-channel graph and waveform values live only for one innermost
//! iteration.

use ndarray::{s, Array5, ArrayViewMut5};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Flight;
use crate::dataset::{EventCursor, RunDataset};
use crate::error::Result;
use crate::event::{Pol, Ring, NUM_PHI_SECTORS, NUM_POLS, NUM_RINGS, SAMPLES_PER_CHANNEL};
use crate::waveform::Waveform;

/// What one fill call did to the buffer.
///
/// Truncation is reported explicitly rather than inferred from a
/// partially written buffer: `run_changed` is set when the chunk stopped
/// early at a run boundary, and only rows `0..rows_written` were touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSummary {
    /// Buffer rows populated by this call
    pub rows_written: usize,
    /// Identifier of the last event written
    pub last_event_id: u64,
    /// Whether the call returned early at a run boundary
    pub run_changed: bool,
}

/// A self-contained chunk: buffer plus per-row event identifiers.
#[derive(Debug, Clone)]
pub struct WaveformChunk {
    /// Waveform samples, `[event, phi, ring, pol, sample]`
    pub waveforms: Array5<f32>,
    /// Identifier of every populated row, in order
    pub event_numbers: Vec<u64>,
    /// The fill summary for the whole chunk
    pub summary: ChunkSummary,
}

/// Reads waveforms from an event cursor into chunk buffers.
///
/// The reader's only persistent state beyond the cursor is the run it is
/// tracking; a cursor advance that reveals a different run ends the
/// current chunk early and re-arms the reader on the new run.
pub struct WaveformReader<C> {
    run: u32,
    cursor: C,
}

impl WaveformReader<RunDataset> {
    /// Open a reader on a run's first event.
    ///
    /// The cursor continues into every later run available for the
    /// flight, so chunks report a run change instead of running dry when
    /// a run boundary passes by.
    ///
    /// # Errors
    ///
    /// Fails if the run cannot be opened; see
    /// [`RunDataset::starting_at`].
    pub fn for_run(flight: Flight, run: u32) -> Result<Self> {
        let cursor = RunDataset::starting_at(flight, run)?;
        Ok(Self { run, cursor })
    }
}

impl<C: EventCursor> WaveformReader<C> {
    /// Wrap an already-positioned cursor.
    ///
    /// The tracked run starts at the cursor's current run.
    pub fn from_cursor(cursor: C) -> Self {
        Self {
            run: cursor.current_run(),
            cursor,
        }
    }

    /// The run the reader is currently tracking.
    #[must_use]
    pub const fn run(&self) -> u32 {
        self.run
    }

    /// Borrow the underlying cursor.
    pub const fn cursor(&self) -> &C {
        &self.cursor
    }

    /// Fill a chunk buffer, checking every buffer index.
    ///
    /// Semantics are identical to [`WaveformReader::fill_chunk_unchecked`];
    /// an out-of-range axis (a ring axis shorter than 3, a polarization
    /// axis shorter than 2) panics instead of corrupting memory. Use this
    /// variant in tests and anywhere the buffer shape is not statically
    /// known to be right.
    ///
    /// # Errors
    ///
    /// Propagates cursor and calibration failures untranslated; the
    /// buffer is left partially populated.
    pub fn fill_chunk(&mut self, chunk: &mut ArrayViewMut5<'_, f32>) -> Result<ChunkSummary> {
        self.fill_impl::<true>(chunk)
    }

    /// Fill a chunk buffer with no bounds checking.
    ///
    /// This is the production path: it is called per paging step from
    /// low-level code that allocates the buffer itself, so every index is
    /// trusted. The caller chooses how many events to read via the
    /// buffer's axis-0 extent and how many samples to keep per channel
    /// via its axis-4 extent; waveforms longer than the sample axis are
    /// silently truncated, shorter ones leave the tail of their row
    /// untouched. The sample axis should normally be at least the native
    /// capture length of 260.
    ///
    /// The cursor must already be positioned on a valid event, and the
    /// caller is responsible for not reading past the events actually on
    /// disk; neither condition is checked here.
    ///
    /// # Safety
    ///
    /// The buffer's ring axis must have extent at least 3 and its
    /// polarization axis extent at least 2. Anything less writes out of
    /// bounds.
    ///
    /// # Errors
    ///
    /// Propagates cursor and calibration failures untranslated; the
    /// buffer is left partially populated.
    pub unsafe fn fill_chunk_unchecked(
        &mut self,
        chunk: &mut ArrayViewMut5<'_, f32>,
    ) -> Result<ChunkSummary> {
        self.fill_impl::<false>(chunk)
    }

    fn fill_impl<const CHECKED: bool>(
        &mut self,
        chunk: &mut ArrayViewMut5<'_, f32>,
    ) -> Result<ChunkSummary> {
        let (events, phi_sectors, _, _, sample_capacity) = chunk.dim();

        // the last event identifier is reported back so the caller can
        // sanity-check its own bookkeeping
        let mut event_id = 0;

        for event in 0..events {
            event_id = self.cursor.current_event_id();

            // calibration happens here, once per event
            let calibrated = self.cursor.calibrated()?;

            for phi in 0..phi_sectors {
                for ring in Ring::ALL {
                    for pol in Pol::ALL {
                        let graph = calibrated.channel_graph(ring, phi, pol)?;
                        let waveform = Waveform::evenly_sampled(&graph, false);

                        let count = waveform.len().min(sample_capacity);
                        let signal = waveform.amplitudes();
                        for sample in 0..count {
                            let index = [event, phi, ring.index(), pol.index(), sample];
                            if CHECKED {
                                chunk[index] = signal[sample];
                            } else {
                                // SAFETY: event/phi/sample are bounded by the
                                // buffer's own extents; ring and pol are the
                                // unchecked contract of fill_chunk_unchecked.
                                unsafe {
                                    *chunk.uget_mut(index) = signal[sample];
                                }
                            }
                        }
                        // graph and waveform drop here, on every path
                    }
                }
            }

            self.cursor.advance()?;

            // a run rollover ends the chunk; later rows stay untouched
            if self.cursor.current_run() != self.run {
                debug!(
                    from = self.run,
                    to = self.cursor.current_run(),
                    "run boundary inside chunk"
                );
                self.run = self.cursor.current_run();
                return Ok(ChunkSummary {
                    rows_written: event + 1,
                    last_event_id: event_id,
                    run_changed: true,
                });
            }
        }

        Ok(ChunkSummary {
            rows_written: events,
            last_event_id: event_id,
            run_changed: false,
        })
    }

    /// Read the next `events` events into a freshly allocated chunk.
    ///
    /// Allocates a zeroed `[events, 16, 3, 2, 260]` buffer, fills it row
    /// by row and records each row's event identifier. Rows are filled
    /// one at a time, which by the chunk-composability contract produces
    /// the same samples as one big fill; a run change stops the chunk
    /// short, with `summary.rows_written` rows valid.
    ///
    /// # Errors
    ///
    /// Propagates cursor and calibration failures untranslated.
    pub fn next_events(&mut self, events: usize) -> Result<WaveformChunk> {
        let mut waveforms = Array5::<f32>::zeros((
            events,
            NUM_PHI_SECTORS,
            NUM_RINGS,
            NUM_POLS,
            SAMPLES_PER_CHANNEL,
        ));
        let mut event_numbers = Vec::with_capacity(events);
        let mut run_changed = false;

        for event in 0..events {
            let mut row = waveforms.slice_mut(s![event..=event, .., .., .., ..]);
            // SAFETY: the buffer above is allocated with the full ring and
            // polarization extents
            let summary = unsafe { self.fill_chunk_unchecked(&mut row) }?;
            event_numbers.push(summary.last_event_id);
            if summary.run_changed {
                run_changed = true;
                break;
            }
        }

        let summary = ChunkSummary {
            rows_written: event_numbers.len(),
            last_event_id: event_numbers.last().copied().unwrap_or_default(),
            run_changed,
        };
        Ok(WaveformChunk {
            waveforms,
            event_numbers,
            summary,
        })
    }
}
