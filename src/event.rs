//! Calibrated event views and per-channel graphs.
//!
//! An event file row carries one raw digitizer capture per channel. The
//! [`CalibratedEvent`] view converts a capture into a [`RawGraph`] on
//! demand: pedestal-subtracted, gain-scaled amplitudes in millivolts,
//! with per-sample times that carry the even/odd capture-array skew.
//! Resampling onto the nominal grid is [`crate::waveform::Waveform`]'s
//! job, not this module's.

use arrow::array::Int16Array;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Azimuthal sectors around the payload.
pub const NUM_PHI_SECTORS: usize = 16;
/// Antenna rings per sector.
pub const NUM_RINGS: usize = 3;
/// Polarizations per antenna.
pub const NUM_POLS: usize = 2;
/// Total readout channels.
pub const NUM_CHANNELS: usize = NUM_PHI_SECTORS * NUM_RINGS * NUM_POLS;
/// Digitizer samples per channel capture.
pub const SAMPLES_PER_CHANNEL: usize = 260;

/// Nominal sampling interval at 2.6 GSa/s, in nanoseconds.
pub const SAMPLE_INTERVAL_NS: f64 = 1.0 / 2.6;
/// Lab-measured clock offset of the odd capture array, in nanoseconds.
pub const INTERLEAVE_SKEW_NS: f64 = 0.012;
/// Digitizer mid-rail pedestal, in ADC counts.
pub const PEDESTAL_COUNTS: f32 = 2048.0;
/// Gain: millivolts per ADC count (12 bits over a 2 V swing).
pub const MV_PER_COUNT: f32 = 2000.0 / 4096.0;

/// Antenna ring, in the fixed top/middle/bottom buffer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ring {
    /// Top ring (buffer index 0)
    Top,
    /// Middle ring (buffer index 1)
    Middle,
    /// Bottom ring (buffer index 2)
    Bottom,
}

impl Ring {
    /// The fixed iteration order.
    pub const ALL: [Self; 3] = [Self::Top, Self::Middle, Self::Bottom];

    /// Buffer index along the ring axis.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Top => 0,
            Self::Middle => 1,
            Self::Bottom => 2,
        }
    }

    /// Single-letter label used in channel names.
    #[must_use]
    pub const fn label(self) -> char {
        match self {
            Self::Top => 'T',
            Self::Middle => 'M',
            Self::Bottom => 'B',
        }
    }
}

/// Polarization, in the fixed horizontal/vertical buffer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pol {
    /// Horizontal polarization (buffer index 0)
    Horizontal,
    /// Vertical polarization (buffer index 1)
    Vertical,
}

impl Pol {
    /// The fixed iteration order.
    pub const ALL: [Self; 2] = [Self::Horizontal, Self::Vertical];

    /// Buffer index along the polarization axis.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }

    /// Single-letter label used in channel names.
    #[must_use]
    pub const fn label(self) -> char {
        match self {
            Self::Horizontal => 'H',
            Self::Vertical => 'V',
        }
    }
}

/// Index of a channel in the channel-major event-file packing.
///
/// Phi is outermost, then ring, then polarization, matching
/// [`crate::catalog::channel_labels`].
#[must_use]
pub const fn channel_index(ring: Ring, phi: usize, pol: Pol) -> usize {
    (phi * NUM_RINGS + ring.index()) * NUM_POLS + pol.index()
}

/// One channel's calibrated time/amplitude pairs.
///
/// Times are in nanoseconds and strictly increasing; amplitudes in
/// millivolts. A graph is a one-shot value: it is built per channel, read
/// once, and dropped.
#[derive(Debug, Clone)]
pub struct RawGraph {
    times: Vec<f64>,
    amps: Vec<f32>,
}

impl RawGraph {
    /// Build a graph from parallel time/amplitude vectors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the vectors differ in length.
    pub fn new(times: Vec<f64>, amps: Vec<f32>) -> Result<Self> {
        if times.len() != amps.len() {
            return Err(Error::InvalidInput(format!(
                "graph with {} times but {} amplitudes",
                times.len(),
                amps.len()
            )));
        }
        Ok(Self { times, amps })
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the graph has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Sample times in nanoseconds.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Amplitudes in millivolts.
    #[must_use]
    pub fn amplitudes(&self) -> &[f32] {
        &self.amps
    }
}

/// Calibrated view of one event.
///
/// Produced fresh for the cursor's current event; calibration constants
/// are applied when a channel graph is extracted.
#[derive(Debug, Clone)]
pub struct CalibratedEvent {
    run: u32,
    event_number: u64,
    adc: Int16Array,
}

impl CalibratedEvent {
    /// Wrap a channel-major ADC capture block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] unless `adc` holds exactly
    /// [`NUM_CHANNELS`] x [`SAMPLES_PER_CHANNEL`] samples.
    pub fn new(run: u32, event_number: u64, adc: Int16Array) -> Result<Self> {
        if adc.len() != NUM_CHANNELS * SAMPLES_PER_CHANNEL {
            return Err(Error::InvalidInput(format!(
                "event {event_number} capture block has {} samples, expected {}",
                adc.len(),
                NUM_CHANNELS * SAMPLES_PER_CHANNEL
            )));
        }
        Ok(Self {
            run,
            event_number,
            adc,
        })
    }

    /// Wrap a plain vector of ADC counts (fixtures, in-memory datasets).
    ///
    /// # Errors
    ///
    /// Same contract as [`CalibratedEvent::new`].
    pub fn from_adc(run: u32, event_number: u64, adc: Vec<i16>) -> Result<Self> {
        Self::new(run, event_number, Int16Array::from(adc))
    }

    /// The run this event belongs to.
    #[must_use]
    pub const fn run(&self) -> u32 {
        self.run
    }

    /// The event identifier.
    #[must_use]
    pub const fn event_number(&self) -> u64 {
        self.event_number
    }

    /// Extract one channel as a calibrated graph.
    ///
    /// Applies the pedestal/gain conversion and the odd-array timing skew.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchChannel`] if `phi` is outside the sector range.
    pub fn channel_graph(&self, ring: Ring, phi: usize, pol: Pol) -> Result<RawGraph> {
        if phi >= NUM_PHI_SECTORS {
            return Err(Error::NoSuchChannel { ring, phi, pol });
        }
        let start = channel_index(ring, phi, pol) * SAMPLES_PER_CHANNEL;
        let counts = &self.adc.values()[start..start + SAMPLES_PER_CHANNEL];

        let mut times = Vec::with_capacity(SAMPLES_PER_CHANNEL);
        let mut amps = Vec::with_capacity(SAMPLES_PER_CHANNEL);
        for (sample, &count) in counts.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let mut t = sample as f64 * SAMPLE_INTERVAL_NS;
            if sample % 2 == 1 {
                t += INTERLEAVE_SKEW_NS;
            }
            times.push(t);
            amps.push((f32::from(count) - PEDESTAL_COUNTS) * MV_PER_COUNT);
        }
        RawGraph::new(times, amps)
    }
}
