//! Evenly-resampled waveforms.
//!
//! The digitizer's even and odd capture arrays are clocked separately, so
//! a calibrated [`RawGraph`] is not quite uniformly sampled. Downstream
//! analysis (and the chunk buffers) want amplitudes on the nominal grid;
//! [`Waveform::evenly_sampled`] puts them there by linear interpolation.
//!
//! A waveform is a one-shot, channel-scoped value like the graph it came
//! from: built, copied out, dropped.

use crate::event::{RawGraph, SAMPLE_INTERVAL_NS};

/// A waveform on the nominal uniform sample grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    start_ns: f64,
    amps: Vec<f32>,
}

impl Waveform {
    /// Resample a graph onto the nominal grid.
    ///
    /// The grid starts at the graph's first sample time and covers its
    /// span, so the output holds `floor(span / dt) + 1` samples. Points
    /// between graph knots are linearly interpolated; a grid point landing
    /// exactly on a knot reproduces that knot's amplitude.
    ///
    /// `zero_mean` additionally removes the mean amplitude. Chunk
    /// extraction passes `false`: the pedestal was already subtracted when
    /// the calibrated event was built.
    ///
    /// Graph times must be strictly increasing; [`RawGraph`]s built by
    /// [`crate::event::CalibratedEvent::channel_graph`] always are.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn evenly_sampled(graph: &RawGraph, zero_mean: bool) -> Self {
        let times = graph.times();
        let knots = graph.amplitudes();
        if times.is_empty() {
            return Self {
                start_ns: 0.0,
                amps: Vec::new(),
            };
        }

        let start_ns = times[0];
        let span = times[times.len() - 1] - start_ns;
        let samples = (span / SAMPLE_INTERVAL_NS).floor() as usize + 1;

        let mut amps = Vec::with_capacity(samples);
        let mut seg = 0;
        for k in 0..samples {
            #[allow(clippy::cast_precision_loss)]
            let t = start_ns + k as f64 * SAMPLE_INTERVAL_NS;
            while seg + 1 < times.len() && times[seg + 1] < t {
                seg += 1;
            }
            if seg + 1 == times.len() {
                // grid point at (or, through rounding, just past) the last knot
                amps.push(knots[seg]);
                continue;
            }
            let (t0, t1) = (times[seg], times[seg + 1]);
            let w = (t - t0) / (t1 - t0);
            let interpolated =
                f64::from(knots[seg]) + (f64::from(knots[seg + 1]) - f64::from(knots[seg])) * w;
            amps.push(interpolated as f32);
        }

        if zero_mean && !amps.is_empty() {
            #[allow(clippy::cast_precision_loss)]
            let mean = amps.iter().map(|&a| f64::from(a)).sum::<f64>() / amps.len() as f64;
            for amp in &mut amps {
                *amp = (f64::from(*amp) - mean) as f32;
            }
        }

        Self { start_ns, amps }
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.amps.len()
    }

    /// Whether the waveform holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amps.is_empty()
    }

    /// Time of the first sample, in nanoseconds.
    #[must_use]
    pub const fn start_time_ns(&self) -> f64 {
        self.start_ns
    }

    /// The sampling interval, in nanoseconds.
    #[must_use]
    pub const fn sample_interval_ns() -> f64 {
        SAMPLE_INTERVAL_NS
    }

    /// Amplitudes in millivolts, one per grid point.
    #[must_use]
    pub fn amplitudes(&self) -> &[f32] {
        &self.amps
    }
}
