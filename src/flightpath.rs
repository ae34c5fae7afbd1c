//! Payload flightpath: position and attitude over the flight.
//!
//! The flightpath is a single time series per flight, stored alongside
//! the run directories under `flightpaths/`. It is sampled by the
//! navigation unit, not per trigger, so it is indexed by time rather
//! than by event number.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::catalog::{self, Flight};
use crate::dataset::open_projected;
use crate::error::{Error, Result};

use arrow::array::{Array, Float64Array};

/// The columns every flightpath file carries.
const COLUMNS: [&str; 7] = [
    "realTime",
    "latitude",
    "longitude",
    "altitude",
    "heading",
    "pitch",
    "roll",
];

/// Position and attitude samples for one flight.
#[derive(Debug, Clone, Default)]
pub struct FlightPath {
    real_time: Vec<f64>,
    latitude: Vec<f64>,
    longitude: Vec<f64>,
    altitude: Vec<f64>,
    heading: Vec<f64>,
    pitch: Vec<f64>,
    roll: Vec<f64>,
}

impl FlightPath {
    /// Load the flightpath for a flight.
    ///
    /// Only flights three and four recorded full attitude; earlier
    /// flights are rejected.
    ///
    /// # Errors
    ///
    /// Fails for unsupported flights, an unset data directory, or a
    /// flightpath file that is missing, unreadable or lacking columns.
    pub fn load(flight: Flight) -> Result<Self> {
        if !matches!(flight, Flight::Three | Flight::Four) {
            return Err(Error::UnsupportedFlight(flight.number()));
        }
        let path = catalog::data_directory(flight)?
            .join("flightpaths")
            .join(format!("borealis{}.parquet", flight.number()));

        let reader = open_projected(&path, &COLUMNS, None)?;
        let mut flightpath = Self::default();
        for batch in reader {
            let batch = batch?;
            for (name, column) in COLUMNS.iter().zip([
                &mut flightpath.real_time,
                &mut flightpath.latitude,
                &mut flightpath.longitude,
                &mut flightpath.altitude,
                &mut flightpath.heading,
                &mut flightpath.pitch,
                &mut flightpath.roll,
            ]) {
                let values = batch
                    .column_by_name(name)
                    .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
                    .ok_or_else(|| Error::MalformedFile {
                        path: path.clone(),
                        detail: format!("column `{name}` missing or not f64"),
                    })?;
                column.extend(values.values().iter());
            }
        }
        info!(
            flight = flight.number(),
            entries = flightpath.len(),
            "loaded flightpath"
        );
        Ok(flightpath)
    }

    /// Number of navigation samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.real_time.len()
    }

    /// Whether the flightpath holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.real_time.is_empty()
    }

    /// Sample times as unix seconds.
    #[must_use]
    pub fn real_time(&self) -> &[f64] {
        &self.real_time
    }

    /// Payload latitude in degrees.
    #[must_use]
    pub fn latitude(&self) -> &[f64] {
        &self.latitude
    }

    /// Payload longitude in degrees.
    #[must_use]
    pub fn longitude(&self) -> &[f64] {
        &self.longitude
    }

    /// Payload altitude in meters.
    #[must_use]
    pub fn altitude(&self) -> &[f64] {
        &self.altitude
    }

    /// Payload heading in degrees.
    #[must_use]
    pub fn heading(&self) -> &[f64] {
        &self.heading
    }

    /// Payload pitch in degrees.
    #[must_use]
    pub fn pitch(&self) -> &[f64] {
        &self.pitch
    }

    /// Payload roll in degrees.
    #[must_use]
    pub fn roll(&self) -> &[f64] {
        &self.roll
    }

    /// The `i`-th sample time as a UTC timestamp.
    ///
    /// Returns `None` past the end of the series or for a time outside
    /// the representable range.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn time_utc(&self, i: usize) -> Option<DateTime<Utc>> {
        let t = *self.real_time.get(i)?;
        let secs = t.floor() as i64;
        let nanos = ((t - t.floor()) * 1e9) as u32;
        DateTime::from_timestamp(secs, nanos)
    }
}
