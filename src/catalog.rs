//! Flight catalog: data directories, run discovery and file naming.
//!
//! Borealis data is laid out one directory per run under a per-flight data
//! root, with one parquet file per [`FileKind`] inside each run directory:
//!
//! ```text
//! $BOREALIS4_DATA/
//!   run120/
//!     headFile120.parquet
//!     gpsEvent120.parquet
//!     calEventFile120.parquet
//!   run121/
//!     ...
//!   flightpaths/
//!     borealis4.parquet
//! ```
//!
//! The data root for each flight comes from the `BOREALIS{N}_DATA`
//! environment variable, which is the only piece of configuration the
//! reader consumes.

use std::path::PathBuf;

use tracing::debug;

use crate::error::{Error, Result};
use crate::event::{Pol, Ring, NUM_PHI_SECTORS};

/// A Borealis payload flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flight {
    /// First engineering flight
    One,
    /// Second engineering flight
    Two,
    /// Third flight (first science configuration)
    Three,
    /// Fourth flight (current science configuration)
    Four,
}

impl Flight {
    /// All flown payloads, in order.
    pub const ALL: [Self; 4] = [Self::One, Self::Two, Self::Three, Self::Four];

    /// The flight number.
    #[must_use]
    pub const fn number(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }

    /// Look up a flight by number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFlight`] for numbers that were never flown.
    pub const fn from_number(n: u32) -> Result<Self> {
        match n {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            4 => Ok(Self::Four),
            _ => Err(Error::UnsupportedFlight(n)),
        }
    }

    /// The environment variable holding this flight's data root.
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::One => "BOREALIS1_DATA",
            Self::Two => "BOREALIS2_DATA",
            Self::Three => "BOREALIS3_DATA",
            Self::Four => "BOREALIS4_DATA",
        }
    }

    /// Whether per-event waveform files are wired in for this flight.
    ///
    /// Only flight four's event layout is currently supported; the earlier
    /// flights used a different digitizer packing.
    #[must_use]
    pub const fn supports_events(self) -> bool {
        matches!(self, Self::Four)
    }
}

/// The kinds of per-run data files recorded during a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Event headers: identifiers, timestamps, trigger words
    Head,
    /// Per-event payload position and attitude
    Gps,
    /// Calibrated per-channel digitizer captures
    Events,
    /// Slow-control housekeeping
    Housekeeping,
    /// Environment monitoring
    Monitor,
}

impl FileKind {
    /// The on-disk file stem for this kind (`<stem><run>.parquet`).
    #[must_use]
    pub const fn stem(self) -> &'static str {
        match self {
            Self::Head => "headFile",
            Self::Gps => "gpsEvent",
            Self::Events => "calEventFile",
            Self::Housekeeping => "hkFile",
            Self::Monitor => "monitorFile",
        }
    }

    /// A short human-readable name, used in log lines and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Gps => "gps",
            Self::Events => "events",
            Self::Housekeeping => "housekeeping",
            Self::Monitor => "monitor",
        }
    }
}

/// The file kinds loaded when the caller does not ask for specific ones.
///
/// Waveforms are deliberately absent: bulk waveform access goes through
/// [`crate::chunk::WaveformReader`], not the header tables.
#[must_use]
pub const fn default_kinds() -> &'static [FileKind] {
    &[FileKind::Head, FileKind::Gps]
}

/// The default column selection for a file kind.
#[must_use]
pub const fn default_columns(kind: FileKind) -> &'static [&'static str] {
    match kind {
        FileKind::Head => &["run", "eventNumber", "realTime", "trigType"],
        FileKind::Gps => &[
            "run",
            "eventNumber",
            "realTime",
            "latitude",
            "longitude",
            "altitude",
            "heading",
            "pitch",
            "roll",
        ],
        FileKind::Events => &["run", "eventNumber", "adc"],
        FileKind::Housekeeping | FileKind::Monitor => &["run", "realTime"],
    }
}

/// Return the data root for a flight.
///
/// # Errors
///
/// Returns [`Error::DataDirectoryNotSet`] if the flight's environment
/// variable is unset.
pub fn data_directory(flight: Flight) -> Result<PathBuf> {
    std::env::var_os(flight.env_var())
        .map(PathBuf::from)
        .ok_or(Error::DataDirectoryNotSet {
            flight: flight.number(),
            var: flight.env_var(),
        })
}

/// Whether data for the given flight is present on this system.
#[must_use]
pub fn is_available(flight: Flight) -> bool {
    data_directory(flight).map_or(false, |dir| dir.exists())
}

/// Scan a flight's data root for run directories.
///
/// Returns the run numbers in ascending order. Directories that look like
/// `run<N>` but do not parse as a number are skipped.
///
/// # Errors
///
/// Returns an error if the data root is unset or cannot be read.
pub fn available_runs(flight: Flight) -> Result<Vec<u32>> {
    let dir = data_directory(flight)?;
    let mut runs = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(rest) = name.to_str().and_then(|n| n.strip_prefix("run")) else {
            continue;
        };
        match rest.parse::<u32>() {
            Ok(run) => runs.push(run),
            Err(_) => debug!(directory = %name.to_string_lossy(), "skipping non-run directory"),
        }
    }
    runs.sort_unstable();
    debug!(flight = flight.number(), count = runs.len(), "scanned runs");
    Ok(runs)
}

/// The directory holding one run's files.
///
/// # Errors
///
/// Returns an error if the flight's data root is unset.
pub fn run_directory(flight: Flight, run: u32) -> Result<PathBuf> {
    Ok(data_directory(flight)?.join(format!("run{run}")))
}

/// The full path of one run file.
///
/// # Errors
///
/// Returns an error if the flight's data root is unset.
pub fn run_file(flight: Flight, run: u32, kind: FileKind) -> Result<PathBuf> {
    Ok(run_directory(flight, run)?.join(format!("{}{run}.parquet", kind.stem())))
}

/// The fixed channel ordering, as `"<phi><ring><pol>"` labels.
///
/// Phi sectors are numbered from one in labels (`"01TH"` through `"16BV"`),
/// matching the channel-major packing of the event files: phi outermost,
/// then ring top/middle/bottom, then polarization horizontal/vertical.
#[must_use]
pub fn channel_labels() -> Vec<String> {
    let mut labels = Vec::with_capacity(NUM_PHI_SECTORS * Ring::ALL.len() * Pol::ALL.len());
    for phi in 1..=NUM_PHI_SECTORS {
        for ring in Ring::ALL {
            for pol in Pol::ALL {
                labels.push(format!("{phi:02}{}{}", ring.label(), pol.label()));
            }
        }
    }
    labels
}
