//! In-memory event cursor for tests, benchmarks and fixtures.

use crate::dataset::EventCursor;
use crate::error::{Error, Result};
use crate::event::{CalibratedEvent, NUM_CHANNELS, SAMPLES_PER_CHANNEL};

/// One scripted event: a run, an identifier and a channel-major capture.
#[derive(Debug, Clone)]
pub struct MemoryEvent {
    /// Run the event belongs to
    pub run: u32,
    /// Event identifier
    pub event_number: u64,
    /// Channel-major ADC counts, `NUM_CHANNELS * SAMPLES_PER_CHANNEL` long
    pub adc: Vec<i16>,
}

impl MemoryEvent {
    /// An event whose every channel sits flat at the given ADC count.
    #[must_use]
    pub fn flat(run: u32, event_number: u64, count: i16) -> Self {
        Self {
            run,
            event_number,
            adc: vec![count; NUM_CHANNELS * SAMPLES_PER_CHANNEL],
        }
    }
}

/// [`EventCursor`] over a scripted event list.
///
/// Mirrors [`super::RunDataset`]'s end-of-data contract: advancing past
/// the last event parks the cursor, and `calibrated` then fails with
/// [`Error::DatasetExhausted`].
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    events: Vec<MemoryEvent>,
    index: usize,
    exhausted: bool,
}

impl MemoryDataset {
    /// Build a cursor positioned on the first scripted event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `events` is empty or any capture
    /// has the wrong length.
    pub fn new(events: Vec<MemoryEvent>) -> Result<Self> {
        if events.is_empty() {
            return Err(Error::InvalidInput("empty event list".into()));
        }
        for event in &events {
            if event.adc.len() != NUM_CHANNELS * SAMPLES_PER_CHANNEL {
                return Err(Error::InvalidInput(format!(
                    "event {} capture block has {} samples, expected {}",
                    event.event_number,
                    event.adc.len(),
                    NUM_CHANNELS * SAMPLES_PER_CHANNEL
                )));
            }
        }
        Ok(Self {
            events,
            index: 0,
            exhausted: false,
        })
    }

    /// Whether the cursor has been advanced past the last event.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl EventCursor for MemoryDataset {
    fn current_event_id(&self) -> u64 {
        self.events[self.index].event_number
    }

    fn current_run(&self) -> u32 {
        self.events[self.index].run
    }

    fn calibrated(&mut self) -> Result<CalibratedEvent> {
        if self.exhausted {
            return Err(Error::DatasetExhausted);
        }
        let event = &self.events[self.index];
        CalibratedEvent::from_adc(event.run, event.event_number, event.adc.clone())
    }

    fn advance(&mut self) -> Result<()> {
        if self.index + 1 < self.events.len() {
            self.index += 1;
        } else {
            self.exhausted = true;
        }
        Ok(())
    }
}
