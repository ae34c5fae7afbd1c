//! Page calibrated waveform chunks out of a synthetic two-run flight.
//!
//! Writes a scratch data directory with two adjacent runs, points
//! `BOREALIS4_DATA` at it and pages through the events the way an
//! analysis job would: ask for a chunk, consume `rows_written` rows,
//! repeat.
//!
//! Run with: `cargo run --example read_waveforms`

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arrow::array::{ArrayRef, FixedSizeListArray, Int16Array, RecordBatch, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;

use borealis_reader::catalog::Flight;
use borealis_reader::event::{NUM_CHANNELS, SAMPLES_PER_CHANNEL};
use borealis_reader::WaveformReader;

const BLOCK: usize = NUM_CHANNELS * SAMPLES_PER_CHANNEL;

/// Write one run directory with a sine burst on every channel.
fn write_run(root: &Path, run: u32, first_event: u64, events: usize) -> Result<()> {
    let dir = root.join(format!("run{run}"));
    std::fs::create_dir_all(&dir)?;

    let mut flat = Vec::with_capacity(events * BLOCK);
    for event in 0..events {
        for ch in 0..NUM_CHANNELS {
            for s in 0..SAMPLES_PER_CHANNEL {
                let phase = (s + event + ch) as f64 * 0.12;
                flat.push(2048 + (phase.sin() * 300.0) as i16);
            }
        }
    }
    let ids: Vec<u64> = (0..events as u64).map(|i| first_event + i).collect();

    let item = Arc::new(Field::new("item", DataType::Int16, false));
    let adc = FixedSizeListArray::new(
        item.clone(),
        BLOCK as i32,
        Arc::new(Int16Array::from(flat)) as ArrayRef,
        None,
    );
    let schema = Arc::new(Schema::new(vec![
        Field::new("run", DataType::UInt32, false),
        Field::new("eventNumber", DataType::UInt64, false),
        Field::new("adc", DataType::FixedSizeList(item, BLOCK as i32), false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(UInt32Array::from(vec![run; events])),
            Arc::new(UInt64Array::from(ids.clone())),
            Arc::new(adc),
        ],
    )?;

    // the head file only carries bookkeeping here, reuse the id columns
    let head_schema = Arc::new(Schema::new(vec![
        Field::new("run", DataType::UInt32, false),
        Field::new("eventNumber", DataType::UInt64, false),
    ]));
    let head = RecordBatch::try_new(
        head_schema.clone(),
        vec![
            Arc::new(UInt32Array::from(vec![run; events])),
            Arc::new(UInt64Array::from(ids)),
        ],
    )?;

    let mut writer = ArrowWriter::try_new(
        File::create(dir.join(format!("calEventFile{run}.parquet")))?,
        schema,
        None,
    )?;
    writer.write(&batch)?;
    writer.close()?;

    let mut writer = ArrowWriter::try_new(
        File::create(dir.join(format!("headFile{run}.parquet")))?,
        head_schema,
        None,
    )?;
    writer.write(&head)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let scratch = tempfile::tempdir()?;
    write_run(scratch.path(), 200, 5000, 6)?;
    write_run(scratch.path(), 201, 5006, 3)?;
    std::env::set_var("BOREALIS4_DATA", scratch.path());

    let mut reader = WaveformReader::for_run(Flight::Four, 200)?;
    let counts = reader.cursor().event_counts()?;
    let mut remaining: u64 = counts.values().sum();
    println!("flight data: {counts:?} ({remaining} events)");

    while remaining > 0 {
        let chunk = reader.next_events(remaining.min(4) as usize)?;
        remaining -= chunk.summary.rows_written as u64;

        let first_row = chunk.waveforms.index_axis(ndarray::Axis(0), 0);
        let peak = first_row.iter().fold(0.0_f32, |m, &v| m.max(v.abs()));
        println!(
            "chunk {} | first event {} | peak {:.1} mV",
            serde_json::to_string(&chunk.summary)?,
            chunk.event_numbers[0],
            peak,
        );
    }
    println!("done: cursor parked on run {}", reader.run());
    Ok(())
}
