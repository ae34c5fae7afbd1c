//! Walk a run's merged header tables and classify its triggers.
//!
//! Writes a scratch run with head and GPS files plus a flightpath,
//! then iterates merged chunks and tallies trigger causes.
//!
//! Run with: `cargo run --example header_tables`

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arrow::array::{Array, ArrayRef, Float64Array, RecordBatch, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;

use borealis_reader::catalog::Flight;
use borealis_reader::dataset::TableChunks;
use borealis_reader::{FlightPath, TrigType};

fn write_table(path: &Path, schema: Arc<Schema>, columns: Vec<ArrayRef>) -> Result<()> {
    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    let mut writer = ArrowWriter::try_new(File::create(path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn write_run(root: &Path, run: u32, events: usize) -> Result<()> {
    let dir = root.join(format!("run{run}"));
    std::fs::create_dir_all(&dir)?;

    let ids: Vec<u64> = (0..events as u64).collect();
    let times: Vec<u32> = (0..events as u32).map(|i| 1_482_000_000 + i).collect();
    // a mix of RF, GPS, timer and software triggers
    let trig: Vec<u32> = (0..events as u32).map(|i| 1 << (i % 4)).collect();

    write_table(
        &dir.join(format!("headFile{run}.parquet")),
        Arc::new(Schema::new(vec![
            Field::new("run", DataType::UInt32, false),
            Field::new("eventNumber", DataType::UInt64, false),
            Field::new("realTime", DataType::UInt32, false),
            Field::new("trigType", DataType::UInt32, false),
        ])),
        vec![
            Arc::new(UInt32Array::from(vec![run; events])),
            Arc::new(UInt64Array::from(ids.clone())),
            Arc::new(UInt32Array::from(times.clone())),
            Arc::new(UInt32Array::from(trig)),
        ],
    )?;

    let mut gps_fields = vec![
        Field::new("run", DataType::UInt32, false),
        Field::new("eventNumber", DataType::UInt64, false),
        Field::new("realTime", DataType::UInt32, false),
    ];
    let mut gps_columns: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from(vec![run; events])),
        Arc::new(UInt64Array::from(ids)),
        Arc::new(UInt32Array::from(times)),
    ];
    for (name, base) in [
        ("latitude", -78.5),
        ("longitude", 165.0),
        ("altitude", 37_500.0),
        ("heading", 90.0),
        ("pitch", 0.2),
        ("roll", -0.1),
    ] {
        gps_fields.push(Field::new(name, DataType::Float64, false));
        let values: Vec<f64> = (0..events).map(|i| base + i as f64 * 0.01).collect();
        gps_columns.push(Arc::new(Float64Array::from(values)));
    }
    write_table(
        &dir.join(format!("gpsEvent{run}.parquet")),
        Arc::new(Schema::new(gps_fields)),
        gps_columns,
    )?;
    Ok(())
}

fn write_flightpath(root: &Path, entries: usize) -> Result<()> {
    let dir = root.join("flightpaths");
    std::fs::create_dir_all(&dir)?;

    let names = ["realTime", "latitude", "longitude", "altitude", "heading", "pitch", "roll"];
    let schema = Arc::new(Schema::new(
        names
            .iter()
            .map(|n| Field::new(*n, DataType::Float64, false))
            .collect::<Vec<_>>(),
    ));
    let columns: Vec<ArrayRef> = names
        .iter()
        .enumerate()
        .map(|(c, _)| {
            let values: Vec<f64> = (0..entries)
                .map(|i| match c {
                    0 => 1_482_000_000.0 + i as f64 * 30.0,
                    1 => -78.5 + i as f64 * 0.001,
                    2 => 165.0 + i as f64 * 0.002,
                    3 => 37_500.0,
                    _ => 0.0,
                })
                .collect();
            Arc::new(Float64Array::from(values)) as ArrayRef
        })
        .collect();
    write_table(&dir.join("borealis4.parquet"), schema, columns)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let scratch = tempfile::tempdir()?;
    write_run(scratch.path(), 300, 25)?;
    write_flightpath(scratch.path(), 100)?;
    std::env::set_var("BOREALIS4_DATA", scratch.path());

    let mut rf = 0;
    let mut minbias = 0;
    for chunk in TableChunks::open_default(Flight::Four, 300, 10)? {
        let chunk = chunk?;
        let trig = chunk
            .column_by_name("trigType")
            .expect("head table carries trigType")
            .as_any()
            .downcast_ref::<UInt32Array>()
            .expect("trigType is u32");
        for i in 0..chunk.num_rows() {
            let word = TrigType::from(trig.value(i));
            if word.is_rf() {
                rf += 1;
            }
            if word.is_minbias() {
                minbias += 1;
            }
        }
        println!("chunk: {} rows, {} columns", chunk.num_rows(), chunk.num_columns());
    }
    println!("triggers: {rf} RF, {minbias} minimum bias");

    let flightpath = FlightPath::load(Flight::Four)?;
    println!(
        "flightpath: {} samples starting {} at ({:.3}, {:.3})",
        flightpath.len(),
        flightpath.time_utc(0).map_or_else(String::new, |t| t.to_rfc3339()),
        flightpath.latitude()[0],
        flightpath.longitude()[0],
    );
    Ok(())
}
