//! End-to-end tests over parquet-backed runs.
//!
//! Each test writes its own flight data directory (run directories plus
//! event/head/gps files) into a scratch directory and points the flight's
//! environment variable at it, so the tests that touch the environment
//! run serially.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, FixedSizeListArray, Float64Array, Int16Array, RecordBatch, UInt32Array,
    UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serial_test::serial;
use tempfile::TempDir;

use borealis_reader::catalog::{self, FileKind, Flight};
use borealis_reader::dataset::{EventCursor, RunDataset, TableChunks};
use borealis_reader::event::{MV_PER_COUNT, NUM_CHANNELS, SAMPLES_PER_CHANNEL};
use borealis_reader::{Error, FlightPath, TrigType, WaveformReader};

const BLOCK: usize = NUM_CHANNELS * SAMPLES_PER_CHANNEL;

/// The ADC count every sample of a fixture channel carries.
fn adc_count(id: u64, ch: usize) -> i16 {
    2048 + (id % 64) as i16 + ch as i16
}

fn write_events_file(root: &Path, run: u32, ids: &[u64]) {
    let dir = root.join(format!("run{run}"));
    std::fs::create_dir_all(&dir).unwrap();

    let mut flat = Vec::with_capacity(ids.len() * BLOCK);
    for &id in ids {
        for ch in 0..NUM_CHANNELS {
            flat.extend(std::iter::repeat(adc_count(id, ch)).take(SAMPLES_PER_CHANNEL));
        }
    }
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
            Arc::new(UInt32Array::from(vec![run; ids.len()])),
            Arc::new(UInt64Array::from(ids.to_vec())),
            Arc::new(adc),
        ],
    )
    .unwrap();

    let file = File::create(dir.join(format!("calEventFile{run}.parquet"))).unwrap();
    // small row groups so a run spans several record batches
    let props = WriterProperties::builder().set_max_row_group_size(2).build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props)).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn write_head_file(root: &Path, run: u32, ids: &[u64], trig_types: &[u32]) {
    let dir = root.join(format!("run{run}"));
    std::fs::create_dir_all(&dir).unwrap();

    let schema = Arc::new(Schema::new(vec![
        Field::new("run", DataType::UInt32, false),
        Field::new("eventNumber", DataType::UInt64, false),
        Field::new("realTime", DataType::UInt32, false),
        Field::new("trigType", DataType::UInt32, false),
    ]));
    let real_time: Vec<u32> = (0..ids.len() as u32).map(|i| 1_480_000_000 + i).collect();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(UInt32Array::from(vec![run; ids.len()])),
            Arc::new(UInt64Array::from(ids.to_vec())),
            Arc::new(UInt32Array::from(real_time)),
            Arc::new(UInt32Array::from(trig_types.to_vec())),
        ],
    )
    .unwrap();

    let file = File::create(dir.join(format!("headFile{run}.parquet"))).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn write_gps_file(root: &Path, run: u32, ids: &[u64]) {
    let dir = root.join(format!("run{run}"));
    std::fs::create_dir_all(&dir).unwrap();

    let mut fields = vec![
        Field::new("run", DataType::UInt32, false),
        Field::new("eventNumber", DataType::UInt64, false),
        Field::new("realTime", DataType::UInt32, false),
    ];
    for name in ["latitude", "longitude", "altitude", "heading", "pitch", "roll"] {
        fields.push(Field::new(name, DataType::Float64, false));
    }
    let schema = Arc::new(Schema::new(fields));

    let real_time: Vec<u32> = (0..ids.len() as u32).map(|i| 1_480_000_000 + i).collect();
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from(vec![run; ids.len()])),
        Arc::new(UInt64Array::from(ids.to_vec())),
        Arc::new(UInt32Array::from(real_time)),
    ];
    for offset in 0..6 {
        let values: Vec<f64> = (0..ids.len())
            .map(|i| -77.0 + f64::from(offset) + i as f64 * 0.5)
            .collect();
        columns.push(Arc::new(Float64Array::from(values)));
    }
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

    let file = File::create(dir.join(format!("gpsEvent{run}.parquet"))).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn write_flightpath(root: &Path, flight: u32, entries: usize) {
    let dir = root.join("flightpaths");
    std::fs::create_dir_all(&dir).unwrap();

    let names = [
        "realTime",
        "latitude",
        "longitude",
        "altitude",
        "heading",
        "pitch",
        "roll",
    ];
    let schema = Arc::new(Schema::new(
        names
            .iter()
            .map(|n| Field::new(*n, DataType::Float64, false))
            .collect::<Vec<_>>(),
    ));
    let columns: Vec<ArrayRef> = (0..names.len())
        .map(|c| {
            let values: Vec<f64> = (0..entries)
                .map(|i| {
                    if c == 0 {
                        1_481_000_000.0 + i as f64
                    } else {
                        c as f64 * 10.0 + i as f64 * 0.25
                    }
                })
                .collect();
            Arc::new(Float64Array::from(values)) as ArrayRef
        })
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

    let file = File::create(dir.join(format!("borealis{flight}.parquet"))).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

/// Two adjacent runs with consecutive event numbers, plus a flightpath.
fn standard_flight(root: &Path) {
    write_events_file(root, 120, &[1000, 1001, 1002]);
    write_head_file(root, 120, &[1000, 1001, 1002], &[0b0001, 0b0011, 0b1000]);
    write_gps_file(root, 120, &[1000, 1001, 1002]);

    write_events_file(root, 121, &[1003, 1004]);
    write_head_file(root, 121, &[1003, 1004], &[0b0001, 0b0100]);
    write_gps_file(root, 121, &[1003, 1004]);

    write_flightpath(root, 4, 40);
}

#[test]
#[serial]
fn chunks_page_across_the_run_boundary() {
    let data = TempDir::new().unwrap();
    standard_flight(data.path());
    std::env::set_var("BOREALIS4_DATA", data.path());

    let mut reader = WaveformReader::for_run(Flight::Four, 120).unwrap();
    assert_eq!(reader.run(), 120);

    // the run boundary cuts the first chunk short
    let chunk = reader.next_events(10).unwrap();
    assert_eq!(chunk.summary.rows_written, 3);
    assert_eq!(chunk.summary.last_event_id, 1002);
    assert!(chunk.summary.run_changed);
    assert_eq!(chunk.event_numbers, vec![1000, 1001, 1002]);
    assert_eq!(reader.run(), 121);

    // calibration carried through: flat counts come back as flat millivolts
    let expected = f32::from(adc_count(1001, 0) - 2048) * MV_PER_COUNT;
    assert!((chunk.waveforms[[1, 0, 0, 0, 100]] - expected).abs() < 1e-4);

    // the rest of the sequence is one exact-sized chunk
    let counts = reader.cursor().event_counts().unwrap();
    let remaining = counts[&121];
    let chunk = reader.next_events(remaining as usize).unwrap();
    assert_eq!(chunk.summary.rows_written, 2);
    assert_eq!(chunk.event_numbers, vec![1003, 1004]);
    assert!(!chunk.summary.run_changed);

    // past the end, the collaborator reports exhaustion
    let err = reader.next_events(1).unwrap_err();
    assert!(matches!(err, Error::DatasetExhausted));
}

#[test]
#[serial]
fn run_discovery_and_counts_match_the_directory() {
    let data = TempDir::new().unwrap();
    standard_flight(data.path());
    // a stray directory that must be ignored by the run scan
    std::fs::create_dir_all(data.path().join("logs")).unwrap();
    std::env::set_var("BOREALIS4_DATA", data.path());

    assert!(catalog::is_available(Flight::Four));
    assert_eq!(catalog::available_runs(Flight::Four).unwrap(), vec![120, 121]);

    let dataset = RunDataset::starting_at(Flight::Four, 120).unwrap();
    assert_eq!(dataset.runs(), &[120, 121]);
    assert_eq!(dataset.current_run(), 120);
    assert_eq!(dataset.current_event_id(), 1000);

    let counts = dataset.event_counts().unwrap();
    assert_eq!(counts[&120], 3);
    assert_eq!(counts[&121], 2);
}

#[test]
#[serial]
fn missing_runs_are_reported() {
    let data = TempDir::new().unwrap();
    standard_flight(data.path());
    std::env::set_var("BOREALIS4_DATA", data.path());

    let err = RunDataset::starting_at(Flight::Four, 999).unwrap_err();
    assert!(matches!(
        err,
        Error::RunNotFound { flight: 4, run: 999 }
    ));
}

#[test]
#[serial]
fn explicit_run_sequences_skip_unlisted_runs() {
    let data = TempDir::new().unwrap();
    standard_flight(data.path());
    std::env::set_var("BOREALIS4_DATA", data.path());

    let mut dataset = RunDataset::with_runs(Flight::Four, vec![121]).unwrap();
    assert_eq!(dataset.current_run(), 121);
    assert_eq!(dataset.current_event_id(), 1003);

    dataset.advance().unwrap();
    assert_eq!(dataset.current_event_id(), 1004);
    dataset.advance().unwrap();
    assert!(dataset.is_exhausted());
}

#[test]
#[serial]
fn header_tables_merge_head_and_gps_columns() {
    let data = TempDir::new().unwrap();
    standard_flight(data.path());
    std::env::set_var("BOREALIS4_DATA", data.path());

    let chunks: Vec<RecordBatch> = TableChunks::open_default(Flight::Four, 120, 2)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].num_rows(), 2);
    assert_eq!(chunks[1].num_rows(), 1);

    let merged = &chunks[0];
    for name in ["run", "eventNumber", "realTime", "trigType", "latitude", "roll"] {
        assert!(
            merged.column_by_name(name).is_some(),
            "merged chunk is missing `{name}`"
        );
    }
    // duplicate key columns appear exactly once
    let run_columns = merged
        .schema()
        .fields()
        .iter()
        .filter(|f| f.name() == "run")
        .count();
    assert_eq!(run_columns, 1);

    // trigger words ride along usably
    let trig = merged
        .column_by_name("trigType")
        .unwrap()
        .as_any()
        .downcast_ref::<UInt32Array>()
        .unwrap();
    let first = TrigType::from(trig.value(0));
    let second = TrigType::from(trig.value(1));
    assert!(first.is_rf() && !first.is_minbias());
    assert!(second.is_rf() && second.is_gps() && second.is_minbias());
}

#[test]
#[serial]
fn requested_table_kinds_must_exist() {
    let data = TempDir::new().unwrap();
    standard_flight(data.path());
    std::env::set_var("BOREALIS4_DATA", data.path());

    let err = TableChunks::open(Flight::Four, 120, &[FileKind::Housekeeping], 10).unwrap_err();
    assert!(matches!(err, Error::FileOpen { .. }));
}

#[test]
#[serial]
fn flightpath_loads_with_timestamps() {
    let data = TempDir::new().unwrap();
    standard_flight(data.path());
    std::env::set_var("BOREALIS4_DATA", data.path());

    let flightpath = FlightPath::load(Flight::Four).unwrap();
    assert_eq!(flightpath.len(), 40);
    assert!((flightpath.latitude()[0] - 10.0).abs() < 1e-6);
    assert!((flightpath.real_time()[0] - 1_481_000_000.0).abs() < 1e-6);
    assert!(flightpath.time_utc(0).is_some());
    assert!(flightpath.time_utc(40).is_none());
}

#[test]
fn unsupported_flights_are_rejected_before_any_io() {
    let err = RunDataset::with_runs(Flight::Three, vec![1]).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFlight(3)));
}

#[test]
#[serial]
fn unset_data_directory_is_a_clean_error() {
    std::env::remove_var("BOREALIS1_DATA");
    let err = catalog::available_runs(Flight::One).unwrap_err();
    assert!(matches!(
        err,
        Error::DataDirectoryNotSet { flight: 1, .. }
    ));
}
