//! Benchmarks for the chunk-fill hot path.
//!
//! Measures the checked and unchecked fill variants over an in-memory
//! cursor, so the numbers isolate calibration + resampling + copy from
//! file IO.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use ndarray::Array5;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use borealis_reader::dataset::{MemoryDataset, MemoryEvent};
use borealis_reader::event::{NUM_CHANNELS, SAMPLES_PER_CHANNEL};
use borealis_reader::WaveformReader;

/// A dataset of noise events with a fixed seed.
fn noise_dataset(events: usize) -> MemoryDataset {
    let mut rng = StdRng::seed_from_u64(0x0b0e_a115);
    let list = (0..events)
        .map(|i| {
            let adc: Vec<i16> = (0..NUM_CHANNELS * SAMPLES_PER_CHANNEL)
                .map(|_| 2048 + rng.gen_range(-512i16..512))
                .collect();
            MemoryEvent {
                run: 1,
                event_number: i as u64,
                adc,
            }
        })
        .collect();
    MemoryDataset::new(list).unwrap()
}

fn bench_fill_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_chunk");

    for &events in &[8_usize, 32] {
        let dataset = noise_dataset(events);
        group.throughput(Throughput::Elements((events * NUM_CHANNELS) as u64));

        group.bench_function(BenchmarkId::new("checked", events), |b| {
            b.iter_batched(
                || {
                    (
                        WaveformReader::from_cursor(dataset.clone()),
                        Array5::<f32>::zeros((events, 16, 3, 2, SAMPLES_PER_CHANNEL)),
                    )
                },
                |(mut reader, mut chunk)| {
                    let summary = reader.fill_chunk(&mut chunk.view_mut()).unwrap();
                    black_box(summary);
                    chunk
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(BenchmarkId::new("unchecked", events), |b| {
            b.iter_batched(
                || {
                    (
                        WaveformReader::from_cursor(dataset.clone()),
                        Array5::<f32>::zeros((events, 16, 3, 2, SAMPLES_PER_CHANNEL)),
                    )
                },
                |(mut reader, mut chunk)| {
                    // SAFETY: the buffer is allocated with the full channel
                    // extents in the setup closure
                    let summary =
                        unsafe { reader.fill_chunk_unchecked(&mut chunk.view_mut()).unwrap() };
                    black_box(summary);
                    chunk
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fill_chunk);
criterion_main!(benches);
