//! Receive pipeline benchmarks for netchannel
//!
//! Measures frame parsing throughput for:
//! - Whole-stream delivery
//! - Fixed-size chunking (1, 64, 1500 bytes)
//! - Encoding through the send-side handlers

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use netchannel::channel::ReceivePipeline;
use netchannel::codec::{CodecConfig, JsonCodec, Message};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Position {
    entity: u32,
    x: f32,
    y: f32,
    z: f32,
}

impl Message for Position {
    fn message_id(&self) -> u32 {
        1
    }
}

fn codec() -> CodecConfig<Position> {
    JsonCodec::<Position>::new()
        .register::<Position>(1)
        .into_config()
        .build()
        .expect("complete codec")
}

/// Encodes `count` frames back to back.
fn stream(codec: &CodecConfig<Position>, count: u32) -> Vec<u8> {
    let mut wire = BytesMut::new();
    for entity in 0..count {
        let position = Position {
            entity,
            x: entity as f32,
            y: 1.5,
            z: -3.25,
        };
        codec.encode(&position, &mut wire).unwrap();
    }
    wire.to_vec()
}

fn bench_chunk_sizes(c: &mut Criterion) {
    let codec = codec();
    let frames = 1_000;
    let wire = stream(&codec, frames);

    let mut group = c.benchmark_group("receive_pipeline");
    group.throughput(Throughput::Bytes(wire.len() as u64));

    for chunk in [1usize, 64, 1500, wire.len()] {
        group.bench_with_input(BenchmarkId::new("chunk", chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let mut pipeline = ReceivePipeline::new(&codec, 8 * 1024, 16 * 1024 * 1024);
                let mut packets = 0u32;
                for piece in wire.chunks(chunk) {
                    pipeline
                        .feed(black_box(piece), |packet, _| {
                            black_box(packet);
                            packets += 1;
                        })
                        .unwrap();
                }
                assert_eq!(packets, frames);
            });
        });
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let codec = codec();
    let mut group = c.benchmark_group("send_pipeline");
    group.throughput(Throughput::Elements(1));

    group.bench_function("encode_position", |b| {
        let mut buffer = BytesMut::with_capacity(256);
        let position = Position {
            entity: 42,
            x: 1.0,
            y: 2.0,
            z: 3.0,
        };
        b.iter(|| {
            buffer.clear();
            codec.encode(black_box(&position), &mut buffer).unwrap();
            black_box(buffer.len());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_chunk_sizes, bench_encode);
criterion_main!(benches);
