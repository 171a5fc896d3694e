//! Codec benchmarks for topicwire-protocol.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use serde_json::json;
use topicwire_protocol::{codec, ControlFrame};

fn bench_encode_control(c: &mut Criterion) {
    let frame = ControlFrame::subscribe("market:prices:eur");

    c.bench_function("encode_subscribe", |b| {
        b.iter(|| codec::encode(black_box(&frame)))
    });
}

fn bench_decode_envelope(c: &mut Criterion) {
    let text = serde_json::to_string(&json!({
        "topic": "market:prices:eur",
        "data": {"bid": 1.0842, "ask": 1.0844, "ts": 1_700_000_000_000u64},
    }))
    .unwrap();

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("envelope_small", |b| b.iter(|| codec::decode(black_box(&text))));
    group.finish();
}

criterion_group!(benches, bench_encode_control, bench_decode_envelope);
criterion_main!(benches);
