//! # Relay Envelope Benchmarks
//!
//! Per-request cost of the pieces every query passes through:
//!
//! | Stage | Target |
//! |-------|--------|
//! | JWT encode / decode | < 50µs |
//! | Sealed encode / decode | < 50µs |
//! | Request validation | < 5µs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use relay_gateway::domain::config::{EnvelopeConfig, Secret};
use relay_gateway::{build_codec, validate, EnvelopeScheme, SystemTimeSource};
use serde_json::json;
use std::sync::Arc;

const SECRET: &str = "benchmark-secret-0123456789abcde";

fn bench_envelope_codecs(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");
    let payload = json!({
        "query_type": "bgp_route",
        "vrf": "default",
        "target": "203.0.113.0/24"
    });

    for scheme in [EnvelopeScheme::Jwt, EnvelopeScheme::Sealed] {
        let config = EnvelopeConfig {
            scheme,
            secret: Some(Secret::new(SECRET)),
            ..EnvelopeConfig::default()
        };
        let codec = build_codec(&config, Arc::new(SystemTimeSource)).unwrap();
        let token = codec.encode(&payload).unwrap();

        group.bench_with_input(
            BenchmarkId::new("encode", format!("{:?}", scheme)),
            &payload,
            |b, payload| b.iter(|| black_box(codec.encode(payload).unwrap())),
        );
        group.bench_with_input(
            BenchmarkId::new("decode", format!("{:?}", scheme)),
            &token,
            |b, token| b.iter(|| black_box(codec.decode(token).unwrap())),
        );
    }

    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");

    let cases = [
        ("ping", json!({"query_type": "ping", "target": "2001:db8::1"})),
        (
            "bgp_community",
            json!({"query_type": "bgp_community", "target": "4200000000:1:2"}),
        ),
        (
            "invalid",
            json!({"query_type": "ping", "vrf": "bad vrf", "target": "nope"}),
        ),
    ];

    for (name, payload) in &cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), payload, |b, payload| {
            b.iter(|| black_box(validate(payload).is_ok()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_envelope_codecs, bench_validation);
criterion_main!(benches);
