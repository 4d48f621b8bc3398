//! Benchmark suite for the H5075 decoder and advertisement filter.
//!
//! Isolates decode performance from async runtime overhead. The filter is
//! on the hot path of every detection event, so rejections need to be as
//! cheap as full decodes.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use govee_bridge::{
    GOVEE_MANUFACTURER_ID, MacAddress, RawAdvertisement, decode_h5075, process_advertisement,
};
use std::collections::HashMap;

const GOVEE_MAC: MacAddress = MacAddress([0xA4, 0xC1, 0x38, 0xDD, 0xEE, 0xFF]);
const OTHER_MAC: MacAddress = MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);

/// 32.8 C / 54.1 % / battery 64
const PAYLOAD: [u8; 5] = [0x00, 0x05, 0x03, 0x5D, 0x40];

fn govee_advertisement(mac: MacAddress, manufacturer_id: u16) -> RawAdvertisement {
    let mut manufacturer_data = HashMap::new();
    manufacturer_data.insert(manufacturer_id, PAYLOAD.to_vec());
    RawAdvertisement {
        mac,
        name: Some("GVH5075_EEFF".to_string()),
        manufacturer_data,
    }
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_h5075");
    group.throughput(Throughput::Elements(1));

    group.bench_function("valid", |b| {
        b.iter(|| black_box(decode_h5075(black_box(&PAYLOAD))))
    });

    let negative = [0x00, 0x81, 0x8C, 0x50, 0x55];
    group.bench_function("negative_temperature", |b| {
        b.iter(|| black_box(decode_h5075(black_box(&negative))))
    });

    let short = [0x00, 0x05];
    group.bench_function("too_short", |b| {
        b.iter(|| black_box(decode_h5075(black_box(&short))))
    });

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_advertisement");
    group.throughput(Throughput::Elements(1));

    let matching = govee_advertisement(GOVEE_MAC, GOVEE_MANUFACTURER_ID);
    group.bench_function("match", |b| {
        b.iter(|| black_box(process_advertisement(black_box(&matching))))
    });

    let wrong_oui = govee_advertisement(OTHER_MAC, GOVEE_MANUFACTURER_ID);
    group.bench_function("wrong_oui", |b| {
        b.iter(|| black_box(process_advertisement(black_box(&wrong_oui))))
    });

    let wrong_id = govee_advertisement(GOVEE_MAC, 0x0499);
    group.bench_function("missing_manufacturer_id", |b| {
        b.iter(|| black_box(process_advertisement(black_box(&wrong_id))))
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_filter);
criterion_main!(benches);
