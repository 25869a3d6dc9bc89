//! Benchmarks for streaming performance.
//!
//! Measures chunked file reads through the stream transport.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use futures::StreamExt;
use homereel::server::media_url;
use homereel::streaming::open_stream;
use homereel_common::paths::MediaKind;

fn bench_file_stream(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();

    let mut group = c.benchmark_group("file_stream");
    group.sample_size(20);

    for size in [256 * 1024, 4 * 1024 * 1024, 32 * 1024 * 1024] {
        let path = dir.path().join(format!("file_{size}.mp4"));
        std::fs::write(&path, vec![0u8; size]).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("drain_{}", size), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let media = open_stream(&path, MediaKind::Video).await.unwrap();
                    let total = media
                        .stream
                        .fold(0usize, |n, chunk| async move { n + chunk.unwrap().len() })
                        .await;
                    black_box(total)
                })
            });
        });
    }

    group.finish();
}

fn bench_media_url(c: &mut Criterion) {
    let path = "/srv/media/Series/The Wire (2002)/Season 1/01 - The Target.mkv";
    c.bench_function("media_url", |b| {
        b.iter(|| black_box(media_url(black_box("http://192.168.1.20:8080"), "stream", path)))
    });
}

criterion_group!(benches, bench_file_stream, bench_media_url);
criterion_main!(benches);
