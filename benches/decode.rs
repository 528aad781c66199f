use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ov7670_fifo::decode::{PixelDecoder, PixelFormat, Rgb8};
use ov7670_fifo::sim::encode_row;

const WIDTH: usize = 320;
const HEIGHT: usize = 240;

fn frame_rows(format: PixelFormat) -> Vec<Vec<u8>> {
    (0..HEIGHT)
        .map(|y| encode_row(format, WIDTH, y, 0))
        .collect()
}

fn benchmark_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_qvga_frame");
    group.throughput(Throughput::Elements((WIDTH * HEIGHT) as u64));

    for format in PixelFormat::ALL {
        let rows = frame_rows(format);
        group.bench_with_input(BenchmarkId::from_parameter(format), &rows, |b, rows| {
            let mut decoder = PixelDecoder::new(format, WIDTH, HEIGHT).unwrap();
            let mut out = vec![Rgb8::BLACK; WIDTH];
            b.iter(|| {
                for row in rows {
                    let _ = decoder.decode_scanline(black_box(row), &mut out);
                }
                let _ = decoder.finish(&mut out);
                black_box(&out);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_frame_decode);
criterion_main!(benches);
