use criterion::{Criterion, black_box, criterion_group, criterion_main};
use qr_anchor::tools::synthetic_qr;
use qr_anchor::{FrameBuffer, PerspectiveCorrector, Point, Quadrilateral};

fn bench_rectify_axis_aligned(c: &mut Criterion) {
    let frame = FrameBuffer::solid(1920, 1080, [200, 120, 40, 255]).unwrap();
    let quad = Quadrilateral::new(
        Point::new(100.0, 100.0),
        Point::new(500.0, 100.0),
        Point::new(100.0, 400.0),
        Point::new(500.0, 400.0),
    );
    let corrector = PerspectiveCorrector::default();

    c.bench_function("rectify_400x300_from_1080p", |b| {
        b.iter(|| corrector.rectify(black_box(&quad), black_box(&frame)))
    });
}

fn bench_rectify_skewed(c: &mut Criterion) {
    let qr = synthetic_qr(1280, 720, (400, 150), 16).unwrap();
    let quad = Quadrilateral::new(
        Point::new(380.0, 140.0),
        Point::new(760.0, 170.0),
        Point::new(410.0, 500.0),
        Point::new(745.0, 480.0),
    );
    let corrector = PerspectiveCorrector::default();

    c.bench_function("rectify_skewed_720p", |b| {
        b.iter(|| corrector.rectify(black_box(&quad), black_box(&qr.frame)))
    });
}

criterion_group!(benches, bench_rectify_axis_aligned, bench_rectify_skewed);
criterion_main!(benches);
