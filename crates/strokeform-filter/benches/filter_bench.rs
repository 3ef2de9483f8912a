//! Benchmarks for the per-frame keypoint conditioning pipeline
//!
//! Run with: cargo bench --package strokeform-filter

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strokeform_core::{BodyLandmark, Confidence, Keypoint, KeypointArray, MAX_KEYPOINTS};
use strokeform_filter::{
    estimate_missing, correct_for_viewpoint, KalmanBank, TemporalSmoother,
};

/// Create a realistic full-body frame with deterministic jitter
fn create_frame(seed: usize) -> KeypointArray {
    let mut frame: KeypointArray = [None; MAX_KEYPOINTS];
    for (i, landmark) in BodyLandmark::all().iter().enumerate() {
        let jitter = ((seed * 31 + i * 17) % 13) as f32 * 0.7;
        let x = 300.0 + (i as f32) * 12.0 + jitter;
        let y = 80.0 + (i as f32) * 45.0 - jitter;
        let confidence = 0.4 + ((seed + i) % 6) as f32 * 0.1;
        frame[i] = Some(Keypoint::new(
            *landmark,
            x,
            y,
            Confidence::new(confidence).unwrap(),
        ));
    }
    frame
}

fn bench_temporal_smoothing(c: &mut Criterion) {
    let frames: Vec<KeypointArray> = (0..120).map(create_frame).collect();

    c.bench_function("temporal_smoother_120_frames", |b| {
        b.iter(|| {
            let mut smoother = TemporalSmoother::default();
            for frame in &frames {
                black_box(smoother.smooth(frame));
            }
        });
    });
}

fn bench_kalman_bank(c: &mut Criterion) {
    let frames: Vec<KeypointArray> = (0..120).map(create_frame).collect();

    c.bench_function("kalman_bank_120_frames", |b| {
        b.iter(|| {
            let mut bank = KalmanBank::default();
            for frame in &frames {
                black_box(bank.apply(frame));
            }
        });
    });
}

fn bench_missing_estimation(c: &mut Criterion) {
    let mut group = c.benchmark_group("missing_keypoint_estimation");

    for &missing in &[0usize, 3, 6] {
        let mut frame = create_frame(7);
        for slot in [
            BodyLandmark::LeftShoulder,
            BodyLandmark::LeftElbow,
            BodyLandmark::RightElbow,
            BodyLandmark::LeftHip,
            BodyLandmark::RightHip,
            BodyLandmark::LeftWrist,
        ]
        .iter()
        .take(missing)
        {
            frame[*slot as usize] = None;
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(missing),
            &frame,
            |b, frame| {
                b.iter(|| black_box(estimate_missing(frame, 0.15)));
            },
        );
    }
    group.finish();
}

fn bench_viewpoint_correction(c: &mut Criterion) {
    let frame = create_frame(3);

    c.bench_function("rear_elevated_correction", |b| {
        b.iter(|| {
            black_box(correct_for_viewpoint(
                &frame,
                strokeform_core::Viewpoint::RearElevated,
            ))
        });
    });
}

criterion_group!(
    benches,
    bench_temporal_smoothing,
    bench_kalman_bank,
    bench_missing_estimation,
    bench_viewpoint_correction
);
criterion_main!(benches);
