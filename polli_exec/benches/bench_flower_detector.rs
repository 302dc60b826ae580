//! # Flower Detector Benchmark

use criterion::{criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};

use polli_lib::vision::color_table::{ColorBandSet, HsvBand};
use polli_lib::vision::flower_detector::{FlowerDetector, Params};

fn bench_frame() -> RgbImage {
    let mut frame = RgbImage::from_pixel(640, 480, Rgb([80, 160, 80]));

    // A handful of blobs of both categories scattered over the frame
    let blobs: [(u32, u32, u32, [u8; 3]); 4] = [
        (300, 220, 45, [255, 200, 0]),
        (100, 100, 30, [255, 200, 0]),
        (500, 300, 40, [255, 255, 255]),
        (50, 400, 25, [255, 255, 255]),
    ];

    for &(x0, y0, side, colour) in blobs.iter() {
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                frame.put_pixel(x, y, Rgb(colour));
            }
        }
    }

    frame
}

fn flower_detector_benchmark(c: &mut Criterion) {
    let colors = ColorBandSet {
        female: HsvBand {
            lower: [20, 100, 100],
            upper: [30, 255, 255],
        },
        male: HsvBand {
            lower: [0, 0, 200],
            upper: [179, 30, 255],
        },
        marker: HsvBand {
            lower: [0, 0, 200],
            upper: [179, 30, 255],
        },
        obstacle: HsvBand {
            lower: [0, 0, 0],
            upper: [179, 255, 30],
        },
    };

    let detector = FlowerDetector::with_params(Params::default(), &colors);
    let frame = bench_frame();

    c.bench_function("flower_detector_detect_640x480", |b| {
        b.iter(|| detector.detect(&frame))
    });
}

criterion_group!(benches, flower_detector_benchmark);
criterion_main!(benches);
