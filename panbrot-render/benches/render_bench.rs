use criterion::{black_box, criterion_group, criterion_main, Criterion};

use panbrot_core::{escape_time, Complex, PixelSurfaceSize, ViewState};
use panbrot_render::{
    colorize, compute_rect, CacheConfig, CacheUpdate, PanCache, PixelBuffer, RenderGeneration,
    RenderJob,
};

fn bench_full_cache_fill(c: &mut Criterion) {
    let surface = PixelSurfaceSize::new(320, 240, 1.0).unwrap();
    let view = ViewState::DEFAULT;

    c.bench_function("cache_fill_640x480", |b| {
        b.iter(|| {
            let mut cache = PanCache::new(CacheConfig::default());
            cache.ensure(&surface, &view);
            let mapping = cache.mapping(&surface).unwrap();
            let live = RenderGeneration::new();
            let full = cache.full_rect();
            let mut job = RenderJob::start(&live, full, mapping, view.max_iter, 32);
            let buffer = cache.buffer_mut().unwrap();
            job.run_to_completion(buffer, &live, |_| {});
        });
    });
}

fn bench_pan_patch(c: &mut Criterion) {
    let surface = PixelSurfaceSize::new(320, 240, 1.0).unwrap();
    let mut cache = PanCache::new(CacheConfig::default());
    let mut view = ViewState::DEFAULT;
    cache.ensure(&surface, &view);
    let scale = surface.pixel_scale(view.zoom);

    c.bench_function("pan_patch_12x8", |b| {
        b.iter(|| {
            view = view.with_center(view.center() + Complex::new(12.0 * scale, 8.0 * scale));
            let Some(CacheUpdate::Patch { rects, .. }) = cache.reconcile_pan(&surface, &view)
            else {
                return;
            };
            let mapping = cache.mapping(&surface).unwrap();
            let buffer = cache.buffer_mut().unwrap();
            for rect in &rects {
                compute_rect(buffer, rect, &mapping, view.max_iter);
            }
        });
    });
}

fn bench_colorize(c: &mut Criterion) {
    let escapes: Vec<_> = (0..4096)
        .map(|i| {
            let t = i as f64 / 4096.0;
            escape_time(Complex::new(-2.0 + 2.5 * t, 0.6 - t), 600)
        })
        .collect();

    c.bench_function("colorize_4096", |b| {
        b.iter(|| {
            for e in &escapes {
                black_box(colorize(e, 600));
            }
        });
    });
}

fn bench_single_slice(c: &mut Criterion) {
    let mut buffer = PixelBuffer::new(640, 480);
    let mapping = panbrot_render::PlaneMapping::new(Complex::new(-0.5, 0.0), 4.0 / 240.0, 640, 480);
    let slice = panbrot_render::PixelRect::new(0, 224, 640, 32);

    c.bench_function("slice_640x32", |b| {
        b.iter(|| compute_rect(&mut buffer, &slice, &mapping, 600));
    });
}

criterion_group!(
    benches,
    bench_full_cache_fill,
    bench_pan_patch,
    bench_colorize,
    bench_single_slice
);
criterion_main!(benches);
