use std::time::{Duration, Instant};

use panbrot_core::{
    escape_time, screen_to_complex, Complex, DeviceKind, PixelSurfaceSize, Point, PointerEvent,
    ViewState,
};
use panbrot_render::{colorize_rgba, Explorer, ExplorerConfig, FrameStatus, PixelBuffer};

const EPSILON: f64 = 1e-12;

/// The pixel the explorer should show at device pixel `(px, py)` for `view`.
fn expected_pixel(surface: &PixelSurfaceSize, view: &ViewState, px: u32, py: u32) -> [u8; 4] {
    let dpr = surface.device_pixel_ratio;
    let c = screen_to_complex(surface, Point::new(px as f64 / dpr, py as f64 / dpr), view);
    colorize_rgba(&escape_time(c, view.max_iter), view.max_iter)
}

fn matching_fraction(visible: &PixelBuffer, surface: &PixelSurfaceSize, view: &ViewState) -> f64 {
    let mut same = 0usize;
    for y in 0..visible.height {
        for x in 0..visible.width {
            if visible.pixel(x, y) == expected_pixel(surface, view, x, y) {
                same += 1;
            }
        }
    }
    same as f64 / (visible.width * visible.height) as f64
}

fn ready(width: f64, height: f64, max_iter: u32) -> (Explorer, PixelBuffer) {
    let mut explorer = Explorer::default();
    explorer.resize(width, height, 1.0);
    explorer.set_max_iter(max_iter);
    let visible = PixelBuffer::new(width as u32, height as u32);
    (explorer, visible)
}

fn mouse(id: u32, x: f64, y: f64, time: Instant) -> PointerEvent {
    PointerEvent::new(id, Point::new(x, y), DeviceKind::Mouse, time)
}

fn touch(id: u32, x: f64, y: f64, time: Instant) -> PointerEvent {
    PointerEvent::new(id, Point::new(x, y), DeviceKind::Touch, time)
}

#[test]
fn first_render_matches_direct_evaluation() {
    let (mut explorer, mut visible) = ready(64.0, 48.0, 120);
    let frames = explorer.settle(&mut visible);
    // 128×96 cache in 32-row slices.
    assert_eq!(frames, 3);

    let surface = *explorer.surface().unwrap();
    for (x, y) in [(0, 0), (32, 24), (63, 47), (10, 40)] {
        assert_eq!(
            visible.pixel(x, y),
            expected_pixel(&surface, explorer.view(), x, y),
            "pixel ({x}, {y})"
        );
    }
    assert_eq!(matching_fraction(&visible, &surface, explorer.view()), 1.0);
}

#[test]
fn visible_surface_updates_after_every_slice() {
    let (mut explorer, mut visible) = ready(64.0, 48.0, 120);
    assert_eq!(explorer.frame(&mut visible), FrameStatus::Busy);
    // The first slice covers cache rows 0..32; the viewport starts at row 24.
    let surface = *explorer.surface().unwrap();
    assert_eq!(visible.pixel(5, 3), expected_pixel(&surface, explorer.view(), 5, 3));
    assert_eq!(visible.pixel(5, 20), [0, 0, 0, 255]);
}

#[test]
fn click_at_center_zooms_without_moving() {
    let (mut explorer, mut visible) = ready(800.0, 600.0, 100);
    let t = Instant::now();
    explorer.pointer_down(&mouse(1, 400.0, 300.0, t));
    explorer.pointer_up(&mouse(1, 400.0, 300.0, t + Duration::from_millis(90)));

    let view = explorer.view();
    assert!((view.zoom - 1.8).abs() < EPSILON);
    assert!((view.center_x + 0.5).abs() < EPSILON);
    assert!(view.center_y.abs() < EPSILON);

    assert_eq!(explorer.frame(&mut visible), FrameStatus::Busy);
    assert_eq!(explorer.cache().state().unwrap().zoom, 1.8);
}

#[test]
fn pinch_apart_zooms_by_distance_ratio() {
    let mut explorer = Explorer::default();
    explorer.resize(400.0, 600.0, 1.0);
    let t = Instant::now();
    explorer.pointer_down(&touch(1, 100.0, 300.0, t));
    explorer.pointer_down(&touch(2, 300.0, 300.0, t));
    explorer.pointer_move(&touch(1, 50.0, 300.0, t + Duration::from_millis(40)));
    explorer.pointer_move(&touch(2, 350.0, 300.0, t + Duration::from_millis(40)));

    let view = explorer.view();
    assert!((view.zoom - 1.5).abs() < EPSILON);
    assert!((view.center_x + 0.5).abs() < EPSILON);
    assert!(view.center_y.abs() < EPSILON);

    explorer.pointer_up(&touch(1, 50.0, 300.0, t + Duration::from_millis(60)));
    explorer.pointer_up(&touch(2, 350.0, 300.0, t + Duration::from_millis(70)));
    // A moved pinch is not a tap.
    assert!((explorer.view().zoom - 1.5).abs() < EPSILON);
    assert!(!explorer.is_dragging());
}

#[test]
fn quick_two_finger_tap_zooms_out() {
    let mut explorer = Explorer::default();
    explorer.resize(800.0, 600.0, 1.0);
    let t = Instant::now();
    explorer.pointer_down(&touch(1, 300.0, 200.0, t));
    explorer.pointer_down(&touch(2, 500.0, 200.0, t + Duration::from_millis(10)));
    explorer.pointer_move(&touch(2, 503.0, 201.0, t + Duration::from_millis(40)));
    // The wobble is still a live pinch: the zoom follows the spread.
    let wobbled = *explorer.view();
    assert!((wobbled.zoom - 203.0 / 200.0).abs() < 1e-4);
    explorer.pointer_up(&touch(1, 300.0, 200.0, t + Duration::from_millis(90)));
    explorer.pointer_up(&touch(2, 503.0, 201.0, t + Duration::from_millis(100)));

    let view = explorer.view();
    assert!((view.zoom - wobbled.zoom / 1.8).abs() < EPSILON);
    // The tap midpoint is above the screen center, so the view moves.
    assert!(view.center_y != 0.0);
}

#[test]
fn drag_pans_through_the_cache() {
    let (mut explorer, mut visible) = ready(64.0, 48.0, 120);
    explorer.settle(&mut visible);

    let t = Instant::now();
    explorer.pointer_down(&mouse(1, 30.0, 20.0, t));
    explorer.pointer_move(&mouse(1, 40.0, 14.0, t + Duration::from_millis(16)));
    assert!(explorer.is_dragging());

    // One frame reconciles: shift plus a patch of the exposed strips.
    let center_before = explorer.cache().state().unwrap().center();
    assert_eq!(explorer.frame(&mut visible), FrameStatus::Busy);
    let state = explorer.cache().state().unwrap();
    assert_ne!(state.center(), center_before);
    assert_eq!(state.center(), explorer.view().center());
    // Strips are 10 columns plus 6 rows of a 128×96 cache.
    assert_eq!(explorer.progress().1, 10 * 96 + 128 * 6);

    explorer.settle(&mut visible);
    explorer.pointer_up(&mouse(1, 40.0, 14.0, t + Duration::from_millis(32)));
    assert!(!explorer.is_dragging());

    let surface = *explorer.surface().unwrap();
    assert!(matching_fraction(&visible, &surface, explorer.view()) > 0.95);
}

#[test]
fn drag_on_high_density_surface_shifts_by_device_pixels() {
    let mut explorer = Explorer::default();
    explorer.resize(32.0, 24.0, 2.0);
    explorer.set_max_iter(120);
    let mut visible = PixelBuffer::new(64, 48);
    explorer.settle(&mut visible);
    let surface = *explorer.surface().unwrap();
    assert_eq!(matching_fraction(&visible, &surface, explorer.view()), 1.0);

    // 5 × 3 layout units of drag under the finger.
    let t = Instant::now();
    explorer.pointer_down(&mouse(1, 15.0, 10.0, t));
    explorer.pointer_move(&mouse(1, 20.0, 7.0, t + Duration::from_millis(16)));
    let scale = surface.pixel_scale(explorer.view().zoom);
    assert!((explorer.view().center_x - (-0.5 - 10.0 * scale)).abs() < EPSILON);

    assert_eq!(explorer.frame(&mut visible), FrameStatus::Busy);
    // A 10 × 6 device-pixel shift of the 128×96 cache.
    assert_eq!(explorer.progress().1, 10 * 96 + 128 * 6);

    explorer.settle(&mut visible);
    explorer.pointer_up(&mouse(1, 20.0, 7.0, t + Duration::from_millis(32)));
    assert!(matching_fraction(&visible, &surface, explorer.view()) > 0.95);
}

#[test]
fn pan_during_unfinished_render_leaves_no_holes() {
    let (mut explorer, mut visible) = ready(64.0, 48.0, 120);
    // Only the first slice of the fill is done.
    assert_eq!(explorer.frame(&mut visible), FrameStatus::Busy);

    let t = Instant::now();
    explorer.pointer_down(&mouse(1, 30.0, 20.0, t));
    explorer.pointer_move(&mouse(1, 22.0, 29.0, t + Duration::from_millis(16)));
    explorer.settle(&mut visible);

    let cache = explorer.cache().buffer().unwrap();
    let holes = cache
        .pixels
        .chunks_exact(4)
        .filter(|px| *px == [0, 0, 0, 255])
        .count();
    assert_eq!(holes, 0, "every cache pixel must have been computed");
}

#[test]
fn large_pan_refills_the_cache() {
    let (mut explorer, mut visible) = ready(64.0, 48.0, 120);
    explorer.settle(&mut visible);

    let surface = *explorer.surface().unwrap();
    let scale = surface.pixel_scale(explorer.view().zoom);
    let far = explorer
        .view()
        .with_center(explorer.view().center() + Complex::new(100.0 * scale, 0.0));
    explorer.set_view(far);

    assert_eq!(explorer.frame(&mut visible), FrameStatus::Busy);
    assert_eq!(explorer.progress().1, 128 * 96);
    explorer.settle(&mut visible);
    assert_eq!(matching_fraction(&visible, &surface, explorer.view()), 1.0);
}

#[test]
fn newer_render_supersedes_older_one() {
    let (mut explorer, mut visible) = ready(64.0, 48.0, 120);
    assert_eq!(explorer.frame(&mut visible), FrameStatus::Busy);
    explorer.zoom_in();
    assert_eq!(explorer.frame(&mut visible), FrameStatus::Busy);
    // The restarted fill reports progress against a fresh total.
    assert_eq!(explorer.progress(), (128 * 32, 128 * 96));
    explorer.settle(&mut visible);

    let surface = *explorer.surface().unwrap();
    assert_eq!(matching_fraction(&visible, &surface, explorer.view()), 1.0);
}

#[test]
fn resize_resets_the_cache() {
    let (mut explorer, mut visible) = ready(64.0, 48.0, 120);
    explorer.settle(&mut visible);
    assert!(!explorer.resize(64.4, 48.9, 1.0));
    assert!(explorer.resize(80.0, 48.0, 1.0));

    let mut visible = PixelBuffer::new(80, 48);
    assert_eq!(explorer.frame(&mut visible), FrameStatus::Busy);
    let state = explorer.cache().state().unwrap();
    assert_eq!((state.width, state.height), (160, 96));
}

#[test]
fn snapshot_copies_visible_pixels() {
    let (mut explorer, mut visible) = ready(32.0, 32.0, 100);
    assert!(Explorer::default().snapshot().is_none());
    explorer.settle(&mut visible);
    assert_eq!(explorer.snapshot().unwrap(), visible);
}

#[test]
fn custom_config_controls_slice_size() {
    let mut config = ExplorerConfig::default();
    config.cache.chunk_rows = 96;
    let mut explorer = Explorer::new(config);
    explorer.resize(64.0, 48.0, 1.0);
    let mut visible = PixelBuffer::new(64, 48);
    assert_eq!(explorer.frame(&mut visible), FrameStatus::Idle);
    assert_eq!(explorer.progress(), (128 * 96, 128 * 96));
}
