use std::time::{Duration, Instant};

use panbrot_core::{
    escape_time, screen_to_complex, DeviceKind, Escape, GestureMachine, GestureMode,
    PixelSurfaceSize, Point, PointerEvent, ViewState,
};

/// Evaluate every pixel of the surface under `view` and collect results into a flat Vec.
fn evaluate_grid(surface: &PixelSurfaceSize, view: &ViewState) -> Vec<Escape> {
    let mut results = Vec::with_capacity((surface.width * surface.height) as usize);
    for py in 0..surface.height {
        for px in 0..surface.width {
            let c = screen_to_complex(surface, Point::new(px as f64, py as f64), view);
            results.push(escape_time(c, view.max_iter));
        }
    }
    results
}

#[test]
fn default_view_contains_set_and_exterior() {
    let surface = PixelSurfaceSize::new(100, 80, 1.0).unwrap();
    let view = ViewState::DEFAULT.with_max_iter(200);

    let results = evaluate_grid(&surface, &view);
    assert_eq!(results.len(), 100 * 80);

    let interior = results.iter().filter(|e| e.is_interior(200)).count();
    let escaped = results.len() - interior;
    assert!(interior > 0, "should have some interior points");
    assert!(escaped > 0, "should have some escaped points");
}

#[test]
fn evaluation_is_deterministic() {
    let surface = PixelSurfaceSize::new(64, 48, 1.0).unwrap();
    let view = ViewState::DEFAULT;
    assert_eq!(
        evaluate_grid(&surface, &view),
        evaluate_grid(&surface, &view),
        "two identical evaluations must produce identical results"
    );
}

#[test]
fn mixed_session_keeps_view_valid() {
    let surface = PixelSurfaceSize::new(800, 600, 1.0).unwrap();
    let mut machine = GestureMachine::default();
    let mut view = ViewState::DEFAULT;
    let t0 = Instant::now();
    let at = |ms: u64| t0 + Duration::from_millis(ms);
    let ev = |id: u32, x: f64, y: f64, ms: u64| {
        PointerEvent::new(id, Point::new(x, y), DeviceKind::Touch, at(ms))
    };

    macro_rules! feed {
        ($update:expr $(,)?) => {
            if let Some(next) = $update {
                view = next;
            }
        };
    }

    // Pan.
    feed!(machine.pointer_down(&ev(1, 400.0, 300.0, 0), &surface, &view));
    for step in 1..=10 {
        let x = 400.0 - step as f64 * 20.0;
        feed!(machine.pointer_move(&ev(1, x, 300.0, step * 16), &surface, &view));
    }
    feed!(machine.pointer_up(&ev(1, 200.0, 300.0, 200), &surface, &view));
    assert_eq!(machine.mode(), GestureMode::Idle);
    assert_eq!(view.zoom, 1.0);
    assert!((view.center_x - (-0.5 + 200.0 * 4.0 / 600.0)).abs() < 1e-12);

    // Pinch in.
    feed!(machine.pointer_down(&ev(1, 300.0, 300.0, 1000), &surface, &view));
    feed!(machine.pointer_down(&ev(2, 500.0, 300.0, 1000), &surface, &view));
    for step in 1..=10 {
        let spread = step as f64 * 20.0;
        feed!(
            machine.pointer_move(&ev(2, 500.0 + spread, 300.0, 1000 + step * 16), &surface, &view),
        );
    }
    feed!(machine.pointer_up(&ev(2, 700.0, 300.0, 1400), &surface, &view));
    feed!(machine.pointer_up(&ev(1, 300.0, 300.0, 1400), &surface, &view));
    assert_eq!(machine.mode(), GestureMode::Idle);
    assert!((view.zoom - 2.0).abs() < 1e-12);

    // Tap in.
    feed!(machine.pointer_down(&ev(3, 100.0, 100.0, 2000), &surface, &view));
    feed!(machine.pointer_up(&ev(3, 100.0, 100.0, 2050), &surface, &view));
    assert!((view.zoom - 3.6).abs() < 1e-12);

    assert!(view.zoom > 0.0 && view.center_x.is_finite() && view.center_y.is_finite());
    assert_eq!(view.max_iter, ViewState::DEFAULT.max_iter);
}
