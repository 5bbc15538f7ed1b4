use std::sync::Arc;
use std::time::{Duration, Instant};

use unfurl::effects::{Fold2d, Fold2dParams, Fold3d, Fold3dParams, Unveil, UnveilParams};
use unfurl::{
    AnimationEvent, Bitmap, EffectController, HostFrameScheduler, OffscreenSurface, PacingPolicy,
    PixelSize, RenderLoopOpts, SourceKey, SourceSet, UiQueue,
};

fn cover(width: u32, height: u32) -> Bitmap {
    Bitmap::solid(PixelSize::new(width, height), [30, 60, 90, 255]).unwrap()
}

/// Pump the queue until the render thread reports it stopped.
fn pump_until_stopped(
    queue: &UiQueue,
    events: &crossbeam_channel::Receiver<AnimationEvent>,
) -> Vec<AnimationEvent> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        queue.run_for(Duration::from_millis(20));
        seen.extend(events.try_iter());
        if seen
            .iter()
            .any(|e| matches!(e, AnimationEvent::RenderStopped(_)))
        {
            return seen;
        }
    }
    panic!("render thread did not stop; events so far: {seen:?}");
}

#[test]
fn threaded_fold2d_runs_to_completion() {
    let surface = Arc::new(OffscreenSurface::new(PixelSize::new(20, 10)));
    let queue = Arc::new(UiQueue::new());
    let opts = RenderLoopOpts {
        pacing: PacingPolicy::FixedInterval { interval_ms: 2 },
        tween_tick_ms: 4,
    };
    let mut controller = EffectController::new(Fold2d, surface.clone(), queue.clone(), opts);

    let params = Fold2dParams {
        fold_duration_ms: 80,
        vertical_offset: 3.0,
        container_width: 20.0,
        container_height: 10.0,
        ..Fold2dParams::default()
    };
    let handle = controller
        .start_animation(SourceSet::new().with(SourceKey::Cover, cover(20, 10)), params)
        .unwrap();

    let events = pump_until_stopped(&queue, handle.events());
    assert!(events.contains(&AnimationEvent::FirstFrameRendered));
    assert!(events.contains(&AnimationEvent::Ended));
    assert!(handle.is_ended());
    assert_eq!(handle.state().frame.progress, 1.0);

    let report = controller.detach().unwrap();
    assert!(report.frames >= 1);
    assert_eq!(surface.presented_count(), report.frames);
    assert!(!controller.is_attached());
}

#[test]
fn host_driven_unveil_edge_moves_monotonically() {
    let host = Arc::new(HostFrameScheduler::new());
    let surface = Arc::new(OffscreenSurface::new(PixelSize::new(10, 20)));
    let queue = Arc::new(UiQueue::new());
    let mut controller = EffectController::with_scheduler(
        Unveil,
        surface.clone(),
        host.clone(),
        queue.clone(),
        RenderLoopOpts::default(),
    );

    let params = UnveilParams {
        edge_duration_ms: 160,
        peak_duration_ms: 160,
        brand_duration_ms: 80,
        brand_start_delay_ms: 40,
        brand_width: 4.0,
        brand_height: 4.0,
        ..UnveilParams::for_container(10.0, 20.0)
    };
    let sources = SourceSet::new()
        .with(SourceKey::Cover, cover(10, 20))
        .with(SourceKey::Brand, cover(4, 4));
    let handle = controller.start_animation(sources, params).unwrap();

    let mut last_edge = handle.state().frame.edge_y;
    assert_eq!(last_edge, 20.0);
    for _ in 0..10 {
        host.advance(Duration::from_millis(16));
        let edge = handle.state().frame.edge_y;
        assert!(edge <= last_edge, "edge moved back: {edge} > {last_edge}");
        last_edge = edge;
    }
    assert!(handle.is_ended());
    assert_eq!(last_edge, 0.0);

    let events = pump_until_stopped(&queue, handle.events());
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == AnimationEvent::Ended)
            .count(),
        1
    );
    controller.detach();
}

#[test]
fn restarting_replaces_the_run() {
    let host = Arc::new(HostFrameScheduler::new());
    let surface = Arc::new(OffscreenSurface::new(PixelSize::new(20, 10)));
    let queue = Arc::new(UiQueue::new());
    let mut controller = EffectController::with_scheduler(
        Fold2d,
        surface,
        host.clone(),
        queue.clone(),
        RenderLoopOpts::default(),
    );
    let params = Fold2dParams {
        fold_duration_ms: 100,
        container_width: 20.0,
        container_height: 10.0,
        ..Fold2dParams::default()
    };
    let sources = || SourceSet::new().with(SourceKey::Cover, cover(20, 10));

    let first = controller
        .start_animation(sources(), params.clone())
        .unwrap();
    let second = controller.start_animation(sources(), params).unwrap();
    assert!(first.is_ended());
    assert!(!second.is_ended());

    host.advance(Duration::from_millis(100));
    assert!(second.is_ended());
    queue.run_pending();
    assert!(!first.events().try_iter().any(|e| e == AnimationEvent::Ended));
    drop(controller);
    assert_eq!(host.active_runs(), 0);
}

#[test]
fn dropping_the_controller_stops_its_threads() {
    let surface = Arc::new(OffscreenSurface::new(PixelSize::new(20, 10)));
    let queue = Arc::new(UiQueue::new());
    let mut controller = EffectController::new(
        Fold2d,
        surface.clone(),
        queue.clone(),
        RenderLoopOpts::default(),
    );
    let params = Fold2dParams {
        fold_duration_ms: 60_000,
        container_width: 20.0,
        container_height: 10.0,
        ..Fold2dParams::default()
    };
    let handle = controller
        .start_animation(SourceSet::new().with(SourceKey::Cover, cover(20, 10)), params)
        .unwrap();
    while surface.presented_count() == 0 {
        std::thread::yield_now();
    }
    drop(controller);

    assert!(handle.is_ended());
    let after_drop = surface.presented_count();
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(surface.presented_count(), after_drop);
}

#[test]
fn fold_to_angle_turns_back_from_the_current_angle() {
    let host = Arc::new(HostFrameScheduler::new());
    let surface = Arc::new(OffscreenSurface::new(PixelSize::new(20, 10)));
    let queue = Arc::new(UiQueue::new());
    let mut controller = EffectController::with_scheduler(
        Fold3d,
        surface.clone(),
        host.clone(),
        queue.clone(),
        RenderLoopOpts::default(),
    );
    let params = Fold3dParams {
        fold_angle: 90.0,
        fold_duration_ms: 100,
        container_width: 20.0,
        container_height: 10.0,
        ..Fold3dParams::default()
    };
    let first = controller
        .start_animation(SourceSet::new().with(SourceKey::Cover, cover(20, 10)), params)
        .unwrap();
    host.advance(Duration::from_millis(50));
    let reached = first.state().frame.angle;
    assert!(reached > 0.0 && reached < 90.0);

    let back = controller.fold_to_angle(0.0, 100).unwrap();
    assert!(first.is_ended());
    assert_eq!(back.state().frame.angle, reached);
    host.advance(Duration::from_millis(50));
    assert!((back.state().frame.angle - reached / 2.0).abs() < 1e-9);
    host.advance(Duration::from_millis(60));
    assert!(back.is_ended());
    assert_eq!(back.state().frame.angle, 0.0);

    let events = pump_until_stopped(&queue, back.events());
    assert!(events.contains(&AnimationEvent::Ended));
    assert!(surface.presented_count() >= 1);
    controller.detach();
}
