use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mapreel_core::route::{RoutePlacement, StabilizationOffset};
use mapreel_core::{Color, Point2D, RenderMode, Route, RoutePoint, RouteRenderMode, ScrollMode};
use mapreel_render::layout::{layout_for, place_map, place_video, route_transform, PanelPlacement, Viewport};
use mapreel_render::overlay::OverlayPainter;
use mapreel_render::telemetry::{FrameTimings, InfoContext, Telemetry};

fn create_route(points: usize, mode: RouteRenderMode) -> Route {
    let mut route = Route {
        points: (0..points)
            .map(|i| {
                let t = i as f64 * 0.01;
                RoutePoint {
                    position: Point2D::new(t.cos() * (200.0 + t * 10.0), t.sin() * (200.0 + t * 10.0)),
                    color: Color::rgb((i % 255) as f32 / 255.0, 0.5, 0.2),
                }
            })
            .collect(),
        controls: (0..20).map(|i| Point2D::new(i as f64 * 30.0 - 300.0, 50.0)).collect(),
        runner: Some(Point2D::new(120.0, -40.0)),
        ..Route::default()
    };
    route.style.render_mode = mode;
    route
}

fn bench_layout(c: &mut Criterion) {
    let viewport = Viewport::new(1920, 1080, false);
    let route = RoutePlacement::default();
    let mut video = PanelPlacement::new(1280, 720);
    let mut map = PanelPlacement::new(4000, 3000);

    c.bench_function("mapreel_layout_all_panels", |b| {
        b.iter(|| {
            let layout = layout_for(black_box(RenderMode::All));
            let v = place_video(layout, &mut video, 0.5, &viewport, StabilizationOffset::default());
            let m = place_map(layout, &mut map, &viewport, &route);
            let t = route_transform(&map, &viewport, &route);
            black_box((v, m, t))
        });
    });
}

fn bench_overlay(c: &mut Criterion) {
    let mut group = c.benchmark_group("mapreel_overlay");
    group.sample_size(20);

    let viewport = Viewport::new(1920, 1080, false);
    let map = PanelPlacement::new(4000, 3000);
    let transform = route_transform(&map, &viewport, &RoutePlacement::default());
    let mut painter = OverlayPainter::new(1920, 1080, None).unwrap();

    for (name, mode) in [("normal_route", RouteRenderMode::Normal), ("pace_route", RouteRenderMode::Pace)] {
        let route = create_route(5000, mode);
        group.bench_function(name, |b| {
            b.iter(|| {
                painter.clear();
                painter.draw_route(&route, transform, Some(960));
                painter.draw_divider(960);
            });
        });
    }

    let mut telemetry = Telemetry::new();
    telemetry.start_rendering(&FrameTimings {
        current_time: 12.5,
        frame_time: 16.6,
        ..FrameTimings::default()
    });
    let context = InfoContext {
        is_encoding: false,
        render_mode: RenderMode::All,
        scroll_mode: ScrollMode::None,
        video_scale: 1.0,
        map_scale: 1.0,
        route_scale: 1.0,
        control_time_offset: 0.0,
        runner_time_offset: 0.0,
    };
    group.bench_function("info_panel", |b| {
        b.iter(|| {
            painter.clear();
            painter.draw_info_panel(&telemetry.info_lines(&context));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_layout, bench_overlay);
criterion_main!(benches);
