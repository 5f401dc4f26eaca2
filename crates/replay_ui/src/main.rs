use bevy_ecs::prelude::World;
use bevy_ecs::schedule::Schedule;
use eframe::egui::{self, Align2, Color32, FontId, Vec2};
use std::time::{Duration, Instant};

use replay_core::clock::{SimulationClock, TICK_INTERVAL_MS};
use replay_core::geo::Point;
use replay_core::ingest::{load_bundle, FileBundleSource};
use replay_core::runner::{
    init_replay_resources, load_replay, replay_schedule, reset_replay, run_tick,
};
use replay_core::sink::SinkResource;
use replay_core::store::{EntityStore, PartitionSnapshot};

mod panel;

use panel::{PanelSink, PanelState};

fn main() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_maximized(true),
        ..Default::default()
    };
    eframe::run_native(
        "Tricycle Dispatch Replay",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_pixels_per_point(0.9);
            Ok(Box::new(ReplayApp::new()))
        }),
    )
}

struct ReplayApp {
    world: World,
    schedule: Schedule,
    sink: PanelSink,
    bundle_dir: String,
    run_id: String,
    loaded: bool,
    auto_run: bool,
    tick_budget_ms: f64,
    last_frame_instant: Option<Instant>,
    load_error: Option<String>,
    show_trikes: bool,
    show_passengers: bool,
    show_terminals: bool,
    show_connectors: bool,
}

impl ReplayApp {
    fn new() -> Self {
        let sink = PanelSink::default();
        let mut world = World::new();
        world.insert_resource(SinkResource(Box::new(sink.clone())));
        init_replay_resources(&mut world);

        Self {
            world,
            schedule: replay_schedule(),
            sink,
            bundle_dir: "data".to_owned(),
            run_id: String::new(),
            loaded: false,
            auto_run: false,
            tick_budget_ms: 0.0,
            last_frame_instant: None,
            load_error: None,
            show_trikes: true,
            show_passengers: true,
            show_terminals: true,
            show_connectors: true,
        }
    }

    fn load(&mut self) {
        self.reset();
        let source = FileBundleSource::new(self.bundle_dir.clone());
        match load_bundle(&source, &self.run_id) {
            Ok(bundle) => {
                load_replay(&mut self.world, bundle);
                self.loaded = true;
                self.auto_run = true;
                self.load_error = None;
                self.last_frame_instant = Some(Instant::now());
            }
            Err(err) => {
                self.load_error = Some(format!("failed to load '{}': {err}", self.run_id));
            }
        }
    }

    fn reset(&mut self) {
        reset_replay(&mut self.world);
        self.sink.read().clear();
        self.loaded = false;
        self.auto_run = false;
        self.tick_budget_ms = 0.0;
        self.last_frame_instant = None;
        self.load_error = None;
    }

    fn toggle_run(&mut self) {
        if !self.loaded {
            return;
        }
        self.auto_run = !self.auto_run;
        let mut clock = self.world.resource_mut::<SimulationClock>();
        if self.auto_run {
            clock.resume();
            self.last_frame_instant = Some(Instant::now());
        } else {
            clock.pause();
        }
    }

    /// Advance exactly one frame, even while paused.
    fn step_once(&mut self) {
        if !self.loaded {
            return;
        }
        let was_paused = self.world.resource::<SimulationClock>().is_paused();
        if was_paused {
            self.world.resource_mut::<SimulationClock>().resume();
        }
        run_tick(&mut self.world, &mut self.schedule);
        if was_paused {
            self.world.resource_mut::<SimulationClock>().pause();
        }
    }

    /// Convert elapsed wall time into whole ticks; leftovers carry over.
    fn advance_by_wall_clock(&mut self) {
        let now = Instant::now();
        let last = self.last_frame_instant.unwrap_or(now);
        self.last_frame_instant = Some(now);
        self.tick_budget_ms += now.saturating_duration_since(last).as_secs_f64() * 1000.0;

        let interval = TICK_INTERVAL_MS as f64;
        while self.tick_budget_ms >= interval {
            self.tick_budget_ms -= interval;
            if !run_tick(&mut self.world, &mut self.schedule) {
                break;
            }
        }
    }
}

impl eframe::App for ReplayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.auto_run && self.loaded {
            self.advance_by_wall_clock();
            ctx.request_repaint_after(Duration::from_millis(16));
        }

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Bundle dir");
                ui.add(egui::TextEdit::singleline(&mut self.bundle_dir).desired_width(160.0));
                ui.label("Run id");
                ui.add(egui::TextEdit::singleline(&mut self.run_id).desired_width(160.0));
                if ui.button("Load").clicked() {
                    self.load();
                }
                if ui
                    .add_enabled(
                        self.loaded,
                        egui::Button::new(if self.auto_run { "Pause" } else { "Run" }),
                    )
                    .clicked()
                {
                    self.toggle_run();
                }
                if ui
                    .add_enabled(self.loaded && !self.auto_run, egui::Button::new("Step"))
                    .clicked()
                {
                    self.step_once();
                }
                if ui.button("Reset").clicked() {
                    self.reset();
                }
            });

            ui.horizontal(|ui| {
                ui.checkbox(&mut self.show_trikes, "Trikes");
                ui.checkbox(&mut self.show_passengers, "Passengers");
                ui.checkbox(&mut self.show_terminals, "Terminals");
                ui.checkbox(&mut self.show_connectors, "Connector lines");
            });

            let (frame, sim_ms) = {
                let store = self.world.resource::<EntityStore>();
                let clock = self.world.resource::<SimulationClock>();
                let frame = store.frame_watermark();
                (frame, clock.frame_to_ms(frame))
            };
            ui.horizontal(|ui| {
                ui.label(format!("Frame: {frame}"));
                ui.label(format!("Sim time: {}", format_hms_from_ms(sim_ms)));
                if self.loaded && !self.auto_run {
                    ui.colored_label(Color32::from_rgb(255, 200, 0), "paused");
                }
            });

            if let Some(error) = &self.load_error {
                ui.colored_label(Color32::from_rgb(200, 80, 80), error);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let state = self.sink.read();

            ui.group(|ui| {
                ui.heading("Map");
                render_map_legend(ui);

                let map_size = Vec2::new(ui.available_width(), 320.0);
                let (map_rect, _) = ui.allocate_exact_size(map_size, egui::Sense::hover());
                let painter = ui.painter_at(map_rect);

                painter.rect_filled(map_rect, 0.0, Color32::from_gray(20));
                painter.rect_stroke(
                    map_rect,
                    0.0,
                    egui::Stroke::new(1.0, Color32::from_gray(60)),
                    egui::StrokeKind::Middle,
                );

                if let Some(bounds) = state.bounds().map(MapBounds::new) {
                    if self.show_connectors {
                        for line in state.enqueue_lines.values() {
                            draw_line(&painter, &bounds, map_rect, *line, enqueue_line_color());
                        }
                        for line in state.destination_lines.values() {
                            draw_line(&painter, &bounds, map_rect, *line, destination_line_color());
                        }
                    }
                    for (id, marker) in &state.markers {
                        let shown = match marker.label.as_str() {
                            "trike" => self.show_trikes,
                            "passenger" => self.show_passengers,
                            "terminal" => self.show_terminals,
                            _ => true,
                        };
                        if !shown {
                            continue;
                        }
                        if let Some(pos) = project(marker.at, &bounds, map_rect) {
                            let color = marker_color(&state.snapshot, id, &marker.label);
                            draw_marker(&painter, pos, id, color);
                        }
                    }
                }
            });

            ui.add_space(8.0);

            ui.group(|ui| {
                ui.heading("Status");
                render_status_counts(ui, &state.snapshot);
            });

            ui.add_space(8.0);

            ui.group(|ui| {
                ui.heading("Event log");
                render_event_log(ui, &state);
            });
        });
    }
}

struct MapBounds {
    min: Point,
    max: Point,
}

impl MapBounds {
    /// Pad the observed extent so markers on it are not glued to the border.
    fn new((min, max): (Point, Point)) -> Self {
        let pad_lng = ((max.lng - min.lng) * 0.05).max(0.1);
        let pad_lat = ((max.lat - min.lat) * 0.05).max(0.1);
        Self {
            min: Point::new(min.lng - pad_lng, min.lat - pad_lat),
            max: Point::new(max.lng + pad_lng, max.lat + pad_lat),
        }
    }
}

fn project(point: Point, bounds: &MapBounds, rect: egui::Rect) -> Option<egui::Pos2> {
    if bounds.max.lng <= bounds.min.lng || bounds.max.lat <= bounds.min.lat {
        return None;
    }
    let x = (point.lng - bounds.min.lng) / (bounds.max.lng - bounds.min.lng);
    let y = (bounds.max.lat - point.lat) / (bounds.max.lat - bounds.min.lat);
    if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
        return None;
    }
    let px = rect.left() + rect.width() * x as f32;
    let py = rect.top() + rect.height() * y as f32;
    Some(egui::pos2(px, py))
}

fn draw_marker(painter: &egui::Painter, pos: egui::Pos2, label: &str, color: Color32) {
    painter.circle_filled(pos, 4.0, color);
    painter.text(
        pos + Vec2::new(6.0, -6.0),
        Align2::LEFT_TOP,
        label,
        FontId::monospace(8.5),
        color,
    );
}

fn draw_line(
    painter: &egui::Painter,
    bounds: &MapBounds,
    rect: egui::Rect,
    line: (Point, Point),
    color: Color32,
) {
    if let (Some(from), Some(to)) = (project(line.0, bounds, rect), project(line.1, bounds, rect)) {
        painter.line_segment([from, to], egui::Stroke::new(1.0, color));
    }
}

fn legend_item(ui: &mut egui::Ui, color: Color32, label: &str) {
    ui.horizontal(|ui| {
        let (rect, _) = ui.allocate_exact_size(Vec2::new(14.0, 14.0), egui::Sense::hover());
        ui.painter().rect_filled(rect, 2.0, color);
        ui.label(label);
    });
}

fn render_map_legend(ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        ui.label("Passengers:");
        legend_item(ui, passenger_waiting_color(), "Waiting");
        legend_item(ui, passenger_enqueued_color(), "Enqueued");
        legend_item(ui, passenger_onboard_color(), "Onboard");
        legend_item(ui, passenger_completed_color(), "Completed");
    });
    ui.horizontal(|ui| {
        ui.label("Trikes:");
        legend_item(ui, trike_default_color(), "Free");
        legend_item(ui, trike_enqueueing_color(), "Heading to pickup");
        legend_item(ui, trike_serving_color(), "Serving");
        ui.label("Lines:");
        legend_item(ui, enqueue_line_color(), "Pickup");
        legend_item(ui, destination_line_color(), "Destination");
    });
}

fn render_status_counts(ui: &mut egui::Ui, snapshot: &PartitionSnapshot) {
    ui.horizontal(|ui| {
        ui.label(format!("Waiting: {}", snapshot.waiting.len()));
        ui.label(format!("Enqueued: {}", snapshot.enqueued.len()));
        ui.label(format!("Onboard: {}", snapshot.onboard.len()));
        ui.label(format!("Completed: {}", snapshot.completed.len()));
    });
    ui.horizontal(|ui| {
        ui.label(format!("Trikes free: {}", snapshot.trikes_default.len()));
        ui.label(format!(
            "Heading to pickup: {}",
            snapshot.trikes_enqueueing.len()
        ));
        ui.label(format!("Serving: {}", snapshot.trikes_serving.len()));
    });
}

fn render_event_log(ui: &mut egui::Ui, state: &PanelState) {
    let available_width = ui.available_width();
    egui::ScrollArea::vertical()
        .id_salt("event_log_scroll")
        .auto_shrink([false, true])
        .max_height(220.0)
        .show(ui, |ui| {
            ui.set_min_width(available_width);
            egui::Grid::new("event_log")
                .min_col_width(available_width / 5.0)
                .striped(true)
                .show(ui, |ui| {
                    ui.label("Frame");
                    ui.label("Sim time");
                    ui.label("Entity");
                    ui.label("Event");
                    ui.label("Detail");
                    ui.end_row();

                    for line in state.log.iter().rev() {
                        ui.label(line.frame.to_string());
                        ui.label(format_hms_from_ms(
                            line.frame * replay_core::clock::MS_PER_FRAME,
                        ));
                        ui.label(&line.entity);
                        ui.label(&line.kind);
                        ui.label(&line.detail);
                        ui.end_row();
                    }
                });
        });
}

fn marker_color(snapshot: &PartitionSnapshot, id: &str, label: &str) -> Color32 {
    match label {
        "trike" => {
            if snapshot.trikes_serving.iter().any(|t| t == id) {
                trike_serving_color()
            } else if snapshot.trikes_enqueueing.iter().any(|t| t == id) {
                trike_enqueueing_color()
            } else {
                trike_default_color()
            }
        }
        "passenger" => {
            if snapshot.completed.iter().any(|p| p == id) {
                passenger_completed_color()
            } else if snapshot.onboard.iter().any(|p| p == id) {
                passenger_onboard_color()
            } else if snapshot.enqueued.iter().any(|p| p == id) {
                passenger_enqueued_color()
            } else {
                passenger_waiting_color()
            }
        }
        _ => terminal_color(),
    }
}

fn passenger_waiting_color() -> Color32 {
    Color32::from_rgb(255, 200, 0)
}

fn passenger_enqueued_color() -> Color32 {
    Color32::from_rgb(255, 140, 0)
}

fn passenger_onboard_color() -> Color32 {
    Color32::from_rgb(0, 200, 120)
}

fn passenger_completed_color() -> Color32 {
    Color32::from_gray(140)
}

fn trike_default_color() -> Color32 {
    Color32::from_rgb(120, 180, 255)
}

fn trike_enqueueing_color() -> Color32 {
    Color32::from_rgb(255, 200, 0)
}

fn trike_serving_color() -> Color32 {
    Color32::from_rgb(80, 140, 255)
}

fn terminal_color() -> Color32 {
    Color32::from_rgb(160, 80, 200)
}

fn enqueue_line_color() -> Color32 {
    Color32::from_rgb(255, 140, 0)
}

fn destination_line_color() -> Color32 {
    Color32::from_gray(110)
}

fn format_hms_from_ms(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
