use eframe::egui::{
    self, Align, Align2, Button, Color32, CornerRadius, FontId, Layout, Margin, RichText,
    ScrollArea, Sense, Stroke, TextEdit, Vec2, ViewportBuilder, ViewportCommand,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;

use notchbar::apps::{self, AppsManager};
use notchbar::calendar::{self, CalendarManager, ScriptedCalendarSource};
use notchbar::config::Config;
use notchbar::geometry::{self, DisplayBounds, Frame};
use notchbar::media::{MediaBridge, MediaCommand, TrackInfo};
use notchbar::notch::{NotchController, NotchSettings};
use notchbar::notifications::{self, NotificationManager, SystemNotificationSource};
use notchbar::power;
use notchbar::schedule::{Generation, Scheduler, TaskKind};
use notchbar::script::OsaScriptRunner;
use notchbar::state::{ColorTag, Field, NotchState, NotchTab};
use notchbar::tray::{self, TrayManager};

/// A fetch the worker never answers is reissued after this long instead of
/// wedging media updates for the rest of the session.
const MEDIA_INFLIGHT_TIMEOUT: Duration = Duration::from_secs(5);

const PANEL_FILL: Color32 = Color32::from_rgb(31, 31, 31);
const STRIP_FILL: Color32 = Color32::from_rgb(18, 18, 18);
const FAINT_WHITE: Color32 = Color32::from_rgba_premultiplied(26, 26, 26, 26);

fn tag_color(tag: ColorTag) -> Color32 {
    match tag {
        ColorTag::Blue => Color32::from_rgb(10, 132, 255),
        ColorTag::Green => Color32::from_rgb(48, 209, 88),
        ColorTag::Purple => Color32::from_rgb(191, 90, 242),
        ColorTag::Red => Color32::from_rgb(255, 69, 58),
        ColorTag::Orange => Color32::from_rgb(255, 159, 10),
    }
}

fn control_button(ui: &mut egui::Ui, glyph: &str) -> egui::Response {
    ui.add(
        Button::new(RichText::new(glyph).size(18.0))
            .min_size(Vec2::new(48.0, 36.0))
            .corner_radius(CornerRadius::same(10)),
    )
}

struct App {
    config: Config,
    controller: NotchController,
    scheduler: Scheduler,
    state: NotchState,
    bridge: MediaBridge,
    track: Option<TrackInfo>,
    newest_fetch: Option<Generation>,
    media_inflight: bool,
    last_media_request: Option<Instant>,
    calendar: CalendarManager,
    notifications: NotificationManager,
    apps: AppsManager,
    tray: TrayManager,
    search_query: String,
    last_applied_frame: Option<Frame>,
}

impl Default for App {
    fn default() -> Self {
        let config = Config::load().unwrap_or_else(|err| {
            log::warn!("config: falling back to defaults: {err:#}");
            Config::default()
        });
        let settings = NotchSettings {
            collapsed_size: config.window.collapsed_size(),
            expanded_size: config.window.expanded_size(),
            grace_delay: config.behavior.grace_delay(),
            animation_duration: config.behavior.animation_duration(),
            indicator_hide_interval: config.behavior.indicator_hide_interval(),
        };

        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut controller = NotchController::new(settings);
        controller.start(&mut scheduler, now);
        scheduler.schedule(TaskKind::MediaPoll, Duration::ZERO, now);
        scheduler.schedule(TaskKind::ClockTick, Duration::ZERO, now);
        scheduler.schedule(TaskKind::BatteryRefresh, Duration::ZERO, now);

        Self {
            config,
            controller,
            scheduler,
            state: NotchState::default(),
            bridge: MediaBridge::spawn(Box::new(OsaScriptRunner)),
            track: None,
            newest_fetch: None,
            media_inflight: false,
            last_media_request: None,
            calendar: CalendarManager::new(Arc::new(ScriptedCalendarSource::new(OsaScriptRunner))),
            notifications: NotificationManager::new(Arc::new(SystemNotificationSource)),
            apps: AppsManager::new(apps::default_app_directories()),
            tray: TrayManager::new(),
            search_query: String::new(),
            last_applied_frame: None,
        }
    }
}

impl App {
    /// One fetch at a time. `newest_fetch` is what `drain_media_results`
    /// compares against, so bumping it here is what makes older in-flight
    /// answers stale.
    fn maybe_request_fetch(&mut self, now: Instant) {
        if self.media_inflight {
            let stuck = self
                .last_media_request
                .map(|at| now.duration_since(at) >= MEDIA_INFLIGHT_TIMEOUT)
                .unwrap_or(true);
            if !stuck {
                return;
            }
            log::warn!("media: fetch unanswered after {MEDIA_INFLIGHT_TIMEOUT:?}, reissuing");
        }
        let generation = self.scheduler.next_generation();
        self.newest_fetch = Some(generation);
        if self.bridge.request_fetch(generation) {
            self.media_inflight = true;
            self.last_media_request = Some(now);
        }
    }

    fn drain_media_results(&mut self) {
        while let Some(result) = self.bridge.try_recv() {
            if self.newest_fetch != Some(result.generation) {
                log::debug!("media: dropping stale fetch result");
                continue;
            }
            self.media_inflight = false;
            if self.track != result.track {
                self.track = result.track;
                self.state.invalidate(Field::Track);
            }
        }
    }

    fn drain_manager_loads(&mut self) {
        if self.calendar.poll() {
            self.state.invalidate(Field::Events);
        }
        if self.notifications.poll() {
            self.state.invalidate(Field::Notifications);
        }
        if self.apps.poll() {
            self.state.invalidate(Field::Apps);
        }
    }

    fn run_due_tasks(&mut self, now: Instant, display: Option<DisplayBounds>) {
        for kind in self.scheduler.fire_due(now) {
            if self
                .controller
                .handle_task(kind, &mut self.scheduler, now, display)
            {
                continue;
            }
            match kind {
                TaskKind::MediaPoll => {
                    self.scheduler.schedule(
                        TaskKind::MediaPoll,
                        self.config.media.poll_interval(),
                        now,
                    );
                    self.maybe_request_fetch(now);
                }
                TaskKind::MediaRequery => self.maybe_request_fetch(now),
                TaskKind::ClockTick => {
                    self.state
                        .set_clock_text(power::clock_text(Local::now().time()));
                    self.scheduler
                        .schedule(TaskKind::ClockTick, power::CLOCK_REFRESH_INTERVAL, now);
                }
                TaskKind::BatteryRefresh => {
                    self.state.set_battery(power::read_battery());
                    self.scheduler.schedule(
                        TaskKind::BatteryRefresh,
                        power::BATTERY_REFRESH_INTERVAL,
                        now,
                    );
                }
                TaskKind::CollapseAfterGrace | TaskKind::HideIndicator => {}
            }
        }
    }

    fn sync_hover(&mut self, ctx: &egui::Context, now: Instant, display: Option<DisplayBounds>) {
        let hovered = ctx.input(|i| i.pointer.has_pointer());
        if hovered == self.controller.is_hovering() {
            return;
        }
        if hovered {
            self.controller
                .hover_enter(&mut self.scheduler, now, display);
        } else {
            self.controller.hover_exit(&mut self.scheduler, now);
        }
    }

    /// Pushes the controller's frame to the OS window. Skipped when nothing
    /// moved so settled phases cost no viewport traffic.
    fn sync_viewport_frame(
        &mut self,
        ctx: &egui::Context,
        now: Instant,
        display: Option<DisplayBounds>,
    ) {
        let frame = self.controller.frame(now, display);
        if self.last_applied_frame == Some(frame) {
            return;
        }
        self.last_applied_frame = Some(frame);
        let position = match display {
            Some(display) => frame.top_left_position(display),
            None => (frame.x, 0.0),
        };
        ctx.send_viewport_cmd(ViewportCommand::OuterPosition(position.into()));
        ctx.send_viewport_cmd(ViewportCommand::InnerSize(Vec2::new(
            frame.width,
            frame.height,
        )));
    }

    fn sync_observable_state(&mut self) {
        self.state.set_expanded(self.controller.is_expanded());
        self.state.set_pinned(self.controller.is_pinned());
        self.state.set_hovering(self.controller.is_hovering());
        self.state
            .set_indicator_visible(self.controller.indicator_visible());
    }

    fn accept_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        for file in dropped {
            let Some(path) = file.path else { continue };
            if self.tray.add(path) {
                self.state.invalidate(Field::TrayFiles);
            }
        }
    }

    fn send_media_command(&mut self, command: MediaCommand, now: Instant) {
        self.bridge.send_command(command);
        // No synchronous confirmation; a delayed re-query reconciles.
        self.scheduler
            .schedule(TaskKind::MediaRequery, command.requery_delay(), now);
    }

    fn render_collapsed_strip(
        &mut self,
        ui: &mut egui::Ui,
        now: Instant,
        display: Option<DisplayBounds>,
    ) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());
        if self.state.indicator_visible() {
            let painter = ui.painter_at(rect);
            painter.rect_filled(
                rect,
                CornerRadius {
                    nw: 0,
                    ne: 0,
                    sw: 12,
                    se: 12,
                },
                STRIP_FILL,
            );
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                self.state.clock_text(),
                FontId::proportional(13.0),
                Color32::WHITE,
            );
        }
        if response.clicked() {
            self.controller.toggle(now, display);
        }
    }

    fn render_expanded(&mut self, ui: &mut egui::Ui, now: Instant) {
        self.render_header(ui);
        ui.separator();
        ui.add_space(4.0);
        match self.state.selected_tab() {
            NotchTab::Media => self.render_media_panel(ui, now),
            NotchTab::Notifications => self.render_notifications_panel(ui),
            NotchTab::Calendar => self.render_calendar_panel(ui),
            NotchTab::Apps => self.render_apps_panel(ui),
            NotchTab::Tray => self.render_tray_panel(ui),
        }
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for tab in NotchTab::ALL {
                let selected = self.state.selected_tab() == tab;
                let text = format!("{}\n{}", tab.glyph(), tab.label());
                let mut button = Button::new(RichText::new(text).size(11.0))
                    .min_size(Vec2::new(64.0, 46.0))
                    .corner_radius(CornerRadius::same(8));
                if selected {
                    button = button.fill(FAINT_WHITE);
                }
                if ui.add(button).clicked() {
                    self.state.set_selected_tab(tab);
                }
            }
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let mut pin = Button::new(RichText::new("📌").size(14.0))
                    .min_size(Vec2::new(28.0, 28.0))
                    .corner_radius(CornerRadius::same(8));
                if self.state.pinned() {
                    pin = pin.fill(FAINT_WHITE);
                }
                let hover = if self.state.pinned() {
                    "Unpin"
                } else {
                    "Keep open"
                };
                if ui.add(pin).on_hover_text(hover).clicked() {
                    let pinned = !self.controller.is_pinned();
                    self.controller.set_pinned(pinned);
                    self.state.set_pinned(pinned);
                }
                if let Some(battery) = self.state.battery() {
                    ui.label(
                        RichText::new(power::battery_label(battery))
                            .size(12.0)
                            .weak(),
                    );
                }
                ui.label(RichText::new(self.state.clock_text()).size(12.0));
            });
        });
    }

    fn render_media_panel(&mut self, ui: &mut egui::Ui, now: Instant) {
        ui.vertical_centered(|ui| {
            ui.add_space(24.0);
            let Some(track) = self.track.clone() else {
                ui.label(RichText::new("🎵").size(40.0));
                ui.add_space(8.0);
                ui.label(RichText::new("No Media Playing").size(16.0).weak());
                return;
            };
            ui.label(RichText::new(track.title.as_str()).size(18.0).strong());
            ui.label(RichText::new(track.artist.as_str()).size(14.0));
            if let Some(album) = &track.album {
                ui.label(RichText::new(album.as_str()).size(12.0).weak());
            }
            ui.label(
                RichText::new(format!("via {}", track.player.app_name()))
                    .size(10.0)
                    .weak(),
            );
            ui.add_space(16.0);
            ui.horizontal(|ui| {
                let controls = 3.0 * 48.0 + 2.0 * ui.spacing().item_spacing.x;
                ui.add_space(((ui.available_width() - controls) / 2.0).max(0.0));
                if control_button(ui, "⏮").clicked() {
                    self.send_media_command(MediaCommand::PreviousTrack, now);
                }
                let play_pause = if track.playing { "⏸" } else { "▶" };
                if control_button(ui, play_pause).clicked() {
                    self.send_media_command(MediaCommand::PlayPause, now);
                }
                if control_button(ui, "⏭").clicked() {
                    self.send_media_command(MediaCommand::NextTrack, now);
                }
            });
        });
    }

    fn render_notifications_panel(&mut self, ui: &mut egui::Ui) {
        if !self.notifications.has_requested_access() {
            self.notifications.request_access();
        }
        ui.horizontal(|ui| {
            ui.label(RichText::new("Notifications").size(14.0).strong());
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.small_button("Clear All").clicked() && self.notifications.clear() {
                    self.state.invalidate(Field::Notifications);
                }
            });
        });
        ui.add_space(4.0);

        let now = Local::now();
        let mut removed = None;
        ScrollArea::vertical()
            .auto_shrink([false, true])
            .show(ui, |ui| {
                if self.notifications.notifications().is_empty() {
                    ui.add_space(24.0);
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new("No notifications").weak());
                    });
                    return;
                }
                for record in self.notifications.notifications() {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(record.glyph.as_str())
                                .size(18.0)
                                .color(tag_color(record.color)),
                        );
                        ui.vertical(|ui| {
                            ui.horizontal(|ui| {
                                ui.label(RichText::new(record.app_name.as_str()).size(10.0).weak());
                                ui.label(
                                    RichText::new(notifications::relative_age(
                                        record.timestamp,
                                        now,
                                    ))
                                    .size(10.0)
                                    .weak(),
                                );
                            });
                            ui.label(RichText::new(record.title.as_str()).size(12.0).strong());
                            ui.label(RichText::new(record.body.as_str()).size(11.0));
                        });
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            if ui.small_button("✕").clicked() {
                                removed = Some(record.id);
                            }
                        });
                    });
                    ui.add_space(6.0);
                }
            });
        if let Some(id) = removed {
            if self.notifications.remove(id) {
                self.state.invalidate(Field::Notifications);
            }
        }
    }

    fn render_calendar_panel(&mut self, ui: &mut egui::Ui) {
        if !self.calendar.has_requested_access() {
            self.calendar.request_access();
        }
        ui.label(RichText::new("Today").size(14.0).strong());
        ui.add_space(4.0);

        let mut removed = None;
        ScrollArea::vertical()
            .auto_shrink([false, true])
            .show(ui, |ui| {
                if self.calendar.events().is_empty() {
                    ui.add_space(24.0);
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new("No events today").weak());
                    });
                    return;
                }
                for event in self.calendar.events() {
                    ui.horizontal(|ui| {
                        let (bar, _) = ui.allocate_exact_size(Vec2::new(3.0, 34.0), Sense::hover());
                        ui.painter()
                            .rect_filled(bar, CornerRadius::same(1), tag_color(event.color));
                        ui.vertical(|ui| {
                            ui.label(RichText::new(event.title.as_str()).size(12.0).strong());
                            if let Some(location) = &event.location {
                                ui.label(RichText::new(location.as_str()).size(10.0).weak());
                            }
                        });
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            if ui.small_button("✕").clicked() {
                                removed = Some(event.id);
                            }
                            ui.label(
                                RichText::new(calendar::format_time_range(event))
                                    .size(10.0)
                                    .weak(),
                            );
                        });
                    });
                    ui.add_space(6.0);
                }
            });
        if let Some(id) = removed {
            if self.calendar.remove(id) {
                self.state.invalidate(Field::Events);
            }
        }
    }

    fn render_apps_panel(&mut self, ui: &mut egui::Ui) {
        if self.apps.apps().is_empty() && !self.apps.is_loading() {
            self.apps.load();
        }
        ui.horizontal(|ui| {
            ui.label("🔍");
            ui.add(
                TextEdit::singleline(&mut self.search_query)
                    .hint_text("Search apps")
                    .desired_width(f32::INFINITY),
            );
        });
        ui.add_space(6.0);
        if self.apps.is_loading() {
            ui.vertical_centered(|ui| {
                ui.add_space(24.0);
                ui.spinner();
            });
            return;
        }

        let mut launch = None;
        ScrollArea::vertical()
            .auto_shrink([false, true])
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for entry in apps::filter_apps(self.apps.apps(), &self.search_query) {
                        let text = format!("📦\n{}", entry.name);
                        let button = Button::new(RichText::new(text).size(11.0))
                            .min_size(Vec2::new(132.0, 52.0))
                            .corner_radius(CornerRadius::same(10));
                        if ui.add(button).on_hover_text(&entry.bundle_id).clicked() {
                            launch = Some(entry.clone());
                        }
                    }
                });
            });
        if let Some(entry) = launch {
            apps::launch(&entry);
        }
    }

    fn render_tray_panel(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("File Tray").size(14.0).strong());
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.small_button("Clear All").clicked() && self.tray.clear() {
                    self.state.invalidate(Field::TrayFiles);
                }
            });
        });
        ui.add_space(4.0);
        if self.tray.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.label(RichText::new("⬇").size(32.0).weak());
                ui.label(RichText::new("Drop files here").size(13.0).weak());
            });
            return;
        }

        let mut removed = None;
        let mut opened = None;
        ScrollArea::vertical()
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for file in self.tray.files_mut() {
                    let size_text = file.size().map(tray::human_size);
                    ui.horizontal(|ui| {
                        ui.label("📄");
                        if ui
                            .link(RichText::new(file.name.as_str()).size(12.0))
                            .clicked()
                        {
                            opened = Some(file.clone());
                        }
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            if ui.small_button("✕").clicked() {
                                removed = Some(file.id);
                            }
                            if let Some(size_text) = &size_text {
                                ui.label(RichText::new(size_text.as_str()).size(10.0).weak());
                            }
                        });
                    });
                    ui.add_space(4.0);
                }
            });
        if let Some(file) = opened {
            tray::open(&file);
        }
        if let Some(id) = removed {
            if self.tray.remove(id) {
                self.state.invalidate(Field::TrayFiles);
            }
        }
    }
}

impl eframe::App for App {
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        // Everything visible is painted by the strip or the panel.
        [0.0, 0.0, 0.0, 0.0]
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let display = ctx.input(|i| i.viewport().monitor_size).and_then(|size| {
            (size.x > 0.0 && size.y > 0.0).then(|| DisplayBounds::new(size.x, size.y))
        });

        self.drain_media_results();
        self.drain_manager_loads();
        self.accept_dropped_files(ctx);
        self.sync_hover(ctx, now, display);
        self.run_due_tasks(now, display);
        self.sync_observable_state();
        self.sync_viewport_frame(ctx, now, display);

        if self.controller.is_expanded() {
            egui::CentralPanel::default()
                .frame(
                    egui::Frame::new()
                        .fill(PANEL_FILL)
                        .corner_radius(CornerRadius::same(24))
                        .stroke(Stroke::new(0.5, FAINT_WHITE))
                        .inner_margin(Margin::same(16)),
                )
                .show(ctx, |ui| self.render_expanded(ui, now));
        } else {
            egui::CentralPanel::default()
                .frame(egui::Frame::NONE)
                .show(ctx, |ui| self.render_collapsed_strip(ui, now, display));
        }

        let dirty = self.state.take_dirty();
        if !dirty.is_empty() || self.controller.is_animating(now) {
            ctx.request_repaint();
        } else if let Some(due) = self.scheduler.next_due() {
            ctx.request_repaint_after(due.saturating_duration_since(now));
        }
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")
        .and_then(|logger| logger.start())
        .map_err(|err| eprintln!("logger init failed: {err}"))
        .ok();

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_transparent(true)
            .with_decorations(false)
            .with_always_on_top()
            .with_resizable(false)
            .with_inner_size([geometry::COLLAPSED_WIDTH, geometry::COLLAPSED_HEIGHT]),
        ..Default::default()
    };
    eframe::run_native(
        "notchbar",
        native_options,
        Box::new(
            |_cc| -> Result<Box<dyn eframe::App>, Box<dyn std::error::Error + Send + Sync>> {
                Ok(Box::new(App::default()))
            },
        ),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use notchbar::script::{ScriptError, ScriptRunner};

    /// Answers the first script call with a track and every later call with
    /// silence.
    struct FirstAnswerRunner(AtomicUsize);

    impl ScriptRunner for FirstAnswerRunner {
        fn run(&self, _source: &str) -> Result<String, ScriptError> {
            if self.0.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok("Old Song|||Old Artist|||Old Album|||true".to_string())
            } else {
                Ok(String::new())
            }
        }
    }

    #[test]
    fn inflight_fetch_suppresses_duplicates() {
        let mut app = App::default();
        let now = Instant::now();

        app.maybe_request_fetch(now);
        let first = app.newest_fetch;
        assert!(first.is_some());
        assert!(app.media_inflight);

        app.maybe_request_fetch(now + Duration::from_millis(100));
        assert_eq!(app.newest_fetch, first);
    }

    #[test]
    fn stuck_fetch_is_reissued_after_timeout() {
        let mut app = App::default();
        let start = Instant::now();

        app.maybe_request_fetch(start);
        let first = app.newest_fetch;

        app.maybe_request_fetch(start + MEDIA_INFLIGHT_TIMEOUT);
        assert_ne!(app.newest_fetch, first);
    }

    #[test]
    fn stale_fetch_results_are_ignored() {
        let mut app = App::default();
        app.bridge = MediaBridge::spawn(Box::new(FirstAnswerRunner(AtomicUsize::new(0))));

        // Two fetches in flight at once; only the newer one counts.
        let old = app.scheduler.next_generation();
        let newest = app.scheduler.next_generation();
        assert!(app.bridge.request_fetch(old));
        assert!(app.bridge.request_fetch(newest));
        app.newest_fetch = Some(newest);
        app.media_inflight = true;

        let deadline = Instant::now() + Duration::from_secs(2);
        while app.media_inflight {
            app.drain_media_results();
            assert!(Instant::now() < deadline, "newest fetch never drained");
            std::thread::sleep(Duration::from_millis(5));
        }

        // The old result carried a track; dropping it means it never showed.
        assert_eq!(app.track, None);
        assert!(!app.state.is_dirty());
    }

    #[test]
    fn tag_colors_are_distinct() {
        let colors = [
            ColorTag::Blue,
            ColorTag::Green,
            ColorTag::Purple,
            ColorTag::Red,
            ColorTag::Orange,
        ]
        .map(tag_color);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
