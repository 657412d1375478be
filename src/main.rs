//! narrate-rs - multi-speaker story narration desktop host
//!
//! Opens one raw 16-bit PCM clip per script line (24 kHz mono, as returned
//! by the speech service), composes them into a single track, and plays,
//! scrubs and exports it. An optional ambience file loops underneath.

use eframe::egui;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod settings;

use narrate::audio::{AudioEngine, BackgroundTrack};
use narrate::export::{default_file_name, export_wav, format_time};
use narrate::narration::{compose, RawClip, Studio};
use narrate::playback::{MonotonicClock, PlaybackEvent, PlaybackStatus, Player};
use narrate::render::{SeekBar, WaveformRenderer, DEFAULT_HEIGHT};
use settings::AppSettings;

fn main() -> eframe::Result<()> {
    env_logger::init();
    log::info!("Starting narrate-rs");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 420.0])
            .with_title("narrate-rs"),
        ..Default::default()
    };

    eframe::run_native(
        "narrate-rs",
        options,
        Box::new(|cc| Ok(Box::new(NarrateApp::new(cc)))),
    )
}

struct NarrateApp {
    player: Player<MonotonicClock, AudioEngine>,
    studio: Studio,
    seek_bar: SeekBar,
    renderer: WaveformRenderer,
    settings: AppSettings,
    clip_names: Vec<String>,
    background_name: Option<String>,
    background_path: Option<PathBuf>,
    status: String,
    show_settings: bool,
}

impl NarrateApp {
    fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let mut app = Self {
            player: Player::new(MonotonicClock::new(), AudioEngine::new()),
            studio: Studio::new(),
            seek_bar: SeekBar::new(),
            renderer: WaveformRenderer::new(DEFAULT_HEIGHT),
            settings: AppSettings::default(),
            clip_names: Vec::new(),
            background_name: None,
            background_path: None,
            status: "Open clips to begin".to_string(),
            show_settings: false,
        };

        AppSettings::load().apply(&mut app);
        app
    }

    /// Read the picked clips in file-name order and compose them
    fn open_clips(&mut self, mut paths: Vec<PathBuf>) {
        paths.sort();

        let mut clips = Vec::with_capacity(paths.len());
        for path in &paths {
            match std::fs::read(path) {
                Ok(pcm) => clips.push(RawClip {
                    speaker: path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    pcm,
                }),
                Err(e) => {
                    log::error!("Failed to read {}: {}", path.display(), e);
                    self.status = format!("Error: {}: {}", path.display(), e);
                    return;
                }
            }
        }

        self.studio.begin();
        let result = compose(&clips, self.settings.gap_seconds);
        match self.studio.finish(result) {
            Ok(track) => {
                let track = track.clone();
                self.status = format!(
                    "{} lines, {}",
                    clips.len(),
                    format_time(track.duration_secs())
                );
                self.clip_names = clips.into_iter().map(|c| c.speaker).collect();
                self.player.load(Some(track));
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
            }
        }
    }

    fn load_background(&mut self, path: &Path) {
        match BackgroundTrack::load(path) {
            Ok(track) => {
                self.background_name = Some(track.filename.clone());
                self.background_path = Some(track.path.clone());
                self.player.set_background(Some(track));
            }
            Err(e) => {
                log::error!("Failed to load background: {}", e);
                self.status = format!("Error: {}", e);
            }
        }
    }

    fn clear_background(&mut self) {
        self.player.set_background(None);
        self.background_name = None;
        self.background_path = None;
    }

    fn export(&mut self) {
        let Some(track) = self.studio.track() else {
            return;
        };

        let mut dialog = rfd::FileDialog::new()
            .add_filter("WAV", &["wav"])
            .set_file_name(default_file_name());
        if let Some(dir) = &self.settings.export_dir {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };

        match export_wav(track, &path) {
            Ok(_) => {
                self.status = format!("Saved {}", path.display());
                self.settings.export_dir = path.parent().map(Path::to_path_buf);
            }
            Err(e) => {
                log::error!("Export failed: {}", e);
                self.status = format!("Error: {}", e);
            }
        }
    }
}

impl eframe::App for NarrateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(PlaybackEvent::Finished) = self.player.poll() {
            log::info!("Playback finished");
        }
        if self.player.status() == PlaybackStatus::Playing {
            ctx.request_repaint_after(Duration::from_millis(self.settings.tick_interval_ms));
        }

        // Top panel
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("narrate-rs");
                ui.separator();

                if ui.button("📂 Open clips").clicked() {
                    if let Some(paths) = rfd::FileDialog::new()
                        .add_filter("Raw PCM (s16le, 24 kHz)", &["pcm", "raw"])
                        .pick_files()
                    {
                        self.open_clips(paths);
                    }
                }

                if ui.button("🎵 Background").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Audio", &["wav", "mp3", "flac", "ogg", "m4a", "aac"])
                        .pick_file()
                    {
                        self.load_background(&path);
                    }
                }

                if self.background_name.is_some() && ui.button("✕").clicked() {
                    self.clear_background();
                }

                let can_export = self.studio.track().is_some();
                if ui
                    .add_enabled(can_export, egui::Button::new("💾 Export"))
                    .clicked()
                {
                    self.export();
                }

                ui.separator();
                ui.label(&self.status);

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.toggle_value(&mut self.show_settings, "⚙ Settings");
                });
            });
        });

        // Bottom panel: waveform seek bar and transport
        egui::TopBottomPanel::bottom("playback_panel").show(ctx, |ui| {
            ui.add_space(4.0);

            let frame = self.renderer.render(
                self.player.track(),
                self.settings.waveform_columns,
                self.player.position(),
                self.player.duration(),
            );
            let size = egui::vec2(ui.available_width(), DEFAULT_HEIGHT);
            if let Some(fraction) = self.seek_bar.show(ui, &frame, size) {
                self.player.seek_fraction(fraction);
            }

            ui.add_space(4.0);

            ui.horizontal(|ui| {
                let has_track = self.player.track().is_some();

                let play_text = match self.player.status() {
                    PlaybackStatus::Playing => "⏸",
                    _ => "▶",
                };
                if ui
                    .add_enabled(has_track, egui::Button::new(play_text))
                    .clicked()
                {
                    self.player.toggle();
                }

                if ui.add_enabled(has_track, egui::Button::new("⏹")).clicked() {
                    self.player.stop();
                }

                ui.separator();

                ui.label(format!(
                    "{} / {}",
                    format_time(self.player.position()),
                    format_time(self.player.duration())
                ));

                ui.separator();

                ui.label("Vol:");
                let mut gain = self.player.master_gain();
                if ui
                    .add(egui::Slider::new(&mut gain, 0.0..=1.0).show_value(false))
                    .changed()
                {
                    self.player.set_master_gain(gain);
                }
            });

            ui.add_space(4.0);
        });

        // Settings panel
        if self.show_settings {
            egui::SidePanel::right("settings_panel")
                .min_width(200.0)
                .show(ctx, |ui| {
                    ui.heading("Settings");
                    ui.separator();

                    ui.collapsing("Composition", |ui| {
                        ui.horizontal(|ui| {
                            ui.label("Gap (s):");
                            ui.add(egui::Slider::new(&mut self.settings.gap_seconds, 0.0..=3.0));
                        });
                        ui.small("Applies to the next clips you open");
                    });

                    ui.separator();

                    ui.collapsing("Display", |ui| {
                        ui.horizontal(|ui| {
                            ui.label("Columns:");
                            ui.add(egui::Slider::new(
                                &mut self.settings.waveform_columns,
                                100..=1200,
                            ));
                        });

                        ui.horizontal(|ui| {
                            ui.label("Tick (ms):");
                            ui.add(egui::Slider::new(
                                &mut self.settings.tick_interval_ms,
                                8..=250,
                            ));
                        });
                    });
                });
        }

        // Clip list and output info
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                for (i, name) in self.clip_names.iter().enumerate() {
                    ui.label(format!("{:>3}. {}", i + 1, name));
                }
            });

            ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                ui.horizontal(|ui| {
                    match self.player.sink().device() {
                        Some((name, rate)) => ui.small(format!("Output: {} @ {} Hz", name, rate)),
                        None => match self.player.sink().last_error() {
                            Some(e) => ui.small(format!("Output: {}", e)),
                            None => ui.small("Output: idle"),
                        },
                    };
                    ui.separator();
                    ui.small(format!(
                        "Background: {}",
                        self.background_name.as_deref().unwrap_or("none")
                    ));
                });
            });
        });
    }
}

impl Drop for NarrateApp {
    fn drop(&mut self) {
        AppSettings::from_app(self).save();
        self.player.stop();
        self.player.sink_mut().shutdown();
    }
}
