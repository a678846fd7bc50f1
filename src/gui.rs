// src/gui.rs
use eframe::egui;
use egui::{Color32, ColorImage, TextureHandle, TextureOptions, Vec2};
use egui_plot::{Line, Plot, PlotPoints};
use leadscope::drivers::{Bounds, Channel, Framebuffer, PlotView, RedrawMode, RenderReport};
use leadscope::{GridStyle, PlotConfig, Rgb565, Scale};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::engine;
use crate::types::*;

// 240x240 LCD 的两倍宽度
pub const PLOT_WIDTH: u16 = 480;
pub const PLOT_HEIGHT: u16 = 200;
const ZOOM: f32 = 2.0;

const TRACE_COLORS: [(&str, Rgb565); 4] = [
    ("green", Rgb565::GREEN),
    ("yellow", Rgb565::YELLOW),
    ("cyan", Rgb565::CYAN),
    ("white", Rgb565::WHITE),
];

pub struct LeadscopeApp {
    channel: Arc<Channel>,
    plot: PlotView,
    panel: Framebuffer,
    texture: Option<TextureHandle>,
    last_report: Option<RenderReport>,
    full_redraws: u64,

    // 采集参数
    amplitude_mv: f32,
    heart_rate: f32,
    noise: i16,
    is_frozen: bool,
    auto_scale: bool,
    show_raw: bool,
    show_grid: bool,
    grid: GridStyle,

    log_messages: Vec<String>,

    // 通讯管道
    rx: Receiver<EngineMessage>,
    tx_cmd: Sender<EngineCommand>,
    engine: Option<JoinHandle<()>>,
}

impl LeadscopeApp {
    pub fn new(config: PlotConfig) -> Self {
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();

        let lead = Arc::new(Channel::from_config("II", &config));
        let engine = engine::spawn_thread(Arc::clone(&lead), &config, tx, rx_cmd);

        let bounds = Bounds::new(0, 0, PLOT_WIDTH - 1, PLOT_HEIGHT - 1);
        let plot = PlotView::new(bounds, Arc::clone(&lead), &config);
        let panel = Framebuffer::new(
            PLOT_WIDTH as usize,
            PLOT_HEIGHT as usize,
            config.background_color(),
        );

        Self {
            channel: lead,
            plot,
            panel,
            texture: None,
            last_report: None,
            full_redraws: 0,
            amplitude_mv: 1.0,
            heart_rate: 72.0,
            noise: 1,
            is_frozen: false,
            auto_scale: config.auto_scale,
            show_raw: false,
            show_grid: config.show_grid,
            grid: GridStyle {
                lines: Rgb565(config.grid_color),
                marker: Rgb565(config.marker_color),
            },
            log_messages: vec!["leadscope ready.".to_owned()],
            rx,
            tx_cmd,
            engine: Some(engine),
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > 8 {
            self.log_messages.remove(0);
        }
    }

    fn send(&self, cmd: EngineCommand) {
        if self.tx_cmd.send(cmd).is_err() {
            log::warn!("acquisition thread is gone");
        }
    }

    fn drain_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                EngineMessage::Log(s) => self.log(&s),
                EngineMessage::Frozen(b) => self.is_frozen = b,
                EngineMessage::SessionReset => self.plot.reset(true),
            }
        }
    }

    // 每帧一次：只把新列画进面板，再整体上传纹理
    fn refresh_panel(&mut self, ctx: &egui::Context) {
        let report = self.plot.draw(&mut self.panel);
        if report.mode == RedrawMode::Full {
            self.full_redraws += 1;
        }
        if report.scale != self.last_report.map(|r| r.scale).unwrap_or(report.scale) {
            self.log(&format!("scale {}", report.scale));
        }
        self.last_report = Some(report);

        let image = ColorImage::from_rgb(
            [self.panel.width(), self.panel.height()],
            &self.panel.to_rgb888(),
        );
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::NEAREST),
            None => self.texture = Some(ctx.load_texture("plot", image, TextureOptions::NEAREST)),
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.add_space(10.0);
        ui.heading("leadscope");
        ui.label(format!("Lead {}", self.channel.name()));
        ui.separator();

        ui.label("SCALE (mV / div)");
        ui.horizontal(|ui| {
            for scale in Scale::ALL {
                let selected = self.plot.scale() == scale;
                if ui.selectable_label(selected, scale.to_string()).clicked() {
                    self.plot.set_scale(scale);
                }
            }
        });
        if ui.checkbox(&mut self.auto_scale, "auto scale").changed() {
            self.plot.set_auto_scale(self.auto_scale);
        }

        ui.add_space(10.0);
        ui.label("SIGNAL");
        if ui
            .add(egui::Slider::new(&mut self.amplitude_mv, 0.2..=12.0).text("R wave mV"))
            .changed()
        {
            self.send(EngineCommand::SetAmplitude(self.amplitude_mv));
        }
        if ui
            .add(egui::Slider::new(&mut self.heart_rate, 30.0..=200.0).text("bpm"))
            .changed()
        {
            self.send(EngineCommand::SetHeartRate(self.heart_rate));
        }
        if ui
            .add(egui::Slider::new(&mut self.noise, 0..=20).text("noise"))
            .changed()
        {
            self.send(EngineCommand::SetNoise(self.noise));
        }

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            let freeze_txt = if self.is_frozen { "RESUME" } else { "FREEZE" };
            if ui.button(freeze_txt).clicked() {
                self.send(EngineCommand::Freeze(!self.is_frozen));
            }
            if ui.button("NEW SESSION").clicked() {
                self.send(EngineCommand::ResetSession);
            }
        });

        ui.add_space(10.0);
        ui.label("TRACE COLOR");
        ui.horizontal(|ui| {
            for (name, color) in TRACE_COLORS {
                if ui.selectable_label(self.plot.color() == color, name).clicked() {
                    self.plot.set_color(color, true);
                }
            }
        });
        if ui.checkbox(&mut self.show_grid, "grid").changed() {
            self.plot.set_grid(self.show_grid.then_some(self.grid));
        }
        ui.checkbox(&mut self.show_raw, "raw window");

        ui.add_space(10.0);
        ui.separator();
        if let Some(report) = self.last_report {
            ui.monospace(format!("mode    {:?}", report.mode));
            ui.monospace(format!("columns {}", report.columns));
            ui.monospace(format!("cursor  {}", report.cursor_column));
        }
        ui.monospace(format!("full    {}", self.full_redraws));
        ui.monospace(format!("base    {}", self.channel.baseline()));

        ui.add_space(10.0);
        egui::ScrollArea::vertical().max_height(120.0).show(ui, |ui| {
            for m in &self.log_messages {
                ui.monospace(m);
            }
        });
    }
}

impl eframe::App for LeadscopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_messages();
        self.refresh_panel(ctx);

        let mut visuals = egui::Visuals::dark();
        visuals.widgets.noninteractive.bg_fill = Color32::from_rgb(10, 10, 15);
        ctx.set_visuals(visuals);

        egui::SidePanel::left("L").min_width(300.0).show(ctx, |ui| {
            self.controls(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(texture) = &self.texture {
                let size = Vec2::new(PLOT_WIDTH as f32, PLOT_HEIGHT as f32) * ZOOM;
                ui.add(egui::Image::from_texture(egui::load::SizedTexture::new(
                    texture.id(),
                    size,
                )));
            }
            if self.show_raw {
                let window = self.channel.window(self.channel.capacity());
                let points: PlotPoints = window
                    .samples()
                    .iter()
                    .enumerate()
                    .map(|(i, &s)| [i as f64, s as f64])
                    .collect();
                Plot::new("raw_window")
                    .height(160.0)
                    .allow_drag(false)
                    .allow_zoom(false)
                    .allow_scroll(false)
                    .show(ui, |plot_ui| {
                        plot_ui.line(Line::new(points).color(Color32::from_rgb(0, 255, 255)));
                    });
            }
        });

        ctx.request_repaint();
    }
}

impl Drop for LeadscopeApp {
    fn drop(&mut self) {
        self.tx_cmd.send(EngineCommand::Shutdown).ok();
        if let Some(handle) = self.engine.take() {
            handle.join().ok();
        }
    }
}
