// src/main.rs
mod engine;
mod gui;
mod types;

use anyhow::{anyhow, bail, Context, Result};
use eframe::egui;
use leadscope::drivers::{pump, render_spans_png, Bounds, Channel, PlotView, SyntheticEcg};
use leadscope::PlotConfig;
use std::sync::Arc;

// 读取配置文件，没有给路径就用默认值
fn load_config(path: Option<&str>) -> Result<PlotConfig> {
    match path {
        Some(path) => {
            PlotConfig::load(path).with_context(|| format!("failed to load config {path}"))
        }
        None => Ok(PlotConfig::default()),
    }
}

// 无界面模式：跑几圈合成心电，然后把当前画面导出为 PNG
fn run_snapshot(config: &PlotConfig, out: &str) -> Result<()> {
    let lead = Arc::new(Channel::from_config("II", config));
    let bounds = Bounds::new(0, 0, gui::PLOT_WIDTH - 1, gui::PLOT_HEIGHT - 1);
    let mut plot = PlotView::new(bounds, Arc::clone(&lead), config);
    let mut ecg = SyntheticEcg::new(config.sample_rate_hz, config.samples_per_mv, 0x5EED)
        .with_noise(1)
        .with_chunk_len(config.capacity / 4 + 1);

    let mut scratch = Vec::new();
    let mut spans = Vec::new();
    // 让自动量程有机会稳定下来
    for _ in 0..16 {
        pump(&mut ecg, &lead, &mut scratch);
        plot.render(&mut spans);
    }
    plot.invalidate();
    let report = plot.render(&mut spans);

    let png = render_spans_png(
        &spans,
        gui::PLOT_WIDTH as u32,
        gui::PLOT_HEIGHT as u32,
        config.background_color(),
    )?;
    std::fs::write(out, png).with_context(|| format!("failed to write {out}"))?;
    log::info!(
        "snapshot written to {out} ({} spans, scale {})",
        spans.len(),
        report.scale
    );
    Ok(())
}

// 入口函数
fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let mut snapshot: Option<String> = None;
    let mut config_path: Option<String> = None;
    while let Some(arg) = args.next() {
        if arg == "--snapshot" {
            snapshot = Some(args.next().context("--snapshot needs an output path")?);
        } else if config_path.is_none() {
            config_path = Some(arg);
        } else {
            bail!("unexpected argument {arg}");
        }
    }

    let config = load_config(config_path.as_deref())?;
    if let Some(out) = snapshot {
        return run_snapshot(&config, &out);
    }

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1300.0, 620.0])
        .with_min_inner_size([1000.0, 480.0])
        .with_title("leadscope");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "leadscope",
        options,
        Box::new(move |_cc| Box::new(gui::LeadscopeApp::new(config))),
    )
    .map_err(|e| anyhow!("viewer exited with an error: {e}"))
}
