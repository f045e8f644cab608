mod app;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;

use anyhow::Context;
use app::DashboardApp;
use eframe::egui;
use env_logger::Env;

use crate::config::resolve_config;
use crate::state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = resolve_config().context("reading dashboard config")?;
    log::info!(
        "Index table: {}, industry table: {}",
        config.index_path.display(),
        config.industry_path.display()
    );

    let font = match &config.cjk_font {
        Some(path) => match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Could not read font {}: {e}", path.display());
                None
            }
        },
        None => None,
    };

    let mut state = AppState::new(config);
    state.reload(false);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Digital Transformation Index Dashboard",
        options,
        Box::new(move |cc| {
            if let Some(bytes) = font {
                app::install_cjk_font(&cc.egui_ctx, bytes);
            }
            Ok(Box::new(DashboardApp::new(state)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
