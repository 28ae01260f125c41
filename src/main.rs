mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::ScoutboardApp;
use data::remote::S3Store;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match config::Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(2);
        }
    };
    let store = match S3Store::new(config.s3_settings()) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("cannot initialize the storage client: {err}");
            std::process::exit(2);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Scoutboard – Startup Hiring Rankings",
        options,
        Box::new(|_cc| Ok(Box::new(ScoutboardApp::new(AppState::new(Box::new(store)))))),
    )
}
