//! Main application entry point.

use clap::Parser;
use cocreate_app::{CoCreateApp, cli::Args};

fn main() -> eframe::Result<()> {
    env_logger::init();
    let args = Args::parse();
    log::info!("Starting CoCreate");

    let launch = args.into_launch();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 760.0])
            .with_min_inner_size([960.0, 720.0])
            .with_title("CoCreate"),
        ..Default::default()
    };

    eframe::run_native(
        "CoCreate",
        options,
        Box::new(|cc| Ok(Box::new(CoCreateApp::new(cc, launch)))),
    )
}
