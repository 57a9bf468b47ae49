use eframe::{egui, NativeOptions};
use latentscope::{about, app};
use std::env;

fn main() -> eframe::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "LatentScope",
        options,
        Box::new(|_cc| Ok(Box::new(app::LatentScopeApp::new()))),
    )
}
