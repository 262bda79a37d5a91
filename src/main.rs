// main.rs
mod app;
mod utils;

use app::App;
use eframe::NativeOptions;

fn main() {
    let native_options = NativeOptions {
        initial_window_size: Some(egui::Vec2::new(800.0, 500.0)),
        resizable: true,
        drag_and_drop_support: true,
        ..Default::default()
    };
    eframe::run_native(
        "Image to JPEG Converter",
        native_options,
        Box::new(|_cc| Box::new(App::default())),
    );
}
