use std::path::PathBuf;
use std::sync::mpsc::channel;

use egui::{Color32, Frame, ProgressBar, RichText, Rounding, Slider, Stroke};

use crate::app::converter::{self, EncodeSettings};
use crate::app::file_dialogs;
use crate::app::{App, ConversionUpdate};
use crate::utils::{measure_time, Logger};

pub fn render(app: &mut App, ctx: &egui::Context) {
    handle_dropped_files(app, ctx);

    let frame = Frame {
        fill: Color32::from_rgb(26, 26, 46),
        rounding: Rounding::same(10.0),
        stroke: Stroke::new(1.0, Color32::from_rgb(233, 69, 96)),
        inner_margin: egui::style::Margin::same(20.0),
        ..Default::default()
    };

    egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
        ui.heading(
            RichText::new("Image to JPEG Converter")
                .size(28.0)
                .color(Color32::from_rgb(233, 69, 96)),
        );
        ui.label("Drag and drop images here, or pick them to convert to JPG");
        ui.add_space(20.0);

        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                let button_width = 200.0;
                if ui
                    .add_sized([button_width, 30.0], egui::Button::new("Select Images"))
                    .clicked()
                {
                    if let Some(files) = file_dialogs::select_images() {
                        set_worklist(app, files);
                    }
                }
                ui.add_space(5.0);
                if ui
                    .add_sized(
                        [button_width, 30.0],
                        egui::Button::new("Select Output Directory"),
                    )
                    .clicked()
                {
                    if let Some(dir) = file_dialogs::select_output_directory() {
                        app.output_directory = Some(dir);
                        log(app, "Output directory selected.".to_string());
                    }
                }
                ui.add_space(5.0);
                if ui
                    .add_sized([button_width, 30.0], egui::Button::new("Clear List"))
                    .clicked()
                {
                    app.input_files.clear();
                    app.last_summary = None;
                    app.status = "Worklist cleared".to_string();
                    log(app, "Worklist cleared.".to_string());
                }

                ui.add_space(10.0);

                // Display output directory
                ui.group(|ui| {
                    ui.set_width(button_width);
                    ui.label(
                        RichText::new("Output Directory:")
                            .size(16.0)
                            .color(Color32::from_rgb(233, 69, 96)),
                    );
                    if let Some(dir) = &app.output_directory {
                        ui.label(dir.to_string_lossy());
                    } else {
                        ui.label("Not selected (asked when converting)");
                    }
                });

                ui.add_space(10.0);

                // Encoder Settings
                ui.group(|ui| {
                    ui.set_width(button_width);
                    ui.label(
                        RichText::new("Encoder Settings")
                            .size(16.0)
                            .color(Color32::from_rgb(233, 69, 96)),
                    );
                    ui.add(Slider::new(&mut app.quality, 1..=100).text("Quality"));
                    ui.checkbox(&mut app.chroma_subsampling, "Chroma subsampling");
                });

                ui.add_space(10.0);

                // Results
                ui.group(|ui| {
                    ui.set_width(button_width);
                    ui.label(
                        RichText::new("Results")
                            .size(16.0)
                            .color(Color32::from_rgb(233, 69, 96)),
                    );
                    if let Some(summary) = &app.last_summary {
                        let color = if summary.failed == 0 {
                            Color32::GREEN
                        } else {
                            Color32::RED
                        };
                        ui.label(
                            RichText::new(format!(
                                "{} succeeded / {} failed",
                                summary.succeeded, summary.failed
                            ))
                            .color(color),
                        );
                        if let Some(failure) = summary.first_failure() {
                            if let Err(error) = &failure.result {
                                ui.label(
                                    RichText::new(format!(
                                        "{}: {}",
                                        failure.input.display(),
                                        error
                                    ))
                                    .color(Color32::RED),
                                );
                            }
                        }
                    } else {
                        ui.label(RichText::new("No conversion yet").color(Color32::GRAY));
                    }
                });

                ui.add_space(10.0);

                let convert_button =
                    ui.add_enabled(!app.converting, egui::Button::new("Convert to JPG"));
                if convert_button.clicked() {
                    request_conversion(app);
                }
            });

            ui.add_space(10.0);

            // Worklist (scrollable)
            ui.vertical(|ui| {
                ui.group(|ui| {
                    ui.set_min_width(ui.available_width());
                    ui.set_min_height(ui.available_height() - 200.0);
                    ui.label(
                        RichText::new(format!("Worklist ({} files):", app.input_files.len()))
                            .size(16.0)
                            .color(Color32::from_rgb(233, 69, 96)),
                    );

                    egui::ScrollArea::vertical()
                        .auto_shrink([false; 2])
                        .show(ui, |ui| {
                            for (index, path) in app.input_files.iter().enumerate() {
                                let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                                ui.label(format!(
                                    "{}. {} ({:.2} MB)",
                                    index + 1,
                                    path.display(),
                                    size as f64 / (1024.0 * 1024.0)
                                ));
                            }
                        });
                });
            });
        });

        ui.add_space(20.0);

        // Conversion Log with Progress Bar
        ui.group(|ui| {
            ui.set_min_width(ui.available_width());
            ui.label(
                RichText::new("Conversion Log")
                    .size(16.0)
                    .color(Color32::from_rgb(233, 69, 96)),
            );

            let progress = app.conversion_progress.lock();
            if progress.total > 0 {
                let progress_ratio = progress.completed as f32 / progress.total as f32;
                ui.add(ProgressBar::new(progress_ratio)
                    .text(format!("{:.0}%", progress_ratio * 100.0)));
            }
            drop(progress);

            egui::ScrollArea::vertical()
                .max_height(150.0)
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    let logs = app.log_messages.lock();
                    for log in logs.iter() {
                        if log.contains("error") || log.contains("failed") {
                            ui.label(RichText::new(log).color(Color32::RED));
                        } else {
                            ui.label(log);
                        }
                    }
                });
        });

        ui.add_space(10.0);
        ui.label(&app.status);
    });
}

fn handle_dropped_files(app: &mut App, ctx: &egui::Context) {
    if !ctx.input().raw.hovered_files.is_empty() {
        app.status = "Drop to queue images".to_string();
    }

    let dropped = ctx.input().raw.dropped_files.clone();
    if dropped.is_empty() {
        return;
    }

    let files: Vec<PathBuf> = dropped
        .into_iter()
        .filter_map(|file| file.path)
        .filter(|path| converter::has_supported_extension(path))
        .collect();
    if files.is_empty() {
        app.status = "No supported images in the dropped files".to_string();
        return;
    }
    set_worklist(app, files);
}

// A new selection replaces the worklist, it does not append.
fn set_worklist(app: &mut App, files: Vec<PathBuf>) {
    app.last_summary = None;
    app.status = format!("Queued {} files", files.len());
    log(app, format!("Queued {} files.", files.len()));
    app.input_files = files;
}

fn log(app: &App, message: String) {
    let timestamp = chrono::Local::now().format("%H:%M:%S");
    app.log_messages.lock().push(format!("[{}] {}", timestamp, message));
}

fn request_conversion(app: &mut App) {
    if app.input_files.is_empty() {
        app.status = "Select at least one image first".to_string();
        log(app, "No images queued for conversion.".to_string());
        return;
    }

    let output_directory = match app
        .output_directory
        .clone()
        .or_else(file_dialogs::select_output_directory)
    {
        Some(dir) => dir,
        None => {
            app.status = "No output directory selected".to_string();
            log(app, "Conversion cancelled, no output directory.".to_string());
            return;
        }
    };
    app.output_directory = Some(output_directory.clone());

    log(app, "Starting conversion...".to_string());
    app.status = "Starting conversion...".to_string();
    start_conversion(app, output_directory);
}

fn start_conversion(app: &mut App, output_directory: PathBuf) {
    let input_files = app.input_files.clone();
    let settings = EncodeSettings {
        quality: app.quality,
        chroma_subsampling: app.chroma_subsampling,
    };
    let log_messages = app.log_messages.clone();

    {
        let mut progress = app.conversion_progress.lock();
        progress.total = input_files.len();
        progress.completed = 0;
    }

    let (sender, receiver) = channel();
    app.conversion_receiver = Some(receiver);
    app.converting = true;

    std::thread::spawn(move || {
        let logger = Logger::new(log_messages);
        logger.log(format!("Total files to process: {}", input_files.len()));

        let progress_sender = sender.clone();
        let (result, duration) = measure_time(|| {
            converter::convert(&input_files, &output_directory, &settings, |completed, total| {
                let _ = progress_sender.send(ConversionUpdate::Progress(completed, total));
            })
        });

        match result {
            Ok(summary) => {
                for outcome in &summary.outcomes {
                    match &outcome.result {
                        Ok(output_path) => {
                            logger.log(format!("Saved {}", output_path.display()));
                        }
                        Err(error) => {
                            logger.log(format!("{} failed: {}", outcome.input.display(), error));
                        }
                    }
                }
                logger.log(format!(
                    "Conversion finished in {:?}: {}",
                    duration,
                    summary.status_line()
                ));
                let _ = sender.send(ConversionUpdate::Finished(summary));
            }
            Err(error) => {
                logger.log(format!("Conversion failed: {}", error));
                let _ = sender.send(ConversionUpdate::Failed(error.to_string()));
            }
        }
    });
}
