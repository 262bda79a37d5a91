// app.rs
pub mod converter;
pub mod file_dialogs;
pub mod gui;

use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use eframe::egui;
use eframe::App as EframeApp;
use parking_lot::Mutex;

use self::converter::ConversionSummary;

pub struct App {
    // Application state
    pub input_files: Vec<PathBuf>,
    pub output_directory: Option<PathBuf>,
    pub quality: u8,
    pub chroma_subsampling: bool,
    pub status: String,
    pub converting: bool,
    pub last_summary: Option<ConversionSummary>,
    pub conversion_progress: Arc<Mutex<ConversionProgress>>,
    pub log_messages: Arc<Mutex<Vec<String>>>,
    pub conversion_receiver: Option<Receiver<ConversionUpdate>>,
}

pub enum ConversionUpdate {
    Progress(usize, usize), // (completed, total)
    Finished(ConversionSummary),
    Failed(String), // pre-flight error, nothing was written
}

pub struct ConversionProgress {
    pub total: usize,
    pub completed: usize,
}

impl Default for App {
    fn default() -> Self {
        Self {
            input_files: Vec::new(),
            output_directory: None,
            quality: 90,
            chroma_subsampling: false,
            status: "Ready".to_string(),
            converting: false,
            last_summary: None,
            conversion_progress: Arc::new(Mutex::new(ConversionProgress {
                total: 0,
                completed: 0,
            })),
            log_messages: Arc::new(Mutex::new(Vec::new())),
            conversion_receiver: None,
        }
    }
}

impl EframeApp for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut finished = false;
        let mut needs_redraw = false;

        if let Some(receiver) = &self.conversion_receiver {
            while let Ok(update) = receiver.try_recv() {
                match update {
                    ConversionUpdate::Progress(completed, total) => {
                        let mut progress = self.conversion_progress.lock();
                        progress.completed = completed;
                        progress.total = total;
                        drop(progress); // Release the lock as soon as possible
                        self.status = format!("Converting image {} of {}", completed, total);
                        needs_redraw = true;
                    }
                    ConversionUpdate::Finished(summary) => {
                        self.status = summary.status_line();
                        self.last_summary = Some(summary);
                        finished = true;
                        needs_redraw = true;
                    }
                    ConversionUpdate::Failed(message) => {
                        self.status = message;
                        finished = true;
                        needs_redraw = true;
                    }
                }
            }
        }

        if finished {
            self.conversion_receiver = None;
            self.converting = false;
        }

        // Render the GUI
        gui::render(self, ctx);

        // Keep pumping the update channel while a conversion is in flight
        if needs_redraw || self.conversion_receiver.is_some() {
            ctx.request_repaint();
        }
    }
}
