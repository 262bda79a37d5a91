// file_dialogs.rs
use rfd::FileDialog;
use std::path::PathBuf;

use crate::app::converter::SUPPORTED_EXTENSIONS;

pub fn select_images() -> Option<Vec<PathBuf>> {
    FileDialog::new()
        .add_filter("Images", &SUPPORTED_EXTENSIONS)
        .pick_files()
}

pub fn select_output_directory() -> Option<PathBuf> {
    FileDialog::new().pick_folder()
}
