// converter.rs
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use image::io::Reader as ImageReader;
use jpeg_encoder::{ColorType, Encoder, SamplingFactor};

/// Extensions the file-gathering UI accepts. The converter itself does not
/// re-check them; it attempts to decode whatever path it is handed.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "gif", "tiff"];

pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Encoder parameters. The defaults reproduce the original tool's fixed
/// constants: quality 90, chroma subsampling off (4:4:4).
#[derive(Clone, Copy, Debug)]
pub struct EncodeSettings {
    pub quality: u8,
    pub chroma_subsampling: bool,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            quality: 90,
            chroma_subsampling: false,
        }
    }
}

/// Pre-flight failure: the whole invocation aborts, no file is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    EmptyInput,
    InvalidOutputDirectory(PathBuf),
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "no input files queued"),
            Self::InvalidOutputDirectory(dir) => {
                write!(f, "output directory is not writable: {}", dir.display())
            }
        }
    }
}

impl std::error::Error for ConversionError {}

/// Per-file failure: recorded in the summary, the batch continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileError {
    Decode(String),
    Encode(String),
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(detail) => write!(f, "decode failed: {detail}"),
            Self::Encode(detail) => write!(f, "encode failed: {detail}"),
        }
    }
}

impl std::error::Error for FileError {}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub result: Result<PathBuf, FileError>,
}

#[derive(Debug, Clone)]
pub struct ConversionSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<FileOutcome>,
}

impl ConversionSummary {
    pub fn first_failure(&self) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|o| o.result.is_err())
    }

    pub fn status_line(&self) -> String {
        if self.failed == 0 {
            format!("Converted {} images to JPG", self.succeeded)
        } else {
            format!("{} succeeded / {} failed", self.succeeded, self.failed)
        }
    }
}

/// Converts `files` to JPEG files in `output_dir`, in list order, one at a
/// time. Per-file failures do not abort the batch. `on_progress` is called
/// once after every file with (completed, total).
pub fn convert<F>(
    files: &[PathBuf],
    output_dir: &Path,
    settings: &EncodeSettings,
    mut on_progress: F,
) -> Result<ConversionSummary, ConversionError>
where
    F: FnMut(usize, usize),
{
    if files.is_empty() {
        return Err(ConversionError::EmptyInput);
    }
    check_output_directory(output_dir)?;

    let total = files.len();
    let mut outcomes = Vec::with_capacity(total);
    let mut succeeded = 0;
    let mut failed = 0;

    for (index, input_path) in files.iter().enumerate() {
        let result = convert_one(input_path, output_dir, settings);
        match &result {
            Ok(_) => succeeded += 1,
            Err(_) => failed += 1,
        }
        outcomes.push(FileOutcome {
            input: input_path.clone(),
            result,
        });
        on_progress(index + 1, total);
    }

    Ok(ConversionSummary {
        total,
        succeeded,
        failed,
        outcomes,
    })
}

fn check_output_directory(output_dir: &Path) -> Result<(), ConversionError> {
    let invalid = || ConversionError::InvalidOutputDirectory(output_dir.to_path_buf());
    let metadata = fs::metadata(output_dir).map_err(|_| invalid())?;
    if !metadata.is_dir() || metadata.permissions().readonly() {
        return Err(invalid());
    }
    Ok(())
}

fn convert_one(
    input_path: &Path,
    output_dir: &Path,
    settings: &EncodeSettings,
) -> Result<PathBuf, FileError> {
    let img = load_image(input_path)?;
    // JPEG has no alpha channel. Flatten by direct RGB conversion: the alpha
    // channel is dropped, RGB values kept as-is, no blend onto a background.
    let rgb = img.into_rgb8();
    let jpeg_data = encode_jpeg(&rgb, settings)?;

    let output_path = output_path_for(input_path, output_dir);
    save_jpeg(&jpeg_data, &output_path)
        .map_err(|e| FileError::Encode(format!("{}: {e}", output_path.display())))?;
    Ok(output_path)
}

/// `<input-basename>.jpg` directly in `output_dir`. A same-named existing
/// output is overwritten.
fn output_path_for(input_path: &Path, output_dir: &Path) -> PathBuf {
    let file_name =
        input_path.file_stem().unwrap_or_default().to_string_lossy().to_string() + ".jpg";
    output_dir.join(file_name)
}

fn load_image(path: &Path) -> Result<image::DynamicImage, FileError> {
    ImageReader::open(path)
        .map_err(|e| FileError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| FileError::Decode(e.to_string()))
}

fn encode_jpeg(img: &image::RgbImage, settings: &EncodeSettings) -> Result<Vec<u8>, FileError> {
    let (width, height) = img.dimensions();
    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(FileError::Encode(format!(
            "image dimensions {width}x{height} exceed the baseline JPEG limit"
        )));
    }

    let mut buf = Vec::new();
    let mut encoder = Encoder::new(&mut buf, settings.quality.clamp(1, 100));
    encoder.set_optimized_huffman_tables(true);
    encoder.set_sampling_factor(if settings.chroma_subsampling {
        SamplingFactor::F_2_2 // 4:2:0
    } else {
        SamplingFactor::F_1_1 // 4:4:4
    });
    encoder
        .encode(img.as_raw(), width as u16, height as u16, ColorType::Rgb)
        .map_err(|e| FileError::Encode(e.to_string()))?;
    Ok(buf)
}

fn save_jpeg(jpeg_data: &[u8], output_path: &Path) -> std::io::Result<()> {
    let mut file = File::create(output_path)?;
    file.write_all(jpeg_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_rgb_png(dir: &Path, name: &str, color: Rgb<u8>) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(16, 12, color).save(&path).unwrap();
        path
    }

    fn write_rgba_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(16, 12, Rgba([10, 200, 30, 128]))
            .save(&path)
            .unwrap();
        path
    }

    fn jpg_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn converts_every_file_in_order() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let files = vec![
            write_rgb_png(input.path(), "first.png", Rgb([255, 0, 0])),
            write_rgb_png(input.path(), "second.png", Rgb([0, 255, 0])),
            write_rgb_png(input.path(), "third.png", Rgb([0, 0, 255])),
        ];

        let summary =
            convert(&files, output.path(), &EncodeSettings::default(), |_, _| {}).unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(
            jpg_names(output.path()),
            vec!["first.jpg", "second.jpg", "third.jpg"]
        );
        let inputs: Vec<&PathBuf> = summary.outcomes.iter().map(|o| &o.input).collect();
        assert_eq!(inputs, files.iter().collect::<Vec<_>>());
    }

    #[test]
    fn empty_worklist_fails_fast() {
        let output = TempDir::new().unwrap();
        let err = convert(&[], output.path(), &EncodeSettings::default(), |_, _| {}).unwrap_err();
        assert_eq!(err, ConversionError::EmptyInput);
        assert!(jpg_names(output.path()).is_empty());
    }

    #[test]
    fn missing_output_directory_fails_fast() {
        let input = TempDir::new().unwrap();
        let files = vec![write_rgb_png(input.path(), "a.png", Rgb([1, 2, 3]))];
        let bogus = input.path().join("does-not-exist");

        let err = convert(&files, &bogus, &EncodeSettings::default(), |_, _| {}).unwrap_err();
        assert_eq!(err, ConversionError::InvalidOutputDirectory(bogus));
    }

    #[test]
    fn file_as_output_directory_fails_fast() {
        let input = TempDir::new().unwrap();
        let files = vec![write_rgb_png(input.path(), "a.png", Rgb([1, 2, 3]))];
        let not_a_dir = write_rgb_png(input.path(), "plain.png", Rgb([9, 9, 9]));

        let err = convert(&files, &not_a_dir, &EncodeSettings::default(), |_, _| {}).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidOutputDirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn readonly_output_directory_fails_fast() {
        use std::os::unix::fs::PermissionsExt;

        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let files = vec![write_rgb_png(input.path(), "a.png", Rgb([1, 2, 3]))];
        fs::set_permissions(output.path(), fs::Permissions::from_mode(0o555)).unwrap();

        let err =
            convert(&files, output.path(), &EncodeSettings::default(), |_, _| {}).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidOutputDirectory(_)));

        fs::set_permissions(output.path(), fs::Permissions::from_mode(0o755)).unwrap();
        assert!(jpg_names(output.path()).is_empty());
    }

    #[test]
    fn corrupt_file_does_not_abort_the_batch() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let corrupt = input.path().join("broken.png");
        fs::write(&corrupt, b"this is not a png").unwrap();
        let files = vec![
            write_rgb_png(input.path(), "a.png", Rgb([255, 0, 0])),
            corrupt.clone(),
            write_rgb_png(input.path(), "b.png", Rgb([0, 255, 0])),
        ];

        let summary =
            convert(&files, output.path(), &EncodeSettings::default(), |_, _| {}).unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(jpg_names(output.path()), vec!["a.jpg", "b.jpg"]);
        let failure = summary.first_failure().unwrap();
        assert_eq!(failure.input, corrupt);
        assert!(matches!(failure.result, Err(FileError::Decode(_))));
    }

    #[test]
    fn oversized_image_records_encode_failure() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        // One pixel over the baseline JPEG dimension limit.
        let wide = input.path().join("wide.png");
        RgbImage::from_pixel(65_536, 1, Rgb([5, 5, 5])).save(&wide).unwrap();
        let files = vec![
            wide.clone(),
            write_rgb_png(input.path(), "ok.png", Rgb([20, 20, 20])),
        ];

        let summary =
            convert(&files, output.path(), &EncodeSettings::default(), |_, _| {}).unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(jpg_names(output.path()), vec!["ok.jpg"]);
        let failure = summary.first_failure().unwrap();
        assert_eq!(failure.input, wide);
        assert!(matches!(failure.result, Err(FileError::Encode(_))));
    }

    #[test]
    fn same_basename_overwrites_earlier_output() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let first = write_rgb_png(dir_a.path(), "a.png", Rgb([255, 0, 0]));
        let second_path = dir_b.path().join("a.jpg");
        RgbImage::from_pixel(16, 12, Rgb([0, 0, 255]))
            .save(&second_path)
            .unwrap();
        let files = vec![first, second_path];

        let summary =
            convert(&files, output.path(), &EncodeSettings::default(), |_, _| {}).unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(jpg_names(output.path()), vec!["a.jpg"]);
        // The surviving output comes from the second (blue) input.
        let decoded = image::open(output.path().join("a.jpg")).unwrap().into_rgb8();
        let pixel = decoded.get_pixel(8, 6);
        assert!(pixel[2] > pixel[0]);
    }

    #[test]
    fn opaque_rgb_round_trips_without_alpha() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let files = vec![write_rgb_png(input.path(), "photo.png", Rgb([120, 80, 40]))];

        convert(&files, output.path(), &EncodeSettings::default(), |_, _| {}).unwrap();

        let decoded = image::open(output.path().join("photo.jpg")).unwrap();
        assert_eq!(decoded.width(), 16);
        assert_eq!(decoded.height(), 12);
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn rgba_input_is_flattened_to_rgb() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let files = vec![write_rgba_png(input.path(), "translucent.png")];

        let summary =
            convert(&files, output.path(), &EncodeSettings::default(), |_, _| {}).unwrap();

        assert_eq!(summary.succeeded, 1);
        let decoded = image::open(output.path().join("translucent.jpg")).unwrap();
        assert!(!decoded.color().has_alpha());
        // Alpha is dropped, not blended: RGB values survive near-unchanged.
        let pixel = decoded.into_rgb8().get_pixel(8, 6).0;
        assert!(pixel[1] > 150);
    }

    #[test]
    fn progress_fires_once_per_file_in_order() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let corrupt = input.path().join("bad.gif");
        fs::write(&corrupt, b"GIF89a nope").unwrap();
        let files = vec![
            write_rgb_png(input.path(), "a.png", Rgb([1, 1, 1])),
            corrupt,
            write_rgb_png(input.path(), "c.png", Rgb([2, 2, 2])),
        ];

        let mut calls = Vec::new();
        convert(&files, output.path(), &EncodeSettings::default(), |done, total| {
            calls.push((done, total));
        })
        .unwrap();

        assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn extension_filter_is_case_insensitive() {
        for name in ["a.png", "b.JPG", "c.JpEg", "d.bmp", "e.GIF", "f.tiff"] {
            assert!(has_supported_extension(Path::new(name)), "{name}");
        }
        for name in ["a.webp", "b.txt", "noext", "c.tif"] {
            assert!(!has_supported_extension(Path::new(name)), "{name}");
        }
    }

    #[test]
    fn quality_out_of_range_is_clamped() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let files = vec![write_rgb_png(input.path(), "a.png", Rgb([50, 50, 50]))];
        let settings = EncodeSettings {
            quality: 0,
            chroma_subsampling: true,
        };

        let summary = convert(&files, output.path(), &settings, |_, _| {}).unwrap();
        assert_eq!(summary.succeeded, 1);
    }
}
