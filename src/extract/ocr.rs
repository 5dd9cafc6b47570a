use std::{
    path::Path,
    process::{Command, Stdio},
};

use image::{GrayImage, Luma};
use log::{error, info};

use super::ExtractError;
use crate::util::command::command_from_override;

/// Tesseract invocation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrSettings {
    /// Overrides the `tesseract` executable, shell-split.
    pub command: Option<String>,
    pub language: String,
    pub engine_mode: u8,
    pub page_segmentation: u8,
    pub contrast: f32,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            command: None,
            language: "eng".to_string(),
            engine_mode: 1,
            page_segmentation: 3,
            contrast: 2.0,
        }
    }
}

pub fn extract_text_from_image(
    path: &Path,
    settings: &OcrSettings,
) -> Result<String, ExtractError> {
    info!("Running OCR on {}", path.display());
    let source = image::open(path).map_err(|err| ExtractError::Image(path.to_path_buf(), err))?;
    let gray = to_grayscale(&source);
    let enhanced = enhance_contrast(&gray, settings.contrast);

    let prepared = tempfile::Builder::new()
        .prefix("reader-ocr-")
        .suffix(".png")
        .tempfile()?;
    enhanced
        .save_with_format(prepared.path(), image::ImageFormat::Png)
        .map_err(|err| ExtractError::Image(prepared.path().to_path_buf(), err))?;

    let mut command = command_from_override(settings.command.as_deref(), &["tesseract"])?;
    append_arguments(&mut command, prepared.path(), settings);
    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    if !output.status.success() {
        let status = output.status.code().unwrap_or_default();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!("tesseract exited with status {status}: {stderr}");
        return Err(ExtractError::Tesseract { status, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn append_arguments(command: &mut Command, image: &Path, settings: &OcrSettings) {
    command.arg(image);
    command.arg("stdout");
    command.args(["--oem", &settings.engine_mode.to_string()]);
    command.args(["--psm", &settings.page_segmentation.to_string()]);
    command.args(["-l", &settings.language]);
}

/// ITU-R 601-2 luma with the same fixed-point rounding as common imaging
/// libraries, so OCR sees the grayscale values it was tuned on.
pub fn to_grayscale(source: &image::DynamicImage) -> GrayImage {
    let rgb = source.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma =
            (u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16;
        Luma([luma.min(255) as u8])
    })
}

/// Blends every pixel away from the rounded mean luminance by `factor`.
/// `1.0` leaves the image unchanged, `0.0` yields a flat gray image.
pub fn enhance_contrast(image: &GrayImage, factor: f32) -> GrayImage {
    let pixels = image.as_raw();
    let mean = if pixels.is_empty() {
        0.0
    } else {
        pixels.iter().map(|&p| u64::from(p)).sum::<u64>() as f64 / pixels.len() as f64
    };
    let degenerate = (mean + 0.5).floor() as f32;

    let mut enhanced = image.clone();
    for pixel in enhanced.pixels_mut() {
        let value = degenerate + factor * (f32::from(pixel.0[0]) - degenerate);
        pixel.0[0] = value.trunc().clamp(0.0, 255.0) as u8;
    }
    enhanced
}
