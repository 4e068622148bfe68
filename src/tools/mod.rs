//! Helpers shared by the command-line tools

use crate::error::Result;
use crate::models::IrisRecord;
use image::GrayImage;
use std::env;
use std::fs;
use std::path::Path;

fn max_dim_from_env() -> Option<u32> {
    match env::var("IRIS_MAX_DIM") {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(0) => None,
            Ok(v) => Some(v),
            Err(_) => None,
        },
        Err(_) => None,
    }
}

/// Load an image as 8-bit grayscale.
///
/// When `IRIS_MAX_DIM` is set, images whose longer side exceeds it are
/// downscaled first.
pub fn load_gray<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
    let img = image::open(path)?;
    let gray = match max_dim_from_env() {
        Some(max_dim) if img.width().max(img.height()) > max_dim => img
            .resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
            .to_luma8(),
        _ => img.to_luma8(),
    };
    Ok(gray)
}

/// Summary intensity stats for a grayscale image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrayStats {
    /// Minimum intensity.
    pub min: u8,
    /// Maximum intensity.
    pub max: u8,
    /// Average intensity (integer).
    pub avg: u8,
}

/// Compute min/max/avg for grayscale values.
pub fn gray_stats(gray: &GrayImage) -> GrayStats {
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    let mut sum: u64 = 0;
    for &v in gray.as_raw() {
        min = min.min(v);
        max = max.max(v);
        sum += v as u64;
    }
    let n = gray.as_raw().len() as u64;
    let avg = if n == 0 { 0 } else { (sum / n) as u8 };
    GrayStats { min, max, avg }
}

/// Write a record as JSON.
pub fn write_record<P: AsRef<Path>>(path: P, record: &IrisRecord) -> Result<()> {
    fs::write(path, serde_json::to_vec(record)?)?;
    Ok(())
}

/// Read and validate a JSON record.
pub fn read_record<P: AsRef<Path>>(path: P) -> Result<IrisRecord> {
    let text = fs::read_to_string(path)?;
    let record: IrisRecord = serde_json::from_str(&text)?;
    record.validate()?;
    Ok(record)
}
