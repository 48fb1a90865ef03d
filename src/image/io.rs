//! I/O helpers for depth maps and JSON.
//!
//! - `load_depth_image`: read an 8- or 16-bit grayscale image into a `DepthMap`.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::DepthMap;
use image::DynamicImage;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load a grayscale depth image from disk, multiplying raw values by `scale`.
///
/// 16-bit images keep their full range; anything else is converted to 8-bit
/// luma first.
pub fn load_depth_image(path: &Path, scale: f32) -> Result<DepthMap, String> {
    let img = image::open(path).map_err(|e| format!("Failed to open {}: {e}", path.display()))?;
    let (w, h) = (img.width() as usize, img.height() as usize);
    let data: Vec<f32> = match img {
        DynamicImage::ImageLuma16(buf) => buf
            .into_raw()
            .into_iter()
            .map(|v| v as f32 * scale)
            .collect(),
        other => other
            .into_luma8()
            .into_raw()
            .into_iter()
            .map(|v| v as f32 * scale)
            .collect(),
    };
    DepthMap::from_vec(w, h, data)
        .ok_or_else(|| format!("Depth image {} has an unexpected buffer size", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
