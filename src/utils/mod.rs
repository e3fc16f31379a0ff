// texbatch/src/utils/mod.rs
use std::path::{Path, PathBuf};

/// Height that keeps the aspect ratio when scaling `orig_width` to `new_width`.
pub fn resize_height(orig_width: u32, orig_height: u32, new_width: u32) -> u32 {
    if orig_width == 0 {
        return 0;
    }

    let height = (orig_height as f64 / orig_width as f64 * new_width as f64).round() as u32;
    height.max(1)
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = ((bytes_f64.log10() / base.log10()).floor() as usize).min(UNITS.len() - 1);
    let size = bytes_f64 / base.powi(exponent as i32);

    format!("{:.2} {}", size, UNITS[exponent])
}

/// Case-insensitive extension check against a list given without dots.
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

pub fn has_marker(stem: &str, marker: &str) -> bool {
    !marker.is_empty() && stem.contains(marker)
}

/// `<dir>/<stem><marker>.<ext>`
pub fn derived_path(dir: &Path, stem: &str, marker: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}{}.{}", stem, marker, extension))
}

pub fn image_format_to_string(format: image::ImageFormat) -> String {
    match format {
        image::ImageFormat::Jpeg => "JPEG",
        image::ImageFormat::Png => "PNG",
        image::ImageFormat::Gif => "GIF",
        image::ImageFormat::WebP => "WebP",
        image::ImageFormat::Tiff => "TIFF",
        image::ImageFormat::Bmp => "BMP",
        image::ImageFormat::Hdr => "HDR",
        image::ImageFormat::OpenExr => "OpenEXR",
        _ => "Unknown",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_height_keeps_aspect() {
        assert_eq!(resize_height(4000, 2000, 1000), 500);
        assert_eq!(resize_height(10_000, 5000, 8192), 4096);
        assert_eq!(resize_height(10_000, 5000, 4096), 2048);
        assert_eq!(resize_height(10_000, 5000, 270), 135);
        assert_eq!(resize_height(1920, 1080, 270), 152);
        assert_eq!(resize_height(3, 1, 2), 1);
        assert_eq!(resize_height(1000, 3, 10), 1);
    }

    #[test]
    fn resize_height_rounds_half_away_from_zero() {
        // 3 / 2 * 5 = 7.5
        assert_eq!(resize_height(2, 3, 5), 8);
    }

    #[test]
    fn extension_matching_ignores_case() {
        let exts = vec!["exr".to_string(), "hdr".to_string()];
        assert!(has_extension(Path::new("a/sky.EXR"), &exts));
        assert!(has_extension(Path::new("sky.hdr"), &exts));
        assert!(!has_extension(Path::new("sky.jpg"), &exts));
        assert!(!has_extension(Path::new("exr"), &exts));
    }

    #[test]
    fn derived_names() {
        assert_eq!(
            derived_path(Path::new("hdr/blurred"), "sky", "-blurred", "exr"),
            PathBuf::from("hdr/blurred/sky-blurred.exr")
        );
        assert_eq!(
            derived_path(Path::new("hdr/previews"), "sky", "", "jpg"),
            PathBuf::from("hdr/previews/sky.jpg")
        );
        assert!(has_marker("sky-blurred", "-blurred"));
        assert!(!has_marker("sky", "-blurred"));
        assert!(!has_marker("sky", ""));
    }

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(2048), "2.00 KB");
    }
}
