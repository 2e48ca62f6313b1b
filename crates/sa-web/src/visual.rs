//! Persisting the latest chart as a JPEG under the static directory.
//!
//! There is a single file shared by every client; the newest chart
//! overwrites it.

use std::path::Path;

use base64::Engine as _;
use image::ImageFormat;
use tracing::debug;

use crate::error::{Result, WebError};

/// Decode a base64 image and write it to `dest` as an RGB JPEG, creating
/// parent directories as needed.
pub fn save_visualization(image_b64: &str, dest: &Path) -> Result<()> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(image_b64.trim())?;
    let rgb = image::load_from_memory(&bytes)?.to_rgb8();

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|source| WebError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    rgb.save_with_format(dest, ImageFormat::Jpeg)?;

    debug!(path = %dest.display(), width = rgb.width(), height = rgb.height(), "visualization saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_b64() -> String {
        let img = image::RgbaImage::from_pixel(8, 4, image::Rgba([10, 200, 30, 128]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();
        base64::engine::general_purpose::STANDARD.encode(png)
    }

    #[test]
    fn writes_rgb_jpeg_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("images/visualization.jpg");
        save_visualization(&png_b64(), &dest).unwrap();

        let saved = image::open(&dest).unwrap();
        assert_eq!((saved.width(), saved.height()), (8, 4));
        assert_eq!(saved.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn overwrites_previous_image() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("v.jpg");
        std::fs::write(&dest, b"stale").unwrap();
        save_visualization(&png_b64(), &dest).unwrap();
        assert!(image::open(&dest).is_ok());
    }

    #[test]
    fn garbage_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("v.jpg");
        assert!(matches!(
            save_visualization("not base64!", &dest),
            Err(WebError::Base64(_))
        ));
        let b64 = base64::engine::general_purpose::STANDARD.encode(b"not an image");
        assert!(matches!(save_visualization(&b64, &dest), Err(WebError::Image(_))));
        assert!(!dest.exists());
    }
}
