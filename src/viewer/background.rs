//! Background image loading.

use std::path::Path;

use image::{GenericImageView, ImageReader};

use crate::render::BackgroundImage;

/// Image file extensions offered by the open dialog
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Decode an image file to RGBA8.
pub fn load_background(path: &Path) -> anyhow::Result<BackgroundImage> {
    let img = ImageReader::open(path)?.decode()?;
    let (width, height) = img.dimensions();
    let has_alpha = img.color().has_alpha();
    let rgba = img.to_rgba8().into_raw();
    log::info!("Loaded background {}x{} from {}", width, height, path.display());
    Ok(BackgroundImage {
        width,
        height,
        rgba,
        has_alpha,
    })
}
