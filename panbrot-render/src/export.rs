//! PNG snapshot of the visible surface with the view embedded as tEXt chunks.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use panbrot_core::ViewState;

use crate::buffer::PixelBuffer;
use crate::error::RenderError;

const KEY_PREFIX: &str = "Panbrot";

/// The view a snapshot was taken at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotMetadata {
    pub view: ViewState,
    pub device_pixel_ratio: f64,
}

impl SnapshotMetadata {
    pub fn new(view: ViewState, device_pixel_ratio: f64) -> Self {
        Self {
            view,
            device_pixel_ratio,
        }
    }

    fn description(&self) -> String {
        format!(
            "Mandelbrot - Center: {:.17}, Zoom: {}, Iterations: {}",
            self.view.center(),
            self.view.zoom,
            self.view.max_iter
        )
    }

    fn pairs(&self, image: &PixelBuffer) -> Vec<(String, String)> {
        vec![
            (format!("{KEY_PREFIX}.CenterRe"), format!("{:e}", self.view.center_x)),
            (format!("{KEY_PREFIX}.CenterIm"), format!("{:e}", self.view.center_y)),
            (format!("{KEY_PREFIX}.Zoom"), format!("{:e}", self.view.zoom)),
            (format!("{KEY_PREFIX}.MaxIterations"), self.view.max_iter.to_string()),
            (
                format!("{KEY_PREFIX}.DevicePixelRatio"),
                self.device_pixel_ratio.to_string(),
            ),
            (
                format!("{KEY_PREFIX}.Resolution"),
                format!("{}x{}", image.width, image.height),
            ),
        ]
    }
}

/// Encode `image` as an RGBA PNG into `writer`.
pub fn encode_png<W: Write>(
    writer: W,
    image: &PixelBuffer,
    metadata: &SnapshotMetadata,
) -> crate::Result<()> {
    if image.width == 0 || image.height == 0 {
        return Err(RenderError::InvalidDimensions {
            width: image.width,
            height: image.height,
        });
    }

    let mut encoder = png::Encoder::new(writer, image.width, image.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder.add_text_chunk("Software".to_string(), "panbrot".to_string())?;
    encoder.add_text_chunk("Description".to_string(), metadata.description())?;
    for (key, value) in metadata.pairs(image) {
        encoder.add_text_chunk(key, value)?;
    }

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&image.pixels)?;
    Ok(())
}

/// Write `image` to a PNG file at `path`.
pub fn export_png(path: &Path, image: &PixelBuffer, metadata: &SnapshotMetadata) -> crate::Result<()> {
    let file = File::create(path)?;
    encode_png(BufWriter::new(file), image, metadata)?;
    debug!(
        width = image.width,
        height = image.height,
        path = %path.display(),
        "Exported PNG"
    );
    Ok(())
}
