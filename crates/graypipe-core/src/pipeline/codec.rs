//! Image decoding and JPEG encoding.
//!
//! Both operations are synchronous and are driven from `spawn_blocking` by the
//! load and save stages.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use crate::config::OutputConfig;
use crate::error::{PipelineError, PipelineResult};

/// Stateless codec for reading source images and writing JPEG output.
#[derive(Debug, Clone)]
pub struct ImageCodec {
    output: OutputConfig,
}

impl ImageCodec {
    /// Create a codec with the given output settings.
    pub fn new(output: OutputConfig) -> Self {
        Self { output }
    }

    /// Read and decode an image file.
    ///
    /// The format is detected from the file content, falling back to the
    /// extension when the magic bytes are not recognized.
    pub fn decode(&self, path: &Path) -> PipelineResult<DynamicImage> {
        let bytes = std::fs::read(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode_bytes(bytes, path)
    }

    fn decode_bytes(bytes: Vec<u8>, path: &Path) -> PipelineResult<DynamicImage> {
        let mut reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        if reader.format().is_none() {
            let format = ImageFormat::from_path(path).map_err(|_| PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unsupported image format".to_string(),
            })?;
            reader.set_format(format);
        }
        reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Encode `image` as JPEG at `path` with the configured quality.
    pub fn encode(&self, image: &DynamicImage, path: &Path) -> PipelineResult<()> {
        if self.output.create_dirs {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| PipelineError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let file = File::create(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        // JPEG carries no alpha and no 16-bit samples
        let image = match image {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => Cow::Borrowed(image),
            DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_) => {
                Cow::Owned(DynamicImage::ImageLuma8(image.to_luma8()))
            }
            other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
        };

        let encoder = JpegEncoder::new_with_quality(&mut writer, self.output.jpeg_quality);
        image
            .write_with_encoder(encoder)
            .map_err(|e| PipelineError::Encode {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        writer.flush().map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}
