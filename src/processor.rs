//! The image-transform seam and its shipped implementation.
//!
//! The orchestrator treats transcoding as an opaque capability behind
//! [`ImageProcessor`]: bytes in, bytes out, may fail. That keeps the batch
//! machinery independent of any particular codec stack and lets tests
//! substitute failing or recording processors.
//!
//! [`DefaultImageProcessor`] covers the formats a vault actually holds via
//! the `image` crate: decode jpeg/png/webp/gif/bmp/tiff, resize with
//! Lanczos3, encode webp (lossless), jpeg (quality-scaled) or png, or
//! re-encode in the source format when conversion is disabled. Decoding and
//! encoding are CPU-bound, so the work runs under `spawn_blocking` and the
//! async caller only awaits the result.

use crate::config::{OutputFormat, ProcessConfig, ResizeMode, ScalePolicy};
use crate::error::TransformError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;
use tracing::debug;

/// Result of one transform: the encoded bytes and final pixel dimensions.
#[derive(Debug, Clone)]
pub struct TransformedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// The transform capability consumed by the orchestrator.
#[allow(async_fn_in_trait)]
pub trait ImageProcessor {
    /// Whether this processor can decode files with the given extension.
    /// Consulted by the eligibility filter before any bytes are read.
    fn supports(&self, ext: &str) -> bool;

    /// Convert/resize `bytes` according to the run configuration.
    async fn transform(
        &self,
        bytes: Vec<u8>,
        config: &ProcessConfig,
    ) -> Result<TransformedImage, TransformError>;
}

/// The shipped `image`-crate processor.
#[derive(Debug, Clone, Default)]
pub struct DefaultImageProcessor;

const DECODABLE: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp", "tif", "tiff"];

impl ImageProcessor for DefaultImageProcessor {
    fn supports(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        DECODABLE.contains(&ext.as_str())
    }

    async fn transform(
        &self,
        bytes: Vec<u8>,
        config: &ProcessConfig,
    ) -> Result<TransformedImage, TransformError> {
        let format = config.format;
        let quality = config.quality;
        let resize = config.resize;
        let policy = config.scale_policy;
        tokio::task::spawn_blocking(move || {
            transform_blocking(&bytes, format, quality, resize, policy)
        })
        .await
        .map_err(|e| TransformError::Encode {
            detail: format!("processing task aborted: {e}"),
        })?
    }
}

fn transform_blocking(
    bytes: &[u8],
    format: OutputFormat,
    quality: f32,
    resize: ResizeMode,
    policy: ScalePolicy,
) -> Result<TransformedImage, TransformError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| TransformError::Decode {
            detail: e.to_string(),
        })?;
    let source_format = reader.format().ok_or_else(|| TransformError::Decode {
        detail: "unrecognised image data".into(),
    })?;
    let img = reader.decode().map_err(|e| TransformError::Decode {
        detail: e.to_string(),
    })?;

    let img = apply_resize(img, resize, policy);
    let (width, height) = img.dimensions();

    // Conversion disabled keeps the source container.
    let encode_format = match format {
        OutputFormat::Disabled => source_format,
        OutputFormat::Webp => ImageFormat::WebP,
        OutputFormat::Jpeg => ImageFormat::Jpeg,
        OutputFormat::Png => ImageFormat::Png,
    };
    debug!(?encode_format, width, height, "encoding transformed image");

    let bytes = encode(&img, encode_format, quality)?;
    Ok(TransformedImage {
        bytes,
        width,
        height,
    })
}

/// Compute the post-resize dimensions, `None` when no resize applies.
fn target_dims(width: u32, height: u32, mode: ResizeMode) -> Option<(u32, u32)> {
    let (w, h) = (width as f64, height as f64);
    let (tw, th) = match mode {
        ResizeMode::None => return None,
        ResizeMode::Width(n) => (n as f64, h * n as f64 / w),
        ResizeMode::Height(n) => (w * n as f64 / h, n as f64),
        ResizeMode::LongestEdge(n) => {
            if width >= height {
                (n as f64, h * n as f64 / w)
            } else {
                (w * n as f64 / h, n as f64)
            }
        }
        ResizeMode::ShortestEdge(n) => {
            if width <= height {
                (n as f64, h * n as f64 / w)
            } else {
                (w * n as f64 / h, n as f64)
            }
        }
        ResizeMode::Fit {
            width: mw,
            height: mh,
        } => {
            let ratio = (mw as f64 / w).min(mh as f64 / h);
            (w * ratio, h * ratio)
        }
    };
    Some(((tw.round() as u32).max(1), (th.round() as u32).max(1)))
}

fn apply_resize(img: DynamicImage, mode: ResizeMode, policy: ScalePolicy) -> DynamicImage {
    let (w, h) = img.dimensions();
    let Some((tw, th)) = target_dims(w, h, mode) else {
        return img;
    };
    if (tw, th) == (w, h) {
        return img;
    }
    // Proportional scaling moves both axes the same way, so one comparison
    // classifies the whole resize.
    let enlarging = tw > w;
    match policy {
        ScalePolicy::ReduceOnly if enlarging => return img,
        ScalePolicy::EnlargeOnly if !enlarging => return img,
        _ => {}
    }
    img.resize_exact(tw, th, FilterType::Lanczos3)
}

fn encode(
    img: &DynamicImage,
    format: ImageFormat,
    quality: f32,
) -> Result<Vec<u8>, TransformError> {
    let mut out = Cursor::new(Vec::new());
    let encode_err = |e: image::ImageError| TransformError::Encode {
        detail: e.to_string(),
    };
    match format {
        ImageFormat::Jpeg => {
            // Jpeg has no alpha channel; quality maps 0.0..=1.0 to 1..=100.
            let q = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
            let encoder = JpegEncoder::new_with_quality(&mut out, q);
            img.to_rgb8().write_with_encoder(encoder).map_err(encode_err)?;
        }
        ImageFormat::WebP | ImageFormat::Gif => {
            // These encoders accept rgb8/rgba8 only.
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut out, format)
                .map_err(encode_err)?;
        }
        other => {
            img.write_to(&mut out, other).map_err(encode_err)?;
        }
    }
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([120, 40, 200, 255]),
        ));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn dims_width_mode_keeps_aspect() {
        assert_eq!(target_dims(100, 50, ResizeMode::Width(50)), Some((50, 25)));
        assert_eq!(target_dims(100, 50, ResizeMode::Height(25)), Some((50, 25)));
    }

    #[test]
    fn dims_edge_modes_pick_the_right_axis() {
        assert_eq!(
            target_dims(200, 100, ResizeMode::LongestEdge(100)),
            Some((100, 50))
        );
        assert_eq!(
            target_dims(100, 200, ResizeMode::LongestEdge(100)),
            Some((50, 100))
        );
        assert_eq!(
            target_dims(200, 100, ResizeMode::ShortestEdge(50)),
            Some((100, 50))
        );
    }

    #[test]
    fn dims_fit_bounds_both_axes() {
        assert_eq!(
            target_dims(
                400,
                200,
                ResizeMode::Fit {
                    width: 100,
                    height: 100
                }
            ),
            Some((100, 50))
        );
        assert_eq!(target_dims(10, 10, ResizeMode::None), None);
    }

    #[test]
    fn reduce_only_policy_blocks_enlarging() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(10, 10));
        let resized = apply_resize(img, ResizeMode::Width(100), ScalePolicy::ReduceOnly);
        assert_eq!(resized.dimensions(), (10, 10));

        let img = DynamicImage::ImageRgba8(RgbaImage::new(10, 10));
        let resized = apply_resize(img, ResizeMode::Width(5), ScalePolicy::ReduceOnly);
        assert_eq!(resized.dimensions(), (5, 5));
    }

    #[test]
    fn supports_is_case_insensitive() {
        let p = DefaultImageProcessor;
        assert!(p.supports("PNG"));
        assert!(p.supports("jpeg"));
        assert!(!p.supports("svg"));
        assert!(!p.supports("pdf"));
    }

    #[tokio::test]
    async fn converts_png_to_webp() {
        let p = DefaultImageProcessor;
        let config = ProcessConfig {
            format: OutputFormat::Webp,
            ..ProcessConfig::default()
        };
        let out = p.transform(png_bytes(8, 4), &config).await.unwrap();
        assert_eq!((out.width, out.height), (8, 4));
        assert_eq!(
            image::guess_format(&out.bytes).unwrap(),
            ImageFormat::WebP
        );
    }

    #[tokio::test]
    async fn disabled_format_reencodes_source_container() {
        let p = DefaultImageProcessor;
        let config = ProcessConfig {
            resize: ResizeMode::Width(4),
            ..ProcessConfig::default()
        };
        let out = p.transform(png_bytes(8, 4), &config).await.unwrap();
        assert_eq!((out.width, out.height), (4, 2));
        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::Png);
    }

    #[tokio::test]
    async fn garbage_bytes_fail_to_decode() {
        let p = DefaultImageProcessor;
        let err = p
            .transform(b"not an image at all".to_vec(), &ProcessConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TransformError::Decode { .. }));
    }
}
