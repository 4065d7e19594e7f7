//! Screen frames: capture contract and JPEG encoding.
//!
//! A [`ScreenCapture`] implementation hands back raw RGB pixels; this module
//! downsizes them to the configured bound, encodes them as a low-quality JPEG,
//! and formats the `data:image/jpeg;base64,` URL the controller displays.

use std::io::Cursor;
use std::time::SystemTime;

use async_trait::async_trait;
use base64::Engine;
use deskrelay_core::ScreenSize;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, RgbImage};
use thiserror::Error;

/// Error type for capturing or encoding a frame.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("screen capture unavailable: {0}")]
    Unavailable(String),
    #[error("captured frame is malformed: {0}")]
    Malformed(String),
    #[error("frame encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("frame encoder task failed: {0}")]
    EncoderTask(#[from] tokio::task::JoinError),
}

/// Raw RGB8 pixels as returned by the capture backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB triples, `width * height * 3` bytes.
    pub rgb: Vec<u8>,
}

/// The "screen capture" half of OS automation.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// Grabs the primary screen.  Implementations may already downscale to
    /// `bounds`; the encoder downsizes anything larger.
    async fn capture(&self, bounds: ScreenSize) -> Result<RawFrame, CaptureError>;
}

/// One encoded frame.  Produced and consumed within a single tick.
#[derive(Debug, Clone)]
pub struct ScreenFrame {
    pub captured_at: SystemTime,
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

impl ScreenFrame {
    /// Fits `raw` inside `bounds` (preserving aspect ratio) and JPEG-encodes
    /// it at `quality` (1–100).
    ///
    /// # Errors
    ///
    /// [`CaptureError::Malformed`] if the pixel buffer does not match the
    /// declared size, or [`CaptureError::Encode`] if encoding fails.
    pub fn encode(raw: RawFrame, bounds: ScreenSize, quality: u8) -> Result<Self, CaptureError> {
        let captured_at = SystemTime::now();
        let (width, height) = (raw.width, raw.height);
        let image = RgbImage::from_raw(width, height, raw.rgb).ok_or_else(|| {
            CaptureError::Malformed(format!("buffer does not hold {width}x{height} RGB pixels"))
        })?;

        let (fit_w, fit_h) = fit_within(width, height, bounds);
        let image = if (fit_w, fit_h) == (width, height) {
            image
        } else {
            imageops::resize(&image, fit_w, fit_h, FilterType::Triangle)
        };

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), quality.clamp(1, 100)).encode(
            image.as_raw(),
            fit_w,
            fit_h,
            ExtendedColorType::Rgb8,
        )?;

        Ok(Self {
            captured_at,
            width: fit_w,
            height: fit_h,
            jpeg,
        })
    }

    /// [`encode`](Self::encode) on the blocking pool, keeping async workers
    /// free while the frame is resized and compressed.
    pub async fn encode_blocking(
        raw: RawFrame,
        bounds: ScreenSize,
        quality: u8,
    ) -> Result<Self, CaptureError> {
        tokio::task::spawn_blocking(move || Self::encode(raw, bounds, quality)).await?
    }

    /// `data:image/jpeg;base64,...`
    pub fn to_data_url(&self) -> String {
        let engine = base64::engine::general_purpose::STANDARD;
        format!("data:image/jpeg;base64,{}", engine.encode(&self.jpeg))
    }
}

/// Largest size with the same aspect ratio that fits inside `bounds`.
/// Frames already inside the bound are left alone.
pub fn fit_within(width: u32, height: u32, bounds: ScreenSize) -> (u32, u32) {
    if width <= bounds.width && height <= bounds.height {
        return (width, height);
    }
    let scale = f64::min(
        f64::from(bounds.width) / f64::from(width),
        f64::from(bounds.height) / f64::from(height),
    );
    let w = ((f64::from(width) * scale).round() as u32).clamp(1, bounds.width.max(1));
    let h = ((f64::from(height) * scale).round() as u32).clamp(1, bounds.height.max(1));
    (w, h)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
