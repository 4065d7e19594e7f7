//! Motion-JPEG chunk recorder built on the screen-capture collaborator.
//!
//! # How recording works (for beginners)
//!
//! There is no video codec here.  While recording, a background task grabs
//! the screen `frames_per_second` times a second, JPEG-encodes each frame and
//! appends it to the open chunk.  Every `chunk_duration` the open chunk is
//! closed and a new one started.  Concatenating the chunks gives a
//! Motion-JPEG stream: a plain sequence of JPEG images that most players and
//! `ffmpeg -f mjpeg` can read.
//!
//! `acquire` grabs one frame up front, so an unavailable screen is
//! reported as a start failure instead of an empty recording.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deskrelay_core::ScreenSize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::application::frame::{ScreenCapture, ScreenFrame};
use crate::application::record_screen::{ChunkEncoder, RecordingError, RecordingSource};

/// Sampling parameters for recordings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderSettings {
    pub frames_per_second: u32,
    pub bounds: ScreenSize,
    pub jpeg_quality: u8,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            frames_per_second: 5,
            bounds: ScreenSize::new(960, 720),
            jpeg_quality: 30,
        }
    }
}

/// [`RecordingSource`] producing Motion-JPEG chunks.
pub struct MjpegRecorder {
    capture: Arc<dyn ScreenCapture>,
    settings: RecorderSettings,
}

impl MjpegRecorder {
    pub fn new(capture: Arc<dyn ScreenCapture>, settings: RecorderSettings) -> Self {
        Self { capture, settings }
    }
}

#[async_trait]
impl RecordingSource for MjpegRecorder {
    async fn acquire(
        &self,
        chunk_duration: Duration,
    ) -> Result<Box<dyn ChunkEncoder>, RecordingError> {
        let RecorderSettings {
            bounds,
            jpeg_quality,
            ..
        } = self.settings;
        let opening = self
            .capture
            .capture(bounds)
            .await
            .map_err(|e| RecordingError::SourceUnavailable(e.to_string()))?;
        let first = ScreenFrame::encode_blocking(opening, bounds, jpeg_quality)
            .await
            .map_err(|e| RecordingError::Encoder(e.to_string()))?;

        debug!(
            fps = self.settings.frames_per_second,
            chunk_ms = chunk_duration.as_millis() as u64,
            "capture source acquired"
        );
        Ok(Box::new(MjpegEncoder::start(
            Arc::clone(&self.capture),
            self.settings,
            chunk_duration,
            first.jpeg,
        )))
    }
}

/// A running sampler.  Dropping it stops sampling.
pub struct MjpegEncoder {
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<Vec<Vec<u8>>>>,
    bytes: Arc<AtomicU64>,
}

impl MjpegEncoder {
    fn start(
        capture: Arc<dyn ScreenCapture>,
        settings: RecorderSettings,
        chunk_duration: Duration,
        first_frame: Vec<u8>,
    ) -> Self {
        let (stop, stop_rx) = watch::channel(false);
        let bytes = Arc::new(AtomicU64::new(first_frame.len() as u64));
        let task = tokio::spawn(sample(
            capture,
            settings,
            chunk_duration,
            first_frame,
            Arc::clone(&bytes),
            stop_rx,
        ));
        Self {
            stop,
            task: Some(task),
            bytes,
        }
    }
}

#[async_trait]
impl ChunkEncoder for MjpegEncoder {
    fn estimated_bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    async fn finalize(&mut self) -> Result<Vec<Vec<u8>>, RecordingError> {
        let Some(task) = self.task.take() else {
            return Err(RecordingError::Encoder(
                "capture source already released".to_string(),
            ));
        };
        let _ = self.stop.send(true);
        task.await
            .map_err(|e| RecordingError::Encoder(format!("sampler task failed: {e}")))
    }

    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("capture source released");
        }
    }
}

impl Drop for MjpegEncoder {
    fn drop(&mut self) {
        self.release();
    }
}

async fn sample(
    capture: Arc<dyn ScreenCapture>,
    settings: RecorderSettings,
    chunk_duration: Duration,
    first_frame: Vec<u8>,
    bytes: Arc<AtomicU64>,
    mut stop: watch::Receiver<bool>,
) -> Vec<Vec<u8>> {
    let frame_period = Duration::from_secs(1) / settings.frames_per_second.max(1);
    let mut frames = interval_at(Instant::now() + frame_period, frame_period);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut chunks = Vec::new();
    let mut open = first_frame;
    let mut chunk_started = Instant::now();

    loop {
        tokio::select! {
            _ = stop.changed() => break,
            _ = frames.tick() => {
                let frame = match capture.capture(settings.bounds).await {
                    Ok(raw) => {
                        ScreenFrame::encode_blocking(raw, settings.bounds, settings.jpeg_quality).await
                    }
                    Err(e) => Err(e),
                };
                match frame {
                    Ok(frame) => {
                        bytes.fetch_add(frame.jpeg.len() as u64, Ordering::Relaxed);
                        open.extend_from_slice(&frame.jpeg);
                    }
                    Err(e) => warn!("recording frame skipped: {e}"),
                }
                if chunk_started.elapsed() >= chunk_duration && !open.is_empty() {
                    chunks.push(std::mem::take(&mut open));
                    chunk_started = Instant::now();
                }
            }
        }
    }

    if !open.is_empty() {
        chunks.push(open);
    }
    chunks
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::automation::mock::MockAutomation;

    fn recorder(capture: Arc<MockAutomation>) -> MjpegRecorder {
        MjpegRecorder::new(
            capture,
            RecorderSettings {
                frames_per_second: 20,
                ..RecorderSettings::default()
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunks_are_closed_on_schedule() {
        // Arrange
        let screen = Arc::new(MockAutomation::with_screen(ScreenSize::new(8, 8)));
        let mut encoder = recorder(screen.clone())
            .acquire(Duration::from_millis(100))
            .await
            .unwrap();

        // Act
        tokio::time::sleep(Duration::from_millis(350)).await;
        let chunks = encoder.finalize().await.unwrap();

        // Assert
        assert!(chunks.len() >= 3, "got {} chunks", chunks.len());
        for chunk in &chunks {
            assert_eq!(&chunk[..2], &[0xFF, 0xD8], "every chunk starts with a JPEG");
        }
        let total: u64 = chunks.iter().map(|c| c.len() as u64).sum();
        assert_eq!(encoder.estimated_bytes(), total);
        assert!(screen.capture_count() > 3);
    }

    #[tokio::test]
    async fn test_unavailable_screen_fails_acquire() {
        let screen = Arc::new(MockAutomation::failing());

        let result = recorder(screen).acquire(Duration::from_secs(1)).await;

        assert!(matches!(result, Err(RecordingError::SourceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_finalize_after_release_fails() {
        let screen = Arc::new(MockAutomation::with_screen(ScreenSize::new(8, 8)));
        let mut encoder = recorder(screen).acquire(Duration::from_secs(1)).await.unwrap();

        encoder.release();
        encoder.release();

        assert!(encoder.finalize().await.is_err());
    }

    #[tokio::test]
    async fn test_immediate_finalize_keeps_opening_frame() {
        let screen = Arc::new(MockAutomation::with_screen(ScreenSize::new(8, 8)));
        let mut encoder = recorder(screen).acquire(Duration::from_secs(1)).await.unwrap();

        let chunks = encoder.finalize().await.unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0][..2], &[0xFF, 0xD8]);
    }
}
