//! RecordingPipeline: start/stop/persist state machine for screen recordings.
//!
//! # Lifecycle (for beginners)
//!
//! ```text
//! Idle ──start──▶ Initializing ──source acquired──▶ Recording ──stop──▶ Stopping ──saved/cancelled/failed──▶ Idle
//!                      │                                 │                  │
//!                      └──────── acquisition failed ─────┴── owner released ┘ (Error / cancelled → Idle)
//! ```
//!
//! The pipeline is a synchronous state machine.  The slow parts (acquiring
//! the capture source, finalizing the encoder, asking for a destination,
//! writing the file) run in tasks spawned by the agent, and their results are
//! fed back through [`RecordingPipeline::on_acquired`],
//! [`RecordingPipeline::on_save_progress`] and
//! [`RecordingPipeline::on_persisted`].  Each of those re-checks the recording
//! id and status, so a result that arrives after a cancellation is dropped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use deskrelay_core::protocol::messages::{
    OutboundMessage, RecordingComplete, RecordingProgress, RecordingStatus, RecordingStatusKind,
};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use uuid::Uuid;

/// Error type for recording operations.
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("capture source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("encoder failed: {0}")]
    Encoder(String),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a start/stop request was refused.  The `Display` text is what the
/// controller sees in `recording-status{error}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordingRejection {
    #[error("already in progress")]
    AlreadyInProgress,
    #[error("not your recording")]
    NotOwner,
    #[error("no recording in progress")]
    NotRecording,
    #[error("not authorized")]
    NotAuthorized,
}

/// A live chunked encoder over an acquired capture source.
#[async_trait]
pub trait ChunkEncoder: Send {
    /// Bytes produced so far, closed chunks plus the open one.
    fn estimated_bytes(&self) -> u64;

    /// Stops sampling and returns every chunk, including the partially
    /// filled one, in production order.
    async fn finalize(&mut self) -> Result<Vec<Vec<u8>>, RecordingError>;

    /// Releases the capture source.  Safe to call more than once.
    fn release(&mut self);
}

/// Acquires a capture source with an encoder emitting fixed-duration chunks.
#[async_trait]
pub trait RecordingSource: Send + Sync {
    async fn acquire(
        &self,
        chunk_duration: Duration,
    ) -> Result<Box<dyn ChunkEncoder>, RecordingError>;
}

/// The "save dialog": chooses where a finished recording goes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DestinationPicker: Send + Sync {
    /// Returns `None` when the user declines to save.
    async fn choose(&self, recording_id: &str) -> Option<PathBuf>;
}

/// Recording parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingSettings {
    pub chunk_duration: Duration,
    pub progress_interval: Duration,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            chunk_duration: Duration::from_secs(1),
            progress_interval: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Idle,
    Initializing,
    Recording,
    Stopping,
    Error,
}

struct RecordingSession {
    id: String,
    owner: String,
    started_at: Instant,
    status: PipelineStatus,
    encoder: Option<Box<dyn ChunkEncoder>>,
    duration_ms: u64,
}

/// Everything the agent needs to finish a stopped recording off-task.
pub struct SaveJob {
    pub recording_id: String,
    pub encoder: Box<dyn ChunkEncoder>,
}

/// How persisting a stopped recording ended.
#[derive(Debug)]
pub enum PersistOutcome {
    Saved { path: PathBuf, file_size: u64 },
    /// No destination was chosen; nothing was written.
    Cancelled,
    Failed(String),
}

/// Result of feeding an acquisition result back into the pipeline.
pub enum AcquireOutcome {
    /// Now recording; the agent should report it and arm the progress timer.
    Started { owner: String },
    /// Acquisition failed; the pipeline is back to Idle.
    Failed { owner: String, reason: String },
    /// The recording this result was for no longer exists.  The encoder, if
    /// any, must be released by the caller.
    Stale(Option<Box<dyn ChunkEncoder>>),
}

/// At most one recording, process-wide.
pub struct RecordingPipeline {
    settings: RecordingSettings,
    session: Option<RecordingSession>,
}

impl RecordingPipeline {
    pub fn new(settings: RecordingSettings) -> Self {
        Self {
            settings,
            session: None,
        }
    }

    pub fn settings(&self) -> &RecordingSettings {
        &self.settings
    }

    pub fn status(&self) -> PipelineStatus {
        self.session
            .as_ref()
            .map_or(PipelineStatus::Idle, |s| s.status)
    }

    pub fn owner(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.owner.as_str())
    }

    pub fn recording_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }

    /// Accepts a start request from `requester`.
    ///
    /// Returns the new recording id.  The caller reports `initializing` and
    /// acquires the source.
    pub fn start(&mut self, requester: &str) -> Result<String, RecordingRejection> {
        if self.session.is_some() {
            return Err(RecordingRejection::AlreadyInProgress);
        }
        let id = Uuid::new_v4().to_string();
        self.session = Some(RecordingSession {
            id: id.clone(),
            owner: requester.to_string(),
            started_at: Instant::now(),
            status: PipelineStatus::Initializing,
            encoder: None,
            duration_ms: 0,
        });
        Ok(id)
    }

    /// Applies the outcome of acquiring the capture source for `id`.
    pub fn on_acquired(
        &mut self,
        id: &str,
        result: Result<Box<dyn ChunkEncoder>, RecordingError>,
    ) -> AcquireOutcome {
        let current = self
            .session
            .as_ref()
            .is_some_and(|s| s.id == id && s.status == PipelineStatus::Initializing);
        if !current {
            return AcquireOutcome::Stale(result.ok());
        }
        match result {
            Ok(encoder) => {
                let Some(session) = self.session.as_mut() else {
                    return AcquireOutcome::Stale(Some(encoder));
                };
                session.encoder = Some(encoder);
                session.status = PipelineStatus::Recording;
                AcquireOutcome::Started {
                    owner: session.owner.clone(),
                }
            }
            Err(e) => {
                let owner = self.fail();
                AcquireOutcome::Failed {
                    owner: owner.unwrap_or_default(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Progress report while Recording.
    pub fn progress(&self) -> Option<RecordingStatus> {
        let session = self.session.as_ref()?;
        if session.status != PipelineStatus::Recording {
            return None;
        }
        let estimated_bytes = session
            .encoder
            .as_ref()
            .map_or(0, |encoder| encoder.estimated_bytes());
        Some(RecordingStatus {
            to: session.owner.clone(),
            status: RecordingStatusKind::Recording,
            progress: Some(RecordingProgress::Elapsed {
                elapsed_ms: millis(session.started_at.elapsed()),
                estimated_bytes,
            }),
            error: None,
        })
    }

    /// Accepts a stop request from `requester`.
    ///
    /// Checks, in order: a recording exists, `requester` owns it, it is
    /// Recording.  On success the status is Stopping and the encoder is handed
    /// to the caller to finalize off-task.
    pub fn stop(&mut self, requester: &str) -> Result<SaveJob, RecordingRejection> {
        let session = self
            .session
            .as_mut()
            .ok_or(RecordingRejection::NotRecording)?;
        if session.owner != requester {
            return Err(RecordingRejection::NotOwner);
        }
        if session.status != PipelineStatus::Recording {
            return Err(RecordingRejection::NotRecording);
        }
        let encoder = session
            .encoder
            .take()
            .ok_or(RecordingRejection::NotRecording)?;
        session.status = PipelineStatus::Stopping;
        session.duration_ms = millis(session.started_at.elapsed());
        Ok(SaveJob {
            recording_id: session.id.clone(),
            encoder,
        })
    }

    /// Saving progress for `id`, if it is still the Stopping recording.
    pub fn on_save_progress(&self, id: &str, current: u32, total: u32) -> Option<RecordingStatus> {
        let session = self.session.as_ref()?;
        if session.id != id || session.status != PipelineStatus::Stopping {
            return None;
        }
        let percentage = if total == 0 {
            100
        } else {
            ((u64::from(current) * 100) / u64::from(total)).min(100) as u8
        };
        Some(RecordingStatus {
            to: session.owner.clone(),
            status: RecordingStatusKind::Saving,
            progress: Some(RecordingProgress::Saving {
                current,
                total,
                percentage,
            }),
            error: None,
        })
    }

    /// Finishes the Stopping recording `id` and resets to Idle.
    ///
    /// Returns the final message for the owner.
    pub fn on_persisted(&mut self, id: &str, outcome: PersistOutcome) -> Option<OutboundMessage> {
        let matches = self
            .session
            .as_ref()
            .is_some_and(|s| s.id == id && s.status == PipelineStatus::Stopping);
        if !matches {
            return None;
        }
        let session = self.session.take()?;
        let msg = match outcome {
            PersistOutcome::Saved { path, file_size } => {
                OutboundMessage::RecordingComplete(RecordingComplete {
                    to: session.owner,
                    recording_id: session.id,
                    duration: session.duration_ms,
                    file_size,
                    file_path: path.display().to_string(),
                })
            }
            PersistOutcome::Cancelled => OutboundMessage::RecordingStatus(RecordingStatus::plain(
                session.owner,
                RecordingStatusKind::Cancelled,
            )),
            PersistOutcome::Failed(reason) => {
                OutboundMessage::RecordingStatus(RecordingStatus::failed(session.owner, reason))
            }
        };
        Some(msg)
    }

    /// Cancels a recording owned by `owner` that has not reached Stopping.
    ///
    /// Releases the capture source, discards chunks, and resets to Idle.
    /// Returns `true` if something was cancelled.  A Stopping recording is
    /// left alone so its file is still written.
    pub fn cancel_for_owner(&mut self, owner: &str) -> bool {
        let cancellable = self.session.as_ref().is_some_and(|s| {
            s.owner == owner
                && matches!(
                    s.status,
                    PipelineStatus::Initializing | PipelineStatus::Recording
                )
        });
        if !cancellable {
            return false;
        }
        if let Some(mut session) = self.session.take() {
            if let Some(mut encoder) = session.encoder.take() {
                encoder.release();
            }
        }
        true
    }

    /// Marks the session as Error, releases the source, and resets to Idle.
    /// Returns the owner.
    fn fail(&mut self) -> Option<String> {
        let mut session = self.session.take()?;
        session.status = PipelineStatus::Error;
        if let Some(mut encoder) = session.encoder.take() {
            encoder.release();
        }
        Some(session.owner)
    }
}

/// Writes `chunks` to `path` strictly in order, calling `on_chunk(current,
/// total)` after each one is written.  Returns the file size.
///
/// # Errors
///
/// [`RecordingError::Write`] on the first failed create, write or flush.
pub async fn write_chunks<F>(
    path: &Path,
    chunks: &[Vec<u8>],
    mut on_chunk: F,
) -> Result<u64, RecordingError>
where
    F: FnMut(u32, u32),
{
    let write_err = |source| RecordingError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(write_err)?;

    let total = u32::try_from(chunks.len()).unwrap_or(u32::MAX);
    let mut written = 0u64;
    for (index, chunk) in chunks.iter().enumerate() {
        file.write_all(chunk).await.map_err(write_err)?;
        written += chunk.len() as u64;
        on_chunk(u32::try_from(index + 1).unwrap_or(u32::MAX), total);
    }
    file.flush().await.map_err(write_err)?;
    Ok(written)
}

/// Finalizes the encoder, releases the source, asks for a destination and
/// writes the file.  Runs off the agent task.
pub async fn persist<F>(
    mut job: SaveJob,
    picker: &dyn DestinationPicker,
    on_chunk: F,
) -> PersistOutcome
where
    F: FnMut(u32, u32),
{
    let finalized = job.encoder.finalize().await;
    job.encoder.release();
    let chunks = match finalized {
        Ok(chunks) => chunks,
        Err(e) => return PersistOutcome::Failed(e.to_string()),
    };
    let Some(path) = picker.choose(&job.recording_id).await else {
        return PersistOutcome::Cancelled;
    };
    match write_chunks(&path, &chunks, on_chunk).await {
        Ok(file_size) => PersistOutcome::Saved { path, file_size },
        Err(e) => PersistOutcome::Failed(e.to_string()),
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    // ── Mock encoder ──────────────────────────────────────────────────────────

    struct FakeEncoder {
        chunks: Vec<Vec<u8>>,
        releases: Arc<AtomicUsize>,
        should_fail: bool,
    }

    impl FakeEncoder {
        fn boxed(chunks: Vec<Vec<u8>>, releases: &Arc<AtomicUsize>) -> Box<dyn ChunkEncoder> {
            Box::new(Self {
                chunks,
                releases: Arc::clone(releases),
                should_fail: false,
            })
        }
    }

    #[async_trait]
    impl ChunkEncoder for FakeEncoder {
        fn estimated_bytes(&self) -> u64 {
            self.chunks.iter().map(|c| c.len() as u64).sum()
        }
        async fn finalize(&mut self) -> Result<Vec<Vec<u8>>, RecordingError> {
            if self.should_fail {
                return Err(RecordingError::Encoder("injected failure".to_string()));
            }
            Ok(std::mem::take(&mut self.chunks))
        }
        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("deskrelay-record-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    fn recording(owner: &str, releases: &Arc<AtomicUsize>) -> (RecordingPipeline, String) {
        let mut pipeline = RecordingPipeline::new(RecordingSettings::default());
        let id = pipeline.start(owner).unwrap();
        let encoder = FakeEncoder::boxed(vec![b"one".to_vec(), b"two".to_vec()], releases);
        assert!(matches!(
            pipeline.on_acquired(&id, Ok(encoder)),
            AcquireOutcome::Started { .. }
        ));
        (pipeline, id)
    }

    // ── start ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_start_enters_initializing() {
        let mut pipeline = RecordingPipeline::new(RecordingSettings::default());
        let id = pipeline.start("c1").unwrap();
        assert_eq!(pipeline.status(), PipelineStatus::Initializing);
        assert_eq!(pipeline.owner(), Some("c1"));
        assert_eq!(pipeline.recording_id(), Some(id.as_str()));
    }

    #[tokio::test]
    async fn test_start_while_active_is_rejected_and_session_untouched() {
        // Arrange
        let releases = Arc::new(AtomicUsize::new(0));
        let (mut pipeline, id) = recording("c1", &releases);

        // Act
        let result = pipeline.start("c1");

        // Assert
        assert_eq!(result, Err(RecordingRejection::AlreadyInProgress));
        assert_eq!(result.unwrap_err().to_string(), "already in progress");
        assert_eq!(pipeline.status(), PipelineStatus::Recording);
        assert_eq!(pipeline.recording_id(), Some(id.as_str()));
    }

    #[test]
    fn test_acquisition_failure_resets_to_idle() {
        let mut pipeline = RecordingPipeline::new(RecordingSettings::default());
        let id = pipeline.start("c1").unwrap();

        let outcome = pipeline.on_acquired(
            &id,
            Err(RecordingError::SourceUnavailable("no display".to_string())),
        );

        match outcome {
            AcquireOutcome::Failed { owner, reason } => {
                assert_eq!(owner, "c1");
                assert!(reason.contains("no display"));
            }
            _ => panic!("expected failure"),
        }
        assert_eq!(pipeline.status(), PipelineStatus::Idle);
    }

    #[test]
    fn test_acquired_after_cancel_is_stale() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut pipeline = RecordingPipeline::new(RecordingSettings::default());
        let id = pipeline.start("c1").unwrap();
        assert!(pipeline.cancel_for_owner("c1"));

        let outcome = pipeline.on_acquired(&id, Ok(FakeEncoder::boxed(vec![], &releases)));

        assert!(matches!(outcome, AcquireOutcome::Stale(Some(_))));
        assert_eq!(pipeline.status(), PipelineStatus::Idle);
    }

    // ── stop ──────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_stop_from_non_owner_is_rejected() {
        let releases = Arc::new(AtomicUsize::new(0));
        let (mut pipeline, _) = recording("c1", &releases);

        let result = pipeline.stop("c2");

        assert_eq!(result.err(), Some(RecordingRejection::NotOwner));
        assert_eq!(pipeline.status(), PipelineStatus::Recording);
    }

    #[test]
    fn test_stop_when_idle_is_rejected() {
        let mut pipeline = RecordingPipeline::new(RecordingSettings::default());
        assert_eq!(
            pipeline.stop("c1").err(),
            Some(RecordingRejection::NotRecording)
        );
    }

    #[test]
    fn test_stop_while_initializing_is_rejected() {
        let mut pipeline = RecordingPipeline::new(RecordingSettings::default());
        pipeline.start("c1").unwrap();
        assert_eq!(
            pipeline.stop("c1").err(),
            Some(RecordingRejection::NotRecording)
        );
        assert_eq!(pipeline.status(), PipelineStatus::Initializing);
    }

    #[tokio::test]
    async fn test_stop_enters_stopping_and_hands_out_encoder() {
        let releases = Arc::new(AtomicUsize::new(0));
        let (mut pipeline, id) = recording("c1", &releases);

        let job = pipeline.stop("c1").unwrap();

        assert_eq!(job.recording_id, id);
        assert_eq!(pipeline.status(), PipelineStatus::Stopping);
        assert!(pipeline.progress().is_none());
    }

    // ── progress ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_progress_reports_estimated_bytes() {
        let releases = Arc::new(AtomicUsize::new(0));
        let (pipeline, _) = recording("c1", &releases);

        let status = pipeline.progress().unwrap();

        assert_eq!(status.to, "c1");
        assert!(matches!(
            status.progress,
            Some(RecordingProgress::Elapsed {
                estimated_bytes: 6,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_saving_progress_percentage() {
        let releases = Arc::new(AtomicUsize::new(0));
        let (mut pipeline, id) = recording("c1", &releases);
        pipeline.stop("c1").unwrap();

        let status = pipeline.on_save_progress(&id, 1, 3).unwrap();

        assert_eq!(status.status, RecordingStatusKind::Saving);
        assert_eq!(
            status.progress,
            Some(RecordingProgress::Saving {
                current: 1,
                total: 3,
                percentage: 33
            })
        );
        assert!(pipeline.on_save_progress("other-id", 1, 3).is_none());
    }

    // ── persistence ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_persist_without_destination_is_cancelled() {
        // Arrange
        let releases = Arc::new(AtomicUsize::new(0));
        let (mut pipeline, id) = recording("c1", &releases);
        let job = pipeline.stop("c1").unwrap();
        let mut picker = MockDestinationPicker::new();
        picker.expect_choose().times(1).returning(|_| None);

        // Act
        let outcome = persist(job, &picker, |_, _| panic!("nothing should be written")).await;
        let msg = pipeline.on_persisted(&id, outcome);

        // Assert
        assert_eq!(
            msg,
            Some(OutboundMessage::RecordingStatus(RecordingStatus::plain(
                "c1",
                RecordingStatusKind::Cancelled
            )))
        );
        assert_eq!(pipeline.status(), PipelineStatus::Idle);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_persist_writes_chunks_in_order() {
        // Arrange
        let releases = Arc::new(AtomicUsize::new(0));
        let (mut pipeline, id) = recording("c1", &releases);
        let job = pipeline.stop("c1").unwrap();
        let path = temp_path("out.mjpeg");
        let chosen = path.clone();
        let mut picker = MockDestinationPicker::new();
        picker
            .expect_choose()
            .returning(move |_| Some(chosen.clone()));
        let mut progress = Vec::new();

        // Act
        let outcome = persist(job, &picker, |current, total| progress.push((current, total))).await;
        let msg = pipeline.on_persisted(&id, outcome);

        // Assert
        assert_eq!(std::fs::read(&path).unwrap(), b"onetwo");
        assert_eq!(progress, vec![(1, 2), (2, 2)]);
        match msg {
            Some(OutboundMessage::RecordingComplete(done)) => {
                assert_eq!(done.recording_id, id);
                assert_eq!(done.file_size, 6);
                assert_eq!(done.file_path, path.display().to_string());
            }
            other => panic!("unexpected message: {other:?}"),
        }
        assert_eq!(pipeline.status(), PipelineStatus::Idle);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_write_failure_reports_error_and_resets() {
        let releases = Arc::new(AtomicUsize::new(0));
        let (mut pipeline, id) = recording("c1", &releases);
        let job = pipeline.stop("c1").unwrap();
        let missing_dir = std::env::temp_dir()
            .join(format!("deskrelay-missing-{}", Uuid::new_v4()))
            .join("out.mjpeg");
        let mut picker = MockDestinationPicker::new();
        picker
            .expect_choose()
            .returning(move |_| Some(missing_dir.clone()));

        let outcome = persist(job, &picker, |_, _| {}).await;
        let msg = pipeline.on_persisted(&id, outcome);

        match msg {
            Some(OutboundMessage::RecordingStatus(status)) => {
                assert_eq!(status.status, RecordingStatusKind::Error);
                assert!(status.error.is_some());
            }
            other => panic!("unexpected message: {other:?}"),
        }
        assert_eq!(pipeline.status(), PipelineStatus::Idle);
    }

    #[tokio::test]
    async fn test_finalize_failure_reports_error() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut pipeline = RecordingPipeline::new(RecordingSettings::default());
        let id = pipeline.start("c1").unwrap();
        let encoder: Box<dyn ChunkEncoder> = Box::new(FakeEncoder {
            chunks: vec![],
            releases: Arc::clone(&releases),
            should_fail: true,
        });
        pipeline.on_acquired(&id, Ok(encoder));
        let job = pipeline.stop("c1").unwrap();
        let picker = MockDestinationPicker::new();

        let outcome = persist(job, &picker, |_, _| {}).await;

        assert!(matches!(outcome, PersistOutcome::Failed(_)));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert!(pipeline.on_persisted(&id, outcome).is_some());
        assert_eq!(pipeline.status(), PipelineStatus::Idle);
    }

    // ── cancellation ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_cancel_for_owner_releases_source() {
        let releases = Arc::new(AtomicUsize::new(0));
        let (mut pipeline, _) = recording("c1", &releases);

        assert!(!pipeline.cancel_for_owner("c2"));
        assert!(pipeline.cancel_for_owner("c1"));

        assert_eq!(pipeline.status(), PipelineStatus::Idle);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_leaves_stopping_recording_alone() {
        let releases = Arc::new(AtomicUsize::new(0));
        let (mut pipeline, _) = recording("c1", &releases);
        let _job = pipeline.stop("c1").unwrap();

        assert!(!pipeline.cancel_for_owner("c1"));
        assert_eq!(pipeline.status(), PipelineStatus::Stopping);
    }
}
