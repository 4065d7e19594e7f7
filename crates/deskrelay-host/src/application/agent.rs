//! HostAgent: the single task that owns all session state.
//!
//! # How the agent works (for beginners)
//!
//! Everything that can change host state arrives as an [`AgentEvent`] on one
//! queue: relay channel events, timer ticks, the approver's decision, finished
//! screen captures, recording results, and operator actions.  The agent takes
//! them one at a time and handles each to completion with a plain `match`, so
//! the session, modifier state, and recording state are never touched from
//! two places at once and need no locks.
//!
//! Anything slow (asking the approver, grabbing a frame, acquiring or
//! finalizing the recorder, writing a file) is spawned as its own task.  Its
//! result comes back as another event, and the handler for that event
//! re-checks authorization and ownership before acting on it: the world may
//! have changed while the task was running.
//!
//! Outbound messages go to the relay adapter through an unbounded channel.
//!
//! Shutdown and a closed channel tear the session down at once, but a
//! recording that was already stopped keeps saving: the loop stays up until
//! its `recording-complete` goes out or [`SHUTDOWN_SAVE_GRACE`] runs out.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use deskrelay_core::protocol::messages::{
    ConnectionResponse, DisconnectClient, HostDisconnectAck, InboundMessage, OutboundMessage,
    RecordingStatus, RecordingStatusKind, RequestRejected,
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::application::frame::{CaptureError, ScreenCapture, ScreenFrame};
use crate::application::lifecycle::{ChannelEvent, ConnectionLifecycle, HandshakeSettings};
use crate::application::record_screen::{
    persist, AcquireOutcome, ChunkEncoder, DestinationPicker, PersistOutcome, PipelineStatus,
    RecordingError, RecordingPipeline, RecordingRejection, RecordingSettings, RecordingSource,
    SaveJob,
};
use crate::application::session_registry::{ConnectionApprover, Resolution, SessionRegistry};
use crate::application::stream_screen::{ScreenStreamer, StreamSettings};
use crate::application::timers::{TimerName, TimerRegistry, TimerTick};
use crate::application::translate_input::{InputAutomation, InputError, InputTranslator};

/// How long shutdown waits for a stopped recording to finish saving.
pub const SHUTDOWN_SAVE_GRACE: Duration = Duration::from_secs(30);

/// Everything the agent reacts to.
pub enum AgentEvent {
    Channel(ChannelEvent),
    Timer(TimerTick),
    ApprovalDecided {
        client_id: String,
        accepted: bool,
    },
    FrameReady {
        generation: u64,
        result: Result<String, CaptureError>,
    },
    RecordingAcquired {
        recording_id: String,
        result: Result<Box<dyn ChunkEncoder>, RecordingError>,
    },
    RecordingSaveProgress {
        recording_id: String,
        current: u32,
        total: u32,
    },
    RecordingPersisted {
        recording_id: String,
        outcome: PersistOutcome,
    },
    /// The host operator drops the current controller.
    ManualDisconnect,
    /// Local shutdown (Ctrl+C).
    Shutdown,
}

impl fmt::Debug for AgentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentEvent::Channel(ev) => f.debug_tuple("Channel").field(ev).finish(),
            AgentEvent::Timer(tick) => f.debug_tuple("Timer").field(tick).finish(),
            AgentEvent::ApprovalDecided { accepted, .. } => f
                .debug_struct("ApprovalDecided")
                .field("accepted", accepted)
                .finish_non_exhaustive(),
            AgentEvent::FrameReady { generation, result } => f
                .debug_struct("FrameReady")
                .field("generation", generation)
                .field("ok", &result.is_ok())
                .finish(),
            AgentEvent::RecordingAcquired { result, .. } => f
                .debug_struct("RecordingAcquired")
                .field("ok", &result.is_ok())
                .finish_non_exhaustive(),
            AgentEvent::RecordingSaveProgress { current, total, .. } => f
                .debug_struct("RecordingSaveProgress")
                .field("current", current)
                .field("total", total)
                .finish_non_exhaustive(),
            AgentEvent::RecordingPersisted { outcome, .. } => f
                .debug_struct("RecordingPersisted")
                .field("outcome", outcome)
                .finish_non_exhaustive(),
            AgentEvent::ManualDisconnect => f.write_str("ManualDisconnect"),
            AgentEvent::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Whether the event loop keeps going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// External collaborators, injected at construction time.
pub struct AgentDeps {
    pub automation: Arc<dyn InputAutomation>,
    pub capture: Arc<dyn ScreenCapture>,
    pub recorder: Arc<dyn RecordingSource>,
    pub picker: Arc<dyn DestinationPicker>,
    pub approver: Arc<dyn ConnectionApprover>,
}

#[derive(Debug, Clone, Default)]
pub struct AgentSettings {
    pub handshake: HandshakeSettings,
    pub stream: StreamSettings,
    pub recording: RecordingSettings,
}

/// The connection lifecycle manager and message dispatcher.
pub struct HostAgent {
    lifecycle: ConnectionLifecycle,
    registry: SessionRegistry,
    translator: InputTranslator,
    streamer: ScreenStreamer,
    recording: RecordingPipeline,
    timers: TimerRegistry,
    capture: Arc<dyn ScreenCapture>,
    recorder: Arc<dyn RecordingSource>,
    picker: Arc<dyn DestinationPicker>,
    approver: Arc<dyn ConnectionApprover>,
    outbound: UnboundedSender<OutboundMessage>,
    events: UnboundedSender<AgentEvent>,
    /// Torn down, but a Stopping recording is still being written.
    draining: bool,
}

impl HostAgent {
    /// Creates the agent.
    ///
    /// `events` must be the sending half of the queue later passed to
    /// [`HostAgent::run`]; spawned work reports back through it.
    pub fn new(
        deps: AgentDeps,
        settings: AgentSettings,
        outbound: UnboundedSender<OutboundMessage>,
        events: UnboundedSender<AgentEvent>,
    ) -> Self {
        Self {
            lifecycle: ConnectionLifecycle::new(settings.handshake),
            registry: SessionRegistry::new(),
            translator: InputTranslator::new(deps.automation),
            streamer: ScreenStreamer::new(settings.stream),
            recording: RecordingPipeline::new(settings.recording),
            timers: TimerRegistry::new(events.clone()),
            capture: deps.capture,
            recorder: deps.recorder,
            picker: deps.picker,
            approver: deps.approver,
            outbound,
            events,
            draining: false,
        }
    }

    /// Processes events until the channel closes or shutdown is requested.
    pub async fn run(mut self, mut inbox: UnboundedReceiver<AgentEvent>) {
        info!("host agent started");
        while let Some(event) = inbox.recv().await {
            if self.handle(event) == Flow::Stop {
                break;
            }
        }
        info!("host agent stopped");
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn lifecycle(&self) -> &ConnectionLifecycle {
        &self.lifecycle
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn streamer(&self) -> &ScreenStreamer {
        &self.streamer
    }

    pub fn recording(&self) -> &RecordingPipeline {
        &self.recording
    }

    pub fn translator(&self) -> &InputTranslator {
        &self.translator
    }

    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Handles one event to completion.
    pub fn handle(&mut self, event: AgentEvent) -> Flow {
        if self.draining {
            return self.handle_while_draining(event);
        }
        match event {
            AgentEvent::Channel(ev) => return self.on_channel(ev),
            AgentEvent::Timer(tick) => self.on_timer(tick),
            AgentEvent::ApprovalDecided {
                client_id,
                accepted,
            } => self.on_approval(&client_id, accepted),
            AgentEvent::FrameReady { generation, result } => self.on_frame(generation, result),
            AgentEvent::RecordingAcquired {
                recording_id,
                result,
            } => self.on_recording_acquired(&recording_id, result),
            AgentEvent::RecordingSaveProgress {
                recording_id,
                current,
                total,
            } => {
                if let Some(status) = self.recording.on_save_progress(&recording_id, current, total)
                {
                    self.send(OutboundMessage::RecordingStatus(status));
                }
            }
            AgentEvent::RecordingPersisted {
                recording_id,
                outcome,
            } => self.on_persisted(&recording_id, outcome),
            AgentEvent::ManualDisconnect => self.manual_disconnect(),
            AgentEvent::Shutdown => {
                info!("shutdown requested");
                self.teardown();
                return self.stop_after_save();
            }
        }
        Flow::Continue
    }

    /// After teardown only the Stopping recording is still alive.  Its save
    /// results are handled; everything else is dropped.
    fn handle_while_draining(&mut self, event: AgentEvent) -> Flow {
        match event {
            AgentEvent::RecordingSaveProgress {
                recording_id,
                current,
                total,
            } => {
                if let Some(status) = self.recording.on_save_progress(&recording_id, current, total)
                {
                    self.send(OutboundMessage::RecordingStatus(status));
                }
            }
            AgentEvent::RecordingPersisted {
                recording_id,
                outcome,
            } => {
                self.on_persisted(&recording_id, outcome);
                if self.recording.status() != PipelineStatus::Stopping {
                    info!("recording saved; finishing shutdown");
                    self.draining = false;
                    return Flow::Stop;
                }
            }
            AgentEvent::RecordingAcquired {
                recording_id,
                result,
            } => self.on_recording_acquired(&recording_id, result),
            AgentEvent::Timer(tick) if tick.name == TimerName::ShutdownDeadline => {
                if self.timers.accept(tick) {
                    warn!("recording still saving after {SHUTDOWN_SAVE_GRACE:?}; giving up");
                    self.draining = false;
                    return Flow::Stop;
                }
            }
            AgentEvent::Shutdown => {
                warn!("second shutdown request; abandoning the recording save");
                self.timers.cancel_all();
                self.draining = false;
                return Flow::Stop;
            }
            other => debug!(event = ?other, "event ignored while a recording finishes saving"),
        }
        Flow::Continue
    }

    /// Stops right away unless a recording is mid-save, in which case the
    /// loop keeps running until it is persisted or the grace period ends.
    fn stop_after_save(&mut self) -> Flow {
        if self.recording.status() != PipelineStatus::Stopping {
            return Flow::Stop;
        }
        info!("waiting for the stopped recording to finish saving");
        self.draining = true;
        self.timers
            .arm_once(TimerName::ShutdownDeadline, SHUTDOWN_SAVE_GRACE);
        Flow::Continue
    }

    fn on_channel(&mut self, event: ChannelEvent) -> Flow {
        match event {
            ChannelEvent::Connected => {
                info!("relay connected");
                if self.lifecycle.on_connected() {
                    self.announce();
                }
                self.arm_heartbeat();
            }
            ChannelEvent::Reconnected => {
                info!("relay reconnected");
                if self.lifecycle.on_reconnected() {
                    self.announce();
                } else {
                    info!("pairing already acknowledged; not re-announcing");
                }
                self.arm_heartbeat();
            }
            ChannelEvent::Disconnected { reason } => {
                warn!("relay connection lost: {reason}");
                self.lifecycle.on_disconnected();
                self.timers.cancel(TimerName::Heartbeat);
                self.timers.cancel(TimerName::HandshakeRetry);
            }
            ChannelEvent::Closed { reason } => {
                info!("relay channel closed: {reason}");
                self.teardown();
                return self.stop_after_save();
            }
            ChannelEvent::Message(msg) => {
                debug!(event = msg.event_name(), "inbound message");
                self.dispatch(msg);
            }
        }
        Flow::Continue
    }

    fn dispatch(&mut self, msg: InboundMessage) {
        match msg {
            InboundMessage::HostReadyAck(ack) => {
                if self.lifecycle.on_acknowledged(&ack.session_code) {
                    info!("relay acknowledged host; session code received");
                }
                self.timers.cancel(TimerName::HandshakeRetry);
            }
            InboundMessage::ConnectionRequest(req) => self.request_connection(req.client_id),
            InboundMessage::ControllerConnected(c) => {
                if self.registry.authorize(&c.controller_id) {
                    info!(controller = %c.controller_id, "relay confirmed controller");
                } else {
                    warn!(controller = %c.controller_id, "controller-connected for an unapproved controller; ignored");
                }
            }
            InboundMessage::ControllerDisconnected => {
                self.release_controller("controller disconnected");
            }
            InboundMessage::RequestScreen(r) => self.start_stream(&r.from),
            InboundMessage::RemoteMouseMove(req) => {
                self.apply_input("remote-mouse-move", req.from.as_deref(), |t| {
                    t.handle_move(&req).map(drop)
                });
            }
            InboundMessage::RemoteMouseClick(req) => {
                self.apply_input("remote-mouse-click", req.from.as_deref(), |t| {
                    t.handle_click(&req).map(drop)
                });
            }
            InboundMessage::RemoteMouseScroll(req) => {
                self.apply_input("remote-mouse-scroll", req.from.as_deref(), |t| {
                    t.handle_scroll(&req).map(drop)
                });
            }
            InboundMessage::RemoteKeyEvent(req) => {
                self.apply_input("remote-key-event", req.from.as_deref(), |t| {
                    t.handle_key(&req).map(drop)
                });
            }
            InboundMessage::StartScreenRecording(r) => self.start_recording(&r.from),
            InboundMessage::StopScreenRecording(r) => self.stop_recording(&r.from),
            InboundMessage::ClientDisconnectRequest(r) => self.client_disconnect(&r.from),
        }
    }

    fn on_timer(&mut self, tick: TimerTick) {
        if !self.timers.accept(tick) {
            debug!(timer = ?tick.name, "stale tick dropped");
            return;
        }
        match tick.name {
            TimerName::Heartbeat => {
                if self.lifecycle.is_connected() {
                    self.send(OutboundMessage::KeepAlive);
                }
            }
            TimerName::HandshakeRetry => {
                if self.lifecycle.retry_due() {
                    info!("no acknowledgment from relay; re-sending host-ready");
                    self.send(OutboundMessage::HostReady(self.lifecycle.announcement()));
                }
            }
            TimerName::StreamTick => self.request_frame(),
            TimerName::RecordingProgress => {
                if let Some(status) = self.recording.progress() {
                    self.send(OutboundMessage::RecordingStatus(status));
                }
            }
            TimerName::ShutdownDeadline => {}
        }
    }

    // ── Connection lifecycle ──────────────────────────────────────────────────

    fn announce(&mut self) {
        self.send(OutboundMessage::HostReady(self.lifecycle.announcement()));
        let retry_after = self.lifecycle.settings().retry_after;
        self.timers.arm_once(TimerName::HandshakeRetry, retry_after);
    }

    fn arm_heartbeat(&mut self) {
        let period = self.lifecycle.settings().heartbeat_interval;
        self.timers.arm_repeating(TimerName::Heartbeat, period);
    }

    /// Terminal teardown: every timer, the controller, pending requests, the
    /// stream, and any recording that has not reached Stopping.
    fn teardown(&mut self) {
        info!("tearing down host session");
        self.timers.cancel_all();
        self.lifecycle.on_closed();
        match self.registry.clear() {
            Some(owner) => self.drop_controller_resources(&owner),
            None => self.stop_stream(),
        }
        self.translator.reset();
    }

    // ── Session registry ──────────────────────────────────────────────────────

    fn request_connection(&mut self, client_id: String) {
        if !self.registry.begin_request(&client_id) {
            debug!(client = %client_id, "connection request already pending");
            return;
        }
        info!(client = %client_id, "connection request; asking approver");
        let approver = Arc::clone(&self.approver);
        let events = self.events.clone();
        tokio::spawn(async move {
            let accepted = approver.approve(&client_id).await;
            let _ = events.send(AgentEvent::ApprovalDecided {
                client_id,
                accepted,
            });
        });
    }

    fn on_approval(&mut self, client_id: &str, accepted: bool) {
        if accepted && !self.lifecycle.is_connected() {
            warn!(client = %client_id, "approval arrived while the relay is down; request dropped");
            self.registry.resolve(client_id, false);
            return;
        }
        match self.registry.resolve(client_id, accepted) {
            Resolution::NotPending => {
                debug!(client = %client_id, "decision for a request that is no longer pending");
            }
            Resolution::Rejected => {
                info!(client = %client_id, "connection rejected");
                self.send(OutboundMessage::ConnectionResponse(ConnectionResponse {
                    client_id: client_id.to_string(),
                    accepted: false,
                }));
            }
            Resolution::Accepted { superseded } => {
                if let Some(previous) = superseded {
                    info!(previous = %previous, "superseding previous controller");
                    self.send(OutboundMessage::DisconnectClient(DisconnectClient {
                        client_id: previous.clone(),
                    }));
                    self.drop_controller_resources(&previous);
                }
                info!(client = %client_id, "controller accepted");
                self.send(OutboundMessage::ConnectionResponse(ConnectionResponse {
                    client_id: client_id.to_string(),
                    accepted: true,
                }));
            }
        }
    }

    fn release_controller(&mut self, reason: &str) {
        match self.registry.release() {
            Some(previous) => {
                info!(controller = %previous, "controller released: {reason}");
                self.drop_controller_resources(&previous);
            }
            None => {
                debug!("no controller to release: {reason}");
                self.stop_stream();
            }
        }
    }

    /// Stops everything tied to a controller that just lost authorization.
    fn drop_controller_resources(&mut self, previous: &str) {
        self.stop_stream();
        if self.recording.cancel_for_owner(previous) {
            self.timers.cancel(TimerName::RecordingProgress);
            info!("recording cancelled: owner released");
            self.send(OutboundMessage::RecordingStatus(RecordingStatus::plain(
                previous,
                RecordingStatusKind::Cancelled,
            )));
        }
        self.translator.reset();
    }

    fn manual_disconnect(&mut self) {
        match self.registry.controller().map(str::to_string) {
            Some(client_id) => {
                info!(controller = %client_id, "operator disconnected controller");
                self.send(OutboundMessage::DisconnectClient(DisconnectClient { client_id }));
                self.release_controller("manual disconnect");
            }
            None => info!("no controller connected to disconnect"),
        }
    }

    fn client_disconnect(&mut self, from: &str) {
        if let Err(e) = self.registry.check_sender(Some(from)) {
            warn!("client-disconnect-request rejected: {e}");
            self.reject(Some(from), "client-disconnect-request", e.to_string());
            return;
        }
        self.release_controller("controller requested disconnect");
        self.send(OutboundMessage::HostDisconnectAck(HostDisconnectAck {
            to: from.to_string(),
        }));
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    fn apply_input<F>(&mut self, event: &'static str, from: Option<&str>, apply: F)
    where
        F: FnOnce(&mut InputTranslator) -> Result<(), InputError>,
    {
        if let Err(e) = self.registry.check_sender(from) {
            warn!(event, "input rejected: {e}");
            self.reject(from, event, e.to_string());
            return;
        }
        if let Err(e) = apply(&mut self.translator) {
            warn!(event, "input not applied: {e}");
            let to = from
                .map(str::to_string)
                .or_else(|| self.registry.controller().map(str::to_string));
            self.reject(to.as_deref(), event, e.to_string());
        }
    }

    // ── Streaming ─────────────────────────────────────────────────────────────

    fn start_stream(&mut self, viewer: &str) {
        if let Err(e) = self.registry.check_sender(Some(viewer)) {
            warn!("request-screen rejected: {e}");
            self.reject(Some(viewer), "request-screen", e.to_string());
            return;
        }
        self.stop_stream();
        self.streamer.start(viewer);
        info!("screen streaming started");
        self.request_frame();
        let interval = self.streamer.settings().interval;
        self.timers.arm_repeating(TimerName::StreamTick, interval);
    }

    fn stop_stream(&mut self) {
        self.timers.cancel(TimerName::StreamTick);
        if self.streamer.stop().is_some() {
            info!("screen streaming stopped");
        }
    }

    fn request_frame(&mut self) {
        let Some(generation) = self.streamer.begin_capture() else {
            debug!("no capture started (idle or previous capture still running)");
            return;
        };
        let capture = Arc::clone(&self.capture);
        let settings = *self.streamer.settings();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = match capture.capture(settings.bounds).await {
                Ok(raw) => ScreenFrame::encode_blocking(raw, settings.bounds, settings.jpeg_quality)
                    .await
                    .map(|frame| frame.to_data_url()),
                Err(e) => Err(e),
            };
            let _ = events.send(AgentEvent::FrameReady { generation, result });
        });
    }

    fn on_frame(&mut self, generation: u64, result: Result<String, CaptureError>) {
        match self.streamer.finish_capture(generation, result) {
            Ok(Some(data)) => {
                if self.registry.authorize(&data.to) {
                    self.send(OutboundMessage::ScreenData(data));
                } else {
                    debug!("viewer no longer authorized; frame dropped");
                }
            }
            Ok(None) => debug!("frame from a stopped stream dropped"),
            Err(e) => warn!("screen capture failed: {e}"),
        }
    }

    // ── Recording ─────────────────────────────────────────────────────────────

    fn start_recording(&mut self, from: &str) {
        if let Err(e) = self.registry.check_sender(Some(from)) {
            warn!("start-screen-recording rejected: {e}");
            self.send_recording_error(from, RecordingRejection::NotAuthorized.to_string());
            return;
        }
        let recording_id = match self.recording.start(from) {
            Ok(id) => id,
            Err(rejection) => {
                warn!("start-screen-recording rejected: {rejection}");
                self.send_recording_error(from, rejection.to_string());
                return;
            }
        };
        info!(recording = %recording_id, "recording initializing");
        self.send(OutboundMessage::RecordingStatus(RecordingStatus::plain(
            from,
            RecordingStatusKind::Initializing,
        )));

        let recorder = Arc::clone(&self.recorder);
        let chunk_duration = self.recording.settings().chunk_duration;
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = recorder.acquire(chunk_duration).await;
            let _ = events.send(AgentEvent::RecordingAcquired {
                recording_id,
                result,
            });
        });
    }

    fn on_recording_acquired(
        &mut self,
        recording_id: &str,
        result: Result<Box<dyn ChunkEncoder>, RecordingError>,
    ) {
        match self.recording.on_acquired(recording_id, result) {
            AcquireOutcome::Started { owner } => {
                if !self.registry.authorize(&owner) {
                    self.recording.cancel_for_owner(&owner);
                    info!("recording cancelled: owner no longer authorized");
                    self.send(OutboundMessage::RecordingStatus(RecordingStatus::plain(
                        owner,
                        RecordingStatusKind::Cancelled,
                    )));
                    return;
                }
                info!(recording = %recording_id, "recording started");
                self.send(OutboundMessage::RecordingStatus(RecordingStatus::plain(
                    owner,
                    RecordingStatusKind::Recording,
                )));
                let period = self.recording.settings().progress_interval;
                self.timers
                    .arm_repeating(TimerName::RecordingProgress, period);
            }
            AcquireOutcome::Failed { owner, reason } => {
                warn!("recording failed to start: {reason}");
                self.send_recording_error(&owner, reason);
            }
            AcquireOutcome::Stale(encoder) => {
                debug!("capture source acquired for a cancelled recording; releasing");
                if let Some(mut encoder) = encoder {
                    encoder.release();
                }
            }
        }
    }

    fn stop_recording(&mut self, from: &str) {
        let job = match self.recording.stop(from) {
            Ok(job) => job,
            Err(rejection) => {
                warn!("stop-screen-recording rejected: {rejection}");
                self.send_recording_error(from, rejection.to_string());
                return;
            }
        };
        info!(recording = %job.recording_id, "recording stopping");
        self.timers.cancel(TimerName::RecordingProgress);
        self.send(OutboundMessage::RecordingStatus(RecordingStatus::plain(
            from,
            RecordingStatusKind::Stopping,
        )));
        self.spawn_persist(job);
    }

    fn spawn_persist(&self, job: SaveJob) {
        let picker = Arc::clone(&self.picker);
        let events = self.events.clone();
        tokio::spawn(async move {
            let recording_id = job.recording_id.clone();
            let progress_events = events.clone();
            let progress_id = recording_id.clone();
            let outcome = persist(job, picker.as_ref(), move |current, total| {
                let _ = progress_events.send(AgentEvent::RecordingSaveProgress {
                    recording_id: progress_id.clone(),
                    current,
                    total,
                });
            })
            .await;
            let _ = events.send(AgentEvent::RecordingPersisted {
                recording_id,
                outcome,
            });
        });
    }

    fn on_persisted(&mut self, recording_id: &str, outcome: PersistOutcome) {
        match &outcome {
            PersistOutcome::Saved { path, file_size } => {
                info!(path = %path.display(), file_size, "recording saved");
            }
            PersistOutcome::Cancelled => info!("recording discarded: no destination chosen"),
            PersistOutcome::Failed(reason) => warn!("recording could not be saved: {reason}"),
        }
        match self.recording.on_persisted(recording_id, outcome) {
            Some(msg) => self.send(msg),
            None => debug!("persist result for an unknown recording dropped"),
        }
    }

    // ── Outbound ──────────────────────────────────────────────────────────────

    fn send(&self, msg: OutboundMessage) {
        debug!(event = msg.event_name(), "outbound message");
        if self.outbound.send(msg).is_err() {
            debug!("relay adapter gone; message dropped");
        }
    }

    fn reject(&self, to: Option<&str>, event: &str, reason: String) {
        self.send(OutboundMessage::RequestRejected(RequestRejected {
            to: to.map(str::to_string),
            event: event.to_string(),
            reason,
        }));
    }

    fn send_recording_error(&self, to: &str, reason: String) {
        self.send(OutboundMessage::RecordingStatus(RecordingStatus::failed(
            to, reason,
        )));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
