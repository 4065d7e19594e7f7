//! ScreenStreamer: state of the periodic capture-and-send loop.
//!
//! The streamer only tracks *who* is watching and *which* capture is in
//! flight.  The agent owns the tick timer and spawns the captures; a capture
//! result comes back tagged with the stream generation it was started for, so
//! results from a stopped or restarted stream are dropped.

use std::time::Duration;

use deskrelay_core::{protocol::messages::ScreenData, ScreenSize};

use crate::application::frame::CaptureError;

/// Streaming parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    pub interval: Duration,
    pub bounds: ScreenSize,
    pub jpeg_quality: u8,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            bounds: ScreenSize::new(960, 720),
            jpeg_quality: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Streaming { viewer: String, generation: u64 },
}

/// Tracks the single screen stream.
#[derive(Debug)]
pub struct ScreenStreamer {
    settings: StreamSettings,
    state: StreamState,
    next_generation: u64,
    in_flight: Option<u64>,
}

impl ScreenStreamer {
    pub fn new(settings: StreamSettings) -> Self {
        Self {
            settings,
            state: StreamState::Idle,
            next_generation: 0,
            in_flight: None,
        }
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    pub fn viewer(&self) -> Option<&str> {
        match &self.state {
            StreamState::Streaming { viewer, .. } => Some(viewer),
            StreamState::Idle => None,
        }
    }

    /// Starts (or restarts) streaming to `viewer` and returns the new
    /// generation.  Any capture still running for an older generation will be
    /// discarded when it completes.
    pub fn start(&mut self, viewer: &str) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.state = StreamState::Streaming {
            viewer: viewer.to_string(),
            generation,
        };
        self.in_flight = None;
        generation
    }

    /// Claims the capture slot for the current stream.
    ///
    /// Returns the generation to tag the capture with, or `None` when idle or
    /// when a capture is already running (the tick is skipped).
    pub fn begin_capture(&mut self) -> Option<u64> {
        let StreamState::Streaming { generation, .. } = self.state else {
            return None;
        };
        if self.in_flight.is_some() {
            return None;
        }
        self.in_flight = Some(generation);
        Some(generation)
    }

    /// Consumes a capture result.
    ///
    /// Returns the message to send if the result belongs to the current
    /// stream and the capture succeeded.  Failures are returned as `Err` for
    /// logging; they never stop the stream.
    pub fn finish_capture(
        &mut self,
        generation: u64,
        result: Result<String, CaptureError>,
    ) -> Result<Option<ScreenData>, CaptureError> {
        if self.in_flight == Some(generation) {
            self.in_flight = None;
        }
        let StreamState::Streaming {
            viewer,
            generation: current,
        } = &self.state
        else {
            return Ok(None);
        };
        if *current != generation {
            return Ok(None);
        }
        let image_data = result?;
        Ok(Some(ScreenData {
            to: viewer.clone(),
            image_data,
        }))
    }

    /// Stops streaming.  Returns the viewer that was being served.
    pub fn stop(&mut self) -> Option<String> {
        self.in_flight = None;
        match std::mem::replace(&mut self.state, StreamState::Idle) {
            StreamState::Streaming { viewer, .. } => Some(viewer),
            StreamState::Idle => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_frame() -> Result<String, CaptureError> {
        Ok("data:image/jpeg;base64,AAAA".to_string())
    }

    #[test]
    fn test_idle_streamer_does_not_capture() {
        let mut streamer = ScreenStreamer::new(StreamSettings::default());
        assert_eq!(streamer.begin_capture(), None);
    }

    #[test]
    fn test_capture_result_is_addressed_to_viewer() {
        // Arrange
        let mut streamer = ScreenStreamer::new(StreamSettings::default());
        streamer.start("c1");
        let generation = streamer.begin_capture().unwrap();

        // Act
        let data = streamer.finish_capture(generation, ok_frame()).unwrap();

        // Assert
        assert_eq!(data.map(|d| d.to), Some("c1".to_string()));
    }

    #[test]
    fn test_second_capture_skipped_while_one_in_flight() {
        let mut streamer = ScreenStreamer::new(StreamSettings::default());
        streamer.start("c1");
        let first = streamer.begin_capture();
        assert!(first.is_some());
        assert_eq!(streamer.begin_capture(), None);

        streamer.finish_capture(first.unwrap(), ok_frame()).unwrap();
        assert!(streamer.begin_capture().is_some());
    }

    #[test]
    fn test_result_from_previous_generation_is_dropped() {
        let mut streamer = ScreenStreamer::new(StreamSettings::default());
        streamer.start("c1");
        let old = streamer.begin_capture().unwrap();
        streamer.start("c1");

        let data = streamer.finish_capture(old, ok_frame()).unwrap();

        assert!(data.is_none());
        // The restarted stream can capture immediately.
        assert!(streamer.begin_capture().is_some());
    }

    #[test]
    fn test_result_after_stop_is_dropped() {
        let mut streamer = ScreenStreamer::new(StreamSettings::default());
        streamer.start("c1");
        let generation = streamer.begin_capture().unwrap();
        assert_eq!(streamer.stop(), Some("c1".to_string()));

        assert!(streamer.finish_capture(generation, ok_frame()).unwrap().is_none());
        assert_eq!(streamer.state(), &StreamState::Idle);
    }

    #[test]
    fn test_capture_failure_keeps_stream_running() {
        let mut streamer = ScreenStreamer::new(StreamSettings::default());
        streamer.start("c1");
        let generation = streamer.begin_capture().unwrap();

        let result = streamer.finish_capture(
            generation,
            Err(CaptureError::Unavailable("display asleep".to_string())),
        );

        assert!(result.is_err());
        assert_eq!(streamer.viewer(), Some("c1"));
        assert!(streamer.begin_capture().is_some());
    }
}
