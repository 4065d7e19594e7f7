//! Destination picker for finished recordings.
//!
//! Stands in for a save dialog: with an output directory configured every
//! recording is saved there as `screen-recording-<id>.mjpeg`; without one
//! the picker declines and the recording is discarded.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::warn;

use crate::application::record_screen::DestinationPicker;

pub struct DirectoryPicker {
    output_dir: Option<PathBuf>,
}

impl DirectoryPicker {
    pub fn new(output_dir: Option<PathBuf>) -> Self {
        Self { output_dir }
    }

    pub fn file_name(recording_id: &str) -> String {
        format!("screen-recording-{recording_id}.mjpeg")
    }
}

#[async_trait]
impl DestinationPicker for DirectoryPicker {
    async fn choose(&self, recording_id: &str) -> Option<PathBuf> {
        let dir = self.output_dir.as_ref()?;
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!(dir = %dir.display(), "cannot create recordings directory: {e}");
            return None;
        }
        Some(dir.join(Self::file_name(recording_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_without_directory_declines() {
        assert_eq!(DirectoryPicker::new(None).choose("r1").await, None);
    }

    #[tokio::test]
    async fn test_creates_directory_and_names_file_after_recording() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("deskrelay_rec_{}", Uuid::new_v4()));
        let picker = DirectoryPicker::new(Some(dir.clone()));

        // Act
        let path = picker.choose("abc").await.unwrap();

        // Assert
        assert!(dir.is_dir());
        assert_eq!(path, dir.join("screen-recording-abc.mjpeg"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
