//! Wire data model for the metadata endpoint.

use serde::{Deserialize, Serialize};

/// One downloadable variant of a video, identified by a service-assigned id.
///
/// Video variants carry `resolution`/`height`/`fps`; the audio-only variant
/// carries `abr`/`acodec`. Everything beyond the identifying fields is
/// optional on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Format {
    /// Service-assigned identifier, unique within one metadata response.
    pub format_id: String,
    /// Container/file extension (`mp4`, `m4a`, ...).
    pub ext: String,
    /// Resolution label for video variants (e.g. `1920x1080`).
    #[serde(default)]
    pub resolution: Option<String>,
    /// Pixel height for video variants.
    #[serde(default)]
    pub height: Option<u32>,
    /// Frames per second for video variants.
    #[serde(default)]
    pub fps: Option<f64>,
    /// Size in bytes when the service knows it.
    #[serde(default)]
    pub filesize: Option<u64>,
    /// Audio bitrate in kbps for the audio variant.
    #[serde(default)]
    pub abr: Option<f64>,
    /// Audio codec name for the audio variant.
    #[serde(default)]
    pub acodec: Option<String>,
}

/// Descriptive metadata and downloadable variants for one video.
///
/// Owned by the caller once returned; the client keeps nothing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VideoMetadata {
    pub title: String,
    /// Thumbnail image URL.
    pub thumbnail: String,
    pub channel: String,
    /// Pre-rendered duration (`12:34`).
    pub duration_string: String,
    /// Duration in seconds, when reported.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Upload date in `YYYYMMDD` form.
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
    /// Watch-page URL as reported by the service.
    #[serde(default)]
    pub original_url: Option<String>,
    /// Progressive video variants (video and audio in one container).
    #[serde(default)]
    pub video_formats: Vec<Format>,
    /// Highest-bitrate audio-only variant, when one exists.
    #[serde(default)]
    pub best_audio: Option<Format>,
}

impl VideoMetadata {
    /// Looks a format id up across the video variants and the audio
    /// variant.
    ///
    /// Download dispatch must only reference ids present in the most
    /// recently fetched metadata; unknown ids return `None`.
    #[must_use]
    pub fn find_format(&self, format_id: &str) -> Option<&Format> {
        self.video_formats
            .iter()
            .find(|format| format.format_id == format_id)
            .or_else(|| {
                self.best_audio
                    .as_ref()
                    .filter(|audio| audio.format_id == format_id)
            })
    }

    /// Whether the response carries anything downloadable.
    #[must_use]
    pub fn has_downloads(&self) -> bool {
        !self.video_formats.is_empty() || self.best_audio.is_some()
    }
}
