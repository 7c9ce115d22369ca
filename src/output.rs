//! Human-readable rendering of retrieved metadata.
//!
//! Formatting rules follow the service's own presentation: 1024-based file
//! sizes with one decimal, compact `K`/`M` view counts, and `YYYYMMDD`
//! upload dates rendered as `DD/MM/YYYY`.

use std::fmt::Write as _;

use crate::info::{Format, VideoMetadata};

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Formats a byte count with 1024-based units and one decimal place.
///
/// Missing or zero sizes render as `size unknown`.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn human_file_size(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes.filter(|bytes| *bytes > 0) else {
        return "size unknown".to_string();
    };

    let exponent = ((bytes as f64).log(1024.0).floor() as usize).min(SIZE_UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    format!("{value:.1} {}", SIZE_UNITS[exponent])
}

/// Formats a view count compactly (`1.4M views`, `12.5K views`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn human_view_count(count: Option<u64>) -> Option<String> {
    let count = count.filter(|count| *count > 0)?;
    let text = if count >= 1_000_000 {
        format!("{:.1}M views", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K views", count as f64 / 1_000.0)
    } else {
        format!("{count} views")
    };
    Some(text)
}

/// Reformats a `YYYYMMDD` upload date as `DD/MM/YYYY`.
///
/// Inputs that do not match the expected shape are returned unchanged.
#[must_use]
pub fn human_upload_date(date: &str) -> String {
    if date.len() == 8 && date.bytes().all(|byte| byte.is_ascii_digit()) {
        format!("{}/{}/{}", &date[6..8], &date[4..6], &date[0..4])
    } else {
        date.to_string()
    }
}

/// Label identifying a video variant: resolution, else `{height}p`, else
/// `N/A`.
#[must_use]
pub fn format_label(format: &Format) -> String {
    match (&format.resolution, format.height) {
        (Some(resolution), _) => resolution.clone(),
        (None, Some(height)) => format!("{height}p"),
        (None, None) => "N/A".to_string(),
    }
}

/// Renders the metadata card shown after a successful retrieval.
#[must_use]
pub fn render_card(metadata: &VideoMetadata) -> String {
    let mut card = String::new();

    let _ = writeln!(card, "{}", metadata.title);
    let _ = writeln!(card, "  channel:  {}", metadata.channel);
    let _ = writeln!(card, "  duration: {}", metadata.duration_string);
    if let Some(views) = human_view_count(metadata.view_count) {
        let _ = writeln!(card, "  views:    {views}");
    }
    if let Some(upload_date) = &metadata.upload_date {
        let _ = writeln!(card, "  uploaded: {}", human_upload_date(upload_date));
    }
    let _ = writeln!(card, "  thumbnail: {}", metadata.thumbnail);

    if let Some(audio) = &metadata.best_audio {
        let _ = writeln!(card, "\nBest audio:");
        let mut line = format!(
            "  [{}] {} ({})",
            audio.format_id,
            audio.ext.to_uppercase(),
            human_file_size(audio.filesize)
        );
        if let Some(abr) = audio.abr {
            let _ = write!(line, " {abr:.0} kbps");
        }
        if let Some(acodec) = &audio.acodec {
            let _ = write!(line, " {acodec}");
        }
        let _ = writeln!(card, "{line}");
    }

    if metadata.video_formats.is_empty() && metadata.best_audio.is_none() {
        let _ = writeln!(card, "\nNo downloadable formats for this video.");
        return card;
    }

    if !metadata.video_formats.is_empty() {
        let _ = writeln!(card, "\nVideo formats ({}):", metadata.video_formats.len());
        for format in &metadata.video_formats {
            let mut line = format!(
                "  [{}] {} {} ({})",
                format.format_id,
                format_label(format),
                format.ext.to_uppercase(),
                human_file_size(format.filesize)
            );
            if let Some(fps) = format.fps {
                let _ = write!(line, " {fps:.0} fps");
            }
            let _ = writeln!(card, "{line}");
        }
    }

    card
}
