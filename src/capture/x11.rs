// # X11 Region Capture
//
// Linux X11 region capture through ffmpeg's `x11grab` input: one frame of
// the requested rectangle is written to a temporary PNG and decoded.
// Wayland sessions do not expose x11grab; they are rejected up front.

use std::process::{Command, Stdio};

use image::RgbaImage;
use tracing::debug;

use crate::core::Region;
use crate::error::{ScanError, ScanResult};

/// Returns true if XDG_SESSION_TYPE indicates 'wayland'.
pub fn is_wayland_session() -> bool {
    std::env::var("XDG_SESSION_TYPE")
        .map(|v| v.eq_ignore_ascii_case("wayland"))
        .unwrap_or(false)
}

/// ffmpeg arguments grabbing one frame of `region` from `display` into `output`.
pub fn x11grab_args(display: &str, region: Region, output: &str) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "x11grab".to_string(),
        "-video_size".to_string(),
        format!("{}x{}", region.width, region.height),
        "-i".to_string(),
        format!("{}.0+{},{}", display, region.left, region.top),
        "-frames:v".to_string(),
        "1".to_string(),
        output.to_string(),
    ]
}

/// Grab `region` from the X11 display named by `$DISPLAY`.
pub fn capture_region_x11(region: Region) -> ScanResult<RgbaImage> {
    if region.is_empty() {
        return Err(ScanError::capture("capture region has zero size"));
    }
    if is_wayland_session() {
        return Err(ScanError::capture("x11grab is unavailable in a Wayland session")
            .with_recovery_suggestion("Log into an X11 session to drive the app"));
    }

    let display = std::env::var("DISPLAY").unwrap_or(":0".to_string());
    let tmp = tempfile::Builder::new()
        .prefix("friendscan-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| ScanError::io("create capture temp file", e))?;
    let output = tmp.path().to_string_lossy().into_owned();

    let display_name = &display;
    debug!(display = %display_name, ?region, "capturing region via x11grab");
    let result = Command::new("ffmpeg")
        .args(x11grab_args(&display, region, &output))
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            ScanError::capture(format!("failed to start ffmpeg: {}", e))
                .with_recovery_suggestion("Install ffmpeg and make sure it is on PATH")
        })?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(ScanError::capture(format!(
            "ffmpeg exited with status {}: {}",
            result.status,
            stderr.trim()
        )));
    }

    let image = image::open(tmp.path())
        .map_err(|e| ScanError::capture(format!("cannot decode captured frame: {}", e)))?;
    Ok(image.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x11grab_args() {
        let args = x11grab_args(":1", Region::new(40, 120, 260, 700), "/tmp/out.png");
        let joined = args.join(" ");
        assert!(joined.contains("-f x11grab"));
        assert!(joined.contains("-video_size 260x700"));
        assert!(joined.contains("-i :1.0+40,120"));
        assert!(joined.ends_with("-frames:v 1 /tmp/out.png"));
    }
}
