//! Progress scraping for extraction output.
//!
//! yt-dlp reports download progress only as free text. Everything that knows
//! the shape of that text lives behind `ProgressParser`, so a tool that emits
//! structured progress only needs a new implementation of this trait.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static DOWNLOAD_PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)%").unwrap());

/// Turns one line of tool output into a progress percentage.
pub trait ProgressParser: Send + Sync {
    /// Returns the percentage (0-100) reported by `line`, if any.
    fn parse(&self, line: &str) -> Option<f32>;
}

/// Parser for yt-dlp `--newline` output.
///
/// Recognises lines like `[download]  45.2% of 10.00MiB at 1.00MiB/s ETA 00:05`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YtDlpProgressParser;

impl ProgressParser for YtDlpProgressParser {
    fn parse(&self, line: &str) -> Option<f32> {
        let caps = DOWNLOAD_PERCENT.captures(line)?;
        let percent = caps.get(1)?.as_str().parse::<f32>().ok()?;
        Some(percent.clamp(0.0, 100.0))
    }
}
