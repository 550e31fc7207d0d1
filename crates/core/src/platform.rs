//! Source platform detection.
//!
//! Several stages behave differently depending on where a URL points:
//! the extractor derives fallback thumbnails and titles, and the artwork
//! resolver picks a candidate chain. Both go through this module so the
//! host rules live in one place.

use url::Url;

/// Hosts that serve YouTube pages.
const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "youtu.be", "youtube-nocookie.com"];

/// Hosts that serve YouTube thumbnails.
const YOUTUBE_IMAGE_HOSTS: &[&str] = &["ytimg.com"];

/// Hosts that serve SoundCloud pages.
const SOUNDCLOUD_HOSTS: &[&str] = &["soundcloud.com"];

/// Hosts that serve SoundCloud artwork.
const SOUNDCLOUD_IMAGE_HOSTS: &[&str] = &["sndcdn.com"];

/// Base URL for deterministic YouTube thumbnails.
pub const YOUTUBE_THUMBNAIL_BASE: &str = "https://i.ytimg.com/vi";

/// Platform a URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    YouTube,
    SoundCloud,
    Other,
}

impl Platform {
    /// Classifies a page or image URL.
    pub fn of(url: &str) -> Self {
        let Some(host) = host_of(url) else {
            return Self::Other;
        };

        if host_matches(&host, YOUTUBE_HOSTS) || host_matches(&host, YOUTUBE_IMAGE_HOSTS) {
            Self::YouTube
        } else if host_matches(&host, SOUNDCLOUD_HOSTS)
            || host_matches(&host, SOUNDCLOUD_IMAGE_HOSTS)
        {
            Self::SoundCloud
        } else {
            Self::Other
        }
    }
}

/// Lowercased host of a URL, if it parses.
fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

fn host_matches(host: &str, domains: &[&str]) -> bool {
    domains
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
}

/// Whether the URL points at a SoundCloud artwork image.
pub fn is_soundcloud_image(url: &str) -> bool {
    host_of(url).is_some_and(|h| host_matches(&h, SOUNDCLOUD_IMAGE_HOSTS))
}

/// Extracts the YouTube video id from a page or thumbnail URL.
///
/// Understands `watch?v=`, `youtu.be/<id>`, `/shorts/<id>`, `/embed/<id>`,
/// `/live/<id>` and `i.ytimg.com/vi/<id>/...`.
pub fn youtube_video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();

    let candidate = if host_matches(&host, YOUTUBE_IMAGE_HOSTS) {
        let mut segments = parsed.path_segments()?;
        match segments.next()? {
            "vi" | "vi_webp" => segments.next().map(str::to_string),
            _ => None,
        }
    } else if host == "youtu.be" || host.ends_with(".youtu.be") {
        parsed.path_segments()?.next().map(str::to_string)
    } else if host_matches(&host, YOUTUBE_HOSTS) {
        if let Some((_, v)) = parsed.query_pairs().find(|(k, _)| k == "v") {
            Some(v.into_owned())
        } else {
            let segments: Vec<&str> = parsed.path_segments()?.collect();
            match segments.as_slice() {
                ["shorts" | "embed" | "live" | "v", id, ..] => Some(id.to_string()),
                _ => None,
            }
        }
    } else {
        None
    };

    candidate.filter(|id| is_valid_youtube_id(id))
}

fn is_valid_youtube_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// The always-available thumbnail for a YouTube video id.
pub fn youtube_fallback_thumbnail(video_id: &str) -> String {
    format!("{}/{}/hqdefault.jpg", YOUTUBE_THUMBNAIL_BASE, video_id)
}

/// Whether the URL is one of the low-resolution YouTube tiers that carry
/// letterbox bars.
pub fn is_letterboxed_youtube_thumbnail(url: &str) -> bool {
    if Platform::of(url) != Platform::YouTube {
        return false;
    }
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    parsed
        .path_segments()
        .and_then(|mut s| s.next_back())
        .is_some_and(|file| {
            let stem = file.split('.').next().unwrap_or_default();
            matches!(stem, "sddefault" | "hqdefault" | "mqdefault" | "0")
        })
}

/// Derives `(artist, title)` from a SoundCloud track URL of the form
/// `soundcloud.com/<artist>/<track>`.
pub fn soundcloud_tags_from_url(url: &str) -> Option<(String, String)> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    if !host_matches(&host, SOUNDCLOUD_HOSTS) {
        return None;
    }

    let segments: Vec<&str> = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .collect();
    match segments.as_slice() {
        [artist, track] if *track != "sets" && *track != "tracks" => {
            Some((humanize_slug(artist), humanize_slug(track)))
        }
        _ => None,
    }
}

/// `"daft-punk"` -> `"Daft Punk"`.
fn humanize_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
