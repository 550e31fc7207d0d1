//! Ordered artwork candidate chains.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::platform::{self, YOUTUBE_THUMBNAIL_BASE};

use super::types::ArtworkCandidate;

/// SoundCloud artwork size suffix, e.g. `-large.jpg` or `-t500x500.png`.
static SOUNDCLOUD_SIZE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-(?:large|original|crop|small|badge|tiny|mini|t\d+x\d+)\.([A-Za-z0-9]+)(\?.*)?$")
        .unwrap()
});

/// SoundCloud sizes to try, best first.
const SOUNDCLOUD_SIZES: &[&str] = &["original", "t500x500", "t300x300"];

/// YouTube thumbnail tiers, best first, with their legacy flag.
const YOUTUBE_TIERS: &[(&str, bool)] = &[
    ("maxresdefault.jpg", false),
    ("sddefault.jpg", true),
    ("hqdefault.jpg", true),
];

/// Builds the ordered list of remote images to try for a media item.
///
/// YouTube items get the thumbnail tier ladder, SoundCloud artwork gets its
/// size ladder, and the literal thumbnail URL is always the last resort.
pub fn candidate_chain(source_url: &str, thumbnail_url: Option<&str>) -> Vec<ArtworkCandidate> {
    let mut chain = Vec::new();

    let video_id = platform::youtube_video_id(source_url)
        .or_else(|| thumbnail_url.and_then(platform::youtube_video_id));

    if let Some(id) = video_id {
        for (file, legacy) in YOUTUBE_TIERS {
            push_unique(
                &mut chain,
                ArtworkCandidate::new(format!("{}/{}/{}", YOUTUBE_THUMBNAIL_BASE, id, file), *legacy),
            );
        }
    } else if let Some(thumb) = thumbnail_url.filter(|t| platform::is_soundcloud_image(t)) {
        for candidate in soundcloud_variants(thumb) {
            push_unique(&mut chain, candidate);
        }
    }

    if let Some(thumb) = thumbnail_url.filter(|t| !t.trim().is_empty()) {
        push_unique(
            &mut chain,
            ArtworkCandidate::new(thumb, platform::is_letterboxed_youtube_thumbnail(thumb)),
        );
    }

    chain
}

fn soundcloud_variants(url: &str) -> Vec<ArtworkCandidate> {
    let Some(caps) = SOUNDCLOUD_SIZE_SUFFIX.captures(url) else {
        return Vec::new();
    };
    let Some(suffix) = caps.get(0) else {
        return Vec::new();
    };

    let base = &url[..suffix.start()];
    let ext = caps.get(1).map(|m| m.as_str()).unwrap_or("jpg");
    let query = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

    SOUNDCLOUD_SIZES
        .iter()
        .map(|size| ArtworkCandidate::new(format!("{}-{}.{}{}", base, size, ext, query), false))
        .collect()
}

fn push_unique(chain: &mut Vec<ArtworkCandidate>, candidate: ArtworkCandidate) {
    if !chain.iter().any(|c| c.url == candidate.url) {
        chain.push(candidate);
    }
}
