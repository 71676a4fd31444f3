use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, HeaderValue, RANGE};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::util::resolve_reference;

/// How many leading segments are probed to derive the per-segment average.
/// A small fixed prefix bounds latency; it assumes roughly uniform segment
/// sizes within one variant, which holds for CBR-encoded VOD.
pub const SAMPLE_SEGMENT_COUNT: usize = 5;

static CONTENT_RANGE_TOTAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"bytes \d+-\d+/(\d+)").unwrap());

/// Extrapolated total size of one variant's stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeEstimate {
    /// `None` when no sampled segment reported a size.
    pub total_bytes: Option<u64>,
    /// Sampled segments whose size was actually determined.
    pub sampled_segments: usize,
    pub total_segments: usize,
}

impl SizeEstimate {
    pub const UNKNOWN: Self = Self {
        total_bytes: None,
        sampled_segments: 0,
        total_segments: 0,
    };
}

/// One finished segment probe, reported before the next probe starts.
#[derive(Debug, Clone, Copy)]
pub struct SegmentProbe {
    pub index: usize,
    pub size: Option<u64>,
}

/// Estimates the total byte size of the stream behind a media playlist.
pub async fn estimate_size(client: &reqwest::Client, media_playlist_url: &Url) -> SizeEstimate {
    estimate_size_with_progress(client, media_playlist_url, |_| {}).await
}

/// Like [`estimate_size`], invoking `on_probe` after each segment probe.
///
/// Probes run strictly one at a time. Estimation never fails: a playlist
/// that cannot be fetched, or segments that report no size, degrade to
/// `None` fields instead of an error.
#[instrument(skip(client, on_probe))]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub async fn estimate_size_with_progress(
    client: &reqwest::Client,
    media_playlist_url: &Url,
    mut on_probe: impl FnMut(SegmentProbe),
) -> SizeEstimate {
    let body = match fetch_text(client, media_playlist_url).await {
        Ok(body) => body,
        Err(e) => {
            debug!(error = %e, "Media playlist fetch failed");
            return SizeEstimate::UNKNOWN;
        }
    };

    let segment_lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();
    let total_segments = segment_lines.len();

    let mut sampled_sizes = Vec::new();
    for (index, line) in segment_lines.iter().take(SAMPLE_SEGMENT_COUNT).enumerate() {
        let size = match resolve_reference(media_playlist_url, line) {
            Some(segment_url) => measure_remote_size(client, &segment_url)
                .await
                .filter(|size| *size > 0),
            None => None,
        };

        debug!(index, ?size, "Probed segment");
        on_probe(SegmentProbe { index, size });

        if let Some(size) = size {
            sampled_sizes.push(size);
        }
    }

    let sampled_segments = sampled_sizes.len();
    if sampled_segments == 0 {
        return SizeEstimate {
            total_bytes: None,
            sampled_segments: 0,
            total_segments,
        };
    }

    let average = sampled_sizes.iter().sum::<u64>() as f64 / sampled_segments as f64;
    SizeEstimate {
        total_bytes: Some((average * total_segments as f64).round() as u64),
        sampled_segments,
        total_segments,
    }
}

/// Determines the byte size of a remote file without downloading it.
///
/// Tries a HEAD request first; origins that answer HEAD without a usable
/// `Content-Length` get a one-byte ranged GET, whose `Content-Range` still
/// carries the full length. `None` when neither reveals a size — some
/// origins omit both headers, which is not an error.
#[instrument(skip(client), level = "debug")]
pub async fn measure_remote_size(client: &reqwest::Client, url: &Url) -> Option<u64> {
    if let Ok(res) = client.head(url.clone()).send().await {
        if res.status().is_success() {
            // A zero Content-Length on HEAD is treated as absent so the
            // ranged probe still gets a chance.
            if let Some(length) =
                header_u64(res.headers().get(CONTENT_LENGTH)).filter(|length| *length > 0)
            {
                return Some(length);
            }
        }
    }

    let res = client
        .get(url.clone())
        .header(RANGE, "bytes=0-0")
        .send()
        .await
        .ok()?;
    let content_range = res.headers().get(CONTENT_RANGE)?.to_str().ok()?;
    let caps = CONTENT_RANGE_TOTAL_REGEX.captures(content_range)?;
    caps[1].parse().ok()
}

async fn fetch_text(client: &reqwest::Client, url: &Url) -> reqwest::Result<String> {
    client.get(url.clone()).send().await?.text().await
}

fn header_u64(value: Option<&HeaderValue>) -> Option<u64> {
    value?.to_str().ok()?.parse().ok()
}
