use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::util::resolve_reference;

pub const STREAM_INF_TAG: &str = "#EXT-X-STREAM-INF:";

static BANDWIDTH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"BANDWIDTH=(\d+)").unwrap());
static RESOLUTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RESOLUTION=(\d+)x(\d+)").unwrap());

/// One quality option of a multivariant playlist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    /// Raw `#EXT-X-STREAM-INF` attribute line. Attributes other than
    /// `BANDWIDTH` and `RESOLUTION` are kept here verbatim.
    pub stream_info_line: String,
    /// Advertised peak bits per second, when the playlist declares one.
    pub bandwidth: Option<u64>,
    pub resolution: Option<Resolution>,
    /// Absolute URL of this variant's own media playlist.
    pub media_playlist_url: Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    /// The playlist itself could not be fetched or decoded.
    #[error("playlist unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// The body contained no `#EXT-X-STREAM-INF` + URI pairs. Normal for
    /// direct (single-quality) streams; callers should fall back to
    /// treating the URL as a media playlist rather than abort.
    #[error("no variant streams found; not a multivariant playlist")]
    NotMultivariant,
}

/// Scanner state: at most one stream-info tag is ever pending, and a tag
/// that never receives its URI line is dropped, not emitted.
enum ScanState {
    Idle,
    AwaitingUri(PendingVariant),
}

struct PendingVariant {
    stream_info_line: String,
    bandwidth: Option<u64>,
    resolution: Option<Resolution>,
}

impl PendingVariant {
    fn from_tag_line(line: &str) -> Self {
        Self {
            stream_info_line: line.to_string(),
            bandwidth: BANDWIDTH_REGEX
                .captures(line)
                .and_then(|c| c[1].parse().ok()),
            resolution: RESOLUTION_REGEX.captures(line).and_then(|c| {
                Some(Resolution {
                    width: c[1].parse().ok()?,
                    height: c[2].parse().ok()?,
                })
            }),
        }
    }

    fn into_variant(self, media_playlist_url: Url) -> Variant {
        Variant {
            stream_info_line: self.stream_info_line,
            bandwidth: self.bandwidth,
            resolution: self.resolution,
            media_playlist_url,
        }
    }
}

/// Fetches a multivariant playlist and returns its variants, sorted
/// ascending by bandwidth.
///
/// # Errors
/// [`ParseError::Unreachable`] when the fetch fails,
/// [`ParseError::NotMultivariant`] when the body yields zero variants.
#[instrument(skip(client))]
pub async fn fetch_variants(
    client: &reqwest::Client,
    playlist_url: &Url,
) -> Result<Vec<Variant>, ParseError> {
    let req = client.get(playlist_url.clone()).send().await?;
    let body = req.text().await?;

    let variants = parse_multivariant(playlist_url, &body);
    if variants.is_empty() {
        return Err(ParseError::NotMultivariant);
    }

    debug!("Parsed {} variant stream(s)", variants.len());
    Ok(variants)
}

/// Scans playlist text for `#EXT-X-STREAM-INF` tags paired with the next
/// non-comment, non-blank line. Relative URIs resolve against
/// `playlist_url`. Unrelated body lines are ignored, so feeding this a
/// media playlist (or arbitrary text) yields an empty result instead of an
/// error.
#[must_use]
pub fn parse_multivariant(playlist_url: &Url, body: &str) -> Vec<Variant> {
    let mut variants = Vec::new();
    let mut state = ScanState::Idle;

    for raw_line in body.lines() {
        let line = raw_line.trim();

        if line.starts_with(STREAM_INF_TAG) {
            // A still-pending tag here never got its URI; it is overwritten.
            state = ScanState::AwaitingUri(PendingVariant::from_tag_line(line));
        } else if line.is_empty() || line.starts_with('#') {
            // Blank lines and other tags never close a pending variant.
        } else if let ScanState::AwaitingUri(pending) =
            std::mem::replace(&mut state, ScanState::Idle)
        {
            match resolve_reference(playlist_url, line) {
                Some(url) => variants.push(pending.into_variant(url)),
                None => debug!(line, "Dropping variant with unresolvable URI"),
            }
        }
        // URI-looking lines with no pending tag are unrelated body lines.
    }

    // Unknown bandwidth sorts as 0, i.e. first. Stable, so equal keys keep
    // playlist order.
    variants.sort_by_key(|v| v.bandwidth.unwrap_or(0));
    variants
}
