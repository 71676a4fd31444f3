use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

/// Resolves a playlist reference line as an absolute URL.
///
/// Scheme-prefixed references pass through unchanged; anything else is
/// resolved relative to the playlist that mentioned it.
#[must_use]
pub fn resolve_reference(base: &Url, reference: &str) -> Option<Url> {
    Url::parse(reference).or_else(|_| base.join(reference)).ok()
}

#[must_use]
pub fn init_http_client() -> reqwest::Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        "User-Agent",
        HeaderValue::from_str(&format!(
            "{}/{} (+{})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_REPOSITORY")
        ))
        .unwrap(),
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("Unable to build HTTP client")
}

/// Spawn a task that watches for CTRL + C signal and cancels a [`CancellationToken`] when caught
pub fn spawn_ct_watcher(ct: CancellationToken) {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Caught CTRL+C signal!");
        ct.cancel();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_reference_resolves_against_the_playlist_directory() {
        let base = Url::parse("https://cdn.example.com/vod/1080p/index.m3u8").unwrap();
        let resolved = resolve_reference(&base, "seg0001.ts").unwrap();
        assert_eq!(
            resolved.as_str(),
            "https://cdn.example.com/vod/1080p/seg0001.ts"
        );
    }

    #[test]
    fn absolute_reference_is_untouched() {
        let base = Url::parse("https://cdn.example.com/vod/index.m3u8").unwrap();
        let resolved = resolve_reference(&base, "https://edge.example.net/a.ts").unwrap();
        assert_eq!(resolved.as_str(), "https://edge.example.net/a.ts");
    }
}
