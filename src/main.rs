#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![warn(clippy::perf)]
#![warn(clippy::complexity)]
#![warn(clippy::style)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result};
use clap::Parser;
use hls_scout::estimate::{SizeEstimate, estimate_size_with_progress};
use hls_scout::format::{
    CompressionProfile, derive_compression_profiles, format_bandwidth, format_bytes,
};
use hls_scout::playlist::{ParseError, Variant, fetch_variants};
use hls_scout::util::{init_http_client, spawn_ct_watcher};
use indicatif::ProgressBar;
use serde::Serialize;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

/// Inspects an HLS multivariant playlist and estimates per-variant download sizes
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Multivariant playlist URL (.m3u8) to analyze
    url: String,

    /// Skips segment probing; variants are listed without size estimates
    #[arg(long)]
    no_estimate: bool,

    /// Prints the analysis as JSON instead of a human-readable report
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct VariantReport {
    #[serde(flatten)]
    variant: Variant,
    estimate: Option<SizeEstimate>,
    compression_profiles: Vec<CompressionProfile>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let client = init_http_client();
    let ct = CancellationToken::new();

    spawn_ct_watcher(ct.clone());

    let playlist_url = Url::parse(&args.url).context("Parsing playlist URL")?;

    let variants = match fetch_variants(&client, &playlist_url).await {
        Ok(variants) => variants,
        Err(ParseError::NotMultivariant) => {
            // Direct (single-quality) streams are normal; size the URL as a
            // media playlist instead.
            warn!("No variant streams found, treating URL as a single media playlist");
            vec![Variant {
                stream_info_line: String::new(),
                bandwidth: None,
                resolution: None,
                media_playlist_url: playlist_url,
            }]
        }
        Err(e) => return Err(e).context("Fetching multivariant playlist"),
    };

    info!("Found {} quality variant(s)", variants.len());

    let mut reports = Vec::new();
    for variant in variants {
        let estimate = if args.no_estimate {
            None
        } else {
            // A spinner, not a fixed-length bar: playlists shorter than the
            // sample prefix would never fill one.
            let bar = if args.json {
                ProgressBar::hidden()
            } else {
                ProgressBar::new_spinner()
            };
            bar.set_message(variant.media_playlist_url.to_string());

            let estimate = select! {
                () = ct.cancelled() => {
                    bar.finish_and_clear();
                    break;
                }
                estimate = estimate_size_with_progress(
                    &client,
                    &variant.media_playlist_url,
                    |_| bar.inc(1),
                ) => estimate,
            };
            bar.finish_and_clear();

            Some(estimate)
        };

        let compression_profiles =
            derive_compression_profiles(estimate.and_then(|e| e.total_bytes));

        reports.push(VariantReport {
            variant,
            estimate,
            compression_profiles,
        });
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!();
        println!(
            "Variant: {}",
            report
                .variant
                .resolution
                .map_or_else(|| "Unknown resolution".to_string(), |r| r.to_string())
        );
        println!("  Bandwidth: {}", format_bandwidth(report.variant.bandwidth));
        println!("  Playlist:  {}", report.variant.media_playlist_url);

        if let Some(estimate) = report.estimate {
            println!(
                "  Estimated size: {} ({} of {} segments sampled)",
                format_bytes(estimate.total_bytes),
                estimate.sampled_segments,
                estimate.total_segments
            );
        }

        println!("  Compression options:");
        for profile in &report.compression_profiles {
            println!(
                "    {} crf {}: ~{}",
                profile.label,
                profile.crf,
                format_bytes(profile.estimated_bytes)
            );
            println!(
                "      {}",
                profile.command_for(report.variant.media_playlist_url.as_str())
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimation_is_on_by_default_and_has_an_opt_out() {
        let args = Args::try_parse_from(["hls-scout", "https://cdn.example.com/m.m3u8"]).unwrap();
        assert!(!args.no_estimate);
        assert!(!args.json);

        let args = Args::try_parse_from([
            "hls-scout",
            "https://cdn.example.com/m.m3u8",
            "--no-estimate",
        ])
        .unwrap();
        assert!(args.no_estimate);
    }

    #[test]
    fn json_flag_is_recognized() {
        let args =
            Args::try_parse_from(["hls-scout", "https://cdn.example.com/m.m3u8", "--json"])
                .unwrap();
        assert!(args.json);
    }
}
