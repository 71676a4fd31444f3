//! Pure presentation helpers: byte/bandwidth formatting and the fixed
//! table of re-encode size heuristics.

use serde::Serialize;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;
const MIB_PER_GIB: f64 = 1024.0;
const BITS_PER_MEGABIT: f64 = 1_000_000.0;

/// Quality tiers offered for re-encoding: label, ffmpeg scale filter, CRF,
/// and the fraction of the source size the re-encode is expected to take.
/// The fractions are rough empirical constants, not measurements.
const QUALITY_TIERS: [(&str, &str, &str, f64); 4] = [
    ("Tiny (360p)", "640:360", "28", 0.15),
    ("Low (480p)", "854:480", "26", 0.25),
    ("Medium (720p)", "1280:720", "24", 0.40),
    ("Good (1080p)", "1920:1080", "22", 0.60),
];

/// One re-encode option derived from a known (or unknown) source size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionProfile {
    pub label: String,
    /// ffmpeg `scale=` filter argument, e.g. `1280:720`.
    pub target_resolution: String,
    pub crf: String,
    pub estimated_bytes: Option<u64>,
    /// ffmpeg invocation with an `{input}` placeholder for the source URL.
    pub command_template: String,
}

impl CompressionProfile {
    /// Substitutes the source URL into the stored ffmpeg invocation.
    #[must_use]
    pub fn command_for(&self, input_url: &str) -> String {
        self.command_template.replace("{input}", input_url)
    }
}

/// Formats a byte count with binary units: megabytes under 1024 MiB,
/// gigabytes above. `None` and zero both render as `"Unknown"`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes.filter(|b| *b > 0) else {
        return "Unknown".to_string();
    };

    let mib = bytes as f64 / BYTES_PER_MIB;
    if mib < 1024.0 {
        format!("{mib:.2} MB")
    } else {
        format!("{:.2} GB", mib / MIB_PER_GIB)
    }
}

/// Formats an advertised bandwidth as decimal megabits per second.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bandwidth(bits_per_second: Option<u64>) -> String {
    let Some(bps) = bits_per_second.filter(|b| *b > 0) else {
        return "Unknown".to_string();
    };

    format!("{:.2} Mbps", bps as f64 / BITS_PER_MEGABIT)
}

/// Derives the fixed, ordered list of re-encode options for a stream of
/// known total size. With an unknown size the profiles still list their
/// scale and CRF, just without a size estimate.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn derive_compression_profiles(total_bytes: Option<u64>) -> Vec<CompressionProfile> {
    QUALITY_TIERS
        .iter()
        .map(|(label, scale, crf, multiplier)| {
            // "Tiny (360p)" -> "output_tiny.mp4"
            let output_name = label
                .split_whitespace()
                .next()
                .unwrap_or(label)
                .to_lowercase();

            CompressionProfile {
                label: (*label).to_string(),
                target_resolution: (*scale).to_string(),
                crf: (*crf).to_string(),
                estimated_bytes: total_bytes.map(|b| (b as f64 * multiplier).round() as u64),
                command_template: format!(
                    "ffmpeg -i \"{{input}}\" -vf scale={scale} -c:v libx264 -crf {crf} -preset medium -c:a aac -b:a 128k output_{output_name}.mp4"
                ),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_none_and_zero_are_unknown() {
        assert_eq!(format_bytes(None), "Unknown");
        assert_eq!(format_bytes(Some(0)), "Unknown");
    }

    #[test]
    fn bytes_under_a_binary_gigabyte_use_megabytes() {
        assert_eq!(format_bytes(Some(1_048_576)), "1.00 MB");
        assert_eq!(format_bytes(Some(523_763_712)), "499.50 MB");
    }

    #[test]
    fn bytes_from_a_binary_gigabyte_use_gigabytes() {
        assert_eq!(format_bytes(Some(1_073_741_824)), "1.00 GB");
        assert_eq!(format_bytes(Some(2_147_483_648)), "2.00 GB");
    }

    #[test]
    fn bandwidth_uses_decimal_megabits() {
        assert_eq!(format_bandwidth(Some(5_000_000)), "5.00 Mbps");
        assert_eq!(format_bandwidth(Some(800_000)), "0.80 Mbps");
        assert_eq!(format_bandwidth(None), "Unknown");
    }

    #[test]
    fn profiles_scale_a_known_total() {
        let profiles = derive_compression_profiles(Some(1_000_000_000));

        assert_eq!(profiles.len(), 4);
        assert_eq!(profiles[0].label, "Tiny (360p)");
        assert_eq!(profiles[0].estimated_bytes, Some(150_000_000));
        assert_eq!(profiles[1].estimated_bytes, Some(250_000_000));
        assert_eq!(profiles[2].estimated_bytes, Some(400_000_000));
        assert_eq!(profiles[3].estimated_bytes, Some(600_000_000));
        assert_eq!(profiles[3].crf, "22");
        assert_eq!(profiles[3].target_resolution, "1920:1080");
    }

    #[test]
    fn profiles_with_unknown_total_have_no_size() {
        let profiles = derive_compression_profiles(None);
        assert!(profiles.iter().all(|p| p.estimated_bytes.is_none()));
    }

    #[test]
    fn command_substitutes_the_source_url() {
        let profiles = derive_compression_profiles(Some(1_000));
        let command = profiles[2].command_for("https://cdn.example.com/vod/hi.m3u8");

        assert_eq!(
            command,
            "ffmpeg -i \"https://cdn.example.com/vod/hi.m3u8\" -vf scale=1280:720 -c:v libx264 -crf 24 -preset medium -c:a aac -b:a 128k output_medium.mp4"
        );
    }
}
