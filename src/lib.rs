#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![warn(clippy::perf)]
#![warn(clippy::complexity)]
#![warn(clippy::style)]
#![allow(clippy::multiple_crate_versions)]

//! Core of `hls-scout`: parse an HLS multivariant playlist into quality
//! variants, estimate each variant's total download size from a small
//! segment sample, and format the results for display.

pub mod estimate;
pub mod format;
pub mod playlist;
pub mod util;
