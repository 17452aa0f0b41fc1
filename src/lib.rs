//! staticsift - triage recordings buried in static
//!
//! Measures four cheap acoustic descriptors per file (spectral flatness,
//! onset rate, voiced-frame ratio, chroma spread) and votes on whether the
//! recording likely contains music or only noise, so that expensive
//! restoration work is spent on the files that deserve it.
//!
//! - `audio`: decoding and the three analyzers
//! - `classify`: the threshold vote
//! - `config`: thresholds and run settings
//! - `pipeline`: per-file and batch processing
//! - `report`: console and JSON output
//!
//! ```no_run
//! use staticsift::{config::Settings, pipeline};
//! use std::path::PathBuf;
//!
//! let summary = pipeline::run_batch(&[PathBuf::from("tape.wav")], &Settings::default())
//!     .expect("invalid settings");
//! println!("{} likely music", summary.music());
//! ```

pub mod audio;
pub mod classify;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

pub use audio::{MetricSet, Waveform};
pub use classify::{classify, Criterion, Verdict, Vote};
pub use config::Thresholds;
pub use error::{AnalysisError, ConfigError, LoadError, Result, SiftError};
