pub mod analysis;
pub mod decode;
pub mod features;
pub mod frames;
pub mod onset;
pub mod pitch;
pub mod spectral;

pub use analysis::analyze;
pub use decode::{decode_audio, Waveform};
pub use features::{Analysis, MetricSet};
