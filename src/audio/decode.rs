use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::LoadError;

/// Decoded mono audio, normalized to [-1, 1].
#[derive(Clone, Debug)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Decode `path` into a mono waveform.
///
/// Stops after `max_duration_secs` seconds of audio when given.
pub fn decode_audio(path: &Path, max_duration_secs: Option<f32>) -> Result<Waveform, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
        _ => LoadError::Open {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| LoadError::Unsupported {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| LoadError::NoTrack(path.to_path_buf()))?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count()).max(1);
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| LoadError::UnknownSampleRate(path.to_path_buf()))?;

    let sample_limit = max_duration_secs
        .filter(|&secs| secs > 0.0)
        .map(|secs| (secs as f64 * sample_rate as f64).ceil() as usize);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| LoadError::Unsupported {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let decode_err = |e: SymphoniaError| LoadError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        if sample_limit.is_some_and(|limit| all_samples.len() >= limit) {
            break;
        }

        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(decode_err(e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(reason)) => {
                log::debug!("Skipping corrupt packet in {}: {}", path.display(), reason);
                continue;
            }
            Err(e) => return Err(decode_err(e)),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        let samples = sample_buf.samples();

        // Downmix to mono
        if channels == 1 {
            all_samples.extend_from_slice(samples);
        } else {
            for frame_samples in samples.chunks(channels) {
                let mono: f32 = frame_samples.iter().sum::<f32>() / channels as f32;
                all_samples.push(mono);
            }
        }
    }

    if let Some(limit) = sample_limit {
        all_samples.truncate(limit);
    }

    log::info!(
        "Decoded {}: {} samples, {}Hz, {:.1}s",
        path.display(),
        all_samples.len(),
        sample_rate,
        all_samples.len() as f32 / sample_rate as f32
    );

    Ok(Waveform::new(all_samples, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_follows_sample_rate() {
        let wave = Waveform::new(vec![0.0; 44_100 * 3], 44_100);
        assert!((wave.duration_secs() - 3.0).abs() < 1e-6);
        assert!(!wave.is_empty());
    }

    #[test]
    fn zero_sample_rate_has_zero_duration() {
        let wave = Waveform::new(vec![0.0; 10], 0);
        assert_eq!(wave.duration_secs(), 0.0);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = decode_audio(Path::new("/definitely/not/here.wav"), None).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }
}
