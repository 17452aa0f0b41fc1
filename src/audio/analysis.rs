use super::decode::Waveform;
use super::features::{Analysis, MetricSet};
use super::frames::Spectrogram;
use super::spectral::FrameSummary;
use super::{onset, pitch};
use crate::error::AnalysisError;

/// Reject waveforms the analyzers cannot give a meaningful answer for.
///
/// Silence is valid input; only structural problems are errors.
pub fn validate(wave: &Waveform) -> Result<(), AnalysisError> {
    if wave.sample_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate(wave.sample_rate));
    }
    if wave.is_empty() {
        return Err(AnalysisError::EmptyWaveform);
    }
    if let Some(idx) = wave.samples.iter().position(|s| !s.is_finite()) {
        return Err(AnalysisError::NonFiniteSample(idx));
    }
    Ok(())
}

/// Run the three analyzers on one waveform.
///
/// The frame analyzer and onset detector read one shared spectrogram; the
/// pitch tracker works on raw frames alongside it.
pub fn analyze(wave: &Waveform) -> Result<Analysis, AnalysisError> {
    validate(wave)?;

    let duration_secs = wave.duration_secs();

    let ((frames, onset_times), voiced_ratio) = rayon::join(
        || {
            let spec = Spectrogram::compute(wave);
            rayon::join(
                || FrameSummary::from_spectrogram(&spec),
                || onset::onsets_of(&spec),
            )
        },
        || pitch::voiced_ratio(wave),
    );

    let onset_count = onset_times.len();
    let metrics = MetricSet {
        spectral_flatness: frames.spectral_flatness,
        onset_rate: onset::rate(onset_count, duration_secs),
        voiced_ratio,
        chroma_std: frames.chroma_std,
    };

    log::debug!(
        "Metrics: flatness={:.4}, onsets={} ({:.2}/s), voiced={:.3}, chroma_std={:.4}",
        metrics.spectral_flatness,
        onset_count,
        metrics.onset_rate,
        metrics.voiced_ratio,
        metrics.chroma_std
    );

    Ok(Analysis {
        duration_secs,
        onset_count,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{onset, spectral};
    use crate::testing::{chord, click_track, mix, silence, sine, white_noise};

    #[test]
    fn empty_waveform_is_an_error() {
        let err = analyze(&Waveform::new(Vec::new(), 44_100)).unwrap_err();
        assert_eq!(err, AnalysisError::EmptyWaveform);
    }

    #[test]
    fn zero_sample_rate_is_an_error() {
        let err = analyze(&Waveform::new(vec![0.1; 100], 0)).unwrap_err();
        assert_eq!(err, AnalysisError::InvalidSampleRate(0));
    }

    #[test]
    fn nan_sample_is_an_error() {
        let mut samples = vec![0.0f32; 4096];
        samples[1234] = f32::NAN;
        let err = analyze(&Waveform::new(samples, 22_050)).unwrap_err();
        assert_eq!(err, AnalysisError::NonFiniteSample(1234));
    }

    #[test]
    fn silence_is_valid_and_all_zero() {
        let analysis = analyze(&silence(22_050, 3.0)).unwrap();
        let m = analysis.metrics;
        assert_eq!(m.spectral_flatness, 0.0);
        assert_eq!(m.onset_rate, 0.0);
        assert_eq!(m.voiced_ratio, 0.0);
        assert_eq!(m.chroma_std, 0.0);
        assert_eq!(analysis.onset_count, 0);
        assert!((analysis.duration_secs - 3.0).abs() < 1e-6);
    }

    #[test]
    fn very_short_input_still_analyzes() {
        let analysis = analyze(&sine(440.0, 22_050, 0.05, 0.5)).unwrap();
        assert!(analysis.metrics.spectral_flatness.is_finite());
        assert!(analysis.metrics.voiced_ratio <= 1.0);
    }

    #[test]
    fn shared_spectrogram_matches_standalone_analyzers() {
        let wave = mix(&click_track(120.0, 22_050, 3.0), &sine(330.0, 22_050, 3.0, 0.2));
        let analysis = analyze(&wave).unwrap();
        let m = analysis.metrics;
        assert_eq!(m.spectral_flatness, spectral::spectral_flatness(&wave));
        assert_eq!(m.chroma_std, spectral::chroma_std(&wave));
        assert_eq!(analysis.onset_count, onset::detect_onsets(&wave).len());
        assert_eq!(m.voiced_ratio, pitch::voiced_ratio(&wave));
    }

    #[test]
    fn triad_gets_three_musical_metrics() {
        let m = analyze(&chord(&[220.0, 277.18, 329.63], 22_050, 3.0, 0.3))
            .unwrap()
            .metrics;
        assert!(m.spectral_flatness < 0.05, "flatness {}", m.spectral_flatness);
        assert!(m.voiced_ratio > 0.10, "voiced {}", m.voiced_ratio);
        assert!(m.chroma_std > 0.3, "chroma std {}", m.chroma_std);
    }

    #[test]
    fn analysis_is_bit_identical_across_runs() {
        let wave = white_noise(22_050, 2.0, 0.5, 99);
        let first = analyze(&wave).unwrap();
        let second = analyze(&wave).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.metrics.spectral_flatness.to_bits(),
            second.metrics.spectral_flatness.to_bits()
        );
    }
}
