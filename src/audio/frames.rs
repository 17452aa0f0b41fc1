//! Framing and short-time spectra shared by the analyzers.

use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

use super::decode::Waveform;

/// Analysis window length in samples.
pub const FRAME_SIZE: usize = 2048;
/// Distance between consecutive frame starts.
pub const HOP_SIZE: usize = 512;
/// Mean spectral magnitude at or below which a frame counts as silent.
pub const SILENCE_FLOOR: f32 = 1e-8;

/// Number of whole frames in `len` samples.
///
/// Input shorter than one frame still gets a single zero-padded frame. A
/// trailing remainder shorter than one hop is dropped, so no frame ends in an
/// artificial step to zero.
pub fn frame_count(len: usize) -> usize {
    if len == 0 {
        0
    } else if len <= FRAME_SIZE {
        1
    } else {
        1 + (len - FRAME_SIZE) / HOP_SIZE
    }
}

/// Copy frame `index` into `out`, zero-padding past the end of `samples`.
pub fn read_frame(samples: &[f32], index: usize, out: &mut [f32]) {
    let start = index * HOP_SIZE;
    if start >= samples.len() {
        out.fill(0.0);
        return;
    }
    let available = (samples.len() - start).min(out.len());
    out[..available].copy_from_slice(&samples[start..start + available]);
    out[available..].fill(0.0);
}

/// Start time of frame `index` in seconds.
pub fn frame_time(index: usize, sample_rate: u32) -> f32 {
    (index * HOP_SIZE) as f32 / sample_rate as f32
}

pub fn hann_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}

/// Magnitude spectra of every Hann-windowed frame of a waveform.
#[derive(Clone, Debug)]
pub struct Spectrogram {
    /// One magnitude spectrum per frame, `FRAME_SIZE / 2 + 1` bins each
    pub frames: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl Spectrogram {
    pub fn compute(wave: &Waveform) -> Self {
        let n_frames = frame_count(wave.samples.len());
        let hann = hann_window(FRAME_SIZE);

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FRAME_SIZE);
        let half = FRAME_SIZE / 2 + 1;

        // Collected in frame order, so downstream sums never depend on scheduling
        let frames: Vec<Vec<f32>> = (0..n_frames)
            .into_par_iter()
            .map(|idx| {
                let mut raw = vec![0.0f32; FRAME_SIZE];
                read_frame(&wave.samples, idx, &mut raw);

                let mut buffer: Vec<Complex<f32>> = raw
                    .iter()
                    .zip(hann.iter())
                    .map(|(&s, &w)| Complex::new(s * w, 0.0))
                    .collect();
                fft.process(&mut buffer);

                buffer[..half].iter().map(|c| c.norm()).collect()
            })
            .collect();

        Self {
            frames,
            sample_rate: wave.sample_rate,
        }
    }

    pub fn num_bins(&self) -> usize {
        FRAME_SIZE / 2 + 1
    }

    /// Centre frequency of `bin` in Hz.
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / FRAME_SIZE as f32
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

pub fn is_silent(magnitudes: &[f32]) -> bool {
    if magnitudes.is_empty() {
        return true;
    }
    magnitudes.iter().sum::<f32>() / magnitudes.len() as f32 <= SILENCE_FLOOR
}
