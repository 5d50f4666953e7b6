use std::{collections::VecDeque, f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};

use crate::Result;

/// Length of the time-domain frame, independent of the FFT size.
pub const WAVEFORM_LEN: usize = 1024;

/// Smallest accepted FFT size.
pub const MIN_FFT_SIZE: usize = 32;
/// Largest accepted FFT size.
pub const MAX_FFT_SIZE: usize = 32768;

/// Magnitudes at or below this level map to byte value 0.
const MIN_DECIBELS: f32 = -100.0;
/// Magnitudes at or above this level map to byte value 255.
const MAX_DECIBELS: f32 = -30.0;

/// Clamps a requested FFT size to [32, 32768] and rounds it to the nearest
/// power of two; exact midpoints round up.
pub fn clamp_fft_size(requested: usize) -> usize {
    let clamped = requested.clamp(MIN_FFT_SIZE, MAX_FFT_SIZE);
    if clamped.is_power_of_two() {
        return clamped;
    }
    let above = clamped.next_power_of_two().min(MAX_FFT_SIZE);
    let below = above / 2;
    if clamped - below < above - clamped {
        below
    } else {
        above
    }
}

/// The analysis stage of the audio graph.
///
/// Keeps a ring of recent mono samples and produces per-frame byte snapshots
/// mirroring the two feature views the renderers consume: a smoothed dB
/// spectrum scaled to [0, 255], and the raw recent waveform centered at 128.
/// FFT resources are reused and rebuilt lazily when the FFT size changes.
pub struct Analyser {
    fft_size: usize,
    smoothing: f32,
    ring: VecDeque<f32>,
    smoothed: Vec<f32>,
    fft_planner: RealFftPlanner<f32>,
    fft: Option<FftResources>,
}

impl Analyser {
    pub fn new() -> Self {
        Self {
            fft_size: 1024,
            smoothing: 0.8,
            ring: VecDeque::new(),
            smoothed: Vec::new(),
            fft_planner: RealFftPlanner::new(),
            fft: None,
        }
    }

    /// Applies clamped analysis parameters. FFT resources and the per-bin
    /// smoothing state are reallocated lazily on the next spectral read.
    pub fn set_params(&mut self, fft_size: usize, smoothing: f32) {
        self.fft_size = clamp_fft_size(fft_size);
        self.smoothing = smoothing.clamp(0.0, 0.99);
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    /// Number of frequency bins, always `fft_size / 2`.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Appends a block of mono samples, discarding anything older than the
    /// largest window either frame view can need.
    pub fn push_block(&mut self, samples: &[f32]) {
        self.ring.extend(samples.iter().copied());
        let keep = MAX_FFT_SIZE.max(WAVEFORM_LEN);
        while self.ring.len() > keep {
            self.ring.pop_front();
        }
    }

    /// Drops buffered samples and smoothing state.
    pub fn reset(&mut self) {
        self.ring.clear();
        self.smoothed.clear();
    }

    /// Writes the current frequency frame into `out`, resizing it only when
    /// the bin count has changed.
    pub fn write_frequency(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let size = self.fft_size;
        let bins = self.bin_count();
        if out.len() != bins {
            out.resize(bins, 0);
        }
        if self.smoothed.len() != bins {
            self.smoothed.clear();
            self.smoothed.resize(bins, 0.0);
        }

        let rebuild = self.fft.as_ref().map(|fft| fft.size != size).unwrap_or(true);
        if rebuild {
            let plan = self.fft_planner.plan_fft_forward(size);
            let scratch = plan.make_scratch_vec();
            let spectrum = plan.make_output_vec();
            let input = plan.make_input_vec();
            self.fft = Some(FftResources {
                size,
                plan,
                scratch,
                spectrum,
                input,
            });
        }
        let fft = self.fft.as_mut().expect("fft resources must exist");

        let available = self.ring.len().min(size);
        let pad = size - available;
        let start = self.ring.len() - available;
        for (index, slot) in fft.input.iter_mut().enumerate() {
            let sample = if index < pad {
                0.0
            } else {
                self.ring[start + index - pad]
            };
            *slot = sample * hann_value(index, size);
        }

        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)?;

        let norm = 1.0 / size as f32;
        let range = MAX_DECIBELS - MIN_DECIBELS;
        for (bin, byte) in out.iter_mut().enumerate() {
            let magnitude = fft.spectrum[bin].norm() * norm;
            let smoothed =
                self.smoothing * self.smoothed[bin] + (1.0 - self.smoothing) * magnitude;
            self.smoothed[bin] = smoothed;
            let db = if smoothed > 0.0 {
                20.0 * smoothed.log10()
            } else {
                MIN_DECIBELS
            };
            let scaled = ((db - MIN_DECIBELS) / range).clamp(0.0, 1.0);
            *byte = (scaled * 255.0).round() as u8;
        }

        Ok(())
    }

    /// Writes the fixed-length waveform frame into `out`. Samples are mapped
    /// to bytes centered at 128; missing history reads as silence.
    pub fn write_waveform(&mut self, out: &mut Vec<u8>) {
        if out.len() != WAVEFORM_LEN {
            out.resize(WAVEFORM_LEN, 128);
        }
        let available = self.ring.len().min(WAVEFORM_LEN);
        let pad = WAVEFORM_LEN - available;
        let start = self.ring.len() - available;
        for (index, byte) in out.iter_mut().enumerate() {
            if index < pad {
                *byte = 128;
            } else {
                let sample = self.ring[start + index - pad].clamp(-1.0, 1.0);
                *byte = ((128.0 * (1.0 + sample)).round() as i32).clamp(0, 255) as u8;
            }
        }
    }
}

impl Default for Analyser {
    fn default() -> Self {
        Self::new()
    }
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl fmt::Debug for Analyser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyser")
            .field("fft_size", &self.fft_size)
            .field("smoothing", &self.smoothing)
            .field("buffered", &self.ring.len())
            .finish()
    }
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}
