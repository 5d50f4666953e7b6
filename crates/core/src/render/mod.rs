//! Per-mode rendering strategies.
//!
//! Each renderer is a stateless strategy that turns one feature frame plus a
//! settings snapshot into drawing calls against a [`Surface`]. The lookup in
//! [`renderer_for`] is exhaustive over the closed mode set, so a mode without
//! a renderer cannot compile; [`VizMode::Unknown`] is the explicit escape
//! hatch for malformed external input and maps to the diagnostic placeholder.

use std::f32::consts::TAU;

use crate::palette::{solid_color, Color, GradientCache};
use crate::settings::{SettingsSnapshot, VizMode};
use crate::surface::{Paint, Surface};

/// Background color painted at the start of every tick.
pub const BACKGROUND: Color = Color::rgb(10, 10, 12);

const PLACEHOLDER_COLOR: Color = Color::rgb(0x66, 0x66, 0x66);

/// Which feature view a renderer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Frequency,
    Waveform,
}

/// A per-mode rendering strategy. Stateless: everything it needs arrives as
/// arguments, so renderers can be shared as statics.
pub trait ModeRenderer {
    fn frame_kind(&self) -> FrameKind;

    fn render(
        &self,
        frame: &[u8],
        settings: &SettingsSnapshot,
        cache: &mut GradientCache,
        surface: &mut dyn Surface,
    );
}

/// Returns the renderer for a known mode, or `None` for [`VizMode::Unknown`]
/// (the caller renders the placeholder instead).
pub fn renderer_for(mode: VizMode) -> Option<&'static dyn ModeRenderer> {
    match mode {
        VizMode::Bars => Some(&BarsRenderer),
        VizMode::Wave => Some(&WaveformRenderer),
        VizMode::Radial => Some(&RadialRenderer),
        VizMode::Unknown => None,
    }
}

/// Inverse-gamma amplitude compression: larger sensitivity compresses the
/// curve less, making quiet signal appear louder.
fn amplitude(sample: u8, sensitivity: f32) -> f32 {
    let v = sample as f32 / 255.0;
    v.powf(1.0 / sensitivity.clamp(0.1, 4.0))
}

/// Fixed-stride bucket sampling: one bin per bucket, the rest discarded.
fn bin_at(frame: &[u8], bucket: usize, stride: usize) -> u8 {
    frame[(bucket * stride).min(frame.len() - 1)]
}

/// Frequency bars centered on the vertical midline, optionally mirrored.
pub struct BarsRenderer;

impl ModeRenderer for BarsRenderer {
    fn frame_kind(&self) -> FrameKind {
        FrameKind::Frequency
    }

    fn render(
        &self,
        frame: &[u8],
        settings: &SettingsSnapshot,
        _cache: &mut GradientCache,
        surface: &mut dyn Surface,
    ) {
        if frame.is_empty() {
            return;
        }
        let (w, h) = surface.logical_size();
        let bars = settings.clamped_bar_count();
        let stride = frame.len() / bars;
        let slot = w / bars as f32;
        let bar_w = slot * 0.8;
        let gap = slot * 0.2;
        let mid = h / 2.0;
        let sensitivity = settings.clamped_sensitivity();

        surface.set_paint(Paint::Solid(solid_color(&settings.palette)));
        for i in 0..bars {
            let amp = amplitude(bin_at(frame, i, stride), sensitivity);
            let bar_h = amp * h * 0.9;
            let x = i as f32 * slot + gap * 0.5;
            if settings.mirror_bars {
                // Two half-height bars; same total area as the single bar.
                let half = bar_h / 2.0;
                surface.fill_rect(x, mid - half, bar_w, half);
                surface.fill_rect(x, mid, bar_w, half);
            } else {
                surface.fill_rect(x, mid - bar_h / 2.0, bar_w, bar_h);
            }
        }
    }
}

/// Time-domain polyline spanning the full surface width.
pub struct WaveformRenderer;

impl ModeRenderer for WaveformRenderer {
    fn frame_kind(&self) -> FrameKind {
        FrameKind::Waveform
    }

    fn render(
        &self,
        frame: &[u8],
        settings: &SettingsSnapshot,
        _cache: &mut GradientCache,
        surface: &mut dyn Surface,
    ) {
        if frame.len() < 2 {
            return;
        }
        let (w, h) = surface.logical_size();
        let mid = h / 2.0;
        let amplitude = h * 0.4 * settings.clamped_sensitivity();
        let span = (frame.len() - 1) as f32;

        surface.set_paint(Paint::Solid(solid_color(&settings.palette)));
        surface.begin_path();
        for (i, &sample) in frame.iter().enumerate() {
            let x = i as f32 / span * w;
            let v = (sample as f32 - 128.0) / 128.0;
            let y = mid + v * amplitude;
            if i == 0 {
                surface.move_to(x, y);
            } else {
                surface.line_to(x, y);
            }
        }
        surface.stroke(2.0);
    }
}

/// Particles placed evenly by angle around the center, pushed outward by
/// their bin's amplitude and filled with the cached gradient.
pub struct RadialRenderer;

impl ModeRenderer for RadialRenderer {
    fn frame_kind(&self) -> FrameKind {
        FrameKind::Frequency
    }

    fn render(
        &self,
        frame: &[u8],
        settings: &SettingsSnapshot,
        cache: &mut GradientCache,
        surface: &mut dyn Surface,
    ) {
        if frame.is_empty() {
            return;
        }
        let (w, h) = surface.logical_size();
        let particles = settings.particle_count.max(1);
        let stride = frame.len() / particles;
        let cx = w / 2.0;
        let cy = h / 2.0;
        let max_radius = w.min(h) * 0.4;
        let sensitivity = settings.clamped_sensitivity();

        let gradient = cache.gradient(&settings.palette, w as u32, h as u32);
        surface.set_paint(Paint::Gradient(gradient));
        for i in 0..particles {
            let amp = amplitude(bin_at(frame, i, stride), sensitivity);
            let angle = i as f32 * TAU / particles as f32;
            let radius = amp * max_radius;
            let x = cx + angle.cos() * radius;
            let y = cy + angle.sin() * radius;
            let size = (amp * 8.0).max(2.0);
            surface.fill_circle(x, y, size);
        }
    }
}

/// Neutral diagnostic drawn when the mode value is outside the known set:
/// a dim crossed box in the center of the surface.
pub fn render_placeholder(surface: &mut dyn Surface) {
    let (w, h) = surface.logical_size();
    let side = (w.min(h) * 0.25).max(8.0);
    let x0 = (w - side) / 2.0;
    let y0 = (h - side) / 2.0;

    surface.set_paint(Paint::Solid(PLACEHOLDER_COLOR));
    surface.begin_path();
    surface.move_to(x0, y0);
    surface.line_to(x0 + side, y0);
    surface.line_to(x0 + side, y0 + side);
    surface.line_to(x0, y0 + side);
    surface.line_to(x0, y0);
    surface.line_to(x0 + side, y0 + side);
    surface.move_to(x0 + side, y0);
    surface.line_to(x0, y0 + side);
    surface.stroke(1.0);
}

/// Idle state when no audio source is connected: a flat line on the midline.
pub fn render_no_signal(surface: &mut dyn Surface) {
    let (w, h) = surface.logical_size();
    let mid = h / 2.0;
    surface.set_paint(Paint::Solid(PLACEHOLDER_COLOR));
    surface.begin_path();
    surface.move_to(0.0, mid);
    surface.line_to(w, mid);
    surface.stroke(1.0);
}
