use serde::{Deserialize, Serialize};

/// Closed set of visualization modes the engine knows how to render.
///
/// The external settings store transports the mode as a string, so any value
/// outside the known set deserializes to [`VizMode::Unknown`]. That is not an
/// error: the render loop falls back to a diagnostic placeholder and keeps
/// ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VizMode {
    Bars,
    Wave,
    Radial,
    #[serde(other)]
    Unknown,
}

impl VizMode {
    /// Maps a mode name from external input onto the closed enum. Anything
    /// unrecognised becomes [`VizMode::Unknown`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "bars" => Self::Bars,
            "wave" => Self::Wave,
            "radial" => Self::Radial,
            _ => Self::Unknown,
        }
    }
}

/// Read-only view of the user-facing settings consumed by the core.
///
/// A snapshot is treated as immutable for the duration of one tick. Field
/// names follow the external store's camelCase JSON shape. Out-of-range
/// values are tolerated here and clamped at the point of use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsSnapshot {
    pub mode: VizMode,
    /// Amplitude compression control, effective range [0.1, 4.0].
    pub sensitivity: f32,
    /// Spectral smoothing time constant, effective range [0, 0.99].
    pub smoothing: f32,
    /// Requested FFT size; rounded to a power of two in [32, 32768].
    pub fft_size: usize,
    /// Number of bars drawn in bars mode, effective range [32, 256].
    pub bar_count: usize,
    /// Number of particles drawn in radial mode.
    pub particle_count: usize,
    /// Palette name; unknown names resolve to the default palette.
    pub palette: String,
    /// Bars mode: draw two half-height bars mirrored around the midline.
    pub mirror_bars: bool,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            mode: VizMode::Bars,
            sensitivity: 1.0,
            smoothing: 0.8,
            fft_size: 1024,
            bar_count: 96,
            particle_count: 96,
            palette: "Neon".to_string(),
            mirror_bars: false,
        }
    }
}

impl SettingsSnapshot {
    /// The "Intense" factory preset.
    pub fn intense() -> Self {
        Self {
            mode: VizMode::Bars,
            sensitivity: 2.5,
            smoothing: 0.5,
            fft_size: 2048,
            bar_count: 128,
            particle_count: 128,
            palette: "Fire".to_string(),
            mirror_bars: true,
        }
    }

    /// The "Smooth Wave" factory preset.
    pub fn smooth_wave() -> Self {
        Self {
            mode: VizMode::Wave,
            sensitivity: 0.8,
            smoothing: 0.9,
            fft_size: 1024,
            palette: "Ocean".to_string(),
            ..Self::default()
        }
    }

    /// The "Cosmic" factory preset.
    pub fn cosmic() -> Self {
        Self {
            mode: VizMode::Radial,
            sensitivity: 1.5,
            smoothing: 0.85,
            fft_size: 2048,
            particle_count: 120,
            palette: "Aurora".to_string(),
            ..Self::default()
        }
    }

    /// Sensitivity clamped to its effective range.
    pub fn clamped_sensitivity(&self) -> f32 {
        self.sensitivity.clamp(0.1, 4.0)
    }

    /// Bar count clamped to its effective range.
    pub fn clamped_bar_count(&self) -> usize {
        self.bar_count.clamp(32, 256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_factory_preset() {
        let settings = SettingsSnapshot::default();
        assert_eq!(settings.mode, VizMode::Bars);
        assert_eq!(settings.fft_size, 1024);
        assert_eq!(settings.bar_count, 96);
        assert_eq!(settings.palette, "Neon");
        assert!(!settings.mirror_bars);
    }

    #[test]
    fn deserializes_store_documents() {
        let json = r#"{
            "mode": "radial",
            "sensitivity": 1.5,
            "smoothing": 0.85,
            "fftSize": 2048,
            "barCount": 96,
            "particleCount": 120,
            "palette": "Aurora",
            "mirrorBars": false
        }"#;
        let settings: SettingsSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(settings, SettingsSnapshot::cosmic());
    }

    #[test]
    fn unknown_mode_string_is_not_an_error() {
        let settings: SettingsSnapshot =
            serde_json::from_str(r#"{"mode": "plasma"}"#).unwrap();
        assert_eq!(settings.mode, VizMode::Unknown);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: SettingsSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, SettingsSnapshot::default());
    }

    #[test]
    fn mode_names_round_trip() {
        for (name, mode) in [
            ("bars", VizMode::Bars),
            ("wave", VizMode::Wave),
            ("radial", VizMode::Radial),
            ("3d", VizMode::Unknown),
        ] {
            assert_eq!(VizMode::from_name(name), mode);
        }
    }

    #[test]
    fn clamps_out_of_range_values() {
        let settings = SettingsSnapshot {
            sensitivity: 9.0,
            bar_count: 4,
            ..Default::default()
        };
        assert_eq!(settings.clamped_sensitivity(), 4.0);
        assert_eq!(settings.clamped_bar_count(), 32);
    }
}
