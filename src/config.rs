//! Configuration - Engine options and the data-only player configuration.
//!
//! [`EngineOptions`] is forwarded to the engine's `init` untouched, apart from
//! the container handle and the backend, which the controller fills in.
//! [`PlayerConfig`] is the serializable part of the declarative surface; it is
//! turned into [`PlayerProps`](crate::player::PlayerProps) and callbacks are
//! attached in code.
//!
//! # Example
//!
//! ```ignore
//! let config = PlayerConfig::from_json(r#"{
//!     "audioFile": "take-3.wav",
//!     "volume": 0.8,
//!     "options": { "autoCenter": true, "audioRate": 1.25 },
//!     "regions": { "intro": { "start": 0, "end": 4.5 } }
//! }"#)?;
//!
//! for warning in config.validate() {
//!     tracing::warn!(%warning, "config");
//! }
//!
//! let (props, regions) = config.into_props()?;
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::player::PlayerProps;
use crate::types::{AudioSource, ContainerHandle, MediaSource, Peaks, RegionSet};

// =============================================================================
// Engine Options
// =============================================================================

/// Audio backend the engine should use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backend {
    #[default]
    WebAudio,
    /// Required for media-element sources.
    MediaElement,
}

/// Engine configuration passed to `init`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    /// Filled in by the controller at mount time.
    #[serde(skip)]
    pub container: Option<ContainerHandle>,
    pub backend: Backend,
    /// Playback rate. The only option applied live on change.
    pub audio_rate: Option<f64>,
    pub bar_width: Option<f64>,
    pub cursor_color: Option<String>,
    pub cursor_width: Option<i32>,
    pub drag_selection: Option<bool>,
    pub fill_parent: Option<bool>,
    pub height: Option<i32>,
    pub hide_scrollbar: Option<bool>,
    pub interact: Option<bool>,
    pub loop_selection: Option<bool>,
    pub media_controls: Option<bool>,
    pub min_px_per_sec: Option<i32>,
    pub normalize: Option<bool>,
    pub pixel_ratio: Option<f64>,
    pub progress_color: Option<String>,
    pub scroll_parent: Option<bool>,
    pub skip_length: Option<f64>,
    pub wave_color: Option<String>,
    /// Seek with `seek_and_center` instead of `seek_to`.
    pub auto_center: bool,
}

// =============================================================================
// Validation
// =============================================================================

/// Non-fatal configuration finding.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
}

impl ConfigWarning {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid `{}`: {}", self.field, self.message)
    }
}

impl EngineOptions {
    /// Check value ranges. Findings are warnings, never errors.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let non_negative = [
            ("options.cursorWidth", self.cursor_width),
            ("options.height", self.height),
            ("options.minPxPerSec", self.min_px_per_sec),
        ];
        for (field, value) in non_negative {
            if let Some(n) = value.filter(|n| *n < 0) {
                warnings.push(ConfigWarning::new(field, format!("expected a positive integer, got {n}")));
            }
        }

        if let Some(rate) = self.audio_rate.filter(|r| !(r.is_finite() && *r > 0.0)) {
            warnings.push(ConfigWarning::new("options.audioRate", format!("expected a positive number, got {rate}")));
        }

        if let Some(ratio) = self.pixel_ratio.filter(|r| !(r.is_finite() && *r > 0.0)) {
            warnings.push(ConfigWarning::new("options.pixelRatio", format!("expected a positive number, got {ratio}")));
        }

        warnings
    }
}

/// Validate the declarative player surface.
pub fn validate_props(props: &PlayerProps) -> Vec<ConfigWarning> {
    let mut warnings = props.options.validate();

    if !props.pos.is_finite() || props.pos < 0.0 {
        warnings.push(ConfigWarning::new("pos", format!("expected seconds >= 0, got {}", props.pos)));
    }

    if let Some(volume) = props.volume.filter(|v| !(0.0..=1.0).contains(v)) {
        warnings.push(ConfigWarning::new("volume", format!("expected 0..=1, got {volume}")));
    }

    if let Some(zoom) = props.zoom.filter(|z| !z.is_finite() || *z < 0.0) {
        warnings.push(ConfigWarning::new("zoom", format!("expected a non-negative number, got {zoom}")));
    }

    warnings
}

/// Validate region descriptors.
pub fn validate_regions(regions: &RegionSet) -> Vec<ConfigWarning> {
    regions
        .iter()
        .filter(|d| d.end < d.start)
        .map(|d| {
            ConfigWarning::new(
                format!("regions.{}", d.id),
                format!("end ({}) is before start ({})", d.end, d.start),
            )
        })
        .collect()
}

// =============================================================================
// Player Config
// =============================================================================

/// Serializable declarative player configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerConfig {
    pub playing: bool,
    pub pos: f64,
    /// Path/URL string. Kept loose so a wrong type is reported as a source error.
    pub audio_file: Option<serde_json::Value>,
    /// CSS-style selector resolved through the environment's media resolver.
    pub media_elt: Option<String>,
    pub audio_peaks: Option<Vec<f32>>,
    pub volume: Option<f64>,
    pub zoom: Option<f64>,
    pub responsive: bool,
    pub options: EngineOptions,
    pub regions: RegionSet,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            playing: false,
            pos: 0.0,
            audio_file: None,
            media_elt: None,
            audio_peaks: None,
            volume: None,
            zoom: None,
            responsive: true,
            options: EngineOptions::default(),
            regions: RegionSet::new(),
        }
    }
}

impl PlayerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// All warnings for this configuration.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let wrong_type = self
            .audio_file
            .as_ref()
            .is_some_and(|value| !value.is_string() && !value.is_null());
        if wrong_type {
            warnings.push(ConfigWarning::new("audioFile", "expected a path/URL string"));
        }
        warnings.extend(self.options.validate());
        warnings.extend(validate_regions(&self.regions));
        warnings
    }

    /// Convert into player props (without callbacks) and the region set.
    pub fn into_props(self) -> Result<(PlayerProps, RegionSet)> {
        let audio_file = match &self.audio_file {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(AudioSource::from_value(value)?),
        };

        let props = PlayerProps {
            playing: self.playing,
            pos: self.pos,
            audio_file,
            media_elt: self.media_elt.map(MediaSource::Selector),
            audio_peaks: self.audio_peaks.map(Peaks::from),
            volume: self.volume,
            zoom: self.zoom,
            responsive: self.responsive,
            options: self.options,
            ..PlayerProps::default()
        };

        Ok((props, self.regions))
    }
}

// =============================================================================
// Tests
// =============================================================================
