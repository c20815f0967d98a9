//! Parsed preset description consumed by the chain loader.
//!
//! The preset file format itself belongs to the frontend's configuration
//! parser; this module only defines the shape of its output. Everything here
//! is plain serde-derived data, read-only to the core.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Ordered multi-pass chain description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainDescription {
    pub passes: Vec<PassConfig>,
}

/// One configured pass: where its source lives plus the frontend's filter
/// and scale hints for the pass's render target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PassConfig {
    /// Source path, usually relative to the preset file.
    pub source_path: PathBuf,
    #[serde(default)]
    pub filter: FilterHint,
    #[serde(default)]
    pub scale: ScaleHint,
}

impl PassConfig {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            ..Self::default()
        }
    }
}

/// Texture filtering requested for a pass's input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterHint {
    #[default]
    Unspecified,
    Linear,
}

/// Render-target scale requested for a pass. `valid` is false when the
/// preset left the scale unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleHint {
    pub valid: bool,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl ScaleHint {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl Default for ScaleHint {
    fn default() -> Self {
        Self::invalid()
    }
}

/// Resolve a pass source path against the preset it came from. Absolute
/// paths pass through untouched.
pub fn resolve_source_path(preset_path: &Path, source: &Path) -> PathBuf {
    if source.is_absolute() {
        return source.to_path_buf();
    }
    match preset_path.parent() {
        Some(dir) => dir.join(source),
        None => source.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_sources_resolve_against_preset_directory() {
        let resolved = resolve_source_path(
            Path::new("/presets/crt/chain.preset"),
            Path::new("shaders/pass0.glsl"),
        );
        assert_eq!(resolved, Path::new("/presets/crt/shaders/pass0.glsl"));
    }

    #[test]
    fn absolute_sources_pass_through() {
        let resolved = resolve_source_path(
            Path::new("/presets/chain.preset"),
            Path::new("/opt/shaders/pass0.glsl"),
        );
        assert_eq!(resolved, Path::new("/opt/shaders/pass0.glsl"));
    }

    #[test]
    fn description_round_trips_through_json() {
        let description = ChainDescription {
            passes: vec![
                PassConfig {
                    source_path: "a.glsl".into(),
                    filter: FilterHint::Linear,
                    scale: ScaleHint {
                        valid: true,
                        scale_x: 2.0,
                        scale_y: 2.0,
                    },
                },
                PassConfig::new("b.glsl"),
            ],
        };

        let json = serde_json::to_string(&description).unwrap();
        let back: ChainDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(back.passes.len(), 2);
        assert_eq!(back.passes[0].filter, FilterHint::Linear);
        assert!(back.passes[0].scale.valid);
        assert_eq!(back.passes[1].filter, FilterHint::Unspecified);
        assert!(!back.passes[1].scale.valid);
    }
}
