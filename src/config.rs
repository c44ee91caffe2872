use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::composite::policy::OccupancyColorPolicy;
use crate::foundation::error::{CoverlapError, CoverlapResult};
use crate::mask::naming::MaskNaming;

pub const DEFAULT_MASK_PREFIX: &str = "cloakp";
pub const DEFAULT_MASK_EXTENSION: &str = "png";
pub const DEFAULT_VIEWER_SENTINEL: &str = "position of viewer";
pub const DEFAULT_JITTER_DEGREES: f64 = 0.005;

/// Tunables for a full bundle-to-artifacts run.
///
/// Every field has a default, so an empty JSON object (`{}`) is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Case-insensitive prefix every coverage-mask entry starts with. Stripped to form output keys.
    pub mask_prefix: String,
    /// Extension (without the dot) every coverage-mask entry ends with.
    pub mask_extension: String,
    /// Exact `<description>` text of the placemark holding the viewer position.
    pub viewer_sentinel: String,
    pub color: ColorConfig,
    /// Half-width of the uniform jitter window, in decimal degrees.
    pub jitter_degrees: f64,
    /// Rayon worker count for compositing groups. `None` uses rayon's default.
    pub threads: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    pub base: [u8; 3],
    pub saturation_count: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mask_prefix: DEFAULT_MASK_PREFIX.to_string(),
            mask_extension: DEFAULT_MASK_EXTENSION.to_string(),
            viewer_sentinel: DEFAULT_VIEWER_SENTINEL.to_string(),
            color: ColorConfig::default(),
            jitter_degrees: DEFAULT_JITTER_DEGREES,
            threads: None,
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            base: OccupancyColorPolicy::DEFAULT_BASE,
            saturation_count: OccupancyColorPolicy::DEFAULT_SATURATION_COUNT,
        }
    }
}

impl PipelineConfig {
    pub fn from_reader<R: std::io::Read>(r: R) -> CoverlapResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| CoverlapError::config(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> CoverlapResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CoverlapError::config(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> CoverlapResult<()> {
        if self.mask_prefix.is_empty() {
            return Err(CoverlapError::config("mask_prefix must not be empty"));
        }
        if self.mask_extension.is_empty() || self.mask_extension.starts_with('.') {
            return Err(CoverlapError::config(
                "mask_extension must be non-empty and given without a leading '.'",
            ));
        }
        if self.color.saturation_count == 0 {
            return Err(CoverlapError::config("color.saturation_count must be >= 1"));
        }
        if !self.jitter_degrees.is_finite() || self.jitter_degrees < 0.0 {
            return Err(CoverlapError::config(
                "jitter_degrees must be finite and non-negative",
            ));
        }
        if let Some(n) = self.threads
            && n == 0
        {
            return Err(CoverlapError::config("threads must be >= 1 when set"));
        }
        Ok(())
    }

    pub fn naming(&self) -> MaskNaming {
        MaskNaming::new(&self.mask_prefix, &self.mask_extension)
    }

    pub fn color_policy(&self) -> OccupancyColorPolicy {
        OccupancyColorPolicy::new(self.color.base, self.color.saturation_count)
    }
}
