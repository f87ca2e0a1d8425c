// THEORY:
// `EngineConfig` replaces a process-wide mutable settings object. A value is built (in
// code, or from TOML), validated once, and handed to the pipeline at construction. Every
// field has a default so a partial TOML file is enough.

use crate::core_modules::color::color::Channel;
use crate::core_modules::palette::{PaletteEntry, okabe_ito};
use crate::core_modules::simulation::simulation::{CvdKind, DeficiencyType, resolve_kind};
use crate::error::{ConfigError, Result};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_THRESHOLD: f64 = 35.0;

/// Bounds of the near-achromatic filter, in channel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// A color whose brightest channel is below this is near-black.
    pub near_black_max: Channel,
    /// A color whose darkest channel is above this is near-white.
    pub near_white_min: Channel,
    /// A color whose max-min spread is below this is grey.
    pub min_spread: Channel,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            near_black_max: 30,
            near_white_min: 240,
            min_spread: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub enabled: bool,
    /// Identifier used by reports, highlighting and inspection. Aliases allowed.
    pub deficiency: String,
    /// Carried for host surfaces. The fixed matrices ignore it.
    pub severity: f64,
    pub threshold: f64,
    /// Types tested by the fix pass, in order.
    pub fix_order: Vec<DeficiencyType>,
    pub palette: Vec<PaletteEntry>,
    pub filter: FilterConfig,
    /// Also keep replacements apart from replacements already chosen in the same pass.
    pub check_replacements_mutually: bool,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            deficiency: CvdKind::Deuteranomaly.id().to_string(),
            severity: 0.8,
            threshold: DEFAULT_THRESHOLD,
            fix_order: DeficiencyType::ALL.to_vec(),
            palette: okabe_ito(),
            filter: FilterConfig::default(),
            check_replacements_mutually: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        if !(0.0..=1.0).contains(&self.severity) {
            return Err(ConfigError::SeverityOutOfRange(self.severity));
        }
        if self.palette.len() < 2 {
            return Err(ConfigError::PaletteTooSmall(self.palette.len()));
        }
        if self.fix_order.is_empty() {
            return Err(ConfigError::NoDeficiencyTypes);
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = self.fix_order.iter().find(|ty| !seen.insert(**ty)) {
            return Err(ConfigError::DuplicateDeficiencyType(*duplicate));
        }
        if self.filter.near_black_max > self.filter.near_white_min {
            return Err(ConfigError::InvalidFilterBounds {
                near_black_max: self.filter.near_black_max,
                near_white_min: self.filter.near_white_min,
            });
        }
        Ok(())
    }

    /// The configured identifier, with the lenient protanopia fallback.
    pub fn kind(&self) -> CvdKind {
        resolve_kind(&self.deficiency)
    }
}
