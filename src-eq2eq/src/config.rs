//! eq2eq - environment variable utilities
//!
//! Copyright (C) 2025 Pierre Aubert pierre(at)spinorama(dot)org
//!
//! This program is free software: you can redistribute it and/or modify
//! it under the terms of the GNU General Public License as published by
//! the Free Software Foundation, either version 3 of the License, or
//! (at your option) any later version.
//!
//! This program is distributed in the hope that it will be useful,
//! but WITHOUT ANY WARRANTY; without even the implied warranty of
//! MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//! GNU General Public License for more details.
//!
//! You should have received a copy of the GNU General Public License
//! along with this program.  If not, see <https://www.gnu.org/licenses/>.
//!
//! Settings are read from the environment once, at start up:
//! - `EQ2EQ_SAMPLE_RATE`: sample rate used to compute preamp gains
//! - `EQ2EQ_PRESET_DIR`: where `--install` puts AUNBandEQ presets

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};
use crate::iir::SRATE;

/// Environment variable for the sample rate
pub const ENV_SAMPLE_RATE: &str = "EQ2EQ_SAMPLE_RATE";
/// Environment variable for the AUNBandEQ preset directory
pub const ENV_PRESET_DIR: &str = "EQ2EQ_PRESET_DIR";
/// Preset directory relative to the home directory
pub const DEFAULT_PRESET_SUBDIR: &str = "Library/Audio/Presets/Apple/AUNBandEQ";

/// Resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Install directory for aupreset files, unknown without `HOME`
    pub preset_dir: Option<PathBuf>,
}

impl Config {
    /// Read the settings from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if `EQ2EQ_SAMPLE_RATE` is not a positive number.
    /// A missing preset directory is only an error for `--install`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use eq2eq::config::Config;
    ///
    /// let config = Config::from_env()?;
    /// if let Some(dir) = &config.preset_dir {
    ///     println!("presets go to {}", dir.display());
    /// }
    /// # Ok::<(), eq2eq::ConvertError>(())
    /// ```
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sample_rate = match lookup(ENV_SAMPLE_RATE) {
            Some(value) => parse_sample_rate(&value)?,
            None => SRATE,
        };

        let preset_dir = match lookup(ENV_PRESET_DIR) {
            Some(dir) if !dir.trim().is_empty() => Some(PathBuf::from(dir)),
            _ => lookup("HOME")
                .filter(|home| !home.is_empty())
                .map(|home| PathBuf::from(home).join(DEFAULT_PRESET_SUBDIR)),
        };

        log::debug!(
            "config: sample rate {} Hz, preset dir {:?}",
            sample_rate,
            preset_dir
        );
        Ok(Config {
            sample_rate,
            preset_dir,
        })
    }

    /// The preset directory, required by `--install`.
    pub fn require_preset_dir(&self) -> Result<&Path> {
        self.preset_dir.as_deref().ok_or_else(|| ConvertError::Config {
            name: ENV_PRESET_DIR.to_string(),
            value: String::new(),
            reason: "not set and HOME is unknown".to_string(),
        })
    }
}

fn parse_sample_rate(value: &str) -> Result<f64> {
    let invalid = |reason: &str| ConvertError::Config {
        name: ENV_SAMPLE_RATE.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };
    let rate: f64 = value.trim().parse().map_err(|_| invalid("not a number"))?;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(invalid("must be a positive number of Hz"));
    }
    Ok(rate)
}
