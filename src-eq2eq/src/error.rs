//! eq2eq - error types
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

use std::path::PathBuf;

/// Errors returned by the parsers, encoders and the command line front end.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// No known dialect was recognised in the input
    #[error("unsupported format: cannot recognise an AUNBandEQ or APO equalizer")]
    UnsupportedFormat,

    /// A dialect was recognised but no filter could be extracted
    #[error("no usable filter found in {0}")]
    EmptyResult(String),

    /// The target document could not be generated
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// An AUpreset document could not be decoded
    #[error("cannot inspect preset: {0}")]
    Inspect(String),

    /// The command line asks for something that cannot be done
    #[error("usage: {0}")]
    Usage(String),

    /// A configuration value is invalid
    #[error("invalid configuration {name}={value}: {reason}")]
    Config {
        /// Name of the setting (environment variable)
        name: String,
        /// Offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Reading or writing a file failed
    #[error("cannot access {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, ConvertError>;
