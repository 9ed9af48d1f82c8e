//! eq2eq - convert parametric equalizers between formats
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
//! Input exported by REW for the AUNBandEQ or written for Equalizer APO is
//! parsed into [`FilterRecord`]s, then encoded for:
//! - Apple AUNBandEQ presets (`.aupreset`)
//! - Equalizer APO
//! - RME TotalMix channel (`.tmeq`) and room (`.tmreq`) EQs

use std::sync::Once;

pub use eq2eq_iir as iir;

pub mod cli;
pub mod config;
pub mod constraints;
pub mod error;
pub mod format;
pub mod inspect;
pub mod parse;
pub mod record;
pub mod store;

pub use constraints::enforce_rme_room_filter_constraints;
pub use error::{ConvertError, Result};
pub use format::{records_to_apo, records_to_aupreset, records_to_rme_channel, records_to_rme_room};
pub use inspect::{AupresetBand, AupresetData, inspect_aupreset};
pub use parse::{EqFormat, ParsedEq, file_to_records, guess_format, lines_to_records, text_to_records};
pub use record::{FilterRecord, RecordKind, check_records, records_to_peq};
pub use store::{StoredEq, check_hash, eq_hash, store_eq};

static INIT: Once = Once::new();

/// Initialize logging for the binaries; `RUST_LOG` overrides `default_filter`.
pub fn init_logging(default_filter: &str) {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
            .init();
    });
}
