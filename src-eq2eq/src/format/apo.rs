//! eq2eq - Equalizer APO text
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

use crate::error::Result;
use crate::iir::{peq_format_apo, peq_summary};
use crate::record::{FilterRecord, check_records, records_to_peq};

/// Format records as an Equalizer APO configuration
///
/// Records go through a PEQ first: the preamp is computed on the combined
/// response and types without a biquad (`LSC`, `HSC`, `NOTCH`, unknown)
/// are left out. Every record must be inside `(0, srate / 2)`.
pub fn records_to_apo(comment: &str, records: &[FilterRecord], srate: f64) -> Result<String> {
    check_records(records, srate)?;
    let peq = records_to_peq(records, srate)?;
    for line in peq_summary(&peq) {
        log::debug!("APO {}", line);
    }
    Ok(peq_format_apo(comment, &peq))
}
