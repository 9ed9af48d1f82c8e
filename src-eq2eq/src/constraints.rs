//! eq2eq - structural constraints of RME TotalMix room EQ
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

use std::cmp::Ordering;

use crate::record::{FilterRecord, RecordKind};

fn selectivity(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NEG_INFINITY)
}

/// Order used to pick the shelf to keep: largest absolute gain first, then
/// boosts over cuts, lower frequency, larger Q and larger width. The order is
/// total so the choice does not depend on the position in the input.
fn strength(a: &FilterRecord, b: &FilterRecord) -> Ordering {
    a.gain
        .abs()
        .total_cmp(&b.gain.abs())
        .then(a.gain.total_cmp(&b.gain))
        .then(b.freq.total_cmp(&a.freq))
        .then(selectivity(a.q).total_cmp(&selectivity(b.q)))
        .then(selectivity(a.width).total_cmp(&selectivity(b.width)))
}

fn strongest<'a>(candidates: impl Iterator<Item = &'a FilterRecord>) -> Option<&'a FilterRecord> {
    candidates.max_by(|a, b| strength(a, b))
}

/// Enforce RME room EQ constraints on `LSC` and `HSC` filters.
///
/// The room EQ has a single low shelf (band 1) and a single high shelf
/// (last band). At most one `LSC` and one `HSC` are kept, the ones with the
/// largest absolute gain, with a total order on the other fields for ties.
/// The `LSC` goes first, the `HSC` last, every other filter keeps its
/// relative order in between.
pub fn enforce_rme_room_filter_constraints(records: &[FilterRecord]) -> Vec<FilterRecord> {
    let lsc = strongest(records.iter().filter(|r| r.kind == RecordKind::Lsc));
    let hsc = strongest(records.iter().filter(|r| r.kind == RecordKind::Hsc));

    let dropped = records
        .iter()
        .filter(|r| matches!(r.kind, RecordKind::Lsc | RecordKind::Hsc))
        .count()
        - usize::from(lsc.is_some())
        - usize::from(hsc.is_some());
    if dropped > 0 {
        log::debug!("RME room EQ: {} extra shelf filters dropped", dropped);
    }

    let mut result = Vec::with_capacity(records.len() - dropped);
    result.extend(lsc.cloned());
    result.extend(
        records
            .iter()
            .filter(|r| !matches!(r.kind, RecordKind::Lsc | RecordKind::Hsc))
            .cloned(),
    );
    result.extend(hsc.cloned());
    result
}
