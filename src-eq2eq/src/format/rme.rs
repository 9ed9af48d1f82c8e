//! eq2eq - RME TotalMix channel (tmeq) and room (tmreq) presets
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

use crate::constraints::enforce_rme_room_filter_constraints;
use crate::error::{ConvertError, Result};
use crate::iir::peq_preamp_gain;
use crate::record::{FilterRecord, RecordKind, check_records, records_to_peq};

/// Bands of the channel EQ
pub const RME_CHANNEL_BANDS: usize = 3;
/// Bands of the room EQ, per channel
pub const RME_ROOM_BANDS: usize = 9;

/// Low cut slope written in channel presets
const RME_LC_GRADE: f64 = 1.0;
/// Low cut frequency written in channel presets
const RME_LC_FREQ: f64 = 20.0;

const RME_TYPE_PEAK: f64 = 0.0;
const RME_TYPE_SHELF: f64 = 1.0;
const RME_TYPE_HIGH_CUT: f64 = 2.0;
const RME_TYPE_LOW_CUT: f64 = 3.0;

/// Where a band sits in the EQ; only the outer bands have a type selector.
#[derive(Debug, Clone, Copy, PartialEq)]
enum BandSlot {
    First,
    Middle,
    Last,
}

fn slot(pos: usize, bands: usize) -> BandSlot {
    if pos == 1 {
        BandSlot::First
    } else if pos == bands {
        BandSlot::Last
    } else {
        BandSlot::Middle
    }
}

/// RME type code of a record at a given band.
///
/// The first band can be a low shelf, the last one a high shelf; lowpass and
/// highpass swap their code between the two ends. Middle bands are peaks.
fn rme_band_type(kind: &RecordKind, slot: BandSlot) -> Option<f64> {
    match (kind, slot) {
        (RecordKind::Pk, _) => Some(RME_TYPE_PEAK),
        (RecordKind::Lp, BandSlot::First) => Some(RME_TYPE_LOW_CUT),
        (RecordKind::Lp, BandSlot::Last) => Some(RME_TYPE_HIGH_CUT),
        (RecordKind::Hp, BandSlot::First) => Some(RME_TYPE_HIGH_CUT),
        (RecordKind::Hp, BandSlot::Last) => Some(RME_TYPE_LOW_CUT),
        (RecordKind::Ls | RecordKind::Lsc, BandSlot::First) => Some(RME_TYPE_SHELF),
        (RecordKind::Hs | RecordKind::Hsc, BandSlot::Last) => Some(RME_TYPE_SHELF),
        _ => None,
    }
}

/// Round to the 2 decimals written in presets; `+ 0.0` turns `-0.0` into `0.0`.
fn two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

fn val(name: &str, value: f64) -> String {
    format!("\t<val e=\"{}\" v=\"{:.2},\"/>", name, two_decimals(value))
}

fn push_bands(lines: &mut Vec<String>, bands: &[(usize, &FilterRecord)], nbands: usize) -> Result<()> {
    for (pos, record) in bands {
        let q = record.quality().ok_or_else(|| {
            ConvertError::Encoding(format!(
                "band {} ({} at {} Hz) has neither a width nor a Q",
                pos, record.kind, record.freq
            ))
        })?;
        lines.push(val(&format!("Band{} Freq", pos), record.freq));
        lines.push(val(&format!("Band{} Q", pos), q));
        lines.push(val(&format!("Band{} Gain", pos), record.gain));
    }
    for (pos, record) in bands {
        match rme_band_type(&record.kind, slot(*pos, nbands)) {
            Some(code) => lines.push(val(&format!("Band{} Type", pos), code)),
            None => log::debug!(
                "RME band {}: type {} is not selectable there, left as is",
                pos,
                record.kind
            ),
        }
    }
    Ok(())
}

/// Format records as an RME TotalMix channel EQ preset (tmeq).
///
/// The channel EQ has 3 bands; extra filters are dropped. Kept filters
/// must be inside `(0, srate / 2)`.
pub fn records_to_rme_channel(records: &[FilterRecord], srate: f64) -> Result<String> {
    if records.len() > RME_CHANNEL_BANDS {
        log::warn!(
            "RME channel EQ holds {} bands: {} filters dropped",
            RME_CHANNEL_BANDS,
            records.len() - RME_CHANNEL_BANDS
        );
    }
    let bands: Vec<(usize, &FilterRecord)> = records
        .iter()
        .take(RME_CHANNEL_BANDS)
        .enumerate()
        .map(|(i, r)| (i + 1, r))
        .collect();
    check_records(&records[..bands.len()], srate)?;

    let mut lines = vec![
        "<Preset>".to_string(),
        "  <Equalizer>".to_string(),
        "    <Params>".to_string(),
        val("LC Grade", RME_LC_GRADE),
        val("LC Freq", RME_LC_FREQ),
    ];
    push_bands(&mut lines, &bands, RME_CHANNEL_BANDS)?;
    lines.push("    </Params>".to_string());
    lines.push("  </Equalizer>".to_string());
    lines.push("</Preset>".to_string());

    Ok(lines.join("\n"))
}

/// Assign records to the 9 room bands: `LSC` on band 1, `HSC` on band 9,
/// the others in order on the bands in between.
fn room_layout(records: &[FilterRecord]) -> Vec<(usize, &FilterRecord)> {
    let mut first = 1;
    let mut last = RME_ROOM_BANDS;
    let mut layout = Vec::with_capacity(RME_ROOM_BANDS);
    let mut middle = records;

    if let Some((lsc, rest)) = middle.split_first() {
        if lsc.kind == RecordKind::Lsc {
            layout.push((first, lsc));
            first += 1;
            middle = rest;
        }
    }
    let mut hsc = None;
    if let Some((candidate, rest)) = middle.split_last() {
        if candidate.kind == RecordKind::Hsc {
            hsc = Some(candidate);
            last -= 1;
            middle = rest;
        }
    }

    let capacity = last + 1 - first;
    if middle.len() > capacity {
        log::warn!(
            "RME room EQ has {} free bands: {} filters dropped",
            capacity,
            middle.len() - capacity
        );
    }
    layout.extend(middle.iter().take(capacity).enumerate().map(|(i, r)| (first + i, r)));
    if let Some(hsc) = hsc {
        layout.push((RME_ROOM_BANDS, hsc));
    }
    layout
}

fn push_room_channel(
    lines: &mut Vec<String>,
    tag: &str,
    records: &[FilterRecord],
    srate: f64,
) -> Result<()> {
    let constrained = enforce_rme_room_filter_constraints(records);
    let bands = room_layout(&constrained);
    let used: Vec<FilterRecord> = bands.iter().map(|(_, r)| (*r).clone()).collect();
    check_records(&used, srate)?;
    let preamp_gain = peq_preamp_gain(&records_to_peq(&used, srate)?);

    lines.push(format!("  <{}>", tag));
    lines.push("    <Params>".to_string());
    lines.push(val("Volume Cal.", preamp_gain));
    push_bands(lines, &bands, RME_ROOM_BANDS)?;
    lines.push("    </Params>".to_string());
    lines.push(format!("  </{}>", tag));
    Ok(())
}

/// Format records as an RME TotalMix room EQ preset (tmreq).
///
/// # Arguments
/// * `left` - filters of the left channel
/// * `right` - filters of the right channel, the left ones when `None` or empty
/// * `srate` - sample rate used to compute the volume calibration
///
/// # Notes
/// Each channel goes through [`enforce_rme_room_filter_constraints`]
/// first. An empty input still gives a complete document.
pub fn records_to_rme_room(
    left: &[FilterRecord],
    right: Option<&[FilterRecord]>,
    srate: f64,
) -> Result<String> {
    let right = match right {
        Some(records) if !records.is_empty() => records,
        _ => left,
    };

    let mut lines = vec!["<Preset>".to_string()];
    push_room_channel(&mut lines, "Room_EQ_L", left, srate)?;
    push_room_channel(&mut lines, "Room_EQ_R", right, srate)?;
    lines.push("</Preset>".to_string());

    Ok(lines.join("\n"))
}
