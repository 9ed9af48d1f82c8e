//! eq2eq - Apple AUNBandEQ presets (aupreset)
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

use base64::{Engine as _, engine::general_purpose};
use byteorder::{BigEndian, WriteBytesExt};
use std::collections::BTreeMap;

use crate::error::{ConvertError, Result};
use crate::iir::peq_preamp_gain;
use crate::record::{FilterRecord, RecordKind, check_records, records_to_peq};

// Apple AUNBandEQ parameter constants
pub(crate) const K_AUNBANDEQ_PARAM_BYPASS_BAND: i32 = 1000;
pub(crate) const K_AUNBANDEQ_PARAM_FILTER_TYPE: i32 = 2000;
pub(crate) const K_AUNBANDEQ_PARAM_FREQUENCY: i32 = 3000;
pub(crate) const K_AUNBANDEQ_PARAM_GAIN: i32 = 4000;
pub(crate) const K_AUNBANDEQ_PARAM_BANDWIDTH: i32 = 5000;

// Filter type values as written by REW for the AUNBandEQ
const AUNBANDEQ_TYPE_PARAMETRIC: f32 = 0.0;
const AUNBANDEQ_TYPE_BAND_PASS: f32 = 6.0;
const AUNBANDEQ_TYPE_LOW_SHELF: f32 = 8.0;
const AUNBANDEQ_TYPE_HIGH_SHELF: f32 = 9.0;
const AUNBANDEQ_TYPE_UNKNOWN: f32 = -1.0;

/// Bypass value of a band holding a filter
pub(crate) const BAND_ACTIVE: f32 = 0.0;
/// Bypass value of an unused band
pub(crate) const BAND_BYPASSED: f32 = 1.0;

/// The AU host only loads presets with exactly 16 bands
pub const AUPRESET_BANDS: usize = 16;
/// Number of parameters + 1, as expected by the AU host
pub(crate) const AUPRESET_NDATA: i32 = 81;
/// Size of the header in front of the parameters
pub(crate) const AUPRESET_HEADER_BYTES: usize = 20;
/// Width of the base64 lines in the `data` element
pub const AUPRESET_LINE_WIDTH: usize = 67;

/// Value of `ParametricType` in the plist
pub const AUPRESET_PARAMETRIC_TYPE: i64 = 11;
/// Apple's manufacturer code (`appl`)
pub const AUPRESET_MANUFACTURER: i64 = 1634758764;
/// AUNBandEQ subtype code (`nbeq`)
pub const AUPRESET_SUBTYPE: i64 = 1851942257;
/// Audio unit type code (`aufx`)
pub const AUPRESET_TYPE: i64 = 1635083896;

/// Convert a record type to the AUNBandEQ filter type value
pub(crate) fn record_to_apple_type(kind: &RecordKind) -> f32 {
    match kind {
        RecordKind::Pk => AUNBANDEQ_TYPE_PARAMETRIC,
        RecordKind::Ls => AUNBANDEQ_TYPE_LOW_SHELF,
        RecordKind::Hs => AUNBANDEQ_TYPE_HIGH_SHELF,
        RecordKind::Bp => AUNBANDEQ_TYPE_BAND_PASS,
        _ => AUNBANDEQ_TYPE_UNKNOWN,
    }
}

/// Inverse of [`record_to_apple_type`] for the values it produces
pub(crate) fn apple_type_to_record(value: f32) -> Option<RecordKind> {
    match value {
        v if v == AUNBANDEQ_TYPE_PARAMETRIC => Some(RecordKind::Pk),
        v if v == AUNBANDEQ_TYPE_LOW_SHELF => Some(RecordKind::Ls),
        v if v == AUNBANDEQ_TYPE_HIGH_SHELF => Some(RecordKind::Hs),
        v if v == AUNBANDEQ_TYPE_BAND_PASS => Some(RecordKind::Bp),
        _ => None,
    }
}

fn encoding_error(err: std::io::Error) -> ConvertError {
    ConvertError::Encoding(err.to_string())
}

/// Build the binary parameter block: header then `(id, value)` pairs.
pub fn records_to_aupreset_bytes(records: &[FilterRecord], srate: f64) -> Result<Vec<u8>> {
    if records.len() > AUPRESET_BANDS {
        log::warn!(
            "AUNBandEQ holds {} bands: {} filters dropped",
            AUPRESET_BANDS,
            records.len() - AUPRESET_BANDS
        );
    }
    let used = &records[..records.len().min(AUPRESET_BANDS)];
    check_records(used, srate)?;
    let preamp_gain = peq_preamp_gain(&records_to_peq(used, srate)?);

    let mut params = BTreeMap::new();
    for (i, record) in used.iter().enumerate() {
        let width = record.bandwidth().ok_or_else(|| {
            ConvertError::Encoding(format!(
                "filter {} ({} at {} Hz) has neither a width nor a Q",
                i + 1,
                record.kind,
                record.freq
            ))
        })?;
        let idx = i as i32;
        params.insert(K_AUNBANDEQ_PARAM_BYPASS_BAND + idx, BAND_ACTIVE);
        params.insert(K_AUNBANDEQ_PARAM_FILTER_TYPE + idx, record_to_apple_type(&record.kind));
        params.insert(K_AUNBANDEQ_PARAM_FREQUENCY + idx, record.freq as f32);
        params.insert(K_AUNBANDEQ_PARAM_GAIN + idx, record.gain as f32);
        params.insert(K_AUNBANDEQ_PARAM_BANDWIDTH + idx, width as f32);
    }
    for i in used.len()..AUPRESET_BANDS {
        let idx = i as i32;
        params.insert(K_AUNBANDEQ_PARAM_BYPASS_BAND + idx, BAND_BYPASSED);
        params.insert(K_AUNBANDEQ_PARAM_FILTER_TYPE + idx, 0.0);
        params.insert(K_AUNBANDEQ_PARAM_FREQUENCY + idx, 0.0);
        params.insert(K_AUNBANDEQ_PARAM_GAIN + idx, 0.0);
        params.insert(K_AUNBANDEQ_PARAM_BANDWIDTH + idx, 0.0);
    }

    let mut buffer = Vec::with_capacity(AUPRESET_HEADER_BYTES + params.len() * 8);
    // only ndata and the preamp gain are meaningful in the header
    buffer.write_i32::<BigEndian>(0).map_err(encoding_error)?;
    buffer.write_i32::<BigEndian>(0).map_err(encoding_error)?;
    buffer.write_i32::<BigEndian>(AUPRESET_NDATA).map_err(encoding_error)?;
    buffer.write_i32::<BigEndian>(0).map_err(encoding_error)?;
    buffer.write_f32::<BigEndian>(preamp_gain as f32).map_err(encoding_error)?;

    for (param_id, value) in params.iter() {
        buffer.write_i32::<BigEndian>(*param_id).map_err(encoding_error)?;
        buffer.write_f32::<BigEndian>(*value).map_err(encoding_error)?;
    }

    Ok(buffer)
}

/// base64 text split in tab indented lines of [`AUPRESET_LINE_WIDTH`] characters.
pub fn format_data_block(buffer: &[u8]) -> String {
    let b64_text = general_purpose::STANDARD.encode(buffer);
    b64_text
        .as_bytes()
        .chunks(AUPRESET_LINE_WIDTH)
        .map(|chunk| format!("\t{}", String::from_utf8_lossy(chunk)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format records as an Apple AUNBandEQ preset (aupreset) plist XML
///
/// # Arguments
/// * `records` - filters, at most 16 are used
/// * `name` - Name for the preset
/// * `srate` - sample rate used to compute the preamp gain
pub fn records_to_aupreset(records: &[FilterRecord], name: &str, srate: f64) -> Result<String> {
    let buffer = records_to_aupreset_bytes(records, srate)?;
    let data_section = format_data_block(&buffer);

    Ok(format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>ParametricType</key>
	<integer>{}</integer>
	<key>data</key>
	<data>
{}
	</data>
	<key>manufacturer</key>
	<integer>{}</integer>
	<key>name</key>
	<string>{}</string>
	<key>numberOfBands</key>
	<integer>{}</integer>
	<key>subtype</key>
	<integer>{}</integer>
	<key>type</key>
	<integer>{}</integer>
	<key>version</key>
	<integer>0</integer>
</dict>
</plist>
"#,
        AUPRESET_PARAMETRIC_TYPE,
        data_section,
        AUPRESET_MANUFACTURER,
        quick_xml::escape::escape(name),
        AUPRESET_BANDS,
        AUPRESET_SUBTYPE,
        AUPRESET_TYPE,
    ))
}
