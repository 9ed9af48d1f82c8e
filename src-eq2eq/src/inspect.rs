//! eq2eq - decode Apple AUNBandEQ presets
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
use byteorder::{BigEndian, ByteOrder};
use quick_xml::Reader as XmlReader;
use quick_xml::events::Event;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ConvertError, Result};
use crate::format::aupreset::{
    AUPRESET_BANDS, AUPRESET_HEADER_BYTES, BAND_ACTIVE, K_AUNBANDEQ_PARAM_BANDWIDTH,
    K_AUNBANDEQ_PARAM_BYPASS_BAND, K_AUNBANDEQ_PARAM_FILTER_TYPE, K_AUNBANDEQ_PARAM_FREQUENCY,
    K_AUNBANDEQ_PARAM_GAIN, apple_type_to_record,
};
use crate::record::{FilterRecord, RecordKind};

/// One band of an AUNBandEQ preset, values as stored (f32).
#[derive(Debug, Clone, PartialEq)]
pub struct AupresetBand {
    /// Band index, from 0
    pub index: usize,
    /// Band is not bypassed
    pub active: bool,
    /// Apple filter type value
    pub type_code: f32,
    /// Record type for the values the encoder writes
    pub kind: Option<RecordKind>,
    /// Frequency in Hz
    pub freq: f32,
    /// Gain in dB
    pub gain: f32,
    /// Bandwidth in octaves
    pub width: f32,
}

impl fmt::Display for AupresetBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:2} {} {:3} {:5.0}Hz {:+2.2}dB {:1.2}",
            self.index + 1,
            if self.active { "ON" } else { "KO" },
            self.kind.as_ref().map(|k| k.code()).unwrap_or("??"),
            self.freq,
            self.gain,
            self.width
        )
    }
}

/// Content of an AUNBandEQ preset.
#[derive(Debug, Clone, PartialEq)]
pub struct AupresetData {
    /// Value of the `name` key, if any
    pub name: Option<String>,
    /// Number of `(id, value)` pairs
    pub parameter_count: usize,
    /// Global gain in dB
    pub preamp_gain: f32,
    /// The 16 bands
    pub bands: Vec<AupresetBand>,
}

impl AupresetData {
    /// Filters of the active bands with a known type.
    pub fn records(&self) -> Vec<FilterRecord> {
        self.bands
            .iter()
            .filter(|band| band.active)
            .filter_map(|band| match &band.kind {
                Some(kind) => Some(FilterRecord::with_width(
                    kind.clone(),
                    band.freq as f64,
                    band.gain as f64,
                    band.width as f64,
                )),
                None => {
                    log::debug!("band {}: unknown type {}", band.index + 1, band.type_code);
                    None
                }
            })
            .collect()
    }
}

fn inspect_error(message: impl Into<String>) -> ConvertError {
    ConvertError::Inspect(message.into())
}

/// Decode the binary parameter block of a preset.
pub fn decode_aupreset_bytes(buffer: &[u8]) -> Result<AupresetData> {
    if buffer.len() < AUPRESET_HEADER_BYTES {
        return Err(inspect_error(format!(
            "{} bytes is too short for a header",
            buffer.len()
        )));
    }
    let ndata = BigEndian::read_i32(&buffer[8..12]);
    let preamp_gain = BigEndian::read_f32(&buffer[16..20]);
    let parameter_count = usize::try_from(ndata.saturating_sub(1))
        .map_err(|_| inspect_error(format!("invalid parameter count {}", ndata)))?;

    let needed = AUPRESET_HEADER_BYTES + parameter_count * 8;
    if buffer.len() < needed {
        return Err(inspect_error(format!(
            "{} parameters need {} bytes, got {}",
            parameter_count,
            needed,
            buffer.len()
        )));
    }

    let params: BTreeMap<i32, f32> = buffer[AUPRESET_HEADER_BYTES..needed]
        .chunks_exact(8)
        .map(|pair| (BigEndian::read_i32(&pair[0..4]), BigEndian::read_f32(&pair[4..8])))
        .collect();

    let param = |base: i32, index: usize| -> Result<f32> {
        let id = base + index as i32;
        params
            .get(&id)
            .copied()
            .ok_or_else(|| inspect_error(format!("parameter {} is missing", id)))
    };

    let mut bands = Vec::with_capacity(AUPRESET_BANDS);
    for index in 0..AUPRESET_BANDS {
        let type_code = param(K_AUNBANDEQ_PARAM_FILTER_TYPE, index)?;
        bands.push(AupresetBand {
            index,
            active: param(K_AUNBANDEQ_PARAM_BYPASS_BAND, index)? == BAND_ACTIVE,
            type_code,
            kind: apple_type_to_record(type_code),
            freq: param(K_AUNBANDEQ_PARAM_FREQUENCY, index)?,
            gain: param(K_AUNBANDEQ_PARAM_GAIN, index)?,
            width: param(K_AUNBANDEQ_PARAM_BANDWIDTH, index)?,
        });
    }

    Ok(AupresetData {
        name: None,
        parameter_count,
        preamp_gain,
        bands,
    })
}

/// Extract the `name` string and the base64 `data` text of a preset plist.
fn read_plist(xml: &str) -> Result<(Option<String>, String)> {
    let mut reader = XmlReader::from_str(xml);

    let mut text = String::new();
    let mut last_key = String::new();
    let mut name = None;
    let mut data = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => text.clear(),
            Ok(Event::Text(e)) => text.push_str(&String::from_utf8_lossy(&e)),
            Ok(Event::GeneralRef(e)) => {
                let entity = String::from_utf8_lossy(&e);
                match quick_xml::escape::resolve_xml_entity(&entity) {
                    Some(value) => text.push_str(value),
                    None => log::debug!("unknown entity &{};", entity),
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"key" => last_key = text.trim().to_string(),
                b"string" if last_key == "name" => name = Some(text.clone()),
                b"data" => data = Some(text.clone()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(inspect_error(format!(
                    "XML error at position {}: {}",
                    reader.error_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| inspect_error("no data element"))?;
    Ok((name, data))
}

/// Decode an AUNBandEQ preset document.
///
/// # Arguments
/// * `xml` - the plist as written by the Apple tools or by
///   [`records_to_aupreset`](crate::format::records_to_aupreset)
pub fn inspect_aupreset(xml: &str) -> Result<AupresetData> {
    let (name, data) = read_plist(xml)?;
    let b64: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    if b64.is_empty() {
        return Err(inspect_error("data element is empty"));
    }
    let buffer = general_purpose::STANDARD
        .decode(b64.as_bytes())
        .map_err(|e| inspect_error(format!("invalid base64: {}", e)))?;

    let mut preset = decode_aupreset_bytes(&buffer)?;
    preset.name = name;
    Ok(preset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::aupreset::{records_to_aupreset, records_to_aupreset_bytes};
    use crate::iir::SRATE;

    #[test]
    fn decodes_encoded_bands() {
        let records = vec![
            FilterRecord::with_width(RecordKind::Pk, 1000.0, 3.0, 1.0),
            FilterRecord::with_width(RecordKind::Hs, 8000.0, -2.5, 0.75),
        ];
        let buffer = records_to_aupreset_bytes(&records, SRATE).unwrap();
        let preset = decode_aupreset_bytes(&buffer).unwrap();
        assert_eq!(preset.parameter_count, 80);
        assert_eq!(preset.bands.len(), 16);
        assert!(preset.bands[0].active);
        assert_eq!(preset.bands[1].kind, Some(RecordKind::Hs));
        assert_eq!(preset.bands[1].type_code, 9.0);
        assert!(!preset.bands[2].active);
        assert_eq!(preset.records(), records);
    }

    #[test]
    fn reads_name_with_entities() {
        let xml = records_to_aupreset(&[], "A&B <1>", SRATE).unwrap();
        let preset = inspect_aupreset(&xml).unwrap();
        assert_eq!(preset.name.as_deref(), Some("A&B <1>"));
        assert_eq!(preset.preamp_gain, 0.0);
        assert!(preset.records().is_empty());
    }

    #[test]
    fn unknown_types_are_not_records() {
        let records = vec![FilterRecord::with_q(RecordKind::Lsc, 100.0, 2.0, 0.7)];
        let xml = records_to_aupreset(&records, "x", SRATE).unwrap();
        let preset = inspect_aupreset(&xml).unwrap();
        assert!(preset.bands[0].active);
        assert_eq!(preset.bands[0].type_code, -1.0);
        assert_eq!(preset.bands[0].kind, None);
        assert!(preset.records().is_empty());
    }

    #[test]
    fn short_buffers_are_errors() {
        assert!(matches!(
            decode_aupreset_bytes(&[0u8; 10]),
            Err(ConvertError::Inspect(_))
        ));
        let buffer = records_to_aupreset_bytes(&[], SRATE).unwrap();
        assert!(matches!(
            decode_aupreset_bytes(&buffer[..100]),
            Err(ConvertError::Inspect(_))
        ));
    }

    #[test]
    fn documents_without_data_are_errors() {
        let xml = "<plist><dict><key>name</key><string>x</string></dict></plist>";
        assert!(matches!(inspect_aupreset(xml), Err(ConvertError::Inspect(_))));
        let xml = "<plist><dict><data>\n\t\n</data></dict></plist>";
        assert!(matches!(inspect_aupreset(xml), Err(ConvertError::Inspect(_))));
        let xml = "<plist><dict><data>!!!not base64!!!</data></dict></plist>";
        assert!(matches!(inspect_aupreset(xml), Err(ConvertError::Inspect(_))));
    }

    #[test]
    fn band_display() {
        let band = AupresetBand {
            index: 0,
            active: true,
            type_code: 0.0,
            kind: Some(RecordKind::Pk),
            freq: 1000.0,
            gain: 3.0,
            width: 1.0,
        };
        assert_eq!(band.to_string(), " 1 ON PK   1000Hz +3.00dB 1.00");
    }
}
