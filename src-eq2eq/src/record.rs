//! eq2eq - canonical filter records
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

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ConvertError, Result};
use crate::iir::{Biquad, BiquadFilterType, Peq, bw2q, q2bw};

/// Filter type code carried by a [`FilterRecord`].
///
/// Codes that are not known are kept verbatim in [`RecordKind::Other`]:
/// the parsers never reject a filter because of its type, the encoders
/// decide what to do with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordKind {
    /// Peak
    Pk,
    /// Lowpass
    Lp,
    /// Highpass
    Hp,
    /// Low shelf
    Ls,
    /// High shelf
    Hs,
    /// Bandpass
    Bp,
    /// Notch
    Notch,
    /// Low shelf with a Q (APO `LSC`, RME room band 1)
    Lsc,
    /// High shelf with a Q (APO `HSC`, RME room band 9)
    Hsc,
    /// Anything else
    Other(String),
}

impl RecordKind {
    /// Parse a type code as written in APO or REW exports.
    pub fn from_code(code: &str) -> Self {
        match code {
            "PK" => RecordKind::Pk,
            "LP" => RecordKind::Lp,
            "HP" => RecordKind::Hp,
            "LS" => RecordKind::Ls,
            "HS" => RecordKind::Hs,
            "BP" => RecordKind::Bp,
            "NOTCH" => RecordKind::Notch,
            "LSC" => RecordKind::Lsc,
            "HSC" => RecordKind::Hsc,
            other => RecordKind::Other(other.to_string()),
        }
    }

    /// The type code.
    pub fn code(&self) -> &str {
        match self {
            RecordKind::Pk => "PK",
            RecordKind::Lp => "LP",
            RecordKind::Hp => "HP",
            RecordKind::Ls => "LS",
            RecordKind::Hs => "HS",
            RecordKind::Bp => "BP",
            RecordKind::Notch => "NOTCH",
            RecordKind::Lsc => "LSC",
            RecordKind::Hsc => "HSC",
            RecordKind::Other(code) => code,
        }
    }

    /// Biquad used when the record is part of a [`Peq`].
    ///
    /// Only `PK LP HP LS HS BP` are mapped; other codes do not contribute
    /// to the response.
    pub fn biquad_type(&self) -> Option<BiquadFilterType> {
        match self {
            RecordKind::Pk => Some(BiquadFilterType::Peak),
            RecordKind::Lp => Some(BiquadFilterType::Lowpass),
            RecordKind::Hp => Some(BiquadFilterType::Highpass),
            RecordKind::Ls => Some(BiquadFilterType::Lowshelf),
            RecordKind::Hs => Some(BiquadFilterType::Highshelf),
            RecordKind::Bp => Some(BiquadFilterType::Bandpass),
            _ => None,
        }
    }
}

impl From<String> for RecordKind {
    fn from(code: String) -> Self {
        RecordKind::from_code(&code)
    }
}

impl From<RecordKind> for String {
    fn from(kind: RecordKind) -> Self {
        kind.code().to_string()
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One filter as exchanged between parsers and encoders.
///
/// `q` and `width` (bandwidth in octaves) are two views of the same
/// selectivity; APO input fills both, AUNBandEQ input only `width`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRecord {
    /// Type code
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Center frequency in Hz
    pub freq: f64,
    /// Gain in dB
    pub gain: f64,
    /// Q factor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<f64>,
    /// Bandwidth in octaves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl FilterRecord {
    /// Record with a Q; the width is derived from it.
    pub fn with_q(kind: RecordKind, freq: f64, gain: f64, q: f64) -> Self {
        FilterRecord {
            kind,
            freq,
            gain,
            q: Some(q),
            width: Some(q2bw(q)),
        }
    }

    /// Record with a bandwidth in octaves only.
    pub fn with_width(kind: RecordKind, freq: f64, gain: f64, width: f64) -> Self {
        FilterRecord {
            kind,
            freq,
            gain,
            q: None,
            width: Some(width),
        }
    }

    /// Bandwidth in octaves, derived from `q` when no width is present.
    pub fn bandwidth(&self) -> Option<f64> {
        self.width.or_else(|| self.q.map(q2bw))
    }

    /// Q factor, derived from the width when present.
    pub fn quality(&self) -> Option<f64> {
        self.width.map(bw2q).or(self.q)
    }

    /// Check that the center frequency is in `(0, srate / 2)`.
    pub fn check_frequency(&self, srate: f64) -> Result<()> {
        if self.freq > 0.0 && self.freq < srate / 2.0 {
            Ok(())
        } else {
            Err(ConvertError::Encoding(format!(
                "{} filter at {} Hz is outside (0, {}) Hz",
                self.kind,
                self.freq,
                srate / 2.0
            )))
        }
    }

    /// Build the biquad for this record; `None` if its type is not mapped.
    pub fn to_biquad(&self, srate: f64) -> Result<Option<Biquad>> {
        let Some(filter_type) = self.kind.biquad_type() else {
            return Ok(None);
        };
        let q = self.quality().unwrap_or(0.0);
        Biquad::try_new(filter_type, self.freq, srate, q, self.gain)
            .map(Some)
            .map_err(|e| ConvertError::Encoding(format!("{} filter: {}", self.kind, e)))
    }
}

/// Reject the first record whose frequency does not fit the sample rate.
pub fn check_records(records: &[FilterRecord], srate: f64) -> Result<()> {
    records
        .iter()
        .try_for_each(|record| record.check_frequency(srate))
}

/// Build a PEQ from records; records with an unmapped type are dropped.
///
/// # Errors
///
/// Returns [`ConvertError::Encoding`] when a mapped record is outside
/// `(0, srate / 2)`.
pub fn records_to_peq(records: &[FilterRecord], srate: f64) -> Result<Peq> {
    let mut peq = Peq::with_capacity(records.len());
    for record in records {
        match record.to_biquad(srate)? {
            Some(biquad) => peq.push((1.0, biquad)),
            None => log::debug!("type {} has no biquad equivalent, dropped", record.kind),
        }
    }
    Ok(peq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iir::SRATE;

    #[test]
    fn codes_round_trip() {
        for code in ["PK", "LP", "HP", "LS", "HS", "BP", "NOTCH", "LSC", "HSC", "XYZ"] {
            assert_eq!(RecordKind::from_code(code).code(), code);
        }
        assert_eq!(RecordKind::from_code("XYZ"), RecordKind::Other("XYZ".into()));
    }

    #[test]
    fn only_six_codes_have_a_biquad() {
        assert_eq!(RecordKind::Pk.biquad_type(), Some(BiquadFilterType::Peak));
        assert_eq!(RecordKind::Ls.biquad_type(), Some(BiquadFilterType::Lowshelf));
        assert_eq!(RecordKind::Hs.biquad_type(), Some(BiquadFilterType::Highshelf));
        assert_eq!(RecordKind::Bp.biquad_type(), Some(BiquadFilterType::Bandpass));
        assert_eq!(RecordKind::Notch.biquad_type(), None);
        assert_eq!(RecordKind::Lsc.biquad_type(), None);
        assert_eq!(RecordKind::Hsc.biquad_type(), None);
    }

    #[test]
    fn q_and_width_views_agree() {
        let record = FilterRecord::with_q(RecordKind::Pk, 1000.0, 2.0, 1.41);
        assert!((record.quality().unwrap() - 1.41).abs() < 1e-9);

        let record = FilterRecord::with_width(RecordKind::Pk, 1000.0, 2.0, 1.0);
        assert!((record.quality().unwrap() - std::f64::consts::SQRT_2).abs() < 1e-12);
        assert_eq!(record.bandwidth(), Some(1.0));

        let mut record = FilterRecord::with_q(RecordKind::Pk, 1000.0, 2.0, 2.0);
        record.width = None;
        assert!((record.bandwidth().unwrap() - q2bw(2.0)).abs() < 1e-12);
    }

    #[test]
    fn records_to_peq_drops_unknown_types() {
        let records = vec![
            FilterRecord::with_q(RecordKind::Pk, 1000.0, 3.0, 1.0),
            FilterRecord::with_q(RecordKind::Lsc, 105.0, 2.7, 0.7),
            FilterRecord::with_q(RecordKind::Other("XX".into()), 500.0, 1.0, 1.0),
            FilterRecord::with_width(RecordKind::Hs, 8000.0, -2.0, 0.9),
        ];
        let peq = records_to_peq(&records, SRATE).unwrap();
        assert_eq!(peq.len(), 2);
        assert_eq!(peq[0].1.filter_type(), BiquadFilterType::Peak);
        assert_eq!(peq[1].1.filter_type(), BiquadFilterType::Highshelf);
        assert!(peq.iter().all(|(w, _)| *w == 1.0));
    }

    #[test]
    fn record_without_selectivity_uses_biquad_defaults() {
        let record = FilterRecord {
            kind: RecordKind::Lp,
            freq: 5000.0,
            gain: 0.0,
            q: None,
            width: None,
        };
        let biquad = record.to_biquad(SRATE).unwrap().unwrap();
        assert_eq!(biquad.q(), crate::iir::DEFAULT_Q_HIGH_LOW_PASS);
    }

    #[test]
    fn out_of_band_frequencies_are_rejected() {
        let above = FilterRecord::with_q(RecordKind::Pk, 30_000.0, 6.0, 1.0);
        let negative = FilterRecord::with_q(RecordKind::Pk, -500.0, 6.0, 1.0);
        let nyquist = FilterRecord::with_q(RecordKind::Lsc, SRATE / 2.0, 1.0, 0.7);
        for record in [&above, &negative, &nyquist] {
            assert!(matches!(record.check_frequency(SRATE), Err(ConvertError::Encoding(_))));
        }
        assert!(matches!(above.to_biquad(SRATE), Err(ConvertError::Encoding(_))));
        assert!(records_to_peq(&[negative.clone()], SRATE).is_err());
        // unmapped types build no biquad but are still checked by check_records
        assert!(nyquist.to_biquad(SRATE).unwrap().is_none());
        assert!(check_records(&[nyquist], SRATE).is_err());

        let inside = FilterRecord::with_q(RecordKind::Pk, 23_999.0, 1.0, 1.0);
        assert!(check_records(&[inside], SRATE).is_ok());
        assert!(check_records(&[], SRATE).is_ok());
    }

    #[test]
    fn serde_shape() {
        let record = FilterRecord::with_width(RecordKind::Pk, 1000.0, 3.0, 0.5);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "PK");
        assert_eq!(json["freq"], 1000.0);
        assert_eq!(json["width"], 0.5);
        assert!(json.get("q").is_none());

        let back: FilterRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
