//! eq2eq - detect and parse equalizer exports
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

use std::fmt;
use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::iir::q2bw;
use crate::record::{FilterRecord, RecordKind};

/// Marker written by REW when it exports for Apple's AUNBandEQ
pub const AUNBANDEQ_MARKER: &str = "AU_N-Band_EQ";

/// Input dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqFormat {
    /// REW export for AUNBandEQ (bandwidth in octaves)
    AUNBandEQ,
    /// Equalizer APO text (also used by AutoEQ)
    APO,
    /// Nothing recognised
    Unknown,
}

impl fmt::Display for EqFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EqFormat::AUNBandEQ => "AUNBandEQ",
            EqFormat::APO => "APO",
            EqFormat::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEq {
    /// Detected dialect
    pub format: EqFormat,
    /// Filters in file order
    pub records: Vec<FilterRecord>,
    /// Non blank lines that did not describe a filter
    pub skipped: usize,
}

/// Guess the dialect of an export by looking at all its lines.
pub fn guess_format<S: AsRef<str>>(lines: &[S]) -> EqFormat {
    let mut has_width = false;
    let mut has_filter = false;
    let mut has_q = false;
    for line in lines {
        let line = line.as_ref();
        has_width |= line.contains(AUNBANDEQ_MARKER);
        has_filter |= line.contains("Filter ");
        has_q |= line.contains(" Q ");
    }

    if has_width {
        EqFormat::AUNBandEQ
    } else if has_filter && has_q {
        EqFormat::APO
    } else {
        EqFormat::Unknown
    }
}

fn parse_f64(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Center frequencies must be positive; the upper bound depends on the
/// sample rate and is checked by the encoders.
fn parse_freq(token: &str) -> Option<f64> {
    parse_f64(token).filter(|freq| *freq > 0.0)
}

fn aunbandeq_record(tokens: &[&str]) -> Option<FilterRecord> {
    if tokens.len() != 8 || tokens[0] == "Number" || tokens[3] == "None" {
        return None;
    }
    Some(FilterRecord::with_width(
        RecordKind::from_code(tokens[3]),
        parse_freq(tokens[4])?,
        parse_f64(tokens[5])?,
        parse_f64(tokens[6])?,
    ))
}

fn apo_record(tokens: &[&str]) -> Option<FilterRecord> {
    if tokens.len() != 12 || tokens[0] != "Filter" || tokens[2] != "ON" {
        return None;
    }
    let q = parse_f64(tokens[11])?;
    if q <= 0.0 {
        return None;
    }
    Some(FilterRecord {
        kind: RecordKind::from_code(tokens[3]),
        freq: parse_freq(tokens[5])?,
        gain: parse_f64(tokens[8])?,
        q: Some(q),
        width: Some(q2bw(q)),
    })
}

fn parse_lines<S, F>(format: EqFormat, lines: &[S], parse_line: F) -> ParsedEq
where
    S: AsRef<str>,
    F: Fn(&[&str]) -> Option<FilterRecord>,
{
    let mut records = Vec::new();
    let mut skipped = 0;
    for (lineno, line) in lines.iter().enumerate() {
        let tokens: Vec<&str> = line.as_ref().split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        match parse_line(&tokens) {
            Some(record) => records.push(record),
            None => {
                log::debug!("{} line {} skipped: {}", format, lineno + 1, line.as_ref());
                skipped += 1;
            }
        }
    }
    ParsedEq {
        format,
        records,
        skipped,
    }
}

/// Parse the lines of a REW AUNBandEQ export.
pub fn parse_aunbandeq<S: AsRef<str>>(lines: &[S]) -> ParsedEq {
    parse_lines(EqFormat::AUNBandEQ, lines, aunbandeq_record)
}

/// Parse the lines of an Equalizer APO configuration.
pub fn parse_apo<S: AsRef<str>>(lines: &[S]) -> ParsedEq {
    parse_lines(EqFormat::APO, lines, apo_record)
}

/// Detect the dialect and parse all filters.
///
/// Only an unknown dialect is an error; a recognised file without any
/// usable filter gives an empty list (see [`require_filters`]).
pub fn lines_to_records<S: AsRef<str>>(lines: &[S]) -> Result<ParsedEq> {
    match guess_format(lines) {
        EqFormat::AUNBandEQ => Ok(parse_aunbandeq(lines)),
        EqFormat::APO => Ok(parse_apo(lines)),
        EqFormat::Unknown => Err(ConvertError::UnsupportedFormat),
    }
}

/// Parse a whole text buffer.
pub fn text_to_records(text: &str) -> Result<ParsedEq> {
    let lines: Vec<&str> = text.lines().collect();
    lines_to_records(&lines)
}

/// Read and parse a file.
pub fn file_to_records(path: &Path) -> Result<ParsedEq> {
    let text = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    let parsed = text_to_records(&text)?;
    log::info!(
        "{}: {} filters ({}), {} lines skipped",
        path.display(),
        parsed.records.len(),
        parsed.format,
        parsed.skipped
    );
    Ok(parsed)
}

/// Reject a parse that produced no filter.
pub fn require_filters(parsed: ParsedEq, source: &str) -> Result<Vec<FilterRecord>> {
    if parsed.records.is_empty() {
        return Err(ConvertError::EmptyResult(source.to_string()));
    }
    Ok(parsed.records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const APO: &str = "Preamp: -6.2 dB
Filter 1: ON LSC Fc 105 Hz Gain 2.7 dB Q 0.70
Filter 2: ON PK Fc 208 Hz Gain -2.7 dB Q 0.64
Filter 3: ON HP Fc 20 Hz
Filter 4: OFF PK Fc 2019 Hz Gain 5.3 dB Q 2.46
Filter 5: ON PK Fc 8501 Hz Gain 3.9 dB Q 2.88
";

    const AUNBANDEQ: &str = "Filter Settings file

Room EQ V5.20
Dated: 12 Mar 2023 10:11:12

Notes:

Equaliser: AU_N-Band_EQ
Number Enabled Control Type Frequency(Hz) Gain(dB) Bandwidth(oct) Q
1 True Auto PK 62.5 -3.50 0.5000 2.87
2 True Auto PK 1250 2.00 1.0000 1.41
3 True Auto None 0 0.00 0.0000 0.00
4 True Auto LS 80.0 4.00 0.9000 1.07
";

    #[test]
    fn detects_aunbandeq_marker_first() {
        let lines = ["Equaliser: AU_N-Band_EQ", "Filter 1: ON PK Fc 1 Hz Gain 1 dB Q 1"];
        assert_eq!(guess_format(&lines), EqFormat::AUNBandEQ);
    }

    #[test]
    fn detects_apo() {
        let lines: Vec<&str> = APO.lines().collect();
        assert_eq!(guess_format(&lines), EqFormat::APO);
    }

    #[test]
    fn apo_needs_filter_and_q() {
        assert_eq!(guess_format(&["Filter 1: ON LP Fc 100 Hz"]), EqFormat::Unknown);
        assert_eq!(guess_format(&["Preamp: 0 dB", " Q "]), EqFormat::Unknown);
        assert_eq!(guess_format::<&str>(&[]), EqFormat::Unknown);
    }

    #[test]
    fn unknown_format_is_an_error() {
        let err = text_to_records("hello\nworld\n").unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedFormat));
    }

    #[test]
    fn parses_apo_filters() {
        let parsed = text_to_records(APO).unwrap();
        assert_eq!(parsed.format, EqFormat::APO);
        assert_eq!(parsed.records.len(), 3);
        // preamp, HP line and OFF line
        assert_eq!(parsed.skipped, 3);

        let first = &parsed.records[0];
        assert_eq!(first.kind, RecordKind::Lsc);
        assert_eq!(first.freq, 105.0);
        assert_eq!(first.gain, 2.7);
        assert_eq!(first.q, Some(0.70));
        assert!((first.width.unwrap() - q2bw(0.70)).abs() < 1e-12);

        assert_eq!(parsed.records[2].freq, 8501.0);
    }

    #[test]
    fn parses_aunbandeq_filters() {
        let parsed = text_to_records(AUNBANDEQ).unwrap();
        assert_eq!(parsed.format, EqFormat::AUNBandEQ);
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(
            parsed.records[0],
            FilterRecord::with_width(RecordKind::Pk, 62.5, -3.5, 0.5)
        );
        assert_eq!(parsed.records[2].kind, RecordKind::Ls);
        assert_eq!(parsed.records[2].width, Some(0.9));
        assert_eq!(parsed.records[2].q, None);
    }

    #[test]
    fn garbage_in_known_dialect_is_empty_not_error() {
        let text = "Filter this Q please\nFilter 1: ON PK Fc abc Hz Gain 1 dB Q 1\n";
        let parsed = text_to_records(text).unwrap();
        assert_eq!(parsed.format, EqFormat::APO);
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.skipped, 2);

        let err = require_filters(parsed, "garbage.txt").unwrap_err();
        assert!(matches!(err, ConvertError::EmptyResult(ref name) if name == "garbage.txt"));
    }

    #[test]
    fn non_positive_frequencies_are_skipped() {
        let text = "Filter 1: ON PK Fc -500 Hz Gain 6 dB Q 1.00
Filter 2: ON PK Fc 0 Hz Gain 6 dB Q 1.00
Filter 3: ON PK Fc 30000 Hz Gain 6 dB Q 1.00
";
        let parsed = text_to_records(text).unwrap();
        assert_eq!(parsed.skipped, 2);
        // the upper bound needs a sample rate
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].freq, 30000.0);

        let parsed = text_to_records("Equaliser: AU_N-Band_EQ\n1 True Auto PK -62.5 -3.50 0.5000 2.87\n").unwrap();
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.skipped, 2);
    }

    #[test]
    fn unknown_codes_are_kept() {
        let parsed = text_to_records("Filter 1: ON XYZ Fc 100 Hz Gain 1.0 dB Q 1.0\n").unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].kind, RecordKind::Other("XYZ".into()));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = file_to_records(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, ConvertError::Io { .. }));
    }
}
