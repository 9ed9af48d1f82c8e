//! eq2eq - parametric equalizer banks
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

use ndarray::Array1;
use serde::Serialize;

use crate::biquad::{Biquad, BiquadFilterType};

/// Type alias for a Parametric EQ - a collection of weighted biquad filters
/// Each tuple contains (weight, biquad_filter); a weight of 0 disables the filter.
pub type Peq = Vec<(f64, Biquad)>;

/// Number of points used to look for the maximum of a PEQ response
pub const PREAMP_GRID_POINTS: usize = 1000;
/// Number of points used for response graphs
pub const GRAPH_GRID_POINTS: usize = 200;
/// Safety margin added by [`peq_preamp_gain_conservative`] in dB
pub const PREAMP_MARGIN_DB: f64 = 0.2;

/// Logarithmic frequency grid from 20 Hz to 20 kHz.
pub fn freq_grid(points: usize) -> Array1<f64> {
    Array1::logspace(10.0, 20.0_f64.log10(), 20_000.0_f64.log10(), points)
}

/// Compute SPL for each frequency given a PEQ
///
/// # Arguments
/// * `freq` - Array of frequencies to compute response for
/// * `peq` - PEQ vector containing weighted biquad filters
///
/// # Returns
/// * Array of SPL values in dB for each frequency; zeros for an empty PEQ
pub fn peq_spl(freq: &Array1<f64>, peq: &Peq) -> Array1<f64> {
    let mut current_filter = Array1::zeros(freq.len());

    for (weight, iir) in peq {
        current_filter += &(iir.np_log_result(freq) * *weight);
    }

    current_filter
}

fn max_positive(spl: &Array1<f64>) -> f64 {
    spl.iter().cloned().fold(0.0f64, |acc, x| acc.max(x.max(0.0)))
}

/// Compute preamp gain for a PEQ: well adapted to computers
///
/// # Arguments
/// * `peq` - PEQ vector containing weighted biquad filters
///
/// # Returns
/// * Preamp gain in dB, never positive
pub fn peq_preamp_gain(peq: &Peq) -> f64 {
    if peq.is_empty() {
        return 0.0;
    }
    let freq = freq_grid(PREAMP_GRID_POINTS);
    let spl = peq_spl(&freq, peq);
    // subtraction keeps a flat response at +0.0
    0.0 - max_positive(&spl)
}

/// Compute preamp gain for a PEQ and look at the worst case
///
/// Some processors clip on each biquad rather than on the sum. The worst
/// individual filter and the combined curve are both evaluated and the
/// margin-adjusted worst case is logged, but the value returned is the
/// combined-curve headroom, as [`peq_preamp_gain`] would compute it.
pub fn peq_preamp_gain_conservative(peq: &Peq) -> f64 {
    if peq.is_empty() {
        return 0.0;
    }

    let freq = freq_grid(PREAMP_GRID_POINTS);
    let spl = peq_spl(&freq, peq);

    let mut individual: f64 = 0.0;
    for (_, iir) in peq {
        let single_peq = vec![(1.0, iir.clone())];
        individual = individual.max(max_positive(&peq_spl(&freq, &single_peq)));
    }

    let overall = max_positive(&spl);
    let worst = -(individual.max(overall) + PREAMP_MARGIN_DB);
    log::debug!(
        "preamp gain: {:.2} (overall {:.2} individual {:.2})",
        worst,
        overall,
        individual
    );

    0.0 - overall
}

/// Check if two PEQs are equal
///
/// Compares two PEQ vectors for equality, checking both weights and biquad parameters
pub fn peq_equal(left: &Peq, right: &Peq) -> bool {
    if left.len() != right.len() {
        return false;
    }

    left.iter().zip(right.iter()).all(|((w1, b1), (w2, b2))| {
        (w1 - w2).abs() < f64::EPSILON
            && b1.filter_type() == b2.filter_type()
            && (b1.freq() - b2.freq()).abs() < f64::EPSILON
            && (b1.srate() - b2.srate()).abs() < f64::EPSILON
            && (b1.q() - b2.q()).abs() < f64::EPSILON
            && (b1.db_gain() - b2.db_gain()).abs() < f64::EPSILON
    })
}

/// Format the active filters of a PEQ, one per line.
pub fn peq_summary(peq: &Peq) -> Vec<String> {
    peq.iter()
        .filter(|(weight, _)| *weight != 0.0)
        .map(|(_, iir)| iir.to_string())
        .collect()
}

/// Format PEQ as APO configuration string
///
/// # Arguments
/// * `comment` - Comment string to include at the top
/// * `peq` - PEQ vector containing weighted biquad filters
///
/// # Returns
/// * String formatted for EqualizerAPO, filters numbered in bank order
pub fn peq_format_apo(comment: &str, peq: &Peq) -> String {
    let mut res = Vec::new();
    res.push(comment.to_string());
    res.push(format!("Preamp: {:.1} dB", peq_preamp_gain(peq)));
    res.push(String::new());

    for (i, (_, iir)) in peq.iter().enumerate() {
        let kind = iir.filter_type();
        let line = match kind {
            BiquadFilterType::Peak | BiquadFilterType::Notch | BiquadFilterType::Bandpass => {
                format!(
                    "Filter {:2}: ON {:2} Fc {:5} Hz Gain {:+0.2} dB Q {:0.2}",
                    i + 1,
                    kind.short_name(),
                    iir.freq() as i32,
                    iir.db_gain(),
                    iir.q()
                )
            }
            BiquadFilterType::Lowpass | BiquadFilterType::Highpass => {
                format!(
                    "Filter {:2}: ON {:2} Fc {:5} Hz",
                    i + 1,
                    kind.short_name(),
                    iir.freq() as i32
                )
            }
            BiquadFilterType::Lowshelf | BiquadFilterType::Highshelf => {
                format!(
                    "Filter {:2}: ON {:2} Fc {:5} Hz Gain {:+0.2} dB",
                    i + 1,
                    kind.short_name(),
                    iir.freq() as i32,
                    iir.db_gain()
                )
            }
        };
        res.push(line);
    }

    res.push(String::new());
    res.join("\n")
}

/// Frequency response of a PEQ sampled on a frequency grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplGraph {
    /// Frequencies in Hz
    pub freq: Vec<f64>,
    /// Response in dB
    pub spl: Vec<f64>,
}

/// Combined response of a PEQ on the 200 points graph grid.
pub fn peq_graph(peq: &Peq) -> SplGraph {
    let freq = freq_grid(GRAPH_GRID_POINTS);
    let spl = peq_spl(&freq, peq);
    SplGraph {
        freq: freq.to_vec(),
        spl: spl.to_vec(),
    }
}

/// Response of each filter of a PEQ, in bank order.
pub fn peq_graph_details(peq: &Peq) -> Vec<SplGraph> {
    let freq = freq_grid(GRAPH_GRID_POINTS);
    peq.iter()
        .map(|(weight, iir)| SplGraph {
            freq: freq.to_vec(),
            spl: (iir.np_log_result(&freq) * *weight).to_vec(),
        })
        .collect()
}
