//! eq2eq - biquad filters and Q/bandwidth conversions
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
use std::f64::consts::PI;
use std::fmt;

use crate::IirError;

/// Converts bandwidth in octaves to a Q factor.
pub fn bw2q(bw: f64) -> f64 {
    let two_pow_bw = 2.0_f64.powf(bw);
    two_pow_bw.sqrt() / (two_pow_bw - 1.0)
}

/// Converts a Q factor to bandwidth in octaves.
///
/// The argument of the square root must stay `>= 1`, which holds for any
/// strictly positive `q`.
pub fn q2bw(q: f64) -> f64 {
    let q2 = (2.0 * q * q + 1.0) / (2.0 * q * q);
    (q2 + (q2 * q2 - 1.0).sqrt()).ln() / 2.0_f64.ln()
}

/// Default Q factor for high/low pass filters
pub const DEFAULT_Q_HIGH_LOW_PASS: f64 = 1.0 / std::f64::consts::SQRT_2;
/// Default Q factor for high/low shelf filters
pub const DEFAULT_Q_HIGH_LOW_SHELF: f64 = 1.0668676536332304; // Value of bw2q(0.9)
/// Notch filters always use this Q
pub const NOTCH_Q: f64 = 30.0;

/// Sample rate used when a preset does not carry one
pub const SRATE: f64 = 48000.0;

/// Value returned by [`Biquad::log_result`] when the magnitude is not positive
pub const SILENCE_DB: f64 = -200.0;

/// Filter types for biquad filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BiquadFilterType {
    /// Low-pass filter
    Lowpass,
    /// High-pass filter
    Highpass,
    /// Band-pass filter (0 dB peak gain)
    Bandpass,
    /// Peaking filter
    Peak,
    /// Notch filter
    Notch,
    /// Low-shelf filter
    Lowshelf,
    /// High-shelf filter
    Highshelf,
}

impl BiquadFilterType {
    /// Returns the short string representation of the filter type (e.g., "LP").
    pub fn short_name(&self) -> &'static str {
        match self {
            BiquadFilterType::Lowpass => "LP",
            BiquadFilterType::Highpass => "HP",
            BiquadFilterType::Bandpass => "BP",
            BiquadFilterType::Peak => "PK",
            BiquadFilterType::Notch => "NO",
            BiquadFilterType::Lowshelf => "LS",
            BiquadFilterType::Highshelf => "HS",
        }
    }

    /// Returns the long string representation of the filter type (e.g., "Lowpass").
    pub fn long_name(&self) -> &'static str {
        match self {
            BiquadFilterType::Lowpass => "Lowpass",
            BiquadFilterType::Highpass => "Highpass",
            BiquadFilterType::Bandpass => "Bandpass",
            BiquadFilterType::Peak => "Peak",
            BiquadFilterType::Notch => "Notch",
            BiquadFilterType::Lowshelf => "Lowshelf",
            BiquadFilterType::Highshelf => "Highshelf",
        }
    }

    /// Q used when the caller passes `q == 0`, if the type has one.
    fn default_q(&self) -> Option<f64> {
        match self {
            BiquadFilterType::Bandpass | BiquadFilterType::Highpass | BiquadFilterType::Lowpass => {
                Some(DEFAULT_Q_HIGH_LOW_PASS)
            }
            BiquadFilterType::Lowshelf | BiquadFilterType::Highshelf => {
                Some(DEFAULT_Q_HIGH_LOW_SHELF)
            }
            BiquadFilterType::Peak | BiquadFilterType::Notch => None,
        }
    }
}

/// Normalized coefficients (a0 == 1) and the constants used by [`Biquad::result`].
#[derive(Debug, Clone, Copy, PartialEq)]
struct Coefficients {
    a1: f64,
    a2: f64,
    b0: f64,
    b1: f64,
    b2: f64,
    r_up0: f64,
    r_up1: f64,
    r_up2: f64,
    r_dw0: f64,
    r_dw1: f64,
    r_dw2: f64,
}

impl Coefficients {
    fn compute(filter_type: BiquadFilterType, freq: f64, srate: f64, q: f64, db_gain: f64) -> Self {
        let a = 10.0_f64.powf(db_gain / 40.0);
        let omega = 2.0 * PI * freq / srate;
        let sn = omega.sin();
        let cs = omega.cos();
        let alpha = sn / (2.0 * q);
        let beta = (a + a).sqrt();

        // (b0, b1, b2, a0, a1, a2)
        let (b0, b1, b2, a0, a1, a2) = match filter_type {
            BiquadFilterType::Lowpass => (
                (1.0 - cs) / 2.0,
                1.0 - cs,
                (1.0 - cs) / 2.0,
                1.0 + alpha,
                -2.0 * cs,
                1.0 - alpha,
            ),
            BiquadFilterType::Highpass => (
                (1.0 + cs) / 2.0,
                -(1.0 + cs),
                (1.0 + cs) / 2.0,
                1.0 + alpha,
                -2.0 * cs,
                1.0 - alpha,
            ),
            // constant 0 dB peak gain form, not the constant skirt one (b0 = q * alpha)
            BiquadFilterType::Bandpass => {
                (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cs, 1.0 - alpha)
            }
            BiquadFilterType::Notch => (1.0, -2.0 * cs, 1.0, 1.0 + alpha, -2.0 * cs, 1.0 - alpha),
            BiquadFilterType::Peak => (
                1.0 + (alpha * a),
                -2.0 * cs,
                1.0 - (alpha * a),
                1.0 + (alpha / a),
                -2.0 * cs,
                1.0 - (alpha / a),
            ),
            BiquadFilterType::Lowshelf => (
                a * ((a + 1.0) - (a - 1.0) * cs + beta * sn),
                2.0 * a * ((a - 1.0) - (a + 1.0) * cs),
                a * ((a + 1.0) - (a - 1.0) * cs - beta * sn),
                (a + 1.0) + (a - 1.0) * cs + beta * sn,
                -2.0 * ((a - 1.0) + (a + 1.0) * cs),
                (a + 1.0) + (a - 1.0) * cs - beta * sn,
            ),
            BiquadFilterType::Highshelf => (
                a * ((a + 1.0) + (a - 1.0) * cs + beta * sn),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * cs),
                a * ((a + 1.0) + (a - 1.0) * cs - beta * sn),
                (a + 1.0) - (a - 1.0) * cs + beta * sn,
                2.0 * ((a - 1.0) - (a + 1.0) * cs),
                (a + 1.0) - (a - 1.0) * cs - beta * sn,
            ),
        };

        let b0 = b0 / a0;
        let b1 = b1 / a0;
        let b2 = b2 / a0;
        let a1 = a1 / a0;
        let a2 = a2 / a0;

        Coefficients {
            a1,
            a2,
            b0,
            b1,
            b2,
            r_up0: (b0 + b1 + b2).powi(2),
            r_up1: -4.0 * (b0 * b1 + 4.0 * b0 * b2 + b1 * b2),
            r_up2: 16.0 * b0 * b2,
            r_dw0: (1.0 + a1 + a2).powi(2),
            r_dw1: -4.0 * (a1 + 4.0 * a2 + a1 * a2),
            r_dw2: 16.0 * a2,
        }
    }
}

/// Represents a single biquad IIR filter.
///
/// A `Biquad` is immutable: the coefficients are derived once in [`Biquad::new`]
/// and the parameters are only exposed through accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct Biquad {
    filter_type: BiquadFilterType,
    freq: f64,
    srate: f64,
    q: f64,
    db_gain: f64,
    coeffs: Coefficients,
}

impl Biquad {
    /// Creates and initializes a new Biquad filter.
    ///
    /// Notch filters always get `q = 30`; a zero `q` is replaced by the
    /// default of the filter family.
    pub fn new(filter_type: BiquadFilterType, freq: f64, srate: f64, q: f64, db_gain: f64) -> Self {
        let mut q = q;
        if filter_type == BiquadFilterType::Notch {
            q = NOTCH_Q;
        } else if q == 0.0 {
            if let Some(default_q) = filter_type.default_q() {
                q = default_q;
            }
        }

        // alpha = sn/(2*q) must stay finite
        if q <= 0.0 {
            q = 1.0e-2;
        }

        Biquad {
            filter_type,
            freq,
            srate,
            q,
            db_gain,
            coeffs: Coefficients::compute(filter_type, freq, srate, q, db_gain),
        }
    }

    /// Same as [`Biquad::new`] but checks `0 < freq < srate / 2` first.
    pub fn try_new(
        filter_type: BiquadFilterType,
        freq: f64,
        srate: f64,
        q: f64,
        db_gain: f64,
    ) -> Result<Self, IirError> {
        if !(freq > 0.0 && freq < srate / 2.0) {
            return Err(IirError::InvalidFrequency { freq, srate });
        }
        Ok(Self::new(filter_type, freq, srate, q, db_gain))
    }

    /// The type of filter
    pub fn filter_type(&self) -> BiquadFilterType {
        self.filter_type
    }

    /// Center frequency in Hz
    pub fn freq(&self) -> f64 {
        self.freq
    }

    /// Sample rate in Hz
    pub fn srate(&self) -> f64 {
        self.srate
    }

    /// Q factor after defaults have been applied
    pub fn q(&self) -> f64 {
        self.q
    }

    /// Gain in dB (only meaningful for peaking and shelving filters)
    pub fn db_gain(&self) -> f64 {
        self.db_gain
    }

    /// Calculates the filter's magnitude response at a single frequency `f`.
    pub fn result(&self, f: f64) -> f64 {
        let c = &self.coeffs;
        let phi = (PI * f / self.srate).sin().powi(2);
        let phi2 = phi * phi;

        let numerator = c.r_up0 + c.r_up1 * phi + c.r_up2 * phi2;
        let denominator = c.r_dw0 + c.r_dw1 * phi + c.r_dw2 * phi2;

        let result = (numerator / denominator).max(0.0);
        result.sqrt()
    }

    /// Calculates the filter's response in dB at a single frequency `f`.
    pub fn log_result(&self, f: f64) -> f64 {
        let result = self.result(f);
        if result > 0.0 {
            20.0 * result.log10()
        } else {
            SILENCE_DB
        }
    }

    /// Vectorized version of [`Biquad::log_result`] for a vector of frequencies.
    pub fn np_log_result(&self, freq: &Array1<f64>) -> Array1<f64> {
        let c = &self.coeffs;
        let srate = self.srate;
        let phi = freq.mapv(|f| (PI * f / srate).sin().powi(2));
        let phi2 = &phi * &phi;

        let r_up = c.r_up0 + c.r_up1 * &phi + c.r_up2 * &phi2;
        let r_dw = c.r_dw0 + c.r_dw1 * &phi + c.r_dw2 * &phi2;
        let r = r_up / r_dw;

        r.mapv(|val| {
            let magnitude = val.max(0.0).sqrt();
            if magnitude > 0.0 {
                20.0 * magnitude.log10()
            } else {
                SILENCE_DB
            }
        })
    }

    /// Returns the filter coefficients as a tuple `(a1, a2, b0, b1, b2)`.
    pub fn constants(&self) -> (f64, f64, f64, f64, f64) {
        let c = &self.coeffs;
        (c.a1, c.a2, c.b0, c.b1, c.b2)
    }
}

impl fmt::Display for Biquad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type:{},Freq:{:.1},Rate:{:.1},Q:{:.1},Gain:{:.1}",
            self.filter_type.short_name(),
            self.freq,
            self.srate,
            self.q,
            self.db_gain
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_bw_q_roundtrip() {
        let mut q = 0.3;
        while q <= 20.0 {
            let bw = q2bw(q);
            let q2 = bw2q(bw);
            assert!(
                approx_eq(q, q2, 1e-6),
                "roundtrip failed: q={} -> bw={} -> q2={}",
                q,
                bw,
                q2
            );
            q += 0.1;
        }
    }

    #[test]
    fn test_q_bw_roundtrip() {
        for &bw in &[0.1, 0.5, 0.9, 1.0, 2.0, 3.0] {
            let back = q2bw(bw2q(bw));
            assert!(approx_eq(bw, back, 1e-6), "bw={} came back as {}", bw, back);
        }
    }

    #[test]
    fn test_default_shelf_q_matches_bw2q() {
        assert!(approx_eq(DEFAULT_Q_HIGH_LOW_SHELF, bw2q(0.9), 1e-12));
    }

    #[test]
    fn test_one_octave_is_sqrt2() {
        assert!(approx_eq(bw2q(1.0), std::f64::consts::SQRT_2, 1e-12));
    }

    #[test]
    fn notch_forces_q() {
        let bq = Biquad::new(BiquadFilterType::Notch, 1_000.0, SRATE, 2.0, 0.0);
        assert_eq!(bq.q(), NOTCH_Q);
    }

    #[test]
    fn zero_q_uses_family_default() {
        for kind in [
            BiquadFilterType::Lowpass,
            BiquadFilterType::Highpass,
            BiquadFilterType::Bandpass,
        ] {
            let bq = Biquad::new(kind, 1_000.0, SRATE, 0.0, 0.0);
            assert_eq!(bq.q(), DEFAULT_Q_HIGH_LOW_PASS);
        }
        for kind in [BiquadFilterType::Lowshelf, BiquadFilterType::Highshelf] {
            let bq = Biquad::new(kind, 1_000.0, SRATE, 0.0, 3.0);
            assert_eq!(bq.q(), DEFAULT_Q_HIGH_LOW_SHELF);
        }
    }

    #[test]
    fn peak_with_zero_q_is_safely_clamped() {
        let bq = Biquad::new(BiquadFilterType::Peak, 1_000.0, 48_000.0, 0.0, 3.0);
        let freqs = array![20.0, 100.0, 1_000.0, 10_000.0, 20_000.0];
        let resp = bq.np_log_result(&freqs);
        for (i, v) in resp.iter().enumerate() {
            assert!(v.is_finite(), "response at idx {} not finite: {}", i, v);
        }
    }

    #[test]
    fn try_new_rejects_out_of_band_frequency() {
        assert!(Biquad::try_new(BiquadFilterType::Peak, 0.0, SRATE, 1.0, 1.0).is_err());
        assert!(Biquad::try_new(BiquadFilterType::Peak, 24_000.0, SRATE, 1.0, 1.0).is_err());
        assert!(Biquad::try_new(BiquadFilterType::Peak, 23_999.0, SRATE, 1.0, 1.0).is_ok());
    }

    #[test]
    fn coefficients_are_normalized() {
        // lowpass at fs/4 with Q=1/sqrt(2): textbook values
        let bq = Biquad::new(BiquadFilterType::Lowpass, 12_000.0, SRATE, 0.0, 0.0);
        let (a1, a2, b0, b1, b2) = bq.constants();
        assert!(approx_eq(a1, 0.0, 1e-12));
        assert!(approx_eq(b0, b2, 1e-12));
        assert!(approx_eq(b1, 2.0 * b0, 1e-12));
        // DC gain of a lowpass is 1
        assert!(approx_eq((b0 + b1 + b2) / (1.0 + a1 + a2), 1.0, 1e-12));
    }

    #[test]
    fn peak_reaches_gain_at_center() {
        for &gain in &[-12.0, -3.0, 3.0, 6.0, 12.0] {
            for &freq in &[50.0, 1_000.0, 8_000.0] {
                let bq = Biquad::new(BiquadFilterType::Peak, freq, SRATE, 1.4, gain);
                let db = bq.log_result(freq);
                assert!(approx_eq(db, gain, 0.1), "freq {} gain {} got {}", freq, gain, db);
            }
        }
    }

    #[test]
    fn peak_decays_far_from_center() {
        let bq = Biquad::new(BiquadFilterType::Peak, 1_000.0, SRATE, 4.0, 6.0);
        assert!(bq.log_result(20.0).abs() < 0.05);
        assert!(bq.log_result(20_000.0).abs() < 0.1);
    }

    #[test]
    fn shelves_reach_gain_on_plateau() {
        let ls = Biquad::new(BiquadFilterType::Lowshelf, 1_000.0, SRATE, 0.7, 6.0);
        assert!(approx_eq(ls.log_result(10.0), 6.0, 0.1));
        assert!(approx_eq(ls.log_result(1_000.0), 3.0, 0.1));
        assert!(ls.log_result(20_000.0).abs() < 0.1);

        let hs = Biquad::new(BiquadFilterType::Highshelf, 1_000.0, SRATE, 0.7, -4.0);
        assert!(approx_eq(hs.log_result(20_000.0), -4.0, 0.1));
        assert!(approx_eq(hs.log_result(1_000.0), -2.0, 0.1));
        assert!(hs.log_result(20.0).abs() < 0.1);
    }

    #[test]
    fn notch_is_deep_at_center() {
        let bq = Biquad::new(BiquadFilterType::Notch, 1_000.0, SRATE, 0.0, 0.0);
        assert!(bq.log_result(1_000.0) < -60.0);
        assert!(bq.log_result(100.0).abs() < 0.1);
    }

    #[test]
    fn pass_filters_are_3db_down_at_cutoff() {
        let lp = Biquad::new(BiquadFilterType::Lowpass, 1_000.0, SRATE, 0.0, 0.0);
        assert!(approx_eq(lp.log_result(1_000.0), -3.01, 0.05));
        assert!(lp.log_result(20.0).abs() < 0.01);
        let hp = Biquad::new(BiquadFilterType::Highpass, 1_000.0, SRATE, 0.0, 0.0);
        assert!(approx_eq(hp.log_result(1_000.0), -3.01, 0.05));
        assert!(hp.log_result(15_000.0).abs() < 0.05);
        let bp = Biquad::new(BiquadFilterType::Bandpass, 1_000.0, SRATE, 2.0, 0.0);
        assert!(approx_eq(bp.result(1_000.0), 1.0, 1e-6));
        assert!(bp.log_result(100.0) < -20.0);
    }

    #[test]
    fn vectorized_matches_scalar() {
        let freqs = Array1::logspace(10.0, 1.0, 4.3, 300);
        let kinds = [
            BiquadFilterType::Lowpass,
            BiquadFilterType::Highpass,
            BiquadFilterType::Bandpass,
            BiquadFilterType::Peak,
            BiquadFilterType::Notch,
            BiquadFilterType::Lowshelf,
            BiquadFilterType::Highshelf,
        ];
        for kind in kinds {
            let bq = Biquad::new(kind, 1_234.0, SRATE, 0.9, -4.5);
            let vectorized = bq.np_log_result(&freqs);
            for (f, v) in freqs.iter().zip(vectorized.iter()) {
                let scalar = bq.log_result(*f);
                assert!(
                    approx_eq(scalar, *v, 1e-6),
                    "{} at {} Hz: scalar {} vectorized {}",
                    kind.long_name(),
                    f,
                    scalar,
                    v
                );
            }
        }
    }

    #[test]
    fn display_uses_short_name() {
        let bq = Biquad::new(BiquadFilterType::Peak, 1_000.0, SRATE, 1.0, 3.0);
        assert_eq!(bq.to_string(), "Type:PK,Freq:1000.0,Rate:48000.0,Q:1.0,Gain:3.0");
    }
}
