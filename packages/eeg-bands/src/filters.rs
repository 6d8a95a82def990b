//! Digital Filter Implementations
//!
//! Butterworth IIR filters built from second-order sections (biquads) for
//! numerical stability, plus zero-phase forward-backward application for
//! finite recordings.

use crate::error::{EegError, Result};
use std::f64::consts::PI;

/// Second-order section (biquad) coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Gain at DC (z = 1)
    fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }
}

/// State for a single biquad section (Direct Form II Transposed)
#[derive(Debug, Clone, Default)]
struct BiquadState {
    z1: f64,
    z2: f64,
}

/// Single biquad filter section
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    coeffs: BiquadCoeffs,
    state: BiquadState,
}

impl BiquadFilter {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            state: BiquadState::default(),
        }
    }

    /// Process a single sample using Direct Form II Transposed
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.coeffs.b0 * input + self.state.z1;
        self.state.z1 = self.coeffs.b1 * input - self.coeffs.a1 * output + self.state.z2;
        self.state.z2 = self.coeffs.b2 * input - self.coeffs.a2 * output;
        output
    }

    /// Load the state the section would settle in after a long run of `level`.
    /// Returns the section's steady-state output for that input.
    fn settle(&mut self, level: f64) -> f64 {
        let c = self.coeffs;
        let output = c.dc_gain() * level;
        self.state.z2 = c.b2 * level - c.a2 * output;
        self.state.z1 = c.b1 * level - c.a1 * output + self.state.z2;
        output
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.state = BiquadState::default();
    }
}

/// Cascaded second-order sections filter
#[derive(Debug, Clone)]
pub struct SosFilter {
    sections: Vec<BiquadFilter>,
}

impl SosFilter {
    pub fn new(sections: Vec<BiquadCoeffs>) -> Self {
        Self {
            sections: sections.into_iter().map(BiquadFilter::new).collect(),
        }
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Process a single sample through all sections
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let mut output = input;
        for section in &mut self.sections {
            output = section.process(output);
        }
        output
    }

    /// Process an entire signal array in-place
    pub fn process_signal(&mut self, signal: &mut [f64]) {
        for sample in signal.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Put every section in the steady state for a constant input `level`,
    /// so a signal starting at `level` produces no start-up transient.
    pub fn settle(&mut self, level: f64) {
        let mut level = level;
        for section in &mut self.sections {
            level = section.settle(level);
        }
    }

    /// Reset all section states
    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }
}

/// Butterworth filter designer
pub struct ButterworthFilter;

impl ButterworthFilter {
    /// Design a Butterworth lowpass filter
    pub fn lowpass(cutoff: f64, sample_rate: f64, order: usize) -> SosFilter {
        SosFilter::new(Self::design_lowpass(Self::prewarp(cutoff, sample_rate), order))
    }

    /// Design a Butterworth highpass filter
    pub fn highpass(cutoff: f64, sample_rate: f64, order: usize) -> SosFilter {
        SosFilter::new(Self::design_highpass(Self::prewarp(cutoff, sample_rate), order))
    }

    /// Design a Butterworth bandpass filter: highpass at `low` cascaded with lowpass at `high`
    pub fn bandpass(low: f64, high: f64, sample_rate: f64, order: usize) -> SosFilter {
        SosFilter::new(Self::bandpass_sections(low, high, sample_rate, order))
    }

    fn bandpass_sections(low: f64, high: f64, sample_rate: f64, order: usize) -> Vec<BiquadCoeffs> {
        let mut sections = Self::design_highpass(Self::prewarp(low, sample_rate), order);
        sections.extend(Self::design_lowpass(Self::prewarp(high, sample_rate), order));
        sections
    }

    /// Prewarp frequency for bilinear transform
    fn prewarp(freq: f64, sample_rate: f64) -> f64 {
        (PI * freq / sample_rate).tan()
    }

    /// Damping term of the k-th conjugate pole pair: s^2 + d*s + 1
    fn damping(k: usize, order: usize) -> f64 {
        2.0 * (PI * (2.0 * k as f64 + 1.0) / (2.0 * order as f64)).sin()
    }

    /// Design lowpass second-order sections
    fn design_lowpass(wn: f64, order: usize) -> Vec<BiquadCoeffs> {
        let num_sections = (order + 1) / 2;
        let mut sections = Vec::with_capacity(num_sections);

        for k in 0..num_sections {
            // For odd order, last section is first-order: H(s) = wn / (s + wn)
            if order % 2 == 1 && k == num_sections - 1 {
                let k_coeff = wn / (1.0 + wn);
                sections.push(BiquadCoeffs {
                    b0: k_coeff,
                    b1: k_coeff,
                    b2: 0.0,
                    a1: (wn - 1.0) / (wn + 1.0),
                    a2: 0.0,
                });
            } else {
                let d = Self::damping(k, order);
                let wn2 = wn * wn;
                let denom = 1.0 + d * wn + wn2;

                sections.push(BiquadCoeffs {
                    b0: wn2 / denom,
                    b1: 2.0 * wn2 / denom,
                    b2: wn2 / denom,
                    a1: 2.0 * (wn2 - 1.0) / denom,
                    a2: (1.0 - d * wn + wn2) / denom,
                });
            }
        }

        sections
    }

    /// Design highpass second-order sections
    fn design_highpass(wn: f64, order: usize) -> Vec<BiquadCoeffs> {
        let num_sections = (order + 1) / 2;
        let mut sections = Vec::with_capacity(num_sections);

        for k in 0..num_sections {
            if order % 2 == 1 && k == num_sections - 1 {
                let k_coeff = 1.0 / (1.0 + wn);
                sections.push(BiquadCoeffs {
                    b0: k_coeff,
                    b1: -k_coeff,
                    b2: 0.0,
                    a1: (wn - 1.0) / (wn + 1.0),
                    a2: 0.0,
                });
            } else {
                let d = Self::damping(k, order);
                let wn2 = wn * wn;
                let denom = 1.0 + d * wn + wn2;

                // b0 + b1 + b2 is exactly zero, so DC is removed without residue
                sections.push(BiquadCoeffs {
                    b0: 1.0 / denom,
                    b1: -2.0 / denom,
                    b2: 1.0 / denom,
                    a1: 2.0 * (wn2 - 1.0) / denom,
                    a2: (1.0 - d * wn + wn2) / denom,
                });
            }
        }

        sections
    }
}

/// Zero-phase Butterworth band-pass for finite signals.
///
/// Runs the cascade forward and then backward over an odd-reflection padded
/// copy of the signal, starting each pass from the steady state of its first
/// padded sample. Phase cancels, magnitude response is squared.
#[derive(Debug, Clone)]
pub struct ZeroPhaseBandpass {
    low_hz: f64,
    high_hz: f64,
    sample_rate: f64,
    sections: Vec<BiquadCoeffs>,
}

impl ZeroPhaseBandpass {
    /// Design the filter. `label` names the band in errors.
    pub fn design(label: &str, low_hz: f64, high_hz: f64, sample_rate: f64, order: usize) -> Result<Self> {
        if order == 0 {
            return Err(EegError::InvalidParameter("filter order must be at least 1".to_string()));
        }

        let nyquist = sample_rate / 2.0;
        if !(low_hz > 0.0 && low_hz < high_hz && high_hz < nyquist) {
            return Err(EegError::InvalidBandRange {
                band: label.to_string(),
                low: low_hz,
                high: high_hz,
                nyquist,
            });
        }

        Ok(Self {
            low_hz,
            high_hz,
            sample_rate,
            sections: ButterworthFilter::bandpass_sections(low_hz, high_hz, sample_rate, order),
        })
    }

    pub fn cutoffs(&self) -> (f64, f64) {
        (self.low_hz, self.high_hz)
    }

    pub fn sections(&self) -> &[BiquadCoeffs] {
        &self.sections
    }

    /// Reflection length for a signal of `n` samples: three periods of the low
    /// cutoff, never less than three times the filter length, never more than `n - 1`.
    pub fn pad_len(&self, n: usize) -> usize {
        let by_order = 3 * (2 * self.sections.len() + 1);
        let by_cutoff = (3.0 * self.sample_rate / self.low_hz).ceil() as usize;
        by_order.max(by_cutoff).min(n.saturating_sub(1))
    }

    /// Filter one channel without phase shift. Output has the input's length.
    ///
    /// Start-up transients are confined to `pad_len(n)` samples at each end;
    /// further inside, the output matches what the same filter produces on a
    /// longer record of the same signal.
    pub fn filtfilt(&self, signal: &[f64]) -> Vec<f64> {
        let n = signal.len();
        if n == 0 {
            return Vec::new();
        }

        let pad = self.pad_len(n);
        let mut ext = odd_extend(signal, pad);
        let mut sos = SosFilter::new(self.sections.clone());

        sos.settle(ext[0]);
        sos.process_signal(&mut ext);

        ext.reverse();
        sos.reset();
        sos.settle(ext[0]);
        sos.process_signal(&mut ext);
        ext.reverse();

        ext.drain(..pad);
        ext.truncate(n);
        ext
    }
}

/// Odd (point-symmetric) extension by `pad` samples at both ends.
/// Requires `pad < signal.len()`.
fn odd_extend(signal: &[f64], pad: usize) -> Vec<f64> {
    let n = signal.len();
    let first = signal[0];
    let last = signal[n - 1];

    let mut ext = Vec::with_capacity(n + 2 * pad);
    ext.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
    ext.extend_from_slice(signal);
    ext.extend((1..=pad).map(|i| 2.0 * last - signal[n - 1 - i]));
    ext
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: f64, n: usize, amplitude: f64) -> Vec<f64> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    fn rms(x: &[f64]) -> f64 {
        (x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64).sqrt()
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut filter = ButterworthFilter::lowpass(10.0, 100.0, 2);
        let mut out = 0.0;
        for _ in 0..500 {
            out = filter.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut filter = ButterworthFilter::highpass(5.0, 250.0, 4);
        let mut out = 1.0;
        for _ in 0..5000 {
            out = filter.process(1.0);
        }
        assert!(out.abs() < 1e-6);
    }

    #[test]
    fn test_sections_are_stable() {
        let design = ZeroPhaseBandpass::design("delta", 1.0, 4.0, 250.0, 4).unwrap();
        assert_eq!(design.sections().len(), 4);
        for c in design.sections() {
            // Stability triangle for a2, a1
            assert!(c.a2.abs() < 1.0);
            assert!(c.a1.abs() < 1.0 + c.a2);
        }
    }

    #[test]
    fn test_odd_order_bandpass() {
        let mut filter = ButterworthFilter::bandpass(8.0, 12.0, 250.0, 3);
        let mut signal = sine(10.0, 250.0, 2000, 1.0);
        filter.process_signal(&mut signal);
        assert!(rms(&signal[1000..]) > 0.45);
    }

    #[test]
    fn test_filtfilt_preserves_passband_and_phase() {
        let design = ZeroPhaseBandpass::design("alpha", 8.0, 12.0, 250.0, 4).unwrap();
        let input = sine(10.0, 250.0, 1000, 1.0);
        let output = design.filtfilt(&input);
        assert_eq!(output.len(), input.len());

        // Compare the middle of the record: aligned zero crossings, ~0.7 amplitude
        let mid = &output[300..700];
        let corr: f64 = mid.iter().zip(&input[300..700]).map(|(a, b)| a * b).sum();
        assert!(corr > 0.0);
        let ratio = rms(mid) / rms(&input[300..700]);
        assert!(ratio > 0.6 && ratio < 0.8, "ratio {}", ratio);
    }

    #[test]
    fn test_filtfilt_attenuates_stopband() {
        let design = ZeroPhaseBandpass::design("gamma", 30.0, 50.0, 250.0, 4).unwrap();
        let input = sine(10.0, 250.0, 1000, 1.0);
        let output = design.filtfilt(&input);
        assert!(rms(&output[200..800]) < 0.01);
    }

    #[test]
    fn test_filtfilt_constant_is_exactly_zero() {
        let design = ZeroPhaseBandpass::design("broadband", 2.0, 50.0, 250.0, 4).unwrap();
        let output = design.filtfilt(&[3.25; 300]);
        assert!(output.iter().all(|&v| v == 0.0));
    }

    /// Max deviation from a long-record reference outside `pad_len` at both ends
    fn interior_error(design: &ZeroPhaseBandpass, freq: f64, n: usize) -> f64 {
        let fs = 250.0;
        let margin = 4000;
        let long: Vec<f64> = (0..n + 2 * margin)
            .map(|i| (2.0 * PI * freq * i as f64 / fs + 0.7).cos())
            .collect();
        let reference = design.filtfilt(&long);
        let output = design.filtfilt(&long[margin..margin + n]);

        let pad = design.pad_len(n);
        assert!(2 * pad < n);
        (pad..n - pad)
            .map(|i| (output[i] - reference[margin + i]).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_filtfilt_transients_stay_within_padding() {
        let delta = ZeroPhaseBandpass::design("delta", 1.0, 4.0, 250.0, 4).unwrap();
        let err = interior_error(&delta, 2.5, 2500);
        assert!(err < 0.01, "delta interior error {}", err);

        let broadband = ZeroPhaseBandpass::design("broadband", 2.0, 50.0, 250.0, 4).unwrap();
        let err = interior_error(&broadband, 10.0, 1500);
        assert!(err < 0.01, "broadband interior error {}", err);
    }

    #[test]
    fn test_filtfilt_short_signals() {
        let design = ZeroPhaseBandpass::design("theta", 4.0, 8.0, 250.0, 4).unwrap();
        assert!(design.filtfilt(&[]).is_empty());
        assert_eq!(design.filtfilt(&[1.0]).len(), 1);
        assert_eq!(design.filtfilt(&[1.0, -1.0, 2.0]).len(), 3);
    }

    #[test]
    fn test_pad_len_bounds() {
        let design = ZeroPhaseBandpass::design("delta", 1.0, 4.0, 250.0, 4).unwrap();
        assert_eq!(design.pad_len(10_000), 750);
        assert_eq!(design.pad_len(100), 99);
        assert_eq!(design.pad_len(0), 0);

        let gamma = ZeroPhaseBandpass::design("gamma", 30.0, 50.0, 250.0, 4).unwrap();
        assert_eq!(gamma.pad_len(10_000), 27);
    }

    #[test]
    fn test_design_rejects_band_above_nyquist() {
        let err = ZeroPhaseBandpass::design("gamma", 30.0, 50.0, 80.0, 4).unwrap_err();
        assert!(matches!(err, EegError::InvalidBandRange { .. }));
    }

    #[test]
    fn test_design_rejects_zero_order() {
        let err = ZeroPhaseBandpass::design("alpha", 8.0, 12.0, 250.0, 0).unwrap_err();
        assert!(matches!(err, EegError::InvalidParameter(_)));
    }

    #[test]
    fn test_odd_extend() {
        let ext = odd_extend(&[1.0, 2.0, 4.0], 2);
        assert_eq!(ext, vec![-2.0, 0.0, 1.0, 2.0, 4.0, 6.0, 7.0]);
    }
}
