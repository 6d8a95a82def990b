//! Amplitude compression: `ln(1 + |x|)` applied elementwise.

use crate::error::{EegError, Result};

/// Compress one value. Monotonic in `|x|`, zero at zero.
#[inline]
pub fn log_compress(x: f64) -> f64 {
    x.abs().ln_1p()
}

/// Fail on the first NaN or infinite sample, scanning channel by channel.
///
/// Run on raw input before any filtering so the reported position is the
/// offending sample itself.
pub fn check_finite(channels: &[Vec<f64>]) -> Result<()> {
    for (ch, samples) in channels.iter().enumerate() {
        if let Some(i) = samples.iter().position(|x| !x.is_finite()) {
            return Err(EegError::NonFiniteInput {
                channel: ch + 1,
                sample: i,
            });
        }
    }
    Ok(())
}

/// Compress every sample of every channel.
///
/// Fails on the first NaN or infinite sample; peak statistics downstream
/// would be undefined otherwise.
pub fn compress(channels: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    channels
        .iter()
        .enumerate()
        .map(|(ch, samples)| {
            samples
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    if x.is_finite() {
                        Ok(log_compress(x))
                    } else {
                        Err(EegError::NonFiniteInput {
                            channel: ch + 1,
                            sample: i,
                        })
                    }
                })
                .collect()
        })
        .collect()
}
