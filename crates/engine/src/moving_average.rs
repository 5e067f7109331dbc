//! Trailing moving average over a validated visitor series.
//!
//! `averages[i]` is the mean of `values[i ..= i + window - 1]`, i.e. it is
//! aligned to the last row of its window. The first `window - 1` rows have
//! no average; nothing is padded.

use crate::error::JobError;

/// Running-sum implementation, O(n).
///
/// Sums are exact integers, so every output is bit-identical to
/// [`moving_averages_direct`].
pub fn moving_averages(values: &[u64], window: usize) -> Result<Vec<f64>, JobError> {
    check_window(values.len(), window)?;

    let divisor = window as f64;
    let mut out = Vec::with_capacity(values.len() - window + 1);
    let mut sum: u128 = values[..window].iter().map(|&v| v as u128).sum();
    out.push(sum as f64 / divisor);

    for end in window..values.len() {
        sum += values[end] as u128;
        sum -= values[end - window] as u128;
        out.push(sum as f64 / divisor);
    }

    Ok(out)
}

/// Reference implementation: re-sums every window, O(n·window).
pub fn moving_averages_direct(values: &[u64], window: usize) -> Result<Vec<f64>, JobError> {
    check_window(values.len(), window)?;

    Ok(values
        .windows(window)
        .map(|w| w.iter().map(|&v| v as u128).sum::<u128>() as f64 / window as f64)
        .collect())
}

fn check_window(data_rows: usize, window: usize) -> Result<(), JobError> {
    if window == 0 || window > data_rows {
        return Err(JobError::InvalidWindow { window: window as i64, data_rows });
    }
    Ok(())
}
