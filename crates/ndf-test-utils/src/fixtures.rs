//! Reusable buffers and locations for scenario tests.

use ndf_core::Location;

/// `0.0, 1.0, ..., (n - 1) as f32`.
pub fn ramp(n: usize) -> Vec<f32> {
    (0..n).map(|i| i as f32).collect()
}

/// `n` quality bytes, zero except `value` at each index in `flagged`.
pub fn quality_with_flags(n: usize, flagged: &[usize], value: u8) -> Vec<u8> {
    let mut quality = vec![0u8; n];
    for &i in flagged {
        quality[i] = value;
    }
    quality
}

/// `count` indices spread evenly over `0..n`.
pub fn spread_indices(n: usize, count: usize) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }
    let step = (n / count).max(1);
    (0..count).map(|k| (k * step).min(n - 1)).collect()
}

/// Parse a location, panicking on a malformed path.
pub fn loc(path: &str) -> Location {
    Location::parse(path).unwrap_or_else(|e| panic!("bad test location {path:?}: {e}"))
}
