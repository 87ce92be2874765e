// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Playback Simulation Suite - Rolling Average

/// Trailing rolling average. `out[i]` is the mean of
/// `raw[max(0, i + 1 - window) ..= i]`, so the window grows from one sample up
/// to `window` before reaching full width and `out[0] == raw[0]`.
///
/// `window` is validated at config time; zero is treated as one here.
pub fn smooth(raw: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..raw.len())
        .map(|i| {
            let subset = &raw[(i + 1).saturating_sub(window)..=i];
            subset.iter().sum::<f64>() / subset.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_point_is_untouched() {
        let raw = [101.3, 99.0, 104.2];
        for w in 1..5 {
            let s = smooth(&raw, w);
            assert_eq!(s[0], raw[0]);
            assert_eq!(s.len(), raw.len());
        }
    }

    #[test]
    fn window_truncates_at_start() {
        let s = smooth(&[2.0, 4.0, 6.0, 8.0], 3);
        assert_eq!(s, vec![2.0, 3.0, 4.0, 6.0]);
    }

    #[test]
    fn window_of_one_is_identity() {
        let raw = [5.0, 1.0, 9.5];
        assert_eq!(smooth(&raw, 1), raw.to_vec());
    }

    #[test]
    fn window_wider_than_series_is_cumulative_mean() {
        let s = smooth(&[1.0, 2.0, 3.0], 10);
        assert_eq!(s, vec![1.0, 1.5, 2.0]);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(smooth(&[], 3).is_empty());
    }
}
