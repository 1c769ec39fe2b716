//! Band-limited square tone.

use std::f64::consts::PI;

/// Square wave approximation from the fundamental plus the 3rd and 5th harmonics
///
/// # Arguments
/// * `t` - Absolute time in seconds
/// * `f` - Fundamental frequency in Hz
pub fn square(t: f64, f: f64) -> f64 {
    let phase = 2.0 * PI * f * t;
    4.0 / PI * (phase.sin() + (3.0 * phase).sin() / 3.0 + (5.0 * phase).sin() / 5.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_zero_crossing() {
        assert_eq!(square(0.0, 220.0), 0.0);
        assert!(square(1.0 / 440.0, 220.0).abs() < 1e-9); // half period
    }

    #[test]
    fn test_square_peak_at_quarter_period() {
        // sin(π/2) - 1/3 + 1/5 scaled by 4/π
        let expected = 4.0 / PI * (1.0 - 1.0 / 3.0 + 1.0 / 5.0);
        assert!((square(0.25, 1.0) - expected).abs() < 1e-12);
        assert!((square(0.75, 1.0) + expected).abs() < 1e-12);
    }

    #[test]
    fn test_square_is_periodic() {
        let f = 110.0;
        for i in 0..100 {
            let t = i as f64 * 1e-4;
            assert!((square(t, f) - square(t + 1.0 / f, f)).abs() < 1e-9);
        }
    }
}
