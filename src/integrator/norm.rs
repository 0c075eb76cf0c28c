//! Error norms used by the step-size controller.
use nalgebra::SVector;

/// Mixed absolute/relative infinity norm of the local error estimate.
///
/// Each component of `diff = y5 - y4` is divided by its own tolerance scale
/// `atol + rtol · max(|y_i|, |y5_i|)`; the largest ratio is returned. A value `≤ 1` means every
/// component meets its tolerance, whatever its magnitude, which keeps kilometer-scale positions
/// and km/s-scale velocities under the same relative control.
///
/// Arguments
/// -----------------
/// * `y`: State at the start of the step.
/// * `y5`: Higher-order estimate at the end of the step.
/// * `diff`: Difference between the two embedded estimates.
/// * `relative_tolerance`, `absolute_tolerance`: Tolerance pair (`atol > 0`).
///
/// Return
/// ----------
/// * The normalized error, `NaN` if any input component is `NaN`.
pub fn scaled_error_norm<const N: usize>(
    y: &SVector<f64, N>,
    y5: &SVector<f64, N>,
    diff: &SVector<f64, N>,
    relative_tolerance: f64,
    absolute_tolerance: f64,
) -> f64 {
    let mut err: f64 = 0.0;
    for i in 0..N {
        let scale = absolute_tolerance + relative_tolerance * y[i].abs().max(y5[i].abs());
        let ratio = diff[i].abs() / scale;
        if ratio.is_nan() {
            return f64::NAN;
        }
        err = err.max(ratio);
    }
    err
}

/// `true` when every component is finite.
#[inline]
pub fn all_finite<const N: usize>(y: &SVector<f64, N>) -> bool {
    y.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod norm_test {
    use super::*;
    use nalgebra::Vector2;

    #[test]
    fn test_scaled_error_norm_is_per_component() {
        // A large position and a small velocity with the same relative error
        let y = Vector2::new(1e6, 10.0);
        let y5 = y;
        let diff = Vector2::new(1e-2, 1e-7);

        let err = scaled_error_norm(&y, &y5, &diff, 1e-8, 1e-12);
        // 1e-2 / (1e-12 + 1e-2) and 1e-7 / (1e-12 + 1e-7), both just below 1
        assert!(err < 1.0);
        assert!(err > 0.99);

        let diff = Vector2::new(1e-2, 1e-6);
        let err = scaled_error_norm(&y, &y5, &diff, 1e-8, 1e-12);
        assert!(err > 9.9);
    }

    #[test]
    fn test_absolute_tolerance_near_zero() {
        let y = Vector2::new(0.0, 0.0);
        let diff = Vector2::new(1e-9, 0.0);
        let err = scaled_error_norm(&y, &y, &diff, 1e-8, 1e-8);
        assert!((err - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_nan_propagates() {
        let y = Vector2::new(1.0, 1.0);
        let diff = Vector2::new(f64::NAN, 0.0);
        assert!(scaled_error_norm(&y, &y, &diff, 1e-8, 1e-8).is_nan());
        assert!(!all_finite(&Vector2::new(1.0, f64::INFINITY)));
        assert!(all_finite(&y));
    }
}
