//! Butcher tableau of the Runge–Kutta–Fehlberg 4(5) pair.
//!
//! Reference: E. Fehlberg, *Low-order classical Runge-Kutta formulas with stepsize control
//! and their application to some heat transfer problems*, NASA TR R-315 (1969).

/// Number of stages shared by the 4th- and 5th-order formulas.
pub const STAGES: usize = 6;

/// Nodes `c_i`: fraction of the step at which stage `i` is evaluated.
pub const C: [f64; STAGES] = [0.0, 1.0 / 4.0, 3.0 / 8.0, 12.0 / 13.0, 1.0, 1.0 / 2.0];

/// Stage coefficients `a_ij` (lower triangular, `j < i`).
pub const A: [[f64; STAGES]; STAGES] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 4.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 32.0, 9.0 / 32.0, 0.0, 0.0, 0.0, 0.0],
    [1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0, 0.0, 0.0, 0.0],
    [439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0, 0.0, 0.0],
    [-8.0 / 27.0, 2.0, -3544.0 / 2565.0, 1859.0 / 4104.0, -11.0 / 40.0, 0.0],
];

/// Weights of the 5th-order solution.
pub const B5: [f64; STAGES] = [
    16.0 / 135.0,
    0.0,
    6656.0 / 12825.0,
    28561.0 / 56430.0,
    -9.0 / 50.0,
    2.0 / 55.0,
];

/// Weights of the embedded 4th-order solution.
pub const B4: [f64; STAGES] = [
    25.0 / 216.0,
    0.0,
    1408.0 / 2565.0,
    2197.0 / 4104.0,
    -1.0 / 5.0,
    0.0,
];

#[cfg(test)]
mod tableau_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_row_sums_match_nodes() {
        for i in 0..STAGES {
            let row: f64 = A[i].iter().sum();
            assert_abs_diff_eq!(row, C[i], epsilon = 1e-14);
        }
    }

    #[test]
    fn test_weights_are_consistent() {
        assert_abs_diff_eq!(B5.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(B4.iter().sum::<f64>(), 1.0, epsilon = 1e-14);

        // Second-order condition Σ b_i c_i = 1/2 for both formulas
        let b5c: f64 = B5.iter().zip(C.iter()).map(|(b, c)| b * c).sum();
        let b4c: f64 = B4.iter().zip(C.iter()).map(|(b, c)| b * c).sum();
        assert_abs_diff_eq!(b5c, 0.5, epsilon = 1e-14);
        assert_abs_diff_eq!(b4c, 0.5, epsilon = 1e-14);
    }
}
