use nalgebra::DVector;
use thiserror::Error;

/// Accepted samples of an integration that stopped early, as `(t, state)` pairs.
pub type PartialSamples = Vec<(f64, DVector<f64>)>;

#[derive(Error, Debug)]
pub enum DuoSatError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Singular configuration at t = {t}: a separation distance is zero")]
    SingularConfiguration { t: f64, state: DVector<f64> },

    #[error(
        "Step size underflow at t = {t}: step {step:e} <= min_step {min_step:e} \
         (max_step = {max_step:e}) with normalized error {error:e} \
         (rtol = {relative_tolerance:e}, atol = {absolute_tolerance:e})"
    )]
    StepSizeUnderflow {
        t: f64,
        state: DVector<f64>,
        step: f64,
        min_step: f64,
        max_step: f64,
        error: f64,
        relative_tolerance: f64,
        absolute_tolerance: f64,
    },

    /// An accepted step too small to change `t` at its magnitude.
    #[error("Step {step:e} accepted at t = {t} does not advance time in floating point")]
    TimeResolutionExceeded {
        t: f64,
        state: DVector<f64>,
        step: f64,
    },

    #[error("Step budget of {max_steps} steps exceeded at t = {t}")]
    StepBudgetExceeded {
        max_steps: usize,
        t: f64,
        partial: PartialSamples,
    },

    #[error("Non-finite state or derivative produced at t = {t}")]
    NonFiniteState { t: f64 },

    #[error("Orbit is not elliptic (eccentricity = {eccentricity})")]
    NonEllipticOrbit { eccentricity: f64 },

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV trajectory error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("YAML configuration error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl PartialEq for DuoSatError {
    fn eq(&self, other: &Self) -> bool {
        use DuoSatError::*;
        match (self, other) {
            (InvalidConfiguration(a), InvalidConfiguration(b)) => a == b,
            (
                SingularConfiguration { t: t1, state: s1 },
                SingularConfiguration { t: t2, state: s2 },
            ) => t1 == t2 && s1 == s2,
            (
                StepSizeUnderflow {
                    t: t1,
                    state: s1,
                    step: h1,
                    ..
                },
                StepSizeUnderflow {
                    t: t2,
                    state: s2,
                    step: h2,
                    ..
                },
            ) => t1 == t2 && s1 == s2 && h1 == h2,
            (
                TimeResolutionExceeded {
                    t: t1,
                    state: s1,
                    step: h1,
                },
                TimeResolutionExceeded {
                    t: t2,
                    state: s2,
                    step: h2,
                },
            ) => t1 == t2 && s1 == s2 && h1 == h2,
            (
                StepBudgetExceeded {
                    max_steps: m1,
                    t: t1,
                    partial: p1,
                },
                StepBudgetExceeded {
                    max_steps: m2,
                    t: t2,
                    partial: p2,
                },
            ) => m1 == m2 && t1 == t2 && p1 == p2,
            (NonFiniteState { t: a }, NonFiniteState { t: b }) => a == b,
            (NonEllipticOrbit { eccentricity: a }, NonEllipticOrbit { eccentricity: b }) => {
                a == b
            }

            // Foreign errors are not comparable: equal when the variant matches
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (YamlError(_), YamlError(_)) => true,

            _ => false,
        }
    }
}
