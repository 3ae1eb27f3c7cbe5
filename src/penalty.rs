//! Penalty functions for box constraints `lower < x < upper`.
//!
//! Two shapes are supported:
//!
//! * [`PenaltyMode::Smooth`] is the even power of the normalized distance from
//!   the interval center, `c * ((x - mid) / half_width)^deg`. It is zero only
//!   at the center, equals `c` on the bounds and grows steeply outside. It is
//!   differentiable everywhere, which is what the inner minimization of the
//!   [penalty method](crate::algo::penalty_method) needs.
//! * [`PenaltyMode::Indicator`] is exactly zero inside the open interval and
//!   a constant outside. Its gradient is zero almost everywhere, so it is
//!   meant only for reporting and acceptance checks.

use getset::{CopyGetters, Setters};

/// Shape of the penalty function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyMode {
    /// Differentiable polynomial penalty.
    Smooth,
    /// Zero inside, constant outside.
    Indicator,
}

/// Tunable constants of the penalty shapes.
#[derive(Debug, Clone, Copy, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct BoxPenalty {
    /// Multiplier of the smooth penalty. Default: `10`.
    coefficient: f64,
    /// Even degree of the smooth penalty. Default: `8`.
    #[getset(skip)]
    degree: i32,
    /// Value of the indicator penalty outside the interval. Default: `3600`.
    violation: f64,
}

impl Default for BoxPenalty {
    fn default() -> Self {
        Self {
            coefficient: 10.0,
            degree: 8,
            violation: 3600.0,
        }
    }
}

impl BoxPenalty {
    /// Gets the degree of the smooth penalty.
    pub fn degree(&self) -> i32 {
        self.degree
    }

    /// Sets the degree of the smooth penalty. It must be even and positive,
    /// otherwise the penalty would be negative on one side of the center.
    pub fn set_degree(&mut self, degree: i32) -> &mut Self {
        assert!(
            degree > 0 && degree % 2 == 0,
            "degree must be even and positive"
        );
        self.degree = degree;
        self
    }

    /// Evaluates the penalty of `x` for the constraint `lower < x < upper`.
    pub fn eval(&self, x: f64, lower: f64, upper: f64, mode: PenaltyMode) -> f64 {
        match mode {
            PenaltyMode::Smooth => {
                let half_width = 0.5 * (upper - lower);
                let mid = lower + half_width;
                self.coefficient * ((x - mid) / half_width).powi(self.degree)
            }
            PenaltyMode::Indicator => {
                if lower < x && x < upper {
                    0.0
                } else {
                    self.violation
                }
            }
        }
    }

    /// Sums the penalty over all values.
    pub fn sum<I>(&self, values: I, lower: f64, upper: f64, mode: PenaltyMode) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        values
            .into_iter()
            .map(|x| self.eval(x, lower, upper, mode))
            .sum()
    }
}
