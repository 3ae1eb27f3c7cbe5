//! Golden-section search for bounded scalar minimization.
//!
//! [Golden-section search](https://en.wikipedia.org/wiki/Golden-section_search)
//! shrinks the bracketing interval by the inverse golden ratio in every
//! iteration, reusing one of the two interior evaluations. It finds the
//! minimum of a unimodal function and a local minimum otherwise.

use getset::{CopyGetters, Setters};
use log::debug;
use thiserror::Error;

/// Options for [`GoldenSection`] search.
#[derive(Debug, Clone, Copy, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct GoldenSectionOptions {
    /// Width of the bracketing interval at which the search stops. Default:
    /// `1e-6`.
    tolerance: f64,
    /// Maximum number of iterations. Default: `200`.
    max_iters: usize,
}

impl Default for GoldenSectionOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iters: 200,
        }
    }
}

/// Error returned from [`GoldenSection`] search.
#[derive(Debug, Error)]
pub enum GoldenSectionError {
    /// The interval is empty or not finite.
    #[error("invalid interval [{0}, {1}]")]
    InvalidInterval(f64, f64),
    /// Maximum number of iterations reached before the interval shrank below
    /// the tolerance.
    #[error("maximum number of iterations reached")]
    MaxIters,
}

/// Golden-section search. See [module](self) documentation for more details.
#[derive(Debug, Clone, Default)]
pub struct GoldenSection {
    options: GoldenSectionOptions,
}

impl GoldenSection {
    /// Initializes the search with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes the search with given options.
    pub fn with_options(options: GoldenSectionOptions) -> Self {
        Self { options }
    }

    /// Finds a minimum of `f` in `[lower, upper]`. Returns the point and the
    /// function value in it.
    pub fn minimize<G>(&self, mut f: G, lower: f64, upper: f64) -> Result<(f64, f64), GoldenSectionError>
    where
        G: FnMut(f64) -> f64,
    {
        if !(lower.is_finite() && upper.is_finite() && lower < upper) {
            return Err(GoldenSectionError::InvalidInterval(lower, upper));
        }

        let GoldenSectionOptions {
            tolerance,
            max_iters,
        } = self.options;

        let ratio = 0.5 * (5f64.sqrt() - 1.0);

        let mut a = lower;
        let mut b = upper;
        let mut c = b - ratio * (b - a);
        let mut d = a + ratio * (b - a);
        let mut fc = f(c);
        let mut fd = f(d);

        for iter in 0..max_iters {
            if b - a <= tolerance {
                let x = 0.5 * (a + b);
                debug!("golden section converged after {} iterations at {}", iter, x);
                return Ok((x, f(x)));
            }

            if fc < fd {
                b = d;
                d = c;
                fd = fc;
                c = b - ratio * (b - a);
                fc = f(c);
            } else {
                a = c;
                c = d;
                fc = fd;
                d = a + ratio * (b - a);
                fd = f(d);
            }
        }

        Err(GoldenSectionError::MaxIters)
    }
}
