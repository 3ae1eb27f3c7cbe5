//! Quasi-Newton BFGS minimization method.
//!
//! [BFGS](https://en.wikipedia.org/wiki/Broyden%E2%80%93Fletcher%E2%80%93Goldfarb%E2%80%93Shanno_algorithm)
//! keeps an approximation of the inverse Hessian matrix which is updated from
//! the observed change of the gradient after every step. The gradient is
//! approximated by forward finite differences, so only function values are
//! required. The step length is found by backtracking until the Armijo
//! (sufficient decrease) condition holds.
//!
//! When the quasi-Newton direction is not a descent direction or the line
//! search along it fails, the approximation is reset to identity and the
//! iteration continues with steepest descent.
//!
//! # References
//!
//! \[1\] [Numerical
//! Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::{convert, ComplexField as _, Dyn, OMatrix, OVector, RealField as _, U1};
use num_traits::{One, Zero};
use thiserror::Error;

use crate::core::{Function, Minimizer, MinimizerIterState, Minimum, RealField};
use crate::derivatives::Gradient;

/// Options for [`Bfgs`] minimizer.
#[derive(Debug, Clone, Copy, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct BfgsOptions<T: Copy> {
    /// Maximum number of iterations. Default: `1000`.
    max_iters: usize,
    /// Sufficient decrease constant of the Armijo condition. Default: `1e-4`.
    armijo: T,
    /// Factor by which the step length is shrunk in backtracking. Default:
    /// `0.5`.
    backtrack: T,
    /// Maximum number of step shrinks in one line search. Default: `50`.
    max_backtracks: usize,
}

impl<T: RealField + Copy> Default for BfgsOptions<T> {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            armijo: convert(1e-4),
            backtrack: convert(0.5),
            max_backtracks: 50,
        }
    }
}

/// Error returned from [`Bfgs`] minimizer.
#[derive(Debug, Error)]
pub enum BfgsError {
    /// Function value in the starting point is not finite.
    #[error("function value in the initial point is not finite")]
    InvalidInitial,
    /// No step along steepest descent decreased the function value.
    #[error("line search failed to decrease the function value")]
    LineSearch,
    /// Maximum number of iterations reached before convergence.
    #[error("maximum number of iterations reached")]
    MaxIters,
}

/// BFGS minimizer. See [module](self) documentation for more details.
#[derive(Debug, Clone)]
pub struct Bfgs<T: Copy> {
    options: BfgsOptions<T>,
}

impl<T: RealField + Copy> Bfgs<T> {
    /// Initializes BFGS minimizer with default options.
    pub fn new() -> Self {
        Self::with_options(BfgsOptions::default())
    }

    /// Initializes BFGS minimizer with given options.
    pub fn with_options(options: BfgsOptions<T>) -> Self {
        Self { options }
    }

    /// Gets the options.
    pub fn options(&self) -> &BfgsOptions<T> {
        &self.options
    }
}

impl<T: RealField + Copy> Default for Bfgs<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn max_abs<T: RealField + Copy>(v: &OVector<T, Dyn>) -> T {
    v.iter().fold(T::zero(), |max, vi| max.max(vi.abs()))
}

impl<F: Function> Minimizer<F> for Bfgs<F::Field> {
    const NAME: &'static str = "BFGS";

    type Error = BfgsError;

    fn minimize<C>(
        &mut self,
        f: &F,
        x0: &[F::Field],
        tolerance: F::Field,
        mut callback: C,
    ) -> Result<Minimum<F::Field>, Self::Error>
    where
        C: FnMut(MinimizerIterState<'_, F::Field>),
    {
        let BfgsOptions {
            max_iters,
            armijo,
            backtrack,
            max_backtracks,
        } = self.options;

        let n = x0.len();
        let dim = Dyn(n);
        let one = F::Field::one();
        let zero = F::Field::zero();

        let scale = f
            .domain()
            .scale()
            .cloned()
            .unwrap_or_else(|| OVector::from_element_generic(dim, U1, one));

        let mut x = OVector::from_column_slice_generic(dim, U1, x0);
        let mut fx = f.apply(&x);

        if !fx.is_finite() {
            return Err(BfgsError::InvalidInitial);
        }

        let mut grad = Gradient::<F>::zeros(n);
        grad.compute(f, &mut x, &scale, fx);
        let mut g = grad.clone_owned();

        let mut h = OMatrix::<F::Field, Dyn, Dyn>::identity_generic(dim, dim);
        let mut is_identity = true;
        let mut is_scaled = false;

        let mut x_new = x.clone_owned();

        let mut iter = 0;

        loop {
            if max_abs(&g) <= tolerance {
                debug!("converged after {} iterations, f(x) = {}", iter, fx);
                return Ok(Minimum::new(x, fx, iter));
            }

            if iter == max_iters {
                debug!("maximum number of iterations reached, f(x) = {}", fx);
                return Err(BfgsError::MaxIters);
            }

            let mut p = -(&h * &g);
            let mut slope = g.dot(&p);

            if !slope.is_finite() || slope >= zero {
                debug!("no descent direction, resetting inverse Hessian");
                h.fill_with_identity();
                is_identity = true;
                p = -g.clone_owned();
                slope = -g.dot(&g);
            }

            // Backtracking line search.
            let mut alpha = one;
            let mut f_new = None;

            for _ in 0..max_backtracks {
                x_new.copy_from(&x);
                x_new.axpy(alpha, &p, one);

                let value = f.apply(&x_new);
                if value.is_finite() && value <= fx + armijo * alpha * slope {
                    f_new = Some(value);
                    break;
                }

                alpha *= backtrack;
            }

            let f_new = match f_new {
                Some(value) => value,
                None if is_identity => {
                    debug!("line search failed along steepest descent");
                    return Err(BfgsError::LineSearch);
                }
                None => {
                    // Retried once with steepest descent. A second failure
                    // ends the minimization.
                    debug!("line search failed, resetting inverse Hessian");
                    h.fill_with_identity();
                    is_identity = true;
                    continue;
                }
            };

            grad.compute(f, &mut x_new, &scale, f_new);

            let s = &x_new - &x;
            let y = &*grad - &g;
            let sy = s.dot(&y);

            // Skipping the update on insufficient curvature keeps the
            // approximation positive definite.
            if sy > F::Field::EPSILON_SQRT * s.norm() * y.norm() {
                if !is_scaled {
                    h.fill_with_identity();
                    h *= sy / y.dot(&y);
                    is_scaled = true;
                }

                let hy = &h * &y;
                let rho = one / sy;
                let ss_coeff = (sy + y.dot(&hy)) * rho * rho;

                h.ger(ss_coeff, &s, &s, one);
                h.ger(-rho, &hy, &s, one);
                h.ger(-rho, &s, &hy, one);
                is_identity = false;
            }

            // An accepted step that is negligible or does not decrease the
            // value means no further progress is possible, e.g. at a kink.
            let stalled = f_new >= fx
                || s.norm() <= F::Field::EPSILON_SQRT * one.max(x.norm());

            x.copy_from(&x_new);
            g.copy_from(&*grad);
            fx = f_new;
            iter += 1;

            callback(MinimizerIterState::new(&x, fx, iter));

            if stalled {
                debug!("no progress after {} iterations, f(x) = {}", iter, fx);
                return Ok(Minimum::new(x, fx, iter));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::DVector;

    use super::*;
    use crate::testing::*;

    #[test]
    fn sphere() {
        let f = Sphere::new(4);
        let mut bfgs = Bfgs::<f64>::new();

        for x0 in f.initials() {
            let minimum = bfgs.minimize(&f, x0.as_slice(), 1e-6, |_| {}).unwrap();
            assert!(f.is_optimum(minimum.x(), 1e-4));
        }
    }

    #[test]
    fn rosenbrock() {
        let f = Rosenbrock::default();
        let mut bfgs = Bfgs::<f64>::new();

        for x0 in f.initials() {
            let minimum = bfgs.minimize(&f, x0.as_slice(), 1e-4, |_| {}).unwrap();
            assert!(f.is_optimum(minimum.x(), 1e-2));
        }
    }

    #[test]
    fn callback_sees_decreasing_values() {
        let f = Rosenbrock::default();
        let mut bfgs = Bfgs::<f64>::new();
        let mut values = Vec::new();
        let mut iters = Vec::new();

        let minimum = bfgs
            .minimize(&f, &[-1.2, 1.0], 1e-4, |state| {
                values.push(state.fx());
                iters.push(state.iter());
            })
            .unwrap();

        assert!(values.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(iters.len(), minimum.iters());
        assert!(iters.iter().enumerate().all(|(i, iter)| *iter == i + 1));
    }

    #[test]
    fn max_iters_reported() {
        let f = Rosenbrock::default();
        let mut options = BfgsOptions::<f64>::default();
        options.set_max_iters(2);
        let mut bfgs = Bfgs::with_options(options);

        assert!(matches!(
            bfgs.minimize(&f, &[-1.2, 1.0], 1e-8, |_| {}),
            Err(BfgsError::MaxIters)
        ));
    }

    #[test]
    fn infinite_initial_value_rejected() {
        let route = flat_route(2, 1000.0, 500.0);
        let race = crate::objective::Race::new(&route, Default::default());
        let f = race.composite(1.0, crate::penalty::PenaltyMode::Smooth);
        let mut bfgs = Bfgs::<f64>::new();

        assert!(matches!(
            bfgs.minimize(&f, &[-1.0, 10.0], 1e-3, |_| {}),
            Err(BfgsError::InvalidInitial)
        ));
    }

    #[test]
    fn stops_at_kink_of_coasting_segments() {
        // Downhill segments without regeneration make the objective
        // non-smooth at the speed where the net force changes sign.
        let route = rolling_route(20);
        let race = crate::objective::Race::new(&route, Default::default());
        let f = race.composite(1.0, crate::penalty::PenaltyMode::Smooth);
        let mut bfgs = Bfgs::<f64>::new();

        let x0 = vec![20.0; 20];
        let fx0 = f.apply(&DVector::from_column_slice(&x0));
        let minimum = bfgs.minimize(&f, &x0, 1e-3, |_| {}).unwrap();

        assert!(minimum.fx() < fx0);
        assert!(minimum.iters() < 1000);
    }

    #[test]
    fn race_speeds_stay_below_steep_penalty() {
        // With a strong penalty weight the optimum is close to but below the
        // maximum speed.
        let route = flat_route(3, 10_000.0, 800.0);
        let race = crate::objective::Race::new(&route, Default::default());
        let f = race.composite(10.0, crate::penalty::PenaltyMode::Smooth);
        let mut bfgs = Bfgs::<f64>::new();

        let minimum = bfgs.minimize(&f, &[20.0, 20.0, 20.0], 1e-3, |_| {}).unwrap();
        let x: &DVector<f64> = minimum.x();
        assert!(x.iter().all(|v| *v > 30.0 && *v < 40.0));
    }
}
