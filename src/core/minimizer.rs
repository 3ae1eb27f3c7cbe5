use getset::{CopyGetters, Getters};
use nalgebra::{Dyn, OVector, Scalar};

use super::function::Function;

/// Result of a successful local minimization.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct Minimum<T: Scalar + Copy> {
    /// The point found by the minimizer.
    #[getset(get = "pub")]
    x: OVector<T, Dyn>,
    /// Function value in the found point.
    #[getset(get_copy = "pub")]
    fx: T,
    /// Number of iterations performed.
    #[getset(get_copy = "pub")]
    iters: usize,
}

impl<T: Scalar + Copy> Minimum<T> {
    /// Creates a new minimum record.
    pub fn new(x: OVector<T, Dyn>, fx: T, iters: usize) -> Self {
        Self { x, fx, iters }
    }

    /// Unpacks the point.
    pub fn into_x(self) -> OVector<T, Dyn> {
        self.x
    }
}

/// State of the current iteration passed to the minimizer callback.
pub struct MinimizerIterState<'a, T: Scalar> {
    x: &'a OVector<T, Dyn>,
    fx: T,
    iter: usize,
}

impl<'a, T: Scalar + Copy> MinimizerIterState<'a, T> {
    /// Creates the state. Intended for minimizer implementations.
    pub fn new(x: &'a OVector<T, Dyn>, fx: T, iter: usize) -> Self {
        Self { x, fx, iter }
    }

    /// Returns reference to the current point.
    pub fn x(&self) -> &[T] {
        self.x.as_slice()
    }

    /// Returns the current function value.
    pub fn fx(&self) -> T {
        self.fx
    }

    /// Returns the current iteration number (starting from 1).
    pub fn iter(&self) -> usize {
        self.iter
    }
}

/// Interface of an unconstrained local minimizer.
///
/// A minimizer takes an objective, a starting point and a tolerance and runs
/// to completion. On success it returns the found point. Any failure (no
/// descent direction, line search failure, iteration cap) is reported as an
/// error and the caller must not use the partially improved point as a final
/// answer.
///
/// ## Implementing a minimizer
///
/// Here is a "minimizer" which accepts its starting point as the minimum.
///
/// ```rust
/// use solarpace::nalgebra as na;
/// use solarpace::{Function, Minimizer, MinimizerIterState, Minimum};
///
/// struct Stay;
///
/// impl<F: Function> Minimizer<F> for Stay {
///     const NAME: &'static str = "Stay";
///     type Error = std::convert::Infallible;
///
///     fn minimize<C>(
///         &mut self,
///         f: &F,
///         x0: &[F::Field],
///         _tolerance: F::Field,
///         mut callback: C,
///     ) -> Result<Minimum<F::Field>, Self::Error>
///     where
///         C: FnMut(MinimizerIterState<'_, F::Field>),
///     {
///         let x = na::DVector::from_column_slice(x0);
///         let fx = f.apply(&x);
///         callback(MinimizerIterState::new(&x, fx, 1));
///         Ok(Minimum::new(x, fx, 1))
///     }
/// }
/// ```
pub trait Minimizer<F: Function> {
    /// Name of the minimizer.
    const NAME: &'static str;

    /// Error while minimizing.
    type Error;

    /// Minimizes the function starting from `x0` until the convergence
    /// `tolerance` is met. The `callback` is invoked after every iteration.
    fn minimize<C>(
        &mut self,
        f: &F,
        x0: &[F::Field],
        tolerance: F::Field,
        callback: C,
    ) -> Result<Minimum<F::Field>, Self::Error>
    where
        C: FnMut(MinimizerIterState<'_, F::Field>);
}
