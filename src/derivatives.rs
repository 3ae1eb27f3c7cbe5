//! Tools for derivative-based methods.

use std::ops::Deref;

use nalgebra::{
    storage::{Storage, StorageMut},
    ComplexField as _, Dyn, IsContiguous, OVector, RealField as _, Vector, U1,
};
use num_traits::{One, Zero};

use crate::core::{Function, Problem, RealField as _};

/// Gradient vector of a function approximated by forward finite differences.
#[derive(Debug)]
pub struct Gradient<F: Problem> {
    grad: OVector<F::Field, Dyn>,
}

impl<F: Problem> Gradient<F> {
    /// Initializes the gradient with zeros.
    pub fn zeros(dim: usize) -> Self {
        Self {
            grad: OVector::zeros_generic(Dyn(dim), U1),
        }
    }
}

impl<F: Function> Gradient<F> {
    /// Computes the gradient of the function in given point with given scale
    /// of variables. See [`compute`](Gradient::compute) for more details.
    pub fn new<Sx, Sscale>(
        f: &F,
        x: &mut Vector<F::Field, Dyn, Sx>,
        scale: &Vector<F::Field, Dyn, Sscale>,
        fx: F::Field,
    ) -> Self
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
        Sscale: Storage<F::Field, Dyn>,
    {
        let mut grad = Self::zeros(x.nrows());
        grad.compute(f, x, scale, fx);
        grad
    }

    /// Computes the gradient of the function in given point with given scale
    /// of variables.
    ///
    /// The parameter `x` is mutable to allow temporary mutations avoiding
    /// unnecessary allocations, but after this method ends, the content of the
    /// vector is exactly the same as before.
    ///
    /// Information about variable scale is useful for problematic cases of
    /// finite differentiation (e.g., when the value is near zero).
    pub fn compute<Sx, Sscale>(
        &mut self,
        f: &F,
        x: &mut Vector<F::Field, Dyn, Sx>,
        scale: &Vector<F::Field, Dyn, Sscale>,
        fx: F::Field,
    ) -> &mut Self
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
        Sscale: Storage<F::Field, Dyn>,
    {
        let eps = F::Field::EPSILON_SQRT;

        for i in 0..x.nrows() {
            let xi = x[i];

            // The step is relative to the magnitude of x_i to keep a balance
            // between truncation and round-off errors. Near zero, the typical
            // magnitude of the variable is used instead.
            let magnitude = F::Field::one() / scale[i];
            let step = eps * xi.abs().max(magnitude) * F::Field::one().copysign(xi);
            let step = if step == F::Field::zero() { eps } else { step };

            x[i] = xi + step;
            let fxi = f.apply(x);

            // grad[i] = (F(x + e_i * step_i) - F(x)) / step_i.
            self.grad[i] = (fxi - fx) / step;

            x[i] = xi;
        }

        self
    }
}

impl<F: Problem> Deref for Gradient<F> {
    type Target = OVector<F::Field, Dyn>;

    fn deref(&self) -> &Self::Target {
        &self.grad
    }
}
