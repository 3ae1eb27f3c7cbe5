use nalgebra::{storage::Storage, Dyn, IsContiguous, Vector};

use super::base::Problem;

/// Definition of a function to be minimized.
///
/// ## Defining a function
///
/// A function is any type that implements [`Function`] and [`Problem`] traits.
///
/// ```rust
/// use solarpace::nalgebra as na;
/// use solarpace::{Domain, Function, Problem};
/// use na::{Dyn, IsContiguous};
///
/// struct Paraboloid {
///     center: f64,
/// }
///
/// impl Problem for Paraboloid {
///     type Field = f64;
///
///     fn domain(&self) -> Domain<Self::Field> {
///         Domain::unconstrained(2)
///     }
/// }
///
/// impl Function for Paraboloid {
///     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
///     where
///         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
///     {
///         (x[0] - self.center).powi(2) + (x[1] - self.center).powi(2)
///     }
/// }
/// ```
///
/// A function should return positive infinity (or NaN) for points where it is
/// not defined instead of panicking. Minimizers treat non-finite values as
/// infinitely bad.
pub trait Function: Problem {
    /// Calculates the function value in given point.
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous;
}
