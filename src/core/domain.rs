//! Problem domain definition (dimensionality, bounds).

use nalgebra::{storage::StorageMut, Const, Dim, Dyn, OVector, Vector};

use crate::analysis::estimate_magnitude_from_bounds;
use crate::core::RealField;

/// Domain of a problem.
#[derive(Debug, Clone)]
pub struct Domain<T: RealField + Copy> {
    lower: OVector<T, Dyn>,
    upper: OVector<T, Dyn>,
    scale: Option<OVector<T, Dyn>>,
}

impl<T: RealField + Copy> Domain<T> {
    /// Creates unconstrained domain with given dimensionality.
    pub fn unconstrained(dim: usize) -> Self {
        assert!(dim > 0, "empty domain");

        let inf = T::from_subset(&f64::INFINITY);
        let n = Dyn(dim);

        Self {
            lower: OVector::from_element_generic(n, Const::<1>, -inf),
            upper: OVector::from_element_generic(n, Const::<1>, inf),
            scale: None,
        }
    }

    /// Creates rectangular domain with given lower and upper bounds.
    ///
    /// Positive and negative infinity can be used to indicate a value unbounded
    /// in that dimension and direction.
    pub fn rect(lower: Vec<T>, upper: Vec<T>) -> Self {
        assert!(
            lower.len() == upper.len(),
            "lower and upper have different size"
        );

        let dim = lower.len();
        assert!(dim > 0, "empty domain");

        let scale = lower
            .iter()
            .copied()
            .zip(upper.iter().copied())
            .map(|(l, u)| T::one() / estimate_magnitude_from_bounds(l, u));

        let n = Dyn(dim);
        let scale = OVector::from_iterator_generic(n, Const::<1>, scale);

        Self {
            lower: OVector::from_vec_generic(n, Const::<1>, lower),
            upper: OVector::from_vec_generic(n, Const::<1>, upper),
            scale: Some(scale),
        }
    }

    /// Creates domain where all variables share the same bounds.
    pub fn uniform(dim: usize, lower: T, upper: T) -> Self {
        Self::rect(vec![lower; dim], vec![upper; dim])
    }

    /// Gets the scale if available.
    ///
    /// Scale of a variable is the inverse of its expected magnitude. It is
    /// estimated for a bounded domain. There is no reliable way to estimate it
    /// for an unconstrained domain, so `None` is returned.
    pub fn scale(&self) -> Option<&OVector<T, Dyn>> {
        self.scale.as_ref()
    }

    /// Projects given point into the domain. Returns `true` if the point was
    /// outside and had to be moved.
    pub fn project<D, Sx>(&self, x: &mut Vector<T, D, Sx>) -> bool
    where
        D: Dim,
        Sx: StorageMut<T, D>,
    {
        let mut not_feasible = false;

        self.lower
            .iter()
            .zip(self.upper.iter())
            .zip(x.iter_mut())
            .for_each(|((li, ui), xi)| {
                if &*xi < li {
                    *xi = *li;
                    not_feasible = true;
                } else if &*xi > ui {
                    *xi = *ui;
                    not_feasible = true;
                }
            });

        not_feasible
    }
}
