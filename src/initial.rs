//! Searches for a starting speed vector of the penalty method.
//!
//! The penalty method converges faster and to better profiles when it starts
//! close to a feasible point. The searches here are cheap compared to the
//! method itself:
//!
//! * [`GridSearch`] tries profiles with a fast leading part and a slow rest,
//! * [`UniformSearch`] tunes one speed shared by all segments,
//! * [`Genetic`] evolves a population of profiles by random perturbation.
//!
//! [`MultiStart`] is different: it runs the whole penalty method from several
//! uniform starting points and keeps the best result.

pub mod genetic;
pub mod grid;
pub mod multistart;
pub mod uniform;

pub use genetic::Genetic;
pub use grid::GridSearch;
pub use multistart::MultiStart;
pub use uniform::UniformSearch;

use crate::core::Error;
use crate::objective::Race;

/// Interface of a starting point search.
pub trait InitialGuess {
    /// Name of the search.
    const NAME: &'static str;

    /// Produces a speed vector with one element per route segment.
    fn guess(&mut self, race: &Race<'_>) -> Result<Vec<f64>, Error>;
}
