//! Core abstractions and types for solarpace.
//!
//! *Users* mainly interact with the high-level [driver](crate::driver). The
//! traits here are the seams between the race objective and the numerical
//! algorithms: anything implementing [`Function`] can be minimized by any
//! [`Minimizer`], which is how the [penalty
//! method](crate::algo::penalty_method) drives its inner solves.

mod base;
mod domain;
mod function;
mod minimizer;

pub use base::*;
pub use domain::*;
pub use function::*;
pub use minimizer::*;
