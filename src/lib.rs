#![allow(clippy::many_single_char_names)]
#![warn(missing_docs)]

//! # Solarpace
//!
//! Speed profile optimization for solar car races.
//!
//! The race route is split into segments, each with its own length, slope
//! and solar radiation. The car drives every segment at a constant speed,
//! harvesting solar energy and spending battery energy on drag, rolling
//! resistance, climbing and the on-board electronics. The goal is to find the
//! speeds that minimize the total race time while the battery never runs dry
//! and never overflows, and the speed limit is respected.
//!
//! ## Problem
//!
//! Mathematically, the problem is formulated as
//!
//! ```text
//! minimize  T(v) = sum(L_i / v_i)
//!
//! subject to  0 % < E_i(v) < 100 %   for every segment boundary i > 0
//!             0 < v_i < v_max        for every segment i
//! ```
//!
//! where `E_i(v)` is the battery level after segment `i` given by the
//! [energy model](energy).
//!
//! ## Method
//!
//! The constraints are handled by the exterior [penalty
//! method](algo::penalty_method). It repeatedly minimizes the unconstrained
//! composite function `T(v) + mu * P(v)` with an inner [minimizer](Minimizer)
//! ([BFGS](algo::bfgs) by default) and increases `mu` until the constraint
//! violation is negligible.
//!
//! The penalty method needs a reasonable starting point. The [initial
//! guess](initial) strategies provide one: a uniform speed search, a grid
//! search over two-level profiles, a genetic search and a multi-start
//! wrapper.
//!
//! ## Usage
//!
//! ```rust
//! use solarpace::algo::penalty_method::{PenaltyOptions, Status};
//! use solarpace::params::ModelParams;
//! use solarpace::route::{Route, Segment};
//! use solarpace::{optimize, simulate};
//!
//! let route = Route::new(vec![
//!     Segment::new(10_000.0, 0.0, 850.0),
//!     Segment::new(10_000.0, 0.02, 800.0),
//!     Segment::new(10_000.0, -0.02, 750.0),
//! ])
//! .unwrap();
//!
//! let outcome = optimize(
//!     &route,
//!     &[20.0, 20.0, 20.0],
//!     ModelParams::default(),
//!     PenaltyOptions::default(),
//! )
//! .unwrap();
//!
//! if outcome.status() == Status::Converged {
//!     let sim = simulate(&route, outcome.x(), ModelParams::default()).unwrap();
//!     println!("speeds = {:?}, final charge = {} J", outcome.x(), sim.final_level());
//! }
//! ```
//!
//! For more control, use the [`SpeedOptimizer`] builder from the
//! [driver](driver) module.
//!
//! ## License
//!
//! Licensed under [MIT](https://choosealicense.com/licenses/mit/).

pub mod algo;
pub mod analysis;
mod core;
pub mod derivatives;
pub mod diagnostics;
pub mod driver;
pub mod energy;
pub mod initial;
pub mod objective;
pub mod params;
pub mod penalty;
pub mod route;
pub mod schedule;

pub use core::*;
pub use driver::{optimize, simulate, SpeedOptimizer};

#[cfg(feature = "testing")]
pub mod testing;

#[cfg(not(feature = "testing"))]
pub(crate) mod testing;

pub use nalgebra;
