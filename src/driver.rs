//! High-level API for speed profile optimization.
//!
//! The driver encapsulates the race problem, the penalty method and its
//! inner minimizer. Before the penalty method starts, the route is checked
//! for [feasibility](crate::analysis::check_feasibility) so that hopeless
//! routes are rejected early.
//!
//! The simplest way of using the driver is to initialize it with the defaults:
//!
//! ```rust
//! use solarpace::route::{Route, Segment};
//! use solarpace::SpeedOptimizer;
//!
//! let route = Route::new(vec![Segment::new(10_000.0, 0.0, 800.0); 3]).unwrap();
//! let mut optimizer = SpeedOptimizer::new(&route);
//! ```
//!
//! If you need to specify additional settings, use the builder:
//!
//! ```rust
//! use solarpace::algo::penalty_method::PenaltyOptions;
//! use solarpace::route::{Route, Segment};
//! use solarpace::SpeedOptimizer;
//!
//! let route = Route::new(vec![Segment::new(10_000.0, 0.0, 800.0); 3]).unwrap();
//! let mut optimizer = SpeedOptimizer::builder(&route)
//!     .with_initial(vec![20.0, 20.0, 20.0])
//!     .with_options(PenaltyOptions::coarse())
//!     .build();
//! ```
//!
//! Once you have the optimizer, run it:
//!
//! ```rust
//! use solarpace::algo::penalty_method::Status;
//! use solarpace::route::{Route, Segment};
//! use solarpace::SpeedOptimizer;
//!
//! let route = Route::new(vec![Segment::new(10_000.0, 0.0, 800.0); 3]).unwrap();
//! let mut optimizer = SpeedOptimizer::builder(&route)
//!     .with_initial(vec![20.0, 20.0, 20.0])
//!     .build();
//!
//! let outcome = optimizer.run().expect("route is feasible");
//!
//! match outcome.status() {
//!     Status::Converged => println!("speeds = {:?}", outcome.x()),
//!     status => println!("best effort ({:?}): {:?}", status, outcome.x()),
//! }
//! ```

use std::fmt;
use std::time::Instant;

use log::debug;

use crate::algo::penalty_method::{PenaltyMethod, PenaltyOptions, PenaltyOutcome};
use crate::algo::Bfgs;
use crate::analysis::{check_feasibility, DEFAULT_SAMPLES};
use crate::core::{Error, Minimizer};
use crate::energy::{EnergyModel, Simulation};
use crate::initial::{InitialGuess, UniformSearch};
use crate::objective::{Composite, Race};
use crate::params::ModelParams;
use crate::penalty::BoxPenalty;
use crate::route::Route;

/// Builder for the [`SpeedOptimizer`].
pub struct SpeedOptimizerBuilder<'a, M> {
    route: &'a Route,
    params: ModelParams,
    penalty: BoxPenalty,
    options: PenaltyOptions,
    minimizer: M,
    x0: Option<Vec<f64>>,
    samples: usize,
}

impl<'a> SpeedOptimizerBuilder<'a, Bfgs<f64>> {
    fn new(route: &'a Route) -> Self {
        Self {
            route,
            params: ModelParams::default(),
            penalty: BoxPenalty::default(),
            options: PenaltyOptions::default(),
            minimizer: Bfgs::new(),
            x0: None,
            samples: DEFAULT_SAMPLES,
        }
    }
}

impl<'a, M> SpeedOptimizerBuilder<'a, M> {
    /// Sets the physical parameters of the car, the environment and the
    /// battery.
    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    /// Sets the initial speeds from which the penalty method starts. If not
    /// set, [`UniformSearch`] finds them.
    pub fn with_initial(mut self, x0: Vec<f64>) -> Self {
        self.x0 = Some(x0);
        self
    }

    /// Sets the options of the penalty method.
    pub fn with_options(mut self, options: PenaltyOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the shape of the penalty functions.
    pub fn with_penalty(mut self, penalty: BoxPenalty) -> Self {
        self.penalty = penalty;
        self
    }

    /// Sets the number of speed samples per segment of the feasibility check.
    pub fn with_feasibility_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    /// Sets specific inner minimizer to be used.
    pub fn with_minimizer<M2>(self, minimizer: M2) -> SpeedOptimizerBuilder<'a, M2> {
        SpeedOptimizerBuilder {
            route: self.route,
            params: self.params,
            penalty: self.penalty,
            options: self.options,
            minimizer,
            x0: self.x0,
            samples: self.samples,
        }
    }

    /// Builds the [`SpeedOptimizer`].
    pub fn build(self) -> SpeedOptimizer<'a, M> {
        let race = Race::new(self.route, self.params).with_penalty(self.penalty);

        SpeedOptimizer {
            race,
            method: PenaltyMethod::with_options(self.minimizer, self.options),
            x0: self.x0,
            samples: self.samples,
        }
    }
}

/// The driver of the speed profile optimization.
///
/// For default settings, use [`SpeedOptimizer::new`]. For more flexibility,
/// use [`SpeedOptimizer::builder`]. For the usage of the driver, see
/// [module](self) documentation.
pub struct SpeedOptimizer<'a, M> {
    race: Race<'a>,
    method: PenaltyMethod<M>,
    x0: Option<Vec<f64>>,
    samples: usize,
}

impl<'a> SpeedOptimizer<'a, Bfgs<f64>> {
    /// Returns the builder for specifying additional settings.
    pub fn builder(route: &'a Route) -> SpeedOptimizerBuilder<'a, Bfgs<f64>> {
        SpeedOptimizerBuilder::new(route)
    }

    /// Initializes the driver with the default settings.
    pub fn new(route: &'a Route) -> Self {
        SpeedOptimizer::builder(route).build()
    }
}

impl<'a, M> SpeedOptimizer<'a, M> {
    /// Gets the race problem.
    pub fn race(&self) -> &Race<'a> {
        &self.race
    }
}

impl<'a, M> SpeedOptimizer<'a, M>
where
    M: Minimizer<Composite<'a>>,
    M::Error: fmt::Display,
{
    /// Checks feasibility of the route, finds the initial speeds if not
    /// given, and runs the penalty method.
    pub fn run(&mut self) -> Result<PenaltyOutcome, Error> {
        let start = Instant::now();

        check_feasibility(&self.race, self.samples)?;

        let x0 = match &self.x0 {
            Some(x0) => x0.clone(),
            None => UniformSearch::new().guess(&self.race)?,
        };

        let outcome = self.method.run(&self.race, &x0)?;

        debug!(
            "optimization with {} finished in {:?}: {:?} after {} steps",
            M::NAME,
            start.elapsed(),
            outcome.status(),
            outcome.steps()
        );

        Ok(outcome)
    }

    /// Returns the name of the used minimizer.
    pub fn name(&self) -> &str {
        M::NAME
    }
}

/// Optimizes the speed profile of the route with the default minimizer.
pub fn optimize(
    route: &Route,
    initial_speeds: &[f64],
    params: ModelParams,
    options: PenaltyOptions,
) -> Result<PenaltyOutcome, Error> {
    SpeedOptimizer::builder(route)
        .with_params(params)
        .with_options(options)
        .with_initial(initial_speeds.to_vec())
        .build()
        .run()
}

/// Simulates the battery when the route is driven with given speeds.
pub fn simulate(route: &Route, speeds: &[f64], params: ModelParams) -> Result<Simulation, Error> {
    EnergyModel::new(params).simulate(route, speeds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::penalty_method::Status;
    use crate::penalty::PenaltyMode;
    use crate::testing::*;

    #[test]
    fn optimize_sunny_route() {
        let route = flat_route(5, 10_000.0, 800.0);
        let outcome = optimize(
            &route,
            &[20.0; 5],
            ModelParams::default(),
            PenaltyOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome.status(), Status::Converged);
        assert_eq!(outcome.x().len(), 5);
        assert!(!outcome.diagnostics().is_empty());

        let sim = simulate(&route, outcome.x(), ModelParams::default()).unwrap();
        assert!(sim.levels.iter().all(|level| *level >= 0.0));
    }

    #[test]
    fn optimize_long_rolling_route() {
        let route = rolling_route(20);

        for options in [PenaltyOptions::default(), PenaltyOptions::coarse()] {
            let outcome = optimize(&route, &[20.0; 20], ModelParams::default(), options).unwrap();

            assert_ne!(outcome.status(), Status::Failed);
            assert!(outcome.steps() >= 1);
            assert!(!outcome.diagnostics().is_empty());
        }
    }

    #[test]
    fn infeasible_route_rejected_before_solving() {
        let route = dark_route();

        assert!(matches!(
            optimize(
                &route,
                &[20.0; 3],
                ModelParams::default(),
                PenaltyOptions::default()
            ),
            Err(Error::InfeasibleRoute { segment: 1, .. })
        ));
    }

    #[test]
    fn invalid_initial_speeds_rejected() {
        let route = flat_route(3, 1000.0, 0.0);

        assert!(matches!(
            optimize(
                &route,
                &[20.0, -1.0, 20.0],
                ModelParams::default(),
                PenaltyOptions::default()
            ),
            Err(Error::InvalidSpeed { segment: 1, .. })
        ));
    }

    #[test]
    fn builder_with_custom_minimizer() {
        let route = flat_route(3, 1000.0, 0.0);
        let mut optimizer = SpeedOptimizer::builder(&route)
            .with_initial(vec![20.0, 25.0, 30.0])
            .with_minimizer(Stationary)
            .build();

        let outcome = optimizer.run().unwrap();

        assert_eq!(optimizer.name(), "Stationary");
        assert_eq!(outcome.status(), Status::Converged);
        assert_eq!(outcome.steps(), 1);
        assert_eq!(outcome.x().as_slice(), &[20.0, 25.0, 30.0]);
    }

    #[test]
    fn initial_speeds_found_when_not_given() {
        let route = flat_route(5, 10_000.0, 800.0);
        let mut optimizer = SpeedOptimizer::builder(&route)
            .with_minimizer(Stationary)
            .build();

        let outcome = optimizer.run().unwrap();
        let x = outcome.x();

        assert!(x.iter().all(|v| *v == x[0] && *v > 30.0));
        assert_eq!(
            optimizer
                .race()
                .assess(x, PenaltyMode::Indicator)
                .unwrap()
                .penalty(),
            0.0
        );
    }

    #[test]
    fn simulate_matches_model() {
        let route = hilly_route();
        let speeds = vec![22.0; route.len()];

        let sim = simulate(&route, &speeds, ModelParams::default()).unwrap();
        let levels = EnergyModel::default().trajectory(&route, &speeds).unwrap();

        assert_eq!(sim.levels, levels);
        assert_eq!(sim.incomes.len(), route.len());
        assert_eq!(sim.outcomes.len(), route.len());
    }
}
