//! Exterior penalty method for the race problem.
//!
//! The charge and speed bounds are moved into the objective as a penalty
//! weighted by `mu`. Every outer step minimizes `loss + mu * penalty` with an
//! unconstrained [`Minimizer`], starting from the previous step's result, and
//! then multiplies `mu` by a constant factor. A smooth penalty shape is used
//! for the inner minimization and an indicator shape for the acceptance check
//! and the diagnostics (see [`PenaltyMode`]).
//!
//! The iteration ends with one of the [`Status`] values:
//!
//! * *converged* when `mu * penalty` of the found speeds drops below `eps`,
//! * *exceeded* when the step budget is spent (the result may still violate
//!   the constraints),
//! * *failed* when the inner minimizer reports an error. The speeds from the
//!   last successful step (or the initial speeds) are returned.
//!
//! # References
//!
//! \[1\] [Numerical
//! Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5),
//! chapter 17.

use std::fmt;

use getset::{CopyGetters, Getters, Setters};
use log::{debug, trace, warn};

use crate::core::{Error, Minimizer};
use crate::diagnostics::{Diagnostics, StepRecord};
use crate::objective::{Composite, Race};
use crate::penalty::PenaltyMode;

/// Options for [`PenaltyMethod`].
#[derive(Debug, Clone, Copy, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct PenaltyOptions {
    /// Threshold of the weighted reporting penalty for convergence. Default:
    /// `1`.
    eps: f64,
    /// Initial penalty weight. Default: `0.1`.
    mu_init: f64,
    /// Growth factor of the penalty weight. Default: `3`.
    beta: f64,
    /// Step number after which the iteration stops when not converged. The
    /// check happens before the step counter is advanced, so up to
    /// `max_step + 1` inner solves run. Default: `20`.
    max_step: usize,
    /// Convergence tolerance passed to the inner minimizer. Default: `1e-3`.
    tolerance: f64,
    /// Penalty shape for the inner minimization. Default: smooth.
    inner_mode: PenaltyMode,
    /// Penalty shape for convergence check and diagnostics. Default:
    /// indicator.
    report_mode: PenaltyMode,
}

impl Default for PenaltyOptions {
    fn default() -> Self {
        Self {
            eps: 1.0,
            mu_init: 0.1,
            beta: 3.0,
            max_step: 20,
            tolerance: 1e-3,
            inner_mode: PenaltyMode::Smooth,
            report_mode: PenaltyMode::Indicator,
        }
    }
}

impl PenaltyOptions {
    /// Profile with a larger initial weight and a shorter budget. Suitable
    /// when the initial speeds are already close to feasible.
    pub fn coarse() -> Self {
        Self {
            mu_init: 1.0,
            max_step: 12,
            ..Self::default()
        }
    }
}

/// How the penalty method ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The weighted reporting penalty dropped below the threshold.
    Converged,
    /// The step budget was spent.
    Exceeded,
    /// The inner minimizer failed.
    Failed,
}

/// Result of the penalty method.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct PenaltyOutcome {
    /// Final speeds.
    #[getset(get = "pub")]
    x: Vec<f64>,
    /// How the iteration ended.
    #[getset(get_copy = "pub")]
    status: Status,
    /// Number of outer steps performed, including the failed one.
    #[getset(get_copy = "pub")]
    steps: usize,
    /// Penalty weight of the last step.
    #[getset(get_copy = "pub")]
    mu: f64,
    /// Records of all completed steps.
    #[getset(get = "pub")]
    diagnostics: Diagnostics,
}

impl PenaltyOutcome {
    /// Unpacks the final speeds.
    pub fn into_x(self) -> Vec<f64> {
        self.x
    }
}

/// Exterior penalty method driving an inner minimizer. See
/// [module](self) documentation for more details.
#[derive(Debug, Clone)]
pub struct PenaltyMethod<M> {
    options: PenaltyOptions,
    minimizer: M,
}

impl<M> PenaltyMethod<M> {
    /// Initializes the method with default options.
    pub fn new(minimizer: M) -> Self {
        Self::with_options(minimizer, PenaltyOptions::default())
    }

    /// Initializes the method with given options.
    pub fn with_options(minimizer: M, options: PenaltyOptions) -> Self {
        assert!(options.beta > 1.0, "beta must be greater than one");
        assert!(options.mu_init > 0.0, "initial mu must be positive");
        assert!(options.max_step > 0, "at least one step is required");

        Self { options, minimizer }
    }

    /// Gets the options.
    pub fn options(&self) -> &PenaltyOptions {
        &self.options
    }

    /// Runs the method from the initial speeds `x0`.
    ///
    /// Returns an error only for invalid initial speeds. Failures of the inner
    /// minimizer are reported via [`Status::Failed`].
    pub fn run<'a>(&mut self, race: &Race<'a>, x0: &[f64]) -> Result<PenaltyOutcome, Error>
    where
        M: Minimizer<Composite<'a>>,
        M::Error: fmt::Display,
    {
        race.route().check_speeds(x0)?;

        let PenaltyOptions {
            eps,
            mu_init,
            beta,
            max_step,
            tolerance,
            inner_mode,
            report_mode,
        } = self.options;

        let mut x = x0.to_vec();
        let mut mu = mu_init;
        let mut step = 1;
        let mut diagnostics = Diagnostics::new();

        loop {
            let f = race.composite(mu, inner_mode);

            let mut inner_iters = 0;
            let result = self.minimizer.minimize(&f, &x, tolerance, |state| {
                inner_iters = state.iter();
                trace!("step {}, inner iteration {}: f = {}", step, state.iter(), state.fx());
            });

            let minimum = match result {
                Ok(minimum) => minimum,
                Err(error) => {
                    warn!(
                        "{} failed in step {} (mu = {}): {}",
                        M::NAME,
                        step,
                        mu,
                        error
                    );
                    return Ok(failed(x, step, mu, diagnostics));
                }
            };

            let x_new: Vec<f64> = minimum.x().iter().copied().collect();

            let assessment = match race.assess(&x_new, report_mode) {
                Ok(assessment) => assessment,
                Err(error) => {
                    warn!(
                        "{} returned invalid speeds in step {} (mu = {}): {}",
                        M::NAME,
                        step,
                        mu,
                        error
                    );
                    return Ok(failed(x, step, mu, diagnostics));
                }
            };

            let record = StepRecord::new(
                step,
                mu,
                assessment.loss(),
                assessment.penalty(),
                &x,
                &x_new,
                inner_iters.max(minimum.iters()),
            );

            debug!(
                "step {}: mu = {}, loss = {:.3}, penalty = {}, weighted penalty = {:.3}, mean speed = {:.3}",
                step,
                mu,
                record.loss,
                record.penalty,
                record.weighted_penalty,
                record.mean_speed
            );

            let weighted_penalty = record.weighted_penalty;
            diagnostics.push(record);

            if weighted_penalty < eps {
                debug!("converged in step {}", step);
                return Ok(PenaltyOutcome {
                    x: x_new,
                    status: Status::Converged,
                    steps: step,
                    mu,
                    diagnostics,
                });
            }

            if step > max_step {
                warn!(
                    "step budget of {} spent, constraints may remain violated (weighted penalty = {})",
                    max_step, weighted_penalty
                );
                return Ok(PenaltyOutcome {
                    x: x_new,
                    status: Status::Exceeded,
                    steps: step,
                    mu,
                    diagnostics,
                });
            }

            mu *= beta;
            x = x_new;
            step += 1;
        }
    }
}

fn failed(x: Vec<f64>, step: usize, mu: f64, diagnostics: Diagnostics) -> PenaltyOutcome {
    PenaltyOutcome {
        x,
        status: Status::Failed,
        steps: step,
        mu,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::algo::Bfgs;
    use crate::testing::*;

    #[test]
    fn feasible_start_converges_immediately() {
        // 20 m/s without sun drains under one percent per kilometer.
        let route = flat_route(3, 1000.0, 0.0);
        let race = Race::new(&route, Default::default());
        let x0 = [20.0, 20.0, 20.0];

        let mut method = PenaltyMethod::new(Stationary);
        let outcome = method.run(&race, &x0).unwrap();

        assert_eq!(outcome.status(), Status::Converged);
        assert_eq!(outcome.steps(), 1);
        assert_eq!(outcome.x().as_slice(), &x0);
        assert_eq!(outcome.diagnostics().len(), 1);
        assert_eq!(outcome.diagnostics().records()[0].penalty, 0.0);
    }

    #[test]
    fn budget_exceeded_with_increasing_mu() {
        let route = flat_route(3, 1000.0, 0.0);
        let race = Race::new(&route, Default::default());

        let mut options = PenaltyOptions::default();
        options.set_max_step(5);
        let mut method = PenaltyMethod::with_options(Stationary, options);

        // Above the maximum speed, so the penalty never vanishes.
        let outcome = method.run(&race, &[45.0, 45.0, 45.0]).unwrap();

        assert_eq!(outcome.status(), Status::Exceeded);
        assert_eq!(outcome.steps(), 6);
        assert_eq!(outcome.diagnostics().len(), 6);
        assert_relative_eq!(outcome.mu(), 0.1 * 3f64.powi(5), max_relative = 1e-12);

        let records = outcome.diagnostics().records();
        assert!(records.windows(2).all(|w| w[1].mu > w[0].mu));
        assert!(records
            .iter()
            .enumerate()
            .all(|(i, record)| record.step == i + 1));
    }

    #[test]
    fn failure_returns_last_valid_speeds() {
        let route = flat_route(3, 1000.0, 0.0);
        let race = Race::new(&route, Default::default());
        let x0 = [45.0, 20.0, 20.0];

        let mut method = PenaltyMethod::new(Failing);
        let outcome = method.run(&race, &x0).unwrap();

        assert_eq!(outcome.status(), Status::Failed);
        assert_eq!(outcome.steps(), 1);
        assert_eq!(outcome.x().as_slice(), &x0);
        assert!(outcome.diagnostics().is_empty());
    }

    #[test]
    fn failure_after_progress_keeps_progress() {
        let route = flat_route(3, 1000.0, 0.0);
        let race = Race::new(&route, Default::default());

        // Shifts the speeds by one in the first step and fails in the second.
        let mut method = PenaltyMethod::new(FailingAfter::new(1, 1.0));
        let outcome = method.run(&race, &[45.0, 45.0, 45.0]).unwrap();

        assert_eq!(outcome.status(), Status::Failed);
        assert_eq!(outcome.steps(), 2);
        assert_eq!(outcome.x().as_slice(), &[46.0, 46.0, 46.0]);
        assert_eq!(outcome.diagnostics().len(), 1);
    }

    #[test]
    fn invalid_initial_speeds_rejected() {
        let route = flat_route(3, 1000.0, 0.0);
        let race = Race::new(&route, Default::default());
        let mut method = PenaltyMethod::new(Stationary);

        assert!(matches!(
            method.run(&race, &[20.0, 0.0, 20.0]),
            Err(Error::InvalidSpeed { segment: 1, .. })
        ));
        assert!(matches!(
            method.run(&race, &[20.0, 20.0]),
            Err(Error::InvalidDimensionality { .. })
        ));
    }

    #[test]
    fn coarse_profile() {
        let options = PenaltyOptions::coarse();

        assert_eq!(options.mu_init(), 1.0);
        assert_eq!(options.max_step(), 12);
        assert_eq!(options.beta(), 3.0);
        assert_eq!(options.eps(), 1.0);
    }

    #[test]
    fn sunny_route_with_bfgs() {
        let route = flat_route(5, 10_000.0, 800.0);
        let race = Race::new(&route, Default::default());

        let mut method = PenaltyMethod::new(Bfgs::new());
        let outcome = method.run(&race, &[20.0; 5]).unwrap();

        assert_eq!(outcome.status(), Status::Converged);
        assert!(outcome.steps() > 1);
        assert!(outcome.x().iter().all(|v| *v > 30.0 && *v < 40.0));

        let assessment = race.assess(outcome.x(), PenaltyMode::Indicator).unwrap();
        assert!(assessment.is_feasible());
        assert!(assessment.loss() < 5.0 * 10_000.0 / 30.0);
    }
}
