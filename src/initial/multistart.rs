//! Penalty method restarted from several uniform speed vectors.
//!
//! The starting speeds are spread evenly over `[lower, upper]`. Every run
//! result is assessed with the indicator penalty and the best one is chosen
//! by the penalty first and the race time second.

use std::fmt;
use std::time::Instant;

use getset::{CopyGetters, Setters};
use log::debug;

use crate::algo::penalty_method::{PenaltyMethod, PenaltyOutcome};
use crate::core::{Error, Minimizer};
use crate::objective::{Assessment, Composite, Race};
use crate::penalty::PenaltyMode;

/// Multi-start search. See [module](self) documentation for more details.
#[derive(Debug, Clone, Copy, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct MultiStart {
    /// Lowest starting speed. Default: `10`.
    lower: f64,
    /// Highest starting speed. Default: `35`.
    upper: f64,
    /// Number of intervals between the starting speeds. There are `points +
    /// 1` runs. Default: `5`.
    points: usize,
}

impl Default for MultiStart {
    fn default() -> Self {
        Self {
            lower: 10.0,
            upper: 35.0,
            points: 5,
        }
    }
}

impl MultiStart {
    /// Initializes the search with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starting speeds of the individual runs.
    pub fn seeds(&self) -> Vec<f64> {
        assert!(self.points > 0, "at least one interval is required");

        let step = (self.upper - self.lower) / self.points as f64;
        (0..=self.points)
            .map(|i| self.lower + step * i as f64)
            .collect()
    }

    /// Runs the penalty method from every seed and returns the best outcome.
    pub fn run<'a, M>(
        &self,
        race: &Race<'a>,
        method: &mut PenaltyMethod<M>,
    ) -> Result<PenaltyOutcome, Error>
    where
        M: Minimizer<Composite<'a>>,
        M::Error: fmt::Display,
    {
        let start = Instant::now();
        let seeds = self.seeds();

        // Seeds are never empty.
        let mut best = Self::start(race, method, seeds[0])?;

        for &seed in &seeds[1..] {
            let (assessment, outcome) = Self::start(race, method, seed)?;
            let (current, _) = &best;

            if (assessment.penalty(), assessment.loss()) < (current.penalty(), current.loss()) {
                best = (assessment, outcome);
            }
        }

        debug!("multi-start finished in {:?}", start.elapsed());

        Ok(best.1)
    }

    fn start<'a, M>(
        race: &Race<'a>,
        method: &mut PenaltyMethod<M>,
        seed: f64,
    ) -> Result<(Assessment, PenaltyOutcome), Error>
    where
        M: Minimizer<Composite<'a>>,
        M::Error: fmt::Display,
    {
        let n = race.route().len();
        let outcome = method.run(race, &vec![seed; n])?;
        let assessment = race.assess(outcome.x(), PenaltyMode::Indicator)?;

        debug!(
            "start from {} m/s: {:?} after {} steps, loss = {:.3}, penalty = {}",
            seed,
            outcome.status(),
            outcome.steps(),
            assessment.loss(),
            assessment.penalty()
        );

        Ok((assessment, outcome))
    }
}
