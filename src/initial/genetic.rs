//! Evolutionary search over speed vectors.
//!
//! The initial population consists of uniform speed vectors. In every epoch,
//! each member produces offspring by adding a bounded uniform random
//! perturbation to every speed, with perturbation widths `1, 2, ...,
//! mutation_rate - 1`. The offspring are projected into the allowed speed
//! range. Parents and offspring are then ranked by `loss + weight * penalty`
//! (indicator penalty) and the population is truncated to its size.
//!
//! The search stops after `max_epochs` epochs or when the best member has not
//! changed for `patience` epochs.

use std::time::Instant;

use fastrand::Rng;
use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::DVector;

use super::InitialGuess;
use crate::core::{Domain, Error, Sample};
use crate::objective::Race;
use crate::penalty::PenaltyMode;

/// Options for [`Genetic`] search.
#[derive(Debug, Clone, Copy, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct GeneticOptions {
    /// Number of members kept after every epoch. Default: `10`.
    population_size: usize,
    /// Upper limit (exclusive) of perturbation widths. Default: `5`.
    mutation_rate: usize,
    /// Number of offspring batches per member and epoch. Default: `2`.
    rounds: usize,
    /// Maximum number of epochs. Default: `30`.
    max_epochs: usize,
    /// Number of epochs without a new best member after which the search
    /// stops. Default: `3`.
    patience: usize,
    /// Weight of the penalty in the ranking. Default: `100`.
    penalty_weight: f64,
    /// Lowest allowed speed. Default: `1`.
    min_speed: f64,
}

impl Default for GeneticOptions {
    fn default() -> Self {
        Self {
            population_size: 10,
            mutation_rate: 5,
            rounds: 2,
            max_epochs: 30,
            patience: 3,
            penalty_weight: 100.0,
            min_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Member {
    id: usize,
    speeds: DVector<f64>,
    score: f64,
}

/// Genetic search. See [module](self) documentation for more details.
#[derive(Debug, Clone)]
pub struct Genetic {
    options: GeneticOptions,
    speeds: Vec<f64>,
    rng: Rng,
}

impl Genetic {
    /// Initializes the search with default options and initial speeds `15,
    /// 16, ..., 19`.
    pub fn new(seed: u64) -> Self {
        Self::with_options(GeneticOptions::default(), seed)
    }

    /// Initializes the search with given options.
    pub fn with_options(options: GeneticOptions, seed: u64) -> Self {
        Self {
            options,
            speeds: (15..20).map(f64::from).collect(),
            rng: Rng::with_seed(seed),
        }
    }

    /// Uses given uniform speeds for the initial population.
    pub fn with_speeds(mut self, speeds: Vec<f64>) -> Self {
        assert!(!speeds.is_empty(), "initial speeds must not be empty");
        self.speeds = speeds;
        self
    }

    /// Gets the options.
    pub fn options(&self) -> &GeneticOptions {
        &self.options
    }

    fn score(&self, race: &Race<'_>, speeds: &DVector<f64>) -> Result<f64, Error> {
        Ok(race
            .assess(speeds.as_slice(), PenaltyMode::Indicator)?
            .score(self.options.penalty_weight))
    }
}

impl InitialGuess for Genetic {
    const NAME: &'static str = "Genetic";

    fn guess(&mut self, race: &Race<'_>) -> Result<Vec<f64>, Error> {
        let GeneticOptions {
            population_size,
            mutation_rate,
            rounds,
            max_epochs,
            patience,
            min_speed,
            ..
        } = self.options;

        assert!(population_size > 0, "population must not be empty");

        let start = Instant::now();
        let n = race.route().len();
        let dom = Domain::uniform(n, min_speed, race.max_speed());
        let mut next_id = 0;

        let mut population = Vec::with_capacity(population_size);
        for &speed in &self.speeds {
            let mut speeds = DVector::from_element(n, speed);
            dom.project(&mut speeds);

            population.push(Member {
                id: next_id,
                score: self.score(race, &speeds)?,
                speeds,
            });
            next_id += 1;
        }

        population.sort_by(|a, b| a.score.total_cmp(&b.score));

        let mut epoch = 1;
        let mut stale = 0;

        while epoch <= max_epochs && stale < patience {
            let best_id = population[0].id;
            let mut offspring = Vec::new();

            for parent in &population {
                for _ in 0..rounds {
                    for width in 1..mutation_rate {
                        let width = width as f64;
                        let mut speeds = parent.speeds.clone();

                        speeds
                            .iter_mut()
                            .for_each(|v| *v += f64::sample_uniform(-width, width, &mut self.rng));
                        dom.project(&mut speeds);

                        offspring.push(Member {
                            id: next_id,
                            score: self.score(race, &speeds)?,
                            speeds,
                        });
                        next_id += 1;
                    }
                }
            }

            population.extend(offspring);
            // Stable sort, so older members win ties.
            population.sort_by(|a, b| a.score.total_cmp(&b.score));
            population.truncate(population_size);

            debug!(
                "epoch {}: best score = {}, worst kept score = {}",
                epoch,
                population[0].score,
                population[population.len() - 1].score
            );

            if population[0].id == best_id {
                stale += 1;
            } else {
                stale = 0;
            }

            epoch += 1;
        }

        debug!(
            "genetic search finished after {} epochs in {:?}",
            epoch - 1,
            start.elapsed()
        );

        Ok(population[0].speeds.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn improves_on_uniform_start() {
        let route = flat_route(3, 10_000.0, 0.0);
        let race = Race::new(&route, Default::default());

        let speeds = Genetic::new(1).guess(&race).unwrap();
        let assessment = race.assess(&speeds, PenaltyMode::Indicator).unwrap();

        assert_eq!(speeds.len(), 3);
        assert!(speeds.iter().all(|v| (1.0..=40.0).contains(v)));
        assert!(assessment.is_feasible());
        assert!(assessment.loss() < 3.0 * 10_000.0 / 19.0);
    }

    #[test]
    fn reproducible_with_seed() {
        let route = hilly_route();
        let race = Race::new(&route, Default::default());

        let first = Genetic::new(7).guess(&race).unwrap();
        let second = Genetic::new(7).guess(&race).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn zero_epochs_returns_best_initial() {
        let route = flat_route(3, 10_000.0, 0.0);
        let race = Race::new(&route, Default::default());

        let mut options = GeneticOptions::default();
        options.set_max_epochs(0);

        let speeds = Genetic::with_options(options, 1)
            .with_speeds(vec![12.0, 30.0, 20.0])
            .guess(&race)
            .unwrap();

        assert_eq!(speeds, vec![30.0, 30.0, 30.0]);
    }
}
