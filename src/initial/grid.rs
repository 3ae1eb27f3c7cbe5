//! Grid search over two-level speed profiles.
//!
//! A candidate drives the first `k` segments at a high speed and the rest at
//! a low speed. All combinations of the configured high speeds, low speeds
//! and `k = 0..=n` are scored by `loss + penalty` with the indicator penalty.

use log::debug;

use super::InitialGuess;
use crate::core::Error;
use crate::objective::Race;
use crate::penalty::PenaltyMode;

/// Grid search. See [module](self) documentation for more details.
#[derive(Debug, Clone)]
pub struct GridSearch {
    high: Vec<f64>,
    low: Vec<f64>,
}

impl Default for GridSearch {
    /// High speeds `25, 30, 35` and low speeds `10, 15, 20`.
    fn default() -> Self {
        Self::new(vec![25.0, 30.0, 35.0], vec![10.0, 15.0, 20.0])
    }
}

impl GridSearch {
    /// Initializes the search with given sets of speeds.
    pub fn new(high: Vec<f64>, low: Vec<f64>) -> Self {
        assert!(
            !high.is_empty() && !low.is_empty(),
            "speed sets must not be empty"
        );
        assert!(
            high.iter().chain(low.iter()).all(|v| v.is_finite() && *v > 0.0),
            "speeds must be positive"
        );

        Self { high, low }
    }

    /// Gets the high speeds.
    pub fn high(&self) -> &[f64] {
        &self.high
    }

    /// Gets the low speeds.
    pub fn low(&self) -> &[f64] {
        &self.low
    }
}

impl InitialGuess for GridSearch {
    const NAME: &'static str = "Grid";

    fn guess(&mut self, race: &Race<'_>) -> Result<Vec<f64>, Error> {
        let n = race.route().len();
        let mut best: Option<(f64, Vec<f64>)> = None;
        let mut candidate = vec![0.0; n];

        for &high in &self.high {
            for &low in &self.low {
                for leading in 0..=n {
                    candidate[..leading].fill(high);
                    candidate[leading..].fill(low);

                    let score = race
                        .assess(&candidate, PenaltyMode::Indicator)?
                        .score(1.0);

                    // Strict comparison keeps the first of equal minima.
                    if best.as_ref().map_or(true, |(best_score, _)| score < *best_score) {
                        best = Some((score, candidate.clone()));
                    }
                }
            }
        }

        // The speed sets are not empty, so there is always a candidate.
        let (score, speeds) = best.unwrap_or_default();
        debug!("grid search best score = {}", score);

        Ok(speeds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn fastest_feasible_wins() {
        let route = flat_route(3, 1000.0, 0.0);
        let race = Race::new(&route, Default::default());

        let speeds = GridSearch::default().guess(&race).unwrap();
        assert_eq!(speeds, vec![35.0, 35.0, 35.0]);
    }

    #[test]
    fn penalty_steers_away_from_speed_limit() {
        // 45 m/s is over the speed limit. Every candidate that uses it is
        // penalized, so the fastest allowed profile wins.
        let route = flat_route(3, 1000.0, 0.0);
        let race = Race::new(&route, Default::default());

        let mut search = GridSearch::new(vec![45.0, 35.0], vec![10.0, 20.0]);
        assert_eq!(search.guess(&race).unwrap(), vec![35.0, 35.0, 35.0]);
    }

    #[test]
    fn best_candidate_on_hilly_route() {
        let route = hilly_route();
        let race = Race::new(&route, Default::default());

        let mut search = GridSearch::default();
        let speeds = search.guess(&race).unwrap();
        let score = |speeds: &[f64]| {
            race.assess(speeds, PenaltyMode::Indicator)
                .unwrap()
                .score(1.0)
        };

        assert_eq!(speeds.len(), route.len());
        assert!(speeds
            .iter()
            .all(|v| search.high().contains(v) || search.low().contains(v)));

        for uniform in [10.0, 20.0, 25.0, 35.0] {
            assert!(score(&speeds) <= score(&vec![uniform; route.len()]));
        }
    }
}
