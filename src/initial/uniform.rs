//! Search for the best speed shared by all segments.
//!
//! The range of speeds is first sampled to find the sub-range where the
//! battery is not depleted at the finish. Then a [`GoldenSection`] search
//! minimizes `loss + penalty` (indicator penalty) over that sub-range. If no
//! sample keeps the final charge non-negative, the whole range is searched.

use getset::{CopyGetters, Setters};
use log::{debug, warn};

use super::InitialGuess;
use crate::algo::golden_section::{GoldenSection, GoldenSectionOptions};
use crate::core::Error;
use crate::objective::Race;
use crate::penalty::PenaltyMode;

/// Uniform speed search. See [module](self) documentation for more details.
#[derive(Debug, Clone, Copy, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct UniformSearch {
    /// Lowest speed considered. Default: `5`.
    lower: f64,
    /// Highest speed considered. Default: `40`.
    upper: f64,
    /// Number of samples of the brute-force pass. Default: `100`.
    samples: usize,
    /// Options of the golden-section pass.
    golden: GoldenSectionOptions,
}

impl Default for UniformSearch {
    fn default() -> Self {
        Self {
            lower: 5.0,
            upper: 40.0,
            samples: 100,
            golden: GoldenSectionOptions::default(),
        }
    }
}

impl UniformSearch {
    /// Initializes the search with default options.
    pub fn new() -> Self {
        Self::default()
    }

    fn final_level(race: &Race<'_>, speed: f64) -> Result<f64, Error> {
        let n = race.route().len();
        let levels = race.model().trajectory(race.route(), &vec![speed; n])?;
        Ok(levels.last().copied().unwrap_or_default())
    }

    /// Finds the sub-range of sampled speeds for which the battery is not
    /// depleted at the finish. Returns `None` if there is no such speed.
    pub fn feasible_range(&self, race: &Race<'_>) -> Result<Option<(f64, f64)>, Error> {
        assert!(self.samples > 1, "at least two samples are required");
        assert!(
            0.0 < self.lower && self.lower < self.upper,
            "invalid speed range"
        );

        let step = (self.upper - self.lower) / (self.samples - 1) as f64;
        let mut range: Option<(f64, f64)> = None;

        for k in 0..self.samples {
            let speed = self.lower + step * k as f64;

            if Self::final_level(race, speed)? >= 0.0 {
                range = Some(match range {
                    Some((lo, hi)) => (lo.min(speed), hi.max(speed)),
                    None => (speed, speed),
                });
            }
        }

        Ok(range)
    }
}

impl InitialGuess for UniformSearch {
    const NAME: &'static str = "Uniform";

    fn guess(&mut self, race: &Race<'_>) -> Result<Vec<f64>, Error> {
        let n = race.route().len();

        let score = |speed: f64| {
            race.assess(&vec![speed; n], PenaltyMode::Indicator)
                .map(|assessment| assessment.score(1.0))
                .unwrap_or(f64::INFINITY)
        };

        let (lo, hi) = match self.feasible_range(race)? {
            Some(range) => range,
            None => {
                warn!(
                    "battery depleted for every uniform speed in [{}, {}], searching the whole range",
                    self.lower, self.upper
                );
                (self.lower, self.upper)
            }
        };

        let speed = if lo < hi {
            match GoldenSection::with_options(self.golden).minimize(score, lo, hi) {
                Ok((speed, _)) => speed,
                Err(error) => {
                    warn!("golden section failed: {}, using the upper bound", error);
                    hi
                }
            }
        } else {
            lo
        };

        debug!("uniform search found {} m/s in [{}, {}]", speed, lo, hi);

        Ok(vec![speed; n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn restricted_to_non_depleting_speeds() {
        // Two 200 km segments without sun. At 25 m/s the battery is slightly
        // depleted at the finish, so the speed stays below that.
        let route = flat_route(2, 200_000.0, 0.0);
        let race = Race::new(&route, Default::default());
        let mut search = UniformSearch::new();

        let (lo, hi) = search.feasible_range(&race).unwrap().unwrap();
        assert_eq!(lo, 5.0);
        assert!(hi > 24.0 && hi < 25.0);

        let speeds = search.guess(&race).unwrap();
        assert_eq!(speeds.len(), 2);
        assert_eq!(speeds[0], speeds[1]);
        assert!(speeds[0] > 24.0 && speeds[0] < 25.0);

        let levels = race.model().trajectory(&route, &speeds).unwrap();
        assert!(levels[2] >= 0.0);
    }

    #[test]
    fn falls_back_to_whole_range() {
        let route = dark_route();
        let race = Race::new(&route, Default::default());
        let mut search = UniformSearch::new();

        assert_eq!(search.feasible_range(&race).unwrap(), None);

        let speeds = search.guess(&race).unwrap();
        assert_eq!(speeds.len(), 3);
        assert!(speeds.iter().all(|v| (5.0..=40.0).contains(v)));
    }

    #[test]
    fn single_feasible_sample() {
        let route = flat_route(2, 200_000.0, 0.0);
        let race = Race::new(&route, Default::default());

        let mut search = UniformSearch::new();
        search.set_lower(24.0).set_upper(26.0).set_samples(2);

        assert_eq!(search.feasible_range(&race).unwrap(), Some((24.0, 24.0)));
        assert_eq!(search.guess(&race).unwrap(), vec![24.0, 24.0]);
    }
}
