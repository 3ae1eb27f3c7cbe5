//! Loss and constraint penalty of a speed vector.
//!
//! The loss is the total race time. The penalty scores violations of the
//! battery bounds (0 % and 100 % of capacity, after every segment) and the
//! speed bounds (0 and the vehicle's maximum speed, on every segment). The
//! [`Composite`] objective `loss + mu * penalty` is what the penalty method
//! hands to the inner minimizer.

use getset::CopyGetters;
use nalgebra::{storage::Storage, Dyn, IsContiguous, Vector};

use crate::core::{Domain, Error, Function, Problem};
use crate::energy::EnergyModel;
use crate::params::ModelParams;
use crate::penalty::{BoxPenalty, PenaltyMode};
use crate::route::Route;

const LEVEL_PERCENT_MIN: f64 = 0.0;
const LEVEL_PERCENT_MAX: f64 = 100.0;

/// Total time in s needed to drive the route at given speeds.
pub fn loss(route: &Route, speeds: &[f64]) -> Result<f64, Error> {
    route.check_speeds(speeds)?;

    Ok(route
        .iter()
        .zip(speeds)
        .map(|(segment, speed)| segment.transit_time(*speed))
        .sum())
}

/// Loss and penalty of a speed vector.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Assessment {
    /// Total race time in s.
    loss: f64,
    /// Total penalty.
    penalty: f64,
}

impl Assessment {
    /// Loss plus the penalty multiplied by `weight`.
    pub fn score(&self, weight: f64) -> f64 {
        self.loss + weight * self.penalty
    }

    /// `true` if the penalty is zero.
    pub fn is_feasible(&self) -> bool {
        self.penalty == 0.0
    }
}

/// The race problem: a route, the energy model and the penalty shape.
#[derive(Debug, Clone, Copy)]
pub struct Race<'a> {
    route: &'a Route,
    model: EnergyModel,
    shape: BoxPenalty,
}

impl<'a> Race<'a> {
    /// Creates the problem with default penalty shape.
    pub fn new(route: &'a Route, params: ModelParams) -> Self {
        Self {
            route,
            model: EnergyModel::new(params),
            shape: BoxPenalty::default(),
        }
    }

    /// Uses a custom penalty shape.
    pub fn with_penalty(mut self, shape: BoxPenalty) -> Self {
        self.shape = shape;
        self
    }

    /// Gets the route.
    pub fn route(&self) -> &'a Route {
        self.route
    }

    /// Gets the energy model.
    pub fn model(&self) -> &EnergyModel {
        &self.model
    }

    /// Gets the penalty shape.
    pub fn shape(&self) -> &BoxPenalty {
        &self.shape
    }

    /// Maximum allowed speed.
    pub fn max_speed(&self) -> f64 {
        self.model.params().vehicle().max_speed()
    }

    /// Total race time in s.
    pub fn loss(&self, speeds: &[f64]) -> Result<f64, Error> {
        loss(self.route, speeds)
    }

    /// Penalty of the battery trajectory. The initial level is excluded since
    /// it is always the full charge.
    pub fn energy_penalty(&self, levels: &[f64], mode: PenaltyMode) -> f64 {
        let battery = self.model.params().battery();

        self.shape.sum(
            levels.iter().skip(1).map(|level| battery.percent(*level)),
            LEVEL_PERCENT_MIN,
            LEVEL_PERCENT_MAX,
            mode,
        )
    }

    /// Penalty of the speeds.
    pub fn speed_penalty(&self, speeds: &[f64], mode: PenaltyMode) -> f64 {
        self.shape
            .sum(speeds.iter().copied(), 0.0, self.max_speed(), mode)
    }

    /// Sum of the energy and speed penalties.
    pub fn total_penalty(&self, speeds: &[f64], mode: PenaltyMode) -> Result<f64, Error> {
        let levels = self.model.trajectory(self.route, speeds)?;
        Ok(self.energy_penalty(&levels, mode) + self.speed_penalty(speeds, mode))
    }

    /// Computes both loss and penalty.
    pub fn assess(&self, speeds: &[f64], mode: PenaltyMode) -> Result<Assessment, Error> {
        Ok(Assessment {
            loss: self.loss(speeds)?,
            penalty: self.total_penalty(speeds, mode)?,
        })
    }

    /// Builds the composite objective `loss + mu * penalty`.
    pub fn composite(&self, mu: f64, mode: PenaltyMode) -> Composite<'a> {
        Composite {
            race: *self,
            mu,
            mode,
        }
    }
}

/// Composite objective `loss + mu * penalty` over the speed vector.
///
/// Speeds where the model is undefined (zero, negative, non-finite) evaluate
/// to positive infinity, which minimizers treat as a rejected point.
#[derive(Debug, Clone, Copy)]
pub struct Composite<'a> {
    race: Race<'a>,
    mu: f64,
    mode: PenaltyMode,
}

impl<'a> Composite<'a> {
    /// Gets the penalty weight.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Gets the underlying race.
    pub fn race(&self) -> &Race<'a> {
        &self.race
    }
}

impl Problem for Composite<'_> {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::uniform(self.race.route.len(), 0.0, self.race.max_speed())
    }
}

impl Function for Composite<'_> {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        match self.race.assess(x.as_slice(), self.mode) {
            Ok(assessment) => assessment.score(self.mu),
            Err(_) => f64::INFINITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::DVector;

    use super::*;
    use crate::testing::*;

    #[test]
    fn loss_is_total_time() {
        let route = flat_route(3, 1000.0, 500.0);

        assert_relative_eq!(loss(&route, &[10.0, 10.0, 10.0]).unwrap(), 300.0);
        assert_relative_eq!(loss(&route, &[10.0, 20.0, 40.0]).unwrap(), 175.0);
    }

    #[test]
    fn loss_rejects_invalid_speed() {
        let route = flat_route(3, 1000.0, 500.0);

        assert!(matches!(
            loss(&route, &[10.0, -5.0, 10.0]),
            Err(Error::InvalidSpeed { segment: 1, .. })
        ));
        assert!(matches!(
            loss(&route, &[10.0]),
            Err(Error::InvalidDimensionality { .. })
        ));
    }

    #[test]
    fn initial_level_not_penalized() {
        let route = flat_route(2, 1000.0, 0.0);
        let race = Race::new(&route, Default::default());
        let capacity = race.model().params().battery().capacity();

        // Only the levels after the segments count.
        let levels = [capacity, 0.5 * capacity, 0.5 * capacity];
        assert_eq!(race.energy_penalty(&levels, PenaltyMode::Indicator), 0.0);
        assert_eq!(race.energy_penalty(&levels, PenaltyMode::Smooth), 0.0);

        let levels = [capacity, capacity, -1.0];
        assert_eq!(
            race.energy_penalty(&levels, PenaltyMode::Indicator),
            2.0 * 3600.0
        );
    }

    #[test]
    fn speed_penalty_bounds() {
        let route = flat_route(3, 1000.0, 0.0);
        let race = Race::new(&route, Default::default());

        assert_eq!(
            race.speed_penalty(&[10.0, 20.0, 39.0], PenaltyMode::Indicator),
            0.0
        );
        assert_eq!(
            race.speed_penalty(&[10.0, 40.0, 45.0], PenaltyMode::Indicator),
            7200.0
        );
        assert_eq!(
            race.speed_penalty(&[20.0, 20.0, 20.0], PenaltyMode::Smooth),
            0.0
        );
    }

    #[test]
    fn sunny_slow_drive_overcharges() {
        // At 10 m/s on a sunny flat road the battery would go above 100 %.
        let route = flat_route(3, 1000.0, 500.0);
        let race = Race::new(&route, Default::default());

        let assessment = race.assess(&[10.0, 10.0, 10.0], PenaltyMode::Indicator).unwrap();
        assert_relative_eq!(assessment.loss(), 300.0);
        assert_eq!(assessment.penalty(), 3.0 * 3600.0);
        assert!(!assessment.is_feasible());
    }

    #[test]
    fn composite_combines_loss_and_penalty() {
        let route = hilly_route();
        let race = Race::new(&route, Default::default());
        let speeds = vec![22.0; route.len()];

        let assessment = race.assess(&speeds, PenaltyMode::Smooth).unwrap();
        let f = race.composite(2.5, PenaltyMode::Smooth);
        let value = f.apply(&DVector::from_vec(speeds));

        assert_relative_eq!(value, assessment.loss() + 2.5 * assessment.penalty());
    }

    #[test]
    fn composite_infinite_for_invalid_speeds() {
        let route = flat_route(3, 1000.0, 500.0);
        let race = Race::new(&route, Default::default());
        let f = race.composite(1.0, PenaltyMode::Smooth);

        assert_eq!(
            f.apply(&DVector::from_vec(vec![10.0, 0.0, 10.0])),
            f64::INFINITY
        );
        assert_eq!(
            f.apply(&DVector::from_vec(vec![10.0, -3.0, 10.0])),
            f64::INFINITY
        );
    }
}
