//! Steady-state energy model of the car.
//!
//! For every segment the car drives at a constant speed. Energy *income* is
//! the solar power collected during the transit. Energy *outcome* is the work
//! against drag, grade and rolling resistance, plus the equipment draw. Both
//! are in J. The battery [trajectory](EnergyModel::trajectory) accumulates
//! `(income - outcome) * efficiency` starting from full charge. It is
//! intentionally not clamped to the battery capacity, so the penalty model
//! can see how badly a speed vector violates the charge bounds.
//!
//! Regenerative braking is not modeled. When the net force on a segment is
//! negative (steep downhill), the propulsive work is zero and only the
//! equipment draw remains.

use log::warn;

use crate::core::Error;
use crate::params::ModelParams;
use crate::route::{Route, Segment};

/// Passes `value` through unchanged, logging a warning when it is negative.
///
/// Force magnitudes are non-negative for physically meaningful parameters, so
/// a negative value points to a mistake in the inputs.
pub fn nonnegative(name: &str, value: f64) -> f64 {
    if value < 0.0 {
        warn!("negative {} = {}, check model parameters", name, value);
    }
    value
}

/// Aerodynamic drag force in N.
pub fn drag_force(air_density: f64, speed: f64, front_area: f64, drag_coefficient: f64) -> f64 {
    nonnegative(
        "drag force",
        0.5 * air_density * speed.powi(2) * front_area * drag_coefficient,
    )
}

/// Component of gravity along the road in N. Negative downhill.
pub fn grade_force(mass: f64, gravity: f64, slope_angle: f64) -> f64 {
    mass * gravity * slope_angle.sin()
}

/// Rolling resistance force in N.
pub fn rolling_force(mass: f64, gravity: f64, slope_angle: f64, rolling_coefficient: f64) -> f64 {
    nonnegative(
        "rolling resistance force",
        mass * gravity * rolling_coefficient * slope_angle.cos(),
    )
}

fn check_speed(speed: f64) -> Result<(), Error> {
    if speed.is_finite() && speed > 0.0 {
        Ok(())
    } else {
        Err(Error::NonPositiveSpeed(speed))
    }
}

/// Solar energy collected while driving a segment, in J.
pub fn income(
    speed: f64,
    solar_radiation: f64,
    panel_area: f64,
    slope_angle: f64,
    length: f64,
    efficiency: f64,
) -> Result<f64, Error> {
    check_speed(speed)?;

    let power = solar_radiation * panel_area * slope_angle.cos() * efficiency;
    Ok(power * length / speed)
}

/// Energy spent while driving a segment, in J.
#[allow(clippy::too_many_arguments)]
pub fn outcome(
    speed: f64,
    length: f64,
    air_density: f64,
    front_area: f64,
    drag_coefficient: f64,
    mass: f64,
    gravity: f64,
    slope_angle: f64,
    rolling_coefficient: f64,
    equipment_power: f64,
    efficiency: f64,
) -> Result<f64, Error> {
    check_speed(speed)?;

    let total_force = drag_force(air_density, speed, front_area, drag_coefficient)
        + grade_force(mass, gravity, slope_angle)
        + rolling_force(mass, gravity, slope_angle, rolling_coefficient);

    // No regeneration: downhill assist does not charge the battery.
    let work_motion = total_force.max(0.0) * length / efficiency;
    let work_equipment = equipment_power * length / speed;

    Ok(work_motion + work_equipment)
}

/// Full result of simulating a speed vector over a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    /// Battery charge in J before the first segment and after every segment.
    pub levels: Vec<f64>,
    /// Energy income in J of every segment.
    pub incomes: Vec<f64>,
    /// Energy outcome in J of every segment.
    pub outcomes: Vec<f64>,
}

impl Simulation {
    /// Battery charge at the finish in J.
    pub fn final_level(&self) -> f64 {
        // There is always the initial level.
        self.levels[self.levels.len() - 1]
    }
}

/// The energy model bound to a set of parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyModel {
    params: ModelParams,
}

impl EnergyModel {
    /// Creates the model.
    pub fn new(params: ModelParams) -> Self {
        Self { params }
    }

    /// Gets the parameters.
    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    /// Energy income of a segment driven at given speed.
    pub fn segment_income(&self, segment: &Segment, speed: f64) -> Result<f64, Error> {
        let vehicle = self.params.vehicle();

        income(
            speed,
            segment.solar_radiation(),
            vehicle.panel_area(),
            segment.slope_angle(),
            segment.length(),
            vehicle.efficiency_income(),
        )
    }

    /// Energy outcome of a segment driven at given speed.
    pub fn segment_outcome(&self, segment: &Segment, speed: f64) -> Result<f64, Error> {
        let vehicle = self.params.vehicle();
        let environment = self.params.environment();

        outcome(
            speed,
            segment.length(),
            environment.air_density(),
            vehicle.front_area(),
            vehicle.drag_coefficient(),
            vehicle.mass(),
            environment.gravity(),
            segment.slope_angle(),
            environment.rolling_coefficient(),
            vehicle.equipment_power(),
            vehicle.efficiency_outcome(),
        )
    }

    /// Change of the battery charge in J after driving a segment at given
    /// speed. Negative when the segment drains the battery.
    pub fn segment_balance(&self, segment: &Segment, speed: f64) -> Result<f64, Error> {
        let income = self.segment_income(segment, speed)?;
        let outcome = self.segment_outcome(segment, speed)?;
        Ok((income - outcome) * self.params.battery().efficiency())
    }

    /// Computes the battery trajectory (in J) for given speeds.
    ///
    /// The first element is always the battery capacity. The values are not
    /// clamped.
    pub fn trajectory(&self, route: &Route, speeds: &[f64]) -> Result<Vec<f64>, Error> {
        route.check_speeds(speeds)?;

        let mut level = self.params.battery().capacity();
        let mut levels = Vec::with_capacity(route.len() + 1);
        levels.push(level);

        for (segment, speed) in route.iter().zip(speeds) {
            level += self.segment_balance(segment, *speed)?;
            levels.push(level);
        }

        Ok(levels)
    }

    /// Computes the battery trajectory together with per-segment incomes and
    /// outcomes.
    pub fn simulate(&self, route: &Route, speeds: &[f64]) -> Result<Simulation, Error> {
        route.check_speeds(speeds)?;

        let efficiency = self.params.battery().efficiency();
        let mut level = self.params.battery().capacity();

        let mut levels = Vec::with_capacity(route.len() + 1);
        let mut incomes = Vec::with_capacity(route.len());
        let mut outcomes = Vec::with_capacity(route.len());
        levels.push(level);

        for (segment, speed) in route.iter().zip(speeds) {
            let income = self.segment_income(segment, *speed)?;
            let outcome = self.segment_outcome(segment, *speed)?;

            level += (income - outcome) * efficiency;

            levels.push(level);
            incomes.push(income);
            outcomes.push(outcome);
        }

        Ok(Simulation {
            levels,
            incomes,
            outcomes,
        })
    }
}
