//! Physical parameters of the vehicle, the environment and the battery.
//!
//! All values are plain configuration passed explicitly into the [energy
//! model](crate::energy::EnergyModel). The defaults describe a single-seat
//! challenger-class car.
//!
//! The structures implement `serde` traits with `#[serde(default)]`, so a
//! configuration file only needs to list the values that differ from the
//! defaults.

use getset::{CopyGetters, Setters};
use serde::{Deserialize, Serialize};

/// Parameters of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters, Setters, Serialize, Deserialize)]
#[getset(get_copy = "pub", set = "pub")]
#[serde(default)]
pub struct Vehicle {
    /// Frontal area in m². Default: `0.6`.
    front_area: f64,
    /// Aerodynamic drag coefficient. Default: `0.15`.
    drag_coefficient: f64,
    /// Solar panel area in m². Default: `4`.
    panel_area: f64,
    /// Constant power draw of on-board equipment in W. Default: `40`.
    equipment_power: f64,
    /// Total mass in kg. Default: `385`.
    mass: f64,
    /// Efficiency of the conversion from irradiance to stored energy (panel
    /// times MPPT). Default: `0.2 * 0.985`.
    efficiency_income: f64,
    /// Efficiency of the drivetrain. Default: `0.94`.
    efficiency_outcome: f64,
    /// Maximum allowed speed in m/s. Default: `40`.
    max_speed: f64,
}

impl Default for Vehicle {
    fn default() -> Self {
        Self {
            front_area: 0.6,
            drag_coefficient: 0.15,
            panel_area: 4.0,
            equipment_power: 40.0,
            mass: 385.0,
            efficiency_income: 0.2 * 0.985,
            efficiency_outcome: 0.94,
            max_speed: 40.0,
        }
    }
}

/// Parameters of the environment that do not vary along the route.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters, Setters, Serialize, Deserialize)]
#[getset(get_copy = "pub", set = "pub")]
#[serde(default)]
pub struct Environment {
    /// Gravitational acceleration in m/s². Default: `9.81`.
    gravity: f64,
    /// Rolling resistance coefficient. Default: `0.0025`.
    rolling_coefficient: f64,
    /// Air density in kg/m³. Default: `1.18`.
    air_density: f64,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            rolling_coefficient: 0.0025,
            air_density: 1.18,
        }
    }
}

/// Parameters of the traction battery.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters, Setters, Serialize, Deserialize)]
#[getset(get_copy = "pub", set = "pub")]
#[serde(default)]
pub struct Battery {
    /// Capacity in J. The race always starts fully charged. Default: `5100 Wh`.
    capacity: f64,
    /// Charge/discharge efficiency. Default: `0.98`.
    efficiency: f64,
}

impl Default for Battery {
    fn default() -> Self {
        Self {
            capacity: 5100.0 * 3600.0,
            efficiency: 0.98,
        }
    }
}

impl Battery {
    /// Converts a charge in J to percent of the capacity.
    pub fn percent(&self, charge: f64) -> f64 {
        charge / self.capacity * 100.0
    }
}

/// Complete set of model parameters.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, CopyGetters, Setters, Serialize, Deserialize,
)]
#[getset(get_copy = "pub", set = "pub")]
#[serde(default)]
pub struct ModelParams {
    /// Vehicle parameters.
    vehicle: Vehicle,
    /// Environment parameters.
    environment: Environment,
    /// Battery parameters.
    battery: Battery,
}

impl ModelParams {
    /// Creates the parameters from their parts.
    pub fn new(vehicle: Vehicle, environment: Environment, battery: Battery) -> Self {
        Self {
            vehicle,
            environment,
            battery,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_capacity() {
        let battery = Battery::default();

        assert_eq!(battery.percent(battery.capacity()), 100.0);
        assert_eq!(battery.percent(0.0), 0.0);
        assert_eq!(battery.percent(battery.capacity() / 4.0), 25.0);
    }

    #[test]
    fn setters_chain() {
        let mut vehicle = Vehicle::default();
        vehicle.set_mass(300.0).set_max_speed(35.0);

        assert_eq!(vehicle.mass(), 300.0);
        assert_eq!(vehicle.max_speed(), 35.0);
        assert_eq!(vehicle.panel_area(), 4.0);
    }
}
