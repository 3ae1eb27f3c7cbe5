//! Various analyses for supporting the optimization.

use log::debug;
use nalgebra::RealField;

use crate::core::Error;
use crate::objective::Race;

/// Default number of speed samples per segment used by [`check_feasibility`].
pub const DEFAULT_SAMPLES: usize = 400;

/// Estimates magnitude of the variable given lower and upper bounds.
pub fn estimate_magnitude_from_bounds<T: RealField + Copy>(lower: T, upper: T) -> T {
    let ten = T::from_subset(&10.0);
    let half = T::from_subset(&0.5);

    let avg = half * (lower.abs() + upper.abs());
    let magnitude = ten.powf(avg.abs().log10().trunc());

    // For [0, 0] range, the computed magnitude is undefined.
    if magnitude.is_finite() && magnitude > T::zero() {
        magnitude
    } else {
        T::one()
    }
}

/// Checks whether the route can be completed at all with allowed speeds.
///
/// The check is optimistic: on every segment it takes the speed with the best
/// energy balance among `samples` speeds evenly spread over `(0, max_speed]`,
/// and it lets the battery absorb only up to its capacity. If even this
/// profile depletes the battery, no speed vector can satisfy the charge
/// constraints and [`Error::InfeasibleRoute`] is returned.
///
/// Passing the check does not guarantee that the penalty method finds a
/// feasible solution, but failing it guarantees that it cannot.
pub fn check_feasibility(race: &Race<'_>, samples: usize) -> Result<(), Error> {
    assert!(samples > 0, "at least one sample is required");

    let model = race.model();
    let battery = model.params().battery();
    let capacity = battery.capacity();
    let max_speed = race.max_speed();

    let mut level = capacity;

    for (segment_index, segment) in race.route().iter().enumerate() {
        let best = (1..=samples)
            .map(|k| max_speed * k as f64 / samples as f64)
            .filter_map(|speed| model.segment_balance(segment, speed).ok())
            .fold(f64::NEG_INFINITY, f64::max);

        level = (level + best).min(capacity);

        if level < 0.0 {
            let level_percent = battery.percent(level);
            debug!(
                "route infeasible: best reachable charge after segment {} is {:.1} %",
                segment_index, level_percent
            );

            return Err(Error::InfeasibleRoute {
                segment: segment_index,
                level_percent,
            });
        }
    }

    debug!(
        "route feasible: best reachable final charge is {:.1} %",
        battery.percent(level)
    );

    Ok(())
}
