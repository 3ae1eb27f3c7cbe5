use fastrand::Rng;
use thiserror::Error;

use super::domain::Domain;

/// Extension of the [`nalgebra::RealField`] with constants commonly used in
/// numerical algorithms.
pub trait RealField: nalgebra::RealField {
    /// Square root of the machine epsilon. Standard step size for approximating
    /// first-order derivatives.
    const EPSILON_SQRT: Self;
}

impl RealField for f32 {
    const EPSILON_SQRT: Self = 0.00034526698;
}

impl RealField for f64 {
    const EPSILON_SQRT: Self = 0.000000014901161193847656;
}

/// Random sampling of scalar values.
pub trait Sample {
    /// Samples a value uniformly from `[lower, upper)`.
    fn sample_uniform(lower: Self, upper: Self, rng: &mut Rng) -> Self;
}

impl Sample for f32 {
    fn sample_uniform(lower: Self, upper: Self, rng: &mut Rng) -> Self {
        lower + rng.f32() * (upper - lower)
    }
}

impl Sample for f64 {
    fn sample_uniform(lower: Self, upper: Self, rng: &mut Rng) -> Self {
        lower + rng.f64() * (upper - lower)
    }
}

/// The base trait for [`Function`](super::function::Function).
pub trait Problem {
    /// Type of the field, usually f32 or f64.
    type Field: RealField + Copy;

    /// Gets the domain (bound constraints and dimension) of the problem.
    fn domain(&self) -> Domain<Self::Field>;
}

/// Error raised by the race model and the optimization entry points.
///
/// Soft conditions (negative force magnitudes, exceeded iteration budget,
/// minimizer failure) are not errors. They are logged and, for the latter two,
/// reported through [`Status`](crate::algo::penalty_method::Status).
#[derive(Debug, Error)]
pub enum Error {
    /// A speed is zero, negative or not finite. Energy and time formulas are
    /// undefined for such values.
    #[error("invalid speed {speed} on segment {segment}")]
    InvalidSpeed {
        /// Index of the offending segment.
        segment: usize,
        /// The rejected value.
        speed: f64,
    },
    /// A speed passed to a single-segment energy formula is zero, negative or
    /// not finite.
    #[error("speed {0} is not positive and finite")]
    NonPositiveSpeed(f64),
    /// The number of speeds does not match the number of route segments.
    #[error("speed vector has {actual} elements, route has {expected} segments")]
    InvalidDimensionality {
        /// Number of route segments.
        expected: usize,
        /// Number of provided speeds.
        actual: usize,
    },
    /// A segment has a non-physical parameter.
    #[error("invalid segment {index}: {reason}")]
    InvalidSegment {
        /// Index of the offending segment.
        index: usize,
        /// Description of the problem.
        reason: &'static str,
    },
    /// The route has no segments.
    #[error("route has no segments")]
    EmptyRoute,
    /// Even the most energy-friendly allowed speed profile depletes the
    /// battery before the end of the route.
    #[error("route cannot be completed: battery depleted on segment {segment} ({level_percent:.1} %)")]
    InfeasibleRoute {
        /// Index of the first segment after which the best reachable charge is
        /// negative.
        segment: usize,
        /// Best reachable charge after that segment, in percent of capacity.
        level_percent: f64,
    },
    /// The arrival day does not fit the calendar because a segment takes
    /// too long to drive.
    #[error("arrival after segment {segment} is too many days away")]
    ScheduleOverflow {
        /// Index of the segment whose transit overflows the day counter.
        segment: usize,
    },
    /// Writing the diagnostics table failed.
    #[error("{0}")]
    Csv(#[from] csv::Error),
}
