//! Route geometry and per-segment environment inputs.

use getset::CopyGetters;

use crate::core::Error;

/// One leg of the route driven at a constant speed.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Segment {
    /// Length in m.
    length: f64,
    /// Slope angle in rad. Positive values are uphill.
    slope_angle: f64,
    /// Solar irradiance in W/m² at the time the car drives the segment.
    solar_radiation: f64,
}

impl Segment {
    /// Creates a segment.
    pub fn new(length: f64, slope_angle: f64, solar_radiation: f64) -> Self {
        Self {
            length,
            slope_angle,
            solar_radiation,
        }
    }

    /// Returns a copy of the segment with different irradiance.
    pub fn with_radiation(self, solar_radiation: f64) -> Self {
        Self {
            solar_radiation,
            ..self
        }
    }

    /// Transit time in s at given speed.
    pub fn transit_time(&self, speed: f64) -> f64 {
        self.length / speed
    }

    fn validate(&self, index: usize) -> Result<(), Error> {
        let reason = if !(self.length.is_finite() && self.length > 0.0) {
            "length must be positive and finite"
        } else if !(self.slope_angle.is_finite()
            && self.slope_angle.abs() < std::f64::consts::FRAC_PI_2)
        {
            "slope angle must be finite and within (-pi/2, pi/2)"
        } else if !(self.solar_radiation.is_finite() && self.solar_radiation >= 0.0) {
            "solar radiation must be non-negative and finite"
        } else {
            return Ok(());
        };

        Err(Error::InvalidSegment { index, reason })
    }
}

/// Ordered, immutable sequence of segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    segments: Vec<Segment>,
}

impl Route {
    /// Creates the route, validating every segment.
    pub fn new(segments: Vec<Segment>) -> Result<Self, Error> {
        if segments.is_empty() {
            return Err(Error::EmptyRoute);
        }

        for (index, segment) in segments.iter().enumerate() {
            segment.validate(index)?;
        }

        Ok(Self { segments })
    }

    /// Gets the segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Gets the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// A validated route is never empty. Provided for completeness.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterates over the segments.
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// Total length in m.
    pub fn total_length(&self) -> f64 {
        self.segments.iter().map(Segment::length).sum()
    }

    /// Checks that the speed vector is usable for this route: one speed per
    /// segment, every speed positive and finite.
    pub fn check_speeds(&self, speeds: &[f64]) -> Result<(), Error> {
        if speeds.len() != self.len() {
            return Err(Error::InvalidDimensionality {
                expected: self.len(),
                actual: speeds.len(),
            });
        }

        match speeds
            .iter()
            .position(|speed| !(speed.is_finite() && *speed > 0.0))
        {
            Some(segment) => Err(Error::InvalidSpeed {
                segment,
                speed: speeds[segment],
            }),
            None => Ok(()),
        }
    }

    /// Resolves the irradiance of every segment by calling `radiation` with
    /// the segment index and the segment itself. Used to update a route after
    /// the arrival times change.
    pub fn with_radiation<R>(&self, mut radiation: R) -> Result<Self, Error>
    where
        R: FnMut(usize, &Segment) -> f64,
    {
        let segments = self
            .segments
            .iter()
            .enumerate()
            .map(|(i, segment)| segment.with_radiation(radiation(i, segment)))
            .collect();

        Self::new(segments)
    }
}

impl<'a> IntoIterator for &'a Route {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_route_rejected() {
        assert!(matches!(Route::new(Vec::new()), Err(Error::EmptyRoute)));
    }

    #[test]
    fn invalid_segments_rejected() {
        let bad = vec![
            Segment::new(1000.0, 0.0, 500.0),
            Segment::new(0.0, 0.0, 500.0),
        ];
        assert!(matches!(
            Route::new(bad),
            Err(Error::InvalidSegment { index: 1, .. })
        ));

        let bad = vec![Segment::new(1000.0, 0.0, -1.0)];
        assert!(matches!(
            Route::new(bad),
            Err(Error::InvalidSegment { index: 0, .. })
        ));
    }

    #[test]
    fn speeds_checked() {
        let route = Route::new(vec![Segment::new(1000.0, 0.0, 500.0); 3]).unwrap();

        assert!(route.check_speeds(&[10.0, 10.0, 10.0]).is_ok());
        assert!(matches!(
            route.check_speeds(&[10.0, 10.0]),
            Err(Error::InvalidDimensionality {
                expected: 3,
                actual: 2
            })
        ));
        assert!(matches!(
            route.check_speeds(&[10.0, 0.0, 10.0]),
            Err(Error::InvalidSpeed { segment: 1, .. })
        ));
        assert!(matches!(
            route.check_speeds(&[10.0, 10.0, f64::NAN]),
            Err(Error::InvalidSpeed { segment: 2, .. })
        ));
    }

    #[test]
    fn radiation_resolved_per_segment() {
        let route = Route::new(vec![Segment::new(1000.0, 0.0, 0.0); 3]).unwrap();
        let route = route.with_radiation(|i, _| 100.0 * i as f64).unwrap();

        let radiation: Vec<_> = route.iter().map(Segment::solar_radiation).collect();
        assert_eq!(radiation, vec![0.0, 100.0, 200.0]);
        assert_eq!(route.total_length(), 3000.0);
    }
}
