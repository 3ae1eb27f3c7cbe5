//! Arrival times under a daily driving window.
//!
//! Racing is allowed only between the window's start and end hour each day.
//! When a segment would end after the window closes, the excess driving time
//! carries over to the start of the next day's window. The resulting arrival
//! times are what an external irradiance model needs to resolve
//! [`Segment::solar_radiation`](crate::route::Segment::solar_radiation) via
//! [`Route::with_radiation`].

use getset::{CopyGetters, Setters};
use log::debug;

use crate::core::Error;
use crate::route::Route;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Arrival at a segment start, expressed as a race day and a time of day.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Arrival {
    /// Race day, starting from 0.
    day: u32,
    /// Time of day in hours.
    hour: f64,
}

/// Daily driving window.
#[derive(Debug, Clone, Copy, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct DriveWindow {
    /// Hour at which driving starts every day. Default: `8`.
    start_hour: f64,
    /// Hour at which driving stops every day. Default: `17`.
    end_hour: f64,
    /// Hour of the departure on the first day. Default: `8.5`.
    departure_hour: f64,
}

impl Default for DriveWindow {
    fn default() -> Self {
        Self {
            start_hour: 8.0,
            end_hour: 17.0,
            departure_hour: 8.5,
        }
    }
}

impl DriveWindow {
    /// Computes the arrival at the start of every segment when the route is
    /// driven with given speeds.
    pub fn arrivals(&self, route: &Route, speeds: &[f64]) -> Result<Vec<Arrival>, Error> {
        assert!(
            self.start_hour < self.end_hour,
            "drive window must not be empty"
        );
        route.check_speeds(speeds)?;

        let start = self.start_hour * SECONDS_PER_HOUR;
        let end = self.end_hour * SECONDS_PER_HOUR;
        let window = end - start;

        let mut day: u32 = 0;
        let mut now = self.departure_hour * SECONDS_PER_HOUR;
        let mut arrivals = Vec::with_capacity(route.len());

        for (index, (segment, speed)) in route.iter().zip(speeds).enumerate() {
            arrivals.push(Arrival {
                day,
                hour: now / SECONDS_PER_HOUR,
            });

            now += segment.transit_time(*speed);

            if now >= end {
                let exceeded = now - end;
                let days = (exceeded / window).floor() + 1.0;

                let overflow = Error::ScheduleOverflow { segment: index };
                if days >= u32::MAX as f64 {
                    return Err(overflow);
                }

                day = day.checked_add(days as u32).ok_or(overflow)?;
                now = start + exceeded % window;
            }
        }

        debug!(
            "route of {} segments ends on day {} at {:.2} h",
            route.len(),
            day,
            now / SECONDS_PER_HOUR
        );

        Ok(arrivals)
    }
}
