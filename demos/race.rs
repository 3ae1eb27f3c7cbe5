use std::f64::consts::PI;
use std::io;

use solarpace::algo::penalty_method::{PenaltyOptions, Status};
use solarpace::params::ModelParams;
use solarpace::route::{Route, Segment};
use solarpace::schedule::DriveWindow;
use solarpace::{optimize, simulate};

// Clear-sky irradiance peaking at noon, zero before 6:00 and after 18:00.
fn irradiance(hour: f64) -> f64 {
    (1000.0 * (PI * (hour - 6.0) / 12.0).sin()).max(0.0)
}

fn main() -> Result<(), String> {
    let slopes = [0.0, 0.01, 0.03, -0.02, -0.04, 0.0, 0.02, -0.01, 0.0, 0.0];
    let segments = slopes
        .iter()
        .map(|slope| Segment::new(25_000.0, *slope, 0.0))
        .collect();

    let params = ModelParams::default();
    let window = DriveWindow::default();
    let mut route = Route::new(segments).map_err(|error| format!("{error}"))?;
    let mut speeds = vec![20.0; route.len()];

    // Arrival times depend on the speeds and irradiance depends on arrival
    // times, so alternate between the two a few times.
    for round in 1..=3 {
        let arrivals = window
            .arrivals(&route, &speeds)
            .map_err(|error| format!("{error}"))?;
        route = route
            .with_radiation(|i, _| irradiance(arrivals[i].hour()))
            .map_err(|error| format!("{error}"))?;

        let options = if round < 3 {
            PenaltyOptions::coarse()
        } else {
            PenaltyOptions::default()
        };

        let outcome =
            optimize(&route, &speeds, params, options).map_err(|error| format!("{error}"))?;

        println!(
            "round = {}\tstatus = {:?}\tsteps = {}\tmu = {}",
            round,
            outcome.status(),
            outcome.steps(),
            outcome.mu()
        );

        speeds = outcome.x().clone();

        if round == 3 {
            outcome
                .diagnostics()
                .write_csv(io::stdout())
                .map_err(|error| format!("{error}"))?;

            if outcome.status() != Status::Converged {
                return Err("did not converge".to_string());
            }
        }
    }

    let sim = simulate(&route, &speeds, params).map_err(|error| format!("{error}"))?;
    let battery = params.battery();

    for (i, (speed, level)) in speeds.iter().zip(&sim.levels[1..]).enumerate() {
        println!(
            "segment = {}\tspeed = {:.2} m/s\tbattery = {:.1} %",
            i,
            speed,
            battery.percent(*level)
        );
    }

    Ok(())
}
