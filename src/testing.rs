//! Test routes, functions and minimizers useful for benchmarking, debugging
//! and smoke testing.
//!
//! [`flat_route`] and [`Sphere`] are recommended for first tests. The stub
//! minimizers ([`Stationary`], [`Failing`], [`FailingAfter`]) isolate the
//! penalty method from the behavior of a real minimizer.
//!
//! # References
//!
//! \[1\] [A Literature Survey of Benchmark Functions For Global Optimization
//! Problems](https://arxiv.org/abs/1308.4008)

#![allow(unused)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::sync::Once;

use log::{Level, LevelFilter, Log, Metadata, Record};

use nalgebra::{storage::Storage, DVector, Dyn, IsContiguous, OVector, Vector, U1};
use thiserror::Error;

use crate::core::{Domain, Function, Minimizer, MinimizerIterState, Minimum, Problem};
use crate::route::{Route, Segment};

/// Route of `n` flat segments of equal length and irradiance.
pub fn flat_route(n: usize, length: f64, solar_radiation: f64) -> Route {
    Route::new(vec![Segment::new(length, 0.0, solar_radiation); n])
        .expect("valid flat route")
}

/// Route of 5 km segments with climbs, descents and varying irradiance.
pub fn hilly_route() -> Route {
    let segments = [
        (0.0, 850.0),
        (0.02, 900.0),
        (0.04, 880.0),
        (-0.03, 760.0),
        (-0.06, 700.0),
        (0.01, 640.0),
        (0.0, 600.0),
    ]
    .into_iter()
    .map(|(slope_angle, solar_radiation)| Segment::new(5000.0, slope_angle, solar_radiation))
    .collect();

    Route::new(segments).expect("valid hilly route")
}

/// Route of `n` 10 km segments with alternating climbs and descents and
/// varying irradiance. Some descents are steep enough for the car to coast
/// at high speeds.
pub fn rolling_route(n: usize) -> Route {
    let segments = (0..n)
        .map(|i| {
            let slope_angle = 0.03 * (i as f64 * 0.7).sin();
            let solar_radiation = 600.0 + 300.0 * (i as f64 * 0.3).cos();
            Segment::new(10_000.0, slope_angle, solar_radiation)
        })
        .collect();

    Route::new(segments).expect("valid rolling route")
}

/// Three 600 km segments without sun. No allowed speed profile completes
/// this route.
pub fn dark_route() -> Route {
    flat_route(3, 600_000.0, 0.0)
}

/// Extension of the [`Function`] trait that provides additional information
/// that is useful for testing minimizers.
pub trait TestFunction: Function {
    /// Standard initial values for the function. Using the same initial values
    /// is essential for fair comparison of methods.
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>>;

    /// Test if given point is the global optimum, given the tolerance `eps`.
    fn is_optimum<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>, eps: Self::Field) -> bool
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous;
}

/// [Sphere
/// function](https://en.wikipedia.org/wiki/Test_functions_for_optimization)
/// \[1\].
///
/// This is a simple paraboloid which can be used in early development and
/// sanity checking as it can be considered a trivial problem.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    n: usize,
}

impl Sphere {
    /// Initializes the function with given dimension.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "n must be greater than zero");
        Self { n }
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Problem for Sphere {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(self.n)
    }
}

impl Function for Sphere {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        x.iter().map(|xi| xi.powi(2)).sum()
    }
}

impl TestFunction for Sphere {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        let init = DVector::from_iterator(
            self.n,
            (0..self.n).map(|i| if i % 2 == 0 { 10.0 } else { -10.0 }),
        );

        vec![init]
    }

    fn is_optimum<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>, eps: Self::Field) -> bool
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        self.apply(x).abs() <= eps
    }
}

/// Two-dimensional [Rosenbrock
/// function](https://en.wikipedia.org/wiki/Rosenbrock_function) \[1\] (also
/// known as Rosenbrock's valley or banana function).
///
/// The global minimum `(1, 1)` is inside a long, narrow, parabolic shaped flat
/// valley. The challenge is to find the solution inside the valley.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rosenbrock;

impl Problem for Rosenbrock {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(2)
    }
}

impl Function for Rosenbrock {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2)
    }
}

impl TestFunction for Rosenbrock {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![
            DVector::from_column_slice(&[-1.2, 1.0]),
            DVector::from_column_slice(&[2.0, 2.0]),
        ]
    }

    fn is_optimum<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>, eps: Self::Field) -> bool
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        ((x[0] - 1.0).powi(2) + (x[1] - 1.0).powi(2)).sqrt() <= eps
    }
}

/// Minimizer which accepts its starting point as the minimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stationary;

impl<F: Function> Minimizer<F> for Stationary {
    const NAME: &'static str = "Stationary";

    type Error = Infallible;

    fn minimize<C>(
        &mut self,
        f: &F,
        x0: &[F::Field],
        _tolerance: F::Field,
        _callback: C,
    ) -> Result<Minimum<F::Field>, Self::Error>
    where
        C: FnMut(MinimizerIterState<'_, F::Field>),
    {
        let x = OVector::from_column_slice_generic(Dyn(x0.len()), U1, x0);
        let fx = f.apply(&x);
        Ok(Minimum::new(x, fx, 0))
    }
}

/// Error of the failing test minimizers.
#[derive(Debug, Error)]
#[error("minimizer failed")]
pub struct MinimizerFailure;

/// Minimizer which always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Failing;

impl<F: Function> Minimizer<F> for Failing {
    const NAME: &'static str = "Failing";

    type Error = MinimizerFailure;

    fn minimize<C>(
        &mut self,
        _f: &F,
        _x0: &[F::Field],
        _tolerance: F::Field,
        _callback: C,
    ) -> Result<Minimum<F::Field>, Self::Error>
    where
        C: FnMut(MinimizerIterState<'_, F::Field>),
    {
        Err(MinimizerFailure)
    }
}

/// Minimizer which shifts every element of the starting point by a constant
/// for a given number of calls and fails afterwards.
#[derive(Debug, Clone, Copy)]
pub struct FailingAfter {
    successes: usize,
    shift: f64,
    calls: usize,
}

impl FailingAfter {
    /// Initializes the minimizer.
    pub fn new(successes: usize, shift: f64) -> Self {
        Self {
            successes,
            shift,
            calls: 0,
        }
    }
}

impl<F: Function<Field = f64>> Minimizer<F> for FailingAfter {
    const NAME: &'static str = "FailingAfter";

    type Error = MinimizerFailure;

    fn minimize<C>(
        &mut self,
        f: &F,
        x0: &[f64],
        _tolerance: f64,
        mut callback: C,
    ) -> Result<Minimum<f64>, Self::Error>
    where
        C: FnMut(MinimizerIterState<'_, f64>),
    {
        self.calls += 1;

        if self.calls > self.successes {
            return Err(MinimizerFailure);
        }

        let x = DVector::from_iterator(x0.len(), x0.iter().map(|xi| xi + self.shift));
        let fx = f.apply(&x);
        callback(MinimizerIterState::new(&x, fx, 1));

        Ok(Minimum::new(x, fx, 1))
    }
}

thread_local! {
    static CAPTURING: Cell<bool> = Cell::new(false);
    static CAPTURED: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
}

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        CAPTURING.with(Cell::get)
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            CAPTURED.with(|captured| {
                captured
                    .borrow_mut()
                    .push((record.level(), record.args().to_string()))
            });
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static LOGGER_INIT: Once = Once::new();

/// Runs `f` and returns its result together with the log records it emitted
/// on the current thread.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<(Level, String)>) {
    LOGGER_INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });

    CAPTURED.with(|captured| captured.borrow_mut().clear());
    CAPTURING.with(|capturing| capturing.set(true));
    let result = f();
    CAPTURING.with(|capturing| capturing.set(false));

    let records = CAPTURED.with(|captured| captured.take());
    (result, records)
}
