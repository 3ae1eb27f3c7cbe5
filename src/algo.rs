//! The collection of implemented algorithms.

pub mod bfgs;
pub mod golden_section;
pub mod penalty_method;

pub use bfgs::Bfgs;
pub use golden_section::GoldenSection;
pub use penalty_method::PenaltyMethod;
