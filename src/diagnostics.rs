//! Per-step log of the penalty method.

use std::io;

use serde::Serialize;

use crate::core::Error;

/// Summary of one outer step of the penalty method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    /// Outer step number, starting from 1.
    pub step: usize,
    /// Penalty weight used in this step.
    pub mu: f64,
    /// Total race time in s.
    pub loss: f64,
    /// Reporting penalty of the found speeds.
    pub penalty: f64,
    /// Reporting penalty multiplied by `mu`.
    pub weighted_penalty: f64,
    /// Mean speed in m/s.
    pub mean_speed: f64,
    /// Euclidean norm of the speed vector.
    pub norm: f64,
    /// Euclidean norm of the change from the previous speed vector.
    pub change_norm: f64,
    /// Iterations of the inner minimizer.
    pub inner_iters: usize,
}

impl StepRecord {
    /// Fills the speed statistics from the previous and the new speed vectors.
    pub fn new(
        step: usize,
        mu: f64,
        loss: f64,
        penalty: f64,
        previous: &[f64],
        speeds: &[f64],
        inner_iters: usize,
    ) -> Self {
        let n = speeds.len().max(1) as f64;

        Self {
            step,
            mu,
            loss,
            penalty,
            weighted_penalty: mu * penalty,
            mean_speed: speeds.iter().sum::<f64>() / n,
            norm: speeds.iter().map(|v| v * v).sum::<f64>().sqrt(),
            change_norm: speeds
                .iter()
                .zip(previous)
                .map(|(v, p)| (v - p).powi(2))
                .sum::<f64>()
                .sqrt(),
            inner_iters,
        }
    }
}

/// Ordered records of all outer steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    records: Vec<StepRecord>,
}

impl Diagnostics {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn push(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    /// Gets all records.
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Gets the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` if no step was recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Gets the last record.
    pub fn last(&self) -> Option<&StepRecord> {
        self.records.last()
    }

    /// Writes the log as a `;`-delimited table with a header row.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), Error> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_writer(writer);

        for record in &self.records {
            writer.serialize(record)?;
        }

        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn record_statistics() {
        let record = StepRecord::new(2, 0.3, 100.0, 3600.0, &[10.0, 10.0], &[13.0, 14.0], 7);

        assert_relative_eq!(record.weighted_penalty, 1080.0);
        assert_relative_eq!(record.mean_speed, 13.5);
        assert_relative_eq!(record.norm, (13f64.powi(2) + 14f64.powi(2)).sqrt());
        assert_relative_eq!(record.change_norm, 5.0);
    }

    #[test]
    fn csv_table() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(StepRecord::new(1, 0.5, 10.0, 0.0, &[1.0], &[1.0], 3));

        let mut buffer = Vec::new();
        diagnostics.write_csv(&mut buffer).unwrap();
        let table = String::from_utf8(buffer).unwrap();
        let mut lines = table.lines();

        assert_eq!(
            lines.next(),
            Some("step;mu;loss;penalty;weighted_penalty;mean_speed;norm;change_norm;inner_iters")
        );
        assert_eq!(lines.next(), Some("1;0.5;10.0;0.0;0.0;1.0;1.0;0.0;3"));
        assert_eq!(lines.next(), None);
    }
}
