//! Labeled per-epoch table: outputs, then parameters, then metaparameters.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use fdgd_types::{ConfigError, FdgdError, FdgdResult, Trajectory};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// One row per epoch, columns in the order outputs, parameters, metaparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuesTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl ValuesTable {
    /// Builds the table. Metaparameters are repeated on every row. Without
    /// `columns`, labels default to `output_{i}`, `parameter_{i}` and
    /// `metaparameter_{i}`; supplied labels must cover every column.
    pub fn assemble(
        trajectory: &Trajectory,
        metaparameters: Option<&[f64]>,
        columns: Option<Vec<String>>,
    ) -> FdgdResult<Self> {
        if trajectory.outputs.len() != trajectory.parameters.len() {
            return Err(ConfigError::TrajectoryShape {
                outputs: trajectory.outputs.len(),
                parameters: trajectory.parameters.len(),
            }
            .into());
        }

        let metaparameters = metaparameters.unwrap_or(&[]);
        let n_outputs = trajectory.n_outputs();
        let n_parameters = trajectory.n_parameters();
        let width = n_outputs + n_parameters + metaparameters.len();

        let columns = match columns {
            Some(columns) if columns.len() != width => {
                return Err(ConfigError::Columns {
                    expected: width,
                    actual: columns.len(),
                }
                .into())
            }
            Some(columns) => columns,
            None => default_columns(n_outputs, n_parameters, metaparameters.len()),
        };

        let rows = trajectory
            .outputs
            .iter()
            .zip(&trajectory.parameters)
            .map(|(outputs, parameters)| {
                let mut row = Vec::with_capacity(width);
                row.extend_from_slice(outputs);
                row.extend_from_slice(parameters);
                row.extend_from_slice(metaparameters);
                row
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one labeled column.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    /// Rows as JSON objects keyed by column label.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(name, value)| (name.clone(), Value::from(*value)))
                    .collect()
            })
            .collect()
    }

    pub fn to_json(&self) -> FdgdResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_records())?)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> FdgdResult<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns).map_err(csv_error)?;
        for row in &self.rows {
            writer
                .write_record(row.iter().map(|v| v.to_string()))
                .map_err(csv_error)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: impl AsRef<Path>) -> FdgdResult<()> {
        let path = path.as_ref();
        debug!("Writing {} rows to {}", self.rows.len(), path.display());
        self.write_csv(File::create(path)?)
    }
}

fn default_columns(n_outputs: usize, n_parameters: usize, n_metaparameters: usize) -> Vec<String> {
    let outputs = (0..n_outputs).map(|i| format!("output_{i}"));
    let parameters = (0..n_parameters).map(|i| format!("parameter_{i}"));
    let metaparameters = (0..n_metaparameters).map(|i| format!("metaparameter_{i}"));
    outputs.chain(parameters).chain(metaparameters).collect()
}

fn csv_error(e: csv::Error) -> FdgdError {
    FdgdError::Csv(e.to_string())
}
