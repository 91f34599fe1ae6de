//! Loading of per-trial result tables written by the optimizer runs.
//!
//! Each file has one x-axis column (`NoOfEvals`) and one column per
//! independent trial. Cells are kept as written; nothing is resampled or
//! aggregated.

use csv::{ReaderBuilder, Trim};
use num_format::{Locale, ToFormattedString};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the x-axis column in every result file
pub const EVALS_COLUMN: &str = "NoOfEvals";

/// Cell spellings read as a missing value, as dataframe readers do by default
const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: missing column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("{}: row {row}, column '{column}': '{value}' is not a number", path.display())]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
}

/// One independent optimizer run
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub name: String,
    /// One entry per checkpoint row; `None` for an empty or NA cell
    pub values: Vec<Option<f64>>,
}

/// A result file held in memory
#[derive(Debug, Clone)]
pub struct TrialTable {
    pub evals: Vec<f64>,
    pub trials: Vec<Trial>,
}

impl TrialTable {
    /// Number of checkpoint rows
    pub fn rows(&self) -> usize {
        self.evals.len()
    }

    /// (evaluations, value) pairs of one trial, in file order
    pub fn points(&self, trial: usize) -> impl Iterator<Item = (f64, Option<f64>)> + '_ {
        self.evals
            .iter()
            .copied()
            .zip(self.trials[trial].values.iter().copied())
    }

    /// One-line summary for console output
    pub fn describe(&self) -> String {
        let max_evals = self.evals.iter().copied().fold(0.0_f64, f64::max);
        format!(
            "{} trials, {} checkpoints, up to {} evaluations",
            self.trials.len(),
            self.rows().to_formatted_string(&Locale::en),
            (max_evals.max(0.0) as u64).to_formatted_string(&Locale::en),
        )
    }
}

/// Load a result file, treating `x_column` as the x-axis and every other
/// column as a trial.
pub fn load_trials<P: AsRef<Path>>(path: P, x_column: &str) -> Result<TrialTable, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(file);

    let headers = reader.headers().map_err(csv_err)?.clone();
    let x_idx = headers
        .iter()
        .position(|h| h == x_column)
        .ok_or_else(|| LoadError::MissingColumn {
            path: path.to_path_buf(),
            column: x_column.to_string(),
        })?;

    // Trial columns keep header order, minus the x-axis
    let trial_cols: Vec<usize> = (0..headers.len()).filter(|&i| i != x_idx).collect();
    let mut trials: Vec<Trial> = trial_cols
        .iter()
        .map(|&i| Trial {
            name: headers[i].to_string(),
            values: Vec::new(),
        })
        .collect();
    let mut evals = Vec::new();

    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let row = row_idx + 1;

        let x_cell = &record[x_idx];
        let x = parse_cell(x_cell).ok_or_else(|| LoadError::InvalidValue {
            path: path.to_path_buf(),
            row,
            column: x_column.to_string(),
            value: x_cell.to_string(),
        })?;
        evals.push(x);

        for (trial, &col) in trials.iter_mut().zip(&trial_cols) {
            let cell = &record[col];
            let value = if is_missing(cell) {
                None
            } else {
                Some(parse_cell(cell).ok_or_else(|| LoadError::InvalidValue {
                    path: path.to_path_buf(),
                    row,
                    column: trial.name.clone(),
                    value: cell.to_string(),
                })?)
            };
            trial.values.push(value);
        }
    }

    Ok(TrialTable { evals, trials })
}

fn parse_cell(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok()
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || NA_MARKERS.contains(&cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn splits_evals_from_trial_columns() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "run.csv",
            "NoOfEvals,trial1,trial2,trial3\n100,5.0,6.0,7.0\n200,0.5,0.6,0.7\n",
        );

        let table = load_trials(&path, EVALS_COLUMN).unwrap();
        assert_eq!(table.evals, vec![100.0, 200.0]);
        assert_eq!(table.trials.len(), 3);
        assert_eq!(table.trials[0].name, "trial1");
        assert_eq!(table.trials[2].values, vec![Some(7.0), Some(0.7)]);
    }

    #[test]
    fn evals_column_need_not_come_first() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "run.csv", "a,NoOfEvals,b\n1e3,10,2e-4\n");

        let table = load_trials(&path, EVALS_COLUMN).unwrap();
        assert_eq!(table.evals, vec![10.0]);
        let names: Vec<_> = table.trials.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(table.trials[1].values, vec![Some(2e-4)]);
    }

    #[test]
    fn empty_cells_become_gaps() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "run.csv", "NoOfEvals,t1,t2\n1,3.0,\n2, ,4.0\n");

        let table = load_trials(&path, EVALS_COLUMN).unwrap();
        assert_eq!(table.trials[0].values, vec![Some(3.0), None]);
        assert_eq!(table.trials[1].values, vec![None, Some(4.0)]);
        let pts: Vec<_> = table.points(1).collect();
        assert_eq!(pts, vec![(1.0, None), (2.0, Some(4.0))]);
    }

    #[test]
    fn na_markers_become_gaps() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "run.csv",
            "NoOfEvals,t1,t2,t3\n1,NA,N/A,null\n2,NULL,nan,0.5\n",
        );

        let table = load_trials(&path, EVALS_COLUMN).unwrap();
        assert_eq!(table.trials[0].values, vec![None, None]);
        assert_eq!(table.trials[1].values, vec![None, None]);
        assert_eq!(table.trials[2].values, vec![None, Some(0.5)]);
    }

    #[test]
    fn header_only_file_has_no_points() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "run.csv", "NoOfEvals,t1\n");

        let table = load_trials(&path, EVALS_COLUMN).unwrap();
        assert_eq!(table.rows(), 0);
        assert_eq!(table.trials.len(), 1);
        assert!(table.trials[0].values.is_empty());
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.csv");

        match load_trials(&path, EVALS_COLUMN) {
            Err(LoadError::NotFound(p)) => assert_eq!(p, path),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_evals_column_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "run.csv", "evals,t1\n1,2\n");

        let err = load_trials(&path, EVALS_COLUMN).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { ref column, .. } if column == "NoOfEvals"));
    }

    #[test]
    fn non_numeric_cell_names_row_and_column() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "run.csv", "NoOfEvals,t1\n1,2\n2,oops\n");

        match load_trials(&path, EVALS_COLUMN) {
            Err(LoadError::InvalidValue { row, column, value, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "t1");
                assert_eq!(value, "oops");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "run.csv", "NoOfEvals,t1,t2\n1,2\n");

        assert!(matches!(
            load_trials(&path, EVALS_COLUMN),
            Err(LoadError::Csv { .. })
        ));
    }

    #[test]
    fn describe_uses_thousands_separators() {
        let table = TrialTable {
            evals: vec![1000.0, 250_000.0],
            trials: vec![Trial {
                name: "t1".into(),
                values: vec![Some(1.0), Some(0.1)],
            }],
        };
        assert_eq!(
            table.describe(),
            "1 trials, 2 checkpoints, up to 250,000 evaluations"
        );
    }
}
