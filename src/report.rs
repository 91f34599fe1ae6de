//! Report definitions and series collection.
//!
//! A report names its input files, the color of each, a title, and where
//! the chart goes. Running a report loads every input, turns each trial
//! column into a series and renders one chart.

use crate::plot::{self, Figure, OutputFormat, PlotSeries};
use crate::style::{Marker, NamedColor};
use crate::trials::{self, LoadError, TrialTable, EVALS_COLUMN};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const X_LABEL: &str = "Number of Evaluations";
pub const Y_LABEL: &str = "Value (Log Scale)";

/// What to do when an input cannot be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Skip missing files, fail on anything else
    SkipMissing,
    /// Skip any input that fails to load
    SkipUnreadable,
}

/// One input CSV of a report
#[derive(Debug, Clone, Serialize)]
pub struct InputSpec {
    /// Legend prefix for the input's trials
    pub label: String,
    pub path: PathBuf,
    pub color: NamedColor,
}

impl InputSpec {
    fn new(label: &str, path: impl Into<PathBuf>, color: NamedColor) -> Self {
        Self {
            label: label.to_string(),
            path: path.into(),
            color,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSpec {
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub inputs: Vec<InputSpec>,
    pub output: PathBuf,
    pub on_failure: FailurePolicy,
    /// Print a confirmation line after the chart is saved
    pub confirm: bool,
}

impl ReportSpec {
    fn new(name: &str, title: String, inputs: Vec<InputSpec>, on_failure: FailurePolicy) -> Self {
        Self {
            confirm: true,
            name: name.to_string(),
            title,
            x_label: X_LABEL.to_string(),
            y_label: Y_LABEL.to_string(),
            inputs,
            output: PathBuf::from(format!("figures/{name}.png")),
            on_failure,
        }
    }
}

/// REX/JGG on k-tablet (K5) across population factors P7, P14, P28
pub fn report01() -> ReportSpec {
    let inputs = [
        ("P7", NamedColor::Blue),
        ("P14", NamedColor::Green),
        ("P28", NamedColor::Red),
    ]
    .into_iter()
    .map(|(p, color)| InputSpec::new(p, format!("output/report01/RexJggKTablet{p}K5.csv"), color))
    .collect();

    ReportSpec {
        confirm: false,
        ..ReportSpec::new(
            "report01",
            "Comparison of P7, P14, and P28 across Trials".to_string(),
            inputs,
            FailurePolicy::SkipMissing,
        )
    }
}

/// REX/JGG on k-tablet (P14) across K2, K5, K10, K15
pub fn report02() -> ReportSpec {
    let inputs = [
        ("K2", NamedColor::Blue),
        ("K5", NamedColor::Green),
        ("K10", NamedColor::Red),
        ("K15", NamedColor::Purple),
    ]
    .into_iter()
    .map(|(k, color)| InputSpec::new(k, format!("output/report02/RexJggKTabletP14{k}.csv"), color))
    .collect();

    ReportSpec::new(
        "report02",
        "Comparison of K2, K5, K10, and K15 for P14 across Trials".to_string(),
        inputs,
        FailurePolicy::SkipMissing,
    )
}

/// UNDX+MGG against REX/JGG at P14, K5
pub fn report03() -> ReportSpec {
    const P: &str = "P14";
    const K: &str = "K5";

    let inputs = [
        ("UNDX+MGG", "UndxMgg", NamedColor::Blue),
        ("REX/JGG", "RexJgg", NamedColor::Red),
    ]
    .into_iter()
    .map(|(method, code, color)| {
        InputSpec::new(method, format!("output/report03/{code}KTablet{P}{K}.csv"), color)
    })
    .collect();

    ReportSpec::new(
        "report03",
        format!("Comparison of UNDX+MGG vs REX/JGG ({P}, {K})"),
        inputs,
        FailurePolicy::SkipUnreadable,
    )
}

/// Every report, in run order
pub fn all() -> Vec<ReportSpec> {
    vec![report01(), report02(), report03()]
}

/// `rel` under `root`, leaving it untouched when root is the working directory
pub fn resolve(root: &Path, rel: &Path) -> PathBuf {
    if root.as_os_str().is_empty() || root == Path::new(".") {
        rel.to_path_buf()
    } else {
        root.join(rel)
    }
}

/// An input left out of the chart
#[derive(Debug, Clone)]
pub struct Skipped {
    pub label: String,
    pub path: PathBuf,
    pub reason: String,
}

/// Series gathered for one report
#[derive(Debug, Default)]
pub struct Collected {
    pub series: Vec<PlotSeries>,
    pub skipped: Vec<Skipped>,
}

/// One series per trial column, colored by input and marked by trial index
pub fn trial_series(input: &InputSpec, table: &TrialTable) -> Vec<PlotSeries> {
    (0..table.trials.len())
        .map(|i| PlotSeries {
            label: format!("{} - Trial {}", input.label, i + 1),
            color: input.color,
            marker: Marker::for_trial(i),
            points: table.points(i).collect(),
        })
        .collect()
}

/// Load every input of `spec`. Inputs that cannot be loaded are reported
/// on stdout and skipped as the report's failure policy allows; any other
/// load error is returned.
pub fn collect_series(spec: &ReportSpec, root: &Path) -> Result<Collected> {
    let mut collected = Collected::default();

    for input in &spec.inputs {
        let path = resolve(root, &input.path);
        match trials::load_trials(&path, EVALS_COLUMN) {
            Ok(table) => {
                println!("Loaded {}: {}", input.label, table.describe());
                collected.series.extend(trial_series(input, &table));
            }
            Err(LoadError::NotFound(missing)) => {
                println!("Warning: {} not found", missing.display());
                collected.skipped.push(Skipped {
                    label: input.label.clone(),
                    path: missing,
                    reason: "not found".to_string(),
                });
            }
            Err(e) if spec.on_failure == FailurePolicy::SkipUnreadable => {
                println!("Error processing {}: {}", path.display(), e);
                collected.skipped.push(Skipped {
                    label: input.label.clone(),
                    path,
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to load input '{}' of {}", input.label, spec.name)
                });
            }
        }
    }

    Ok(collected)
}

/// Settings shared by every report in a run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory input and output paths are resolved against
    pub root: PathBuf,
    pub format: OutputFormat,
    pub figure: Figure,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            format: OutputFormat::default(),
            figure: Figure::default(),
        }
    }
}

/// Result of a successful report run
#[derive(Debug)]
pub struct RunOutcome {
    pub output: PathBuf,
    pub series: usize,
    pub skipped: Vec<Skipped>,
}

/// Collect and render one report
pub fn run(spec: &ReportSpec, options: &RunOptions) -> Result<RunOutcome> {
    let collected = collect_series(spec, &options.root)?;
    let output = options.format.apply(&resolve(&options.root, &spec.output));

    plot::render(spec, &collected.series, &output, options.format, &options.figure)
        .with_context(|| format!("Failed to render {}", spec.name))?;

    Ok(RunOutcome {
        output,
        series: collected.series.len(),
        skipped: collected.skipped,
    })
}
