//! evalplot - comparison charts for optimizer trial results.
//!
//! Reads the per-trial CSV files written by the REX/JGG and UNDX+MGG
//! experiment runs on the k-tablet benchmark and renders log-scaled
//! convergence charts, one image per report.

mod plot;
mod report;
mod style;
mod trials;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plot::{Figure, OutputFormat};
use report::{ReportSpec, RunOptions};
use std::path::PathBuf;

/// Log-scale comparison charts for optimizer trial results
#[derive(Parser, Debug)]
#[command(name = "evalplot")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Directory that input CSVs and output figures are resolved against
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Image format of the generated charts
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Png, global = true)]
    format: OutputFormat,

    /// Output resolution (dots per inch)
    #[arg(long, default_value = "300", value_parser = clap::value_parser!(u32).range(1..), global = true)]
    dpi: u32,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// REX/JGG with P7, P14 and P28 (K5)
    Report01,
    /// REX/JGG with K2, K5, K10 and K15 (P14)
    Report02,
    /// UNDX+MGG against REX/JGG (P14, K5)
    Report03,
    /// Generate every report (default)
    All,
    /// Show report inputs and outputs
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn run_reports(reports: &[ReportSpec], options: &RunOptions) -> Result<()> {
    for spec in reports {
        println!("Generating {}: {}", spec.name, spec.title);
        let outcome = report::run(spec, options)?;

        println!(
            "Saved {} ({} series, {} inputs skipped)",
            outcome.output.display(),
            outcome.series,
            outcome.skipped.len()
        );
        for skipped in &outcome.skipped {
            println!(
                "  skipped {} ({}): {}",
                skipped.label,
                skipped.path.display(),
                skipped.reason
            );
        }
        if spec.confirm {
            println!("Plot has been generated successfully!");
        }
    }
    Ok(())
}

fn print_list(reports: &[ReportSpec], json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(reports).context("Failed to serialize reports")?;
        println!("{}", out);
        return Ok(());
    }

    for spec in reports {
        println!("{}  {}", spec.name, spec.title);
        for input in &spec.inputs {
            println!("  {:<10} {:<7} {}", input.label, input.color, input.path.display());
        }
        println!("  -> {}", spec.output.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let options = RunOptions {
        root: args.root,
        format: args.format,
        figure: Figure {
            dpi: args.dpi,
            ..Figure::default()
        },
    };

    match args.command.unwrap_or(Command::All) {
        Command::Report01 => run_reports(&[report::report01()], &options),
        Command::Report02 => run_reports(&[report::report02()], &options),
        Command::Report03 => run_reports(&[report::report03()], &options),
        Command::All => run_reports(&report::all(), &options),
        Command::List { json } => print_list(&report::all(), json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_reproduce_fixed_paths() {
        let args = Args::try_parse_from(["evalplot"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.root, PathBuf::from("."));
        assert_eq!(args.format, OutputFormat::Png);
        assert_eq!(args.dpi, 300);
    }

    #[test]
    fn global_options_follow_subcommand() {
        let args =
            Args::try_parse_from(["evalplot", "report02", "--format", "svg", "--root", "runs"])
                .unwrap();
        assert!(matches!(args.command, Some(Command::Report02)));
        assert_eq!(args.format, OutputFormat::Svg);
        assert_eq!(args.root, PathBuf::from("runs"));
    }

    #[test]
    fn zero_dpi_is_rejected() {
        assert!(Args::try_parse_from(["evalplot", "--dpi", "0"]).is_err());
    }
}
