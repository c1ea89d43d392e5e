//! Command-line interface for survey movement analysis.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::DuplicatePolicy;
use crate::core::loaders::load_observations_csv;
use crate::core::observation::Observation;
use crate::core::writers::{write_changes_csv, write_lines_csv, write_points_csv, OutputPaths};
use crate::processors::changes::{compute_changes_with, ChangeTables};
use crate::visualization::plot_movement;
use crate::MovementConfig;

#[derive(Parser)]
#[command(name = "survey-movement")]
#[command(about = "Point to point comparison over repeated surveys", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute movement between surveys and export tables, layers and plot
    Compare {
        /// Survey CSV file (time, id, x, y, z; no header)
        input: PathBuf,
        /// Output directory (defaults to the input file's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Skip the PNG movement plot
        #[arg(long)]
        no_plot: bool,
        /// Fail instead of replacing existing outputs
        #[arg(long)]
        no_overwrite: bool,
        /// Accept repeated (id, time) observations, keeping input order
        #[arg(long)]
        allow_duplicates: bool,
    },

    /// Render only the movement plot (PNG)
    Plot {
        /// Survey CSV file (time, id, x, y, z; no header)
        input: PathBuf,
        /// Output PNG file path (defaults to <input>_Movement.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            let head: String = value.chars().take(36).collect();
            format!("{}...", head)
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match MovementConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                MovementConfig::default()
            }
        },
        None => MovementConfig::default(),
    };

    // Dispatch to subcommands
    match cli.command {
        Commands::Compare {
            input,
            output_dir,
            no_plot,
            no_overwrite,
            allow_duplicates,
        } => {
            let mut config = config;
            if no_plot {
                config.plot.enabled = false;
            }
            if no_overwrite {
                config.output.overwrite = false;
            }
            if allow_duplicates {
                config.grouping.duplicates = DuplicatePolicy::KeepInputOrder;
            }
            cmd_compare(&input, output_dir.as_deref(), &config);
        }
        Commands::Plot { input, output } => {
            cmd_plot(&input, output, &config);
        }
    }
}

/// Load a survey file and compute both movement tables.
///
/// The loaded observations are returned in input order alongside the tables.
fn load_and_compute(
    input: &Path,
    config: &MovementConfig,
) -> Result<(Vec<Observation>, ChangeTables)> {
    let observations = load_observations_csv(input, &config.input)
        .with_context(|| format!("failed to load observations from {}", input.display()))?;
    info!("Loaded {} observations from {}", observations.len(), input.display());

    let tables = compute_changes_with(&observations, config)
        .with_context(|| format!("failed to compute changes for {}", input.display()))?;
    Ok((observations, tables))
}

/// Full comparison run: tables, point layer, line layer and optional plot.
fn compare(
    input: &Path,
    output_dir: Option<&Path>,
    config: &MovementConfig,
    spinner: &ProgressBar,
) -> Result<(ChangeTables, OutputPaths)> {
    let paths = OutputPaths::for_input(input, output_dir, &config.output);
    paths.ensure_writable(config.output.overwrite)?;

    spinner.set_message("Computing movement...");
    let (observations, tables) = load_and_compute(input, config)?;

    spinner.set_message("Writing outputs...");
    write_changes_csv(&paths.interval, &tables.interval)?;
    write_changes_csv(&paths.total, &tables.total)?;
    write_points_csv(&paths.points, &observations)?;
    write_lines_csv(&paths.lines, &tables.groups)?;

    if config.plot.enabled && !tables.is_empty() {
        spinner.set_message("Plotting movement...");
        plot_movement(&paths.plot, &tables.groups, &config.plot)?;
    }

    Ok((tables, paths))
}

fn cmd_compare(input: &Path, output_dir: Option<&Path>, config: &MovementConfig) {
    let start = Instant::now();

    println!("Comparing surveys...");
    println!("Input: {}", input.display());

    let spinner = create_spinner("Loading observations...");

    match compare(input, output_dir, config, &spinner) {
        Ok((tables, paths)) => {
            spinner.finish_and_clear();

            let surveys: BTreeSet<_> = tables
                .groups
                .iter()
                .flat_map(|g| g.observations().iter().map(|o| &o.time))
                .collect();
            let plot = if config.plot.enabled && !tables.is_empty() {
                paths.plot.display().to_string()
            } else {
                "skipped".to_string()
            };

            print_summary(
                "Survey Comparison Complete",
                &[
                    ("Input file", input.display().to_string()),
                    ("Observations", tables.observation_count().to_string()),
                    ("Points", tables.groups.len().to_string()),
                    ("Surveys", surveys.len().to_string()),
                    ("Interval changes", tables.interval.len().to_string()),
                    ("Total changes", tables.total.len().to_string()),
                    ("Single-survey points", tables.singleton_ids().len().to_string()),
                    ("Interval table", paths.interval.display().to_string()),
                    ("Total table", paths.total.display().to_string()),
                    ("Point layer", paths.points.display().to_string()),
                    ("Line layer", paths.lines.display().to_string()),
                    ("Plot", plot),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Comparison failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_plot(input: &Path, output: Option<PathBuf>, config: &MovementConfig) {
    let start = Instant::now();

    let output_path =
        output.unwrap_or_else(|| OutputPaths::for_input(input, None, &config.output).plot);

    println!("Plotting movement...");
    println!("Input: {}", input.display());
    println!("Output: {}", output_path.display());

    let spinner = create_spinner("Loading observations...");

    let result = load_and_compute(input, config).and_then(|(_, tables)| {
        spinner.set_message("Generating plot...");
        plot_movement(&output_path, &tables.groups, &config.plot)?;
        Ok(tables)
    });

    match result {
        Ok(tables) => {
            spinner.finish_and_clear();

            print_summary(
                "Visualization Complete",
                &[
                    ("Input file", input.display().to_string()),
                    ("Output PNG", output_path.display().to_string()),
                    ("Points plotted", tables.groups.len().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Visualization failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_survey(dir: &Path) -> PathBuf {
        let path = dir.join("site.csv");
        fs::write(
            &path,
            "2008,P1,100.0,200.0,10.0\n\
             2012,P1,103.0,204.0,10.5\n\
             2008,P2,0,0,0\n\
             2012,P2,-1,0,0\n\
             2000,P3,0,0,0\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_cli_parses_compare_flags() {
        let cli = Cli::try_parse_from([
            "survey-movement",
            "-v",
            "compare",
            "site.csv",
            "--no-plot",
            "--allow-duplicates",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Compare {
                input,
                no_plot,
                allow_duplicates,
                no_overwrite,
                output_dir,
            } => {
                assert_eq!(input, PathBuf::from("site.csv"));
                assert!(no_plot);
                assert!(allow_duplicates);
                assert!(!no_overwrite);
                assert!(output_dir.is_none());
            }
            Commands::Plot { .. } => panic!("Expected compare command"),
        }
    }

    #[test]
    fn test_compare_writes_all_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_survey(temp_dir.path());
        let out_dir = temp_dir.path().join("out");

        let mut config = MovementConfig::default();
        config.plot.width = 200;
        config.plot.height = 150;

        let spinner = ProgressBar::hidden();
        let (tables, paths) = compare(&input, Some(&out_dir), &config, &spinner).unwrap();

        assert_eq!(tables.interval.len(), 2);
        assert_eq!(tables.total.len(), 3);
        assert!(paths.interval.exists());
        assert!(paths.total.exists());
        assert!(paths.points.exists());
        assert!(paths.lines.exists());
        assert!(paths.plot.exists());

        let total = fs::read_to_string(&paths.total).unwrap();
        let rows: Vec<&str> = total.lines().collect();
        assert_eq!(rows.len(), 4);
        assert!(rows[1].starts_with("0,2008,P1,"));
        assert!(rows[3].starts_with("2,2000,P3,"));
    }

    #[test]
    fn test_point_layer_keeps_input_order() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("site.csv");
        fs::write(&input, "2012,B,1,1,1
2008,A,2,2,2
2008,B,3,3,3
").unwrap();

        let mut config = MovementConfig::default();
        config.plot.enabled = false;
        let spinner = ProgressBar::hidden();
        let (_, paths) = compare(&input, None, &config, &spinner).unwrap();

        let points = fs::read_to_string(&paths.points).unwrap();
        let rows: Vec<&str> = points.lines().skip(1).collect();
        assert_eq!(rows, vec!["1,1,1,2012,B", "2,2,2,2008,A", "3,3,3,2008,B"]);
    }

    #[test]
    fn test_compare_refuses_overwrite_when_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_survey(temp_dir.path());

        let mut config = MovementConfig::default();
        config.plot.enabled = false;
        let spinner = ProgressBar::hidden();
        compare(&input, None, &config, &spinner).unwrap();

        config.output.overwrite = false;
        assert!(compare(&input, None, &config, &spinner).is_err());
    }

    #[test]
    fn test_compare_fails_on_malformed_row() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("bad.csv");
        fs::write(&input, "2008,P1,1,2,3\n2012,P1,x,2,3\n").unwrap();

        let mut config = MovementConfig::default();
        config.plot.enabled = false;
        let spinner = ProgressBar::hidden();
        let err = compare(&input, None, &config, &spinner).unwrap_err();

        assert!(format!("{:#}", err).contains("malformed observation"));
        assert!(!temp_dir.path().join("bad_InterSurveyData.csv").exists());
    }
}
