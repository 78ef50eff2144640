//! Load a tree inventory CSV and print what the engine makes of it: which
//! headers were used, warnings, plots, years per plot and color maps.

use std::{fs, io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use sylva_core::{
    colors::{assign_colors, ColorMap},
    schema::{load_path, SchemaReport},
    stats::summary::{dbh_bin_edges, dominant_species, DbhSummary, DominantSpecies},
    Category, EngineConfig,
};
use tracing_subscriber::EnvFilter;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "inspect", about = "Normalize a tree inventory CSV and summarize it as JSON")]
struct Args {
    /// Inventory CSV file.
    input: PathBuf,

    /// Engine config JSON; defaults apply to absent keys.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Plot side length in metres (overrides the config).
    #[arg(long)]
    plot_size: Option<f64>,

    /// Restrict the DBH summary to one year.
    #[arg(short, long)]
    year: Option<i32>,

    /// Write the JSON here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG takes precedence).
    #[arg(short, long)]
    verbose: bool,
}

// ── Output ────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PlotEntry {
    id: String,
    label: String,
    years: Vec<i32>,
}

#[derive(Serialize)]
struct Inspection {
    schema: SchemaReport,
    records: usize,
    plots: Vec<PlotEntry>,
    years: Vec<i32>,
    dbh: DbhSummary,
    dominant_species: Option<DominantSpecies>,
    dbh_bin_edges: Option<Vec<f64>>,
    species_colors: ColorMap,
    status_colors: ColorMap,
    crown_colors: ColorMap,
}

fn load_config(path: Option<&PathBuf>, plot_size: Option<f64>) -> Result<EngineConfig> {
    let mut cfg = match path {
        Some(p) => EngineConfig::from_json_file(p).with_context(|| format!("loading config {}", p.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(size) = plot_size {
        cfg.plot_size_m = size;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();

    let cfg = load_config(args.config.as_ref(), args.plot_size)?;
    let normalized = load_path(&args.input, &cfg)
        .with_context(|| format!("reading inventory {}", args.input.display()))?;
    let ds = normalized.dataset;
    tracing::info!(rows = ds.len(), plots = ds.plots().len(), "loaded {}", args.input.display());

    let plots = ds
        .plots()
        .into_iter()
        .map(|(id, label)| PlotEntry { years: ds.years(Some(&id)), id, label })
        .collect();

    let slice = match args.year {
        Some(y) => ds.for_year(y),
        None => ds.clone(),
    };
    if slice.is_empty() {
        tracing::warn!(year = ?args.year, "no records in the selected year");
    }

    let colors = |c: Category| assign_colors(ds.categories(c).iter().map(|s| Some(s.as_str())), &cfg.colors);
    tracing::debug!(warnings = normalized.report.warnings.len(), "schema warnings");

    let inspection = Inspection {
        records: ds.len(),
        plots,
        years: ds.years(None),
        dbh: DbhSummary::of(slice.records()),
        dominant_species: dominant_species(slice.records()),
        dbh_bin_edges: dbh_bin_edges(&slice, cfg.histogram_bins()),
        species_colors: colors(Category::Species),
        status_colors: colors(Category::Status),
        crown_colors: colors(Category::CrownClass),
        schema: normalized.report,
    };

    let json = serde_json::to_string_pretty(&inspection)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
