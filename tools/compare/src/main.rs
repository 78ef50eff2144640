//! Compare two plots of a tree inventory, optionally against a control
//! inventory. Writes the comparison report as JSON and, on request, the
//! per-tree growth increments of both plots as CSV.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use sylva_core::{
    comparison::{compare_plots, ComparisonReport, PlotSide},
    schema::load_path,
    Dataset, EngineConfig,
};
use tracing_subscriber::EnvFilter;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "compare", about = "Compare growth and composition of two forest plots")]
struct Args {
    /// Main inventory CSV.
    #[arg(short, long)]
    input: PathBuf,

    /// Control inventory CSV; plot B is looked up here when given.
    #[arg(long)]
    control: Option<PathBuf>,

    /// Plot A, as id or display label (e.g. "1 - 1").
    #[arg(short = 'a', long)]
    plot_a: String,

    /// Plot B, as id or display label.
    #[arg(short = 'b', long)]
    plot_b: String,

    /// Engine config JSON.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Plot side length in metres (overrides the config).
    #[arg(long)]
    plot_size: Option<f64>,

    /// Report JSON path; stdout when absent.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write per-tree increments of both plots to this CSV.
    #[arg(long)]
    increments_csv: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG takes precedence).
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct IncrementRow<'a> {
    side: &'a str,
    plot_id: &'a str,
    tree_id: &'a str,
    from_year: i32,
    to_year: i32,
    cm_per_year: f64,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut cfg = match &args.config {
        Some(p) => EngineConfig::from_json_file(p).with_context(|| format!("loading config {}", p.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(size) = args.plot_size {
        cfg.plot_size_m = size;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn load_dataset(path: &Path, cfg: &EngineConfig) -> Result<Dataset> {
    let normalized = load_path(path, cfg).with_context(|| format!("reading inventory {}", path.display()))?;
    tracing::info!(
        rows = normalized.report.rows,
        warnings = normalized.report.warnings.len(),
        "loaded {}",
        path.display()
    );
    Ok(normalized.dataset)
}

fn resolve(ds: &Dataset, label: &str, which: &str) -> Result<String> {
    match ds.resolve_plot(label) {
        Some(id) => Ok(id),
        None => {
            let known: Vec<String> = ds.plots().into_iter().map(|(_, l)| l).collect();
            bail!("plot {which} '{label}' not found (available: {})", known.join(", "))
        }
    }
}

fn write_increments(path: &Path, report: &ComparisonReport) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for (side, summary) in [("a", &report.a), ("b", &report.b)] {
        for inc in &summary.increments {
            wtr.serialize(IncrementRow {
                side,
                plot_id: &summary.plot_id,
                tree_id: &inc.tree_id,
                from_year: inc.from_year,
                to_year: inc.to_year,
                cm_per_year: inc.cm_per_year,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();

    let cfg = load_config(&args)?;

    let (main, control) = rayon::join(
        || load_dataset(&args.input, &cfg),
        || args.control.as_ref().map(|p| load_dataset(p, &cfg)).transpose(),
    );
    let main = main?;
    let control = control?;
    let other = control.as_ref().unwrap_or(&main);

    let id_a = resolve(&main, &args.plot_a, "A")?;
    let id_b = resolve(other, &args.plot_b, "B")?;

    let report = compare_plots(PlotSide::new(&main, &id_a), PlotSide::new(other, &id_b), &cfg)
        .context("comparing plots")?;

    match &report.welch {
        Some(w) => tracing::info!(t = w.t, df = ?w.df, n_a = w.n_a, n_b = w.n_b, "welch test"),
        None => tracing::warn!("too few increments for a two-sample comparison"),
    }

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }

    if let Some(path) = &args.increments_csv {
        write_increments(path, &report)?;
        tracing::info!("wrote {}", path.display());
    }
    Ok(())
}
