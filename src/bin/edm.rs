//! Command-line driver for the EDM numeric core.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use edm_core::frame::Frame;
use edm_core::params::{Method, Params};

#[derive(Parser)]
#[command(name = "edm", about = "Empirical dynamic modeling: embedding, neighbors, and projection")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Parser)]
struct CommonArgs {
    /// Input CSV file, first column conventionally a time index.
    #[arg(long)]
    input: PathBuf,

    /// Library row range, 1-based inclusive, e.g. "1 100".
    #[arg(long)]
    lib: String,

    /// Prediction row range, 1-based inclusive, e.g. "101 200".
    #[arg(long)]
    pred: String,

    /// Embedding dimension.
    #[arg(short = 'E', long, default_value_t = 0)]
    e: usize,

    /// Time-delay step between embedding lags.
    #[arg(long, default_value_t = 1)]
    tau: usize,

    /// Prediction horizon (may be negative).
    #[arg(long, default_value_t = 0)]
    tp: isize,

    /// Number of nearest neighbors; 0 selects the per-method default.
    #[arg(long, default_value_t = 0)]
    knn: usize,

    /// Data columns to embed/use, space- or comma-separated names or indices.
    #[arg(long)]
    columns: String,

    /// Target column for prediction, name or index.
    #[arg(long)]
    target: String,

    /// Treat `--columns` as already delay-embedded coordinates.
    #[arg(long)]
    embedded: bool,

    /// Allow neighbors within `Tp` rows of the end of the library.
    #[arg(long)]
    no_neighbor_limit: bool,

    /// Output CSV path.
    #[arg(long)]
    output: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Build and write the delay-coordinate embedding of `--columns`.
    Embed {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Run Simplex projection and write `Time, Observed, Predicted`.
    Simplex {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Run S-Map projection, writing predictions and, alongside `--output`,
    /// a `<stem>_coefficients.csv` file of per-row linear coefficients.
    Smap {
        #[command(flatten)]
        common: CommonArgs,

        /// Localization exponent; 0 is the (unweighted) global linear map.
        #[arg(long, default_value_t = 0.0)]
        theta: f64,
    },
}

fn build_params(common: &CommonArgs, method: Method) -> Params {
    Params {
        method,
        lib_str: common.lib.clone(),
        pred_str: common.pred.clone(),
        e: common.e,
        tau: common.tau,
        tp: common.tp,
        knn: common.knn,
        columns_str: common.columns.clone(),
        target_str: common.target.clone(),
        embedded: common.embedded,
        no_neighbor_limit: common.no_neighbor_limit,
        verbose: false,
        ..Default::default()
    }
}

fn coefficients_path(output: &PathBuf) -> PathBuf {
    let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let ext = output.extension().and_then(|s| s.to_str()).unwrap_or("csv");
    let mut p = output.clone();
    p.set_file_name(format!("{stem}_coefficients.{ext}"));
    p
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Embed { common } => {
            let frame = Frame::from_csv(&common.input)
                .with_context(|| format!("reading {}", common.input.display()))?;
            let mut params = build_params(&common, Method::Embed);
            params.verbose = cli.verbose;
            params.validate().context("validating parameters")?;
            let out = edm_core::embed::embed(&frame, &params).context("embed")?;
            out.to_csv(&common.output)
                .with_context(|| format!("writing {}", common.output.display()))?;
        }
        Command::Simplex { common } => {
            let frame = Frame::from_csv(&common.input)
                .with_context(|| format!("reading {}", common.input.display()))?;
            let mut params = build_params(&common, Method::Simplex);
            params.verbose = cli.verbose;
            params.validate().context("validating parameters")?;
            let result = edm_core::simplex::simplex(&frame, &params).context("simplex")?;
            result
                .predictions
                .to_csv(&common.output)
                .with_context(|| format!("writing {}", common.output.display()))?;
        }
        Command::Smap { common, theta } => {
            let frame = Frame::from_csv(&common.input)
                .with_context(|| format!("reading {}", common.input.display()))?;
            let mut params = build_params(&common, Method::SMap);
            params.theta = theta;
            params.verbose = cli.verbose;
            params.validate().context("validating parameters")?;
            let result = edm_core::smap::smap(&frame, &params).context("smap")?;
            result
                .predictions
                .to_csv(&common.output)
                .with_context(|| format!("writing {}", common.output.display()))?;
            let coef_path = coefficients_path(&common.output);
            result
                .coefficients
                .to_csv(&coef_path)
                .with_context(|| format!("writing {}", coef_path.display()))?;
        }
    }

    Ok(())
}
