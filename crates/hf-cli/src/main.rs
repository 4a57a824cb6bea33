//! hf-rs CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hf_core::Model;
use hf_translate::pyhf::{
    BuildOptions, PyhfModel, Workspace, build_pyhf_with, load_pyhfjson, loglikelihood,
    loglikelihood_with_priors,
};
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hf-cli")]
#[command(about = "Compile pyhf JSON workspaces into expected-yield and likelihood functions")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    /// Build options (JSON: interpolation codes, flat prior range, measurement)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show channels, bins and parameters with their priors
    Inspect {
        /// Input workspace (pyhf JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate expected yields
    Expected {
        /// Input workspace (pyhf JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Comma-separated parameter values. Defaults to the model's inits.
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        params: Option<Vec<f64>>,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate the log-likelihood against the workspace observations
    Nll {
        /// Input workspace (pyhf JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Comma-separated parameter values. Defaults to the model's inits.
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        params: Option<Vec<f64>>,

        /// Drop the prior constraint terms.
        #[arg(long)]
        no_constraints: bool,

        /// Also report the finite-difference gradient.
        #[arg(long)]
        gradient: bool,

        /// Threads (0 = auto).
        #[arg(long, default_value = "0")]
        threads: usize,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Draw random values from every parameter prior
    Priors {
        /// Input workspace (pyhf JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Draws per parameter
        #[arg(long, default_value = "1")]
        draws: usize,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print version
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_ref();
    match cli.command {
        Commands::Inspect { input, output } => cmd_inspect(&input, config, output.as_ref()),
        Commands::Expected { input, params, output } => {
            cmd_expected(&input, config, params, output.as_ref())
        }
        Commands::Nll { input, params, no_constraints, gradient, threads, output } => {
            cmd_nll(&input, config, params, no_constraints, gradient, threads, output.as_ref())
        }
        Commands::Priors { input, draws, seed, output } => {
            cmd_priors(&input, config, draws, seed, output.as_ref())
        }
        Commands::Version => {
            println!("hf-cli {}", hf_core::VERSION);
            Ok(())
        }
    }
}

fn cmd_inspect(input: &PathBuf, config: Option<&PathBuf>, output: Option<&PathBuf>) -> Result<()> {
    let (_, model) = load_model(input, config)?;

    let output_json = serde_json::json!({
        "channels": model.channels(),
        "n_bins": model.n_bins(),
        "n_parameters": model.n_params(),
        "poi_index": model.poi_index(),
        "parameters": model.parameters(),
        "bounds": model.parameter_bounds(),
    });

    write_json(output, output_json)
}

fn cmd_expected(
    input: &PathBuf,
    config: Option<&PathBuf>,
    params: Option<Vec<f64>>,
    output: Option<&PathBuf>,
) -> Result<()> {
    let (_, model) = load_model(input, config)?;
    let params = params.unwrap_or_else(|| model.inits());
    let expected = model.expected().eval(&params)?;

    let per_channel: Vec<_> = model
        .channels()
        .iter()
        .map(|c| serde_json::json!({ "name": c.name, "expected": &expected[c.bins()] }))
        .collect();

    let output_json = serde_json::json!({
        "parameter_names": model.names(),
        "parameters": params,
        "expected": expected,
        "channels": per_channel,
    });

    write_json(output, output_json)
}

fn cmd_nll(
    input: &PathBuf,
    config: Option<&PathBuf>,
    params: Option<Vec<f64>>,
    no_constraints: bool,
    gradient: bool,
    threads: usize,
    output: Option<&PathBuf>,
) -> Result<()> {
    if threads > 0 {
        // Best-effort; if a global pool already exists, keep going.
        let _ = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global();
    }

    let (workspace, model) = load_model(input, config)?;
    let observed = model.observed(&workspace)?;
    let params = params.unwrap_or_else(|| model.inits());

    let ll = if no_constraints {
        loglikelihood(model.expected().clone(), &observed)?
    } else {
        loglikelihood_with_priors(model.expected().clone(), &observed, &model.priors())?
    };
    let value = ll.eval(&params)?;
    tracing::info!(loglikelihood = value, constrained = !no_constraints, "likelihood evaluated");

    let mut output_json = serde_json::json!({
        "parameter_names": model.names(),
        "parameters": params,
        "constrained": !no_constraints,
        "loglikelihood": value,
        "nll": -value,
    });
    if gradient {
        output_json["gradient"] = serde_json::json!(ll.gradient(&params)?);
    }

    write_json(output, output_json)
}

fn cmd_priors(
    input: &PathBuf,
    config: Option<&PathBuf>,
    draws: usize,
    seed: u64,
    output: Option<&PathBuf>,
) -> Result<()> {
    let (_, model) = load_model(input, config)?;
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    let mut entries = Vec::with_capacity(model.n_params());
    for p in model.parameters() {
        let samples = (0..draws).map(|_| p.prior.rand(&mut rng)).collect::<hf_core::Result<Vec<f64>>>()?;
        entries.push(serde_json::json!({
            "name": p.name,
            "prior": p.prior,
            "minimum": p.prior.minimum(),
            "maximum": p.prior.maximum(),
            "draws": samples,
        }));
    }

    write_json(output, serde_json::json!({ "seed": seed, "parameters": entries }))
}

fn load_model(input: &PathBuf, config: Option<&PathBuf>) -> Result<(Workspace, PyhfModel)> {
    let options = match config {
        Some(path) => BuildOptions::from_json_file(path)
            .with_context(|| format!("reading build options from {}", path.display()))?,
        None => BuildOptions::default(),
    };

    tracing::info!(path = %input.display(), "loading workspace");
    let workspace = load_pyhfjson(input).with_context(|| format!("loading {}", input.display()))?;
    let model = build_pyhf_with(&workspace, &options)?;
    tracing::info!(parameters = model.n_params(), bins = model.n_bins(), "workspace loaded");
    Ok((workspace, model))
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
