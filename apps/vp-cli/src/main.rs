use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vp_core::deg;
use vp_core::timing::{self, predictor_timing};
use vp_foil::{Foil, FoilError, ViscousTargets};
use vp_polar::{MeshOutcome, MeshRequest, MeshSettings, PolarMeshCache, ViscousPointTask};
use vp_predictor::bridge::{self, install_global};
use vp_predictor::{
    ConfigError, ModelSize, PredictorConfig, PredictorError, ProcessLauncher, RuntimeBridge,
};

#[derive(Error, Debug)]
enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Foil error: {0}")]
    Foil(#[from] FoilError),

    #[error("Predictor error: {0}")]
    Predictor(#[from] PredictorError),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "vp")]
#[command(about = "viscpolar - viscous airfoil queries through a neural predictor", long_about = None)]
struct Cli {
    /// Predictor config YAML (defaults to $VP_PREDICTOR_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print predictor timing summary on exit
    #[arg(long, global = true)]
    timing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query cd and transition at (cl, re) points
    Points {
        /// Selig-format .dat file
        foil: PathBuf,
        /// Target as CL:RE, repeatable
        #[arg(long = "at", value_parser = parse_pair, required = true, allow_hyphen_values = true)]
        at: Vec<(f64, f64)>,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Build a Reynolds polar mesh and interpolate from it
    Mesh {
        /// Selig-format .dat file
        foil: PathBuf,
        #[arg(long, default_value_t = 1e5)]
        re_min: f64,
        #[arg(long, default_value_t = 1e6)]
        re_max: f64,
        /// Lower angle of attack [deg]
        #[arg(long, default_value_t = -4.0, allow_hyphen_values = true)]
        alpha_min: f64,
        /// Upper angle of attack [deg]
        #[arg(long, default_value_t = 12.0, allow_hyphen_values = true)]
        alpha_max: f64,
        /// Lookup as RE:CL, repeatable
        #[arg(long = "query", value_parser = parse_pair)]
        query: Vec<(f64, f64)>,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Print the effective configuration as YAML
    Config,
}

/// Overrides for the configured analysis defaults.
#[derive(Args)]
struct AnalysisArgs {
    /// Predictor model size (xxsmall .. xxxlarge)
    #[arg(long)]
    model_size: Option<ModelSize>,
    #[arg(long)]
    n_crit: Option<f64>,
    /// Forced top transition x/c
    #[arg(long)]
    xtr_top: Option<f64>,
    /// Forced bottom transition x/c
    #[arg(long)]
    xtr_bot: Option<f64>,
}

impl AnalysisArgs {
    fn apply(&self, config: &mut PredictorConfig) {
        let analysis = &mut config.analysis;
        if let Some(m) = self.model_size {
            analysis.model_size = m;
        }
        if let Some(n) = self.n_crit {
            analysis.n_crit = n;
        }
        if let Some(x) = self.xtr_top {
            analysis.xtr_top = x;
        }
        if let Some(x) = self.xtr_bot {
            analysis.xtr_bot = x;
        }
    }
}

fn parse_pair(s: &str) -> Result<(f64, f64), String> {
    let (a, b) = s
        .split_once(':')
        .ok_or_else(|| format!("expected A:B, got '{s}'"))?;
    let a = a.trim().parse::<f64>().map_err(|e| format!("'{a}': {e}"))?;
    let b = b.trim().parse::<f64>().map_err(|e| format!("'{b}': {e}"))?;
    Ok((a, b))
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.timing {
        timing::enable_timing();
    }

    let mut config = load_config(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Points { foil, at, analysis } => {
            analysis.apply(&mut config);
            cmd_points(&config, &foil, &at)
        }
        Commands::Mesh {
            foil,
            re_min,
            re_max,
            alpha_min,
            alpha_max,
            query,
            analysis,
        } => {
            analysis.apply(&mut config);
            cmd_mesh(&config, &foil, (re_min, re_max), (alpha_min, alpha_max), &query)
        }
        Commands::Config => cmd_config(&config),
    };

    predictor_timing::print_summary();
    result
}

fn load_config(path: Option<&Path>) -> CliResult<PredictorConfig> {
    let config = match path {
        Some(p) => PredictorConfig::load(p)?,
        None => PredictorConfig::load_default()?,
    };
    Ok(config)
}

/// Route the process-wide bridge through the loaded runtime settings.
fn shared_bridge(config: &PredictorConfig) -> &'static RuntimeBridge {
    let launcher = ProcessLauncher::new(config.runtime.clone());
    if install_global(RuntimeBridge::new(launcher)).is_err() {
        info!("predictor bridge already installed");
    }
    bridge::global()
}

fn cmd_points(config: &PredictorConfig, foil_path: &Path, at: &[(f64, f64)]) -> CliResult<()> {
    let foil = Foil::load_dat(foil_path)?;
    let analysis = &config.analysis;
    let mut targets = ViscousTargets::new(at.iter().copied()).with_transition(
        analysis.n_crit,
        analysis.xtr_top,
        analysis.xtr_bot,
    );

    let bridge = shared_bridge(config);
    let mut task = ViscousPointTask::new().with_model_size(analysis.model_size);
    task.initialize(&foil, Some(&mut targets))?;
    let written = task.run(bridge)?;

    println!(
        "{} ({} nodes), model {}: {}/{} points",
        foil.name(),
        foil.x_coords().len(),
        analysis.model_size,
        written,
        targets.points.len()
    );
    println!("{:>8} {:>12} {:>10} {:>8} {:>8}", "cl", "re", "cd", "xtr_top", "xtr_bot");
    for p in &targets.points {
        match p.result {
            Some(r) => println!(
                "{:>8.4} {:>12.0} {:>10.6} {:>8.4} {:>8.4}",
                r.achieved_cl, p.query.reynolds, r.cd, r.xtr_top, r.xtr_bot
            ),
            None => println!(
                "{:>8.4} {:>12.0} {:>10}",
                p.query.cl, p.query.reynolds, "-"
            ),
        }
    }
    Ok(())
}

fn cmd_mesh(
    config: &PredictorConfig,
    foil_path: &Path,
    (re_min, re_max): (f64, f64),
    (alpha_min, alpha_max): (f64, f64),
    queries: &[(f64, f64)],
) -> CliResult<()> {
    let foil = Foil::load_dat(foil_path)?;
    let request = MeshRequest::with_defaults(
        re_min,
        re_max,
        deg(alpha_min),
        deg(alpha_max),
        &config.analysis,
    );

    let bridge = shared_bridge(config);
    let mut cache = PolarMeshCache::with_settings(MeshSettings::from(&config.mesh));
    let outcome = cache.generate_polar_mesh(bridge, &foil, &request)?;
    let verb = match outcome {
        MeshOutcome::Hit => "reused",
        MeshOutcome::Rebuilt => "built",
    };
    println!(
        "{} mesh for {}: {} curves, Re {:.0}..{:.0}",
        verb,
        foil.name(),
        cache.len(),
        re_min,
        re_max
    );

    if queries.is_empty() {
        return Ok(());
    }

    println!("{:>12} {:>8} {:>10} {:>8} {:>8}", "re", "cl", "cd", "xtr_top", "xtr_bot");
    for (&(re, cl), point) in queries.iter().zip(cache.plr_points_from_cl(queries)) {
        match point {
            Ok(p) => println!(
                "{:>12.0} {:>8.4} {:>10.6} {:>8.4} {:>8.4}",
                re, cl, p.cd, p.xtr_top, p.xtr_bot
            ),
            Err(e) => println!("{:>12.0} {:>8.4} {}", re, cl, e),
        }
    }
    Ok(())
}

fn cmd_config(config: &PredictorConfig) -> CliResult<()> {
    print!("{}", config.to_yaml()?);
    Ok(())
}
