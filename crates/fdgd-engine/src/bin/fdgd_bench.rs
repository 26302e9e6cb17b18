use std::io;

use anyhow::{bail, Context};
use fdgd_engine::{DescentConfig, DescentEngine, DescentProblem, FnObjective};
use fdgd_report::{RunRecord, ValuesTable};
use fdgd_schedule::Schedule;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Built-in objectives. Each returns the value to minimize and the
/// coordinate sum as a second, recorded-only channel.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum BenchObjective {
    Sphere,
    ShiftedSphere,
    Rosenbrock,
}

impl BenchObjective {
    fn evaluate(self, p: &[f64]) -> [f64; 2] {
        let value: f64 = match self {
            Self::Sphere => p.iter().map(|x| x * x).sum(),
            Self::ShiftedSphere => p
                .iter()
                .enumerate()
                .map(|(i, x)| (x + (i + 1) as f64).powi(2))
                .sum(),
            Self::Rosenbrock => p
                .windows(2)
                .map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (1.0 - w[0]).powi(2))
                .sum(),
        };
        [value, p.iter().sum()]
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum OutputFormat {
    Json,
    Csv,
}

/// `initial * decay^(k / epochs)` over the run.
#[derive(Debug, Clone, Copy, Deserialize)]
struct DecaySpec {
    initial: f64,
    decay: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct BenchConfig {
    objective: BenchObjective,
    initial: Vec<f64>,
    epochs: usize,
    step: DecaySpec,
    rate: DecaySpec,
    descent: DescentConfig,
    format: OutputFormat,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            objective: BenchObjective::ShiftedSphere,
            initial: vec![5.0, 5.0, 5.0],
            epochs: 1000,
            step: DecaySpec {
                initial: 0.01,
                decay: 0.0005,
            },
            rate: DecaySpec {
                initial: 0.01,
                decay: 0.5,
            },
            descent: DescentConfig::default(),
            format: OutputFormat::Json,
        }
    }
}

fn load_config() -> anyhow::Result<BenchConfig> {
    let path = std::env::var("FDGD_BENCH_CONFIG")
        .ok()
        .or_else(|| std::env::args().nth(1));

    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading bench config {path}"))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing bench config {path}"))
        }
        None => Ok(BenchConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let config = load_config()?;
    if config.epochs == 0 {
        bail!("bench config needs at least one epoch");
    }
    info!("Running {:?} for {} epochs", config.objective, config.epochs);

    let schedule = Schedule::new(config.epochs);
    let steps = schedule.exponential_decay(config.step.initial, config.step.decay);
    let rates = schedule.exponential_decay(config.rate.initial, config.rate.decay);

    let objective = config.objective;
    let engine = DescentEngine::new(
        FnObjective(move |p: &[f64]| objective.evaluate(p)),
        config.descent.clone(),
    )?;

    let mut record = RunRecord::new(format!("{:?}", config.objective), config.descent.clone());
    record.mark_running();
    let outcome = match engine.run(DescentProblem::new(
        &config.initial,
        &steps,
        &rates,
        config.epochs,
    )) {
        Ok(outcome) => outcome,
        Err(e) => {
            record.mark_failed(e.to_string());
            return Err(e).context("descent run failed");
        }
    };
    record.mark_completed(&outcome.trajectory);
    info!(
        "Best objective {:?} at epoch {:?}",
        record.best_objective, record.best_epoch
    );

    let table = ValuesTable::assemble(&outcome.trajectory, None, None)?;
    match config.format {
        OutputFormat::Json => println!("{}", table.to_json()?),
        OutputFormat::Csv => table.write_csv(io::stdout().lock())?,
    }

    Ok(())
}
