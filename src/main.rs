//! cssflow CLI: transforma archivos CSS con una cadena de plugins.
//!
//! Sin `--plugin`, la cadena se descubre en disco (`.cssflowrc`,
//! `.cssflowrc.json`, `cssflow.config.json`) partiendo del directorio de cada
//! archivo, o de `--config` si se indica.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use cssflow_rust::config::RunnerConfig;
use cssflow_rust::errors::CoreError;
use cssflow_rust::runner;
use log::{error, info};

#[derive(Parser, Debug)]
#[command(name = "cssflow")]
#[command(about = "Per-file CSS transform with plugin chains and source maps")]
#[command(version)]
struct Cli {
    /// Plugin to apply, in order (repeatable). Skips on-disk configuration.
    #[arg(long = "plugin", value_name = "NAME")]
    plugins: Vec<String>,
    /// Configuration file or directory (absolute, or relative to --base)
    #[arg(long)]
    config: Option<String>,
    /// Root used to compute relative paths
    #[arg(long)]
    base: Option<PathBuf>,
    /// Output directory
    #[arg(long)]
    out: Option<PathBuf>,
    /// Attach and write source maps
    #[arg(long)]
    sourcemaps: bool,
    /// Do not report plugin warnings or option diagnostics
    #[arg(long, short)]
    quiet: bool,
    /// Files processed at the same time
    #[arg(long)]
    concurrency: Option<usize>,
    /// Input CSS files
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl Cli {
    /// Los flags tienen prioridad sobre el entorno.
    fn apply(&self, mut config: RunnerConfig) -> RunnerConfig {
        if !self.plugins.is_empty() {
            config.plugins = self.plugins.clone();
        }
        if let Some(path) = &self.config {
            config.config_path = Some(path.clone());
        }
        if let Some(base) = &self.base {
            config.base_dir = base.clone();
        }
        if let Some(out) = &self.out {
            config.out_dir = out.clone();
        }
        config.sourcemaps |= self.sourcemaps;
        config.quiet |= self.quiet;
        if let Some(n) = self.concurrency.filter(|n| *n > 0) {
            config.concurrency = n;
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.apply(RunnerConfig::from_env());

    match runner::run(&config, &cli.files).await {
        Ok(summary) if summary.failed == 0 => {
            info!("{} file(s) written to {}", summary.written.len(), config.out_dir.display());
            ExitCode::SUCCESS
        }
        Ok(summary) => {
            error!("{}", CoreError::Failed { failed: summary.failed, total: summary.total() });
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
