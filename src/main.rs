mod cli;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use staticsift::config::{self, Config, Settings};
use staticsift::{pipeline, report};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect staticsift.toml / global config
    let cfg = match config::find_config(cli.config.as_deref()) {
        Some(path) => {
            let cfg = config::load_config(&path)
                .with_context(|| format!("Invalid config {}", path.display()))?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => Config::default(),
    };

    let settings = resolve_settings(&cli, cfg).context("Invalid thresholds")?;

    log::info!("staticsift - music/static triage");
    log::info!("Inputs: {} files", cli.inputs.len());

    if !cli.json {
        print!("{}", report::render_thresholds(&settings.thresholds));
    }

    let summary = pipeline::run_batch(&cli.inputs, &settings)?;

    if cli.json {
        println!("{}", report::to_json(&summary).context("Failed to serialize results")?);
    } else {
        for result in &summary.results {
            println!();
            print!("{}", report::render_result(result));
        }
        println!();
        print!("{}", report::render_summary(&summary));
    }

    Ok(())
}

/// CLI flags override the config file; the merged thresholds are validated
/// before any file is touched.
fn resolve_settings(cli: &Cli, mut cfg: Config) -> Result<Settings, staticsift::ConfigError> {
    let t = &mut cfg.thresholds;
    if let Some(v) = cli.flatness_max { t.spectral_flatness_max = v; }
    if let Some(v) = cli.onsets_min { t.onsets_per_second_min = v; }
    if let Some(v) = cli.voiced_min { t.voiced_frames_ratio_min = v; }
    if let Some(v) = cli.chroma_min { t.chroma_std_min = v; }
    if let Some(v) = cli.score_min { t.decision_score_min = v; }
    if let Some(v) = cli.max_duration { cfg.analysis.max_duration_secs = v; }
    if let Some(v) = cli.jobs { cfg.analysis.jobs = v; }

    cfg.validate()?;

    Ok(Settings {
        thresholds: cfg.thresholds,
        max_duration_secs: cfg.analysis.max_duration(),
        jobs: cfg.analysis.jobs,
        show_progress: !cli.no_progress && !cli.json,
    })
}
