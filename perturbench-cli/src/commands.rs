//! Subcommand handlers.

use anyhow::Context;
use perturbench_core::config::{ConfigOverrides, PerturbationConfig, load_config, workspace_config_path};
use perturbench_core::{PerturbationMode, SequentialPerturbation, SortOrder};
use std::path::Path;

use crate::input::BenchmarkInput;
use crate::linear::LinearModel;
use crate::report::format_table;
use crate::{Commands, ConfigAction, OutputFormat};

pub fn handle_command(command: Commands, workspace: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Score {
            input,
            sort_order,
            perturbation,
            format,
            silent,
        } => {
            let overrides = build_overrides(sort_order.as_deref(), perturbation.as_deref(), silent)?;
            let config = load_config(Some(workspace), Some(&overrides))
                .context("Failed to load config")?;
            let input = BenchmarkInput::from_path(&input)?;
            let bench = run_benchmark(&input, config)?;
            match format {
                OutputFormat::Table => print!("{}", format_table(bench.runs())),
                OutputFormat::Json => println!("{}", bench.registry().summaries_json()?),
            }
            Ok(())
        }
        Commands::Config { action } => handle_config(action, workspace),
    }
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace_config_path(workspace);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            if let Some(dir) = config_path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let toml_str = toml::to_string_pretty(&PerturbationConfig::default())?;
            std::fs::write(&config_path, toml_str)?;
            println!("Created configuration file at: {}", config_path.display());
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(Some(workspace), None).context("Failed to load config")?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Turn CLI flags into config overrides; unknown names are rejected here.
fn build_overrides(
    sort_order: Option<&str>,
    perturbation: Option<&str>,
    silent: bool,
) -> anyhow::Result<ConfigOverrides> {
    Ok(ConfigOverrides {
        sort_order: sort_order.map(str::parse::<SortOrder>).transpose()?,
        perturbation: perturbation
            .map(str::parse::<PerturbationMode>)
            .transpose()?,
        silent: silent.then_some(true),
        ..Default::default()
    })
}

/// Score every run of `input` in document order.
pub fn run_benchmark(
    input: &BenchmarkInput,
    config: PerturbationConfig,
) -> anyhow::Result<SequentialPerturbation> {
    let features = input.features()?;
    let labels = input.labels();
    let mut bench = SequentialPerturbation::from_config(
        LinearModel::new(&input.model),
        input.masker()?,
        input.score,
        config,
    );

    tracing::info!(
        runs = input.runs.len(),
        samples = features.nrows(),
        features = features.ncols(),
        "starting benchmark"
    );
    for (i, run) in input.runs.iter().enumerate() {
        bench
            .score(
                run.attributions.clone(),
                &features,
                labels.as_ref(),
                run.label.as_deref(),
            )
            .with_context(|| format!("run {i} failed"))?;
    }
    Ok(bench)
}

#[cfg(test)]
mod tests {
    use super::*;
    use perturbench_core::BenchError;
    use tempfile::TempDir;

    const DOC: &str = r#"{
        "features": [[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]],
        "model": { "weights": [3.0, 2.0, 1.0] },
        "runs": [
            { "label": "informed", "attributions": [[3.0, 2.0, 1.0], [6.0, 4.0, 2.0]] },
            { "attributions": [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0]] }
        ]
    }"#;

    #[test]
    fn test_run_benchmark_records_runs_in_order() {
        let input = BenchmarkInput::from_json(DOC).unwrap();
        let mut config = PerturbationConfig::default();
        config.silent = true;
        let bench = run_benchmark(&input, config).unwrap();

        let runs = bench.runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].label, "informed");
        assert_eq!(runs[1].label, "Score 1");
        assert_eq!(runs[0].curves[0], vec![0.0, 3.0, 5.0, 6.0]);
        assert_eq!(runs[1].curves[0], vec![0.0, 1.0, 3.0, 6.0]);
        assert!(runs[0].mean_auc() > runs[1].mean_auc());
    }

    #[test]
    fn test_build_overrides_rejects_unknown_order() {
        let err = build_overrides(Some("upward"), None, false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BenchError>(),
            Some(BenchError::InvalidConfiguration(_))
        ));
        let ok = build_overrides(Some("negative"), Some("remove"), true).unwrap();
        assert_eq!(ok.sort_order, Some(SortOrder::Negative));
        assert_eq!(ok.perturbation, Some(PerturbationMode::Remove));
        assert_eq!(ok.silent, Some(true));
        assert!(ok.progress_threshold_secs.is_none());
    }

    #[test]
    fn test_config_init_then_show() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path();

        handle_command(
            Commands::Config {
                action: ConfigAction::Init,
            },
            workspace,
        )
        .unwrap();
        let written = std::fs::read_to_string(workspace_config_path(workspace)).unwrap();
        assert!(written.contains("sort_order = \"absolute\""));

        assert!(
            handle_command(
                Commands::Config {
                    action: ConfigAction::Show,
                },
                workspace,
            )
            .is_ok()
        );
    }

    #[test]
    fn test_score_command_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bench.json");
        std::fs::write(&path, DOC).unwrap();

        let command = Commands::Score {
            input: path,
            sort_order: Some("absolute".into()),
            perturbation: Some("keep".into()),
            format: OutputFormat::Json,
            silent: true,
        };
        assert!(handle_command(command, dir.path()).is_ok());
    }
}
