use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use ai_content_pipeline::engine::RunStatus;
use ai_content_pipeline::prelude::*;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ai-pipeline")]
#[command(about = "Validate, estimate and dry-run AI content pipeline chains", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered models
    ListModels {
        /// Only show models for this step type (e.g. text_to_image)
        #[arg(short, long)]
        category: Option<StepType>,
    },

    /// Validate chain files without running them
    Validate {
        /// Path to a chain file or a directory of chains
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Estimate the cost of a chain
    Estimate {
        /// Path to the chain YAML file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Run a chain against dry-run generators (no provider calls, no cost)
    DryRun {
        /// Path to the chain YAML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Initial input: text, a file path or a URL
        #[arg(short, long)]
        input: Option<String>,

        /// Path to runner.yaml config file (default: runner.yaml next to FILE)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Check the built-in model registry for consistency
    CheckRegistry,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "ai_content_pipeline=debug"
    } else {
        "ai_content_pipeline=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %e, "ai-pipeline failed");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let registry = Arc::new(ModelRegistry::with_builtin_models());

    match cli.command {
        Commands::ListModels { category } => list_models(&registry, category),
        Commands::Validate { path } => validate(registry, path),
        Commands::Estimate { file } => estimate(registry, file),
        Commands::DryRun {
            file,
            input,
            config,
        } => dry_run(registry, file, input, config).await,
        Commands::CheckRegistry => check_registry(&registry),
    }
}

fn list_models(registry: &ModelRegistry, category: Option<StepType>) -> anyhow::Result<bool> {
    let categories: Vec<StepType> = match category {
        Some(category) => vec![category],
        None => StepType::ALL.to_vec(),
    };

    for category in categories {
        let models = registry.list_by_category(category);
        if models.is_empty() {
            continue;
        }

        println!("{}:", category);
        for model in models {
            println!(
                "  {:<28} {:<32} ~${:<8.3} ~{:.0}s",
                model.key, model.name, model.cost_estimate, model.processing_time
            );
        }
        println!();
    }

    Ok(true)
}

fn validate(registry: Arc<ModelRegistry>, path: PathBuf) -> anyhow::Result<bool> {
    if !path.exists() {
        anyhow::bail!("Path not found: {}", path.display());
    }

    let chains = if path.is_dir() {
        ChainLoader::load_directory(&path)?
    } else {
        vec![ChainLoader::load_file(&path)?]
    };

    if chains.is_empty() {
        println!("No chains found in: {}", path.display());
        return Ok(true);
    }

    let runner = ChainRunner::dry_run(registry, None);
    let mut all_valid = true;

    for chain in &chains {
        let problems = runner.validate(chain);
        if problems.is_empty() {
            println!(
                "✓ {} ({} steps)",
                chain.name,
                chain.enabled_step_count()
            );
        } else {
            all_valid = false;
            println!("✗ {}", chain.name);
            for problem in problems {
                println!("    {}", problem);
            }
        }
    }

    Ok(all_valid)
}

fn estimate(registry: Arc<ModelRegistry>, file: PathBuf) -> anyhow::Result<bool> {
    let chain = ChainLoader::load_file(&file)?;
    let runner = ChainRunner::dry_run(registry, None);
    let estimate = runner.estimate_cost(&chain)?;

    println!("\n=== Cost Estimate: {} ===\n", chain.name);
    for entry in &estimate.by_step {
        println!(
            "  Step {:<3} {:<20} {:<28} ${:.4}",
            entry.step,
            entry.step_type.as_str(),
            entry.model,
            entry.cost
        );
    }
    println!("\n  Total: ${:.4}", estimate.total_cost);

    if let Some(limit) = chain.config.max_cost {
        if estimate.total_cost > limit {
            println!("  ✗ Exceeds max_cost ${:.4}", limit);
            return Ok(false);
        }
        println!("  ✓ Within max_cost ${:.4}", limit);
    }

    Ok(true)
}

async fn dry_run(
    registry: Arc<ModelRegistry>,
    file: PathBuf,
    input: Option<String>,
    config: Option<PathBuf>,
) -> anyhow::Result<bool> {
    let mut chain = ChainLoader::load_file(&file)?;

    let config_path = config.or_else(|| default_runner_config(&file));
    let mut env = Default::default();
    if let Some(config_path) = config_path {
        tracing::info!("Loading runner config: {}", config_path.display());
        let runner_config = RunnerConfig::load_file(&config_path)?;
        runner_config.apply_to(&mut chain.config);
        env = runner_config.env;
    }

    let artifact_dir = chain.config.output_dir.join("dry-run");
    let runner = ChainRunner::dry_run(registry, Some(artifact_dir)).with_env(env);

    let initial_input = input.as_deref().map(StepInput::infer);
    let report = runner.run(&chain, initial_input).await;

    println!("{}", serde_json::to_string_pretty(&report.execution_summary)?);

    Ok(report.execution_summary.status == RunStatus::Success)
}

fn default_runner_config(file: &Path) -> Option<PathBuf> {
    let candidate = file.parent()?.join("runner.yaml");
    candidate.is_file().then_some(candidate)
}

fn check_registry(registry: &ModelRegistry) -> anyhow::Result<bool> {
    let issues = registry.validate();

    if issues.is_empty() {
        let categories = registry.get_supported_models().len();
        println!(
            "✓ {} models across {} step types, no issues",
            registry.len(),
            categories
        );
        return Ok(true);
    }

    println!("✗ {} registry issues:", issues.len());
    for issue in issues {
        println!("    {}", issue);
    }
    Ok(false)
}
