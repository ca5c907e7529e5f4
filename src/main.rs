mod cli;

use imfconv::{
    config,
    conversion::{ConversionExecutor, PipelineDescription},
    process::{self, ProcessRunner},
    timeline::Timeline,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "imfconv=trace,imfconv_common=debug".to_string()
        } else {
            "imfconv=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Run {
            pipeline,
            timeline,
            dry_run,
        } => run_conversion(
            &pipeline,
            timeline.as_deref(),
            cli.config.as_deref(),
            dry_run,
        ),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("imfconv {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_conversion(
    pipeline_path: &Path,
    timeline_path: Option<&Path>,
    config_path: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let description = load_pipeline(pipeline_path)?;
    let mut store = config::build_context_store(&config);

    if let Some(path) = timeline_path {
        let timeline = load_timeline(path)?;
        tracing::info!(
            segments = timeline.segments.len(),
            resources = timeline.resource_count(),
            "Loaded timeline"
        );
        timeline.populate(&mut store);
    }

    let runner = ProcessRunner::new(
        config.conversion.working_dir_path(),
        config.conversion.logs_dir_path(),
        dry_run,
    );
    let mut executor = ConversionExecutor::new(&mut store, runner);
    executor.run(&description)?;

    if dry_run {
        println!("Dry run complete.");
    } else {
        println!("Conversion complete.");
    }
    Ok(())
}

fn load_pipeline(path: &Path) -> Result<PipelineDescription> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline description: {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse pipeline description: {:?}", path))
}

fn load_timeline(path: &Path) -> Result<Timeline> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read timeline: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse timeline: {:?}", path))
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if config.tools.is_empty() {
        println!("No tools configured.");
        return Ok(());
    }

    println!("Checking configured tools...\n");

    let mut all_ok = true;
    for (name, command) in &config.tools {
        let Some(program) = process::split_command(command).into_iter().next() else {
            all_ok = false;
            println!("✗ {} (empty command)", name);
            continue;
        };

        let found = if program.contains(std::path::MAIN_SEPARATOR) {
            let path = PathBuf::from(&program);
            path.exists().then_some(path)
        } else {
            which::which(&program).ok()
        };

        match found {
            Some(path) => println!("✓ {} - {}", name, path.display()),
            None => {
                all_ok = false;
                println!("✗ {} ({} not found)", name, program);
            }
        }
    }

    println!();
    if all_ok {
        println!("All configured tools are available!");
    } else {
        println!("Some tools are missing. Install them or fix the [tools] section.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Tools: {}", config.tools.len());
            println!("  Tmp entries: {}", config.tmp.len());
            println!(
                "  Working dir: {}",
                config.conversion.working_dir_path().display()
            );
            println!(
                "  Logs dir: {}",
                config.conversion.logs_dir_path().display()
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!(
                "  Working dir: {}",
                config.conversion.working_dir_path().display()
            );
        }
    }

    Ok(())
}
