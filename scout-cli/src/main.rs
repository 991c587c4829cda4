//! Scout CLI - command-line interface for the search pipeline

mod display;

use clap::{Parser, Subcommand};
use display::ProgressDisplay;
use scout_core::{init_logging, ErrorContext, LoggingConfig, ScoutConfig, ScoutError};
use scout_pipeline::{PipelineController, PipelineResult};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Answer questions from planned web searches")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer from the search API's own summaries
    Search {
        /// What to search for
        prompt: String,

        /// Print the answer as it is generated
        #[arg(long)]
        stream: bool,
    },

    /// Split the prompt into tasks, read the result pages and answer from the best passages
    Deepsearch {
        /// What to search for
        prompt: String,

        /// Print the answer as it is generated
        #[arg(long)]
        stream: bool,
    },

    /// Check the search and LLM API keys
    CheckKeys,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// Validate the effective configuration
    Validate,
}

#[derive(Clone, Copy)]
enum Mode {
    Search,
    Deepsearch,
}

#[tokio::main]
async fn main() -> PipelineResult<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(ScoutConfig::default_path);
    let mut config = ScoutConfig::load_or_default(&config_path)?;
    config.apply_env_overrides();

    let logging_config = if cli.verbose || config.pipeline.options.debug_enabled {
        LoggingConfig::verbose()
    } else {
        config.logging.clone()
    };
    init_logging(&logging_config).map_err(|e| ScoutError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check the [logging] section of the configuration"),
    })?;

    info!("Starting Scout CLI v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Search { prompt, stream } => {
            handle_search(Mode::Search, &prompt, stream, &config).await?;
        }
        Commands::Deepsearch { prompt, stream } => {
            handle_search(Mode::Deepsearch, &prompt, stream, &config).await?;
        }
        Commands::CheckKeys => {
            handle_check_keys(&config).await?;
        }
        Commands::Config { action } => {
            handle_config(action, &config, &config_path)?;
        }
    }

    Ok(())
}

async fn handle_search(
    mode: Mode,
    prompt: &str,
    stream: bool,
    config: &ScoutConfig,
) -> PipelineResult<()> {
    config.validate()?;
    let controller = PipelineController::from_config(config).await?;

    let display = ProgressDisplay::new();
    let listener = display.clone();
    controller
        .progress()
        .add_listener(move |event| listener.update(event));

    let on_token = stream.then(|| display.token_printer());
    let answer = match mode {
        Mode::Search => controller.search(prompt, on_token).await?,
        Mode::Deepsearch => controller.deepsearch(prompt, on_token).await?,
    };

    if !stream {
        println!("{}", answer);
    }
    Ok(())
}

async fn handle_check_keys(config: &ScoutConfig) -> PipelineResult<()> {
    let controller = PipelineController::from_config(config).await?;
    controller.validate_keys().await?;
    println!("✅ Search and LLM API keys are valid");
    Ok(())
}

fn handle_config(action: ConfigAction, config: &ScoutConfig, path: &Path) -> PipelineResult<()> {
    match action {
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                println!(
                    "Configuration already exists at {:?}; pass --force to overwrite",
                    path
                );
                return Ok(());
            }
            ScoutConfig::default().save_to_file(path)?;
            println!("✅ Configuration initialized at: {:?}", path);
        }
        ConfigAction::Show => {
            let mut shown = config.clone();
            for key in [
                &mut shown.search.api_key,
                &mut shown.llm.api_key,
                &mut shown.embedding.api_key,
            ] {
                if key.is_some() {
                    *key = Some("********".to_string());
                }
            }
            let content = toml::to_string_pretty(&shown).map_err(|e| ScoutError::Config {
                message: format!("Failed to serialize config: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("cli").with_operation("config_show"),
            })?;
            println!("# {}\n{}", path.display(), content);
        }
        ConfigAction::Validate => {
            config.validate()?;
            println!("✅ Configuration is valid");
        }
    }
    Ok(())
}
