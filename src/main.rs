//! capflow - Subtitle generation client
//!
//! Drives a remote captioning service through audio extraction, transcription
//! and translation, then downloads the translated subtitle file.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use capflow::cli::{Args, Commands};
use capflow::config::Config;
use capflow::events::{ConsoleObserver, FileSink};
use capflow::language::{Language, LanguageChoice};
use capflow::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("capflow.toml").exists() {
                info!("Found capflow.toml in current directory, loading...");
                Config::from_file("capflow.toml")?
            } else {
                Config::default()
            }
        }
    };
    if let Some(base_url) = args.base_url {
        config.service.base_url = base_url;
        config.validate()?;
    }

    match args.command {
        Commands::Run { input, source, target, output_dir, no_cleanup } => {
            let choice = LanguageChoice::parse(&source, &target)?;
            if no_cleanup {
                config.cleanup.auto_cleanup = false;
            }

            let mut workflow = Workflow::new(config)?;
            workflow.subscribe(Arc::new(ConsoleObserver::new()));
            workflow.select_path(&input).await?;

            let sink = FileSink::new(&output_dir);
            let outcome = async {
                let handle = workflow.run_pipeline(choice).await?;
                info!(run = %handle.run_id, "Translated artifact ready: {}", handle.reference);
                workflow.download_artifact(&sink).await?;
                Ok::<_, capflow::error::CapflowError>(sink.path_for(&handle.suggested_name))
            }
            .await;

            match outcome {
                Ok(saved) => {
                    if workflow.config().cleanup.auto_cleanup {
                        let delay = Duration::from_secs(workflow.config().cleanup.delay_secs);
                        if let Err(e) = workflow.schedule_cleanup(delay).await {
                            warn!("Cleanup task did not complete: {}", e);
                        }
                    }
                    println!("Subtitles saved to {}", saved.display());
                }
                Err(e) => {
                    if let Some(task) = workflow.end_session() {
                        if tokio::time::timeout(Duration::from_secs(1), task).await.is_err() {
                            warn!("Session-end cleanup did not finish in time");
                        }
                    }
                    return Err(e.into());
                }
            }
        }
        Commands::Health => {
            let workflow = Workflow::new(config)?;
            let health = workflow.check_health().await?;
            println!("Service:    {}", workflow.config().service.base_url);
            println!("LLM loaded: {}", health.llm_loaded);
            for (key, value) in &health.extra {
                println!("{:<11} {}", format!("{}:", key), value);
            }
        }
        Commands::Cleanup => {
            let workflow = Workflow::new(config)?;
            if let Err(e) = workflow.trigger_cleanup().await {
                warn!("Cleanup task did not complete: {}", e);
            }
        }
        Commands::Languages => {
            println!("{:<10} {:<6} {:<10}", "Language", "Code", "Locale");
            println!("{}", "-".repeat(28));
            for lang in Language::ALL {
                println!("{:<10} {:<6} {:<10}", lang.label(), lang.code(), lang.locale_name());
            }
        }
        Commands::Config { save } => {
            print!("{}", config.to_toml()?);
            if let Some(path) = save {
                config.save_to_file(&path)?;
                info!("Configuration written to {}", path.display());
            }
        }
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".capflow").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "capflow.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("capflow.log").display());

    Ok(())
}
