//! Fieldvox application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Run the chosen subcommand: the HTTP server, one-shot extraction,
//!    continuous listening over stdin, or a guided interview

mod cli;
mod commands;
mod console;

use std::io::Read;

use clap::Parser;

use fieldvox_api::{start_server, AppState};
use fieldvox_core::config::FieldvoxConfig;
use fieldvox_core::types::FieldRecord;
use fieldvox_dialogue::DialogueOutcome;
use fieldvox_transcribe::MockSpeechToText;

use crate::cli::{CliArgs, Command};

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

fn print_record(record: &FieldRecord) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", record.to_json_pretty()?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config before tracing so the file can set the log level.
    let config_file = args.resolve_config_path();
    let config_exists = config_file.exists();
    let mut config = if config_exists {
        FieldvoxConfig::load(&config_file)?
    } else {
        FieldvoxConfig::default()
    };
    config.server.port = args.resolve_port(config.server.port);

    init_tracing(&args.resolve_log_level(&config.general.log_level));
    tracing::info!(
        path = %config_file.display(),
        found = config_exists,
        "Configuration loaded"
    );

    match args.command() {
        Command::Serve => {
            tracing::info!("Starting Fieldvox v{}", env!("CARGO_PKG_VERSION"));
            tracing::warn!("Using the mock speech-to-text engine");
            let state = AppState::new(config, MockSpeechToText::new())?;
            start_server(state).await?;
        }

        Command::Extract { transcript } => {
            let transcript = match transcript {
                Some(t) => t,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let record = commands::run_extract(&config, &transcript)?;
            print_record(&record)?;
        }

        Command::Listen => {
            eprintln!(
                "Listening. Type what you say, one line per phrase. Say \"{}\" or press Ctrl-D to finish.",
                config.listening.stop_phrase
            );
            let record = commands::run_listen(&config, std::io::stdin().lock())?;
            print_record(&record)?;
        }

        Command::Interview { endpoint, clips } => {
            let outcome =
                commands::run_interview(&config, endpoint.as_deref(), clips.as_deref()).await?;
            match outcome {
                DialogueOutcome::Completed { answers, .. } => print_record(&answers)?,
                DialogueOutcome::Failed { answers, error, .. } => {
                    if !answers.is_empty() {
                        print_record(&answers)?;
                    }
                    return Err(error.into());
                }
                DialogueOutcome::AlreadyActive => {
                    tracing::warn!("Another interview is already running");
                }
            }
        }
    }

    Ok(())
}
