//! Code Insight command line entry point
//!
//! Logs go to stderr; command results are printed to stdout as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use code_insight::models::analysis::{AnalyzeRequest, FileInput};
use code_insight::storage::ConfigService;
use code_insight::{AppState, CommandResponse};

/// Exit status when the request itself was rejected
const EXIT_CLIENT_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "code-insight", version, about = "Run code and merge advisory review findings")]
struct Cli {
    /// Config file (defaults to ~/.code-insight/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one or more source files as a single batch
    Analyze {
        /// Files to analyze
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Language for every file; inferred from extensions when omitted
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Print a saved batch
    Show { id: i64 },
    /// List recently saved batches
    List {
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Check that the advisory service is reachable
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    run().await.map(ExitCode::from)
}

async fn run() -> anyhow::Result<u8> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let state = match &cli.config {
        Some(path) => AppState::from_config(ConfigService::from_path(path)?.get_config_clone())?,
        None => AppState::initialize()?,
    };

    match cli.command {
        Command::Analyze { paths, language } => {
            let request = read_request(&paths, language.as_deref())?;
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupted; abandoning outstanding work");
                    on_interrupt.cancel();
                }
            });
            print_response(code_insight::analyze_files(&state, request, &cancel).await)
        }
        Command::Show { id } => print_response(code_insight::get_analysis(&state, id)),
        Command::List { limit } => print_response(code_insight::list_analyses(&state, limit)),
        Command::Check => {
            let response = code_insight::check_advisory_health(&state).await;
            let healthy = response.data.as_ref().is_some_and(|h| h.healthy);
            let code = print_response(response)?;
            if !healthy {
                bail!("advisory service is not healthy");
            }
            Ok(code)
        }
    }
}

fn read_request(paths: &[PathBuf], language: Option<&str>) -> anyhow::Result<AnalyzeRequest> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file = FileInput::new(name, content);
        files.push(match language {
            Some(lang) => file.with_language(lang),
            None => file,
        });
    }
    Ok(AnalyzeRequest { files })
}

/// Print the envelope. Rejected requests exit with `EXIT_CLIENT_ERROR`;
/// other failures surface as errors.
fn print_response<T: Serialize>(response: CommandResponse<T>) -> anyhow::Result<u8> {
    println!("{}", serde_json::to_string_pretty(&response)?);
    match response.error {
        Some(error) if response.client_error => {
            eprintln!("Error: {}", error);
            Ok(EXIT_CLIENT_ERROR)
        }
        Some(error) => bail!(error),
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use code_insight::utils::error::AppError;

    #[test]
    fn test_client_error_exits_with_distinct_code() {
        let response: CommandResponse<u32> = Err(AppError::validation("No files provided")).into();
        let code = print_response(response).unwrap();
        assert_eq!(code, EXIT_CLIENT_ERROR);
    }

    #[test]
    fn test_server_error_is_reported() {
        let response: CommandResponse<u32> = Err(AppError::database("locked")).into();
        let err = print_response(response).unwrap_err();
        assert!(err.to_string().contains("locked"));
    }

    #[test]
    fn test_success_exits_cleanly() {
        let code = print_response(CommandResponse::ok(1u32)).unwrap();
        assert_eq!(code, 0);
    }
}
