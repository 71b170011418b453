//! Claix - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use claix::{
    cli::{Args, Config, EXAMPLE_USAGE},
    generator::AssistantClient,
    interaction::{TerminalPresenter, TerminalPrompt},
    session::{get_or_create_session, FileSessionStore},
    shell::HostShell,
    ClaixError, Resolver,
};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

/// Exit code for usage errors
const EXIT_USAGE: i32 = 2;

/// Exit code for setup failures
const EXIT_FAILURE: i32 = 1;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args);

    if let Err(message) = args.validate() {
        eprintln!("{}", message.red());
        eprintln!("\nExamples:");
        for example in EXAMPLE_USAGE {
            eprintln!("  {}", example);
        }
        std::process::exit(EXIT_USAGE);
    }

    let Some(api_key) = args.api_key().map(str::to_string) else {
        eprintln!("{}", ClaixError::MissingCredential.to_string().red());
        std::process::exit(EXIT_FAILURE);
    };

    match run(&args, &api_key).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(error = ?e, "claix failed");
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}

/// Initialize `tracing` on stderr; `RUST_LOG` wins over `--verbose`
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.verbosity().log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve the instructions, returning the process exit code
async fn run(args: &Args, api_key: &str) -> Result<i32> {
    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(model) = &args.model {
        config.openai.model = model.clone();
    }
    config.validate()?;

    if !config.display.color {
        colored::control::set_override(false);
    }

    let instructions = args.instructions().unwrap_or_default();
    let session_name = args
        .session
        .clone()
        .unwrap_or_else(|| config.session.name.clone());

    let client = AssistantClient::with_settings(config.client_settings(api_key))?;
    tracing::info!(
        base_url = %client.base_url(),
        model = %client.model(),
        session = %session_name,
        state_dir = %config.state_dir().display(),
        "starting"
    );
    let store = FileSessionStore::new(config.state_dir());
    let session = get_or_create_session(&store, &client, &session_name)
        .await
        .context("Failed to set up the assistant session")?;

    let shell = match &config.shell.program {
        Some(program) => {
            let flag = if program.eq_ignore_ascii_case("cmd") { "/C" } else { "-c" };
            HostShell::with_interpreter(program.clone(), flag)
        }
        None => HostShell::new(),
    };

    let presenter = if config.display.spinner {
        TerminalPresenter::new()
    } else {
        TerminalPresenter::new().without_spinner()
    };

    let prompt = TerminalPrompt::new()?;
    let mut resolver = Resolver::new(client.generator(session), shell, prompt, presenter);

    let report = resolver.resolve(&instructions).await?;
    tracing::info!(
        generations = report.generations,
        repairs = report.repairs,
        executions = report.executions,
        "finished"
    );

    Ok(report.outcome.exit_code())
}
