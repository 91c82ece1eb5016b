//! Pentamind server and command-line entry point
//!
//! `serve` (the default) starts the Axum HTTP server; `run` executes the
//! pipeline once and prints the report; `config` writes a template file.

use clap::Parser;
use pentamind::cli::{Cli, Command, generate_config_template};
use pentamind::router::{RunMode, Task};
use pentamind::{config::Config, handlers::AppState, telemetry};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Config { output }) => write_template(output.as_deref()),
        Some(Command::Run { task, input, mode }) => run_once(&cli.config, task, input, mode).await,
        Some(Command::Serve) | None => serve(&cli.config).await,
    }
}

fn write_template(output: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let template = generate_config_template();
    match output {
        Some(path) => {
            std::fs::write(path, template)?;
            eprintln!("Configuration template written to {}", path);
        }
        None => print!("{}", template),
    }
    Ok(())
}

async fn run_once(
    config_path: &str,
    task: Task,
    input: String,
    mode: RunMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_file(config_path)?;
    telemetry::init(&config.observability.log_level);

    let state = AppState::new(config)?;
    state.pipeline().check_configuration()?;

    let report = state.pipeline().run(task, input, mode).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Start the HTTP server. Missing credentials are logged and reported by `/health`.
async fn serve(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_file(config_path)?;
    telemetry::init(&config.observability.log_level);

    tracing::info!(
        "Starting Pentamind server on {}:{}",
        config.server.host,
        config.server.port
    );

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([0, 0, 0, 0])),
        config.server.port,
    ));

    let state = AppState::new(config)?;
    if let Err(e) = state.pipeline().check_configuration() {
        tracing::warn!(error = %e, "Pipeline is missing credentials");
    }

    let app = pentamind::app(state);

    tracing::info!("Listening on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
