//! cal-gateway: Calendar Gateway Main Binary
//!
//! Main entry point for the calendar assistant gateway.
//!
//! Usage:
//!   cal-gateway           - Start server mode (HTTP API + agents)
//!   cal-gateway --cli     - Start interactive chat mode
//!   cal-gateway --help    - Show help

mod cli;

use std::sync::Arc;

use cal_calendar::RemoteCalendar;
use cal_core::intent::{CheckpointStore, IntentMachine};
use cal_core::{
    CALENDAR_PARTICIPANT, CalendarAgent, Config, FRONTEND_PARTICIPANT, FrontendAgent,
    OAuthTokenProvider, Transcript, TranslatorClient,
};
use cal_relay::MessageRelay;
use tracing_subscriber::EnvFilter;

/// Run mode
enum RunMode {
    /// Server mode (HTTP API + agents)
    Server,
    /// Interactive chat mode
    Cli,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let mode = parse_args();

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("cal-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting cal-gateway...");
    tracing::info!("Model: {}", config.llm.model);
    tracing::info!("Calendar: {}", config.calendar.base_url);

    // Create the translator and the machine's collaborators
    let translator = TranslatorClient::new(&config)
        .map_err(|e| anyhow::anyhow!("Failed to create translator client: {}", e))?;

    let calendar = RemoteCalendar::new(&config.calendar.base_url, &config.calendar.calendar_id)
        .map_err(|e| anyhow::anyhow!("Failed to create calendar client: {}", e))?;

    let credentials = OAuthTokenProvider::new(&config.calendar.token_uri)
        .map_err(|e| anyhow::anyhow!("Failed to create credential provider: {}", e))?;

    let machine = Arc::new(IntentMachine::new(
        Arc::new(calendar),
        Arc::new(credentials),
        config.calendar.clone(),
    ));

    let checkpoint = Arc::new(
        CheckpointStore::new(
            &config.checkpoint.db_path,
            config.checkpoint.pending_ttl_minutes,
        )
        .map_err(|e| anyhow::anyhow!("Failed to open checkpoint store: {}", e))?,
    );

    match mode {
        RunMode::Cli => {
            tracing::info!("Running in CLI mode");
            cli::run_cli(translator, machine, checkpoint).await
        }
        RunMode::Server => run_server(config, translator, machine, checkpoint).await,
        _ => Ok(()),
    }
}

/// Run server mode (HTTP API + agents)
async fn run_server(
    config: Config,
    translator: TranslatorClient,
    machine: Arc<IntentMachine>,
    checkpoint: Arc<CheckpointStore>,
) -> anyhow::Result<()> {
    let relay = Arc::new(MessageRelay::new());
    let transcript = Arc::new(Transcript::new());

    // Register both participants before anything can send
    let frontend_inbox = relay.register(FRONTEND_PARTICIPANT);
    let calendar_inbox = relay.register(CALENDAR_PARTICIPANT);

    let mut service_handles = Vec::new();

    service_handles.push(tokio::spawn(
        CalendarAgent::new(machine, relay.clone(), calendar_inbox).run(),
    ));
    service_handles.push(tokio::spawn(
        FrontendAgent::new(checkpoint.clone(), transcript.clone(), frontend_inbox).run(),
    ));
    tracing::info!("Relay agents started");

    // Start HTTP API server
    let api_port = config.api.port;
    let state = cal_api::AppState {
        config,
        relay,
        checkpoint,
        transcript,
        translator: Arc::new(translator),
    };

    service_handles.push(tokio::spawn(async move {
        if let Err(e) = cal_api::start_server(api_port, state).await {
            tracing::error!("HTTP API error: {}", e);
        }
    }));
    tracing::info!("HTTP API server started on port {}", api_port);

    tracing::info!("cal-gateway initialized successfully");
    tracing::info!("Press Ctrl+C to exit");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    for handle in service_handles {
        handle.abort();
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Parse command line arguments
fn parse_args() -> RunMode {
    let args: Vec<String> = std::env::args().collect();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--cli" | "-c" => return RunMode::Cli,
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("cal-gateway - Calendar Assistant Gateway");
    println!();
    println!("Usage:");
    println!("  cal-gateway           Start server mode (HTTP API + agents)");
    println!("  cal-gateway --cli     Start interactive chat mode");
    println!("  cal-gateway --help    Show this help message");
    println!("  cal-gateway --version Show version");
    println!();
    println!("Environment Variables:");
    println!("  LLM_API_KEY               API key for the intent translator (required)");
    println!("  LLM_MODEL                 Model name (default: claude-sonnet-4-20250514)");
    println!("  LLM_PROVIDER              Provider: claude or openai (default: claude)");
    println!("  LLM_BASE_URL              Custom API endpoint");
    println!("  CALENDAR_BASE_URL         Calendar REST API base URL");
    println!("  CALENDAR_ID               Calendar to operate on (default: primary)");
    println!("  CALENDAR_TIME_ZONE        Default timezone (default: America/Los_Angeles)");
    println!("  CALENDAR_ACCESS_TOKEN     Access token for CLI mode");
    println!("  CALENDAR_REFRESH_TOKEN    Refresh token for CLI mode");
    println!("  API_PORT                  HTTP API port (default: 3000)");
    println!("  API_KEY                   HTTP API bearer key (optional)");
    println!("  DB_PATH                   Checkpoint database path");
    println!("  PENDING_TTL_MINUTES       Expiry for unconfirmed bookings (optional)");
}
