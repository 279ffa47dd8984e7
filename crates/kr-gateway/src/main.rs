//! kapso-relay: WhatsApp auto-reply gateway
//!
//! Usage:
//!   kapso-relay            - Start the webhook server
//!   kapso-relay --help     - Show help
//!   kapso-relay --version  - Show version

use kr_core::Config;
use kr_whatsapp::WhatsAppBot;
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    Server,
    Help,
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match parse_args(std::env::args().skip(1)) {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("kapso-relay {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting kapso-relay...");

    // Both clients are built here so a missing credential stops startup
    let bot = WhatsAppBot::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize WhatsApp bot: {}", e))?;

    let handle = tokio::spawn(bot.start());

    tracing::info!("Press Ctrl+C to exit");

    tokio::select! {
        result = handle => {
            result??;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Shutting down...");
        }
    }

    Ok(())
}

/// Parse command line arguments
fn parse_args(args: impl IntoIterator<Item = String>) -> RunMode {
    for arg in args {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("kapso-relay - WhatsApp auto-reply via Kapso and an LLM");
    println!();
    println!("Usage:");
    println!("  kapso-relay            Start the webhook server");
    println!("  kapso-relay --help     Show this help message");
    println!("  kapso-relay --version  Show version");
    println!();
    println!("Configuration is read from ./kapso-relay.toml (if present) and the environment.");
    println!();
    println!("Environment Variables:");
    println!("  KAPSO_API_KEY          Kapso API key (required)");
    println!("  KAPSO_BASE_URL         Kapso API base URL (default: https://api.kapso.ai/meta/whatsapp)");
    println!("  KAPSO_GRAPH_VERSION    Graph API version (default: v24.0)");
    println!("  LLM_API_KEY            LLM API key (required, falls back to ANTHROPIC_API_KEY)");
    println!("  LLM_MODEL              Model name (default: claude-haiku-4-5)");
    println!("  LLM_PROVIDER           Provider: claude or openai (default: claude)");
    println!("  LLM_BASE_URL           Custom LLM endpoint");
    println!("  LLM_MAX_TOKENS         Reply token limit (default: 1024)");
    println!("  SERVER_HOST            Bind host (default: 0.0.0.0)");
    println!("  PORT                   Bind port (default: 3000)");
    println!("  WEBHOOK_PATH           Webhook route (default: /webhooks/kapso)");
    println!("  RUST_LOG               Log filter (default: info)");
}
