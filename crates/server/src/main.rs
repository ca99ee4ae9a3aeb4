use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

mod api;
mod config;
mod discovery;
mod sse;

#[cfg(test)]
mod test_support;

use config::{AppState, Credentials, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "composio-gateway")]
#[command(about = "MCP gateway for Composio tools and Render deployments", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "GATEWAY_CONFIG", default_value = "gateway.toml")]
    config: PathBuf,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Log verbosity, used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Composio API key
    #[arg(long, env = "COMPOSIO_API_KEY", hide_env_values = true)]
    composio_api_key: Option<String>,

    /// Render API key
    #[arg(long, env = "RENDER_API_KEY", hide_env_values = true)]
    render_api_key: Option<String>,

    /// Render service all deployment tools target
    #[arg(long, env = "RENDER_SERVICE_ID")]
    render_service_id: Option<String>,

    /// Refuse tool invocations on the REST surface
    #[arg(
        long,
        env = "KILL_SWITCH",
        default_value = "false",
        action = clap::ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    kill_switch: bool,
}

fn init_tracing(log_level: &str) {
    let level = log_level.to_lowercase();
    let fallback = format!(
        "composio_gateway={level},composio_gateway_mcp={level},composio_gateway_clients={level},tower_http={level}"
    );

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    tracing::info!("Starting Composio Agent Gateway");

    if args.kill_switch {
        tracing::warn!("Kill switch is active - tool invocations will be refused");
    }

    let credentials = Credentials::new(
        args.composio_api_key,
        args.render_api_key,
        args.render_service_id,
        args.kill_switch,
    );
    if credentials.composio_api_key.is_none() {
        tracing::warn!("COMPOSIO_API_KEY not set - /invoke endpoint will fail");
    }

    // Load configuration
    let config = ServerConfig::load(&args.config)?.with_credentials(credentials);
    let state = AppState::new(config, CancellationToken::new())?;

    // Start API server
    let addr = format!("{}:{}", args.host, args.port);
    tracing::info!("Starting API server on {}", addr);

    api::serve(&addr, state).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_listen_address() {
        let args = Args::try_parse_from([
            "composio-gateway",
            "--port",
            "9000",
            "--host",
            "127.0.0.1",
            "--config",
            "custom.toml",
        ])
        .unwrap();

        assert_eq!(args.port, 9000);
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.config, PathBuf::from("custom.toml"));
    }

    #[test]
    fn test_kill_switch_accepts_boolish_values() {
        let args = Args::try_parse_from(["composio-gateway", "--kill-switch", "TRUE"]).unwrap();
        assert!(args.kill_switch);

        let args = Args::try_parse_from(["composio-gateway", "--kill-switch", "no"]).unwrap();
        assert!(!args.kill_switch);
    }
}
