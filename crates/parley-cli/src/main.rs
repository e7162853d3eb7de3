//! parley: interactive chat shell over a DeepSeek-compatible completion API.
//!
//! Wires configuration, logging and the `parley-ai` core together and runs
//! a stdin loop against one conversation.

mod cli;
mod repl;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parley_ai::{
    ChatModel, CompletionClient, DeepSeekClient, DeepSeekConfig, RateLimiter, RetryPolicy,
    SessionStore,
};
use parley_common::ConfigError;
use parley_config::schema::ParleyConfig;
use tracing_subscriber::EnvFilter;

/// Crates whose logs the configured level applies to.
const LOG_TARGETS: [&str; 4] = ["parley", "parley_ai", "parley_config", "parley_common"];

fn log_filter(level: &str) -> EnvFilter {
    let directives = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

fn load(path: Option<&str>) -> Result<ParleyConfig, ConfigError> {
    match path {
        Some(path) => parley_config::load_from_path(Path::new(path)),
        None => parley_config::load_default(),
    }
}

fn build_client(config: &ParleyConfig) -> Result<CompletionClient, String> {
    let api_key = config.api.resolved_api_key().ok_or_else(|| {
        format!(
            "no API key: set api.api_key in the config or {}",
            parley_config::schema::API_KEY_ENV
        )
    })?;

    let transport = DeepSeekClient::new(
        DeepSeekConfig::new(api_key)
            .with_base_url(config.api.base_url.clone())
            .with_connect_timeout(Duration::from_secs(config.api.connect_timeout_secs.into()))
            .with_request_timeout(Duration::from_secs(config.api.request_timeout_secs.into())),
    )
    .map_err(|e| e.to_string())?;

    let model = ChatModel::from(config.api.model.as_str());
    let mut sessions = SessionStore::new(model)
        .with_max_history_tokens(config.session.max_history_tokens as usize);
    if !config.session.system_prompt.is_empty() {
        sessions = sessions.with_system_prompt(config.session.system_prompt.clone());
    }

    let limiter = RateLimiter::per_minute(config.rate_limit.requests_per_minute)
        .with_acquire_timeout(config.rate_limit.acquire_timeout_secs.map(Duration::from_secs));

    let retry = RetryPolicy {
        max_retries: config.retry.max_retries,
        rate_limit_backoff: Duration::from_secs(config.retry.rate_limit_backoff_secs.into()),
        timeout_backoff: Duration::from_secs(config.retry.timeout_backoff_secs.into()),
    };

    Ok(
        CompletionClient::new(Arc::new(transport), Arc::new(sessions), Arc::new(limiter))
            .with_retry_policy(retry),
    )
}

#[tokio::main]
async fn main() {
    let args = cli::parse();

    // Logging depends on the config, so load errors are reported after init.
    let loaded = load(args.config.as_deref());
    let level = args.log_level.clone().unwrap_or_else(|| {
        loaded
            .as_ref()
            .map(|c| c.logging.level)
            .unwrap_or_default()
            .as_directive()
            .to_string()
    });
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(&level))
        .init();

    tracing::info!("parley v{} starting", env!("CARGO_PKG_VERSION"));

    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        ParleyConfig::default()
    });

    if args.print_config {
        println!("{}", parley_config::config_to_json(&config));
        return;
    }

    let client = match build_client(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("parley: {e}");
            std::process::exit(1);
        }
    };

    let session_id = args.session.unwrap_or_else(parley_common::new_id);
    tracing::info!(session_id = %session_id, model = %config.api.model, "session ready");

    if let Err(e) = repl::run(&client, &session_id).await {
        tracing::error!(error = %e, "stdin loop failed");
        std::process::exit(1);
    }

    let usage = client.usage();
    tracing::info!(
        calls = usage.calls,
        total_tokens = usage.total_tokens,
        "parley exiting"
    );
}
