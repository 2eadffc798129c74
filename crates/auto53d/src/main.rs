// # auto53d - auto53 Daemon
//
// The auto53d daemon is a thin integration layer responsible for:
// 1. Reading configuration from environment variables
// 2. Loading the YAML rule file
// 3. Initializing logging and the runtime
// 4. Building the provider from the registry
// 5. Running the reconciliation engine (once, or periodically)
//
// All reconciliation logic lives in auto53-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Rules
// - `AUTO53_CONFIG`: Path to the YAML rule file (default: ./auto53.yaml)
//
// ### Provider
// - `AUTO53_PROVIDER_TYPE`: Provider type (snapshot; default: snapshot)
// - `AUTO53_SNAPSHOT_PATH`: Path to the snapshot file (for snapshot)
//
// ### Engine
// - `AUTO53_DRY_RUN`: Plan and print the changes without submitting them
// - `AUTO53_ONCE`: Run a single pass and exit
// - `AUTO53_INTERVAL_SECS`: Seconds between passes (default: 120)
// - `AUTO53_CONCURRENT`: Submit zones concurrently
// - `AUTO53_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export AUTO53_CONFIG=/etc/auto53/auto53.yaml
// export AUTO53_PROVIDER_TYPE=snapshot
// export AUTO53_SNAPSHOT_PATH=/var/lib/auto53/snapshot.json
// export AUTO53_DRY_RUN=true
// export AUTO53_ONCE=true
//
// auto53d
// ```

use anyhow::Result;
use auto53_core::config::{self, Auto53Config, EngineConfig, ProviderConfig};
use auto53_core::{Auto53Engine, EngineEvent, PassReport, ProviderRegistry, report};
use std::env;
use std::process::ExitCode;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auto53ExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<Auto53ExitCode> for ExitCode {
    fn from(code: Auto53ExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<&auto53_core::Error> for Auto53ExitCode {
    fn from(err: &auto53_core::Error) -> Self {
        if err.is_fatal_config() {
            Auto53ExitCode::ConfigError
        } else {
            Auto53ExitCode::RuntimeError
        }
    }
}

/// Application configuration
struct Config {
    config_path: String,
    provider_type: String,
    snapshot_path: Option<String>,
    dry_run: bool,
    once: bool,
    interval_secs: u64,
    concurrent: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            config_path: env::var("AUTO53_CONFIG").unwrap_or_else(|_| "./auto53.yaml".to_string()),
            provider_type: env::var("AUTO53_PROVIDER_TYPE")
                .unwrap_or_else(|_| "snapshot".to_string()),
            snapshot_path: env::var("AUTO53_SNAPSHOT_PATH").ok(),
            dry_run: env_flag("AUTO53_DRY_RUN")?,
            once: env_flag("AUTO53_ONCE")?,
            interval_secs: match env::var("AUTO53_INTERVAL_SECS") {
                Ok(s) => s.trim().parse().map_err(|_| {
                    anyhow::anyhow!("AUTO53_INTERVAL_SECS must be a number of seconds. Got: {}", s)
                })?,
                Err(_) => 120,
            },
            concurrent: env_flag("AUTO53_CONCURRENT")?,
            log_level: env::var("AUTO53_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.config_path.is_empty() {
            anyhow::bail!("AUTO53_CONFIG cannot be empty");
        }

        match self.provider_type.as_str() {
            "snapshot" => {
                if self.snapshot_path.as_ref().is_none_or(|p| p.is_empty()) {
                    anyhow::bail!(
                        "AUTO53_SNAPSHOT_PATH is required when AUTO53_PROVIDER_TYPE=snapshot. \
                        Set it via: export AUTO53_SNAPSHOT_PATH=/var/lib/auto53/snapshot.json"
                    );
                }
            }
            _ => anyhow::bail!(
                "AUTO53_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: snapshot",
                self.provider_type
            ),
        }

        if !(10..=86400).contains(&self.interval_secs) {
            anyhow::bail!(
                "AUTO53_INTERVAL_SECS must be between 10 and 86400 seconds. Got: {}",
                self.interval_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "AUTO53_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::Snapshot {
            path: self.snapshot_path.clone().unwrap_or_default(),
        }
    }

    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            dry_run: self.dry_run,
            interval_secs: self.interval_secs,
            concurrent_submission: self.concurrent,
            ..EngineConfig::default()
        }
    }
}

/// Parse a boolean flag; unset means false
fn env_flag(name: &str) -> Result<bool> {
    match env::var(name) {
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "" | "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("{} must be true or false. Got: {}", name, other),
        },
        Err(_) => Ok(false),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Auto53ExitCode::ConfigError.into();
        }
    };

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return Auto53ExitCode::ConfigError.into();
    }

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return Auto53ExitCode::ConfigError.into();
    }

    let rules = match config::rules_from_yaml_file(&config.config_path) {
        Ok(rules) => rules,
        Err(e) => {
            eprintln!("{}", e);
            return Auto53ExitCode::ConfigError.into();
        }
    };

    let mut auto53_config = Auto53Config::new(rules);
    auto53_config.provider = config.provider_config();
    auto53_config.engine = config.engine_config();

    info!("Starting auto53d daemon");
    info!(
        "Configuration loaded: {} rule(s) from {}",
        auto53_config.rules.len(),
        config.config_path
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return Auto53ExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(auto53_config, config.once)).into()
}

/// Run the daemon
async fn run_daemon(config: Auto53Config, once: bool) -> Auto53ExitCode {
    let registry = ProviderRegistry::with_builtin();
    info!("Provider type: {}", config.provider.type_name());

    let provider = match registry.create_provider(&config.provider).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to create provider: {}", e);
            return Auto53ExitCode::from(&e);
        }
    };

    let dry_run = config.engine.dry_run;
    let (engine, events) = match Auto53Engine::new(provider, config) {
        Ok(created) => created,
        Err(e) => {
            error!("Failed to create engine: {}", e);
            return Auto53ExitCode::from(&e);
        }
    };

    let drain = tokio::spawn(log_events(events));

    let code = if once || dry_run {
        match engine.run_once().await {
            Ok(pass) => {
                if dry_run {
                    print_plan(&pass);
                }
                if pass.submission.is_success() {
                    Auto53ExitCode::CleanShutdown
                } else {
                    Auto53ExitCode::RuntimeError
                }
            }
            Err(e) => {
                error!("Reconciliation pass failed: {}", e);
                Auto53ExitCode::from(&e)
            }
        }
    } else {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(async move {
            match wait_for_shutdown().await {
                Ok(signal) => info!("Received shutdown signal: {}", signal),
                Err(e) => error!("Shutdown error: {}", e),
            }
            let _ = shutdown_tx.send(());
        });

        info!("Starting auto53 engine");
        match engine.run_with_shutdown(Some(shutdown_rx)).await {
            Ok(()) => Auto53ExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {}", e);
                Auto53ExitCode::from(&e)
            }
        }
    };

    // Dropping the engine closes the event channel and ends the drain task
    drop(engine);
    let _ = drain.await;

    info!("Shutting down daemon");
    code
}

/// Print the inventory and the planned evaluations
fn print_plan(pass: &PassReport) {
    println!("{}", report::groups_table(&pass.groups));
    println!("{}", report::evaluations_table(&pass.evaluations));
}

/// Log engine events until the engine is dropped
async fn log_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::BatchFailed { zone_id, error } => {
                warn!("Zone {} batch failed: {}", zone_id, error)
            }
            EngineEvent::PassFailed { error } => warn!("Pass failed: {}", error),
            other => debug!("Engine event: {:?}", other),
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
