use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::{debug, error, info, warn};

use ais_feed::{
    AisConnection, Config, FeedArgs, ManagedConnection, create_default_config, init_logging,
    load_config,
};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    let args = FeedArgs::parse();
    init_logging(args.log_file.as_deref());

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;
    rt.block_on(run_feed(args))
}

fn load_or_create_config(path: &Path) -> Result<Config> {
    if path.exists() {
        return load_config(path).inspect_err(|e| {
            error!("Failed to load existing config file '{}': {}", path.display(), e);
            error!("Please check your config file syntax and try again");
        });
    }

    warn!(
        "Config file '{}' not found, creating default config",
        path.display()
    );
    let default_config = create_default_config();
    let config_toml = toml::to_string_pretty(&default_config)?;
    std::fs::write(path, &config_toml)?;
    info!("Created default config file: {}", path.display());
    Ok(default_config)
}

async fn run_feed(args: FeedArgs) -> Result<()> {
    let mut config = load_or_create_config(&args.config)?;
    args.apply(&mut config);
    config.validate()?;

    let endpoint = config.upstream.endpoint();
    info!(
        host = %endpoint.host,
        port = %endpoint.port,
        username = %endpoint.username,
        poll_interval_secs = config.poll.interval.as_secs(),
        "Starting AIS feed consumer"
    );

    let managed = ManagedConnection::with_retry_delay(config.retry.delay);
    let connection = managed.get_connection();
    connection.open(endpoint).await?;

    let mut ticker = tokio::time::interval(config.poll.interval.max(MIN_POLL_INTERVAL));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let sentences = connection.sentences();
                let mut stdout = std::io::stdout().lock();
                for sentence in &sentences {
                    writeln!(stdout, "{sentence}")?;
                }
                stdout.flush()?;
                debug!(
                    drained = sentences.len(),
                    queued = connection.queue_size(),
                    state = %connection.state(),
                    "Polled sentence buffer"
                );
            }
        }
    }

    info!("Shutdown signal received, closing AIS connection...");
    connection.close().await;
    let stats = managed.stats();
    info!(
        connect_attempts = stats.connect_attempts,
        reconnects = stats.reconnects(),
        accepted = stats.sentences_accepted,
        filtered = stats.sentences_filtered,
        skipped = stats.lines_skipped,
        "AIS feed consumer stopped"
    );
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
