use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use syncthing_dashboard::config::Config;
use syncthing_dashboard::syncthing_client::{self, RuntimeSettings, SyncthingClient};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().await;
    let client = match SyncthingClient::discover(&config).await {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "Cannot start dashboard");
            return ExitCode::FAILURE;
        }
    };

    let handle = syncthing_client::spawn(Arc::new(client), RuntimeSettings::from(&config));
    let mut snapshots = handle.subscribe();
    let mut last_summary = String::new();
    let mut last_error: Option<String> = None;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(err) = result {
                    warn!(error = %err, "Failed to listen for ctrl-c");
                }
                info!("Shutting down");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    warn!("Dashboard stopped unexpectedly");
                    break;
                }

                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.last_error != last_error {
                    if let Some(message) = &snapshot.last_error {
                        warn!(error = %message, "Dashboard reported an error");
                    }
                    last_error = snapshot.last_error.clone();
                }

                let summary = snapshot.summary();
                if summary == last_summary {
                    continue;
                }
                info!(%summary, "Dashboard updated");
                last_summary = summary;

                if config.print_snapshots {
                    match serde_json::to_string(&snapshot) {
                        Ok(json) => println!("{json}"),
                        Err(err) => warn!(error = %err, "Failed to serialize snapshot"),
                    }
                }
            }
        }
    }

    handle.shutdown();
    ExitCode::SUCCESS
}
