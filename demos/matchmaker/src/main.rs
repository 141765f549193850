use std::time::Duration;

use pairforge::prelude::*;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
enum SettingsError {
    #[error("{name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug)]
struct Settings {
    bind: String,
    servers: Vec<ServerAddress>,
    retry: RetryPolicy,
    withdraw_on_disconnect: bool,
}

impl Settings {
    fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// PAIRFORGE_BIND, PAIRFORGE_SERVERS (comma-separated host:port),
    /// PAIRFORGE_RETRY_SECS, PAIRFORGE_WITHDRAW_ON_DISCONNECT.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let bind = get("PAIRFORGE_BIND").unwrap_or_else(|| "127.0.0.1:3000".to_string());

        let servers = get("PAIRFORGE_SERVERS")
            .unwrap_or_else(|| "127.0.0.1:7777".to_string())
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.parse::<ServerAddress>().map_err(|e| SettingsError::Invalid {
                    name: "PAIRFORGE_SERVERS",
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let retry = match get("PAIRFORGE_RETRY_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| SettingsError::Invalid {
                    name: "PAIRFORGE_RETRY_SECS",
                    reason: e.to_string(),
                })?;
                RetryPolicy::fixed(Duration::from_secs(secs))
            }
            None => RetryPolicy::default(),
        };

        let withdraw_on_disconnect = match get("PAIRFORGE_WITHDRAW_ON_DISCONNECT").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(SettingsError::Invalid {
                    name: "PAIRFORGE_WITHDRAW_ON_DISCONNECT",
                    reason: format!("expected true or false, got {other:?}"),
                });
            }
        };

        Ok(Self {
            bind,
            servers,
            retry,
            withdraw_on_disconnect,
        })
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pairforge::init_tracing();
    let settings = Settings::from_env()?;
    tracing::info!(?settings, "starting matchmaker");

    let server = PairforgeServerBuilder::new()
        .bind(&settings.bind)
        .withdraw_on_disconnect(settings.withdraw_on_disconnect)
        .match_config(MatchConfig {
            retry: settings.retry,
            ..MatchConfig::default()
        })
        .build(RoundRobinAllocator::new(settings.servers))
        .await?;

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutdown requested");
            shutdown.cancel();
        }
    });

    server.run(shutdown).await?;
    Ok(())
}
