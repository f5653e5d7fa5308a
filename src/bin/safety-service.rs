use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use vigil_adapter_vehicle::{MockVehicleBus, SqliteViolationStore};
use vigil_application::SafetyMonitor;
use vigil_domain::VigilConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config_path = config_path();
    let config = if config_path.exists() {
        VigilConfig::load_from_path(&config_path)?
    } else {
        tracing::info!("no configuration file found, using defaults");
        VigilConfig::default()
    };
    for problem in config.validate() {
        tracing::warn!("configuration problem: {problem}");
    }

    let bus = Arc::new(MockVehicleBus::new());
    let store = Arc::new(SqliteViolationStore::open(&config.service.violation_db_path)?);
    let monitor = Arc::new(SafetyMonitor::new(&config, bus.clone(), store));

    monitor.register_emergency_callback(|| async {
        tracing::error!("emergency: disabling performance modifications, reverting to safe defaults");
        Ok(())
    });

    if config.safety.enable_monitoring {
        monitor.clone().start_monitoring().await;
    }

    {
        let monitor = monitor.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                if !monitor.health_check().await {
                    tracing::error!("safety monitor health check failed");
                }
            }
        });
    }

    tracing::info!("vigil safety service running on {}", config.service.device_name);
    tokio::signal::ctrl_c().await?;

    monitor.shutdown().await;
    Ok(())
}

fn config_path() -> PathBuf {
    if let Ok(path) = env::var("VIGIL_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    if let Ok(home) = env::var("HOME") {
        return Path::new(&home).join(".vigil").join("config.yaml");
    }

    PathBuf::from("vigil-config.yaml")
}
