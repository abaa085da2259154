use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use config::{Config as ConfigLib, File, FileFormat};
use serde::Deserialize;
use tokio::sync::Notify;
use tracing::{error, info};

use super::errors::ConfigError;
use super::types::{DistributionPoint, MonitorConfig};

/// Shape of the monitor config file
#[derive(Debug, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    crls: Vec<DistributionPoint>,
}

/// Holds the current [`MonitorConfig`] and swaps it atomically on reload.
///
/// Readers get an `Arc` to a complete snapshot and keep it for as long as
/// they need; a reload never changes a snapshot already handed out.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    refresh_interval: Duration,
    current: ArcSwap<MonitorConfig>,
    reloaded: Notify,
}

impl ConfigStore {
    /// Load the initial config. Failure here is fatal for the process.
    pub fn load(path: impl Into<PathBuf>, refresh_interval: Duration) -> Result<Self, ConfigError> {
        if refresh_interval.is_zero() {
            return Err(ConfigError::ZeroRefreshInterval);
        }

        let path = path.into();
        let config = read_config(&path, refresh_interval)?;
        info!(
            "Loaded {} CRL distribution point(s) from {}",
            config.crls.len(),
            path.display()
        );

        Ok(Self {
            path,
            refresh_interval,
            current: ArcSwap::from_pointee(config),
            reloaded: Notify::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Latest fully loaded config
    pub fn current(&self) -> Arc<MonitorConfig> {
        self.current.load_full()
    }

    /// Re-read the config file and publish it.
    ///
    /// On failure the previous config stays in place and no reload
    /// notification is raised.
    pub fn reload(&self) -> Result<Arc<MonitorConfig>, ConfigError> {
        match read_config(&self.path, self.refresh_interval) {
            Ok(config) => {
                let config = Arc::new(config);
                self.current.store(Arc::clone(&config));
                info!(
                    "Config reloaded from {}: {} CRL distribution point(s)",
                    self.path.display(),
                    config.crls.len()
                );
                self.reloaded.notify_one();
                Ok(config)
            }
            Err(e) => {
                error!(
                    "Failed to reload config from {}, keeping previous config: {}",
                    self.path.display(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Resolves after a successful reload.
    ///
    /// A reload that happens while nobody is waiting is remembered, and
    /// several such reloads collapse into one wake-up.
    pub async fn reloaded(&self) {
        self.reloaded.notified().await;
    }
}

fn read_config(path: &Path, refresh_interval: Duration) -> Result<MonitorConfig, ConfigError> {
    let document: ConfigDocument = ConfigLib::builder()
        .add_source(File::from(path).format(FileFormat::Yaml).required(true))
        .build()?
        .try_deserialize()?;

    Ok(MonitorConfig::new(document.crls, refresh_interval))
}
