use anyhow::{Context, Result};
use log::error;
use samdeck_types::{DisplayMode, PowerActionMode, PressAction};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::session::SafetyLimits;

#[derive(Clone)]
pub struct SettingsHandle {
    path: PathBuf,
    settings: Arc<RwLock<Settings>>,
}

impl SettingsHandle {
    pub async fn load(path: PathBuf) -> Result<SettingsHandle> {
        let settings = Settings::read(&path)?;
        let handle = SettingsHandle {
            path,
            settings: Arc::new(RwLock::new(settings)),
        };

        // Write straight back, so a fresh install gets a file with the
        // defaults filled in.
        handle.save().await;
        Ok(handle)
    }

    pub async fn save(&self) {
        let settings = self.settings.write().await;
        if let Err(e) = settings.write(&self.path) {
            error!(
                "Couldn't save settings to {}: {}",
                self.path.to_string_lossy(),
                e
            );
        }
    }

    pub async fn get_safety_limits(&self) -> SafetyLimits {
        let settings = self.settings.read().await;
        SafetyLimits {
            max_volume_db: settings.safety.max_volume_db,
            min_volume_db: settings.safety.min_volume_db,
        }
    }

    pub async fn get_connect_on_startup(&self) -> bool {
        self.settings.read().await.connect_on_startup
    }

    pub async fn get_keep_alive(&self) -> KeepAliveSettings {
        self.settings.read().await.keep_alive
    }

    pub async fn get_volume_dial(&self) -> DialSettings {
        self.settings.read().await.volume_dial
    }

    pub async fn get_power_mode(&self) -> PowerActionMode {
        self.settings.read().await.power_key.mode
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub safety: SafetySettings,

    #[serde(default)]
    pub connect_on_startup: bool,

    #[serde(default)]
    pub keep_alive: KeepAliveSettings,

    #[serde(default)]
    pub volume_dial: DialSettings,

    #[serde(default)]
    pub power_key: PowerKeySettings,
}

impl Settings {
    pub fn read(path: &Path) -> Result<Settings> {
        match File::open(path) {
            Ok(reader) => serde_json::from_reader(reader).context(format!(
                "Could not parse daemon settings file at {}",
                path.to_string_lossy()
            )),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Settings::default()),
            Err(error) => Err(error).context(format!(
                "Could not open daemon settings file for reading at {}",
                path.to_string_lossy()
            )),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if let Err(e) = create_dir_all(parent) {
                if e.kind() != ErrorKind::AlreadyExists {
                    return Err(e).context(format!(
                        "Could not create settings directory at {}",
                        parent.to_string_lossy()
                    ))?;
                }
            }
        }
        let writer = File::create(path).context(format!(
            "Could not open daemon settings file for writing at {}",
            path.to_string_lossy()
        ))?;
        serde_json::to_writer_pretty(writer, self).context(format!(
            "Could not write to daemon settings file at {}",
            path.to_string_lossy()
        ))?;
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct SafetySettings {
    pub max_volume_db: f32,
    pub min_volume_db: f32,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            max_volume_db: -10.0,
            min_volume_db: -130.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct KeepAliveSettings {
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl Default for KeepAliveSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: 10,
        }
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct DialSettings {
    /// Volume change per rotation tick, 0.5 to 6.0 dB.
    pub step_db: f32,
    pub min_volume_db: f32,
    pub max_volume_db: f32,
    pub default_volume_db: f32,
    pub press_action: PressAction,
    pub display_mode: DisplayMode,
}

impl Default for DialSettings {
    fn default() -> Self {
        Self {
            step_db: 1.0,
            min_volume_db: -60.0,
            max_volume_db: 0.0,
            default_volume_db: -30.0,
            press_action: PressAction::ToggleMute,
            display_mode: DisplayMode::Decibels,
        }
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct PowerKeySettings {
    pub mode: PowerActionMode,
}

impl Default for PowerKeySettings {
    fn default() -> Self {
        Self {
            mode: PowerActionMode::Toggle,
        }
    }
}
