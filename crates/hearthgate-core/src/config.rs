//! Device configuration.
//!
//! [`DeviceConfig`] carries every tunable of the control loop and defaults
//! to the factory values in [`constants`](crate::constants).
//! [`ProvisionedConfig`] is the persisted provisioning record written by the
//! setup flow and read once at boot.

use crate::{Error, Result, constants::*};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables of the control loop. All durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub tick_ms: u64,
    pub env_sample_ms: u64,
    pub display_refresh_ms: u64,
    pub status_interval_ms: u64,

    pub door_hold_ms: u64,
    pub door_settle_ms: u64,
    pub cover_hold_ms: u64,
    pub cover_settle_ms: u64,

    pub scan_repeat_ms: u64,
    pub auth_timeout_ms: u64,
    pub log_timeout_ms: u64,
    pub registration_timeout_ms: u64,
    pub backend_check_ms: u64,
    /// Consecutive failures before the device reports itself offline.
    pub offline_ceiling: u32,

    pub touch_samples: usize,
    pub touch_threshold: usize,
    pub touch_window_ms: u64,
    pub button_refractory_ms: u64,

    pub gas_alarm_threshold: u16,
    pub light_dark_threshold: u16,
    pub light_bright_threshold: u16,

    pub light_channels: u8,
    pub screen_count: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            env_sample_ms: DEFAULT_ENV_SAMPLE_MS,
            display_refresh_ms: DEFAULT_DISPLAY_REFRESH_MS,
            status_interval_ms: DEFAULT_STATUS_INTERVAL_MS,
            door_hold_ms: DEFAULT_DOOR_HOLD_MS,
            door_settle_ms: DEFAULT_DOOR_SETTLE_MS,
            cover_hold_ms: DEFAULT_COVER_HOLD_MS,
            cover_settle_ms: DEFAULT_COVER_SETTLE_MS,
            scan_repeat_ms: DEFAULT_SCAN_REPEAT_MS,
            auth_timeout_ms: DEFAULT_AUTH_TIMEOUT_MS,
            log_timeout_ms: DEFAULT_LOG_TIMEOUT_MS,
            registration_timeout_ms: DEFAULT_REGISTRATION_TIMEOUT_MS,
            backend_check_ms: DEFAULT_BACKEND_CHECK_MS,
            offline_ceiling: DEFAULT_OFFLINE_CEILING,
            touch_samples: DEFAULT_TOUCH_SAMPLES,
            touch_threshold: DEFAULT_TOUCH_THRESHOLD,
            touch_window_ms: DEFAULT_TOUCH_WINDOW_MS,
            button_refractory_ms: DEFAULT_BUTTON_REFRACTORY_MS,
            gas_alarm_threshold: DEFAULT_GAS_ALARM_THRESHOLD,
            light_dark_threshold: DEFAULT_LIGHT_DARK_THRESHOLD,
            light_bright_threshold: DEFAULT_LIGHT_BRIGHT_THRESHOLD,
            light_channels: LIGHT_CHANNEL_COUNT,
            screen_count: SCREEN_COUNT,
        }
    }
}

impl DeviceConfig {
    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(Error::Config("tick_ms must be positive".into()));
        }
        if self.touch_window_ms >= self.tick_ms {
            return Err(Error::Config(format!(
                "touch window {}ms must be shorter than the {}ms tick",
                self.touch_window_ms, self.tick_ms
            )));
        }
        if self.touch_samples == 0 || self.touch_threshold == 0 {
            return Err(Error::Config(
                "touch samples and threshold must be positive".into(),
            ));
        }
        if self.touch_threshold > self.touch_samples {
            return Err(Error::Config(format!(
                "touch threshold {} exceeds sample count {}",
                self.touch_threshold, self.touch_samples
            )));
        }
        if self.offline_ceiling == 0 {
            return Err(Error::Config("offline_ceiling must be at least 1".into()));
        }
        if self.light_dark_threshold >= self.light_bright_threshold {
            return Err(Error::Config(format!(
                "light dark threshold {} must be below bright threshold {}",
                self.light_dark_threshold, self.light_bright_threshold
            )));
        }
        if self.light_channels == 0 || self.light_channels > LIGHT_CHANNEL_COUNT {
            return Err(Error::Config(format!(
                "light_channels must be 1-{LIGHT_CHANNEL_COUNT}"
            )));
        }
        if self.screen_count == 0 {
            return Err(Error::Config("screen_count must be positive".into()));
        }
        Ok(())
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn env_sample_interval(&self) -> Duration {
        Duration::from_millis(self.env_sample_ms)
    }

    pub fn display_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.display_refresh_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    pub fn door_hold(&self) -> Duration {
        Duration::from_millis(self.door_hold_ms)
    }

    pub fn door_settle(&self) -> Duration {
        Duration::from_millis(self.door_settle_ms)
    }

    pub fn cover_hold(&self) -> Duration {
        Duration::from_millis(self.cover_hold_ms)
    }

    pub fn cover_settle(&self) -> Duration {
        Duration::from_millis(self.cover_settle_ms)
    }

    pub fn scan_repeat_delay(&self) -> Duration {
        Duration::from_millis(self.scan_repeat_ms)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }

    pub fn log_timeout(&self) -> Duration {
        Duration::from_millis(self.log_timeout_ms)
    }

    pub fn registration_timeout(&self) -> Duration {
        Duration::from_millis(self.registration_timeout_ms)
    }

    pub fn backend_check_interval(&self) -> Duration {
        Duration::from_millis(self.backend_check_ms)
    }

    pub fn touch_window(&self) -> Duration {
        Duration::from_millis(self.touch_window_ms)
    }

    pub fn button_refractory(&self) -> Duration {
        Duration::from_millis(self.button_refractory_ms)
    }
}

/// Persisted provisioning record.
///
/// Written once by the setup portal; the controller only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedConfig {
    #[serde(default)]
    pub wifi_ssid: String,
    pub backend_url: String,
    pub mqtt_host: String,
    #[serde(default = "default_mqtt_port")]
    pub mqtt_port: u16,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub provisioned: bool,
}

fn default_mqtt_port() -> u16 {
    1883
}

impl ProvisionedConfig {
    /// Load the provisioning record from a JSON file.
    ///
    /// # Errors
    /// - `Error::MissingConfig` if the file does not exist
    /// - `Error::Io` / `Error::Json` if it cannot be read or parsed
    /// - `Error::Config` if the backend URL is empty
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingConfig(path.display().to_string()));
        }

        let raw = std::fs::read_to_string(path)?;
        let config: ProvisionedConfig = serde_json::from_str(&raw)?;

        if config.backend_url.trim().is_empty() {
            return Err(Error::Config("backendUrl must not be empty".into()));
        }

        Ok(config)
    }

    /// Write the record as pretty JSON.
    ///
    /// # Errors
    /// Returns `Error::Io` or `Error::Json` on failure.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
