use crate::error::{CtrlBotError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IrcSettings {
    pub server: String,
    pub port: u16,
    pub nick: String,
    pub username: String,
    pub realname: String,
    /// Sent as `PASS` before registration when set.
    pub password: Option<String>,
    pub channels: Vec<String>,
    pub command_prefix: String,
    pub reconnect_delay_secs: u64,
    /// How often the `!help` hint is posted to each joined channel.
    pub help_reminder_secs: u64,
}

impl Default for IrcSettings {
    fn default() -> Self {
        Self {
            server: "irc.libera.chat".into(),
            port: 6667,
            nick: "ctrlbot".into(),
            username: "ctrlbot".into(),
            realname: "ctrlbot virtual controller".into(),
            password: None,
            channels: vec![],
            command_prefix: "!".into(),
            reconnect_delay_secs: 10,
            help_reminder_secs: 5 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VXboxSettings {
    pub dll_path: PathBuf,
    /// Virtual bus slot, 1..=4.
    pub controller_id: u32,
}

impl Default for VXboxSettings {
    fn default() -> Self {
        Self {
            dll_path: PathBuf::from("vXboxInterface.dll"),
            controller_id: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct XInputSettings {
    /// Mirror the physical pad onto the virtual one.
    pub mirror: bool,
    /// XInput slot 0..=3; the first connected pad when unset.
    pub device: Option<u32>,
    pub poll_interval_ms: u64,
    pub mirror_delay_ms: u64,
}

impl Default for XInputSettings {
    fn default() -> Self {
        Self {
            mirror: true,
            device: None,
            poll_interval_ms: 10,
            mirror_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ActuationSettings {
    pub default_pulse_ms: u64,
    pub max_pulse_ms: u64,
    pub dpad_tap_ms: u64,
    pub max_dpad_taps: u32,
}

impl Default for ActuationSettings {
    fn default() -> Self {
        Self {
            default_pulse_ms: 200,
            max_pulse_ms: 10_000,
            dpad_tap_ms: 200,
            max_dpad_taps: 4,
        }
    }
}

impl ActuationSettings {
    /// Hold time for a pulse: the requested milliseconds if they parse,
    /// otherwise the default, clamped to `0..=max_pulse_ms`.
    pub fn pulse_duration(&self, requested: Option<&str>) -> Duration {
        let ms = requested
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(self.default_pulse_ms as i64)
            .clamp(0, self.max_pulse_ms as i64);
        Duration::from_millis(ms as u64)
    }

    /// Number of D-pad taps, `1..=max_dpad_taps`, default 1.
    pub fn tap_count(&self, requested: Option<&str>) -> u32 {
        requested
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .clamp(1, i64::from(self.max_dpad_taps.max(1))) as u32
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub irc: IrcSettings,
    pub vxbox: VXboxSettings,
    pub xinput: XInputSettings,
    pub actuation: ActuationSettings,
}

impl AppConfig {
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| CtrlBotError::Config("Cannot find config directory".into()))?
            .join("ctrlbot");
        Ok(dir.join("config.json"))
    }

    /// Read `path`, writing the defaults there first if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            log::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=4).contains(&self.vxbox.controller_id) {
            return Err(CtrlBotError::Config(format!(
                "vxbox.controller_id must be 1-4, got {}",
                self.vxbox.controller_id
            )));
        }
        if let Some(device) = self.xinput.device {
            if device > 3 {
                return Err(CtrlBotError::Config(format!(
                    "xinput.device must be 0-3, got {}",
                    device
                )));
            }
        }
        if self.irc.command_prefix.is_empty() {
            return Err(CtrlBotError::Config("irc.command_prefix is empty".into()));
        }
        Ok(())
    }
}
