use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use global_hotkey::hotkey::{Code, Modifiers};

use crate::core::ConfigurationError;
use crate::triggers::TriggerId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotkeyConfig {
    pub modifiers: String, // "Ctrl", "Alt", "Shift", "Ctrl+Alt", etc.
    pub key: String,       // "Numpad1", "F1", "Digit1", etc.
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            modifiers: "Ctrl".to_string(),
            key: "Numpad1".to_string(),
        }
    }
}

impl HotkeyConfig {
    pub fn new(modifiers: &str, key: &str) -> Self {
        Self {
            modifiers: modifiers.to_string(),
            key: key.to_string(),
        }
    }

    pub fn to_global_hotkey(&self) -> Result<(Option<Modifiers>, Code), ConfigurationError> {
        let modifiers = self.parse_modifiers()?;
        let code = self.parse_code()?;
        Ok((modifiers, code))
    }

    fn parse_modifiers(&self) -> Result<Option<Modifiers>, ConfigurationError> {
        let mut result = Modifiers::empty();

        for part in self.modifiers.split('+') {
            match part.trim() {
                "Ctrl" => result |= Modifiers::CONTROL,
                "Alt" => result |= Modifiers::ALT,
                "Shift" => result |= Modifiers::SHIFT,
                "Super" | "Win" => result |= Modifiers::SUPER,
                "" => {}, // Allow empty for no modifiers
                other => {
                    return Err(ConfigurationError::InvalidHotkey(format!("unknown modifier {other:?}")))
                }
            }
        }

        if result.is_empty() {
            Ok(None)
        } else {
            Ok(Some(result))
        }
    }

    fn parse_code(&self) -> Result<Code, ConfigurationError> {
        let code = match self.key.as_str() {
            "Numpad0" => Code::Numpad0,
            "Numpad1" => Code::Numpad1,
            "Numpad2" => Code::Numpad2,
            "Numpad3" => Code::Numpad3,
            "Numpad4" => Code::Numpad4,
            "Numpad5" => Code::Numpad5,
            "Numpad6" => Code::Numpad6,
            "Numpad7" => Code::Numpad7,
            "Numpad8" => Code::Numpad8,
            "Numpad9" => Code::Numpad9,
            "Digit0" => Code::Digit0,
            "Digit1" => Code::Digit1,
            "Digit2" => Code::Digit2,
            "Digit3" => Code::Digit3,
            "Digit4" => Code::Digit4,
            "Digit5" => Code::Digit5,
            "Digit6" => Code::Digit6,
            "Digit7" => Code::Digit7,
            "Digit8" => Code::Digit8,
            "Digit9" => Code::Digit9,
            "F1" => Code::F1,
            "F2" => Code::F2,
            "F3" => Code::F3,
            "F4" => Code::F4,
            "F5" => Code::F5,
            "F6" => Code::F6,
            "F7" => Code::F7,
            "F8" => Code::F8,
            "F9" => Code::F9,
            "F10" => Code::F10,
            "F11" => Code::F11,
            "F12" => Code::F12,
            other => return Err(ConfigurationError::InvalidHotkey(format!("unknown key {other:?}"))),
        };
        Ok(code)
    }
}

/// One physical input line and the key that stands in for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerLineConfig {
    pub id: TriggerId,
    pub hotkey: HotkeyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub program: PathBuf,
    pub ipc_socket: PathBuf,
    pub extra_args: Vec<String>,
    pub ipc_timeout_ms: u64,
    pub startup_timeout_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("mpv"),
            ipc_socket: PathBuf::from("/tmp/vid-looper-mpv.sock"),
            extra_args: vec!["--fullscreen".to_string()],
            ipc_timeout_ms: 1000,
            startup_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub media_directory: PathBuf,
    pub media_file: String,
    pub durations_file: String,
    pub debounce_delay_secs: f64,
    pub over_time_margin_secs: f64,
    pub bounce_time_ms: u64,
    pub max_trigger_lines: usize,
    pub trigger_lines: Vec<TriggerLineConfig>,
    pub gpio_triggers: bool,
    pub hotkey_triggers: bool,
    pub console_triggers: bool,
    pub player: PlayerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        // TR1..TR8 in wiring order, bound to Ctrl+Numpad1..8
        let trigger_lines = TriggerId::DEFAULT_LINES
            .iter()
            .enumerate()
            .map(|(i, &id)| TriggerLineConfig {
                id,
                hotkey: HotkeyConfig::new("Ctrl", &format!("Numpad{}", i + 1)),
            })
            .collect();

        Self {
            media_directory: PathBuf::from("/home/pi/videos"),
            media_file: "combined.mp4".to_string(),
            durations_file: "length.txt".to_string(),
            debounce_delay_secs: 0.4,
            over_time_margin_secs: 3.0,
            bounce_time_ms: 2000,
            max_trigger_lines: TriggerId::DEFAULT_LINES.len(),
            trigger_lines,
            gpio_triggers: true,
            hotkey_triggers: true,
            console_triggers: true,
            player: PlayerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to read config file at {}: {}", config_path.display(), e))?;

            match serde_json::from_str::<Self>(&content) {
                Ok(config) => {
                    log::info!("Loaded existing config from {}", config_path.display());
                    Ok(config)
                }
                Err(e) => {
                    log::warn!("Config file exists but has issues ({}), creating new one with defaults", e);
                    let new_config = Self::default();
                    new_config.save_to(config_path)
                        .map_err(|save_err| anyhow::anyhow!("Failed to save new config: {}", save_err))?;
                    log::info!("Created new config file at {}", config_path.display());
                    Ok(new_config)
                }
            }
        } else {
            log::info!("No config file found, creating default config");
            let config = Self::default();
            config.save_to(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to save default config: {}", e))?;
            log::info!("Created new config file at {}", config_path.display());
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vid-looper")
            .join("config.json")
    }

    pub fn media_path(&self) -> PathBuf {
        self.media_directory.join(&self.media_file)
    }

    pub fn durations_path(&self) -> PathBuf {
        self.media_directory.join(&self.durations_file)
    }

    /// Lines usable as triggers, in priority order.
    pub fn available_triggers(&self) -> Vec<TriggerId> {
        self.trigger_lines
            .iter()
            .take(self.max_trigger_lines)
            .map(|line| line.id)
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.debounce_delay_secs.is_finite() || self.debounce_delay_secs < 0.0 {
            return Err(ConfigurationError::InvalidConstant {
                name: "debounce_delay_secs",
                value: self.debounce_delay_secs.to_string(),
            });
        }
        if !self.over_time_margin_secs.is_finite() || self.over_time_margin_secs < 0.0 {
            return Err(ConfigurationError::InvalidConstant {
                name: "over_time_margin_secs",
                value: self.over_time_margin_secs.to_string(),
            });
        }
        if self.max_trigger_lines > self.trigger_lines.len() {
            return Err(ConfigurationError::InvalidConstant {
                name: "max_trigger_lines",
                value: format!(
                    "{} (only {} lines configured)",
                    self.max_trigger_lines,
                    self.trigger_lines.len()
                ),
            });
        }

        let mut seen = HashSet::new();
        for line in &self.trigger_lines {
            if !seen.insert(line.id) {
                return Err(ConfigurationError::DuplicateTrigger(line.id));
            }
        }

        log::debug!("Config validated: {} trigger lines available", self.max_trigger_lines);
        Ok(())
    }
}
