use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{MapError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub canvas: CanvasConfig,
    /// Nominal ticks per second of the main loop.
    pub frame_rate: u32,
    pub undo_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            canvas: CanvasConfig::default(),
            frame_rate: 30,
            undo_limit: 100,
        }
    }
}

impl AppConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_rate == 0 {
            return Err(MapError::InvalidInput("frame rate must be positive"));
        }
        if self.remote.enabled {
            validate_port(u32::from(self.remote.port))?;
            if self.remote.queue_capacity == 0 {
                return Err(MapError::InvalidInput("remote queue capacity must be positive"));
            }
        }
        Ok(())
    }
}

/// Settings of the remote-control receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub port: u16,
    /// Upper bound on messages handled per tick.
    pub drain_budget: usize,
    /// Messages the listener may queue before it starts dropping.
    pub queue_capacity: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 12345,
            drain_budget: 64,
            queue_capacity: 1024,
        }
    }
}

/// Size of the source canvas, used to lay out default shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
        }
    }
}

/// Accepts unprivileged UDP ports only.
pub fn validate_port(port: u32) -> Result<u16> {
    if !(1024..=65535).contains(&port) {
        return Err(MapError::InvalidPort(port));
    }
    Ok(port as u16)
}

/// Parses a port given as text, e.g. on the command line.
pub fn parse_port(text: &str) -> Result<u16> {
    let port: u32 = text
        .trim()
        .parse()
        .map_err(|_| MapError::msg(format!("remote port is not a number: {text}")))?;
    validate_port(port)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "remote": {{ "port": 9000 }}, "frame_rate": 60 }}"#).unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.remote.port, 9000);
        assert!(config.remote.enabled);
        assert_eq!(config.frame_rate, 60);
        assert_eq!(config.canvas, CanvasConfig::default());
        assert_eq!(config.remote.queue_capacity, 1024);
    }

    #[test]
    fn remote_queue_needs_room() {
        let mut config = AppConfig::default();
        config.remote.queue_capacity = 0;
        assert!(config.validate().is_err());
        config.remote.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_privileged_ports() {
        assert!(matches!(validate_port(80), Err(MapError::InvalidPort(80))));
        assert!(validate_port(70000).is_err());
        assert_eq!(parse_port(" 7000 ").unwrap(), 7000);
        assert!(parse_port("osc").is_err());
    }

    #[test]
    fn zero_frame_rate_is_invalid() {
        let config = AppConfig {
            frame_rate: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
