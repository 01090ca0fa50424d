//! Configuration for the cn-serial-io gateway
//!
//! Loads configuration from a TOML file: serial link parameters, measure
//! output options and logging.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub measures: MeasuresConfig,
    pub logging: LoggingConfig,
}

/// Serial link to the control node
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SerialConfig {
    /// Control node serial port
    pub port: String,
    /// Baud rate (500000 on deployed nodes)
    pub baud_rate: u32,
}

/// Measure output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MeasuresConfig {
    /// Directory for measure output files, absent disables file output
    pub output_dir: Option<String>,
    /// Also log every decoded sample at info level
    #[serde(default)]
    pub print_measures: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| Error::Other(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig {
                port: "/dev/ttyCN".to_string(),
                baud_rate: 500_000,
            },
            measures: MeasuresConfig {
                output_dir: None,
                print_measures: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.serial.port, "/dev/ttyCN");
        assert_eq!(config.serial.baud_rate, 500_000);
        assert!(config.measures.output_dir.is_none());
        assert!(!config.measures.print_measures);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[serial]"));
        assert!(toml_string.contains("[measures]"));
        assert!(toml_string.contains("[logging]"));
        assert!(toml_string.contains("baud_rate = 500000"));
        assert!(toml_string.contains("port = \"/dev/ttyCN\""));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[serial]
port = "/dev/ttyUSB0"
baud_rate = 115200

[measures]
output_dir = "/tmp/measures"
print_measures = true

[logging]
level = "debug"
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.measures.output_dir.as_deref(), Some("/tmp/measures"));
        assert!(config.measures.print_measures);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_print_measures_defaults_off() {
        let toml_content = r#"
[serial]
port = "/dev/ttyUSB0"
baud_rate = 500000

[measures]

[logging]
level = "info"
"#;
        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert!(!config.measures.print_measures);
    }
}
