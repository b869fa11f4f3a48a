//! Daemon configuration loading.
//!
//! The expected YAML structure is:
//! ```yaml
//! strip:
//!   num_pixels: 60
//!   pin: 18
//!   brightness: 255
//!   channel: 0
//! poll_interval_ms: 5000
//! events_file: "events.json"
//! reload_interval_secs: 0
//! ```
//!
//! Every key is optional; missing values fall back to the defaults shown
//! above.  `reload_interval_secs: 0` disables periodic reloading of the
//! events file; `poll_interval_ms: 0` is rejected.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use lightstrip::StripConfig;

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DaemonConfigFile {
    strip: StripSection,
    poll_interval_ms: Option<u64>,
    events_file: Option<PathBuf>,
    reload_interval_secs: Option<u64>,
}

/// `strip:` section.  Each field falls back to [`StripConfig::default`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StripSection {
    num_pixels: Option<usize>,
    pin: Option<u8>,
    brightness: Option<u8>,
    channel: Option<u8>,
}

// ── Public data structures ────────────────────────────────────────────────────

/// Resolved daemon settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    pub strip: StripConfig,
    pub poll_interval: Duration,
    /// JSON file holding event definitions, if any.
    pub events_file: Option<PathBuf>,
    /// How often to reload `events_file`; `None` means never.
    pub reload_interval: Option<Duration>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            strip: StripConfig::default(),
            poll_interval: Duration::from_millis(5_000),
            events_file: None,
            reload_interval: None,
        }
    }
}

impl DaemonConfig {
    /// Parses `path` into a fully resolved configuration.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or if the YAML is
    /// structurally invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading daemon configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        info!(
            num_pixels = config.strip.num_pixels,
            pin = config.strip.pin,
            brightness = config.strip.brightness,
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            events_file = ?config.events_file,
            reload_interval = ?config.reload_interval,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Parses a YAML document.  An empty document yields the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: DaemonConfigFile = if yaml.trim().is_empty() {
            DaemonConfigFile::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        if file.poll_interval_ms == Some(0) {
            bail!("poll_interval_ms must be greater than zero");
        }
        let defaults = Self::default();

        let strip = StripConfig {
            num_pixels: file
                .strip
                .num_pixels
                .unwrap_or(defaults.strip.num_pixels),
            pin: file.strip.pin.unwrap_or(defaults.strip.pin),
            brightness: file.strip.brightness.unwrap_or(defaults.strip.brightness),
            channel: file.strip.channel.unwrap_or(defaults.strip.channel),
        };

        let config = Self {
            strip,
            poll_interval: file
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            events_file: file.events_file,
            reload_interval: file
                .reload_interval_secs
                .filter(|s| *s > 0)
                .map(Duration::from_secs),
        };
        debug!(?config, "Resolved configuration");
        Ok(config)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn load_full_yaml() {
        let yaml = r#"
strip:
  num_pixels: 144
  pin: 12
  brightness: 128
  channel: 1
poll_interval_ms: 1000
events_file: "/var/lib/lightmaster/events.json"
reload_interval_secs: 30
"#;
        let f = yaml_tempfile(yaml);
        let cfg = DaemonConfig::load_from_file(f.path()).unwrap();

        assert_eq!(
            cfg.strip,
            StripConfig {
                num_pixels: 144,
                pin: 12,
                brightness: 128,
                channel: 1,
            }
        );
        assert_eq!(cfg.poll_interval, Duration::from_secs(1));
        assert_eq!(
            cfg.events_file.as_deref(),
            Some(Path::new("/var/lib/lightmaster/events.json"))
        );
        assert_eq!(cfg.reload_interval, Some(Duration::from_secs(30)));
    }

    #[test]
    fn optional_fields_use_defaults_when_absent() {
        let f = yaml_tempfile("strip:\n  num_pixels: 8\n");
        let cfg = DaemonConfig::load_from_file(f.path()).unwrap();

        assert_eq!(cfg.strip.num_pixels, 8);
        assert_eq!(cfg.strip.pin, 18);
        assert_eq!(cfg.strip.brightness, 255);
        assert_eq!(cfg.poll_interval, Duration::from_secs(5));
        assert!(cfg.events_file.is_none());
        assert!(cfg.reload_interval.is_none());
    }

    #[test]
    fn empty_file_yields_defaults() {
        let f = yaml_tempfile("");
        let cfg = DaemonConfig::load_from_file(f.path()).unwrap();
        assert_eq!(cfg, DaemonConfig::default());
    }

    #[test]
    fn zero_reload_interval_disables_reload() {
        let cfg = DaemonConfig::from_yaml("reload_interval_secs: 0\n").unwrap();
        assert!(cfg.reload_interval.is_none());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = DaemonConfig::from_yaml("poll_interval_ms: 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("poll_interval_ms"), "{err:#}");

        let f = yaml_tempfile("poll_interval_ms: 0\n");
        assert!(DaemonConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn brightness_out_of_range_is_rejected() {
        assert!(DaemonConfig::from_yaml("strip:\n  brightness: 300\n").is_err());
    }

    #[test]
    fn missing_file_returns_error() {
        let result = DaemonConfig::load_from_file(Path::new("/nonexistent/path/config.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        assert!(DaemonConfig::load_from_file(f.path()).is_err());
    }
}
