//! Harness configuration stored in `baton.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Configuration file name, resolved against the working directory.
pub const CONFIG_FILE_NAME: &str = "baton.toml";

/// Harness configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Path of the persistent state slot, resolved against the working
    /// directory.
    pub state_path: PathBuf,

    /// Commit the simulation's stdout even when it exits with failure, so a
    /// crashed run's partial output can be inspected. The turn still reports
    /// failure. Off by default, which keeps the previous state untouched.
    pub keep_failed_output: bool,

    /// Wall-clock budget in seconds for one simulation run. Unset means the
    /// harness waits for the simulation indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_timeout_secs: Option<u64>,

    pub bootstrap: BootstrapConfig,
    pub simulation: SimulationConfig,
}

/// Bootstrap entry point, used when no state exists yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Command that builds and runs the simulation from scratch
    /// (e.g. `["cargo","run"]`). Invoked with nothing piped to stdin.
    pub command: Vec<String>,
}

/// Pre-built simulation executable, used on every continuing turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Command that advances the simulation; receives the prior state on
    /// stdin.
    pub command: Vec<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            command: vec!["cargo".to_string(), "run".to_string()],
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            command: vec!["./target/debug/sim".to_string()],
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("sim.state"),
            keep_failed_output: false,
            turn_timeout_secs: None,
            bootstrap: BootstrapConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.state_path.as_os_str().is_empty() {
            return Err(anyhow!("state_path must not be empty"));
        }
        if self.turn_timeout_secs == Some(0) {
            return Err(anyhow!("turn_timeout_secs must be > 0 when set"));
        }
        validate_command("bootstrap.command", &self.bootstrap.command)?;
        validate_command("simulation.command", &self.simulation.command)?;
        Ok(())
    }
}

fn validate_command(field: &str, command: &[String]) -> Result<()> {
    if command.is_empty() || command[0].trim().is_empty() {
        return Err(anyhow!("{field} must be a non-empty array"));
    }
    Ok(())
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `HarnessConfig::default()`.
pub fn load_config(path: &Path) -> Result<HarnessConfig> {
    if !path.exists() {
        let cfg = HarnessConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: HarnessConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &HarnessConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, HarnessConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        let cfg = HarnessConfig {
            keep_failed_output: true,
            turn_timeout_secs: Some(120),
            ..HarnessConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "state_path = \"world.save\"\n").expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.state_path, PathBuf::from("world.save"));
        assert_eq!(cfg.bootstrap, BootstrapConfig::default());
        assert!(!cfg.keep_failed_output);
        assert_eq!(cfg.turn_timeout_secs, None);
    }

    #[test]
    fn command_tables_parse_from_toml() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        let contents = "[simulation]\ncommand = [\"./sim\", \"--quiet\"]\n";
        fs::write(&path, contents).expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(
            cfg.simulation.command,
            vec!["./sim".to_string(), "--quiet".to_string()]
        );
    }

    #[test]
    fn empty_simulation_command_is_rejected() {
        let cfg = HarnessConfig {
            simulation: SimulationConfig {
                command: Vec::new(),
            },
            ..HarnessConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("simulation.command"));
    }

    #[test]
    fn blank_bootstrap_program_is_rejected() {
        let cfg = HarnessConfig {
            bootstrap: BootstrapConfig {
                command: vec!["  ".to_string()],
            },
            ..HarnessConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("bootstrap.command"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = HarnessConfig {
            turn_timeout_secs: Some(0),
            ..HarnessConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "state_path = [not toml").expect("write");

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }
}
