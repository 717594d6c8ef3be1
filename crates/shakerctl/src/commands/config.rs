//! Config file commands and loading helpers.

use std::path::Path;

use anyhow::{Context, Result};
use openracing_shaker::{ShakerConfig, ShakerError};
use tracing::{debug, info};

use crate::commands::ConfigCommands;
use crate::error::CliError;
use crate::output;

/// Execute config command.
pub fn execute(cmd: &ConfigCommands, json: bool) -> Result<()> {
    match cmd {
        ConfigCommands::Show {
            config,
            overrides,
            yaml,
        } => {
            let resolved = resolve(config.as_deref(), overrides)?;
            let origin = config
                .as_deref()
                .map_or_else(|| "defaults".to_string(), |p| p.display().to_string());
            if *yaml && !json {
                let text = resolved.to_yaml_string().map_err(CliError::from)?;
                print!("{text}");
                Ok(())
            } else {
                output::print_config(&resolved, &origin, json)
            }
        }
        ConfigCommands::Validate { file } => {
            let config = load(file)?;
            output::print_validated(file, &config, json)
        }
        ConfigCommands::Set { file, assignments } => {
            let current = load(file)?;
            let updated = apply_overrides(current, assignments)?;
            save(&updated, file)?;
            info!(path = %file.display(), count = assignments.len(), "Updated config file");
            output::print_config(&updated, &file.display().to_string(), json)
        }
        ConfigCommands::Init { file, force } => {
            if file.exists() && !force {
                return Err(CliError::AlreadyExists(file.display().to_string()).into());
            }
            save(&ShakerConfig::default(), file)?;
            output::print_success(&format!("Wrote default config to {}", file.display()), json)
        }
    }
}

/// Effective config: the file (or defaults) with overrides applied in order.
pub fn resolve(path: Option<&Path>, overrides: &[(String, String)]) -> Result<ShakerConfig> {
    let base = match path {
        Some(path) => load(path)?,
        None => ShakerConfig::default(),
    };
    Ok(apply_overrides(base, overrides)?)
}

/// Load and validate a config file.
pub fn load(path: &Path) -> Result<ShakerConfig> {
    if !path.exists() {
        return Err(CliError::ConfigNotFound(path.display().to_string()).into());
    }
    match ShakerConfig::load(path) {
        Ok(config) => {
            debug!(path = %path.display(), "Loaded shaker config");
            Ok(config)
        }
        Err(ShakerError::Config(err)) => Err(CliError::from(err).into()),
        Err(err) => Err(anyhow::Error::new(err))
            .with_context(|| format!("Failed to read config from {}", path.display())),
    }
}

fn save(config: &ShakerConfig, path: &Path) -> Result<()> {
    config
        .save(path)
        .with_context(|| format!("Failed to write config to {}", path.display()))
}

/// Apply `name=value` pairs; the first invalid one aborts.
pub fn apply_overrides(
    config: ShakerConfig,
    overrides: &[(String, String)],
) -> Result<ShakerConfig, CliError> {
    overrides
        .iter()
        .try_fold(config, |config, (name, value)| {
            debug!(name = %name, value = %value, "Applying parameter override");
            Ok(config.with_parameter(name, value)?)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn Error>>;

    fn pair(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn test_resolve_defaults() -> TestResult {
        let config = resolve(None, &[])?;
        assert_eq!(config, ShakerConfig::default());
        Ok(())
    }

    #[test]
    fn test_overrides_apply_in_order() -> TestResult {
        let config = resolve(
            None,
            &[pair("normal_freq", "30"), pair("normal_freq", "35"), pair("use_rpm", "off")],
        )?;
        assert_eq!(config.normal_frequency_hz, 35);
        assert!(!config.rpm.enabled);
        Ok(())
    }

    #[test]
    fn test_invalid_override_is_validation_error() {
        let err = apply_overrides(ShakerConfig::default(), &[pair("base_freq", "200")]);
        assert!(matches!(err, Err(CliError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Path::new("/no/such/shaker.yaml"));
        assert!(matches!(
            err.as_ref().map_err(|e| e.downcast_ref::<CliError>()),
            Err(Some(CliError::ConfigNotFound(_)))
        ));
    }

    #[test]
    fn test_load_rejects_invalid_file() -> TestResult {
        let dir = TempDir::new()?;
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "base_frequency_hz: 5\n")?;

        let err = load(&path);
        assert!(matches!(
            err.as_ref().map_err(|e| e.downcast_ref::<CliError>()),
            Err(Some(CliError::InvalidConfiguration(_)))
        ));
        Ok(())
    }

    #[test]
    fn test_resolve_file_then_overrides() -> TestResult {
        let dir = TempDir::new()?;
        let path = dir.path().join("shaker.json");
        let mut stored = ShakerConfig::default();
        stored.gear_shift.frequency_hz = 55;
        stored.save(&path)?;

        let config = resolve(Some(&path), &[pair("gear_shift_dur", "250")])?;
        assert_eq!(config.gear_shift.frequency_hz, 55);
        assert_eq!(config.gear_shift.duration_ms, 250);
        Ok(())
    }
}
