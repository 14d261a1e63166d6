//! Sample configuration generation.

use std::io::Write;
use std::path::Path;

use mart_market::MarketConfig;
use mart_token::UsdAmount;

use crate::error::CliError;
use crate::output::{Message, OutputFormat};
use crate::session::DEFAULT_STATE_DIR;

/// Writes a sample config file.
pub struct InitConfigCommand;

impl InitConfigCommand {
    /// The config written by `init-config`.
    #[must_use]
    pub fn sample() -> MarketConfig {
        let mut config = MarketConfig {
            state_dir: Some(DEFAULT_STATE_DIR.into()),
            ..MarketConfig::default()
        };
        config.oracle.usd_per_native = Some(UsdAmount::from_dollars(2000));
        config
    }

    /// Write the sample config to `output`.
    pub fn execute<W: Write>(
        writer: &mut W,
        format: &OutputFormat,
        output: &Path,
        force: bool,
    ) -> Result<(), CliError> {
        if output.exists() && !force {
            return Err(CliError::Config(format!(
                "{} already exists; pass --force to overwrite",
                output.display()
            )));
        }
        Self::sample().save(output)?;
        format.write(
            writer,
            &Message::success(format!("Config written to {}", output.display())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_loadable_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stablemart.toml");
        InitConfigCommand::execute(&mut Vec::new(), &OutputFormat::default(), &path, false)
            .expect("init");

        let config = MarketConfig::from_file(&path).expect("load");
        assert_eq!(config, InitConfigCommand::sample());
    }

    #[test]
    fn refuses_to_overwrite() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let err = InitConfigCommand::execute(&mut Vec::new(), &OutputFormat::default(), file.path(), false)
            .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
