//! `menugen.toml` project settings.
//!
//! ```toml
//! [generator]
//! style = "static"
//! output = "${workspaceFolder}/build/menu.c"
//!
//! [simulator]
//! max_display_char = 16
//! max_display_item = 4
//! menu_select_cursor = "=>"
//! ```
//!
//! Every key is optional. A missing file means defaults everywhere.

use std::{fs, path::Path};

use anyhow::Context;
use menukit::sim::{ConfigNotice, SimulatorConfig};
use serde::{Deserialize, Serialize};

use crate::codegen::GeneratorStyle;

/// Default settings file name, looked up in the working directory.
pub const SETTINGS_FILE: &str = "menugen.toml";

/// Code generator options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub style: GeneratorStyle,
    /// Output path; may contain `${workspaceFolder}` and `${env:VAR}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Contents of `menugen.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub generator: GeneratorSettings,
    pub simulator: SimulatorConfig,
}

impl Settings {
    /// Parses settings and corrects invalid simulator markers.
    ///
    /// # Errors
    ///
    /// Returns an error if `s` is not valid TOML or has mistyped keys.
    pub fn from_toml_str(s: &str) -> anyhow::Result<(Self, Vec<ConfigNotice>)> {
        let mut settings: Settings = toml::from_str(s)?;
        let notices = settings.simulator.validate();
        Ok((settings, notices))
    }

    /// Loads `path`, or defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<(Self, Vec<ConfigNotice>)> {
        if !path.exists() {
            debug!("{} not found, using defaults", path.display());
            return Ok((Self::default(), Vec::new()));
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("can not open settings file: {}", path.display()))?;
        let loaded = Self::from_toml_str(&content)
            .with_context(|| format!("invalid settings file: {}", path.display()))?;
        info!("loaded settings from {}", path.display());
        Ok(loaded)
    }

    /// Writes the settings as pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, toml::to_string_pretty(self)?)
            .with_context(|| format!("can not write settings file: {}", path.display()))?;
        info!("saved settings to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let (settings, notices) = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(notices.is_empty());
    }

    #[test]
    fn test_partial_tables() {
        let (settings, notices) = Settings::from_toml_str(
            r#"
[generator]
style = "static"

[simulator]
max_display_item = 4
menu_select_cursor = ">"
"#,
        )
        .unwrap();
        assert_eq!(settings.generator.style, GeneratorStyle::Static);
        assert_eq!(settings.generator.output, None);
        assert_eq!(settings.simulator.max_display_item, 4);
        assert_eq!(settings.simulator.max_display_char, 20);
        assert_eq!(settings.simulator.menu_select_cursor, "->");
        assert_eq!(notices.len(), 1);
    }

    #[test]
    fn test_unknown_style_is_error() {
        assert!(Settings::from_toml_str("[generator]\nstyle = \"fancy\"").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        let (missing, _) = Settings::load(&path).unwrap();
        assert_eq!(missing, Settings::default());

        let mut settings = Settings::default();
        settings.generator.style = GeneratorStyle::Static;
        settings.generator.output = Some("out/menu.c".into());
        settings.simulator.max_display_char = 12;
        settings.save(&path).unwrap();

        let (loaded, notices) = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        assert!(notices.is_empty());
    }
}
