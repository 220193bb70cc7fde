use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};

/// Operator-level overrides. The pipeline itself is not configurable
/// (strip flags and the override set are fixed policy); these only adjust
/// the host environment the toolchain runs in.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InstallerSettings {
    /// Absolute path to a `go` binary. When unset the toolchain is located
    /// on PATH.
    pub go_binary: Option<String>,
    /// Extra environment for the compile step (GOFLAGS, GOCACHE, ...).
    #[serde(default)]
    pub build_env: BTreeMap<String, String>,
}

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("com", "shellme", "slacktool-installer")
            .ok_or_else(|| anyhow::anyhow!("project dirs"))?;
        let dir = dirs.config_dir();
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join("settings.toml"),
        })
    }

    pub fn load(&self) -> Result<InstallerSettings> {
        if !self.path.exists() {
            return Ok(InstallerSettings::default());
        }
        let text = fs::read_to_string(&self.path)?;
        let settings: InstallerSettings = toml::from_str(&text)?;
        Ok(settings)
    }

    pub fn save(&self, settings: &InstallerSettings) -> Result<()> {
        let text = toml::to_string_pretty(settings)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_file_yields_defaults() {
        let settings: InstallerSettings = toml::from_str("").unwrap();
        assert!(settings.go_binary.is_none());
        assert!(settings.build_env.is_empty());
    }

    #[test]
    fn parses_toolchain_override_and_env() {
        let raw = r#"
        go_binary = "/opt/go/bin/go"

        [build_env]
        GOFLAGS = "-mod=vendor"
        "#;
        let settings: InstallerSettings = toml::from_str(raw).unwrap();
        assert_eq!(settings.go_binary.as_deref(), Some("/opt/go/bin/go"));
        assert_eq!(
            settings.build_env.get("GOFLAGS").map(String::as_str),
            Some("-mod=vendor")
        );
    }
}
