use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default manifest file name, looked up inside the source tree.
pub const MANIFEST_FILE: &str = "formula.toml";

/// Declared packaging metadata for the tool being installed. Fetching and
/// checksum-verifying the source archive is the surrounding package
/// manager's job; by the time this runs, the tree is already on disk and
/// this manifest supplies the declared release version and build paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormulaManifest {
    pub name: String,
    pub desc: String,
    pub homepage: String,
    pub license: String,
    /// Declared release version, with or without the `v` prefix.
    pub version: String,
    /// Go module path of the target source tree.
    pub module: String,
    /// Package sub-path handed to `go build` (the CLI entry point).
    pub entry_point: String,
    /// Import path of the package declaring the `version`/`commit`/`date`
    /// variables the link-time overrides bind to. Pinned explicitly because
    /// it does not always track `entry_point` across source restructures.
    pub version_package: String,
}

impl Default for FormulaManifest {
    fn default() -> Self {
        Self {
            name: "slack-tool".into(),
            desc: "CLI for everyday Slack operations".into(),
            homepage: "https://github.com/shellme/slack-tool".into(),
            license: "MIT".into(),
            version: "0.2.1".into(),
            module: "github.com/shellme/slack-tool".into(),
            entry_point: "./cmd/slack-tool".into(),
            version_package: "github.com/shellme/slack-tool/cmd/slack-tool/cmd".into(),
        }
    }
}

impl FormulaManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let manifest: FormulaManifest =
            toml::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
        Ok(manifest)
    }

    /// Where the finished binary lands for a given bin directory.
    pub fn artifact_path(&self, bin_dir: &Path) -> PathBuf {
        bin_dir.join(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_manifest_toml() {
        let raw = r#"
        name = "slack-tool"
        desc = "CLI for everyday Slack operations"
        homepage = "https://github.com/shellme/slack-tool"
        license = "MIT"
        version = "0.2.1"
        module = "github.com/shellme/slack-tool"
        entry_point = "./cmd/slack-tool"
        version_package = "github.com/shellme/slack-tool/cmd/slack-tool/cmd"
        "#;
        let manifest: FormulaManifest = toml::from_str(raw).unwrap();
        assert_eq!(manifest, FormulaManifest::default());
    }

    #[test]
    fn round_trips_through_toml() {
        let manifest = FormulaManifest::default();
        let text = toml::to_string_pretty(&manifest).unwrap();
        let back: FormulaManifest = toml::from_str(&text).unwrap();
        assert_eq!(back, manifest);
    }

    #[test]
    fn missing_manifest_is_fatal() {
        let err = FormulaManifest::load(Path::new("/no/such/formula.toml")).unwrap_err();
        assert!(err.to_string().contains("formula.toml"));
    }

    #[test]
    fn artifact_path_is_bin_dir_plus_name() {
        let manifest = FormulaManifest::default();
        assert_eq!(
            manifest.artifact_path(Path::new("/usr/local/bin")),
            PathBuf::from("/usr/local/bin/slack-tool")
        );
    }
}
