use crate::error::InstallError;
use crate::ldflags::{build_ldflags, SymbolTable};
use crate::settings::InstallerSettings;
use crate::version::BuildIdentity;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Everything one toolchain invocation needs, resolved ahead of time.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Root of the verified, extracted source tree.
    pub source_dir: PathBuf,
    /// Package sub-path handed to `go build`, e.g. `./cmd/slack-tool`.
    pub entry_point: String,
    /// Where the finished binary is written. The parent directory must
    /// already exist.
    pub output_path: PathBuf,
    pub symbols: SymbolTable,
}

/// Locate the `go` binary: explicit settings override first, PATH second.
pub fn locate_toolchain(settings: &InstallerSettings) -> Result<PathBuf, InstallError> {
    if let Some(path) = &settings.go_binary {
        return Ok(PathBuf::from(path));
    }
    which::which("go").map_err(InstallError::ToolchainMissing)
}

// Path checks run before any toolchain work so a bad environment fails
// cleanly with no partial artifact.
fn preflight(request: &BuildRequest) -> Result<(), InstallError> {
    let out_dir = request
        .output_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    if !out_dir.is_dir() {
        return Err(InstallError::OutputDirMissing(out_dir));
    }
    let entry = request
        .source_dir
        .join(request.entry_point.trim_start_matches("./"));
    if !entry.is_dir() {
        return Err(InstallError::EntryPointMissing(entry));
    }
    Ok(())
}

/// Compile the entry point with the identity baked in via `-X` overrides.
///
/// `-trimpath` plus the fixed strip flags match what the formula always
/// passed. Compile failures carry the toolchain's stderr verbatim and are
/// never retried: source errors are deterministic, not transient.
pub fn compile(
    request: &BuildRequest,
    identity: &BuildIdentity,
    settings: &InstallerSettings,
) -> Result<(), InstallError> {
    preflight(request)?;
    let go = locate_toolchain(settings)?;
    let ldflags = build_ldflags(&request.symbols, identity);
    debug!("ldflags: {}", ldflags);

    let mut cmd = Command::new(&go);
    cmd.current_dir(&request.source_dir)
        .arg("build")
        .arg("-trimpath")
        .arg("-ldflags")
        .arg(&ldflags)
        .arg("-o")
        .arg(&request.output_path)
        .arg(&request.entry_point);
    for (key, value) in &settings.build_env {
        cmd.env(key, value);
    }

    info!(
        "compiling {} -> {}",
        request.entry_point,
        request.output_path.display()
    );
    let output = cmd.output().map_err(|e| InstallError::ToolchainSpawn {
        tool: go.display().to_string(),
        source: e,
    })?;
    if !output.status.success() {
        return Err(InstallError::Compile {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> BuildIdentity {
        BuildIdentity {
            version_tag: "v0.2.1".into(),
            commit_hash: "a1b2c3d".into(),
            build_timestamp: "2024-01-15_10:30:00".into(),
        }
    }

    fn request(source_dir: PathBuf, output_path: PathBuf) -> BuildRequest {
        BuildRequest {
            source_dir,
            entry_point: "./cmd/slack-tool".into(),
            output_path,
            symbols: SymbolTable::for_package("example.com/tool/cmd"),
        }
    }

    // Both failures below must trigger before the toolchain is even
    // located, so they hold on hosts with no Go installed.

    #[test]
    fn missing_output_dir_fails_before_compilation() {
        let req = request(
            std::env::temp_dir(),
            PathBuf::from("/no/such/bin/dir/slack-tool"),
        );
        let err = compile(&req, &identity(), &InstallerSettings::default()).unwrap_err();
        assert!(matches!(err, InstallError::OutputDirMissing(_)), "{err}");
        assert!(!req.output_path.exists());
    }

    #[test]
    fn missing_entry_point_fails_before_compilation() {
        let out_dir = std::env::temp_dir();
        let req = request(out_dir.clone(), out_dir.join("slack-tool-compile-test"));
        // temp dir exists but contains no ./cmd/slack-tool
        let err = compile(&req, &identity(), &InstallerSettings::default()).unwrap_err();
        assert!(matches!(err, InstallError::EntryPointMissing(_)), "{err}");
    }

    #[test]
    fn settings_override_wins_over_path_lookup() {
        let settings = InstallerSettings {
            go_binary: Some("/opt/go/bin/go".into()),
            ..Default::default()
        };
        let go = locate_toolchain(&settings).unwrap();
        assert_eq!(go, PathBuf::from("/opt/go/bin/go"));
    }
}
