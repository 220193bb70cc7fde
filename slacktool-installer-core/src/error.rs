use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Fatal install failures. These abort the whole install and are never
/// retried: a bad path or a compile error is deterministic, not transient.
///
/// Commit-hash lookup failures are deliberately absent: the resolver
/// degrades to a placeholder and the build continues.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("output directory does not exist: {}", .0.display())]
    OutputDirMissing(PathBuf),

    #[error("entry point not found in source tree: {}", .0.display())]
    EntryPointMissing(PathBuf),

    #[error("go toolchain not found on PATH (set go_binary in settings to override)")]
    ToolchainMissing(#[source] which::Error),

    #[error("failed to run {tool}")]
    ToolchainSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// Toolchain diagnostics are surfaced verbatim to the operator.
    #[error("go build failed ({status}):\n{stderr}")]
    Compile { status: ExitStatus, stderr: String },

    #[error("failed to read installed artifact {}", .path.display())]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run installed artifact")]
    ArtifactSpawn(#[source] std::io::Error),

    #[error("version command exited with {status}")]
    VersionExit { status: ExitStatus },

    #[error("version check failed: expected `{marker} {tag}` in output:\n{output}")]
    VersionMismatch {
        marker: &'static str,
        tag: String,
        output: String,
    },

    #[error("version tag {} was not embedded in {} (override symbol may not match the target source)", .tag, .path.display())]
    TagNotEmbedded { tag: String, path: PathBuf },
}
