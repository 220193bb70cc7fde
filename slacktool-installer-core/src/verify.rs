use crate::error::InstallError;
use crate::version::BuildIdentity;
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// Marker the installed tool prints ahead of its version tag.
pub const VERSION_MARKER: &str = "slack-tool version";

/// Which identity literals actually landed in the artifact's constant pool.
/// An override whose symbol name no longer matches the target source is
/// dropped by the linker without a diagnostic; scanning the bytes is how
/// that drift gets noticed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedStamps {
    pub version: bool,
    pub commit: bool,
    pub date: bool,
}

pub fn scan_embedded(data: &[u8], identity: &BuildIdentity) -> EmbeddedStamps {
    let found = |needle: &str| twoway::find_bytes(data, needle.as_bytes()).is_some();
    EmbeddedStamps {
        version: found(&identity.version_tag),
        commit: found(&identity.commit_hash),
        date: found(&identity.build_timestamp),
    }
}

/// Check `--version` output for the marker followed by the exact tag.
/// Trailing detail lines (commit, build date) are allowed but not required;
/// only the tag is contractually observable.
pub fn check_version_output(output: &str, version_tag: &str) -> bool {
    for line in output.lines() {
        if let Some(idx) = line.find(VERSION_MARKER) {
            let rest = line[idx + VERSION_MARKER.len()..].trim_start();
            if let Some(tail) = rest.strip_prefix(version_tag) {
                // Guard the boundary so v0.2.1 does not accept v0.2.10.
                let boundary = tail
                    .chars()
                    .next()
                    .map_or(true, |c| !c.is_ascii_alphanumeric() && c != '.');
                if boundary {
                    return true;
                }
            }
        }
    }
    false
}

/// Invoke the installed artifact's version command and validate the
/// reported string. Returns the raw output on success.
pub fn run_version_check(artifact: &Path, version_tag: &str) -> Result<String, InstallError> {
    let output = Command::new(artifact)
        .arg("--version")
        .output()
        .map_err(InstallError::ArtifactSpawn)?;
    if !output.status.success() {
        return Err(InstallError::VersionExit {
            status: output.status,
        });
    }
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !check_version_output(&stdout, version_tag) {
        return Err(InstallError::VersionMismatch {
            marker: VERSION_MARKER,
            tag: version_tag.to_string(),
            output: stdout,
        });
    }
    Ok(stdout)
}

/// Post-install check: confirm the stamped identity is present in the
/// binary, then confirm the version command reports it. A missing version
/// tag fails the install; missing commit/date literals only warn, since the
/// tag is the sole contractual output.
pub fn verify_artifact(artifact: &Path, identity: &BuildIdentity) -> Result<(), InstallError> {
    let data = fs::read(artifact).map_err(|e| InstallError::ArtifactRead {
        path: artifact.to_path_buf(),
        source: e,
    })?;
    let stamps = scan_embedded(&data, identity);
    if !stamps.version {
        return Err(InstallError::TagNotEmbedded {
            tag: identity.version_tag.clone(),
            path: artifact.to_path_buf(),
        });
    }
    if !stamps.commit {
        warn!(
            "commit hash {} not found in artifact; commit override symbol may have drifted",
            identity.commit_hash
        );
    }
    if !stamps.date {
        warn!(
            "build timestamp {} not found in artifact; date override symbol may have drifted",
            identity.build_timestamp
        );
    }

    let reported = run_version_check(artifact, &identity.version_tag)?;
    info!(
        "verified {}: reports {}",
        artifact.display(),
        reported.lines().next().unwrap_or_default()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exact_version_line() {
        assert!(check_version_output(
            "slack-tool version v0.2.1\n",
            "v0.2.1"
        ));
    }

    #[test]
    fn accepts_trailing_detail_lines() {
        let out = "slack-tool version v0.2.1\ncommit: a1b2c3d\nbuilt: 2024-01-15_10:30:00\n";
        assert!(check_version_output(out, "v0.2.1"));
    }

    #[test]
    fn rejects_mismatched_tag() {
        assert!(!check_version_output(
            "slack-tool version v0.2.2\n",
            "v0.2.1"
        ));
    }

    #[test]
    fn rejects_longer_tag_sharing_a_prefix() {
        assert!(!check_version_output(
            "slack-tool version v0.2.10\n",
            "v0.2.1"
        ));
    }

    #[test]
    fn rejects_missing_marker() {
        assert!(!check_version_output("v0.2.1\n", "v0.2.1"));
        assert!(!check_version_output("some-other-tool version v0.2.1\n", "v0.2.1"));
    }

    #[test]
    fn scan_reports_each_literal_independently() {
        let identity = BuildIdentity {
            version_tag: "v0.2.1".into(),
            commit_hash: "a1b2c3d".into(),
            build_timestamp: "2024-01-15_10:30:00".into(),
        };
        let mut blob = Vec::new();
        blob.extend_from_slice(b"\x7fELF\x00\x00padding ");
        blob.extend_from_slice(b"v0.2.1\x00more bytes\x00a1b2c3d\x00");
        let stamps = scan_embedded(&blob, &identity);
        assert!(stamps.version);
        assert!(stamps.commit);
        assert!(!stamps.date);

        blob.extend_from_slice(b"2024-01-15_10:30:00");
        let stamps = scan_embedded(&blob, &identity);
        assert!(stamps.date);
    }
}
