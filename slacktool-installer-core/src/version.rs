use chrono::{DateTime, Utc};
use std::path::Path;
use std::process::Command;
use tracing::warn;

/// Placeholder stamped when the checkout has no resolvable HEAD. Matches the
/// default the tool compiles in for unstamped fields, so a degraded build
/// reads the same as an unstamped one.
pub const UNKNOWN_COMMIT: &str = "unknown";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Identity baked into the artifact: computed once per install, immutable,
/// never persisted anywhere but the binary's constant pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildIdentity {
    pub version_tag: String,
    pub commit_hash: String,
    pub build_timestamp: String,
}

/// Clock seam so timestamp formatting is testable without the system clock.
pub trait Clock {
    fn now_utc(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Commit lookup seam; the real implementation shells out to git.
pub trait CommitResolver {
    /// Short hash of the checkout HEAD, or None when it cannot be resolved.
    fn short_head(&self, source_dir: &Path) -> Option<String>;
}

pub struct GitCommitResolver;

impl CommitResolver for GitCommitResolver {
    fn short_head(&self, source_dir: &Path) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "--short", "HEAD"])
            .current_dir(source_dir)
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let text = String::from_utf8(output.stdout).ok()?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Prefix the declared version with `v` exactly once.
pub fn version_tag(declared: &str) -> String {
    if declared.starts_with('v') {
        declared.to_string()
    } else {
        format!("v{declared}")
    }
}

/// Derive the identity for this install. Infallible: a missing or broken
/// checkout degrades to [`UNKNOWN_COMMIT`] instead of aborting the build.
/// The timestamp is always UTC so builds agree across host timezones.
pub fn resolve_build_identity(
    declared_version: &str,
    source_dir: &Path,
    commits: &dyn CommitResolver,
    clock: &dyn Clock,
) -> BuildIdentity {
    let commit_hash = commits.short_head(source_dir).unwrap_or_else(|| {
        warn!("could not resolve HEAD commit, stamping \"{UNKNOWN_COMMIT}\"");
        UNKNOWN_COMMIT.to_string()
    });
    BuildIdentity {
        version_tag: version_tag(declared_version),
        commit_hash,
        build_timestamp: clock.now_utc().format(TIMESTAMP_FORMAT).to_string(),
    }
}
