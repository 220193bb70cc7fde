use crate::compile::{compile, BuildRequest};
use crate::formula::FormulaManifest;
use crate::ldflags::SymbolTable;
use crate::settings::InstallerSettings;
use crate::verify::verify_artifact;
use crate::version::{
    resolve_build_identity, BuildIdentity, Clock, CommitResolver, GitCommitResolver, SystemClock,
};
use anyhow::{Context, Result};
use humansize::{format_size, DECIMAL};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Where to build from and where the finished binary lands.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    pub source_dir: PathBuf,
    pub bin_dir: PathBuf,
}

impl InstallPlan {
    pub fn artifact_path(&self, manifest: &FormulaManifest) -> PathBuf {
        manifest.artifact_path(&self.bin_dir)
    }
}

/// Run the whole pipeline with the real clock and git lookup.
pub fn perform_install(
    plan: &InstallPlan,
    manifest: &FormulaManifest,
    settings: &InstallerSettings,
    progress_cb: impl FnMut(&str, u8),
) -> Result<BuildIdentity> {
    perform_install_with(
        plan,
        manifest,
        settings,
        &GitCommitResolver,
        &SystemClock,
        progress_cb,
    )
}

/// Resolve identity, compile with overrides, verify the installed artifact.
/// Strictly sequential; each step completes before the next begins, and any
/// fatal error aborts the install with no retry and no rollback.
pub fn perform_install_with(
    plan: &InstallPlan,
    manifest: &FormulaManifest,
    settings: &InstallerSettings,
    commits: &dyn CommitResolver,
    clock: &dyn Clock,
    mut progress_cb: impl FnMut(&str, u8),
) -> Result<BuildIdentity> {
    let mut progress = |m: &str, pct: u8| {
        info!("{}", m);
        progress_cb(m, pct);
    };
    progress(
        &format!("Installing {} {}", manifest.name, manifest.version),
        0,
    );

    // 1. Resolve the identity to stamp
    progress("Resolving build identity", 10);
    let identity = resolve_build_identity(&manifest.version, &plan.source_dir, commits, clock);
    info!(
        "identity: {} commit {} built {}",
        identity.version_tag, identity.commit_hash, identity.build_timestamp
    );

    // 2. Compile with the overrides baked in
    progress("Compiling", 30);
    let request = BuildRequest {
        source_dir: plan.source_dir.clone(),
        entry_point: manifest.entry_point.clone(),
        output_path: plan.artifact_path(manifest),
        symbols: SymbolTable::for_package(&manifest.version_package),
    };
    compile(&request, &identity, settings)
        .with_context(|| format!("building {}", manifest.name))?;

    // 3. Post-install check
    progress("Verifying installed artifact", 80);
    verify_artifact(&request.output_path, &identity)
        .with_context(|| format!("verifying {}", request.output_path.display()))?;

    if let Ok(meta) = fs::metadata(&request.output_path) {
        info!(
            "installed {} ({})",
            request.output_path.display(),
            format_size(meta.len(), DECIMAL)
        );
    }
    progress("Install complete", 100);
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InstallError;
    use crate::version::UNKNOWN_COMMIT;
    use chrono::{TimeZone, Utc};
    use std::path::Path;

    struct NoRepo;

    impl CommitResolver for NoRepo {
        fn short_head(&self, _source_dir: &Path) -> Option<String> {
            None
        }
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn now_utc(&self) -> chrono::DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
        }
    }

    // The commit lookup failing must not abort the pipeline: it has to get
    // all the way to the compile preflight, which then fails on the bogus
    // bin dir rather than on the missing checkout.
    #[test]
    fn missing_checkout_still_reaches_compile_preflight() {
        let plan = InstallPlan {
            source_dir: std::env::temp_dir(),
            bin_dir: PathBuf::from("/no/such/bin/dir"),
        };
        let manifest = FormulaManifest::default();
        let err = perform_install_with(
            &plan,
            &manifest,
            &InstallerSettings::default(),
            &NoRepo,
            &FixedClock,
            |_m, _pct| {},
        )
        .unwrap_err();
        let install_err = err.downcast_ref::<InstallError>().unwrap();
        assert!(matches!(install_err, InstallError::OutputDirMissing(_)));
    }

    #[test]
    fn progress_runs_from_zero_to_failure_point() {
        let plan = InstallPlan {
            source_dir: std::env::temp_dir(),
            bin_dir: PathBuf::from("/no/such/bin/dir"),
        };
        let manifest = FormulaManifest::default();
        let mut seen: Vec<u8> = Vec::new();
        let _ = perform_install_with(
            &plan,
            &manifest,
            &InstallerSettings::default(),
            &NoRepo,
            &FixedClock,
            |_m, pct| seen.push(pct),
        );
        assert_eq!(seen, vec![0, 10, 30]);
    }

    #[test]
    fn degraded_identity_is_complete() {
        let identity =
            resolve_build_identity("0.2.1", Path::new("/nowhere"), &NoRepo, &FixedClock);
        assert_eq!(identity.version_tag, "v0.2.1");
        assert_eq!(identity.commit_hash, UNKNOWN_COMMIT);
        assert_eq!(identity.build_timestamp, "2024-01-15_10:30:00");
    }
}
