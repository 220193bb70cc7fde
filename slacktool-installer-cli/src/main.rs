use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use slacktool_installer_core::{
    perform_install, resolve_build_identity, run_version_check, version_tag, FormulaManifest,
    GitCommitResolver, InstallPlan, SettingsStore, SystemClock, MANIFEST_FILE,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "slacktool-installer",
    version,
    about = "Builds and installs the slack-tool CLI with stamped build metadata"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the tool from a source tree and install it into a bin directory
    Install {
        /// Extracted source tree (a git checkout when available)
        #[arg(long, default_value = ".")]
        source: PathBuf,
        /// Directory the finished binary is written to; must already exist
        #[arg(long)]
        bin_dir: PathBuf,
        /// Formula manifest path; defaults to formula.toml inside the source tree
        #[arg(long)]
        formula: Option<PathBuf>,
        /// Override the declared release version from the manifest
        #[arg(long)]
        tag_version: Option<String>,
    },
    /// Print the build identity that would be stamped, without compiling
    Resolve {
        #[arg(long, default_value = ".")]
        source: PathBuf,
        #[arg(long)]
        formula: Option<PathBuf>,
        #[arg(long)]
        tag_version: Option<String>,
    },
    /// Re-run the post-install version check against an installed binary
    Verify {
        /// Path to the installed artifact
        #[arg(long)]
        artifact: PathBuf,
        /// Expected declared version, with or without the v prefix
        #[arg(long)]
        tag_version: String,
    },
    /// Show or update installer settings
    Config {
        /// Set the Go toolchain path; pass an empty string to go back to
        /// PATH lookup
        #[arg(long)]
        go_binary: Option<String>,
    },
}

fn load_manifest(
    source: &Path,
    formula: Option<&Path>,
    tag_version: Option<String>,
) -> Result<FormulaManifest> {
    let path = formula
        .map(Path::to_path_buf)
        .unwrap_or_else(|| source.join(MANIFEST_FILE));
    let mut manifest = FormulaManifest::load(&path)
        .with_context(|| format!("loading formula manifest {}", path.display()))?;
    if let Some(version) = tag_version {
        manifest.version = version;
    }
    Ok(manifest)
}

fn main() -> Result<()> {
    slacktool_installer_core::init_logging();
    info!(
        "slacktool-installer {} ({})",
        env!("CARGO_PKG_VERSION"),
        option_env!("INSTALLER_GIT_HASH").unwrap_or("unknown")
    );

    let cli = Cli::parse();
    match cli.command {
        Commands::Install {
            source,
            bin_dir,
            formula,
            tag_version,
        } => {
            let manifest = load_manifest(&source, formula.as_deref(), tag_version)?;
            let settings = SettingsStore::new()?.load()?;
            let plan = InstallPlan {
                source_dir: source,
                bin_dir,
            };
            let identity = perform_install(&plan, &manifest, &settings, |msg, pct| {
                println!("[{pct:>3}%] {msg}");
            })?;
            println!(
                "{} {} installed (commit {}, built {})",
                manifest.name,
                identity.version_tag,
                identity.commit_hash,
                identity.build_timestamp
            );
        }
        Commands::Resolve {
            source,
            formula,
            tag_version,
        } => {
            let manifest = load_manifest(&source, formula.as_deref(), tag_version)?;
            let identity = resolve_build_identity(
                &manifest.version,
                &source,
                &GitCommitResolver,
                &SystemClock,
            );
            println!("version: {}", identity.version_tag);
            println!("commit:  {}", identity.commit_hash);
            println!("built:   {}", identity.build_timestamp);
        }
        Commands::Verify {
            artifact,
            tag_version,
        } => {
            let output = run_version_check(&artifact, &version_tag(&tag_version))
                .with_context(|| format!("verifying {}", artifact.display()))?;
            print!("{output}");
        }
        Commands::Config { go_binary } => {
            let store = SettingsStore::new()?;
            let mut settings = store.load()?;
            if let Some(path) = go_binary {
                settings.go_binary = if path.is_empty() { None } else { Some(path) };
                store.save(&settings)?;
            }
            match &settings.go_binary {
                Some(path) => println!("go_binary: {path}"),
                None => println!("go_binary: (PATH lookup)"),
            }
            for (key, value) in &settings.build_env {
                println!("build_env.{key} = {value}");
            }
        }
    }
    Ok(())
}
