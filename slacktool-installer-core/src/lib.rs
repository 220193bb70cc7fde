pub mod compile;
pub mod error;
pub mod formula;
pub mod install;
pub mod ldflags;
pub mod logging;
pub mod settings;
pub mod verify;
pub mod version;

pub use compile::{compile, locate_toolchain, BuildRequest};
pub use error::InstallError;
pub use formula::{FormulaManifest, MANIFEST_FILE};
pub use install::{perform_install, perform_install_with, InstallPlan};
pub use ldflags::{build_ldflags, SymbolOverride, SymbolTable};
pub use logging::init_logging;
pub use settings::{InstallerSettings, SettingsStore};
pub use verify::{
    check_version_output, run_version_check, scan_embedded, verify_artifact, EmbeddedStamps,
    VERSION_MARKER,
};
pub use version::{
    resolve_build_identity, version_tag, BuildIdentity, Clock, CommitResolver, GitCommitResolver,
    SystemClock, UNKNOWN_COMMIT,
};
