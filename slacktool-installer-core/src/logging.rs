use directories::ProjectDirs;
use once_cell::sync::OnceCell;
use std::fs;
use std::path::PathBuf;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: OnceCell<()> = OnceCell::new();
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

fn log_dir() -> PathBuf {
    ProjectDirs::from("com", "shellme", "slacktool-installer")
        .map(|dirs| dirs.cache_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Console plus daily-rolling file output. Safe to call more than once;
/// only the first call installs the subscriber.
pub fn init_logging() {
    let _ = INIT.get_or_init(|| {
        let dir = log_dir();
        let _ = fs::create_dir_all(&dir);
        let file_appender = rolling::daily(&dir, "slacktool-installer.log");
        let (nb_file, guard) = tracing_appender::non_blocking(file_appender);
        let _ = FILE_GUARD.set(guard); // keep guard alive for program lifetime

        let console_layer = fmt::layer().with_target(false);
        let file_layer = fmt::layer()
            .with_writer(nb_file)
            .with_target(false)
            .with_ansi(false);

        let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::registry()
            .with(env)
            .with(console_layer)
            .with(file_layer)
            .init();
    });
}
