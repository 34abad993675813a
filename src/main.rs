use clap::Parser;
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use microcredit_dapp::{
    client,
    config::{
        AppConfig,
        Args,
    },
};
use std::{
    fs,
    sync::OnceLock,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// The terminal belongs to the UI, so logs go to a daily file.
fn init_tracing(config: &AppConfig) -> Result<()> {
    fs::create_dir_all(&config.log_dir).wrap_err_with(|| {
        format!("Failed to create log directory {}", config.log_dir.display())
    })?;
    let appender = rolling::daily(&config.log_dir, "microcredit-dapp.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    let filter = EnvFilter::try_new(&config.log_filter)
        .wrap_err_with(|| format!("Invalid log filter: {}", config.log_filter))?;
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let config = AppConfig::from_args(args)?;
    init_tracing(&config)?;
    tracing::info!(platform = %config.platform.address, "starting microcredit-dapp");
    client::run_app(config).await
}
