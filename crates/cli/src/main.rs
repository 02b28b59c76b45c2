mod config_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    fieldex_config::{FieldexConfig, TOKEN_ENV, validate},
    fieldex_sessions::{Session, SessionStore},
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "fieldex",
    version,
    about = "Telegram bot that extracts one field from every line of a text file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./fieldex.toml and the user config dir).
    #[arg(long, global = true, env = "FIELDEX_CONFIG")]
    config: Option<PathBuf>,

    /// Telegram bot token (overrides the config file).
    #[arg(long, global = true, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (default when no subcommand is provided).
    Run,
    /// Validate the configuration and report errors/warnings.
    Check,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    let loaded = config_commands::resolve(cli.config.as_deref(), cli.token.clone())?;

    match cli.command {
        None | Some(Commands::Run) => {
            info!(version = env!("CARGO_PKG_VERSION"), "fieldex starting");
            run(loaded.config).await
        },
        Some(Commands::Check) => config_commands::check(&loaded),
    }
}

async fn run(config: FieldexConfig) -> anyhow::Result<()> {
    let report = validate(&config);
    for d in report.warnings() {
        warn!(path = d.path, "config: {}", d.message);
    }
    if report.has_errors() {
        let errors: Vec<String> = report.errors().map(ToString::to_string).collect();
        anyhow::bail!("invalid configuration:\n  {}", errors.join("\n  "));
    }

    std::fs::create_dir_all(&config.files.temp_dir).with_context(|| {
        format!(
            "failed to create temp directory {}",
            config.files.temp_dir.display()
        )
    })?;

    let defaults = Session::new(config.defaults.field_index, &config.defaults.delimiter)?;
    info!(
        field_index = defaults.field_index,
        delimiter = %defaults.delimiter,
        temp_dir = %config.files.temp_dir.display(),
        max_file_bytes = config.files.max_file_bytes,
        "session defaults loaded"
    );
    let sessions = Arc::new(SessionStore::new(defaults));

    let polling = fieldex_telegram::start_polling(&config, sessions).await?;
    info!("bot is running, press Ctrl-C to stop");

    let conflict = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "failed to listen for Ctrl-C");
            }
            info!("shutdown requested");
            false
        },
        () = polling.stopped() => true,
    };

    polling.shutdown().await;
    info!("fieldex stopped");

    if conflict {
        anyhow::bail!("polling stopped: another bot instance is running with this token");
    }
    Ok(())
}
