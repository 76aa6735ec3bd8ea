use anyhow::Result;
use clap::Parser;
use hirechat::cli::{handle_command, HirechatCli};
use hirechat::{EnvironmentConfig, MessagingError};
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{error, info};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", path.display(), e))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(false)
                    .with_span_list(false),
            )
        }
        None => None,
    };
    let stderr_layer = if file_layer.is_none() {
        Some(fmt::layer().with_writer(std::io::stderr).with_target(false))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = HirechatCli::parse();

    let environment = EnvironmentConfig::get_environment();
    let config = EnvironmentConfig::load_from_path(&cli.config, &environment)?;
    init_logging(config.log_file.as_deref())?;

    info!(
        "Loaded configuration for environment: {} from {}",
        config.environment,
        cli.config.display()
    );
    if config.api_url_overridden {
        info!("HIRECHAT_API_URL overrides api_base_url");
    }
    info!("API: {}", config.api_base_url);

    if let Err(e) = handle_command(cli, &config).await {
        match e.downcast_ref::<MessagingError>() {
            Some(err) if err.requires_reauth() => {
                error!("Request rejected with 401");
                eprintln!("❌ {}", err.user_message());
                eprintln!("   Log in again and pass the new token with --token or HIRECHAT_TOKEN.");
                std::process::exit(2);
            }
            Some(err) => {
                error!("{} ({})", err, err.code());
                eprintln!("❌ {}", err.user_message());
                std::process::exit(1);
            }
            None => return Err(e),
        }
    }
    Ok(())
}
