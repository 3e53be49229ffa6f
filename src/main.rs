use anyhow::Result;
use remove_bg_rust::{config, server};
use tracing::info;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

fn validate_log_level(level: &str) -> Result<()> {
    level.parse::<LevelFilter>().map_err(|_| {
        anyhow::anyhow!(
            "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
            level
        )
    })?;
    Ok(())
}

/// JSON logs; `RUST_LOG` wins over the configured level.
fn init_tracing(config_level: &str) -> Result<String> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config_level.to_string());
    validate_log_level(&log_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .json()
        .init();

    Ok(log_level)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging is not up yet, so config errors go to stderr
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let log_level = match init_tracing(&config.server.logs.level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Remove BG server starting (log level: {}, model: {})",
        log_level, config.model.name
    );

    server::run(config).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_log_level() {
        assert!(validate_log_level("debug").is_ok());
        assert!(validate_log_level("WARN").is_ok());

        let err = validate_log_level("chatty").unwrap_err();
        assert!(err.to_string().contains("Valid levels"));
    }
}
