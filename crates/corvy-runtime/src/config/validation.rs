//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, CorvyConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &CorvyConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates the bot connection settings.
fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    if bot.api_token.trim().is_empty() {
        return Err(ConfigError::missing_field("bot.api_token"));
    }

    validate_url(&bot.api_base_url, &["http://", "https://"])?;

    if bot.poll_interval_ms == 0 {
        return Err(ConfigError::validation(
            "Poll interval must be greater than 0",
        ));
    }

    if bot.failure_backoff_ms == 0 {
        return Err(ConfigError::validation(
            "Failure backoff must be greater than 0",
        ));
    }

    if bot.request_timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Request timeout must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

/// Validates a URL format.
fn validate_url(url: &str, allowed_schemes: &[&str]) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::invalid_url(url, "URL cannot be empty"));
    }

    let Some(rest) = allowed_schemes
        .iter()
        .find_map(|scheme| url.strip_prefix(scheme))
    else {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {}", allowed_schemes.join(", ")),
        ));
    };

    if rest.is_empty() || rest.starts_with('/') {
        return Err(ConfigError::invalid_url(url, "URL has no host"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> CorvyConfig {
        CorvyConfig {
            bot: BotConfig {
                api_token: "token".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_token() {
        let mut config = valid_config();
        config.bot.api_token = "  ".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { ref field }) if field == "bot.api_token"
        ));
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = valid_config();
        for url in ["", "corvy.chat/api", "ftp://corvy.chat", "https://"] {
            config.bot.api_base_url = url.into();
            assert!(
                matches!(validate_config(&config), Err(ConfigError::InvalidUrl { .. })),
                "{url}"
            );
        }

        config.bot.api_base_url = "http://localhost:8080/api/v2".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_intervals() {
        let mut config = valid_config();
        config.bot.poll_interval_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.bot.failure_backoff_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.bot.request_timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = valid_config();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.logging.file_path = Some("logs/corvy.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
