use crate::config::types::{ClassifierConfig, Config, FetchConfig, SinkConfig, SinkKind};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_classifier_config(&config.classifier)?;
    validate_sink_config(&config.sink)?;
    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs == 0 || config.request_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be between 1 and 300, got {}",
            config.request_timeout_secs
        )));
    }

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 32 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-fetches must be between 1 and 32, got {}",
            config.max_concurrent_fetches
        )));
    }

    Ok(())
}

/// Validates classifier configuration
fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid classifier endpoint: {}", e)))?;

    if config.model.is_empty() {
        return Err(ConfigError::Validation(
            "classifier model cannot be empty".to_string(),
        ));
    }

    if config.api_key_env.is_empty() {
        return Err(ConfigError::Validation(
            "api-key-env cannot be empty".to_string(),
        ));
    }

    if config.max_output_tokens == 0 {
        return Err(ConfigError::Validation(
            "max-output-tokens must be >= 1".to_string(),
        ));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates sink configuration
fn validate_sink_config(config: &SinkConfig) -> Result<(), ConfigError> {
    match config.kind {
        SinkKind::Local => {
            match &config.folder_path {
                Some(path) if !path.is_empty() => {}
                _ => {
                    return Err(ConfigError::Validation(
                        "folder-path is required for the local sink".to_string(),
                    ))
                }
            };
        }
        SinkKind::ObjectStorage => {
            let account_url = config.account_url.as_deref().ok_or_else(|| {
                ConfigError::Validation(
                    "account-url is required for the object-storage sink".to_string(),
                )
            })?;

            Url::parse(account_url)
                .map_err(|e| ConfigError::InvalidUrl(format!("Invalid account-url: {}", e)))?;

            if config.sas_token_env.is_empty() {
                return Err(ConfigError::Validation(
                    "sas-token-env cannot be empty".to_string(),
                ));
            }
        }
    }

    Ok(())
}
