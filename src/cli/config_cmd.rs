//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::duration::Duration;
use crate::domain::error::ConfigError;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => {
            presenter.output(&store.path().to_string_lossy());
            Ok(())
        }
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;
    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let config = store.load().await?;
    presenter.output(read_value(&config, key).as_deref().unwrap_or(NOT_SET));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, read_value(&config, key).as_deref().unwrap_or(NOT_SET));
    }
    Ok(())
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "api_url" => config.api_url = Some(parse_api_url(value).map_err(|m| invalid(key, m))?),
        "poll_interval" => {
            parse_duration(value).map_err(|m| invalid(key, m))?;
            config.poll_interval = Some(value.to_string());
        }
        "request_timeout" => {
            parse_duration(value).map_err(|m| invalid(key, m))?;
            config.request_timeout = Some(value.to_string());
        }
        "max_poll_failures" => {
            config.max_poll_failures = Some(parse_positive(value).map_err(|m| invalid(key, m))?)
        }
        "notify" => {
            config.notify = Some(
                parse_bool(value).ok_or_else(|| invalid(key, "Value must be 'true' or 'false'"))?,
            )
        }
        "output_dir" => config.output_dir = Some(value.to_string()),
        _ => return Err(invalid(key, "Unknown key")),
    }
    Ok(())
}

fn read_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "api_url" => config.api_url.clone(),
        "poll_interval" => config.poll_interval.clone(),
        "max_poll_failures" => config.max_poll_failures.map(|n| n.to_string()),
        "request_timeout" => config.request_timeout.clone(),
        "notify" => config.notify.map(|b| b.to_string()),
        "output_dir" => config.output_dir.clone(),
        _ => None,
    }
}

/// Accept absolute http(s) URLs only; a trailing slash is dropped
pub fn parse_api_url(value: &str) -> Result<String, String> {
    let url = reqwest::Url::parse(value.trim()).map_err(|e| format!("Invalid URL: {}", e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!(
            "Unsupported scheme '{}'. Use http or https",
            url.scheme()
        ));
    }
    if url.host_str().is_none() {
        return Err("URL has no host".to_string());
    }
    Ok(value.trim().trim_end_matches('/').to_string())
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    value.parse::<Duration>().map_err(|e| e.to_string())
}

fn parse_positive(value: &str) -> Result<u32, String> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("Invalid value '{}'. Expected a positive integer", value)),
    }
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
