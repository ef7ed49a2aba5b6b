use crate::config::types::{
    BrowserSettings, Config, OutputConfig, RunConfig, SiteConfig, TranslateConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_browser_settings(&config.browser)?;
    validate_run_config(&config.run)?;
    validate_output_config(&config.output)?;
    validate_translate_config(&config.translate)?;
    Ok(())
}

/// Validates the target site addresses
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = validate_http_url("base_url", &config.base_url)?;

    base.join(&config.listing_path).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid listing_path '{}': {}",
            config.listing_path, e
        ))
    })?;

    Ok(())
}

/// Validates browser timing settings
fn validate_browser_settings(config: &BrowserSettings) -> Result<(), ConfigError> {
    if config.selector_timeout_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "selector_timeout_seconds must be >= 1, got {}",
            config.selector_timeout_seconds
        )));
    }

    if let Some(path) = &config.chrome_executable {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "chrome_executable cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates the page range and retry policy
fn validate_run_config(config: &RunConfig) -> Result<(), ConfigError> {
    if config.start_page < 1 {
        return Err(ConfigError::Validation(format!(
            "start_page must be >= 1, got {}",
            config.start_page
        )));
    }

    if config.end_page < config.start_page {
        return Err(ConfigError::Validation(format!(
            "end_page ({}) must be >= start_page ({})",
            config.end_page, config.start_page
        )));
    }

    for (name, value) in [
        ("max_attempts", config.max_attempts),
        ("error_budget", config.error_budget),
        ("navigation_retries", config.navigation_retries),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.workbook_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "workbook_path cannot be empty".to_string(),
        ));
    }

    if config.workbook_path.file_stem().is_none() {
        return Err(ConfigError::Validation(format!(
            "workbook_path '{}' must name a file",
            config.workbook_path.display()
        )));
    }

    Ok(())
}

/// Validates translation service settings
fn validate_translate_config(config: &TranslateConfig) -> Result<(), ConfigError> {
    validate_http_url("api_url", &config.api_url)?;

    if config.api_key_env.is_empty() {
        return Err(ConfigError::Validation(
            "api_key_env cannot be empty".to_string(),
        ));
    }

    if config.source.is_empty() || config.target.is_empty() {
        return Err(ConfigError::Validation(
            "translation source and target languages cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Parses `value` and requires an http(s) scheme
fn validate_http_url(name: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use HTTP or HTTPS scheme",
            name, value
        )));
    }

    Ok(url)
}
