//! Full configuration validation.
//!
//! Checks numeric ranges and required strings, collecting every problem
//! into a single `ConfigError`.

mod helpers;


use crate::schema::ParleyConfig;
use parley_common::ConfigError;

use helpers::{validate_non_empty, validate_range, validate_range_u64};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ParleyConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_api(&mut errors, config);
    validate_session(&mut errors, config);
    validate_rate_limit(&mut errors, config);
    validate_retry(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_api(errors: &mut Vec<String>, config: &ParleyConfig) {
    validate_non_empty(errors, "api.base_url", &config.api.base_url);
    validate_non_empty(errors, "api.model", &config.api.model);
    validate_range(
        errors,
        "api.connect_timeout_secs",
        config.api.connect_timeout_secs,
        1,
        120,
    );
    validate_range(
        errors,
        "api.request_timeout_secs",
        config.api.request_timeout_secs,
        5,
        900,
    );
}

fn validate_session(errors: &mut Vec<String>, config: &ParleyConfig) {
    validate_range(
        errors,
        "session.max_history_tokens",
        config.session.max_history_tokens,
        100,
        1_000_000,
    );
}

fn validate_rate_limit(errors: &mut Vec<String>, config: &ParleyConfig) {
    validate_range(
        errors,
        "rate_limit.requests_per_minute",
        config.rate_limit.requests_per_minute,
        1,
        10_000,
    );
    if let Some(timeout) = config.rate_limit.acquire_timeout_secs {
        validate_range_u64(errors, "rate_limit.acquire_timeout_secs", timeout, 0, 3600);
    }
}

fn validate_retry(errors: &mut Vec<String>, config: &ParleyConfig) {
    validate_range(errors, "retry.max_retries", config.retry.max_retries, 0, 5);
    validate_range(
        errors,
        "retry.rate_limit_backoff_secs",
        config.retry.rate_limit_backoff_secs,
        0,
        300,
    );
    validate_range(
        errors,
        "retry.timeout_backoff_secs",
        config.retry.timeout_backoff_secs,
        0,
        300,
    );
}
