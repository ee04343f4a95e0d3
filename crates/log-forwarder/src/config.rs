// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ForwarderError;
use crate::logs::chunker::MAX_CHUNK_BYTES;
use crate::tags::SourcePrefixes;

const MIN_CHUNK_BYTES: usize = 1024;

/// Forwarder configuration, read once per process.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// AWS region the forwarder runs in
    pub region: String,
    /// URL every chunk is POSTed to
    pub endpoint: String,
    /// Timeout of a single delivery attempt
    pub push_timeout: Duration,
    /// Initial delay between delivery attempts
    pub retry_interval: Duration,
    pub max_chunk_bytes: usize,
    pub forward_forwarder_tags: bool,
    pub forward_source_tags: bool,
    pub forward_log_group_tags: bool,
    pub source_tag_prefixes: SourcePrefixes,
    pub ecs_container_cache_ttl: Duration,
    /// Cluster name used for ECS lookups instead of the log group name
    pub ecs_cluster_override: Option<String>,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: String::new(),
            endpoint: String::new(),
            push_timeout: Duration::from_secs(10),
            retry_interval: Duration::from_millis(100),
            max_chunk_bytes: MAX_CHUNK_BYTES,
            forward_forwarder_tags: false,
            forward_source_tags: false,
            forward_log_group_tags: false,
            source_tag_prefixes: SourcePrefixes::default(),
            ecs_container_cache_ttl: Duration::from_secs(300),
            ecs_cluster_override: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Reads the configuration from `FORWARDER_*` environment variables and
    /// `AWS_REGION`. Every problem found is reported in one error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when a required variable is missing, a value
    /// does not parse, or the result does not validate.
    pub fn from_env() -> Result<Self, ForwarderError> {
        let mut errors = Vec::new();
        let defaults = Self::default();

        let region = required("AWS_REGION", &mut errors);
        let endpoint = required("FORWARDER_ENDPOINT", &mut errors);
        let push_timeout = parsed::<u64>("FORWARDER_PUSH_TIMEOUT_SEC", &mut errors)
            .map_or(defaults.push_timeout, Duration::from_secs);
        let retry_interval = parsed::<u64>("FORWARDER_RETRY_INTERVAL_MS", &mut errors)
            .map_or(defaults.retry_interval, Duration::from_millis);
        let max_chunk_bytes = parsed::<usize>("FORWARDER_MAX_CHUNK_BYTES", &mut errors)
            .map_or(defaults.max_chunk_bytes, |bytes| {
                bytes.clamp(MIN_CHUNK_BYTES, MAX_CHUNK_BYTES)
            });
        let ecs_container_cache_ttl =
            parsed::<u64>("FORWARDER_ECS_CONTAINER_CACHE_TTL_SEC", &mut errors)
                .map_or(defaults.ecs_container_cache_ttl, Duration::from_secs);

        let source_tag_prefixes = env::var("FORWARDER_SOURCE_TAG_PREFIXES")
            .map(|val| SourcePrefixes::parse(&val))
            .unwrap_or_default();
        let ecs_cluster_override = env::var("FORWARDER_ECS_CLUSTER_OVERRIDE")
            .ok()
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty());
        let log_level = env::var("FORWARDER_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or(defaults.log_level);

        if !errors.is_empty() {
            return Err(ForwarderError::InvalidConfig(errors.join("; ")));
        }

        let config = Self {
            region,
            endpoint,
            push_timeout,
            retry_interval,
            max_chunk_bytes,
            forward_forwarder_tags: flag("FORWARDER_FORWARD_FORWARDER_TAGS"),
            forward_source_tags: flag("FORWARDER_FORWARD_SOURCE_TAGS"),
            forward_log_group_tags: flag("FORWARDER_FORWARD_LOG_GROUP_TAGS"),
            source_tag_prefixes,
            ecs_container_cache_ttl,
            ecs_cluster_override,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> Result<(), ForwarderError> {
        if self.region.trim().is_empty() {
            return Err(ForwarderError::InvalidConfig(
                "AWS_REGION cannot be empty".to_string(),
            ));
        }

        match reqwest::Url::parse(&self.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ForwarderError::InvalidConfig(format!(
                    "FORWARDER_ENDPOINT must be an http or https URL, got scheme '{}'",
                    url.scheme()
                )));
            }
            Err(e) => {
                return Err(ForwarderError::InvalidConfig(format!(
                    "FORWARDER_ENDPOINT '{}' is not a valid URL: {e}",
                    self.endpoint
                )));
            }
        }

        if self.push_timeout.is_zero() {
            return Err(ForwarderError::InvalidConfig(
                "FORWARDER_PUSH_TIMEOUT_SEC must be greater than 0".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ForwarderError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Whether any lookup needs resource tags.
    #[must_use]
    pub fn forwards_any_tags(&self) -> bool {
        self.forward_forwarder_tags || self.forward_source_tags || self.forward_log_group_tags
    }
}

fn required(name: &str, errors: &mut Vec<String>) -> String {
    match env::var(name) {
        Ok(val) if !val.trim().is_empty() => val,
        _ => {
            errors.push(format!("{name} environment variable is required"));
            String::new()
        }
    }
}

fn parsed<T>(name: &str, errors: &mut Vec<String>) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let val = env::var(name).ok()?;
    match val.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            errors.push(format!("{name} '{val}' is invalid: {e}"));
            None
        }
    }
}

fn flag(name: &str) -> bool {
    env::var(name)
        .map(|val| val.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
