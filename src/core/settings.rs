use crate::core::error::ValidationError;
use crate::core::models::{Options, Tag};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const API_VERSION: &str = "2015-04-15";
/// Longest interval the client will schedule, about 24.8 days.
pub const MAX_INTERVAL: Duration = Duration::from_millis(i32::MAX as u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint: Option<String>,
    pub api_version: String,
    pub default_interval_ms: u64,
    /// Raw client options, checked by [`validate`] when the client is built.
    pub query: Value,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_version: API_VERSION.to_string(),
            default_interval_ms: DEFAULT_INTERVAL.as_millis() as u64,
            query: Value::Null,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ec2-running").join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path().context("Could not determine config directory")?;

        if !path.exists() {
            tracing::info!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(?path, "Loaded config");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_interval_ms == 0 {
            anyhow::bail!("default_interval_ms must be positive");
        }
        check_interval(self.default_interval())?;
        if self.api_version.trim().is_empty() {
            anyhow::bail!("api_version must not be empty");
        }
        if let Some(endpoint) = &self.endpoint {
            reqwest::Url::parse(endpoint)
                .with_context(|| format!("endpoint is not a valid URL: {}", endpoint))?;
        }
        Ok(())
    }

    pub fn default_interval(&self) -> Duration {
        Duration::from_millis(self.default_interval_ms)
    }

    pub fn options(&self) -> Result<Options, ValidationError> {
        validate(&self.query)
    }
}

/// Validates an untyped option record and normalizes it into [`Options`].
///
/// `interval` is read as milliseconds.
pub fn validate(options: &Value) -> Result<Options, ValidationError> {
    let Some(map) = options.as_object() else {
        return Err(ValidationError::NotAnObject(options.to_string()));
    };

    let key = match map.get("key") {
        Some(Value::String(key)) => key.clone(),
        other => return Err(ValidationError::InvalidKey(describe(other))),
    };

    let secret = match map.get("secret") {
        Some(Value::String(secret)) => secret.clone(),
        _ => return Err(ValidationError::InvalidSecret),
    };

    let mut opts = Options::new(key, secret);

    if let Some(region) = map.get("region") {
        match region {
            Value::String(region) => opts.region = Some(region.clone()),
            other => return Err(ValidationError::InvalidRegion(other.to_string())),
        }
    }

    if let Some(interval) = map.get("interval") {
        let millis = interval
            .as_f64()
            .ok_or_else(|| ValidationError::InvalidInterval(interval.to_string()))?;
        opts.interval = Some(interval_from_millis(millis)?);
    }

    if let Some(tags) = map.get("tags") {
        opts.tags = parse_tags(tags)?;
    }

    Ok(opts)
}

/// Converts a millisecond count into a polling interval, rejecting
/// non-finite, zero and negative values and anything above [`MAX_INTERVAL`].
pub fn interval_from_millis(millis: f64) -> Result<Duration, ValidationError> {
    if !millis.is_finite() || millis <= 0.0 {
        return Err(ValidationError::InvalidInterval(millis.to_string()));
    }
    if millis > MAX_INTERVAL.as_millis() as f64 {
        return Err(too_long(millis.to_string()));
    }
    Duration::try_from_secs_f64(millis / 1000.0)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| ValidationError::InvalidInterval(millis.to_string()))
}

/// Checks that a typed interval is non-zero and schedulable.
pub fn check_interval(interval: Duration) -> Result<(), ValidationError> {
    if interval.is_zero() {
        return Err(ValidationError::InvalidInterval(format!("{:?}", interval)));
    }
    if interval > MAX_INTERVAL {
        return Err(too_long(format!("{:?}", interval)));
    }
    Ok(())
}

fn too_long(value: String) -> ValidationError {
    ValidationError::IntervalTooLong {
        value,
        max_ms: MAX_INTERVAL.as_millis() as u64,
    }
}

fn parse_tags(tags: &Value) -> Result<Vec<Tag>, ValidationError> {
    let Some(entries) = tags.as_array() else {
        return Err(ValidationError::InvalidTags(tags.to_string()));
    };
    if entries.iter().any(|entry| !entry.is_object()) {
        return Err(ValidationError::InvalidTags(tags.to_string()));
    }

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| match (entry.get("key"), entry.get("value")) {
            (Some(Value::String(key)), Some(Value::String(value))) => Ok(Tag::new(key, value)),
            _ => Err(ValidationError::MalformedTag {
                index,
                value: entry.to_string(),
            }),
        })
        .collect()
}

fn describe(value: Option<&Value>) -> String {
    value.map_or_else(|| "undefined".to_string(), Value::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.endpoint.is_none());
        assert_eq!(settings.api_version, "2015-04-15");
        assert_eq!(settings.default_interval(), Duration::from_secs(300));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();

        settings.default_interval_ms = 0;
        assert!(settings.validate().is_err());

        settings.default_interval_ms = 1000;
        settings.endpoint = Some("not a url".to_string());
        assert!(settings.validate().is_err());

        settings.endpoint = Some("https://inventory.example.com/".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            endpoint = "https://inventory.example.com/"
            default_interval_ms = 60000

            [query]
            key = "AKIA"
            secret = "shh"
            region = "us-east-1"
            interval = 10000
            tags = [{ key = "env", value = "prod" }, { key = "team", value = "ops" }]
        "#;

        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(
            settings.endpoint.as_deref(),
            Some("https://inventory.example.com/")
        );
        assert_eq!(settings.api_version, API_VERSION);
        assert_eq!(settings.default_interval(), Duration::from_secs(60));

        let opts = settings.options().unwrap();
        assert_eq!(opts.key, "AKIA");
        assert_eq!(opts.region.as_deref(), Some("us-east-1"));
        assert_eq!(opts.interval, Some(Duration::from_secs(10)));
        assert_eq!(
            opts.tags,
            vec![Tag::new("env", "prod"), Tag::new("team", "ops")]
        );
    }

    #[test]
    fn test_missing_query_table_is_rejected() {
        let settings: Settings = toml::from_str("default_interval_ms = 1000").unwrap();
        assert!(matches!(
            settings.options(),
            Err(ValidationError::NotAnObject(_))
        ));
    }

    #[test]
    fn test_validate_minimal_options() {
        let opts = validate(&json!({ "key": "k", "secret": "s" })).unwrap();
        assert_eq!(opts.key, "k");
        assert_eq!(opts.secret, "s");
        assert!(opts.region.is_none());
        assert!(opts.tags.is_empty());
        assert!(opts.interval.is_none());
    }

    #[test]
    fn test_validate_rejects_non_string_key() {
        let err = validate(&json!({ "key": 123, "secret": "x" })).unwrap_err();
        assert_eq!(err, ValidationError::InvalidKey("123".to_string()));
    }

    #[test]
    fn test_validate_rejects_missing_secret() {
        let err = validate(&json!({ "key": "k" })).unwrap_err();
        assert_eq!(err, ValidationError::InvalidSecret);
    }

    #[test]
    fn test_validate_rejects_non_object() {
        assert!(matches!(
            validate(&json!(null)),
            Err(ValidationError::NotAnObject(_))
        ));
        assert!(matches!(
            validate(&json!(["k", "s"])),
            Err(ValidationError::NotAnObject(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_region() {
        let err = validate(&json!({ "key": "k", "secret": "s", "region": 5 })).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRegion(_)));
    }

    #[test]
    fn test_validate_interval() {
        for bad in [json!(0), json!(-5), json!("1000"), json!(null)] {
            let err =
                validate(&json!({ "key": "k", "secret": "s", "interval": bad })).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidInterval(_)));
        }

        let opts = validate(&json!({ "key": "k", "secret": "s", "interval": 250 })).unwrap();
        assert_eq!(opts.interval, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_validate_tags() {
        let err = validate(&json!({ "key": "k", "secret": "s", "tags": "env=prod" })).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTags(_)));

        let err = validate(&json!({ "key": "k", "secret": "s", "tags": [1, 2] })).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTags(_)));

        let err = validate(&json!({
            "key": "k",
            "secret": "s",
            "tags": [{ "key": "env", "value": "prod" }, { "key": "team" }]
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::MalformedTag { index: 1, .. }));
    }

    #[test]
    fn test_interval_from_millis() {
        assert_eq!(
            interval_from_millis(1500.0).unwrap(),
            Duration::from_millis(1500)
        );
        assert!(interval_from_millis(-5.0).is_err());
        assert!(interval_from_millis(0.0).is_err());
        assert!(interval_from_millis(f64::NAN).is_err());
        assert!(interval_from_millis(f64::INFINITY).is_err());
        assert!(interval_from_millis(MAX_INTERVAL.as_millis() as f64).is_ok());
        assert!(matches!(
            interval_from_millis(1e22),
            Err(ValidationError::IntervalTooLong { .. })
        ));
    }

    #[test]
    fn test_check_interval() {
        assert!(check_interval(Duration::from_secs(1)).is_ok());
        assert!(check_interval(MAX_INTERVAL).is_ok());
        assert!(matches!(
            check_interval(Duration::ZERO),
            Err(ValidationError::InvalidInterval(_))
        ));
        assert!(matches!(
            check_interval(Duration::from_secs(u64::MAX)),
            Err(ValidationError::IntervalTooLong { .. })
        ));
    }

    #[test]
    fn test_settings_reject_unschedulable_default_interval() {
        let settings = Settings {
            default_interval_ms: u64::MAX,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let err = validate(&json!({ "key": "k", "secret": "s", "interval": 1e22 })).unwrap_err();
        assert!(matches!(err, ValidationError::IntervalTooLong { .. }));
    }
}
