//! Configuration
//!
//! [`MediaConfig`] gathers the per-component configs. Every field has a
//! default, so a YAML file only needs to name what it changes:
//!
//! ```yaml
//! cache:
//!   maxCacheSize: 10485760
//!   maxAgeMs: 600000
//! observer:
//!   threshold: 0.25
//!   rootMargin: "100px 0px"
//! pipeline:
//!   fetchTimeoutMs: 15000
//! video:
//!   dedupe: true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cache::CacheConfig;
use crate::error::{Error, Result};
use crate::pipeline::PipelineConfig;
use crate::video::CandidateOptions;
use crate::visibility::{BatchConfig, ObserverConfig, RootMargin};

/// Top-level configuration for a [`crate::MediaContext`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaConfig {
    /// Resource cache limits
    pub cache: CacheConfig,
    /// Visibility observer defaults
    pub observer: ObserverConfig,
    /// Gallery batch reveal
    pub batch: BatchConfig,
    /// Load pipeline behavior
    pub pipeline: PipelineConfig,
    /// Video candidate resolution
    pub video: CandidateOptions,
}

impl MediaConfig {
    /// Parse from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Reject values the components cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.observer.threshold > 0.0 && self.observer.threshold <= 1.0) {
            return Err(Error::Config(format!(
                "observer.threshold must be in (0, 1], got {}",
                self.observer.threshold
            )));
        }
        RootMargin::parse(&self.observer.root_margin)?;
        if self.batch.batch_size == 0 {
            return Err(Error::Config("batch.batchSize must be at least 1".into()));
        }
        if self.cache.max_age.is_zero() {
            return Err(Error::Config("cache.maxAgeMs must be positive".into()));
        }
        if let Some(timeout) = self.pipeline.fetch_timeout {
            if timeout.is_zero() {
                return Err(Error::Config("pipeline.fetchTimeoutMs must be positive".into()));
            }
        }
        Ok(())
    }
}

/// Serde helper: `Duration` as integer milliseconds.
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// Serde helper: `Option<Duration>` as optional integer milliseconds.
pub(crate) mod option_duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults_validate() {
        let config = MediaConfig::default();
        config.validate().unwrap();
        assert_eq!(config.observer.threshold, 0.1);
        assert_eq!(config.pipeline.fetch_timeout, None);
        assert!(!config.video.dedupe);
    }

    #[test]
    fn test_partial_yaml() {
        let config = MediaConfig::from_yaml_str(
            r#"
cache:
  maxCacheSize: 1024
  maxAgeMs: 5000
observer:
  threshold: 0.5
pipeline:
  fetchTimeoutMs: 2000
video:
  dedupe: true
"#,
        )
        .unwrap();

        assert_eq!(config.cache.max_cache_size, 1024);
        assert_eq!(config.cache.max_age, Duration::from_secs(5));
        assert_eq!(config.observer.threshold, 0.5);
        assert_eq!(config.observer.root_margin, "50px");
        assert_eq!(config.pipeline.fetch_timeout, Some(Duration::from_secs(2)));
        assert!(config.video.dedupe);
        assert_eq!(config.batch.batch_size, 6);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let err = MediaConfig::from_yaml_str("observer:\n  threshold: 1.5\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_batch_rejected() {
        let err = MediaConfig::from_yaml_str("batch:\n  batchSize: 0\n").unwrap_err();
        assert!(err.to_string().contains("batchSize"));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = MediaConfig::from_yaml_str("cache: [1, 2").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn test_roundtrip_yaml() {
        let config = MediaConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("maxAgeMs: 1800000"));
        let back = MediaConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(back, config);
    }
}
