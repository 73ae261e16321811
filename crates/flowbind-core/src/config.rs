//! flowbind.toml configuration.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration. The daemon applies command-line overrides on top
//! and calls [`BridgeConfig::validate`] once before starting; after that
//! the configuration is treated as immutable.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::parse_duration;
use crate::error::{ConfigError, ConfigResult};

/// What the scheduling loop does when a delta references an identifier
/// missing from the identity registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokenInvariantPolicy {
    /// Log and count the failure, then continue with the next delta.
    #[default]
    Skip,
    /// Stop the loop and hand the error to the host program.
    Abort,
}

/// How a preempt or migrate of a workload without a controller is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncontrolledWorkloadPolicy {
    /// Delete it anyway. Nothing will resubmit it.
    #[default]
    Delete,
    /// Refuse the delta and leave the workload running.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Identifies this bridge in logs and in the `bridge` label of its metrics.
    pub scheduler_name: String,
    pub engine_address: String,
    pub engine_port: u16,
    /// Per-RPC timeout for engine calls.
    pub request_timeout: String,
    pub readiness_timeout: String,
    pub readiness_poll_interval: String,
    pub scheduling_interval: String,
    /// Listen address for the stats and registration API.
    pub listen_address: String,
    /// Orchestrator API server, `host:port`, plain HTTP.
    pub api_server: String,
    pub api_token: Option<String>,
    /// Record orchestrator actions instead of performing them.
    pub dry_run: bool,
    pub broken_invariant_policy: BrokenInvariantPolicy,
    pub uncontrolled_workload_policy: UncontrolledWorkloadPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            scheduler_name: "flowbind".to_string(),
            engine_address: "firmament-service.kube-system".to_string(),
            engine_port: 9090,
            request_timeout: "30s".to_string(),
            readiness_timeout: "10m".to_string(),
            readiness_poll_interval: "2s".to_string(),
            scheduling_interval: "10s".to_string(),
            listen_address: "0.0.0.0:9091".to_string(),
            api_server: "127.0.0.1:8001".to_string(),
            api_token: None,
            dry_run: false,
            broken_invariant_policy: BrokenInvariantPolicy::default(),
            uncontrolled_workload_policy: UncontrolledWorkloadPolicy::default(),
        }
    }
}

impl BridgeConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The engine's gRPC endpoint as `address:port`.
    pub fn engine_endpoint(&self) -> String {
        format!("{}:{}", self.engine_address, self.engine_port)
    }

    pub fn request_timeout(&self) -> ConfigResult<Duration> {
        duration_field("request_timeout", &self.request_timeout)
    }

    pub fn readiness_timeout(&self) -> ConfigResult<Duration> {
        duration_field("readiness_timeout", &self.readiness_timeout)
    }

    pub fn readiness_poll_interval(&self) -> ConfigResult<Duration> {
        duration_field("readiness_poll_interval", &self.readiness_poll_interval)
    }

    pub fn scheduling_interval(&self) -> ConfigResult<Duration> {
        duration_field("scheduling_interval", &self.scheduling_interval)
    }

    /// Check every field that can be wrong before anything starts.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.scheduler_name.trim().is_empty() {
            return Err(ConfigError::Invalid("scheduler_name must not be empty".into()));
        }
        if self.engine_address.trim().is_empty() {
            return Err(ConfigError::Invalid("engine_address must not be empty".into()));
        }

        let request_timeout = self.request_timeout()?;
        let readiness_timeout = self.readiness_timeout()?;
        let poll_interval = self.readiness_poll_interval()?;
        let scheduling_interval = self.scheduling_interval()?;

        for (field, value) in [
            ("request_timeout", request_timeout),
            ("readiness_poll_interval", poll_interval),
            ("scheduling_interval", scheduling_interval),
        ] {
            if value.is_zero() {
                return Err(ConfigError::Invalid(format!("{field} must be non-zero")));
            }
        }

        if poll_interval > readiness_timeout {
            return Err(ConfigError::Invalid(format!(
                "readiness_poll_interval ({poll_interval:?}) exceeds readiness_timeout ({readiness_timeout:?})"
            )));
        }

        Ok(())
    }
}

fn duration_field(field: &'static str, value: &str) -> ConfigResult<Duration> {
    parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = BridgeConfig::default();
        assert_eq!(config.engine_endpoint(), "firmament-service.kube-system:9090");
        assert_eq!(config.readiness_timeout().unwrap(), Duration::from_secs(600));
        assert_eq!(config.readiness_poll_interval().unwrap(), Duration::from_secs(2));
        assert_eq!(config.scheduling_interval().unwrap(), Duration::from_secs(10));
        assert_eq!(config.listen_address, "0.0.0.0:9091");
        assert_eq!(config.broken_invariant_policy, BrokenInvariantPolicy::Skip);
        assert_eq!(
            config.uncontrolled_workload_policy,
            UncontrolledWorkloadPolicy::Delete
        );
        assert!(!config.dry_run);
        config.validate().unwrap();
    }

    #[test]
    fn empty_toml_is_default() {
        let config = BridgeConfig::from_toml_str("").unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn parse_partial_toml() {
        let config = BridgeConfig::from_toml_str(
            r#"
engine_address = "engine.local"
engine_port = 7070
scheduling_interval = "500ms"
broken_invariant_policy = "abort"
uncontrolled_workload_policy = "reject"
"#,
        )
        .unwrap();

        assert_eq!(config.engine_endpoint(), "engine.local:7070");
        assert_eq!(config.scheduling_interval().unwrap(), Duration::from_millis(500));
        assert_eq!(config.broken_invariant_policy, BrokenInvariantPolicy::Abort);
        assert_eq!(
            config.uncontrolled_workload_policy,
            UncontrolledWorkloadPolicy::Reject
        );
        assert_eq!(config.scheduler_name, "flowbind");
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let result = BridgeConfig::from_toml_str(r#"broken_invariant_policy = "panic""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "scheduler_name = \"bridge-a\"\ndry_run = true").unwrap();

        let config = BridgeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.scheduler_name, "bridge-a");
        assert!(config.dry_run);
    }

    #[test]
    fn from_file_missing_is_read_error() {
        let result = BridgeConfig::from_file(Path::new("/nonexistent/flowbind.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn validate_rejects_bad_duration() {
        let config = BridgeConfig {
            scheduling_interval: "often".to_string(),
            ..BridgeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration {
                field: "scheduling_interval",
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let config = BridgeConfig {
            scheduling_interval: "0s".to_string(),
            ..BridgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_poll_longer_than_timeout() {
        let config = BridgeConfig {
            readiness_timeout: "1s".to_string(),
            readiness_poll_interval: "5s".to_string(),
            ..BridgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
