//! Sampler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::calibrate::DEFAULT_CHAIN_STRENGTH_PREFACTOR;
use crate::error::{AnnealError, AnnealResult};

/// Session-wide settings of a [`crate::ResilientCompositeSampler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Rebind to an alternate device when the current one goes offline.
    pub failover: bool,
    /// Seconds to wait before resubmitting after a failover. Negative
    /// disables retrying: one failover, one resubmission.
    pub retry_interval: f64,
    /// Failovers allowed per call when retrying is enabled.
    pub max_failovers: u32,
    /// Chain strength for every call that does not set its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_strength: Option<f64>,
    /// Multiple of the largest bias used as default chain strength.
    pub chain_strength_prefactor: f64,
    /// Rescale out-of-range problems instead of rejecting them.
    pub auto_scale: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            failover: false,
            retry_interval: -1.0,
            max_failovers: 3,
            chain_strength: None,
            chain_strength_prefactor: DEFAULT_CHAIN_STRENGTH_PREFACTOR,
            auto_scale: false,
        }
    }
}

impl SamplerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> AnnealResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_failover(mut self, failover: bool) -> Self {
        self.failover = failover;
        self
    }

    pub fn with_retry_interval(mut self, seconds: f64) -> Self {
        self.retry_interval = seconds;
        self
    }

    pub fn with_max_failovers(mut self, max_failovers: u32) -> Self {
        self.max_failovers = max_failovers;
        self
    }

    pub fn with_chain_strength(mut self, chain_strength: f64) -> Self {
        self.chain_strength = Some(chain_strength);
        self
    }

    pub fn with_chain_strength_prefactor(mut self, prefactor: f64) -> Self {
        self.chain_strength_prefactor = prefactor;
        self
    }

    pub fn with_auto_scale(mut self, auto_scale: bool) -> Self {
        self.auto_scale = auto_scale;
        self
    }

    /// Reject values no session can run with.
    pub fn validate(&self) -> AnnealResult<()> {
        if self.retry_interval.is_nan() || self.retry_interval.is_infinite() {
            return Err(AnnealError::Configuration(format!(
                "retry_interval {} must be finite",
                self.retry_interval
            )));
        }
        if !(self.chain_strength_prefactor.is_finite() && self.chain_strength_prefactor > 0.0) {
            return Err(AnnealError::Configuration(format!(
                "chain_strength_prefactor {} must be positive",
                self.chain_strength_prefactor
            )));
        }
        if self.chain_strength.is_some_and(|s| !s.is_finite()) {
            return Err(AnnealError::Configuration(
                "chain_strength must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Whether resubmission after failover may repeat.
    pub fn retry_enabled(&self) -> bool {
        self.retry_interval >= 0.0
    }

    /// Delay before each resubmission, when retrying is enabled.
    pub fn retry_delay(&self) -> Option<Duration> {
        self.retry_enabled()
            .then(|| Duration::from_secs_f64(self.retry_interval))
    }

    /// Failovers one `sample` call may trigger.
    pub fn failover_budget(&self) -> u32 {
        match (self.failover, self.retry_enabled()) {
            (false, _) => 0,
            (true, false) => 1,
            (true, true) => self.max_failovers,
        }
    }
}

/// Per-call overrides for [`crate::ResilientCompositeSampler::sample`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleParams {
    /// Chain strength for this call only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_strength: Option<f64>,
    /// Auto-scaling for this call only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scale: Option<bool>,
    /// Parameters passed through to the device.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SampleParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chain_strength(mut self, chain_strength: f64) -> Self {
        self.chain_strength = Some(chain_strength);
        self
    }

    pub fn with_auto_scale(mut self, auto_scale: bool) -> Self {
        self.auto_scale = Some(auto_scale);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SamplerConfig::default();
        assert!(!config.failover);
        assert!(!config.retry_enabled());
        assert_eq!(config.retry_delay(), None);
        assert_eq!(config.failover_budget(), 0);
        assert_eq!(config.chain_strength_prefactor, 1.5);
    }

    #[test]
    fn test_failover_budget() {
        let config = SamplerConfig::new().with_failover(true);
        assert_eq!(config.failover_budget(), 1);

        let config = config.with_retry_interval(0.5).with_max_failovers(4);
        assert_eq!(config.failover_budget(), 4);
        assert_eq!(config.retry_delay(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            SamplerConfig::from_json(r#"{"failover": true, "chain_strength": 2.0}"#).unwrap();
        assert!(config.failover);
        assert_eq!(config.chain_strength, Some(2.0));
        assert_eq!(config.retry_interval, -1.0);
    }

    #[test]
    fn test_from_json_rejects_bad_prefactor() {
        assert!(matches!(
            SamplerConfig::from_json(r#"{"chain_strength_prefactor": 0}"#),
            Err(AnnealError::Configuration(_))
        ));
    }

    #[test]
    fn test_sample_params_extra() {
        let params = SampleParams::new()
            .with_auto_scale(true)
            .with_extra("num_reads", serde_json::json!(25));
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["auto_scale"], serde_json::json!(true));
        assert_eq!(json["num_reads"], serde_json::json!(25));
    }
}
