//! Configuration types for poly-corr

use crate::error::EngineError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub pressure: PressureConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Joint probability model settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Allowed drift of the joint table sum from 1 before renormalizing
    #[serde(default = "default_tolerance")]
    pub tolerance: Decimal,

    /// Fall back to a price/volume/time proxy when a snapshot carries no
    /// volatility data at all
    #[serde(default)]
    pub proxy_volatility: bool,
}

fn default_tolerance() -> Decimal {
    Decimal::new(1, 6) // 1e-6
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            proxy_volatility: false,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.tolerance <= Decimal::ZERO || self.tolerance >= Decimal::ONE {
            return Err(EngineError::InvalidConfig(format!(
                "model.tolerance must lie in (0, 1), got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Investment score weighting
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RankingConfig {
    /// Weight of relationship strength (|correlation| or similarity)
    #[serde(default = "default_correlation_weight")]
    pub correlation_weight: Decimal,

    /// Weight of expected value relative to stake
    #[serde(default = "default_ev_weight")]
    pub ev_weight: Decimal,

    /// Multiplier applied to EV/stake before clamping to [0, 1]
    #[serde(default = "default_ev_scale")]
    pub ev_scale: Decimal,
}

fn default_correlation_weight() -> Decimal {
    Decimal::new(6, 1) // 0.6
}
fn default_ev_weight() -> Decimal {
    Decimal::new(4, 1) // 0.4
}
fn default_ev_scale() -> Decimal {
    Decimal::new(10, 0) // a 10% return on stake saturates the EV term
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            correlation_weight: default_correlation_weight(),
            ev_weight: default_ev_weight(),
            ev_scale: default_ev_scale(),
        }
    }
}

impl RankingConfig {
    /// Weights must each lie in [0, 1] and sum to exactly 1
    pub fn validate(&self) -> Result<(), EngineError> {
        for (name, weight) in [
            ("correlation_weight", self.correlation_weight),
            ("ev_weight", self.ev_weight),
        ] {
            if weight < Decimal::ZERO || weight > Decimal::ONE {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} {weight} outside [0, 1]"
                )));
            }
        }

        let sum = self.correlation_weight + self.ev_weight;
        if sum != Decimal::ONE {
            return Err(EngineError::InvalidConfig(format!(
                "ranking weights must sum to 1.0, got {sum}"
            )));
        }

        if self.ev_scale <= Decimal::ZERO {
            return Err(EngineError::InvalidConfig(format!(
                "ev_scale must be positive, got {}",
                self.ev_scale
            )));
        }
        Ok(())
    }
}

/// Risk label thresholds
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RiskConfig {
    /// Pressure below this can be labelled low risk
    #[serde(default = "default_low_pressure")]
    pub low_pressure: Decimal,

    /// Pressure above this is always high risk
    #[serde(default = "default_high_pressure")]
    pub high_pressure: Decimal,

    /// Worst reachable loss / stake at or below this can be labelled low risk
    #[serde(default = "default_low_loss_fraction")]
    pub low_loss_fraction: Decimal,

    /// Worst reachable loss / stake above this is always high risk
    #[serde(default = "default_high_loss_fraction")]
    pub high_loss_fraction: Decimal,
}

fn default_low_pressure() -> Decimal {
    Decimal::new(5, 2) // 0.05
}
fn default_high_pressure() -> Decimal {
    Decimal::new(15, 2) // 0.15
}
fn default_low_loss_fraction() -> Decimal {
    Decimal::new(25, 2) // 0.25
}
fn default_high_loss_fraction() -> Decimal {
    Decimal::new(75, 2) // 0.75
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            low_pressure: default_low_pressure(),
            high_pressure: default_high_pressure(),
            low_loss_fraction: default_low_loss_fraction(),
            high_loss_fraction: default_high_loss_fraction(),
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        for (name, value) in [
            ("low_pressure", self.low_pressure),
            ("high_pressure", self.high_pressure),
            ("low_loss_fraction", self.low_loss_fraction),
            ("high_loss_fraction", self.high_loss_fraction),
        ] {
            if value < Decimal::ZERO {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        if self.low_pressure > self.high_pressure {
            return Err(EngineError::InvalidConfig(format!(
                "low_pressure {} exceeds high_pressure {}",
                self.low_pressure, self.high_pressure
            )));
        }
        if self.low_loss_fraction > self.high_loss_fraction {
            return Err(EngineError::InvalidConfig(format!(
                "low_loss_fraction {} exceeds high_loss_fraction {}",
                self.low_loss_fraction, self.high_loss_fraction
            )));
        }
        Ok(())
    }
}

/// Pressure comparability policy
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PressureConfig {
    /// Report unknown pressure when the two volatility methods differ
    #[serde(default)]
    pub require_matching_methods: bool,
}

/// Batch evaluation configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Maximum pairs evaluated concurrently
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    8
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Serve Prometheus metrics on this port when set
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,
    /// JSON format for log aggregation
    Json,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject inconsistent settings before any pair is analyzed
    pub fn validate(&self) -> Result<(), EngineError> {
        self.model.validate()?;
        self.ranking.validate()?;
        self.risk.validate()?;
        if self.batch.max_concurrency == 0 {
            return Err(EngineError::InvalidConfig(
                "batch.max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [model]
            tolerance = 0.001
            proxy_volatility = true

            [ranking]
            correlation_weight = 0.7
            ev_weight = 0.3
            ev_scale = 5

            [risk]
            low_pressure = 0.04
            high_pressure = 0.2
            low_loss_fraction = 0.3
            high_loss_fraction = 0.8

            [pressure]
            require_matching_methods = true

            [batch]
            max_concurrency = 4

            [telemetry]
            log_level = "debug"
            log_format = "json"
            metrics_port = 9090
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.model.tolerance, dec!(0.001));
        assert!(config.model.proxy_volatility);
        assert_eq!(config.ranking.correlation_weight, dec!(0.7));
        assert_eq!(config.risk.high_pressure, dec!(0.2));
        assert!(config.pressure.require_matching_methods);
        assert_eq!(config.batch.max_concurrency, 4);
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert_eq!(config.telemetry.metrics_port, Some(9090));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.model.tolerance, dec!(0.000001));
        assert!(!config.model.proxy_volatility);
        assert_eq!(config.ranking, RankingConfig::default());
        assert_eq!(config.risk, RiskConfig::default());
        assert_eq!(config.batch.max_concurrency, 8);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.telemetry.metrics_port.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_weights_not_summing_to_one() {
        let ranking = RankingConfig {
            correlation_weight: dec!(0.6),
            ev_weight: dec!(0.3),
            ..RankingConfig::default()
        };
        assert!(matches!(
            ranking.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_negative_weight() {
        let ranking = RankingConfig {
            correlation_weight: dec!(1.2),
            ev_weight: dec!(-0.2),
            ..RankingConfig::default()
        };
        assert!(ranking.validate().is_err());
    }

    #[test]
    fn test_inverted_risk_thresholds() {
        let risk = RiskConfig {
            low_pressure: dec!(0.3),
            high_pressure: dec!(0.1),
            ..RiskConfig::default()
        };
        assert!(risk.validate().is_err());
    }

    #[test]
    fn test_tolerance_out_of_range() {
        for tolerance in [dec!(0), dec!(-0.1), dec!(1)] {
            let mut config = Config::default();
            config.model.tolerance = tolerance;
            assert!(matches!(
                config.validate(),
                Err(EngineError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_zero_concurrency() {
        let mut config = Config::default();
        config.batch.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_load_rejects_bad_weights() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ranking]\ncorrelation_weight = 0.6\nev_weight = 0.3").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn test_config_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[batch]\nmax_concurrency = 2").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.batch.max_concurrency, 2);
    }
}
